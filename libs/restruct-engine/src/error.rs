use restruct_api::error::PluginError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("config error: {0}")]
    Config(String),

    #[error("plugin error: {0}")]
    Plugin(#[from] PluginError),

    #[error("unknown transform plugin '{0}'")]
    UnknownPlugin(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Add context to the error.
    ///
    /// For `Plugin` variant, context is added to the inner `PluginError`.
    /// For other variants, context is prepended to the message.
    pub fn with_context(self, ctx: impl std::fmt::Display) -> Self {
        match self {
            EngineError::Plugin(e) => EngineError::Plugin(e.with_context(ctx)),
            EngineError::Config(msg) => EngineError::Config(format!("{ctx}: {msg}")),
            EngineError::UnknownPlugin(name) => EngineError::Config(format!(
                "{ctx}: unknown transform plugin '{name}'"
            )),
            other => other,
        }
    }

    /// The option a configuration error is about, when there is one.
    pub fn option(&self) -> Option<&str> {
        match self {
            EngineError::Plugin(e) => e.option.as_deref(),
            _ => None,
        }
    }
}
