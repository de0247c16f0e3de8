use std::fmt;

/// Error kind for plugin errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed, missing or unknown transform option.
    Config,
    /// Schema construction violated a structural invariant.
    Schema,
    /// A value does not conform to the schema it is being bound to.
    Data,
    Format,
    Io,
}

/// Plugin error, returned by schema builders, struct validation, option parsing
/// and the JSON envelope codec.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginError {
    pub kind: ErrorKind,
    pub message: String,
    /// Offending option name, set for configuration errors that concern one option.
    pub option: Option<String>,
}

impl PluginError {
    fn new(kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            message: msg.into(),
            option: None,
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, msg)
    }

    /// Configuration error tied to a single option.
    ///
    /// Produces: `"option 'fields-to-nest': <reason>"`.
    pub fn invalid_option(option: impl Into<String>, reason: impl fmt::Display) -> Self {
        let option = option.into();
        Self {
            kind: ErrorKind::Config,
            message: format!("option '{option}': {reason}"),
            option: Some(option),
        }
    }

    pub fn schema(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Schema, msg)
    }

    pub fn data(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Data, msg)
    }

    pub fn format(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Format, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, msg)
    }

    pub fn is_config(&self) -> bool {
        self.kind == ErrorKind::Config
    }

    /// Add context to the error, preserving the original ErrorKind.
    ///
    /// Produces: `"context: original message"`.
    pub fn with_context(self, ctx: impl fmt::Display) -> Self {
        Self {
            kind: self.kind,
            message: format!("{ctx}: {}", self.message),
            option: self.option,
        }
    }
}

impl fmt::Display for PluginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for PluginError {}

// ---------------------------------------------------------------------------
// From impls: standard error types → PluginError with correct ErrorKind
// ---------------------------------------------------------------------------

impl From<std::io::Error> for PluginError {
    fn from(e: std::io::Error) -> Self {
        Self::io(e.to_string())
    }
}

impl From<serde_json::Error> for PluginError {
    fn from(e: serde_json::Error) -> Self {
        Self::format(e.to_string())
    }
}

impl From<base64::DecodeError> for PluginError {
    fn from(e: base64::DecodeError) -> Self {
        Self::format(format!("invalid base64: {e}"))
    }
}
