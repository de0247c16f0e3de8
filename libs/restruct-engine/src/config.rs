use std::collections::HashSet;

use serde::Deserialize;

use crate::error::EngineError;

/// Root configuration, parsed from TOML.
///
/// ```toml
/// [[transforms]]
/// name = "nest-address"
/// plugin = "nest-fields"
/// config = { fields-to-nest = "street:address,zip:postal" }
///
/// [[transforms]]
/// name = "rename-details"
/// plugin = "set-nested-name"
///
/// [transforms.config]
/// nested-field-name = "details"
/// new-schema-name = "com.example.Details"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Transforms, applied in declaration order.
    #[serde(default)]
    pub transforms: Vec<TransformConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TransformConfig {
    pub name: String,
    /// Built-in plugin name (`nest-fields`, `set-nested-name`).
    pub plugin: String,
    #[serde(default)]
    pub config: Option<toml::Value>,
}

impl TransformConfig {
    /// Plugin options as a format-independent JSON value.
    pub fn options_json(&self) -> Result<Option<serde_json::Value>, EngineError> {
        self.config
            .as_ref()
            .map(|v| {
                serde_json::to_value(v).map_err(|e| {
                    EngineError::Config(format!("transform '{}': {e}", self.name))
                })
            })
            .transpose()
    }
}

impl PipelineConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self, EngineError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| EngineError::Config(format!("{path}: {e}")))?;
        Self::parse(&content).map_err(|e| e.with_context(path))
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, EngineError> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| EngineError::Config(e.to_string()))?;
        config.check_names()?;
        Ok(config)
    }

    fn check_names(&self) -> Result<(), EngineError> {
        let mut seen = HashSet::new();
        for t in &self.transforms {
            if t.name.trim().is_empty() {
                return Err(EngineError::Config("transform name must not be empty".into()));
            }
            if !seen.insert(t.name.as_str()) {
                return Err(EngineError::Config(format!(
                    "transform '{}' is declared more than once",
                    t.name
                )));
            }
        }
        Ok(())
    }
}
