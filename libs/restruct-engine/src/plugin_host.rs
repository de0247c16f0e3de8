use std::collections::{HashMap, HashSet};

use restruct_api::config::{validate_and_build, ConfigParam, ConfigValues, ParamType, ParamValue};
use restruct_api::plugin::TransformPlugin;
use restruct_api::transform::Transform;

use crate::config::TransformConfig;
use crate::error::EngineError;

/// Transform plugins known to the host, looked up by name.
#[derive(Debug, Clone)]
pub struct PluginRegistry {
    plugins: Vec<TransformPlugin>,
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PluginRegistry {
    pub fn empty() -> Self {
        Self {
            plugins: Vec::new(),
        }
    }

    /// Registry with every transform shipped in this workspace.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(restruct_transform_nest_fields::PLUGIN);
        registry.register(restruct_transform_set_nested_name::PLUGIN);
        registry
    }

    /// Add a plugin. A later registration replaces an earlier one of the same name.
    pub fn register(&mut self, plugin: TransformPlugin) {
        self.plugins.retain(|p| p.name != plugin.name);
        self.plugins.push(plugin);
    }

    pub fn get(&self, name: &str) -> Option<&TransformPlugin> {
        self.plugins.iter().find(|p| p.name == name)
    }

    pub fn plugins(&self) -> &[TransformPlugin] {
        &self.plugins
    }

    /// Create a transform from one `[[transforms]]` entry.
    ///
    /// 1. Look the plugin up by name.
    /// 2. Parse the config table → raw values, validate, build ConfigValues.
    /// 3. Create the transform.
    pub fn load_transform(&self, cfg: &TransformConfig) -> Result<Box<dyn Transform>, EngineError> {
        let ctx = format!("transform '{}'", cfg.name);
        let plugin = self
            .get(&cfg.plugin)
            .ok_or_else(|| EngineError::UnknownPlugin(cfg.plugin.clone()))
            .map_err(|e| e.with_context(&ctx))?;

        let params = plugin.describe_config();
        let options = cfg.options_json()?;
        let raw = parse_plugin_config(options.as_ref(), &params).map_err(|e| e.with_context(&ctx))?;
        let values = validate_and_build(&raw, &params)
            .map_err(EngineError::from)
            .map_err(|e| e.with_context(&ctx))?;
        let transform = create(plugin, &values).map_err(|e| e.with_context(&ctx))?;

        tracing::info!(transform = %cfg.name, plugin = %cfg.plugin, "created transform");
        Ok(transform)
    }
}

fn create(plugin: &TransformPlugin, values: &ConfigValues) -> Result<Box<dyn Transform>, EngineError> {
    Ok(plugin.create(values)?)
}

// ---------------------------------------------------------------------------
// Config parsing (format-independent)
// ---------------------------------------------------------------------------

/// Parse plugin config into format-independent key-value pairs.
///
/// `config` is a format-independent `serde_json::Value` (already deserialized
/// from TOML by the config loader).
///
/// - Rejects unknown keys (not declared by the plugin).
/// - Converts `serde_json::Value` → `ParamValue` based on declared `ParamType`.
///
/// Returns only the keys that are present in the config source.
/// Defaults and required-checks are handled by `validate_and_build`.
pub fn parse_plugin_config(
    config: Option<&serde_json::Value>,
    params: &[ConfigParam],
) -> Result<HashMap<String, ParamValue>, EngineError> {
    let obj = match config {
        Some(serde_json::Value::Object(map)) => map,
        Some(_) => {
            return Err(EngineError::Config(
                "transform config must be a table/object".into(),
            ))
        }
        None => return Ok(HashMap::new()),
    };

    // Any key not declared by the plugin is an error.
    let known: HashSet<&str> = params.iter().map(|p| p.name.as_str()).collect();
    for key in obj.keys() {
        if !known.contains(key.as_str()) {
            return Err(EngineError::Config(format!("unknown option '{key}'")));
        }
    }

    let mut result = HashMap::new();
    for param in params {
        if let Some(v) = obj.get(&param.name) {
            let pv = value_to_param_value(v, param)?;
            result.insert(param.name.clone(), pv);
        }
    }

    Ok(result)
}

/// Convert a single value to a ParamValue according to the declared type.
fn value_to_param_value(
    val: &serde_json::Value,
    param: &ConfigParam,
) -> Result<ParamValue, EngineError> {
    let invalid = |expected: &str| {
        EngineError::Config(format!("option '{}': expected {expected}, got {val}", param.name))
    };
    match param.param_type {
        ParamType::Bool => val.as_bool().map(ParamValue::Bool).ok_or_else(|| invalid("bool")),
        ParamType::I64 => val.as_i64().map(ParamValue::I64).ok_or_else(|| invalid("integer")),
        ParamType::U64 => val
            .as_u64()
            .map(ParamValue::U64)
            .ok_or_else(|| invalid("non-negative integer")),
        ParamType::Str => Ok(ParamValue::Str(flatten_value(val))),
    }
}

/// Flatten a value into a string for flat config transport.
///
/// Scalars are converted directly (no quoting). An array of strings is joined
/// with commas, so list-valued options may be written as TOML arrays.
/// Other arrays and objects are serialized as JSON strings.
fn flatten_value(val: &serde_json::Value) -> String {
    match val {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Null => String::new(),
        serde_json::Value::Array(items) if items.iter().all(serde_json::Value::is_string) => items
            .iter()
            .filter_map(serde_json::Value::as_str)
            .collect::<Vec<_>>()
            .join(","),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
            serde_json::to_string(val).unwrap_or_default()
        }
    }
}
