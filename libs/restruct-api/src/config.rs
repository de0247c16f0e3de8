use std::collections::HashMap;

use crate::error::PluginError;

/// Parameter type for transform options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Bool,
    I64,
    U64,
    Str,
}

/// How much an option matters to an operator reading the option listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Importance {
    High,
    Medium,
    Low,
}

impl Importance {
    pub fn as_str(self) -> &'static str {
        match self {
            Importance::High => "high",
            Importance::Medium => "medium",
            Importance::Low => "low",
        }
    }
}

/// Declaration of a single transform option.
///
/// Transforms export these through their plugin descriptor.
/// The host uses them to validate option values BEFORE creating the transform.
#[derive(Debug, Clone)]
pub struct ConfigParam {
    pub name: String,
    pub param_type: ParamType,
    pub importance: Importance,
    pub required: bool,
    pub default: Option<ParamValue>,
    pub description: String,
}

/// Typed option value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Bool(bool),
    I64(i64),
    U64(u64),
    Str(String),
}

impl ParamValue {
    /// Parse a raw option string according to the declared type.
    pub fn parse(raw: &str, param: &ConfigParam) -> Result<Self, PluginError> {
        let trimmed = raw.trim();
        match param.param_type {
            ParamType::Str => Ok(ParamValue::Str(raw.to_string())),
            ParamType::Bool => match trimmed.to_ascii_lowercase().as_str() {
                "true" => Ok(ParamValue::Bool(true)),
                "false" => Ok(ParamValue::Bool(false)),
                _ => Err(PluginError::invalid_option(
                    &param.name,
                    format!("expected boolean, got `{raw}`"),
                )),
            },
            ParamType::I64 => trimmed.parse().map(ParamValue::I64).map_err(|_| {
                PluginError::invalid_option(&param.name, format!("expected integer, got `{raw}`"))
            }),
            ParamType::U64 => trimmed.parse().map(ParamValue::U64).map_err(|_| {
                PluginError::invalid_option(
                    &param.name,
                    format!("expected non-negative integer, got `{raw}`"),
                )
            }),
        }
    }
}

/// Validated option values, passed to a transform at creation time.
///
/// The host builds this from the config source (TOML, string map, ...)
/// after validating against the transform's `ConfigParam` declarations.
/// Transforms read values via typed getters.
#[derive(Debug, Clone, Default)]
pub struct ConfigValues {
    entries: Vec<(String, ParamValue)>,
}

impl ConfigValues {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn set(&mut self, name: impl Into<String>, value: ParamValue) {
        let name = name.into();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| k == &name) {
            entry.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.get(name) {
            Some(ParamValue::Bool(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        match self.get(name) {
            Some(ParamValue::I64(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_u64(&self, name: &str) -> Option<u64> {
        match self.get(name) {
            Some(ParamValue::U64(v)) => Some(*v),
            // Most config formats lack unsigned integers; accept non-negative i64.
            Some(ParamValue::I64(v)) if *v >= 0 => Some(*v as u64),
            _ => None,
        }
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(ParamValue::Str(v)) => Some(v),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parse a flat string map (`option name → raw string`) against declared params.
///
/// Unknown keys are rejected; values are converted by declared type.
pub fn parse_string_options<'a, I>(
    options: I,
    params: &[ConfigParam],
) -> Result<HashMap<String, ParamValue>, PluginError>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut parsed = HashMap::new();
    for (key, raw) in options {
        let param = params
            .iter()
            .find(|p| p.name == key)
            .ok_or_else(|| PluginError::invalid_option(key, "unknown option"))?;
        parsed.insert(param.name.clone(), ParamValue::parse(raw, param)?);
    }
    Ok(parsed)
}

/// Build `ConfigValues` from parsed key-value pairs (format-independent).
///
/// For each declared param:
/// - If present in `parsed`: use the value.
/// - If absent with default: use default value.
/// - If absent and required: return error.
pub fn validate_and_build(
    parsed: &HashMap<String, ParamValue>,
    params: &[ConfigParam],
) -> Result<ConfigValues, PluginError> {
    let mut values = ConfigValues::new();

    for param in params {
        match parsed.get(&param.name) {
            Some(v) => values.set(&param.name, v.clone()),
            None => {
                if let Some(ref default) = param.default {
                    values.set(&param.name, default.clone());
                } else if param.required {
                    return Err(PluginError::invalid_option(
                        &param.name,
                        "missing required option",
                    ));
                }
            }
        }
    }

    Ok(values)
}
