use std::collections::HashMap;
use std::str::FromStr;

use restruct_api::error::PluginError;

use crate::FIELDS_TO_NEST;

/// One `field:structName` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestEntry {
    pub field: String,
    pub struct_name: String,
}

/// Ordered mapping from top-level field name to the struct it gets wrapped in.
///
/// Source names are unique, destination names are unique, and the mapping is
/// never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestMapping {
    entries: Vec<NestEntry>,
}

impl NestMapping {
    /// Parse `"street:address, zip:postal"`.
    pub fn parse(raw: &str) -> Result<Self, PluginError> {
        if raw.trim().is_empty() {
            return Err(PluginError::invalid_option(
                FIELDS_TO_NEST,
                "must list at least one `field:structName` pair",
            ));
        }

        let mut entries: Vec<NestEntry> = Vec::new();
        let mut by_struct: HashMap<String, String> = HashMap::new();

        for (position, item) in raw.split(',').map(str::trim).enumerate() {
            if item.is_empty() {
                return Err(PluginError::invalid_option(
                    FIELDS_TO_NEST,
                    format!("empty entry at position {position}"),
                ));
            }
            let entry = parse_entry(item)?;

            if entries.iter().any(|e| e.field == entry.field) {
                return Err(PluginError::invalid_option(
                    FIELDS_TO_NEST,
                    format!("field '{}' is listed more than once", entry.field),
                ));
            }
            if let Some(previous) = by_struct.get(&entry.struct_name) {
                return Err(PluginError::invalid_option(
                    FIELDS_TO_NEST,
                    format!(
                        "struct name '{}' is the target of both '{previous}' and '{}'",
                        entry.struct_name, entry.field
                    ),
                ));
            }

            by_struct.insert(entry.struct_name.clone(), entry.field.clone());
            entries.push(entry);
        }

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[NestEntry] {
        &self.entries
    }

    /// Destination struct name for a source field, if the field is mapped.
    pub fn target_for(&self, field: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.struct_name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromStr for NestMapping {
    type Err = PluginError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn parse_entry(item: &str) -> Result<NestEntry, PluginError> {
    let malformed =
        || PluginError::invalid_option(FIELDS_TO_NEST, format!("expected `field:structName`, got `{item}`"));

    let (field, struct_name) = item.split_once(':').ok_or_else(malformed)?;
    let (field, struct_name) = (field.trim(), struct_name.trim());
    if field.is_empty() || struct_name.is_empty() || struct_name.contains(':') {
        return Err(malformed());
    }

    Ok(NestEntry {
        field: field.to_string(),
        struct_name: struct_name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pairs_in_order() {
        let mapping: NestMapping = " street:address , zip : postal ".parse().unwrap();
        let pairs: Vec<_> = mapping
            .entries()
            .iter()
            .map(|e| (e.field.as_str(), e.struct_name.as_str()))
            .collect();
        assert_eq!(pairs, vec![("street", "address"), ("zip", "postal")]);
        assert_eq!(mapping.target_for("zip"), Some("postal"));
        assert_eq!(mapping.target_for("city"), None);
    }

    #[test]
    fn missing_separator_is_reported_verbatim() {
        let err = NestMapping::parse("street-address").unwrap_err();
        assert!(err.is_config());
        assert_eq!(err.option.as_deref(), Some(FIELDS_TO_NEST));
        assert_eq!(
            err.message,
            "option 'fields-to-nest': expected `field:structName`, got `street-address`"
        );
    }

    #[test]
    fn empty_parts_rejected() {
        for raw in ["", "   ", ":address", "street:", "a:b,,c:d", "a:b:c"] {
            assert!(NestMapping::parse(raw).is_err(), "{raw:?} should be rejected");
        }
    }

    #[test]
    fn duplicate_source_rejected() {
        let err = NestMapping::parse("a:x,a:y").unwrap_err();
        assert!(err.message.contains("field 'a' is listed more than once"));
    }

    #[test]
    fn duplicate_destination_rejected() {
        let err = NestMapping::parse("a:x,b:x").unwrap_err();
        assert!(err.message.contains("struct name 'x' is the target of both 'a' and 'b'"));
    }
}
