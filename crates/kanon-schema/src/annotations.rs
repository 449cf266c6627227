//! Annotation parsing.
//!
//! The rules annotation is a comma-separated list of entries. An `=` splits
//! a rule name from its options, and options are space-separated, so
//! `required,oneof=red green,min=3` yields three rules where `oneof` carries
//! two option tokens.

use indexmap::IndexMap;

/// One parsed entry of a rules annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSpec {
    /// Rule name.
    pub name: String,
    /// Option tokens.
    pub options: Vec<String>,
}

/// Parses a rules annotation into ordered entries. Empty entries are
/// dropped.
pub fn parse_rules(annotation: &str) -> Vec<RuleSpec> {
    annotation
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once('=') {
            Some((name, options)) => RuleSpec {
                name: name.trim().to_string(),
                options: options.split_whitespace().map(ToString::to_string).collect(),
            },
            None => RuleSpec {
                name: entry.to_string(),
                options: Vec::new(),
            },
        })
        .collect()
}

/// The parsed wire annotation: `name[,omitempty]`, or `-` to ignore.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WireTag {
    /// Wire key; `None` means "use the binding name".
    pub name: Option<String>,
    /// Skip on encode when the value is empty.
    pub omit_empty: bool,
    /// Excluded from every walk.
    pub ignored: bool,
}

impl WireTag {
    /// Parses a wire annotation.
    pub fn parse(annotation: &str) -> Self {
        if annotation.trim() == "-" {
            return Self {
                ignored: true,
                ..Self::default()
            };
        }
        let mut parts = annotation.split(',');
        let name = parts
            .next()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(ToString::to_string);
        let omit_empty = parts.any(|p| p.trim() == "omitempty");
        Self {
            name,
            omit_empty,
            ignored: false,
        }
    }
}

/// Splits every annotation value on `,` for extension hooks.
pub fn raw_annotations(annotations: &IndexMap<String, String>) -> IndexMap<String, Vec<String>> {
    annotations
        .iter()
        .map(|(name, value)| {
            (
                name.clone(),
                value.split(',').map(|v| v.trim().to_string()).collect(),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rules_options() {
        let rules = parse_rules("required, oneof=red green ,min=3,");
        assert_eq!(rules.len(), 3);
        assert_eq!(rules[0].name, "required");
        assert!(rules[0].options.is_empty());
        assert_eq!(rules[1].name, "oneof");
        assert_eq!(rules[1].options, vec!["red", "green"]);
        assert_eq!(rules[2].options, vec!["3"]);
    }

    #[test]
    fn test_parse_rules_empty() {
        assert!(parse_rules("").is_empty());
        assert!(parse_rules(" , ").is_empty());
    }

    #[test]
    fn test_wire_tag() {
        assert_eq!(
            WireTag::parse("user_id,omitempty"),
            WireTag {
                name: Some("user_id".into()),
                omit_empty: true,
                ignored: false
            }
        );
        assert_eq!(WireTag::parse(",omitempty").name, None);
        assert!(WireTag::parse("-").ignored);
        assert!(!WireTag::parse("-,").ignored);
    }

    #[test]
    fn test_raw_annotations_split() {
        let mut annotations = IndexMap::new();
        annotations.insert("x-vendor".to_string(), "a, b".to_string());
        let raw = raw_annotations(&annotations);
        assert_eq!(raw["x-vendor"], vec!["a", "b"]);
    }
}
