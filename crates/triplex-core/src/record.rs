//! Record shapes produced by loaders
//!
//! Upstream extraction jobs are not consistent about value types, so the
//! string fields deserialize leniently: numbers and booleans are coerced to
//! their string form and `null` is treated as absent.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::normalize::{coerce_to_string, normalize_name};

/// Label used when a triplet omits `subject_type` or `object_type`
pub const DEFAULT_ENTITY_TYPE: &str = "Entity";

/// Relationship type used when a triplet omits `predicate`
pub const DEFAULT_PREDICATE: &str = "RELATED_TO";

/// Label used when a seed omits `type`
pub const DEFAULT_SEED_TYPE: &str = "Concept";

/// One subject-predicate-object fact with provenance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Triplet {
    #[serde(default, deserialize_with = "lenient_string")]
    pub subject: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub subject_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub predicate: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub object: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub object_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_properties")]
    pub properties: Map<String, Value>,

    /// File the record was read from; attached by the loader
    #[serde(skip)]
    pub source_file: String,
    /// Domain the record belongs to; attached by the loader
    #[serde(skip)]
    pub source_domain: String,
}

impl Triplet {
    /// Effective subject label
    pub fn subject_type(&self) -> &str {
        self.subject_type.as_deref().unwrap_or(DEFAULT_ENTITY_TYPE)
    }

    /// Effective object label
    pub fn object_type(&self) -> &str {
        self.object_type.as_deref().unwrap_or(DEFAULT_ENTITY_TYPE)
    }

    /// Effective relationship type
    pub fn predicate(&self) -> &str {
        self.predicate.as_deref().unwrap_or(DEFAULT_PREDICATE)
    }

    /// Identity of the fact for deduplication
    pub fn dedup_key(&self) -> DedupKey {
        DedupKey {
            subject: normalize_name(&self.subject),
            subject_type: self.subject_type().to_string(),
            predicate: self.predicate().to_string(),
            object: normalize_name(&self.object),
            object_type: self.object_type().to_string(),
        }
    }

    /// Attach provenance
    pub fn with_source(mut self, file: impl Into<String>, domain: impl Into<String>) -> Self {
        self.source_file = file.into();
        self.source_domain = domain.into();
        self
    }
}

/// The 5-tuple that decides whether two triplets state the same fact
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DedupKey {
    pub subject: String,
    pub subject_type: String,
    pub predicate: String,
    pub object: String,
    pub object_type: String,
}

/// A curated, authoritative entity
///
/// `type` becomes the node label and `name` the node key; every other field is
/// kept as an attribute.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Seed {
    #[serde(rename = "type", default, deserialize_with = "lenient_opt_string")]
    pub seed_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Seed {
    /// Effective label
    pub fn label(&self) -> &str {
        self.seed_type.as_deref().unwrap_or(DEFAULT_SEED_TYPE)
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_to_string(&value))
}

fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => None,
        other => Some(coerce_to_string(&other)),
    })
}

fn lenient_properties<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Object(map) => map,
        _ => Map::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_apply_when_fields_absent() {
        let triplet: Triplet = serde_json::from_value(json!({
            "subject": "药A",
            "object": "高血压"
        }))
        .unwrap();

        assert_eq!(triplet.subject_type(), "Entity");
        assert_eq!(triplet.object_type(), "Entity");
        assert_eq!(triplet.predicate(), "RELATED_TO");
        assert!(triplet.properties.is_empty());
        assert!(triplet.source_file.is_empty());
    }

    #[test]
    fn test_lenient_coercion() {
        let triplet: Triplet = serde_json::from_value(json!({
            "subject": 12345,
            "subject_type": null,
            "predicate": "HAS_CODE",
            "object": true,
            "properties": ["not", "a", "map"]
        }))
        .unwrap();

        assert_eq!(triplet.subject, "12345");
        assert_eq!(triplet.object, "true");
        assert_eq!(triplet.subject_type, None);
        assert!(triplet.properties.is_empty());
    }

    #[test]
    fn test_provenance_is_never_read_from_input() {
        let triplet: Triplet = serde_json::from_value(json!({
            "subject": "a",
            "object": "b",
            "source_domain": "forged"
        }))
        .unwrap();
        assert!(triplet.source_domain.is_empty());
    }

    #[test]
    fn test_dedup_key_normalizes_names_only() {
        let a = Triplet {
            subject: "高血压 ".into(),
            subject_type: Some("Medical".into()),
            predicate: Some("TREATS".into()),
            object: "药\nA".into(),
            object_type: Some("Product".into()),
            ..Default::default()
        };
        let key = a.dedup_key();
        assert_eq!(key.subject, "高血压");
        assert_eq!(key.object, "药A");
        assert_eq!(key.subject_type, "Medical");

        let mut b = a.clone();
        b.subject_type = Some("Medical ".into());
        assert_ne!(a.dedup_key(), b.dedup_key());
    }

    #[test]
    fn test_seed_keeps_extra_attributes() {
        let seed: Seed = serde_json::from_value(json!({
            "type": "Product",
            "name": "平安e生保",
            "category": "护理险",
            "aliases": ["e生保"]
        }))
        .unwrap();

        assert_eq!(seed.label(), "Product");
        assert_eq!(seed.name, "平安e生保");
        assert_eq!(seed.attributes.len(), 2);
        assert!(!seed.attributes.contains_key("type"));
        assert!(!seed.attributes.contains_key("name"));
    }

    #[test]
    fn test_seed_default_label() {
        let seed: Seed = serde_json::from_value(json!({ "name": "等待期" })).unwrap();
        assert_eq!(seed.label(), "Concept");
    }
}
