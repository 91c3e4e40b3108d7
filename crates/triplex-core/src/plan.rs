//! Write planning
//!
//! A batch of deduplicated triplets is turned into groups that share one
//! (subject label, object label, relation) shape. Stores fix labels and
//! relation types at statement-build time, so each group maps to one
//! statement template with its rows bound as data.

use serde::Serialize;
use std::collections::HashMap;

use crate::flatten::{flatten_properties, FlatProperties, PropertyValue};
use crate::identifier::{Identifier, IdentifierError};
use crate::normalize::normalize_name;
use crate::record::{Seed, Triplet};

/// Property key carrying the originating domain
pub const SOURCE_DOMAIN_KEY: &str = "source_domain";
/// Property key carrying the originating file
pub const SOURCE_FILE_KEY: &str = "source_file";
/// Property key marking curated seed nodes
pub const IS_SEED_KEY: &str = "is_seed";

/// One edge to write: normalized endpoint names and flat edge properties
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WriteRow {
    pub subject: String,
    pub object: String,
    pub properties: FlatProperties,
}

/// Rows sharing one statement shape
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WriteGroup {
    pub subject_label: Identifier,
    pub object_label: Identifier,
    pub relation: Identifier,
    pub rows: Vec<WriteRow>,
}

/// A batch ready for [`GraphStore::write_batch`](crate::GraphStore::write_batch)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WritePlan {
    pub domain: String,
    pub groups: Vec<WriteGroup>,
}

impl WritePlan {
    /// Resolve defaults, normalize names, flatten properties, stamp
    /// provenance, then group by sanitized shape.
    ///
    /// Groups appear in the order their shape is first seen; rows keep input
    /// order within a group.
    pub fn prepare(domain: &str, records: &[Triplet]) -> Result<Self, IdentifierError> {
        let mut slots: HashMap<(Identifier, Identifier, Identifier), usize> = HashMap::new();
        let mut groups: Vec<WriteGroup> = Vec::new();

        for record in records {
            let subject_label = Identifier::sanitize(record.subject_type())?;
            let object_label = Identifier::sanitize(record.object_type())?;
            let relation = Identifier::sanitize(record.predicate())?;

            let mut properties = flatten_properties(&record.properties);
            properties.insert(SOURCE_DOMAIN_KEY.to_string(), PropertyValue::from(domain));
            properties.insert(
                SOURCE_FILE_KEY.to_string(),
                PropertyValue::from(record.source_file.as_str()),
            );

            let row = WriteRow {
                subject: normalize_name(&record.subject),
                object: normalize_name(&record.object),
                properties,
            };

            let shape = (subject_label, object_label, relation);
            match slots.get(&shape) {
                Some(&slot) => groups[slot].rows.push(row),
                None => {
                    slots.insert(shape.clone(), groups.len());
                    let (subject_label, object_label, relation) = shape;
                    groups.push(WriteGroup {
                        subject_label,
                        object_label,
                        relation,
                        rows: vec![row],
                    });
                }
            }
        }

        Ok(Self {
            domain: domain.to_string(),
            groups,
        })
    }

    pub fn row_count(&self) -> usize {
        self.groups.iter().map(|g| g.rows.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// One seed node: normalized name and its flat attributes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeedRow {
    pub name: String,
    pub properties: FlatProperties,
}

/// Seeds sharing one label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeedGroup {
    pub label: Identifier,
    pub rows: Vec<SeedRow>,
}

/// Seeds grouped by sanitized label
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeedPlan {
    pub groups: Vec<SeedGroup>,
    /// Seeds dropped because their normalized name was empty
    pub skipped: usize,
}

impl SeedPlan {
    /// Group seeds by label; every row carries `is_seed = true`.
    pub fn prepare(seeds: &[Seed]) -> Result<Self, IdentifierError> {
        let mut slots: HashMap<Identifier, usize> = HashMap::new();
        let mut plan = SeedPlan::default();

        for seed in seeds {
            let name = normalize_name(&seed.name);
            if name.is_empty() {
                plan.skipped += 1;
                continue;
            }

            let label = Identifier::sanitize(seed.label())?;
            let mut properties = flatten_properties(&seed.attributes);
            properties.insert(IS_SEED_KEY.to_string(), PropertyValue::Bool(true));
            let row = SeedRow { name, properties };

            match slots.get(&label) {
                Some(&slot) => plan.groups[slot].rows.push(row),
                None => {
                    slots.insert(label.clone(), plan.groups.len());
                    plan.groups.push(SeedGroup {
                        label,
                        rows: vec![row],
                    });
                }
            }
        }

        Ok(plan)
    }

    pub fn row_count(&self) -> usize {
        self.groups.iter().map(|g| g.rows.len()).sum()
    }

    /// Labels in first-seen order
    pub fn labels(&self) -> impl Iterator<Item = &Identifier> {
        self.groups.iter().map(|g| &g.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn triplet(value: serde_json::Value) -> Triplet {
        serde_json::from_value::<Triplet>(value)
            .unwrap()
            .with_source("drugs.json", "medicine")
    }

    #[test]
    fn test_groups_by_shape_in_first_seen_order() {
        let records = vec![
            triplet(json!({"subject": "药A", "subject_type": "Product", "predicate": "TREATS", "object": "高血压", "object_type": "Medical"})),
            triplet(json!({"subject": "公司X", "subject_type": "Company", "predicate": "MAKES", "object": "药A", "object_type": "Product"})),
            triplet(json!({"subject": "药B", "subject_type": "Product", "predicate": "TREATS", "object": "糖尿病", "object_type": "Medical"})),
        ];

        let plan = WritePlan::prepare("medicine", &records).unwrap();
        assert_eq!(plan.groups.len(), 2);
        assert_eq!(plan.groups[0].relation.as_str(), "TREATS");
        assert_eq!(plan.groups[0].rows.len(), 2);
        assert_eq!(plan.groups[1].subject_label.as_str(), "Company");
        assert_eq!(plan.row_count(), 3);
    }

    #[test]
    fn test_rows_are_normalized_and_stamped() {
        let records = vec![triplet(json!({
            "subject": "高血 压\n",
            "object": "药 A",
            "properties": {"dose": {"max": 2}, "note": null}
        }))];

        let plan = WritePlan::prepare("medicine", &records).unwrap();
        let group = &plan.groups[0];
        assert_eq!(group.subject_label.as_str(), "Entity");
        assert_eq!(group.relation.as_str(), "RELATED_TO");

        let row = &group.rows[0];
        assert_eq!(row.subject, "高血压");
        assert_eq!(row.object, "药A");
        assert_eq!(row.properties.get("dose_max"), Some(&PropertyValue::Int(2)));
        assert_eq!(
            row.properties.get(SOURCE_DOMAIN_KEY),
            Some(&PropertyValue::from("medicine"))
        );
        assert_eq!(
            row.properties.get(SOURCE_FILE_KEY),
            Some(&PropertyValue::from("drugs.json"))
        );
        assert!(!row.properties.contains_key("note"));
    }

    #[test]
    fn test_hostile_types_are_sanitized_and_may_merge_groups() {
        let records = vec![
            triplet(json!({"subject": "a", "object": "b", "predicate": "X Y"})),
            triplet(json!({"subject": "c", "object": "d", "predicate": "X-Y"})),
            triplet(json!({"subject": "e", "object": "f", "subject_type": "Foo`; DROP"})),
        ];

        let plan = WritePlan::prepare("insurance", &records).unwrap();
        assert_eq!(plan.groups.len(), 2);
        assert_eq!(plan.groups[0].relation.as_str(), "X_Y");
        assert_eq!(plan.groups[0].rows.len(), 2);
        assert_eq!(plan.groups[1].subject_label.as_str(), "Foo___DROP");
    }

    #[test]
    fn test_empty_type_is_an_error() {
        let records = vec![triplet(json!({"subject": "a", "object": "b", "predicate": ""}))];
        assert!(WritePlan::prepare("medicine", &records).is_err());
    }

    #[test]
    fn test_seed_plan_marks_and_groups() {
        let seeds: Vec<Seed> = serde_json::from_value(json!([
            {"type": "Product", "name": "平安 e生保", "category": "医疗险"},
            {"name": "等待期"},
            {"type": "Product", "name": "药A", "is_seed": false},
            {"type": "Product", "name": "  "}
        ]))
        .unwrap();

        let plan = SeedPlan::prepare(&seeds).unwrap();
        assert_eq!(plan.groups.len(), 2);
        assert_eq!(plan.skipped, 1);
        assert_eq!(plan.row_count(), 3);

        let products = &plan.groups[0];
        assert_eq!(products.label.as_str(), "Product");
        assert_eq!(products.rows[0].name, "平安e生保");
        assert_eq!(
            products.rows[0].properties.get("category"),
            Some(&PropertyValue::from("医疗险"))
        );
        // The flag cannot be switched off by an attribute
        assert_eq!(
            products.rows[1].properties.get(IS_SEED_KEY),
            Some(&PropertyValue::Bool(true))
        );

        assert_eq!(plan.groups[1].label.as_str(), "Concept");
    }
}
