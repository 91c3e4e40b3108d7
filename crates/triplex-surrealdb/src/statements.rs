//! SurrealQL statement builders
//!
//! Node labels map to tables and relation types to relation tables. Table
//! names in `type::thing` / `type::table` calls are bound as parameters; only
//! the index target must be spelled out, and it comes from an [`Identifier`]
//! wrapped in backticks.
//!
//! Record ids are arrays so that every normalized name, the empty one
//! included, is a valid key:
//!
//! ```text
//! node  Product:['药A']
//! edge  TREATS:[Product:['药A'], Medical:['高血压']]
//! ```
//!
//! Edge ids are derived from their endpoints, so get-or-create on an edge is
//! a record lookup rather than a scan of the relation table.

use serde_json::{json, Map, Value};
use triplex_core::{FlatProperties, Identifier, SeedGroup, WriteGroup};

/// Table listing every node table, relation table and index written.
///
/// The hyphen keeps it outside the alphabet of [`Identifier`], so no label
/// or relation type can land in it.
pub const REGISTRY_TABLE: &str = "triplex-schema";

/// Registry kind for node tables
pub const KIND_NODE: &str = "node";
/// Registry kind for relation tables
pub const KIND_RELATION: &str = "relation";
/// Registry kind for provisioned indexes
pub const KIND_INDEX: &str = "index";

/// Field names SurrealDB reserves on records and edges
const RESERVED_FIELDS: [&str; 3] = ["id", "in", "out"];

/// Prefix given to properties that collide with a reserved field
pub const RESERVED_PREFIX: &str = "attr_";

/// A statement with the parameters it expects
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Value,
}

/// Backtick-quoted identifier
pub fn quoted(identifier: &Identifier) -> String {
    format!("`{}`", identifier)
}

/// Flat properties as a SurrealDB object, renaming reserved fields.
pub fn storable(properties: &FlatProperties) -> Value {
    let mut map = Map::new();
    for (key, value) in properties {
        let key = if RESERVED_FIELDS.contains(&key.as_str()) {
            format!("{}{}", RESERVED_PREFIX, key)
        } else {
            key.clone()
        };
        map.insert(key, json!(value));
    }
    Value::Object(map)
}

const REGISTER: &str = "FOR $entry IN $schema {
    UPSERT type::thing('triplex-schema', [$entry.kind, $entry.name])
        SET kind = $entry.kind, name = $entry.name;
};";

fn registry_entry(kind: &str, name: &Identifier) -> Value {
    json!({ "kind": kind, "name": name.as_str() })
}

/// One transaction writing every group of a batch.
///
/// Per row: create each endpoint if missing (stamping `$domain`), relate them
/// if the edge record does not exist yet, otherwise merge the row's
/// properties into it.
pub fn write_batch(groups: &[WriteGroup], domain: &str) -> Statement {
    let mut sql = String::from("BEGIN TRANSACTION;\n");
    sql.push_str(REGISTER);
    sql.push('\n');

    let mut params = Map::new();
    let mut schema = Vec::new();

    for (i, group) in groups.iter().enumerate() {
        sql.push_str(&format!(
            "FOR $p IN $rows_{i} {{
    LET $s = type::thing($subject_{i}, [$p.subject]);
    LET $o = type::thing($object_{i}, [$p.object]);
    LET $e = type::thing($relation_{i}, [$s, $o]);
    IF array::len((SELECT VALUE id FROM $s)) = 0 {{
        CREATE $s SET name = $p.subject, source_domain = $domain;
    }};
    IF array::len((SELECT VALUE id FROM $o)) = 0 {{
        CREATE $o SET name = $p.object, source_domain = $domain;
    }};
    IF array::len((SELECT VALUE id FROM $e)) = 0 {{
        RELATE $s->$e->$o CONTENT $p.properties;
    }} ELSE {{
        UPDATE $e MERGE $p.properties;
    }};
}};
"
        ));

        let rows: Vec<Value> = group
            .rows
            .iter()
            .map(|row| {
                json!({
                    "subject": row.subject,
                    "object": row.object,
                    "properties": storable(&row.properties),
                })
            })
            .collect();
        params.insert(format!("rows_{}", i), Value::Array(rows));
        params.insert(format!("subject_{}", i), json!(group.subject_label.as_str()));
        params.insert(format!("object_{}", i), json!(group.object_label.as_str()));
        params.insert(format!("relation_{}", i), json!(group.relation.as_str()));

        schema.push(registry_entry(KIND_NODE, &group.subject_label));
        schema.push(registry_entry(KIND_NODE, &group.object_label));
        schema.push(registry_entry(KIND_RELATION, &group.relation));
    }

    sql.push_str("COMMIT TRANSACTION;");
    params.insert("schema".to_string(), Value::Array(schema));
    params.insert("domain".to_string(), json!(domain));

    Statement {
        sql,
        params: Value::Object(params),
    }
}

/// One transaction writing every seed group.
///
/// Seed nodes get their attributes merged in and keep no home domain.
pub fn write_seeds(groups: &[SeedGroup]) -> Statement {
    let mut sql = String::from("BEGIN TRANSACTION;\n");
    sql.push_str(REGISTER);
    sql.push('\n');

    let mut params = Map::new();
    let mut schema = Vec::new();

    for (i, group) in groups.iter().enumerate() {
        sql.push_str(&format!(
            "FOR $p IN $seeds_{i} {{
    LET $n = type::thing($label_{i}, [$p.name]);
    UPSERT $n MERGE $p.properties;
    UPDATE $n SET name = $p.name;
}};
"
        ));

        let rows: Vec<Value> = group
            .rows
            .iter()
            .map(|row| json!({ "name": row.name, "properties": storable(&row.properties) }))
            .collect();
        params.insert(format!("seeds_{}", i), Value::Array(rows));
        params.insert(format!("label_{}", i), json!(group.label.as_str()));
        schema.push(registry_entry(KIND_NODE, &group.label));
    }

    sql.push_str("COMMIT TRANSACTION;");
    params.insert("schema".to_string(), Value::Array(schema));

    Statement {
        sql,
        params: Value::Object(params),
    }
}

/// Get-or-create one node; statement 0 returns nothing useful.
pub fn merge_node(label: &Identifier, name: &str, domain: Option<&str>) -> Statement {
    let sql = format!(
        "LET $n = type::thing($label, [$name]);
IF array::len((SELECT VALUE id FROM $n)) = 0 {{
    CREATE $n SET name = $name, source_domain = $domain;
}};
{REGISTER}"
    );
    Statement {
        sql,
        params: json!({
            "label": label.as_str(),
            "name": name,
            "domain": domain,
            "schema": [registry_entry(KIND_NODE, label)],
        }),
    }
}

/// Existence of both endpoints; returns `[from_count, to_count]`.
pub fn endpoints_exist(
    from_label: &Identifier,
    from_name: &str,
    to_label: &Identifier,
    to_name: &str,
) -> Statement {
    Statement {
        sql: "RETURN [
    array::len((SELECT VALUE id FROM type::thing($from_label, [$from_name]))),
    array::len((SELECT VALUE id FROM type::thing($to_label, [$to_name])))
];"
        .to_string(),
        params: json!({
            "from_label": from_label.as_str(),
            "from_name": from_name,
            "to_label": to_label.as_str(),
            "to_name": to_name,
        }),
    }
}

/// Get-or-create one edge between existing nodes.
pub fn merge_edge(
    from_label: &Identifier,
    from_name: &str,
    relation: &Identifier,
    to_label: &Identifier,
    to_name: &str,
) -> Statement {
    let sql = format!(
        "LET $s = type::thing($from_label, [$from_name]);
LET $o = type::thing($to_label, [$to_name]);
LET $e = type::thing($relation, [$s, $o]);
IF array::len((SELECT VALUE id FROM $e)) = 0 {{
    RELATE $s->$e->$o;
}};
{REGISTER}"
    );
    Statement {
        sql,
        params: json!({
            "from_label": from_label.as_str(),
            "from_name": from_name,
            "to_label": to_label.as_str(),
            "to_name": to_name,
            "relation": relation.as_str(),
            "schema": [registry_entry(KIND_RELATION, relation)],
        }),
    }
}

/// Merge properties into one node.
pub fn set_node_properties(
    label: &Identifier,
    name: &str,
    properties: &FlatProperties,
) -> Statement {
    Statement {
        sql: "UPDATE type::thing($label, [$name]) MERGE $properties;".to_string(),
        params: json!({
            "label": label.as_str(),
            "name": name,
            "properties": storable(properties),
        }),
    }
}

/// Merge properties into one edge.
pub fn set_edge_properties(
    from_label: &Identifier,
    from_name: &str,
    relation: &Identifier,
    to_label: &Identifier,
    to_name: &str,
    properties: &FlatProperties,
) -> Statement {
    Statement {
        sql: "LET $s = type::thing($from_label, [$from_name]);
LET $o = type::thing($to_label, [$to_name]);
UPDATE type::thing($relation, [$s, $o]) MERGE $properties;"
            .to_string(),
        params: json!({
            "relation": relation.as_str(),
            "from_label": from_label.as_str(),
            "from_name": from_name,
            "to_label": to_label.as_str(),
            "to_name": to_name,
            "properties": storable(properties),
        }),
    }
}

/// Define an index unless one with the same name exists.
pub fn define_index(label: &Identifier, property: &Identifier) -> Statement {
    let key = format!("{}.{}", label, property);
    Statement {
        sql: format!(
            "DEFINE INDEX IF NOT EXISTS {} ON TABLE {} FIELDS {};
UPSERT type::thing('triplex-schema', ['index', $key]) SET kind = 'index', name = $key;",
            quoted(&index_name(label, property)),
            quoted(label),
            quoted(property),
        ),
        params: json!({ "key": key }),
    }
}

/// Index name for `label.property`
pub fn index_name(label: &Identifier, property: &Identifier) -> Identifier {
    // Both parts are already allow-listed, so the join is too
    Identifier::sanitize(&format!("idx_{}_{}", label, property))
        .unwrap_or_else(|_| label.clone())
}

/// Delete up to `$limit` records of one node table with their edges.
///
/// Statement 3 returns the number of nodes deleted.
pub fn clear_table(table: &str, relations: &[String], limit: usize) -> Statement {
    Statement {
        sql: "LET $ids = (SELECT VALUE id FROM type::table($table) LIMIT $limit);
FOR $r IN $relations { DELETE type::table($r) WHERE in IN $ids OR out IN $ids; };
DELETE type::table($table) WHERE id IN $ids;
RETURN array::len($ids);"
            .to_string(),
        params: json!({ "table": table, "relations": relations, "limit": limit }),
    }
}
