//! SurrealDB client
//!
//! Thin wrapper around the official Rust SDK that binds JSON parameters,
//! checks every statement for errors and converts result sets back to plain
//! JSON values.
//!
//! ## Supported Backends
//!
//! - **Memory (Mem)**: in-memory storage for tests and dry runs
//! - **File (RocksDB)**: persistent storage for real loads
//!
//! ## Usage
//!
//! ```no_run
//! use triplex_surrealdb::SurrealClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), triplex_core::StoreError> {
//!     let client = SurrealClient::new_memory().await?;
//!     let rows = client.query("SELECT * FROM Product", &[]).await?;
//!     println!("{} rows", rows.len());
//!     Ok(())
//! }
//! ```

use serde_json::{Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use surrealdb::engine::local::Db;
use surrealdb::Surreal;
use tracing::trace;
use triplex_config::StoreConfig;
use triplex_core::{StoreError, StoreResult};

static ISOLATED_COUNTER: AtomicU64 = AtomicU64::new(0);

/// SurrealDB client
///
/// Uses an `Arc` internally so cloning is cheap and never opens a second
/// connection; RocksDB refuses a second handle on the same directory.
#[derive(Clone)]
pub struct SurrealClient {
    inner: Arc<SurrealClientInner>,
}

struct SurrealClientInner {
    db: Surreal<Db>,
    config: StoreConfig,
}

impl std::fmt::Debug for SurrealClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurrealClient")
            .field("config", &self.inner.config)
            .finish()
    }
}

impl SurrealClient {
    /// Open the database described by `config`.
    ///
    /// `":memory:"` or an empty path opens an in-memory database, anything
    /// else a RocksDB directory.
    pub async fn new(config: StoreConfig) -> StoreResult<Self> {
        use surrealdb::engine::local::{Mem, RocksDb};

        let db = if config.is_memory() {
            Surreal::new::<Mem>(()).await.map_err(|e| {
                StoreError::Connection(format!("Failed to create in-memory database: {}", e))
            })?
        } else {
            Surreal::new::<RocksDb>(config.path.as_str())
                .await
                .map_err(|e| {
                    StoreError::Connection(format!(
                        "Failed to open database at {}: {}",
                        config.path, e
                    ))
                })?
        };

        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await
            .map_err(|e| {
                StoreError::Connection(format!(
                    "Failed to use namespace '{}' and database '{}': {}",
                    config.namespace, config.database, e
                ))
            })?;

        Ok(Self {
            inner: Arc::new(SurrealClientInner { db, config }),
        })
    }

    /// In-memory database with the default namespace
    pub async fn new_memory() -> StoreResult<Self> {
        Self::new(StoreConfig {
            path: ":memory:".to_string(),
            ..StoreConfig::default()
        })
        .await
    }

    /// In-memory database under a namespace and database no other client uses
    pub async fn new_isolated_memory() -> StoreResult<Self> {
        let n = ISOLATED_COUNTER.fetch_add(1, Ordering::Relaxed);
        let thread_id = std::thread::current().id();
        Self::new(StoreConfig {
            path: ":memory:".to_string(),
            namespace: format!("test_{:?}", thread_id)
                .chars()
                .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
                .collect(),
            database: format!("db_{}", n),
        })
        .await
    }

    /// Run a query and return the rows of its first statement.
    ///
    /// Parameters are passed as JSON objects: every key of every object is
    /// bound as `$key`.
    pub async fn query(&self, sql: &str, params: &[Value]) -> StoreResult<Vec<Value>> {
        self.query_indexed(sql, params, 0).await
    }

    /// Run a multi-statement query and return the rows of statement `index`.
    pub async fn query_indexed(
        &self,
        sql: &str,
        params: &[Value],
        index: usize,
    ) -> StoreResult<Vec<Value>> {
        let mut response = self.run(sql, params).await?;

        let surreal_value: surrealdb::Value = response
            .take(index)
            .map_err(|e| StoreError::Query(format!("Failed to extract query results: {}", e)))?;

        // Round-trip through JSON to get at the typed variants
        let json_string = serde_json::to_string(&surreal_value).map_err(|e| {
            StoreError::Internal(format!("Failed to serialize SurrealDB value: {}", e))
        })?;
        let json_value: Value = serde_json::from_str(&json_string).map_err(|e| {
            StoreError::Internal(format!("Failed to parse JSON from SurrealDB value: {}", e))
        })?;

        Ok(match unwrap_surreal_value(json_value) {
            Value::Array(rows) => rows,
            Value::Null => Vec::new(),
            other => vec![other],
        })
    }

    /// Run statements for their effect only.
    pub async fn execute(&self, sql: &str, params: &[Value]) -> StoreResult<()> {
        self.run(sql, params).await.map(|_| ())
    }

    async fn run(&self, sql: &str, params: &[Value]) -> StoreResult<surrealdb::Response> {
        trace!("SurrealQL: {}", sql);
        let mut query = self.inner.db.query(sql);

        for param in params {
            if let Value::Object(map) = param {
                for (key, value) in map {
                    query = query.bind((key.clone(), value.clone()));
                }
            }
        }

        let response = query
            .await
            .map_err(|e| StoreError::Query(format!("Query execution failed: {}", e)))?;

        response.check().map_err(|e| {
            let message = e.to_string();
            if message.contains("transaction") {
                StoreError::Transaction(message)
            } else {
                StoreError::Query(format!("Query returned error: {}", message))
            }
        })
    }

    /// Underlying SDK handle
    pub fn db(&self) -> &Surreal<Db> {
        &self.inner.db
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }
}

/// Unwrap SurrealDB's typed JSON rendering into plain JSON.
///
/// `{"Number": {"Int": 30}}` becomes `30`, `{"Strand": "a"}` becomes `"a"`,
/// `{"Thing": {"tb": "t", "id": ..}}` becomes `"t:id"`, and the unit variants
/// `"None"` and `"Null"` become `null`.
pub(crate) fn unwrap_surreal_value(value: Value) -> Value {
    match value {
        Value::String(s) if s == "None" || s == "Null" => Value::Null,
        Value::Array(items) => Value::Array(items.into_iter().map(unwrap_surreal_value).collect()),
        Value::Object(mut obj) => {
            if obj.len() == 1 {
                if let Some(inner) = obj.remove("Number") {
                    return match inner {
                        Value::Object(mut num) => num
                            .remove("Int")
                            .or_else(|| num.remove("Float"))
                            .or_else(|| num.remove("Decimal"))
                            .unwrap_or(Value::Object(num)),
                        other => other,
                    };
                }
                if let Some(inner) = obj.remove("Strand").or_else(|| obj.remove("String")) {
                    return inner;
                }
                if let Some(inner) = obj.remove("Datetime").or_else(|| obj.remove("Uuid")) {
                    return inner;
                }
                if let Some(inner) = obj.remove("Bool") {
                    return inner;
                }
                if let Some(inner) = obj.remove("Array").or_else(|| obj.remove("Object")) {
                    return unwrap_surreal_value(inner);
                }
                if let Some(thing) = obj.remove("Thing") {
                    return unwrap_thing(thing);
                }
            }

            let unwrapped: Map<String, Value> = obj
                .into_iter()
                .map(|(k, v)| (k, unwrap_surreal_value(v)))
                .collect();
            Value::Object(unwrapped)
        }
        other => other,
    }
}

fn unwrap_thing(thing: Value) -> Value {
    let Value::Object(mut parts) = thing else {
        return thing;
    };
    let table = parts.remove("tb").and_then(|v| v.as_str().map(String::from));
    let id = parts.remove("id").map(unwrap_surreal_value);

    match (table, id) {
        (Some(table), Some(Value::String(id))) => Value::String(format!("{}:{}", table, id)),
        (Some(table), Some(Value::Number(id))) => Value::String(format!("{}:{}", table, id)),
        (Some(table), Some(other)) => Value::String(format!("{}:{}", table, other)),
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unwrap_tagged_values() {
        let wrapped = json!({
            "Array": [
                {"Object": {
                    "name": {"Strand": "药A"},
                    "count": {"Number": {"Int": 3}},
                    "ratio": {"Number": {"Float": 0.5}},
                    "is_seed": {"Bool": true},
                    "source_domain": "None",
                    "id": {"Thing": {"tb": "Product", "id": {"String": "药A"}}}
                }}
            ]
        });

        assert_eq!(
            unwrap_surreal_value(wrapped),
            json!([{
                "name": "药A",
                "count": 3,
                "ratio": 0.5,
                "is_seed": true,
                "source_domain": null,
                "id": "Product:药A"
            }])
        );
    }

    #[test]
    fn test_unwrap_leaves_plain_json_alone() {
        let plain = json!({"name": "x", "n": 1, "tags": ["a", "b"]});
        assert_eq!(unwrap_surreal_value(plain.clone()), plain);
    }

    #[tokio::test]
    async fn test_create_memory_client() {
        let client = SurrealClient::new_memory().await.unwrap();
        assert_eq!(client.config().namespace, "triplex");
        assert_eq!(client.config().database, "graph");
    }

    #[tokio::test]
    async fn test_query_with_bound_params() {
        let client = SurrealClient::new_isolated_memory().await.unwrap();

        client
            .execute(
                "CREATE type::thing($table, $name) SET name = $name, age = 30",
                &[json!({"table": "Person", "name": "Alice"})],
            )
            .await
            .unwrap();

        let rows = client
            .query(
                "SELECT name, age FROM type::table($table)",
                &[json!({"table": "Person"})],
            )
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], json!("Alice"));
        assert_eq!(rows[0]["age"], json!(30));
    }

    #[tokio::test]
    async fn test_query_indexed_selects_statement() {
        let client = SurrealClient::new_isolated_memory().await.unwrap();
        let rows = client
            .query_indexed("LET $x = 1; RETURN $x + 41;", &[], 1)
            .await
            .unwrap();
        assert_eq!(rows, vec![json!(42)]);
    }

    #[tokio::test]
    async fn test_failed_statement_is_an_error() {
        let client = SurrealClient::new_isolated_memory().await.unwrap();
        let result = client.execute("THROW 'boom';", &[]).await;
        assert!(result.is_err());
    }
}
