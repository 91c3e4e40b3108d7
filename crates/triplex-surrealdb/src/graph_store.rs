//! [`GraphStore`] on SurrealDB
//!
//! Node labels become tables keyed by the normalized name
//! (`Product:['药A']`), relation types become relation tables created with
//! `RELATE`. Every table written is recorded in the
//! [`REGISTRY_TABLE`](crate::statements::REGISTRY_TABLE) so the read side can
//! enumerate them without parsing `INFO FOR DB`.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info};
use triplex_config::StoreConfig;
use triplex_core::store::sort_counts;
use triplex_core::{
    CountEntry, EdgeKey, EdgeSummary, FlatProperties, GraphStore, Identifier, NeighborTriple,
    NodeKey, SeedGroup, StoreError, StoreResult, WriteGroup,
};

use crate::statements::{
    self, Statement, KIND_INDEX, KIND_NODE, KIND_RELATION, REGISTRY_TABLE,
};
use crate::surreal_client::SurrealClient;

/// SurrealDB-backed graph store
#[derive(Debug, Clone)]
pub struct SurrealGraphStore {
    client: SurrealClient,
}

impl SurrealGraphStore {
    pub fn new(client: SurrealClient) -> Self {
        Self { client }
    }

    /// Open the configured database.
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        let client = SurrealClient::new(config.clone()).await?;
        info!(
            "Connected to SurrealDB at {} ({}/{})",
            if config.is_memory() { ":memory:" } else { config.path.as_str() },
            config.namespace,
            config.database
        );
        Ok(Self::new(client))
    }

    pub fn client(&self) -> &SurrealClient {
        &self.client
    }

    async fn run(&self, statement: Statement) -> StoreResult<()> {
        self.client
            .execute(&statement.sql, &[statement.params])
            .await
    }

    /// Tables of one kind recorded in the registry, sorted by name
    async fn registered(&self, kind: &str) -> StoreResult<Vec<String>> {
        let rows = self
            .client
            .query(
                "SELECT VALUE name FROM type::table($registry) WHERE kind = $kind ORDER BY name",
                &[json!({ "registry": REGISTRY_TABLE, "kind": kind })],
            )
            .await?;
        Ok(rows.iter().filter_map(text).collect())
    }

    async fn count_table(&self, table: &str) -> StoreResult<usize> {
        let rows = self
            .client
            .query(
                "SELECT count() AS count FROM type::table($table) GROUP ALL",
                &[json!({ "table": table })],
            )
            .await?;
        Ok(rows.first().map(|row| count(&row["count"])).unwrap_or(0))
    }

    async fn count_tables(&self, kind: &str) -> StoreResult<Vec<CountEntry>> {
        let mut entries = Vec::new();
        for table in self.registered(kind).await? {
            let n = self.count_table(&table).await?;
            if n > 0 {
                entries.push(CountEntry::new(table, n));
            }
        }
        sort_counts(&mut entries);
        Ok(entries)
    }

    async fn count_by_domain(&self, kind: &str) -> StoreResult<Vec<CountEntry>> {
        let mut tally: HashMap<String, usize> = HashMap::new();
        for table in self.registered(kind).await? {
            let rows = self
                .client
                .query(
                    "SELECT source_domain, count() AS count FROM type::table($table) \
                     GROUP BY source_domain",
                    &[json!({ "table": table })],
                )
                .await?;
            for row in rows {
                let domain = text(&row["source_domain"]).unwrap_or_default();
                *tally.entry(domain).or_default() += count(&row["count"]);
            }
        }
        let mut entries: Vec<CountEntry> = tally
            .into_iter()
            .filter(|(_, n)| *n > 0)
            .map(|(key, n)| CountEntry::new(key, n))
            .collect();
        sort_counts(&mut entries);
        Ok(entries)
    }
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn count(value: &Value) -> usize {
    value.as_u64().unwrap_or(0) as usize
}

#[async_trait]
impl GraphStore for SurrealGraphStore {
    async fn merge_node(
        &self,
        label: &Identifier,
        name: &str,
        domain: Option<&str>,
    ) -> StoreResult<NodeKey> {
        self.run(statements::merge_node(label, name, domain)).await?;
        Ok(NodeKey::new(label.clone(), name))
    }

    async fn merge_edge(
        &self,
        from: &NodeKey,
        relation: &Identifier,
        to: &NodeKey,
    ) -> StoreResult<EdgeKey> {
        let check = statements::endpoints_exist(&from.label, &from.name, &to.label, &to.name);
        let found = self.client.query(&check.sql, &[check.params]).await?;
        let missing = found.len() != 2 || found.iter().any(|n| count(n) == 0);
        if missing {
            return Err(StoreError::Query(format!(
                "Cannot relate {}:{} -[{}]-> {}:{}: endpoint does not exist",
                from.label, from.name, relation, to.label, to.name
            )));
        }

        self.run(statements::merge_edge(
            &from.label,
            &from.name,
            relation,
            &to.label,
            &to.name,
        ))
        .await?;

        Ok(EdgeKey {
            from: from.clone(),
            relation: relation.clone(),
            to: to.clone(),
        })
    }

    async fn set_node_properties(
        &self,
        node: &NodeKey,
        properties: &FlatProperties,
    ) -> StoreResult<()> {
        self.run(statements::set_node_properties(
            &node.label,
            &node.name,
            properties,
        ))
        .await
    }

    async fn set_edge_properties(
        &self,
        edge: &EdgeKey,
        properties: &FlatProperties,
    ) -> StoreResult<()> {
        self.run(statements::set_edge_properties(
            &edge.from.label,
            &edge.from.name,
            &edge.relation,
            &edge.to.label,
            &edge.to.name,
            properties,
        ))
        .await
    }

    async fn write_batch(&self, groups: &[WriteGroup], domain: &str) -> StoreResult<()> {
        if groups.is_empty() {
            return Ok(());
        }
        debug!(
            "Writing {} groups for domain {} in one transaction",
            groups.len(),
            domain
        );
        self.run(statements::write_batch(groups, domain)).await
    }

    async fn write_seeds(&self, groups: &[SeedGroup]) -> StoreResult<()> {
        if groups.is_empty() {
            return Ok(());
        }
        self.run(statements::write_seeds(groups)).await
    }

    async fn create_index(&self, label: &Identifier, property: &str) -> StoreResult<bool> {
        let property = Identifier::sanitize(property)?;
        let key = format!("{}.{}", label, property);

        let existing = self
            .client
            .query(
                "SELECT VALUE id FROM type::thing($registry, [$kind, $key])",
                &[json!({ "registry": REGISTRY_TABLE, "kind": KIND_INDEX, "key": key })],
            )
            .await?;
        if !existing.is_empty() {
            return Ok(false);
        }

        self.run(statements::define_index(label, &property))
            .await
            .map_err(|e| StoreError::Schema(format!("Failed to index {}: {}", key, e)))?;
        debug!("Created index on {}", key);
        Ok(true)
    }

    async fn clear_round(&self, limit: usize) -> StoreResult<usize> {
        let tables = self.registered(KIND_NODE).await?;
        let relations = self.registered(KIND_RELATION).await?;

        let mut remaining = limit;
        let mut deleted = 0;
        for table in tables {
            if remaining == 0 {
                break;
            }
            let statement = statements::clear_table(&table, &relations, remaining);
            let rows = self
                .client
                .query_indexed(&statement.sql, &[statement.params], 3)
                .await?;
            let n = rows.first().map(count).unwrap_or(0).min(remaining);
            deleted += n;
            remaining -= n;
        }
        Ok(deleted)
    }

    async fn count_nodes_by_label(&self) -> StoreResult<Vec<CountEntry>> {
        self.count_tables(KIND_NODE).await
    }

    async fn count_edges_by_type(&self) -> StoreResult<Vec<CountEntry>> {
        self.count_tables(KIND_RELATION).await
    }

    async fn count_edges_by_domain(&self) -> StoreResult<Vec<CountEntry>> {
        self.count_by_domain(KIND_RELATION).await
    }

    async fn count_nodes_by_domain(&self) -> StoreResult<Vec<CountEntry>> {
        self.count_by_domain(KIND_NODE).await
    }

    async fn edge_summaries(&self, limit: Option<usize>) -> StoreResult<Vec<EdgeSummary>> {
        let mut summaries = Vec::new();
        for table in self.registered(KIND_RELATION).await? {
            let remaining = match limit {
                Some(limit) if summaries.len() >= limit => break,
                Some(limit) => Some(limit - summaries.len()),
                None => None,
            };

            let mut sql = String::from(
                "SELECT in.name AS head, record::tb(in) AS head_label, out.name AS tail, \
                 record::tb(out) AS tail_label, source_domain FROM type::table($table)",
            );
            if remaining.is_some() {
                sql.push_str(" LIMIT $limit");
            }
            let rows = self
                .client
                .query(&sql, &[json!({ "table": table, "limit": remaining })])
                .await?;

            summaries.extend(rows.iter().map(|row| EdgeSummary {
                head: text(&row["head"]).unwrap_or_default(),
                head_label: text(&row["head_label"]).unwrap_or_default(),
                relation: table.clone(),
                tail: text(&row["tail"]).unwrap_or_default(),
                tail_label: text(&row["tail_label"]).unwrap_or_default(),
                source_domain: text(&row["source_domain"]),
            }));
        }
        Ok(summaries)
    }

    async fn node_names(&self, limit: Option<usize>) -> StoreResult<Vec<String>> {
        let mut names = BTreeSet::new();
        for table in self.registered(KIND_NODE).await? {
            let rows = self
                .client
                .query(
                    "SELECT VALUE name FROM type::table($table)",
                    &[json!({ "table": table })],
                )
                .await?;
            names.extend(rows.iter().filter_map(text));
        }
        Ok(names
            .into_iter()
            .take(limit.unwrap_or(usize::MAX))
            .collect())
    }

    async fn neighbors(&self, name: &str) -> StoreResult<Vec<NeighborTriple>> {
        let mut triples = Vec::new();
        for table in self.registered(KIND_RELATION).await? {
            let rows = self
                .client
                .query(
                    "SELECT in.name AS head, out.name AS tail FROM type::table($table) \
                     WHERE in.name = $name OR out.name = $name",
                    &[json!({ "table": table, "name": name })],
                )
                .await?;
            triples.extend(rows.iter().map(|row| NeighborTriple {
                head: text(&row["head"]).unwrap_or_default(),
                relation: table.clone(),
                tail: text(&row["tail"]).unwrap_or_default(),
            }));
        }
        triples.sort();
        Ok(triples)
    }
}
