//! In-memory [`GraphStore`] for tests and dry runs

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::{
    sort_counts, CountEntry, EdgeKey, EdgeSummary, GraphStore, NeighborTriple, NodeKey,
    StoreError, StoreResult,
};
use crate::flatten::FlatProperties;
use crate::identifier::Identifier;
use crate::plan::{SeedGroup, WriteGroup, SOURCE_DOMAIN_KEY};

/// Stored state of one node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeData {
    /// Domain of the first writer; seeds carry none
    pub source_domain: Option<String>,
    pub properties: FlatProperties,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct GraphState {
    nodes: BTreeMap<NodeKey, NodeData>,
    edges: BTreeMap<EdgeKey, FlatProperties>,
    indexes: BTreeSet<(Identifier, String)>,
}

impl GraphState {
    fn merge_node(&mut self, label: &Identifier, name: &str, domain: Option<&str>) -> NodeKey {
        let key = NodeKey::new(label.clone(), name);
        self.nodes.entry(key.clone()).or_insert_with(|| NodeData {
            source_domain: domain.map(str::to_string),
            properties: FlatProperties::new(),
        });
        key
    }

    fn merge_edge(
        &mut self,
        from: &NodeKey,
        relation: &Identifier,
        to: &NodeKey,
    ) -> StoreResult<EdgeKey> {
        for endpoint in [from, to] {
            if !self.nodes.contains_key(endpoint) {
                return Err(StoreError::Query(format!(
                    "Node {}:{} does not exist",
                    endpoint.label, endpoint.name
                )));
            }
        }
        let key = EdgeKey {
            from: from.clone(),
            relation: relation.clone(),
            to: to.clone(),
        };
        self.edges.entry(key.clone()).or_default();
        Ok(key)
    }

    fn set_node_properties(
        &mut self,
        node: &NodeKey,
        properties: &FlatProperties,
    ) -> StoreResult<()> {
        let data = self.nodes.get_mut(node).ok_or_else(|| {
            StoreError::Query(format!("Node {}:{} does not exist", node.label, node.name))
        })?;
        data.properties
            .extend(properties.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(())
    }

    fn set_edge_properties(
        &mut self,
        edge: &EdgeKey,
        properties: &FlatProperties,
    ) -> StoreResult<()> {
        let data = self.edges.get_mut(edge).ok_or_else(|| {
            StoreError::Query(format!(
                "Edge {}-[{}]->{} does not exist",
                edge.from.name, edge.relation, edge.to.name
            ))
        })?;
        data.extend(properties.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(())
    }
}

/// Mutations of one batch plus the prior value of every key they touched.
///
/// `None` means the key did not exist before the batch.
struct Batch<'a> {
    state: &'a mut GraphState,
    nodes: Vec<(NodeKey, Option<NodeData>)>,
    edges: Vec<(EdgeKey, Option<FlatProperties>)>,
}

impl<'a> Batch<'a> {
    fn new(state: &'a mut GraphState) -> Self {
        Self {
            state,
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    fn merge_node(&mut self, label: &Identifier, name: &str, domain: Option<&str>) -> NodeKey {
        let before = self.state.nodes.len();
        let key = self.state.merge_node(label, name, domain);
        if self.state.nodes.len() > before {
            self.nodes.push((key.clone(), None));
        }
        key
    }

    fn merge_edge(
        &mut self,
        from: &NodeKey,
        relation: &Identifier,
        to: &NodeKey,
    ) -> StoreResult<EdgeKey> {
        let before = self.state.edges.len();
        let key = self.state.merge_edge(from, relation, to)?;
        if self.state.edges.len() > before {
            self.edges.push((key.clone(), None));
        }
        Ok(key)
    }

    fn set_node_properties(
        &mut self,
        node: &NodeKey,
        properties: &FlatProperties,
    ) -> StoreResult<()> {
        let prior = self.state.nodes.get(node).cloned();
        self.state.set_node_properties(node, properties)?;
        self.nodes.push((node.clone(), prior));
        Ok(())
    }

    fn set_edge_properties(
        &mut self,
        edge: &EdgeKey,
        properties: &FlatProperties,
    ) -> StoreResult<()> {
        let prior = self.state.edges.get(edge).cloned();
        self.state.set_edge_properties(edge, properties)?;
        self.edges.push((edge.clone(), prior));
        Ok(())
    }

    /// Restore every touched key, newest change first
    fn rollback(self) {
        for (key, prior) in self.edges.into_iter().rev() {
            match prior {
                Some(properties) => self.state.edges.insert(key, properties),
                None => self.state.edges.remove(&key),
            };
        }
        for (key, prior) in self.nodes.into_iter().rev() {
            match prior {
                Some(data) => self.state.nodes.insert(key, data),
                None => self.state.nodes.remove(&key),
            };
        }
    }
}

/// In-memory property graph
///
/// Batches and seed imports record the prior value of each key they change
/// and restore them if any row fails, so a failing batch leaves no trace.
#[derive(Debug, Default)]
pub struct InMemoryGraphStore {
    state: RwLock<GraphState>,
}

impl InMemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.state.read().nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.state.read().edges.len()
    }

    pub fn node(&self, label: &str, name: &str) -> Option<NodeData> {
        let label = Identifier::sanitize(label).ok()?;
        self.state
            .read()
            .nodes
            .get(&NodeKey::new(label, name))
            .cloned()
    }

    pub fn edge(&self, key: &EdgeKey) -> Option<FlatProperties> {
        self.state.read().edges.get(key).cloned()
    }

    /// Edges between two named nodes, any labels or relation
    pub fn edges_between(&self, from: &str, to: &str) -> Vec<(EdgeKey, FlatProperties)> {
        self.state
            .read()
            .edges
            .iter()
            .filter(|(k, _)| k.from.name == from && k.to.name == to)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn has_index(&self, label: &str, property: &str) -> bool {
        Identifier::sanitize(label)
            .map(|label| {
                self.state
                    .read()
                    .indexes
                    .contains(&(label, property.to_string()))
            })
            .unwrap_or(false)
    }

    fn apply_atomically<F>(&self, apply: F) -> StoreResult<()>
    where
        F: FnOnce(&mut Batch<'_>) -> StoreResult<()>,
    {
        let mut guard = self.state.write();
        let mut batch = Batch::new(&mut guard);
        let result = apply(&mut batch);
        if result.is_err() {
            batch.rollback();
        }
        result
    }
}

fn counts<I>(keys: I) -> Vec<CountEntry>
where
    I: IntoIterator<Item = String>,
{
    let mut tally: HashMap<String, usize> = HashMap::new();
    for key in keys {
        *tally.entry(key).or_default() += 1;
    }
    let mut entries: Vec<CountEntry> = tally
        .into_iter()
        .map(|(key, count)| CountEntry { key, count })
        .collect();
    sort_counts(&mut entries);
    entries
}

fn edge_domain(properties: &FlatProperties) -> Option<String> {
    properties
        .get(SOURCE_DOMAIN_KEY)
        .and_then(|v| v.as_text())
        .map(str::to_string)
}

#[async_trait]
impl GraphStore for InMemoryGraphStore {
    async fn merge_node(
        &self,
        label: &Identifier,
        name: &str,
        domain: Option<&str>,
    ) -> StoreResult<NodeKey> {
        Ok(self.state.write().merge_node(label, name, domain))
    }

    async fn merge_edge(
        &self,
        from: &NodeKey,
        relation: &Identifier,
        to: &NodeKey,
    ) -> StoreResult<EdgeKey> {
        self.state.write().merge_edge(from, relation, to)
    }

    async fn set_node_properties(
        &self,
        node: &NodeKey,
        properties: &FlatProperties,
    ) -> StoreResult<()> {
        self.state.write().set_node_properties(node, properties)
    }

    async fn set_edge_properties(
        &self,
        edge: &EdgeKey,
        properties: &FlatProperties,
    ) -> StoreResult<()> {
        self.state.write().set_edge_properties(edge, properties)
    }

    async fn write_batch(&self, groups: &[WriteGroup], domain: &str) -> StoreResult<()> {
        self.apply_atomically(|batch| {
            for group in groups {
                for row in &group.rows {
                    let from =
                        batch.merge_node(&group.subject_label, &row.subject, Some(domain));
                    let to = batch.merge_node(&group.object_label, &row.object, Some(domain));
                    let edge = batch.merge_edge(&from, &group.relation, &to)?;
                    batch.set_edge_properties(&edge, &row.properties)?;
                }
            }
            Ok(())
        })
    }

    async fn write_seeds(&self, groups: &[SeedGroup]) -> StoreResult<()> {
        self.apply_atomically(|batch| {
            for group in groups {
                for row in &group.rows {
                    let node = batch.merge_node(&group.label, &row.name, None);
                    batch.set_node_properties(&node, &row.properties)?;
                }
            }
            Ok(())
        })
    }

    async fn create_index(&self, label: &Identifier, property: &str) -> StoreResult<bool> {
        Ok(self
            .state
            .write()
            .indexes
            .insert((label.clone(), property.to_string())))
    }

    async fn clear_round(&self, limit: usize) -> StoreResult<usize> {
        let mut state = self.state.write();
        let doomed: BTreeSet<NodeKey> = state.nodes.keys().take(limit).cloned().collect();
        for key in &doomed {
            state.nodes.remove(key);
        }
        state
            .edges
            .retain(|edge, _| !doomed.contains(&edge.from) && !doomed.contains(&edge.to));
        Ok(doomed.len())
    }

    async fn count_nodes_by_label(&self) -> StoreResult<Vec<CountEntry>> {
        let state = self.state.read();
        Ok(counts(state.nodes.keys().map(|k| k.label.to_string())))
    }

    async fn count_edges_by_type(&self) -> StoreResult<Vec<CountEntry>> {
        let state = self.state.read();
        Ok(counts(state.edges.keys().map(|k| k.relation.to_string())))
    }

    async fn count_edges_by_domain(&self) -> StoreResult<Vec<CountEntry>> {
        let state = self.state.read();
        Ok(counts(
            state
                .edges
                .values()
                .map(|props| edge_domain(props).unwrap_or_default()),
        ))
    }

    async fn count_nodes_by_domain(&self) -> StoreResult<Vec<CountEntry>> {
        let state = self.state.read();
        Ok(counts(
            state
                .nodes
                .values()
                .map(|data| data.source_domain.clone().unwrap_or_default()),
        ))
    }

    async fn edge_summaries(&self, limit: Option<usize>) -> StoreResult<Vec<EdgeSummary>> {
        let state = self.state.read();
        Ok(state
            .edges
            .iter()
            .take(limit.unwrap_or(usize::MAX))
            .map(|(key, props)| EdgeSummary {
                head: key.from.name.clone(),
                head_label: key.from.label.to_string(),
                relation: key.relation.to_string(),
                tail: key.to.name.clone(),
                tail_label: key.to.label.to_string(),
                source_domain: edge_domain(props),
            })
            .collect())
    }

    async fn node_names(&self, limit: Option<usize>) -> StoreResult<Vec<String>> {
        let state = self.state.read();
        let names: BTreeSet<&str> = state.nodes.keys().map(|k| k.name.as_str()).collect();
        Ok(names
            .into_iter()
            .take(limit.unwrap_or(usize::MAX))
            .map(str::to_string)
            .collect())
    }

    async fn neighbors(&self, name: &str) -> StoreResult<Vec<NeighborTriple>> {
        let state = self.state.read();
        let mut triples: Vec<NeighborTriple> = state
            .edges
            .keys()
            .filter(|k| k.from.name == name || k.to.name == name)
            .map(|k| NeighborTriple {
                head: k.from.name.clone(),
                relation: k.relation.to_string(),
                tail: k.to.name.clone(),
            })
            .collect();
        triples.sort();
        Ok(triples)
    }
}
