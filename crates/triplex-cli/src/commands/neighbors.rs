//! Neighbors Command - one-hop lookup with name suggestions

use anyhow::{Context, Result};
use colored::Colorize;
use std::time::Duration;
use triplex_config::TriplexConfig;
use triplex_core::{normalize_name, GraphStore, NeighborTriple, NodeNameCache};

use crate::{factories, output};

/// Execute the neighbors command
pub async fn execute(config: TriplexConfig, name: String, suggestions: usize) -> Result<()> {
    let store = factories::create_store(&config.store).await?;
    let lookup = lookup(store, &name, suggestions).await?;

    if lookup.triples.is_empty() {
        output::warning(&format!("No edges touch '{}'", lookup.query));
        if !lookup.suggestions.is_empty() {
            println!("{}", "Did you mean:".bold());
            for suggestion in &lookup.suggestions {
                println!("  {}", suggestion);
            }
        }
    } else {
        println!("{}", output::neighbors_table(&lookup.triples));
    }
    Ok(())
}

/// Outcome of a neighbor lookup
#[derive(Debug, Clone, Default)]
pub struct Lookup {
    /// Normalized query
    pub query: String,
    pub triples: Vec<NeighborTriple>,
    /// Stored names containing the query, filled only when `triples` is empty
    pub suggestions: Vec<String>,
}

/// Normalize `name` and fetch its one-hop triples, falling back to names
/// that contain it.
pub async fn lookup(
    store: std::sync::Arc<dyn GraphStore>,
    name: &str,
    max_suggestions: usize,
) -> Result<Lookup> {
    let query = normalize_name(name);
    let triples = store
        .neighbors(&query)
        .await
        .with_context(|| format!("Failed to look up neighbors of '{}'", query))?;

    let suggestions = if triples.is_empty() && !query.is_empty() {
        let cache = NodeNameCache::new(store, Duration::from_secs(60), None);
        let names = cache.get(false).await.context("Failed to list node names")?;
        names
            .iter()
            .filter(|candidate| candidate.contains(query.as_str()))
            .take(max_suggestions)
            .cloned()
            .collect()
    } else {
        Vec::new()
    };

    Ok(Lookup {
        query,
        triples,
        suggestions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use triplex_core::{Identifier, InMemoryGraphStore};

    async fn store() -> Arc<dyn GraphStore> {
        let store = InMemoryGraphStore::new();
        let medical = Identifier::sanitize("Medical").unwrap();
        let product = Identifier::sanitize("Product").unwrap();
        let treats = Identifier::sanitize("TREATS").unwrap();
        let drug = store.merge_node(&product, "降压药A", Some("medicine")).await.unwrap();
        let condition = store.merge_node(&medical, "高血压", Some("medicine")).await.unwrap();
        store.merge_edge(&drug, &treats, &condition).await.unwrap();
        Arc::new(store)
    }

    #[tokio::test]
    async fn test_lookup_normalizes_query() {
        let lookup = lookup(store().await, " 高 血压\n", 5).await.unwrap();
        assert_eq!(lookup.query, "高血压");
        assert_eq!(lookup.triples.len(), 1);
        assert_eq!(lookup.triples[0].head, "降压药A");
        assert!(lookup.suggestions.is_empty());
    }

    #[tokio::test]
    async fn test_lookup_suggests_containing_names() {
        let lookup = lookup(store().await, "压药", 5).await.unwrap();
        assert!(lookup.triples.is_empty());
        assert_eq!(lookup.suggestions, vec!["降压药A"]);
    }
}
