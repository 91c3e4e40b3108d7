//! Verifier
//!
//! Read-only aggregate report for operators. Nothing here can fail a run:
//! every query error becomes a warning in the report.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};
use triplex_core::{CountEntry, EdgeSummary, GraphStore, StoreResult};

/// A node reached from more than one domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrossDomainLink {
    pub name: String,
    pub label: String,
    /// Distinct `source_domain` values on the node's edges, sorted
    pub domains: Vec<String>,
    /// Example edges touching the node
    pub examples: Vec<EdgeSummary>,
}

/// Post-load structural summary
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VerifyReport {
    pub nodes_by_label: Vec<CountEntry>,
    pub edges_by_type: Vec<CountEntry>,
    pub edges_by_domain: Vec<CountEntry>,
    pub nodes_by_domain: Vec<CountEntry>,
    pub total_nodes: usize,
    pub total_edges: usize,
    pub cross_domain: Vec<CrossDomainLink>,
    pub warnings: Vec<String>,
}

impl VerifyReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

fn collect<T: Default>(what: &str, result: StoreResult<T>, warnings: &mut Vec<String>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!("Verification query '{}' failed: {}", what, e);
            warnings.push(format!("{}: {}", what, e));
            T::default()
        }
    }
}

/// Nodes whose incident edges carry more than one domain.
///
/// Sorted by number of domains (most first), then label and name; at most
/// `sample_limit` nodes with at most `sample_limit` example edges each.
pub fn cross_domain_links(edges: &[EdgeSummary], sample_limit: usize) -> Vec<CrossDomainLink> {
    let mut touched: BTreeMap<(String, String), (BTreeSet<String>, Vec<&EdgeSummary>)> =
        BTreeMap::new();

    for edge in edges {
        let Some(domain) = edge.source_domain.as_ref() else {
            continue;
        };
        for key in [
            (edge.head_label.clone(), edge.head.clone()),
            (edge.tail_label.clone(), edge.tail.clone()),
        ] {
            let entry = touched.entry(key).or_default();
            entry.0.insert(domain.clone());
            entry.1.push(edge);
        }
    }

    let mut links: Vec<CrossDomainLink> = touched
        .into_iter()
        .filter(|(_, (domains, _))| domains.len() > 1)
        .map(|((label, name), (domains, examples))| CrossDomainLink {
            name,
            label,
            domains: domains.into_iter().collect(),
            examples: examples
                .into_iter()
                .take(sample_limit)
                .cloned()
                .collect(),
        })
        .collect();

    links.sort_by(|a, b| {
        b.domains
            .len()
            .cmp(&a.domains.len())
            .then_with(|| a.label.cmp(&b.label))
            .then_with(|| a.name.cmp(&b.name))
    });
    links.truncate(sample_limit);
    links
}

/// Build the verification report.
pub async fn verify(store: &dyn GraphStore, sample_limit: usize) -> VerifyReport {
    let mut warnings = Vec::new();

    let nodes_by_label = collect(
        "nodes by label",
        store.count_nodes_by_label().await,
        &mut warnings,
    );
    let edges_by_type = collect(
        "edges by type",
        store.count_edges_by_type().await,
        &mut warnings,
    );
    let edges_by_domain = collect(
        "edges by domain",
        store.count_edges_by_domain().await,
        &mut warnings,
    );
    let nodes_by_domain = collect(
        "nodes by domain",
        store.count_nodes_by_domain().await,
        &mut warnings,
    );
    let edges = collect(
        "edge summaries",
        store.edge_summaries(None).await,
        &mut warnings,
    );

    let report = VerifyReport {
        total_nodes: nodes_by_label.iter().map(|e| e.count).sum(),
        total_edges: edges_by_type.iter().map(|e| e.count).sum(),
        cross_domain: cross_domain_links(&edges, sample_limit),
        nodes_by_label,
        edges_by_type,
        edges_by_domain,
        nodes_by_domain,
        warnings,
    };

    info!(
        "Verification: {} nodes, {} edges, {} cross-domain nodes, {} warnings",
        report.total_nodes,
        report.total_edges,
        report.cross_domain.len(),
        report.warnings.len()
    );
    report
}
