//! Composite-key deduplication
//!
//! Records are keyed by [`DedupKey`]. Under the default policy a collision is
//! resolved by *selection*: the record with strictly more raw properties
//! replaces the kept one, ties keep the first seen. Output order follows the
//! first appearance of each key.

use std::collections::HashMap;
use tracing::debug;
use triplex_config::{DedupPolicy, PipelineConfig};

use crate::record::{DedupKey, Triplet};

/// Deduplication settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DedupOptions {
    pub policy: DedupPolicy,
    /// Drop records whose normalized subject or object is empty
    pub reject_empty_endpoints: bool,
}

impl From<&PipelineConfig> for DedupOptions {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            policy: config.dedup_policy,
            reject_empty_endpoints: config.reject_empty_endpoints,
        }
    }
}

/// Counts from one deduplication pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DedupReport {
    pub input: usize,
    pub output: usize,
    pub removed: usize,
    pub rejected: usize,
}

/// Deduplicated records with their report
#[derive(Debug, Clone, Default)]
pub struct Deduplicated {
    pub records: Vec<Triplet>,
    pub report: DedupReport,
}

/// Collapse records that state the same fact.
///
/// Runs in a single pass, O(n) time and O(distinct keys) space.
pub fn deduplicate(records: Vec<Triplet>, options: DedupOptions) -> Deduplicated {
    let input = records.len();
    let mut index: HashMap<DedupKey, usize> = HashMap::with_capacity(input);
    let mut kept: Vec<Triplet> = Vec::with_capacity(input);
    let mut rejected = 0;

    for record in records {
        let key = record.dedup_key();

        if options.reject_empty_endpoints && (key.subject.is_empty() || key.object.is_empty()) {
            rejected += 1;
            continue;
        }

        match index.get(&key) {
            Some(&slot) => merge_into(&mut kept[slot], record, options.policy),
            None => {
                index.insert(key, kept.len());
                kept.push(record);
            }
        }
    }

    let report = DedupReport {
        input,
        output: kept.len(),
        removed: input - rejected - kept.len(),
        rejected,
    };
    debug!(
        "Deduplicated {} records into {} ({} duplicates, {} rejected)",
        report.input, report.output, report.removed, report.rejected
    );

    Deduplicated {
        records: kept,
        report,
    }
}

fn merge_into(existing: &mut Triplet, candidate: Triplet, policy: DedupPolicy) {
    match policy {
        DedupPolicy::RichestWins => {
            if candidate.properties.len() > existing.properties.len() {
                *existing = candidate;
            }
        }
        DedupPolicy::UnionProperties => {
            for (key, value) in candidate.properties {
                existing.properties.entry(key).or_insert(value);
            }
        }
    }
}
