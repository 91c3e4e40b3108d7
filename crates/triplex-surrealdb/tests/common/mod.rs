//! Shared helpers for SurrealDB store tests

#![allow(dead_code)]

use serde_json::Value;
use triplex_core::{SeedPlan, Seed, Triplet, WritePlan};
use triplex_surrealdb::{SurrealClient, SurrealGraphStore};

/// Store on a fresh in-memory database
pub async fn setup_store() -> SurrealGraphStore {
    let client = SurrealClient::new_isolated_memory()
        .await
        .expect("Failed to create in-memory database");
    SurrealGraphStore::new(client)
}

/// Plan a batch from JSON triplets
pub fn plan(domain: &str, records: Value) -> WritePlan {
    let records: Vec<Triplet> = serde_json::from_value::<Vec<Triplet>>(records)
        .expect("Invalid triplet fixture")
        .into_iter()
        .map(|t| t.with_source("fixture.json", domain))
        .collect();
    WritePlan::prepare(domain, &records).expect("Failed to plan batch")
}

/// Plan seeds from JSON seed records
pub fn seed_plan(seeds: Value) -> SeedPlan {
    let seeds: Vec<Seed> = serde_json::from_value(seeds).expect("Invalid seed fixture");
    SeedPlan::prepare(&seeds).expect("Failed to plan seeds")
}

pub fn total(entries: &[triplex_core::CountEntry]) -> usize {
    entries.iter().map(|e| e.count).sum()
}
