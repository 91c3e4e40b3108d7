//! Terminal output helpers

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, Table};
use triplex_core::{CountEntry, NeighborTriple};
use triplex_pipeline::{CrossDomainLink, RunReport, VerifyReport};

pub fn info(message: &str) {
    println!("{} {}", "•".cyan(), message);
}

pub fn success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

pub fn warning(message: &str) {
    println!("{} {}", "!".yellow().bold(), message.yellow());
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(header);
    table
}

fn number(n: usize) -> Cell {
    Cell::new(n).set_alignment(CellAlignment::Right)
}

/// Elements without a domain are counted under the empty key
fn display_key(key: &str) -> &str {
    if key.is_empty() {
        "(none)"
    } else {
        key
    }
}

pub fn counts_table(key_header: &str, entries: &[CountEntry]) -> Table {
    let mut table = new_table(vec![key_header, "Count"]);
    for entry in entries {
        table.add_row(vec![Cell::new(display_key(&entry.key)), number(entry.count)]);
    }
    table
}

pub fn domains_table(report: &RunReport) -> Table {
    let mut table = new_table(vec![
        "Domain",
        "Files",
        "Skipped files",
        "Records",
        "Duplicates",
        "Rejected",
        "Batches",
        "Rows written",
    ]);
    for domain in &report.domains {
        table.add_row(vec![
            Cell::new(&domain.domain),
            number(domain.load.files_read),
            number(domain.load.files_skipped.len()),
            number(domain.dedup.input),
            number(domain.dedup.removed),
            number(domain.dedup.rejected),
            number(domain.write.batches),
            number(domain.write.rows),
        ]);
    }
    table
}

pub fn cross_domain_table(links: &[CrossDomainLink]) -> Table {
    let mut table = new_table(vec!["Node", "Label", "Domains", "Example"]);
    for link in links {
        let example = link
            .examples
            .first()
            .map(|e| format!("{} -[{}]-> {}", e.head, e.relation, e.tail))
            .unwrap_or_default();
        table.add_row(vec![
            Cell::new(&link.name),
            Cell::new(&link.label),
            Cell::new(link.domains.join(", ")),
            Cell::new(example),
        ]);
    }
    table
}

pub fn neighbors_table(triples: &[NeighborTriple]) -> Table {
    let mut table = new_table(vec!["Head", "Relation", "Tail"]);
    for triple in triples {
        table.add_row(vec![
            Cell::new(&triple.head),
            Cell::new(&triple.relation),
            Cell::new(&triple.tail),
        ]);
    }
    table
}

pub fn print_run_report(report: &RunReport) {
    println!("\n{}", "Run summary".bold());
    if let Some(cleared) = &report.cleared {
        info(&format!(
            "Cleared {} nodes in {} rounds",
            cleared.total,
            cleared.rounds.len()
        ));
    }
    info(&format!(
        "Indexes: {} requested, {} created",
        report.indexes_requested, report.indexes_created
    ));
    if !report.indexes_failed.is_empty() {
        warning(&format!(
            "Indexes not created for: {}",
            report.indexes_failed.join(", ")
        ));
    }
    if let Some(seeds) = &report.seeds {
        info(&format!(
            "Seeds: {} written across {} labels ({} skipped)",
            seeds.written,
            seeds.labels.len(),
            seeds.skipped
        ));
    }
    println!("{}", domains_table(report));

    for domain in &report.domains {
        for skipped in &domain.load.files_skipped {
            warning(&format!(
                "[{}] skipped {}: {}",
                domain.domain,
                skipped.path.display(),
                skipped.reason
            ));
        }
    }

    success(&format!(
        "Wrote {} rows in {:.1}s",
        report.rows_written(),
        report.duration().num_milliseconds() as f64 / 1000.0
    ));

    if let Some(verify) = &report.verify {
        print_verify_report(verify);
    }
}

pub fn print_verify_report(report: &VerifyReport) {
    println!("\n{}", "Verification".bold());
    info(&format!(
        "{} nodes, {} edges",
        report.total_nodes, report.total_edges
    ));
    println!("{}", counts_table("Label", &report.nodes_by_label));
    println!("{}", counts_table("Relation", &report.edges_by_type));
    println!("{}", counts_table("Edge domain", &report.edges_by_domain));
    println!("{}", counts_table("Node domain", &report.nodes_by_domain));

    if report.cross_domain.is_empty() {
        info("No nodes are shared between domains");
    } else {
        println!("\n{}", "Cross-domain links".bold());
        println!("{}", cross_domain_table(&report.cross_domain));
    }

    for warning_text in &report.warnings {
        warning(warning_text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_table_names_missing_domain() {
        let table = counts_table(
            "Node domain",
            &[CountEntry::new("medicine", 3), CountEntry::new("", 1)],
        );
        let rendered = table.to_string();
        assert!(rendered.contains("medicine"));
        assert!(rendered.contains("(none)"));
    }

    #[test]
    fn test_neighbors_table_lists_every_triple() {
        let triples = vec![
            NeighborTriple {
                head: "药A".into(),
                relation: "TREATS".into(),
                tail: "高血压".into(),
            },
            NeighborTriple {
                head: "保险X".into(),
                relation: "COVERS".into(),
                tail: "高血压".into(),
            },
        ];
        let rendered = neighbors_table(&triples).to_string();
        assert!(rendered.contains("TREATS"));
        assert!(rendered.contains("COVERS"));
    }
}
