//! Record Loader
//!
//! Each domain is a directory of UTF-8 JSON files. A file holds either an
//! array of records or a single record object. Files are read in file-name
//! order from the top level of the directory only.
//!
//! Nothing here is fatal: an unreadable file is skipped, a non-object array
//! element is skipped, and a missing directory yields no records. Every skip
//! is logged and counted in the [`LoadReport`].

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use triplex_core::{Seed, Triplet};
use walkdir::WalkDir;

use crate::error::LoadError;

/// A file the loader could not use
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Per-domain load counts
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    pub domain: String,
    pub files_read: usize,
    pub files_skipped: Vec<SkippedFile>,
    pub records_loaded: usize,
    pub records_skipped: usize,
}

/// Records of one domain with provenance attached
#[derive(Debug, Clone, Default)]
pub struct DomainRecords {
    pub domain: String,
    pub records: Vec<Triplet>,
    pub report: LoadReport,
}

/// `.json` files directly inside `dir`, sorted by file name
pub fn json_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("json"))
                .unwrap_or(false)
        })
        .collect()
}

/// Parse one file into records.
///
/// Returns the decoded records and the number of array elements that were
/// skipped because they are not objects or do not decode.
pub fn read_records<T: DeserializeOwned>(path: &Path) -> Result<(Vec<T>, usize), LoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let document: Value = serde_json::from_str(&text).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    match document {
        Value::Array(items) => {
            let mut records = Vec::with_capacity(items.len());
            let mut skipped = 0;
            for (index, item) in items.into_iter().enumerate() {
                if !item.is_object() {
                    debug!("Skipping non-object element {} in {}", index, path.display());
                    skipped += 1;
                    continue;
                }
                match serde_json::from_value::<T>(item) {
                    Ok(record) => records.push(record),
                    Err(e) => {
                        debug!("Skipping element {} in {}: {}", index, path.display(), e);
                        skipped += 1;
                    }
                }
            }
            Ok((records, skipped))
        }
        Value::Object(_) => {
            let record = serde_json::from_value::<T>(document).map_err(|source| LoadError::Json {
                path: path.to_path_buf(),
                source,
            })?;
            Ok((vec![record], 0))
        }
        other => Err(LoadError::Shape {
            path: path.to_path_buf(),
            message: format!("expected an array or an object, found {}", kind(&other)),
        }),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn load_dir<T: DeserializeOwned>(domain: &str, dir: &Path) -> (Vec<(String, T)>, LoadReport) {
    let mut report = LoadReport {
        domain: domain.to_string(),
        ..Default::default()
    };
    let mut loaded = Vec::new();

    if !dir.is_dir() {
        warn!(
            "Directory {} for domain '{}' does not exist, loading nothing",
            dir.display(),
            domain
        );
        return (loaded, report);
    }

    for path in json_files(dir) {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        match read_records::<T>(&path) {
            Ok((records, skipped)) => {
                if skipped > 0 {
                    warn!(
                        "Skipped {} malformed records in {} (domain '{}')",
                        skipped,
                        path.display(),
                        domain
                    );
                }
                report.files_read += 1;
                report.records_loaded += records.len();
                report.records_skipped += skipped;
                loaded.extend(records.into_iter().map(|r| (file_name.clone(), r)));
            }
            Err(e) => {
                warn!("Skipping file {} (domain '{}'): {}", path.display(), domain, e);
                report.files_skipped.push(SkippedFile {
                    path: e.path().clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    (loaded, report)
}

/// Load every triplet file of one domain.
pub fn load_domain(domain: &str, dir: &Path) -> DomainRecords {
    let (loaded, report) = load_dir::<Triplet>(domain, dir);
    let records = loaded
        .into_iter()
        .map(|(file, record)| record.with_source(file, domain))
        .collect();
    debug!(
        "Loaded {} records from {} files for domain '{}'",
        report.records_loaded, report.files_read, domain
    );

    DomainRecords {
        domain: domain.to_string(),
        records,
        report,
    }
}

/// Domain name used in seed load reports
pub const SEED_DOMAIN: &str = "seeds";

/// Load every seed file.
pub fn load_seeds(dir: &Path) -> (Vec<Seed>, LoadReport) {
    let (loaded, report) = load_dir::<Seed>(SEED_DOMAIN, dir);
    (loaded.into_iter().map(|(_, seed)| seed).collect(), report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use tracing_test::traced_test;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_files_are_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "b.json", "[]");
        write(dir.path(), "a.JSON", "[]");
        write(dir.path(), "notes.txt", "x");
        fs::create_dir(dir.path().join("nested")).unwrap();
        write(&dir.path().join("nested"), "c.json", "[]");

        let names: Vec<_> = json_files(dir.path())
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.JSON", "b.json"]);
    }

    #[test]
    fn test_array_and_single_object_files() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "many.json",
            r#"[{"subject": "药A", "object": "高血压"}, 42, {"subject": "药B", "object": "糖尿病"}]"#,
        );
        write(dir.path(), "one.json", r#"{"subject": "公司X", "object": "药A"}"#);

        let loaded = load_domain("medicine", dir.path());
        assert_eq!(loaded.records.len(), 3);
        assert_eq!(loaded.report.files_read, 2);
        assert_eq!(loaded.report.records_skipped, 1);
        assert_eq!(loaded.records[0].source_file, "many.json");
        assert_eq!(loaded.records[2].source_file, "one.json");
        assert!(loaded.records.iter().all(|r| r.source_domain == "medicine"));
    }

    #[test]
    fn test_bad_files_are_skipped_with_reason() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "broken.json", "[{\"subject\": ");
        write(dir.path(), "scalar.json", "\"just a string\"");
        write(dir.path(), "good.json", r#"[{"subject": "a", "object": "b"}]"#);

        let loaded = load_domain("insurance", dir.path());
        assert_eq!(loaded.records.len(), 1);
        assert_eq!(loaded.report.files_read, 1);
        assert_eq!(loaded.report.files_skipped.len(), 2);
        assert!(loaded.report.files_skipped[0].reason.contains("Invalid JSON"));
        assert!(loaded.report.files_skipped[1].reason.contains("a string"));
    }

    #[test]
    fn test_missing_directory_loads_nothing() {
        let dir = TempDir::new().unwrap();
        let loaded = load_domain("nursing_home", &dir.path().join("absent"));
        assert!(loaded.records.is_empty());
        assert_eq!(loaded.report.files_read, 0);
        assert!(loaded.report.files_skipped.is_empty());
    }

    #[test]
    fn test_seed_files_accept_both_shapes() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "products.json", r#"[{"type": "Product", "name": "药A"}]"#);
        write(dir.path(), "concept.json", r#"{"name": "等待期", "aliases": ["观察期"]}"#);

        let (seeds, report) = load_seeds(dir.path());
        assert_eq!(seeds.len(), 2);
        assert_eq!(report.domain, SEED_DOMAIN);
        // concept.json sorts first
        assert_eq!(seeds[0].label(), "Concept");
        assert_eq!(seeds[1].label(), "Product");
    }

    #[test]
    #[traced_test]
    fn test_skipped_file_is_logged() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "malformed.json", "{\"subject\": ");

        let loaded = load_domain("medicine", dir.path());
        assert!(loaded.records.is_empty());
        assert!(logs_contain("Skipping file"));
        assert!(logs_contain("malformed.json"));
    }
}
