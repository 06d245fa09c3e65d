//! Record sources
//!
//! A [`RecordSource`] hands the pipeline raw demographic and test rows. The
//! pipeline itself never fetches data; acquisition is the source's concern.
//!
//! # Adapters
//! - [`InMemorySource`]: rows supplied by the caller (tests, embedding)
//! - [`JsonFileSource`]: JSON arrays of row objects on disk (CLI)

use crate::models::{RawDemographicRow, RawTestRow, Subject, DEMOGRAPHIC_COLUMNS, TEST_RESULT_COLUMNS};
use schools_common::{Error, Result};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

// ============================================================================
// Source trait
// ============================================================================

/// Supplier of raw rows
pub trait RecordSource {
    /// Source name for logging
    fn name(&self) -> &str;

    /// Demographic snapshot rows, one per (school, year)
    fn demographic_rows(&self) -> Result<Vec<RawDemographicRow>>;

    /// Long-format test rows for one subject
    fn test_rows(&self, subject: Subject) -> Result<Vec<RawTestRow>>;
}

// ============================================================================
// Column schema check
// ============================================================================

/// Outcome of comparing a header against an expected column set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnCheck {
    pub missing: Vec<String>,
    pub unexpected: Vec<String>,
}

impl ColumnCheck {
    /// True when no required column is absent (extra columns are tolerated)
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

fn check_columns<'a>(columns: impl IntoIterator<Item = &'a str>, expected: &[&str]) -> ColumnCheck {
    let present: BTreeSet<&str> = columns.into_iter().collect();
    let wanted: BTreeSet<&str> = expected.iter().copied().collect();

    ColumnCheck {
        missing: wanted.difference(&present).map(|c| c.to_string()).collect(),
        unexpected: present.difference(&wanted).map(|c| c.to_string()).collect(),
    }
}

/// Compare a demographic header against the fixed demographic column set
pub fn check_demographic_columns<'a>(columns: impl IntoIterator<Item = &'a str>) -> ColumnCheck {
    check_columns(columns, &DEMOGRAPHIC_COLUMNS)
}

/// Compare a test-result header against the fixed test column set
pub fn check_test_columns<'a>(columns: impl IntoIterator<Item = &'a str>) -> ColumnCheck {
    check_columns(columns, &TEST_RESULT_COLUMNS)
}

// ============================================================================
// In-memory source
// ============================================================================

/// Rows held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    demographics: Vec<RawDemographicRow>,
    tests: HashMap<Subject, Vec<RawTestRow>>,
}

impl InMemorySource {
    pub fn new(demographics: Vec<RawDemographicRow>) -> Self {
        Self {
            demographics,
            tests: HashMap::new(),
        }
    }

    pub fn with_tests(mut self, subject: Subject, rows: Vec<RawTestRow>) -> Self {
        self.tests.insert(subject, rows);
        self
    }
}

impl RecordSource for InMemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    fn demographic_rows(&self) -> Result<Vec<RawDemographicRow>> {
        Ok(self.demographics.clone())
    }

    fn test_rows(&self, subject: Subject) -> Result<Vec<RawTestRow>> {
        Ok(self.tests.get(&subject).cloned().unwrap_or_default())
    }
}

// ============================================================================
// JSON file source
// ============================================================================

/// Rows read from JSON files holding an array of row objects
///
/// Every row's keys are checked against the fixed column set before
/// deserialization; a missing column is an input error naming the row.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    demographics_path: PathBuf,
    test_paths: HashMap<Subject, PathBuf>,
}

impl JsonFileSource {
    pub fn new(demographics_path: impl Into<PathBuf>) -> Self {
        Self {
            demographics_path: demographics_path.into(),
            test_paths: HashMap::new(),
        }
    }

    pub fn with_tests(mut self, subject: Subject, path: impl Into<PathBuf>) -> Self {
        self.test_paths.insert(subject, path.into());
        self
    }

    fn read_rows<T: DeserializeOwned>(path: &Path, expected: &[&str]) -> Result<Vec<T>> {
        let content = std::fs::read_to_string(path)?;
        let objects: Vec<Map<String, Value>> = serde_json::from_str(&content)?;

        let mut reported_extra = false;
        let mut rows = Vec::with_capacity(objects.len());
        for (index, object) in objects.into_iter().enumerate() {
            let check = check_columns(object.keys().map(String::as_str), expected);
            if !check.is_complete() {
                return Err(Error::InvalidInput(format!(
                    "{} row {}: missing columns {}",
                    path.display(),
                    index,
                    check.missing.join(", ")
                )));
            }
            if !check.unexpected.is_empty() && !reported_extra {
                warn!(
                    "{}: ignoring unexpected columns {}",
                    path.display(),
                    check.unexpected.join(", ")
                );
                reported_extra = true;
            }
            rows.push(serde_json::from_value(Value::Object(object))?);
        }

        info!("Read {} rows from {}", rows.len(), path.display());
        Ok(rows)
    }
}

impl RecordSource for JsonFileSource {
    fn name(&self) -> &str {
        "json"
    }

    fn demographic_rows(&self) -> Result<Vec<RawDemographicRow>> {
        Self::read_rows(&self.demographics_path, &DEMOGRAPHIC_COLUMNS)
    }

    fn test_rows(&self, subject: Subject) -> Result<Vec<RawTestRow>> {
        match self.test_paths.get(&subject) {
            Some(path) => Self::read_rows(path, &TEST_RESULT_COLUMNS),
            None => Err(Error::InvalidInput(format!("no {} test file configured", subject))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_demographic_header() {
        let check = check_demographic_columns(DEMOGRAPHIC_COLUMNS);
        assert!(check.is_complete());
        assert!(check.unexpected.is_empty());
    }

    #[test]
    fn test_missing_and_unexpected_columns_reported() {
        let header: Vec<&str> = DEMOGRAPHIC_COLUMNS
            .iter()
            .copied()
            .filter(|c| *c != "poverty_1")
            .chain(["shoe_size"])
            .collect();

        let check = check_demographic_columns(header);
        assert!(!check.is_complete());
        assert_eq!(check.missing, vec!["poverty_1".to_string()]);
        assert_eq!(check.unexpected, vec!["shoe_size".to_string()]);
    }

    #[test]
    fn test_test_columns_check() {
        let check = check_test_columns(["dbn", "year", "grade", "category"]);
        assert!(check.missing.contains(&"mean_scale_score".to_string()));
    }

    #[test]
    fn test_in_memory_source_without_tests() {
        let source = InMemorySource::default();
        assert!(source.demographic_rows().unwrap().is_empty());
        assert!(source.test_rows(Subject::Math).unwrap().is_empty());
    }

    #[test]
    fn test_json_source_without_test_file_errors() {
        let source = JsonFileSource::new("/nonexistent/demographics.json");
        assert!(matches!(source.test_rows(Subject::Ela), Err(Error::InvalidInput(_))));
        assert!(matches!(source.demographic_rows(), Err(Error::Io(_))));
    }
}
