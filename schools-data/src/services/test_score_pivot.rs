//! Long-to-wide reshaping of test results
//!
//! Each (category, grade) combination present in the input becomes one
//! [`PivotBlock`] whose metric columns are named
//! `<subject>_<category>_grade_<grade>_<metric>`. Blocks are left-joined onto
//! a [`FeatureTable`] keyed by (dbn, year).

use crate::models::{Grade, SchoolRecord, Subject, TestCategory, TestResultRow, METRIC_COLUMNS};
use schools_common::{Error, Result};
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, info};

/// (dbn, year) join key
pub type SchoolYearKey = (String, i32);

/// Wide metric columns for one (category, grade) combination
#[derive(Debug, Clone, PartialEq)]
pub struct PivotBlock {
    pub category: TestCategory,
    pub grade: Grade,
    /// Renamed metric columns, in [`METRIC_COLUMNS`] order
    pub columns: Vec<String>,
    pub rows: HashMap<SchoolYearKey, [Option<f64>; 12]>,
}

/// Wide column name for one metric
pub fn pivot_column(subject: Subject, category: TestCategory, grade: Grade, metric: &str) -> String {
    format!("{}_{}_grade_{}_{}", subject.prefix(), category.key(), grade, metric)
}

/// Pivot long-format rows into one block per (category, grade) present
///
/// Blocks come out category-major, grades ascending with `All` last.
/// Combinations with no rows are not generated. A (dbn, year) key seen twice
/// within one combination is an input error.
pub fn pivot(rows: &[TestResultRow], subject: Subject) -> Result<Vec<PivotBlock>> {
    let categories: BTreeSet<TestCategory> = rows.iter().map(|r| r.category).collect();
    let grades: BTreeSet<Grade> = rows.iter().map(|r| r.grade).collect();

    let mut blocks = Vec::new();
    for &category in &categories {
        for &grade in &grades {
            let mut block_rows = HashMap::new();
            for row in rows.iter().filter(|r| r.category == category && r.grade == grade) {
                let key = (row.dbn.clone(), row.year);
                if block_rows.insert(key, row.metrics.values()).is_some() {
                    return Err(Error::InvalidInput(format!(
                        "duplicate {} test row for {} {} ({}, grade {})",
                        subject, row.dbn, row.year, category, grade
                    )));
                }
            }
            if block_rows.is_empty() {
                continue;
            }

            blocks.push(PivotBlock {
                category,
                grade,
                columns: METRIC_COLUMNS
                    .iter()
                    .map(|metric| pivot_column(subject, category, grade, metric))
                    .collect(),
                rows: block_rows,
            });
        }
    }

    debug!(%subject, rows = rows.len(), blocks = blocks.len(), "Pivoted test rows");
    Ok(blocks)
}

/// School table widened with test-score columns
///
/// Row `i` of `values` belongs to `schools[i]`; each value row has one cell
/// per entry of `columns`.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    pub schools: Vec<SchoolRecord>,
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl FeatureTable {
    /// Table with no test-score columns yet
    pub fn from_schools(schools: Vec<SchoolRecord>) -> Self {
        let values = vec![Vec::new(); schools.len()];
        Self {
            schools,
            columns: Vec::new(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.schools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schools.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Cell value; `None` for unknown columns and missing values alike
    pub fn get(&self, row: usize, column: &str) -> Option<f64> {
        let index = self.column_index(column)?;
        self.values.get(row)?.get(index).copied().flatten()
    }

    /// One JSON object per school: identity columns plus every test column
    pub fn to_json_rows(&self) -> Vec<Value> {
        self.schools
            .iter()
            .zip(&self.values)
            .map(|(school, cells)| {
                let mut object = Map::new();
                object.insert("dbn".to_string(), Value::from(school.dbn.clone()));
                object.insert("year".to_string(), Value::from(school.year));
                object.insert("short_name".to_string(), Value::from(school.short_name.clone()));
                for (column, cell) in self.columns.iter().zip(cells) {
                    object.insert(column.clone(), cell.map(Value::from).unwrap_or(Value::Null));
                }
                Value::Object(object)
            })
            .collect()
    }

    fn append_block(&mut self, block: &PivotBlock) -> Result<()> {
        let existing: HashSet<&str> = self.columns.iter().map(String::as_str).collect();
        if let Some(duplicate) = block.columns.iter().find(|c| existing.contains(c.as_str())) {
            return Err(Error::InvalidInput(format!("column '{}' already present", duplicate)));
        }

        for (school, cells) in self.schools.iter().zip(self.values.iter_mut()) {
            let key = (school.dbn.clone(), school.year);
            match block.rows.get(&key) {
                Some(metrics) => cells.extend_from_slice(metrics),
                None => cells.extend(std::iter::repeat(None).take(METRIC_COLUMNS.len())),
            }
        }
        self.columns.extend(block.columns.iter().cloned());
        Ok(())
    }
}

/// Left-join every pivot block of `rows` onto `table`
///
/// Row count and order of `table` are preserved; schools without rows for a
/// combination get missing values in its columns.
pub fn combine(mut table: FeatureTable, rows: &[TestResultRow], subject: Subject) -> Result<FeatureTable> {
    let blocks = pivot(rows, subject)?;
    for block in &blocks {
        table.append_block(block)?;
    }

    info!(
        %subject,
        schools = table.len(),
        blocks = blocks.len(),
        columns = table.columns.len(),
        "Merged test scores onto school table"
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DemographicCounts, DemographicPercentages, GradeBands, SchoolType, TestMetrics};

    fn test_row(dbn: &str, year: i32, grade: Grade, category: TestCategory, tested: f64) -> TestResultRow {
        TestResultRow {
            dbn: dbn.to_string(),
            year,
            grade,
            category,
            metrics: TestMetrics {
                number_tested: Some(tested),
                mean_scale_score: Some(600.0),
                ..Default::default()
            },
        }
    }

    fn school(dbn: &str, year: i32) -> SchoolRecord {
        SchoolRecord {
            dbn: dbn.to_string(),
            school_name: dbn.to_string(),
            year,
            district: 1,
            borough: 'M',
            borough_name: "Manhattan".to_string(),
            school_number: 1,
            grade_bands: GradeBands::default(),
            school_type: SchoolType::PS,
            total_enrollment: 10,
            counts: DemographicCounts::default(),
            percentages: DemographicPercentages::default(),
            economic_need_index: None,
            clean_name: String::new(),
            short_name: String::new(),
        }
    }

    #[test]
    fn test_column_naming() {
        assert_eq!(
            pivot_column(Subject::Math, TestCategory::NotSwd, Grade::Numbered(3), "mean_scale_score"),
            "math_not_swd_grade_3_mean_scale_score"
        );
        assert_eq!(
            pivot_column(Subject::Ela, TestCategory::All, Grade::All, "level3_4_pct"),
            "ela_all_grade_all_level3_4_pct"
        );
    }

    #[test]
    fn test_pivot_only_emits_present_combinations() {
        let rows = vec![
            test_row("01M001", 2019, Grade::Numbered(3), TestCategory::All, 50.0),
            test_row("01M001", 2019, Grade::All, TestCategory::Swd, 5.0),
        ];
        let blocks = pivot(&rows, Subject::Math).unwrap();

        // 2 categories × 2 grades, but only two combinations have rows
        let combos: Vec<(TestCategory, Grade)> = blocks.iter().map(|b| (b.category, b.grade)).collect();
        assert_eq!(
            combos,
            vec![(TestCategory::All, Grade::Numbered(3)), (TestCategory::Swd, Grade::All)]
        );
        assert_eq!(blocks[0].columns.len(), 12);
    }

    #[test]
    fn test_pivot_rejects_duplicate_keys() {
        let rows = vec![
            test_row("01M001", 2019, Grade::Numbered(3), TestCategory::All, 50.0),
            test_row("01M001", 2019, Grade::Numbered(3), TestCategory::All, 51.0),
        ];
        assert!(matches!(pivot(&rows, Subject::Math), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_combine_preserves_rows_and_order() {
        let schools = vec![school("01M003", 2019), school("01M001", 2019), school("01M002", 2019)];
        let rows = vec![
            test_row("01M001", 2019, Grade::Numbered(3), TestCategory::All, 50.0),
            test_row("01M003", 2019, Grade::Numbered(3), TestCategory::All, 70.0),
            test_row("09X999", 2019, Grade::Numbered(3), TestCategory::All, 99.0),
        ];

        let table = combine(FeatureTable::from_schools(schools), &rows, Subject::Math).unwrap();
        assert_eq!(table.len(), 3);
        let order: Vec<&str> = table.schools.iter().map(|s| s.dbn.as_str()).collect();
        assert_eq!(order, vec!["01M003", "01M001", "01M002"]);

        let column = "math_all_grade_3_number_tested";
        assert_eq!(table.get(0, column), Some(70.0));
        assert_eq!(table.get(1, column), Some(50.0));
        assert_eq!(table.get(2, column), None);
        assert!(table.values.iter().all(|cells| cells.len() == table.columns.len()));
    }

    #[test]
    fn test_combine_two_subjects() {
        let schools = vec![school("01M001", 2019)];
        let rows = vec![test_row("01M001", 2019, Grade::All, TestCategory::All, 50.0)];

        let table = FeatureTable::from_schools(schools);
        let table = combine(table, &rows, Subject::Math).unwrap();
        let table = combine(table, &rows, Subject::Ela).unwrap();
        assert_eq!(table.columns.len(), 24);
        assert_eq!(table.get(0, "ela_all_grade_all_number_tested"), Some(50.0));

        // Same subject twice would duplicate columns
        assert!(combine(table, &rows, Subject::Ela).is_err());
    }

    #[test]
    fn test_json_rows_use_null_for_missing() {
        let schools = vec![school("01M001", 2019), school("01M002", 2019)];
        let rows = vec![test_row("01M001", 2019, Grade::All, TestCategory::All, 50.0)];
        let table = combine(FeatureTable::from_schools(schools), &rows, Subject::Math).unwrap();

        let json = table.to_json_rows();
        assert_eq!(json[0]["math_all_grade_all_number_tested"], Value::from(50.0));
        assert_eq!(json[1]["math_all_grade_all_number_tested"], Value::Null);
        assert_eq!(json[0]["math_all_grade_all_level1_n"], Value::Null);
    }
}
