//! Raw rows as delivered by a record source
//!
//! Field names match the upstream open-data column names exactly so rows can
//! be deserialized straight from the published records.

use serde::{Deserialize, Serialize};

/// A cell that may arrive as a number or as free text
/// ("45.2%", "Below 5%", "s", "12")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

impl RawValue {
    /// Text form of the cell, for error messages and prefix parsing
    pub fn as_text(&self) -> String {
        match self {
            RawValue::Number(n) if n.fract() == 0.0 => format!("{}", *n as i64),
            RawValue::Number(n) => n.to_string(),
            RawValue::Text(s) => s.clone(),
        }
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

/// Demographic snapshot columns, in source order
pub const DEMOGRAPHIC_COLUMNS: [&str; 39] = [
    "dbn",
    "school_name",
    "year",
    "total_enrollment",
    "grade_3k_pk_half_day_full",
    "grade_k",
    "grade_1",
    "grade_2",
    "grade_3",
    "grade_4",
    "grade_5",
    "grade_6",
    "grade_7",
    "grade_8",
    "grade_9",
    "grade_10",
    "grade_11",
    "grade_12",
    "female",
    "female_1",
    "male",
    "male_1",
    "asian",
    "asian_1",
    "black",
    "black_1",
    "hispanic",
    "hispanic_1",
    "multiple_race_categories",
    "multiple_race_categories_1",
    "white",
    "white_1",
    "students_with_disabilities",
    "students_with_disabilities_1",
    "english_language_learners",
    "english_language_learners_1",
    "poverty",
    "poverty_1",
    "economic_need_index",
];

/// Grade enrollment columns
pub const GRADE_COLUMNS: [&str; 14] = [
    "grade_3k_pk_half_day_full",
    "grade_k",
    "grade_1",
    "grade_2",
    "grade_3",
    "grade_4",
    "grade_5",
    "grade_6",
    "grade_7",
    "grade_8",
    "grade_9",
    "grade_10",
    "grade_11",
    "grade_12",
];

/// One raw demographic row (one school, one year)
///
/// Columns ending in `_1` are the percentage-of-enrollment companions of the
/// count column with the same stem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDemographicRow {
    pub dbn: String,
    pub school_name: String,
    /// Year label such as "2019-20"
    pub year: String,
    pub total_enrollment: i64,

    #[serde(default)]
    pub grade_3k_pk_half_day_full: i64,
    #[serde(default)]
    pub grade_k: i64,
    #[serde(default)]
    pub grade_1: i64,
    #[serde(default)]
    pub grade_2: i64,
    #[serde(default)]
    pub grade_3: i64,
    #[serde(default)]
    pub grade_4: i64,
    #[serde(default)]
    pub grade_5: i64,
    #[serde(default)]
    pub grade_6: i64,
    #[serde(default)]
    pub grade_7: i64,
    #[serde(default)]
    pub grade_8: i64,
    #[serde(default)]
    pub grade_9: i64,
    #[serde(default)]
    pub grade_10: i64,
    #[serde(default)]
    pub grade_11: i64,
    #[serde(default)]
    pub grade_12: i64,

    pub female: i64,
    pub female_1: RawValue,
    pub male: i64,
    pub male_1: RawValue,
    pub asian: i64,
    pub asian_1: RawValue,
    pub black: i64,
    pub black_1: RawValue,
    pub hispanic: i64,
    pub hispanic_1: RawValue,
    pub multiple_race_categories: i64,
    pub multiple_race_categories_1: RawValue,
    pub white: i64,
    pub white_1: RawValue,
    pub students_with_disabilities: i64,
    pub students_with_disabilities_1: RawValue,
    pub english_language_learners: i64,
    pub english_language_learners_1: RawValue,
    pub poverty: i64,
    pub poverty_1: RawValue,
    #[serde(default)]
    pub economic_need_index: Option<RawValue>,
}

impl RawDemographicRow {
    /// Enrollment of a grade column by its source name
    pub fn grade_enrollment(&self, column: &str) -> Option<i64> {
        let value = match column {
            "grade_3k_pk_half_day_full" => self.grade_3k_pk_half_day_full,
            "grade_k" => self.grade_k,
            "grade_1" => self.grade_1,
            "grade_2" => self.grade_2,
            "grade_3" => self.grade_3,
            "grade_4" => self.grade_4,
            "grade_5" => self.grade_5,
            "grade_6" => self.grade_6,
            "grade_7" => self.grade_7,
            "grade_8" => self.grade_8,
            "grade_9" => self.grade_9,
            "grade_10" => self.grade_10,
            "grade_11" => self.grade_11,
            "grade_12" => self.grade_12,
            _ => return None,
        };
        Some(value)
    }

    /// Percentage columns as (column name, raw cell) pairs
    pub fn percentage_cells(&self) -> [(&'static str, &RawValue); 10] {
        [
            ("female_1", &self.female_1),
            ("male_1", &self.male_1),
            ("asian_1", &self.asian_1),
            ("black_1", &self.black_1),
            ("hispanic_1", &self.hispanic_1),
            ("multiple_race_categories_1", &self.multiple_race_categories_1),
            ("white_1", &self.white_1),
            ("students_with_disabilities_1", &self.students_with_disabilities_1),
            ("english_language_learners_1", &self.english_language_learners_1),
            ("poverty_1", &self.poverty_1),
        ]
    }
}

/// Test result columns, in source order
pub const TEST_RESULT_COLUMNS: [&str; 17] = [
    "dbn",
    "school_name",
    "year",
    "grade",
    "category",
    "number_tested",
    "mean_scale_score",
    "level1_n",
    "level1_pct",
    "level2_n",
    "level2_pct",
    "level3_n",
    "level3_pct",
    "level4_n",
    "level4_pct",
    "level3_4_n",
    "level3_4_pct",
];

/// One raw long-format test result row for a single subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTestRow {
    pub dbn: String,
    /// Dropped during normalization; the demographic table is authoritative
    #[serde(default)]
    pub school_name: Option<String>,
    pub year: RawValue,
    pub grade: RawValue,
    pub category: String,
    #[serde(default)]
    pub number_tested: Option<RawValue>,
    #[serde(default)]
    pub mean_scale_score: Option<RawValue>,
    #[serde(default)]
    pub level1_n: Option<RawValue>,
    #[serde(default)]
    pub level1_pct: Option<RawValue>,
    #[serde(default)]
    pub level2_n: Option<RawValue>,
    #[serde(default)]
    pub level2_pct: Option<RawValue>,
    #[serde(default)]
    pub level3_n: Option<RawValue>,
    #[serde(default)]
    pub level3_pct: Option<RawValue>,
    #[serde(default)]
    pub level4_n: Option<RawValue>,
    #[serde(default)]
    pub level4_pct: Option<RawValue>,
    #[serde(default)]
    pub level3_4_n: Option<RawValue>,
    #[serde(default)]
    pub level3_4_pct: Option<RawValue>,
}

impl RawTestRow {
    /// Metric cells in [`crate::models::METRIC_COLUMNS`] order
    pub fn metric_cells(&self) -> [(&'static str, Option<&RawValue>); 12] {
        [
            ("number_tested", self.number_tested.as_ref()),
            ("mean_scale_score", self.mean_scale_score.as_ref()),
            ("level1_n", self.level1_n.as_ref()),
            ("level1_pct", self.level1_pct.as_ref()),
            ("level2_n", self.level2_n.as_ref()),
            ("level2_pct", self.level2_pct.as_ref()),
            ("level3_n", self.level3_n.as_ref()),
            ("level3_pct", self.level3_pct.as_ref()),
            ("level4_n", self.level4_n.as_ref()),
            ("level4_pct", self.level4_pct.as_ref()),
            ("level3_4_n", self.level3_4_n.as_ref()),
            ("level3_4_pct", self.level3_4_pct.as_ref()),
        ]
    }
}
