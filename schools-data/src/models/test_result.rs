//! Normalized long-format test results

use schools_common::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Metric columns carried by every test row, in output order
pub const METRIC_COLUMNS: [&str; 12] = [
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

/// Tested subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subject {
    Math,
    Ela,
}

impl Subject {
    /// Column prefix used by the pivot
    pub fn prefix(&self) -> &'static str {
        match self {
            Subject::Math => "math",
            Subject::Ela => "ela",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

impl FromStr for Subject {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "math" => Ok(Subject::Math),
            "ela" | "reading" => Ok(Subject::Ela),
            other => Err(Error::InvalidInput(format!("unknown subject '{}'", other))),
        }
    }
}

/// Lowercased labels of the all-grades summary row
const ALL_GRADE_LABELS: [&str; 2] = ["all", "all grades"];

/// Tested grade: a specific grade, or the all-grades summary row
///
/// Numbered grades order before `All`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    Numbered(u8),
    All,
}

impl Grade {
    /// Parse a raw grade label ("3", "08", "All Grades")
    ///
    /// Only the exact summary labels "all" and "all grades" map to
    /// [`Grade::All`], case-insensitively; numbered grades are plain digits.
    pub fn parse_label(label: &str) -> Result<Grade, Error> {
        let trimmed = label.trim();
        let lowered = trimmed.to_lowercase();
        if ALL_GRADE_LABELS.contains(&lowered.as_str()) {
            return Ok(Grade::All);
        }
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::UnknownGrade(label.to_string()));
        }
        trimmed
            .parse::<u8>()
            .map(Grade::Numbered)
            .map_err(|_| Error::UnknownGrade(label.to_string()))
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grade::Numbered(n) => write!(f, "{}", n),
            Grade::All => f.write_str("all"),
        }
    }
}

/// Canonical test-result category vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestCategory {
    All,
    NeverEll,
    EverEll,
    CurrentEll,
    Swd,
    NotSwd,
    EconDisadv,
    NotEconDisadv,
}

impl TestCategory {
    pub fn key(&self) -> &'static str {
        match self {
            TestCategory::All => "all",
            TestCategory::NeverEll => "never_ell",
            TestCategory::EverEll => "ever_ell",
            TestCategory::CurrentEll => "current_ell",
            TestCategory::Swd => "swd",
            TestCategory::NotSwd => "not_swd",
            TestCategory::EconDisadv => "econ_disadv",
            TestCategory::NotEconDisadv => "not_econ_disadv",
        }
    }
}

impl fmt::Display for TestCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for TestCategory {
    type Err = Error;

    /// Parse a canonical key; raw source labels go through the category table
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(TestCategory::All),
            "never_ell" => Ok(TestCategory::NeverEll),
            "ever_ell" => Ok(TestCategory::EverEll),
            "current_ell" => Ok(TestCategory::CurrentEll),
            "swd" => Ok(TestCategory::Swd),
            "not_swd" => Ok(TestCategory::NotSwd),
            "econ_disadv" => Ok(TestCategory::EconDisadv),
            "not_econ_disadv" => Ok(TestCategory::NotEconDisadv),
            other => Err(Error::UnknownCategory(other.to_string())),
        }
    }
}

/// Test metrics; suppressed cells are `None`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TestMetrics {
    pub number_tested: Option<f64>,
    pub mean_scale_score: Option<f64>,
    pub level1_n: Option<f64>,
    pub level1_pct: Option<f64>,
    pub level2_n: Option<f64>,
    pub level2_pct: Option<f64>,
    pub level3_n: Option<f64>,
    pub level3_pct: Option<f64>,
    pub level4_n: Option<f64>,
    pub level4_pct: Option<f64>,
    pub level3_4_n: Option<f64>,
    pub level3_4_pct: Option<f64>,
}

impl TestMetrics {
    /// Build from values in [`METRIC_COLUMNS`] order
    pub fn from_values(v: [Option<f64>; 12]) -> Self {
        Self {
            number_tested: v[0],
            mean_scale_score: v[1],
            level1_n: v[2],
            level1_pct: v[3],
            level2_n: v[4],
            level2_pct: v[5],
            level3_n: v[6],
            level3_pct: v[7],
            level4_n: v[8],
            level4_pct: v[9],
            level3_4_n: v[10],
            level3_4_pct: v[11],
        }
    }

    /// Values in [`METRIC_COLUMNS`] order
    pub fn values(&self) -> [Option<f64>; 12] {
        [
            self.number_tested,
            self.mean_scale_score,
            self.level1_n,
            self.level1_pct,
            self.level2_n,
            self.level2_pct,
            self.level3_n,
            self.level3_pct,
            self.level4_n,
            self.level4_pct,
            self.level3_4_n,
            self.level3_4_pct,
        ]
    }
}

/// One (school, year, grade, category) test result for one subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResultRow {
    pub dbn: String,
    pub year: i32,
    pub grade: Grade,
    pub category: TestCategory,
    pub metrics: TestMetrics,
}
