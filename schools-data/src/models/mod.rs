//! Data models for the school data pipeline
//!
//! - Raw rows as supplied by a record source
//! - Enriched per-school records
//! - Normalized test results

pub mod raw;
pub mod school;
pub mod test_result;

pub use raw::{RawDemographicRow, RawTestRow, RawValue, DEMOGRAPHIC_COLUMNS, GRADE_COLUMNS, TEST_RESULT_COLUMNS};
pub use school::{
    ratio, Category, DemographicCounts, DemographicPercentages, GradeBands, SchoolRecord, SchoolType,
};
pub use test_result::{Grade, Subject, TestCategory, TestMetrics, TestResultRow, METRIC_COLUMNS};
