//! Test Helper Utilities
//!
//! Shared fixtures for schools-data integration tests

pub mod fixtures;

pub use fixtures::{demographic_json, demographic_row, sample_district, test_json, test_row, SchoolFixture};
