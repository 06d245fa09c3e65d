//! schools-data library interface
//!
//! Normalizes NYC school demographic and test-score records, resolves
//! free-text school references, and computes district rollups and
//! segregation statistics. Exposes public APIs for the CLI and for
//! integration testing.

pub mod models;
pub mod services;
pub mod source;

pub use schools_common::{Error, PipelineConfig, Result};

use crate::models::{SchoolRecord, Subject, TestResultRow};
use crate::services::{FeatureEnricher, SchoolResolver, SegregationResult};
use crate::source::RecordSource;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

/// Configured pipeline entry point
///
/// Holds the configuration and the components built from it; each operation
/// is a pure transformation over the rows a [`RecordSource`] supplies.
pub struct Pipeline {
    config: PipelineConfig,
    enricher: FeatureEnricher,
}

impl Pipeline {
    /// Validate `config` and build the ingest components
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let enricher = FeatureEnricher::new(&config)?;
        Ok(Self { config, enricher })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Read and enrich demographic rows
    pub fn load_schools(&self, source: &dyn RecordSource) -> Result<Vec<SchoolRecord>> {
        let rows = source.demographic_rows()?;
        info!("Loaded {} demographic rows from {} source", rows.len(), source.name());
        self.enricher.enrich_all(&rows)
    }

    /// Read and normalize test rows for one subject
    pub fn load_tests(&self, source: &dyn RecordSource, subject: Subject) -> Result<Vec<TestResultRow>> {
        let rows = source.test_rows(subject)?;
        info!("Loaded {} {} test rows from {} source", rows.len(), subject, source.name());
        self.enricher.normalize_test_rows(&rows)
    }

    /// Resolver over `records` using the configured threshold
    pub fn resolver<'a>(&self, records: &'a [SchoolRecord]) -> SchoolResolver<'a> {
        SchoolResolver::new(records, &self.config)
    }

    /// Segregation analysis seeded from `seed`, else the configured seed,
    /// else OS entropy
    pub fn segregation(&self, records: &[SchoolRecord], seed: Option<u64>) -> Result<Vec<SegregationResult>> {
        let mut rng = match seed.or(self.config.analysis.seed) {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        services::analyze(records, &mut rng)
    }
}
