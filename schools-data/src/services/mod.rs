//! Pipeline components
//!
//! - Feature enrichment and name normalization (ingest)
//! - School resolution (lookup)
//! - District rollups, test-score pivot, segregation analysis (analysis)

pub mod district_aggregator;
pub mod feature_enricher;
pub mod goodness_of_fit;
pub mod name_normalizer;
pub mod query_parser;
pub mod school_resolver;
pub mod segregation_analyzer;
pub mod similarity;
pub mod test_score_pivot;

pub use district_aggregator::{
    aggregate, aggregate_by_borough, sort_districts, BoroughAggregate, DistrictAggregate, DistrictOrder,
    RollupTotals, SortDirection, SortKey,
};
pub use feature_enricher::{parse_school_code, parse_year_label, FeatureEnricher, SchoolCode};
pub use goodness_of_fit::{chi_square_goodness_of_fit, ks_two_sample, StatsError, TestOutcome};
pub use name_normalizer::{clean_name, normalize_query, NameNormalizer};
pub use query_parser::preprocess_query;
pub use school_resolver::{disambiguation_choices, DisambiguationChoice, SchoolResolver};
pub use segregation_analyzer::{analyze, district_baselines, SegregationResult, SEGREGATION_CATEGORIES};
pub use test_score_pivot::{combine, pivot, pivot_column, FeatureTable, PivotBlock};
