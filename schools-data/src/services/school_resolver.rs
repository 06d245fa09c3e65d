//! School resolution from free-text queries
//!
//! Two stages:
//! 1. Exact: uppercased query against short names ("MS 88")
//! 2. Fuzzy (only when stage 1 finds nothing): token-set similarity against
//!    clean names, thresholded, then re-ranked by the strict ratio
//!
//! Both stages only consider records from the requested year (latest year
//! present by default).

use crate::models::SchoolRecord;
use crate::services::name_normalizer::normalize_query;
use crate::services::query_parser::preprocess_query;
use crate::services::similarity::{ratio, token_set_ratio};
use schools_common::PipelineConfig;
use serde::Serialize;
use tracing::debug;

/// Resolver over an enriched record set
pub struct SchoolResolver<'a> {
    records: &'a [SchoolRecord],

    /// Token-set score (0-100) a candidate must exceed
    fuzzy_threshold: f64,
}

/// One entry of a disambiguation prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisambiguationChoice {
    pub dbn: String,
    /// Display column shown to the user
    pub short_name: String,
    pub school_name: String,
}

impl<'a> SchoolResolver<'a> {
    pub fn new(records: &'a [SchoolRecord], config: &PipelineConfig) -> Self {
        Self {
            records,
            fuzzy_threshold: config.resolver.fuzzy_threshold,
        }
    }

    /// Most recent academic year in the record set
    pub fn latest_year(&self) -> Option<i32> {
        self.records.iter().map(|r| r.year).max()
    }

    /// Resolve a query to matching records
    ///
    /// # Arguments
    /// * `query` - School reference ("MS 88", "peter rouget")
    /// * `as_of_year` - Year to search; `None` means the latest year present
    ///
    /// # Returns
    /// Exact short-name matches (unordered), or fuzzy matches ordered by
    /// descending strict similarity. Empty when nothing matches.
    pub fn resolve(&self, query: &str, as_of_year: Option<i32>) -> Vec<&'a SchoolRecord> {
        let year = match as_of_year.or_else(|| self.latest_year()) {
            Some(year) => year,
            None => return Vec::new(),
        };
        let normalized = normalize_query(query);

        let exact = self.exact_matches(&normalized.to_uppercase(), year);
        if !exact.is_empty() {
            debug!(query = %query, year, matches = exact.len(), "Exact short-name match");
            return exact;
        }

        let fuzzy = self.fuzzy_matches(&normalized, year);
        debug!(query = %query, year, matches = fuzzy.len(), "Fuzzy clean-name match");
        fuzzy
    }

    /// Preprocess raw speech-to-text output, then [`resolve`](Self::resolve)
    pub fn resolve_utterance(&self, utterance: &str, as_of_year: Option<i32>) -> Vec<&'a SchoolRecord> {
        self.resolve(&preprocess_query(utterance), as_of_year)
    }

    fn exact_matches(&self, short_name: &str, year: i32) -> Vec<&'a SchoolRecord> {
        self.records
            .iter()
            .filter(|r| r.year == year && r.short_name == short_name)
            .collect()
    }

    fn fuzzy_matches(&self, query: &str, year: i32) -> Vec<&'a SchoolRecord> {
        let mut survivors: Vec<(&'a SchoolRecord, f64)> = self
            .records
            .iter()
            .filter(|r| r.year == year)
            .filter(|r| token_set_ratio(query, &r.clean_name) > self.fuzzy_threshold)
            .map(|r| (r, ratio(query, &r.clean_name)))
            .collect();

        // Stable: equal strict scores keep record order
        survivors.sort_by(|a, b| b.1.total_cmp(&a.1));

        for (record, score) in &survivors {
            debug!(dbn = %record.dbn, clean_name = %record.clean_name, score, "Fuzzy candidate");
        }

        survivors.into_iter().map(|(record, _)| record).collect()
    }
}

/// Short-name display choices for presenting several matches to a user
pub fn disambiguation_choices(matches: &[&SchoolRecord]) -> Vec<DisambiguationChoice> {
    matches
        .iter()
        .map(|r| DisambiguationChoice {
            dbn: r.dbn.clone(),
            short_name: r.short_name.clone(),
            school_name: r.school_name.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DemographicCounts, DemographicPercentages, GradeBands, SchoolType};
    use crate::services::name_normalizer::NameNormalizer;

    fn record(dbn: &str, name: &str, year: i32, school_type: SchoolType, number: u32) -> SchoolRecord {
        let mut record = SchoolRecord {
            dbn: dbn.to_string(),
            school_name: name.to_string(),
            year,
            district: dbn[..2].parse().unwrap(),
            borough: 'M',
            borough_name: "Manhattan".to_string(),
            school_number: number,
            grade_bands: GradeBands::default(),
            school_type,
            total_enrollment: 100,
            counts: DemographicCounts::default(),
            percentages: DemographicPercentages::default(),
            economic_need_index: None,
            clean_name: String::new(),
            short_name: String::new(),
        };
        NameNormalizer::default().apply(&mut record);
        record
    }

    fn records() -> Vec<SchoolRecord> {
        vec![
            record("02M088", "M.S. 088 Peter Rouget", 2018, SchoolType::MS, 88),
            record("02M088", "M.S. 088 Peter Rouget", 2019, SchoolType::MS, 88),
            record("03M009", "P.S. 009 Sarah Anderson", 2019, SchoolType::PS, 9),
            record("03M260", "The Clinton School", 2019, SchoolType::MS, 260),
            record("02M407", "Clinton Hill Academy", 2019, SchoolType::PS, 407),
        ]
    }

    #[test]
    fn test_exact_match_ignores_case() {
        let records = records();
        let resolver = SchoolResolver::new(&records, &PipelineConfig::default());

        for query in ["MS 88", "ms 88", "  Ms   88 "] {
            let matches = resolver.resolve(query, None);
            assert_eq!(matches.len(), 1, "query {:?}", query);
            assert_eq!(matches[0].short_name, "MS 88");
            assert_eq!(matches[0].year, 2019);
        }
    }

    #[test]
    fn test_exact_match_respects_year() {
        let records = records();
        let resolver = SchoolResolver::new(&records, &PipelineConfig::default());

        let matches = resolver.resolve("MS 88", Some(2018));
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].year, 2018);

        assert!(resolver.resolve("PS 9", Some(2018)).is_empty());
    }

    #[test]
    fn test_fuzzy_match_on_clean_name() {
        let records = records();
        let resolver = SchoolResolver::new(&records, &PipelineConfig::default());

        let matches = resolver.resolve("peter rouget", None);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].dbn, "02M088");
    }

    #[test]
    fn test_fuzzy_matches_ranked_by_strict_ratio() {
        let records = records();
        let resolver = SchoolResolver::new(&records, &PipelineConfig::default());

        // "clinton" is a full token subset of both clinton names
        let matches = resolver.resolve("clinton school", None);
        assert!(!matches.is_empty());
        assert_eq!(matches[0].dbn, "03M260");
    }

    #[test]
    fn test_no_match_is_empty() {
        let records = records();
        let resolver = SchoolResolver::new(&records, &PipelineConfig::default());
        assert!(resolver.resolve("xyzzy", None).is_empty());
    }

    #[test]
    fn test_empty_record_set() {
        let resolver = SchoolResolver::new(&[], &PipelineConfig::default());
        assert_eq!(resolver.latest_year(), None);
        assert!(resolver.resolve("MS 88", None).is_empty());
    }

    #[test]
    fn test_utterance_with_glued_number() {
        let records = records();
        let resolver = SchoolResolver::new(&records, &PipelineConfig::default());

        let matches = resolver.resolve_utterance("ms88", None);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].short_name, "MS 88");
    }

    #[test]
    fn test_disambiguation_choices() {
        let records = records();
        let resolver = SchoolResolver::new(&records, &PipelineConfig::default());
        let matches = resolver.resolve("MS 88", None);

        let choices = disambiguation_choices(&matches);
        assert_eq!(
            choices,
            vec![DisambiguationChoice {
                dbn: "02M088".to_string(),
                short_name: "MS 88".to_string(),
                school_name: "M.S. 088 Peter Rouget".to_string(),
            }]
        );
    }
}
