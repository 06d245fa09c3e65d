//! School name normalization
//!
//! Produces the two canonical names used for lookup:
//! - **clean name**: normalized free text, compared fuzzily
//! - **short name**: "<type> <number>" identity ("PS 9"), compared exactly

use crate::models::SchoolRecord;
use once_cell::sync::Lazy;
use regex::Regex;
use schools_common::config::AbbreviationRule;
use schools_common::PipelineConfig;

/// Embedded "<m|p|i>s <number>" abbreviation, case-insensitive, word bounded
static ABBREVIATION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b[mpi]s \d+\b").expect("abbreviation pattern is valid"));

/// Name normalizer configured with the punctuated abbreviation table
#[derive(Debug, Clone)]
pub struct NameNormalizer {
    abbreviations: Vec<AbbreviationRule>,
}

impl Default for NameNormalizer {
    fn default() -> Self {
        Self::new(&PipelineConfig::default())
    }
}

impl NameNormalizer {
    pub fn new(config: &PipelineConfig) -> Self {
        let abbreviations = config
            .abbreviations
            .iter()
            .map(|rule| AbbreviationRule {
                code: rule.code.to_uppercase(),
                variants: rule.variants.iter().map(|v| v.to_uppercase()).collect(),
            })
            .collect();
        Self { abbreviations }
    }

    /// Fill in `clean_name` and `short_name` on an enriched record
    pub fn apply(&self, record: &mut SchoolRecord) {
        record.clean_name = clean_name(&record.school_name);
        record.short_name = self.short_name(record);
    }

    /// "<code> <number>" when the display name carries a punctuated
    /// abbreviation, else "<school type> <number>"
    pub fn short_name(&self, record: &SchoolRecord) -> String {
        let upper = record.school_name.to_uppercase();

        let code = self
            .abbreviations
            .iter()
            .find(|rule| rule.variants.iter().any(|v| upper.contains(v.as_str())))
            .map(|rule| rule.code.as_str())
            .unwrap_or_else(|| record.school_type.as_str());

        format!("{} {}", code, record.school_number)
    }
}

/// Normalize a display name for fuzzy comparison
///
/// Lowercase, trim, drop periods, collapse whitespace, strip leading zeros
/// from numeric tokens, then remove "<m|p|i>s <number>" abbreviations.
/// Idempotent.
pub fn clean_name(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase().replace('.', "");
    let mut name = lowered
        .split_whitespace()
        .map(normalize_numeric_token)
        .collect::<Vec<_>>()
        .join(" ");

    // Stripping can splice a new abbreviation together ("ps ms 3 4"), so
    // repeat until none remain
    while ABBREVIATION_PATTERN.is_match(&name) {
        name = collapse_whitespace(&ABBREVIATION_PATTERN.replace_all(&name, " "));
    }

    name
}

/// Lowercase and collapse whitespace (query-side normalization)
pub fn normalize_query(query: &str) -> String {
    collapse_whitespace(&query.to_lowercase())
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// "009" → "9"; non-numeric tokens pass through
fn normalize_numeric_token(token: &str) -> String {
    if !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(n) = token.parse::<u64>() {
            return n.to_string();
        }
    }
    token.to_string()
}
