//! Per-school segregation against the district baseline
//!
//! For each school the five race/ethnicity counts are compared with the
//! counts its district's composition would predict:
//! - chi-square goodness of fit on observed vs. expected counts
//! - two-sample KS test between label multisets built from the observed
//!   counts and the rounded expected counts
//!
//! Rounding can leave the two multisets one element apart; one element is
//! then dropped at random from the larger, using the caller's RNG.

use crate::models::{Category, SchoolRecord};
use crate::services::district_aggregator::aggregate;
use crate::services::goodness_of_fit::{chi_square_goodness_of_fit, ks_two_sample};
use rand::Rng;
use schools_common::Result;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info};

/// Categories compared, in label order
pub const SEGREGATION_CATEGORIES: [Category; 5] = [
    Category::Asian,
    Category::White,
    Category::Black,
    Category::Hispanic,
    Category::Multiracial,
];

/// Test results for one school; `None` where a test is undefined
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegregationResult {
    pub dbn: String,
    pub year: i32,
    pub chi_square_statistic: Option<f64>,
    pub chi_square_p_value: Option<f64>,
    pub ks_p_value: Option<f64>,
}

/// Share of district enrollment per category, in [`SEGREGATION_CATEGORIES`]
/// order; `None` for a zero-enrollment district
pub type Baseline = Option<[f64; 5]>;

/// District baselines keyed by (district, year)
pub fn district_baselines(records: &[SchoolRecord]) -> HashMap<(u8, i32), Baseline> {
    aggregate(records)
        .into_iter()
        .map(|agg| {
            let mut proportions = [0.0; 5];
            let mut defined = true;
            for (slot, category) in proportions.iter_mut().zip(SEGREGATION_CATEGORIES) {
                match agg.totals.percentage(category) {
                    Some(p) => *slot = p,
                    None => defined = false,
                }
            }
            ((agg.district, agg.year), defined.then_some(proportions))
        })
        .collect()
}

/// Run both tests for every school, in input order
pub fn analyze<R: Rng + ?Sized>(records: &[SchoolRecord], rng: &mut R) -> Result<Vec<SegregationResult>> {
    let baselines = district_baselines(records);

    let results = records
        .iter()
        .map(|record| {
            let baseline = baselines.get(&(record.district, record.year)).copied().flatten();
            analyze_school(record, baseline, &mut *rng)
        })
        .collect::<Result<Vec<_>>>()?;

    info!("Analyzed segregation for {} schools in {} districts", results.len(), baselines.len());
    Ok(results)
}

/// Both tests for a single school against a given baseline
pub fn analyze_school<R: Rng + ?Sized>(
    record: &SchoolRecord,
    baseline: Baseline,
    rng: &mut R,
) -> Result<SegregationResult> {
    let mut result = SegregationResult {
        dbn: record.dbn.clone(),
        year: record.year,
        chi_square_statistic: None,
        chi_square_p_value: None,
        ks_p_value: None,
    };

    let Some(proportions) = baseline else {
        debug!(dbn = %record.dbn, "No district baseline (zero enrollment)");
        return Ok(result);
    };

    let observed: Vec<f64> = SEGREGATION_CATEGORIES
        .iter()
        .map(|&c| record.count(c) as f64)
        .collect();
    let expected: Vec<f64> = proportions
        .iter()
        .map(|p| p * record.total_enrollment as f64)
        .collect();

    if let Some(chi) = chi_square_goodness_of_fit(&observed, &expected)? {
        result.chi_square_statistic = Some(chi.statistic);
        result.chi_square_p_value = Some(chi.p_value);
    }

    let mut expected_labels = label_multiset(expected.iter().map(|e| e.round().max(0.0) as usize));
    let mut observed_labels = label_multiset(observed.iter().map(|o| o.max(0.0) as usize));
    equalize_sizes(&mut expected_labels, &mut observed_labels, rng);
    if expected_labels.len() != observed_labels.len() {
        debug!(
            dbn = %record.dbn,
            expected = expected_labels.len(),
            observed = observed_labels.len(),
            "Label multisets still differ in size after equalization"
        );
    }

    result.ks_p_value = ks_two_sample(&expected_labels, &observed_labels).map(|ks| ks.p_value);
    Ok(result)
}

/// Label ordinal `i` repeated `counts[i]` times
fn label_multiset(counts: impl Iterator<Item = usize>) -> Vec<f64> {
    counts
        .enumerate()
        .flat_map(|(label, count)| std::iter::repeat(label as f64).take(count))
        .collect()
}

/// Drop one uniformly chosen element from the larger multiset
fn equalize_sizes<R: Rng + ?Sized>(a: &mut Vec<f64>, b: &mut Vec<f64>, rng: &mut R) {
    let larger = match a.len().cmp(&b.len()) {
        std::cmp::Ordering::Greater => a,
        std::cmp::Ordering::Less => b,
        std::cmp::Ordering::Equal => return,
    };
    let index = rng.gen_range(0..larger.len());
    larger.remove(index);
}
