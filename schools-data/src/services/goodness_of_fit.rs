//! Chi-square goodness-of-fit and two-sample Kolmogorov-Smirnov tests

use statrs::distribution::{ChiSquared, ContinuousCDF};
use thiserror::Error;

/// Statistical test errors
#[derive(Debug, Error)]
pub enum StatsError {
    /// Observed and expected vectors differ in length
    #[error("Length mismatch: {observed} observed vs {expected} expected")]
    LengthMismatch { observed: usize, expected: usize },

    /// Fewer than two categories leaves no degrees of freedom
    #[error("At least two categories required, got {0}")]
    TooFewCategories(usize),

    /// Reference distribution could not be constructed
    #[error("Distribution error: {0}")]
    Distribution(String),
}

impl From<StatsError> for schools_common::Error {
    fn from(err: StatsError) -> Self {
        schools_common::Error::Internal(err.to_string())
    }
}

/// Test statistic and its p-value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestOutcome {
    pub statistic: f64,
    pub p_value: f64,
}

/// Pearson chi-square goodness of fit with `k - 1` degrees of freedom
///
/// Cells with zero expected and zero observed contribute nothing. A zero
/// expected cell with a positive observation makes the statistic infinite
/// (p-value 0). Returns `None` when every expected cell is zero.
pub fn chi_square_goodness_of_fit(observed: &[f64], expected: &[f64]) -> Result<Option<TestOutcome>, StatsError> {
    if observed.len() != expected.len() {
        return Err(StatsError::LengthMismatch {
            observed: observed.len(),
            expected: expected.len(),
        });
    }
    if observed.len() < 2 {
        return Err(StatsError::TooFewCategories(observed.len()));
    }
    if expected.iter().all(|&e| e == 0.0) {
        return Ok(None);
    }

    let mut statistic = 0.0;
    for (&o, &e) in observed.iter().zip(expected) {
        if e == 0.0 {
            if o == 0.0 {
                continue;
            }
            return Ok(Some(TestOutcome {
                statistic: f64::INFINITY,
                p_value: 0.0,
            }));
        }
        statistic += (o - e).powi(2) / e;
    }

    let dof = (observed.len() - 1) as f64;
    let dist = ChiSquared::new(dof).map_err(|e| StatsError::Distribution(e.to_string()))?;
    let p_value = dist.sf(statistic).clamp(0.0, 1.0);

    Ok(Some(TestOutcome { statistic, p_value }))
}

/// Two-sample Kolmogorov-Smirnov test (two-sided)
///
/// The statistic is the largest gap between the two empirical CDFs; the
/// p-value uses the asymptotic Kolmogorov distribution at
/// `sqrt(n·m / (n + m)) · D`. Returns `None` if either sample is empty.
///
/// The asymptotic p-value is only approximate for small samples, and heavy
/// ties (few distinct values, as with category labels) make it conservative.
/// No exact small-sample distribution is computed.
pub fn ks_two_sample(a: &[f64], b: &[f64]) -> Option<TestOutcome> {
    if a.is_empty() || b.is_empty() {
        return None;
    }

    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort_by(f64::total_cmp);
    b.sort_by(f64::total_cmp);

    let n = a.len() as f64;
    let m = b.len() as f64;

    let mut statistic: f64 = 0.0;
    for &x in a.iter().chain(b.iter()) {
        let cdf_a = a.partition_point(|&v| v <= x) as f64 / n;
        let cdf_b = b.partition_point(|&v| v <= x) as f64 / m;
        statistic = statistic.max((cdf_a - cdf_b).abs());
    }

    let effective_n = (n * m / (n + m)).sqrt();
    let p_value = kolmogorov_sf(effective_n * statistic);

    Some(TestOutcome { statistic, p_value })
}

/// Kolmogorov survival function Q(λ) = 2 Σ (-1)^(k-1) exp(-2 k² λ²)
///
/// The series does not converge for small λ, where Q is 1.
fn kolmogorov_sf(lambda: f64) -> f64 {
    let a2 = -2.0 * lambda * lambda;
    let mut sign = 2.0;
    let mut sum = 0.0;
    let mut previous_term: f64 = 0.0;

    for k in 1..=100 {
        let k = k as f64;
        let term = sign * (a2 * k * k).exp();
        sum += term;
        if term.abs() <= 0.001 * previous_term || term.abs() <= 1.0e-8 * sum {
            return sum.clamp(0.0, 1.0);
        }
        sign = -sign;
        previous_term = term.abs();
    }
    1.0
}
