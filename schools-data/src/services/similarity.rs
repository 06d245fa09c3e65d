//! String similarity scores on a 0-100 scale
//!
//! Both scores are built on `strsim::normalized_levenshtein`:
//! - [`ratio`] is character-order sensitive (strict)
//! - [`token_set_ratio`] ignores token order and tolerates missing tokens,
//!   which suits noisy voice-to-text queries but over-matches on short
//!   numeric tokens

use std::collections::BTreeSet;

/// Character-order-sensitive similarity (0-100); empty input scores 0
pub fn ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    strsim::normalized_levenshtein(a, b) * 100.0
}

/// Token-set similarity (0-100)
///
/// Compares the sorted shared tokens against each side's shared tokens plus
/// its remainder and keeps the best of the three pairings. A query whose
/// tokens are all contained in the candidate scores 100.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let a = process(a);
    let b = process(b);

    let tokens_a: BTreeSet<&str> = a.split_whitespace().collect();
    let tokens_b: BTreeSet<&str> = b.split_whitespace().collect();
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let join = |tokens: Vec<&str>| tokens.join(" ");
    let sect = join(tokens_a.intersection(&tokens_b).copied().collect());
    let diff_ab = join(tokens_a.difference(&tokens_b).copied().collect());
    let diff_ba = join(tokens_b.difference(&tokens_a).copied().collect());

    let combined_ab = format!("{} {}", sect, diff_ab).trim().to_string();
    let combined_ba = format!("{} {}", sect, diff_ba).trim().to_string();

    [
        ratio(&sect, &combined_ab),
        ratio(&sect, &combined_ba),
        ratio(&combined_ab, &combined_ba),
    ]
    .into_iter()
    .fold(0.0, f64::max)
}

/// Lowercase, replace non-alphanumerics with spaces, collapse whitespace
fn process(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_bounds() {
        assert_eq!(ratio("peter rouget", "peter rouget"), 100.0);
        assert_eq!(ratio("", "anything"), 0.0);
        let partial = ratio("peter rouget", "peter rogers");
        assert!(partial > 0.0 && partial < 100.0);
    }

    #[test]
    fn test_token_set_ignores_order() {
        assert_eq!(token_set_ratio("rouget peter", "peter rouget"), 100.0);
    }

    #[test]
    fn test_token_set_subset_scores_full() {
        assert_eq!(token_set_ratio("clinton", "the clinton school"), 100.0);
    }

    #[test]
    fn test_token_set_unrelated_is_low() {
        assert!(token_set_ratio("peter rouget", "brooklyn tech") < 50.0);
    }

    #[test]
    fn test_token_set_empty_is_zero() {
        assert_eq!(token_set_ratio("", "the clinton school"), 0.0);
        assert_eq!(token_set_ratio("...", "the clinton school"), 0.0);
    }

    #[test]
    fn test_strict_ratio_separates_token_set_ties() {
        // Both candidates contain every query token; only the strict ratio
        // tells them apart
        let query = "clinton";
        let close = "clinton school";
        let far = "the clinton school for writers and artists";
        assert_eq!(token_set_ratio(query, close), token_set_ratio(query, far));
        assert!(ratio(query, close) > ratio(query, far));
    }
}
