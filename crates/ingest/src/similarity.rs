use std::collections::HashSet;

use crate::util::normalize_text;

pub const EXACT_SCORE: f32 = 1.0;
pub const CONTAINMENT_SCORE: f32 = 0.8;

/// Tokens shorter than this are ignored by the overlap rule.
const MIN_TOKEN_LEN: usize = 3;

/// Heuristic textual closeness in `[0.0, 1.0]`, used only as a duplicate signal.
///
/// Rules, first hit wins:
/// 1. either side blank: `0.0`
/// 2. equal after normalization: `1.0`
/// 3. one contains the other: `0.8`
/// 4. shared distinct tokens (3+ chars) over the larger token set
pub fn similarity(a: &str, b: &str) -> f32 {
    let a = normalize_text(a);
    let b = normalize_text(b);

    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return EXACT_SCORE;
    }
    if a.contains(&b) || b.contains(&a) {
        return CONTAINMENT_SCORE;
    }

    let ta = tokens(&a);
    let tb = tokens(&b);
    let denominator = ta.len().max(tb.len());
    if denominator == 0 {
        return 0.0;
    }
    ta.intersection(&tb).count() as f32 / denominator as f32
}

fn tokens(normalized: &str) -> HashSet<&str> {
    normalized
        .split(' ')
        .filter(|t| t.chars().count() >= MIN_TOKEN_LEN)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_inputs_score_zero() {
        assert_eq!(similarity("", "coffee"), 0.0);
        assert_eq!(similarity("coffee", ""), 0.0);
        assert_eq!(similarity("   ", "   "), 0.0);
    }

    #[test]
    fn equal_after_normalization_is_one() {
        assert_eq!(similarity("Coffee 150", "  coffee   150 "), 1.0);
    }

    #[test]
    fn containment_is_point_eight() {
        assert_eq!(similarity("Coffee 150", "coffee 150 at starbucks"), 0.8);
        assert_eq!(similarity("coffee 150 at starbucks", "Coffee 150"), 0.8);
    }

    #[test]
    fn token_overlap_over_larger_set() {
        // {coffee, 150} vs {coffee, starbucks, 150}: "at" is too short to count.
        let score = similarity("Coffee 150", "Coffee at Starbucks 150");
        assert!((score - 2.0 / 3.0).abs() < 1e-6, "score was {score}");
    }

    #[test]
    fn token_order_is_irrelevant() {
        assert_eq!(similarity("starbucks coffee 150", "150 coffee starbucks latte"), 0.75);
        assert_eq!(similarity("latte starbucks coffee", "coffee latte starbucks"), 1.0);
    }

    #[test]
    fn repeated_tokens_count_once() {
        // {lunch, pizza} vs {lunch, pizza, soda}
        let score = similarity("lunch lunch pizza", "pizza lunch soda");
        assert!((score - 2.0 / 3.0).abs() < 1e-6, "score was {score}");
    }

    #[test]
    fn only_short_tokens_score_zero() {
        assert_eq!(similarity("ab cd", "ef gh"), 0.0);
    }

    #[test]
    fn unrelated_text_scores_zero() {
        assert_eq!(similarity("Coffee 150", "Uber ride home"), 0.0);
    }

    #[test]
    fn symmetric_and_bounded() {
        let samples = [
            "",
            "Coffee 150",
            "coffee at starbucks 150",
            "Got paid 35000 salary",
            "salary paid",
            "ab",
            "Uber 12 to the airport",
            "uber airport",
        ];
        for a in samples {
            for b in samples {
                let ab = similarity(a, b);
                assert_eq!(ab, similarity(b, a), "asymmetric for {a:?} / {b:?}");
                assert!((0.0..=1.0).contains(&ab), "out of bounds for {a:?} / {b:?}");
            }
        }
    }
}
