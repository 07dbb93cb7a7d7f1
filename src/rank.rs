//! Ordering and filtering of scored pairs.
//!
//! Pairs are ordered by composite score (descending). Ties fall back to the
//! smaller Tm difference, then the better product-size sub-score, then the
//! forward and reverse start positions. The sort is stable, so pairs that
//! agree on every key keep their input order.
use std::cmp::Ordering;

use crate::model::PrimerPair;

fn product_subscore(p: &PrimerPair) -> f64 { p.score.as_ref().map_or(0.0, |s| s.product_size) }

/// Total order used by [`rank`]. `Less` means `a` ranks ahead of `b`.
pub fn compare(a: &PrimerPair, b: &PrimerPair) -> Ordering {
    b.composite_score()
        .total_cmp(&a.composite_score())
        .then_with(|| a.tm_difference.total_cmp(&b.tm_difference))
        .then_with(|| product_subscore(b).total_cmp(&product_subscore(a)))
        .then_with(|| a.forward.start.cmp(&b.forward.start))
        .then_with(|| a.reverse.start.cmp(&b.reverse.start))
}

/// Sort by [`compare`] and assign 1-based ranks without gaps.
///
/// Unscored pairs count as score 0. Ranking an already ranked list gives the
/// same list back.
pub fn rank(mut pairs: Vec<PrimerPair>) -> Vec<PrimerPair> {
    pairs.sort_by(compare);
    for (i, p) in pairs.iter_mut().enumerate() {
        p.rank = i + 1;
    }
    pairs
}

/// Keep pairs whose composite score is at least `min_score`, preserving order
/// and ranks. Scores are compared as stored.
pub fn filter_by_score(pairs: Vec<PrimerPair>, min_score: f64) -> Vec<PrimerPair> {
    pairs.into_iter().filter(|p| p.composite_score() >= min_score).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Primer;
    use crate::score::ScoreBreakdown;
    use proptest::prelude::*;

    fn pair(fwd_start: usize, rev_tm: f64, total: f64, product: f64) -> PrimerPair {
        let fwd = Primer::new("ACGTACGTACGTACGTACGT", fwd_start, 60.0, 50.0, 0.0, 0.0).unwrap();
        let rev = Primer::new("TTGCATTGCATTGCATTGCA", fwd_start + 80, rev_tm, 50.0, 0.0, 0.0).unwrap();
        let mut p = PrimerPair::new(fwd, rev, 0.0).unwrap();
        p.score = Some(ScoreBreakdown {
            tm: 0.0,
            gc: 0.0,
            structure: 0.0,
            three_prime: 0.0,
            product_size: product,
            probe: 0.0,
            total,
        });
        p
    }

    #[test]
    fn highest_score_first_with_dense_ranks() {
        let ranked = rank(vec![pair(0, 60.0, 40.0, 5.0), pair(1, 60.0, 90.0, 5.0), pair(2, 60.0, 65.0, 5.0)]);
        let scores: Vec<f64> = ranked.iter().map(|p| p.composite_score()).collect();
        assert_eq!(scores, vec![90.0, 65.0, 40.0]);
        let ranks: Vec<usize> = ranked.iter().map(|p| p.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[test]
    fn ties_break_on_tm_difference_then_product_then_position() {
        // same score, ΔTm 2 vs 0.5
        let ranked = rank(vec![pair(0, 62.0, 70.0, 5.0), pair(5, 60.5, 70.0, 5.0)]);
        assert_eq!(ranked[0].forward.start, 5);

        let ranked = rank(vec![pair(0, 60.0, 70.0, 3.0), pair(5, 60.0, 70.0, 8.0)]);
        assert_eq!(ranked[0].forward.start, 5);

        let ranked = rank(vec![pair(9, 60.0, 70.0, 5.0), pair(4, 60.0, 70.0, 5.0)]);
        assert_eq!(ranked[0].forward.start, 4);
    }

    #[test]
    fn full_ties_keep_input_order() {
        let mut a = pair(0, 60.0, 70.0, 5.0);
        let mut b = pair(0, 60.0, 70.0, 5.0);
        a.cross_dimer_dg = -1.0;
        b.cross_dimer_dg = -2.0;
        let ranked = rank(vec![a, b]);
        assert_eq!(ranked[0].cross_dimer_dg, -1.0);
        assert_eq!(ranked[1].cross_dimer_dg, -2.0);
    }

    #[test]
    fn empty_input() {
        assert!(rank(Vec::new()).is_empty());
        assert!(filter_by_score(Vec::new(), 50.0).is_empty());
    }

    #[test]
    fn filter_is_inclusive_and_order_preserving() {
        let ranked = rank(vec![pair(0, 60.0, 80.0, 5.0), pair(1, 60.0, 50.0, 5.0), pair(2, 60.0, 49.9, 5.0)]);
        let kept = filter_by_score(ranked, 50.0);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].rank, 1);
        assert_eq!(kept[1].rank, 2);
        assert!(kept.iter().all(|p| p.composite_score() >= 50.0));
    }

    proptest! {
        #[test]
        fn ranking_is_sorted_dense_and_idempotent(
            specs in proptest::collection::vec((0usize..50, 55f64..65.0, 0f64..100.0, 0f64..10.0), 0..30),
        ) {
            let pairs: Vec<PrimerPair> = specs.iter().map(|&(s, tm, total, prod)| pair(s, tm, total, prod)).collect();
            let ranked = rank(pairs);
            for (i, p) in ranked.iter().enumerate() {
                prop_assert_eq!(p.rank, i + 1);
            }
            for w in ranked.windows(2) {
                prop_assert!(w[0].composite_score() >= w[1].composite_score());
            }
            let again = rank(ranked.clone());
            prop_assert_eq!(again, ranked);
        }

        #[test]
        fn filter_yields_a_subsequence(
            totals in proptest::collection::vec(0f64..100.0, 0..30),
            min in 0f64..100.0,
        ) {
            let ranked = rank(totals.iter().enumerate().map(|(i, &t)| pair(i, 60.0, t, 5.0)).collect());
            let kept = filter_by_score(ranked.clone(), min);
            let mut it = ranked.iter();
            for k in &kept {
                prop_assert!(k.composite_score() >= min);
                prop_assert!(it.any(|r| r == k));
            }
            let dropped = ranked.iter().filter(|p| p.composite_score() < min).count();
            prop_assert_eq!(kept.len() + dropped, ranked.len());
        }
    }
}
