#![forbid(unsafe_code)]
//! # primerqc
//!
//! Quality control, probe placement, scoring and ranking for PCR/qPCR
//! **primer pairs**. Raw candidates come from an external design engine
//! (see [`thermo::OligoEngine`]); this crate decides which of them are worth
//! ordering.
//!
//! ## Pipeline
//! 1. [`qc`]: classify every metric as `pass`, `warn` or `fail` against [`config::QcThresholds`]
//! 2. [`probe`]: place a TaqMan probe between the primers when one is missing
//! 3. [`score`]: fold the metrics into a 0–100 composite score
//! 4. [`rank`]: order pairs by score with deterministic tie-breaks, filter by a floor
//! 5. [`batch`]: run the above for many targets in parallel, isolating failures
//!
//! ## Highlights
//! - **Deterministic**: same inputs and thresholds give the same order, on any thread count.
//! - **Typed thresholds**: defaults are built in, overrides load from TOML and are validated up front.
//! - **Pure stages**: each stage consumes a pair and returns a new one.
//!
//! ## Examples
//! ```rust
//! use primerqc::{config::QcThresholds, model::{Primer, PrimerPair}};
//!
//! let th = QcThresholds::default();
//! let fwd = Primer::new("ACGTACGTACGTACGTATAG", 0, 60.0, 50.0, -0.5, -3.0).unwrap();
//! let rev = Primer::new("TTGCATTGCATTGCATTAAC", 80, 60.4, 45.0, -1.0, -4.0).unwrap();
//! let pairs = vec![PrimerPair::new(fwd, rev, -2.0).unwrap()];
//!
//! let ranked = primerqc::score_and_rank(pairs, &th);
//! assert_eq!(ranked[0].rank, 1);
//! assert!(ranked[0].composite_score() > 60.0);
//! assert_eq!(primerqc::overall_status(&ranked[0]), Some(primerqc::qc::QcStatus::Pass));
//! ```
pub mod batch;
pub mod candidates;
pub mod config;
pub mod error;
pub mod model;
pub mod probe;
pub mod qc;
pub mod rank;
pub mod score;
pub mod thermo;

pub use batch::{design_target, run_batch, BatchOpts};
pub use config::QcThresholds;
pub use error::{CandidateError, ConfigError, ModelError};
pub use model::{DesignResult, Primer, PrimerPair, Probe, Target, TargetStatus};
pub use qc::QcStatus;

/// Classify, score and rank pairs that already carry whatever probe they will get.
///
/// # Examples
/// ```
/// let ranked = primerqc::score_and_rank(Vec::new(), &primerqc::QcThresholds::default());
/// assert!(ranked.is_empty());
/// ```
pub fn score_and_rank(pairs: Vec<PrimerPair>, th: &QcThresholds) -> Vec<PrimerPair> {
    rank::rank(pairs.into_iter().map(|p| score::score_pair(p.classified(th), th)).collect())
}

/// Worst status across every classified metric of `pair`, if it has been classified.
pub fn overall_status(pair: &PrimerPair) -> Option<QcStatus> { pair.qc.as_ref().map(|q| q.overall()) }

/// Crate version string (from `CARGO_PKG_VERSION`).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Convenience: one row per pair of a result, for CLI/UX.
/// Each row is `(rank, forward, reverse, probe, product_size, tm_difference, score, status)`.
pub fn result_rows(result: &DesignResult) -> Vec<(u64, String, String, String, u64, f64, f64, String)> {
    result
        .pairs
        .iter()
        .map(|p| {
            (
                p.rank as u64,
                p.forward.sequence.clone(),
                p.reverse.sequence.clone(),
                p.probe.as_ref().map(|pr| pr.sequence.clone()).unwrap_or_default(),
                p.product_size as u64,
                p.tm_difference,
                p.composite_score(),
                overall_status(p).map_or("-", |s| s.as_str()).to_string(),
            )
        })
        .collect()
}

/// Convenience: one summary row per target.
/// Each row is `(target_id, status, num_pairs, best_score)`; `best_score` is `None`
/// when nothing survived.
pub fn summary_rows(results: &[DesignResult]) -> Vec<(String, String, u64, Option<f64>)> {
    results
        .iter()
        .map(|r| {
            let status = match &r.status {
                TargetStatus::Designed => "designed".to_string(),
                TargetStatus::NoCandidates => "no_candidates".to_string(),
                TargetStatus::Failed { reason } => format!("failed: {reason}"),
            };
            (r.target_id.clone(), status, r.num_pairs() as u64, r.best_pair().map(|p| p.composite_score()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(rev_start: usize, rev_tm: f64) -> PrimerPair {
        let f = Primer::new("ACGTACGTACGTACGTATAG", 0, 60.0, 50.0, 0.0, 0.0).unwrap();
        let r = Primer::new("TTGCATTGCATTGCATTAAC", rev_start, rev_tm, 50.0, 0.0, 0.0).unwrap();
        PrimerPair::new(f, r, 0.0).unwrap()
    }

    #[test]
    fn score_and_rank_fills_every_derived_field() {
        let ranked = score_and_rank(vec![pair(200, 64.0), pair(80, 60.0)], &QcThresholds::default());
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].product_size, 100);
        for (i, p) in ranked.iter().enumerate() {
            assert_eq!(p.rank, i + 1);
            assert!(p.qc.is_some());
            assert!(p.score.is_some());
        }
    }

    #[test]
    fn overall_status_needs_classification() {
        let p = pair(80, 60.0);
        assert_eq!(overall_status(&p), None);
        let p = p.classified(&QcThresholds::default());
        assert_eq!(overall_status(&p), Some(QcStatus::Pass));
    }

    #[test]
    fn rows_follow_rank_order() {
        let result = DesignResult {
            target_id: "t".into(),
            target_sequence: String::new(),
            status: TargetStatus::Designed,
            pairs: score_and_rank(vec![pair(300, 66.0), pair(80, 60.0)], &QcThresholds::default()),
        };
        let rows = result_rows(&result);
        assert_eq!(rows[0].0, 1);
        assert_eq!(rows[0].4, 100);
        assert!(rows[0].6 >= rows[1].6);
        assert_eq!(rows[0].3, "");
    }

    #[test]
    fn summary_reports_status_and_best() {
        let t = Target::new("x", "ACGT");
        let failed = DesignResult::failed(&t, "boom");
        let rows = summary_rows(&[failed]);
        assert_eq!(rows[0].1, "failed: boom");
        assert_eq!(rows[0].2, 0);
        assert_eq!(rows[0].3, None);
    }

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
