//! Typed errors for configuration and data-model invariants.
//!
//! Upstream engine failures are carried as `anyhow::Error` at the
//! [`crate::thermo`] boundary; only the failures a caller may want to match on
//! get a dedicated type here.

/// A threshold configuration that cannot be used for scoring.
///
/// Returned by [`crate::config::QcThresholds::validate`] before any scoring
/// begins, never discovered mid-batch.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{metric}: threshold value {value} is not a finite number")]
    NonFinite { metric: &'static str, value: f64 },

    #[error("{metric}: {band} band is inverted ({lo} > {hi})")]
    InvertedBand { metric: &'static str, band: &'static str, lo: f64, hi: f64 },

    #[error("{metric}: warn band [{warn_lo}, {warn_hi}] does not enclose good band [{good_lo}, {good_hi}]")]
    WarnDoesNotEnclose {
        metric: &'static str,
        good_lo: f64,
        good_hi: f64,
        warn_lo: f64,
        warn_hi: f64,
    },

    #[error("{metric}: optimum {optimal} lies outside the good band [{lo}, {hi}]")]
    OptimumOutsideGood { metric: &'static str, optimal: f64, lo: f64, hi: f64 },

    #[error("tm_difference: warn ceiling must be positive, got {0}")]
    NonPositiveTmDiffCeiling(f64),

    #[error("probe length range {min}..={max} is empty")]
    EmptyLengthRange { min: usize, max: usize },

    #[error("probe homopolymer limit must be at least 2, got {0}")]
    HomopolymerLimitTooSmall(usize),

    #[error("3' base rules: {0}")]
    ThreePrimeRules(String),
}

/// A primer, pair or probe record that violates its structural invariants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("oligo sequence is empty")]
    EmptySequence,

    #[error("oligo sequence contains invalid base {base:?} at offset {offset}")]
    InvalidBase { base: char, offset: usize },

    #[error("oligo of length {length} at offset {start} runs past the end of the coordinate space")]
    CoordinateOverflow { start: usize, length: usize },

    #[error("forward primer ends at {forward_end} but reverse primer starts at {reverse_start}")]
    OverlappingPrimers { forward_end: usize, reverse_start: usize },

    #[error("probe [{start}, {end}) is not inside the inter-primer region [{region_start}, {region_end})")]
    ProbeOutsideAmplicon { start: usize, end: usize, region_start: usize, region_end: usize },
}

/// A candidate input that cannot be mapped onto targets unambiguously.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CandidateError {
    #[error("target id {id:?} appears in records {first} and {second}")]
    DuplicateTargetId { id: String, first: usize, second: usize },
}
