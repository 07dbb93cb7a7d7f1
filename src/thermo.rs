//! Boundary to the oligo thermodynamics engine, plus small sequence helpers.
//!
//! Candidate generation and nearest-neighbour thermodynamics live outside this
//! crate. They are reached through two traits:
//! - [`OligoThermo`]: Tm and GC% for an arbitrary oligo (used for probe candidates)
//! - [`OligoEngine`]: raw primer-pair candidates for a target
//!
//! [`BasicThermo`] is a dependency-light fallback model (Wallace rule for short
//! oligos, the Marmur–Doty GC approximation otherwise). It is good enough for
//! tests and offline runs, not a substitute for a nearest-neighbour engine.
//!
//! # Examples
//! ```
//! use primerqc::thermo::{gc_percent, longest_homopolymer, BasicThermo, OligoThermo};
//! assert_eq!(gc_percent("GGCCAATT"), 50.0);
//! assert_eq!(longest_homopolymer("ACGGGGT"), 4);
//! let m = BasicThermo.oligo_metrics("ACGTACGTACGTACGTACGT").unwrap();
//! assert_eq!(m.gc_percent, 50.0);
//! ```
use crate::model::{PrimerPair, Target};

/// Melting temperature and GC content of one oligo.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OligoMetrics {
    /// Melting temperature (°C).
    pub tm: f64,
    /// GC content (0–100 %).
    pub gc_percent: f64,
}

/// Tm/GC computation for arbitrary sub-sequences.
///
/// Implementations must be callable from several worker threads at once.
/// A returned error is treated as an upstream engine failure for the whole
/// target being processed.
pub trait OligoThermo: Sync {
    fn oligo_metrics(&self, sequence: &str) -> anyhow::Result<OligoMetrics>;
}

/// Full engine: thermodynamics plus primer-pair candidate generation.
pub trait OligoEngine: OligoThermo {
    /// Raw, unscored candidates for `target`. An empty vector is a normal
    /// "no candidates" outcome; an error marks the target as failed.
    fn candidate_pairs(&self, target: &Target) -> anyhow::Result<Vec<PrimerPair>>;
}

impl<T: OligoThermo + ?Sized> OligoThermo for &T {
    fn oligo_metrics(&self, sequence: &str) -> anyhow::Result<OligoMetrics> { (**self).oligo_metrics(sequence) }
}

impl<T: OligoEngine + ?Sized> OligoEngine for &T {
    fn candidate_pairs(&self, target: &Target) -> anyhow::Result<Vec<PrimerPair>> { (**self).candidate_pairs(target) }
}

/// Fallback Tm/GC model with no external dependencies beyond `bio`.
#[derive(Clone, Copy, Debug, Default)]
pub struct BasicThermo;

impl BasicThermo {
    /// `2(A+T) + 4(G+C)` below 14 nt, `64.9 + 41(G+C − 16.4)/N` otherwise.
    pub fn tm(sequence: &str) -> f64 {
        let (mut at, mut gc) = (0usize, 0usize);
        for b in sequence.bytes() {
            match b.to_ascii_uppercase() {
                b'A' | b'T' => at += 1,
                b'G' | b'C' => gc += 1,
                _ => {}
            }
        }
        let n = sequence.len();
        if n == 0 {
            0.0
        } else if n < 14 {
            (2 * at + 4 * gc) as f64
        } else {
            64.9 + 41.0 * (gc as f64 - 16.4) / n as f64
        }
    }
}

impl OligoThermo for BasicThermo {
    fn oligo_metrics(&self, sequence: &str) -> anyhow::Result<OligoMetrics> {
        if sequence.is_empty() {
            anyhow::bail!("cannot compute Tm of an empty oligo");
        }
        Ok(OligoMetrics { tm: Self::tm(sequence), gc_percent: gc_percent(sequence) })
    }
}

/// GC content in percent (0 for an empty sequence). Case-insensitive.
pub fn gc_percent(sequence: &str) -> f64 {
    if sequence.is_empty() {
        return 0.0;
    }
    let upper = sequence.to_ascii_uppercase();
    f64::from(bio::seq_analysis::gc::gc_content(upper.bytes())) * 100.0
}

/// Length of the longest run of identical consecutive bases (case-insensitive).
pub fn longest_homopolymer(sequence: &str) -> usize {
    let mut best = 0usize;
    let mut run = 0usize;
    let mut prev: Option<u8> = None;
    for b in sequence.bytes().map(|b| b.to_ascii_uppercase()) {
        run = if prev == Some(b) { run + 1 } else { 1 };
        prev = Some(b);
        best = best.max(run);
    }
    best
}

/// `true` if `sequence` holds a run of `run_length` or more identical bases.
#[inline]
pub fn has_homopolymer_run(sequence: &str, run_length: usize) -> bool {
    run_length > 0 && longest_homopolymer(sequence) >= run_length
}

/// Number of G/C among the last five bases (the 3' clamp region).
pub fn gc_clamp_count(sequence: &str) -> usize {
    let bytes = sequence.as_bytes();
    let tail = &bytes[bytes.len().saturating_sub(5)..];
    tail.iter().filter(|b| matches!(b.to_ascii_uppercase(), b'G' | b'C')).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wallace_rule_for_short_oligos() {
        // 4 A/T, 4 G/C
        assert_eq!(BasicThermo::tm("AATTGGCC"), 24.0);
    }

    #[test]
    fn marmur_for_longer_oligos() {
        let tm = BasicThermo::tm("ACGTACGTACGTACGTACGT");
        let expected = 64.9 + 41.0 * (10.0 - 16.4) / 20.0;
        assert!((tm - expected).abs() < 1e-9);
    }

    #[test]
    fn empty_oligo_is_an_engine_error() {
        assert!(BasicThermo.oligo_metrics("").is_err());
    }

    #[test]
    fn gc_is_case_insensitive() {
        assert_eq!(gc_percent("ggccaatt"), 50.0);
        assert_eq!(gc_percent(""), 0.0);
        assert_eq!(gc_percent("ATAT"), 0.0);
    }

    #[test]
    fn homopolymer_runs() {
        assert_eq!(longest_homopolymer(""), 0);
        assert_eq!(longest_homopolymer("ACGT"), 1);
        assert!(has_homopolymer_run("ACAAAAT", 4));
        assert!(!has_homopolymer_run("ACAAAT", 4));
        assert!(has_homopolymer_run("acaaAAt", 4));
    }

    #[test]
    fn gc_clamp_counts_last_five() {
        assert_eq!(gc_clamp_count("AAAAAAAGC"), 2);
        assert_eq!(gc_clamp_count("GGGGGATATA"), 0);
        assert_eq!(gc_clamp_count("GC"), 2);
    }
}
