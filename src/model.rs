//! Core types for **primers**, **primer pairs**, **probes** and per-target results.
//!
//! # Coordinates
//! All positions are 0-based, half-open `[start, end)` offsets on the forward
//! strand of the target. A reverse primer's `start..end` is its footprint on
//! the forward strand, while its `sequence` is written 5'→3' on the reverse
//! strand, so its last character is its 3' terminal base.
//!
//! A valid pair has `forward.end <= reverse.start`. The constructors derive
//! every dependent field (`end`, `length`, terminal bases, product size, Tm
//! difference) so the invariants hold by construction, including for records
//! read through `serde`.
//!
//! # Derived fields
//! Records arrive unscored from the upstream engine. Classification, probe
//! placement, scoring and ranking fill `qc`, `probe`, `score` and `rank`; each
//! stage consumes a pair and returns a new one, and re-running a stage on its
//! own output reproduces the same values.
use serde::{Deserialize, Serialize};

use crate::config::QcThresholds;
use crate::error::ModelError;
use crate::qc::PairQc;
use crate::score::ScoreBreakdown;

fn end_of(start: usize, length: usize) -> Result<usize, ModelError> {
    start.checked_add(length).ok_or(ModelError::CoordinateOverflow { start, length })
}

fn check_bases(sequence: &str) -> Result<String, ModelError> {
    if sequence.is_empty() {
        return Err(ModelError::EmptySequence);
    }
    let upper = sequence.to_ascii_uppercase();
    if let Some((offset, base)) = upper.char_indices().find(|(_, c)| !matches!(c, 'A' | 'C' | 'G' | 'T' | 'N')) {
        return Err(ModelError::InvalidBase { base, offset });
    }
    Ok(upper)
}

/// Serialized form of a primer, before its derived fields are computed.
#[derive(Clone, Debug, Deserialize)]
struct RawPrimer {
    sequence: String,
    start: usize,
    tm: f64,
    gc_percent: f64,
    #[serde(default)]
    hairpin_dg: f64,
    #[serde(default)]
    self_dimer_dg: f64,
}

/// A single oligonucleotide primer as produced by the design engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPrimer")]
pub struct Primer {
    /// Uppercase sequence over `ACGTN`, 5'→3'.
    pub sequence: String,
    pub start: usize,
    pub end: usize,
    pub length: usize,
    /// Melting temperature (°C).
    pub tm: f64,
    /// GC content (%).
    pub gc_percent: f64,
    /// Hairpin ΔG (kcal/mol); more negative is worse.
    pub hairpin_dg: f64,
    /// Self-dimer ΔG (kcal/mol); more negative is worse.
    pub self_dimer_dg: f64,
    /// 3'-most base.
    pub three_prime_base: char,
}

impl Primer {
    pub fn new(
        sequence: &str,
        start: usize,
        tm: f64,
        gc_percent: f64,
        hairpin_dg: f64,
        self_dimer_dg: f64,
    ) -> Result<Self, ModelError> {
        let sequence = check_bases(sequence)?;
        let length = sequence.len();
        let three_prime_base = sequence.chars().last().ok_or(ModelError::EmptySequence)?;
        let end = end_of(start, length)?;
        Ok(Primer {
            sequence,
            start,
            end,
            length,
            tm,
            gc_percent,
            hairpin_dg,
            self_dimer_dg,
            three_prime_base,
        })
    }
}

impl TryFrom<RawPrimer> for Primer {
    type Error = ModelError;
    fn try_from(r: RawPrimer) -> Result<Self, Self::Error> {
        Primer::new(&r.sequence, r.start, r.tm, r.gc_percent, r.hairpin_dg, r.self_dimer_dg)
    }
}

#[derive(Clone, Debug, Deserialize)]
struct RawProbe {
    sequence: String,
    start: usize,
    tm: f64,
    gc_percent: f64,
}

/// A TaqMan-style hybridization probe placed between the primers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawProbe")]
pub struct Probe {
    pub sequence: String,
    pub start: usize,
    pub end: usize,
    pub length: usize,
    pub tm: f64,
    pub gc_percent: f64,
    /// 5'-most base.
    pub five_prime_base: char,
}

impl Probe {
    pub fn new(sequence: &str, start: usize, tm: f64, gc_percent: f64) -> Result<Self, ModelError> {
        let sequence = check_bases(sequence)?;
        let length = sequence.len();
        let five_prime_base = sequence.chars().next().ok_or(ModelError::EmptySequence)?;
        let end = end_of(start, length)?;
        Ok(Probe { sequence, start, end, length, tm, gc_percent, five_prime_base })
    }
}

impl TryFrom<RawProbe> for Probe {
    type Error = ModelError;
    fn try_from(r: RawProbe) -> Result<Self, Self::Error> { Probe::new(&r.sequence, r.start, r.tm, r.gc_percent) }
}

#[derive(Clone, Debug, Deserialize)]
struct RawPair {
    forward: Primer,
    reverse: Primer,
    #[serde(default)]
    cross_dimer_dg: f64,
    #[serde(default)]
    probe: Option<Probe>,
}

/// Forward/reverse primer combination plus its derived QC data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPair")]
pub struct PrimerPair {
    pub forward: Primer,
    pub reverse: Primer,
    /// `reverse.end - forward.start`.
    pub product_size: usize,
    /// `|forward.tm - reverse.tm|`.
    pub tm_difference: f64,
    /// Forward/reverse heterodimer ΔG (kcal/mol).
    pub cross_dimer_dg: f64,
    pub probe: Option<Probe>,
    /// Filled by [`PrimerPair::classified`].
    pub qc: Option<PairQc>,
    /// Filled by [`crate::score::score_pair`].
    pub score: Option<ScoreBreakdown>,
    /// 1-based rank; 0 until ranked.
    pub rank: usize,
}

impl PrimerPair {
    pub fn new(forward: Primer, reverse: Primer, cross_dimer_dg: f64) -> Result<Self, ModelError> {
        if forward.end > reverse.start {
            return Err(ModelError::OverlappingPrimers { forward_end: forward.end, reverse_start: reverse.start });
        }
        Ok(PrimerPair {
            product_size: reverse.end - forward.start,
            tm_difference: (forward.tm - reverse.tm).abs(),
            forward,
            reverse,
            cross_dimer_dg,
            probe: None,
            qc: None,
            score: None,
            rank: 0,
        })
    }

    /// Attach a probe, checking that it sits between the primers.
    pub fn with_probe(mut self, probe: Probe) -> Result<Self, ModelError> {
        let (region_start, region_end) = self.inter_primer_region();
        if probe.start < region_start || probe.end > region_end {
            return Err(ModelError::ProbeOutsideAmplicon { start: probe.start, end: probe.end, region_start, region_end });
        }
        self.probe = Some(probe);
        Ok(self)
    }

    /// `[forward.end, reverse.start)`.
    pub fn inter_primer_region(&self) -> (usize, usize) { (self.forward.end, self.reverse.start) }

    pub fn primer_avg_tm(&self) -> f64 { (self.forward.tm + self.reverse.tm) / 2.0 }

    pub fn primer_avg_gc(&self) -> f64 { (self.forward.gc_percent + self.reverse.gc_percent) / 2.0 }

    /// Composite score (0–100), or 0 while unscored.
    pub fn composite_score(&self) -> f64 { self.score.as_ref().map_or(0.0, |s| s.total) }

    /// Probe Tm above the primer average, if a probe is attached.
    pub fn probe_tm_delta(&self) -> Option<f64> { self.probe.as_ref().map(|p| p.tm - self.primer_avg_tm()) }

    /// Return this pair with `qc` filled in for the current primers and probe.
    pub fn classified(mut self, th: &QcThresholds) -> Self {
        self.qc = Some(crate::qc::classify_pair(&self, th));
        self
    }
}

impl TryFrom<RawPair> for PrimerPair {
    type Error = ModelError;
    fn try_from(r: RawPair) -> Result<Self, Self::Error> {
        let pair = PrimerPair::new(r.forward, r.reverse, r.cross_dimer_dg)?;
        match r.probe {
            Some(p) => pair.with_probe(p),
            None => Ok(pair),
        }
    }
}

/// A named target sequence handed to the batch orchestrator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub id: String,
    pub sequence: String,
}

impl Target {
    pub fn new(id: impl Into<String>, sequence: impl Into<String>) -> Self {
        Target { id: id.into(), sequence: sequence.into() }
    }
}

/// How a target fared in the pipeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TargetStatus {
    /// At least one candidate was scored (the list may still be empty after filtering).
    Designed,
    /// The engine returned no candidates. Not an error.
    NoCandidates,
    /// The engine failed for this target.
    Failed { reason: String },
}

/// Scored and ranked output for one target.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DesignResult {
    pub target_id: String,
    pub target_sequence: String,
    pub status: TargetStatus,
    /// Ordered by rank.
    pub pairs: Vec<PrimerPair>,
}

impl DesignResult {
    pub fn failed(target: &Target, reason: impl Into<String>) -> Self {
        DesignResult {
            target_id: target.id.clone(),
            target_sequence: target.sequence.clone(),
            status: TargetStatus::Failed { reason: reason.into() },
            pairs: Vec::new(),
        }
    }

    /// Highest-ranked pair, if any.
    pub fn best_pair(&self) -> Option<&PrimerPair> {
        self.pairs.iter().filter(|p| p.rank > 0).min_by_key(|p| p.rank).or_else(|| self.pairs.first())
    }

    pub fn num_pairs(&self) -> usize { self.pairs.len() }

    pub fn is_failed(&self) -> bool { matches!(self.status, TargetStatus::Failed { .. }) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn primer(seq: &str, start: usize, tm: f64) -> Primer { Primer::new(seq, start, tm, 50.0, 0.0, 0.0).unwrap() }

    #[test]
    fn primer_derives_end_length_and_terminal_base() {
        let p = Primer::new("acgtacgtacgtacgtacgG", 10, 60.0, 50.0, -1.0, -3.0).unwrap();
        assert_eq!(p.sequence, "ACGTACGTACGTACGTACGG");
        assert_eq!(p.length, 20);
        assert_eq!(p.end, 30);
        assert_eq!(p.end - p.start, p.sequence.len());
        assert_eq!(p.three_prime_base, 'G');
    }

    #[test]
    fn bad_sequences_are_rejected() {
        assert_eq!(Primer::new("", 0, 60.0, 50.0, 0.0, 0.0), Err(ModelError::EmptySequence));
        assert_eq!(
            Primer::new("ACGU", 0, 60.0, 50.0, 0.0, 0.0),
            Err(ModelError::InvalidBase { base: 'U', offset: 3 })
        );
    }

    #[test]
    fn pair_derives_product_size_and_tm_difference() {
        let pair = PrimerPair::new(primer("ACGTACGTACGTACGTACGT", 0, 59.0), primer("TTGCATTGCATTGCATTGCA", 80, 61.5), -4.0).unwrap();
        assert_eq!(pair.product_size, 100);
        assert!((pair.tm_difference - 2.5).abs() < 1e-12);
        assert!((pair.primer_avg_tm() - 60.25).abs() < 1e-12);
        assert_eq!(pair.rank, 0);
        assert_eq!(pair.composite_score(), 0.0);
    }

    #[test]
    fn coordinates_past_usize_max_are_rejected() {
        assert_eq!(
            Primer::new("ACGT", usize::MAX - 2, 60.0, 50.0, 0.0, 0.0),
            Err(ModelError::CoordinateOverflow { start: usize::MAX - 2, length: 4 })
        );
        assert!(matches!(Probe::new("ACGT", usize::MAX, 69.0, 50.0), Err(ModelError::CoordinateOverflow { .. })));

        let json = format!(r#"{{"sequence": "ACGT", "start": {}, "tm": 60.0, "gc_percent": 50.0}}"#, usize::MAX);
        assert!(serde_json::from_str::<Primer>(&json).is_err());
    }

    #[test]
    fn overlapping_primers_are_rejected() {
        let err = PrimerPair::new(primer("ACGTACGTACGTACGTACGT", 0, 60.0), primer("ACGTACGTACGTACGTACGT", 10, 60.0), 0.0).unwrap_err();
        assert_eq!(err, ModelError::OverlappingPrimers { forward_end: 20, reverse_start: 10 });
    }

    #[test]
    fn probe_must_sit_between_primers() {
        let pair = PrimerPair::new(primer("ACGTACGTACGTACGTACGT", 0, 60.0), primer("ACGTACGTACGTACGTACGT", 60, 60.0), 0.0).unwrap();
        let inside = Probe::new("CATCATCATCATCATCATCA", 25, 69.0, 33.0).unwrap();
        assert!(pair.clone().with_probe(inside).is_ok());
        let straddling = Probe::new("CATCATCATCATCATCATCA", 15, 69.0, 33.0).unwrap();
        assert!(matches!(pair.with_probe(straddling), Err(ModelError::ProbeOutsideAmplicon { .. })));
    }

    #[test]
    fn deserialization_goes_through_constructors() {
        let json = r#"{
            "forward": {"sequence": "ACGTACGTACGTACGTACGT", "start": 0, "tm": 60.0, "gc_percent": 50.0},
            "reverse": {"sequence": "TTGCATTGCATTGCATTGCA", "start": 80, "tm": 59.0, "gc_percent": 40.0,
                        "hairpin_dg": -1.2, "self_dimer_dg": -6.0},
            "cross_dimer_dg": -3.0
        }"#;
        let pair: PrimerPair = serde_json::from_str(json).unwrap();
        assert_eq!(pair.product_size, 100);
        assert_eq!(pair.reverse.three_prime_base, 'A');
        assert_eq!(pair.reverse.end, 100);

        let overlapping = json.replace("\"start\": 80", "\"start\": 5");
        assert!(serde_json::from_str::<PrimerPair>(&overlapping).is_err());
    }

    #[test]
    fn best_pair_prefers_rank_one() {
        let mut a = PrimerPair::new(primer("ACGTACGTACGTACGTACGT", 0, 60.0), primer("ACGTACGTACGTACGTACGT", 60, 60.0), 0.0).unwrap();
        let mut b = a.clone();
        a.rank = 2;
        b.rank = 1;
        b.cross_dimer_dg = -1.0;
        let result = DesignResult {
            target_id: "t".into(),
            target_sequence: String::new(),
            status: TargetStatus::Designed,
            pairs: vec![a, b],
        };
        assert_eq!(result.best_pair().map(|p| p.rank), Some(1));
        assert_eq!(result.num_pairs(), 2);
    }
}
