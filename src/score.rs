//! Composite 0–100 score for a primer pair.
//!
//! Five primer components are computed on their nominal scales:
//!
//! | component | max | rule |
//! |---|---|---|
//! | Tm | 25 | `25·(1 − abs(avg Tm − optimum)/10)` floored at 0, minus `5·ΔTm/ΔTm_warn`, floored at 0 |
//! | GC | 15 | `15·(1 − abs(avg GC − optimum)/30)` floored at 0 |
//! | structure | 30 | 30, −10 per non-passing hairpin / self-dimer / cross-dimer; 0 on a hard hairpin failure |
//! | 3' end | 20 | per primer: preferred +10, avoided −5, other +5 |
//! | product size | 10 | `10·(1 − abs(size − optimum)/100)` floored at 0 |
//!
//! Together they make a 100-point primer subtotal, which is scaled by
//! [`PRIMER_SCALE`] to 75 points. The probe adds [`PROBE_WEIGHT`] points when
//! its Tm-delta classifies PASS. A pair without a probe therefore tops out at
//! 75; probe quality is part of what separates qPCR assays.
//!
//! # Examples
//! ```
//! use primerqc::model::{Primer, PrimerPair, Probe};
//! use primerqc::config::QcThresholds;
//! use primerqc::score::score_breakdown;
//!
//! let fwd = Primer::new("ACGTACGTACGTACGTACGG", 0, 60.0, 50.0, 0.0, 0.0).unwrap();
//! let rev = Primer::new("TTGCATTGCATTGCATTGCG", 80, 60.0, 50.0, 0.0, 0.0).unwrap();
//! let pair = PrimerPair::new(fwd, rev, 0.0).unwrap()
//!     .with_probe(Probe::new("CATCATCATCATCATCATCA", 25, 69.0, 50.0).unwrap()).unwrap();
//! let s = score_breakdown(&pair, &QcThresholds::default());
//! assert_eq!(s.total, 100.0);
//! ```
use serde::{Deserialize, Serialize};

use crate::config::QcThresholds;
use crate::model::{Primer, PrimerPair};
use crate::qc::QcStatus;

pub const TM_WEIGHT: f64 = 25.0;
pub const GC_WEIGHT: f64 = 15.0;
pub const STRUCTURE_WEIGHT: f64 = 30.0;
pub const THREE_PRIME_WEIGHT: f64 = 20.0;
pub const PRODUCT_WEIGHT: f64 = 10.0;
pub const PROBE_WEIGHT: f64 = 25.0;

/// Share of the final score carried by the five primer components.
pub const PRIMER_SCALE: f64 = 0.75;

const TM_SPAN: f64 = 10.0;
const GC_SPAN: f64 = 30.0;
const PRODUCT_SPAN: f64 = 100.0;
const TM_MISMATCH_PENALTY: f64 = 5.0;
const STRUCTURE_PENALTY: f64 = 10.0;
const THREE_PRIME_PREFERRED: f64 = 10.0;
const THREE_PRIME_AVOIDED: f64 = -5.0;
const THREE_PRIME_OTHER: f64 = 5.0;

/// Every sub-score of a pair plus the clamped total.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub tm: f64,
    pub gc: f64,
    pub structure: f64,
    pub three_prime: f64,
    pub product_size: f64,
    pub probe: f64,
    pub total: f64,
}

impl ScoreBreakdown {
    /// Sum of the five primer components on their nominal scales (0–100).
    pub fn primer_subtotal(&self) -> f64 { self.tm + self.gc + self.structure + self.three_prime + self.product_size }
}

#[inline]
fn floor0(x: f64) -> f64 {
    // NaN collapses to 0 as well
    if x > 0.0 { x } else { 0.0 }
}

fn closeness(value: f64, optimum: f64, span: f64) -> f64 { floor0(1.0 - (value - optimum).abs() / span) }

pub fn tm_score(pair: &PrimerPair, th: &QcThresholds) -> f64 {
    let base = TM_WEIGHT * closeness(pair.primer_avg_tm(), th.tm.optimal, TM_SPAN);
    let penalty = TM_MISMATCH_PENALTY * (pair.tm_difference / th.tm_difference.warn.hi);
    floor0(base - penalty)
}

pub fn gc_score(pair: &PrimerPair, th: &QcThresholds) -> f64 {
    GC_WEIGHT * closeness(pair.primer_avg_gc(), th.gc.optimal, GC_SPAN)
}

/// Structure points (0–30). A hairpin below `hairpin_hard_fail` zeroes the
/// component regardless of the other metrics.
pub fn structure_score(pair: &PrimerPair, th: &QcThresholds) -> f64 {
    let worst_hairpin = pair.forward.hairpin_dg.min(pair.reverse.hairpin_dg);
    if worst_hairpin < th.hairpin_hard_fail || worst_hairpin.is_nan() {
        return 0.0;
    }
    let worst_self = pair.forward.self_dimer_dg.min(pair.reverse.self_dimer_dg);
    let checks = [
        th.hairpin_dg.bands().classify(worst_hairpin),
        th.self_dimer_dg.bands().classify(worst_self),
        th.cross_dimer_dg.bands().classify(pair.cross_dimer_dg),
    ];
    let penalties = checks.iter().filter(|s| **s != QcStatus::Pass).count() as f64;
    floor0(STRUCTURE_WEIGHT - STRUCTURE_PENALTY * penalties)
}

fn three_prime_points(p: &Primer, th: &QcThresholds) -> f64 {
    let b = p.three_prime_base.to_ascii_uppercase();
    if th.three_prime.is_preferred(b) {
        THREE_PRIME_PREFERRED
    } else if th.three_prime.is_avoided(b) {
        THREE_PRIME_AVOIDED
    } else {
        THREE_PRIME_OTHER
    }
}

pub fn three_prime_score(pair: &PrimerPair, th: &QcThresholds) -> f64 {
    floor0(three_prime_points(&pair.forward, th) + three_prime_points(&pair.reverse, th))
}

pub fn product_score(pair: &PrimerPair, th: &QcThresholds) -> f64 {
    PRODUCT_WEIGHT * closeness(pair.product_size as f64, th.product_size.optimal, PRODUCT_SPAN)
}

/// Full weight when the probe Tm-delta is in the good band, else 0.
pub fn probe_score(pair: &PrimerPair, th: &QcThresholds) -> f64 {
    match pair.probe_tm_delta() {
        Some(delta) if th.probe.tm_delta.classify(delta) == QcStatus::Pass => PROBE_WEIGHT,
        _ => 0.0,
    }
}

/// Compute every component and the clamped total. Pure and deterministic.
pub fn score_breakdown(pair: &PrimerPair, th: &QcThresholds) -> ScoreBreakdown {
    let mut s = ScoreBreakdown {
        tm: tm_score(pair, th),
        gc: gc_score(pair, th),
        structure: structure_score(pair, th),
        three_prime: three_prime_score(pair, th),
        product_size: product_score(pair, th),
        probe: probe_score(pair, th),
        total: 0.0,
    };
    s.total = floor0(PRIMER_SCALE * s.primer_subtotal() + s.probe).min(100.0);
    s
}

/// The composite score alone.
pub fn score(pair: &PrimerPair, th: &QcThresholds) -> f64 { score_breakdown(pair, th).total }

/// Return `pair` with its score filled in.
pub fn score_pair(mut pair: PrimerPair, th: &QcThresholds) -> PrimerPair {
    pair.score = Some(score_breakdown(&pair, th));
    pair
}

pub fn score_pairs(pairs: Vec<PrimerPair>, th: &QcThresholds) -> Vec<PrimerPair> {
    pairs.into_iter().map(|p| score_pair(p, th)).collect()
}
