//! QC classification: maps a raw metric onto a three-level [`QcStatus`].
//!
//! Every metric is judged against two closed intervals, a **good** band and a
//! wider **warn** band. Values in the good band are [`QcStatus::Pass`], values
//! in the warn band (but not the good band) are [`QcStatus::Warn`], and
//! everything else, including NaN, is [`QcStatus::Fail`].
//!
//! The warn band is expected to enclose the good band. [`classify`] does not
//! check this; [`crate::config::QcThresholds::validate`] does, for every
//! configured metric.
//!
//! Free-energy metrics (hairpin, self-dimer, cross-dimer) are *higher is
//! better*: a less negative ΔG means a weaker secondary structure. They go
//! through the same routine with half-open bands built by [`Band::at_least`].
//!
//! # Examples
//! ```
//! use primerqc::qc::{classify, Band, QcStatus};
//! assert_eq!(classify(60.0, 58.0, 62.0, 55.0, 65.0), QcStatus::Pass);
//! assert_eq!(classify(56.0, 58.0, 62.0, 55.0, 65.0), QcStatus::Warn);
//! assert_eq!(classify(70.0, 58.0, 62.0, 55.0, 65.0), QcStatus::Fail);
//!
//! // hairpin ΔG: good >= -2, warn >= -4
//! let good = Band::at_least(-2.0);
//! let warn = Band::at_least(-4.0);
//! assert_eq!(classify(-3.0, good.lo, good.hi, warn.lo, warn.hi), QcStatus::Warn);
//! ```
use core::fmt;

use serde::{Deserialize, Serialize};

use crate::config::QcThresholds;
use crate::model::{Primer, PrimerPair, Probe};
use crate::thermo::{gc_clamp_count, has_homopolymer_run};

/// Three-level QC outcome. Ordered so that `max` yields the worst status.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QcStatus {
    Pass,
    Warn,
    Fail,
}

impl QcStatus {
    /// Stable lowercase label (`pass`, `warn`, `fail`).
    pub fn as_str(self) -> &'static str {
        match self {
            QcStatus::Pass => "pass",
            QcStatus::Warn => "warn",
            QcStatus::Fail => "fail",
        }
    }
}

impl fmt::Display for QcStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// A closed interval `[lo, hi]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub lo: f64,
    pub hi: f64,
}

impl Band {
    pub const fn new(lo: f64, hi: f64) -> Self { Band { lo, hi } }

    /// `[floor, +inf]`, used for higher-is-better metrics.
    pub const fn at_least(floor: f64) -> Self { Band { lo: floor, hi: f64::INFINITY } }

    #[inline]
    pub fn contains(&self, value: f64) -> bool { self.lo <= value && value <= self.hi }

    /// `true` if `other` lies entirely inside `self`.
    pub fn encloses(&self, other: &Band) -> bool { self.lo <= other.lo && other.hi <= self.hi }

    pub fn midpoint(&self) -> f64 { (self.lo + self.hi) / 2.0 }
}

/// Classify `value` against a good band `[good_lo, good_hi]` and a warn band
/// `[warn_lo, warn_hi]`.
///
/// Total over every `f64`: NaN compares false against both bands and lands in
/// [`QcStatus::Fail`].
#[inline]
pub fn classify(value: f64, good_lo: f64, good_hi: f64, warn_lo: f64, warn_hi: f64) -> QcStatus {
    if good_lo <= value && value <= good_hi {
        QcStatus::Pass
    } else if warn_lo <= value && value <= warn_hi {
        QcStatus::Warn
    } else {
        QcStatus::Fail
    }
}

/// Good/warn band pair for one metric.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricThresholds {
    pub good: Band,
    pub warn: Band,
}

impl MetricThresholds {
    pub const fn new(good: Band, warn: Band) -> Self { MetricThresholds { good, warn } }

    pub fn classify(&self, value: f64) -> QcStatus {
        classify(value, self.good.lo, self.good.hi, self.warn.lo, self.warn.hi)
    }
}

/// Classifications for a single primer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimerQc {
    pub tm: QcStatus,
    pub gc: QcStatus,
    pub length: QcStatus,
    pub hairpin: QcStatus,
    pub self_dimer: QcStatus,
    pub three_prime: QcStatus,
    pub gc_clamp: QcStatus,
}

impl PrimerQc {
    pub fn overall(&self) -> QcStatus {
        [self.tm, self.gc, self.length, self.hairpin, self.self_dimer, self.three_prime, self.gc_clamp]
            .into_iter()
            .max()
            .unwrap_or(QcStatus::Pass)
    }
}

/// Classifications for a probe, relative to the primer pair it sits in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeQc {
    pub tm_delta: QcStatus,
    pub gc: QcStatus,
    pub length: QcStatus,
    pub five_prime: QcStatus,
    pub homopolymer: QcStatus,
    pub offset: QcStatus,
    /// FAIL when the probe reaches into the buffer next to either primer.
    pub placement: QcStatus,
}

impl ProbeQc {
    pub fn overall(&self) -> QcStatus {
        [self.tm_delta, self.gc, self.length, self.five_prime, self.homopolymer, self.offset, self.placement]
            .into_iter()
            .max()
            .unwrap_or(QcStatus::Pass)
    }
}

/// Classifications for a primer pair (and its probe, when one is attached).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairQc {
    pub forward: PrimerQc,
    pub reverse: PrimerQc,
    pub tm_difference: QcStatus,
    pub cross_dimer: QcStatus,
    pub product_size: QcStatus,
    pub probe: Option<ProbeQc>,
}

impl PairQc {
    pub fn overall(&self) -> QcStatus {
        let pair = [
            self.forward.overall(),
            self.reverse.overall(),
            self.tm_difference,
            self.cross_dimer,
            self.product_size,
        ];
        let probe = self.probe.map(|p| p.overall()).unwrap_or(QcStatus::Pass);
        pair.into_iter().max().unwrap_or(QcStatus::Pass).max(probe)
    }
}

/// Classify a 3' base: preferred → pass, avoided → warn, anything else → pass.
pub fn classify_three_prime(base: char, th: &QcThresholds) -> QcStatus {
    let rules = &th.three_prime;
    let b = base.to_ascii_uppercase();
    if rules.is_preferred(b) {
        QcStatus::Pass
    } else if rules.is_avoided(b) {
        QcStatus::Warn
    } else {
        QcStatus::Pass
    }
}

pub fn classify_primer(p: &Primer, th: &QcThresholds) -> PrimerQc {
    PrimerQc {
        tm: th.tm.bands().classify(p.tm),
        gc: th.gc.bands().classify(p.gc_percent),
        length: th.length.bands().classify(p.length as f64),
        hairpin: th.hairpin_dg.bands().classify(p.hairpin_dg),
        self_dimer: th.self_dimer_dg.bands().classify(p.self_dimer_dg),
        three_prime: classify_three_prime(p.three_prime_base, th),
        gc_clamp: th.gc_clamp.classify(gc_clamp_count(&p.sequence) as f64),
    }
}

/// Classify a probe against the average Tm of the primers flanking it.
///
/// `region` is the inter-primer gap `[forward.end, reverse.start)`; the probe
/// must also stay `primer_buffer` bases clear of each end.
pub fn classify_probe(probe: &Probe, primer_avg_tm: f64, region: (usize, usize), th: &QcThresholds) -> ProbeQc {
    let pt = &th.probe;
    let five_prime = if pt.forbid_five_prime_g && probe.five_prime_base.eq_ignore_ascii_case(&'G') {
        QcStatus::Fail
    } else {
        QcStatus::Pass
    };
    let homopolymer = if has_homopolymer_run(&probe.sequence, pt.max_homopolymer) {
        QcStatus::Fail
    } else {
        QcStatus::Pass
    };
    let length = if pt.length.contains(probe.length) { QcStatus::Pass } else { QcStatus::Fail };
    let (region_start, region_end) = region;
    let offset = probe.start.saturating_sub(region_start) as f64;
    let clear_start = region_start.saturating_add(pt.primer_buffer);
    let clear_end = region_end.saturating_sub(pt.primer_buffer);
    let placement = if probe.start >= clear_start && probe.end <= clear_end { QcStatus::Pass } else { QcStatus::Fail };
    ProbeQc {
        tm_delta: pt.tm_delta.classify(probe.tm - primer_avg_tm),
        gc: pt.gc.bands().classify(probe.gc_percent),
        length,
        five_prime,
        homopolymer,
        offset: pt.offset.classify(offset),
        placement,
    }
}

/// Classify every metric of a pair, including its probe if present.
pub fn classify_pair(pair: &PrimerPair, th: &QcThresholds) -> PairQc {
    PairQc {
        forward: classify_primer(&pair.forward, th),
        reverse: classify_primer(&pair.reverse, th),
        tm_difference: th.tm_difference.classify(pair.tm_difference),
        cross_dimer: th.cross_dimer_dg.bands().classify(pair.cross_dimer_dg),
        product_size: th.product_size.bands().classify(pair.product_size as f64),
        probe: pair
            .probe
            .as_ref()
            .map(|p| classify_probe(p, pair.primer_avg_tm(), pair.inter_primer_region(), th)),
    }
}
