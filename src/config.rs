//! Threshold configuration for one scoring run.
//!
//! A [`QcThresholds`] value is passed explicitly into every classification,
//! scoring and batch call; there is no process-wide default that could drift
//! between runs. [`QcThresholds::default`] documents the shipped numbers.
//!
//! Thresholds can be loaded from TOML. Omitted top-level tables (and omitted
//! keys inside `[probe]` and `[three_prime]`) fall back to the defaults; a
//! metric table that is present must be complete.
//!
//! ```toml
//! [tm]
//! optimal = 61.0
//! good = { lo = 59.0, hi = 63.0 }
//! warn = { lo = 56.0, hi = 66.0 }
//!
//! [hairpin_dg]
//! good_min = -1.5
//! warn_min = -3.0
//!
//! [probe]
//! max_homopolymer = 5
//! ```
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::qc::{Band, MetricThresholds};

/// A metric with an optimum and good/warn bands around it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TargetedMetric {
    pub optimal: f64,
    pub good: Band,
    pub warn: Band,
}

impl TargetedMetric {
    pub const fn new(optimal: f64, good: Band, warn: Band) -> Self { TargetedMetric { optimal, good, warn } }

    pub fn bands(&self) -> MetricThresholds { MetricThresholds::new(self.good, self.warn) }
}

/// A higher-is-better metric (free energy, kcal/mol): values at or above
/// `good_min` pass, values at or above `warn_min` warn.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FloorMetric {
    pub good_min: f64,
    pub warn_min: f64,
}

impl FloorMetric {
    pub const fn new(good_min: f64, warn_min: f64) -> Self { FloorMetric { good_min, warn_min } }

    pub fn bands(&self) -> MetricThresholds {
        MetricThresholds::new(Band::at_least(self.good_min), Band::at_least(self.warn_min))
    }
}

/// Inclusive integer length range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthRange {
    pub min: usize,
    pub max: usize,
}

impl LengthRange {
    pub fn contains(&self, len: usize) -> bool { self.min <= len && len <= self.max }
}

/// Preferred and avoided 3' terminal bases, as strings of `ACGT` letters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreePrimeRules {
    pub preferred: String,
    pub avoided: String,
}

impl Default for ThreePrimeRules {
    fn default() -> Self { ThreePrimeRules { preferred: "GC".to_string(), avoided: "T".to_string() } }
}

impl ThreePrimeRules {
    pub fn is_preferred(&self, base: char) -> bool { contains_base(&self.preferred, base) }
    pub fn is_avoided(&self, base: char) -> bool { contains_base(&self.avoided, base) }
}

fn contains_base(set: &str, base: char) -> bool {
    set.chars().any(|c| c.eq_ignore_ascii_case(&base))
}

/// TaqMan probe placement and acceptance rules.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeThresholds {
    /// Probe Tm minus the primer-pair average Tm (°C). The good band is the
    /// design target; its midpoint is what the designer aims for.
    pub tm_delta: MetricThresholds,
    pub gc: TargetedMetric,
    pub length: LengthRange,
    /// Distance from the forward primer's 3' end to the probe start (bp).
    pub offset: MetricThresholds,
    /// Runs of this many identical bases (or more) are forbidden.
    pub max_homopolymer: usize,
    /// Reject probes with a 5' G (quenches FAM-type reporters).
    pub forbid_five_prime_g: bool,
    /// Bases kept clear next to each primer boundary.
    pub primer_buffer: usize,
}

impl Default for ProbeThresholds {
    fn default() -> Self {
        ProbeThresholds {
            tm_delta: MetricThresholds::new(Band::new(8.0, 10.0), Band::new(6.0, 12.0)),
            gc: TargetedMetric::new(50.0, Band::new(40.0, 60.0), Band::new(30.0, 70.0)),
            length: LengthRange { min: 20, max: 30 },
            offset: MetricThresholds::new(Band::new(0.0, 5.0), Band::new(0.0, 15.0)),
            max_homopolymer: 4,
            forbid_five_prime_g: true,
            primer_buffer: 0,
        }
    }
}

/// The complete, immutable threshold set for one scoring run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QcThresholds {
    /// Primer melting temperature (°C).
    pub tm: TargetedMetric,
    /// |Tm(forward) − Tm(reverse)| (°C). `warn.hi` also scales the Tm mismatch penalty.
    pub tm_difference: MetricThresholds,
    /// Primer GC content (%).
    pub gc: TargetedMetric,
    /// Primer length (bp).
    pub length: TargetedMetric,
    /// Amplicon length (bp).
    pub product_size: TargetedMetric,
    pub hairpin_dg: FloorMetric,
    /// ΔG below this floor zeroes the whole structure sub-score.
    pub hairpin_hard_fail: f64,
    pub self_dimer_dg: FloorMetric,
    pub cross_dimer_dg: FloorMetric,
    /// G/C count among the last five 3' bases.
    pub gc_clamp: MetricThresholds,
    pub three_prime: ThreePrimeRules,
    pub probe: ProbeThresholds,
}

impl Default for QcThresholds {
    fn default() -> Self {
        QcThresholds {
            tm: TargetedMetric::new(60.0, Band::new(58.0, 62.0), Band::new(55.0, 65.0)),
            tm_difference: MetricThresholds::new(Band::new(0.0, 2.0), Band::new(0.0, 4.0)),
            gc: TargetedMetric::new(50.0, Band::new(40.0, 60.0), Band::new(30.0, 70.0)),
            length: TargetedMetric::new(20.0, Band::new(18.0, 25.0), Band::new(15.0, 30.0)),
            product_size: TargetedMetric::new(100.0, Band::new(70.0, 200.0), Band::new(50.0, 300.0)),
            hairpin_dg: FloorMetric::new(-2.0, -4.0),
            hairpin_hard_fail: -4.0,
            self_dimer_dg: FloorMetric::new(-9.0, -12.0),
            cross_dimer_dg: FloorMetric::new(-9.0, -12.0),
            gc_clamp: MetricThresholds::new(Band::new(1.0, 2.0), Band::new(1.0, 3.0)),
            three_prime: ThreePrimeRules::default(),
            probe: ProbeThresholds::default(),
        }
    }
}

impl QcThresholds {
    /// Every banded metric as `(name, good, warn)`.
    pub fn metric_bands(&self) -> Vec<(&'static str, Band, Band)> {
        let m = |name, t: MetricThresholds| (name, t.good, t.warn);
        vec![
            m("tm", self.tm.bands()),
            m("tm_difference", self.tm_difference),
            m("gc", self.gc.bands()),
            m("length", self.length.bands()),
            m("product_size", self.product_size.bands()),
            m("hairpin_dg", self.hairpin_dg.bands()),
            m("self_dimer_dg", self.self_dimer_dg.bands()),
            m("cross_dimer_dg", self.cross_dimer_dg.bands()),
            m("gc_clamp", self.gc_clamp),
            m("probe.tm_delta", self.probe.tm_delta),
            m("probe.gc", self.probe.gc.bands()),
            m("probe.offset", self.probe.offset),
        ]
    }

    fn targeted(&self) -> [(&'static str, &TargetedMetric); 5] {
        [
            ("tm", &self.tm),
            ("gc", &self.gc),
            ("length", &self.length),
            ("product_size", &self.product_size),
            ("probe.gc", &self.probe.gc),
        ]
    }

    /// Check every documented invariant of the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (metric, good, warn) in self.metric_bands() {
            for (band, b) in [("good", good), ("warn", warn)] {
                for value in [b.lo, b.hi] {
                    // +inf is the open upper end of a floor metric
                    if value.is_nan() || value == f64::NEG_INFINITY || (value == f64::INFINITY && b.lo == value) {
                        return Err(ConfigError::NonFinite { metric, value });
                    }
                }
                if b.lo > b.hi {
                    return Err(ConfigError::InvertedBand { metric, band, lo: b.lo, hi: b.hi });
                }
            }
            if !warn.encloses(&good) {
                return Err(ConfigError::WarnDoesNotEnclose {
                    metric,
                    good_lo: good.lo,
                    good_hi: good.hi,
                    warn_lo: warn.lo,
                    warn_hi: warn.hi,
                });
            }
        }
        for (metric, t) in self.targeted() {
            if !t.optimal.is_finite() {
                return Err(ConfigError::NonFinite { metric, value: t.optimal });
            }
            if !t.good.contains(t.optimal) {
                return Err(ConfigError::OptimumOutsideGood { metric, optimal: t.optimal, lo: t.good.lo, hi: t.good.hi });
            }
        }
        if !self.hairpin_hard_fail.is_finite() {
            return Err(ConfigError::NonFinite { metric: "hairpin_hard_fail", value: self.hairpin_hard_fail });
        }
        let ceiling = self.tm_difference.warn.hi;
        if !(ceiling > 0.0 && ceiling.is_finite()) {
            return Err(ConfigError::NonPositiveTmDiffCeiling(ceiling));
        }
        let len = self.probe.length;
        if len.min == 0 || len.min > len.max {
            return Err(ConfigError::EmptyLengthRange { min: len.min, max: len.max });
        }
        if self.probe.max_homopolymer < 2 {
            return Err(ConfigError::HomopolymerLimitTooSmall(self.probe.max_homopolymer));
        }
        self.validate_three_prime()
    }

    fn validate_three_prime(&self) -> Result<(), ConfigError> {
        let rules = &self.three_prime;
        for c in rules.preferred.chars().chain(rules.avoided.chars()) {
            if !matches!(c.to_ascii_uppercase(), 'A' | 'C' | 'G' | 'T') {
                return Err(ConfigError::ThreePrimeRules(format!("{c:?} is not one of A, C, G, T")));
            }
        }
        if let Some(c) = rules.preferred.chars().find(|&c| rules.is_avoided(c)) {
            return Err(ConfigError::ThreePrimeRules(format!("{c:?} is both preferred and avoided")));
        }
        Ok(())
    }

    /// Parse thresholds from TOML and validate them.
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        let th: QcThresholds = toml::from_str(s).context("parsing QC thresholds")?;
        th.validate()?;
        Ok(th)
    }

    /// Read, parse and validate a TOML thresholds file.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let p = path.as_ref();
        let text = std::fs::read_to_string(p).with_context(|| format!("reading {}", p.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("invalid thresholds in {}", p.display()))
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shipped_defaults_are_valid() {
        QcThresholds::default().validate().unwrap();
    }

    #[test]
    fn every_default_warn_band_encloses_its_good_band() {
        let th = QcThresholds::default();
        let bands = th.metric_bands();
        assert_eq!(bands.len(), 12);
        for (name, good, warn) in bands {
            assert!(warn.encloses(&good), "{name}: warn {warn:?} must enclose good {good:?}");
        }
    }

    #[test]
    fn inverted_interval_is_rejected() {
        let mut th = QcThresholds::default();
        th.gc.good = Band::new(60.0, 40.0);
        assert!(matches!(th.validate(), Err(ConfigError::InvertedBand { metric: "gc", band: "good", .. })));
    }

    #[test]
    fn warn_narrower_than_good_is_rejected() {
        let mut th = QcThresholds::default();
        th.tm.warn = Band::new(59.0, 61.0);
        assert!(matches!(th.validate(), Err(ConfigError::WarnDoesNotEnclose { metric: "tm", .. })));
    }

    #[test]
    fn floor_metric_with_looser_good_than_warn_is_rejected() {
        let mut th = QcThresholds::default();
        th.hairpin_dg = FloorMetric::new(-5.0, -4.0);
        assert!(matches!(th.validate(), Err(ConfigError::WarnDoesNotEnclose { metric: "hairpin_dg", .. })));
    }

    #[test]
    fn nan_threshold_is_rejected() {
        let mut th = QcThresholds::default();
        th.self_dimer_dg.good_min = f64::NAN;
        assert!(matches!(th.validate(), Err(ConfigError::NonFinite { metric: "self_dimer_dg", .. })));
    }

    #[test]
    fn optimum_must_sit_in_good_band() {
        let mut th = QcThresholds::default();
        th.product_size.optimal = 400.0;
        assert!(matches!(th.validate(), Err(ConfigError::OptimumOutsideGood { metric: "product_size", .. })));
    }

    #[test]
    fn probe_rules_are_checked() {
        let mut th = QcThresholds::default();
        th.probe.length = LengthRange { min: 30, max: 20 };
        assert_eq!(th.validate(), Err(ConfigError::EmptyLengthRange { min: 30, max: 20 }));

        let mut th = QcThresholds::default();
        th.probe.max_homopolymer = 1;
        assert_eq!(th.validate(), Err(ConfigError::HomopolymerLimitTooSmall(1)));
    }

    #[test]
    fn three_prime_sets_must_be_disjoint_nucleotides() {
        let mut th = QcThresholds::default();
        th.three_prime.avoided = "TG".into();
        assert!(matches!(th.validate(), Err(ConfigError::ThreePrimeRules(_))));

        let mut th = QcThresholds::default();
        th.three_prime.preferred = "GX".into();
        assert!(matches!(th.validate(), Err(ConfigError::ThreePrimeRules(_))));
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let th = QcThresholds::from_toml_str(
            r#"
            hairpin_hard_fail = -5.0

            [tm]
            optimal = 61.0
            good = { lo = 59.0, hi = 63.0 }
            warn = { lo = 56.0, hi = 66.0 }

            [probe]
            max_homopolymer = 5
            "#,
        )
        .unwrap();
        assert_eq!(th.tm.optimal, 61.0);
        assert_eq!(th.hairpin_hard_fail, -5.0);
        assert_eq!(th.probe.max_homopolymer, 5);
        assert_eq!(th.probe.length, LengthRange { min: 20, max: 30 });
        assert_eq!(th.gc, QcThresholds::default().gc);
    }

    #[test]
    fn invalid_toml_values_are_reported_before_use() {
        let err = QcThresholds::from_toml_str(
            r#"
            [gc]
            optimal = 50.0
            good = { lo = 40.0, hi = 60.0 }
            warn = { lo = 45.0, hi = 55.0 }
            "#,
        )
        .unwrap_err();
        assert!(err.downcast_ref::<ConfigError>().is_some());
    }

    #[test]
    fn toml_round_trip_of_defaults() {
        let text = QcThresholds::default().to_toml_string().unwrap();
        assert_eq!(QcThresholds::from_toml_str(&text).unwrap(), QcThresholds::default());
    }

    #[test]
    fn load_reads_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qc.toml");
        std::fs::write(&path, "[probe]\nprimer_buffer = 2\n").unwrap();
        let th = QcThresholds::load(&path).unwrap();
        assert_eq!(th.probe.primer_buffer, 2);
    }
}
