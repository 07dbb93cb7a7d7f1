//! TaqMan probe placement between a primer pair.
//!
//! Every window of the allowed length range inside `[forward.end + buffer,
//! reverse.start - buffer)` is a candidate. Windows are discarded when they
//! contain an ambiguous base, start with G (if forbidden), contain a forbidden
//! homopolymer run, or have a GC content that classifies as FAIL. Tm and GC of
//! the survivors come from the [`OligoThermo`] engine.
//!
//! Survivors are ranked by, in order:
//! 1. distance of `Tm(probe) - avg Tm(primers)` from the midpoint of the
//!    configured Tm-delta good band
//! 2. distance of GC% from the probe GC optimum
//! 3. start offset (closer to the forward primer wins)
//! 4. length (shorter wins)
//!
//! Finding no probe is a normal outcome ([`ProbeOutcome::NoneFound`]), not an error.
use serde::{Deserialize, Serialize};

use crate::config::QcThresholds;
use crate::model::{Primer, PrimerPair, Probe};
use crate::qc::QcStatus;
use crate::thermo::{has_homopolymer_run, OligoThermo};

/// Why no probe was placed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum NoProbeReason {
    /// The primers touch or overlap.
    NoGap,
    /// The usable region is shorter than the minimum probe length.
    GapTooShort { gap: usize, min_length: usize },
    /// Windows were enumerated but none passed the placement rules.
    NoSurvivors { examined: usize },
}

#[derive(Clone, Debug, PartialEq)]
pub enum ProbeOutcome {
    Found(Probe),
    NoneFound(NoProbeReason),
}

impl ProbeOutcome {
    pub fn probe(self) -> Option<Probe> {
        match self {
            ProbeOutcome::Found(p) => Some(p),
            ProbeOutcome::NoneFound(_) => None,
        }
    }

    pub fn is_found(&self) -> bool { matches!(self, ProbeOutcome::Found(_)) }
}

#[derive(Clone, Copy, Debug)]
struct Candidate {
    start: usize,
    len: usize,
    tm: f64,
    gc: f64,
    tm_dist: f64,
    gc_dist: f64,
}

impl Candidate {
    fn beats(&self, other: &Candidate) -> bool {
        self.tm_dist
            .total_cmp(&other.tm_dist)
            .then(self.gc_dist.total_cmp(&other.gc_dist))
            .then(self.start.cmp(&other.start))
            .then(self.len.cmp(&other.len))
            .is_lt()
    }
}

/// Find the best probe between `forward` and `reverse` on `target`.
///
/// Engine errors propagate; an empty search is [`ProbeOutcome::NoneFound`].
pub fn design_probe<T>(
    target: &str,
    forward: &Primer,
    reverse: &Primer,
    th: &QcThresholds,
    thermo: &T,
) -> anyhow::Result<ProbeOutcome>
where
    T: OligoThermo + ?Sized,
{
    if forward.end >= reverse.start {
        return Ok(ProbeOutcome::NoneFound(NoProbeReason::NoGap));
    }
    let rules = &th.probe;
    let region_start = forward.end.saturating_add(rules.primer_buffer);
    let region_end = reverse.start.saturating_sub(rules.primer_buffer).min(target.len());
    let gap = region_end.saturating_sub(region_start);
    if gap < rules.length.min {
        return Ok(ProbeOutcome::NoneFound(NoProbeReason::GapTooShort { gap, min_length: rules.length.min }));
    }

    let seq = target.to_ascii_uppercase();
    let bytes = seq.as_bytes();
    let avg_tm = (forward.tm + reverse.tm) / 2.0;
    let target_delta = rules.tm_delta.good.midpoint();
    let gc_bands = rules.gc.bands();

    let mut examined = 0usize;
    let mut best: Option<Candidate> = None;

    'start: for start in region_start..region_end {
        if rules.forbid_five_prime_g && bytes[start] == b'G' {
            continue;
        }
        for len in rules.length.min..=rules.length.max {
            let end = start + len;
            if end > region_end {
                break;
            }
            examined += 1;
            let window = &bytes[start..end];
            // longer windows from this start contain the same offending base or run
            if window.iter().any(|b| !matches!(b, b'A' | b'C' | b'G' | b'T')) {
                continue 'start;
            }
            let window = match std::str::from_utf8(window) {
                Ok(w) => w,
                Err(_) => continue 'start,
            };
            if has_homopolymer_run(window, rules.max_homopolymer) {
                continue 'start;
            }
            let m = thermo.oligo_metrics(window)?;
            if gc_bands.classify(m.gc_percent) == QcStatus::Fail {
                continue;
            }
            let cand = Candidate {
                start,
                len,
                tm: m.tm,
                gc: m.gc_percent,
                tm_dist: (m.tm - avg_tm - target_delta).abs(),
                gc_dist: (m.gc_percent - rules.gc.optimal).abs(),
            };
            if best.as_ref().map_or(true, |b| cand.beats(b)) {
                best = Some(cand);
            }
        }
    }

    match best {
        Some(c) => {
            let probe = Probe::new(&seq[c.start..c.start + c.len], c.start, c.tm, c.gc)?;
            tracing::debug!(start = probe.start, len = probe.length, tm = probe.tm, "probe placed");
            Ok(ProbeOutcome::Found(probe))
        }
        None => {
            tracing::debug!(examined, "no probe candidate survived");
            Ok(ProbeOutcome::NoneFound(NoProbeReason::NoSurvivors { examined }))
        }
    }
}

/// Fill `pair.probe` when it is unset; a pair that already has a probe is
/// returned unchanged.
pub fn ensure_probe<T>(pair: PrimerPair, target: &str, th: &QcThresholds, thermo: &T) -> anyhow::Result<PrimerPair>
where
    T: OligoThermo + ?Sized,
{
    if pair.probe.is_some() {
        return Ok(pair);
    }
    match design_probe(target, &pair.forward, &pair.reverse, th, thermo)? {
        ProbeOutcome::Found(probe) => Ok(pair.with_probe(probe)?),
        ProbeOutcome::NoneFound(_) => Ok(pair),
    }
}
