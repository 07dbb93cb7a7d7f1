//! Batch orchestration: fetch candidates, place probes, classify, score, rank
//! and filter for many targets in parallel.
//!
//! Targets are independent. Each runs on a worker of a dedicated rayon pool
//! and results come back in input order. A failure for one target (engine
//! error while fetching candidates or placing a probe) is recorded as
//! [`TargetStatus::Failed`] on that target's result; the batch carries on.
//! Only invalid thresholds abort the whole run, before any work starts.
use anyhow::Result;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use crate::config::QcThresholds;
use crate::model::{DesignResult, PrimerPair, Target, TargetStatus};
use crate::probe::ensure_probe;
use crate::rank::{filter_by_score, rank};
use crate::score::score_pair;
use crate::thermo::OligoEngine;

/// Options for [`run_batch`].
#[derive(Clone, Debug)]
pub struct BatchOpts {
    /// Worker threads; `None` uses every CPU.
    pub threads: Option<usize>,
    /// Place a probe on pairs that arrive without one.
    pub design_probes: bool,
    /// Drop pairs scoring below this after ranking.
    pub min_score: Option<f64>,
    /// Keep at most this many pairs per target.
    pub max_pairs: Option<usize>,
}

impl Default for BatchOpts {
    fn default() -> Self { BatchOpts { threads: None, design_probes: true, min_score: None, max_pairs: None } }
}

/// Probe placement, QC, score for one candidate.
fn process_pair<E>(pair: PrimerPair, target: &Target, engine: &E, th: &QcThresholds, opts: &BatchOpts) -> Result<PrimerPair>
where
    E: OligoEngine + ?Sized,
{
    let pair = if opts.design_probes { ensure_probe(pair, &target.sequence, th, engine)? } else { pair };
    Ok(score_pair(pair.classified(th), th))
}

/// Run the full pipeline for one target. Never fails; errors end up in the
/// returned status.
pub fn design_target<E>(target: &Target, engine: &E, th: &QcThresholds, opts: &BatchOpts) -> DesignResult
where
    E: OligoEngine + ?Sized,
{
    let span = tracing::info_span!("target", id = %target.id);
    let _enter = span.enter();

    let candidates = match engine.candidate_pairs(target) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(error = %format!("{e:#}"), "candidate generation failed");
            return DesignResult::failed(target, format!("{e:#}"));
        }
    };
    if candidates.is_empty() {
        tracing::info!("no candidates");
        return DesignResult {
            target_id: target.id.clone(),
            target_sequence: target.sequence.clone(),
            status: TargetStatus::NoCandidates,
            pairs: Vec::new(),
        };
    }

    let n_candidates = candidates.len();
    let scored: Result<Vec<PrimerPair>> =
        candidates.into_iter().map(|p| process_pair(p, target, engine, th, opts)).collect();
    let scored = match scored {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %format!("{e:#}"), "probe design failed");
            return DesignResult::failed(target, format!("probe design: {e:#}"));
        }
    };

    let mut pairs = rank(scored);
    if let Some(min) = opts.min_score {
        pairs = filter_by_score(pairs, min);
    }
    if let Some(max) = opts.max_pairs {
        pairs.truncate(max);
    }
    tracing::info!(candidates = n_candidates, kept = pairs.len(), "target designed");

    DesignResult {
        target_id: target.id.clone(),
        target_sequence: target.sequence.clone(),
        status: TargetStatus::Designed,
        pairs,
    }
}

/// Run [`design_target`] for every target on a dedicated pool.
///
/// Returns one result per target, in input order. Errors only when the
/// thresholds fail validation or the pool cannot be built.
pub fn run_batch<E>(targets: &[Target], engine: &E, th: &QcThresholds, opts: &BatchOpts) -> Result<Vec<DesignResult>>
where
    E: OligoEngine + ?Sized,
{
    th.validate()?;
    let threads = opts.threads.unwrap_or_else(num_cpus::get).max(1);
    let pool = ThreadPoolBuilder::new().num_threads(threads).build()?;
    tracing::info!(targets = targets.len(), threads, "starting batch");

    let results: Vec<DesignResult> =
        pool.install(|| targets.par_iter().map(|t| design_target(t, engine, th, opts)).collect());

    let failed = results.iter().filter(|r| r.is_failed()).count();
    if failed > 0 {
        tracing::warn!(failed, total = results.len(), "some targets failed");
    }
    Ok(results)
}
