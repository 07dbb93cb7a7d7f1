//! Offline [`OligoEngine`] backed by candidate pairs read from JSON.
//!
//! The input is an array of targets, each with the pairs an upstream design
//! run produced for it:
//!
//! ```json
//! [
//!   {
//!     "id": "GAPDH",
//!     "sequence": "ACGT...",
//!     "pairs": [
//!       {
//!         "forward": {"sequence": "...", "start": 0, "tm": 60.1, "gc_percent": 50.0,
//!                     "hairpin_dg": -1.0, "self_dimer_dg": -5.0},
//!         "reverse": {"sequence": "...", "start": 80, "tm": 59.8, "gc_percent": 45.0},
//!         "cross_dimer_dg": -4.0
//!       }
//!     ]
//!   }
//! ]
//! ```
//!
//! A target whose `pairs` field is `null` is reported as an engine failure;
//! an empty list is a normal "no candidates" outcome. Target ids must be
//! unique within a file. Probe Tm/GC come from a wrapped [`OligoThermo`],
//! [`BasicThermo`] by default.
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::CandidateError;
use crate::model::{PrimerPair, Target};
use crate::thermo::{BasicThermo, OligoEngine, OligoMetrics, OligoThermo};

/// One target and its precomputed candidate pairs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TargetCandidates {
    pub id: String,
    pub sequence: String,
    /// `None` marks a target the upstream engine could not process.
    #[serde(default)]
    pub pairs: Option<Vec<PrimerPair>>,
}

impl TargetCandidates {
    pub fn target(&self) -> Target { Target::new(self.id.clone(), self.sequence.clone()) }
}

/// Parse a candidate file body.
pub fn parse_candidates(json: &str) -> Result<Vec<TargetCandidates>> {
    serde_json::from_str(json).context("invalid candidate JSON")
}

/// Read a candidate file from disk.
pub fn load_candidates<P: AsRef<Path>>(path: P) -> Result<Vec<TargetCandidates>> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    serde_json::from_reader(BufReader::new(f)).with_context(|| format!("parsing {}", path.display()))
}

/// Serves candidates looked up by target id.
#[derive(Clone, Debug, Default)]
pub struct PrecomputedEngine<T = BasicThermo> {
    pairs: HashMap<String, Option<Vec<PrimerPair>>>,
    thermo: T,
}

impl PrecomputedEngine<BasicThermo> {
    /// Build the engine and the target list, keeping input order.
    pub fn from_candidates(records: Vec<TargetCandidates>) -> Result<(Self, Vec<Target>), CandidateError> {
        Self::with_thermo(records, BasicThermo)
    }
}

impl<T: OligoThermo> PrecomputedEngine<T> {
    /// Fails on a repeated target id rather than letting one record shadow another.
    pub fn with_thermo(records: Vec<TargetCandidates>, thermo: T) -> Result<(Self, Vec<Target>), CandidateError> {
        let mut pairs = HashMap::with_capacity(records.len());
        let mut first_seen: HashMap<String, usize> = HashMap::with_capacity(records.len());
        let mut targets = Vec::with_capacity(records.len());
        for (i, r) in records.into_iter().enumerate() {
            if let Some(&first) = first_seen.get(&r.id) {
                return Err(CandidateError::DuplicateTargetId { id: r.id, first, second: i });
            }
            first_seen.insert(r.id.clone(), i);
            targets.push(r.target());
            pairs.insert(r.id, r.pairs);
        }
        Ok((PrecomputedEngine { pairs, thermo }, targets))
    }

    pub fn len(&self) -> usize { self.pairs.len() }

    pub fn is_empty(&self) -> bool { self.pairs.is_empty() }
}

impl<T: OligoThermo> OligoThermo for PrecomputedEngine<T> {
    fn oligo_metrics(&self, sequence: &str) -> Result<OligoMetrics> { self.thermo.oligo_metrics(sequence) }
}

impl<T: OligoThermo> OligoEngine for PrecomputedEngine<T> {
    fn candidate_pairs(&self, target: &Target) -> Result<Vec<PrimerPair>> {
        match self.pairs.get(&target.id) {
            Some(Some(pairs)) => Ok(pairs.clone()),
            Some(None) => Err(anyhow!("no design output for target {}", target.id)),
            None => Err(anyhow!("unknown target {}", target.id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const JSON: &str = r#"[
        {"id": "a", "sequence": "ACGTACGTACGTACGTACGTCCCATCATCATCATCATCATCAGGTTGCATTGCATTGCATTGCA",
         "pairs": [{
            "forward": {"sequence": "ACGTACGTACGTACGTACGT", "start": 0, "tm": 60.0, "gc_percent": 50.0},
            "reverse": {"sequence": "TGCAATGCAATGCAATGCAA", "start": 45, "tm": 60.5, "gc_percent": 40.0}
         }]},
        {"id": "b", "sequence": "ACGT", "pairs": []},
        {"id": "c", "sequence": "ACGT", "pairs": null}
    ]"#;

    #[test]
    fn parses_and_serves_by_id() {
        let (engine, targets) = PrecomputedEngine::from_candidates(parse_candidates(JSON).unwrap()).unwrap();
        assert_eq!(engine.len(), 3);
        let ids: Vec<&str> = targets.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);

        let a = engine.candidate_pairs(&targets[0]).unwrap();
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].product_size, 65);
        assert!(engine.candidate_pairs(&targets[1]).unwrap().is_empty());
        assert!(engine.candidate_pairs(&targets[2]).is_err());
        assert!(engine.candidate_pairs(&Target::new("zzz", "ACGT")).is_err());
    }

    #[test]
    fn missing_pairs_field_is_a_failure() {
        let recs = parse_candidates(r#"[{"id": "x", "sequence": "ACGT"}]"#).unwrap();
        let (engine, targets) = PrecomputedEngine::from_candidates(recs).unwrap();
        assert!(engine.candidate_pairs(&targets[0]).is_err());
    }

    #[test]
    fn repeated_target_id_is_rejected() {
        let recs = parse_candidates(
            r#"[
                {"id": "a", "sequence": "ACGT", "pairs": []},
                {"id": "b", "sequence": "ACGT", "pairs": []},
                {"id": "a", "sequence": "ACGT", "pairs": null}
            ]"#,
        )
        .unwrap();
        let err = PrecomputedEngine::from_candidates(recs).unwrap_err();
        assert_eq!(err, CandidateError::DuplicateTargetId { id: "a".into(), first: 0, second: 2 });
    }

    #[test]
    fn rejects_invalid_records() {
        let bad = JSON.replace("\"start\": 45", "\"start\": 3");
        assert!(parse_candidates(&bad).is_err());
        assert!(parse_candidates("{").is_err());
    }

    #[test]
    fn loads_from_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(JSON.as_bytes()).unwrap();
        let recs = load_candidates(f.path()).unwrap();
        assert_eq!(recs.len(), 3);
        assert!(load_candidates("/nonexistent/candidates.json").is_err());
    }
}
