//! Ranking of candidates against one anchor

use std::sync::Arc;

use rayon::prelude::*;
use tracing::debug;

use super::scoring::CompositeScorer;
use super::tables::PairingTables;
use crate::domain::menu::{AnchorItem, CandidateItem};
use crate::domain::pairing::{CompositeScore, RankedPairing};

/// Scores every candidate against an anchor and keeps the best `top_k`.
///
/// Scoring is pure, so candidates are evaluated in parallel; the final sort is
/// stable, so exact ties keep their input order.
#[derive(Debug, Clone)]
pub struct PairingEngine {
    scorer: CompositeScorer,
}

impl PairingEngine {
    /// Engine over the built-in tables and default weights
    pub fn new() -> Self {
        Self::with_tables(Arc::new(PairingTables::default()))
    }

    pub fn with_tables(tables: Arc<PairingTables>) -> Self {
        Self { scorer: CompositeScorer::new(tables) }
    }

    pub fn score(&self, anchor: &AnchorItem, candidate: &CandidateItem) -> CompositeScore {
        self.scorer.score_pair(anchor, candidate)
    }

    pub fn rank_pairings(
        &self,
        anchor: &AnchorItem,
        candidates: &[CandidateItem],
        top_k: usize,
    ) -> Vec<RankedPairing> {
        if candidates.is_empty() || top_k == 0 {
            debug!(
                event_name = "pairing.rank.empty",
                anchor_id = %anchor.id,
                candidate_count = candidates.len(),
                top_k,
                "no candidates to rank"
            );
            return Vec::new();
        }

        let mut ranked: Vec<RankedPairing> = candidates
            .par_iter()
            .map(|candidate| RankedPairing {
                candidate: candidate.clone(),
                score: self.scorer.score_pair(anchor, candidate),
            })
            .collect();

        ranked.sort_by(|a, b| b.score.overall.total_cmp(&a.score.overall));
        ranked.truncate(top_k);

        debug!(
            event_name = "pairing.rank.completed",
            anchor_id = %anchor.id,
            candidate_count = candidates.len(),
            returned = ranked.len(),
            best_overall = ranked.first().map(|pairing| pairing.score.overall).unwrap_or_default(),
            "ranked pairing candidates"
        );

        ranked
    }
}

impl Default for PairingEngine {
    fn default() -> Self {
        Self::new()
    }
}
