use std::sync::Arc;

use bunamo_core::config::AppConfig;
use bunamo_core::domain::menu::{AnchorItem, CandidateItem};
use bunamo_core::errors::ApplicationError;
use bunamo_core::pairing::{PairingEngine, PairingTables};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::llm::build_client;
use crate::narrative::{fallback_all, EnhancedPairing, NarrativeEnhancer, NarrativeFailure};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Ranked,
    NoPairingsAvailable,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PairingReport {
    pub request_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub status: ReportStatus,
    pub anchor_id: String,
    pub pairings: Vec<EnhancedPairing>,
}

/// Ranks candidates and decorates the winners with narratives.
#[derive(Clone)]
pub struct PairingRuntime {
    engine: PairingEngine,
    enhancer: Option<NarrativeEnhancer>,
    default_top_k: usize,
}

impl PairingRuntime {
    /// `enhancer: None` means every pairing gets the template narrative.
    pub fn new(
        engine: PairingEngine,
        enhancer: Option<NarrativeEnhancer>,
        default_top_k: usize,
    ) -> Self {
        Self { engine, enhancer, default_top_k }
    }

    /// Table failures surface as domain or configuration errors; a client
    /// that cannot be built surfaces as an integration error.
    pub fn from_config(config: &AppConfig) -> Result<Self, ApplicationError> {
        let tables = PairingTables::load_or_default(config.pairing.tables_path.as_deref())?;
        let engine = PairingEngine::with_tables(Arc::new(tables));

        let enhancer = if config.pairing.narrative_enabled {
            let client = build_client(&config.llm)
                .map_err(|error| ApplicationError::Integration(format!("{error:#}")))?;
            Some(NarrativeEnhancer::new(client))
        } else {
            None
        };

        Ok(Self::new(engine, enhancer, config.pairing.top_k))
    }

    pub fn narrative_enabled(&self) -> bool {
        self.enhancer.is_some()
    }

    pub async fn run(
        &self,
        anchor: &AnchorItem,
        candidates: &[CandidateItem],
        top_k: Option<usize>,
    ) -> PairingReport {
        let request_id = Uuid::new_v4();
        let request_id_text = request_id.to_string();
        let top_k = top_k.unwrap_or(self.default_top_k);

        let ranked = self.engine.rank_pairings(anchor, candidates, top_k);

        let pairings = match &self.enhancer {
            Some(enhancer) => enhancer.enhance(anchor, &ranked, &request_id_text).await,
            None => fallback_all(anchor, &ranked, NarrativeFailure::Disabled),
        };

        let status = if pairings.is_empty() {
            ReportStatus::NoPairingsAvailable
        } else {
            ReportStatus::Ranked
        };

        info!(
            event_name = "pairing.run.completed",
            request_id = %request_id,
            anchor_id = %anchor.id,
            candidate_count = candidates.len(),
            returned = pairings.len(),
            narrative_enabled = self.narrative_enabled(),
            status = ?status,
            "pairing run completed"
        );

        PairingReport {
            request_id,
            generated_at: Utc::now(),
            status,
            anchor_id: anchor.id.clone(),
            pairings,
        }
    }
}
