//! Narrative Enhancement
//!
//! Decorates ranked pairings with marketing copy from a language model. The
//! numeric score is never touched: every failure path (transport, unparseable
//! output, guardrail rejection) degrades to a deterministic template built from
//! the score breakdown and the two item names.

use std::sync::Arc;

use anyhow::{Context, Result};
use bunamo_core::domain::menu::{AnchorItem, CandidateItem};
use bunamo_core::domain::pairing::{CompositeScore, RankedPairing, ScoreBand, ScoreBreakdown};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::guardrails::{GuardrailDecision, NarrativeGuardrails};
use crate::llm::LlmClient;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Narrative {
    pub marketing_tagline: String,
    pub explanation: String,
    pub flavor_tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allergen_info: Option<String>,
}

/// Why a pairing carries the template narrative instead of generated copy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrativeFailure {
    /// Narrative generation was switched off for this run.
    Disabled,
    Transport,
    Unparseable,
    GuardrailRejected,
}

impl NarrativeFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Transport => "transport",
            Self::Unparseable => "unparseable",
            Self::GuardrailRejected => "guardrail_rejected",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NarrativeSource {
    Generated,
    Fallback { reason: NarrativeFailure },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnhancedPairing {
    pub candidate: CandidateItem,
    pub score: CompositeScore,
    pub narrative: Narrative,
    pub source: NarrativeSource,
}

impl EnhancedPairing {
    fn fallback(anchor: &AnchorItem, pairing: &RankedPairing, reason: NarrativeFailure) -> Self {
        Self {
            narrative: fallback_narrative(
                &anchor.name,
                &pairing.candidate.name,
                &pairing.score.breakdown,
            ),
            candidate: pairing.candidate.clone(),
            score: pairing.score.clone(),
            source: NarrativeSource::Fallback { reason },
        }
    }
}

pub fn build_prompt(
    anchor: &AnchorItem,
    candidate: &CandidateItem,
    score: &CompositeScore,
) -> String {
    let breakdown = &score.breakdown;
    format!(
        "You write short café menu copy for coffee and pastry pairings.\n\
         Coffee: {anchor_name} (flavor notes: {anchor_notes}; origin: {origin}; roast: {roast}).\n\
         Pastry: {candidate_name} (flavors: {candidate_flavors}; textures: {textures}).\n\
         Pairing strengths: flavor {flavor}, origin {origin_band}, acidity balance {acidity}, \
         texture {texture}.\n\
         Reply with a single JSON object and nothing else, using exactly these keys:\n\
         {{\"marketing_tagline\": string, \"explanation\": string, \
         \"flavor_tags\": [2 or 3 short strings], \"allergen_info\": string or null}}.\n\
         Do not mention numeric scores or percentages.",
        anchor_name = display_name(&anchor.name, "this coffee"),
        anchor_notes = anchor.flavor_notes.as_deref().unwrap_or("unspecified"),
        origin = anchor.origin.as_deref().unwrap_or("unspecified"),
        roast = anchor.roast_type.as_deref().unwrap_or("unspecified"),
        candidate_name = display_name(&candidate.name, "this pastry"),
        candidate_flavors = candidate.flavor_tags.as_deref().unwrap_or("unspecified"),
        textures = candidate.texture_tags.as_deref().unwrap_or("unspecified"),
        flavor = ScoreBand::from_score(breakdown.flavor).label(),
        origin_band = ScoreBand::from_score(breakdown.origin).label(),
        acidity = ScoreBand::from_score(breakdown.acidity).label(),
        texture = ScoreBand::from_score(breakdown.roast_texture).label(),
    )
}

/// Extracts the narrative JSON object from a model reply.
///
/// Accepts a bare object, one wrapped in a markdown code fence, or one
/// surrounded by prose. The first complete object that has the narrative
/// shape wins; anything after it is ignored.
pub fn parse_narrative(raw: &str) -> Result<Narrative> {
    let mut last_error = None;

    for (start, _) in raw.match_indices('{') {
        let mut stream = serde_json::Deserializer::from_str(&raw[start..]).into_iter::<Narrative>();
        match stream.next() {
            Some(Ok(narrative)) => return Ok(tidy(narrative)),
            Some(Err(error)) => last_error = Some(error),
            None => {}
        }
    }

    match last_error {
        Some(error) => Err(error).context("response JSON does not match the narrative shape"),
        None => anyhow::bail!("response contains no JSON object"),
    }
}

fn tidy(mut narrative: Narrative) -> Narrative {
    narrative.marketing_tagline = narrative.marketing_tagline.trim().to_string();
    narrative.explanation = narrative.explanation.trim().to_string();
    narrative.flavor_tags =
        narrative.flavor_tags.iter().map(|tag| tag.trim().to_string()).collect();
    narrative.allergen_info = narrative
        .allergen_info
        .map(|info| info.trim().to_string())
        .filter(|info| !info.is_empty());
    narrative
}

/// Template narrative derived only from the breakdown and the two names.
pub fn fallback_narrative(
    anchor_name: &str,
    candidate_name: &str,
    breakdown: &ScoreBreakdown,
) -> Narrative {
    let anchor = display_name(anchor_name, "this coffee");
    let candidate = display_name(candidate_name, "this pastry");
    let flavor_band = ScoreBand::from_score(breakdown.flavor);
    let texture_band = ScoreBand::from_score(breakdown.roast_texture);

    Narrative {
        marketing_tagline: format!("{anchor} with {candidate}"),
        explanation: format!(
            "{candidate} brings {} flavor compatibility and {} texture harmony to {anchor}.",
            flavor_band.label(),
            texture_band.label(),
        ),
        flavor_tags: vec![
            format!("{} flavor", flavor_band.label()),
            format!("{} texture", texture_band.label()),
        ],
        allergen_info: None,
    }
}

fn display_name<'a>(name: &'a str, placeholder: &'a str) -> &'a str {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        placeholder
    } else {
        trimmed
    }
}

/// Runs one narrative request per ranked pairing, concurrently.
#[derive(Clone)]
pub struct NarrativeEnhancer {
    client: Arc<dyn LlmClient>,
    guardrails: NarrativeGuardrails,
}

impl NarrativeEnhancer {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client, guardrails: NarrativeGuardrails::default() }
    }

    /// Output order matches input order; a failed call only affects its own pairing.
    pub async fn enhance(
        &self,
        anchor: &AnchorItem,
        ranked: &[RankedPairing],
        request_id: &str,
    ) -> Vec<EnhancedPairing> {
        let tasks = ranked.iter().map(|pairing| self.enhance_one(anchor, pairing, request_id));
        join_all(tasks).await
    }

    async fn enhance_one(
        &self,
        anchor: &AnchorItem,
        pairing: &RankedPairing,
        request_id: &str,
    ) -> EnhancedPairing {
        let prompt = build_prompt(anchor, &pairing.candidate, &pairing.score);

        let raw = match self.client.complete(&prompt).await {
            Ok(raw) => raw,
            Err(error) => {
                warn!(
                    event_name = "pairing.narrative.fallback",
                    request_id,
                    candidate_id = %pairing.candidate.id,
                    reason = NarrativeFailure::Transport.as_str(),
                    error = %error,
                    "narrative request failed, using template"
                );
                return EnhancedPairing::fallback(anchor, pairing, NarrativeFailure::Transport);
            }
        };

        let narrative = match parse_narrative(&raw) {
            Ok(narrative) => narrative,
            Err(error) => {
                warn!(
                    event_name = "pairing.narrative.fallback",
                    request_id,
                    candidate_id = %pairing.candidate.id,
                    reason = NarrativeFailure::Unparseable.as_str(),
                    error = %error,
                    "narrative response unparseable, using template"
                );
                return EnhancedPairing::fallback(anchor, pairing, NarrativeFailure::Unparseable);
            }
        };

        let decision = self.guardrails.evaluate(&narrative);
        if let GuardrailDecision::Deny { reason_code, message } = decision {
            warn!(
                event_name = "pairing.narrative.fallback",
                request_id,
                candidate_id = %pairing.candidate.id,
                reason = NarrativeFailure::GuardrailRejected.as_str(),
                guardrail = reason_code,
                detail = %message,
                "narrative rejected by guardrails, using template"
            );
            return EnhancedPairing::fallback(anchor, pairing, NarrativeFailure::GuardrailRejected);
        }

        debug!(
            event_name = "pairing.narrative.generated",
            request_id,
            candidate_id = %pairing.candidate.id,
            "narrative accepted"
        );

        EnhancedPairing {
            candidate: pairing.candidate.clone(),
            score: pairing.score.clone(),
            narrative,
            source: NarrativeSource::Generated,
        }
    }
}

/// Template narratives for every pairing, without calling a model.
pub fn fallback_all(
    anchor: &AnchorItem,
    ranked: &[RankedPairing],
    reason: NarrativeFailure,
) -> Vec<EnhancedPairing> {
    ranked.iter().map(|pairing| EnhancedPairing::fallback(anchor, pairing, reason)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bunamo_core::PairingEngine;

    struct FixedClient(String);

    #[async_trait]
    impl LlmClient for FixedClient {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    /// Fails for prompts naming the poison pastry, answers everything else.
    struct SelectiveClient;

    #[async_trait]
    impl LlmClient for SelectiveClient {
        async fn complete(&self, prompt: &str) -> Result<String> {
            if prompt.contains("Poison Pastry") {
                anyhow::bail!("connection reset");
            }
            Ok(GOOD_REPLY.to_string())
        }
    }

    const GOOD_REPLY: &str = r#"{
        "marketing_tagline": "Sunny fruit meets floral coffee",
        "explanation": "Bright pastry notes lift the coffee's florals.",
        "flavor_tags": ["fruity", "floral"],
        "allergen_info": "Contains wheat."
    }"#;

    fn anchor() -> AnchorItem {
        AnchorItem::new("yirga", "Yirgacheffe Pour-Over", 0.6)
            .with_flavor_notes("floral, fruity, citrus")
            .with_origin("Ethiopia")
            .with_acidity(5.0)
            .with_roast_type("light")
    }

    fn ranked(names: &[&str]) -> Vec<RankedPairing> {
        let candidates: Vec<CandidateItem> = names
            .iter()
            .map(|name| {
                CandidateItem::new(name.to_lowercase().replace(' ', "-"), *name, 0.6)
                    .with_flavor_tags("berry, lemon")
                    .with_texture_tags("flaky")
                    .with_sweetness(4.0)
            })
            .collect();
        PairingEngine::new().rank_pairings(&anchor(), &candidates, names.len())
    }

    #[test]
    fn parse_accepts_bare_fenced_and_prose_wrapped_json() {
        let fenced = format!("```json\n{GOOD_REPLY}\n```");
        let prose = format!("Here you go!\n{GOOD_REPLY}\nEnjoy.");

        for raw in [GOOD_REPLY.to_string(), fenced, prose] {
            let narrative = parse_narrative(&raw).expect("narrative should parse");
            assert_eq!(narrative.flavor_tags, vec!["fruity", "floral"]);
            assert_eq!(narrative.allergen_info.as_deref(), Some("Contains wheat."));
        }
    }

    #[test]
    fn parse_stops_at_the_first_complete_object() {
        let trailing = format!("{GOOD_REPLY}\nEnjoy your pairing :}}");
        let leading = format!("Thinking {{draft}} done.\n{GOOD_REPLY}");

        for raw in [trailing, leading] {
            let narrative = parse_narrative(&raw).expect("narrative should parse");
            assert_eq!(narrative.marketing_tagline, "Sunny fruit meets floral coffee");
        }
    }

    #[test]
    fn parse_rejects_non_json_and_wrong_shape() {
        assert!(parse_narrative("I think these pair well.").is_err());
        assert!(parse_narrative(r#"{"tagline": "missing fields"}"#).is_err());
        assert!(parse_narrative("} backwards {").is_err());
    }

    #[test]
    fn fallback_is_deterministic_and_names_both_items() {
        let breakdown = ScoreBreakdown {
            flavor: 0.85,
            origin: 0.5,
            acidity: 0.7,
            roast_texture: 0.45,
            popularity: 0.5,
            seasonal_multiplier: 1.0,
        };

        let first = fallback_narrative("Brazil Santos", "Almond Croissant", &breakdown);
        let second = fallback_narrative("Brazil Santos", "Almond Croissant", &breakdown);

        assert_eq!(first, second);
        assert_eq!(first.marketing_tagline, "Brazil Santos with Almond Croissant");
        assert!(first.explanation.contains("excellent flavor"));
        assert!(first.explanation.contains("moderate texture"));
        assert_eq!(first.flavor_tags, vec!["excellent flavor", "moderate texture"]);
        assert!(first.allergen_info.is_none());
        assert!(NarrativeGuardrails::default().evaluate(&first).is_allowed());
    }

    #[test]
    fn fallback_uses_placeholders_for_blank_names() {
        let narrative = fallback_narrative("  ", "", &ScoreBreakdown::default());
        assert_eq!(narrative.marketing_tagline, "this coffee with this pastry");
    }

    #[test]
    fn prompt_mentions_items_and_bands_but_no_numbers() {
        let pairing = &ranked(&["Berry Danish"])[0];
        let prompt = build_prompt(&anchor(), &pairing.candidate, &pairing.score);

        assert!(prompt.contains("Yirgacheffe Pour-Over"));
        assert!(prompt.contains("Berry Danish"));
        assert!(prompt.contains("flavor_tags"));
        assert!(!prompt.contains(&format!("{}", pairing.score.overall)));
    }

    #[tokio::test]
    async fn valid_reply_is_generated_and_score_untouched() {
        let enhancer = NarrativeEnhancer::new(Arc::new(FixedClient(GOOD_REPLY.to_string())));
        let ranked = ranked(&["Berry Danish"]);

        let enhanced = enhancer.enhance(&anchor(), &ranked, "req-1").await;

        assert_eq!(enhanced.len(), 1);
        assert_eq!(enhanced[0].source, NarrativeSource::Generated);
        assert_eq!(enhanced[0].score, ranked[0].score);
        assert_eq!(enhanced[0].narrative.marketing_tagline, "Sunny fruit meets floral coffee");
    }

    #[tokio::test]
    async fn unparseable_reply_falls_back_with_breakdown_text() {
        let enhancer =
            NarrativeEnhancer::new(Arc::new(FixedClient("Sorry, I cannot help.".to_string())));
        let ranked = ranked(&["Berry Danish"]);

        let enhanced = enhancer.enhance(&anchor(), &ranked, "req-2").await;

        assert_eq!(
            enhanced[0].source,
            NarrativeSource::Fallback { reason: NarrativeFailure::Unparseable }
        );
        assert_eq!(enhanced[0].score.overall, ranked[0].score.overall);
        assert!(!enhanced[0].narrative.marketing_tagline.is_empty());
        assert!(!enhanced[0].narrative.explanation.is_empty());
        assert_eq!(
            enhanced[0].narrative,
            fallback_narrative("Yirgacheffe Pour-Over", "Berry Danish", &ranked[0].score.breakdown)
        );
    }

    #[tokio::test]
    async fn guardrail_rejection_falls_back() {
        let reply =
            r#"{"marketing_tagline": "Great", "explanation": "Tasty.", "flavor_tags": ["one"]}"#;
        let enhancer = NarrativeEnhancer::new(Arc::new(FixedClient(reply.to_string())));

        let enhanced = enhancer.enhance(&anchor(), &ranked(&["Berry Danish"]), "req-3").await;

        assert_eq!(
            enhanced[0].source,
            NarrativeSource::Fallback { reason: NarrativeFailure::GuardrailRejected }
        );
    }

    #[tokio::test]
    async fn one_failing_candidate_does_not_affect_the_others() {
        let enhancer = NarrativeEnhancer::new(Arc::new(SelectiveClient));
        let ranked = ranked(&["Berry Danish", "Poison Pastry", "Lemon Tart"]);

        let enhanced = enhancer.enhance(&anchor(), &ranked, "req-4").await;

        assert_eq!(enhanced.len(), 3);
        for (pairing, original) in enhanced.iter().zip(&ranked) {
            assert_eq!(pairing.candidate, original.candidate);
            assert_eq!(pairing.score, original.score);
            if pairing.candidate.name == "Poison Pastry" {
                assert_eq!(
                    pairing.source,
                    NarrativeSource::Fallback { reason: NarrativeFailure::Transport }
                );
            } else {
                assert_eq!(pairing.source, NarrativeSource::Generated);
            }
        }
    }

    #[test]
    fn fallback_all_marks_every_pairing() {
        let ranked = ranked(&["Berry Danish", "Lemon Tart"]);
        let enhanced = fallback_all(&anchor(), &ranked, NarrativeFailure::Disabled);

        assert_eq!(enhanced.len(), 2);
        assert!(enhanced
            .iter()
            .all(|pairing| pairing.source
                == NarrativeSource::Fallback { reason: NarrativeFailure::Disabled }));
    }

    #[test]
    fn source_serializes_with_kind_tag() {
        let json = serde_json::to_value(NarrativeSource::Fallback {
            reason: NarrativeFailure::GuardrailRejected,
        })
        .expect("source should serialize");

        assert_eq!(json, serde_json::json!({ "kind": "fallback", "reason": "guardrail_rejected" }));
    }
}
