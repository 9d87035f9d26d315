//! Composite scoring for one anchor/candidate pair

use std::sync::Arc;

use super::factors;
use super::tables::PairingTables;
use super::vocabulary::normalize_tags;
use crate::domain::menu::{AnchorItem, CandidateItem};
use crate::domain::pairing::{CompositeScore, ScoreBreakdown};
use crate::errors::DomainError;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Weights for the five scoring components. Applied before the seasonal multiplier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    /// Weight for flavor compatibility (default: 0.45)
    pub flavor: f64,
    /// Weight for origin affinity (default: 0.20)
    pub origin: f64,
    /// Weight for acidity balance (default: 0.20)
    pub acidity: f64,
    /// Weight for roast/texture harmony (default: 0.10)
    pub roast_texture: f64,
    /// Weight for blended popularity (default: 0.05)
    pub popularity: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        super::DEFAULT_WEIGHTS
    }
}

impl ScoringWeights {
    pub fn validate(&self) -> Result<(), DomainError> {
        let weights =
            [self.flavor, self.origin, self.acidity, self.roast_texture, self.popularity];

        if weights.iter().any(|weight| !weight.is_finite() || *weight < 0.0) {
            return Err(DomainError::InvalidWeights(
                "weights must be finite and non-negative".to_owned(),
            ));
        }

        let sum: f64 = weights.iter().sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(DomainError::InvalidWeights(format!("weights sum to {sum}, expected 1.0")));
        }

        Ok(())
    }
}

/// Canonical token profiles for one pair, rebuilt on every call.
#[derive(Debug, Clone, Default)]
struct PairProfiles {
    anchor_flavors: Vec<String>,
    candidate_flavors: Vec<String>,
    candidate_textures: Vec<String>,
}

impl PairProfiles {
    fn build(anchor: &AnchorItem, candidate: &CandidateItem) -> Self {
        Self {
            anchor_flavors: normalize_tags(anchor.flavor_notes.as_deref()),
            candidate_flavors: normalize_tags(candidate.flavor_tags.as_deref()),
            candidate_textures: normalize_tags(candidate.texture_tags.as_deref()),
        }
    }

    fn token_count(&self) -> usize {
        self.anchor_flavors.len() + self.candidate_flavors.len() + self.candidate_textures.len()
    }
}

/// Computes the bounded compatibility score for a single pair.
#[derive(Debug, Clone)]
pub struct CompositeScorer {
    weights: ScoringWeights,
    tables: Arc<PairingTables>,
}

impl CompositeScorer {
    /// Create a scorer with the default weights
    pub fn new(tables: Arc<PairingTables>) -> Self {
        Self { weights: ScoringWeights::default(), tables }
    }

    /// Create with custom weights
    pub fn with_weights(
        tables: Arc<PairingTables>,
        weights: ScoringWeights,
    ) -> Result<Self, DomainError> {
        weights.validate()?;
        Ok(Self { weights, tables })
    }

    pub fn score_pair(&self, anchor: &AnchorItem, candidate: &CandidateItem) -> CompositeScore {
        let profiles = PairProfiles::build(anchor, candidate);
        let breakdown = self.component_scores(anchor, candidate, &profiles);

        CompositeScore {
            overall: self.calculate_overall(&breakdown),
            breakdown,
            balance: balance_score(&breakdown),
            complexity: complexity_score(profiles.token_count()),
            explanation: generate_explanation(&breakdown, anchor.origin.as_deref()),
        }
    }

    fn component_scores(
        &self,
        anchor: &AnchorItem,
        candidate: &CandidateItem,
        profiles: &PairProfiles,
    ) -> ScoreBreakdown {
        let tables = &self.tables;

        ScoreBreakdown {
            flavor: factors::flavor_compatibility(
                &tables.compatibility,
                &profiles.anchor_flavors,
                &profiles.candidate_flavors,
            ),
            origin: factors::origin_affinity(
                &tables.origin_affinity,
                anchor.origin.as_deref(),
                &profiles.candidate_flavors,
            ),
            acidity: factors::acidity_balance(
                anchor.acidity,
                candidate.sweetness,
                candidate.richness,
            ),
            roast_texture: factors::roast_texture_harmony(
                &tables.roast_texture,
                anchor.roast_type.as_deref(),
                &profiles.candidate_textures,
            ),
            popularity: factors::popularity_blend(
                &tables.popularity,
                anchor.popularity(),
                candidate.popularity(),
            ),
            seasonal_multiplier: factors::seasonal_multiplier(
                &tables.seasonal,
                anchor.season_hint.as_deref(),
            ),
        }
    }

    /// Weighted sum times the seasonal multiplier, clamped into `[0, 1]`.
    pub fn calculate_overall(&self, breakdown: &ScoreBreakdown) -> f64 {
        let weighted = breakdown.flavor * self.weights.flavor
            + breakdown.origin * self.weights.origin
            + breakdown.acidity * self.weights.acidity
            + breakdown.roast_texture * self.weights.roast_texture
            + breakdown.popularity * self.weights.popularity;

        let overall = weighted * breakdown.seasonal_multiplier;
        if overall.is_finite() {
            overall.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Auxiliary score kept for explanations; not part of `overall`.
pub fn balance_score(breakdown: &ScoreBreakdown) -> f64 {
    let average = (breakdown.flavor + breakdown.roast_texture) / 2.0;
    average * (1.0 - (breakdown.flavor - breakdown.roast_texture).abs())
}

/// Auxiliary score from how many tokens describe the pair.
pub fn complexity_score(token_count: usize) -> f64 {
    if token_count <= 2 {
        0.6
    } else if token_count >= 8 {
        0.8
    } else {
        0.7
    }
}

/// Human-readable summary. Informational only; never parse it.
pub fn generate_explanation(breakdown: &ScoreBreakdown, origin: Option<&str>) -> String {
    let mut sentences: Vec<String> = Vec::new();

    if breakdown.flavor > 0.8 {
        sentences.push("Excellent flavor harmony between the coffee notes and the pastry.".to_owned());
    } else if breakdown.flavor > 0.6 {
        sentences.push("Good flavor compatibility.".to_owned());
    }

    if breakdown.origin > 0.7 {
        let origin = origin.map(str::trim).filter(|origin| !origin.is_empty());
        if let Some(origin) = origin {
            sentences.push(format!("The {origin} origin complements these flavors."));
        }
    }

    if breakdown.acidity > 0.8 {
        sentences.push("Acidity and sweetness are well balanced.".to_owned());
    }

    if breakdown.roast_texture > 0.8 {
        sentences.push("The roast suits the pastry's texture.".to_owned());
    }

    if breakdown.seasonal_multiplier > 1.0 {
        sentences.push("Seasonally enhanced pairing.".to_owned());
    }

    if sentences.is_empty() {
        sentences.push("A pleasant pairing with complementary characteristics.".to_owned());
    }

    sentences.join(" ")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::pairing::tables::PairingTables;

    fn scorer() -> CompositeScorer {
        CompositeScorer::new(Arc::new(PairingTables::default()))
    }

    fn scenario_anchor() -> AnchorItem {
        AnchorItem::new("santos", "Santos Dark", 0.8)
            .with_flavor_notes("chocolate, nutty")
            .with_acidity(2.0)
            .with_roast_type("dark")
            .with_origin("brazil")
    }

    fn scenario_candidate() -> CandidateItem {
        CandidateItem::new("financier", "Almond Financier", 0.7)
            .with_flavor_tags("almond, caramel")
            .with_texture_tags("dense, rich")
            .with_sweetness(4.0)
            .with_richness(4.0)
    }

    #[test]
    fn default_weights_sum_to_one() {
        let weights = ScoringWeights::default();
        assert!(weights.validate().is_ok());

        let total = scorer().calculate_overall(&ScoreBreakdown {
            flavor: 1.0,
            origin: 1.0,
            acidity: 1.0,
            roast_texture: 1.0,
            popularity: 1.0,
            seasonal_multiplier: 1.0,
        });
        assert!((total - 1.0).abs() < 0.0001);
    }

    #[test]
    fn custom_weights_must_sum_to_one() {
        let tables = Arc::new(PairingTables::default());
        let skewed = ScoringWeights { flavor: 0.5, ..ScoringWeights::default() };
        let negative = ScoringWeights {
            flavor: 0.75,
            origin: -0.05,
            acidity: 0.2,
            roast_texture: 0.05,
            popularity: 0.05,
        };
        let flavor_only = ScoringWeights {
            flavor: 1.0,
            origin: 0.0,
            acidity: 0.0,
            roast_texture: 0.0,
            popularity: 0.0,
        };

        assert!(CompositeScorer::with_weights(tables.clone(), skewed).is_err());
        assert!(CompositeScorer::with_weights(tables.clone(), negative).is_err());
        assert!(CompositeScorer::with_weights(tables, flavor_only).is_ok());
    }

    #[test]
    fn total_score_calculation() {
        let breakdown = ScoreBreakdown {
            flavor: 0.8,
            origin: 0.5,
            acidity: 0.6,
            roast_texture: 0.3,
            popularity: 1.0,
            seasonal_multiplier: 1.0,
        };

        let total = scorer().calculate_overall(&breakdown);
        // 0.36 + 0.10 + 0.12 + 0.03 + 0.05 = 0.66
        assert!((total - 0.66).abs() < 1e-9);
    }

    #[test]
    fn seasonal_multiplier_applies_after_weights_and_is_clamped() {
        let breakdown = ScoreBreakdown {
            flavor: 1.0,
            origin: 1.0,
            acidity: 1.0,
            roast_texture: 1.0,
            popularity: 1.025,
            seasonal_multiplier: 1.05,
        };

        assert_eq!(scorer().calculate_overall(&breakdown), 1.0);

        let summer = ScoreBreakdown { seasonal_multiplier: 0.95, popularity: 1.0, ..breakdown };
        assert!((scorer().calculate_overall(&summer) - 0.95).abs() < 1e-9);
    }

    #[test]
    fn scenario_strong_alignment_scores_above_point_eight() {
        let score = scorer().score_pair(&scenario_anchor(), &scenario_candidate());

        assert_eq!(score.breakdown.flavor, 1.0);
        assert_eq!(score.breakdown.acidity, 1.0);
        assert_eq!(score.breakdown.roast_texture, 1.0);
        assert!((score.breakdown.origin - 0.4).abs() < 1e-12);
        assert!(score.overall > 0.8, "overall was {}", score.overall);
        assert!(score.explanation.contains("Excellent flavor harmony"));
    }

    #[test]
    fn scenario_acidity_mismatch_pulls_score_down() {
        let strong = scorer().score_pair(&scenario_anchor(), &scenario_candidate());

        let sharp_anchor = scenario_anchor().with_acidity(5.0);
        let plain_candidate = CandidateItem::new("shortbread", "Plain Shortbread", 0.7)
            .with_sweetness(1.0)
            .with_richness(1.0);
        let weak = scorer().score_pair(&sharp_anchor, &plain_candidate);

        assert!((weak.breakdown.acidity - 0.4).abs() < 1e-12);
        assert!(strong.overall - weak.overall >= 0.15, "{} vs {}", strong.overall, weak.overall);
    }

    #[test]
    fn acidity_mismatch_alone_costs_its_weighted_share() {
        let strong = scorer().score_pair(&scenario_anchor(), &scenario_candidate());
        let weak = scorer().score_pair(
            &scenario_anchor().with_acidity(5.0),
            &scenario_candidate().with_sweetness(1.0).with_richness(1.0),
        );

        // (1.0 - 0.4) * 0.20
        assert!((strong.overall - weak.overall - 0.12).abs() < 1e-9);
    }

    #[test]
    fn scenario_popularity_only_blends_neutral_defaults() {
        let score = scorer().score_pair(
            &AnchorItem::new("a", "House", 0.5),
            &CandidateItem::new("c", "Scone", 0.5),
        );

        assert_eq!(score.breakdown.flavor, 0.5);
        assert_eq!(score.breakdown.origin, 0.5);
        assert_eq!(score.breakdown.acidity, 0.9);
        assert_eq!(score.breakdown.roast_texture, 0.5);
        assert_eq!(score.breakdown.seasonal_multiplier, 1.0);
        assert!((0.45..=0.65).contains(&score.overall), "overall was {}", score.overall);
        assert_eq!(score.complexity, 0.6);
    }

    #[test]
    fn overall_stays_bounded_across_extremes() {
        let scorer = scorer();
        let anchors = [
            scenario_anchor().with_season_hint("fall"),
            scenario_anchor().with_season_hint("summer").with_acidity(5.0),
            AnchorItem::new("x", "X", f64::INFINITY).with_acidity(f64::NAN),
            AnchorItem::new("y", "Y", 0.9).with_roast_type("light").with_season_hint("autumn"),
        ];
        let candidates = [
            scenario_candidate().with_texture_tags("dense, rich, creamy, fudgy"),
            CandidateItem::new("z", "Z", 0.9).with_flavor_tags("lemon").with_texture_tags("airy"),
            CandidateItem::new("w", "W", -3.0).with_sweetness(-10.0).with_richness(99.0),
        ];

        for anchor in &anchors {
            for candidate in &candidates {
                let score = scorer.score_pair(anchor, candidate);
                assert!((0.0..=1.0).contains(&score.overall), "{score:?}");
            }
        }
    }

    #[test]
    fn balance_rewards_agreement() {
        let aligned =
            ScoreBreakdown { flavor: 0.8, roast_texture: 0.8, ..ScoreBreakdown::default() };
        let split = ScoreBreakdown { flavor: 1.0, roast_texture: 0.3, ..ScoreBreakdown::default() };

        assert!((balance_score(&aligned) - 0.8).abs() < 1e-12);
        // 0.65 * 0.3
        assert!((balance_score(&split) - 0.195).abs() < 1e-12);
    }

    #[test]
    fn complexity_buckets() {
        assert_eq!(complexity_score(0), 0.6);
        assert_eq!(complexity_score(2), 0.6);
        assert_eq!(complexity_score(3), 0.7);
        assert_eq!(complexity_score(7), 0.7);
        assert_eq!(complexity_score(8), 0.8);
    }

    #[test]
    fn explanation_names_origin_and_season() {
        let breakdown = ScoreBreakdown {
            flavor: 0.7,
            origin: 0.8,
            acidity: 0.5,
            roast_texture: 0.5,
            popularity: 1.0,
            seasonal_multiplier: 1.05,
        };

        let explanation = generate_explanation(&breakdown, Some(" Ethiopia "));
        assert!(explanation.contains("Good flavor compatibility."));
        assert!(explanation.contains("The Ethiopia origin"));
        assert!(explanation.ends_with("Seasonally enhanced pairing."));
    }

    #[test]
    fn explanation_always_has_a_sentence() {
        let explanation = generate_explanation(&ScoreBreakdown::default(), None);
        assert_eq!(explanation, "A pleasant pairing with complementary characteristics.");
    }
}
