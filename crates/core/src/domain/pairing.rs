use serde::{Deserialize, Serialize};

use super::menu::CandidateItem;

/// Per-component scores for one anchor/candidate pair.
///
/// Components are nominally in `[0, 1]`; `popularity` can sit slightly above
/// 1.0 because the blender rescales its multiplier without clamping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub flavor: f64,
    pub origin: f64,
    pub acidity: f64,
    #[serde(rename = "texture")]
    pub roast_texture: f64,
    pub popularity: f64,
    #[serde(rename = "seasonal")]
    pub seasonal_multiplier: f64,
}

/// Compatibility score for one pair. Only the numeric fields are authoritative.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompositeScore {
    /// Clamped into `[0, 1]`.
    pub overall: f64,
    pub breakdown: ScoreBreakdown,
    pub balance: f64,
    pub complexity: f64,
    pub explanation: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankedPairing {
    pub candidate: CandidateItem,
    pub score: CompositeScore,
}

/// Coarse label for a subscore, used in human-facing copy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    /// score >= 0.80
    Excellent,
    /// score 0.60 - 0.79
    Good,
    /// score 0.40 - 0.59
    Moderate,
    Light,
}

impl ScoreBand {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.80 {
            ScoreBand::Excellent
        } else if score >= 0.60 {
            ScoreBand::Good
        } else if score >= 0.40 {
            ScoreBand::Moderate
        } else {
            ScoreBand::Light
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScoreBand::Excellent => "excellent",
            ScoreBand::Good => "good",
            ScoreBand::Moderate => "moderate",
            ScoreBand::Light => "light",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ScoreBand, ScoreBreakdown};

    #[test]
    fn band_from_score() {
        assert_eq!(ScoreBand::from_score(0.85), ScoreBand::Excellent);
        assert_eq!(ScoreBand::from_score(0.70), ScoreBand::Good);
        assert_eq!(ScoreBand::from_score(0.45), ScoreBand::Moderate);
        assert_eq!(ScoreBand::from_score(0.30), ScoreBand::Light);
        assert_eq!(ScoreBand::from_score(0.80).label(), "excellent");
    }

    #[test]
    fn breakdown_uses_external_field_names() {
        let breakdown = ScoreBreakdown {
            flavor: 1.0,
            origin: 0.5,
            acidity: 0.9,
            roast_texture: 0.7,
            popularity: 1.0,
            seasonal_multiplier: 1.05,
        };

        let value = serde_json::to_value(breakdown).expect("breakdown should serialize");
        assert_eq!(value["texture"], 0.7);
        assert_eq!(value["seasonal"], 1.05);
        assert!(value.get("roast_texture").is_none());
    }
}
