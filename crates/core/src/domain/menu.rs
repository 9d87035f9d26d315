use serde::{Deserialize, Serialize};

/// Neutral popularity used when a hint is not a finite number.
const NEUTRAL_POPULARITY: f64 = 0.5;

/// The reference item (a coffee) every candidate is scored against.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnchorItem {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub flavor_notes: Option<String>,
    #[serde(default)]
    pub season_hint: Option<String>,
    pub popularity_hint: f64,
    #[serde(default)]
    pub origin: Option<String>,
    /// 1-5 scale.
    #[serde(default)]
    pub acidity: Option<f64>,
    #[serde(default)]
    pub roast_type: Option<String>,
}

impl AnchorItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>, popularity_hint: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            flavor_notes: None,
            season_hint: None,
            popularity_hint,
            origin: None,
            acidity: None,
            roast_type: None,
        }
    }

    pub fn with_flavor_notes(mut self, notes: impl Into<String>) -> Self {
        self.flavor_notes = Some(notes.into());
        self
    }

    pub fn with_season_hint(mut self, season: impl Into<String>) -> Self {
        self.season_hint = Some(season.into());
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn with_acidity(mut self, acidity: f64) -> Self {
        self.acidity = Some(acidity);
        self
    }

    pub fn with_roast_type(mut self, roast_type: impl Into<String>) -> Self {
        self.roast_type = Some(roast_type.into());
        self
    }

    /// Popularity hint clamped into `[0, 1]`.
    pub fn popularity(&self) -> f64 {
        sanitize_popularity(self.popularity_hint)
    }
}

/// An item (a pastry) evaluated for compatibility with the anchor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CandidateItem {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub flavor_tags: Option<String>,
    #[serde(default)]
    pub texture_tags: Option<String>,
    pub popularity_hint: f64,
    /// 1-5 scale.
    #[serde(default)]
    pub sweetness: Option<f64>,
    /// 1-5 scale.
    #[serde(default)]
    pub richness: Option<f64>,
}

impl CandidateItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>, popularity_hint: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            flavor_tags: None,
            texture_tags: None,
            popularity_hint,
            sweetness: None,
            richness: None,
        }
    }

    pub fn with_flavor_tags(mut self, tags: impl Into<String>) -> Self {
        self.flavor_tags = Some(tags.into());
        self
    }

    pub fn with_texture_tags(mut self, tags: impl Into<String>) -> Self {
        self.texture_tags = Some(tags.into());
        self
    }

    pub fn with_sweetness(mut self, sweetness: f64) -> Self {
        self.sweetness = Some(sweetness);
        self
    }

    pub fn with_richness(mut self, richness: f64) -> Self {
        self.richness = Some(richness);
        self
    }

    /// Popularity hint clamped into `[0, 1]`.
    pub fn popularity(&self) -> f64 {
        sanitize_popularity(self.popularity_hint)
    }
}

fn sanitize_popularity(hint: f64) -> f64 {
    if hint.is_finite() {
        hint.clamp(0.0, 1.0)
    } else {
        NEUTRAL_POPULARITY
    }
}

#[cfg(test)]
mod tests {
    use super::{AnchorItem, CandidateItem};

    #[test]
    fn anchor_deserializes_with_only_popularity_hint() {
        let anchor: AnchorItem =
            serde_json::from_str(r#"{"popularity_hint": 0.4}"#).expect("anchor should parse");

        assert_eq!(anchor.popularity_hint, 0.4);
        assert!(anchor.flavor_notes.is_none());
        assert!(anchor.acidity.is_none());
        assert!(anchor.id.is_empty());
    }

    #[test]
    fn candidate_deserializes_full_record() {
        let candidate: CandidateItem = serde_json::from_str(
            r#"{
                "id": "croissant",
                "name": "Butter Croissant",
                "flavor_tags": "butter, vanilla",
                "texture_tags": "flaky; laminated",
                "popularity_hint": 0.9,
                "sweetness": 2,
                "richness": 4
            }"#,
        )
        .expect("candidate should parse");

        assert_eq!(candidate.name, "Butter Croissant");
        assert_eq!(candidate.sweetness, Some(2.0));
        assert_eq!(candidate.id, "croissant");
    }

    #[test]
    fn popularity_is_clamped_and_non_finite_is_neutral() {
        assert_eq!(CandidateItem::new("a", "A", 1.7).popularity(), 1.0);
        assert_eq!(CandidateItem::new("b", "B", -0.2).popularity(), 0.0);
        assert_eq!(AnchorItem::new("c", "C", f64::NAN).popularity(), 0.5);
    }
}
