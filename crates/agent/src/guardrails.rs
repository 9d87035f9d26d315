use crate::narrative::Narrative;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardrailDecision {
    Allow,
    Deny { reason_code: &'static str, message: String },
}

impl GuardrailDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Shape checks a generated narrative must pass before it replaces the
/// deterministic template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NarrativeGuardrails {
    pub min_flavor_tags: usize,
    pub max_flavor_tags: usize,
    pub max_tagline_chars: usize,
    pub max_explanation_chars: usize,
    pub max_tag_chars: usize,
    /// Generated copy must not quote its own match percentages; the engine's
    /// numbers are the only scores shown.
    pub allow_score_claims: bool,
}

impl Default for NarrativeGuardrails {
    fn default() -> Self {
        Self {
            min_flavor_tags: 2,
            max_flavor_tags: 3,
            max_tagline_chars: 120,
            max_explanation_chars: 600,
            max_tag_chars: 32,
            allow_score_claims: false,
        }
    }
}

impl NarrativeGuardrails {
    pub fn evaluate(&self, narrative: &Narrative) -> GuardrailDecision {
        let tagline = narrative.marketing_tagline.trim();
        if tagline.is_empty() {
            return deny("empty_tagline", "marketing_tagline is empty".to_string());
        }
        if tagline.chars().count() > self.max_tagline_chars {
            return deny(
                "tagline_too_long",
                format!("marketing_tagline exceeds {} characters", self.max_tagline_chars),
            );
        }

        let explanation = narrative.explanation.trim();
        if explanation.is_empty() {
            return deny("empty_explanation", "explanation is empty".to_string());
        }
        if explanation.chars().count() > self.max_explanation_chars {
            return deny(
                "explanation_too_long",
                format!("explanation exceeds {} characters", self.max_explanation_chars),
            );
        }

        let tag_count = narrative.flavor_tags.len();
        if tag_count < self.min_flavor_tags || tag_count > self.max_flavor_tags {
            return deny(
                "flavor_tag_count",
                format!(
                    "expected {}-{} flavor_tags, got {tag_count}",
                    self.min_flavor_tags, self.max_flavor_tags
                ),
            );
        }
        if let Some(tag) = narrative
            .flavor_tags
            .iter()
            .find(|tag| tag.trim().is_empty() || tag.chars().count() > self.max_tag_chars)
        {
            return deny("invalid_flavor_tag", format!("flavor tag `{tag}` is blank or too long"));
        }

        let claims_score = contains_percentage(tagline) || contains_percentage(explanation);
        if !self.allow_score_claims && claims_score {
            return deny(
                "score_claim",
                "narrative quotes a percentage score of its own".to_string(),
            );
        }

        GuardrailDecision::Allow
    }
}

fn deny(reason_code: &'static str, message: String) -> GuardrailDecision {
    GuardrailDecision::Deny { reason_code, message }
}

fn contains_percentage(text: &str) -> bool {
    let chars: Vec<char> = text.chars().collect();
    chars.windows(2).any(|pair| pair[0].is_ascii_digit() && pair[1] == '%')
}

#[cfg(test)]
mod tests {
    use super::{GuardrailDecision, NarrativeGuardrails};
    use crate::narrative::Narrative;

    fn narrative() -> Narrative {
        Narrative {
            marketing_tagline: "Bright berries meet a floral Yirgacheffe".to_string(),
            explanation: "The danish's berry notes echo the coffee's fruit.".to_string(),
            flavor_tags: vec!["berry".to_string(), "floral".to_string()],
            allergen_info: Some("Contains wheat and dairy.".to_string()),
        }
    }

    fn reason(decision: GuardrailDecision) -> &'static str {
        match decision {
            GuardrailDecision::Deny { reason_code, .. } => reason_code,
            GuardrailDecision::Allow => "",
        }
    }

    #[test]
    fn well_formed_narrative_is_allowed() {
        assert!(NarrativeGuardrails::default().evaluate(&narrative()).is_allowed());
    }

    #[test]
    fn blank_text_is_denied() {
        let policy = NarrativeGuardrails::default();

        let mut blank_tagline = narrative();
        blank_tagline.marketing_tagline = "   ".to_string();
        assert_eq!(reason(policy.evaluate(&blank_tagline)), "empty_tagline");

        let mut blank_explanation = narrative();
        blank_explanation.explanation = String::new();
        assert_eq!(reason(policy.evaluate(&blank_explanation)), "empty_explanation");
    }

    #[test]
    fn flavor_tag_count_must_be_two_or_three() {
        let policy = NarrativeGuardrails::default();

        let mut one_tag = narrative();
        one_tag.flavor_tags.truncate(1);
        assert_eq!(reason(policy.evaluate(&one_tag)), "flavor_tag_count");

        let mut four_tags = narrative();
        four_tags.flavor_tags =
            ["a", "b", "c", "d"].into_iter().map(str::to_string).collect();
        assert_eq!(reason(policy.evaluate(&four_tags)), "flavor_tag_count");

        let mut three_tags = narrative();
        three_tags.flavor_tags.push("citrus".to_string());
        assert!(policy.evaluate(&three_tags).is_allowed());
    }

    #[test]
    fn overlong_fields_are_denied() {
        let policy = NarrativeGuardrails::default();

        let mut long_tagline = narrative();
        long_tagline.marketing_tagline = "x".repeat(121);
        assert_eq!(reason(policy.evaluate(&long_tagline)), "tagline_too_long");

        let mut long_tag = narrative();
        long_tag.flavor_tags[0] = "y".repeat(33);
        assert_eq!(reason(policy.evaluate(&long_tag)), "invalid_flavor_tag");
    }

    #[test]
    fn self_reported_percentages_are_denied() {
        let mut claim = narrative();
        claim.explanation = "A 97% match you will love.".to_string();

        assert_eq!(reason(NarrativeGuardrails::default().evaluate(&claim)), "score_claim");

        let lenient =
            NarrativeGuardrails { allow_score_claims: true, ..NarrativeGuardrails::default() };
        assert!(lenient.evaluate(&claim).is_allowed());
    }
}
