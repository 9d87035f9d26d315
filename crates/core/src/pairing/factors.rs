//! Individual pairing factors.
//!
//! Each factor is a pure function over canonical tokens and the read-only
//! tables. Missing or unrecognized inputs fall back to neutral scores; nothing
//! here can fail.

use super::tables::{
    CompatibilityTable, OriginAffinityTable, PopularityFactorTable, RoastTextureTable,
    SeasonalFactorTable,
};
use super::vocabulary::normalize_token;

/// Score used when a factor has nothing to compare.
pub const NEUTRAL_SCORE: f64 = 0.5;

/// Score for two non-empty token lists that share nothing.
pub const NO_OVERLAP_SCORE: f64 = 0.3;

/// Flat score for roasts that are neither dark nor light.
pub const UNCLASSIFIED_ROAST_SCORE: f64 = 0.7;

const TABLE_MATCH_CREDIT: f64 = 1.0;
// Lower than a table match. Kept as observed behavior pending product review.
const EXACT_MATCH_CREDIT: f64 = 0.8;

const DEFAULT_RATING: f64 = 3.0;

/// Token overlap between anchor flavor notes and candidate flavor tags.
pub fn flavor_compatibility(
    table: &CompatibilityTable,
    anchor_tokens: &[String],
    candidate_tokens: &[String],
) -> f64 {
    if anchor_tokens.is_empty() || candidate_tokens.is_empty() {
        return NEUTRAL_SCORE;
    }

    let mut accumulated = 0.0;
    let mut matches = 0usize;

    for anchor in anchor_tokens {
        for candidate in candidate_tokens {
            if table.is_compatible(anchor, candidate) {
                accumulated += TABLE_MATCH_CREDIT;
                matches += 1;
            } else if anchor == candidate {
                accumulated += EXACT_MATCH_CREDIT;
                matches += 1;
            }
        }
    }

    if matches == 0 {
        return NO_OVERLAP_SCORE;
    }

    let denominator = anchor_tokens.len().max(candidate_tokens.len()) as f64;
    (accumulated / denominator).min(1.0)
}

/// How well the candidate's flavors match what the anchor's origin is known for.
pub fn origin_affinity(
    table: &OriginAffinityTable,
    origin: Option<&str>,
    candidate_tokens: &[String],
) -> f64 {
    let Some(origin) = origin else {
        return NEUTRAL_SCORE;
    };
    if candidate_tokens.is_empty() {
        return NEUTRAL_SCORE;
    }

    // Unknown origins are common and are not penalized.
    let Some(expected) = table.expected_flavors(origin) else {
        return NEUTRAL_SCORE;
    };

    let matches = candidate_tokens.iter().filter(|token| expected.contains(*token)).count();
    (matches as f64 / expected.len().max(1) as f64).min(1.0)
}

/// Rule buckets pairing anchor acidity against candidate sweetness and richness.
pub fn acidity_balance(
    acidity: Option<f64>,
    sweetness: Option<f64>,
    richness: Option<f64>,
) -> f64 {
    let acidity = acidity.unwrap_or(DEFAULT_RATING);
    let sweetness = sweetness.unwrap_or(DEFAULT_RATING);
    let richness = richness.unwrap_or(DEFAULT_RATING);

    if acidity >= 4.0 {
        if sweetness >= 4.0 && richness >= 3.0 {
            1.0
        } else if sweetness >= 3.0 && richness >= 3.0 {
            0.8
        } else if sweetness >= 2.0 {
            0.6
        } else {
            0.4
        }
    } else if acidity == 3.0 {
        0.9
    } else if acidity <= 2.0 {
        if richness >= 4.0 {
            1.0
        } else if richness >= 3.0 {
            0.8
        } else if richness >= 2.0 {
            0.6
        } else {
            0.4
        }
    } else {
        // Fractional or non-finite acidity.
        0.7
    }
}

/// Rule buckets pairing the anchor's roast with candidate textures.
pub fn roast_texture_harmony(
    table: &RoastTextureTable,
    roast_type: Option<&str>,
    texture_tokens: &[String],
) -> f64 {
    let roast = roast_type.map(normalize_token).unwrap_or_default();
    if roast.is_empty() || texture_tokens.is_empty() {
        return NEUTRAL_SCORE;
    }

    let harmonious = if roast.contains("dark") || roast.contains("espresso") {
        table.dark_textures()
    } else if roast.contains("light") || roast.contains("filter") {
        table.light_textures()
    } else {
        return UNCLASSIFIED_ROAST_SCORE;
    };

    let matches = texture_tokens.iter().filter(|token| harmonious.contains(*token)).count();
    if matches == 0 {
        return NO_OVERLAP_SCORE;
    }
    (matches as f64 / texture_tokens.len() as f64).min(1.0)
}

/// Blend two popularity hints through the discrete boost table.
///
/// The result is `multiplier * 0.5 + 0.5`, which exceeds 1.0 for multipliers
/// above 1.0. The composite clamp absorbs that overflow.
pub fn popularity_blend(table: &PopularityFactorTable, anchor: f64, candidate: f64) -> f64 {
    let average = (anchor + candidate) / 2.0;
    let tenths = (average * 10.0).round() as i64;
    let multiplier = table.multiplier_for_tenths(tenths).unwrap_or(1.0);
    multiplier * 0.5 + 0.5
}

pub fn seasonal_multiplier(table: &SeasonalFactorTable, season_hint: Option<&str>) -> f64 {
    season_hint.and_then(|season| table.multiplier(season)).unwrap_or(1.0)
}
