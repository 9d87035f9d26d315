//! Canonical token extraction for free-text tag fields.

const TAG_SEPARATORS: [char; 4] = [',', ';', '|', '&'];

/// Split a tag field into lowercase, trimmed, de-duplicated tokens.
///
/// Absent or blank input yields an empty list. Order follows first occurrence.
pub fn normalize_tags(raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };

    let mut tokens: Vec<String> = Vec::new();
    for piece in raw.split(TAG_SEPARATORS) {
        let token = normalize_token(piece);
        if !token.is_empty() && !tokens.contains(&token) {
            tokens.push(token);
        }
    }
    tokens
}

/// Canonical form of a single token or lookup key.
pub fn normalize_token(value: &str) -> String {
    value.trim().to_lowercase()
}
