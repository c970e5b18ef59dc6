/// Trim whitespace + strip outer quotes if present.
pub fn clean_str(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].trim().to_string()
    } else {
        trimmed.to_string()
    }
}

/// Parse a source cell as a number.
///
/// Thousands separators are dropped. Placeholders such as `*`, `**` or `#`, and anything
/// that parses to a non-finite value, yield `None`.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned = clean_str(raw);
    if cleaned.is_empty() {
        return None;
    }
    let digits: String = cleaned.chars().filter(|c| *c != ',').collect();
    digits.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Join-key normalization shared by every stage that keys on a state name:
/// lower-case, trimmed, inner whitespace runs collapsed to one space.
pub fn normalize_state_name(raw: &str) -> String {
    clean_str(raw)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
