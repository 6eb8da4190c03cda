/// Lower-cases a categorical label and joins its words with `_`.
pub(crate) fn normalize_label(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    cleaned
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
        .to_ascii_lowercase()
}

pub(crate) fn parse_bool(value: &str) -> Option<bool> {
    match normalize_label(value).as_str() {
        "yes" | "y" | "true" | "t" | "1" => Some(true),
        "no" | "n" | "false" | "f" | "0" => Some(false),
        _ => None,
    }
}

/// Parses a plain number, tolerating currency symbols and thousands separators.
pub(crate) fn parse_number(value: &str) -> Option<f64> {
    let cleaned: String = value
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect();
    cleaned.parse::<f64>().ok().filter(|number| number.is_finite())
}

/// Accepts `25%`, `25` or `0.25` and returns a fraction. Bare values above 1
/// are read as percentages.
pub(crate) fn parse_fraction(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if let Some(percent) = trimmed.strip_suffix('%') {
        return parse_number(percent).map(|number| number / 100.0);
    }
    parse_number(trimmed).map(|number| if number > 1.0 { number / 100.0 } else { number })
}
