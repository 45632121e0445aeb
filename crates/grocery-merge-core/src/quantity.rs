//! Decimal ↔ cooking-fraction conversion.
//!
//! Quantities travel through the pipeline as `f64`. When they are shown to
//! a person (or to the semantic merge service, which reasons better in
//! kitchen units) they are rendered as proper or mixed fractions snapped to
//! the nearest practical cooking fraction: halves, thirds, quarters, and
//! eighths. Source quantities are already rounded decimals, so exact
//! rational reconstruction would only produce noise like `333/1000`.

/// Practical cooking fractions as `(value, label)`, ascending.
///
/// `0` and `1` bracket the table so a remainder close to a whole number
/// snaps to it instead of to `7/8`.
const COOKING_FRACTIONS: [(f64, &str); 11] = [
    (0.0, ""),
    (0.125, "1/8"),
    (0.25, "1/4"),
    (1.0 / 3.0, "1/3"),
    (0.375, "3/8"),
    (0.5, "1/2"),
    (0.625, "5/8"),
    (2.0 / 3.0, "2/3"),
    (0.75, "3/4"),
    (0.875, "7/8"),
    (1.0, ""),
];

/// Render a decimal quantity as a cooking fraction.
///
/// ```
/// use grocery_merge_core::quantity::decimal_to_fraction;
///
/// assert_eq!(decimal_to_fraction(0.5), "1/2");
/// assert_eq!(decimal_to_fraction(1.333), "1 1/3");
/// assert_eq!(decimal_to_fraction(2.0), "2");
/// ```
///
/// Negative and non-finite values are not cooking quantities; they fall
/// back to plain decimal formatting so nothing is silently lost.
pub fn decimal_to_fraction(value: f64) -> String {
    if !value.is_finite() || value < 0.0 {
        return format_decimal(value);
    }

    let mut whole = value.trunc() as u64;
    let remainder = value - value.trunc();

    let (idx, _) = COOKING_FRACTIONS
        .iter()
        .enumerate()
        .map(|(i, (frac, _))| (i, (remainder - frac).abs()))
        .fold((0, f64::MAX), |best, cur| if cur.1 < best.1 { cur } else { best });

    let mut label = COOKING_FRACTIONS[idx].1;
    if idx == COOKING_FRACTIONS.len() - 1 {
        whole += 1;
    }

    // A real but tiny amount must not disappear from the list.
    if whole == 0 && label.is_empty() && value > 0.0 {
        label = COOKING_FRACTIONS[1].1;
    }

    match (whole, label.is_empty()) {
        (0, true) => "0".to_string(),
        (w, true) => w.to_string(),
        (0, false) => label.to_string(),
        (w, false) => format!("{} {}", w, label),
    }
}

/// Parse a human quantity: `"2"`, `"1/2"`, `"1 1/2"`, or `"1.5"`.
///
/// Used only on the input side (event files, HTTP requests). The merge
/// service is contracted to return plain numbers and its responses are
/// never run through this function.
pub fn parse_fraction(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let mut total = 0.0;
    for part in text.split_whitespace() {
        total += match part.split_once('/') {
            Some((num, den)) => {
                let num: f64 = num.parse().ok()?;
                let den: f64 = den.parse().ok()?;
                if den == 0.0 {
                    return None;
                }
                num / den
            }
            None => part.parse::<f64>().ok()?,
        };
    }

    if total.is_finite() {
        Some(total)
    } else {
        None
    }
}

/// Display text for a naive quantity. No quantity was ever recorded for
/// the ingredient, so it is bought "to taste".
pub fn display_naive_quantity(quantity: Option<f64>) -> String {
    match quantity {
        Some(q) => decimal_to_fraction(q),
        None => "to taste".to_string(),
    }
}

/// Display text for a merged quantity. `None` means the merge service could
/// not settle on a total, which is shown as a dash.
pub fn display_merged_quantity(quantity: Option<f64>) -> String {
    match quantity {
        Some(q) => decimal_to_fraction(q),
        None => "-".to_string(),
    }
}

fn format_decimal(value: f64) -> String {
    let s = format!("{:.3}", value);
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_halves_thirds_quarters_eighths() {
        assert_eq!(decimal_to_fraction(0.5), "1/2");
        assert_eq!(decimal_to_fraction(0.25), "1/4");
        assert_eq!(decimal_to_fraction(0.75), "3/4");
        assert_eq!(decimal_to_fraction(0.125), "1/8");
        assert_eq!(decimal_to_fraction(0.667), "2/3");
        assert_eq!(decimal_to_fraction(0.333), "1/3");
    }

    #[test]
    fn test_mixed_numbers() {
        assert_eq!(decimal_to_fraction(1.333), "1 1/3");
        assert_eq!(decimal_to_fraction(1.5), "1 1/2");
        assert_eq!(decimal_to_fraction(2.75), "2 3/4");
    }

    #[test]
    fn test_whole_numbers_render_bare() {
        assert_eq!(decimal_to_fraction(2.0), "2");
        assert_eq!(decimal_to_fraction(12.0), "12");
        assert_eq!(decimal_to_fraction(0.0), "0");
    }

    #[test]
    fn test_remainder_near_one_rounds_up() {
        assert_eq!(decimal_to_fraction(1.98), "2");
        assert_eq!(decimal_to_fraction(0.97), "1");
    }

    #[test]
    fn test_tiny_amount_not_dropped() {
        assert_eq!(decimal_to_fraction(0.02), "1/8");
    }

    #[test]
    fn test_float_noise_snaps() {
        assert_eq!(decimal_to_fraction(0.1 + 0.2), "1/3");
        assert_eq!(decimal_to_fraction(3.0000001), "3");
    }

    #[test]
    fn test_negative_and_non_finite_fall_back() {
        assert_eq!(decimal_to_fraction(-1.5), "-1.5");
        assert_eq!(decimal_to_fraction(f64::NAN), "NaN");
    }

    #[test]
    fn test_parse_fraction() {
        assert_eq!(parse_fraction("2"), Some(2.0));
        assert_eq!(parse_fraction("1/2"), Some(0.5));
        assert_eq!(parse_fraction(" 1 1/2 "), Some(1.5));
        assert_eq!(parse_fraction("1.25"), Some(1.25));
        assert_eq!(parse_fraction(""), None);
        assert_eq!(parse_fraction("1/0"), None);
        assert_eq!(parse_fraction("a pinch"), None);
    }

    #[test]
    fn test_absent_and_null_display_differently() {
        assert_eq!(display_naive_quantity(None), "to taste");
        assert_eq!(display_merged_quantity(None), "-");
        assert_eq!(display_naive_quantity(Some(1.5)), "1 1/2");
        assert_eq!(display_merged_quantity(Some(1.5)), "1 1/2");
    }
}
