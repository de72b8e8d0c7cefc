//! Numeric parsing policy.
//!
//! One policy is shared by the classifier, the executor and the fuzzy join:
//!
//! - surrounding whitespace is ignored
//! - an optional sign may precede a single currency symbol (`$`, `€`, `£`, `¥`)
//! - `,` is accepted only as a thousands separator in well-formed groups
//! - `.` is the only decimal separator; exponents (`1e3`) are accepted
//! - `inf`, `NaN` and other non-finite spellings are rejected

const CURRENCY_SYMBOLS: [char; 4] = ['$', '€', '£', '¥'];

/// Parses a string as a finite f64, returning None when it is not numeric.
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let (sign, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let rest = rest
        .strip_prefix(|ch: char| CURRENCY_SYMBOLS.contains(&ch))
        .unwrap_or(rest);

    let body = if rest.contains(',') {
        strip_group_separators(rest)?
    } else {
        rest.to_string()
    };

    if !body.chars().any(|ch| ch.is_ascii_digit()) {
        return None;
    }
    if !body
        .chars()
        .all(|ch| ch.is_ascii_digit() || matches!(ch, '.' | 'e' | 'E' | '+' | '-'))
    {
        return None;
    }
    if body.starts_with(['e', 'E', '+', '-']) {
        return None;
    }

    let value = format!("{sign}{body}").parse::<f64>().ok()?;
    value.is_finite().then_some(value)
}

/// Removes `,` thousands separators, rejecting malformed grouping such as `1,5`.
fn strip_group_separators(raw: &str) -> Option<String> {
    let (integer, fraction) = match raw.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (raw, None),
    };
    let mut groups = integer.split(',');
    let first = groups.next()?;
    if first.is_empty() || first.len() > 3 {
        return None;
    }
    let mut out = first.to_string();
    for group in groups {
        if group.len() != 3 || !group.chars().all(|ch| ch.is_ascii_digit()) {
            return None;
        }
        out.push_str(group);
    }
    if let Some(fraction) = fraction {
        if fraction.contains(',') {
            return None;
        }
        out.push('.');
        out.push_str(fraction);
    }
    Some(out)
}

/// Formats a number using the shortest representation that round-trips.
///
/// Integral values render without a decimal point and negative zero renders
/// as `0`.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    format!("{value}")
}
