//! Primitive procedures behind the dialect functions.

use std::fmt::Write;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{NaiveDate, NaiveDateTime};
use sha2::{Digest, Sha256};

use crate::error::EvalError;

const FNV_OFFSET: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// Uppercases the first letter of every alphanumeric run, lowercases the rest.
pub fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut at_word_start = true;
    for ch in value.chars() {
        if at_word_start {
            out.extend(ch.to_uppercase());
        } else {
            out.extend(ch.to_lowercase());
        }
        at_word_start = !ch.is_alphanumeric();
    }
    out
}

/// Uppercases the first character and lowercases the rest.
pub fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

pub fn reverse(value: &str) -> String {
    value.chars().rev().collect()
}

/// Lowercased alphanumerics read the same in both directions.
pub fn is_palindrome(value: &str) -> bool {
    let chars: Vec<char> = value
        .chars()
        .filter(|ch| ch.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect();
    chars.iter().eq(chars.iter().rev())
}

pub fn base64_encode(value: &str) -> String {
    STANDARD.encode(value.as_bytes())
}

pub fn base64_decode(value: &str) -> Result<String, EvalError> {
    let bytes = STANDARD
        .decode(value.trim())
        .map_err(|_| EvalError::InvalidBase64)?;
    String::from_utf8(bytes).map_err(|_| EvalError::InvalidUtf8)
}

/// Lowercase hex SHA-256 digest of the UTF-8 bytes.
pub fn sha256_hex(value: &str) -> String {
    hex::encode(Sha256::digest(value.as_bytes()))
}

/// 32-bit FNV-1a hash of the UTF-8 bytes, as 8 lowercase hex digits.
pub fn fnv1a_hex(value: &str) -> String {
    let hash = value.bytes().fold(FNV_OFFSET, |hash, byte| {
        (hash ^ u32::from(byte)).wrapping_mul(FNV_PRIME)
    });
    format!("{hash:08x}")
}

/// Luhn check digit for a string of decimal digits.
pub fn luhn_check_digit(value: &str) -> Result<char, EvalError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|ch| ch.is_ascii_digit()) {
        return Err(EvalError::InvalidLuhn(value.to_string()));
    }
    let sum: u32 = trimmed
        .chars()
        .rev()
        .filter_map(|ch| ch.to_digit(10))
        .enumerate()
        .map(|(i, digit)| {
            if i % 2 == 0 {
                let doubled = digit * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                digit
            }
        })
        .sum();
    char::from_digit((10 - sum % 10) % 10, 10).ok_or(EvalError::InvalidLuhn(value.to_string()))
}

pub fn check_radix(radix: u32) -> Result<u32, EvalError> {
    if (2..=36).contains(&radix) {
        Ok(radix)
    } else {
        Err(EvalError::InvalidRadix(radix))
    }
}

/// Renders an unsigned integer in the given radix, lowercase digits.
pub fn format_radix(mut value: u64, radix: u32) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let radix = u64::from(radix);
    let mut digits = Vec::new();
    while value > 0 {
        // Remainder is below the radix, so it always maps to a digit.
        let digit = (value % radix) as u32;
        digits.push(char::from_digit(digit, radix as u32).unwrap_or('?'));
        value /= radix;
    }
    digits.iter().rev().collect()
}

/// Decimal integer text to the given radix.
pub fn to_radix(value: &str, radix: u32) -> Result<String, EvalError> {
    let radix = check_radix(radix)?;
    let number: i64 = value
        .trim()
        .parse()
        .map_err(|_| EvalError::NotAnInteger(value.to_string()))?;
    let digits = format_radix(number.unsigned_abs(), radix);
    Ok(if number < 0 {
        format!("-{digits}")
    } else {
        digits
    })
}

/// Text in the given radix to decimal integer text.
pub fn from_radix(value: &str, radix: u32) -> Result<String, EvalError> {
    let radix = check_radix(radix)?;
    i64::from_str_radix(value.trim(), radix)
        .map(|n| n.to_string())
        .map_err(|_| EvalError::InvalidDigits {
            value: value.to_string(),
            radix,
        })
}

/// Code point of every character in the given radix.
pub fn char_codes(value: &str, radix: u32, separator: &str) -> Result<String, EvalError> {
    let radix = check_radix(radix)?;
    Ok(value
        .chars()
        .map(|ch| format_radix(u64::from(u32::from(ch)), radix))
        .collect::<Vec<_>>()
        .join(separator))
}

/// Code point of every character as binary, at least 8 digits.
pub fn char_bits(value: &str, separator: &str) -> String {
    value
        .chars()
        .map(|ch| format!("{:08b}", u32::from(ch)))
        .collect::<Vec<_>>()
        .join(separator)
}

/// Shifts ASCII letters through the alphabet, keeping case.
pub fn caesar(value: &str, shift: i64) -> String {
    // rem_euclid keeps the shift in 0..26.
    let shift = shift.rem_euclid(26) as u8;
    value
        .chars()
        .map(|ch| {
            let base = match ch {
                'a'..='z' => b'a',
                'A'..='Z' => b'A',
                _ => return ch,
            };
            char::from((ch as u8 - base + shift) % 26 + base)
        })
        .collect()
}

/// Parses a date or date-time with a strftime format.
pub fn parse_datetime(value: &str, format: &str) -> Result<NaiveDateTime, EvalError> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, format)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, format)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| EvalError::InvalidDate {
            value: value.to_string(),
            format: format.to_string(),
        })
}

/// Reformats a date between strftime formats.
pub fn reformat_date(value: &str, from: &str, to: &str) -> Result<String, EvalError> {
    let parsed = parse_datetime(value, from)?;
    let mut out = String::new();
    write!(out, "{}", parsed.format(to)).map_err(|_| EvalError::InvalidDateFormat(to.to_string()))?;
    Ok(out)
}

/// Seconds since the Unix epoch, reading the value as UTC.
pub fn unix_time(value: &str, format: &str) -> Result<String, EvalError> {
    Ok(parse_datetime(value, format)?.and_utc().timestamp().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_helpers() {
        assert_eq!(title_case("mary-ann o'neil"), "Mary-Ann O'Neil");
        assert_eq!(title_case("JOHN SMITH"), "John Smith");
        assert_eq!(capitalize("aLAN"), "Alan");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_hashes_and_encodings() {
        assert_eq!(base64_encode("hello"), "aGVsbG8=");
        assert_eq!(base64_decode("aGVsbG8=").unwrap(), "hello");
        assert_eq!(base64_decode("***"), Err(EvalError::InvalidBase64));
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(fnv1a_hex(""), "811c9dc5");
        assert_eq!(fnv1a_hex("a"), "e40c292c");
    }

    #[test]
    fn test_luhn() {
        assert_eq!(luhn_check_digit("7992739871"), Ok('3'));
        assert!(luhn_check_digit("12a").is_err());
    }

    #[test]
    fn test_radix() {
        assert_eq!(to_radix("255", 16).unwrap(), "ff");
        assert_eq!(to_radix("-5", 2).unwrap(), "-101");
        assert_eq!(from_radix("ff", 16).unwrap(), "255");
        assert_eq!(to_radix("0", 8).unwrap(), "0");
        assert_eq!(to_radix("1", 1), Err(EvalError::InvalidRadix(1)));
        assert_eq!(char_codes("AB", 10, " ").unwrap(), "65 66");
        assert_eq!(char_codes("AB", 16, "").unwrap(), "4142");
        assert_eq!(char_bits("A", " "), "01000001");
    }

    #[test]
    fn test_caesar_and_palindrome() {
        assert_eq!(caesar("Hello, World", 13), "Uryyb, Jbeyq");
        assert_eq!(caesar("abc", -1), "zab");
        assert!(is_palindrome("A man, a plan, a canal: Panama"));
        assert!(!is_palindrome("abc"));
    }

    #[test]
    fn test_dates() {
        assert_eq!(
            reformat_date("2024-01-15", "%Y-%m-%d", "%d/%m/%Y").unwrap(),
            "15/01/2024"
        );
        assert_eq!(reformat_date("2024-01-15", "%Y-%m-%d", "%A").unwrap(), "Monday");
        assert_eq!(unix_time("1970-01-02", "%Y-%m-%d").unwrap(), "86400");
        assert!(reformat_date("15/01/2024", "%Y-%m-%d", "%d").is_err());
    }
}
