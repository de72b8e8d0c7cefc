//! Candidate building blocks for the concatenation search.
//!
//! Atoms are expressions over `input` that may produce one segment of a
//! target. Generation order is the preference order: earlier atoms are
//! simpler and win ties.

use std::collections::BTreeSet;

use crate::SearchBudget;
use crate::dialect::ops::parse_datetime;
use crate::dialect::{CharClass, Expr, MAX_PAD_WIDTH, UnaryOp};

/// Token delimiters considered by the search.
pub const DELIMITERS: [&str; 8] = [" ", ",", "-", "_", ".", "@", "/", ":"];

const CASE_OPS: [UnaryOp; 4] = [
    UnaryOp::Upper,
    UnaryOp::Lower,
    UnaryOp::Capitalize,
    UnaryOp::Title,
];

const PREFIX_LENGTHS: [i64; 3] = [1, 2, 3];

/// Formats tried when reading dates.
pub const DATE_INPUT_FORMATS: [&str; 14] = [
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%Y/%m/%d",
    "%d-%m-%Y",
    "%m-%d-%Y",
    "%d.%m.%Y",
    "%Y%m%d",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
];

/// Formats tried when writing dates.
pub const DATE_OUTPUT_FORMATS: [&str; 24] = [
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%Y/%m/%d",
    "%d-%m-%Y",
    "%m-%d-%Y",
    "%d.%m.%Y",
    "%Y%m%d",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%B %-d, %Y",
    "%-d %B %Y",
    "%-m/%-d/%Y",
    "%A",
    "%a",
    "%B",
    "%b",
    "%Y",
    "%m",
    "%d",
    "%j",
    "%Y-%m-%dT%H:%M:%S",
];

const CHAR_CODE_RADIXES: [u32; 4] = [10, 16, 2, 8];
const SEPARATORS: [&str; 4] = [" ", "", ",", "-"];
const RADIXES: [u32; 4] = [2, 8, 16, 36];
const CAESAR_SHIFTS: [i64; 25] = [
    13, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25,
];

/// String-primitive atoms: tokens, slices, character filters, replacement
/// and padding, each with case variants.
pub fn string_atoms(sources: &[&str], targets: &[&str], budget: &SearchBudget) -> Vec<Expr> {
    let max_position = i64::try_from(budget.max_slice_position).unwrap_or(i64::MAX);
    let mut bases = vec![Expr::Input, Expr::unary(UnaryOp::Trim, Expr::Input)];

    let delimiters: Vec<&str> = DELIMITERS
        .into_iter()
        .filter(|d| sources.iter().any(|s| s.contains(d)))
        .collect();

    let mut tokens = Vec::new();
    for &delimiter in &delimiters {
        let count = sources
            .iter()
            .map(|s| s.split(delimiter).filter(|t| !t.is_empty()).count())
            .max()
            .unwrap_or(0);
        let count = i64::try_from(count).unwrap_or(i64::MAX).min(max_position);
        for index in alternating_indexes(count) {
            let token = Expr::token(Expr::Input, delimiter, index);
            tokens.push(token.clone());
            if delimiter != " " {
                tokens.push(Expr::unary(UnaryOp::Trim, token));
            }
        }
    }
    bases.extend(tokens.iter().cloned());

    for base in tokens.iter().chain(std::iter::once(&Expr::Input)) {
        for &len in &PREFIX_LENGTHS {
            bases.push(Expr::slice(base.clone(), 0, Some(len)));
        }
    }

    for class in CharClass::ALL {
        bases.push(Expr::Keep {
            expr: Box::new(Expr::Input),
            class,
        });
    }

    for &from in &delimiters {
        for to in DELIMITERS.into_iter().chain([""]).filter(|to| *to != from) {
            bases.push(Expr::Replace {
                expr: Box::new(Expr::Input),
                from: from.to_string(),
                to: to.to_string(),
            });
        }
    }

    let widths: BTreeSet<usize> = targets
        .iter()
        .map(|t| t.chars().count())
        .filter(|&width| width <= MAX_PAD_WIDTH)
        .collect();
    for &width in &widths {
        for fill in ['0', ' '] {
            bases.push(Expr::PadLeft {
                expr: Box::new(Expr::Input),
                width,
                fill,
            });
        }
        bases.push(Expr::PadLeft {
            expr: Box::new(Expr::Keep {
                expr: Box::new(Expr::Input),
                class: CharClass::Digit,
            }),
            width,
            fill: '0',
        });
    }

    let longest = sources.iter().map(|s| s.chars().count()).max().unwrap_or(0);
    let limit = i64::try_from(longest).unwrap_or(i64::MAX).min(max_position);
    for start in 1..=limit {
        bases.push(Expr::slice(Expr::Input, start, None));
        bases.push(Expr::slice(Expr::Input, -start, None));
    }
    for start in 0..limit {
        for end in (start + 1)..=limit {
            bases.push(Expr::slice(Expr::Input, start, Some(end)));
        }
    }

    with_case_variants(bases)
}

/// Closed-form procedures: hashing, encoding, radix and date conversions.
pub fn algorithmic_atoms(sources: &[&str]) -> Vec<Expr> {
    let mut atoms = Vec::new();
    for op in UnaryOp::ALL.into_iter().filter(|op| op.is_algorithmic()) {
        atoms.push(Expr::unary(op, Expr::Input));
    }
    atoms.push(Expr::unary(
        UnaryOp::Reverse,
        Expr::unary(UnaryOp::Lower, Expr::Input),
    ));
    for op in [UnaryOp::Sha256, UnaryOp::Fnv1a] {
        atoms.push(Expr::unary(UnaryOp::Upper, Expr::unary(op, Expr::Input)));
    }

    for radix in CHAR_CODE_RADIXES {
        for separator in SEPARATORS {
            atoms.push(Expr::CharCodes {
                expr: Box::new(Expr::Input),
                radix,
                separator: separator.to_string(),
            });
        }
    }
    for separator in SEPARATORS {
        atoms.push(Expr::CharBits {
            expr: Box::new(Expr::Input),
            separator: separator.to_string(),
        });
    }
    for radix in RADIXES {
        let to = Expr::ToRadix {
            expr: Box::new(Expr::Input),
            radix,
        };
        if radix > 10 {
            atoms.push(Expr::unary(UnaryOp::Upper, to.clone()));
        }
        atoms.push(to);
        atoms.push(Expr::FromRadix {
            expr: Box::new(Expr::Input),
            radix,
        });
    }
    for shift in CAESAR_SHIFTS {
        atoms.push(Expr::Caesar {
            expr: Box::new(Expr::Input),
            shift,
        });
    }

    let date_formats: Vec<&str> = DATE_INPUT_FORMATS
        .into_iter()
        .filter(|format| sources.iter().all(|s| parse_datetime(s, format).is_ok()))
        .collect();
    for from in &date_formats {
        for to in DATE_OUTPUT_FORMATS {
            let date = Expr::Date {
                expr: Box::new(Expr::Input),
                from: from.to_string(),
                to: to.to_string(),
            };
            if to.contains(['A', 'a', 'B', 'b']) {
                atoms.push(Expr::unary(UnaryOp::Upper, date.clone()));
                atoms.push(Expr::unary(UnaryOp::Lower, date.clone()));
            }
            atoms.push(date);
        }
        atoms.push(Expr::UnixTime {
            expr: Box::new(Expr::Input),
            format: from.to_string(),
        });
    }
    atoms
}

/// `0, -1, 1, -2, 2, ...` covering `count` positions from each end.
fn alternating_indexes(count: i64) -> impl Iterator<Item = i64> {
    (0..count).flat_map(|i| [i, -(i + 1)])
}

fn with_case_variants(bases: Vec<Expr>) -> Vec<Expr> {
    let mut out = Vec::with_capacity(bases.len() * (CASE_OPS.len() + 1));
    for base in bases {
        let variants = CASE_OPS.map(|op| Expr::unary(op, base.clone()));
        out.push(base);
        out.extend(variants);
    }
    out
}
