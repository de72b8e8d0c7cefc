//! Program printer.
//!
//! Output is accepted by [`parse`](super::parse::parse) and parses back to an
//! equal tree.

use std::fmt::{self, Display, Formatter, Write};

use super::ast::Expr;

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => f.write_str("input"),
            Self::Text(text) => write_quoted(f, text),
            Self::Number(value) => write!(f, "{value}"),
            Self::Concat(parts) => {
                f.write_str("concat(")?;
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{part}")?;
                }
                f.write_char(')')
            }
            Self::Unary(op, expr) => write!(f, "{}({expr})", op.name()),
            Self::Token {
                expr,
                delimiter,
                index,
            } => {
                write!(f, "token({expr}, ")?;
                write_quoted(f, delimiter)?;
                write!(f, ", {index})")
            }
            Self::Slice { expr, start, end } => match end {
                Some(end) => write!(f, "slice({expr}, {start}, {end})"),
                None => write!(f, "slice({expr}, {start})"),
            },
            Self::Replace { expr, from, to } => {
                write!(f, "replace({expr}, ")?;
                write_quoted(f, from)?;
                f.write_str(", ")?;
                write_quoted(f, to)?;
                f.write_char(')')
            }
            Self::Keep { expr, class } => write!(f, "keep({expr}, {})", class.name()),
            Self::PadLeft { expr, width, fill } => {
                write!(f, "pad_left({expr}, {width}, ")?;
                write_quoted(f, &fill.to_string())?;
                f.write_char(')')
            }
            Self::Numeric { expr, function } => {
                write!(f, "{}({expr}", function.name())?;
                for coefficient in function.coefficients() {
                    write!(f, ", {coefficient}")?;
                }
                f.write_char(')')
            }
            Self::Format { expr, format } => {
                write!(f, "{}({expr}, {})", format.name(), format.decimals())
            }
            Self::CharCodes {
                expr,
                radix,
                separator,
            } => {
                write!(f, "char_codes({expr}, {radix}, ")?;
                write_quoted(f, separator)?;
                f.write_char(')')
            }
            Self::CharBits { expr, separator } => {
                write!(f, "char_bits({expr}, ")?;
                write_quoted(f, separator)?;
                f.write_char(')')
            }
            Self::ToRadix { expr, radix } => write!(f, "to_radix({expr}, {radix})"),
            Self::FromRadix { expr, radix } => write!(f, "from_radix({expr}, {radix})"),
            Self::Caesar { expr, shift } => write!(f, "caesar({expr}, {shift})"),
            Self::Date { expr, from, to } => {
                write!(f, "date({expr}, ")?;
                write_quoted(f, from)?;
                f.write_str(", ")?;
                write_quoted(f, to)?;
                f.write_char(')')
            }
            Self::UnixTime { expr, format } => {
                write!(f, "unix_time({expr}, ")?;
                write_quoted(f, format)?;
                f.write_char(')')
            }
        }
    }
}

fn write_quoted(f: &mut Formatter<'_>, text: &str) -> fmt::Result {
    f.write_char('"')?;
    for ch in text.chars() {
        match ch {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            ch if ch.is_control() => write!(f, "\\u{{{:x}}}", u32::from(ch))?,
            ch => f.write_char(ch)?,
        }
    }
    f.write_char('"')
}
