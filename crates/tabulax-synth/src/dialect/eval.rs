//! Program interpreter.

use tabulax_model::parse_number;

use super::ast::{Expr, MAX_PAD_WIDTH, UnaryOp, Value};
use super::ops;
use crate::error::EvalError;

impl Expr {
    /// Evaluates the expression with `input` bound to the given value.
    pub fn eval(&self, input: &str) -> Result<Value, EvalError> {
        let value = match self {
            Self::Input => Value::Text(input.to_string()),
            Self::Text(text) => Value::Text(text.clone()),
            Self::Number(value) => Value::Number(*value),
            Self::Concat(parts) => {
                let mut out = String::new();
                for part in parts {
                    out.push_str(&part.eval_text(input)?);
                }
                Value::Text(out)
            }
            Self::Unary(op, expr) => eval_unary(*op, expr, input)?,
            Self::Token {
                expr,
                delimiter,
                index,
            } => {
                if delimiter.is_empty() {
                    return Err(EvalError::EmptyPattern);
                }
                let text = expr.eval_text(input)?;
                let tokens: Vec<&str> = text
                    .split(delimiter.as_str())
                    .filter(|t| !t.is_empty())
                    .collect();
                let position = resolve_index(*index, tokens.len()).ok_or(EvalError::TokenIndex {
                    index: *index,
                    count: tokens.len(),
                })?;
                Value::Text(tokens[position].to_string())
            }
            Self::Slice { expr, start, end } => {
                let chars: Vec<char> = expr.eval_text(input)?.chars().collect();
                let len = chars.len();
                let start = clamp_position(*start, len);
                let end = end.map_or(len, |end| clamp_position(end, len));
                Value::Text(if start < end {
                    chars[start..end].iter().collect()
                } else {
                    String::new()
                })
            }
            Self::Replace { expr, from, to } => {
                if from.is_empty() {
                    return Err(EvalError::EmptyPattern);
                }
                Value::Text(expr.eval_text(input)?.replace(from.as_str(), to))
            }
            Self::Keep { expr, class } => Value::Text(
                expr.eval_text(input)?
                    .chars()
                    .filter(|ch| class.matches(*ch))
                    .collect(),
            ),
            Self::PadLeft { expr, width, fill } => {
                let text = expr.eval_text(input)?;
                let missing = (*width).min(MAX_PAD_WIDTH).saturating_sub(text.chars().count());
                let mut out: String = std::iter::repeat_n(*fill, missing).collect();
                out.push_str(&text);
                Value::Text(out)
            }
            Self::Numeric { expr, function } => {
                let result = function.apply(expr.eval_number(input)?);
                if !result.is_finite() {
                    return Err(EvalError::NonFinite);
                }
                Value::Number(result)
            }
            Self::Format { expr, format } => {
                let value = expr.eval_number(input)?;
                if !value.is_finite() {
                    return Err(EvalError::NonFinite);
                }
                Value::Text(format.apply(value))
            }
            Self::CharCodes {
                expr,
                radix,
                separator,
            } => Value::Text(ops::char_codes(&expr.eval_text(input)?, *radix, separator)?),
            Self::CharBits { expr, separator } => {
                Value::Text(ops::char_bits(&expr.eval_text(input)?, separator))
            }
            Self::ToRadix { expr, radix } => {
                Value::Text(ops::to_radix(&expr.eval_text(input)?, *radix)?)
            }
            Self::FromRadix { expr, radix } => {
                Value::Text(ops::from_radix(&expr.eval_text(input)?, *radix)?)
            }
            Self::Caesar { expr, shift } => {
                Value::Text(ops::caesar(&expr.eval_text(input)?, *shift))
            }
            Self::Date { expr, from, to } => {
                Value::Text(ops::reformat_date(&expr.eval_text(input)?, from, to)?)
            }
            Self::UnixTime { expr, format } => {
                Value::Text(ops::unix_time(&expr.eval_text(input)?, format)?)
            }
        };
        Ok(value)
    }

    /// Evaluates to text.
    pub fn eval_text(&self, input: &str) -> Result<String, EvalError> {
        self.eval(input).map(Value::into_text)
    }

    /// Evaluates to a number, parsing text with the shared numeric policy.
    pub fn eval_number(&self, input: &str) -> Result<f64, EvalError> {
        match self.eval(input)? {
            Value::Number(value) => Ok(value),
            Value::Text(text) => parse_number(&text).ok_or(EvalError::NotANumber(text)),
        }
    }
}

fn eval_unary(op: UnaryOp, expr: &Expr, input: &str) -> Result<Value, EvalError> {
    let text = || expr.eval_text(input);
    let value = match op {
        UnaryOp::Number => Value::Number(expr.eval_number(input)?),
        UnaryOp::Lower => Value::Text(text()?.to_lowercase()),
        UnaryOp::Upper => Value::Text(text()?.to_uppercase()),
        UnaryOp::Title => Value::Text(ops::title_case(&text()?)),
        UnaryOp::Capitalize => Value::Text(ops::capitalize(&text()?)),
        UnaryOp::Trim => Value::Text(text()?.trim().to_string()),
        UnaryOp::Reverse => Value::Text(ops::reverse(&text()?)),
        UnaryOp::Length => Value::Number(text()?.chars().count() as f64),
        UnaryOp::Base64 => Value::Text(ops::base64_encode(&text()?)),
        UnaryOp::Unbase64 => Value::Text(ops::base64_decode(&text()?)?),
        UnaryOp::Sha256 => Value::Text(ops::sha256_hex(&text()?)),
        UnaryOp::Fnv1a => Value::Text(ops::fnv1a_hex(&text()?)),
        UnaryOp::Luhn => Value::Text(ops::luhn_check_digit(&text()?)?.to_string()),
        UnaryOp::Palindrome => Value::Text(ops::is_palindrome(&text()?).to_string()),
    };
    Ok(value)
}

/// Resolves a possibly negative index into `0..len`.
fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let position = if index < 0 { len + index } else { index };
    (0..len).contains(&position).then(|| position as usize)
}

/// Clamps a possibly negative char position into `0..=len`.
fn clamp_position(position: i64, len: usize) -> usize {
    if position < 0 {
        len.saturating_sub(position.unsigned_abs() as usize)
    } else {
        (position as usize).min(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::ast::{CharClass, NumberFormat, NumericFn};

    fn run(expr: &Expr, input: &str) -> String {
        expr.eval_text(input).unwrap()
    }

    #[test]
    fn test_token_indexes() {
        let last = Expr::token(Expr::Input, " ", -1);
        assert_eq!(run(&last, "john  smith"), "smith");
        let first = Expr::token(Expr::Input, " ", 0);
        assert_eq!(run(&first, "john smith"), "john");
        let third = Expr::token(Expr::Input, " ", 2);
        assert_eq!(
            third.eval_text("john smith"),
            Err(EvalError::TokenIndex { index: 2, count: 2 })
        );
    }

    #[test]
    fn test_slices_clamp() {
        assert_eq!(run(&Expr::slice(Expr::Input, 0, Some(1)), "alan"), "a");
        assert_eq!(run(&Expr::slice(Expr::Input, -2, None), "alan"), "an");
        assert_eq!(run(&Expr::slice(Expr::Input, 2, Some(99)), "alan"), "an");
        assert_eq!(run(&Expr::slice(Expr::Input, 3, Some(1)), "alan"), "");
        assert_eq!(run(&Expr::slice(Expr::Input, 0, Some(1)), ""), "");
    }

    #[test]
    fn test_scenario_a_program() {
        let program = Expr::Concat(vec![
            Expr::unary(UnaryOp::Capitalize, Expr::token(Expr::Input, " ", -1)),
            Expr::text(", "),
            Expr::unary(UnaryOp::Upper, Expr::slice(Expr::Input, 0, Some(1))),
            Expr::text("."),
        ]);
        assert_eq!(run(&program, "alan turing"), "Turing, A.");
    }

    #[test]
    fn test_numeric_program() {
        let program = Expr::Format {
            expr: Box::new(Expr::Numeric {
                expr: Box::new(Expr::unary(UnaryOp::Number, Expr::Input)),
                function: NumericFn::Scale { a: 0.44092 },
            }),
            format: NumberFormat::Fixed(4),
        };
        assert_eq!(run(&program, "20"), "8.8184");
        assert_eq!(
            program.eval_text("abc"),
            Err(EvalError::NotANumber("abc".to_string()))
        );
    }

    #[test]
    fn test_misc_string_ops() {
        let keep = Expr::Keep {
            expr: Box::new(Expr::Input),
            class: CharClass::Digit,
        };
        assert_eq!(run(&keep, "(555) 123-4567"), "5551234567");
        let pad = Expr::PadLeft {
            expr: Box::new(Expr::Input),
            width: 5,
            fill: '0',
        };
        assert_eq!(run(&pad, "42"), "00042");
        assert_eq!(run(&pad, "123456"), "123456");
        let replace = Expr::Replace {
            expr: Box::new(Expr::Input),
            from: "-".into(),
            to: "".into(),
        };
        assert_eq!(run(&replace, "Mary-Ann"), "MaryAnn");
    }

    #[test]
    fn test_length_renders_as_integer() {
        assert_eq!(run(&Expr::unary(UnaryOp::Length, Expr::Input), "hello"), "5");
    }

    #[test]
    fn test_oversized_arguments_are_clamped() {
        assert_eq!(NumberFormat::Round(70_000).apply(1.5), "1.5");
        assert_eq!(NumberFormat::Fixed(u32::MAX).apply(1.0), "1.00000000000000000");
        let pad = Expr::PadLeft {
            expr: Box::new(Expr::Input),
            width: usize::MAX,
            fill: '0',
        };
        let padded = run(&pad, "7");
        assert_eq!(padded.len(), crate::dialect::MAX_PAD_WIDTH);
        assert!(padded.ends_with("07"));
    }
}
