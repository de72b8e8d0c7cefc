//! Program syntax tree.

use tabulax_model::format_number;

/// Largest decimal count accepted by `fixed` and `round`.
pub const MAX_DECIMALS: u32 = 17;

/// Largest `pad_left` width.
pub const MAX_PAD_WIDTH: usize = 4096;

/// Deepest call nesting accepted in program text.
pub const MAX_DEPTH: usize = 256;

/// Single-argument functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Lower,
    Upper,
    Title,
    Capitalize,
    Trim,
    Number,
    Reverse,
    Length,
    Base64,
    Unbase64,
    Sha256,
    Fnv1a,
    Luhn,
    Palindrome,
}

impl UnaryOp {
    pub const ALL: [Self; 14] = [
        Self::Lower,
        Self::Upper,
        Self::Title,
        Self::Capitalize,
        Self::Trim,
        Self::Number,
        Self::Reverse,
        Self::Length,
        Self::Base64,
        Self::Unbase64,
        Self::Sha256,
        Self::Fnv1a,
        Self::Luhn,
        Self::Palindrome,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Lower => "lower",
            Self::Upper => "upper",
            Self::Title => "title",
            Self::Capitalize => "capitalize",
            Self::Trim => "trim",
            Self::Number => "number",
            Self::Reverse => "reverse",
            Self::Length => "length",
            Self::Base64 => "base64",
            Self::Unbase64 => "unbase64",
            Self::Sha256 => "sha256",
            Self::Fnv1a => "fnv1a",
            Self::Luhn => "luhn",
            Self::Palindrome => "palindrome",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }

    /// Returns true for procedures outside the plain string primitives.
    pub fn is_algorithmic(self) -> bool {
        !matches!(
            self,
            Self::Lower | Self::Upper | Self::Title | Self::Capitalize | Self::Trim | Self::Number
        )
    }
}

/// Character classes accepted by `keep`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharClass {
    Alpha,
    Digit,
    Alnum,
    AlnumSpace,
}

impl CharClass {
    pub const ALL: [Self; 4] = [Self::Alpha, Self::Digit, Self::Alnum, Self::AlnumSpace];

    pub fn name(self) -> &'static str {
        match self {
            Self::Alpha => "alpha",
            Self::Digit => "digit",
            Self::Alnum => "alnum",
            Self::AlnumSpace => "alnum_space",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|class| class.name() == name)
    }

    pub fn matches(self, ch: char) -> bool {
        match self {
            Self::Alpha => ch.is_alphabetic(),
            Self::Digit => ch.is_ascii_digit(),
            Self::Alnum => ch.is_alphanumeric(),
            Self::AlnumSpace => ch.is_alphanumeric() || ch == ' ',
        }
    }
}

/// Fitted numeric functions of one variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericFn {
    /// `a*x`
    Scale { a: f64 },
    /// `a*x + b`
    Affine { a: f64, b: f64 },
    /// `a*x^2 + b*x + c`
    Quadratic { a: f64, b: f64, c: f64 },
    /// `a*x^b`
    Power { a: f64, b: f64 },
    /// `a*e^(b*x)`
    Exponential { a: f64, b: f64 },
}

impl NumericFn {
    pub const NAMES: [&'static str; 5] = ["scale", "affine", "quadratic", "power", "exponential"];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Scale { .. } => "scale",
            Self::Affine { .. } => "affine",
            Self::Quadratic { .. } => "quadratic",
            Self::Power { .. } => "power",
            Self::Exponential { .. } => "exponential",
        }
    }

    pub fn coefficients(&self) -> Vec<f64> {
        match *self {
            Self::Scale { a } => vec![a],
            Self::Affine { a, b } | Self::Power { a, b } | Self::Exponential { a, b } => {
                vec![a, b]
            }
            Self::Quadratic { a, b, c } => vec![a, b, c],
        }
    }

    /// Rebuilds a function from its name and coefficients.
    pub fn from_parts(name: &str, coefficients: &[f64]) -> Option<Self> {
        match (name, coefficients) {
            ("scale", &[a]) => Some(Self::Scale { a }),
            ("affine", &[a, b]) => Some(Self::Affine { a, b }),
            ("quadratic", &[a, b, c]) => Some(Self::Quadratic { a, b, c }),
            ("power", &[a, b]) => Some(Self::Power { a, b }),
            ("exponential", &[a, b]) => Some(Self::Exponential { a, b }),
            _ => None,
        }
    }

    /// Number of coefficients expected for a function name.
    pub fn arity(name: &str) -> Option<usize> {
        match name {
            "scale" => Some(1),
            "affine" | "power" | "exponential" => Some(2),
            "quadratic" => Some(3),
            _ => None,
        }
    }

    /// Same function with new coefficients, in [`coefficients`](Self::coefficients) order.
    pub fn with_coefficients(&self, coefficients: &[f64]) -> Option<Self> {
        Self::from_parts(self.name(), coefficients)
    }

    pub fn apply(&self, x: f64) -> f64 {
        match *self {
            Self::Scale { a } => a * x,
            Self::Affine { a, b } => a * x + b,
            Self::Quadratic { a, b, c } => a * x * x + b * x + c,
            Self::Power { a, b } => a * x.powf(b),
            Self::Exponential { a, b } => a * (b * x).exp(),
        }
    }
}

/// Rendering of a number as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberFormat {
    /// Exactly `n` decimals.
    Fixed(u32),
    /// Rounded to at most `n` decimals, trailing zeros trimmed.
    Round(u32),
}

impl NumberFormat {
    pub fn name(self) -> &'static str {
        match self {
            Self::Fixed(_) => "fixed",
            Self::Round(_) => "round",
        }
    }

    pub fn decimals(self) -> u32 {
        match self {
            Self::Fixed(d) | Self::Round(d) => d,
        }
    }

    pub fn apply(self, value: f64) -> String {
        let decimals = self.decimals().min(MAX_DECIMALS) as usize;
        let fixed = format!("{value:.decimals$}");
        let text = match self {
            Self::Fixed(_) => fixed,
            Self::Round(_) if fixed.contains('.') => {
                fixed.trim_end_matches('0').trim_end_matches('.').to_string()
            }
            Self::Round(_) => fixed,
        };
        if text.starts_with('-') && text[1..].chars().all(|ch| ch == '0' || ch == '.') {
            text[1..].to_string()
        } else {
            text
        }
    }
}

/// A program expression over the implicit variable `input`.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Input,
    Text(String),
    Number(f64),
    Concat(Vec<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Token {
        expr: Box<Expr>,
        delimiter: String,
        index: i64,
    },
    Slice {
        expr: Box<Expr>,
        start: i64,
        end: Option<i64>,
    },
    Replace {
        expr: Box<Expr>,
        from: String,
        to: String,
    },
    Keep {
        expr: Box<Expr>,
        class: CharClass,
    },
    PadLeft {
        expr: Box<Expr>,
        width: usize,
        fill: char,
    },
    Numeric {
        expr: Box<Expr>,
        function: NumericFn,
    },
    Format {
        expr: Box<Expr>,
        format: NumberFormat,
    },
    CharCodes {
        expr: Box<Expr>,
        radix: u32,
        separator: String,
    },
    CharBits {
        expr: Box<Expr>,
        separator: String,
    },
    ToRadix {
        expr: Box<Expr>,
        radix: u32,
    },
    FromRadix {
        expr: Box<Expr>,
        radix: u32,
    },
    Caesar {
        expr: Box<Expr>,
        shift: i64,
    },
    Date {
        expr: Box<Expr>,
        from: String,
        to: String,
    },
    UnixTime {
        expr: Box<Expr>,
        format: String,
    },
}

impl Expr {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn unary(op: UnaryOp, expr: Expr) -> Self {
        Self::Unary(op, Box::new(expr))
    }

    pub fn token(expr: Expr, delimiter: &str, index: i64) -> Self {
        Self::Token {
            expr: Box::new(expr),
            delimiter: delimiter.to_string(),
            index,
        }
    }

    pub fn slice(expr: Expr, start: i64, end: Option<i64>) -> Self {
        Self::Slice {
            expr: Box::new(expr),
            start,
            end,
        }
    }

    /// Returns true if any node uses an algorithmic procedure.
    pub fn is_algorithmic(&self) -> bool {
        match self {
            Self::Input | Self::Text(_) | Self::Number(_) => false,
            Self::Concat(parts) => parts.iter().any(Self::is_algorithmic),
            Self::Unary(op, expr) => op.is_algorithmic() || expr.is_algorithmic(),
            Self::CharCodes { .. }
            | Self::CharBits { .. }
            | Self::ToRadix { .. }
            | Self::FromRadix { .. }
            | Self::Caesar { .. }
            | Self::Date { .. }
            | Self::UnixTime { .. } => true,
            Self::Token { expr, .. }
            | Self::Slice { expr, .. }
            | Self::Replace { expr, .. }
            | Self::Keep { expr, .. }
            | Self::PadLeft { expr, .. }
            | Self::Numeric { expr, .. }
            | Self::Format { expr, .. } => expr.is_algorithmic(),
        }
    }

    /// Number of nodes in the tree.
    pub fn size(&self) -> usize {
        match self {
            Self::Input | Self::Text(_) | Self::Number(_) => 1,
            Self::Concat(parts) => 1 + parts.iter().map(Self::size).sum::<usize>(),
            Self::Unary(_, expr)
            | Self::Token { expr, .. }
            | Self::Slice { expr, .. }
            | Self::Replace { expr, .. }
            | Self::Keep { expr, .. }
            | Self::PadLeft { expr, .. }
            | Self::Numeric { expr, .. }
            | Self::Format { expr, .. }
            | Self::CharCodes { expr, .. }
            | Self::CharBits { expr, .. }
            | Self::ToRadix { expr, .. }
            | Self::FromRadix { expr, .. }
            | Self::Caesar { expr, .. }
            | Self::Date { expr, .. }
            | Self::UnixTime { expr, .. } => 1 + expr.size(),
        }
    }
}

/// Runtime value: text or number.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Number(f64),
}

impl Value {
    /// Text form; numbers use the shared number formatting.
    pub fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Number(value) => format_number(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_format() {
        assert_eq!(NumberFormat::Fixed(4).apply(8.818400000000001), "8.8184");
        assert_eq!(NumberFormat::Fixed(0).apply(41.0), "41");
        assert_eq!(NumberFormat::Round(3).apply(2.5), "2.5");
        assert_eq!(NumberFormat::Round(2).apply(3.0), "3");
        assert_eq!(NumberFormat::Round(2).apply(-0.001), "0");
        assert_eq!(NumberFormat::Fixed(1).apply(-0.01), "0.0");
    }

    #[test]
    fn test_numeric_fn_parts() {
        let f = NumericFn::Affine { a: 1.8, b: 32.0 };
        assert_eq!(f.apply(100.0), 212.0);
        assert_eq!(NumericFn::from_parts("affine", &f.coefficients()), Some(f));
        assert_eq!(NumericFn::from_parts("affine", &[1.0]), None);
        assert_eq!(NumericFn::arity("quadratic"), Some(3));
    }

    #[test]
    fn test_names_round_trip() {
        for op in UnaryOp::ALL {
            assert_eq!(UnaryOp::from_name(op.name()), Some(op));
        }
        for class in CharClass::ALL {
            assert_eq!(CharClass::from_name(class.name()), Some(class));
        }
        assert!(!UnaryOp::Upper.is_algorithmic());
        assert!(UnaryOp::Sha256.is_algorithmic());
    }
}
