//! Restricted program dialect.
//!
//! Learned transformations are stored as source text in a small expression
//! language over one implicit variable, `input`. Programs are pure: there is
//! no file, network or process access, and evaluation errors are values.
//!
//! ```text
//! concat(capitalize(token(input, " ", -1)), ", ", upper(slice(input, 0, 1)), ".")
//! fixed(scale(number(input), 0.44092), 4)
//! date(input, "%Y-%m-%d", "%d/%m/%Y")
//! ```

pub mod ast;
mod eval;
pub mod ops;
mod parse;
mod print;

use std::fmt;
use std::str::FromStr;

pub use ast::{
    CharClass, Expr, MAX_DECIMALS, MAX_DEPTH, MAX_PAD_WIDTH, NumberFormat, NumericFn, UnaryOp,
    Value,
};
pub use parse::parse;

use crate::error::{EvalError, ParseError};

/// A parsed, executable program.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    expr: Expr,
}

impl Program {
    pub fn new(expr: Expr) -> Self {
        Self { expr }
    }

    /// Parses program text.
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        parse(source).map(Self::new)
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Source text of the program.
    pub fn code(&self) -> String {
        self.expr.to_string()
    }

    /// Runs the program on one value.
    pub fn run(&self, input: &str) -> Result<String, EvalError> {
        self.expr.eval_text(input)
    }

    /// Returns true if the program reproduces every `(source, target)` pair.
    pub fn reproduces<'a>(&self, pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> bool {
        pairs
            .into_iter()
            .all(|(source, target)| self.run(source).is_ok_and(|out| out == target))
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.expr.fmt(f)
    }
}

impl FromStr for Program {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
