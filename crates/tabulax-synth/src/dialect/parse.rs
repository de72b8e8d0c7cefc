//! Recursive-descent parser for program text.

use super::ast::{
    CharClass, Expr, MAX_DECIMALS, MAX_DEPTH, MAX_PAD_WIDTH, NumberFormat, NumericFn, UnaryOp,
};
use crate::error::ParseError;

type Result<T> = std::result::Result<T, ParseError>;

/// Parses program text into an expression.
///
/// Errors carry the byte offset of the offending token. Calls nest at most
/// [`MAX_DEPTH`] deep.
pub fn parse(source: &str) -> Result<Expr> {
    let mut parser = Parser {
        source,
        pos: 0,
        depth: 0,
    };
    let node = parser.node()?;
    parser.skip_whitespace();
    if parser.pos < source.len() {
        return Err(ParseError::new(parser.pos, "unexpected trailing input"));
    }
    lower(node)
}

// ============================================================================
// Syntax
// ============================================================================

#[derive(Debug)]
struct Node {
    kind: NodeKind,
    offset: usize,
}

#[derive(Debug)]
enum NodeKind {
    Call { name: String, args: Vec<Node> },
    Ident(String),
    Str(String),
    Num(String),
}

struct Parser<'a> {
    source: &'a str,
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &str {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
        &self.source[start..self.pos]
    }

    fn node(&mut self) -> Result<Node> {
        self.skip_whitespace();
        let offset = self.pos;
        let kind = match self.peek() {
            Some('"') => NodeKind::Str(self.string()?),
            Some(ch) if ch == '-' || ch == '.' || ch.is_ascii_digit() => {
                NodeKind::Num(self.number()?)
            }
            Some(ch) if ch.is_ascii_alphabetic() || ch == '_' => {
                let name = self
                    .take_while(|ch| ch.is_ascii_alphanumeric() || ch == '_')
                    .to_string();
                self.skip_whitespace();
                if self.peek() == Some('(') {
                    self.bump();
                    if self.depth >= MAX_DEPTH {
                        return Err(ParseError::new(offset, "nesting too deep"));
                    }
                    self.depth += 1;
                    let args = self.arguments()?;
                    self.depth -= 1;
                    NodeKind::Call { name, args }
                } else {
                    NodeKind::Ident(name)
                }
            }
            Some(ch) => {
                return Err(ParseError::new(offset, format!("unexpected character {ch:?}")));
            }
            None => return Err(ParseError::new(offset, "unexpected end of input")),
        };
        Ok(Node { kind, offset })
    }

    fn arguments(&mut self) -> Result<Vec<Node>> {
        let mut args = Vec::new();
        self.skip_whitespace();
        if self.peek() == Some(')') {
            self.bump();
            return Ok(args);
        }
        loop {
            args.push(self.node()?);
            self.skip_whitespace();
            let at = self.pos;
            match self.bump() {
                Some(',') => {}
                Some(')') => return Ok(args),
                Some(_) => return Err(ParseError::new(at, "expected ',' or ')'")),
                None => return Err(ParseError::new(at, "unclosed argument list")),
            }
        }
    }

    fn string(&mut self) -> Result<String> {
        let start = self.pos;
        self.bump();
        let mut out = String::new();
        loop {
            let at = self.pos;
            match self.bump() {
                Some('"') => return Ok(out),
                Some('\\') => match self.bump() {
                    Some('"') => out.push('"'),
                    Some('\\') => out.push('\\'),
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('u') => out.push(self.unicode_escape(at)?),
                    _ => return Err(ParseError::new(at, "invalid escape")),
                },
                Some(ch) => out.push(ch),
                None => return Err(ParseError::new(start, "unterminated string")),
            }
        }
    }

    fn unicode_escape(&mut self, at: usize) -> Result<char> {
        if self.bump() != Some('{') {
            return Err(ParseError::new(at, "expected '{' after \\u"));
        }
        let digits = self.take_while(|ch| ch.is_ascii_hexdigit()).to_string();
        if self.bump() != Some('}') {
            return Err(ParseError::new(at, "expected '}' in unicode escape"));
        }
        u32::from_str_radix(&digits, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| ParseError::new(at, "invalid unicode escape"))
    }

    fn number(&mut self) -> Result<String> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.bump();
        }
        let mut previous = ' ';
        while let Some(ch) = self.peek() {
            let accepted = ch.is_ascii_digit()
                || ch == '.'
                || ch == 'e'
                || ch == 'E'
                || (matches!(ch, '+' | '-') && matches!(previous, 'e' | 'E'));
            if !accepted {
                break;
            }
            previous = ch;
            self.bump();
        }
        let raw = &self.source[start..self.pos];
        match raw.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(raw.to_string()),
            _ => Err(ParseError::new(start, format!("invalid number {raw:?}"))),
        }
    }
}

// ============================================================================
// Lowering
// ============================================================================

fn lower(node: Node) -> Result<Expr> {
    match node.kind {
        NodeKind::Ident(name) if name == "input" => Ok(Expr::Input),
        NodeKind::Ident(name) => Err(ParseError::new(
            node.offset,
            format!("unknown identifier `{name}`"),
        )),
        NodeKind::Str(text) => Ok(Expr::Text(text)),
        NodeKind::Num(raw) => parse_float(&raw, node.offset).map(Expr::Number),
        NodeKind::Call { name, args } => lower_call(&name, args, node.offset),
    }
}

fn lower_call(name: &str, args: Vec<Node>, offset: usize) -> Result<Expr> {
    let mut args = Args {
        name,
        offset,
        nodes: args.into_iter(),
    };

    if let Some(op) = UnaryOp::from_name(name) {
        let expr = args.expr()?;
        args.finish()?;
        return Ok(Expr::Unary(op, expr));
    }
    if let Some(arity) = NumericFn::arity(name) {
        let expr = args.expr()?;
        let coefficients = (0..arity)
            .map(|_| args.float())
            .collect::<Result<Vec<_>>>()?;
        args.finish()?;
        let function = NumericFn::from_parts(name, &coefficients)
            .ok_or_else(|| ParseError::new(offset, format!("{name}: bad coefficients")))?;
        return Ok(Expr::Numeric { expr, function });
    }

    let expr = match name {
        "concat" => {
            let mut parts = Vec::new();
            while args.remaining() > 0 {
                parts.push(*args.expr()?);
            }
            if parts.is_empty() {
                return Err(ParseError::new(offset, "concat: expected at least one argument"));
            }
            Expr::Concat(parts)
        }
        "token" => Expr::Token {
            expr: args.expr()?,
            delimiter: args.string()?,
            index: args.int()?,
        },
        "slice" => Expr::Slice {
            expr: args.expr()?,
            start: args.int()?,
            end: if args.remaining() > 0 {
                Some(args.int()?)
            } else {
                None
            },
        },
        "replace" => Expr::Replace {
            expr: args.expr()?,
            from: args.string()?,
            to: args.string()?,
        },
        "keep" => {
            let expr = args.expr()?;
            let (class, at) = args.ident()?;
            let class = CharClass::from_name(&class)
                .ok_or_else(|| ParseError::new(at, format!("unknown character class `{class}`")))?;
            Expr::Keep { expr, class }
        }
        "pad_left" => {
            let expr = args.expr()?;
            let width = args.bounded("width", MAX_PAD_WIDTH)?;
            let at = args.next_offset();
            let fill = args.string()?;
            let mut chars = fill.chars();
            let fill = match (chars.next(), chars.next()) {
                (Some(ch), None) => ch,
                _ => return Err(ParseError::new(at, "pad_left: fill must be one character")),
            };
            Expr::PadLeft { expr, width, fill }
        }
        "fixed" | "round" => {
            let expr = args.expr()?;
            let decimals = args.bounded("decimals", MAX_DECIMALS)?;
            let format = if name == "fixed" {
                NumberFormat::Fixed(decimals)
            } else {
                NumberFormat::Round(decimals)
            };
            Expr::Format { expr, format }
        }
        "char_codes" => Expr::CharCodes {
            expr: args.expr()?,
            radix: args.radix()?,
            separator: args.string()?,
        },
        "char_bits" => Expr::CharBits {
            expr: args.expr()?,
            separator: args.string()?,
        },
        "to_radix" => Expr::ToRadix {
            expr: args.expr()?,
            radix: args.radix()?,
        },
        "from_radix" => Expr::FromRadix {
            expr: args.expr()?,
            radix: args.radix()?,
        },
        "caesar" => Expr::Caesar {
            expr: args.expr()?,
            shift: args.int()?,
        },
        "date" => Expr::Date {
            expr: args.expr()?,
            from: args.string()?,
            to: args.string()?,
        },
        "unix_time" => Expr::UnixTime {
            expr: args.expr()?,
            format: args.string()?,
        },
        _ => {
            return Err(ParseError::new(offset, format!("unknown function `{name}`")));
        }
    };
    args.finish()?;
    Ok(expr)
}

fn parse_float(raw: &str, offset: usize) -> Result<f64> {
    raw.parse()
        .map_err(|_| ParseError::new(offset, format!("invalid number {raw:?}")))
}

/// Typed access to call arguments.
struct Args<'a> {
    name: &'a str,
    offset: usize,
    nodes: std::vec::IntoIter<Node>,
}

impl Args<'_> {
    fn remaining(&self) -> usize {
        self.nodes.len()
    }

    fn next_offset(&self) -> usize {
        self.nodes.as_slice().first().map_or(self.offset, |n| n.offset)
    }

    fn next(&mut self) -> Result<Node> {
        self.nodes.next().ok_or_else(|| {
            ParseError::new(self.offset, format!("{}: missing argument", self.name))
        })
    }

    fn expr(&mut self) -> Result<Box<Expr>> {
        lower(self.next()?).map(Box::new)
    }

    fn string(&mut self) -> Result<String> {
        let node = self.next()?;
        match node.kind {
            NodeKind::Str(text) => Ok(text),
            _ => Err(self.expected(node.offset, "string literal")),
        }
    }

    fn ident(&mut self) -> Result<(String, usize)> {
        let node = self.next()?;
        match node.kind {
            NodeKind::Ident(name) => Ok((name, node.offset)),
            _ => Err(self.expected(node.offset, "name")),
        }
    }

    fn int(&mut self) -> Result<i64> {
        let node = self.next()?;
        match node.kind {
            NodeKind::Num(raw) => raw
                .parse()
                .map_err(|_| self.expected(node.offset, "integer")),
            _ => Err(self.expected(node.offset, "integer")),
        }
    }

    fn unsigned<T: TryFrom<i64>>(&mut self) -> Result<T> {
        let offset = self.next_offset();
        let value = self.int()?;
        T::try_from(value).map_err(|_| self.expected(offset, "non-negative integer"))
    }

    fn bounded<T>(&mut self, what: &str, max: T) -> Result<T>
    where
        T: TryFrom<i64> + PartialOrd + std::fmt::Display,
    {
        let offset = self.next_offset();
        let value: T = self.unsigned()?;
        if value > max {
            return Err(ParseError::new(
                offset,
                format!("{}: {what} must be at most {max}", self.name),
            ));
        }
        Ok(value)
    }

    fn radix(&mut self) -> Result<u32> {
        let offset = self.next_offset();
        let radix: u32 = self.unsigned()?;
        if (2..=36).contains(&radix) {
            Ok(radix)
        } else {
            Err(ParseError::new(offset, format!("{}: radix must be 2..=36", self.name)))
        }
    }

    fn float(&mut self) -> Result<f64> {
        let node = self.next()?;
        match node.kind {
            NodeKind::Num(raw) => parse_float(&raw, node.offset),
            _ => Err(self.expected(node.offset, "number")),
        }
    }

    fn expected(&self, offset: usize, what: &str) -> ParseError {
        ParseError::new(offset, format!("{}: expected {what}", self.name))
    }

    fn finish(mut self) -> Result<()> {
        match self.nodes.next() {
            Some(extra) => Err(ParseError::new(
                extra.offset,
                format!("{}: too many arguments", self.name),
            )),
            None => Ok(()),
        }
    }
}
