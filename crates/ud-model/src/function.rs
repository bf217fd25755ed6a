//! Value-function tokens.
//!
//! Mapping rules carry a short function token (`num`, `>0`, `*1000`, `/4`, ...).
//! Tokens are parsed once when the mapping configuration is loaded so the
//! per-row engine only matches on [`ValueFunction`].

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Arithmetic operator of an arithmetic value function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl ArithmeticOp {
    fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '+' => Some(Self::Add),
            '-' => Some(Self::Subtract),
            '*' => Some(Self::Multiply),
            '/' => Some(Self::Divide),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Self::Add => '+',
            Self::Subtract => '-',
            Self::Multiply => '*',
            Self::Divide => '/',
        }
    }
}

/// A parsed value-function token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueFunction {
    /// `num`: keep values that parse as a real number.
    Number,
    /// Leading `>`: keep values that parse as a non-negative real number.
    NonNegative,
    /// Leading `+`, `-`, `*` or `/` followed by a decimal operand.
    Arithmetic { op: ArithmeticOp, operand: Decimal },
    /// Anything else. Values pass through unchanged.
    Unknown(String),
}

impl ValueFunction {
    /// Parse a raw token. Blank tokens mean "no function".
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }
        if token.eq_ignore_ascii_case("num") {
            return Some(Self::Number);
        }
        let mut chars = token.chars();
        let first = chars.next()?;
        if first == '>' {
            return Some(Self::NonNegative);
        }
        let Some(op) = ArithmeticOp::from_symbol(first) else {
            return Some(Self::Unknown(token.to_string()));
        };
        match Decimal::from_str(chars.as_str().trim()) {
            Ok(operand) => Some(Self::Arithmetic { op, operand }),
            Err(_) => Some(Self::Unknown(token.to_string())),
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown(_))
    }
}

impl fmt::Display for ValueFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number => f.write_str("num"),
            Self::NonNegative => f.write_str(">"),
            Self::Arithmetic { op, operand } => write!(f, "{}{}", op.symbol(), operand),
            Self::Unknown(token) => f.write_str(token),
        }
    }
}

impl Serialize for ValueFunction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Deserialize an optional function token, mapping blank strings to `None`.
pub(crate) fn deserialize_function<'de, D>(deserializer: D) -> Result<Option<ValueFunction>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(ValueFunction::parse))
}
