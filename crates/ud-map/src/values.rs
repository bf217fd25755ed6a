//! Value functions applied to raw cells.

use std::str::FromStr;

use rust_decimal::Decimal;
use tracing::warn;

use ud_model::{ArithmeticOp, MappingRule, PropertyConfig, ValueFunction};

/// Value written for blank cells and for functions without a fallback.
pub const ZERO: &str = "0";

/// Parse a real number the way source feeds write them.
///
/// Only finite values count; `inf` and `nan` spellings are rejected.
pub fn parse_number(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
}

/// True for `-?\d+(\.\d+)?`.
pub fn is_plain_decimal(value: &str) -> bool {
    let digits = value.strip_prefix('-').unwrap_or(value);
    let (integer, fraction) = match digits.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (digits, None),
    };
    let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    all_digits(integer) && fraction.is_none_or(all_digits)
}

/// Applies mapping-rule value functions to raw cells.
#[derive(Debug, Clone, Copy)]
pub struct ValueEngine<'a> {
    config: &'a PropertyConfig,
}

impl<'a> ValueEngine<'a> {
    pub fn new(config: &'a PropertyConfig) -> Self {
        Self { config }
    }

    /// Output value for `raw` read under canonical `name`.
    ///
    /// Commas become dots and the value is trimmed; blank values yield `"0"`.
    /// Names without a rule, or rules without a function, pass through.
    pub fn apply(&self, name: &str, raw: &str) -> String {
        let value = raw.replace(',', ".").trim().to_string();
        if value.is_empty() {
            return ZERO.to_string();
        }
        let Some(rule) = self.config.rule_for(name) else {
            return value;
        };
        let Some(function) = &rule.function else {
            return value;
        };
        evaluate(function, rule, name, value)
    }
}

fn alternative(rule: &MappingRule) -> String {
    rule.alternative_value
        .clone()
        .unwrap_or_else(|| ZERO.to_string())
}

fn evaluate(function: &ValueFunction, rule: &MappingRule, name: &str, value: String) -> String {
    match function {
        ValueFunction::Number => {
            if parse_number(&value).is_some() {
                value
            } else {
                alternative(rule)
            }
        }
        ValueFunction::NonNegative => match parse_number(&value) {
            Some(number) if number >= 0.0 => value,
            _ => alternative(rule),
        },
        ValueFunction::Arithmetic { op, operand } => {
            if !is_plain_decimal(&value) {
                return value;
            }
            match arithmetic(*op, &value, *operand) {
                Some(result) => result,
                None => {
                    warn!(
                        name = %name,
                        value = %value,
                        function = %function,
                        "arithmetic function not applicable, value passes through"
                    );
                    value
                }
            }
        }
        ValueFunction::Unknown(_) => value,
    }
}

fn arithmetic(op: ArithmeticOp, value: &str, operand: Decimal) -> Option<String> {
    let input = Decimal::from_str(value).ok()?;
    let result = match op {
        ArithmeticOp::Add => input.checked_add(operand),
        ArithmeticOp::Subtract => input.checked_sub(operand),
        ArithmeticOp::Multiply => input.checked_mul(operand),
        ArithmeticOp::Divide => input.checked_div(operand),
    }?;
    Some(format_decimal(result))
}

/// Integral results render without a fractional part.
fn format_decimal(value: Decimal) -> String {
    if value.fract().is_zero() {
        value.trunc().normalize().to_string()
    } else {
        value.to_string()
    }
}
