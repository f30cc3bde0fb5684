//! Transfer request validation
//!
//! Every rule is checked, so a rejection lists all violated fields at once.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;

use super::types::{RawTransferRequest, TransferRequest};

/// Required length of a currency code, in characters
pub const CURRENCY_CODE_LEN: usize = 3;

/// A single violated field constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: String,
}

impl FieldViolation {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.message)
    }
}

/// All violations found in one request. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    violations: Vec<FieldViolation>,
}

impl ValidationErrors {
    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// Whether `field` is among the violated fields
    pub fn has_field(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid transfer request: ")?;
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", v)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Validate a raw request into a [`TransferRequest`].
///
/// Rules:
/// 1. `idempotency_key` present and non-empty
/// 2. `source_account` present and non-empty
/// 3. `target_account` present and non-empty
/// 4. `amount` present, a JSON number, and > 0
/// 5. `currency` present and exactly 3 characters
///
/// Amounts are held as [`Decimal`], so a positive number outside its range
/// (magnitude above ~7.9e28, or finer than 1e-28) is rejected as out of range.
pub fn validate_transfer(raw: RawTransferRequest) -> Result<TransferRequest, ValidationErrors> {
    let idempotency_key = required_string("idempotency_key", raw.idempotency_key);
    let source_account = required_string("source_account", raw.source_account);
    let target_account = required_string("target_account", raw.target_account);
    let amount = positive_amount(raw.amount);
    let currency = currency_code(raw.currency);

    match (idempotency_key, source_account, target_account, amount, currency) {
        (Ok(idempotency_key), Ok(source_account), Ok(target_account), Ok(amount), Ok(currency)) => {
            Ok(TransferRequest {
                idempotency_key,
                source_account,
                target_account,
                amount,
                currency,
            })
        }
        (key, source, target, amount, currency) => Err(ValidationErrors {
            violations: [key.err(), source.err(), target.err(), amount.err(), currency.err()]
                .into_iter()
                .flatten()
                .collect(),
        }),
    }
}

fn required_string(field: &'static str, value: Option<String>) -> Result<String, FieldViolation> {
    match value {
        Some(s) if !s.is_empty() => Ok(s),
        Some(_) => Err(FieldViolation::new(field, "must not be empty")),
        None => Err(FieldViolation::new(field, "is required")),
    }
}

fn positive_amount(value: Option<serde_json::Value>) -> Result<Decimal, FieldViolation> {
    let number = match value {
        None | Some(serde_json::Value::Null) => {
            return Err(FieldViolation::new("amount", "is required"));
        }
        Some(serde_json::Value::Number(n)) => n,
        Some(_) => return Err(FieldViolation::new("amount", "must be a number")),
    };

    let text = number.to_string();
    let amount = Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| FieldViolation::new("amount", "is out of range"))?;

    if amount <= Decimal::ZERO {
        return Err(FieldViolation::new("amount", "must be greater than 0"));
    }
    Ok(amount)
}

fn currency_code(value: Option<String>) -> Result<String, FieldViolation> {
    match value {
        Some(code) if code.chars().count() == CURRENCY_CODE_LEN => Ok(code),
        Some(_) => Err(FieldViolation::new(
            "currency",
            format!("must be exactly {} characters", CURRENCY_CODE_LEN),
        )),
        None => Err(FieldViolation::new("currency", "is required")),
    }
}
