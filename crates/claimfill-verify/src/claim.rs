//! Claim-value arithmetic.
//!
//! The claim-value evaluator works with a small toolset: sum a list of
//! amounts, multiply a rate by a count, and compare a calculated total with
//! the claimed one. The same functions are exposed here so the check can be
//! reproduced deterministically and registered as a record rule.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use claimfill_contracts::audit::ClaimValueVerdict;
use claimfill_schema::{resolve, walker::is_unfilled_scalar};

use crate::engine::CustomVerifierFn;

/// Largest difference at which a claimed total still counts as correct.
pub const TOLERANCE: f64 = 1e-2;

static AMOUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?\d[\d,]*(?:\.\d+)?").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AmountError {
    #[error("'{0}' is not a number")]
    NotANumber(String),

    #[error("expected a bracketed list of numbers, got '{0}'")]
    NotAList(String),

    #[error("expected exactly two comma-separated values, got {0}")]
    WrongArity(usize),
}

/// Read the first amount in `text`, ignoring currency codes and thousands
/// separators: `"AED 407,174.85"` → `407174.85`.
pub fn parse_amount(text: &str) -> Option<f64> {
    let found = AMOUNT_RE.find(text)?;
    found.as_str().replace(',', "").parse().ok()
}

/// Sum a stringified list of numbers such as `"[1000, 2000.50]"`.
pub fn sum_values(list: &str) -> Result<f64, AmountError> {
    let inner = list
        .trim()
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| AmountError::NotAList(list.to_string()))?;
    if inner.trim().is_empty() {
        return Ok(0.0);
    }
    inner.split(',').map(number).sum()
}

/// Multiply the two values of `"a,b"`, e.g. `"11000,3"`.
pub fn multiply_values(pair: &str) -> Result<f64, AmountError> {
    let (a, b) = two_values(pair)?;
    Ok(a * b)
}

/// Compare a calculated total with the claimed one.
pub fn compare_claim(calculated: f64, claimed: f64) -> ClaimValueVerdict {
    let difference = (calculated - claimed).abs();
    if difference < TOLERANCE {
        ClaimValueVerdict::Correct
    } else {
        ClaimValueVerdict::Conflict {
            detail: format!(
                "Conflict: Claimed value {claimed} while Calculated value is {calculated}, \
                 with difference of {difference:.2}"
            ),
        }
    }
}

/// The evaluator's text form of [`compare_claim`], taking `"calculated,claimed"`.
pub fn check_claim_correct(pair: &str) -> Result<String, AmountError> {
    let (calculated, claimed) = two_values(pair)?;
    Ok(match compare_claim(calculated, claimed) {
        ClaimValueVerdict::Conflict { detail } => detail,
        _ => "The claim value is Correct.".to_string(),
    })
}

/// A custom record rule: the value at `path`, once filled, must read as an
/// amount.
pub fn amount_rule(path: impl Into<String>) -> CustomVerifierFn {
    let path = path.into();
    Box::new(move |record: &Value| {
        let value = resolve(record, &path).filter(|v| !is_unfilled_scalar(v))?;
        let readable = match value {
            Value::Number(_) => true,
            Value::String(s) => parse_amount(s).is_some(),
            _ => false,
        };
        (!readable).then(|| format!("field '{path}' holds {value}, which is not a monetary amount"))
    })
}

fn number(raw: &str) -> Result<f64, AmountError> {
    let cleaned = raw.trim().trim_matches(|c| c == '\'' || c == '"');
    cleaned.parse().map_err(|_| AmountError::NotANumber(raw.trim().to_string()))
}

fn two_values(pair: &str) -> Result<(f64, f64), AmountError> {
    let parts: Vec<&str> = pair.split(',').collect();
    match parts.as_slice() {
        [a, b] => Ok((number(a)?, number(b)?)),
        _ => Err(AmountError::WrongArity(parts.len())),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn amounts_are_read_through_currency_and_separators() {
        assert_eq!(parse_amount("AED 407,174.85"), Some(407174.85));
        assert_eq!(parse_amount("25000"), Some(25000.0));
        assert_eq!(parse_amount("USD -12.50 refund"), Some(-12.5));
        assert_eq!(parse_amount("not stated"), None);
    }

    #[test]
    fn sums_and_products() {
        assert_eq!(sum_values("[1000, 2000, 3000]").unwrap(), 6000.0);
        assert_eq!(sum_values("[]").unwrap(), 0.0);
        assert!(matches!(sum_values("1000, 2000"), Err(AmountError::NotAList(_))));
        assert!(matches!(sum_values("[1000, abc]"), Err(AmountError::NotANumber(_))));

        assert_eq!(multiply_values("11000,3").unwrap(), 33000.0);
        assert_eq!(multiply_values("'11000', \"3\"").unwrap(), 33000.0);
        assert_eq!(multiply_values("1,2,3"), Err(AmountError::WrongArity(3)));
    }

    #[test]
    fn breakdown_that_does_not_add_up_is_a_conflict() {
        let breakdown = "[75000, 25000, 262174.85, 45000]";
        let calculated = sum_values(breakdown).unwrap();
        assert!((calculated - 407174.85).abs() < TOLERANCE);

        let message = check_claim_correct(&format!("{calculated},307174.85")).unwrap();
        assert!(message.starts_with("Conflict: Claimed value 307174.85"));
        assert!(message.ends_with("difference of 100000.00"));

        assert_eq!(check_claim_correct("407174.85,407174.85").unwrap(), "The claim value is Correct.");
        assert_eq!(compare_claim(100.0, 100.005), ClaimValueVerdict::Correct);
    }

    #[test]
    fn amount_rule_flags_unreadable_values_only() {
        let rule = amount_rule("claim_details.claim_value");
        assert_eq!(rule(&json!({ "claim_details": { "claim_value": "AED 307,174.85" } })), None);
        assert_eq!(rule(&json!({ "claim_details": { "claim_value": 307174.85 } })), None);
        assert_eq!(rule(&json!({ "claim_details": { "claim_value": "" } })), None);
        assert!(rule(&json!({ "claim_details": { "claim_value": "a lot" } })).is_some());
    }
}
