//! Trigger condition predicates.
//!
//! Conditions form a small closed AST, parsed and validated once when a
//! rule is loaded. Evaluation is a pure function of (condition, trigger
//! data): a field that is absent from the trigger data makes the
//! predicate false rather than raising an error.

use std::fmt;

use rust_decimal::Decimal;
use serde_json::Value;

use super::error::RuleError;
use super::types::{TriggerData, decimal_from_number};

/// Comparison operator for numeric predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// Greater than or equal.
    Ge,
    /// Strictly greater than.
    Gt,
    /// Less than or equal.
    Le,
    /// Strictly less than.
    Lt,
}

impl CompareOp {
    /// Returns the string representation of the operator.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ge => ">=",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Lt => "<",
        }
    }

    /// Parses an operator from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            ">=" => Some(Self::Ge),
            ">" => Some(Self::Gt),
            "<=" => Some(Self::Le),
            "<" => Some(Self::Lt),
            _ => None,
        }
    }

    /// Applies the operator to two decimals.
    #[must_use]
    pub fn compare(self, lhs: Decimal, rhs: Decimal) -> bool {
        match self {
            Self::Ge => lhs >= rhs,
            Self::Gt => lhs > rhs,
            Self::Le => lhs <= rhs,
            Self::Lt => lhs < rhs,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A trigger condition predicate.
///
/// The set is closed: rules cannot carry arbitrary expressions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Compare a single numeric field against a constant.
    Threshold {
        /// Trigger field holding the value.
        field: String,
        /// Comparison operator.
        op: CompareOp,
        /// Constant to compare against.
        value: Decimal,
    },
    /// Compare the signed percentage change between two fields against a
    /// constant. The change is `(to - from) / from * 100`; a zero or
    /// missing `from` evaluates false.
    PercentageChange {
        /// Trigger field holding the original value.
        from_field: String,
        /// Trigger field holding the new value.
        to_field: String,
        /// Comparison operator.
        op: CompareOp,
        /// Percentage constant to compare against (signed).
        threshold_percent: Decimal,
    },
    /// A text field must be one of a fixed set of values.
    SetMembership {
        /// Trigger field holding the value.
        field: String,
        /// Allowed values.
        allowed: Vec<String>,
    },
    /// Every subcondition must hold.
    All(Vec<Condition>),
}

impl Condition {
    /// Parses a condition definition from JSON.
    ///
    /// Called once at catalog load time; malformed definitions become
    /// `RuleError`s here instead of silent always-false behavior at
    /// match time.
    ///
    /// # Errors
    ///
    /// Returns `RuleError` describing the first structural defect found.
    pub fn parse(value: &Value) -> Result<Self, RuleError> {
        let object = value.as_object().ok_or(RuleError::ConditionNotObject)?;
        let kind = object
            .get("kind")
            .and_then(Value::as_str)
            .ok_or(RuleError::MissingConditionField("kind"))?;

        match kind {
            "threshold" => Ok(Self::Threshold {
                field: require_str(object, "field")?,
                op: require_op(object)?,
                value: require_decimal(object, "value")?,
            }),
            "percentage_change" => Ok(Self::PercentageChange {
                from_field: require_str(object, "from_field")?,
                to_field: require_str(object, "to_field")?,
                op: require_op(object)?,
                threshold_percent: require_decimal(object, "threshold_percent")?,
            }),
            "set_membership" => {
                let raw = object
                    .get("allowed")
                    .and_then(Value::as_array)
                    .ok_or(RuleError::MissingConditionField("allowed"))?;
                let allowed: Vec<String> = raw
                    .iter()
                    .map(|v| {
                        v.as_str()
                            .map(ToString::to_string)
                            .ok_or(RuleError::MissingConditionField("allowed"))
                    })
                    .collect::<Result<_, _>>()?;
                if allowed.is_empty() {
                    return Err(RuleError::EmptyAllowedValues);
                }
                Ok(Self::SetMembership {
                    field: require_str(object, "field")?,
                    allowed,
                })
            }
            "all" => {
                let raw = object
                    .get("conditions")
                    .and_then(Value::as_array)
                    .ok_or(RuleError::MissingConditionField("conditions"))?;
                if raw.is_empty() {
                    return Err(RuleError::EmptyConditionList);
                }
                let conditions = raw.iter().map(Self::parse).collect::<Result<_, _>>()?;
                Ok(Self::All(conditions))
            }
            other => Err(RuleError::UnknownConditionKind(other.to_string())),
        }
    }

    /// Parses a step condition, which must be a single comparison.
    ///
    /// # Errors
    ///
    /// Returns `RuleError::CompositeStepCondition` for an 'all' condition,
    /// or any parse error from [`Condition::parse`].
    pub fn parse_comparison(value: &Value) -> Result<Self, RuleError> {
        match Self::parse(value)? {
            Self::All(_) => Err(RuleError::CompositeStepCondition),
            condition => Ok(condition),
        }
    }

    /// Evaluates the condition against trigger data.
    ///
    /// Pure: no hidden state, deterministic for fixed inputs.
    #[must_use]
    pub fn evaluate(&self, trigger: &TriggerData) -> bool {
        match self {
            Self::Threshold { field, op, value } => trigger
                .number(field)
                .is_some_and(|actual| op.compare(actual, *value)),
            Self::PercentageChange {
                from_field,
                to_field,
                op,
                threshold_percent,
            } => {
                let (Some(from), Some(to)) =
                    (trigger.number(from_field), trigger.number(to_field))
                else {
                    return false;
                };
                percentage_change(from, to)
                    .is_some_and(|change| op.compare(change, *threshold_percent))
            }
            Self::SetMembership { field, allowed } => trigger
                .text(field)
                .is_some_and(|actual| allowed.iter().any(|v| v == actual)),
            Self::All(conditions) => conditions.iter().all(|c| c.evaluate(trigger)),
        }
    }
}

/// Signed percentage change from `from` to `to`, or `None` when undefined.
fn percentage_change(from: Decimal, to: Decimal) -> Option<Decimal> {
    if from.is_zero() {
        return None;
    }
    to.checked_sub(from)?
        .checked_div(from)?
        .checked_mul(Decimal::ONE_HUNDRED)
}

fn require_str(
    object: &serde_json::Map<String, Value>,
    field: &'static str,
) -> Result<String, RuleError> {
    object
        .get(field)
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .ok_or(RuleError::MissingConditionField(field))
}

fn require_op(object: &serde_json::Map<String, Value>) -> Result<CompareOp, RuleError> {
    let raw = object
        .get("op")
        .and_then(Value::as_str)
        .ok_or(RuleError::MissingConditionField("op"))?;
    CompareOp::parse(raw).ok_or_else(|| RuleError::UnknownOperator(raw.to_string()))
}

/// Accepts a JSON number or a numeric string.
fn require_decimal(
    object: &serde_json::Map<String, Value>,
    field: &'static str,
) -> Result<Decimal, RuleError> {
    match object.get(field) {
        Some(Value::Number(n)) => decimal_from_number(n),
        Some(Value::String(s)) => s
            .parse::<Decimal>()
            .map_err(|_| RuleError::InvalidNumber(s.clone())),
        _ => Err(RuleError::MissingConditionField(field)),
    }
}
