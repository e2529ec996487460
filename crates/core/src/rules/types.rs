//! Rule domain types: audit categories and trigger data.
//!
//! Trigger data is the bag of named field values describing a business
//! event. Rule and step conditions are evaluated against it.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::RuleError;

/// Business event category an audit rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditCategory {
    /// Contract amount change.
    AmountChange,
    /// Quote submitted for approval.
    QuoteApproval,
    /// Payment submitted for approval.
    PaymentApproval,
    /// Bank-remittance confirmation flow.
    FlowApproval,
    /// Generic template-driven approval.
    GenericTemplate,
}

impl AuditCategory {
    /// Returns the string representation of the category.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AmountChange => "amount_change",
            Self::QuoteApproval => "quote_approval",
            Self::PaymentApproval => "payment_approval",
            Self::FlowApproval => "flow_approval",
            Self::GenericTemplate => "generic_template",
        }
    }

    /// Parses a category from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "amount_change" => Some(Self::AmountChange),
            "quote_approval" => Some(Self::QuoteApproval),
            "payment_approval" => Some(Self::PaymentApproval),
            "flow_approval" => Some(Self::FlowApproval),
            "generic_template" => Some(Self::GenericTemplate),
            _ => None,
        }
    }
}

impl fmt::Display for AuditCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single trigger field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerValue {
    /// A numeric value (amounts, percentages, counts).
    Number(Decimal),
    /// A text value (enums, references).
    Text(String),
}

/// Named field values describing a business event.
///
/// A field that is absent evaluates every predicate over it to false
/// (fail-closed, never fail-open).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerData {
    fields: BTreeMap<String, TriggerValue>,
}

impl TriggerData {
    /// Creates empty trigger data.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a numeric field (builder style).
    #[must_use]
    pub fn with_number(mut self, field: &str, value: Decimal) -> Self {
        self.fields
            .insert(field.to_string(), TriggerValue::Number(value));
        self
    }

    /// Adds a text field (builder style).
    #[must_use]
    pub fn with_text(mut self, field: &str, value: &str) -> Self {
        self.fields
            .insert(field.to_string(), TriggerValue::Text(value.to_string()));
        self
    }

    /// Returns the numeric value of a field, if present and numeric.
    #[must_use]
    pub fn number(&self, field: &str) -> Option<Decimal> {
        match self.fields.get(field) {
            Some(TriggerValue::Number(n)) => Some(*n),
            _ => None,
        }
    }

    /// Returns the text value of a field, if present and textual.
    #[must_use]
    pub fn text(&self, field: &str) -> Option<&str> {
        match self.fields.get(field) {
            Some(TriggerValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Returns true if no fields are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Builds trigger data from a JSON object supplied by a business module.
    ///
    /// Numbers become `Decimal` (exact, via their textual form), strings
    /// become text. Any other value type is rejected.
    ///
    /// # Errors
    ///
    /// Returns `RuleError` if the value is not an object or a field has an
    /// unsupported type.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, RuleError> {
        let object = value.as_object().ok_or(RuleError::TriggerNotObject)?;
        let mut data = Self::new();
        for (field, raw) in object {
            let parsed = match raw {
                serde_json::Value::Number(n) => TriggerValue::Number(decimal_from_number(n)?),
                serde_json::Value::String(s) => TriggerValue::Text(s.clone()),
                _ => {
                    return Err(RuleError::UnsupportedTriggerValue {
                        field: field.clone(),
                    });
                }
            };
            data.fields.insert(field.clone(), parsed);
        }
        Ok(data)
    }
}

/// Converts a JSON number to `Decimal` through its exact textual form.
pub(crate) fn decimal_from_number(n: &serde_json::Number) -> Result<Decimal, RuleError> {
    let raw = n.to_string();
    Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .map_err(|_| RuleError::InvalidNumber(raw))
}
