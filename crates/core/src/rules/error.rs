//! Rule configuration error types.
//!
//! Everything here is an authoring-time defect: malformed conditions and
//! structurally invalid rules are rejected when the catalog loads, never
//! discovered at match time.

use thiserror::Error;

/// Errors raised while loading and validating audit rules.
#[derive(Debug, Error)]
pub enum RuleError {
    /// A condition definition was not a JSON object.
    #[error("Condition definition must be a JSON object")]
    ConditionNotObject,

    /// A required condition field is missing or has the wrong type.
    #[error("Condition field '{0}' is missing or has the wrong type")]
    MissingConditionField(&'static str),

    /// The condition kind is not part of the closed predicate set.
    #[error("Unknown condition kind '{0}'")]
    UnknownConditionKind(String),

    /// The comparison operator is not one of >=, >, <=, <.
    #[error("Unknown comparison operator '{0}'")]
    UnknownOperator(String),

    /// A numeric literal could not be parsed as a decimal.
    #[error("Invalid numeric literal '{0}'")]
    InvalidNumber(String),

    /// An 'all' condition with no subconditions.
    #[error("'all' condition requires at least one subcondition")]
    EmptyConditionList,

    /// A membership condition with no allowed values.
    #[error("Membership condition requires at least one allowed value")]
    EmptyAllowedValues,

    /// A step condition used a composite predicate.
    #[error("Step conditions must be a single comparison, not 'all'")]
    CompositeStepCondition,

    /// A rule declaring no step templates.
    #[error("Rule '{0}' declares no steps")]
    EmptySteps(String),

    /// Trigger data supplied as something other than a JSON object.
    #[error("Trigger data must be a JSON object")]
    TriggerNotObject,

    /// A trigger field with a value type the engine cannot evaluate.
    #[error("Trigger field '{field}' has an unsupported value type")]
    UnsupportedTriggerValue {
        /// The offending field name.
        field: String,
    },
}

impl RuleError {
    /// Returns the HTTP status code for this error.
    ///
    /// Rule defects are reported to the configuration tooling that
    /// submitted them, so they map to client errors.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::TriggerNotObject | Self::UnsupportedTriggerValue { .. } => 400,
            _ => 422,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::ConditionNotObject => "CONDITION_NOT_OBJECT",
            Self::MissingConditionField(_) => "MISSING_CONDITION_FIELD",
            Self::UnknownConditionKind(_) => "UNKNOWN_CONDITION_KIND",
            Self::UnknownOperator(_) => "UNKNOWN_OPERATOR",
            Self::InvalidNumber(_) => "INVALID_NUMBER",
            Self::EmptyConditionList => "EMPTY_CONDITION_LIST",
            Self::EmptyAllowedValues => "EMPTY_ALLOWED_VALUES",
            Self::CompositeStepCondition => "COMPOSITE_STEP_CONDITION",
            Self::EmptySteps(_) => "EMPTY_STEPS",
            Self::TriggerNotObject => "TRIGGER_NOT_OBJECT",
            Self::UnsupportedTriggerValue { .. } => "UNSUPPORTED_TRIGGER_VALUE",
        }
    }
}
