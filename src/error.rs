use std::fmt;

use thiserror::Error;

use crate::CelestialBody;

// ---------------------------
// ## Error Handling
// ---------------------------

/// Error reported by an ephemeris provider for a single body.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("calculation error {code}: {message}")]
pub struct CalculationError {
    pub code: i32,
    pub message: String,
}

impl CalculationError {
    /// The provider produced NaN or infinity.
    pub const OUT_OF_DOMAIN: i32 = -1;
    /// The instant lies outside the span the provider covers.
    pub const OUT_OF_RANGE: i32 = -2;
    /// No answer arrived before the resolve deadline.
    pub const TIMEOUT: i32 = -3;
    /// The worker computing the body went away without answering.
    pub const WORKER_LOST: i32 = -4;

    pub fn new(code: i32, message: impl Into<String>) -> Self {
        CalculationError {
            code,
            message: message.into(),
        }
    }
}

/// Input field a validation failure refers to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InputField {
    Name,
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Date,
    Time,
    Region,
    Bodies,
}

impl fmt::Display for InputField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let field_str = match self {
            InputField::Name => "name",
            InputField::Year => "year",
            InputField::Month => "month",
            InputField::Day => "day",
            InputField::Hour => "hour",
            InputField::Minute => "minute",
            InputField::Date => "date",
            InputField::Time => "time",
            InputField::Region => "region",
            InputField::Bodies => "bodies",
        };
        write!(f, "{}", field_str)
    }
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("invalid {field}: {reason}")]
    InvalidInput { field: InputField, reason: String },

    #[error("failed to resolve {body} position: {source}")]
    PositionResolution {
        body: CelestialBody,
        #[source]
        source: CalculationError,
    },

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl ProfileError {
    pub fn invalid(field: InputField, reason: impl Into<String>) -> Self {
        ProfileError::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    pub fn position(body: CelestialBody, source: CalculationError) -> Self {
        ProfileError::PositionResolution { body, source }
    }

    /// True for failures the caller can fix by correcting the input.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ProfileError::InvalidInput { .. })
    }
}

impl From<config::ConfigError> for ProfileError {
    fn from(err: config::ConfigError) -> Self {
        ProfileError::Configuration(err.to_string())
    }
}

pub type Result<T, E = ProfileError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_field_and_body() {
        let err = ProfileError::invalid(InputField::Month, "must be between 1 and 12");
        assert_eq!(err.to_string(), "invalid month: must be between 1 and 12");
        assert!(err.is_recoverable());

        let err = ProfileError::position(
            CelestialBody::Mars,
            CalculationError::new(CalculationError::TIMEOUT, "no answer"),
        );
        assert_eq!(
            err.to_string(),
            "failed to resolve Mars position: calculation error -3: no answer"
        );
        assert!(!err.is_recoverable());
    }
}
