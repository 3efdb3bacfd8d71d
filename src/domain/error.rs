use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum AppError {
    /// The uploaded bytes could not be read as a spreadsheet.
    Decode(String),
    /// The first sheet has no header from which a phone column can be chosen.
    NoPhoneColumn,
    /// The job would cost more than the account holds. Nothing was charged.
    InsufficientCredits { required: f64, available: f64 },
    InvalidInput(String),
    NotFound(String),
    DatabaseError(String),
    IoError(String),
    Internal(String),
}

impl AppError {
    /// Short machine-readable name, used as the `error` field of API responses.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Decode(_) => "decode_error",
            AppError::NoPhoneColumn => "no_phone_column",
            AppError::InsufficientCredits { .. } => "insufficient_credits",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::NotFound(_) => "not_found",
            AppError::DatabaseError(_) => "database_error",
            AppError::IoError(_) => "io_error",
            AppError::Internal(_) => "internal",
        }
    }

    pub fn shortfall(&self) -> Option<f64> {
        match self {
            AppError::InsufficientCredits {
                required,
                available,
            } => Some(required - available),
            _ => None,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Decode(msg) => write!(f, "Decode error: {}", msg),
            AppError::NoPhoneColumn => write!(f, "Could not identify a phone number column"),
            AppError::InsufficientCredits {
                required,
                available,
            } => write!(
                f,
                "Not enough credits: {} required, {} available",
                required, available
            ),
            AppError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppError::IoError(msg) => write!(f, "IO error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_credits_reports_shortfall() {
        let err = AppError::InsufficientCredits {
            required: 15000.0,
            available: 10000.0,
        };
        assert_eq!(err.kind(), "insufficient_credits");
        assert_eq!(err.shortfall(), Some(5000.0));
        assert_eq!(
            err.to_string(),
            "Not enough credits: 15000 required, 10000 available"
        );
    }

    #[test]
    fn test_serializes_with_kind_tag() {
        let json = serde_json::to_value(AppError::NoPhoneColumn).unwrap();
        assert_eq!(json["kind"], "no_phone_column");
    }
}
