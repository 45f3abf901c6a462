//! Error types for the matching core
//!
//! Command handlers wrap these in `anyhow` with file context; the core only
//! ever returns `MatchError`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MatchError {
    /// The reference index was built from zero entities
    #[error("reference set is empty: cannot build an index without entities")]
    EmptyReference,

    /// A row is missing a required field (1-based data row number)
    #[error("row {row}: missing or invalid `{field}`")]
    MalformedRecord { row: usize, field: String },

    /// Matcher parameters outside their valid range
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

impl MatchError {
    pub fn malformed(row: usize, field: impl Into<String>) -> Self {
        Self::MalformedRecord {
            row,
            field: field.into(),
        }
    }
}

pub type CoreResult<T> = std::result::Result<T, MatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_message() {
        let err = MatchError::malformed(7, "name");
        assert_eq!(err.to_string(), "row 7: missing or invalid `name`");
    }
}
