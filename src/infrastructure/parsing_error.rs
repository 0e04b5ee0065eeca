//! Extraction error types
//!
//! Errors raised while turning a competition page or the landing page into
//! typed data. Each one is contained to the page it came from.

use thiserror::Error;

use crate::domain::NormalizeError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("Ranking header row 'tr.{marker}' not found")]
    MissingHeaderRow { marker: String },

    #[error("Row {row} has {cells} cells, at least {required} required")]
    RowTooShort {
        row: usize,
        cells: usize,
        required: usize,
    },

    #[error("Row {row}, column '{field}': {source}")]
    InvalidField {
        row: usize,
        field: &'static str,
        #[source]
        source: NormalizeError,
    },

    #[error("Invalid CSS selector: {selector} - {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("URL resolution failed: {url} - {reason}")]
    UrlResolutionFailed { url: String, reason: String },
}

impl ExtractionError {
    /// Create an invalid field error for a 1-based row number
    pub fn invalid_field(row: usize, field: &'static str, source: NormalizeError) -> Self {
        Self::InvalidField { row, field, source }
    }

    /// Create a URL resolution error
    pub fn url_resolution_failed(url: &str, reason: impl ToString) -> Self {
        Self::UrlResolutionFailed {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type ParsingResult<T> = Result<T, ExtractionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_field_message_names_column() {
        let source = crate::domain::normalizer::parse_score("abc").unwrap_err();
        let error = ExtractionError::invalid_field(2, "total_score", source);
        assert!(error.to_string().starts_with("Row 2, column 'total_score'"));
    }
}
