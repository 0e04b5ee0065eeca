//! Cell text normalization
//!
//! Pure, stateless transforms from raw ranking-table cell text to typed
//! fields. Every failure here surfaces as an extraction failure of the
//! competition the cell belongs to.

use std::num::ParseIntError;
use thiserror::Error;

use super::applicant::DocumentStatus;

/// Minimum digit count of an identifier: three groups of three plus a final group of two
pub const IDENTIFIER_MIN_DIGITS: usize = 11;

/// Marker that identifies original documents in the status column
const ORIGINAL_MARKER: &str = "ориг";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("identifier '{raw}' has {digits} digits, at least {} required", IDENTIFIER_MIN_DIGITS)]
    IdentifierTooShort { raw: String, digits: usize },

    #[error("identifier '{raw}' contains non-digit characters")]
    IdentifierNotNumeric { raw: String },

    #[error("'{raw}' is not a non-negative integer: {source}")]
    InvalidInteger {
        raw: String,
        #[source]
        source: ParseIntError,
    },
}

/// Regroup an identifier as `DDD-DDD-DDD-D…`.
///
/// Hyphens and any whitespace (including non-breaking spaces) are stripped
/// first, so already formatted input comes back unchanged. Digits past the
/// eleventh stay in the final group.
pub fn normalize_identifier(raw: &str) -> Result<String, NormalizeError> {
    let digits: String = raw
        .chars()
        .filter(|c| *c != '-' && !c.is_whitespace())
        .collect();

    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(NormalizeError::IdentifierNotNumeric {
            raw: raw.to_string(),
        });
    }
    if digits.len() < IDENTIFIER_MIN_DIGITS {
        return Err(NormalizeError::IdentifierTooShort {
            raw: raw.to_string(),
            digits: digits.len(),
        });
    }

    // ASCII digits only, so byte slicing is char aligned
    Ok(format!(
        "{}-{}-{}-{}",
        &digits[0..3],
        &digits[3..6],
        &digits[6..9],
        &digits[9..]
    ))
}

/// Parse a score or priority cell as an exact decimal integer
pub fn parse_score(raw: &str) -> Result<u32, NormalizeError> {
    raw.parse::<u32>()
        .map_err(|source| NormalizeError::InvalidInteger {
            raw: raw.to_string(),
            source,
        })
}

/// Classify the document status column; anything without the original marker is a copy
pub fn classify_document_status(raw: &str) -> DocumentStatus {
    if raw.to_lowercase().contains(ORIGINAL_MARKER) {
        DocumentStatus::Original
    } else {
        DocumentStatus::Copy
    }
}
