//! Error module re-export
//!
//! This module re-exports the extraction error types.

pub use crate::infrastructure::parsing_error::{ExtractionError, ParsingResult};
