//! Domain module - Core admission-ranking entities and pure transforms
//!
//! This module contains the competition and applicant entities together with
//! the normalizer that turns raw table-cell text into typed fields.
//!
//! Modern Rust module organization (Rust 2018+ style):
//! - Each module is its own file in the domain/ directory
//! - Public exports are defined here for convenience

pub mod applicant;
pub mod competition;
pub mod normalizer;

// Re-export commonly used items for convenience
pub use applicant::{ApplicantRecord, DocumentStatus, CSV_HEADERS};
pub use competition::{CategoryPath, CompetitionRef, SkipReason};
pub use normalizer::NormalizeError;
