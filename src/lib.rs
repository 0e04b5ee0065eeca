//! TIMACAD admissions ranking crawler
//!
//! Discovers the general-admission competitions of full-time master's
//! programmes on the university's landing page, downloads every ranking table
//! and stores each one as a `;` delimited CSV file inside a per-run folder.

// Module declarations
pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::{RunSummary, Scheduler};
pub use domain::{ApplicantRecord, CompetitionRef, DocumentStatus, SkipReason};
