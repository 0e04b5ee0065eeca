//! Applicant ranking rows
//!
//! One `ApplicantRecord` is produced per `tr.R0` row of a competition table.
//! Serialization field names are the exact CSV header labels.

use serde::{Serialize, Serializer};
use std::fmt;

/// Kind of documents an applicant has submitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentStatus {
    /// Original education document
    Original,
    /// Copy of the education document
    Copy,
}

impl DocumentStatus {
    /// Label written to the output table
    pub fn label(self) -> &'static str {
        match self {
            Self::Original => "Оригинал",
            Self::Copy => "Копия",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for DocumentStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// A single applicant entry of a competition ranking
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicantRecord {
    /// Personal insurance number, always grouped as `DDD-DDD-DDD-DD`
    #[serde(rename = "СНИЛС")]
    pub identifier: String,
    #[serde(rename = "Сумма баллов")]
    pub total_score: u32,
    #[serde(rename = "Дополнительные баллы")]
    pub bonus_score: u32,
    #[serde(rename = "Приоритет")]
    pub priority: u32,
    #[serde(rename = "Вид документов")]
    pub document_status: DocumentStatus,
}

/// Header row of the output table, in column order
pub const CSV_HEADERS: [&str; 5] = [
    "СНИЛС",
    "Сумма баллов",
    "Дополнительные баллы",
    "Приоритет",
    "Вид документов",
];
