//! Competition ranking page parser
//!
//! A competition page is processed in two steps. The eligibility filter checks
//! the whole lower-cased page text for three markers (level, study form and
//! funding basis). Only pages passing all three have their ranking table read:
//! every `tr.R0` row after the first `tr.R13` header row, in document order.
//!
//! The text markers are plain substring checks, so unrelated page text that
//! happens to contain a marker passes the filter.

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::PageParser;
use super::dom::{element_text, has_class};
use super::error::{ExtractionError, ParsingResult};
use crate::domain::normalizer::{classify_document_status, normalize_identifier, parse_score};
use crate::domain::{ApplicantRecord, SkipReason};
use crate::infrastructure::config::{ColumnLayout, timacad};

/// Tagged result of processing one competition page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompetitionOutcome {
    /// Page passed every filter; records keep table row order
    Eligible(Vec<ApplicantRecord>),
    Skipped(SkipReason),
    Failed(ExtractionError),
}

/// The three eligibility conditions evaluated against page text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EligibilityFilter {
    pub is_masters: bool,
    pub is_full_time: bool,
    pub is_budget_funded: bool,
}

impl EligibilityFilter {
    pub fn from_page_text(text: &str) -> Self {
        let text = text.to_lowercase();
        Self {
            is_masters: text.contains(timacad::markers::MASTERS),
            is_full_time: text.contains(timacad::markers::FULL_TIME),
            is_budget_funded: text.contains(timacad::markers::BUDGET),
        }
    }

    /// First failing condition, checked in level, form, funding order
    pub fn verdict(&self) -> Result<(), SkipReason> {
        if !self.is_masters {
            Err(SkipReason::NotMasters)
        } else if !self.is_full_time {
            Err(SkipReason::NotFullTime)
        } else if !self.is_budget_funded {
            Err(SkipReason::NotBudget)
        } else {
            Ok(())
        }
    }
}

pub struct CompetitionParser {
    columns: ColumnLayout,
    cell_selector: Selector,
}

impl CompetitionParser {
    pub fn new(columns: ColumnLayout) -> ParsingResult<Self> {
        let cell_selector = Selector::parse("td").map_err(|e| ExtractionError::InvalidSelector {
            selector: "td".to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            columns,
            cell_selector,
        })
    }

    /// Decode raw page bytes (lossy UTF-8) and process them
    pub fn parse_bytes(&self, bytes: &[u8]) -> CompetitionOutcome {
        self.parse_page(&String::from_utf8_lossy(bytes))
    }

    /// Filter and extract an already parsed page
    pub fn extract(&self, document: &Html) -> CompetitionOutcome {
        let page_text: String = document.root_element().text().collect();
        if let Err(reason) = EligibilityFilter::from_page_text(&page_text).verdict() {
            return CompetitionOutcome::Skipped(reason);
        }

        match self.extract_rows(document) {
            Ok(records) => CompetitionOutcome::Eligible(records),
            Err(e) => CompetitionOutcome::Failed(e),
        }
    }

    /// Read every applicant row following the header row
    pub fn extract_rows(&self, document: &Html) -> ParsingResult<Vec<ApplicantRecord>> {
        let rows = ranking_rows(document)?;
        debug!("Found {} ranking rows", rows.len());

        rows.into_iter()
            .enumerate()
            .map(|(index, row)| {
                let cells: Vec<String> = row.select(&self.cell_selector).map(element_text).collect();
                self.parse_row(index + 1, &cells)
            })
            .collect()
    }

    fn parse_row(&self, row: usize, cells: &[String]) -> ParsingResult<ApplicantRecord> {
        let required = self.columns.required_cells();
        if cells.len() < required {
            return Err(ExtractionError::RowTooShort {
                row,
                cells: cells.len(),
                required,
            });
        }

        let layout = &self.columns;
        let score = |index: usize, field: &'static str| {
            parse_score(&cells[index]).map_err(|e| ExtractionError::invalid_field(row, field, e))
        };

        Ok(ApplicantRecord {
            identifier: normalize_identifier(&cells[layout.identifier])
                .map_err(|e| ExtractionError::invalid_field(row, "identifier", e))?,
            total_score: score(layout.total_score, "total_score")?,
            bonus_score: score(layout.bonus_score, "bonus_score")?,
            priority: score(layout.priority, "priority")?,
            document_status: classify_document_status(&cells[layout.document_status]),
        })
    }
}

impl PageParser for CompetitionParser {
    type Output = CompetitionOutcome;

    fn parse_page(&self, html: &str) -> CompetitionOutcome {
        let document = Html::parse_document(html);
        self.extract(&document)
    }
}

/// Applicant rows after the first header row, in document order, across table sections
fn ranking_rows(document: &Html) -> ParsingResult<Vec<ElementRef<'_>>> {
    let mut header_seen = false;
    let mut rows = Vec::new();

    for element in document.root_element().descendants().filter_map(ElementRef::wrap) {
        if element.value().name() != "tr" {
            continue;
        }
        if !header_seen {
            header_seen = has_class(element, timacad::HEADER_ROW_CLASS);
        } else if has_class(element, timacad::APPLICANT_ROW_CLASS) {
            rows.push(element);
        }
    }

    if !header_seen {
        return Err(ExtractionError::MissingHeaderRow {
            marker: timacad::HEADER_ROW_CLASS.to_string(),
        });
    }
    Ok(rows)
}
