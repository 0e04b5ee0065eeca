//! Competition references discovered on the landing page

use serde::Serialize;
use std::fmt;

/// Category labels recovered from the nested card tree of the landing page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryPath {
    /// Study form, e.g. "Очная форма обучения"
    pub form: String,
    /// Education level, e.g. "Магистратура"
    pub level: String,
    /// Direction of study; absent when the card tree is shallower than usual
    pub direction: Option<String>,
    /// Program inside the direction
    pub sub_direction: Option<String>,
}

impl CategoryPath {
    /// Output name of the competition: `"<direction> (<sub-direction>)"`.
    ///
    /// Shallow trees degrade to whatever labels exist, down to the level label.
    pub fn display_name(&self) -> String {
        match (&self.direction, &self.sub_direction) {
            (Some(direction), Some(sub)) => format!("{direction} ({sub})"),
            (Some(direction), None) => direction.clone(),
            (None, _) => self.level.clone(),
        }
    }
}

/// A competition sub-page scheduled for crawling
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompetitionRef {
    /// Absolute URL of the ranking page
    pub link: String,
    /// Human-readable name, also used as the CSV file stem
    pub name: String,
    pub category: CategoryPath,
}

impl CompetitionRef {
    pub fn new(link: String, category: CategoryPath) -> Self {
        Self {
            link,
            name: category.display_name(),
            category,
        }
    }
}

impl fmt::Display for CompetitionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" ({})", self.name, self.link)
    }
}

/// Why an eligible-looking competition page was not processed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    NotMasters,
    NotFullTime,
    NotBudget,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotMasters => "not-masters",
            Self::NotFullTime => "not-full-time",
            Self::NotBudget => "not-budget",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
