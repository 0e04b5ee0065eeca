//! Competition discovery on the landing page
//!
//! The landing page nests competitions in a tree of bootstrap cards:
//!
//! ```text
//! div.card > div.card-header "Очная форма обучения"        (form)
//!          > div > div.card-body
//!              div.card > div.card-header "Магистратура"    (level)
//!                       > div > div.card-body
//!                           div.card > div.card-header "…"  (direction)
//!                                    > div > div.card-body
//!                                        div.card > …        (sub-direction)
//!                                            a "на общих основаниях"
//! ```
//!
//! A card's label is the nearest `div` preceding the card-body's parent in
//! document order, which is the card header. Depth is read from the outermost
//! card-body inwards, so extra wrapping inside the sub-direction does not shift
//! the labels. The tree is known to be four cards deep; shallower trees still
//! pass when form and level resolve, but lose their naming labels.

use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use std::fmt;
use tracing::{debug, info};
use url::Url;

use super::PageParser;
use super::dom::{classed_ancestors, element_text, preceding_element};
use super::error::{ExtractionError, ParsingResult};
use crate::domain::{CategoryPath, CompetitionRef};
use crate::infrastructure::config::{CrawlerConfig, timacad};

/// Why a general-admission anchor was not turned into a competition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "label", rename_all = "kebab-case")]
pub enum AnchorRejection {
    /// The anchor is not inside any card-body, or the form/level labels cannot be read
    UnresolvableCategory,
    WrongForm(String),
    WrongLevel(String),
    InvalidLink(String),
}

impl fmt::Display for AnchorRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvableCategory => f.write_str("unresolvable category"),
            Self::WrongForm(label) => write!(f, "wrong form '{label}'"),
            Self::WrongLevel(label) => write!(f, "wrong level '{label}'"),
            Self::InvalidLink(reason) => write!(f, "invalid link: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedAnchor {
    pub href: String,
    pub reason: AnchorRejection,
}

/// Result of scanning the landing page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiscoveryReport {
    /// Competitions to crawl, in document order
    pub competitions: Vec<CompetitionRef>,
    /// Matching anchors that failed the category filter, in document order
    pub rejected: Vec<RejectedAnchor>,
}

/// Labels of the card tree above `anchor`, outermost card first.
///
/// Index 0 is the study form, 1 the level, 2 the direction and 3 the
/// sub-direction. A `None` entry means the card-body had no readable header.
pub fn category_labels(anchor: ElementRef<'_>) -> Vec<Option<String>> {
    classed_ancestors(anchor, "div", timacad::CARD_BODY_CLASS)
        .into_iter()
        .map(card_label)
        .collect()
}

/// Header text of the card owning `card_body`
fn card_label(card_body: ElementRef<'_>) -> Option<String> {
    let parent = card_body.parent().and_then(ElementRef::wrap)?;
    preceding_element(parent, "div").map(element_text)
}

/// Discovers general-admission competitions of the configured form and level
pub struct CategoryResolver {
    base_url: Url,
    anchor_text: String,
    form_label: String,
    level_label: String,
    anchor_selector: Selector,
}

impl CategoryResolver {
    pub fn new(config: &CrawlerConfig) -> ParsingResult<Self> {
        let base_url = Url::parse(&config.landing_url)
            .map_err(|e| ExtractionError::url_resolution_failed(&config.landing_url, e))?;

        let anchor_selector =
            Selector::parse("a[href]").map_err(|e| ExtractionError::InvalidSelector {
                selector: "a[href]".to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            base_url,
            anchor_text: config.anchor_text.trim().to_string(),
            form_label: config.form_label.to_lowercase(),
            level_label: config.level_label.to_lowercase(),
            anchor_selector,
        })
    }

    /// Scan the landing page for competitions
    pub fn resolve(&self, html: &Html) -> DiscoveryReport {
        let mut report = DiscoveryReport::default();

        for anchor in html.select(&self.anchor_selector) {
            if element_text(anchor) != self.anchor_text {
                continue;
            }
            let href = anchor.value().attr("href").unwrap_or_default().to_string();

            match self.resolve_anchor(anchor, &href) {
                Ok(competition) => {
                    debug!("Discovered competition {}", competition);
                    report.competitions.push(competition);
                }
                Err(reason) => {
                    debug!("Skipping anchor {}: {}", href, reason);
                    report.rejected.push(RejectedAnchor { href, reason });
                }
            }
        }

        info!(
            "Discovered {} competitions ({} anchors rejected)",
            report.competitions.len(),
            report.rejected.len()
        );
        report
    }

    fn resolve_anchor(&self, anchor: ElementRef<'_>, href: &str) -> Result<CompetitionRef, AnchorRejection> {
        let labels = category_labels(anchor);
        let label_at = |index: usize| labels.get(index).cloned().flatten();

        let form = label_at(0).ok_or(AnchorRejection::UnresolvableCategory)?;
        if form.to_lowercase() != self.form_label {
            return Err(AnchorRejection::WrongForm(form));
        }

        let level = label_at(1).ok_or(AnchorRejection::UnresolvableCategory)?;
        if level.to_lowercase() != self.level_label {
            return Err(AnchorRejection::WrongLevel(level));
        }

        let link = self
            .resolve_link(href)
            .map_err(|e| AnchorRejection::InvalidLink(e.to_string()))?;

        let category = CategoryPath {
            form,
            level,
            direction: label_at(2),
            sub_direction: label_at(3),
        };
        Ok(CompetitionRef::new(link, category))
    }

    /// Resolve relative links against the landing page; absolute links pass through
    fn resolve_link(&self, href: &str) -> ParsingResult<String> {
        self.base_url
            .join(href.trim())
            .map(|url| url.to_string())
            .map_err(|e| ExtractionError::url_resolution_failed(href, e))
    }
}

impl PageParser for CategoryResolver {
    type Output = DiscoveryReport;

    fn parse_page(&self, html: &str) -> DiscoveryReport {
        let document = Html::parse_document(html);
        self.resolve(&document)
    }
}
