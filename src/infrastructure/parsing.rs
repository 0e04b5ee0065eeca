//! HTML parsing infrastructure
//!
//! Two parsers sit on top of `scraper`'s parse tree:
//! - [`CategoryResolver`] reads the landing page and discovers competitions
//! - [`CompetitionParser`] reads one competition page into applicant records

pub mod category_resolver;
pub mod competition_parser;
pub mod dom;
pub mod error;

// Re-export public types
pub use category_resolver::{AnchorRejection, CategoryResolver, DiscoveryReport, RejectedAnchor};
pub use competition_parser::{CompetitionOutcome, CompetitionParser};
pub use error::{ExtractionError, ParsingResult};

/// Parser over a whole HTML document.
///
/// Implementations parse the text themselves so the non-`Send` parse tree
/// never escapes a synchronous call.
pub trait PageParser {
    type Output;

    fn parse_page(&self, html: &str) -> Self::Output;
}
