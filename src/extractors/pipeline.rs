// src/extractors/pipeline.rs
use crate::extractors::rounding::{ClauseExtractor, RoundingTerms};
use crate::extractors::section::{SearchConfig, SectionLocator};
use crate::nlp::PosTagger;
use crate::utils::error::ExtractError;

/// Locates the Rounding clause in a document's pages and extracts its terms.
pub struct RoundingExtractor<T: PosTagger> {
    locator: SectionLocator,
    clause: ClauseExtractor,
    tagger: T,
}

impl<T: PosTagger> RoundingExtractor<T> {
    pub fn new(tagger: T, config: SearchConfig) -> Self {
        Self {
            locator: SectionLocator::new(config),
            clause: ClauseExtractor::new(),
            tagger,
        }
    }

    /// Runs locate, tag, extract and assemble over the document pages.
    pub fn extract_from_pages(&self, pages: &[String]) -> Result<RoundingTerms, ExtractError> {
        let section = self.locator.locate(pages)?;
        tracing::info!(
            "Extracting Rounding terms from {} page(s) starting at page {}",
            section.pages.len(),
            section.first_page
        );
        self.extract_from_section(&section.text())
    }

    /// Tags already-located section text and extracts the terms from it.
    pub fn extract_from_section(&self, text: &str) -> Result<RoundingTerms, ExtractError> {
        let tokens = self.tagger.tag(text);
        tracing::debug!("Section tagged into {} tokens", tokens.len());

        let terms = self.clause.extract(&tokens)?;
        tracing::info!("Extracted Rounding terms ({:?})", terms.status);
        Ok(terms)
    }
}
