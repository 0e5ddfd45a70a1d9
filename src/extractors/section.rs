// src/extractors/section.rs

// --- Imports ---
use crate::utils::error::ExtractError;
use once_cell::sync::Lazy;
use regex::Regex;

// --- Constants ---
const SECTION_KEYWORD: &str = "Rounding";
const DELIVERY_MARKER: &str = "Delivery Amount";
const RETURN_MARKER: &str = "Return Amount";

/// Default starting point of the page search, as a fraction of the page count.
/// The clause tends to sit in the last third of these agreements.
pub const DEFAULT_START_QUANTILE: f64 = 0.75;

// --- Regex Patterns (Lazy Static) ---
// ISO 4217 codes are three capital letters, followed by an amount like 100 or 1,000,000
static CURRENCY_AMOUNT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Z]{3}\s*\d+(?:,\d+)*").expect("Failed to compile CURRENCY_AMOUNT_RE")
});

// --- Data Structures ---

/// Classification of one page (or page window) for the Rounding clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionCandidate {
    pub present: bool,
    /// Keyword seen but the companion phrases are not, so the clause may run onto the next page.
    pub truncated: bool,
}

impl SectionCandidate {
    pub const COMPLETE: Self = Self { present: true, truncated: false };
    pub const TRUNCATED: Self = Self { present: true, truncated: true };
    pub const ABSENT: Self = Self { present: false, truncated: false };

    pub fn is_complete(&self) -> bool {
        self.present && !self.truncated
    }
}

/// Search settings for [`SectionLocator`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchConfig {
    /// Fraction of the page count at which the outward search starts.
    pub start_quantile: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { start_quantile: DEFAULT_START_QUANTILE }
    }
}

/// The pages that hold the Rounding clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedSection {
    /// Index of the first page of the section.
    pub first_page: usize,
    pub pages: Vec<String>,
}

impl LocatedSection {
    /// Joins the section pages the way they are handed to the tagger.
    pub fn text(&self) -> String {
        self.pages.join("\n")
    }
}

// --- Section Detector ---

/// Decides whether a page holds the Rounding clause.
pub fn classify(text: &str) -> SectionCandidate {
    if !text.contains(SECTION_KEYWORD) {
        return SectionCandidate::ABSENT;
    }

    if text.contains(DELIVERY_MARKER)
        && text.contains(RETURN_MARKER)
        && CURRENCY_AMOUNT_RE.is_match(text)
    {
        SectionCandidate::COMPLETE
    } else {
        // Either a stray mention of the word or a clause that continues on the next page
        SectionCandidate::TRUNCATED
    }
}

/// Re-classifies a page together with its successor. Two pages is the
/// longest span the clause is allowed to cover.
pub fn verify(cur_page: &str, next_page: &str) -> bool {
    let window = [cur_page, next_page].join("\n");
    classify(&window).is_complete()
}

// --- Section Locator ---

/// Visits page indices outward from a start page, alternating forward and backward.
///
/// Both directions are tracked independently; once one side runs off the
/// document the other continues alone, and iteration ends when both are spent.
#[derive(Debug, Clone)]
pub struct OutwardScan {
    forward: usize,
    /// One past the next backward index, so that zero means exhausted.
    backward: usize,
    num_pages: usize,
    forward_turn: bool,
}

impl OutwardScan {
    pub fn new(num_pages: usize, start: usize) -> Self {
        let start = start.min(num_pages);
        Self { forward: start, backward: start, num_pages, forward_turn: true }
    }

    fn forward_exhausted(&self) -> bool {
        self.forward >= self.num_pages
    }

    fn backward_exhausted(&self) -> bool {
        self.backward == 0
    }
}

impl Iterator for OutwardScan {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let take_forward = match (self.forward_exhausted(), self.backward_exhausted()) {
            (true, true) => return None,
            (false, true) => true,
            (true, false) => false,
            (false, false) => self.forward_turn,
        };
        self.forward_turn = !take_forward;

        if take_forward {
            let page = self.forward;
            self.forward += 1;
            Some(page)
        } else {
            self.backward -= 1;
            Some(self.backward)
        }
    }
}

/// Finds the Rounding clause without reading the whole document front to back.
pub struct SectionLocator {
    config: SearchConfig,
}

impl SectionLocator {
    pub fn new(config: SearchConfig) -> Self { Self { config } }

    /// Index of the first page to check.
    pub fn start_page(&self, num_pages: usize) -> usize {
        let start = (self.config.start_quantile * num_pages as f64) as usize;
        start.min(num_pages.saturating_sub(1))
    }

    /// Searches outward from the start page and returns the one or two pages
    /// holding the clause.
    pub fn locate(&self, pages: &[String]) -> Result<LocatedSection, ExtractError> {
        let start = self.start_page(pages.len());
        tracing::info!("Searching {} pages for the Rounding section, starting at page {}", pages.len(), start);

        let mut visited = 0;
        // Each page is produced once by the scan, so the loop is bounded by the page count
        for index in OutwardScan::new(pages.len(), start) {
            visited += 1;
            let page = &pages[index];
            let candidate = classify(page);
            tracing::debug!("Checking page {}: {:?}", index, candidate);

            if !candidate.present {
                continue;
            }

            if !candidate.truncated {
                tracing::info!("Found Rounding section on page {}", index);
                return Ok(LocatedSection { first_page: index, pages: vec![page.clone()] });
            }

            match pages.get(index + 1) {
                Some(next) if verify(page, next) => {
                    tracing::info!("Found Rounding section spanning pages {} and {}", index, index + 1);
                    return Ok(LocatedSection {
                        first_page: index,
                        pages: vec![page.clone(), next.clone()],
                    });
                }
                _ => tracing::debug!("Page {} only mentions Rounding, continuing search", index),
            }
        }

        tracing::warn!("Rounding section not found in {} pages", visited);
        Err(ExtractError::SectionNotFound(visited))
    }
}

impl Default for SectionLocator {
    fn default() -> Self {
        Self::new(SearchConfig::default())
    }
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    const FULL_PAGE: &str = "Rounding. The Delivery Amount and the Return Amount will be rounded up to USD 10,000.";

    fn filler(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("Page {} of general terms.", i)).collect()
    }

    #[test]
    fn test_classify_full_section() {
        assert_eq!(classify(FULL_PAGE), SectionCandidate::COMPLETE);
    }

    #[test]
    fn test_classify_amount_without_space() {
        let page = "Rounding: Delivery Amount / Return Amount to the nearest EUR1,000";
        assert_eq!(classify(page), SectionCandidate::COMPLETE);
    }

    #[test]
    fn test_classify_keyword_only_is_truncated() {
        assert_eq!(classify("(c) Rounding."), SectionCandidate::TRUNCATED);
        // Companion phrases without an amount are still incomplete
        assert_eq!(
            classify("Rounding of the Delivery Amount and Return Amount"),
            SectionCandidate::TRUNCATED
        );
    }

    #[test]
    fn test_classify_keyword_is_case_sensitive() {
        assert_eq!(classify("rounding Delivery Amount Return Amount USD 5"), SectionCandidate::ABSENT);
        assert_eq!(classify("Nothing relevant here."), SectionCandidate::ABSENT);
    }

    #[test]
    fn test_verify_two_page_window() {
        assert!(verify("(c) Rounding.", "The Delivery Amount and the Return Amount: GBP 500"));
        assert!(!verify("(c) Rounding.", "Unrelated next page."));
    }

    #[test]
    fn test_outward_scan_order() {
        let order: Vec<usize> = OutwardScan::new(8, 6).collect();
        assert_eq!(order, vec![6, 5, 7, 4, 3, 2, 1, 0]);
    }

    #[test]
    fn test_outward_scan_visits_every_page_once() {
        for num_pages in 0..12 {
            for start in 0..=num_pages {
                let mut order: Vec<usize> = OutwardScan::new(num_pages, start).collect();
                order.sort_unstable();
                assert_eq!(order, (0..num_pages).collect::<Vec<_>>(), "n={} start={}", num_pages, start);
            }
        }
    }

    #[test]
    fn test_start_page_is_third_quartile() {
        let locator = SectionLocator::default();
        assert_eq!(locator.start_page(8), 6);
        assert_eq!(locator.start_page(10), 7);
        assert_eq!(locator.start_page(1), 0);
        assert_eq!(locator.start_page(0), 0);
    }

    #[test]
    fn test_locate_single_page_document() {
        let pages = vec![FULL_PAGE.to_string()];
        let section = SectionLocator::default().locate(&pages).unwrap();
        assert_eq!(section.first_page, 0);
        assert_eq!(section.pages.len(), 1);
    }

    #[test]
    fn test_locate_before_start_page() {
        let mut pages = filler(10);
        pages[2] = FULL_PAGE.to_string();
        let section = SectionLocator::default().locate(&pages).unwrap();
        assert_eq!(section.first_page, 2);
    }

    #[test]
    fn test_locate_prefers_page_closest_to_start() {
        let mut pages = filler(10);
        pages[1] = FULL_PAGE.to_string();
        pages[8] = FULL_PAGE.replace("USD", "EUR");
        let section = SectionLocator::default().locate(&pages).unwrap();
        assert_eq!(section.first_page, 8);
    }

    #[test]
    fn test_locate_truncated_section_spans_two_pages() {
        let mut pages = filler(8);
        pages[6] = "Paragraph 11. (c) Rounding.".to_string();
        pages[7] = "The Delivery Amount and the Return Amount will be rounded down to USD 1,000.".to_string();
        let section = SectionLocator::default().locate(&pages).unwrap();
        assert_eq!(section.first_page, 6);
        assert_eq!(section.pages.len(), 2);
        assert!(section.text().contains("Rounding.\nThe Delivery Amount"));
    }

    #[test]
    fn test_locate_skips_stray_keyword() {
        let mut pages = filler(8);
        pages[6] = "See Rounding below.".to_string();
        pages[2] = FULL_PAGE.to_string();
        let section = SectionLocator::default().locate(&pages).unwrap();
        assert_eq!(section.first_page, 2);
    }

    #[test]
    fn test_locate_stray_keyword_on_last_page() {
        let mut pages = filler(4);
        pages[3] = "Rounding".to_string();
        let err = SectionLocator::default().locate(&pages).unwrap_err();
        assert!(matches!(err, ExtractError::SectionNotFound(4)));
    }

    #[test]
    fn test_locate_not_found() {
        let pages = filler(5);
        let err = SectionLocator::default().locate(&pages).unwrap_err();
        assert!(matches!(err, ExtractError::SectionNotFound(5)));
    }

    #[test]
    fn test_locate_custom_start() {
        let mut pages = filler(10);
        pages[0] = FULL_PAGE.to_string();
        pages[9] = FULL_PAGE.to_string();
        let locator = SectionLocator::new(SearchConfig { start_quantile: 0.0 });
        assert_eq!(locator.locate(&pages).unwrap().first_page, 0);
    }
}
