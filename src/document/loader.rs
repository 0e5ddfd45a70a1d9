// src/document/loader.rs
use crate::utils::error::IngestError;
use lopdf::Document;
use std::path::Path;

/// Page separator used by text-extraction servers when no form feed is emitted.
const BLANK_LINE_PAGE_BREAK: &str = "\n\n\n\n";
const FORM_FEED: char = '\x0c';

/// Loads a document and returns its non-empty pages in reading order.
///
/// PDFs are read page by page with lopdf. Anything else is treated as
/// already-extracted text and segmented on form feeds, or on runs of four
/// newlines when the text carries no form feeds.
pub fn load_pages<P: AsRef<Path>>(path: P) -> Result<Vec<String>, IngestError> {
    let path = path.as_ref();
    if !path.is_file() {
        tracing::error!("Document not found: {}", path.display());
        return Err(IngestError::DocumentNotFound(path.display().to_string()));
    }

    let pages = if is_pdf(path) {
        read_pdf_pages(path)?
    } else {
        let content = std::fs::read_to_string(path)?;
        split_pages(&content)
    };

    if pages.is_empty() {
        return Err(IngestError::Empty(path.display().to_string()));
    }

    tracing::info!("Loaded {} pages from {}", pages.len(), path.display());
    Ok(pages)
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

fn read_pdf_pages(path: &Path) -> Result<Vec<String>, IngestError> {
    let doc = Document::load(path).map_err(|e| IngestError::Pdf(e.to_string()))?;

    let mut pages = Vec::new();
    for page_num in doc.get_pages().keys() {
        // A single unreadable page should not sink the whole document
        match doc.extract_text(&[*page_num]) {
            Ok(text) if !text.trim().is_empty() => pages.push(text),
            Ok(_) => tracing::debug!("Skipping empty PDF page {}", page_num),
            Err(e) => tracing::warn!("Failed to extract text from PDF page {}: {}", page_num, e),
        }
    }
    Ok(pages)
}

/// Splits raw document text into its non-empty pages.
pub fn split_pages(content: &str) -> Vec<String> {
    let raw: Vec<&str> = if content.contains(FORM_FEED) {
        content.split(FORM_FEED).collect()
    } else {
        content.split(BLANK_LINE_PAGE_BREAK).collect()
    };

    raw.into_iter()
        .filter(|page| !page.trim().is_empty())
        .map(str::to_string)
        .collect()
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_split_on_form_feed() {
        let pages = split_pages("page one\x0cpage two\x0c\x0cpage three\n");
        assert_eq!(pages, vec!["page one", "page two", "page three\n"]);
    }

    #[test]
    fn test_split_on_blank_lines_without_form_feed() {
        let pages = split_pages("first\n\n\n\nsecond\n\n\n\n\n\n\n\nthird");
        assert_eq!(pages, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_missing_document_is_reported() {
        let err = load_pages("/definitely/not/here.pdf").unwrap_err();
        assert!(matches!(err, IngestError::DocumentNotFound(_)));
    }

    #[test]
    fn test_text_document_loads_pages() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        write!(file, "Cover page\x0cRounding. Delivery Amount and Return Amount USD 100").unwrap();

        let pages = load_pages(file.path()).unwrap();
        assert_eq!(pages.len(), 2);
        assert!(pages[1].starts_with("Rounding"));
    }

    #[test]
    fn test_blank_document_is_empty() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        write!(file, "  \n\x0c\n ").unwrap();

        let err = load_pages(file.path()).unwrap_err();
        assert!(matches!(err, IngestError::Empty(_)));
    }

    #[test]
    fn test_invalid_pdf_is_reported() {
        let mut file = tempfile::Builder::new().suffix(".PDF").tempfile().unwrap();
        write!(file, "this is not a pdf").unwrap();

        let err = load_pages(file.path()).unwrap_err();
        assert!(matches!(err, IngestError::Pdf(_)));
    }
}
