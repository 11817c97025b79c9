//! PDF text source using lopdf and pdf-extract.

use lopdf::Document;
use tracing::debug;

use super::{PdfProcessor, Result};
use crate::error::PdfError;

/// Loads a PDF with lopdf and extracts its text layer with pdf-extract.
#[derive(Default)]
pub struct PdfTextSource {
    document: Option<Document>,
    raw_data: Vec<u8>,
}

impl PdfTextSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a PDF and return its full text.
    pub fn from_bytes(data: &[u8]) -> Result<String> {
        let mut source = Self::new();
        source.load(data)?;
        source.extract_text()
    }
}

impl PdfProcessor for PdfTextSource {
    fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Bills are often "encrypted" with an empty user password
        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            let mut decrypted_data = Vec::new();
            doc.save_to(&mut decrypted_data)
                .map_err(|e| PdfError::Parse(format!("Failed to save decrypted PDF: {}", e)))?;
            self.raw_data = decrypted_data;
        } else {
            self.raw_data = data.to_vec();
        }

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        self.document = Some(doc);
        Ok(())
    }

    fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    fn extract_text(&self) -> Result<String> {
        if self.document.is_none() {
            return Err(PdfError::Parse("No document loaded".to_string()));
        }

        let text = pdf_extract::extract_text_from_mem(&self.raw_data)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))?;
        debug!("Extracted {} chars of text", text.len());
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Object};

    fn empty_pdf() -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => Vec::<Object>::new(),
            "Count" => 0,
        });
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_new_source_is_empty() {
        let source = PdfTextSource::new();
        assert_eq!(source.page_count(), 0);
        assert!(matches!(source.extract_text(), Err(PdfError::Parse(_))));
    }

    #[test]
    fn test_rejects_non_pdf() {
        assert!(matches!(
            PdfTextSource::from_bytes(b"Referente a\nMAR/2024"),
            Err(PdfError::Parse(_))
        ));
    }

    #[test]
    fn test_rejects_zero_pages() {
        assert!(matches!(
            PdfTextSource::from_bytes(&empty_pdf()),
            Err(PdfError::NoPages)
        ));
    }
}
