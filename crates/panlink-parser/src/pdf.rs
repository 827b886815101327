//! PDF page reader using pdf-extract
//!
//! Text is extracted page by page, so page numbers follow the PDF's own page
//! order and text never runs across a page break.

use std::path::Path;

use panlink_core::Page;

use crate::{read_file, PageReader, ParserError, Result};

/// PDF page reader
#[derive(Debug, Clone, Default)]
pub struct PdfReader {
    /// Drop pages that contain only whitespace
    pub skip_blank_pages: bool,
}

impl PdfReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop whitespace-only pages (remaining pages keep their document numbers)
    pub fn with_blank_page_skipping(mut self, enabled: bool) -> Self {
        self.skip_blank_pages = enabled;
        self
    }
}

impl PageReader for PdfReader {
    fn read(&self, path: &Path) -> Result<Vec<Page>> {
        let bytes = read_file(path, |p| std::fs::read(p))?;
        let texts = pdf_extract::extract_text_from_mem_by_pages(&bytes)
            .map_err(|e| ParserError::PdfError(e.to_string()))?;

        let mut pages: Vec<Page> = texts
            .iter()
            .zip(1u32..)
            .map(|(text, number)| Page::new(number, text.as_str()))
            .collect();

        if self.skip_blank_pages {
            let before = pages.len();
            pages.retain(|p| !p.text.trim().is_empty());
            tracing::debug!("Skipped {} blank pages", before - pages.len());
        }

        Ok(pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    /// Write a PDF with one line of Courier text per page
    fn write_pdf(path: &Path, page_texts: &[&str]) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids = Vec::new();
        for text in page_texts {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(Object::from(page_id));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        doc.save(path).unwrap();
    }

    #[test]
    fn test_pages_follow_pdf_pages() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("two_pages.pdf");
        write_pdf(&path, &["Mr. John Smith ABCDE1234F", "Ms. Priya Sharma PQRST6789Z"]);

        let pages = PdfReader::new().read(&path).unwrap();

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].number, 1);
        assert_eq!(pages[1].number, 2);
        assert!(pages[0].text.contains("ABCDE1234F"));
        assert!(!pages[0].text.contains("PQRST6789Z"));
        assert!(!pages[0].text.contains("ABCDE1234FMs"));
        assert!(pages[1].text.contains("Priya Sharma PQRST6789Z"));
    }

    #[test]
    fn test_blank_pages_keep_document_numbers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank_middle.pdf");
        write_pdf(&path, &["Name: Ravi Kumar", " ", "PAN ABCDE1234F"]);

        let pages = PdfReader::new()
            .with_blank_page_skipping(true)
            .read(&path)
            .unwrap();

        let numbers: Vec<u32> = pages.iter().map(|p| p.number).collect();
        assert_eq!(numbers, vec![1, 3]);
    }

    #[test]
    fn test_blank_page_skipping_flag() {
        let reader = PdfReader::new();
        assert!(!reader.skip_blank_pages);
        assert!(reader.with_blank_page_skipping(true).skip_blank_pages);
    }

    #[test]
    fn test_invalid_pdf_bytes() {
        let mut file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        std::io::Write::write_all(&mut file, b"not a pdf").unwrap();

        let err = PdfReader::new().read(file.path()).unwrap_err();
        assert!(matches!(err, ParserError::PdfError(_)));
    }

    #[test]
    fn test_missing_pdf() {
        let err = PdfReader::new().read(Path::new("/nonexistent/a.pdf")).unwrap_err();
        assert!(matches!(err, ParserError::IoError { .. }));
    }
}
