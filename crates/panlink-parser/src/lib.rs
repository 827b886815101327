//! panlink Parser - Page-oriented document readers
//!
//! Turns a file on disk into the ordered pages the extraction pipeline
//! consumes. PDFs are extracted page by page with pdf-extract. Text and
//! Markdown files are read as-is, with a form feed (`\x0C`) between pages.

use std::path::{Path, PathBuf};

use panlink_core::{Page, PageSource, PanlinkError};
use thiserror::Error;

pub mod pdf;

pub use pdf::PdfReader;

// ============================================================================
// Error Types
// ============================================================================

/// Reasons a document cannot be turned into pages
#[derive(Error, Debug)]
pub enum ParserError {
    #[error("Unsupported document type: {0}")]
    UnsupportedFormat(String),

    #[error("Cannot read {path}: {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot extract PDF text: {0}")]
    PdfError(String),

    #[error("Document contains no pages: {0}")]
    EmptyDocument(String),
}

pub type Result<T> = std::result::Result<T, ParserError>;

impl From<ParserError> for PanlinkError {
    fn from(e: ParserError) -> Self {
        Self::SourceUnavailable(e.to_string())
    }
}

// ============================================================================
// Formats
// ============================================================================

/// Document formats with a page reader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Pdf,
    /// Plain text or Markdown
    Text,
}

impl SourceFormat {
    /// Detect the format from a file extension, `None` when unsupported
    pub fn detect(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "txt" | "text" | "md" | "markdown" => Some(Self::Text),
            _ => None,
        }
    }
}

/// Split text-file content into pages on form-feed characters.
///
/// A trailing form feed does not open an extra empty page.
pub fn split_pages(text: &str) -> Vec<Page> {
    let mut segments: Vec<&str> = text.split('\x0C').collect();
    if segments.len() > 1 && segments.last().is_some_and(|s| s.trim().is_empty()) {
        segments.pop();
    }

    segments
        .into_iter()
        .zip(1u32..)
        .map(|(segment, number)| Page::new(number, segment))
        .collect()
}

fn read_file<T>(path: &Path, read: impl FnOnce(&Path) -> std::io::Result<T>) -> Result<T> {
    read(path).map_err(|source| ParserError::IoError {
        path: path.display().to_string(),
        source,
    })
}

// ============================================================================
// Page Readers
// ============================================================================

/// Reads the pages of one document format
pub trait PageReader: Send + Sync {
    /// Read every page of the file, in document order
    fn read(&self, path: &Path) -> Result<Vec<Page>>;
}

/// Reader for text files, one page per form-feed-separated segment
#[derive(Debug, Clone, Copy, Default)]
pub struct TextReader;

impl PageReader for TextReader {
    fn read(&self, path: &Path) -> Result<Vec<Page>> {
        let content = read_file(path, |p| std::fs::read_to_string(p))?;
        Ok(split_pages(&content))
    }
}

// ============================================================================
// Page Source Adapter
// ============================================================================

/// A file on disk exposed as a `PageSource`, reader chosen by extension
pub struct DocumentSource {
    path: PathBuf,
    pdf: PdfReader,
}

impl DocumentSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pdf: PdfReader::new(),
        }
    }

    /// Use a configured PDF reader
    pub fn with_pdf_reader(mut self, pdf: PdfReader) -> Self {
        self.pdf = pdf;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn reader(&self) -> Result<&dyn PageReader> {
        match SourceFormat::detect(&self.path) {
            Some(SourceFormat::Pdf) => Ok(&self.pdf),
            Some(SourceFormat::Text) => Ok(&TextReader),
            None => Err(ParserError::UnsupportedFormat(self.path.display().to_string())),
        }
    }
}

impl PageSource for DocumentSource {
    fn read_pages(&self) -> panlink_core::Result<Vec<Page>> {
        let pages = self.reader()?.read(&self.path)?;

        if pages.is_empty() {
            return Err(ParserError::EmptyDocument(self.describe()).into());
        }

        let chars: usize = pages.iter().map(|p| p.char_count).sum();
        tracing::info!(
            "Extracted text from {} pages ({} characters) of {}",
            pages.len(),
            chars,
            self.path.display()
        );

        Ok(pages)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================
