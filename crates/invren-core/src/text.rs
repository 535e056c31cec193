//! Text acquisition boundary.
//!
//! Everything downstream of this module operates on plain text. Swapping in a
//! different OCR backend means implementing [`TextSource`] for it.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::TextSourceError;

/// Minimum number of non-whitespace characters for text to count as usable.
pub const MIN_USABLE_CHARS: usize = 10;

/// A source of raw document text.
pub trait TextSource {
    /// Fetch the full text of the named document.
    fn fetch(&self, name: &str) -> Result<String, TextSourceError>;
}

/// Reads documents from the local filesystem. PDF files go through the text
/// extraction backend; everything else is read as UTF-8 text.
pub struct FileTextSource {
    root: PathBuf,
}

impl FileTextSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, name: &str) -> PathBuf {
        let path = Path::new(name);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl TextSource for FileTextSource {
    fn fetch(&self, name: &str) -> Result<String, TextSourceError> {
        let path = self.resolve(name);
        if !path.exists() {
            return Err(TextSourceError::NotFound(path.display().to_string()));
        }

        let is_pdf = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);

        let text = if is_pdf {
            pdf_extract::extract_text(&path).map_err(|e| TextSourceError::Unreadable {
                source_name: path.display().to_string(),
                reason: e.to_string(),
            })?
        } else {
            std::fs::read_to_string(&path).map_err(|e| TextSourceError::Unreadable {
                source_name: path.display().to_string(),
                reason: e.to_string(),
            })?
        };

        let usable = text.chars().filter(|c| !c.is_whitespace()).count();
        debug!(source = %path.display(), chars = text.len(), usable, "fetched document text");

        if usable < MIN_USABLE_CHARS {
            return Err(TextSourceError::Empty(path.display().to_string()));
        }

        Ok(text)
    }
}
