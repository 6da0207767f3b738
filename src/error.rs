//! Error types for report loading and pagination.
//!
//! Overflow is never an error: a field that does not fit simply reports
//! "not complete" and continues on the next page. The variants here are
//! the fatal conditions: bad input, broken backends, and broken
//! pagination contracts.

use thiserror::Error;

/// A failure inside a drawing backend.
#[derive(Debug, Error)]
pub enum DrawError {
    /// A string could not be drawn. Printers recover from this one.
    #[error("text could not be drawn: {0}")]
    Text(String),
    /// Any other primitive failed.
    #[error("drawing failed: {0}")]
    Backend(String),
}

/// The error type returned by every public pagewright API function.
#[derive(Debug, Error)]
pub enum PaginateError {
    /// JSON input failed to parse as a valid report.
    #[error("Failed to parse report: {source}{}", render_hint(.hint))]
    Parse {
        #[source]
        source: serde_json::Error,
        hint: String,
    },
    /// An image source could not be read or decoded.
    #[error("Image error: {0}")]
    Image(String),
    /// A non-text drawing primitive failed.
    #[error(transparent)]
    Draw(#[from] DrawError),
    /// Pagination did not drain within the configured page limit.
    #[error("pagination did not finish within {limit} pages")]
    PageLimit { limit: usize },
    /// The real pass emitted a different number of pages than discovery counted.
    #[error("discovery counted {discovered} pages but {printed} were printed")]
    PageCountMismatch { discovered: usize, printed: usize },
    /// `print_page` was called before `begin_print`.
    #[error("print job has not been started")]
    NotStarted,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn render_hint(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {hint}")
    }
}

impl From<serde_json::Error> for PaginateError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the report schema. Check field names and types."
                    .to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        PaginateError::Parse { source: e, hint }
    }
}
