//! Crate-wide error type.

use thiserror::Error;

use crate::documents::DocumentKind;

/// Everything that can make a render call fail.
///
/// Absent context data is not in here: templates degrade to placeholder text
/// instead of failing.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("invalid JSON input: {0}")]
    Json(#[from] serde_json::Error),

    #[error("context is for {found}, but {expected} was requested")]
    ContextMismatch {
        expected: DocumentKind,
        found: DocumentKind,
    },

    #[error("unknown document kind: {0:?}")]
    UnknownDocument(String),

    #[error("unknown locale: {0:?} (expected en, ar or bilingual)")]
    UnknownLocale(String),

    #[error("layout error: {0}")]
    Layout(String),

    #[error("font error: {0}")]
    Font(String),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RenderError>;
