//! # estate-forge – bilingual real-estate sales documents
//!
//! Renders broker agreements, reservation forms, sales offers and sales &
//! purchase agreements from typed contexts, in English, Arabic or both.
//!
//! A render runs in two halves:
//!
//! 1. **Compose** – context + [`config::RenderOptions`] → HTML through
//!    embedded MiniJinja templates ([`documents`])
//! 2. **Print** – HTML → PDF bytes ([`pipeline`]):
//!    - **Parse** the controlled HTML subset ([`dom`])
//!    - **Style** with tag defaults and utility classes ([`style`])
//!    - **Layout** with Taffy flexbox ([`layout`])
//!    - **Paginate** with running header and footer ([`pagination`])
//!    - **Render** via printpdf ([`render`])
//!
//! A C-compatible FFI surface is exposed via the [`ffi`] module.

pub mod assets;
pub mod config;
pub mod context;
pub mod documents;
pub mod dom;
pub mod error;
pub mod ffi;
pub mod fonts;
pub mod format;
pub mod layout;
pub mod layout_config;
pub mod locale;
pub mod pagination;
pub mod pipeline;
pub mod render;
pub mod style;

pub use config::RenderOptions;
pub use context::DocumentContext;
pub use documents::{compose_html, DocumentKind};
pub use error::{RenderError, Result};
pub use locale::Locale;
pub use pipeline::{
    generate_pdf, render_document, render_document_json, PageOrientation, PipelineConfig,
    RenderedDocument,
};
