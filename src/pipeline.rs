//! Pipeline – ties together parsing, styling, layout, pagination, and
//! rendering, and puts the composer in front of them for whole documents.

use std::time::Instant;

use crate::config::RenderOptions;
use crate::context::DocumentContext;
use crate::documents::{compose_html, DocumentKind};
use crate::dom::{body_children, parse_html, root_direction};
use crate::error::Result;
use crate::fonts::FontManager;
use crate::layout::compute_layout;
use crate::layout_config::LayoutConfig;
use crate::locale::Direction;
use crate::pagination::{paginate, PageSetup, PAGE_MARGIN_PT};
use crate::render::render_pdf;
use crate::style::{build_styled_tree, ComputedStyle};

/// Page orientation for the generated PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageOrientation {
    #[default]
    Portrait,
    /// Swaps the configured width and height.
    Landscape,
}

/// Configuration for the print stage.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// PDF metadata title, also `{title}` in header and footer.
    pub title: String,
    /// Page width in points (default: A4 = 595.28).
    pub page_width: f32,
    /// Page height in points (default: A4 = 841.89).
    pub page_height: f32,
    pub page_margin: f32,
    pub orientation: PageOrientation,
    /// Used when the HTML root carries no `dir` attribute.
    pub direction: Direction,
    /// Running header; `{page}`, `{pages}` and `{title}` are substituted.
    pub header: Option<String>,
    pub footer: Option<String>,
    /// TTF for measurement and embedding instead of builtin Helvetica.
    pub font_path: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            title: "Document".to_string(),
            page_width: 595.28,
            page_height: 841.89,
            page_margin: PAGE_MARGIN_PT,
            orientation: PageOrientation::Portrait,
            direction: Direction::Ltr,
            header: None,
            footer: None,
            font_path: None,
        }
    }
}

impl PipelineConfig {
    /// Effective page width after applying orientation.
    pub fn effective_width(&self) -> f32 {
        match self.orientation {
            PageOrientation::Portrait => self.page_width,
            PageOrientation::Landscape => self.page_height,
        }
    }

    /// Effective page height after applying orientation.
    pub fn effective_height(&self) -> f32 {
        match self.orientation {
            PageOrientation::Portrait => self.page_height,
            PageOrientation::Landscape => self.page_width,
        }
    }

    pub fn a4_landscape() -> Self {
        Self {
            orientation: PageOrientation::Landscape,
            ..Self::default()
        }
    }

    fn page_setup(&self, direction: Direction) -> PageSetup {
        PageSetup {
            title: self.title.clone(),
            page_width: self.effective_width(),
            page_height: self.effective_height(),
            margin: self.page_margin,
            header: self.header.clone(),
            footer: self.footer.clone(),
            rtl: direction == Direction::Rtl,
        }
    }

    fn fonts(&self) -> Result<FontManager> {
        match &self.font_path {
            Some(path) => FontManager::from_font_path(path),
            None => Ok(FontManager::builtin()),
        }
    }
}

/// Full print stage: HTML string → PDF bytes plus the paginated layout.
pub fn generate_pdf(html: &str, config: &PipelineConfig) -> Result<(Vec<u8>, LayoutConfig)> {
    let layout_config = compute_layout_config(html, config)?;
    let started = Instant::now();
    let pdf_bytes = render_pdf(&layout_config)?;
    log::debug!(
        "render: {} bytes in {:?}",
        pdf_bytes.len(),
        started.elapsed()
    );
    Ok((pdf_bytes, layout_config))
}

/// Parse, style, lay out and paginate without emitting PDF.
pub fn compute_layout_config(html: &str, config: &PipelineConfig) -> Result<LayoutConfig> {
    let started = Instant::now();
    let dom = parse_html(html);
    let direction = root_direction(&dom).unwrap_or(config.direction);
    let dom_nodes = body_children(&dom);

    let styled = build_styled_tree(&dom_nodes, &ComputedStyle::root(direction));

    let fonts = config.fonts()?;
    let setup = config.page_setup(direction);
    let boxes = compute_layout(
        &styled,
        setup.content_width(),
        setup.margin,
        setup.content_height(),
        &fonts,
    )?;

    let mut layout_config = paginate(&boxes, &setup, &fonts);
    layout_config.font_path = config.font_path.clone();
    log::debug!(
        "layout: {} bytes of HTML, {} page(s), {} in {:?}",
        html.len(),
        layout_config.page_count(),
        direction.as_str(),
        started.elapsed()
    );
    Ok(layout_config)
}

/// A composed and printed document.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub kind: DocumentKind,
    pub html: String,
    pub pdf: Vec<u8>,
    pub pages: usize,
}

/// Compose `context` as a `kind` document and print it.
pub fn render_document(
    kind: DocumentKind,
    context: &DocumentContext,
    options: &RenderOptions,
) -> Result<RenderedDocument> {
    let html = compose_html(kind, context, options)?;
    let (pdf, layout) = generate_pdf(&html, &options.pipeline_config(kind))?;
    log::debug!("{kind}: {} page(s)", layout.page_count());
    Ok(RenderedDocument {
        kind,
        html,
        pdf,
        pages: layout.page_count(),
    })
}

/// [`render_document`] from a JSON context.
pub fn render_document_json(
    kind: DocumentKind,
    json: &str,
    options: &RenderOptions,
) -> Result<RenderedDocument> {
    let context = DocumentContext::from_json(kind, json)?;
    render_document(kind, &context, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_basic() {
        let html = "<h1>Hello</h1><p>World</p>";
        let (bytes, config) = generate_pdf(html, &PipelineConfig::default()).unwrap();
        assert!(!bytes.is_empty());
        assert_eq!(config.page_count(), 1);
        assert_eq!(&bytes[0..5], b"%PDF-");
    }

    #[test]
    fn landscape_swaps_page_size() {
        let config = compute_layout_config("<p>Wide</p>", &PipelineConfig::a4_landscape()).unwrap();
        assert!(config.page_width_pt > config.page_height_pt);
    }

    #[test]
    fn root_dir_attribute_wins_over_config() {
        let html = r#"<html dir="rtl"><body><p>مرحبا</p></body></html>"#;
        let config = compute_layout_config(html, &PipelineConfig::default()).unwrap();
        fn first_text(b: &crate::layout_config::LayoutBox) -> Option<&crate::layout_config::TextContent> {
            b.text.as_ref().or_else(|| b.children.iter().find_map(first_text))
        }
        let text = config.pages[0].boxes.iter().find_map(first_text).unwrap();
        assert!(text.rtl);
        assert_eq!(text.text_align, "right");
    }

    #[test]
    fn missing_font_path_fails() {
        let cfg = PipelineConfig {
            font_path: Some("/no/such/font.ttf".into()),
            ..PipelineConfig::default()
        };
        assert!(generate_pdf("<p>x</p>", &cfg).is_err());
    }
}
