//! Render options – everything about a render call that is not document data.
//!
//! Loaded from a JSON file (every field optional) and overridden by CLI flags.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::context::Developer;
use crate::documents::DocumentKind;
use crate::error::Result;
use crate::locale::{self, Locale};
use crate::pagination::PAGE_MARGIN_PT;
use crate::pipeline::{PageOrientation, PipelineConfig};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    pub locale: Locale,
    /// ISO code printed in front of amounts.
    pub currency: String,
    pub developer: Developer,
    pub page: PageOptions,
    /// TTF font used by the print stage; required for Arabic glyphs.
    pub font_path: Option<String>,
    /// Page header text; `{title}`, `{page}` and `{pages}` are substituted.
    /// `None` uses the developer name.
    pub header: Option<String>,
    /// Page footer text, same placeholders. `None` uses the localized
    /// `{title}  ·  Page {page} of {pages}`.
    pub footer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageOptions {
    /// Points. Defaults to A4.
    pub width: f32,
    pub height: f32,
    pub margin: f32,
    pub landscape: bool,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            width: 595.28,
            height: 841.89,
            margin: PAGE_MARGIN_PT,
            landscape: false,
        }
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            locale: Locale::English,
            currency: "AED".to_string(),
            developer: Developer::default(),
            page: PageOptions::default(),
            font_path: None,
            header: None,
            footer: None,
        }
    }
}

impl RenderOptions {
    pub fn with_locale(locale: Locale) -> Self {
        Self {
            locale,
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Localized document title.
    pub fn title(&self, kind: DocumentKind) -> String {
        let (en, ar) = kind.titles();
        self.locale.text(en, ar)
    }

    /// Print-stage configuration for a document of `kind`.
    pub fn pipeline_config(&self, kind: DocumentKind) -> PipelineConfig {
        let title = self.title(kind);
        let footer = self.footer.clone().unwrap_or_else(|| {
            let (en, ar) = locale::lookup("page_of").unwrap_or(("Page {page} of {pages}", ""));
            format!("{{title}}  ·  {}", self.locale.text(en, ar))
        });
        let header = self
            .header
            .clone()
            .unwrap_or_else(|| self.developer.name.clone());

        PipelineConfig {
            title,
            page_width: self.page.width,
            page_height: self.page.height,
            page_margin: self.page.margin,
            orientation: if self.page.landscape {
                PageOrientation::Landscape
            } else {
                PageOrientation::Portrait
            },
            direction: self.locale.direction(),
            header: Some(header).filter(|h| !h.trim().is_empty()),
            footer: Some(footer).filter(|f| !f.trim().is_empty()),
            font_path: self.font_path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::Direction;

    #[test]
    fn partial_json_keeps_defaults() {
        let opts = RenderOptions::from_json(
            r#"{"locale": "ar", "developer": {"name": "Emaar"}, "page": {"margin": 30}}"#,
        )
        .unwrap();
        assert_eq!(opts.locale, Locale::Arabic);
        assert_eq!(opts.currency, "AED");
        assert_eq!(opts.developer.name, "Emaar");
        assert_eq!(opts.page.margin, 30.0);
        assert!((opts.page.width - 595.28).abs() < 0.01);
    }

    #[test]
    fn pipeline_config_carries_locale_direction_and_footer() {
        let opts = RenderOptions::with_locale(Locale::Arabic);
        let cfg = opts.pipeline_config(DocumentKind::SalesOffer);
        assert_eq!(cfg.direction, Direction::Rtl);
        assert_eq!(cfg.title, "عرض بيع");
        let footer = cfg.footer.unwrap();
        assert!(footer.contains("{page}"));
        assert!(footer.contains("{pages}"));
    }

    #[test]
    fn empty_header_disables_band() {
        let opts = RenderOptions {
            header: Some(String::new()),
            ..RenderOptions::default()
        };
        assert!(opts.pipeline_config(DocumentKind::SalesOffer).header.is_none());
    }

    #[test]
    fn options_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("options.json");
        std::fs::write(&path, r#"{"currency": "USD", "locale": "bilingual"}"#).unwrap();
        let opts = RenderOptions::from_json_file(&path).unwrap();
        assert_eq!(opts.currency, "USD");
        assert_eq!(opts.locale, Locale::Bilingual);
    }
}
