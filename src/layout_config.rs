//! The paginated intermediate representation between layout and PDF
//! emission. Everything the renderer needs is in here, in page coordinates,
//! so a layout can be dumped to JSON, inspected and rendered later.

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// PDF metadata title.
    #[serde(default = "LayoutConfig::default_title")]
    pub title: String,
    /// Points (1 pt = 1/72 inch).
    pub page_width_pt: f32,
    pub page_height_pt: f32,
    /// TTF to embed instead of the builtin Helvetica.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_path: Option<String>,
    pub pages: Vec<PageLayout>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageLayout {
    pub page_index: usize,
    pub boxes: Vec<LayoutBox>,
}

/// A rectangle in page coordinates (origin top-left).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,

    pub background_color: Option<[f32; 4]>,
    pub border: Option<BorderStyle>,

    pub text: Option<TextContent>,
    pub image: Option<ImageContent>,

    pub children: Vec<LayoutBox>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BorderStyle {
    pub width: f32,
    pub color: [f32; 4],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextContent {
    pub lines: Vec<TextLine>,
    pub font_size: f32,
    pub bold: bool,
    pub italic: bool,
    pub color: [f32; 4],
    pub line_height: f32,
    pub text_align: String,
    pub underline: bool,
    /// Right-to-left run; the renderer reorders it into visual order.
    #[serde(default)]
    pub rtl: bool,
    /// Bullet or number drawn in the gutter of a list item.
    pub list_marker: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextLine {
    pub text: String,
    /// Offset from the box's left edge, already applying alignment.
    pub x_offset: f32,
    /// Offset from the top of the box.
    pub y_offset: f32,
    #[serde(default)]
    pub width: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageContent {
    pub src: String,
    pub width: f32,
    pub height: f32,
}

impl LayoutConfig {
    /// An empty A4 portrait document.
    pub fn a4() -> Self {
        Self {
            title: Self::default_title(),
            page_width_pt: 595.28,
            page_height_pt: 841.89,
            font_path: None,
            pages: Vec::new(),
        }
    }

    fn default_title() -> String {
        "Document".to_string()
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Every text line on `page`, in paint order.
    pub fn page_text(&self, page: usize) -> Vec<&str> {
        fn walk<'a>(b: &'a LayoutBox, out: &mut Vec<&'a str>) {
            if let Some(t) = &b.text {
                out.extend(t.lines.iter().map(|l| l.text.as_str()));
            }
            for c in &b.children {
                walk(c, out);
            }
        }
        let mut out = Vec::new();
        if let Some(p) = self.pages.get(page) {
            for b in &p.boxes {
                walk(b, &mut out);
            }
        }
        out
    }
}

impl LayoutBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            background_color: None,
            border: None,
            text: None,
            image: None,
            children: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_without_optional_fields_loads() {
        let json = r#"{
            "page_width_pt": 595.28,
            "page_height_pt": 841.89,
            "pages": [{"page_index": 0, "boxes": [{
                "x": 40, "y": 40, "width": 100, "height": 14,
                "background_color": null, "border": null, "image": null, "children": [],
                "text": {"lines": [{"text": "Hi", "x_offset": 0, "y_offset": 0}],
                         "font_size": 10, "bold": false, "italic": false,
                         "color": [0,0,0,1], "line_height": 13.5, "text_align": "left",
                         "underline": false, "list_marker": null}
            }]}]
        }"#;
        let config = LayoutConfig::from_json(json).unwrap();
        assert_eq!(config.title, "Document");
        assert!(config.font_path.is_none());
        assert_eq!(config.page_text(0), vec!["Hi"]);
        assert!(!config.pages[0].boxes[0].text.as_ref().unwrap().rtl);
    }
}
