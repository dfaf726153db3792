//! Pagination – splits the document-space boxes into pages and stamps the
//! running header and footer on each one.
//!
//! Handles:
//! - page-break-before / page-break-after
//! - keeping `break-inside-avoid` blocks whole
//! - splitting tables between rows, repeating `thead` rows on each
//!   continuation page
//! - `{page}` / `{pages}` / `{title}` substitution in header and footer

use crate::fonts::FontManager;
use crate::layout::{BoxContent, PositionedBox};
use crate::layout_config::*;
use crate::dom::Tag;
use crate::style::{self, ComputedStyle};

/// Default page margin in points.
pub const PAGE_MARGIN_PT: f32 = 40.0;

const FURNITURE_FONT_SIZE: f32 = 7.5;
const FURNITURE_GAP: f32 = 8.0;
const FURNITURE_COLOR: [f32; 4] = [0.42, 0.45, 0.50, 1.0];

/// Page geometry plus running header/footer templates.
#[derive(Debug, Clone)]
pub struct PageSetup {
    pub title: String,
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
    pub header: Option<String>,
    pub footer: Option<String>,
    pub rtl: bool,
}

impl PageSetup {
    pub fn new(page_width: f32, page_height: f32, margin: f32) -> Self {
        Self {
            title: String::new(),
            page_width,
            page_height,
            margin,
            header: None,
            footer: None,
            rtl: false,
        }
    }

    fn band_height(text: &Option<String>) -> f32 {
        if text.is_some() {
            FURNITURE_FONT_SIZE * 1.35 + FURNITURE_GAP
        } else {
            0.0
        }
    }

    /// Page y where body content starts.
    pub fn content_top(&self) -> f32 {
        self.margin + Self::band_height(&self.header)
    }

    /// Usable body height per page.
    pub fn content_height(&self) -> f32 {
        self.page_height
            - 2.0 * self.margin
            - Self::band_height(&self.header)
            - Self::band_height(&self.footer)
    }

    pub fn content_width(&self) -> f32 {
        self.page_width - 2.0 * self.margin
    }
}

/// A box scheduled for placement, with break hints inherited from any
/// wrapper that was flattened away.
struct Item<'a> {
    pbox: &'a PositionedBox,
    break_before: bool,
    break_after: bool,
}

/// Expand wrappers taller than a page so their children can be placed
/// individually. Tables are left whole; they split by rows later.
fn flatten<'a>(boxes: &'a [PositionedBox], content_height: f32, out: &mut Vec<Item<'a>>) {
    for pbox in boxes {
        let splittable = pbox.height > content_height
            && matches!(pbox.content, BoxContent::None)
            && !pbox.children.is_empty()
            && !pbox.is(&Tag::Table);
        if splittable {
            let start = out.len();
            flatten(&pbox.children, content_height, out);
            if let Some(first) = out.get_mut(start) {
                first.break_before |= pbox.style.page_break_before;
            }
            if let Some(last) = out.last_mut() {
                last.break_after |= pbox.style.page_break_after;
            }
        } else {
            out.push(Item {
                pbox,
                break_before: pbox.style.page_break_before,
                break_after: pbox.style.page_break_after,
            });
        }
    }
}

/// Placement cursor: maps document-space y to page y.
struct Cursor {
    pages: Vec<PageLayout>,
    current: PageLayout,
    /// Document y that sits at the top of the current page's body.
    page_start: f32,
    /// Extra page-y offset, used after repeated table headers.
    shift: f32,
}

impl Cursor {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            current: PageLayout {
                page_index: 0,
                boxes: Vec::new(),
            },
            page_start: 0.0,
            shift: 0.0,
        }
    }

    fn y_on_page(&self, pbox: &PositionedBox) -> f32 {
        self.y_at(pbox.y)
    }

    fn y_at(&self, doc_y: f32) -> f32 {
        (doc_y - self.page_start).max(0.0) + self.shift
    }

    fn is_empty(&self) -> bool {
        self.current.boxes.is_empty()
    }

    fn new_page(&mut self, page_start: f32) {
        let next = PageLayout {
            page_index: self.pages.len() + 1,
            boxes: Vec::new(),
        };
        self.pages.push(std::mem::replace(&mut self.current, next));
        self.page_start = page_start;
        self.shift = 0.0;
    }

    fn finish(mut self) -> Vec<PageLayout> {
        if !self.current.boxes.is_empty() || self.pages.is_empty() {
            self.pages.push(self.current);
        }
        self.pages
    }
}

/// Split `boxes` into pages of `setup`'s body height.
pub fn paginate(boxes: &[PositionedBox], setup: &PageSetup, fonts: &FontManager) -> LayoutConfig {
    let content_height = setup.content_height();
    let top = setup.content_top();

    let mut items = Vec::new();
    flatten(boxes, content_height, &mut items);

    let mut cursor = Cursor::new();
    for item in &items {
        let pbox = item.pbox;
        if item.break_before && !cursor.is_empty() {
            cursor.new_page(pbox.y);
        }

        // A paragraph taller than a whole page body can only be split by lines.
        if let BoxContent::Text { lines } = &pbox.content {
            if pbox.height > content_height {
                split_text(pbox, lines, &mut cursor, content_height, top, fonts);
                if item.break_after {
                    cursor.new_page(pbox.bottom());
                }
                continue;
            }
        }

        if cursor.y_on_page(pbox) + pbox.height > content_height && !cursor.is_empty() {
            if pbox.is(&Tag::Table) && !pbox.style.page_break_inside_avoid {
                split_table(pbox, &mut cursor, content_height, top, fonts);
                if item.break_after {
                    cursor.new_page(pbox.bottom());
                }
                continue;
            }
            cursor.new_page(pbox.y);
        } else if pbox.is(&Tag::Table) && pbox.height > content_height {
            // First thing on a page and still too tall: split anyway.
            split_table(pbox, &mut cursor, content_height, top, fonts);
            if item.break_after {
                cursor.new_page(pbox.bottom());
            }
            continue;
        }

        let y = top + cursor.y_on_page(pbox);
        cursor.current.boxes.push(build_layout_box(pbox, pbox.x, y, fonts));

        if item.break_after {
            cursor.new_page(pbox.bottom());
        }
    }

    let mut config = LayoutConfig {
        title: setup.title.clone(),
        page_width_pt: setup.page_width,
        page_height_pt: setup.page_height,
        font_path: None,
        pages: cursor.finish(),
    };
    stamp_furniture(&mut config, setup, fonts);
    config
}

/// `(header rows, body rows)` of a table, looking through row groups.
fn table_rows(table: &PositionedBox) -> (Vec<&PositionedBox>, Vec<&PositionedBox>) {
    let mut head = Vec::new();
    let mut body = Vec::new();
    for child in &table.children {
        match child.tag {
            Some(Tag::Thead) => head.extend(child.children.iter()),
            Some(Tag::Tbody) => body.extend(child.children.iter()),
            _ => body.push(child),
        }
    }
    (head, body)
}

fn split_table(
    table: &PositionedBox,
    cursor: &mut Cursor,
    content_height: f32,
    top: f32,
    fonts: &FontManager,
) {
    let (head, body) = table_rows(table);
    let head_height: f32 = head.iter().map(|r| r.height).sum();

    for row in head.iter() {
        let y = top + cursor.y_on_page(row);
        cursor.current.boxes.push(build_layout_box(row, row.x, y, fonts));
    }

    for row in body {
        if cursor.y_on_page(row) + row.height > content_height && !cursor.is_empty() {
            cursor.new_page(row.y);
            if !head.is_empty() && head_height + row.height <= content_height {
                let mut y = top;
                for h in &head {
                    cursor.current.boxes.push(build_layout_box(h, h.x, y, fonts));
                    y += h.height;
                }
                cursor.shift = head_height;
            }
        }
        let y = top + cursor.y_on_page(row);
        cursor.current.boxes.push(build_layout_box(row, row.x, y, fonts));
    }
}

/// Place a text run line by line, carrying the lines that do not fit onto
/// continuation pages. Each page receives its own box for its slice of lines.
fn split_text(
    pbox: &PositionedBox,
    lines: &[String],
    cursor: &mut Cursor,
    content_height: f32,
    top: f32,
    fonts: &FontManager,
) {
    let line_height = fonts.line_height(pbox.style.font_size, pbox.style.line_height);
    let mut rest = lines;
    let mut doc_y = pbox.y;

    while !rest.is_empty() {
        let room = content_height - cursor.y_at(doc_y);
        let mut fit = (room / line_height).floor().max(0.0) as usize;
        if fit == 0 {
            if !cursor.is_empty() {
                cursor.new_page(doc_y);
                continue;
            }
            // Line taller than the body; place it anyway so we make progress.
            fit = 1;
        }

        let (slice, tail) = rest.split_at(fit.min(rest.len()));
        let height = slice.len() as f32 * line_height;
        let part = PositionedBox {
            y: doc_y,
            height,
            content: BoxContent::Text {
                lines: slice.to_vec(),
            },
            children: Vec::new(),
            ..pbox.clone()
        };
        let y = top + cursor.y_at(doc_y);
        cursor.current.boxes.push(build_layout_box(&part, part.x, y, fonts));

        doc_y += height;
        rest = tail;
    }
}

/// Copy a positioned box into page coordinates, recursively. Children keep
/// their offset from the parent.
fn build_layout_box(pbox: &PositionedBox, abs_x: f32, abs_y: f32, fonts: &FontManager) -> LayoutBox {
    let s = &pbox.style;
    let mut lb = LayoutBox::new(abs_x, abs_y, pbox.width, pbox.height);

    if !s.background_color.is_transparent() {
        lb.background_color = Some(s.background_color.to_array());
    }
    if s.border_width > 0.1 {
        lb.border = Some(BorderStyle {
            width: s.border_width,
            color: s.border_color.to_array(),
        });
    }

    match &pbox.content {
        BoxContent::Text { lines } => {
            lb.text = Some(text_content(lines, s, pbox.width, fonts, None));
        }
        BoxContent::ListItem { marker } => {
            lb.text = Some(text_content(&[], s, pbox.width, fonts, Some(marker.clone())));
        }
        BoxContent::Image { src } => {
            lb.image = Some(ImageContent {
                src: src.clone(),
                width: pbox.width,
                height: pbox.height,
            });
        }
        BoxContent::None => {}
    }

    lb.children = pbox
        .children
        .iter()
        .map(|child| build_layout_box(child, child.x, abs_y + (child.y - pbox.y), fonts))
        .collect();
    lb
}

fn text_content(
    lines: &[String],
    s: &ComputedStyle,
    box_width: f32,
    fonts: &FontManager,
    list_marker: Option<String>,
) -> TextContent {
    let bold = s.font_weight == style::FontWeight::Bold;
    let line_height = fonts.line_height(s.font_size, s.line_height);
    TextContent {
        lines: lines
            .iter()
            .enumerate()
            .map(|(i, line)| {
                let width = fonts.measure_text_width(line, s.font_size, bold);
                TextLine {
                    text: line.clone(),
                    x_offset: align_offset(s.text_align, box_width, width),
                    y_offset: i as f32 * line_height,
                    width,
                }
            })
            .collect(),
        font_size: s.font_size,
        bold,
        italic: s.font_style == style::FontStyle::Italic,
        color: s.color.to_array(),
        line_height,
        text_align: s.text_align.as_str().to_string(),
        underline: s.text_decoration == style::TextDecoration::Underline,
        rtl: s.is_rtl(),
        list_marker,
    }
}

fn align_offset(align: style::TextAlign, box_width: f32, line_width: f32) -> f32 {
    let free = (box_width - line_width).max(0.0);
    match align {
        style::TextAlign::Left => 0.0,
        style::TextAlign::Center => free / 2.0,
        style::TextAlign::Right => free,
    }
}

/// Fill `{page}`, `{pages}` and `{title}`.
pub fn substitute(template: &str, page: usize, pages: usize, title: &str) -> String {
    template
        .replace("{page}", &page.to_string())
        .replace("{pages}", &pages.to_string())
        .replace("{title}", title)
}

fn stamp_furniture(config: &mut LayoutConfig, setup: &PageSetup, fonts: &FontManager) {
    let total = config.pages.len();
    let width = setup.content_width();
    let line_height = FURNITURE_FONT_SIZE * 1.35;

    let band = |text: String, y: f32, align: style::TextAlign| {
        let line_width = fonts.measure_text_width(&text, FURNITURE_FONT_SIZE, false);
        let mut lb = LayoutBox::new(setup.margin, y, width, line_height);
        lb.text = Some(TextContent {
            lines: vec![TextLine {
                text,
                x_offset: align_offset(align, width, line_width),
                y_offset: 0.0,
                width: line_width,
            }],
            font_size: FURNITURE_FONT_SIZE,
            bold: false,
            italic: false,
            color: FURNITURE_COLOR,
            line_height,
            text_align: align.as_str().to_string(),
            underline: false,
            rtl: setup.rtl,
            list_marker: None,
        });
        lb
    };

    let start = if setup.rtl {
        style::TextAlign::Right
    } else {
        style::TextAlign::Left
    };
    for (i, page) in config.pages.iter_mut().enumerate() {
        if let Some(h) = &setup.header {
            let text = substitute(h, i + 1, total, &setup.title);
            page.boxes.insert(0, band(text, setup.margin, start));
        }
        if let Some(f) = &setup.footer {
            let text = substitute(f, i + 1, total, &setup.title);
            let y = setup.page_height - setup.margin - line_height;
            page.boxes.push(band(text, y, style::TextAlign::Center));
        }
    }
}
