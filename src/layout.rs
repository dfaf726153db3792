//! Layout – turns the styled tree into Taffy flexbox nodes, computes the
//! layout once for the whole document width and extracts absolutely
//! positioned boxes (x relative to the page, y in document space).
//!
//! Tables are modelled as flex columns of flex rows. Cells with a fractional
//! width get that share of the row; the rest split what remains by
//! `colspan`. Rows and flex containers in RTL flow are laid out reversed.

use std::collections::HashMap;

use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};
use taffy::prelude::{
    AvailableSpace, Dimension as TaffyDim, LengthPercentage, LengthPercentageAuto, NodeId, Rect,
    Size, Style, TaffyTree,
};

use crate::dom::Tag;
use crate::error::{RenderError, Result};
use crate::fonts::{wrap_text, FontManager};
use crate::style::{self, ComputedStyle, Dimension, Display, FontWeight, StyledNode};

#[derive(Debug, Clone)]
pub struct PositionedBox {
    pub tag: Option<Tag>,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub style: ComputedStyle,
    pub content: BoxContent,
    pub children: Vec<PositionedBox>,
}

impl PositionedBox {
    pub fn is(&self, tag: &Tag) -> bool {
        self.tag.as_ref() == Some(tag)
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

#[derive(Debug, Clone)]
pub enum BoxContent {
    None,
    /// Pre-wrapped lines.
    Text { lines: Vec<String> },
    Image { src: String },
    ListItem { marker: String },
}

fn to_taffy_err(e: taffy::TaffyError) -> RenderError {
    RenderError::Layout(e.to_string())
}

fn lp(v: f32) -> LengthPercentage {
    LengthPercentage::Length(v)
}

fn lpa(v: f32) -> LengthPercentageAuto {
    LengthPercentageAuto::Length(v)
}

fn margins(s: &ComputedStyle) -> Rect<LengthPercentageAuto> {
    Rect {
        top: lpa(s.margin_top),
        right: lpa(s.margin_right),
        bottom: lpa(s.margin_bottom),
        left: lpa(s.margin_left),
    }
}

fn paddings(s: &ComputedStyle) -> Rect<LengthPercentage> {
    Rect {
        top: lp(s.padding_top),
        right: lp(s.padding_right),
        bottom: lp(s.padding_bottom),
        left: lp(s.padding_left),
    }
}

fn borders(s: &ComputedStyle) -> Rect<LengthPercentage> {
    Rect {
        top: lp(s.border_width),
        right: lp(s.border_width),
        bottom: lp(s.border_width),
        left: lp(s.border_width),
    }
}

fn dim(d: Dimension) -> TaffyDim {
    match d {
        Dimension::Auto => TaffyDim::Auto,
        Dimension::Pt(v) => TaffyDim::Length(v),
        Dimension::Percent(v) => TaffyDim::Percent(v / 100.0),
    }
}

fn row_direction(s: &ComputedStyle) -> taffy::FlexDirection {
    if s.is_rtl() {
        taffy::FlexDirection::RowReverse
    } else {
        taffy::FlexDirection::Row
    }
}

// ---------------------------------------------------------------------------
// Tree building
// ---------------------------------------------------------------------------

struct LayoutBuilder<'a> {
    taffy: TaffyTree<()>,
    fonts: &'a FontManager,
    node_styles: HashMap<NodeId, ComputedStyle>,
    node_tags: HashMap<NodeId, Tag>,
    node_content: HashMap<NodeId, BoxContent>,
    max_image_height: f32,
}

impl<'a> LayoutBuilder<'a> {
    fn new(fonts: &'a FontManager, max_image_height: f32) -> Self {
        Self {
            taffy: TaffyTree::new(),
            fonts,
            node_styles: HashMap::new(),
            node_tags: HashMap::new(),
            node_content: HashMap::new(),
            max_image_height,
        }
    }

    /// Text of an inline run; `<br>` becomes a hard line break.
    fn inline_text(node: &StyledNode) -> String {
        match node {
            StyledNode::Text { text, .. } => text.clone(),
            StyledNode::Element { tag: Tag::Br, .. } => "\n".to_string(),
            StyledNode::Element { children, .. } => {
                children.iter().map(Self::inline_text).collect()
            }
        }
    }

    fn all_inline(children: &[StyledNode]) -> bool {
        children.iter().all(|c| match c {
            StyledNode::Text { .. } => true,
            StyledNode::Element {
                style,
                children: gc,
                ..
            } => style.display == Display::Inline && Self::all_inline(gc),
        })
    }

    /// Collapse whitespace per line, keeping `<br>` breaks.
    fn normalise(raw: &str) -> String {
        raw.split('\n')
            .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
            .collect::<Vec<_>>()
            .join("\n")
            .trim_matches('\n')
            .to_string()
    }

    fn build_node(&mut self, styled: &StyledNode, avail_width: f32) -> Result<NodeId> {
        match styled {
            StyledNode::Text { text, style } => {
                self.build_text_leaf(&Self::normalise(text), style, avail_width)
            }
            StyledNode::Element {
                tag,
                style,
                children,
                attrs,
            } => self.build_element(tag, style, children, attrs, avail_width),
        }
    }

    /// A wrapped text run. Its width stretches in column parents so lines
    /// can be aligned; the measured width is the minimum.
    fn build_text_leaf(
        &mut self,
        text: &str,
        style: &ComputedStyle,
        avail_width: f32,
    ) -> Result<NodeId> {
        let bold = style.font_weight == FontWeight::Bold;
        let lines = wrap_text(text, style.font_size, bold, avail_width, self.fonts);
        let text_width = lines
            .iter()
            .map(|l| self.fonts.measure_text_width(l, style.font_size, bold))
            .fold(0.0f32, f32::max)
            .min(avail_width.max(0.0));
        let height = lines.len() as f32 * self.fonts.line_height(style.font_size, style.line_height);

        let node = self
            .taffy
            .new_leaf(Style {
                size: Size {
                    width: TaffyDim::Auto,
                    height: TaffyDim::Length(height),
                },
                min_size: Size {
                    width: TaffyDim::Length(text_width),
                    height: TaffyDim::Length(height),
                },
                flex_shrink: 0.0,
                ..Default::default()
            })
            .map_err(to_taffy_err)?;
        self.node_styles.insert(node, style.clone());
        self.node_content.insert(node, BoxContent::Text { lines });
        Ok(node)
    }

    fn build_element(
        &mut self,
        tag: &Tag,
        style: &ComputedStyle,
        children: &[StyledNode],
        attrs: &HashMap<String, String>,
        avail_width: f32,
    ) -> Result<NodeId> {
        let own_width = match style.width {
            Dimension::Pt(w) => w,
            Dimension::Percent(p) => avail_width * p / 100.0,
            Dimension::Auto => avail_width,
        };
        let inner_width = (own_width
            - style.padding_left
            - style.padding_right
            - 2.0 * style.border_width
            - style.margin_left
            - style.margin_right)
            .max(1.0);

        let mut child_nodes = Vec::with_capacity(children.len());

        if *tag != Tag::Img && !children.is_empty() && Self::all_inline(children) {
            // One wrapped run for the whole inline content. A lone inline
            // child (`<p><strong>..</strong></p>`) lends its typography.
            let text = Self::normalise(&children.iter().map(Self::inline_text).collect::<String>());
            let run_style = ComputedStyle::for_text(match children {
                [only @ StyledNode::Element { .. }] => only.style(),
                _ => style,
            });
            if !text.is_empty() {
                child_nodes.push(self.build_text_leaf(&text, &run_style, inner_width)?);
            }
        } else {
            let widths = self.child_widths(tag, style, children, inner_width);
            let mut list_counter = 0u32;
            for (child, width) in children.iter().zip(widths) {
                let id = self.build_node(child, width)?;
                if let StyledNode::Element { tag: Tag::Li, .. } = child {
                    list_counter += 1;
                    let marker = if *tag == Tag::Ol {
                        format!("{list_counter}.")
                    } else {
                        "\u{2022}".to_string()
                    };
                    self.node_content.insert(id, BoxContent::ListItem { marker });
                }
                child_nodes.push(id);
            }
        }

        let effective = if *tag == Tag::Img {
            let src = attrs.get("src").map(String::as_str).unwrap_or_default();
            image_style(src, style, avail_width, self.max_image_height)
                .unwrap_or_else(|| style.clone())
        } else {
            style.clone()
        };

        let taffy_style = self.taffy_style(&effective, tag);
        let node = self
            .taffy
            .new_with_children(taffy_style, &child_nodes)
            .map_err(to_taffy_err)?;
        self.node_styles.insert(node, effective);
        self.node_tags.insert(node, tag.clone());
        if *tag == Tag::Img {
            let src = attrs.get("src").cloned().unwrap_or_default();
            self.node_content.insert(node, BoxContent::Image { src });
        }
        Ok(node)
    }

    /// Width each child will get, used to wrap text at build time.
    fn child_widths(
        &self,
        tag: &Tag,
        style: &ComputedStyle,
        children: &[StyledNode],
        inner: f32,
    ) -> Vec<f32> {
        let is_row = *tag == Tag::Tr
            || (style.display == Display::Flex && style.flex_direction == style::FlexDirection::Row);
        if !is_row {
            return vec![inner; children.len()];
        }
        if *tag == Tag::Tr {
            return cell_widths(children, inner);
        }
        let n = children.len().max(1) as f32;
        let gaps = style.gap * (n - 1.0);
        vec![((inner - gaps) / n).max(1.0); children.len()]
    }

    fn taffy_style(&self, s: &ComputedStyle, tag: &Tag) -> Style {
        let mut ts = Style {
            margin: margins(s),
            padding: paddings(s),
            border: borders(s),
            ..Default::default()
        };

        match s.display {
            Display::Table | Display::TableRowGroup => {
                ts.display = taffy::Display::Flex;
                ts.flex_direction = taffy::FlexDirection::Column;
                ts.size.width = if s.display == Display::TableRowGroup {
                    TaffyDim::Percent(1.0)
                } else {
                    dim(s.width)
                };
                ts.min_size.width = TaffyDim::Length(0.0);
                return ts;
            }
            Display::TableRow => {
                ts.display = taffy::Display::Flex;
                ts.flex_direction = row_direction(s);
                ts.align_items = Some(taffy::AlignItems::Stretch);
                ts.size.width = TaffyDim::Percent(1.0);
                ts.min_size.width = TaffyDim::Length(0.0);
                return ts;
            }
            Display::TableCell => {
                ts.display = taffy::Display::Flex;
                ts.flex_direction = taffy::FlexDirection::Column;
                ts.min_size.width = TaffyDim::Length(0.0);
                match s.width {
                    Dimension::Auto => {
                        ts.flex_grow = s.col_span as f32;
                        ts.flex_shrink = 1.0;
                        ts.flex_basis = TaffyDim::Length(0.0);
                    }
                    w => {
                        ts.flex_grow = 0.0;
                        ts.flex_shrink = 0.0;
                        ts.flex_basis = dim(w);
                    }
                }
                return ts;
            }
            Display::Flex => {
                ts.display = taffy::Display::Flex;
                ts.flex_direction = match s.flex_direction {
                    style::FlexDirection::Row => row_direction(s),
                    style::FlexDirection::Column => taffy::FlexDirection::Column,
                };
                ts.flex_wrap = match s.flex_wrap {
                    style::FlexWrap::NoWrap => taffy::FlexWrap::NoWrap,
                    style::FlexWrap::Wrap => taffy::FlexWrap::Wrap,
                };
                ts.justify_content = Some(match s.justify_content {
                    style::JustifyContent::Start => taffy::JustifyContent::Start,
                    style::JustifyContent::End => taffy::JustifyContent::End,
                    style::JustifyContent::Center => taffy::JustifyContent::Center,
                    style::JustifyContent::SpaceBetween => taffy::JustifyContent::SpaceBetween,
                    style::JustifyContent::SpaceAround => taffy::JustifyContent::SpaceAround,
                    style::JustifyContent::SpaceEvenly => taffy::JustifyContent::SpaceEvenly,
                });
                ts.align_items = Some(match s.align_items {
                    style::AlignItems::Start => taffy::AlignItems::Start,
                    style::AlignItems::End => taffy::AlignItems::End,
                    style::AlignItems::Center => taffy::AlignItems::Center,
                    style::AlignItems::Stretch => taffy::AlignItems::Stretch,
                });
                ts.gap = Size {
                    width: lp(s.gap),
                    height: lp(s.gap),
                };
            }
            Display::Inline => {
                ts.display = taffy::Display::Flex;
                ts.flex_direction = row_direction(s);
                ts.flex_wrap = taffy::FlexWrap::Wrap;
            }
            Display::Block | Display::ListItem | Display::InlineBlock => {
                ts.display = taffy::Display::Flex;
                ts.flex_direction = taffy::FlexDirection::Column;
            }
            Display::None => ts.display = taffy::Display::None,
        }

        ts.size = Size {
            width: dim(s.width),
            height: dim(s.height),
        };
        ts.min_size.width = if s.flex_shrink > 0.0 || s.flex_grow > 0.0 {
            TaffyDim::Length(0.0)
        } else {
            dim(s.min_width)
        };
        ts.max_size.width = dim(s.max_width);
        ts.flex_grow = s.flex_grow;
        ts.flex_shrink = s.flex_shrink;
        if *tag == Tag::Img {
            ts.flex_shrink = 0.0;
        }
        ts
    }

    fn extract(&self, node: NodeId, offset_x: f32, offset_y: f32) -> Result<PositionedBox> {
        let layout = self.taffy.layout(node).map_err(to_taffy_err)?;
        let x = offset_x + layout.location.x;
        let y = offset_y + layout.location.y;

        let children = self
            .taffy
            .children(node)
            .map_err(to_taffy_err)?
            .into_iter()
            .map(|child| self.extract(child, x, y))
            .collect::<Result<Vec<_>>>()?;

        Ok(PositionedBox {
            tag: self.node_tags.get(&node).cloned(),
            x,
            y,
            width: layout.size.width,
            height: layout.size.height,
            style: self.node_styles.get(&node).cloned().unwrap_or_default(),
            content: self
                .node_content
                .get(&node)
                .cloned()
                .unwrap_or(BoxContent::None),
            children,
        })
    }
}

/// Split a row's inner width across its cells: fixed shares first, the rest
/// by `colspan`.
fn cell_widths(cells: &[StyledNode], inner: f32) -> Vec<f32> {
    let fixed: Vec<Option<f32>> = cells
        .iter()
        .map(|c| match c.style().width {
            Dimension::Pt(w) => Some(w),
            Dimension::Percent(p) => Some(inner * p / 100.0),
            Dimension::Auto => None,
        })
        .collect();
    let used: f32 = fixed.iter().flatten().sum();
    let spans: u32 = cells
        .iter()
        .zip(&fixed)
        .filter(|(_, f)| f.is_none())
        .map(|(c, _)| c.style().col_span)
        .sum();
    let per_span = if spans > 0 {
        ((inner - used) / spans as f32).max(1.0)
    } else {
        0.0
    };
    cells
        .iter()
        .zip(fixed)
        .map(|(c, f)| f.unwrap_or(per_span * c.style().col_span as f32))
        .collect()
}

/// Resolve `Auto` image sides from the intrinsic size of a data-URI image,
/// clamped so an image never exceeds one page.
fn image_style(
    src: &str,
    style: &ComputedStyle,
    avail_width: f32,
    max_height: f32,
) -> Option<ComputedStyle> {
    let (_, b64) = src.strip_prefix("data:")?.split_once(";base64,")?;
    let bytes = BASE64_STD.decode(b64.trim()).ok()?;
    let img = image::load_from_memory(&bytes).ok()?;
    let (px_w, px_h) = (img.width() as f32, img.height() as f32);
    if px_w == 0.0 || px_h == 0.0 {
        return None;
    }
    let aspect = px_w / px_h;

    let known_w = match style.width {
        Dimension::Pt(v) => Some(v),
        Dimension::Percent(p) => Some(avail_width * p / 100.0),
        Dimension::Auto => None,
    };
    let known_h = match style.height {
        Dimension::Pt(v) => Some(v),
        _ => None,
    };
    let (mut w, mut h) = match (known_w, known_h) {
        (Some(w), Some(h)) => (w, h),
        (Some(w), None) => (w, w / aspect),
        (None, Some(h)) => (h * aspect, h),
        // 1 px = 0.75 pt, never wider than the line.
        (None, None) => {
            let w = (px_w * 0.75).min(avail_width);
            (w, w / aspect)
        }
    };
    if max_height > 0.0 && h > max_height {
        w *= max_height / h;
        h = max_height;
    }

    let mut s = style.clone();
    s.width = Dimension::Pt(w.max(1.0));
    s.height = Dimension::Pt(h.max(1.0));
    Some(s)
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Lay out `styled_nodes` in a column `content_width` wide starting at
/// `origin_x`. `max_image_height` is the usable page height.
pub fn compute_layout(
    styled_nodes: &[StyledNode],
    content_width: f32,
    origin_x: f32,
    max_image_height: f32,
    fonts: &FontManager,
) -> Result<Vec<PositionedBox>> {
    let mut builder = LayoutBuilder::new(fonts, max_image_height);

    let child_ids = styled_nodes
        .iter()
        .map(|node| builder.build_node(node, content_width))
        .collect::<Result<Vec<_>>>()?;

    let root = builder
        .taffy
        .new_with_children(
            Style {
                display: taffy::Display::Flex,
                flex_direction: taffy::FlexDirection::Column,
                size: Size {
                    width: TaffyDim::Length(content_width),
                    height: TaffyDim::Auto,
                },
                ..Default::default()
            },
            &child_ids,
        )
        .map_err(to_taffy_err)?;

    builder
        .taffy
        .compute_layout(
            root,
            Size {
                width: AvailableSpace::Definite(content_width),
                height: AvailableSpace::MaxContent,
            },
        )
        .map_err(to_taffy_err)?;

    Ok(builder.extract(root, origin_x, 0.0)?.children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;
    use crate::locale::Direction;
    use crate::style::build_styled_tree;

    fn layout(html: &str, direction: Direction) -> Vec<PositionedBox> {
        let styled = build_styled_tree(&parse_html(html), &ComputedStyle::root(direction));
        compute_layout(&styled, 500.0, 40.0, 760.0, &FontManager::builtin()).unwrap()
    }

    fn find_text<'a>(b: &'a PositionedBox, needle: &str) -> Option<&'a PositionedBox> {
        if let BoxContent::Text { lines } = &b.content {
            if lines.iter().any(|l| l.contains(needle)) {
                return Some(b);
            }
        }
        b.children.iter().find_map(|c| find_text(c, needle))
    }

    #[test]
    fn paragraph_has_size() {
        let boxes = layout("<p>Hello world</p>", Direction::Ltr);
        assert_eq!(boxes.len(), 1);
        assert!(boxes[0].width > 0.0);
        assert!(boxes[0].height > 0.0);
        assert_eq!(boxes[0].x, 40.0);
    }

    #[test]
    fn inline_children_merge_into_one_run() {
        let boxes = layout("<p>Unit <strong>A-101</strong> ready</p>", Direction::Ltr);
        let run = find_text(&boxes[0], "A-101").unwrap();
        let BoxContent::Text { lines } = &run.content else {
            unreachable!()
        };
        assert_eq!(lines, &vec!["Unit A-101 ready".to_string()]);
    }

    #[test]
    fn fractional_cell_width_is_respected() {
        let boxes = layout(
            r#"<table class="w-full"><tr><td class="w-1/3">Label</td><td>Value</td></tr></table>"#,
            Direction::Ltr,
        );
        let row = &boxes[0].children[0];
        let (label, value) = (&row.children[0], &row.children[1]);
        assert!((label.width - 500.0 / 3.0).abs() < 1.0, "label {}", label.width);
        assert!(value.x > label.x);
    }

    #[test]
    fn rtl_rows_run_right_to_left() {
        let boxes = layout(
            r#"<table class="w-full"><tr><td>first</td><td>second</td></tr></table>"#,
            Direction::Rtl,
        );
        let row = &boxes[0].children[0];
        assert!(row.children[0].x > row.children[1].x);
    }

    #[test]
    fn colspan_widens_cell() {
        let boxes = layout(
            r#"<table class="w-full"><tr><td colspan="2">wide</td><td>narrow</td></tr></table>"#,
            Direction::Ltr,
        );
        let row = &boxes[0].children[0];
        assert!(row.children[0].width > 1.5 * row.children[1].width);
    }

    #[test]
    fn text_in_cells_stretches_for_alignment() {
        let boxes = layout(
            r#"<table class="w-full"><tr><td class="text-right">1,500.00</td></tr></table>"#,
            Direction::Ltr,
        );
        let run = find_text(&boxes[0], "1,500.00").unwrap();
        assert!(run.width > 400.0);
    }
}
