//! Style resolution – tag defaults, the utility-class subset the templates
//! use, a few inline CSS properties and the `dir`/`colspan` attributes,
//! flattened into one [`ComputedStyle`] per element.
//!
//! Lengths are PDF points throughout. Utility spacing uses one step = 3 pt.

use std::collections::HashMap;

use crate::dom::{DomNode, ElementNode, Tag};
use crate::locale::Direction;

/// Points per utility spacing step (`mb-4` = 12 pt).
const SPACING_UNIT: f32 = 3.0;

/// Body text size in points.
pub const BASE_FONT_SIZE: f32 = 10.0;

#[derive(Debug, Clone)]
pub struct ComputedStyle {
    pub display: Display,
    pub flex_direction: FlexDirection,
    pub flex_wrap: FlexWrap,
    pub flex_grow: f32,
    pub flex_shrink: f32,
    pub justify_content: JustifyContent,
    pub align_items: AlignItems,
    pub gap: f32,

    pub width: Dimension,
    pub height: Dimension,
    pub min_width: Dimension,
    pub max_width: Dimension,

    pub margin_top: f32,
    pub margin_right: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub padding_top: f32,
    pub padding_right: f32,
    pub padding_bottom: f32,
    pub padding_left: f32,

    pub border_width: f32,
    pub border_color: Color,

    // Inherited
    pub font_size: f32,
    pub font_weight: FontWeight,
    pub font_family: String,
    pub font_style: FontStyle,
    pub color: Color,
    pub text_align: TextAlign,
    pub line_height: f32,
    pub direction: Direction,
    /// Cleared by `border-0` on a table; cells below it draw no border.
    pub cell_borders: bool,

    pub text_decoration: TextDecoration,
    pub background_color: Color,
    /// Table cell `colspan`.
    pub col_span: u32,

    pub page_break_before: bool,
    pub page_break_after: bool,
    pub page_break_inside_avoid: bool,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: Display::Block,
            flex_direction: FlexDirection::Row,
            flex_wrap: FlexWrap::NoWrap,
            flex_grow: 0.0,
            flex_shrink: 1.0,
            justify_content: JustifyContent::Start,
            align_items: AlignItems::Stretch,
            gap: 0.0,
            width: Dimension::Auto,
            height: Dimension::Auto,
            min_width: Dimension::Auto,
            max_width: Dimension::Auto,
            margin_top: 0.0,
            margin_right: 0.0,
            margin_bottom: 0.0,
            margin_left: 0.0,
            padding_top: 0.0,
            padding_right: 0.0,
            padding_bottom: 0.0,
            padding_left: 0.0,
            border_width: 0.0,
            border_color: Color::BORDER,
            font_size: BASE_FONT_SIZE,
            font_weight: FontWeight::Normal,
            font_family: "Helvetica".to_string(),
            font_style: FontStyle::Normal,
            color: Color::TEXT,
            text_align: TextAlign::Left,
            line_height: 1.35,
            direction: Direction::Ltr,
            cell_borders: true,
            text_decoration: TextDecoration::None,
            background_color: Color::TRANSPARENT,
            col_span: 1,
            page_break_before: false,
            page_break_after: false,
            page_break_inside_avoid: false,
        }
    }
}

impl ComputedStyle {
    /// Root style for a document flowing in `direction`.
    pub fn root(direction: Direction) -> Self {
        Self {
            direction,
            text_align: start_align(direction),
            ..Self::default()
        }
    }

    /// Text runs inherit typography only; box properties stay on the element.
    pub fn for_text(parent: &ComputedStyle) -> Self {
        Self {
            font_size: parent.font_size,
            font_weight: parent.font_weight,
            font_family: parent.font_family.clone(),
            font_style: parent.font_style,
            color: parent.color,
            text_align: parent.text_align,
            line_height: parent.line_height,
            direction: parent.direction,
            cell_borders: parent.cell_borders,
            text_decoration: parent.text_decoration,
            ..Self::default()
        }
    }

    pub fn is_rtl(&self) -> bool {
        self.direction == Direction::Rtl
    }
}

fn start_align(direction: Direction) -> TextAlign {
    match direction {
        Direction::Ltr => TextAlign::Left,
        Direction::Rtl => TextAlign::Right,
    }
}

// ---------------------------------------------------------------------------
// Supporting enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
    Block,
    Flex,
    Inline,
    InlineBlock,
    ListItem,
    Table,
    TableRowGroup,
    TableRow,
    TableCell,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlexDirection {
    Row,
    Column,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlexWrap {
    NoWrap,
    Wrap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JustifyContent {
    Start,
    End,
    Center,
    SpaceBetween,
    SpaceAround,
    SpaceEvenly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignItems {
    Start,
    End,
    Center,
    Stretch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

impl TextAlign {
    pub fn as_str(self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextDecoration {
    None,
    Underline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Normal,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dimension {
    Auto,
    Pt(f32),
    Percent(f32),
}

/// RGBA colour, components 0.0 – 1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    /// gray-900
    pub const TEXT: Self = Self::rgb(0.067, 0.094, 0.153);
    /// gray-300
    pub const BORDER: Self = Self::rgb(0.820, 0.835, 0.859);
    pub const TRANSPARENT: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn is_transparent(&self) -> bool {
        self.a < 0.001
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// `#rrggbb` or `#rgb`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        let expanded: String = match hex.len() {
            6 => hex.to_string(),
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            _ => return None,
        };
        let channel = |i: usize| {
            u8::from_str_radix(&expanded[i..i + 2], 16)
                .ok()
                .map(|v| v as f32 / 255.0)
        };
        Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    fn named(name: &str) -> Option<Self> {
        const PALETTE: &[(&str, &str)] = &[
            ("gray-50", "#f9fafb"),
            ("gray-100", "#f3f4f6"),
            ("gray-200", "#e5e7eb"),
            ("gray-300", "#d1d5db"),
            ("gray-400", "#9ca3af"),
            ("gray-500", "#6b7280"),
            ("gray-600", "#4b5563"),
            ("gray-700", "#374151"),
            ("gray-800", "#1f2937"),
            ("gray-900", "#111827"),
            ("red-600", "#dc2626"),
            ("amber-600", "#d97706"),
            ("green-700", "#15803d"),
            ("blue-700", "#1d4ed8"),
            ("blue-900", "#1e3a8a"),
            ("white", "#ffffff"),
            ("black", "#000000"),
        ];
        PALETTE
            .iter()
            .find(|(n, _)| *n == name)
            .and_then(|(_, hex)| Color::from_hex(hex))
    }
}

// ---------------------------------------------------------------------------
// Style resolution
// ---------------------------------------------------------------------------

/// Resolve an element's style. Order: tag defaults, inherited text
/// properties, `dir`, utility classes, inline `style`, `colspan`.
pub fn resolve_style(element: &ElementNode, parent: &ComputedStyle) -> ComputedStyle {
    let mut style = ComputedStyle::for_text(parent);
    style.text_decoration = TextDecoration::None;
    apply_tag_defaults(&mut style, &element.tag);
    if !style.cell_borders && element.tag.is_cell() {
        style.border_width = 0.0;
    }

    if let Some(dir) = element.dir() {
        style.direction = dir;
        style.text_align = start_align(dir);
    }

    for class in element.classes() {
        apply_utility_class(&mut style, class);
    }

    if let Some(inline) = element.inline_style() {
        apply_inline_style(&mut style, inline);
    }

    if element.tag.is_cell() {
        style.col_span = element.colspan();
    }
    style
}

fn apply_tag_defaults(s: &mut ComputedStyle, tag: &Tag) {
    match tag {
        Tag::H1 => heading(s, 18.0, 4.0, 8.0),
        Tag::H2 => heading(s, 13.0, 6.0, 4.0),
        Tag::H3 => heading(s, 11.5, 4.0, 3.0),
        Tag::H4 => heading(s, 10.5, 3.0, 2.0),
        Tag::P => s.margin_bottom = 4.0,
        Tag::Ul | Tag::Ol => {
            s.margin_bottom = 6.0;
            s.padding_left = 18.0;
        }
        Tag::Li => {
            s.display = Display::ListItem;
            s.margin_bottom = 2.0;
        }
        Tag::Table => {
            s.display = Display::Table;
            s.margin_bottom = 6.0;
            s.cell_borders = true;
        }
        Tag::Thead | Tag::Tbody => s.display = Display::TableRowGroup,
        Tag::Tr => s.display = Display::TableRow,
        Tag::Td | Tag::Th => {
            s.display = Display::TableCell;
            s.padding_top = 3.0;
            s.padding_bottom = 3.0;
            s.padding_left = 6.0;
            s.padding_right = 6.0;
            s.border_width = 0.75;
            if *tag == Tag::Th {
                s.font_weight = FontWeight::Bold;
                s.background_color = Color::named("gray-200").unwrap_or(Color::WHITE);
            }
        }
        Tag::Hr => {
            s.height = Dimension::Pt(0.0);
            s.border_width = 0.5;
            s.margin_top = 6.0;
            s.margin_bottom = 6.0;
        }
        Tag::Span | Tag::Br => s.display = Display::Inline,
        Tag::Strong => {
            s.display = Display::Inline;
            s.font_weight = FontWeight::Bold;
        }
        Tag::Em => {
            s.display = Display::Inline;
            s.font_style = FontStyle::Italic;
        }
        Tag::U => {
            s.display = Display::Inline;
            s.text_decoration = TextDecoration::Underline;
        }
        Tag::Img => s.display = Display::InlineBlock,
        Tag::Head | Tag::Meta | Tag::Unknown(_) => s.display = Display::None,
        Tag::Html | Tag::Body | Tag::Div | Tag::Section | Tag::Header | Tag::Footer => {}
    }
}

fn heading(s: &mut ComputedStyle, size: f32, top: f32, bottom: f32) {
    s.font_size = size;
    s.font_weight = FontWeight::Bold;
    s.margin_top = top;
    s.margin_bottom = bottom;
}

fn apply_utility_class(s: &mut ComputedStyle, class: &str) {
    match class {
        "flex" => s.display = Display::Flex,
        "block" => s.display = Display::Block,
        "inline" => s.display = Display::Inline,
        "inline-block" => s.display = Display::InlineBlock,
        "hidden" => s.display = Display::None,

        "flex-row" => s.flex_direction = FlexDirection::Row,
        "flex-col" => s.flex_direction = FlexDirection::Column,
        "flex-wrap" => s.flex_wrap = FlexWrap::Wrap,
        "flex-1" | "grow" | "flex-grow" => s.flex_grow = 1.0,

        "justify-start" => s.justify_content = JustifyContent::Start,
        "justify-end" => s.justify_content = JustifyContent::End,
        "justify-center" => s.justify_content = JustifyContent::Center,
        "justify-between" => s.justify_content = JustifyContent::SpaceBetween,
        "justify-around" => s.justify_content = JustifyContent::SpaceAround,
        "justify-evenly" => s.justify_content = JustifyContent::SpaceEvenly,

        "items-start" => s.align_items = AlignItems::Start,
        "items-end" => s.align_items = AlignItems::End,
        "items-center" => s.align_items = AlignItems::Center,
        "items-stretch" => s.align_items = AlignItems::Stretch,

        "font-bold" | "font-semibold" => s.font_weight = FontWeight::Bold,
        "font-normal" => s.font_weight = FontWeight::Normal,
        "italic" => s.font_style = FontStyle::Italic,
        "not-italic" => s.font_style = FontStyle::Normal,
        "underline" => s.text_decoration = TextDecoration::Underline,

        "text-left" => s.text_align = TextAlign::Left,
        "text-center" => s.text_align = TextAlign::Center,
        "text-right" => s.text_align = TextAlign::Right,
        "text-start" => s.text_align = start_align(s.direction),

        "text-xs" => s.font_size = 7.5,
        "text-sm" => s.font_size = 8.5,
        "text-base" => s.font_size = BASE_FONT_SIZE,
        "text-lg" => s.font_size = 12.0,
        "text-xl" => s.font_size = 14.0,
        "text-2xl" => s.font_size = 16.0,

        "w-full" => s.width = Dimension::Percent(100.0),
        "w-auto" => s.width = Dimension::Auto,

        "border" => s.border_width = 0.75,
        "border-0" => {
            s.border_width = 0.0;
            s.cell_borders = false;
        }

        "break-before" => s.page_break_before = true,
        "break-after" | "page-break" => s.page_break_after = true,
        "break-inside-avoid" => s.page_break_inside_avoid = true,

        _ => {
            if !(apply_fraction_width(s, class)
                || apply_spacing(s, class)
                || apply_color(s, class))
            {
                if let Some(n) = class.strip_prefix("gap-").and_then(|v| v.parse::<f32>().ok()) {
                    s.gap = n * SPACING_UNIT;
                }
            }
        }
    }
}

/// `w-1/3`, `w-1/12`, ...
fn apply_fraction_width(s: &mut ComputedStyle, class: &str) -> bool {
    let Some((num, den)) = class.strip_prefix("w-").and_then(|f| f.split_once('/')) else {
        return false;
    };
    match (num.parse::<f32>(), den.parse::<f32>()) {
        (Ok(n), Ok(d)) if d > 0.0 => {
            s.width = Dimension::Percent(n / d * 100.0);
            true
        }
        _ => false,
    }
}

/// `p-2`, `px-4`, `mt-6`, `mb-2`, ...
fn apply_spacing(s: &mut ComputedStyle, class: &str) -> bool {
    let Some((prefix, steps)) = class.split_once('-') else {
        return false;
    };
    let Ok(steps) = steps.parse::<f32>() else {
        return false;
    };
    let v = steps * SPACING_UNIT;
    match prefix {
        "p" => {
            s.padding_top = v;
            s.padding_right = v;
            s.padding_bottom = v;
            s.padding_left = v;
        }
        "px" => {
            s.padding_left = v;
            s.padding_right = v;
        }
        "py" => {
            s.padding_top = v;
            s.padding_bottom = v;
        }
        "pt" => s.padding_top = v,
        "pr" => s.padding_right = v,
        "pb" => s.padding_bottom = v,
        "pl" => s.padding_left = v,
        "m" => {
            s.margin_top = v;
            s.margin_right = v;
            s.margin_bottom = v;
            s.margin_left = v;
        }
        "mx" => {
            s.margin_left = v;
            s.margin_right = v;
        }
        "my" => {
            s.margin_top = v;
            s.margin_bottom = v;
        }
        "mt" => s.margin_top = v,
        "mr" => s.margin_right = v,
        "mb" => s.margin_bottom = v,
        "ml" => s.margin_left = v,
        "w" => s.width = Dimension::Pt(v),
        "h" => s.height = Dimension::Pt(v),
        _ => return false,
    }
    true
}

/// `text-gray-500`, `bg-gray-100`, `border-gray-300`.
fn apply_color(s: &mut ComputedStyle, class: &str) -> bool {
    let (target, name) = if let Some(n) = class.strip_prefix("text-") {
        (&mut s.color, n)
    } else if let Some(n) = class.strip_prefix("bg-") {
        (&mut s.background_color, n)
    } else if let Some(n) = class.strip_prefix("border-") {
        (&mut s.border_color, n)
    } else {
        return false;
    };
    match Color::named(name) {
        Some(c) => {
            *target = c;
            true
        }
        None => false,
    }
}

// ---------------------------------------------------------------------------
// Inline style (limited subset)
// ---------------------------------------------------------------------------

fn apply_inline_style(s: &mut ComputedStyle, style_str: &str) {
    for decl in style_str.split(';') {
        if let Some((prop, val)) = decl.split_once(':') {
            apply_css_property(s, prop.trim(), val.trim());
        }
    }
}

fn apply_css_property(s: &mut ComputedStyle, prop: &str, val: &str) {
    match prop {
        "display" => match val {
            "flex" => s.display = Display::Flex,
            "block" => s.display = Display::Block,
            "inline" => s.display = Display::Inline,
            "inline-block" => s.display = Display::InlineBlock,
            "none" => s.display = Display::None,
            _ => {}
        },
        "direction" => match val {
            "rtl" => s.direction = Direction::Rtl,
            "ltr" => s.direction = Direction::Ltr,
            _ => {}
        },
        "font-size" => {
            if let Some(v) = parse_length(val) {
                s.font_size = v;
            }
        }
        "font-weight" => {
            s.font_weight = match val {
                "bold" | "600" | "700" | "800" | "900" => FontWeight::Bold,
                _ => FontWeight::Normal,
            }
        }
        "font-style" => {
            s.font_style = if val == "italic" {
                FontStyle::Italic
            } else {
                FontStyle::Normal
            }
        }
        "color" => {
            if let Some(c) = Color::from_hex(val) {
                s.color = c;
            }
        }
        "background" | "background-color" => {
            if let Some(c) = Color::from_hex(val) {
                s.background_color = c;
            }
        }
        "text-align" => {
            s.text_align = match val {
                "center" => TextAlign::Center,
                "right" => TextAlign::Right,
                "start" => start_align(s.direction),
                _ => TextAlign::Left,
            }
        }
        "width" => s.width = parse_dimension(val),
        "height" => s.height = parse_dimension(val),
        "max-width" => s.max_width = parse_dimension(val),
        "margin" => {
            let [t, r, b, l] = parse_box(val);
            (s.margin_top, s.margin_right, s.margin_bottom, s.margin_left) = (t, r, b, l);
        }
        "padding" => {
            let [t, r, b, l] = parse_box(val);
            (s.padding_top, s.padding_right, s.padding_bottom, s.padding_left) = (t, r, b, l);
        }
        "margin-top" => set_length(&mut s.margin_top, val),
        "margin-bottom" => set_length(&mut s.margin_bottom, val),
        "padding-top" => set_length(&mut s.padding_top, val),
        "padding-bottom" => set_length(&mut s.padding_bottom, val),
        "border" => {
            if val == "none" || val == "0" {
                s.border_width = 0.0;
                return;
            }
            for part in val.split_whitespace() {
                if let Some(w) = parse_length(part) {
                    s.border_width = w;
                } else if let Some(c) = Color::from_hex(part) {
                    s.border_color = c;
                }
            }
        }
        "border-width" => set_length(&mut s.border_width, val),
        "border-color" => {
            if let Some(c) = Color::from_hex(val) {
                s.border_color = c;
            }
        }
        "line-height" => {
            if let Ok(v) = val.parse::<f32>() {
                s.line_height = v;
            } else if let Some(v) = parse_length(val) {
                s.line_height = v / s.font_size;
            }
        }
        "page-break-before" | "break-before" => {
            s.page_break_before = matches!(val, "always" | "page")
        }
        "page-break-after" | "break-after" => {
            s.page_break_after = matches!(val, "always" | "page")
        }
        "page-break-inside" | "break-inside" => s.page_break_inside_avoid = val == "avoid",
        _ => {}
    }
}

/// `12`, `12pt` or `16px` (CSS px → pt at 0.75).
fn parse_length(v: &str) -> Option<f32> {
    let v = v.trim();
    if let Some(px) = v.strip_suffix("px") {
        px.trim().parse::<f32>().ok().map(|n| n * 0.75)
    } else {
        v.trim_end_matches("pt").trim().parse().ok()
    }
}

fn set_length(slot: &mut f32, val: &str) {
    if let Some(v) = parse_length(val) {
        *slot = v;
    }
}

fn parse_dimension(v: &str) -> Dimension {
    let v = v.trim();
    if let Some(pct) = v.strip_suffix('%') {
        pct.trim()
            .parse()
            .map(Dimension::Percent)
            .unwrap_or(Dimension::Auto)
    } else {
        parse_length(v).map_or(Dimension::Auto, Dimension::Pt)
    }
}

/// CSS box shorthand with 1, 2 or 4 values → `[top, right, bottom, left]`.
fn parse_box(val: &str) -> [f32; 4] {
    let parts: Vec<f32> = val.split_whitespace().filter_map(parse_length).collect();
    match parts.as_slice() {
        [a] => [*a; 4],
        [v, h] => [*v, *h, *v, *h],
        [t, h, b] => [*t, *h, *b, *h],
        [t, r, b, l] => [*t, *r, *b, *l],
        _ => [0.0; 4],
    }
}

// ---------------------------------------------------------------------------
// Styled tree
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum StyledNode {
    Element {
        tag: Tag,
        style: ComputedStyle,
        children: Vec<StyledNode>,
        attrs: HashMap<String, String>,
    },
    Text {
        text: String,
        style: ComputedStyle,
    },
}

impl StyledNode {
    pub fn style(&self) -> &ComputedStyle {
        match self {
            StyledNode::Element { style, .. } | StyledNode::Text { style, .. } => style,
        }
    }
}

/// Build the styled tree top-down from `parent`'s inherited properties.
/// Whitespace-only text and `display: none` elements are dropped.
pub fn build_styled_tree(nodes: &[DomNode], parent: &ComputedStyle) -> Vec<StyledNode> {
    nodes
        .iter()
        .filter_map(|node| match node {
            DomNode::Element(e) => {
                let style = resolve_style(e, parent);
                if style.display == Display::None {
                    return None;
                }
                let children = build_styled_tree(&e.children, &style);
                Some(StyledNode::Element {
                    tag: e.tag.clone(),
                    style,
                    children,
                    attrs: e.attributes.clone(),
                })
            }
            DomNode::Text(text) if text.trim().is_empty() => None,
            DomNode::Text(text) => Some(StyledNode::Text {
                text: text.clone(),
                style: ComputedStyle::for_text(parent),
            }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;

    fn styled(html: &str) -> Vec<StyledNode> {
        build_styled_tree(&parse_html(html), &ComputedStyle::default())
    }

    fn element_children(node: &StyledNode) -> &[StyledNode] {
        match node {
            StyledNode::Element { children, .. } => children,
            StyledNode::Text { .. } => panic!("expected element"),
        }
    }

    #[test]
    fn spacing_and_fraction_widths() {
        let mut s = ComputedStyle::default();
        apply_utility_class(&mut s, "mb-4");
        apply_utility_class(&mut s, "px-2");
        apply_utility_class(&mut s, "w-1/4");
        assert_eq!(s.margin_bottom, 12.0);
        assert_eq!(s.padding_left, 6.0);
        assert_eq!(s.width, Dimension::Percent(25.0));
    }

    #[test]
    fn palette_and_hex_colors() {
        let mut s = ComputedStyle::default();
        apply_utility_class(&mut s, "bg-gray-100");
        assert!(!s.background_color.is_transparent());
        let c = Color::from_hex("#f80").unwrap();
        assert!((c.r - 1.0).abs() < 0.01);
        assert!((c.g - 0.533).abs() < 0.01);
    }

    #[test]
    fn inline_px_converts_to_points() {
        let mut s = ComputedStyle::default();
        apply_inline_style(&mut s, "font-size: 16px; margin: 4pt 8pt; border: 1px solid #000");
        assert_eq!(s.font_size, 12.0);
        assert_eq!(s.margin_left, 8.0);
        assert_eq!(s.border_width, 0.75);
    }

    #[test]
    fn dir_attribute_sets_direction_and_alignment() {
        let nodes = styled(r#"<div><p dir="rtl">نص</p><p>text</p></div>"#);
        let kids = element_children(&nodes[0]);
        assert!(kids[0].style().is_rtl());
        assert_eq!(kids[0].style().text_align, TextAlign::Right);
        assert_eq!(kids[1].style().text_align, TextAlign::Left);
    }

    #[test]
    fn rtl_root_is_inherited() {
        let tree = build_styled_tree(
            &parse_html("<div><p>x</p></div>"),
            &ComputedStyle::root(Direction::Rtl),
        );
        let p = &element_children(&tree[0])[0];
        assert!(p.style().is_rtl());
        assert_eq!(p.style().text_align, TextAlign::Right);
    }

    #[test]
    fn borderless_table_clears_cell_borders() {
        let nodes = styled(
            r#"<table class="border-0"><tr><td colspan="2">a</td></tr></table><table><tr><td>b</td></tr></table>"#,
        );
        let cell = |table: &StyledNode| element_children(&element_children(table)[0])[0].clone();
        let plain = cell(&nodes[0]);
        assert_eq!(plain.style().border_width, 0.0);
        assert_eq!(plain.style().col_span, 2);
        assert!(cell(&nodes[1]).style().border_width > 0.0);
    }

    #[test]
    fn break_classes() {
        let nodes = styled(r#"<section class="break-before">a</section><div class="break-inside-avoid">b</div>"#);
        assert!(nodes[0].style().page_break_before);
        assert!(nodes[1].style().page_break_inside_avoid);
    }
}
