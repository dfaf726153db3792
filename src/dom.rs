//! HTML parser for the markup the document templates emit.
//!
//! This is not a general HTML5 parser. It understands the element subset the
//! templates use, treats `img br hr meta link` as void, skips the contents of
//! `head style script title`, and decodes named plus numeric entities (the
//! template engine escapes `/` as `&#x2f;`).

use std::collections::HashMap;

use crate::locale::Direction;

// ---------------------------------------------------------------------------
// DOM types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    Html,
    Head,
    Body,
    Div,
    Section,
    Header,
    Footer,
    P,
    H1,
    H2,
    H3,
    H4,
    Span,
    Strong,
    Em,
    U,
    Br,
    Hr,
    Ul,
    Ol,
    Li,
    Table,
    Thead,
    Tbody,
    Tr,
    Th,
    Td,
    Img,
    /// `meta`, `link`, `style`, `script`, `title`: parsed and dropped.
    Meta,
    Unknown(String),
}

impl Tag {
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "html" => Tag::Html,
            "head" => Tag::Head,
            "body" => Tag::Body,
            "div" => Tag::Div,
            "section" | "article" | "main" => Tag::Section,
            "header" => Tag::Header,
            "footer" => Tag::Footer,
            "p" => Tag::P,
            "h1" => Tag::H1,
            "h2" => Tag::H2,
            "h3" => Tag::H3,
            "h4" | "h5" | "h6" => Tag::H4,
            "span" | "small" => Tag::Span,
            "strong" | "b" => Tag::Strong,
            "em" | "i" => Tag::Em,
            "u" => Tag::U,
            "br" => Tag::Br,
            "hr" => Tag::Hr,
            "ul" => Tag::Ul,
            "ol" => Tag::Ol,
            "li" => Tag::Li,
            "table" => Tag::Table,
            "thead" => Tag::Thead,
            "tbody" | "tfoot" => Tag::Tbody,
            "tr" => Tag::Tr,
            "th" => Tag::Th,
            "td" => Tag::Td,
            "img" => Tag::Img,
            "meta" | "link" | "style" | "script" | "title" => Tag::Meta,
            other => Tag::Unknown(other.to_string()),
        }
    }

    /// Elements that never have children or a closing tag.
    fn is_void(name: &str) -> bool {
        matches!(
            name.to_ascii_lowercase().as_str(),
            "img" | "br" | "hr" | "meta" | "link"
        )
    }

    /// Elements whose contents are never rendered and may contain `<`.
    fn is_raw_text(name: &str) -> bool {
        matches!(
            name.to_ascii_lowercase().as_str(),
            "head" | "style" | "script" | "title"
        )
    }

    /// `thead` / `tbody`: transparent wrappers around table rows.
    pub fn is_row_group(&self) -> bool {
        matches!(self, Tag::Thead | Tag::Tbody)
    }

    pub fn is_cell(&self) -> bool {
        matches!(self, Tag::Td | Tag::Th)
    }
}

#[derive(Debug, Clone)]
pub enum DomNode {
    Element(ElementNode),
    Text(String),
}

#[derive(Debug, Clone)]
pub struct ElementNode {
    pub tag: Tag,
    pub attributes: HashMap<String, String>,
    pub children: Vec<DomNode>,
}

impl ElementNode {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            attributes: HashMap::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn classes(&self) -> Vec<&str> {
        self.attr("class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default()
    }

    pub fn inline_style(&self) -> Option<&str> {
        self.attr("style")
    }

    pub fn src(&self) -> Option<&str> {
        self.attr("src")
    }

    /// Explicit `dir` attribute, if any.
    pub fn dir(&self) -> Option<Direction> {
        match self.attr("dir")?.trim().to_ascii_lowercase().as_str() {
            "rtl" => Some(Direction::Rtl),
            "ltr" => Some(Direction::Ltr),
            _ => None,
        }
    }

    /// Table cell span, at least 1.
    pub fn colspan(&self) -> u32 {
        self.attr("colspan")
            .and_then(|v| v.trim().parse().ok())
            .filter(|n: &u32| *n > 0)
            .unwrap_or(1)
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Parse an HTML string into a forest of DOM nodes.
pub fn parse_html(html: &str) -> Vec<DomNode> {
    let mut parser = Parser::new(html);
    parser.parse_nodes()
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn parse_nodes(&mut self) -> Vec<DomNode> {
        let mut nodes = Vec::new();
        loop {
            self.skip_blank_run();
            if self.eof() || self.starts_with("</") {
                break;
            }
            if let Some(node) = self.parse_node() {
                nodes.push(node);
            }
        }
        nodes
    }

    fn parse_node(&mut self) -> Option<DomNode> {
        if self.starts_with("<!--") {
            self.skip_past("-->");
            return None;
        }
        if self.starts_with("<!") || self.starts_with("<?") {
            self.skip_past(">");
            return None;
        }
        if self.starts_with("<") {
            Some(self.parse_element())
        } else {
            Some(self.parse_text())
        }
    }

    fn parse_text(&mut self) -> DomNode {
        let start = self.pos;
        let end = self.input[start..]
            .find('<')
            .map_or(self.input.len(), |i| start + i);
        self.pos = end;
        DomNode::Text(decode_entities(&self.input[start..end]))
    }

    fn parse_element(&mut self) -> DomNode {
        self.pos += 1; // '<'
        let name = self.parse_name();
        let mut elem = ElementNode::new(Tag::parse(&name));

        loop {
            self.skip_whitespace();
            if self.eof() || self.starts_with(">") || self.starts_with("/>") {
                break;
            }
            let before = self.pos;
            let (key, value) = self.parse_attribute();
            if self.pos == before {
                // Stray character inside the tag; step over it.
                self.advance_char();
                continue;
            }
            elem.attributes.insert(key.to_ascii_lowercase(), value);
        }

        if self.starts_with("/>") {
            self.pos += 2;
            return DomNode::Element(elem);
        }
        if self.starts_with(">") {
            self.pos += 1;
        }
        if Tag::is_void(&name) {
            return DomNode::Element(elem);
        }
        if Tag::is_raw_text(&name) {
            self.skip_raw_text(&name);
            return DomNode::Element(elem);
        }

        elem.children = self.parse_nodes();

        if self.starts_with("</") {
            self.pos += 2;
            self.parse_name();
            self.skip_past(">");
        }
        DomNode::Element(elem)
    }

    /// Skip to just past `</name>`, case-insensitively.
    fn skip_raw_text(&mut self, name: &str) {
        let closing = format!("</{}", name.to_ascii_lowercase());
        let rest = self.input[self.pos..].to_ascii_lowercase();
        match rest.find(&closing) {
            Some(i) => {
                self.pos += i;
                self.skip_past(">");
            }
            None => self.pos = self.input.len(),
        }
    }

    fn parse_name(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '-' || c == '_' || c == ':' {
                self.advance_char();
            } else {
                break;
            }
        }
        self.input[start..self.pos].to_string()
    }

    fn parse_attribute(&mut self) -> (String, String) {
        let key = self.parse_name();
        self.skip_whitespace();
        if !self.starts_with("=") {
            return (key, String::new());
        }
        self.pos += 1;
        self.skip_whitespace();
        (key, self.parse_attr_value())
    }

    fn parse_attr_value(&mut self) -> String {
        match self.peek() {
            Some(q @ ('"' | '\'')) => {
                self.pos += 1;
                let start = self.pos;
                let end = self.input[start..]
                    .find(q)
                    .map_or(self.input.len(), |i| start + i);
                self.pos = (end + 1).min(self.input.len());
                decode_entities(&self.input[start..end])
            }
            _ => {
                let start = self.pos;
                while let Some(c) = self.peek() {
                    if c.is_whitespace() || c == '>' {
                        break;
                    }
                    self.advance_char();
                }
                decode_entities(&self.input[start..self.pos])
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.advance_char();
        }
    }

    /// Whitespace between two tags is formatting, not content.
    fn skip_blank_run(&mut self) {
        let saved = self.pos;
        self.skip_whitespace();
        if !self.eof() && !self.starts_with("<") {
            self.pos = saved;
        }
    }

    fn skip_past(&mut self, marker: &str) {
        match self.input[self.pos..].find(marker) {
            Some(i) => self.pos += i + marker.len(),
            None => self.pos = self.input.len(),
        }
    }

    fn starts_with(&self, s: &str) -> bool {
        self.input[self.pos..].starts_with(s)
    }

    fn eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance_char(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }
}

/// Decode `&amp;`-style named entities and `&#NN;` / `&#xHH;` references.
/// Unknown entities are kept verbatim.
pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| decode_entity(&rest[1..semi]).map(|c| (c, semi)));
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse().ok()?,
        };
        return char::from_u32(code);
    }
    Some(match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{00A0}',
        "middot" => '\u{00B7}',
        "ndash" => '\u{2013}',
        "mdash" => '\u{2014}',
        "copy" => '\u{00A9}',
        _ => return None,
    })
}

// ---------------------------------------------------------------------------
// Tree helpers
// ---------------------------------------------------------------------------

/// Children of `<body>`, or the whole forest when there is no body.
pub fn body_children(nodes: &[DomNode]) -> Vec<DomNode> {
    find_element(nodes, &Tag::Body)
        .map(|body| body.children.clone())
        .unwrap_or_else(|| nodes.to_vec())
}

/// Direction declared on the root `<html>` (or `<body>`) element.
pub fn root_direction(nodes: &[DomNode]) -> Option<Direction> {
    [Tag::Html, Tag::Body]
        .iter()
        .find_map(|tag| find_element(nodes, tag).and_then(ElementNode::dir))
}

fn find_element<'a>(nodes: &'a [DomNode], tag: &Tag) -> Option<&'a ElementNode> {
    nodes.iter().find_map(|node| match node {
        DomNode::Element(e) if e.tag == *tag => Some(e),
        DomNode::Element(e) => find_element(&e.children, tag),
        DomNode::Text(_) => None,
    })
}

/// Visible text of a document: entities decoded, element boundaries turned
/// into spaces and whitespace collapsed.
pub fn text_content(html: &str) -> String {
    fn collect(nodes: &[DomNode], out: &mut Vec<String>) {
        for node in nodes {
            match node {
                DomNode::Text(t) => out.push(t.clone()),
                DomNode::Element(e) if matches!(e.tag, Tag::Head | Tag::Meta) => {}
                DomNode::Element(e) => collect(&e.children, out),
            }
        }
    }
    let mut parts = Vec::new();
    collect(&parse_html(html), &mut parts);
    parts
        .iter()
        .flat_map(|p| p.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_element(nodes: &[DomNode]) -> &ElementNode {
        match nodes.first() {
            Some(DomNode::Element(e)) => e,
            other => panic!("expected element, got {other:?}"),
        }
    }

    #[test]
    fn parse_nested_classes() {
        let nodes = parse_html(r#"<div class="flex mb-4"><p>Hello</p></div>"#);
        let div = first_element(&nodes);
        assert_eq!(div.tag, Tag::Div);
        assert_eq!(div.classes(), vec!["flex", "mb-4"]);
        assert_eq!(div.children.len(), 1);
    }

    #[test]
    fn void_elements_take_no_children() {
        let nodes = parse_html(r#"<p>a<br>b</p><img src="x.png"><hr><p>c</p>"#);
        assert_eq!(nodes.len(), 4);
        assert_eq!(first_element(&nodes).children.len(), 3);
    }

    #[test]
    fn head_and_style_are_skipped() {
        let html = r#"<html><head><meta charset="utf-8"><title>T</title>
            <style>td > p { color: red; } .a<b {}</style></head>
            <body><p>Visible</p></body></html>"#;
        let body = body_children(&parse_html(html));
        assert_eq!(body.len(), 1);
        assert_eq!(text_content(html), "Visible");
    }

    #[test]
    fn numeric_and_named_entities() {
        assert_eq!(decode_entities("A&#x2f;B &amp; C&#39;s"), "A/B & C's");
        assert_eq!(decode_entities("&#1585;"), "ر");
        assert_eq!(decode_entities("5 & 6 &bogus;"), "5 & 6 &bogus;");
    }

    #[test]
    fn dir_and_colspan_attributes() {
        let html = r#"<html dir="rtl"><body><table><tr><td colspan="2" dir="ltr">x</td></tr></table></body></html>"#;
        let nodes = parse_html(html);
        assert_eq!(root_direction(&nodes), Some(Direction::Rtl));

        let body = body_children(&nodes);
        let table = first_element(&body);
        let tr = first_element(&table.children);
        let td = first_element(&tr.children);
        assert_eq!(td.colspan(), 2);
        assert_eq!(td.dir(), Some(Direction::Ltr));
    }

    #[test]
    fn table_groups_are_kept() {
        let html = "<table><thead><tr><th>No.</th></tr></thead><tbody><tr><td>1</td></tr></tbody></table>";
        let nodes = parse_html(html);
        let table = first_element(&nodes);
        assert_eq!(table.children.len(), 2);
        assert!(first_element(&table.children).tag.is_row_group());
    }

    #[test]
    fn text_content_joins_cells() {
        let html = "<table><tr>\n  <td>Unit No:</td>\n  <td>A&#x2d;101</td>\n</tr></table>";
        assert_eq!(text_content(html), "Unit No: A-101");
    }
}
