//! PDF renderer – takes a [`LayoutConfig`] and produces PDF bytes using
//! `printpdf` (v0.8 ops-based API).

use std::collections::{BTreeSet, HashMap, HashSet};

use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};
use printpdf::*;

use crate::error::{RenderError, Result};
use crate::fonts::is_winansi;
use crate::layout_config::*;

const PT_TO_MM: f32 = 0.352778;

/// A printpdf XObject together with the pixel dimensions of the source image.
struct ImageResource {
    xobj_id: XObjectId,
    px_width: u32,
    px_height: u32,
}

/// Font used for one text run.
#[derive(Clone)]
enum RunFont {
    Builtin(BuiltinFont),
    Embedded(FontId),
}

struct RenderCtx<'a> {
    page_height: f32,
    images: &'a HashMap<String, ImageResource>,
    embedded: Option<FontId>,
    /// Characters the builtin font had to replace with `?`.
    unmappable: BTreeSet<char>,
}

/// Render a LayoutConfig into PDF bytes.
///
/// `<img>` sources that are not base64 data URIs, or whose bytes cannot be
/// decoded, are skipped with a warning. A `font_path` that cannot be read or
/// parsed is an error.
pub fn render_pdf(config: &LayoutConfig) -> Result<Vec<u8>> {
    if config.page_width_pt <= 0.0 || config.page_height_pt <= 0.0 {
        return Err(RenderError::Pdf(format!(
            "invalid page size {}x{} pt",
            config.page_width_pt, config.page_height_pt
        )));
    }
    let page_w = Mm(config.page_width_pt * PT_TO_MM);
    let page_h = Mm(config.page_height_pt * PT_TO_MM);

    let mut doc = PdfDocument::new(&config.title);

    let embedded = match &config.font_path {
        Some(path) => {
            let bytes = std::fs::read(path)?;
            let mut warnings = Vec::new();
            let font = ParsedFont::from_bytes(&bytes, 0, &mut warnings)
                .ok_or_else(|| RenderError::Font(format!("cannot parse {path}")))?;
            log::debug!("Embedding font {path}");
            Some(doc.add_font(&font))
        }
        None => None,
    };

    // ── Pre-register all images ────────────────────────────────────────────
    let mut all_srcs: HashSet<&str> = HashSet::new();
    for page_layout in &config.pages {
        for lbox in &page_layout.boxes {
            collect_image_srcs(lbox, &mut all_srcs);
        }
    }

    let mut image_resources: HashMap<String, ImageResource> = HashMap::new();
    let mut img_warnings: Vec<PdfWarnMsg> = Vec::new();

    for src in &all_srcs {
        let bytes = match parse_data_uri(src) {
            Ok(b) => b,
            Err(e) => {
                log::warn!("Skipping image: {e}");
                continue;
            }
        };

        let dyn_img = match ::image::load_from_memory(&bytes) {
            Ok(img) => img,
            Err(e) => {
                log::warn!("Skipping image: decode error: {e}");
                continue;
            }
        };
        let (px_width, px_height) = (dyn_img.width(), dyn_img.height());

        let raw = match RawImage::decode_from_bytes(&bytes, &mut img_warnings) {
            Ok(r) => r,
            Err(e) => {
                log::warn!("Skipping image: PDF encode error: {e}");
                continue;
            }
        };
        let xobj_id = doc.add_image(&raw);

        image_resources.insert(
            src.to_string(),
            ImageResource {
                xobj_id,
                px_width,
                px_height,
            },
        );
    }

    // ── Render pages ──────────────────────────────────────────────────────
    let mut ctx = RenderCtx {
        page_height: config.page_height_pt,
        images: &image_resources,
        embedded,
        unmappable: BTreeSet::new(),
    };
    let mut pages = Vec::new();

    for page_layout in &config.pages {
        let mut ops = Vec::new();
        for lbox in &page_layout.boxes {
            render_box(&mut ops, lbox, &mut ctx);
        }
        pages.push(PdfPage::new(page_w, page_h, ops));
    }

    if pages.is_empty() {
        pages.push(PdfPage::new(page_w, page_h, Vec::new()));
    }

    if !ctx.unmappable.is_empty() {
        let chars: String = ctx.unmappable.iter().collect();
        log::warn!(
            "Builtin font cannot show {} character(s) ({chars}); configure font_path with a font that covers them",
            ctx.unmappable.len()
        );
    }

    doc.with_pages(pages);
    let bytes = doc.save(&PdfSaveOptions::default(), &mut Vec::new());
    log::debug!("Rendered {} page(s), {} bytes", config.pages.len().max(1), bytes.len());
    Ok(bytes)
}

/// Convert a UTF-8 string to raw Windows-1252 bytes then wrap in a String so
/// printpdf writes the bytes unchanged into the PDF stream (builtin fonts use
/// WinAnsiEncoding, so each glyph is one byte 0x00–0xFF).
fn to_winlatin(s: &str) -> String {
    let bytes: Vec<u8> = s
        .chars()
        .map(|c| match c {
            '\u{20AC}' => 0x80,
            '\u{201A}' => 0x82,
            '\u{201E}' => 0x84,
            '\u{2026}' => 0x85,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{2122}' => 0x99,
            '\u{00A0}' => 0x20,
            c if (c as u32) < 256 => c as u8,
            _ => b'?',
        })
        .collect();
    // SAFETY: intentionally non-UTF-8 for 0x80-0x9F range; printpdf passes
    // these bytes straight to the PDF stream, decoded by WinAnsiEncoding.
    #[allow(unsafe_code)]
    unsafe {
        String::from_utf8_unchecked(bytes)
    }
}

fn is_rtl_char(c: char) -> bool {
    matches!(c as u32, 0x0590..=0x08FF | 0xFB1D..=0xFDFF | 0xFE70..=0xFEFF)
}

/// Reorder a logical right-to-left line into left-to-right paint order.
///
/// Words swap order; letters of right-to-left words are reversed while
/// numbers and Latin words keep their own order.
pub fn visual_order(line: &str) -> String {
    line.split(' ')
        .rev()
        .map(|word| {
            if word.chars().any(is_rtl_char) {
                word.chars().rev().collect::<String>()
            } else {
                word.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse a `data:<mime>;base64,<data>` URI and return the raw decoded bytes.
fn parse_data_uri(src: &str) -> std::result::Result<Vec<u8>, String> {
    let rest = src.strip_prefix("data:").ok_or_else(|| {
        let preview: String = src.chars().take(80).collect();
        format!("image src must be a base64 data URI, got {preview:?}")
    })?;
    let (header, b64_data) = rest
        .split_once(',')
        .ok_or_else(|| "invalid data URI: missing `,` separator".to_string())?;
    if !header.contains(";base64") {
        return Err("only base64-encoded data URIs are supported".to_string());
    }
    BASE64_STD
        .decode(b64_data.trim())
        .map_err(|e| format!("base64 decode error: {e}"))
}

fn collect_image_srcs<'a>(lbox: &'a LayoutBox, srcs: &mut HashSet<&'a str>) {
    if let Some(img) = &lbox.image {
        srcs.insert(img.src.as_str());
    }
    for child in &lbox.children {
        collect_image_srcs(child, srcs);
    }
}

fn rgb(c: [f32; 4]) -> Color {
    Color::Rgb(Rgb {
        r: c[0],
        g: c[1],
        b: c[2],
        icc_profile: None,
    })
}

fn point(x: f32, y: f32) -> LinePoint {
    LinePoint {
        p: Point { x: Pt(x), y: Pt(y) },
        bezier: false,
    }
}

fn rect_points(x1: f32, y1: f32, x2: f32, y2: f32) -> Vec<LinePoint> {
    vec![
        point(x1, y2),
        point(x2, y2),
        point(x2, y1),
        point(x1, y1),
    ]
}

/// Recursively render a LayoutBox and its children into PDF ops.
fn render_box(ops: &mut Vec<Op>, lbox: &LayoutBox, ctx: &mut RenderCtx<'_>) {
    // PDF origin is bottom-left, layout origin is top-left.
    let pdf_y = ctx.page_height - lbox.y;
    let (x1, y1, x2, y2) = (lbox.x, pdf_y - lbox.height, lbox.x + lbox.width, pdf_y);

    if let Some(bg) = lbox.background_color {
        ops.push(Op::SetFillColor { col: rgb(bg) });
        ops.push(Op::DrawPolygon {
            polygon: Polygon {
                rings: vec![PolygonRing {
                    points: rect_points(x1, y1, x2, y2),
                }],
                mode: PaintMode::Fill,
                winding_order: WindingOrder::NonZero,
            },
        });
    }

    if let Some(border) = &lbox.border {
        ops.push(Op::SetOutlineColor {
            col: rgb(border.color),
        });
        ops.push(Op::SetOutlineThickness {
            pt: Pt(border.width),
        });
        ops.push(Op::DrawLine {
            line: Line {
                points: rect_points(x1, y1, x2, y2),
                is_closed: true,
            },
        });
    }

    if let Some(text) = &lbox.text {
        render_text(ops, lbox, text, pdf_y, ctx);
    }

    if let Some(img) = &lbox.image {
        if let Some(res) = ctx.images.get(&img.src) {
            let img_bottom_y = ctx.page_height - lbox.y - img.height;
            // At dpi=72 printpdf renders 1 px = 1 pt.
            let scale = |want: f32, px: u32| if px > 0 { want / px as f32 } else { 1.0 };
            ops.push(Op::UseXobject {
                id: res.xobj_id.clone(),
                transform: XObjectTransform {
                    translate_x: Some(Pt(lbox.x)),
                    translate_y: Some(Pt(img_bottom_y)),
                    dpi: Some(72.0),
                    scale_x: Some(scale(img.width, res.px_width)),
                    scale_y: Some(scale(img.height, res.px_height)),
                    rotate: None,
                },
            });
        }
    }

    for child in &lbox.children {
        render_box(ops, child, ctx);
    }
}

fn run_font(ctx: &RenderCtx<'_>, bold: bool, italic: bool) -> RunFont {
    if let Some(id) = &ctx.embedded {
        return RunFont::Embedded(id.clone());
    }
    RunFont::Builtin(match (bold, italic) {
        (true, true) => BuiltinFont::HelveticaBoldOblique,
        (true, false) => BuiltinFont::HelveticaBold,
        (false, true) => BuiltinFont::HelveticaOblique,
        (false, false) => BuiltinFont::Helvetica,
    })
}

#[allow(clippy::too_many_arguments)]
fn write_run(
    ops: &mut Vec<Op>,
    ctx: &mut RenderCtx<'_>,
    font: &RunFont,
    size: f32,
    x: f32,
    y: f32,
    color: [f32; 4],
    content: &str,
) {
    ops.push(Op::StartTextSection);
    ops.push(Op::SetTextCursor {
        pos: Point { x: Pt(x), y: Pt(y) },
    });
    ops.push(Op::SetFillColor { col: rgb(color) });
    match font {
        RunFont::Builtin(builtin) => {
            ctx.unmappable
                .extend(content.chars().filter(|c| !is_winansi(*c)));
            ops.push(Op::SetFontSizeBuiltinFont {
                size: Pt(size),
                font: *builtin,
            });
            ops.push(Op::WriteTextBuiltinFont {
                items: vec![TextItem::Text(to_winlatin(content))],
                font: *builtin,
            });
        }
        RunFont::Embedded(id) => {
            ops.push(Op::SetFontSize {
                size: Pt(size),
                font: id.clone(),
            });
            ops.push(Op::WriteText {
                items: vec![TextItem::Text(content.to_string())],
                font: id.clone(),
            });
        }
    }
    ops.push(Op::EndTextSection);
}

fn render_text(
    ops: &mut Vec<Op>,
    lbox: &LayoutBox,
    text: &TextContent,
    pdf_y: f32,
    ctx: &mut RenderCtx<'_>,
) {
    let font = run_font(ctx, text.bold, text.italic);
    let ascent = text.font_size * 0.75;

    for tline in &text.lines {
        if tline.text.is_empty() {
            continue;
        }
        let text_x = lbox.x + tline.x_offset;
        let text_y = pdf_y - tline.y_offset - ascent;
        let painted = if text.rtl {
            visual_order(&tline.text)
        } else {
            tline.text.clone()
        };
        write_run(
            ops,
            ctx,
            &font,
            text.font_size,
            text_x,
            text_y,
            text.color,
            &painted,
        );

        if text.underline {
            let underline_y = text_y - text.font_size * 0.1;
            let width = if tline.width > 0.0 {
                tline.width
            } else {
                lbox.width
            };
            ops.push(Op::SetOutlineThickness { pt: Pt(0.5) });
            ops.push(Op::SetOutlineColor {
                col: rgb(text.color),
            });
            ops.push(Op::DrawLine {
                line: Line {
                    points: vec![point(text_x, underline_y), point(text_x + width, underline_y)],
                    is_closed: false,
                },
            });
        }
    }

    if let Some(marker) = &text.list_marker {
        // Gutter sits on the start side.
        let marker_x = if text.rtl {
            lbox.x + lbox.width + 4.0
        } else {
            lbox.x - 12.0
        };
        let marker_font = run_font(ctx, false, false);
        write_run(
            ops,
            ctx,
            &marker_font,
            text.font_size,
            marker_x,
            pdf_y - ascent,
            text.color,
            marker,
        );
    }
}
