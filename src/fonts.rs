//! Fonts and text measurement.
//!
//! Without a configured font the print stage uses the PDF builtin Helvetica,
//! measured with per-character width classes. A TTF supplied through
//! `font_path` is parsed with `ttf-parser` for metrics and shaped with
//! `rustybuzz` for widths, which keeps Arabic runs measured by the glyphs the
//! font actually has.

use std::fs;
use std::path::Path;

use crate::error::{RenderError, Result};

/// A TTF loaded from disk.
#[derive(Clone)]
struct LoadedFont {
    bytes: Vec<u8>,
    units_per_em: f32,
    ascender: f32,
    descender: f32,
}

/// Measurement front-end shared by layout, pagination and rendering.
#[derive(Clone, Default)]
pub struct FontManager {
    loaded: Option<LoadedFont>,
}

impl FontManager {
    /// Builtin Helvetica metrics only.
    pub fn builtin() -> Self {
        Self::default()
    }

    /// Load a TTF/OTF from `path`.
    pub fn from_font_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let manager = Self::from_bytes(bytes)
            .map_err(|e| RenderError::Font(format!("{}: {e}", path.display())))?;
        log::debug!("Loaded font {}", path.display());
        Ok(manager)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> std::result::Result<Self, String> {
        let (units_per_em, ascender, descender) = {
            let face = ttf_parser::Face::parse(&bytes, 0).map_err(|e| e.to_string())?;
            (
                face.units_per_em() as f32,
                face.ascender() as f32,
                face.descender() as f32,
            )
        };
        Ok(Self {
            loaded: Some(LoadedFont {
                bytes,
                units_per_em,
                ascender,
                descender,
            }),
        })
    }

    /// Width of `text` in points.
    pub fn measure_text_width(&self, text: &str, font_size: f32, bold: bool) -> f32 {
        match &self.loaded {
            Some(font) => shaped_width(font, text, font_size).unwrap_or_else(|| {
                log::warn!("Shaping failed; estimating width of {text:?}");
                helvetica_width(text, font_size, bold)
            }),
            None => helvetica_width(text, font_size, bold),
        }
    }

    pub fn line_height(&self, font_size: f32, line_height_factor: f32) -> f32 {
        font_size * line_height_factor
    }

    /// Baseline offset from the top of a line box.
    pub fn ascender(&self, font_size: f32) -> f32 {
        match &self.loaded {
            Some(f) if f.units_per_em > 0.0 => {
                // Normalise so ascender + |descender| fits in the em box.
                let total = f.ascender - f.descender;
                let share = if total > 0.0 { f.ascender / total } else { 0.8 };
                font_size * share
            }
            _ => font_size * 0.75,
        }
    }

    /// Characters of `text` the loaded font has no glyph for. Builtin
    /// Helvetica covers WinAnsi only.
    pub fn missing_chars(&self, text: &str) -> Vec<char> {
        let mut missing: Vec<char> = match &self.loaded {
            Some(font) => match ttf_parser::Face::parse(&font.bytes, 0) {
                Ok(face) => text
                    .chars()
                    .filter(|c| !c.is_whitespace() && face.glyph_index(*c).is_none())
                    .collect(),
                Err(_) => Vec::new(),
            },
            None => text.chars().filter(|c| !is_winansi(*c)).collect(),
        };
        missing.sort_unstable();
        missing.dedup();
        missing
    }
}

fn shaped_width(font: &LoadedFont, text: &str, font_size: f32) -> Option<f32> {
    if font.units_per_em <= 0.0 {
        return None;
    }
    let face = rustybuzz::Face::from_slice(&font.bytes, 0)?;
    let mut buffer = rustybuzz::UnicodeBuffer::new();
    buffer.push_str(text);
    buffer.guess_segment_properties();
    let glyphs = rustybuzz::shape(&face, &[], buffer);
    let advance: i32 = glyphs.glyph_positions().iter().map(|p| p.x_advance).sum();
    Some(advance as f32 * font_size / font.units_per_em)
}

/// Approximate Helvetica advance widths (em fractions) by character class.
fn helvetica_width(text: &str, font_size: f32, bold: bool) -> f32 {
    let em: f32 = text
        .chars()
        .map(|c| match c {
            'i' | 'j' | 'l' | '.' | ',' | ':' | ';' | '\'' | '|' | '!' => 0.25,
            ' ' | 'f' | 't' | 'r' | 'I' | '(' | ')' | '[' | ']' | '/' | '-' => 0.32,
            'm' | 'w' | 'M' | 'W' | '@' | '%' => 0.85,
            '0'..='9' | '$' | '#' | '_' => 0.556,
            c if c.is_ascii_uppercase() => 0.68,
            c if c.is_ascii() => 0.52,
            // Non-Latin scripts: assume a wide-ish average glyph.
            _ => 0.6,
        })
        .sum();
    let weight = if bold { 1.06 } else { 1.0 };
    em * font_size * weight
}

/// Characters the builtin fonts can show under WinAnsiEncoding.
pub fn is_winansi(c: char) -> bool {
    (c as u32) < 0x100
        || matches!(
            c,
            '\u{20AC}'
                | '\u{201A}'
                | '\u{201E}'
                | '\u{2026}'
                | '\u{2018}'
                | '\u{2019}'
                | '\u{201C}'
                | '\u{201D}'
                | '\u{2022}'
                | '\u{2013}'
                | '\u{2014}'
                | '\u{2122}'
        )
}

/// Greedy word wrap to `max_width` points. Explicit `\n` (from `<br>`)
/// always breaks. A single word wider than the line stays on its own line.
pub fn wrap_text(
    text: &str,
    font_size: f32,
    bold: bool,
    max_width: f32,
    fonts: &FontManager,
) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if current.is_empty() {
                current.push_str(word);
                continue;
            }
            let candidate = format!("{current} {word}");
            if max_width > 0.0 && fonts.measure_text_width(&candidate, font_size, bold) > max_width
            {
                lines.push(std::mem::replace(&mut current, word.to_string()));
            } else {
                current = candidate;
            }
        }
        lines.push(current);
    }
    // Drop blank lines produced by leading/trailing breaks, keep inner ones.
    while lines.len() > 1 && lines.last().is_some_and(String::is_empty) {
        lines.pop();
    }
    while lines.len() > 1 && lines.first().is_some_and(String::is_empty) {
        lines.remove(0);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrow_glyphs_measure_narrower() {
        let fonts = FontManager::builtin();
        let narrow = fonts.measure_text_width("iiii", 10.0, false);
        let wide = fonts.measure_text_width("MMMM", 10.0, false);
        assert!(narrow < wide);
        assert!(fonts.measure_text_width("Total", 10.0, true) > fonts.measure_text_width("Total", 10.0, false));
    }

    #[test]
    fn wraps_at_width() {
        let fonts = FontManager::builtin();
        let lines = wrap_text("The Purchaser shall pay the DLD fee", 10.0, false, 60.0, &fonts);
        assert!(lines.len() >= 3, "got {lines:?}");
        assert!(lines.iter().all(|l| !l.is_empty()));
    }

    #[test]
    fn explicit_breaks_are_kept() {
        let fonts = FontManager::builtin();
        let lines = wrap_text("Dubai\nUnited Arab Emirates\n", 10.0, false, 500.0, &fonts);
        assert_eq!(lines, vec!["Dubai", "United Arab Emirates"]);
    }

    #[test]
    fn builtin_font_reports_arabic_as_missing() {
        let fonts = FontManager::builtin();
        assert!(fonts.missing_chars("Unit No").is_empty());
        assert_eq!(fonts.missing_chars("رقم").len(), 3);
    }

    #[test]
    fn garbage_font_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ttf");
        std::fs::write(&path, b"not a font").unwrap();
        assert!(matches!(
            FontManager::from_font_path(&path),
            Err(RenderError::Font(_))
        ));
    }
}
