//! Text measurement for layout and footer placement.
//!
//! Documents are drawn with the PDF builtin Helvetica family. Without a
//! metrics font, widths use an average-advance heuristic; loading the TTF of
//! a metrically compatible face (e.g. Liberation Sans) through `ttf-parser`
//! gives exact glyph advances.

use std::collections::HashMap;

/// Family every composed document is measured and drawn with.
pub const DEFAULT_FAMILY: &str = "Helvetica";

/// Metrics of one loaded face.
#[derive(Clone)]
pub struct FontData {
    /// Raw font bytes; empty for synthetic metrics.
    pub bytes: Vec<u8>,
    pub units_per_em: f32,
    pub ascender: f32,
    pub descender: f32,
}

impl FontData {
    fn synthetic() -> Self {
        Self {
            bytes: Vec::new(),
            units_per_em: 1000.0,
            ascender: 750.0,
            descender: -250.0,
        }
    }
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct FontKey {
    pub family: String,
    pub bold: bool,
    pub italic: bool,
}

impl FontKey {
    fn new(family: &str, bold: bool, italic: bool) -> Self {
        Self {
            family: family.to_string(),
            bold,
            italic,
        }
    }
}

/// Loaded faces keyed by family and variant.
#[derive(Clone)]
pub struct FontManager {
    fonts: HashMap<FontKey, FontData>,
    default_key: FontKey,
}

impl FontManager {
    /// Synthetic Helvetica metrics for the regular and bold variants.
    pub fn new() -> Self {
        let default_key = FontKey::new(DEFAULT_FAMILY, false, false);
        let mut fonts = HashMap::new();
        fonts.insert(default_key.clone(), FontData::synthetic());
        fonts.insert(FontKey::new(DEFAULT_FAMILY, true, false), FontData::synthetic());
        Self { fonts, default_key }
    }

    /// Load a TTF/OTF face for measuring the given variant.
    pub fn load_font(
        &mut self,
        family: &str,
        bold: bool,
        italic: bool,
        bytes: Vec<u8>,
    ) -> Result<(), String> {
        let face = ttf_parser::Face::parse(&bytes, 0)
            .map_err(|e| format!("Failed to parse font: {e}"))?;
        let data = FontData {
            units_per_em: f32::from(face.units_per_em()),
            ascender: f32::from(face.ascender()),
            descender: f32::from(face.descender()),
            bytes,
        };
        log::debug!(
            "Loaded metrics font {family} (bold={bold}, italic={italic}, {} units/em)",
            data.units_per_em
        );
        self.fonts.insert(FontKey::new(family, bold, italic), data);
        Ok(())
    }

    fn get(&self, key: &FontKey) -> Option<&FontData> {
        self.fonts
            .get(key)
            .or_else(|| self.fonts.get(&FontKey::new(&key.family, key.bold, false)))
            .or_else(|| self.fonts.get(&self.default_key))
    }

    /// Width of `text` at `font_size`, in points.
    pub fn measure_text_width(
        &self,
        text: &str,
        font_size: f32,
        bold: bool,
        italic: bool,
        family: &str,
    ) -> f32 {
        let heuristic = || {
            // Average advance ≈ 0.5 em, bold ≈ 10 % wider.
            let avg = if bold { 0.55 } else { 0.5 };
            text.chars().count() as f32 * font_size * avg
        };

        let Some(data) = self.get(&FontKey::new(family, bold, italic)) else {
            return heuristic();
        };
        if data.bytes.is_empty() {
            return heuristic();
        }
        let Ok(face) = ttf_parser::Face::parse(&data.bytes, 0) else {
            return heuristic();
        };

        let scale = font_size / data.units_per_em;
        text.chars()
            .map(|ch| {
                face.glyph_index(ch)
                    .and_then(|gid| face.glyph_hor_advance(gid))
                    .map_or(font_size * 0.5, |adv| f32::from(adv) * scale)
            })
            .sum()
    }

    pub fn line_height_px(&self, font_size: f32, line_height_factor: f32) -> f32 {
        font_size * line_height_factor
    }

    /// Ascender height in points; baseline offset from the top of a line.
    pub fn ascender_px(&self, font_size: f32, bold: bool, italic: bool, family: &str) -> f32 {
        self.get(&FontKey::new(family, bold, italic))
            .map_or(font_size * 0.75, |d| d.ascender * font_size / d.units_per_em)
    }
}

impl Default for FontManager {
    fn default() -> Self {
        Self::new()
    }
}
