//! Glyph rasterization seam.
//!
//! The compositor only consumes a coverage mask; turning a character into
//! pixels is delegated through [`GlyphRenderer`]. The stock implementation
//! rasterizes outline fonts with `ab_glyph` via `imageproc`'s text drawing.

use ab_glyph::{Font, FontVec, PxScale};
use image::{GrayImage, Luma};
use imageproc::drawing::{draw_text_mut, text_size};
use std::path::Path;

/// Pixel height of one font-scale unit.
///
/// The marker layout expresses glyph size as a dimensionless font scale
/// (fiducial area over [`crate::canvas::GLYPH_AREA_DIVISOR`]); outline
/// fonts want a pixel height. 30 px per unit keeps the glyph roughly
/// fiducial-sized across the useful range of scale units.
pub const GLYPH_UNIT_PX: f32 = 30.0;

// ── Error type ───────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum GlyphError {
    /// Font bytes could not be loaded or parsed.
    FontLoad(String),
    /// The font has no outline for the requested character.
    MissingGlyph(char),
    /// Rasterization produced a zero-sized mask.
    EmptyMask(char),
}

impl std::fmt::Display for GlyphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FontLoad(msg) => write!(f, "font load failed: {}", msg),
            Self::MissingGlyph(c) => write!(f, "font has no glyph for '{}'", c),
            Self::EmptyMask(c) => write!(f, "glyph '{}' rasterized to an empty mask", c),
        }
    }
}

impl std::error::Error for GlyphError {}

// ── Mask + renderer seam ─────────────────────────────────────────────────

/// Per-pixel glyph coverage, 0 = transparent, 255 = fully inked.
#[derive(Debug, Clone)]
pub struct GlyphMask {
    pub coverage: GrayImage,
}

impl GlyphMask {
    pub fn width(&self) -> u32 {
        self.coverage.width()
    }

    pub fn height(&self) -> u32 {
        self.coverage.height()
    }
}

/// Rasterizes one character sized by a dimensionless font scale.
pub trait GlyphRenderer {
    fn render(&self, symbol: char, font_scale: f32) -> Result<GlyphMask, GlyphError>;
}

// ── Outline-font implementation ──────────────────────────────────────────

/// [`GlyphRenderer`] backed by an `ab_glyph` outline font.
#[derive(Debug)]
pub struct FontGlyphRenderer {
    font: FontVec,
}

impl FontGlyphRenderer {
    pub fn from_font_bytes(bytes: Vec<u8>) -> Result<Self, GlyphError> {
        let font = FontVec::try_from_vec(bytes)
            .map_err(|e| GlyphError::FontLoad(e.to_string()))?;
        Ok(Self { font })
    }

    pub fn from_font_file(path: &Path) -> Result<Self, GlyphError> {
        let bytes = std::fs::read(path)
            .map_err(|e| GlyphError::FontLoad(format!("{}: {}", path.display(), e)))?;
        Self::from_font_bytes(bytes)
    }
}

impl GlyphRenderer for FontGlyphRenderer {
    fn render(&self, symbol: char, font_scale: f32) -> Result<GlyphMask, GlyphError> {
        // Glyph id 0 is the .notdef box.
        if self.font.glyph_id(symbol).0 == 0 {
            return Err(GlyphError::MissingGlyph(symbol));
        }

        let scale = PxScale::from(font_scale * GLYPH_UNIT_PX);
        let text = symbol.to_string();

        let (tw, th) = text_size(scale, &self.font, &text);
        let (tw, th) = (tw as u32, th as u32);
        if tw == 0 || th == 0 {
            return Err(GlyphError::EmptyMask(symbol));
        }

        let mut coverage = GrayImage::new(tw, th);
        draw_text_mut(&mut coverage, Luma([255u8]), 0, 0, scale, &self.font, &text);
        Ok(GlyphMask { coverage })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_font_bytes_rejected() {
        let err = FontGlyphRenderer::from_font_bytes(vec![0u8; 64]).unwrap_err();
        assert!(matches!(err, GlyphError::FontLoad(_)));
    }

    #[test]
    fn missing_font_file_rejected() {
        let err =
            FontGlyphRenderer::from_font_file(Path::new("/nonexistent/font.ttf")).unwrap_err();
        assert!(matches!(err, GlyphError::FontLoad(_)));
    }
}
