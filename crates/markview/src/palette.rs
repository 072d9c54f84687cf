//! Marker color palette.

use image::Rgb;

/// Named colors used by the compositor. Channel order is RGB.
///
/// The defaults reproduce the classic field-green / white / red marker
/// scheme used by detection test rigs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    /// Field color filling the canvas outside the marker.
    pub background: Rgb<u8>,
    /// Border ring color.
    pub border: Rgb<u8>,
    /// Fiducial square color.
    pub fiducial: Rgb<u8>,
    /// Glyph color.
    pub glyph: Rgb<u8>,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: Rgb([0, 100, 0]),
            border: Rgb([255, 255, 255]),
            fiducial: Rgb([255, 0, 0]),
            glyph: Rgb([255, 255, 255]),
        }
    }
}

/// Relative luma of a color in [0, 1] (BT.601 weights).
pub fn luma(color: Rgb<u8>) -> f32 {
    let [r, g, b] = color.0;
    (0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32) / 255.0
}

/// Absolute luma difference between two colors, in [0, 1].
pub fn luma_contrast(a: Rgb<u8>, b: Rgb<u8>) -> f32 {
    (luma(a) - luma(b)).abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_palette_has_visible_border_and_fiducial() {
        let p = Palette::default();
        // The border must stand out against the field, and the fiducial
        // against both the field and the border.
        assert!(luma_contrast(p.border, p.background) > 0.3);
        assert!(luma_contrast(p.fiducial, p.background) > 0.05);
        assert!(luma_contrast(p.fiducial, p.border) > 0.3);
    }

    #[test]
    fn glyph_contrasts_with_fiducial() {
        let p = Palette::default();
        assert!(luma_contrast(p.glyph, p.fiducial) > 0.3);
    }
}
