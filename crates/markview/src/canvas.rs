//! Flat marker composition.
//!
//! Layout, centered on the canvas and driven entirely by the scale unit x:
//! a 16x white border square with the field color re-filled inside (leaving
//! a ring 2δ wide, δ = 3x/16), a 4x fiducial square, and a glyph whose font
//! scale follows the fiducial area.

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

use crate::glyph::{GlyphError, GlyphMask, GlyphRenderer};
use crate::palette::Palette;
use crate::spec::{MarkerSpec, SpecError};

/// Empirical legibility constant: the glyph's font scale is
/// `fiducial_area_px / GLYPH_AREA_DIVISOR`.
pub const GLYPH_AREA_DIVISOR: f32 = 2000.0;

// ── Error type ───────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ComposeError {
    Spec(SpecError),
    Glyph(GlyphError),
}

impl std::fmt::Display for ComposeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Spec(e) => write!(f, "invalid marker spec: {}", e),
            Self::Glyph(e) => write!(f, "glyph rendering failed: {}", e),
        }
    }
}

impl std::error::Error for ComposeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Spec(e) => Some(e),
            Self::Glyph(e) => Some(e),
        }
    }
}

impl From<SpecError> for ComposeError {
    fn from(e: SpecError) -> Self {
        Self::Spec(e)
    }
}

impl From<GlyphError> for ComposeError {
    fn from(e: GlyphError) -> Self {
        Self::Glyph(e)
    }
}

// ── Compositor ───────────────────────────────────────────────────────────

/// Compose the flat, axis-aligned marker image.
pub fn compose(
    spec: &MarkerSpec,
    palette: &Palette,
    renderer: &dyn GlyphRenderer,
) -> Result<RgbImage, ComposeError> {
    spec.validate()?;

    let (w, h) = (spec.width, spec.height);
    let (cx, cy) = (w as i32 / 2, h as i32 / 2);
    let mut img = RgbImage::from_pixel(w, h, palette.background);

    // Border ring: outer square of side 16x, field re-filled 2δ in from
    // the outer edge on every side.
    let delta = spec.border_delta_px() as i32;
    if delta == 0 {
        tracing::warn!(
            "scale unit {} px leaves no visible border ring (delta = 0)",
            spec.scale_px
        );
    }
    let outer = spec.border_extent_px() as i32;
    draw_centered_square(&mut img, cx, cy, outer, palette.border);
    draw_centered_square(&mut img, cx, cy, outer - 4 * delta, palette.background);

    // Fiducial square.
    let fiducial = spec.fiducial_side_px() as i32;
    draw_centered_square(&mut img, cx, cy, fiducial, palette.fiducial);

    // Glyph, sized from the fiducial area.
    let font_scale = (fiducial * fiducial) as f32 / GLYPH_AREA_DIVISOR;
    let mask = renderer.render(spec.glyph, font_scale)?;
    blend_mask_centered(&mut img, &mask, cx, cy, palette.glyph);

    Ok(img)
}

fn draw_centered_square(img: &mut RgbImage, cx: i32, cy: i32, side: i32, color: Rgb<u8>) {
    if side <= 0 {
        return;
    }
    let half = side / 2;
    draw_filled_rect_mut(
        img,
        Rect::at(cx - half, cy - half).of_size(side as u32, side as u32),
        color,
    );
}

/// Alpha-blend `mask` in `color` centered at (cx, cy), clipped to the
/// canvas bounds.
fn blend_mask_centered(img: &mut RgbImage, mask: &GlyphMask, cx: i32, cy: i32, color: Rgb<u8>) {
    let (mw, mh) = (mask.width() as i32, mask.height() as i32);
    let (w, h) = (img.width() as i32, img.height() as i32);
    let x0 = cx - mw / 2;
    let y0 = cy - mh / 2;

    for my in 0..mh {
        let ty = y0 + my;
        if ty < 0 || ty >= h {
            continue;
        }
        for mx in 0..mw {
            let tx = x0 + mx;
            if tx < 0 || tx >= w {
                continue;
            }
            let a = mask.coverage.get_pixel(mx as u32, my as u32)[0] as u16;
            if a == 0 {
                continue;
            }
            let dst = img.get_pixel_mut(tx as u32, ty as u32);
            for c in 0..3 {
                let fg = color[c] as u16;
                let bg = dst[c] as u16;
                dst[c] = ((fg * a + bg * (255 - a) + 127) / 255) as u8;
            }
        }
    }
}
