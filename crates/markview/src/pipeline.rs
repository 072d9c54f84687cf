//! Marker generation pipeline.
//!
//! Glue layer that wires the compositor, projector, and blur stages
//! together: stage order and data flow live here, the math lives in the
//! stage modules. The pipeline owns one validated spec value and passes
//! it down by value; no stage mutates shared state, so one generation is
//! a bounded, deterministic computation.

use image::RgbImage;

use crate::blur::{BlurError, MotionKernel};
use crate::canvas::{compose, ComposeError};
use crate::glyph::GlyphRenderer;
use crate::palette::Palette;
use crate::projection::{apply_view, ProjectionError};
use crate::spec::{GenerationSpec, SpecError};

// ── Error type ───────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum PipelineError {
    Spec(SpecError),
    Compose(ComposeError),
    Projection(ProjectionError),
    Blur(BlurError),
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Spec(e) => write!(f, "{}", e),
            Self::Compose(e) => write!(f, "{}", e),
            Self::Projection(e) => write!(f, "{}", e),
            Self::Blur(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Spec(e) => Some(e),
            Self::Compose(e) => Some(e),
            Self::Projection(e) => Some(e),
            Self::Blur(e) => Some(e),
        }
    }
}

impl From<SpecError> for PipelineError {
    fn from(e: SpecError) -> Self {
        Self::Spec(e)
    }
}

impl From<ComposeError> for PipelineError {
    fn from(e: ComposeError) -> Self {
        Self::Compose(e)
    }
}

impl From<ProjectionError> for PipelineError {
    fn from(e: ProjectionError) -> Self {
        Self::Projection(e)
    }
}

impl From<BlurError> for PipelineError {
    fn from(e: BlurError) -> Self {
        Self::Blur(e)
    }
}

// ── Pipeline ─────────────────────────────────────────────────────────────

/// Compose → project → blur, in that order.
///
/// A generation either fully succeeds and yields one complete image, or
/// fails and yields none; there is no partial output.
pub struct MarkerPipeline {
    spec: GenerationSpec,
    palette: Palette,
}

impl MarkerPipeline {
    pub fn new(spec: GenerationSpec) -> Self {
        Self::with_palette(spec, Palette::default())
    }

    pub fn with_palette(spec: GenerationSpec, palette: Palette) -> Self {
        Self { spec, palette }
    }

    pub fn spec(&self) -> &GenerationSpec {
        &self.spec
    }

    /// Run one generation.
    pub fn generate(&self, renderer: &dyn GlyphRenderer) -> Result<RgbImage, PipelineError> {
        self.spec.validate()?;

        let marker = &self.spec.marker;
        tracing::info!(
            "Generating marker: x = {} px, canvas {}x{}, glyph '{}'",
            marker.scale_px,
            marker.width,
            marker.height,
            marker.glyph,
        );

        let flat = compose(marker, &self.palette, renderer)?;

        let view = &self.spec.view;
        if !view.is_identity() {
            tracing::info!(
                "Projecting view: rotation ({}, {}, {}) deg, focal {}",
                view.rot_x_deg,
                view.rot_y_deg,
                view.rot_z_deg,
                view.focal,
            );
        }
        let viewed = apply_view(&flat, view)?;

        let blur = &self.spec.blur;
        match MotionKernel::new(blur.magnitude, blur.angle_deg)? {
            Some(kernel) => {
                tracing::info!(
                    "Applying motion blur: magnitude {} px, angle {} deg",
                    blur.magnitude,
                    blur.angle_deg,
                );
                Ok(kernel.apply(&viewed))
            }
            None => Ok(viewed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph::{GlyphError, GlyphMask};
    use crate::spec::{BlurSpec, MarkerSpec, ViewSpec};
    use image::{GrayImage, Luma};

    /// Fixed square mask, enough to exercise the glyph stage.
    struct BlockGlyph;

    impl GlyphRenderer for BlockGlyph {
        fn render(&self, _symbol: char, _font_scale: f32) -> Result<GlyphMask, GlyphError> {
            Ok(GlyphMask {
                coverage: GrayImage::from_pixel(24, 24, Luma([255u8])),
            })
        }
    }

    /// Always-failing renderer, for propagation tests.
    struct BrokenGlyph;

    impl GlyphRenderer for BrokenGlyph {
        fn render(&self, symbol: char, _font_scale: f32) -> Result<GlyphMask, GlyphError> {
            Err(GlyphError::MissingGlyph(symbol))
        }
    }

    #[test]
    fn flat_spec_short_circuits_both_stages() {
        // All rotations 0 and blur magnitude 0: the pipeline output must
        // be bit-identical to the bare compositor output.
        let pipeline = MarkerPipeline::new(GenerationSpec::default());
        let generated = pipeline.generate(&BlockGlyph).unwrap();
        let composed = compose(
            &MarkerSpec::default(),
            &Palette::default(),
            &BlockGlyph,
        )
        .unwrap();
        assert_eq!(generated, composed);
    }

    #[test]
    fn view_and_blur_stages_change_the_output() {
        let spec = GenerationSpec {
            view: ViewSpec {
                rot_y_deg: 30.0,
                focal: 2.0,
                ..ViewSpec::default()
            },
            blur: BlurSpec {
                magnitude: 5,
                angle_deg: 0.0,
            },
            ..GenerationSpec::default()
        };
        let flat = MarkerPipeline::new(GenerationSpec::default())
            .generate(&BlockGlyph)
            .unwrap();
        let oblique = MarkerPipeline::new(spec).generate(&BlockGlyph).unwrap();
        assert_eq!(oblique.dimensions(), flat.dimensions());
        assert_ne!(oblique, flat);
    }

    #[test]
    fn invalid_spec_fails_before_compositing() {
        let spec = GenerationSpec {
            marker: MarkerSpec {
                scale_px: 0,
                ..MarkerSpec::default()
            },
            ..GenerationSpec::default()
        };
        let err = MarkerPipeline::new(spec).generate(&BlockGlyph).unwrap_err();
        assert!(matches!(err, PipelineError::Spec(SpecError::NonPositiveScale)));
    }

    #[test]
    fn degenerate_view_fails_the_whole_generation() {
        let spec = GenerationSpec {
            view: ViewSpec {
                rot_y_deg: 80.0,
                focal: 0.2,
                ..ViewSpec::default()
            },
            ..GenerationSpec::default()
        };
        let err = MarkerPipeline::new(spec).generate(&BlockGlyph).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Projection(ProjectionError::BehindFocalPlane { .. })
        ));
    }

    #[test]
    fn glyph_failure_propagates() {
        let pipeline = MarkerPipeline::new(GenerationSpec::default());
        let err = pipeline.generate(&BrokenGlyph).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Compose(ComposeError::Glyph(GlyphError::MissingGlyph('T')))
        ));
    }
}
