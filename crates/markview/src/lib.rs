//! markview — synthesizes oblique, motion-blurred views of a square
//! calibration marker.
//!
//! The marker is a flat bordered square bearing a colored fiducial and a
//! character glyph. The generation pipeline stages are:
//!
//! 1. **Compose** – flat marker raster: field color, border ring,
//!    fiducial square, glyph.
//! 2. **Project** – weak-perspective projection of the marker plane; the
//!    four projected corners define the homography handed to the
//!    resampler.
//! 3. **Blur** – normalized directional line-smear kernel, applied as a
//!    channel-wise convolution.
//!
//! # Public API
//! - [`MarkerPipeline`] as the primary entry point
//! - [`GenerationSpec`] (and its parts) for configuration
//! - [`GlyphRenderer`] as the glyph collaborator seam, with
//!   [`FontGlyphRenderer`] as the stock outline-font implementation
//!
//! Stage modules stay public for callers that need a single stage — e.g.
//! just the flat marker, or just a blur kernel.

pub mod blur;
pub mod canvas;
pub mod glyph;
pub mod palette;
pub mod pipeline;
pub mod projection;
pub mod spec;

pub use blur::MotionKernel;
pub use glyph::{FontGlyphRenderer, GlyphMask, GlyphRenderer};
pub use palette::Palette;
pub use pipeline::{MarkerPipeline, PipelineError};
pub use spec::{BlurSpec, GenerationSpec, MarkerSpec, ViewSpec};
