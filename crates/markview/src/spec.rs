//! Generation parameters and validation.
//!
//! Spec JSON follows a versioned schema (`markview.spec.v1`). All
//! parameters are validated up front; generation never starts from a spec
//! that cannot produce a complete marker.

use std::path::Path;

const SPEC_SCHEMA_V1: &str = "markview.spec.v1";

const DEFAULT_SCALE_PX: u32 = 20;
const DEFAULT_WIDTH: u32 = 500;
const DEFAULT_HEIGHT: u32 = 500;
const DEFAULT_GLYPH: char = 'T';
const DEFAULT_FOCAL: f64 = 1.0;

/// Side of the bordered region, in scale units.
pub const BORDER_EXTENT_UNITS: u32 = 16;

/// Side of the fiducial square, in scale units.
pub const FIDUCIAL_SIDE_UNITS: u32 = 4;

// ── Error type ───────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum SpecError {
    /// Scale unit must be at least 1 px.
    NonPositiveScale,
    /// Canvas cannot contain the bordered layout.
    CanvasTooSmall {
        width: u32,
        height: u32,
        required: u32,
    },
    /// Focal scalar must be finite and > 0.
    NonPositiveFocal { focal: f64 },
    /// A rotation or blur angle is NaN or infinite.
    NonFiniteAngle { name: &'static str, value: f64 },
    /// Spec file carries a schema this build does not understand.
    UnsupportedSchema { found: String },
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl std::fmt::Display for SpecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonPositiveScale => write!(f, "scale unit must be >= 1 px"),
            Self::CanvasTooSmall {
                width,
                height,
                required,
            } => write!(
                f,
                "canvas {}x{} cannot contain the {}px bordered layout",
                width, height, required
            ),
            Self::NonPositiveFocal { focal } => {
                write!(f, "focal scalar must be finite and > 0, got {}", focal)
            }
            Self::NonFiniteAngle { name, value } => {
                write!(f, "{} must be finite, got {}", name, value)
            }
            Self::UnsupportedSchema { found } => write!(
                f,
                "unsupported spec schema '{}' (expected '{}')",
                found, SPEC_SCHEMA_V1
            ),
            Self::Io(e) => write!(f, "failed to read spec file: {}", e),
            Self::Parse(e) => write!(f, "failed to parse spec file: {}", e),
        }
    }
}

impl std::error::Error for SpecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Parse(e) => Some(e),
            _ => None,
        }
    }
}

// ── Marker layout ────────────────────────────────────────────────────────

/// Flat marker layout: one scale unit drives every extent, so the layout
/// is self-similar under changes to `scale_px`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarkerSpec {
    /// Scale unit x in pixels.
    pub scale_px: u32,
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Alphanumeric character rendered on the fiducial.
    pub glyph: char,
}

impl Default for MarkerSpec {
    fn default() -> Self {
        Self {
            scale_px: DEFAULT_SCALE_PX,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            glyph: DEFAULT_GLYPH,
        }
    }
}

impl MarkerSpec {
    /// Side of the bordered region in pixels (16x).
    pub fn border_extent_px(&self) -> u32 {
        BORDER_EXTENT_UNITS * self.scale_px
    }

    /// Side of the fiducial square in pixels (4x).
    pub fn fiducial_side_px(&self) -> u32 {
        FIDUCIAL_SIDE_UNITS * self.scale_px
    }

    /// Border stroke margin δ = 3x/16 in pixels (integer division, as the
    /// layout has always done); the visible ring is 2δ wide.
    pub fn border_delta_px(&self) -> u32 {
        3 * self.scale_px / 16
    }

    pub fn validate(&self) -> Result<(), SpecError> {
        if self.scale_px == 0 {
            return Err(SpecError::NonPositiveScale);
        }
        let required = self.border_extent_px();
        if self.width < required || self.height < required {
            return Err(SpecError::CanvasTooSmall {
                width: self.width,
                height: self.height,
                required,
            });
        }
        Ok(())
    }
}

// ── Viewing geometry ─────────────────────────────────────────────────────

/// Oblique viewing parameters: intrinsic rotations about the image x, y, z
/// axes (applied in that order) and the viewpoint distance in units of the
/// image height.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ViewSpec {
    pub rot_x_deg: f64,
    pub rot_y_deg: f64,
    pub rot_z_deg: f64,
    /// Focal scalar f; f → ∞ approaches an orthographic view.
    pub focal: f64,
}

impl Default for ViewSpec {
    fn default() -> Self {
        Self {
            rot_x_deg: 0.0,
            rot_y_deg: 0.0,
            rot_z_deg: 0.0,
            focal: DEFAULT_FOCAL,
        }
    }
}

impl ViewSpec {
    /// True when all three rotations are exactly zero; the projection
    /// stage must then be an exact no-op.
    pub fn is_identity(&self) -> bool {
        self.rot_x_deg == 0.0 && self.rot_y_deg == 0.0 && self.rot_z_deg == 0.0
    }

    pub fn validate(&self) -> Result<(), SpecError> {
        for (name, value) in [
            ("rot_x_deg", self.rot_x_deg),
            ("rot_y_deg", self.rot_y_deg),
            ("rot_z_deg", self.rot_z_deg),
        ] {
            if !value.is_finite() {
                return Err(SpecError::NonFiniteAngle { name, value });
            }
        }
        if !self.focal.is_finite() || self.focal <= 0.0 {
            return Err(SpecError::NonPositiveFocal { focal: self.focal });
        }
        Ok(())
    }
}

// ── Motion blur ──────────────────────────────────────────────────────────

/// Linear motion-blur parameters. Magnitude 0 disables the stage.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct BlurSpec {
    /// Smear length in pixels; also the kernel side.
    pub magnitude: u32,
    /// Smear direction, counter-clockwise degrees.
    pub angle_deg: f64,
}

impl Default for BlurSpec {
    fn default() -> Self {
        Self {
            magnitude: 0,
            angle_deg: 0.0,
        }
    }
}

impl BlurSpec {
    pub fn validate(&self) -> Result<(), SpecError> {
        if !self.angle_deg.is_finite() {
            return Err(SpecError::NonFiniteAngle {
                name: "blur angle_deg",
                value: self.angle_deg,
            });
        }
        Ok(())
    }
}

// ── Top-level spec document ──────────────────────────────────────────────

/// One complete generation spec, as stored in spec JSON files.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationSpec {
    pub schema: String,
    pub marker: MarkerSpec,
    #[serde(default)]
    pub view: ViewSpec,
    #[serde(default)]
    pub blur: BlurSpec,
}

impl Default for GenerationSpec {
    fn default() -> Self {
        Self {
            schema: SPEC_SCHEMA_V1.to_string(),
            marker: MarkerSpec::default(),
            view: ViewSpec::default(),
            blur: BlurSpec::default(),
        }
    }
}

impl GenerationSpec {
    /// Parse and validate a spec document.
    pub fn from_json_str(data: &str) -> Result<Self, SpecError> {
        let spec: Self = serde_json::from_str(data).map_err(SpecError::Parse)?;
        if spec.schema != SPEC_SCHEMA_V1 {
            return Err(SpecError::UnsupportedSchema {
                found: spec.schema,
            });
        }
        spec.validate()?;
        Ok(spec)
    }

    /// Load a generation spec from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, SpecError> {
        let data = std::fs::read_to_string(path).map_err(SpecError::Io)?;
        Self::from_json_str(&data)
    }

    pub fn validate(&self) -> Result<(), SpecError> {
        self.marker.validate()?;
        self.view.validate()?;
        self.blur.validate()
    }
}
