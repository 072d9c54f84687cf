//! Weak-perspective projection of the marker plane.
//!
//! The flat marker is treated as a rectangle in the z = 0 plane, rotated
//! about the image x, y, z axes and projected through a pinhole at
//! distance f·h along the view axis. The four projected corners, paired
//! with the four canvas corners, define the homography handed to the
//! resampler.

use image::{Rgb, RgbImage};
use imageproc::geometric_transformations::{warp, Interpolation, Projection};
use nalgebra::Matrix3;

use crate::spec::{SpecError, ViewSpec};

/// Reject perspective denominators at or below this value: a corner this
/// close to the focal plane projects to divergent coordinates.
pub const MIN_PERSPECTIVE_DENOM: f64 = 1e-6;

// ── Error type ───────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ProjectionError {
    Spec(SpecError),
    /// A rotation/focal combination drove a corner onto the focal plane.
    BehindFocalPlane { corner: usize, denom: f64 },
    /// The projected corners admit no invertible homography.
    DegenerateCorrespondence,
}

impl std::fmt::Display for ProjectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Spec(e) => write!(f, "invalid view spec: {}", e),
            Self::BehindFocalPlane { corner, denom } => write!(
                f,
                "corner {} projects behind the focal plane (denominator {:.3e}); \
                 reduce the rotation or increase the focal scalar",
                corner, denom
            ),
            Self::DegenerateCorrespondence => {
                write!(f, "projected corners admit no invertible homography")
            }
        }
    }
}

impl std::error::Error for ProjectionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Spec(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SpecError> for ProjectionError {
    fn from(e: SpecError) -> Self {
        Self::Spec(e)
    }
}

// ── Rotation ─────────────────────────────────────────────────────────────

/// Combined rotation R = Rz · Ry · Rx (rotate about x, then y, then z).
/// Angles in radians.
///
/// Downstream only the first two columns are consumed: the source
/// rectangle is flat (z = 0), so the third column never contributes. Do
/// not reuse this projection math for non-flat geometry without
/// revisiting the dropped column.
pub fn rotation_matrix(rx: f64, ry: f64, rz: f64) -> Matrix3<f64> {
    let (sx, cx) = rx.sin_cos();
    let (sy, cy) = ry.sin_cos();
    let (sz, cz) = rz.sin_cos();
    Matrix3::new(
        cz * cy,
        cz * sy * sx - sz * cx,
        cz * sy * cx + sz * sx,
        sz * cy,
        sz * sy * sx + cz * cx,
        sz * sy * cx - cz * sx,
        -sy,
        cy * sx,
        cy * cx,
    )
}

// ── Corner projection ────────────────────────────────────────────────────

/// Source/destination corner pairs in top-left, top-right, bottom-right,
/// bottom-left order. The order must match between the two sets or the
/// derived homography is invalid.
#[derive(Debug, Clone, PartialEq)]
pub struct CornerCorrespondence {
    pub src: [[f64; 2]; 4],
    pub dst: [[f64; 2]; 4],
}

/// Project the corners of a w×h rectangle under the given view.
///
/// Corners rotating toward the camera (negative z') scale up, corners
/// rotating away scale down, which is what turns the rectangle into a
/// trapezoid on screen.
pub fn project_corners(
    width: u32,
    height: u32,
    view: &ViewSpec,
) -> Result<CornerCorrespondence, ProjectionError> {
    view.validate()?;

    let w = width as f64;
    let h = height as f64;
    let r = rotation_matrix(
        view.rot_x_deg.to_radians(),
        view.rot_y_deg.to_radians(),
        view.rot_z_deg.to_radians(),
    );

    let centered = [
        [-w / 2.0, -h / 2.0],
        [w / 2.0, -h / 2.0],
        [w / 2.0, h / 2.0],
        [-w / 2.0, h / 2.0],
    ];
    let fh = view.focal * h;

    let mut dst = [[0.0f64; 2]; 4];
    for (i, p) in centered.iter().enumerate() {
        let z = p[0] * r[(2, 0)] + p[1] * r[(2, 1)];
        let denom = fh + z;
        if denom <= MIN_PERSPECTIVE_DENOM {
            return Err(ProjectionError::BehindFocalPlane { corner: i, denom });
        }
        let s = fh / denom;
        dst[i] = [
            w / 2.0 + (p[0] * r[(0, 0)] + p[1] * r[(0, 1)]) * s,
            h / 2.0 + (p[0] * r[(1, 0)] + p[1] * r[(1, 1)]) * s,
        ];
    }

    Ok(CornerCorrespondence {
        src: [[0.0, 0.0], [w, 0.0], [w, h], [0.0, h]],
        dst,
    })
}

// ── Warp ─────────────────────────────────────────────────────────────────

/// Resample `image` into its apparent oblique view.
///
/// All-zero rotations return the input unchanged (exact identity, not a
/// near-identity warp). Regions outside the projected quadrilateral are
/// filled with black, and the output keeps the input dimensions.
pub fn apply_view(image: &RgbImage, view: &ViewSpec) -> Result<RgbImage, ProjectionError> {
    view.validate()?;
    if view.is_identity() {
        return Ok(image.clone());
    }

    let corr = project_corners(image.width(), image.height(), view)?;
    tracing::debug!(
        "projected corners: {:?} -> {:?}",
        corr.src,
        corr.dst
    );

    let projection = Projection::from_control_points(as_control_points(&corr.src), as_control_points(&corr.dst))
        .ok_or(ProjectionError::DegenerateCorrespondence)?;

    Ok(warp(
        image,
        &projection,
        Interpolation::Bicubic,
        Rgb([0, 0, 0]),
    ))
}

fn as_control_points(pts: &[[f64; 2]; 4]) -> [(f32, f32); 4] {
    [
        (pts[0][0] as f32, pts[0][1] as f32),
        (pts[1][0] as f32, pts[1][1] as f32),
        (pts[2][0] as f32, pts[2][1] as f32),
        (pts[3][0] as f32, pts[3][1] as f32),
    ]
}
