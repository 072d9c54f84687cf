//! Directional motion blur.
//!
//! A linear smear of magnitude m is a m×m kernel whose middle row holds m
//! equal weights; rotating that kernel in-plane orients the smear. The
//! kernel only parameterizes the blur — the convolution itself is
//! delegated to `imageproc`.

use image::{ImageBuffer, Luma, RgbImage};
use imageproc::definitions::Clamp;
use imageproc::filter::Kernel;
use imageproc::geometric_transformations::{rotate, Interpolation};

/// Weight sums below this after rotation mean the kernel lost all its
/// mass; renormalizing would divide by noise.
const MIN_KERNEL_MASS: f32 = 1e-6;

type KernelBuffer = ImageBuffer<Luma<f32>, Vec<f32>>;

// ── Error type ───────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum BlurError {
    /// In-plane rotation annihilated the kernel weights.
    DegenerateKernel { magnitude: u32, angle_deg: f64 },
}

impl std::fmt::Display for BlurError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DegenerateKernel {
                magnitude,
                angle_deg,
            } => write!(
                f,
                "motion kernel (magnitude {}, angle {} deg) has no remaining mass after rotation",
                magnitude, angle_deg
            ),
        }
    }
}

impl std::error::Error for BlurError {}

// ── Kernel ───────────────────────────────────────────────────────────────

/// Normalized directional line-smear kernel.
///
/// Weights are non-negative and sum to 1.0, so convolving preserves
/// brightness at every smear angle.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionKernel {
    size: u32,
    weights: Vec<f32>,
}

impl MotionKernel {
    /// Build the kernel for a smear of `magnitude` pixels along
    /// `angle_deg` (counter-clockwise).
    ///
    /// Magnitude 0 yields `Ok(None)`: the caller must skip convolution
    /// entirely so the stage is bit-identical to "no blur". Magnitude 1
    /// is a single unit weight regardless of angle.
    pub fn new(magnitude: u32, angle_deg: f64) -> Result<Option<Self>, BlurError> {
        if magnitude == 0 {
            return Ok(None);
        }
        if magnitude == 1 {
            return Ok(Some(Self {
                size: 1,
                weights: vec![1.0],
            }));
        }

        let mut buf = KernelBuffer::new(magnitude, magnitude);
        let mid = magnitude / 2;
        let w = 1.0 / magnitude as f32;
        for x in 0..magnitude {
            buf.put_pixel(x, mid, Luma([w]));
        }

        if angle_deg.rem_euclid(360.0) != 0.0 {
            // imageproc's rotate is clockwise-positive; the smear angle is
            // counter-clockwise. The rotation center matches the row index
            // convention (integer division), keeping odd kernels symmetric
            // about their center cell.
            buf = rotate(
                &buf,
                (mid as f32, mid as f32),
                -angle_deg.to_radians() as f32,
                Interpolation::Bicubic,
                Luma([0.0]),
            );
        }

        let mut weights = buf.into_raw();
        for w in &mut weights {
            // Bicubic interpolation rings below zero near the smear edges.
            if *w < 0.0 {
                *w = 0.0;
            }
        }
        let mass: f32 = weights.iter().sum();
        if !mass.is_finite() || mass <= MIN_KERNEL_MASS {
            return Err(BlurError::DegenerateKernel {
                magnitude,
                angle_deg,
            });
        }
        for w in &mut weights {
            *w /= mass;
        }

        Ok(Some(Self {
            size: magnitude,
            weights,
        }))
    }

    /// Kernel side length in pixels.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Row-major kernel weights.
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Channel-wise same-size convolution. Pixels past the image border
    /// are read from the nearest edge (replication).
    pub fn apply(&self, image: &RgbImage) -> RgbImage {
        let kernel = Kernel::new(&self.weights, self.size, self.size);
        kernel.filter(image, |channel, acc| *channel = Clamp::clamp(acc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use image::Rgb;

    fn weight(kernel: &MotionKernel, x: u32, y: u32) -> f32 {
        kernel.weights()[(y * kernel.size() + x) as usize]
    }

    #[test]
    fn zero_magnitude_disables_the_stage() {
        assert!(MotionKernel::new(0, 0.0).unwrap().is_none());
        assert!(MotionKernel::new(0, 123.0).unwrap().is_none());
    }

    #[test]
    fn unit_magnitude_is_a_single_weight() {
        for angle in [0.0, 45.0, 300.0] {
            let k = MotionKernel::new(1, angle).unwrap().unwrap();
            assert_eq!(k.size(), 1);
            assert_eq!(k.weights(), &[1.0]);
        }
    }

    #[test]
    fn horizontal_smear_is_the_middle_row() {
        let k = MotionKernel::new(15, 0.0).unwrap().unwrap();
        assert_eq!(k.size(), 15);
        for y in 0..15 {
            for x in 0..15 {
                let expected = if y == 7 { 1.0 / 15.0 } else { 0.0 };
                assert_relative_eq!(weight(&k, x, y), expected);
            }
        }
    }

    #[test]
    fn full_turn_angles_leave_the_row_untouched() {
        let base = MotionKernel::new(9, 0.0).unwrap().unwrap();
        for angle in [360.0, -360.0, 720.0] {
            let k = MotionKernel::new(9, angle).unwrap().unwrap();
            assert_eq!(k, base, "angle {} took the rotation path", angle);
        }
    }

    #[test]
    fn weights_sum_to_one_at_every_angle() {
        for mag in [2, 5, 15] {
            for step in 0..24 {
                let angle = step as f64 * 15.0;
                let k = MotionKernel::new(mag, angle).unwrap().unwrap();
                let sum: f32 = k.weights().iter().sum();
                assert_relative_eq!(sum, 1.0, epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn weights_are_non_negative_at_every_angle() {
        for step in 0..24 {
            let k = MotionKernel::new(15, step as f64 * 15.0).unwrap().unwrap();
            assert!(k.weights().iter().all(|&w| w >= 0.0));
        }
    }

    #[test]
    fn opposite_angles_build_the_same_smear() {
        // A line smear has no direction, only an orientation.
        for angle in [10.0, 45.0, 75.0, 120.0] {
            let a = MotionKernel::new(15, angle).unwrap().unwrap();
            let b = MotionKernel::new(15, angle + 180.0).unwrap().unwrap();
            for (wa, wb) in a.weights().iter().zip(b.weights()) {
                assert_relative_eq!(wa, wb, epsilon = 1e-4);
            }
        }
    }

    #[test]
    fn ninety_degree_smear_is_the_middle_column() {
        let k = MotionKernel::new(9, 90.0).unwrap().unwrap();
        let column_mass: f32 = (0..9).map(|y| weight(&k, 4, y)).sum();
        assert_relative_eq!(column_mass, 1.0, epsilon = 1e-3);
    }

    #[test]
    fn unit_kernel_convolution_is_exact_identity() {
        let img = RgbImage::from_fn(24, 16, |x, y| {
            Rgb([(x * 11 % 256) as u8, (y * 5 % 256) as u8, 200])
        });
        let k = MotionKernel::new(1, 33.0).unwrap().unwrap();
        assert_eq!(k.apply(&img), img);
    }

    #[test]
    fn horizontal_smear_spreads_a_point_along_a_row() {
        let mut img = RgbImage::new(21, 21);
        img.put_pixel(10, 10, Rgb([255, 255, 255]));

        let k = MotionKernel::new(5, 0.0).unwrap().unwrap();
        let out = k.apply(&img);

        // 255/5 = 51 along the smear, nothing above or below.
        for x in 8..=12 {
            assert_eq!(out.get_pixel(x, 10)[0], 51, "x = {}", x);
        }
        assert_eq!(out.get_pixel(10, 9)[0], 0);
        assert_eq!(out.get_pixel(10, 11)[0], 0);
        assert_eq!(out.get_pixel(7, 10)[0], 0);
    }

    #[test]
    fn convolution_preserves_flat_brightness() {
        let img = RgbImage::from_pixel(32, 32, Rgb([0, 100, 0]));
        let k = MotionKernel::new(7, 30.0).unwrap().unwrap();
        let out = k.apply(&img);
        // Away from rounding at the edges the field stays the field.
        let px = *out.get_pixel(16, 16);
        assert!(px[0] <= 1);
        assert!((px[1] as i32 - 100).abs() <= 1);
        assert!(px[2] <= 1);
    }
}
