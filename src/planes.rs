// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contains the PlaneMapper struct, which describes a relationship
//! between a rectangle on the integral plane with an origin at the
//! upper left, and a region of the complex plane centered on the
//! origin.  The vertical extent is fixed by `yrange`; the horizontal
//! extent follows the aspect ratio of the integral plane, so pixels
//! stay square.
use num::Complex;

use crate::error::JuliaError;

/// The smallest width or height we can map.  A single row or column
/// has no span to divide by.
pub const MIN_DIMENSION: usize = 2;

/// Describes the width and height of an integral plane that is assumed to start at
/// 0,0 and all values are assumed to be non-negative integers.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IntegralPlane(pub usize, pub usize);

/// Describes the column, row of a pixel in the integral plane.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pixel(pub usize, pub usize);

/// Maps pixels of the image onto points of the complex plane.  Column
/// 0 maps to the left edge, the last column to the right edge; row 0
/// maps to the top (positive imaginary) edge.
#[derive(Copy, Clone, Debug)]
pub struct PlaneMapper {
    /// Width and height of the image in pixels.
    pub integral_plane: IntegralPlane,
    /// Half the height of the visible complex plane.
    pub yrange: f64,
    // Real-axis half width: yrange stretched by the aspect ratio.
    xrange: f64,
}

impl PlaneMapper {
    /// Constructor.  Fails when either dimension is below
    /// [`MIN_DIMENSION`] or the range is not a positive finite number.
    pub fn new(width: usize, height: usize, yrange: f64) -> Result<PlaneMapper, JuliaError> {
        if width < MIN_DIMENSION || height < MIN_DIMENSION {
            return Err(JuliaError::invalid(format!(
                "viewport {}x{} is smaller than {}x{}",
                width, height, MIN_DIMENSION, MIN_DIMENSION
            )));
        }
        if !(yrange.is_finite() && yrange > 0.0) {
            return Err(JuliaError::invalid("yrange must be a positive finite number"));
        }
        Ok(PlaneMapper {
            integral_plane: IntegralPlane(width, height),
            yrange,
            xrange: yrange * (width as f64) / (height as f64),
        })
    }

    /// Image width in pixels.
    pub fn width(&self) -> usize {
        self.integral_plane.0
    }

    /// Image height in pixels.
    pub fn height(&self) -> usize {
        self.integral_plane.1
    }

    /// Real part for a pixel column.
    pub fn column_to_re(&self, column: usize) -> f64 {
        self.yrange * (2.0 * column as f64 / (self.width() - 1) as f64 - 1.0)
            * self.width() as f64
            / self.height() as f64
    }

    /// Imaginary part for a pixel row.
    pub fn row_to_im(&self, row: usize) -> f64 {
        -self.yrange * (2.0 * row as f64 / (self.height() - 1) as f64 - 1.0)
    }

    /// Given a pixel on the integral plane, return the complex number
    /// at the equivalent location.  Pixels outside the image map to
    /// points outside the visible region; nothing is clamped.
    pub fn pixel_to_point(&self, pixel: &Pixel) -> Complex<f64> {
        Complex::new(self.column_to_re(pixel.0), self.row_to_im(pixel.1))
    }

    /// The visible region as (left-lower, right-upper) corners.
    pub fn bounds(&self) -> (Complex<f64>, Complex<f64>) {
        (
            Complex::new(-self.xrange, -self.yrange),
            Complex::new(self.xrange, self.yrange),
        )
    }
}
