// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Knobs for the renderer.

use crate::error::JuliaError;

/// Vertical half-extent of the visible complex plane.
pub const DEFAULT_YRANGE: f64 = 1.5;
/// Iterations of z² + c before a point is considered captive.
pub const DEFAULT_MAX_ITERATIONS: usize = 256;
/// Number of column bands computed in parallel.
pub const DEFAULT_WORKERS: usize = 4;
/// Entries in the palette lookup table.
pub const DEFAULT_PALETTE_SIZE: usize = 1024;
/// |z|² at which an orbit has escaped.
pub const DEFAULT_ESCAPE_NORM_SQR: f64 = 100.0;
/// Multiplier on the central-band average used to normalize a frame.
pub const DEFAULT_CONTRAST: f64 = 15.0;

/// The RenderConfig holds the constants of a render.  Once handed to
/// a Renderer it is not changed.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RenderConfig {
    /// The visible plane spans [-yrange, yrange] vertically; the
    /// horizontal span is scaled by the aspect ratio.
    pub yrange: f64,
    /// Maximum iterations per pixel.
    pub max_iterations: usize,
    /// Number of workers sharing the left half of the image.  At most
    /// one worker is given each computed column.
    pub workers: usize,
    /// Length of the palette lookup table.
    pub palette_size: usize,
    /// Squared magnitude past which an orbit stops.
    pub escape_norm_sqr: f64,
    /// Scale applied to the central average when normalizing.
    pub contrast: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            yrange: DEFAULT_YRANGE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            workers: DEFAULT_WORKERS,
            palette_size: DEFAULT_PALETTE_SIZE,
            escape_norm_sqr: DEFAULT_ESCAPE_NORM_SQR,
            contrast: DEFAULT_CONTRAST,
        }
    }
}

impl RenderConfig {
    /// Rejects configurations that would make a render meaningless.
    pub fn validate(&self) -> Result<(), JuliaError> {
        if !(self.yrange.is_finite() && self.yrange > 0.0) {
            return Err(JuliaError::invalid("yrange must be a positive finite number"));
        }
        if self.max_iterations == 0 {
            return Err(JuliaError::invalid("max_iterations must be at least 1"));
        }
        if self.workers == 0 {
            return Err(JuliaError::invalid("workers must be at least 1"));
        }
        if self.palette_size == 0 {
            return Err(JuliaError::invalid("palette_size must be at least 1"));
        }
        if !(self.escape_norm_sqr.is_finite() && self.escape_norm_sqr > 0.0) {
            return Err(JuliaError::invalid(
                "escape_norm_sqr must be a positive finite number",
            ));
        }
        if !(self.contrast.is_finite() && self.contrast > 0.0) {
            return Err(JuliaError::invalid("contrast must be a positive finite number"));
        }
        Ok(())
    }
}
