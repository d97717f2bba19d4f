// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The renderer turns a viewport and a parameter `c` into an image.
//!
//! A frame passes through four stages, each its own type, so the
//! order cannot be got wrong:
//!
//! 1. [`RawScores`]: the left half of the grid, scored in parallel
//!    bands of columns.
//! 2. [`MirroredScores`]: the right half filled in from the left.
//!    z² + c is an even function of z, so a point and its negation
//!    share an orbit after the first step, and the coordinate
//!    mapping sends pixel (i, j) and pixel (W-1-i, H-1-j) to
//!    opposite points.
//! 3. [`NormalizedScores`]: every cell divided by a multiple of the
//!    average over the central square of the image.
//! 4. An `RgbImage` colored through the palette.

use std::ops::Range;
use std::sync::Arc;
use std::time::Instant;

use image::{Rgb, RgbImage};
use itertools::iproduct;
use num::Complex;
use tracing::{debug, warn};

use crate::config::RenderConfig;
use crate::error::JuliaError;
use crate::palette::Palette;
use crate::planes::{Pixel, PlaneMapper};

/// Iterates z ← z² + c from `z` for at most `max_iterations` steps,
/// stopping once |z|² reaches `escape_norm_sqr`.  Each step, the
/// escaping one included, adds exp(-|z|) to the score, so points that
/// linger near the origin score high and points that flee score low.
///
/// Terms that are not finite (an orbit that overflowed) are dropped.
pub fn escape_score(
    mut z: Complex<f64>,
    c: Complex<f64>,
    max_iterations: usize,
    escape_norm_sqr: f64,
) -> f64 {
    let mut score = 0.0;
    for _ in 0..max_iterations {
        z = z * z + c;
        let mag = z.norm_sqr();
        let term = (-mag.sqrt()).exp();
        if term.is_finite() {
            score += term;
        }
        if !(mag < escape_norm_sqr) {
            break;
        }
    }
    score
}

/// A W×H grid of scores, stored column by column: cell (i, j) lives
/// at `i * height + j`.  Columns are what the workers split on.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoreGrid {
    width: usize,
    height: usize,
    cells: Vec<f64>,
}

impl ScoreGrid {
    fn zeroed(width: usize, height: usize) -> Self {
        ScoreGrid {
            width,
            height,
            cells: vec![0.0; width * height],
        }
    }

    /// Columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The score at column `i`, row `j`.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.cells[i * self.height + j]
    }

    /// All cells, column-major.
    pub fn cells(&self) -> &[f64] {
        &self.cells
    }

    /// The number of columns workers compute; the rest are mirrored.
    pub fn computed_columns(&self) -> usize {
        (self.width + 1) / 2
    }
}

/// Scores straight out of the workers.  Only the left
/// `computed_columns()` are filled; the right half is still zero.
#[derive(Debug)]
pub struct RawScores(ScoreGrid);

/// Every cell scored.  Cell (i, j) equals cell (W-1-i, H-1-j).
#[derive(Debug)]
pub struct MirroredScores(ScoreGrid);

/// Scores scaled for the palette.
#[derive(Debug)]
pub struct NormalizedScores(ScoreGrid);

impl RawScores {
    /// The partially filled grid.
    pub fn grid(&self) -> &ScoreGrid {
        &self.0
    }

    /// Copies each computed cell onto its point-symmetric partner in
    /// the right half.
    pub fn mirror(self) -> MirroredScores {
        let mut grid = self.0;
        let (width, height) = (grid.width, grid.height);
        let half = grid.computed_columns();
        let (left, right) = grid.cells.split_at_mut(half * height);
        for (offset, column) in right.chunks_mut(height).enumerate() {
            let source = width - 1 - (half + offset);
            let source = &left[source * height..(source + 1) * height];
            for (cell, value) in column.iter_mut().zip(source.iter().rev()) {
                *cell = *value;
            }
        }
        MirroredScores(grid)
    }
}

impl MirroredScores {
    /// The full grid of raw scores.
    pub fn grid(&self) -> &ScoreGrid {
        &self.0
    }

    /// The average score over the central square: the columns within
    /// H/2 of the middle column, summed and divided by H².  Halves
    /// are taken in integers.
    pub fn central_average(&self) -> f64 {
        central_average(&self.0)
    }

    /// Divides every cell by `contrast` times the central average,
    /// so a typical frame spans a few trips around the palette
    /// whatever `c` is.  A frame whose average is zero or not finite
    /// has nothing to scale against and comes out flat at zero.
    pub fn normalize(self, contrast: f64) -> NormalizedScores {
        let mut grid = self.0;
        let average = central_average(&grid);
        let factor = average * contrast;
        if factor.is_finite() && factor > 0.0 {
            for cell in grid.cells.iter_mut() {
                *cell /= factor;
            }
        } else {
            warn!(average, "degenerate frame, flattening scores");
            for cell in grid.cells.iter_mut() {
                *cell = 0.0;
            }
        }
        NormalizedScores(grid)
    }
}

impl NormalizedScores {
    /// The normalized grid.
    pub fn grid(&self) -> &ScoreGrid {
        &self.0
    }

    /// Maps every cell through the palette.
    pub fn colorize(&self, palette: &Palette) -> RgbImage {
        let grid = &self.0;
        let mut image = RgbImage::new(grid.width as u32, grid.height as u32);
        for (i, j) in iproduct!(0..grid.width, 0..grid.height) {
            image.put_pixel(i as u32, j as u32, palette.lookup(grid.get(i, j)));
        }
        image
    }
}

fn central_average(grid: &ScoreGrid) -> f64 {
    let (mid, reach) = ((grid.width / 2) as i64, (grid.height / 2) as i64);
    let sum: f64 = (0..grid.width)
        .filter(|&i| (i as i64 - mid).abs() <= reach)
        .map(|i| grid.cells[i * grid.height..(i + 1) * grid.height].iter().sum::<f64>())
        .sum();
    sum / (grid.height * grid.height) as f64
}

/// Splits the columns `0..half` into contiguous bands, the k-th being
/// `half*k/n .. half*(k+1)/n`.  `n` is `workers` capped at `half`, so
/// asking for more workers than columns yields one band per column.
pub fn column_bands(half: usize, workers: usize) -> Vec<Range<usize>> {
    let workers = workers.min(half).max(1);
    (0..workers)
        .map(|k| half * k / workers..half * (k + 1) / workers)
        .collect()
}

/// The Renderer holds the configuration and the palette.  Once built
/// it is immutable and may be shared between threads.
#[derive(Clone, Debug)]
pub struct Renderer {
    config: RenderConfig,
    palette: Arc<Palette>,
}

impl Renderer {
    /// Builds a renderer with the standard palette.
    pub fn new(config: RenderConfig) -> Result<Self, JuliaError> {
        config.validate()?;
        let palette = Palette::standard(config.palette_size)?;
        Ok(Renderer {
            config,
            palette: Arc::new(palette),
        })
    }

    /// Builds a renderer around an existing palette.  The palette's
    /// own length wins over `config.palette_size`.
    pub fn with_palette(config: RenderConfig, palette: Arc<Palette>) -> Result<Self, JuliaError> {
        config.validate()?;
        Ok(Renderer { config, palette })
    }

    /// The configuration this renderer was built with.
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// The shared palette.
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// The color for a normalized score.
    pub fn palette_lookup(&self, value: f64) -> Rgb<u8> {
        self.palette.lookup(value)
    }

    /// The mapping between pixels and the complex plane for a
    /// viewport of this size.
    pub fn mapper(&self, width: u32, height: u32) -> Result<PlaneMapper, JuliaError> {
        PlaneMapper::new(width as usize, height as usize, self.config.yrange)
    }

    fn check_request(&self, width: u32, height: u32, c: Complex<f64>) -> Result<PlaneMapper, JuliaError> {
        if !(c.re.is_finite() && c.im.is_finite()) {
            return Err(JuliaError::invalid(format!(
                "parameter {} + {}i is not finite",
                c.re, c.im
            )));
        }
        self.mapper(width, height)
    }

    fn score_columns(&self, mapper: &PlaneMapper, c: Complex<f64>, columns: Range<usize>, band: &mut [f64]) {
        let height = mapper.height();
        for (column, cells) in columns.zip(band.chunks_mut(height)) {
            for (row, cell) in cells.iter_mut().enumerate() {
                *cell = escape_score(
                    mapper.pixel_to_point(&Pixel(column, row)),
                    c,
                    self.config.max_iterations,
                    self.config.escape_norm_sqr,
                );
            }
        }
    }

    /// Scores the left half of the image.  Each worker owns one band
    /// of columns and writes nothing else; all of them have finished
    /// by the time this returns.
    pub fn compute(&self, width: u32, height: u32, cx: f64, cy: f64) -> Result<RawScores, JuliaError> {
        let c = Complex::new(cx, cy);
        let mapper = self.check_request(width, height, c)?;
        let mut grid = ScoreGrid::zeroed(mapper.width(), mapper.height());
        let half = grid.computed_columns();
        let rows = grid.height;

        {
            let (mut rest, _) = grid.cells.split_at_mut(half * rows);
            let bands = column_bands(half, self.config.workers);
            let mut work: Vec<(Range<usize>, &mut [f64])> = Vec::with_capacity(bands.len());
            for columns in bands {
                let (band, tail) = std::mem::take(&mut rest).split_at_mut(columns.len() * rows);
                work.push((columns, band));
                rest = tail;
            }

            let mapper = &mapper;
            crossbeam::scope(|spawner| {
                for (columns, band) in work {
                    spawner.spawn(move |_| self.score_columns(mapper, c, columns, band));
                }
            })
            .map_err(|_| JuliaError::invariant("a render worker panicked"))?;
        }

        Ok(RawScores(grid))
    }

    /// Computes and mirrors the raw scores for a frame, stopping short
    /// of normalization.
    pub fn scores(&self, width: u32, height: u32, cx: f64, cy: f64) -> Result<MirroredScores, JuliaError> {
        Ok(self.compute(width, height, cx, cy)?.mirror())
    }

    /// Renders the Julia set for `c = cx + cy·i` into a `width`×`height`
    /// image.  Blocks until the image is complete.  The request is
    /// checked before anything is allocated.
    pub fn render(&self, width: u32, height: u32, cx: f64, cy: f64) -> Result<RgbImage, JuliaError> {
        let start = Instant::now();
        let raw = self.compute(width, height, cx, cy)?;
        debug!(
            width,
            height,
            workers = self.config.workers,
            elapsed = ?start.elapsed(),
            "computed"
        );
        let mirrored = raw.mirror();
        let normalized = mirrored.normalize(self.config.contrast);
        let image = normalized.colorize(&self.palette);
        debug!(width, height, cx, cy, elapsed = ?start.elapsed(), "rendered");
        Ok(image)
    }
}
