// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The palette is a lookup table of colors, built once by linear
//! interpolation between a handful of control points laid out along
//! [0, 1].  Normalized scores are wrapped into [0, 1) and used as an
//! index into the table, so the colors cycle as scores grow.

use image::Rgb;

use crate::error::JuliaError;

/// A control point: a position in [0, 1] and the color found there.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ControlPoint {
    /// Position along the palette.
    pub position: f64,
    /// Color at that position.
    pub color: Rgb<u8>,
}

impl ControlPoint {
    /// Constructor.
    pub const fn new(position: f64, r: u8, g: u8, b: u8) -> Self {
        ControlPoint {
            position,
            color: Rgb([r, g, b]),
        }
    }
}

/// Deep blue through sky blue and white to orange, down to black and
/// back to the starting blue, so the table wraps without a seam.
pub const STANDARD_CONTROL_POINTS: [ControlPoint; 6] = [
    ControlPoint::new(0.0, 0, 7, 100),
    ControlPoint::new(0.16, 32, 107, 203),
    ControlPoint::new(0.42, 237, 255, 255),
    ControlPoint::new(0.6425, 255, 170, 0),
    ControlPoint::new(0.8525, 0, 2, 0),
    ControlPoint::new(1.0, 0, 7, 100),
];

/// An immutable table of colors.  Safe to share between threads once
/// built.
#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
    colors: Vec<Rgb<u8>>,
}

fn blend(lo: Rgb<u8>, hi: Rgb<u8>, w: f64) -> Rgb<u8> {
    let channel = |a: u8, b: u8| (f64::from(a) * (1.0 - w) + f64::from(b) * w).round() as u8;
    Rgb([
        channel(lo.0[0], hi.0[0]),
        channel(lo.0[1], hi.0[1]),
        channel(lo.0[2], hi.0[2]),
    ])
}

fn check_control_points(points: &[ControlPoint]) -> Result<(), JuliaError> {
    if points.len() < 2 {
        return Err(JuliaError::invalid("a palette needs at least two control points"));
    }
    if points[0].position != 0.0 {
        return Err(JuliaError::invalid("the first control point must sit at 0"));
    }
    if points[points.len() - 1].position != 1.0 {
        return Err(JuliaError::invalid("the last control point must sit at 1"));
    }
    if points.windows(2).any(|w| !(w[0].position < w[1].position)) {
        return Err(JuliaError::invalid(
            "control point positions must be strictly increasing",
        ));
    }
    Ok(())
}

/// Interpolates the color at `d` in [0, 1).  Scanning starts at the
/// second control point, since the first one is the left edge.
fn interpolate(points: &[ControlPoint], d: f64) -> Result<Rgb<u8>, JuliaError> {
    for k in 1..points.len() {
        if d < points[k].position {
            let (lo, hi) = (&points[k - 1], &points[k]);
            let w = (d - lo.position) / (hi.position - lo.position);
            return Ok(blend(lo.color, hi.color, w));
        }
    }
    Err(JuliaError::invariant(format!(
        "no control interval encloses {}",
        d
    )))
}

impl Palette {
    /// Builds a table of `size` colors from `points`.  The points must
    /// start at 0, end at 1, and strictly increase in between.
    pub fn build(points: &[ControlPoint], size: usize) -> Result<Self, JuliaError> {
        if size == 0 {
            return Err(JuliaError::invalid("palette size must be at least 1"));
        }
        check_control_points(points)?;
        let colors = (0..size)
            .map(|i| interpolate(points, i as f64 / size as f64))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Palette { colors })
    }

    /// The palette built from [`STANDARD_CONTROL_POINTS`].
    pub fn standard(size: usize) -> Result<Self, JuliaError> {
        Palette::build(&STANDARD_CONTROL_POINTS, size)
    }

    /// Number of entries in the table.
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Describes whether the lookup table has no entries.
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// The raw table.
    pub fn colors(&self) -> &[Rgb<u8>] {
        &self.colors
    }

    /// Maps any real number onto a color.  Only the fractional part of
    /// `x` matters, and negative values wrap upward, so -0.25 and 0.75
    /// give the same color.  NaN and the infinities get the first
    /// entry rather than an out-of-range index.
    pub fn lookup(&self, x: f64) -> Rgb<u8> {
        if !x.is_finite() {
            return self.colors[0];
        }
        let fraction = x.rem_euclid(1.0);
        let index = (fraction * self.colors.len() as f64) as usize;
        // rem_euclid can round up to exactly 1.0 for tiny negative inputs.
        self.colors[index.min(self.colors.len() - 1)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standard() -> Palette {
        Palette::standard(1024).unwrap()
    }

    #[test]
    fn first_entry_is_first_control_color() {
        let p = standard();
        assert_eq!(p.len(), 1024);
        assert!(!p.is_empty());
        assert_eq!(p.lookup(0.0), Rgb([0, 7, 100]));
    }

    #[test]
    fn last_entry_lies_in_last_segment() {
        // d = 1023/1024 sits between 0.8525 (0,2,0) and 1.0 (0,7,100).
        let p = standard();
        assert_eq!(p.lookup(1.0 - 1e-9), Rgb([0, 7, 99]));
        assert_eq!(p.colors()[1023], Rgb([0, 7, 99]));
    }

    #[test]
    fn control_colors_appear_at_their_positions() {
        let p = Palette::standard(10_000).unwrap();
        assert_eq!(p.colors()[1600], Rgb([32, 107, 203]));
        assert_eq!(p.colors()[4200], Rgb([237, 255, 255]));
    }

    #[test]
    fn lookup_wraps_at_integers() {
        let p = standard();
        assert_eq!(p.lookup(1.0), p.lookup(0.0));
        assert_eq!(p.lookup(7.0), p.lookup(0.0));
        assert_eq!(p.lookup(3.5), p.lookup(0.5));
    }

    #[test]
    fn lookup_normalizes_negative_input() {
        let p = standard();
        assert_eq!(p.lookup(-0.25), p.lookup(0.75));
        assert_eq!(p.lookup(-1.0), p.lookup(0.0));
        assert_eq!(p.lookup(-1e-300), p.colors()[1023]);
    }

    #[test]
    fn lookup_guards_non_finite() {
        let p = standard();
        assert_eq!(p.lookup(std::f64::NAN), p.colors()[0]);
        assert_eq!(p.lookup(std::f64::INFINITY), p.colors()[0]);
        assert_eq!(p.lookup(std::f64::NEG_INFINITY), p.colors()[0]);
    }

    #[test]
    fn neighbouring_entries_change_gradually() {
        let p = standard();
        for pair in p.colors().windows(2) {
            for ch in 0..3 {
                let step = (i16::from(pair[0].0[ch]) - i16::from(pair[1].0[ch])).abs();
                assert!(step <= 2, "{:?} -> {:?}", pair[0], pair[1]);
            }
        }
    }

    #[test]
    fn blend_rounds_to_nearest() {
        let c = blend(Rgb([0, 0, 0]), Rgb([255, 255, 1]), 0.5);
        assert_eq!(c, Rgb([128, 128, 1]));
    }

    #[test]
    fn rejects_malformed_control_points() {
        let unordered = [
            ControlPoint::new(0.0, 0, 0, 0),
            ControlPoint::new(0.6, 0, 0, 0),
            ControlPoint::new(0.4, 0, 0, 0),
            ControlPoint::new(1.0, 0, 0, 0),
        ];
        assert!(Palette::build(&unordered, 16).is_err());

        let short = [
            ControlPoint::new(0.0, 0, 0, 0),
            ControlPoint::new(0.9, 0, 0, 0),
        ];
        match Palette::build(&short, 16) {
            Err(JuliaError::InvalidInput(_)) => (),
            other => panic!("unexpected {:?}", other),
        }

        assert!(Palette::build(&STANDARD_CONTROL_POINTS, 0).is_err());
    }

    #[test]
    fn interpolate_past_the_end_is_an_invariant_violation() {
        match interpolate(&STANDARD_CONTROL_POINTS, 1.0) {
            Err(JuliaError::InternalInvariantViolation(_)) => (),
            other => panic!("unexpected {:?}", other),
        }
    }
}
