#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Julia set renderer
//!
//! A Julia set is drawn by taking every point z of the complex plane
//! and repeatedly replacing it with z² + c for some fixed parameter c.
//! Some points fly off to infinity; others stay trapped forever.  The
//! boundary between the two is the Julia set, and each value of c
//! gives a different one.
//!
//! Rather than count iterations before escape, every step of an orbit
//! contributes exp(-|z|) to a score, giving smooth gradients instead
//! of bands.  The scores are normalized against the center of the
//! image and colored by cycling through a palette.
//!
//! The [`Renderer`] does the work; the [`Viewer`] holds the state an
//! interactive window needs around it.

pub mod config;
pub mod error;
pub mod palette;
pub mod planes;
pub mod render;
pub mod viewer;

pub use crate::config::RenderConfig;
pub use crate::error::JuliaError;
pub use crate::palette::{ControlPoint, Palette, STANDARD_CONTROL_POINTS};
pub use crate::planes::{Pixel, PlaneMapper};
pub use crate::render::{escape_score, Renderer};
pub use crate::viewer::{frame_size, Viewer};
