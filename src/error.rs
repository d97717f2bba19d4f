// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors raised by the palette and the renderer.

use failure::Fail;

/// Everything that can go wrong while building a palette or rendering
/// a frame.  Computation itself is total; these only come from bad
/// input or from a broken construction.
#[derive(Debug, Fail, Clone, PartialEq)]
pub enum JuliaError {
    /// The caller handed us something we cannot render: a viewport
    /// that is too small, a non-finite parameter, or a malformed
    /// configuration.
    #[fail(display = "invalid input: {}", _0)]
    InvalidInput(String),

    /// Something the renderer relies on did not hold.  Seeing this
    /// means a bug, not a bad request.
    #[fail(display = "internal invariant violated: {}", _0)]
    InternalInvariantViolation(String),
}

impl JuliaError {
    pub(crate) fn invalid<S: Into<String>>(msg: S) -> Self {
        JuliaError::InvalidInput(msg.into())
    }

    pub(crate) fn invariant<S: Into<String>>(msg: S) -> Self {
        JuliaError::InternalInvariantViolation(msg.into())
    }
}
