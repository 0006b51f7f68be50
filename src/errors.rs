// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The error taxonomy.  Configuration problems are fatal and are
//! reported before any work begins; bad point records never reach
//! this type at all, since the reader skips them.

use image::ImageError;
use std::io;

/// Everything that can stop a run.
#[derive(Debug, Fail)]
pub enum FractalError {
    /// A resolution, range, bailout, thread count or color ramp that
    /// cannot be used.
    #[fail(display = "invalid configuration: {}", _0)]
    InvalidConfiguration(String),

    /// A name on the command line that maps to nothing we know about.
    #[fail(display = "unknown {} '{}'", kind, name)]
    Unknown {
        /// What we were trying to look up: operation, strategy, ramp.
        kind: &'static str,
        /// The offending name.
        name: String,
    },

    /// Reading points or writing points failed.
    #[fail(display = "I/O error: {}", _0)]
    Io(#[cause] io::Error),

    /// The image sink refused the color matrix.
    #[fail(display = "could not write image: {}", _0)]
    Image(#[cause] ImageError),

    /// One of the scoped workers panicked; its partial work is lost.
    #[fail(display = "a worker thread panicked")]
    WorkerPanicked,
}

impl FractalError {
    /// Shorthand for the most common failure.
    pub fn invalid<S: Into<String>>(message: S) -> FractalError {
        FractalError::InvalidConfiguration(message.into())
    }
}

impl From<io::Error> for FractalError {
    fn from(err: io::Error) -> FractalError {
        FractalError::Io(err)
    }
}

impl From<ImageError> for FractalError {
    fn from(err: ImageError) -> FractalError {
        FractalError::Image(err)
    }
}

/// Crate-wide result alias.
pub type Result<T> = ::std::result::Result<T, FractalError>;
