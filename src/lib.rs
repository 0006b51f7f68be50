#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Mandelbrot, Buddhabrot and Nebulabrot renderer
//!
//! The Buddhabrot (and the Nebulabrot) are variants of the Mandelbrot
//! set that explore "what's in the black heart" of the Mandelbrot.
//! The Mandelbrot takes a point on the complex plane and repeatedly
//! squares it and adds the original point back, measuring how quickly
//! that number goes to infinity.  Points that never do are the set.
//!
//! Each iteration creates a new complex number that itself may be used
//! as a coordinate on the complex plane.  By mapping that coordinate
//! to the nearest integral pixel and incrementing that pixel by one,
//! we can plot the "orbit" of a point.  Plot the orbits of enough
//! points that *do* escape, slowly, and the result is called a
//! Buddhabrot.  Plot three sets of them into the three color channels
//! and it is a Nebulabrot.
//!
//! Finding seeds worth plotting is the expensive part, so it is its
//! own operation: the point finder writes seeds to point files, and
//! the density renderers read them back.

#[macro_use]
extern crate failure;
#[macro_use]
extern crate tracing;
extern crate crossbeam;
extern crate image;
extern crate itertools;
extern crate num;
extern crate num_cpus;
extern crate rand;
#[cfg(test)]
extern crate tempfile;

pub mod color;
pub mod config;
pub mod density;
pub mod errors;
pub mod escape;
pub mod finder;
pub mod generators;
pub mod hitplot;
pub mod mandelbrot;
pub mod operations;
pub mod orbit;
pub mod planes;
pub mod pointfile;
pub mod raster;

pub use config::{Config, OperationKind, Settings};
pub use errors::{FractalError, Result};
pub use finder::CancellationToken;
pub use operations::run;
