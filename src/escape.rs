// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The escape-time engine: decides whether a point belongs to the
//! Mandelbrot set, and how quickly it leaves if it does not.

use num::Complex;

/// Once |z| exceeds 2 the orbit is guaranteed to diverge.  We compare
/// squared magnitudes to avoid the square root.
pub const ESCAPE_RADIUS_SQUARED: f64 = 4.0;

/// How long we iterate before declaring a point a member.
pub const DEFAULT_MAX_ITERATIONS: usize = 5000;

const D4: f64 = 1.0 / 4.0;
const D16: f64 = D4 / 4.0;

/// This is our classic iterator function, which returns the 1-based
/// iteration on which the orbit of `point` first left the escape
/// radius, or nothing at all if it stayed inside for `max_iterations`.
pub fn escape_count(point: Complex<f64>, max_iterations: usize) -> Option<usize> {
    let mut z = Complex::new(0.0_f64, 0.0_f64);
    for i in 1..=max_iterations {
        z = z * z + point;
        if z.norm_sqr() > ESCAPE_RADIUS_SQUARED {
            return Some(i);
        }
    }
    None
}

/// True if the point is in the set as far as `max_iterations` can
/// tell.  Points inside the known bulbs are answered without
/// iterating.
pub fn is_in_mandelbrot_set(point: Complex<f64>, max_iterations: usize) -> bool {
    is_inside_known_bulbs(point) || escape_count(point, max_iterations).is_none()
}

/// The two halves of the `or` expression are the closed-form tests
/// for the main cardioid and for the period-2 disk centered on -1
/// with radius 1/4.  A true result guarantees membership; a false one
/// says nothing.  Both comparisons are strict, so points that sit
/// exactly on a boundary are left to the iterative test.
pub fn is_inside_known_bulbs(point: Complex<f64>) -> bool {
    let y = point.im * point.im;
    let q = y + (point.re - D4) * (point.re - D4);
    q * (q + point.re - D4) < y * D4 || (point.re + 1.0) * (point.re + 1.0) + y < D16
}
