// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The trajectory computer.  Each iteration of z² + c creates a new
//! complex number that may itself be treated as a coordinate on the
//! complex plane; the sequence of them is the point's orbit, and it
//! is the orbit that gets plotted into a Buddhabrot.

use escape::ESCAPE_RADIUS_SQUARED;
use num::Complex;

/// A lazy orbit.  It yields at most `bailout` iterates and stops
/// right after the first one outside the escape radius, which is
/// yielded too.
#[derive(Clone, Debug)]
pub struct Orbit {
    seed: Complex<f64>,
    z: Complex<f64>,
    remaining: usize,
    escaped: bool,
}

impl Orbit {
    /// Start the orbit of `seed` at z = 0.
    pub fn new(seed: Complex<f64>, bailout: usize) -> Orbit {
        Orbit {
            seed,
            z: Complex::new(0.0, 0.0),
            remaining: bailout,
            escaped: false,
        }
    }

    /// True once the orbit has yielded an iterate outside the escape
    /// radius.  Only meaningful after the orbit is exhausted.
    pub fn escaped(&self) -> bool {
        self.escaped
    }
}

impl Iterator for Orbit {
    type Item = Complex<f64>;

    fn next(&mut self) -> Option<Complex<f64>> {
        if self.escaped || self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        self.z = self.z * self.z + self.seed;
        if self.z.norm_sqr() > ESCAPE_RADIUS_SQUARED {
            self.escaped = true;
        }
        Some(self.z)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.escaped {
            (0, Some(0))
        } else {
            (0, Some(self.remaining))
        }
    }
}

/// The orbit of `seed`, capped at `bailout` iterates.
pub fn compute_orbit(seed: Complex<f64>, bailout: usize) -> Orbit {
    Orbit::new(seed, bailout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escaping_orbit_ends_outside_the_radius() {
        let orbit: Vec<Complex<f64>> = compute_orbit(Complex::new(2.0, 0.0), 100).collect();
        assert_eq!(orbit, vec![Complex::new(2.0, 0.0), Complex::new(6.0, 0.0)]);
    }

    #[test]
    fn every_iterate_but_the_last_stays_inside() {
        for &seed in [
            Complex::new(0.35, 0.0),
            Complex::new(-0.75, 0.1),
            Complex::new(0.4, 0.3),
            Complex::new(0.0, 2.0),
        ]
        .iter()
        {
            let mut orbit = compute_orbit(seed, 1000);
            let iterates: Vec<Complex<f64>> = orbit.by_ref().collect();
            assert!(orbit.escaped());
            let (last, rest) = iterates.split_last().unwrap();
            assert!(last.norm_sqr() > 4.0);
            assert!(rest.iter().all(|z| z.norm_sqr() <= 4.0));
        }
    }

    #[test]
    fn orbit_is_never_longer_than_bailout() {
        for &bailout in [0, 1, 7, 100].iter() {
            for &seed in [
                Complex::new(0.0, 0.0),
                Complex::new(0.35, 0.0),
                Complex::new(-1.0, 0.0),
                Complex::new(5.0, 5.0),
            ]
            .iter()
            {
                assert!(compute_orbit(seed, bailout).count() <= bailout);
            }
        }
    }

    #[test]
    fn captive_orbit_runs_to_bailout() {
        let mut orbit = compute_orbit(Complex::new(0.0, 0.0), 50);
        assert_eq!(orbit.by_ref().count(), 50);
        assert!(!orbit.escaped());
    }

    #[test]
    fn orbit_length_agrees_with_escape_count() {
        use escape::escape_count;
        let seed = Complex::new(0.26, 0.0);
        assert_eq!(compute_orbit(seed, 1000).count(), escape_count(seed, 1000).unwrap());
        assert_eq!(compute_orbit(seed, 29).count(), 29);
    }
}
