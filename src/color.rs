// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Turning hit densities into colors.
//!
//! Hit counts are wildly skewed: a handful of pixels near the real
//! axis collect orders of magnitude more hits than the rest.  The
//! count is first squashed with `1 - e^(-10 hits/max)`, then gamma
//! corrected, and the resulting ratio in [0, 1] is what gets looked
//! up in a palette.

use errors::{FractalError, Result};
use image::Rgb;
use num::clamp;

/// The default gamma exponent.
pub const DEFAULT_GAMMA: f64 = 1.2;

/// The hue of the classic Buddhabrot palette, a cyan.
pub const BUDDHABROT_HUE: f64 = 196.0 / 360.0;

/// `x^(1/exponent)`.  Maps 0 to 0 and 1 to 1 and is increasing in
/// between.
pub fn gamma(x: f64, exponent: f64) -> f64 {
    x.powf(1.0 / exponent)
}

/// The gamma-corrected density of a pixel relative to the busiest
/// pixel.  An empty plot has a maximum of zero, and every pixel of it
/// gets a ratio of zero.
pub fn density_ratio(hits: u32, maximum: u32) -> f64 {
    if maximum == 0 {
        return 0.0;
    }
    let squashed = 1.0 - (-10.0 * f64::from(hits) / f64::from(maximum)).exp();
    gamma(squashed, DEFAULT_GAMMA)
}

fn channel(x: f64) -> u8 {
    clamp((x * 255.0).round(), 0.0, 255.0) as u8
}

/// A color as hue, saturation and value, each in [0, 1].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HsvColor {
    /// Fraction of the way around the color wheel.
    pub hue: f64,
    /// 0 is gray, 1 fully saturated.
    pub saturation: f64,
    /// 0 is black.
    pub value: f64,
}

impl HsvColor {
    /// Convert to 8-bit RGB.
    pub fn to_rgb(&self) -> Rgb<u8> {
        let (s, v) = (clamp(self.saturation, 0.0, 1.0), clamp(self.value, 0.0, 1.0));
        let h = (self.hue.fract() + 1.0).fract() * 6.0;
        let sector = h.floor();
        let f = h - sector;
        let p = v * (1.0 - s);
        let q = v * (1.0 - s * f);
        let t = v * (1.0 - s * (1.0 - f));
        let (r, g, b) = match sector as u8 {
            0 => (v, t, p),
            1 => (q, v, p),
            2 => (p, v, t),
            3 => (p, q, v),
            4 => (t, p, v),
            _ => (v, p, q),
        };
        Rgb([channel(r), channel(g), channel(b)])
    }
}

/// The classic Buddhabrot palette: a fixed cyan that brightens from
/// black through the first half of the ratio, then washes out toward
/// white through the second.
pub fn buddhabrot_hsv(ratio: f64) -> HsvColor {
    if ratio < 0.5 {
        HsvColor {
            hue: BUDDHABROT_HUE,
            saturation: 1.0,
            value: 2.0 * ratio,
        }
    } else {
        HsvColor {
            hue: BUDDHABROT_HUE,
            saturation: 1.0 - 2.0 * (ratio - 0.5),
            value: 1.0,
        }
    }
}

/// An ordered list of color stops with positions in [0, 1].  Colors
/// between two stops are interpolated linearly; positions outside the
/// first and last stop take the nearest stop's color.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorRamp {
    stops: Vec<(f64, Rgb<u8>)>,
}

impl ColorRamp {
    /// Fails unless there is at least one stop and the positions are
    /// inside [0, 1] and strictly increasing.
    pub fn new(stops: Vec<(f64, Rgb<u8>)>) -> Result<ColorRamp> {
        if stops.is_empty() {
            return Err(FractalError::invalid("a color ramp needs at least one stop"));
        }
        if stops
            .iter()
            .any(|&(position, _)| !(position >= 0.0 && position <= 1.0))
        {
            return Err(FractalError::invalid(
                "color ramp positions must be inside [0, 1]",
            ));
        }
        if stops.windows(2).any(|pair| pair[0].0 >= pair[1].0) {
            return Err(FractalError::invalid(
                "color ramp positions must be strictly increasing",
            ));
        }
        Ok(ColorRamp { stops })
    }

    /// The color at `position`.
    pub fn color_at(&self, position: f64) -> Rgb<u8> {
        let first = self.stops[0];
        if !(position > first.0) {
            return first.1;
        }
        for pair in self.stops.windows(2) {
            let ((low, from), (high, to)) = (pair[0], pair[1]);
            if position <= high {
                let t = (position - low) / (high - low);
                return Rgb([
                    lerp(from[0], to[0], t),
                    lerp(from[1], to[1], t),
                    lerp(from[2], to[2], t),
                ]);
            }
        }
        self.stops[self.stops.len() - 1].1
    }

    /// Look a ramp up by name.
    pub fn named(name: &str) -> Result<ColorRamp> {
        RAMPS
            .iter()
            .find(|entry| entry.0 == name)
            .map(|entry| (entry.1)())
            .ok_or_else(|| FractalError::Unknown {
                kind: "color ramp",
                name: name.to_string(),
            })
    }

    /// Every ramp name, in table order.
    pub fn names() -> Vec<&'static str> {
        RAMPS.iter().map(|entry| entry.0).collect()
    }

    /// Black through navy and blue to a pale cyan, then white.
    pub fn blue() -> ColorRamp {
        ColorRamp {
            stops: vec![
                (0.0, Rgb([0, 0, 0])),
                (0.25, Rgb([0, 7, 100])),
                (0.5, Rgb([32, 107, 203])),
                (0.8, Rgb([170, 235, 255])),
                (1.0, Rgb([255, 255, 255])),
            ],
        }
    }

    /// Black through red and orange to yellow-white.
    pub fn fire() -> ColorRamp {
        ColorRamp {
            stops: vec![
                (0.0, Rgb([0, 0, 0])),
                (0.3, Rgb([128, 0, 0])),
                (0.6, Rgb([255, 120, 0])),
                (0.85, Rgb([255, 220, 60])),
                (1.0, Rgb([255, 255, 230])),
            ],
        }
    }

    /// Black to white.
    pub fn gray() -> ColorRamp {
        ColorRamp {
            stops: vec![(0.0, Rgb([0, 0, 0])), (1.0, Rgb([255, 255, 255]))],
        }
    }
}

const RAMPS: &[(&str, fn() -> ColorRamp)] = &[
    ("blue", ColorRamp::blue),
    ("fire", ColorRamp::fire),
    ("gray", ColorRamp::gray),
];

fn lerp(from: u8, to: u8, t: f64) -> u8 {
    channel((f64::from(from) + (f64::from(to) - f64::from(from)) * t) / 255.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gamma_fixes_its_ends() {
        assert_eq!(gamma(0.0, DEFAULT_GAMMA), 0.0);
        assert_eq!(gamma(1.0, DEFAULT_GAMMA), 1.0);
    }

    #[test]
    fn gamma_is_increasing() {
        let mut previous = gamma(0.0, DEFAULT_GAMMA);
        for i in 1..=1000 {
            let next = gamma(f64::from(i) / 1000.0, DEFAULT_GAMMA);
            assert!(next > previous);
            previous = next;
        }
    }

    #[test]
    fn empty_plot_has_zero_ratio() {
        assert_eq!(density_ratio(0, 0), 0.0);
        assert_eq!(density_ratio(5, 0), 0.0);
        assert_eq!(density_ratio(0, 10), 0.0);
    }

    #[test]
    fn busiest_pixel_is_nearly_saturated() {
        let ratio = density_ratio(100, 100);
        assert!(ratio > 0.999 && ratio <= 1.0);
        assert!(density_ratio(10, 100) < density_ratio(20, 100));
    }

    #[test]
    fn hsv_primaries_convert() {
        let red = HsvColor {
            hue: 0.0,
            saturation: 1.0,
            value: 1.0,
        };
        let blue = HsvColor {
            hue: 2.0 / 3.0,
            saturation: 1.0,
            value: 1.0,
        };
        let gray = HsvColor {
            hue: 0.3,
            saturation: 0.0,
            value: 0.5,
        };
        assert_eq!(red.to_rgb(), Rgb([255, 0, 0]));
        assert_eq!(blue.to_rgb(), Rgb([0, 0, 255]));
        assert_eq!(gray.to_rgb(), Rgb([128, 128, 128]));
    }

    #[test]
    fn buddhabrot_palette_is_piecewise() {
        assert_eq!(buddhabrot_hsv(0.0).to_rgb(), Rgb([0, 0, 0]));
        let dim = buddhabrot_hsv(0.25);
        assert_eq!(dim.saturation, 1.0);
        assert_eq!(dim.value, 0.5);
        let bright = buddhabrot_hsv(0.75);
        assert_eq!(bright.saturation, 0.5);
        assert_eq!(bright.value, 1.0);
        assert_eq!(buddhabrot_hsv(1.0).to_rgb(), Rgb([255, 255, 255]));
        let full = buddhabrot_hsv(0.5).to_rgb();
        assert_eq!(full[2], 255);
        assert!(full[0] < full[1]);
    }

    #[test]
    fn ramps_interpolate_between_stops() {
        let ramp = ColorRamp::new(vec![
            (0.0, Rgb([0, 0, 0])),
            (0.5, Rgb([100, 200, 0])),
            (1.0, Rgb([100, 200, 250])),
        ])
        .unwrap();
        assert_eq!(ramp.color_at(0.0), Rgb([0, 0, 0]));
        assert_eq!(ramp.color_at(0.25), Rgb([50, 100, 0]));
        assert_eq!(ramp.color_at(0.5), Rgb([100, 200, 0]));
        assert_eq!(ramp.color_at(0.75), Rgb([100, 200, 125]));
        assert_eq!(ramp.color_at(1.0), Rgb([100, 200, 250]));
        assert_eq!(ramp.color_at(-1.0), Rgb([0, 0, 0]));
        assert_eq!(ramp.color_at(2.0), Rgb([100, 200, 250]));
    }

    #[test]
    fn bad_ramps_are_refused() {
        assert!(ColorRamp::new(vec![]).is_err());
        assert!(ColorRamp::new(vec![(0.5, Rgb([0, 0, 0])), (0.5, Rgb([1, 1, 1]))]).is_err());
        assert!(ColorRamp::new(vec![(0.6, Rgb([0, 0, 0])), (0.2, Rgb([1, 1, 1]))]).is_err());
        assert!(ColorRamp::new(vec![(1.5, Rgb([0, 0, 0]))]).is_err());
    }

    #[test]
    fn named_ramps_are_valid() {
        for name in ColorRamp::names() {
            let ramp = ColorRamp::named(name).unwrap();
            assert_eq!(ColorRamp::new(ramp.stops.clone()).unwrap(), ramp);
            assert_eq!(ramp.color_at(0.0), Rgb([0, 0, 0]));
        }
        assert!(ColorRamp::named("plaid").is_err());
    }
}
