// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Describes the relationship between a rectangle on the integral
//! plane with an origin at 0,0 (the image), and a rectangle on the
//! complex plane (the viewport).  Pixel rows grow downward while the
//! imaginary axis grows upward, so the vertical axis is inverted by
//! the mapping.

use errors::{FractalError, Result};
use itertools::iproduct;
use num::Complex;

/// Describes the x, y of a pixel in an image.  We don't need a Point,
/// as a single Complex number is a Point.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Pixel(pub usize, pub usize);

/// The width and height of an integral plane starting at 0,0.  Both
/// are guaranteed to be non-zero.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    width: usize,
    height: usize,
}

impl Resolution {
    /// Constructor.  A zero-sized image is a configuration error.
    pub fn new(width: usize, height: usize) -> Result<Resolution> {
        if width == 0 || height == 0 {
            return Err(FractalError::invalid(format!(
                "resolution must be positive, got {}x{}",
                width, height
            )));
        }
        Ok(Resolution { width, height })
    }

    /// Pixels per row.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The total number of pixels.  Used to calculate memory needs.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    /// Always false; a resolution cannot be built empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if the pixel lies inside the image.
    pub fn contains(&self, pixel: Pixel) -> bool {
        pixel.0 < self.width && pixel.1 < self.height
    }

    /// The linear, row-major offset of a pixel from the root of an
    /// image buffer.  The pixel must be inside the image.
    pub fn offset(&self, pixel: Pixel) -> usize {
        pixel.1 * self.width + pixel.0
    }

    /// The same image turned on its side.
    pub fn transposed(&self) -> Resolution {
        Resolution {
            width: self.height,
            height: self.width,
        }
    }

    /// Every pixel of the image, row by row.
    pub fn pixels(&self) -> impl Iterator<Item = Pixel> {
        iproduct!(0..self.height, 0..self.width).map(|(y, x)| Pixel(x, y))
    }
}

/// A closed interval on the real line.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct InclusiveRange {
    min: f64,
    max: f64,
}

impl InclusiveRange {
    /// Fails if either end is not finite or if the ends are reversed.
    pub fn new(min: f64, max: f64) -> Result<InclusiveRange> {
        if !min.is_finite() || !max.is_finite() {
            return Err(FractalError::invalid(format!(
                "range bounds must be finite, got [{}, {}]",
                min, max
            )));
        }
        if min > max {
            return Err(FractalError::invalid(format!(
                "range minimum {} is greater than its maximum {}",
                min, max
            )));
        }
        Ok(InclusiveRange { min, max })
    }

    /// Lower end.
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Upper end.
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Length of the interval.
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// True if the value lies inside the interval, ends included.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// A rectangular viewport on the complex plane, treating the real
/// part of each value as the x-component and the imaginary part as
/// the y-component.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Area {
    real: InclusiveRange,
    imaginary: InclusiveRange,
}

impl Default for Area {
    /// The whole of the Mandelbrot set: real in [-2, 1], imaginary in
    /// [-1.5, 1.5].
    fn default() -> Area {
        Area {
            real: InclusiveRange {
                min: -2.0,
                max: 1.0,
            },
            imaginary: InclusiveRange {
                min: -1.5,
                max: 1.5,
            },
        }
    }
}

impl Area {
    /// Constructor.  The ranges have already been validated.
    pub fn new(real: InclusiveRange, imaginary: InclusiveRange) -> Area {
        Area { real, imaginary }
    }

    /// The real (horizontal) extent.
    pub fn real(&self) -> InclusiveRange {
        self.real
    }

    /// The imaginary (vertical) extent.
    pub fn imaginary(&self) -> InclusiveRange {
        self.imaginary
    }

    /// True if the point lies inside the viewport, edges included.
    pub fn contains(&self, point: Complex<f64>) -> bool {
        self.real.contains(point.re) && self.imaginary.contains(point.im)
    }

    /// Given a pixel of an image of the given resolution, return the
    /// complex number at that pixel's upper-left corner.  The pixel is
    /// expected to be inside the image; this is not checked.
    pub fn pixel_to_point(&self, resolution: Resolution, pixel: Pixel) -> Complex<f64> {
        Complex::new(
            self.real.min + (pixel.0 as f64 / resolution.width as f64) * self.real.span(),
            self.imaginary.max
                - (pixel.1 as f64 / resolution.height as f64) * self.imaginary.span(),
        )
    }

    /// Map a complex number to unrounded pixel coordinates.  The result
    /// may lie outside the image, or be non-finite for a viewport with
    /// no extent.
    pub fn point_to_fraction(&self, resolution: Resolution, point: Complex<f64>) -> (f64, f64) {
        (
            (point.re - self.real.min) / self.real.span() * resolution.width as f64,
            (self.imaginary.max - point.im) / self.imaginary.span() * resolution.height as f64,
        )
    }

    /// Given a complex number, map that as closely as possible to a
    /// pixel, or None if the nearest pixel is outside the image.
    pub fn point_to_pixel(&self, resolution: Resolution, point: Complex<f64>) -> Option<Pixel> {
        let (left, top) = self.point_to_fraction(resolution, point);
        Some(Pixel(
            to_index(left.round(), resolution.width)?,
            to_index(top.round(), resolution.height)?,
        ))
    }

    /// The column that a vertical line at the given real value falls on.
    pub fn real_to_column(&self, resolution: Resolution, real: f64) -> Option<usize> {
        let left = (real - self.real.min) / self.real.span() * resolution.width as f64;
        to_index(left.round(), resolution.width)
    }

    /// The row that a horizontal line at the given imaginary value
    /// falls on.
    pub fn imaginary_to_row(&self, resolution: Resolution, imaginary: f64) -> Option<usize> {
        let top =
            (self.imaginary.max - imaginary) / self.imaginary.span() * resolution.height as f64;
        to_index(top.round(), resolution.height)
    }
}

fn to_index(coordinate: f64, limit: usize) -> Option<usize> {
    if coordinate >= 0.0 && coordinate < limit as f64 {
        Some(coordinate as usize)
    } else {
        None
    }
}

/// Since the Buddhabrot tracks the progress of a complex number as it
/// orbits, we have to map those complex numbers back to the pixel
/// plane.  The PlaneMapper does that for one image, optionally turned
/// on its side so the real axis runs vertically, which is how the
/// Buddhabrot is usually shown.
#[derive(Copy, Clone, Debug)]
pub struct PlaneMapper {
    area: Area,
    resolution: Resolution,
    rotated: bool,
}

impl PlaneMapper {
    /// Constructor.
    pub fn new(area: Area, resolution: Resolution, rotated: bool) -> PlaneMapper {
        PlaneMapper {
            area,
            resolution,
            rotated,
        }
    }

    /// The size of the image being mapped onto.
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Fractional pixel coordinates of the point, or None if it falls
    /// outside the image.
    pub fn point_to_fraction(&self, point: Complex<f64>) -> Option<(f64, f64)> {
        let (left, top) = if self.rotated {
            let (left, top) = self
                .area
                .point_to_fraction(self.resolution.transposed(), point);
            (top, left)
        } else {
            self.area.point_to_fraction(self.resolution, point)
        };
        if left >= 0.0
            && left < self.resolution.width as f64
            && top >= 0.0
            && top < self.resolution.height as f64
        {
            Some((left, top))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area(rmin: f64, rmax: f64, imin: f64, imax: f64) -> Area {
        Area::new(
            InclusiveRange::new(rmin, rmax).unwrap(),
            InclusiveRange::new(imin, imax).unwrap(),
        )
    }

    #[test]
    fn range_fails_on_reversed_bounds() {
        assert!(InclusiveRange::new(1.0, -1.0).is_err());
        assert!(InclusiveRange::new(0.0, ::std::f64::NAN).is_err());
    }

    #[test]
    fn range_passes_on_good_bounds() {
        assert!(InclusiveRange::new(-1.0, 1.0).is_ok());
        assert!(InclusiveRange::new(0.5, 0.5).is_ok());
    }

    #[test]
    fn resolution_fails_on_zero_size() {
        assert!(Resolution::new(0, 4).is_err());
        assert!(Resolution::new(4, 0).is_err());
        assert_eq!(Resolution::new(4, 3).unwrap().len(), 12);
    }

    #[test]
    fn pixels_are_enumerated_row_by_row() {
        let resolution = Resolution::new(2, 2).unwrap();
        let pixels: Vec<Pixel> = resolution.pixels().collect();
        assert_eq!(
            pixels,
            vec![Pixel(0, 0), Pixel(1, 0), Pixel(0, 1), Pixel(1, 1)]
        );
    }

    #[test]
    fn point_to_pixel_on_mixed_planes() {
        let resolution = Resolution::new(4, 4).unwrap();
        let pm = area(-2.0, 2.0, -2.0, 2.0);
        assert_eq!(
            pm.point_to_pixel(resolution, Complex::new(0.0, 0.0)),
            Some(Pixel(2, 2))
        );
        assert_eq!(
            pm.point_to_pixel(resolution, Complex::new(-2.0, 2.0)),
            Some(Pixel(0, 0))
        );
        assert_eq!(
            pm.point_to_pixel(resolution, Complex::new(-1.0, -1.0)),
            Some(Pixel(1, 3))
        );
        assert_eq!(pm.point_to_pixel(resolution, Complex::new(2.0, -2.0)), None);
        assert_eq!(pm.point_to_pixel(resolution, Complex::new(-3.0, 0.0)), None);
    }

    #[test]
    fn pixel_to_points_on_mixed_planes() {
        let resolution = Resolution::new(4, 4).unwrap();
        let pm = area(-2.0, 2.0, -2.0, 2.0);
        assert_eq!(
            pm.pixel_to_point(resolution, Pixel(2, 2)),
            Complex::new(0.0, 0.0)
        );
        assert_eq!(
            pm.pixel_to_point(resolution, Pixel(0, 0)),
            Complex::new(-2.0, 2.0)
        );
        assert_eq!(
            pm.pixel_to_point(resolution, Pixel(3, 1)),
            Complex::new(1.0, 1.0)
        );
    }

    #[test]
    fn pixel_point_pixel_round_trips() {
        let viewports = [
            Area::default(),
            area(-2.0, 2.0, -2.0, 2.0),
            area(-0.7454, -0.7446, 0.1126, 0.1134),
            area(0.0, 5.0, 0.0, 5.0),
        ];
        let resolutions = [(1, 1), (3, 7), (64, 48), (333, 211)];
        for viewport in viewports.iter() {
            for &(w, h) in resolutions.iter() {
                let resolution = Resolution::new(w, h).unwrap();
                for pixel in resolution.pixels() {
                    let point = viewport.pixel_to_point(resolution, pixel);
                    assert_eq!(viewport.point_to_pixel(resolution, point), Some(pixel));
                }
            }
        }
    }

    #[test]
    fn axis_lines_map_to_rows_and_columns() {
        let resolution = Resolution::new(300, 300).unwrap();
        let viewport = Area::default();
        assert_eq!(viewport.real_to_column(resolution, 0.0), Some(200));
        assert_eq!(viewport.imaginary_to_row(resolution, 0.0), Some(150));
        assert_eq!(viewport.real_to_column(resolution, 1.5), None);
    }

    #[test]
    fn mapper_rejects_points_outside_the_image() {
        let resolution = Resolution::new(4, 4).unwrap();
        let mapper = PlaneMapper::new(area(-2.0, 2.0, -2.0, 2.0), resolution, false);
        assert_eq!(mapper.point_to_fraction(Complex::new(0.0, 0.0)), Some((2.0, 2.0)));
        assert_eq!(mapper.point_to_fraction(Complex::new(2.5, 0.0)), None);
        assert_eq!(mapper.point_to_fraction(Complex::new(0.0, -2.0)), None);
    }

    #[test]
    fn rotated_mapper_swaps_the_axes() {
        let resolution = Resolution::new(4, 2).unwrap();
        let viewport = area(-2.0, 2.0, -2.0, 2.0);
        let point = Complex::new(1.5, 1.0);
        let upright = PlaneMapper::new(viewport, resolution, false);
        let rotated = PlaneMapper::new(viewport, resolution, true);
        assert_eq!(upright.point_to_fraction(point), Some((3.5, 0.5)));
        assert_eq!(rotated.point_to_fraction(point), Some((1.0, 1.75)));
    }

    #[test]
    fn flat_viewport_maps_nowhere() {
        let resolution = Resolution::new(4, 4).unwrap();
        let mapper = PlaneMapper::new(area(0.0, 0.0, -1.0, 1.0), resolution, false);
        assert_eq!(mapper.point_to_fraction(Complex::new(0.0, 0.0)), None);
    }
}
