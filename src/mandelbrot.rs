// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The direct Mandelbrot renderer.  Every pixel is mapped to a point
//! and classified; no sampling is involved.  What a pixel's color
//! depends on is decided by three pluggable classifiers (inside the
//! area of interest, escape count, inside a known bulb) and by the
//! shading, so the variants are just different constructors.

use color::ColorRamp;
use errors::Result;
use escape::{escape_count, is_inside_known_bulbs};
use image::{Rgb, RgbImage};
use num::Complex;
use planes::{Area, Resolution};
use raster::rasterize;

/// The three questions asked of every point.
pub struct Classifiers<'a> {
    /// Is the point inside the region we care about?
    pub in_area: Box<dyn Fn(Complex<f64>) -> bool + Sync + 'a>,
    /// On which iteration does the point escape, if it does?
    pub escape: Box<dyn Fn(Complex<f64>) -> Option<usize> + Sync + 'a>,
    /// Can the closed-form test prove the point is a member?
    pub in_bulbs: Box<dyn Fn(Complex<f64>) -> bool + Sync + 'a>,
}

impl<'a> Classifiers<'a> {
    /// Every point is of interest; escape is tested for up to
    /// `max_iterations`.
    pub fn standard(max_iterations: usize) -> Classifiers<'a> {
        Classifiers {
            in_area: Box::new(|_| true),
            escape: Box::new(move |c| escape_count(c, max_iterations)),
            in_bulbs: Box::new(is_inside_known_bulbs),
        }
    }

    /// Replace the area classifier.
    pub fn with_area<F>(mut self, in_area: F) -> Classifiers<'a>
    where
        F: Fn(Complex<f64>) -> bool + Sync + 'a,
    {
        self.in_area = Box::new(in_area);
        self
    }
}

/// Colors for the membership rendering and its overlays.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Palette {
    /// Points outside the area of interest.
    pub outside_area: Rgb<u8>,
    /// Points the bulb test vouches for.
    pub bulb: Rgb<u8>,
    /// Members found by iterating.
    pub member: Rgb<u8>,
    /// Points that escape.
    pub non_member: Rgb<u8>,
    /// Coordinate grid lines.
    pub grid: Rgb<u8>,
    /// The real and imaginary axes.
    pub axis: Rgb<u8>,
}

impl Default for Palette {
    fn default() -> Palette {
        Palette {
            outside_area: Rgb([205, 92, 92]),
            bulb: Rgb([128, 128, 128]),
            member: Rgb([0, 0, 0]),
            non_member: Rgb([127, 255, 212]),
            grid: Rgb([0, 128, 0]),
            axis: Rgb([144, 238, 144]),
        }
    }
}

/// How a classified point becomes a color.
#[derive(Clone, Debug)]
pub enum Shading {
    /// Flat colors by membership.
    Membership,
    /// Members black, everything else from the ramp at
    /// `ln(n + 1) / ln(max_iterations + 1)` for an escape on iteration `n`.
    EscapeTime {
        /// The palette for escaping points.
        ramp: ColorRamp,
        /// The escape count that maps to the top of the ramp.
        max_iterations: usize,
    },
}

/// Renders the Mandelbrot set itself.
pub struct MandelbrotRenderer<'a> {
    classifiers: Classifiers<'a>,
    shading: Shading,
    palette: Palette,
    grid: Option<f64>,
    threads: usize,
}

impl<'a> MandelbrotRenderer<'a> {
    /// A renderer with a half-unit grid, single-threaded.
    pub fn new(classifiers: Classifiers<'a>, shading: Shading) -> MandelbrotRenderer<'a> {
        MandelbrotRenderer {
            classifiers,
            shading,
            palette: Palette::default(),
            grid: Some(0.5),
            threads: 1,
        }
    }

    /// Grid line spacing, or None for no grid.  A spacing that is not
    /// positive also means no grid.
    pub fn with_grid(mut self, spacing: Option<f64>) -> MandelbrotRenderer<'a> {
        self.grid = spacing.filter(|&spacing| spacing > 0.0);
        self
    }

    /// Shade rows on this many workers.
    pub fn with_threads(mut self, threads: usize) -> MandelbrotRenderer<'a> {
        self.threads = threads.max(1);
        self
    }

    /// Replace the palette.
    pub fn with_palette(mut self, palette: Palette) -> MandelbrotRenderer<'a> {
        self.palette = palette;
        self
    }

    /// The color of one point, before any overlay.
    pub fn pick_color(&self, point: Complex<f64>) -> Rgb<u8> {
        let classify = &self.classifiers;
        if !(classify.in_area)(point) {
            return self.palette.outside_area;
        }
        match self.shading {
            Shading::Membership => {
                if (classify.in_bulbs)(point) {
                    self.palette.bulb
                } else if (classify.escape)(point).is_none() {
                    self.palette.member
                } else {
                    self.palette.non_member
                }
            }
            Shading::EscapeTime {
                ref ramp,
                max_iterations,
            } => {
                if (classify.in_bulbs)(point) {
                    return self.palette.member;
                }
                // Shifted by one: an escape on the first iteration must
                // not land on the bottom stop.
                match (classify.escape)(point) {
                    None => self.palette.member,
                    Some(n) => ramp.color_at(
                        ((n + 1) as f64).ln() / ((max_iterations.max(n) + 1) as f64).ln(),
                    ),
                }
            }
        }
    }

    /// Render the viewport at the given resolution, then draw the grid
    /// and the axes over it.
    pub fn render(&self, resolution: Resolution, viewport: &Area) -> Result<RgbImage> {
        info!(
            "rendering the Mandelbrot set ({}x{})",
            resolution.width(),
            resolution.height()
        );
        let mut output = rasterize(resolution, self.threads, |pixel| {
            self.pick_color(viewport.pixel_to_point(resolution, pixel))
        })?;

        if let Some(spacing) = self.grid {
            debug!("rendering grid every {}", spacing);
            for real in multiples(spacing, viewport.real().min(), viewport.real().max()) {
                if let Some(column) = viewport.real_to_column(resolution, real) {
                    draw_column(&mut output, column, self.palette.grid);
                }
            }
            for imaginary in multiples(
                spacing,
                viewport.imaginary().min(),
                viewport.imaginary().max(),
            ) {
                if let Some(row) = viewport.imaginary_to_row(resolution, imaginary) {
                    draw_row(&mut output, row, self.palette.grid);
                }
            }
        }

        debug!("rendering axes");
        if let Some(column) = viewport.real_to_column(resolution, 0.0) {
            draw_column(&mut output, column, self.palette.axis);
        }
        if let Some(row) = viewport.imaginary_to_row(resolution, 0.0) {
            draw_row(&mut output, row, self.palette.axis);
        }
        Ok(output)
    }
}

// Every multiple of `spacing` inside [min, max].
fn multiples(spacing: f64, min: f64, max: f64) -> impl Iterator<Item = f64> {
    let first = (min / spacing).ceil() as i64;
    let last = (max / spacing).floor() as i64;
    (first..=last).map(move |k| k as f64 * spacing)
}

fn draw_column(output: &mut RgbImage, column: usize, color: Rgb<u8>) {
    for y in 0..output.height() {
        output.put_pixel(column as u32, y, color);
    }
}

fn draw_row(output: &mut RgbImage, row: usize, color: Rgb<u8>) {
    for x in 0..output.width() {
        output.put_pixel(x, row as u32, color);
    }
}
