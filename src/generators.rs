// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Point generators: the sampling strategies that feed candidate
//! seeds to the point finder.
//!
//! Uniform sampling wastes most of its effort.  Points in the black
//! heart of the set never escape and contribute nothing to a
//! Buddhabrot, and points far from the set escape so fast their
//! orbits are a handful of pixels long.  The interesting seeds live
//! near the border, so two of the three strategies try to spend
//! their time there.

use errors::FractalError;
use escape::{escape_count, is_inside_known_bulbs};
use num::Complex;
use planes::Area;
use rand::distributions::{Distribution, Uniform};
use rand::{Rng, RngCore};
use std::fmt;
use std::str::FromStr;

/// Rejection sampling gives up after this many tries and hands back
/// the last candidate.  Only a viewport lying entirely inside the
/// known bulbs gets anywhere near it.
const MAX_REJECTIONS: usize = 10_000;

/// A source of candidate seeds.  Every call produces a fresh point
/// inside the viewport; a generator is never exhausted and cannot be
/// rewound.
pub trait PointGenerator: Send {
    /// Produce the next candidate.
    fn next_point(&mut self, rng: &mut dyn RngCore, viewport: &Area) -> Complex<f64>;
}

/// A point drawn uniformly from the viewport.
pub fn uniform_point<R: Rng + ?Sized>(rng: &mut R, viewport: &Area) -> Complex<f64> {
    let real = viewport.real();
    let imaginary = viewport.imaginary();
    Complex::new(
        Uniform::new_inclusive(real.min(), real.max()).sample(rng),
        Uniform::new_inclusive(imaginary.min(), imaginary.max()).sample(rng),
    )
}

/// Draws uniformly, no questions asked.
#[derive(Debug, Default)]
pub struct UniformGenerator;

impl PointGenerator for UniformGenerator {
    fn next_point(&mut self, rng: &mut dyn RngCore, viewport: &Area) -> Complex<f64> {
        uniform_point(rng, viewport)
    }
}

/// Draws uniformly, but throws back anything the closed-form bulb
/// test can prove is a member.
#[derive(Debug, Default)]
pub struct BulbsExcludedGenerator;

impl PointGenerator for BulbsExcludedGenerator {
    fn next_point(&mut self, rng: &mut dyn RngCore, viewport: &Area) -> Complex<f64> {
        let mut candidate = uniform_point(rng, viewport);
        for _ in 0..MAX_REJECTIONS {
            if !is_inside_known_bulbs(candidate) {
                break;
            }
            candidate = uniform_point(rng, viewport);
        }
        candidate
    }
}

/// How coarsely the boundary map looks at the viewport.
#[derive(Copy, Clone, Debug)]
pub struct ScanSettings {
    /// The viewport is cut into this many cells along each axis.
    pub cells_per_axis: usize,
    /// How many random samples we take of each cell.
    pub samples_per_cell: usize,
    /// The iteration ceiling for each sample.
    pub max_scan: usize,
}

impl Default for ScanSettings {
    fn default() -> ScanSettings {
        ScanSettings {
            cells_per_axis: 48,
            samples_per_cell: 12,
            max_scan: 300,
        }
    }
}

/// A coarse map of which cells of a viewport the border of the
/// Mandelbrot set passes through.  A cell is a border cell if our
/// random probing saw both a sample inside the set and a sample that
/// escaped.
#[derive(Clone, Debug)]
pub struct BoundaryMap {
    viewport: Area,
    columns: usize,
    rows: usize,
    border: Vec<bool>,
    border_cells: Vec<usize>,
}

impl BoundaryMap {
    /// Probe every cell of the viewport.
    pub fn scan<R: Rng + ?Sized>(viewport: &Area, settings: &ScanSettings, rng: &mut R) -> Self {
        let columns = settings.cells_per_axis.max(1);
        let rows = columns;
        let mut map = BoundaryMap {
            viewport: *viewport,
            columns,
            rows,
            border: vec![false; columns * rows],
            border_cells: vec![],
        };
        for index in 0..columns * rows {
            if map.is_border_cell(index, settings, rng) {
                map.border[index] = true;
                map.border_cells.push(index);
            }
        }
        debug!(
            "boundary scan found {} border cells out of {}",
            map.border_cells.len(),
            columns * rows
        );
        map
    }

    /// The viewport this map was scanned over.
    pub fn viewport(&self) -> &Area {
        &self.viewport
    }

    /// How many cells straddle the border.
    pub fn border_cells(&self) -> usize {
        self.border_cells.len()
    }

    /// True if the point falls inside a border cell.
    pub fn contains(&self, point: Complex<f64>) -> bool {
        match self.cell_of(point) {
            Some(index) => self.border[index],
            None => false,
        }
    }

    /// A uniformly chosen point inside a uniformly chosen border cell,
    /// or None if the scan found no border at all.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Complex<f64>> {
        if self.border_cells.is_empty() {
            return None;
        }
        let pick = Uniform::new(0, self.border_cells.len()).sample(rng);
        Some(self.point_in_cell(self.border_cells[pick], rng))
    }

    /// A cell is a region in the complex space, defined as a
    /// rectangle.  Sample it a small number of times and decide if the
    /// border really passes through it.
    fn is_border_cell<R: Rng + ?Sized>(
        &self,
        index: usize,
        settings: &ScanSettings,
        rng: &mut R,
    ) -> bool {
        let (mut seen_inside, mut seen_outside) = (false, false);
        for _ in 0..settings.samples_per_cell {
            let c = self.point_in_cell(index, rng);
            if is_inside_known_bulbs(c) || escape_count(c, settings.max_scan).is_none() {
                seen_inside = true;
            } else {
                seen_outside = true;
            }
            if seen_inside && seen_outside {
                return true;
            }
        }
        false
    }

    fn point_in_cell<R: Rng + ?Sized>(&self, index: usize, rng: &mut R) -> Complex<f64> {
        let (column, row) = (index % self.columns, index / self.columns);
        let width = self.viewport.real().span() / self.columns as f64;
        let height = self.viewport.imaginary().span() / self.rows as f64;
        let offset: f64 = rng.gen();
        let re = self.viewport.real().min() + (column as f64 + offset) * width;
        let offset: f64 = rng.gen();
        let im = self.viewport.imaginary().min() + (row as f64 + offset) * height;
        Complex::new(re, im)
    }

    fn cell_of(&self, point: Complex<f64>) -> Option<usize> {
        if !self.viewport.contains(point) {
            return None;
        }
        let real = self.viewport.real();
        let imaginary = self.viewport.imaginary();
        let column = (point.re - real.min()) / real.span() * self.columns as f64;
        let row = (point.im - imaginary.min()) / imaginary.span() * self.rows as f64;
        if !column.is_finite() || !row.is_finite() {
            return None;
        }
        // the upper edges are part of the viewport but not of a cell
        let column = (column as usize).min(self.columns - 1);
        let row = (row as usize).min(self.rows - 1);
        Some(row * self.columns + column)
    }
}

/// Samples only the cells the border passes through, still throwing
/// back points inside the known bulbs.  The boundary map is built the
/// first time it is asked for a point, and rebuilt if the viewport
/// changes.
#[derive(Debug, Default)]
pub struct EdgeBiasedGenerator {
    settings: ScanSettings,
    map: Option<BoundaryMap>,
}

impl EdgeBiasedGenerator {
    /// A generator using the given scan settings.
    pub fn new(settings: ScanSettings) -> EdgeBiasedGenerator {
        EdgeBiasedGenerator {
            settings,
            map: None,
        }
    }

    fn draw(&self, rng: &mut dyn RngCore, viewport: &Area) -> Complex<f64> {
        if let Some(ref map) = self.map {
            if let Some(point) = map.sample(rng) {
                return point;
            }
        }
        uniform_point(rng, viewport)
    }
}

impl PointGenerator for EdgeBiasedGenerator {
    fn next_point(&mut self, rng: &mut dyn RngCore, viewport: &Area) -> Complex<f64> {
        let stale = match self.map {
            Some(ref map) => map.viewport() != viewport,
            None => true,
        };
        if stale {
            self.map = Some(BoundaryMap::scan(viewport, &self.settings, rng));
        }

        let mut candidate = self.draw(rng, viewport);
        for _ in 0..MAX_REJECTIONS {
            if !is_inside_known_bulbs(candidate) {
                break;
            }
            candidate = self.draw(rng, viewport);
        }
        candidate
    }
}

/// The infinite, lazy sequence of candidates from one generator.
/// Termination is always somebody else's decision.
pub struct Candidates<'a> {
    generator: Box<dyn PointGenerator>,
    rng: &'a mut dyn RngCore,
    viewport: Area,
}

impl<'a> Candidates<'a> {
    /// Wrap a generator and its random source.
    pub fn new(
        generator: Box<dyn PointGenerator>,
        rng: &'a mut dyn RngCore,
        viewport: Area,
    ) -> Candidates<'a> {
        Candidates {
            generator,
            rng,
            viewport,
        }
    }
}

impl<'a> Iterator for Candidates<'a> {
    type Item = Complex<f64>;

    fn next(&mut self) -> Option<Complex<f64>> {
        Some(self.generator.next_point(&mut *self.rng, &self.viewport))
    }
}

/// The point-selection strategies the point finder knows about.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// `UniformGenerator`
    Uniform,
    /// `BulbsExcludedGenerator`
    BulbsExcluded,
    /// `EdgeBiasedGenerator`
    EdgeBiased,
}

fn uniform() -> Box<dyn PointGenerator> {
    Box::new(UniformGenerator)
}

fn bulbs_excluded() -> Box<dyn PointGenerator> {
    Box::new(BulbsExcludedGenerator)
}

fn edge_biased() -> Box<dyn PointGenerator> {
    Box::new(EdgeBiasedGenerator::default())
}

const STRATEGIES: &[(&str, Strategy, fn() -> Box<dyn PointGenerator>)] = &[
    ("uniform", Strategy::Uniform, uniform),
    ("bulbs-excluded", Strategy::BulbsExcluded, bulbs_excluded),
    ("edge-biased", Strategy::EdgeBiased, edge_biased),
];

impl Strategy {
    /// Every strategy name, in table order.
    pub fn names() -> Vec<&'static str> {
        STRATEGIES.iter().map(|entry| entry.0).collect()
    }

    /// The name this strategy goes by on the command line.
    pub fn name(self) -> &'static str {
        STRATEGIES
            .iter()
            .find(|entry| entry.1 == self)
            .map(|entry| entry.0)
            .unwrap_or("unknown")
    }

    /// Build a fresh generator for this strategy.
    pub fn generator(self) -> Box<dyn PointGenerator> {
        match STRATEGIES.iter().find(|entry| entry.1 == self) {
            Some(entry) => (entry.2)(),
            None => uniform(),
        }
    }
}

impl Default for Strategy {
    fn default() -> Strategy {
        Strategy::BulbsExcluded
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = FractalError;

    fn from_str(s: &str) -> Result<Strategy, FractalError> {
        STRATEGIES
            .iter()
            .find(|entry| entry.0 == s)
            .map(|entry| entry.1)
            .ok_or_else(|| FractalError::Unknown {
                kind: "selection strategy",
                name: s.to_string(),
            })
    }
}
