// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Run configuration.  `Config` holds the parameters as the user gave
//! them; `Config::validate` checks every one of them and resolves every
//! name before any work starts, producing the `Settings` the
//! operations run from.

use color::ColorRamp;
use errors::{FractalError, Result};
use escape::DEFAULT_MAX_ITERATIONS;
use finder::BailoutRange;
use generators::Strategy;
use planes::{Area, InclusiveRange, Resolution};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// What a run produces.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OperationKind {
    /// The Mandelbrot set with grid and axes.
    RenderMandelbrot,
    /// The Mandelbrot set, painting everything the boundary scan
    /// would not sample from as background.
    RenderInterestingAreas,
    /// The Mandelbrot set shaded by escape time.
    RenderEscapeTime,
    /// Search for seeds and append them to a point file.
    FindPoints,
    /// A Buddhabrot from point files, in the classic cyan.
    PlotPoints,
    /// A supersampled Buddhabrot from point files, through a ramp.
    RenderDensity,
    /// A Nebulabrot from three sets of point files.
    RenderNebula,
}

const OPERATIONS: &[(&str, OperationKind)] = &[
    ("render-mandelbrot", OperationKind::RenderMandelbrot),
    ("render-interesting-areas", OperationKind::RenderInterestingAreas),
    ("render-escape-time", OperationKind::RenderEscapeTime),
    ("find-points", OperationKind::FindPoints),
    ("plot-points", OperationKind::PlotPoints),
    ("render-density", OperationKind::RenderDensity),
    ("render-nebula", OperationKind::RenderNebula),
];

impl OperationKind {
    /// Every operation name, in table order.
    pub fn names() -> Vec<&'static str> {
        OPERATIONS.iter().map(|entry| entry.0).collect()
    }

    /// The name this operation goes by on the command line.
    pub fn name(self) -> &'static str {
        OPERATIONS
            .iter()
            .find(|entry| entry.1 == self)
            .map(|entry| entry.0)
            .unwrap_or("unknown")
    }

    /// How many input patterns the operation reads from.
    pub fn inputs(self) -> usize {
        match self {
            OperationKind::PlotPoints | OperationKind::RenderDensity => 1,
            OperationKind::RenderNebula => 3,
            _ => 0,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OperationKind {
    type Err = FractalError;

    fn from_str(s: &str) -> Result<OperationKind> {
        OPERATIONS
            .iter()
            .find(|entry| entry.0 == s)
            .map(|entry| entry.1)
            .ok_or_else(|| FractalError::Unknown {
                kind: "operation",
                name: s.to_string(),
            })
    }
}

/// Parameters as given.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Operation name.
    pub operation: String,
    /// Output width in pixels.
    pub width: usize,
    /// Output height in pixels.
    pub height: usize,
    /// Real bounds of the viewport.
    pub real: (f64, f64),
    /// Imaginary bounds of the viewport.
    pub imaginary: (f64, f64),
    /// Inclusive escape-count window for the point finder; the upper
    /// bound is also the orbit length when plotting.
    pub bailout: (usize, usize),
    /// Iteration ceiling for the Mandelbrot renderers.
    pub max_iterations: usize,
    /// Selection strategy name.
    pub strategy: String,
    /// Color ramp name.
    pub ramp: String,
    /// Worker count.
    pub threads: usize,
    /// Stop the point finder after this many points.
    pub limit: Option<usize>,
    /// Seed the random sources for a reproducible run.
    pub seed: Option<u64>,
    /// Draw the coordinate grid.
    pub grid: bool,
    /// Turn density images on their side.
    pub rotate: bool,
    /// Where output goes.
    pub directory: PathBuf,
    /// Where point files are read from; the output directory if unset.
    pub input_directory: Option<PathBuf>,
    /// Output file name without extension.
    pub filename: String,
    /// Input file patterns.
    pub inputs: Vec<String>,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            operation: OperationKind::RenderMandelbrot.name().to_string(),
            width: 800,
            height: 800,
            real: (-2.0, 1.0),
            imaginary: (-1.5, 1.5),
            bailout: (20_000, 30_000),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            strategy: Strategy::default().name().to_string(),
            ramp: "blue".to_string(),
            threads: num_cpus::get(),
            limit: None,
            seed: None,
            grid: true,
            rotate: true,
            directory: PathBuf::from("."),
            input_directory: None,
            filename: "fractal".to_string(),
            inputs: vec![],
        }
    }
}

/// Validated parameters.
#[derive(Clone, Debug)]
pub struct Settings {
    /// What to do.
    pub operation: OperationKind,
    /// Output size.
    pub resolution: Resolution,
    /// The region of the complex plane.
    pub viewport: Area,
    /// Escape-count window.
    pub bailout: BailoutRange,
    /// Iteration ceiling for the Mandelbrot renderers.
    pub max_iterations: usize,
    /// Selection strategy.
    pub strategy: Strategy,
    /// Palette for ramp-shaded images.
    pub ramp: ColorRamp,
    /// Worker count, at least one.
    pub threads: usize,
    /// Point finder limit.
    pub limit: Option<usize>,
    /// Random seed.
    pub seed: Option<u64>,
    /// Draw the coordinate grid.
    pub grid: bool,
    /// Turn density images on their side.
    pub rotate: bool,
    /// Output directory.
    pub directory: PathBuf,
    /// Point file directory.
    pub input_directory: PathBuf,
    /// Output file name without extension.
    pub filename: String,
    /// Input file patterns, as many as the operation reads.
    pub inputs: Vec<String>,
}

impl Config {
    /// Check everything and resolve every name.  The first problem
    /// found is returned.
    pub fn validate(&self) -> Result<Settings> {
        let operation = OperationKind::from_str(&self.operation)?;
        let resolution = Resolution::new(self.width, self.height)?;
        let viewport = Area::new(
            InclusiveRange::new(self.real.0, self.real.1)?,
            InclusiveRange::new(self.imaginary.0, self.imaginary.1)?,
        );
        let bailout = BailoutRange::new(self.bailout.0, self.bailout.1)?;
        if self.max_iterations == 0 {
            return Err(FractalError::invalid("iteration count must be positive"));
        }
        let strategy = Strategy::from_str(&self.strategy)?;
        let ramp = ColorRamp::named(&self.ramp)?;
        if self.threads == 0 {
            return Err(FractalError::invalid("thread count must be positive"));
        }
        if self.limit == Some(0) {
            return Err(FractalError::invalid("point limit must be positive"));
        }
        if self.filename.is_empty() {
            return Err(FractalError::invalid("output filename is empty"));
        }
        let wanted = operation.inputs();
        if wanted > 0 && self.inputs.len() != wanted {
            return Err(FractalError::invalid(format!(
                "{} needs {} input pattern{}, got {}",
                operation,
                wanted,
                if wanted == 1 { "" } else { "s" },
                self.inputs.len()
            )));
        }

        Ok(Settings {
            operation,
            resolution,
            viewport,
            bailout,
            max_iterations: self.max_iterations,
            strategy,
            ramp,
            threads: self.threads,
            limit: self.limit,
            seed: self.seed,
            grid: self.grid,
            rotate: self.rotate,
            directory: self.directory.clone(),
            input_directory: self
                .input_directory
                .clone()
                .unwrap_or_else(|| self.directory.clone()),
            filename: self.filename.clone(),
            inputs: self.inputs.clone(),
        })
    }
}
