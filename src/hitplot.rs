// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Hit plots: per-pixel counters recording how often sampled orbits
//! pass through each pixel.
//!
//! Increments come from every worker at once, so each cell is an
//! atomic counter and there are no locks.  Reading the maximum or the
//! individual counts is only meaningful once every writer has joined;
//! `load_trajectories` does not return until they have.

use errors::{FractalError, Result};
use escape::is_inside_known_bulbs;
use num::Complex;
use orbit::Orbit;
use planes::{Pixel, PlaneMapper, Resolution};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

/// Supersampled plots divide each pixel into this many rows and
/// columns of cells.
pub const SUBDIVISIONS: usize = 4;

/// Points handed to a worker per trip to the shared source.
const BATCH: usize = 256;

/// The contract shared by both flavors of hit plot.
pub trait HitPlot: Sync {
    /// The size of the image the plot counts for.
    fn resolution(&self) -> Resolution;

    /// Count a hit at fractional pixel coordinates.  Returns false,
    /// and counts nothing, if the coordinates are outside the image.
    /// Safe to call from any number of threads at once.
    fn increment(&self, left: f64, top: f64) -> bool;

    /// The number of hits counted for one output pixel.
    fn hits_at(&self, pixel: Pixel) -> u32;

    /// The largest per-pixel count; zero for an empty plot.
    fn maximum(&self) -> u32 {
        self.resolution()
            .pixels()
            .map(|pixel| self.hits_at(pixel))
            .max()
            .unwrap_or(0)
    }

    /// Every per-pixel count, row by row.
    fn counts(&self) -> Vec<u32> {
        self.resolution()
            .pixels()
            .map(|pixel| self.hits_at(pixel))
            .collect()
    }

    /// The sum of every count.
    fn total(&self) -> u64 {
        self.resolution()
            .pixels()
            .map(|pixel| u64::from(self.hits_at(pixel)))
            .sum()
    }
}

fn cell_index(left: f64, top: f64, width: usize, height: usize) -> Option<usize> {
    if left >= 0.0 && top >= 0.0 && left < width as f64 && top < height as f64 {
        Some((top as usize) * width + (left as usize))
    } else {
        None
    }
}

// Counters stick at u32::MAX rather than wrapping.
fn bump(cell: &AtomicU32) {
    let _ = cell.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |count| {
        count.checked_add(1)
    });
}

fn arena(len: usize) -> Vec<AtomicU32> {
    (0..len).map(|_| AtomicU32::new(0)).collect()
}

/// One counter per pixel.
pub struct SimpleHitPlot {
    resolution: Resolution,
    cells: Vec<AtomicU32>,
}

impl SimpleHitPlot {
    /// An all-zero plot.
    pub fn new(resolution: Resolution) -> SimpleHitPlot {
        SimpleHitPlot {
            resolution,
            cells: arena(resolution.len()),
        }
    }
}

impl HitPlot for SimpleHitPlot {
    fn resolution(&self) -> Resolution {
        self.resolution
    }

    fn increment(&self, left: f64, top: f64) -> bool {
        match cell_index(left, top, self.resolution.width(), self.resolution.height()) {
            Some(index) => {
                bump(&self.cells[index]);
                true
            }
            None => false,
        }
    }

    fn hits_at(&self, pixel: Pixel) -> u32 {
        self.cells[self.resolution.offset(pixel)].load(Ordering::Relaxed)
    }

    fn maximum(&self) -> u32 {
        self.cells
            .iter()
            .map(|cell| cell.load(Ordering::Relaxed))
            .max()
            .unwrap_or(0)
    }
}

/// A 4x4 grid of counters per pixel.  Orbits are truncated to the
/// finer grid, which smooths the image; the sixteen cells of a pixel
/// are summed when read.
pub struct HitPlot4x4 {
    resolution: Resolution,
    cells: Vec<AtomicU32>,
}

impl HitPlot4x4 {
    /// An all-zero plot.
    pub fn new(resolution: Resolution) -> HitPlot4x4 {
        HitPlot4x4 {
            resolution,
            cells: arena(resolution.len() * SUBDIVISIONS * SUBDIVISIONS),
        }
    }

    fn fine_width(&self) -> usize {
        self.resolution.width() * SUBDIVISIONS
    }

    /// The count of one of the sixteen cells of a pixel.
    pub fn sub_hits_at(&self, pixel: Pixel, column: usize, row: usize) -> u32 {
        let left = pixel.0 * SUBDIVISIONS + column;
        let top = pixel.1 * SUBDIVISIONS + row;
        self.cells[top * self.fine_width() + left].load(Ordering::Relaxed)
    }
}

impl HitPlot for HitPlot4x4 {
    fn resolution(&self) -> Resolution {
        self.resolution
    }

    fn increment(&self, left: f64, top: f64) -> bool {
        let scale = SUBDIVISIONS as f64;
        let height = self.resolution.height() * SUBDIVISIONS;
        match cell_index(left * scale, top * scale, self.fine_width(), height) {
            Some(index) => {
                bump(&self.cells[index]);
                true
            }
            None => false,
        }
    }

    fn hits_at(&self, pixel: Pixel) -> u32 {
        let mut sum: u32 = 0;
        for row in 0..SUBDIVISIONS {
            for column in 0..SUBDIVISIONS {
                sum = sum.saturating_add(self.sub_hits_at(pixel, column, row));
            }
        }
        sum
    }
}

/// What a call to `load_trajectories` saw.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TrajectoryStats {
    /// Seeds read from the source.
    pub points: usize,
    /// Seeds whose orbit escaped and was plotted.
    pub plotted: usize,
    /// Increments that landed inside the image.
    pub hits: u64,
}

impl TrajectoryStats {
    fn merge(self, other: TrajectoryStats) -> TrajectoryStats {
        TrajectoryStats {
            points: self.points + other.points,
            plotted: self.plotted + other.plotted,
            hits: self.hits + other.hits,
        }
    }
}

// Plot the orbit of one seed, skipping seeds that never escape.
fn plot_orbit<P: HitPlot + ?Sized>(
    plot: &P,
    mapper: &PlaneMapper,
    seed: Complex<f64>,
    bailout: usize,
    buffer: &mut Vec<Complex<f64>>,
    stats: &mut TrajectoryStats,
) {
    stats.points += 1;
    if is_inside_known_bulbs(seed) {
        return;
    }
    let mut orbit = Orbit::new(seed, bailout);
    buffer.clear();
    buffer.extend(orbit.by_ref());
    if !orbit.escaped() {
        return;
    }
    stats.plotted += 1;
    for z in buffer.iter() {
        if let Some((left, top)) = mapper.point_to_fraction(*z) {
            if plot.increment(left, top) {
                stats.hits += 1;
            }
        }
    }
}

/// Given a source of seeds, plot the orbit of every seed that escapes
/// within `bailout` iterations, incrementing each in-bounds pixel the
/// orbit passes through.  The seeds are shared out among `threads`
/// workers; since addition commutes, the final counts do not depend
/// on how they were shared out.
pub fn load_trajectories<P, I>(
    plot: &P,
    mapper: &PlaneMapper,
    points: I,
    bailout: usize,
    threads: usize,
) -> Result<TrajectoryStats>
where
    P: HitPlot + ?Sized,
    I: Iterator<Item = Complex<f64>> + Send,
{
    let points = Arc::new(Mutex::new(points));
    let threads = threads.max(1);

    let joined = crossbeam::scope(|spawner| {
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let points = points.clone();
                spawner.spawn(move |_| {
                    let mut stats = TrajectoryStats::default();
                    let mut buffer = Vec::with_capacity(bailout.min(1 << 16));
                    loop {
                        let batch: Vec<Complex<f64>> = match points.lock() {
                            Ok(mut points) => points.by_ref().take(BATCH).collect(),
                            Err(_) => break,
                        };
                        if batch.is_empty() {
                            break;
                        }
                        for seed in batch {
                            plot_orbit(plot, mapper, seed, bailout, &mut buffer, &mut stats);
                        }
                    }
                    stats
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| handle.join().map_err(|_| FractalError::WorkerPanicked))
            .collect::<Result<Vec<TrajectoryStats>>>()
    })
    .map_err(|_| FractalError::WorkerPanicked)??;

    let stats = joined
        .into_iter()
        .fold(TrajectoryStats::default(), TrajectoryStats::merge);
    debug!(
        "{} seeds read, {} orbits plotted, {} hits",
        stats.points, stats.plotted, stats.hits
    );
    Ok(stats)
}
