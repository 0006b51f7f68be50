// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The operations a run can perform, each wired up from validated
//! settings.  Images land in `<directory>/<filename>.png`; found
//! points are appended to `<directory>/<filename>`.

use config::{OperationKind, Settings};
use density::{DensityRenderer, NebulaRenderer};
use errors::{FractalError, Result};
use finder::{CancellationToken, PointFinder};
use generators::{BoundaryMap, ScanSettings};
use mandelbrot::{Classifiers, MandelbrotRenderer, Shading};
use pointfile::{PointFiles, PointWriter};
use rand::rngs::StdRng;
use rand::SeedableRng;
use raster::save_image;
use std::fs;
use std::path::PathBuf;

type Operation = fn(&Settings, &CancellationToken) -> Result<()>;

const OPERATIONS: &[(OperationKind, Operation)] = &[
    (OperationKind::RenderMandelbrot, render_mandelbrot),
    (OperationKind::RenderInterestingAreas, render_interesting_areas),
    (OperationKind::RenderEscapeTime, render_escape_time),
    (OperationKind::FindPoints, find_points),
    (OperationKind::PlotPoints, plot_points),
    (OperationKind::RenderDensity, render_density),
    (OperationKind::RenderNebula, render_nebula),
];

/// Run the operation the settings name.  Only the point finder pays
/// attention to `cancel`.
pub fn run(settings: &Settings, cancel: &CancellationToken) -> Result<()> {
    let operation = OPERATIONS
        .iter()
        .find(|entry| entry.0 == settings.operation)
        .map(|entry| entry.1)
        .ok_or_else(|| FractalError::Unknown {
            kind: "operation",
            name: settings.operation.to_string(),
        })?;
    info!("running {}", settings.operation);
    fs::create_dir_all(&settings.directory)?;
    operation(settings, cancel)
}

/// Where an operation's image goes.
pub fn image_path(settings: &Settings) -> PathBuf {
    settings
        .directory
        .join(format!("{}.png", settings.filename))
}

/// Where the point finder appends its points.
pub fn points_path(settings: &Settings) -> PathBuf {
    settings.directory.join(&settings.filename)
}

fn rng(settings: &Settings) -> StdRng {
    match settings.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn grid(settings: &Settings) -> Option<f64> {
    if settings.grid {
        Some(0.5)
    } else {
        None
    }
}

fn render_mandelbrot(settings: &Settings, _: &CancellationToken) -> Result<()> {
    let image = MandelbrotRenderer::new(
        Classifiers::standard(settings.max_iterations),
        Shading::Membership,
    )
    .with_grid(grid(settings))
    .with_threads(settings.threads)
    .render(settings.resolution, &settings.viewport)?;
    save_image(&image, image_path(settings))
}

fn render_interesting_areas(settings: &Settings, _: &CancellationToken) -> Result<()> {
    let map = BoundaryMap::scan(
        &settings.viewport,
        &ScanSettings::default(),
        &mut rng(settings),
    );
    info!("{} border cells found", map.border_cells());
    let image = MandelbrotRenderer::new(
        Classifiers::standard(settings.max_iterations).with_area(|c| map.contains(c)),
        Shading::Membership,
    )
    .with_grid(None)
    .with_threads(settings.threads)
    .render(settings.resolution, &settings.viewport)?;
    save_image(&image, image_path(settings))
}

fn render_escape_time(settings: &Settings, _: &CancellationToken) -> Result<()> {
    let image = MandelbrotRenderer::new(
        Classifiers::standard(settings.max_iterations),
        Shading::EscapeTime {
            ramp: settings.ramp.clone(),
            max_iterations: settings.max_iterations,
        },
    )
    .with_grid(grid(settings))
    .with_threads(settings.threads)
    .render(settings.resolution, &settings.viewport)?;
    save_image(&image, image_path(settings))
}

fn find_points(settings: &Settings, cancel: &CancellationToken) -> Result<()> {
    let path = points_path(settings);
    info!(
        "appending points to {} using the {} strategy",
        path.display(),
        settings.strategy
    );
    let mut writer = PointWriter::append(&path)?;
    let strategy = settings.strategy;
    let report = PointFinder::new(settings.viewport, settings.bailout)
        .with_threads(settings.threads)
        .with_limit(settings.limit)
        .with_seed(settings.seed)
        .run(|| strategy.generator(), &mut writer, cancel)?;
    info!(
        "saved {} points after testing {}",
        report.accepted, report.evaluated
    );
    Ok(())
}

fn density(settings: &Settings) -> DensityRenderer {
    DensityRenderer::new(
        settings.viewport,
        settings.resolution,
        settings.rotate,
        settings.bailout.max(),
    )
    .with_threads(settings.threads)
}

fn inputs(settings: &Settings) -> Result<Vec<PointFiles>> {
    let mut sources = Vec::with_capacity(settings.inputs.len());
    for pattern in &settings.inputs {
        sources.push(PointFiles::matching(&settings.input_directory, pattern)?);
    }
    Ok(sources)
}

fn plot_points(settings: &Settings, _: &CancellationToken) -> Result<()> {
    let points = inputs(settings)?
        .pop()
        .ok_or_else(|| FractalError::invalid("plot-points needs an input pattern"))?;
    let image = density(settings).render_hsv(points)?;
    save_image(&image, image_path(settings))
}

fn render_density(settings: &Settings, _: &CancellationToken) -> Result<()> {
    let points = inputs(settings)?
        .pop()
        .ok_or_else(|| FractalError::invalid("render-density needs an input pattern"))?;
    let image = density(settings).render_ramp(points, &settings.ramp)?;
    save_image(&image, image_path(settings))
}

fn render_nebula(settings: &Settings, _: &CancellationToken) -> Result<()> {
    let mut sources = inputs(settings)?.into_iter();
    match (sources.next(), sources.next(), sources.next()) {
        (Some(red), Some(green), Some(blue)) => {
            let image = NebulaRenderer::new(density(settings)).render(red, green, blue)?;
            save_image(&image, image_path(settings))
        }
        _ => Err(FractalError::invalid(
            "render-nebula needs three input patterns",
        )),
    }
}
