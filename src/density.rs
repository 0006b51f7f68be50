// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The Buddhabrot and Nebulabrot renderers.  Both load orbits into
//! hit plots, find the busiest pixel once every worker has finished,
//! and only then turn counts into colors.

use color::{buddhabrot_hsv, density_ratio, ColorRamp};
use errors::Result;
use hitplot::{load_trajectories, HitPlot, HitPlot4x4, SimpleHitPlot, TrajectoryStats};
use image::{Rgb, RgbImage};
use num::{clamp, Complex};
use planes::{Area, Pixel, PlaneMapper, Resolution};
use raster::rasterize;

/// Renders the density of escaping orbits.
#[derive(Copy, Clone, Debug)]
pub struct DensityRenderer {
    mapper: PlaneMapper,
    bailout: usize,
    threads: usize,
}

impl DensityRenderer {
    /// A renderer for `viewport` at `resolution`.  When `rotated`, the
    /// real axis runs down the image.
    pub fn new(
        viewport: Area,
        resolution: Resolution,
        rotated: bool,
        bailout: usize,
    ) -> DensityRenderer {
        DensityRenderer {
            mapper: PlaneMapper::new(viewport, resolution, rotated),
            bailout,
            threads: 1,
        }
    }

    /// Load and shade on this many workers.
    pub fn with_threads(mut self, threads: usize) -> DensityRenderer {
        self.threads = threads.max(1);
        self
    }

    /// The size of the images this renderer produces.
    pub fn resolution(&self) -> Resolution {
        self.mapper.resolution()
    }

    /// Load every orbit from `points` into `plot`.
    pub fn plot<P, I>(&self, plot: &P, points: I) -> Result<TrajectoryStats>
    where
        P: HitPlot + ?Sized,
        I: Iterator<Item = Complex<f64>> + Send,
    {
        load_trajectories(plot, &self.mapper, points, self.bailout, self.threads)
    }

    /// Load `points` into `plot`, then color each pixel by its density
    /// ratio.
    pub fn render<P, I, F>(&self, plot: &P, points: I, color: F) -> Result<RgbImage>
    where
        P: HitPlot + ?Sized,
        I: Iterator<Item = Complex<f64>> + Send,
        F: Fn(f64) -> Rgb<u8> + Sync,
    {
        let stats = self.plot(plot, points)?;
        let maximum = plot.maximum();
        info!(
            "{} of {} orbits plotted, busiest pixel has {} hits",
            stats.plotted, stats.points, maximum
        );
        rasterize(self.resolution(), self.threads, |pixel| {
            color(density_ratio(plot.hits_at(pixel), maximum))
        })
    }

    /// The classic Buddhabrot: one counter per pixel, fixed cyan hue.
    pub fn render_hsv<I>(&self, points: I) -> Result<RgbImage>
    where
        I: Iterator<Item = Complex<f64>> + Send,
    {
        let plot = SimpleHitPlot::new(self.resolution());
        self.render(&plot, points, |ratio| buddhabrot_hsv(ratio).to_rgb())
    }

    /// Supersampled counts looked up in a color ramp.
    pub fn render_ramp<I>(&self, points: I, ramp: &ColorRamp) -> Result<RgbImage>
    where
        I: Iterator<Item = Complex<f64>> + Send,
    {
        let plot = HitPlot4x4::new(self.resolution());
        self.render(&plot, points, |ratio| ramp.color_at(ratio))
    }
}

/// Three point sources, one per color channel.
pub struct NebulaRenderer {
    density: DensityRenderer,
}

impl NebulaRenderer {
    /// Every channel is plotted the same way.
    pub fn new(density: DensityRenderer) -> NebulaRenderer {
        NebulaRenderer { density }
    }

    /// Plot each source into its own hit plot and combine the three
    /// density ratios into one image.  Each channel is normalized
    /// against its own busiest pixel.
    pub fn render<I>(&self, red: I, green: I, blue: I) -> Result<RgbImage>
    where
        I: Iterator<Item = Complex<f64>> + Send,
    {
        let resolution = self.density.resolution();
        let plots = [
            SimpleHitPlot::new(resolution),
            SimpleHitPlot::new(resolution),
            SimpleHitPlot::new(resolution),
        ];
        for (name, plot, points) in vec![
            ("red", &plots[0], red),
            ("green", &plots[1], green),
            ("blue", &plots[2], blue),
        ] {
            let stats = self.density.plot(plot, points)?;
            debug!("{} channel: {} orbits plotted", name, stats.plotted);
        }
        let maxima = [plots[0].maximum(), plots[1].maximum(), plots[2].maximum()];
        info!(
            "busiest pixels: red {}, green {}, blue {}",
            maxima[0], maxima[1], maxima[2]
        );

        let channel = |index: usize, pixel: Pixel| {
            let ratio = density_ratio(plots[index].hits_at(pixel), maxima[index]);
            clamp((ratio * 255.0).round(), 0.0, 255.0) as u8
        };
        rasterize(resolution, self.density.threads, |pixel| {
            Rgb([channel(0, pixel), channel(1, pixel), channel(2, pixel)])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use generators::uniform_point;
    use planes::InclusiveRange;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn small(size: usize, rotated: bool) -> DensityRenderer {
        let range = InclusiveRange::new(-2.0, 2.0).unwrap();
        DensityRenderer::new(
            Area::new(range, range),
            Resolution::new(size, size).unwrap(),
            rotated,
            100,
        )
    }

    fn seeds(count: usize) -> Vec<Complex<f64>> {
        let mut rng = StdRng::seed_from_u64(7);
        let viewport = Area::default();
        (0..count).map(|_| uniform_point(&mut rng, &viewport)).collect()
    }

    #[test]
    fn member_seed_renders_uniform_background() {
        let renderer = small(4, true);
        let image = renderer.render_hsv(vec![Complex::new(0.0, 0.0)].into_iter()).unwrap();
        let background = buddhabrot_hsv(0.0).to_rgb();
        assert!(image.pixels().all(|pixel| *pixel == background));

        let ramp = ColorRamp::fire();
        let image = renderer
            .render_ramp(vec![Complex::new(0.0, 0.0)].into_iter(), &ramp)
            .unwrap();
        assert!(image.pixels().all(|pixel| *pixel == ramp.color_at(0.0)));
    }

    #[test]
    fn escaping_orbits_light_up_pixels() {
        let renderer = small(32, true).with_threads(4);
        let image = renderer.render_hsv(seeds(2000).into_iter()).unwrap();
        let black = Rgb([0, 0, 0]);
        let lit = image.pixels().filter(|pixel| **pixel != black).count();
        assert!(lit > 0);
    }

    #[test]
    fn busiest_pixel_is_brightest() {
        let renderer = small(16, false).with_threads(3);
        let plot = SimpleHitPlot::new(renderer.resolution());
        let image = renderer
            .render(&plot, seeds(500).into_iter(), |ratio| ColorRamp::gray().color_at(ratio))
            .unwrap();
        let maximum = plot.maximum();
        assert!(maximum > 0);
        for pixel in renderer.resolution().pixels() {
            let shade = image.get_pixel(pixel.0 as u32, pixel.1 as u32)[0];
            if plot.hits_at(pixel) == maximum {
                assert!(shade >= 254);
            }
            if plot.hits_at(pixel) == 0 {
                assert_eq!(shade, 0);
            }
        }
    }

    #[test]
    fn thread_count_does_not_change_the_image() {
        let points = seeds(800);
        let one = small(24, true).render_hsv(points.clone().into_iter()).unwrap();
        let many = small(24, true)
            .with_threads(6)
            .render_hsv(points.into_iter())
            .unwrap();
        assert_eq!(one, many);
    }

    #[test]
    fn nebula_channels_are_independent() {
        let renderer = NebulaRenderer::new(small(16, true).with_threads(2));
        let image = renderer
            .render(seeds(500).into_iter(), vec![].into_iter(), vec![].into_iter())
            .unwrap();
        assert!(image.pixels().all(|pixel| pixel[1] == 0 && pixel[2] == 0));
        assert!(image.pixels().any(|pixel| pixel[0] > 0));
    }
}
