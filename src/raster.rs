// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Color matrices and the image sink.

use errors::{FractalError, Result};
use image::{Rgb, RgbImage};
use planes::{Pixel, Resolution};
use std::path::Path;

/// Bytes per pixel in a color matrix.
const CHANNELS: usize = 3;

/// Build a color matrix by asking `shade` for the color of every
/// pixel.  The image is cut into bands of whole rows, one band per
/// worker; `shade` must not depend on anything the workers mutate.
pub fn rasterize<F>(resolution: Resolution, threads: usize, shade: F) -> Result<RgbImage>
where
    F: Fn(Pixel) -> Rgb<u8> + Sync,
{
    let width = resolution.width();
    let threads = threads.max(1);
    let rows_per_band = (resolution.height() + threads - 1) / threads;
    let mut buffer = vec![0u8; resolution.len() * CHANNELS];

    {
        let bands: Vec<&mut [u8]> = buffer.chunks_mut(rows_per_band * width * CHANNELS).collect();
        let shade = &shade;
        crossbeam::scope(|spawner| {
            for (band, pixels) in bands.into_iter().enumerate() {
                spawner.spawn(move |_| {
                    let first_row = band * rows_per_band;
                    for (i, pixel) in pixels.chunks_mut(CHANNELS).enumerate() {
                        let color = shade(Pixel(i % width, first_row + i / width));
                        pixel.copy_from_slice(&color.0);
                    }
                });
            }
        })
        .map_err(|_| FractalError::WorkerPanicked)?;
    }

    RgbImage::from_raw(width as u32, resolution.height() as u32, buffer)
        .ok_or_else(|| FractalError::invalid("color matrix does not match its resolution"))
}

/// The image sink: encode the color matrix to `path`, the format
/// chosen by the file's extension.
pub fn save_image<P: AsRef<Path>>(image: &RgbImage, path: P) -> Result<()> {
    debug!("saving image to {}", path.as_ref().display());
    image.save(path.as_ref())?;
    info!(
        "wrote {}x{} image to {}",
        image.width(),
        image.height(),
        path.as_ref().display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn gradient(pixel: Pixel) -> Rgb<u8> {
        Rgb([pixel.0 as u8, pixel.1 as u8, (pixel.0 * pixel.1) as u8])
    }

    #[test]
    fn every_pixel_is_shaded_once_in_place() {
        let resolution = Resolution::new(7, 5).unwrap();
        for &threads in [1, 2, 3, 8].iter() {
            let image = rasterize(resolution, threads, gradient).unwrap();
            assert_eq!(image.dimensions(), (7, 5));
            for (x, y, color) in image.enumerate_pixels() {
                assert_eq!(*color, gradient(Pixel(x as usize, y as usize)));
            }
        }
    }

    #[test]
    fn saved_images_land_on_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gradient.png");
        let image = rasterize(Resolution::new(4, 4).unwrap(), 2, gradient).unwrap();
        save_image(&image, &path).unwrap();
        let read = image::open(&path).unwrap().to_rgb8();
        assert_eq!(read, image);
    }

    #[test]
    fn format_follows_the_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gradient.ppm");
        let image = rasterize(Resolution::new(3, 5).unwrap(), 2, gradient).unwrap();
        save_image(&image, &path).unwrap();
        assert_eq!(image::open(&path).unwrap().to_rgb8(), image);
    }

    #[test]
    fn unknown_extension_is_an_image_error() {
        let dir = tempdir().unwrap();
        let image = rasterize(Resolution::new(2, 2).unwrap(), 1, gradient).unwrap();
        match save_image(&image, dir.path().join("gradient.unknown")) {
            Err(FractalError::Image(_)) => {}
            other => panic!("expected an image error, got {:?}", other),
        }
    }
}
