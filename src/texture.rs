//! Colour texture baking from a heightmap.
//!
//! The heightmap is lit by a fixed sun along (1, 1, 1), magnified, and then
//! dithered with a small per-pixel offset so the magnification doesn't band.

use glam::DVec3;
use image::{Rgba, RgbaImage};
use rand::Rng;
use tracing::{debug, info};

use crate::config::{EdgePolicy, Resample, TEXTURE_SCALE};
use crate::error::Result;
use crate::height_field::ElevationGrid;
use crate::resample::magnify;

/// Distance in cells between the shaded cell and the neighbours used for its slope
const NEIGHBOUR_OFFSET: usize = 2;
/// Exclusive upper bound of the per-pixel dither offset
const DITHER_LEVELS: f64 = 5.0;
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Baked RGBA terrain texture
#[derive(Debug, Clone, PartialEq)]
pub struct ColorTexture {
    image: RgbaImage,
}

impl ColorTexture {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Raw RGBA bytes, row-major
    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }
}

/// Store a float in an 8-bit channel: clamp, round half to even, NaN to zero
fn store_channel(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.clamp(0.0, 255.0).round_ties_even() as u8
}

/// Unit direction of the sun
pub fn sun_direction() -> DVec3 {
    DVec3::ONE.normalize()
}

/// Slope normal from the four neighbours of a cell
///
/// The vertical component is fixed at 2, so the result is never degenerate.
pub fn surface_normal(left: f64, right: f64, up: f64, down: f64) -> DVec3 {
    DVec3::new(left - right, 2.0, up - down).normalize()
}

/// Colour of a single cell given its height and its lighting term
pub fn shade_color(height: u8, shade: f64) -> Rgba<u8> {
    let brightness = 0.5 + height as f64 * 0.007;
    Rgba([
        store_channel((96.0 + shade * 128.0) * brightness),
        store_channel((32.0 + shade * 96.0) * brightness),
        store_channel(shade * 96.0 * brightness),
        255,
    ])
}

/// Bakes shaded colour textures from elevation grids
#[derive(Debug, Clone)]
pub struct ShadedTextureBaker {
    /// Texture magnification relative to the grid
    pub scale: u32,
    pub edge_policy: EdgePolicy,
    pub resample: Resample,
}

impl Default for ShadedTextureBaker {
    fn default() -> Self {
        ShadedTextureBaker {
            scale: TEXTURE_SCALE,
            edge_policy: EdgePolicy::default(),
            resample: Resample::default(),
        }
    }
}

impl ShadedTextureBaker {
    /// Neighbour heights (left, right, up, down) of cell `j`, or None when the
    /// edge policy blacks the cell out
    fn neighbours(&self, grid: &ElevationGrid, j: usize) -> Option<[f64; 4]> {
        let data = grid.as_slice();
        let width = grid.width();

        match self.edge_policy {
            EdgePolicy::Blackout => {
                let stride = width * NEIGHBOUR_OFFSET;
                let left = j.checked_sub(NEIGHBOUR_OFFSET)?;
                let up = j.checked_sub(stride)?;
                let sample = |i: usize| data.get(i).map(|&h| h as f64);
                Some([
                    sample(left)?,
                    sample(j + NEIGHBOUR_OFFSET)?,
                    sample(up)?,
                    sample(j + stride)?,
                ])
            }
            EdgePolicy::Clamp => {
                let x = j % width;
                let y = j / width;
                let last_x = width - 1;
                let last_y = grid.depth() - 1;
                let at = |x: usize, y: usize| data[y * width + x] as f64;
                Some([
                    at(x.saturating_sub(NEIGHBOUR_OFFSET), y),
                    at((x + NEIGHBOUR_OFFSET).min(last_x), y),
                    at(x, y.saturating_sub(NEIGHBOUR_OFFSET)),
                    at(x, (y + NEIGHBOUR_OFFSET).min(last_y)),
                ])
            }
        }
    }

    /// Base shading at grid resolution
    ///
    /// # Arguments
    /// * `grid` - Heightmap to light
    ///
    /// # Returns
    /// * `RgbaImage` - One pixel per grid cell
    pub fn shade(&self, grid: &ElevationGrid) -> RgbaImage {
        let width = grid.width() as u32;
        let depth = grid.depth() as u32;
        let sun = sun_direction();
        let mut img = RgbaImage::new(width, depth);
        let mut blacked_out = 0usize;

        for (j, &height) in grid.as_slice().iter().enumerate() {
            let color = match self.neighbours(grid, j) {
                Some([left, right, up, down]) => {
                    let shade = surface_normal(left, right, up, down).dot(sun);
                    shade_color(height, shade)
                }
                None => {
                    blacked_out += 1;
                    BLACK
                }
            };
            img.put_pixel(j as u32 % width, j as u32 / width, color);
        }

        debug!(blacked_out, "shading pass done");
        img
    }

    /// Bake the full-resolution texture
    ///
    /// Draws one value from `rng` per output pixel.
    ///
    /// # Arguments
    /// * `grid` - Heightmap to bake
    /// * `rng` - Random source for the dither
    ///
    /// # Returns
    /// * `ColorTexture` - `scale` times the grid's width and depth
    pub fn bake<R: Rng + ?Sized>(&self, grid: &ElevationGrid, rng: &mut R) -> Result<ColorTexture> {
        info!(
            "Baking {}x{} texture at {}x",
            grid.width(),
            grid.depth(),
            self.scale
        );

        let base = self.shade(grid);
        let mut image = magnify(&base, self.scale, self.resample)?;
        dither(&mut image, rng);

        Ok(ColorTexture { image })
    }
}

/// Add the same random offset in `[0, 5)` to the colour channels of every pixel
fn dither<R: Rng + ?Sized>(image: &mut RgbaImage, rng: &mut R) {
    for pixel in image.pixels_mut() {
        let v = (rng.r#gen::<f64>() * DITHER_LEVELS) as u8;
        for channel in &mut pixel.0[..3] {
            *channel = channel.saturating_add(v);
        }
    }
}
