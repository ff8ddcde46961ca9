use image::RgbaImage;
use image::imageops::{self, FilterType};

use crate::config::Resample;
use crate::error::{Result, TerrainError};

impl From<Resample> for FilterType {
    fn from(resample: Resample) -> Self {
        match resample {
            Resample::Bilinear => FilterType::Triangle,
            Resample::Nearest => FilterType::Nearest,
        }
    }
}

/// Magnify an image by an integer factor
///
/// * `image` - The source image
/// * `scale` - Magnification factor (e.g., 4 quadruples both dimensions)
/// * `filter` - Interpolation used between source pixels
///
/// Returns a new image with dimensions multiplied by scale
pub fn magnify(image: &RgbaImage, scale: u32, filter: Resample) -> Result<RgbaImage> {
    if scale == 0 {
        return Err(TerrainError::InvalidScale(scale));
    }
    if scale == 1 {
        return Ok(image.clone());
    }

    let dst_width = image.width() * scale;
    let dst_height = image.height() * scale;

    Ok(imageops::resize(image, dst_width, dst_height, filter.into()))
}
