//! Fixed scene constants and the parameter structs built from them.

use clap::ValueEnum;
use serde::Serialize;

use crate::error::{Result, TerrainError};

/// Heightmap columns
pub const WORLD_WIDTH: usize = 256;
/// Heightmap rows
pub const WORLD_DEPTH: usize = 256;
/// Texture magnification relative to the heightmap
pub const TEXTURE_SCALE: u32 = 4;
/// Number of noise octaves summed into the heightmap
pub const OCTAVES: u32 = 4;
/// Factor applied to the octave "quality" after each pass
pub const OCTAVE_QUALITY_STEP: f64 = 5.0;
/// Amplitude multiplier applied to every octave sample
pub const OCTAVE_GAIN: f64 = 1.75;
/// Side length of the terrain plane in world units
pub const PLANE_SIZE: f64 = 7500.0;
/// Vertical displacement per elevation step
pub const ELEVATION_MULTIPLIER: f64 = 10.0;
/// Starting phase of the deterministic random stream
pub const DEFAULT_PHASE: f64 = std::f64::consts::FRAC_PI_4;

/// Validated heightmap dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridSize {
    width: usize,
    depth: usize,
}

impl GridSize {
    /// Create a grid size, rejecting zero-sized axes
    pub fn new(width: usize, depth: usize) -> Result<Self> {
        if width == 0 || depth == 0 {
            return Err(TerrainError::InvalidDimensions { width, depth });
        }
        Ok(GridSize { width, depth })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of cells in the grid
    pub fn len(&self) -> usize {
        self.width * self.depth
    }

    /// Always false; a `GridSize` can't be constructed empty
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl Default for GridSize {
    fn default() -> Self {
        GridSize {
            width: WORLD_WIDTH,
            depth: WORLD_DEPTH,
        }
    }
}

/// How an 8-bit elevation sample behaves when an octave pushes it past 255
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOverflow {
    /// Keep the low 8 bits (byte-array semantics)
    #[default]
    Wrap,
    /// Stop at 255
    Saturate,
}

/// What the shading pass does when a neighbour read falls outside the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EdgePolicy {
    /// Read through the flat buffer; any index outside it produces a black pixel
    #[default]
    Blackout,
    /// Clamp each neighbour coordinate to the grid, per axis
    Clamp,
}

/// Filter used when magnifying the shaded image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Resample {
    #[default]
    Bilinear,
    Nearest,
}

/// Parameters controlling heightmap generation
#[derive(Debug, Clone, Serialize)]
pub struct TerrainParams {
    /// Heightmap dimensions
    pub size: GridSize,
    /// Number of octaves to accumulate
    pub octaves: u32,
    /// Multiplier applied to the quality after each octave
    pub quality_step: f64,
    /// Gain applied to every octave sample
    pub gain: f64,
    /// Overflow behaviour of the 8-bit samples
    pub overflow: ChannelOverflow,
    /// Seed for the permutation table of the coherent noise
    pub noise_seed: u32,
}

impl Default for TerrainParams {
    fn default() -> Self {
        TerrainParams {
            size: GridSize::default(),
            octaves: OCTAVES,
            quality_step: OCTAVE_QUALITY_STEP,
            gain: OCTAVE_GAIN,
            overflow: ChannelOverflow::default(),
            noise_seed: 0,
        }
    }
}

/// Parameters controlling the camera's closed flight path
#[derive(Debug, Clone, Serialize)]
pub struct CameraPathParams {
    pub start_x: f64,
    pub start_z: f64,
    /// Constant flight altitude
    pub height: f64,
    /// Number of random-walk steps after the first point
    pub segments: usize,
    /// Maximum walk step along each axis
    pub step: f64,
    /// Offset subtracted from each uniform draw; 0.5 would be a symmetric walk
    pub bias: f64,
    /// Seconds for one full loop
    pub period_seconds: f64,
    /// Curve fraction between the camera and its look-at target
    pub look_ahead: f64,
    /// Samples used to build the arc-length table
    pub arc_length_divisions: usize,
}

impl Default for CameraPathParams {
    fn default() -> Self {
        CameraPathParams {
            start_x: 400.0,
            start_z: -1000.0,
            height: 1000.0,
            segments: 5,
            step: 400.0,
            bias: 0.9,
            period_seconds: 30.0,
            look_ahead: 0.01,
            arc_length_divisions: 200,
        }
    }
}

/// Viewer settings handed to the renderer alongside the generated assets
#[derive(Debug, Clone, Serialize)]
pub struct ViewerParams {
    /// Vertical field of view in degrees
    pub fov_degrees: f64,
    pub near: f64,
    pub far: f64,
    /// Background and fog colour, 0xRRGGBB
    pub background: u32,
    /// Exponential fog density
    pub fog_density: f64,
}

impl Default for ViewerParams {
    fn default() -> Self {
        ViewerParams {
            fov_degrees: 90.0,
            near: 1.0,
            far: 10000.0,
            background: 0xefd1b5,
            fog_density: 0.0025,
        }
    }
}

/// Everything needed to build a scene once at startup
#[derive(Debug, Clone, Serialize)]
pub struct SceneParams {
    pub terrain: TerrainParams,
    pub camera: CameraPathParams,
    pub viewer: ViewerParams,
    /// Side length of the terrain plane in world units
    pub plane_size: f64,
    /// Vertical displacement per elevation step
    pub elevation_multiplier: f64,
    /// Texture magnification factor
    pub texture_scale: u32,
    pub edge_policy: EdgePolicy,
    pub resample: Resample,
    /// Starting phase of the random stream
    pub phase: f64,
}

impl Default for SceneParams {
    fn default() -> Self {
        SceneParams {
            terrain: TerrainParams::default(),
            camera: CameraPathParams::default(),
            viewer: ViewerParams::default(),
            plane_size: PLANE_SIZE,
            elevation_multiplier: ELEVATION_MULTIPLIER,
            texture_scale: TEXTURE_SCALE,
            edge_policy: EdgePolicy::default(),
            resample: Resample::default(),
            phase: DEFAULT_PHASE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_size_rejects_zero() {
        assert_eq!(
            GridSize::new(0, 4),
            Err(TerrainError::InvalidDimensions { width: 0, depth: 4 })
        );
        assert!(GridSize::new(4, 0).is_err());
    }

    #[test]
    fn test_grid_size_len() {
        let size = GridSize::new(3, 7).unwrap();
        assert_eq!(size.len(), 21);
        assert_eq!(size.width(), 3);
        assert_eq!(size.depth(), 7);
    }

    #[test]
    fn test_defaults_match_scene_constants() {
        let params = SceneParams::default();
        assert_eq!(params.terrain.size.width(), 256);
        assert_eq!(params.terrain.size.depth(), 256);
        assert_eq!(params.terrain.octaves, 4);
        assert_eq!(params.texture_scale, 4);
        assert_eq!(params.plane_size, 7500.0);
        assert_eq!(params.elevation_multiplier, 10.0);
        assert_eq!(params.terrain.overflow, ChannelOverflow::Wrap);
        assert_eq!(params.edge_policy, EdgePolicy::Blackout);
    }
}
