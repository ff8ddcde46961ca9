//! Procedural terrain flyover.
//!
//! Builds a fractal heightmap, bakes a lit and dithered colour texture from
//! it, and flies a camera around a closed spline over the result. Everything
//! is generated once from a single deterministic random stream; the per-frame
//! work is sampling the camera path.

pub mod camera_path;
pub mod config;
pub mod error;
pub mod export;
pub mod height_field;
pub mod resample;
pub mod rng;
pub mod scene;
pub mod texture;

pub use camera_path::{CameraPath, CameraPose};
pub use config::{ChannelOverflow, EdgePolicy, GridSize, Resample, SceneParams, TerrainParams};
pub use error::TerrainError;
pub use height_field::{ElevationGrid, HeightFieldGenerator};
pub use rng::PhaseRng;
pub use scene::{Flythrough, Frame, Scene};
pub use texture::{ColorTexture, ShadedTextureBaker};
