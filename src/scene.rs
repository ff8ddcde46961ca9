//! Startup pipeline and per-frame camera contract.

use glam::DMat4;
use rand::Rng;
use tracing::info;

use crate::camera_path::{CameraPath, CameraPose};
use crate::config::{SceneParams, ViewerParams};
use crate::error::Result;
use crate::height_field::{ElevationGrid, HeightFieldGenerator};
use crate::rng::PhaseRng;
use crate::texture::{ColorTexture, ShadedTextureBaker};

/// Everything generated once at startup. Immutable afterwards.
#[derive(Debug, Clone)]
pub struct Scene {
    pub params: SceneParams,
    pub grid: ElevationGrid,
    pub texture: ColorTexture,
    pub path: CameraPath,
}

impl Scene {
    /// Build a scene from a fresh random stream seeded with `params.phase`
    pub fn build(params: SceneParams) -> Result<Self> {
        let mut rng = PhaseRng::new(params.phase);
        Self::build_with_rng(params, &mut rng)
    }

    /// Build a scene drawing from the given stream
    ///
    /// Draw order: noise offset, camera walk, texture dither.
    pub fn build_with_rng<R: Rng + ?Sized>(params: SceneParams, rng: &mut R) -> Result<Self> {
        let generator = HeightFieldGenerator::new(params.terrain.clone());
        let grid = generator.generate(rng);

        let path = CameraPath::generate(&params.camera, rng)?;

        let baker = ShadedTextureBaker {
            scale: params.texture_scale,
            edge_policy: params.edge_policy,
            resample: params.resample,
        };
        let texture = baker.bake(&grid, rng)?;

        info!(
            "Scene ready: {}x{} heightmap, {}x{} texture, {:.0} unit camera loop",
            grid.width(),
            grid.depth(),
            texture.width(),
            texture.height(),
            path.length()
        );

        Ok(Scene {
            params,
            grid,
            texture,
            path,
        })
    }

    /// Camera pose for a frame drawn `elapsed_seconds` after startup
    pub fn frame(&self, elapsed_seconds: f64) -> CameraPose {
        self.path.pose_at(elapsed_seconds)
    }

    /// Vertical offsets for the terrain mesh vertices
    pub fn displacements(&self) -> Vec<f32> {
        self.grid.displacements(self.params.elevation_multiplier)
    }
}

/// OpenGL-style perspective projection for the viewer settings
pub fn projection(viewer: &ViewerParams, aspect: f64) -> DMat4 {
    DMat4::perspective_rh_gl(viewer.fov_degrees.to_radians(), aspect, viewer.near, viewer.far)
}

/// One rendered frame of the flythrough
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub index: u64,
    pub elapsed_seconds: f64,
    pub pose: CameraPose,
}

/// Headless frame loop stepping a fixed clock over a camera path
pub struct Flythrough<'a> {
    path: &'a CameraPath,
    frame_seconds: f64,
    next: u64,
}

impl<'a> Flythrough<'a> {
    /// Loop at `fps` frames per second; a non-positive rate is treated as 60
    pub fn new(path: &'a CameraPath, fps: f64) -> Self {
        let fps = if fps.is_finite() && fps > 0.0 { fps } else { 60.0 };
        Flythrough {
            path,
            frame_seconds: 1.0 / fps,
            next: 0,
        }
    }

    /// Frames covering `seconds` of flight
    pub fn frames_for(self, seconds: f64) -> impl Iterator<Item = Frame> + 'a {
        let count = (seconds.max(0.0) / self.frame_seconds).round() as usize;
        self.take(count)
    }
}

impl Iterator for Flythrough<'_> {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        let index = self.next;
        self.next += 1;
        let elapsed_seconds = index as f64 * self.frame_seconds;
        Some(Frame {
            index,
            elapsed_seconds,
            pose: self.path.pose_at(elapsed_seconds),
        })
    }
}
