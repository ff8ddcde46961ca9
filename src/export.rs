use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, ensure};
use glam::DVec3;
use mesh_tools::GltfBuilder;
use mesh_tools::Triangle;
use serde::Serialize;
use tracing::info;

use crate::config::SceneParams;
use crate::height_field::ElevationGrid;
use crate::scene::{Frame, Scene};

pub const MESH_FILE: &str = "terrain.glb";
pub const TEXTURE_FILE: &str = "terrain.png";
pub const DISPLACEMENT_FILE: &str = "displacement.f32";
pub const MANIFEST_FILE: &str = "scene.json";
pub const TRACK_FILE: &str = "camera_track.csv";

/// Horizontal layout of the terrain plane
#[derive(Debug, Clone, Copy)]
struct PlaneLayout {
    width: usize,
    depth: usize,
    /// World units between adjacent columns
    spacing_x: f64,
    /// World units between adjacent rows
    spacing_z: f64,
    half_size: f64,
}

impl PlaneLayout {
    fn new(grid: &ElevationGrid, plane_size: f64) -> Result<Self> {
        ensure!(
            grid.width() >= 2 && grid.depth() >= 2,
            "a terrain mesh needs at least 2x2 vertices, got {}x{}",
            grid.width(),
            grid.depth()
        );
        Ok(PlaneLayout {
            width: grid.width(),
            depth: grid.depth(),
            spacing_x: plane_size / (grid.width() - 1) as f64,
            spacing_z: plane_size / (grid.depth() - 1) as f64,
            half_size: plane_size / 2.0,
        })
    }

    /// Position of the vertex at column `ix`, row `iy`, centred on the origin
    fn position(&self, ix: usize, iy: usize, height: f64) -> DVec3 {
        DVec3::new(
            ix as f64 * self.spacing_x - self.half_size,
            height,
            iy as f64 * self.spacing_z - self.half_size,
        )
    }

    fn uv(&self, ix: usize, iy: usize) -> (f32, f32) {
        (
            ix as f32 / (self.width - 1) as f32,
            iy as f32 / (self.depth - 1) as f32,
        )
    }
}

/// Exports the heightmap as a displaced plane mesh in GLB format
///
/// # Arguments
/// * `grid` - Heightmap, one vertex per cell
/// * `plane_size` - Side length of the plane in world units
/// * `multiplier` - Vertical world units per elevation step
/// * `output_path` - Path where the GLB file will be saved
///
/// # Returns
/// * `Result<()>` - Success or error
pub fn export_terrain_glb(
    grid: &ElevationGrid,
    plane_size: f64,
    multiplier: f64,
    output_path: &Path,
) -> Result<()> {
    let layout = PlaneLayout::new(grid, plane_size)?;
    let width = layout.width;
    let depth = layout.depth;

    let mut builder = GltfBuilder::new();

    let mut positions = Vec::with_capacity(width * depth);
    let mut normals = Vec::with_capacity(width * depth);
    let mut texcoords = Vec::with_capacity(width * depth);
    let mut indices = Vec::with_capacity((width - 1) * (depth - 1) * 2); // 2 triangles per quad

    for iy in 0..depth {
        for ix in 0..width {
            let height = grid.get(ix, iy).unwrap_or(0) as f64 * multiplier;
            let p = layout.position(ix, iy, height);
            positions.push(mesh_tools::compat::point3::new(p.x as f32, p.y as f32, p.z as f32));

            let n = calculate_normal(grid, ix, iy, &layout, multiplier);
            normals.push(mesh_tools::compat::vector3::new(n.x as f32, n.y as f32, n.z as f32));

            let (u, v) = layout.uv(ix, iy);
            texcoords.push(mesh_tools::compat::vector2::new(u, v));
        }
    }

    for iy in 0..(depth - 1) {
        for ix in 0..(width - 1) {
            let top_left = (iy * width + ix) as u32;
            let top_right = (iy * width + ix + 1) as u32;
            let bottom_left = ((iy + 1) * width + ix) as u32;
            let bottom_right = ((iy + 1) * width + ix + 1) as u32;

            // Counter-clockwise seen from above (+Y)
            indices.push(Triangle::new(top_left, bottom_left, top_right));
            indices.push(Triangle::new(top_right, bottom_left, bottom_right));
        }
    }

    let mesh_index = builder.create_simple_mesh(
        Some("TerrainMesh".to_string()),
        &positions,
        &indices,
        Some(normals),
        Some(texcoords),
        None, // texture ships separately
    );

    let node = builder.add_node(
        Some("Terrain".to_string()),
        Some(mesh_index),
        None,
        None,
        None,
    );

    builder.add_scene(Some("Flyover".to_string()), Some(vec![node]));

    builder
        .export_glb(&output_path.to_string_lossy())
        .with_context(|| format!("writing {}", output_path.display()))?;

    Ok(())
}

/// Y-up surface normal at a vertex by central differences
fn calculate_normal(
    grid: &ElevationGrid,
    ix: usize,
    iy: usize,
    layout: &PlaneLayout,
    multiplier: f64,
) -> DVec3 {
    let height = |x: usize, y: usize| grid.get(x, y).unwrap_or(0) as f64 * multiplier;

    let x0 = ix.saturating_sub(1);
    let x1 = (ix + 1).min(layout.width - 1);
    let y0 = iy.saturating_sub(1);
    let y1 = (iy + 1).min(layout.depth - 1);

    let dx = (height(x1, iy) - height(x0, iy)) / ((x1 - x0) as f64 * layout.spacing_x);
    let dz = (height(ix, y1) - height(ix, y0)) / ((y1 - y0) as f64 * layout.spacing_z);

    DVec3::new(-dx, 1.0, -dz).normalize()
}

/// Writes the texture as PNG
pub fn export_texture_png(scene: &Scene, output_path: &Path) -> Result<()> {
    scene
        .texture
        .image()
        .save(output_path)
        .with_context(|| format!("writing {}", output_path.display()))?;
    Ok(())
}

/// Writes the per-vertex displacement array as raw native-endian f32
pub fn export_displacement(scene: &Scene, output_path: &Path) -> Result<()> {
    let displacement = scene.displacements();
    fs::write(output_path, bytemuck::cast_slice::<f32, u8>(&displacement))
        .with_context(|| format!("writing {}", output_path.display()))?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct GridSummary {
    width: usize,
    depth: usize,
    max_elevation: u8,
}

#[derive(Debug, Serialize)]
struct TextureSummary {
    width: u32,
    height: u32,
}

#[derive(Debug, Serialize)]
struct CameraSummary {
    control_points: Vec<[f64; 3]>,
    length: f64,
    period_seconds: f64,
}

/// Description of the generated assets handed to the renderer
#[derive(Debug, Serialize)]
struct SceneManifest<'a> {
    params: &'a SceneParams,
    grid: GridSummary,
    texture: TextureSummary,
    camera: CameraSummary,
    files: Vec<&'a str>,
}

/// Writes the scene manifest as JSON
pub fn export_manifest(scene: &Scene, output_path: &Path) -> Result<()> {
    let manifest = SceneManifest {
        params: &scene.params,
        grid: GridSummary {
            width: scene.grid.width(),
            depth: scene.grid.depth(),
            max_elevation: scene.grid.max(),
        },
        texture: TextureSummary {
            width: scene.texture.width(),
            height: scene.texture.height(),
        },
        camera: CameraSummary {
            control_points: scene
                .path
                .control_points()
                .iter()
                .map(|p| p.to_array())
                .collect(),
            length: scene.path.length(),
            period_seconds: scene.path.period_seconds(),
        },
        files: vec![MESH_FILE, TEXTURE_FILE, DISPLACEMENT_FILE],
    };

    let file = File::create(output_path)
        .with_context(|| format!("creating {}", output_path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &manifest)?;
    writer.flush()?;
    Ok(())
}

/// Export camera frames to a CSV file
pub fn export_camera_track(frames: impl IntoIterator<Item = Frame>, output_path: &Path) -> Result<usize> {
    let file = File::create(output_path)
        .with_context(|| format!("creating {}", output_path.display()))?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "frame,seconds,x,y,z,target_x,target_y,target_z")?;

    let mut count = 0;
    for frame in frames {
        let p = frame.pose.position;
        let t = frame.pose.target;
        writeln!(
            writer,
            "{},{:.4},{:.3},{:.3},{:.3},{:.3},{:.3},{:.3}",
            frame.index, frame.elapsed_seconds, p.x, p.y, p.z, t.x, t.y, t.z
        )?;
        count += 1;
    }

    writer.flush()?;
    Ok(count)
}

/// Writes mesh, texture, displacement and manifest into `out_dir`
pub fn export_scene(scene: &Scene, out_dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir).with_context(|| format!("creating {}", out_dir.display()))?;

    let mesh_path = out_dir.join(MESH_FILE);
    export_terrain_glb(
        &scene.grid,
        scene.params.plane_size,
        scene.params.elevation_multiplier,
        &mesh_path,
    )?;
    info!("Exported terrain mesh to {}", mesh_path.display());

    let texture_path = out_dir.join(TEXTURE_FILE);
    export_texture_png(scene, &texture_path)?;
    info!("Exported texture to {}", texture_path.display());

    let displacement_path = out_dir.join(DISPLACEMENT_FILE);
    export_displacement(scene, &displacement_path)?;

    let manifest_path = out_dir.join(MANIFEST_FILE);
    export_manifest(scene, &manifest_path)?;
    info!("Exported scene manifest to {}", manifest_path.display());

    Ok(vec![mesh_path, texture_path, displacement_path, manifest_path])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridSize;
    use crate::scene::Flythrough;

    fn small_scene() -> Scene {
        let mut params = SceneParams::default();
        params.terrain.size = GridSize::new(8, 6).unwrap();
        Scene::build(params).unwrap()
    }

    #[test]
    fn test_plane_layout_corners() {
        let grid = ElevationGrid::filled(GridSize::new(256, 256).unwrap(), 0);
        let layout = PlaneLayout::new(&grid, 7500.0).unwrap();
        assert_eq!(layout.position(0, 0, 0.0), DVec3::new(-3750.0, 0.0, -3750.0));
        let far = layout.position(255, 255, 5.0);
        assert!((far.x - 3750.0).abs() < 1e-9);
        assert!((far.z - 3750.0).abs() < 1e-9);
        assert_eq!(far.y, 5.0);
        assert_eq!(layout.uv(255, 0), (1.0, 0.0));
    }

    #[test]
    fn test_plane_layout_rejects_single_row() {
        let grid = ElevationGrid::filled(GridSize::new(4, 1).unwrap(), 0);
        assert!(PlaneLayout::new(&grid, 100.0).is_err());
    }

    #[test]
    fn test_flat_normal_is_up() {
        let grid = ElevationGrid::filled(GridSize::new(3, 3).unwrap(), 9);
        let layout = PlaneLayout::new(&grid, 10.0).unwrap();
        assert_eq!(calculate_normal(&grid, 1, 1, &layout, 10.0), DVec3::Y);
    }

    #[test]
    fn test_sloped_normal_leans_downhill() {
        let size = GridSize::new(3, 3).unwrap();
        let grid = ElevationGrid::from_raw(size, vec![0, 1, 2, 0, 1, 2, 0, 1, 2]).unwrap();
        let layout = PlaneLayout::new(&grid, 2.0).unwrap();
        let normal = calculate_normal(&grid, 1, 1, &layout, 1.0);
        assert!(normal.x < 0.0);
        assert!((normal.length() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_export_displacement_size() {
        let scene = small_scene();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DISPLACEMENT_FILE);
        export_displacement(&scene, &path).unwrap();
        assert_eq!(fs::metadata(&path).unwrap().len(), (8 * 6 * 4) as u64);
    }

    #[test]
    fn test_export_texture_round_trip() {
        let scene = small_scene();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(TEXTURE_FILE);
        export_texture_png(&scene, &path).unwrap();

        let loaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(&loaded, scene.texture.image());
    }

    #[test]
    fn test_export_manifest_contents() {
        let scene = small_scene();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MANIFEST_FILE);
        export_manifest(&scene, &path).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["grid"]["width"], 8);
        assert_eq!(json["texture"]["height"], 24);
        assert_eq!(json["camera"]["control_points"].as_array().unwrap().len(), 7);
        assert_eq!(json["params"]["edge_policy"], "blackout");
        assert_eq!(json["params"]["viewer"]["fov_degrees"], 90.0);
    }

    #[test]
    fn test_export_camera_track() {
        let scene = small_scene();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(TRACK_FILE);
        let frames = Flythrough::new(&scene.path, 30.0).frames_for(1.0);
        let count = export_camera_track(frames, &path).unwrap();
        assert_eq!(count, 30);

        let contents = fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(
            lines.next(),
            Some("frame,seconds,x,y,z,target_x,target_y,target_z")
        );
        assert_eq!(lines.count(), 30);
    }

    #[test]
    fn test_export_scene_writes_all_files() {
        let scene = small_scene();
        let dir = tempfile::tempdir().unwrap();
        let written = export_scene(&scene, dir.path()).unwrap();
        assert_eq!(written.len(), 4);
        for path in written {
            assert!(path.exists(), "{} missing", path.display());
        }
    }
}
