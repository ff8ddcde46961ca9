use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use terrain_flyover::config::{
    ChannelOverflow, DEFAULT_PHASE, EdgePolicy, GridSize, OCTAVES, Resample, SceneParams,
    WORLD_DEPTH, WORLD_WIDTH,
};
use terrain_flyover::export::{TRACK_FILE, export_camera_track, export_scene};
use terrain_flyover::scene::{Flythrough, Scene};

#[derive(Parser)]
#[command(name = "terrain-flyover", version, about = "Procedural terrain and camera flyover generator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate the terrain mesh, texture, displacement buffer and scene manifest
    Generate {
        #[command(flatten)]
        scene: SceneArgs,
        /// Directory the assets are written to
        #[arg(short, long, default_value = "out")]
        out_dir: PathBuf,
    },
    /// Sample the camera path at a fixed frame rate and write it as CSV
    Track {
        #[command(flatten)]
        scene: SceneArgs,
        /// Frames per second
        #[arg(long, default_value_t = 60.0)]
        fps: f64,
        /// Seconds of flight to sample (defaults to one loop)
        #[arg(long)]
        seconds: Option<f64>,
        #[arg(short, long, default_value = TRACK_FILE)]
        output: PathBuf,
    },
}

#[derive(Args)]
struct SceneArgs {
    /// Heightmap columns
    #[arg(long, default_value_t = WORLD_WIDTH)]
    width: usize,
    /// Heightmap rows
    #[arg(long, default_value_t = WORLD_DEPTH)]
    depth: usize,
    /// Noise octaves
    #[arg(long, default_value_t = OCTAVES)]
    octaves: u32,
    /// Starting phase of the random stream
    #[arg(long, default_value_t = DEFAULT_PHASE)]
    phase: f64,
    /// Permutation seed of the coherent noise
    #[arg(long, default_value_t = 0)]
    noise_seed: u32,
    #[arg(long, value_enum, default_value_t = ChannelOverflow::Wrap)]
    overflow: ChannelOverflow,
    #[arg(long, value_enum, default_value_t = EdgePolicy::Blackout)]
    edge: EdgePolicy,
    #[arg(long, value_enum, default_value_t = Resample::Bilinear)]
    resample: Resample,
}

impl SceneArgs {
    fn into_params(self) -> Result<SceneParams> {
        let mut params = SceneParams::default();
        params.terrain.size = GridSize::new(self.width, self.depth)?;
        params.terrain.octaves = self.octaves;
        params.terrain.noise_seed = self.noise_seed;
        params.terrain.overflow = self.overflow;
        params.edge_policy = self.edge;
        params.resample = self.resample;
        params.phase = self.phase;
        Ok(params)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Generate { scene, out_dir } => {
            let scene = Scene::build(scene.into_params()?)?;
            let written = export_scene(&scene, &out_dir)?;
            info!("Wrote {} files to {}", written.len(), out_dir.display());
        }
        Command::Track {
            scene,
            fps,
            seconds,
            output,
        } => {
            let scene = Scene::build(scene.into_params()?)?;
            let seconds = seconds.unwrap_or(scene.path.period_seconds());
            let frames = Flythrough::new(&scene.path, fps).frames_for(seconds);
            let count = export_camera_track(frames, &output)?;
            info!("Wrote {} camera frames to {}", count, output.display());
        }
    }

    Ok(())
}
