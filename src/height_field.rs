//! Fractal heightmap generation from layered coherent noise.

use noise::{NoiseFn, Perlin};
use rand::Rng;
use tracing::{debug, info};

use crate::config::{ChannelOverflow, GridSize, TerrainParams};
use crate::error::{Result, TerrainError};

/// Row-major grid of 8-bit elevation samples
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElevationGrid {
    size: GridSize,
    data: Vec<u8>,
}

impl ElevationGrid {
    /// Wrap an existing sample buffer, checking it matches the grid size
    pub fn from_raw(size: GridSize, data: Vec<u8>) -> Result<Self> {
        if data.len() != size.len() {
            return Err(TerrainError::LengthMismatch {
                expected: size.len(),
                actual: data.len(),
            });
        }
        Ok(ElevationGrid { size, data })
    }

    /// Grid where every cell holds `value`
    pub fn filled(size: GridSize, value: u8) -> Self {
        ElevationGrid {
            size,
            data: vec![value; size.len()],
        }
    }

    pub fn size(&self) -> GridSize {
        self.size
    }

    pub fn width(&self) -> usize {
        self.size.width()
    }

    pub fn depth(&self) -> usize {
        self.size.depth()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Sample at column `x`, row `y`
    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.width() || y >= self.depth() {
            return None;
        }
        self.data.get(y * self.width() + x).copied()
    }

    /// Flat row-major samples
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Per-vertex vertical offsets for a regular grid mesh
    ///
    /// # Arguments
    /// * `multiplier` - World units per elevation step
    ///
    /// # Returns
    /// * `Vec<f32>` - One displacement per cell, in the grid's row-major order
    pub fn displacements(&self, multiplier: f64) -> Vec<f32> {
        self.data
            .iter()
            .map(|&h| (h as f64 * multiplier) as f32)
            .collect()
    }

    /// Highest sample in the grid
    pub fn max(&self) -> u8 {
        self.data.iter().copied().max().unwrap_or(0)
    }
}

/// Accumulate one octave sample into an 8-bit cell
fn accumulate(current: u8, sample: f64, overflow: ChannelOverflow) -> u8 {
    // Byte stores drop the fraction first
    let total = (current as f64 + sample).trunc();
    match overflow {
        ChannelOverflow::Wrap => (total as u64 % 256) as u8,
        ChannelOverflow::Saturate => total.clamp(0.0, 255.0) as u8,
    }
}

/// Builds elevation grids by summing octaves of a 3D noise function
#[derive(Debug, Clone)]
pub struct HeightFieldGenerator<N = Perlin> {
    noise: N,
    params: TerrainParams,
}

impl HeightFieldGenerator<Perlin> {
    /// Create a generator backed by Perlin noise seeded from the params
    pub fn new(params: TerrainParams) -> Self {
        HeightFieldGenerator {
            noise: Perlin::new(params.noise_seed),
            params,
        }
    }
}

impl<N: NoiseFn<f64, 3>> HeightFieldGenerator<N> {
    /// Create a generator backed by an arbitrary noise function
    pub fn with_noise(noise: N, params: TerrainParams) -> Self {
        HeightFieldGenerator { noise, params }
    }

    pub fn params(&self) -> &TerrainParams {
        &self.params
    }

    /// Generate a heightmap
    ///
    /// Draws exactly one value from `rng` (the noise Z offset).
    ///
    /// # Arguments
    /// * `rng` - Random source for the noise Z offset
    ///
    /// # Returns
    /// * `ElevationGrid` - `width * depth` samples
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> ElevationGrid {
        let size = self.params.size;
        let width = size.width();
        let z = rng.r#gen::<f64>() * 100.0;

        info!(
            "Generating {}x{} heightmap with {} octaves",
            width,
            size.depth(),
            self.params.octaves
        );
        debug!(noise_z = z, "noise offset drawn");

        let mut data = vec![0u8; size.len()];
        let mut quality = 1.0;

        for octave in 0..self.params.octaves {
            for (i, cell) in data.iter_mut().enumerate() {
                let x = (i % width) as f64;
                let y = (i / width) as f64;
                let sample = (self.noise.get([x / quality, y / quality, z]) * quality
                    * self.params.gain)
                    .abs();
                *cell = accumulate(*cell, sample, self.params.overflow);
            }
            debug!(octave, quality, "octave accumulated");
            quality *= self.params.quality_step;
        }

        ElevationGrid { size, data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::PhaseRng;
    use noise::Constant;

    fn small_params(width: usize, depth: usize, octaves: u32) -> TerrainParams {
        TerrainParams {
            size: GridSize::new(width, depth).unwrap(),
            octaves,
            ..TerrainParams::default()
        }
    }

    #[test]
    fn test_constant_noise_single_octave() {
        let generator = HeightFieldGenerator::with_noise(Constant::new(10.0), small_params(4, 4, 1));
        let grid = generator.generate(&mut PhaseRng::new(0.0));
        assert_eq!(grid.len(), 16);
        // floor(|10| * 1 * 1.75)
        assert!(grid.as_slice().iter().all(|&h| h == 17));
    }

    #[test]
    fn test_negative_noise_is_folded() {
        let generator =
            HeightFieldGenerator::with_noise(Constant::new(-0.6), small_params(4, 4, 1));
        let grid = generator.generate(&mut PhaseRng::new(0.0));
        // floor(0.6 * 1.75) = 1
        assert!(grid.as_slice().iter().all(|&h| h == 1));
    }

    #[test]
    fn test_wrap_overflow() {
        let generator =
            HeightFieldGenerator::with_noise(Constant::new(100.0), small_params(2, 2, 2));
        let grid = generator.generate(&mut PhaseRng::new(0.0));
        // 175 + 875 = 1050, low byte 26
        assert!(grid.as_slice().iter().all(|&h| h == 26), "{:?}", grid);
    }

    #[test]
    fn test_saturate_overflow() {
        let mut params = small_params(2, 2, 2);
        params.overflow = ChannelOverflow::Saturate;
        let generator = HeightFieldGenerator::with_noise(Constant::new(100.0), params);
        let grid = generator.generate(&mut PhaseRng::new(0.0));
        assert!(grid.as_slice().iter().all(|&h| h == 255));
    }

    #[test]
    fn test_generate_is_deterministic() {
        let generator = HeightFieldGenerator::new(small_params(32, 24, 4));
        let a = generator.generate(&mut PhaseRng::new(std::f64::consts::FRAC_PI_4));
        let b = generator.generate(&mut PhaseRng::new(std::f64::consts::FRAC_PI_4));
        assert_eq!(a, b);
        assert_eq!(a.len(), 32 * 24);
    }

    #[test]
    fn test_perlin_terrain_has_relief() {
        let generator = HeightFieldGenerator::new(small_params(64, 64, 4));
        let grid = generator.generate(&mut PhaseRng::new(std::f64::consts::FRAC_PI_4));
        let first = grid.as_slice()[0];
        assert!(
            grid.as_slice().iter().any(|&h| h != first),
            "Heightmap should not be flat"
        );
    }

    #[test]
    fn test_generate_draws_one_value() {
        let generator = HeightFieldGenerator::with_noise(Constant::new(0.0), small_params(3, 3, 4));
        let mut rng = PhaseRng::new(0.0);
        generator.generate(&mut rng);
        assert_eq!(rng.phase(), 1.0);
    }

    #[test]
    fn test_from_raw_rejects_mismatch() {
        let size = GridSize::new(3, 3).unwrap();
        assert_eq!(
            ElevationGrid::from_raw(size, vec![0; 8]),
            Err(TerrainError::LengthMismatch {
                expected: 9,
                actual: 8
            })
        );
    }

    #[test]
    fn test_get_and_displacements() {
        let size = GridSize::new(2, 2).unwrap();
        let grid = ElevationGrid::from_raw(size, vec![1, 2, 3, 4]).unwrap();
        assert_eq!(grid.get(1, 1), Some(4));
        assert_eq!(grid.get(2, 0), None);
        assert_eq!(grid.displacements(10.0), vec![10.0, 20.0, 30.0, 40.0]);
        assert_eq!(grid.max(), 4);
    }
}
