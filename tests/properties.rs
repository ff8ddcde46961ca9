use proptest::prelude::*;

use terrain_flyover::config::{CameraPathParams, ChannelOverflow, EdgePolicy, GridSize, TerrainParams};
use terrain_flyover::texture::surface_normal;
use terrain_flyover::{CameraPath, ElevationGrid, HeightFieldGenerator, PhaseRng, ShadedTextureBaker};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn heightmap_has_one_sample_per_cell(
        width in 1usize..40,
        depth in 1usize..40,
        phase in -10.0f64..10.0,
        saturate in any::<bool>(),
    ) {
        let params = TerrainParams {
            size: GridSize::new(width, depth).unwrap(),
            overflow: if saturate { ChannelOverflow::Saturate } else { ChannelOverflow::Wrap },
            ..TerrainParams::default()
        };
        let grid = HeightFieldGenerator::new(params.clone()).generate(&mut PhaseRng::new(phase));
        prop_assert_eq!(grid.len(), width * depth);

        let again = HeightFieldGenerator::new(params).generate(&mut PhaseRng::new(phase));
        prop_assert_eq!(grid, again);
    }

    #[test]
    fn texture_is_four_times_the_grid(
        width in 1usize..24,
        depth in 1usize..24,
        fill in any::<u8>(),
        clamp in any::<bool>(),
    ) {
        let grid = ElevationGrid::filled(GridSize::new(width, depth).unwrap(), fill);
        let baker = ShadedTextureBaker {
            edge_policy: if clamp { EdgePolicy::Clamp } else { EdgePolicy::Blackout },
            ..ShadedTextureBaker::default()
        };
        let texture = baker.bake(&grid, &mut PhaseRng::new(1.0)).unwrap();
        prop_assert_eq!(texture.width() as usize, width * 4);
        prop_assert_eq!(texture.height() as usize, depth * 4);
        prop_assert_eq!(texture.as_raw().len(), width * depth * 16 * 4);
    }

    #[test]
    fn surface_normal_is_unit_length(
        left in any::<u8>(),
        right in any::<u8>(),
        up in any::<u8>(),
        down in any::<u8>(),
    ) {
        let n = surface_normal(left as f64, right as f64, up as f64, down as f64);
        prop_assert!((n.length() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn camera_loop_closes(phase in -100.0f64..100.0, segments in 1usize..10) {
        let params = CameraPathParams { segments, ..CameraPathParams::default() };
        let path = CameraPath::generate(&params, &mut PhaseRng::new(phase)).unwrap();
        let start = path.point_at(0.0);
        let end = path.point_at(1.0);
        prop_assert!(start.distance(end) < 1e-6, "{:?} vs {:?}", start, end);
    }
}
