//! Property tests for the volume, probe and raymarch algorithms.

use glam::{Mat4, UVec3, Vec3};
use proptest::prelude::*;
use volprobe_core::{
    light_transmittance, normalize_density, CameraMatrices, FrameInput, GridParams, GridSettings,
    ProbeGrid, RaymarchParams, Volume,
};

fn dims_and_data() -> impl Strategy<Value = (UVec3, Vec<f32>)> {
    (1u32..6, 1u32..6, 1u32..6).prop_flat_map(|(x, y, z)| {
        (
            Just(UVec3::new(x, y, z)),
            prop::collection::vec(-100.0f32..100.0, (x * y * z) as usize),
        )
    })
}

fn cloud(data: Vec<f32>) -> Volume {
    Volume::from_data(UVec3::splat(4), data).unwrap()
}

fn cloud_data() -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(0.0f32..1.0, 64)
}

fn frame(light_pos: Vec3, absorption: f32) -> FrameInput {
    let camera = CameraMatrices {
        view: Mat4::IDENTITY,
        proj: Mat4::IDENTITY,
    };
    let params = RaymarchParams {
        light_pos,
        absorption,
        min_val: 0.0,
        max_val: 1.0,
        ..RaymarchParams::default()
    };
    FrameInput::new(camera, params)
}

fn small_grid() -> ProbeGrid {
    let settings = GridSettings {
        dims: UVec3::splat(3),
        ..GridSettings::default()
    };
    ProbeGrid::new(GridParams::new(&settings).unwrap())
}

fn light() -> impl Strategy<Value = Vec3> {
    (-2.0f32..2.0, 0.6f32..2.0, -2.0f32..2.0).prop_map(|(x, y, z)| Vec3::new(x, y, z))
}

proptest! {
    #[test]
    fn prop_density_range_normalizes_to_unit_interval((dims, data) in dims_and_data()) {
        let volume = Volume::from_data(dims, data).unwrap();
        let (lo, hi) = (volume.min_density(), volume.max_density());
        prop_assert!(volume.data().contains(&lo));
        prop_assert!(volume.data().contains(&hi));
        prop_assert_eq!(normalize_density(lo, lo, hi), 0.0);
        if hi > lo {
            prop_assert_eq!(normalize_density(hi, lo, hi), 1.0);
        }
        for &d in volume.data() {
            let n = normalize_density(d, lo, hi);
            prop_assert!((0.0..=1.0).contains(&n));
        }
    }

    #[test]
    fn prop_le_bytes_round_trip(bits in prop::collection::vec(any::<u32>(), 8)) {
        let bytes: Vec<u8> = bits.iter().flat_map(|b| b.to_le_bytes()).collect();
        let volume = Volume::from_le_bytes(UVec3::new(2, 2, 2), &bytes).unwrap();
        prop_assert_eq!(volume.to_le_bytes(), bytes);
    }

    #[test]
    fn prop_probe_fill_is_deterministic(data in cloud_data(), light_pos in light()) {
        let volume = cloud(data);
        let frame = frame(light_pos, 4.0);
        let mut a = small_grid();
        let mut b = small_grid();
        a.fill(&volume, &frame);
        b.fill(&volume, &frame);
        prop_assert_eq!(a.probes(), b.probes());
    }

    #[test]
    fn prop_probe_order_does_not_matter(
        data in cloud_data(),
        light_pos in light(),
        order in Just((0..27).collect::<Vec<usize>>()).prop_shuffle(),
    ) {
        let volume = cloud(data);
        let frame = frame(light_pos, 4.0);
        let mut grid = small_grid();
        grid.fill(&volume, &frame);

        for &i in &order {
            prop_assert_eq!(grid.evaluate(i, &volume, &frame), grid.probes()[i]);
        }
    }

    #[test]
    fn prop_transmittance_non_increasing_in_absorption(
        data in cloud_data(),
        light_pos in light(),
        a in 0.0f32..20.0,
        extra in 0.0f32..20.0,
    ) {
        let volume = cloud(data);
        let weak = frame(light_pos, a).params;
        let strong = frame(light_pos, a + extra).params;
        let p = Vec3::new(0.1, -0.2, 0.05);
        let t_weak = light_transmittance(&volume, &weak, &Mat4::IDENTITY, p);
        let t_strong = light_transmittance(&volume, &strong, &Mat4::IDENTITY, p);
        prop_assert!(t_strong <= t_weak);
        prop_assert!((0.0..=1.0).contains(&t_strong));
    }

    #[test]
    fn prop_transmittance_non_increasing_in_step_count(
        data in cloud_data(),
        light_pos in light(),
        steps in 1u32..64,
        extra in 0u32..64,
    ) {
        let volume = cloud(data);
        let mut few = frame(light_pos, 4.0).params;
        few.march.light_max_steps = steps;
        let mut many = few;
        many.march.light_max_steps = steps + extra;
        let p = Vec3::new(-0.3, -0.4, 0.2);
        let t_few = light_transmittance(&volume, &few, &Mat4::IDENTITY, p);
        let t_many = light_transmittance(&volume, &many, &Mat4::IDENTITY, p);
        prop_assert!(t_many <= t_few);
    }
}

#[test]
fn test_volume_file_round_trip() {
    let volume = Volume::perlin(UVec3::new(5, 4, 3), &volprobe_core::NoiseSettings::default()).unwrap();
    let path = std::env::temp_dir().join(format!("volprobe-roundtrip-{}.bin", std::process::id()));
    volume.save(&path).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes.len(), 5 * 4 * 3 * 4);
    let loaded = Volume::load(&path, UVec3::new(5, 4, 3)).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(loaded.to_le_bytes(), bytes);
    assert_eq!(loaded, volume);
}

#[test]
fn test_short_volume_file_is_rejected() {
    let path = std::env::temp_dir().join(format!("volprobe-short-{}.bin", std::process::id()));
    std::fs::write(&path, vec![0u8; 4 * 7]).unwrap();
    let result = Volume::load(&path, UVec3::new(2, 2, 2));
    std::fs::remove_file(&path).ok();

    assert!(matches!(
        result,
        Err(volprobe_core::VolumeError::SizeMismatch { expected: 32, actual: 28 })
    ));
}
