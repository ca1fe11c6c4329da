//! Per-pixel volume integration.
//!
//! This is the reference for the fragment stage of the raymarch pass and is
//! used by the software backend directly.

use glam::{Mat4, Vec3, Vec4};

use crate::bounds::{resolve_segment, CUBE_HALF_EXTENT};
use crate::color_maps::ColorMapLut;
use crate::params::RaymarchParams;
use crate::probes::ProbeGrid;
use crate::volume::{normalize_density, Volume};

/// Segments shorter than this are treated as empty.
pub const MIN_SEGMENT_LENGTH: f32 = 1e-6;

/// Accumulated radiance along one ray, premultiplied by alpha.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaySample {
    /// Premultiplied color.
    pub color: Vec3,
    /// Accumulated opacity in `[0, 1]`.
    pub alpha: f32,
    /// Number of march steps taken.
    pub steps: u32,
}

impl RaySample {
    /// Fully transparent result.
    pub const EMPTY: Self = Self {
        color: Vec3::ZERO,
        alpha: 0.0,
        steps: 0,
    };

    /// Composites the sample over an opaque background color.
    #[must_use]
    pub fn over(&self, background: Vec3) -> Vec4 {
        (self.color + background * (1.0 - self.alpha)).extend(1.0)
    }
}

/// Front-to-back raymarch integrator over one volume.
#[derive(Debug, Clone, Copy)]
pub struct Integrator<'a> {
    volume: &'a Volume,
    lut: &'a ColorMapLut,
    params: &'a RaymarchParams,
    probes: Option<&'a ProbeGrid>,
    world: Mat4,
}

impl<'a> Integrator<'a> {
    /// Creates an integrator for a cube at the origin with no probe lighting.
    #[must_use]
    pub fn new(volume: &'a Volume, lut: &'a ColorMapLut, params: &'a RaymarchParams) -> Self {
        Self {
            volume,
            lut,
            params,
            probes: None,
            world: Mat4::IDENTITY,
        }
    }

    /// Enables probe lookups when the parameters ask for them.
    #[must_use]
    pub fn with_probes(mut self, probes: &'a ProbeGrid) -> Self {
        self.probes = Some(probes);
        self
    }

    /// Sets the cube's local to world transform used for probe lookups.
    #[must_use]
    pub fn with_world(mut self, world: Mat4) -> Self {
        self.world = world;
        self
    }

    /// Integrates the pixel whose bounds texels are `front` and `back`.
    #[must_use]
    pub fn integrate_pixel(&self, front: Vec4, back: Vec4, camera_local: Vec3) -> RaySample {
        match resolve_segment(front, back, camera_local) {
            Some((entry, exit)) => self.integrate(entry, exit),
            None => RaySample::EMPTY,
        }
    }

    /// Integrates from `entry` to `exit`, both in cube-local space.
    #[must_use]
    pub fn integrate(&self, entry: Vec3, exit: Vec3) -> RaySample {
        let segment = exit - entry;
        let length = segment.length();
        if length <= MIN_SEGMENT_LENGTH {
            return RaySample::EMPTY;
        }

        let params = self.params;
        let march = &params.march;
        let dir = segment / length;
        let step = march.step_size.max(1e-4);
        let count = ((length / step).ceil() as u32).min(march.max_steps);
        let probes = self.probes.filter(|_| params.use_probes);

        let mut color = Vec3::ZERO;
        let mut alpha = 0.0_f32;
        let mut steps = 0;
        let mut t = 0.0_f32;
        while steps < count && alpha < march.opacity_cutoff {
            let dt = step.min(length - t);
            if dt <= 0.0 {
                break;
            }

            let local = entry + dir * (t + 0.5 * dt);
            let normalized =
                normalize_density(self.volume.sample(local + CUBE_HALF_EXTENT), params.min_val, params.max_val);
            let density = normalized * params.density_scale;
            let sample_alpha = 1.0 - (-density * params.absorption * dt).exp();

            let mut rgb = self.lut.sample(normalized).truncate();
            if let Some(grid) = probes {
                let world = self.world.transform_point3(local);
                rgb *= params.probe_light(grid.transmittance_at(world, params.interpolation));
            }

            let weight = (1.0 - alpha) * sample_alpha;
            color += rgb * weight;
            alpha += weight;

            t += dt;
            steps += 1;
        }

        RaySample {
            color,
            alpha,
            steps,
        }
    }
}
