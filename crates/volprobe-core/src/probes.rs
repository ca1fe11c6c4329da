//! Probe grid transmittance: the CPU twin of the probe-fill compute pass.

use glam::{Mat4, UVec3, Vec3};
use rayon::prelude::*;

use crate::bounds::CUBE_HALF_EXTENT;
use crate::frame::FrameInput;
use crate::grid::{GridParams, Probe};
use crate::params::{ProbeInterpolation, RaymarchParams};
use crate::volume::Volume;

/// Light transmittance from `position` to the frame's light.
///
/// Marches fixed-length steps toward the light, sampling at each step's
/// midpoint and multiplying in `exp(-density * absorption * step)`. Samples
/// outside the cube contribute nothing.
#[must_use]
pub fn light_transmittance(
    volume: &Volume,
    params: &RaymarchParams,
    inv_world: &Mat4,
    position: Vec3,
) -> f32 {
    let to_light = params.light_pos - position;
    let distance = to_light.length();
    if distance <= 1e-6 {
        return 1.0;
    }

    let dir = to_light / distance;
    let step = params.march.light_step_size.max(1e-4);
    let count = ((distance / step).ceil() as u32).min(params.march.light_max_steps);

    let mut transmittance = 1.0_f32;
    let mut t = 0.0_f32;
    for _ in 0..count {
        let dt = step.min(distance - t);
        if dt <= 0.0 {
            break;
        }

        let local = inv_world.transform_point3(position + dir * (t + 0.5 * dt));
        if local.abs().max_element() <= CUBE_HALF_EXTENT {
            let density = params.optical_density(volume.sample(local + CUBE_HALF_EXTENT));
            transmittance *= (-density * params.absorption * dt).exp();
        }
        t += dt;
    }

    transmittance
}

/// A lattice of probes over the volume's bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeGrid {
    params: GridParams,
    probes: Vec<Probe>,
}

impl ProbeGrid {
    /// Creates a grid with cached positions and full transmittance.
    #[must_use]
    pub fn new(params: GridParams) -> Self {
        let probes = (0..params.probe_count())
            .map(|i| Probe {
                position: params.position(params.coord(i)).to_array(),
                transmittance: 1.0,
            })
            .collect();
        Self { params, probes }
    }

    #[must_use]
    pub fn params(&self) -> &GridParams {
        &self.params
    }

    /// Probe buffer in flat index order.
    #[must_use]
    pub fn probes(&self) -> &[Probe] {
        &self.probes
    }

    /// Computes a single probe. Depends only on the index, the light and the volume.
    #[must_use]
    pub fn evaluate(&self, index: usize, volume: &Volume, frame: &FrameInput) -> Probe {
        let position = self.params.position(self.params.coord(index));
        Probe {
            position: position.to_array(),
            transmittance: light_transmittance(volume, &frame.params, &frame.inv_world(), position),
        }
    }

    /// Recomputes every probe, overwriting the previous frame's values.
    pub fn fill(&mut self, volume: &Volume, frame: &FrameInput) {
        let params = self.params;
        let inv_world = frame.inv_world();
        self.probes
            .par_iter_mut()
            .enumerate()
            .for_each(|(index, probe)| {
                let position = params.position(params.coord(index));
                *probe = Probe {
                    position: position.to_array(),
                    transmittance: light_transmittance(
                        volume,
                        &frame.params,
                        &inv_world,
                        position,
                    ),
                };
            });
    }

    /// Overwrites the probe buffer, e.g. with values read back from the GPU.
    pub fn set_probes(&mut self, probes: Vec<Probe>) {
        debug_assert_eq!(probes.len(), self.params.probe_count());
        self.probes = probes;
    }

    fn transmittance(&self, coord: UVec3) -> f32 {
        self.probes[self.params.index(coord)].transmittance
    }

    /// Transmittance at a world-space point.
    ///
    /// Points outside the grid use the closest boundary probes.
    #[must_use]
    pub fn transmittance_at(&self, world: Vec3, mode: ProbeInterpolation) -> f32 {
        let g = self.params.lattice_coords(world);
        let max = self.params.dims() - 1;

        match mode {
            ProbeInterpolation::Nearest => {
                let nearest = (g + 0.5).floor().as_uvec3().min(max);
                self.transmittance(nearest)
            }
            ProbeInterpolation::Trilinear => {
                let base = g.floor().as_uvec3().min(max - 1);
                let f = g - base.as_vec3();

                let t = |dx: u32, dy: u32, dz: u32| {
                    self.transmittance(base + UVec3::new(dx, dy, dz))
                };
                let x00 = lerp(t(0, 0, 0), t(1, 0, 0), f.x);
                let x10 = lerp(t(0, 1, 0), t(1, 1, 0), f.x);
                let x01 = lerp(t(0, 0, 1), t(1, 0, 1), f.x);
                let x11 = lerp(t(0, 1, 1), t(1, 1, 1), f.x);
                lerp(lerp(x00, x10, f.y), lerp(x01, x11, f.y), f.z)
            }
        }
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
