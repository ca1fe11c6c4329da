//! Per-frame raymarch parameters and quality settings.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::volume::Volume;

/// How the integrator reads the probe grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ProbeInterpolation {
    /// Use the closest probe.
    Nearest,
    /// Blend the 8 probes surrounding the sample.
    #[default]
    Trilinear,
}

impl ProbeInterpolation {
    /// Returns the shader-side selector.
    #[must_use]
    pub fn to_index(self) -> u32 {
        match self {
            ProbeInterpolation::Nearest => 0,
            ProbeInterpolation::Trilinear => 1,
        }
    }

    /// Returns the other mode.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            ProbeInterpolation::Nearest => ProbeInterpolation::Trilinear,
            ProbeInterpolation::Trilinear => ProbeInterpolation::Nearest,
        }
    }
}

/// Step sizes and limits for the view and light marches.
///
/// Both marches take fixed-length steps, clipping only the final step to the
/// segment end, and stop early once the step cap is reached. Smaller steps
/// and larger caps trade speed for accuracy uniformly across the image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarchSettings {
    /// View ray step length, in cube-local units.
    pub step_size: f32,
    /// Maximum number of view ray steps per pixel.
    pub max_steps: u32,
    /// Accumulated opacity at which the view march stops.
    pub opacity_cutoff: f32,
    /// Light march step length, in world units.
    pub light_step_size: f32,
    /// Maximum number of light march steps per probe.
    pub light_max_steps: u32,
}

impl Default for MarchSettings {
    fn default() -> Self {
        Self {
            step_size: 1.0 / 128.0,
            max_steps: 256,
            opacity_cutoff: 0.99,
            light_step_size: 1.0 / 64.0,
            light_max_steps: 128,
        }
    }
}

/// Parameters rebuilt every frame from user-editable state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaymarchParams {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Density mapped to 0.
    pub min_val: f32,
    /// Density mapped to 1.
    pub max_val: f32,
    /// World-space light position.
    pub light_pos: Vec3,
    /// Absorption coefficient per unit length.
    pub absorption: f32,
    /// Multiplier applied to normalized density.
    pub density_scale: f32,
    /// Light level in fully shadowed regions when probes are used.
    pub ambient: f32,
    /// Whether probe transmittance modulates the sample color.
    pub use_probes: bool,
    /// Probe lookup policy.
    pub interpolation: ProbeInterpolation,
    /// March quality settings.
    pub march: MarchSettings,
}

impl Default for RaymarchParams {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
            min_val: 0.0,
            max_val: 1.0,
            light_pos: Vec3::new(1.0, 1.5, 1.0),
            absorption: 4.0,
            density_scale: 1.0,
            ambient: 0.15,
            use_probes: true,
            interpolation: ProbeInterpolation::Trilinear,
            march: MarchSettings::default(),
        }
    }
}

impl RaymarchParams {
    /// Returns a copy with the density range taken from the volume.
    #[must_use]
    pub fn with_volume_range(mut self, volume: &Volume) -> Self {
        self.min_val = volume.min_density();
        self.max_val = volume.max_density();
        self
    }

    /// Returns a copy sized for the given output.
    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width.max(1);
        self.height = height.max(1);
        self
    }

    /// Optical density of a raw sample: normalized, then scaled.
    #[must_use]
    pub fn optical_density(&self, raw: f32) -> f32 {
        crate::volume::normalize_density(raw, self.min_val, self.max_val) * self.density_scale
    }

    /// Light reaching a sample with the given probe transmittance.
    #[must_use]
    pub fn probe_light(&self, transmittance: f32) -> f32 {
        self.ambient + (1.0 - self.ambient) * transmittance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_round_trip_json() {
        let params = RaymarchParams {
            absorption: 2.5,
            interpolation: ProbeInterpolation::Nearest,
            ..RaymarchParams::default()
        };
        let json = serde_json::to_string(&params).unwrap();
        let back: RaymarchParams = serde_json::from_str(&json).unwrap();
        assert_eq!(back, params);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let params: RaymarchParams = serde_json::from_str(r#"{ "use_probes": false }"#).unwrap();
        assert!(!params.use_probes);
        assert_eq!(params.march, MarchSettings::default());
    }

    #[test]
    fn test_probe_light_spans_ambient_to_one() {
        let params = RaymarchParams::default();
        assert_eq!(params.probe_light(0.0), params.ambient);
        assert!((params.probe_light(1.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_interpolation_toggle() {
        assert_eq!(
            ProbeInterpolation::Nearest.toggled(),
            ProbeInterpolation::Trilinear
        );
        assert_eq!(ProbeInterpolation::Trilinear.to_index(), 1);
    }
}
