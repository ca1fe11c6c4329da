//! Keyboard bindings for the camera, the light and the raymarch parameters.

use std::collections::HashSet;

use glam::Vec3;
use volprobe_core::RaymarchParams;
use volprobe_render::Movement;
use winit::keyboard::KeyCode;

/// Light movement speed in world units per second.
pub(crate) const LIGHT_SPEED: f32 = 1.0;
/// Absorption change per key press.
pub(crate) const ABSORPTION_STEP: f32 = 0.5;
/// Density scale change per key press.
pub(crate) const DENSITY_SCALE_STEP: f32 = 0.1;

/// What a key press asks the application to do besides editing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KeyAction {
    None,
    Quit,
    Screenshot,
}

/// Camera movements for the keys currently held.
pub(crate) fn held_movements(keys: &HashSet<KeyCode>) -> impl Iterator<Item = Movement> + '_ {
    [
        (KeyCode::KeyW, Movement::Forward),
        (KeyCode::KeyS, Movement::Backward),
        (KeyCode::KeyA, Movement::Left),
        (KeyCode::KeyD, Movement::Right),
        (KeyCode::KeyQ, Movement::Up),
        (KeyCode::KeyE, Movement::Down),
    ]
    .into_iter()
    .filter(|(key, _)| keys.contains(key))
    .map(|(_, movement)| movement)
}

/// Light displacement for the keys currently held over `dt` seconds.
pub(crate) fn light_delta(keys: &HashSet<KeyCode>, dt: f32) -> Vec3 {
    let mut delta = Vec3::ZERO;
    if keys.contains(&KeyCode::ArrowLeft) {
        delta.x -= 1.0;
    }
    if keys.contains(&KeyCode::ArrowRight) {
        delta.x += 1.0;
    }
    if keys.contains(&KeyCode::PageUp) {
        delta.y += 1.0;
    }
    if keys.contains(&KeyCode::PageDown) {
        delta.y -= 1.0;
    }
    if keys.contains(&KeyCode::ArrowUp) {
        delta.z -= 1.0;
    }
    if keys.contains(&KeyCode::ArrowDown) {
        delta.z += 1.0;
    }
    delta * LIGHT_SPEED * dt
}

/// Applies a single key press to the parameters.
pub(crate) fn apply_key_press(params: &mut RaymarchParams, code: KeyCode) -> KeyAction {
    match code {
        KeyCode::Escape => return KeyAction::Quit,
        KeyCode::F12 => return KeyAction::Screenshot,
        KeyCode::BracketLeft => {
            params.absorption = (params.absorption - ABSORPTION_STEP).max(0.0);
            log::info!("absorption {:.2}", params.absorption);
        }
        KeyCode::BracketRight => {
            params.absorption += ABSORPTION_STEP;
            log::info!("absorption {:.2}", params.absorption);
        }
        KeyCode::Minus => {
            params.density_scale = (params.density_scale - DENSITY_SCALE_STEP).max(0.0);
            log::info!("density scale {:.2}", params.density_scale);
        }
        KeyCode::Equal => {
            params.density_scale += DENSITY_SCALE_STEP;
            log::info!("density scale {:.2}", params.density_scale);
        }
        KeyCode::KeyP => {
            params.use_probes = !params.use_probes;
            log::info!("probe lighting {}", if params.use_probes { "on" } else { "off" });
        }
        KeyCode::KeyI => {
            params.interpolation = params.interpolation.toggled();
            log::info!("probe interpolation {:?}", params.interpolation);
        }
        _ => {}
    }
    KeyAction::None
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use volprobe_core::ProbeInterpolation;

    const BOUND_KEYS: [KeyCode; 8] = [
        KeyCode::BracketLeft,
        KeyCode::BracketRight,
        KeyCode::Minus,
        KeyCode::Equal,
        KeyCode::KeyP,
        KeyCode::KeyI,
        KeyCode::KeyZ,
        KeyCode::Space,
    ];

    fn key() -> impl Strategy<Value = KeyCode> {
        prop::sample::select(BOUND_KEYS.to_vec())
    }

    #[test]
    fn test_absorption_never_negative() {
        let mut params = RaymarchParams {
            absorption: 0.2,
            ..RaymarchParams::default()
        };
        apply_key_press(&mut params, KeyCode::BracketLeft);
        assert_eq!(params.absorption, 0.0);
        apply_key_press(&mut params, KeyCode::BracketRight);
        assert_eq!(params.absorption, ABSORPTION_STEP);
    }

    #[test]
    fn test_toggles() {
        let mut params = RaymarchParams::default();
        let probes = params.use_probes;
        apply_key_press(&mut params, KeyCode::KeyP);
        assert_eq!(params.use_probes, !probes);
        apply_key_press(&mut params, KeyCode::KeyI);
        assert_eq!(params.interpolation, ProbeInterpolation::Nearest);
    }

    #[test]
    fn test_actions() {
        let mut params = RaymarchParams::default();
        assert_eq!(apply_key_press(&mut params, KeyCode::Escape), KeyAction::Quit);
        assert_eq!(apply_key_press(&mut params, KeyCode::F12), KeyAction::Screenshot);
        assert_eq!(apply_key_press(&mut params, KeyCode::KeyZ), KeyAction::None);
        assert_eq!(params, RaymarchParams::default());
    }

    #[test]
    fn test_held_keys() {
        let keys: HashSet<KeyCode> = [KeyCode::KeyW, KeyCode::KeyQ, KeyCode::PageUp]
            .into_iter()
            .collect();
        let movements: Vec<Movement> = held_movements(&keys).collect();
        assert_eq!(movements, vec![Movement::Forward, Movement::Up]);
        assert_eq!(light_delta(&keys, 0.5), Vec3::new(0.0, 0.5, 0.0));
    }

    proptest! {
        #[test]
        fn coefficients_stay_non_negative(
            absorption in 0.0f32..3.0,
            density_scale in 0.0f32..2.0,
            presses in prop::collection::vec(key(), 0..64),
        ) {
            let mut params = RaymarchParams {
                absorption,
                density_scale,
                ..RaymarchParams::default()
            };
            for code in presses {
                prop_assert_eq!(apply_key_press(&mut params, code), KeyAction::None);
                prop_assert!(params.absorption >= 0.0);
                prop_assert!(params.density_scale >= 0.0);
            }
        }

        #[test]
        fn toggles_track_press_parity(presses in prop::collection::vec(key(), 0..64)) {
            let mut params = RaymarchParams::default();
            for code in &presses {
                apply_key_press(&mut params, *code);
            }
            let probe_presses = presses.iter().filter(|k| **k == KeyCode::KeyP).count();
            let lookup_presses = presses.iter().filter(|k| **k == KeyCode::KeyI).count();
            prop_assert_eq!(params.use_probes, probe_presses % 2 == 0);
            let expected = if lookup_presses % 2 == 0 {
                ProbeInterpolation::Trilinear
            } else {
                ProbeInterpolation::Nearest
            };
            prop_assert_eq!(params.interpolation, expected);
            prop_assert_eq!(params.light_pos, RaymarchParams::default().light_pos);
        }

        #[test]
        fn light_moves_at_constant_speed(dt in 0.0f32..1.0, horizontal in any::<bool>()) {
            let key = if horizontal { KeyCode::ArrowRight } else { KeyCode::PageDown };
            let keys: HashSet<KeyCode> = std::iter::once(key).collect();
            let delta = light_delta(&keys, dt);
            prop_assert!((delta.length() - LIGHT_SPEED * dt).abs() < 1e-6);
        }
    }
}
