//! Per-frame input handed to the render core.

use glam::{Mat4, Vec3};

use crate::error::{Result, VolumeError};
use crate::params::RaymarchParams;

/// The two matrices a camera rig contributes to a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraMatrices {
    /// World to view transform.
    pub view: Mat4,
    /// View to clip transform (wgpu depth range `[0, 1]`).
    pub proj: Mat4,
}

impl CameraMatrices {
    /// `look_at(position, position + front, up)` with a right-handed perspective.
    #[must_use]
    pub fn look_from(
        position: Vec3,
        front: Vec3,
        up: Vec3,
        fov_y: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Self {
        Self {
            view: Mat4::look_at_rh(position, position + front, up),
            proj: Mat4::perspective_rh(fov_y, aspect, near, far),
        }
    }
}

/// Everything the render core needs to draw one frame.
///
/// The application loop builds a fresh value each frame; the core keeps no
/// camera or input state of its own.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInput {
    /// Camera matrices.
    pub camera: CameraMatrices,
    /// Cube local to world transform.
    pub world: Mat4,
    /// Raymarch parameters.
    pub params: RaymarchParams,
}

impl FrameInput {
    /// Creates a frame with the cube at the origin.
    #[must_use]
    pub fn new(camera: CameraMatrices, params: RaymarchParams) -> Self {
        Self {
            camera,
            world: Mat4::IDENTITY,
            params,
        }
    }

    /// Fails with [`VolumeError::EmptyFrame`] when either output axis is zero.
    pub fn check_size(&self) -> Result<()> {
        let (width, height) = (self.params.width, self.params.height);
        if width == 0 || height == 0 {
            return Err(VolumeError::EmptyFrame { width, height });
        }
        Ok(())
    }

    /// Clip-from-local transform for the cube.
    #[must_use]
    pub fn local_to_clip(&self) -> Mat4 {
        self.camera.proj * self.camera.view * self.world
    }

    /// Inverse of the world transform.
    #[must_use]
    pub fn inv_world(&self) -> Mat4 {
        self.world.inverse()
    }

    /// Camera position in world space.
    #[must_use]
    pub fn camera_world(&self) -> Vec3 {
        self.camera.view.inverse().w_axis.truncate()
    }

    /// Camera position in cube-local space.
    #[must_use]
    pub fn camera_local(&self) -> Vec3 {
        self.inv_world().transform_point3(self.camera_world())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_position_recovered_from_view() {
        let camera = CameraMatrices::look_from(
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::NEG_Z,
            Vec3::Y,
            1.0,
            1.0,
            0.1,
            10.0,
        );
        let mut frame = FrameInput::new(camera, RaymarchParams::default());
        assert!((frame.camera_world() - Vec3::new(1.0, 2.0, 3.0)).length() < 1e-5);

        frame.world = Mat4::from_scale(Vec3::splat(2.0));
        assert!((frame.camera_local() - Vec3::new(0.5, 1.0, 1.5)).length() < 1e-5);
    }

    #[test]
    fn test_check_size_rejects_empty_axis() {
        let camera = CameraMatrices::look_from(Vec3::Z, Vec3::NEG_Z, Vec3::Y, 1.0, 1.0, 0.1, 10.0);
        let mut frame = FrameInput::new(camera, RaymarchParams::default().with_size(4, 3));
        assert!(frame.check_size().is_ok());

        frame.params.height = 0;
        assert!(matches!(
            frame.check_size(),
            Err(VolumeError::EmptyFrame { width: 4, height: 0 })
        ));
    }
}
