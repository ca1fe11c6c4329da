//! Screen-space entry/exit bounds of the volume cube.
//!
//! The GPU renders the unit cube twice, once culling back faces and once
//! culling front faces, writing cube-local positions into two float targets.
//! [`BoundsBuffers::capture`] produces the same two images on the CPU by
//! intersecting each pixel's view ray with the cube.

use glam::{Vec2, Vec3, Vec4, Vec4Swizzles};
use rayon::prelude::*;

use crate::frame::FrameInput;

/// Half the side length of the volume cube in local space.
pub const CUBE_HALF_EXTENT: f32 = 0.5;

/// Face frames `(normal, u, v)` with `u x v = normal`.
const CUBE_FACES: [(Vec3, Vec3, Vec3); 6] = [
    (Vec3::X, Vec3::Y, Vec3::Z),
    (Vec3::NEG_X, Vec3::Z, Vec3::Y),
    (Vec3::Y, Vec3::Z, Vec3::X),
    (Vec3::NEG_Y, Vec3::X, Vec3::Z),
    (Vec3::Z, Vec3::X, Vec3::Y),
    (Vec3::NEG_Z, Vec3::Y, Vec3::X),
];

/// Returns the 36 vertices of the unit cube as a triangle list.
///
/// Triangles wind counter-clockwise when seen from outside the cube.
#[must_use]
pub fn unit_cube_triangles() -> Vec<[f32; 3]> {
    let h = CUBE_HALF_EXTENT;
    let mut vertices = Vec::with_capacity(36);
    for (n, u, v) in CUBE_FACES {
        let c = n * h;
        let corners = [
            c - u * h - v * h,
            c + u * h - v * h,
            c + u * h + v * h,
            c - u * h + v * h,
        ];
        for i in [0, 1, 2, 0, 2, 3] {
            vertices.push(corners[i].to_array());
        }
    }
    vertices
}

/// Parametric hits `(t_enter, t_exit)` of `origin + t * dir` with the cube.
#[must_use]
pub fn ray_cube_intersection(origin: Vec3, dir: Vec3) -> Option<(f32, f32)> {
    let h = CUBE_HALF_EXTENT;
    let mut t_enter = f32::NEG_INFINITY;
    let mut t_exit = f32::INFINITY;

    for axis in 0..3 {
        let o = origin[axis];
        let d = dir[axis];
        if d.abs() < 1e-12 {
            if o < -h || o > h {
                return None;
            }
            continue;
        }
        let t0 = (-h - o) / d;
        let t1 = (h - o) / d;
        t_enter = t_enter.max(t0.min(t1));
        t_exit = t_exit.min(t0.max(t1));
    }

    (t_enter <= t_exit).then_some((t_enter, t_exit))
}

/// Resolves the marched segment for one pixel.
///
/// `w > 0` marks a written texel. A covered back surface with a missing
/// front surface means the front face was clipped by the near plane. If the
/// camera is inside the cube the ray starts at the camera; otherwise it
/// starts where the camera-to-exit ray enters the cube.
#[must_use]
pub fn resolve_segment(front: Vec4, back: Vec4, camera_local: Vec3) -> Option<(Vec3, Vec3)> {
    if back.w <= 0.0 {
        return None;
    }
    let exit = back.xyz();
    let entry = if front.w > 0.0 {
        front.xyz()
    } else if camera_local.abs().max_element() <= CUBE_HALF_EXTENT {
        camera_local
    } else {
        let dir = exit - camera_local;
        let t_enter = ray_cube_intersection(camera_local, dir).map_or(0.0, |(t, _)| t);
        camera_local + dir * t_enter.clamp(0.0, 1.0)
    };
    Some((entry, exit))
}

/// Front and back position images for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundsBuffers {
    width: u32,
    height: u32,
    front: Vec<Vec4>,
    back: Vec<Vec4>,
}

impl BoundsBuffers {
    /// Creates cleared buffers.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let count = width as usize * height as usize;
        Self {
            width,
            height,
            front: vec![Vec4::ZERO; count],
            back: vec![Vec4::ZERO; count],
        }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Near-surface positions, row-major from the top-left pixel.
    #[must_use]
    pub fn front(&self) -> &[Vec4] {
        &self.front
    }

    /// Far-surface positions, row-major from the top-left pixel.
    #[must_use]
    pub fn back(&self) -> &[Vec4] {
        &self.back
    }

    /// Returns the `(front, back)` texels of a pixel.
    #[must_use]
    pub fn texel(&self, x: u32, y: u32) -> (Vec4, Vec4) {
        let i = y as usize * self.width as usize + x as usize;
        (self.front[i], self.back[i])
    }

    /// Reallocates for a new output size.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width != self.width || height != self.height {
            *self = Self::new(width, height);
        }
    }

    /// Rasterizes the cube bounds for the frame's camera.
    ///
    /// Texels outside the cube silhouette, and surfaces clipped by the near or
    /// far plane, keep the zero clear value.
    pub fn capture(&mut self, frame: &FrameInput) {
        let clip_to_local = frame.local_to_clip().inverse();
        let size = Vec2::new(self.width as f32, self.height as f32);
        let width = self.width as usize;
        if width == 0 {
            return;
        }

        self.front
            .par_chunks_mut(width)
            .zip(self.back.par_chunks_mut(width))
            .enumerate()
            .for_each(|(y, (front_row, back_row))| {
                for (x, (front, back)) in front_row.iter_mut().zip(back_row).enumerate() {
                    let pixel = Vec2::new(x as f32 + 0.5, y as f32 + 0.5) / size;
                    let ndc = Vec2::new(pixel.x * 2.0 - 1.0, 1.0 - pixel.y * 2.0);
                    let near = clip_to_local.project_point3(ndc.extend(0.0));
                    let far = clip_to_local.project_point3(ndc.extend(1.0));
                    let dir = far - near;

                    *front = Vec4::ZERO;
                    *back = Vec4::ZERO;
                    let Some((t_enter, t_exit)) = ray_cube_intersection(near, dir) else {
                        continue;
                    };
                    if (0.0..=1.0).contains(&t_enter) {
                        *front = (near + dir * t_enter).extend(1.0);
                    }
                    if (0.0..=1.0).contains(&t_exit) {
                        *back = (near + dir * t_exit).extend(1.0);
                    }
                }
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::CameraMatrices;
    use crate::params::RaymarchParams;

    #[test]
    fn test_cube_triangles_face_outward() {
        let vertices = unit_cube_triangles();
        assert_eq!(vertices.len(), 36);
        for tri in vertices.chunks(3) {
            let a = Vec3::from(tri[0]);
            let b = Vec3::from(tri[1]);
            let c = Vec3::from(tri[2]);
            let normal = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(normal.dot(centroid) > 0.0, "triangle winds inward");
        }
    }

    #[test]
    fn test_ray_cube_hits_and_misses() {
        let (t0, t1) = ray_cube_intersection(Vec3::new(0.0, 0.0, 2.0), Vec3::NEG_Z).unwrap();
        assert!((t0 - 1.5).abs() < 1e-6);
        assert!((t1 - 2.5).abs() < 1e-6);
        assert!(ray_cube_intersection(Vec3::new(2.0, 0.0, 2.0), Vec3::NEG_Z).is_none());
    }

    #[test]
    fn test_resolve_segment_uses_camera_inside_cube() {
        let back = Vec4::new(0.0, 0.0, -0.5, 1.0);
        let camera = Vec3::new(0.0, 0.0, 0.1);
        assert_eq!(
            resolve_segment(Vec4::ZERO, back, camera),
            Some((camera, back.xyz()))
        );
        assert_eq!(resolve_segment(Vec4::ZERO, Vec4::ZERO, camera), None);
    }

    #[test]
    fn test_resolve_segment_clips_near_plane_entry_to_cube() {
        // Camera just outside the +Z face, closer than its near plane.
        let back = Vec4::new(0.0, 0.0, -0.5, 1.0);
        let camera = Vec3::new(0.0, 0.0, 0.55);
        let (entry, exit) = resolve_segment(Vec4::ZERO, back, camera).unwrap();
        assert!((entry - Vec3::new(0.0, 0.0, 0.5)).length() < 1e-5);
        assert_eq!(exit, back.xyz());
        assert!(((exit - entry).length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_capture_brackets_cube_along_view_axis() {
        let camera = CameraMatrices::look_from(
            Vec3::new(0.0, 0.0, 3.0),
            Vec3::NEG_Z,
            Vec3::Y,
            0.8,
            1.0,
            0.1,
            10.0,
        );
        let frame = FrameInput::new(camera, RaymarchParams::default());
        let mut bounds = BoundsBuffers::new(33, 33);
        bounds.capture(&frame);

        let (front, back) = bounds.texel(16, 16);
        assert!((front - Vec4::new(0.0, 0.0, 0.5, 1.0)).length() < 1e-3);
        assert!((back - Vec4::new(0.0, 0.0, -0.5, 1.0)).length() < 1e-3);

        let (front, back) = bounds.texel(0, 0);
        assert_eq!(front, Vec4::ZERO);
        assert_eq!(back, Vec4::ZERO);

        // Every covered pixel's segment points away from the camera.
        let view_dir = Vec3::NEG_Z;
        for (f, b) in bounds.front().iter().zip(bounds.back()) {
            if b.w > 0.0 {
                assert!((b.xyz() - f.xyz()).dot(view_dir) >= 0.0);
            }
        }
    }
}
