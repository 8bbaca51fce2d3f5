// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Reflection mathematics: the mirror transform, the camera-space clip plane
//! and oblique near-plane clipping.

use serde::{Deserialize, Serialize};
use specula_core::math::{sign_or_zero, EulerAngles, Mat4, Quaternion, Vec3, Vec4, EPSILON};

/// Clip-space depth convention of a projection matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DepthRange {
    /// Near maps to 0, far to 1 (Vulkan, Metal, WebGPU, D3D).
    #[default]
    ZeroToOne,
    /// Near maps to -1, far to 1 (OpenGL).
    NegativeOneToOne,
}

/// Builds the matrix reflecting points across `dot(n, x) + d = 0`, with
/// `d = -dot(n, plane_pos) - offset`.
///
/// `normal` must be unit length. The result is its own inverse.
pub fn reflection_matrix(normal: Vec3, plane_pos: Vec3, offset: f32) -> Mat4 {
    let n = normal;
    let d = -n.dot(plane_pos) - offset;

    Mat4::from_cols(
        Vec4::new(
            1.0 - 2.0 * n.x * n.x,
            -2.0 * n.y * n.x,
            -2.0 * n.z * n.x,
            0.0,
        ),
        Vec4::new(
            -2.0 * n.x * n.y,
            1.0 - 2.0 * n.y * n.y,
            -2.0 * n.z * n.y,
            0.0,
        ),
        Vec4::new(
            -2.0 * n.x * n.z,
            -2.0 * n.y * n.z,
            1.0 - 2.0 * n.z * n.z,
            0.0,
        ),
        Vec4::new(-2.0 * d * n.x, -2.0 * d * n.y, -2.0 * d * n.z, 1.0),
    )
}

/// Transforms the mirror plane into the space of the camera with world-to-view
/// matrix `view`, packed as `(nx, ny, nz, w)`.
///
/// The plane is pushed `clip_offset` along its normal first. Points on the
/// positive side (`side_sign` = 1) are the ones kept by oblique clipping;
/// `side_sign` = -1 keeps the other half-space.
pub fn camera_space_plane(
    view: &Mat4,
    plane_pos: Vec3,
    normal: Vec3,
    side_sign: f32,
    clip_offset: f32,
) -> Vec4 {
    let offset_pos = plane_pos + normal * clip_offset;
    let cpos = view.transform_point3(offset_pos);
    let cnormal = view.transform_vector3(normal).normalize() * side_sign;
    Vec4::from_vec3(cnormal, -cpos.dot(cnormal))
}

/// Replaces the near plane of a [0, 1] depth projection with `clip_plane`.
///
/// See [`oblique_projection_with_depth`].
pub fn oblique_projection(base: &Mat4, clip_plane: Vec4) -> Mat4 {
    oblique_projection_with_depth(base, clip_plane, DepthRange::ZeroToOne)
}

/// Replaces the near plane of `base` with the view-space plane `clip_plane`,
/// keeping the far plane as close as possible to the original frustum.
///
/// Falls back to `base` when the plane is degenerate for this projection
/// (the clip corner lies on it) or when `base` cannot be inverted.
pub fn oblique_projection_with_depth(base: &Mat4, clip_plane: Vec4, depth: DepthRange) -> Mat4 {
    let Some(inverse) = base.inverse() else {
        log::warn!("ReflectionMath: projection is not invertible, skipping oblique clipping");
        return *base;
    };

    // Frustum corner opposite the clip plane, in view space.
    let q = inverse
        * Vec4::new(
            sign_or_zero(clip_plane.x),
            sign_or_zero(clip_plane.y),
            1.0,
            1.0,
        );

    let denom = clip_plane.dot(q);
    if denom.abs() < EPSILON || !denom.is_finite() {
        log::trace!("ReflectionMath: degenerate clip plane, keeping the base projection");
        return *base;
    }

    let mut projection = *base;
    match depth {
        DepthRange::ZeroToOne => {
            projection.set_row(2, clip_plane * (1.0 / denom));
        }
        DepthRange::NegativeOneToOne => {
            let scaled = clip_plane * (2.0 / denom);
            projection.set_row(2, scaled - base.get_row(3));
        }
    }

    if projection.is_finite() {
        projection
    } else {
        *base
    }
}

/// Orientation of a helper camera mirroring a camera with `rotation`: the
/// Y-X-Z euler angles with pitch and roll negated.
///
/// This is only exact for mirrors whose normal is the world up axis; the view
/// matrix, not this orientation, drives what is rendered.
pub fn mirror_orientation(rotation: Quaternion) -> Quaternion {
    let euler = rotation.to_euler();
    Quaternion::from_euler(mirrored_euler(euler))
}

/// `(pitch, yaw, roll)` to `(-pitch, yaw, -roll)`.
pub fn mirrored_euler(euler: EulerAngles) -> EulerAngles {
    EulerAngles::new(-euler.pitch, euler.yaw, -euler.roll)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use specula_core::math::{FRAC_PI_4, PI};

    fn sample_points() -> [Vec3; 4] {
        [
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(-4.0, 0.5, 7.5),
            Vec3::new(0.0, -3.0, 0.0),
            Vec3::new(10.0, 10.0, -10.0),
        ]
    }

    fn tilted_normal() -> Vec3 {
        Vec3::new(0.3, 0.9, -0.2).normalize()
    }

    #[test]
    fn reflection_is_an_involution() {
        let m = reflection_matrix(tilted_normal(), Vec3::new(1.0, -2.0, 0.5), 0.1);
        assert_abs_diff_eq!(m * m, Mat4::IDENTITY, epsilon = 1e-5);
        for p in sample_points() {
            assert_abs_diff_eq!(m.transform_point3(m.transform_point3(p)), p, epsilon = 1e-4);
        }
    }

    #[test]
    fn midpoint_lies_on_plane_and_displacement_is_normal() {
        let n = tilted_normal();
        let pos = Vec3::new(1.0, -2.0, 0.5);
        let m = reflection_matrix(n, pos, 0.0);

        for p in sample_points() {
            let r = m.transform_point3(p);
            let midpoint = (p + r) * 0.5;
            assert_abs_diff_eq!(n.dot(midpoint - pos), 0.0, epsilon = 1e-4);

            let displacement = r - p;
            assert_abs_diff_eq!(displacement.cross(n), Vec3::ZERO, epsilon = 1e-4);
        }
    }

    #[test]
    fn offset_moves_the_plane_along_the_normal() {
        let m = reflection_matrix(Vec3::Y, Vec3::ZERO, 0.5);
        // d = -0.5, the plane sits at y = 0.5.
        assert_abs_diff_eq!(
            m.transform_point3(Vec3::new(0.0, 0.5, 0.0)),
            Vec3::new(0.0, 0.5, 0.0)
        );
        assert_abs_diff_eq!(m.transform_point3(Vec3::ZERO), Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn reflection_flips_handedness() {
        let m = reflection_matrix(tilted_normal(), Vec3::ZERO, 0.0);
        assert!(m.determinant3() < 0.0);
        // Directions ignore the translation term.
        assert_abs_diff_eq!(m.transform_vector3(tilted_normal()), -tilted_normal());
    }

    #[test]
    fn camera_space_plane_keeps_the_front_side() {
        let view = Mat4::look_at_rh(Vec3::new(0.0, 3.0, 6.0), Vec3::ZERO, Vec3::Y)
            .expect("valid camera");
        let plane = camera_space_plane(&view, Vec3::ZERO, Vec3::Y, 1.0, 0.0);

        let above = view.transform_point3(Vec3::new(0.5, 1.0, -1.0));
        let below = view.transform_point3(Vec3::new(0.5, -1.0, -1.0));
        assert!(plane.dot(Vec4::from_vec3(above, 1.0)) > 0.0);
        assert!(plane.dot(Vec4::from_vec3(below, 1.0)) < 0.0);

        let flipped = camera_space_plane(&view, Vec3::ZERO, Vec3::Y, -1.0, 0.0);
        assert_abs_diff_eq!(flipped, -plane, epsilon = 1e-5);
    }

    #[test]
    fn camera_space_plane_applies_clip_offset() {
        let plane = camera_space_plane(&Mat4::IDENTITY, Vec3::ZERO, Vec3::Y, 1.0, 0.25);
        assert_abs_diff_eq!(plane, Vec4::new(0.0, 1.0, 0.0, -0.25));
    }

    #[test]
    fn near_plane_leaves_zo_projection_unchanged() {
        let (near, far) = (0.3, 500.0);
        let p = Mat4::perspective_rh_zo(FRAC_PI_4, 16.0 / 9.0, near, far);
        let near_plane = Vec4::new(0.0, 0.0, -1.0, -near);
        assert_abs_diff_eq!(oblique_projection(&p, near_plane), p, epsilon = 1e-4);
    }

    #[test]
    fn near_plane_leaves_gl_projection_unchanged() {
        let (near, far) = (0.3, 500.0);
        let p = Mat4::perspective_rh_no(FRAC_PI_4, 1.5, near, far);
        let near_plane = Vec4::new(0.0, 0.0, -1.0, -near);
        let result = oblique_projection_with_depth(&p, near_plane, DepthRange::NegativeOneToOne);
        assert_abs_diff_eq!(result, p, epsilon = 1e-3);
    }

    #[test]
    fn oblique_near_plane_sits_on_the_clip_plane() {
        let p = Mat4::perspective_rh_zo(PI / 3.0, 1.0, 0.1, 100.0);
        // A plane tilted towards the camera, crossing the view axis at z = -5.
        let normal = Vec3::new(0.0, 0.6, -0.8);
        let point = Vec3::new(0.0, 0.0, -5.0);
        let plane = Vec4::from_vec3(normal, -normal.dot(point));

        let oblique = oblique_projection(&p, plane);

        let on_plane = oblique * Vec4::from_vec3(point, 1.0);
        assert_abs_diff_eq!(on_plane.z / on_plane.w, 0.0, epsilon = 1e-4);

        // Kept side lands inside the depth range, clipped side in front of it.
        let kept = oblique * Vec4::new(0.0, 0.0, -10.0, 1.0);
        let clipped = oblique * Vec4::new(0.0, 0.0, -2.0, 1.0);
        assert!(kept.z / kept.w > 0.0 && kept.z / kept.w <= 1.0);
        assert!(clipped.z / clipped.w < 0.0);

        // x, y and w rows are untouched.
        for row in [0, 1, 3] {
            assert_eq!(oblique.get_row(row), p.get_row(row));
        }
    }

    #[test]
    fn degenerate_inputs_fall_back_to_base() {
        let p = Mat4::perspective_rh_zo(PI / 3.0, 1.0, 0.1, 100.0);
        assert_eq!(oblique_projection(&p, Vec4::ZERO), p);
        assert_eq!(oblique_projection(&Mat4::ZERO, Vec4::new(0.0, 0.0, -1.0, -1.0)), Mat4::ZERO);

        let nan_plane = Vec4::new(f32::NAN, 0.0, -1.0, -1.0);
        assert_eq!(oblique_projection(&p, nan_plane), p);
    }

    #[test]
    fn mirror_orientation_negates_pitch_and_roll() {
        let rotation = Quaternion::from_euler(EulerAngles::new(0.4, 1.1, 0.2));
        let mirrored = mirror_orientation(rotation).to_euler();
        assert_abs_diff_eq!(mirrored.pitch, -0.4, epsilon = 1e-4);
        assert_abs_diff_eq!(mirrored.yaw, 1.1, epsilon = 1e-4);
        assert_abs_diff_eq!(mirrored.roll, -0.2, epsilon = 1e-4);
    }

    #[test]
    fn mirrored_view_sees_reflected_points_where_the_viewer_sees_originals() {
        let view = Mat4::look_at_rh(Vec3::new(2.0, 3.0, 4.0), Vec3::ZERO, Vec3::Y)
            .expect("valid camera");
        let m = reflection_matrix(Vec3::Y, Vec3::ZERO, 0.0);
        let helper_view = view * m;

        for p in sample_points() {
            let reflected = m.transform_point3(p);
            assert_abs_diff_eq!(
                helper_view.transform_point3(reflected),
                view.transform_point3(p),
                epsilon = 1e-4
            );
        }
    }
}
