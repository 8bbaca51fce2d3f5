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

//! Infinite planes in Hessian normal form.

use serde::{Deserialize, Serialize};

use super::{Vec3, Vec4};

/// A plane holding every point `x` with `dot(normal, x) + d == 0`.
///
/// `normal` is expected to be unit length. Points on the side the normal
/// points to have a positive signed distance.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Plane {
    /// Unit normal of the plane.
    pub normal: Vec3,
    /// Signed offset of the plane from the origin along `-normal`.
    pub d: f32,
}

impl Plane {
    /// Creates a plane from a normal and an offset. The normal is normalized.
    #[inline]
    pub fn new(normal: Vec3, d: f32) -> Self {
        Self {
            normal: normal.normalize(),
            d,
        }
    }

    /// Creates the plane through `point` facing `normal`.
    #[inline]
    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        let n = normal.normalize();
        Self {
            normal: n,
            d: -n.dot(point),
        }
    }

    /// Signed distance of `point` from the plane.
    #[inline]
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.d
    }

    /// Packs the plane as `(nx, ny, nz, d)`, the layout clip-plane math expects.
    #[inline]
    pub fn to_vec4(&self) -> Vec4 {
        Vec4::from_vec3(self.normal, self.d)
    }
}
