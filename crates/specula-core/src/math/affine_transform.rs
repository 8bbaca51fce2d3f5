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

//! World transforms of scene objects and viewers.

use serde::{Deserialize, Serialize};

use crate::math::{Mat4, Quaternion, Vec3, Vec4};

/// Represents a 3D affine transformation (translation, rotation, scale).
///
/// This is a semantic wrapper around a `Mat4`. The local axes are read straight
/// from its columns: `+X` is right, `+Y` is up and `+Z` is the object's forward
/// axis. Cameras look down their local `-Z`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(transparent)]
pub struct AffineTransform(pub Mat4);

impl AffineTransform {
    /// The identity transform, which results in no change.
    pub const IDENTITY: Self = Self(Mat4::IDENTITY);

    // --- CONSTRUCTORS ---

    /// Creates an `AffineTransform` from a translation vector.
    ///
    /// # Example
    ///
    /// ```rust
    /// use specula_core::math::{AffineTransform, Vec3};
    ///
    /// let transform = AffineTransform::from_translation(Vec3::new(1.0, 2.0, 3.0));
    /// assert_eq!(transform.translation(), Vec3::new(1.0, 2.0, 3.0));
    /// ```
    #[inline]
    pub fn from_translation(v: Vec3) -> Self {
        Self(Mat4::from_translation(v))
    }

    /// Creates an `AffineTransform` from a quaternion representing a rotation.
    #[inline]
    pub fn from_quat(q: Quaternion) -> Self {
        Self(Mat4::from_quat(q))
    }

    /// Creates a rigid transform: rotate first, then translate.
    #[inline]
    pub fn from_rotation_translation(rotation: Quaternion, translation: Vec3) -> Self {
        let mut m = Mat4::from_quat(rotation);
        m.cols[3] = Vec4::from_vec3(translation, 1.0);
        Self(m)
    }

    // --- SEMANTIC ACCESSORS ---

    /// Returns the underlying `Mat4`.
    #[inline]
    pub fn to_matrix(&self) -> Mat4 {
        self.0
    }

    /// Extracts the translation component.
    #[inline]
    pub fn translation(&self) -> Vec3 {
        self.0.cols[3].truncate()
    }

    /// Returns the local right axis (`+X`) in world space. Not normalized.
    #[inline]
    pub fn right(&self) -> Vec3 {
        self.0.cols[0].truncate()
    }

    /// Returns the local up axis (`+Y`) in world space. Not normalized.
    #[inline]
    pub fn up(&self) -> Vec3 {
        self.0.cols[1].truncate()
    }

    /// Returns the local forward axis (`+Z`) in world space. Not normalized.
    #[inline]
    pub fn forward(&self) -> Vec3 {
        self.0.cols[2].truncate()
    }

    /// Extracts the rotation component, ignoring any scale.
    #[inline]
    pub fn rotation(&self) -> Quaternion {
        let r = self.right().normalize();
        let u = self.up().normalize();
        let f = self.forward().normalize();
        let unscaled = Mat4::from_cols(
            Vec4::from_vec3(r, 0.0),
            Vec4::from_vec3(u, 0.0),
            Vec4::from_vec3(f, 0.0),
            Vec4::W,
        );
        Quaternion::from_rotation_matrix(&unscaled)
    }

    /// Computes the inverse transform. `None` if the transform is singular.
    #[inline]
    pub fn inverse(&self) -> Option<Self> {
        self.0.affine_inverse().map(Self)
    }

    /// Transforms a point from local to world space.
    #[inline]
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        self.0.transform_point3(p)
    }
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<AffineTransform> for Mat4 {
    #[inline]
    fn from(transform: AffineTransform) -> Self {
        transform.0
    }
}
