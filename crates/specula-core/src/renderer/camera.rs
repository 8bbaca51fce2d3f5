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

//! Camera description shared between scene viewers and hidden helper cameras.

use serde::{Deserialize, Serialize};

use crate::math::{EulerAngles, LinearRgba, Mat4, Quaternion, Vec3};
use crate::renderer::MaterialId;

/// Defines the type of camera projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ProjectionType {
    /// Perspective projection with field of view.
    Perspective {
        /// The vertical field of view in radians.
        fov_y_radians: f32,
    },
    /// Orthographic projection with view bounds.
    Orthographic {
        /// The width of the orthographic view volume.
        width: f32,
        /// The height of the orthographic view volume.
        height: f32,
    },
}

/// What a camera clears its target with before drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ClearFlags {
    /// Draw the skybox material behind the scene.
    #[default]
    Skybox,
    /// Clear color to the camera's background.
    SolidColor,
    /// Clear depth only; previous color content is kept.
    DepthOnly,
    /// Clear nothing.
    Nothing,
}

/// A 32-bit mask of scene layers a camera renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerMask {
    bits: u32,
}

impl LayerMask {
    /// No layers.
    pub const NONE: Self = Self { bits: 0 };
    /// Every layer.
    pub const ALL: Self = Self { bits: u32::MAX };
    /// Layer reserved for hidden helper cameras. Never rendered by them.
    pub const HELPER_CAMERA: Self = Self { bits: 1 << 31 };

    /// Creates a mask from raw bits.
    pub const fn from_bits(bits: u32) -> Self {
        Self { bits }
    }

    /// Creates a mask holding a single layer. `layer` must be below 32.
    pub const fn layer(layer: u32) -> Self {
        Self { bits: 1 << layer }
    }

    /// Returns the raw bits.
    pub const fn bits(&self) -> u32 {
        self.bits
    }

    /// Combines two masks.
    pub const fn union(self, other: Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    /// Removes every layer of `other` from this mask.
    pub const fn without(self, other: Self) -> Self {
        Self {
            bits: self.bits & !other.bits,
        }
    }

    /// Checks whether every layer of `other` is in this mask.
    pub const fn contains(&self, other: Self) -> bool {
        (self.bits & other.bits) == other.bits
    }

    /// Checks if the mask holds no layer.
    pub const fn is_empty(&self) -> bool {
        self.bits == 0
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        Self::ALL
    }
}

impl std::ops::BitOr for LayerMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

/// A camera's projection and presentation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// The type of projection (perspective or orthographic).
    pub projection: ProjectionType,
    /// The aspect ratio of the viewport (width / height).
    pub aspect_ratio: f32,
    /// The distance to the near clipping plane.
    pub z_near: f32,
    /// The distance to the far clipping plane.
    pub z_far: f32,
    /// Whether the host renders this camera on its own every frame.
    pub is_active: bool,
    /// How the target is cleared before drawing.
    pub clear_flags: ClearFlags,
    /// Clear color used by [`ClearFlags::SolidColor`].
    pub background: LinearRgba,
    /// Skybox material used by [`ClearFlags::Skybox`]. `None` uses the scene's.
    pub skybox: Option<MaterialId>,
    /// Layers this camera renders.
    pub culling_mask: LayerMask,
    /// Whether occlusion culling is enabled.
    pub occlusion_culling: bool,
    /// Whether the camera renders into an HDR target.
    pub hdr: bool,
}

impl Camera {
    /// Creates a new perspective camera with the given parameters.
    pub fn new_perspective(fov_y_radians: f32, aspect_ratio: f32, z_near: f32, z_far: f32) -> Self {
        Self {
            projection: ProjectionType::Perspective { fov_y_radians },
            aspect_ratio,
            z_near,
            z_far,
            is_active: true,
            clear_flags: ClearFlags::default(),
            background: LinearRgba::BLACK,
            skybox: None,
            culling_mask: LayerMask::ALL,
            occlusion_culling: true,
            hdr: false,
        }
    }

    /// Creates a new orthographic camera with the given parameters.
    pub fn new_orthographic(width: f32, height: f32, z_near: f32, z_far: f32) -> Self {
        let aspect_ratio = if height > 0.0 { width / height } else { 1.0 };
        Self {
            projection: ProjectionType::Orthographic { width, height },
            ..Self::new_perspective(0.0, aspect_ratio, z_near, z_far)
        }
    }

    /// Creates a default perspective camera: 60° vertical FOV, 16:9, near 0.1, far 1000.
    pub fn default_perspective() -> Self {
        Self::new_perspective(60.0_f32.to_radians(), 16.0 / 9.0, 0.1, 1000.0)
    }

    /// Returns `true` for orthographic cameras.
    pub fn is_orthographic(&self) -> bool {
        matches!(self.projection, ProjectionType::Orthographic { .. })
    }

    /// Calculates the projection matrix for this camera.
    ///
    /// This uses a right-handed coordinate system with a [0, 1] depth range.
    pub fn projection_matrix(&self) -> Mat4 {
        match self.projection {
            ProjectionType::Perspective { fov_y_radians } => {
                Mat4::perspective_rh_zo(fov_y_radians, self.aspect_ratio, self.z_near, self.z_far)
            }
            ProjectionType::Orthographic { width, height } => {
                let half_width = width / 2.0;
                let half_height = height / 2.0;
                Mat4::orthographic_rh_zo(
                    -half_width,
                    half_width,
                    -half_height,
                    half_height,
                    self.z_near,
                    self.z_far,
                )
            }
        }
    }

    /// Updates the aspect ratio from a viewport size. Zero heights are ignored.
    pub fn set_aspect_ratio(&mut self, width: u32, height: u32) {
        if height > 0 {
            self.aspect_ratio = width as f32 / height as f32;
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::default_perspective()
    }
}

/// A camera fully resolved for a single render pass.
///
/// `view` and `projection` are authoritative. They may differ from what
/// `camera` and `rotation` would produce (a mirrored view, an oblique
/// projection) and the host must use them as given.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderView {
    /// Presentation parameters: clear mode, culling mask, quality toggles.
    pub camera: Camera,
    /// World-to-view matrix.
    pub view: Mat4,
    /// View-to-clip matrix.
    pub projection: Mat4,
    /// World-space position of the camera.
    pub position: Vec3,
    /// World-space orientation of the camera.
    pub rotation: Quaternion,
    /// `rotation` as Y-X-Z euler angles.
    pub euler: EulerAngles,
}
