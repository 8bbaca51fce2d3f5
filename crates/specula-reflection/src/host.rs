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

//! The render-hook contract between a mirror and the engine hosting it.
//!
//! The host owns the scene, the rasterizer and the global render state. A
//! [`crate::PlanarMirror`] only talks to it through [`ReflectionHost`]: it
//! reads viewers and transforms, spawns hidden helper cameras, asks for them
//! to be rendered into its own targets, and hands back shading inputs.

use specula_core::math::{AffineTransform, Extent2D, Mat4, Quaternion, Vec3};
use specula_core::renderer::{
    Camera, GraphicsDevice, QualitySettings, RenderError, RenderView, ShadingParameters,
    TextureId,
};

use crate::reflection_math::DepthRange;

/// Identity of a camera or viewpoint that can request a reflection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewerId(pub u64);

/// Identity of a scene object, used to pick an external plane transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ObjectId(pub u64);

/// Host-side handle of a hidden helper camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CameraHandle(pub u64);

/// One eye of a stereo viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Eye {
    /// The left eye.
    Left,
    /// The right eye.
    Right,
}

/// View and projection of a single eye.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeView {
    /// World-to-eye matrix.
    pub view: Mat4,
    /// Eye projection, usually asymmetric.
    pub projection: Mat4,
}

impl EyeView {
    /// World-space position of the eye. Falls back to the origin for a
    /// singular view matrix.
    pub fn position(&self) -> Vec3 {
        self.view
            .affine_inverse()
            .map(|m| m.cols[3].truncate())
            .unwrap_or(Vec3::ZERO)
    }

    /// World-space orientation of the eye. Identity for a singular view matrix.
    pub fn rotation(&self) -> Quaternion {
        self.view
            .affine_inverse()
            .map(|m| AffineTransform(m).rotation())
            .unwrap_or(Quaternion::IDENTITY)
    }
}

/// Per-eye data of a stereo viewer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StereoViews {
    /// The left eye.
    pub left: EyeView,
    /// The right eye.
    pub right: EyeView,
    /// Pixel size of a single eye image.
    pub eye_extent: Extent2D,
}

impl StereoViews {
    /// Returns the requested eye.
    pub fn eye(&self, eye: Eye) -> &EyeView {
        match eye {
            Eye::Left => &self.left,
            Eye::Right => &self.right,
        }
    }
}

/// A snapshot of a camera that is about to see the mirror.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewer {
    /// Identity of the viewer; helper cameras are keyed by it.
    pub id: ViewerId,
    /// World transform of the camera.
    pub transform: AffineTransform,
    /// Projection and presentation parameters.
    pub camera: Camera,
    /// Pixel size of the viewport the camera renders into.
    pub pixel_size: Extent2D,
    /// Per-eye data when the viewer renders in stereo.
    pub stereo: Option<StereoViews>,
}

impl Viewer {
    /// Returns `true` if the viewer renders one image per eye.
    pub fn is_stereo(&self) -> bool {
        self.stereo.is_some()
    }

    /// World-to-view matrix of `eye`, or of the center camera for `None`.
    pub fn view_matrix(&self, eye: Option<Eye>) -> Mat4 {
        match (eye, &self.stereo) {
            (Some(eye), Some(stereo)) => stereo.eye(eye).view,
            _ => self
                .transform
                .inverse()
                .map(Mat4::from)
                .unwrap_or(Mat4::IDENTITY),
        }
    }

    /// Projection matrix of `eye`, or of the center camera for `None`.
    pub fn projection_matrix(&self, eye: Option<Eye>) -> Mat4 {
        match (eye, &self.stereo) {
            (Some(eye), Some(stereo)) => stereo.eye(eye).projection,
            _ => self.camera.projection_matrix(),
        }
    }

    /// World-space position of `eye`, or of the center camera for `None`.
    pub fn position(&self, eye: Option<Eye>) -> Vec3 {
        match (eye, &self.stereo) {
            (Some(eye), Some(stereo)) => stereo.eye(eye).position(),
            _ => self.transform.translation(),
        }
    }

    /// World-space orientation of `eye`, or of the center camera for `None`.
    pub fn rotation(&self, eye: Option<Eye>) -> Quaternion {
        match (eye, &self.stereo) {
            (Some(eye), Some(stereo)) => stereo.eye(eye).rotation(),
            _ => self.transform.rotation(),
        }
    }

    /// Viewport size a reflection for `eye` is sized against.
    pub fn viewport_extent(&self, eye: Option<Eye>) -> Extent2D {
        match (eye, &self.stereo) {
            (Some(_), Some(stereo)) => stereo.eye_extent,
            _ => self.pixel_size,
        }
    }
}

/// Everything a mirror needs from the engine hosting it.
///
/// All calls happen on the render thread, inside the host's own callbacks.
/// A host may call back into the mirror from `render_helper_camera` (e.g. a
/// second mirror seen in the reflection); the mirror ignores such calls.
pub trait ReflectionHost {
    /// The device render targets are created on.
    fn device(&self) -> &dyn GraphicsDevice;

    /// Whether the surface renderer carrying the mirror is enabled.
    fn surface_enabled(&self) -> bool;

    /// Looks up a viewer. `None` if the handle is stale or unknown.
    fn viewer(&self, id: ViewerId) -> Option<Viewer>;

    /// World transform of the object owning the mirror.
    fn mirror_transform(&self) -> AffineTransform;

    /// World transform of another scene object.
    fn object_transform(&self, id: ObjectId) -> Option<AffineTransform>;

    /// Current size of the final output surface.
    fn output_extent(&self) -> Extent2D;

    /// Clip-space depth convention of the projections the host hands out.
    fn depth_range(&self) -> DepthRange {
        DepthRange::ZeroToOne
    }

    /// Current global quality settings.
    fn quality(&self) -> QualitySettings;

    /// Replaces the global quality settings.
    fn set_quality(&mut self, settings: QualitySettings);

    /// Creates a hidden camera that is only rendered on demand.
    fn spawn_helper_camera(&mut self, label: &str) -> Option<CameraHandle>;

    /// Destroys a helper camera.
    fn despawn_helper_camera(&mut self, handle: CameraHandle);

    /// Renders the scene through `view` into `target`, synchronously.
    fn render_helper_camera(
        &mut self,
        handle: CameraHandle,
        view: &RenderView,
        target: TextureId,
    ) -> Result<(), RenderError>;

    /// Applies per-instance shading inputs to the mirror's surface.
    fn apply_shading_parameters(&mut self, parameters: &ShadingParameters);
}
