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

//! Authored configuration of a planar mirror.

use serde::{Deserialize, Serialize};
use specula_core::math::{Extent2D, LinearRgba};
use specula_core::renderer::{LayerMask, MaterialId, SampleCount, TextureFormat};

use crate::error::MirrorError;
use crate::host::ObjectId;

/// Default shading slot of the left-eye (or mono) reflection.
pub const DEFAULT_LEFT_SLOT: &str = "_ReflectionTex0";
/// Default shading slot of the right-eye (or mono) reflection.
pub const DEFAULT_RIGHT_SLOT: &str = "_ReflectionTex1";

/// Which transform defines the mirror plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaneSource {
    /// The transform of the object owning the mirror.
    #[default]
    SelfTransform,
    /// The transform of another scene object.
    Object(ObjectId),
}

/// Which local axis of the plane transform is the mirror normal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NormalAxis {
    /// Local `+Z`.
    Forward,
    /// Local `+Y`.
    #[default]
    Up,
    /// Local `+X`.
    Right,
    /// Position from the mirror itself, normal from the plane source's `+Z`.
    CustomForward,
}

/// How the reflection target is cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClearMode {
    /// Copy clear flags, background and skybox from the viewer.
    #[default]
    FromReferenceCamera,
    /// Skybox override if set, else the viewer's skybox.
    Skybox,
    /// Clear to [`MirrorConfig::background`].
    SolidColor,
    /// Clear depth only.
    DepthOnly,
    /// Clear nothing.
    Nothing,
}

/// Settings authored on the mirror. Read-only while rendering.
///
/// Every field has a default, so partial RON documents are accepted:
///
/// ```
/// use specula_reflection::MirrorConfig;
///
/// let config = MirrorConfig::from_ron_str("(resolution_scale: 0.5, per_eye_stereo: false)").unwrap();
/// assert_eq!(config.resolution_scale, 0.5);
/// assert!(!config.per_eye_stereo);
/// assert_eq!(config.left_slot, "_ReflectionTex0");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    /// Whether the mirror starts enabled.
    pub enabled: bool,
    /// Transform the plane is taken from.
    pub plane_source: PlaneSource,
    /// Local axis used as the plane normal.
    pub normal_axis: NormalAxis,
    /// Distance the plane is pushed along its normal, off the visual surface.
    pub plane_offset: f32,
    /// Target size relative to the viewport.
    pub resolution_scale: f32,
    /// Fixed target size. Used instead of the scale when both dimensions are non-zero.
    pub fixed_resolution: Extent2D,
    /// Samples per pixel of the targets.
    pub msaa: SampleCount,
    /// Layers rendered into the reflection.
    pub visibility_mask: LayerMask,
    /// Whether shadows are rendered into the reflection.
    pub render_shadows: bool,
    /// How the target is cleared.
    pub clear_mode: ClearMode,
    /// Clear color for [`ClearMode::SolidColor`].
    pub background: LinearRgba,
    /// Skybox used by [`ClearMode::Skybox`] instead of the viewer's.
    pub skybox_override: Option<MaterialId>,
    /// Render one image per eye for stereo viewers.
    pub per_eye_stereo: bool,
    /// Force a single image shared by both eyes.
    pub shared_texture_for_both_eyes: bool,
    /// Extra distance between the plane and the oblique near plane.
    pub clip_plane_offset: f32,
    /// Per-pixel light budget while rendering the reflection.
    pub pixel_light_override: Option<i32>,
    /// Pixel format of the targets.
    pub color_format: TextureFormat,
    /// Shading slot receiving the left-eye (or mono) texture. Empty disables it.
    pub left_slot: String,
    /// Shading slot receiving the right-eye (or mono) texture. Empty disables it.
    pub right_slot: String,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            plane_source: PlaneSource::SelfTransform,
            normal_axis: NormalAxis::Up,
            plane_offset: 0.0,
            resolution_scale: 1.0,
            fixed_resolution: Extent2D::new(0, 0),
            msaa: SampleCount::X1,
            visibility_mask: LayerMask::ALL.without(LayerMask::HELPER_CAMERA),
            render_shadows: true,
            clear_mode: ClearMode::FromReferenceCamera,
            background: LinearRgba::BLACK,
            skybox_override: None,
            per_eye_stereo: true,
            shared_texture_for_both_eyes: false,
            clip_plane_offset: 0.07,
            pixel_light_override: None,
            color_format: TextureFormat::Rgba8UnormSrgb,
            left_slot: DEFAULT_LEFT_SLOT.to_owned(),
            right_slot: DEFAULT_RIGHT_SLOT.to_owned(),
        }
    }
}

impl MirrorConfig {
    /// Parses a RON document and validates it.
    pub fn from_ron_str(source: &str) -> Result<Self, MirrorError> {
        let mut config: MirrorConfig = ron::de::from_str(source)?;
        config.validate();
        Ok(config)
    }

    /// Writes the configuration as pretty-printed RON.
    pub fn to_ron_string(&self) -> Result<String, MirrorError> {
        let pretty_config = ron::ser::PrettyConfig::default().indentor("  ".to_string());
        Ok(ron::ser::to_string_pretty(self, pretty_config)?)
    }

    /// Clamps out-of-range values, logging each correction.
    ///
    /// Returns `true` if anything was changed.
    pub fn validate(&mut self) -> bool {
        let mut changed = false;

        if !(self.resolution_scale.is_finite() && self.resolution_scale > 0.0) {
            log::warn!(
                "MirrorConfig: resolution_scale {} is not positive, using 1.0",
                self.resolution_scale
            );
            self.resolution_scale = 1.0;
            changed = true;
        }
        if !self.plane_offset.is_finite() {
            log::warn!("MirrorConfig: plane_offset is not finite, using 0.0");
            self.plane_offset = 0.0;
            changed = true;
        }
        if !self.clip_plane_offset.is_finite() {
            log::warn!("MirrorConfig: clip_plane_offset is not finite, using 0.0");
            self.clip_plane_offset = 0.0;
            changed = true;
        }
        if let Some(count) = self.pixel_light_override {
            if count < 0 {
                log::warn!(
                    "MirrorConfig: pixel_light_override {} is negative, disabling the override",
                    count
                );
                self.pixel_light_override = None;
                changed = true;
            }
        }
        if self.visibility_mask.contains(LayerMask::HELPER_CAMERA) {
            log::debug!("MirrorConfig: removing the helper camera layer from visibility_mask");
            self.visibility_mask = self.visibility_mask.without(LayerMask::HELPER_CAMERA);
            changed = true;
        }

        changed
    }

    /// Size of a render target for a viewport of size `screen`.
    ///
    /// The fixed resolution wins when both of its dimensions are non-zero.
    /// Otherwise the viewport is scaled and rounded, at least one pixel per axis.
    pub fn target_extent(&self, screen: Extent2D) -> Extent2D {
        if self.fixed_resolution.width > 0 && self.fixed_resolution.height > 0 {
            self.fixed_resolution
        } else {
            screen.scaled(self.resolution_scale)
        }
    }

    /// `true` if a viewer with `is_stereo` gets one target per eye.
    pub fn renders_per_eye(&self, is_stereo: bool) -> bool {
        is_stereo && self.per_eye_stereo && !self.shared_texture_for_both_eyes
    }
}
