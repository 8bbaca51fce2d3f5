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

//! Hidden helper cameras: one per viewer, reconfigured before every render.

use ahash::AHashMap;
use specula_core::renderer::{Camera, ClearFlags, LayerMask, RenderView};

use crate::config::{ClearMode, MirrorConfig};
use crate::error::MirrorError;
use crate::host::{CameraHandle, Eye, ReflectionHost, Viewer, ViewerId};
use crate::plane::ReflectionPlane;
use crate::quality::{QualityOverrides, QualityScope};
use crate::reflection_math::{
    camera_space_plane, mirror_orientation, oblique_projection_with_depth, reflection_matrix,
    DepthRange,
};
use crate::targets::RenderTarget;

/// A helper camera owned by a mirror.
#[derive(Debug, Clone, Copy)]
pub struct HelperCamera {
    /// Host handle.
    pub handle: CameraHandle,
    /// What it rendered last, for debugging and tests.
    pub last_view: Option<RenderView>,
}

/// Registry of helper cameras keyed by the viewer they mirror.
#[derive(Debug, Default)]
pub struct HelperCameras {
    cameras: AHashMap<ViewerId, HelperCamera>,
}

impl HelperCameras {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live helper cameras.
    pub fn len(&self) -> usize {
        self.cameras.len()
    }

    /// Returns `true` if no helper camera is alive.
    pub fn is_empty(&self) -> bool {
        self.cameras.is_empty()
    }

    /// The helper camera mirroring `viewer`.
    pub fn get(&self, viewer: ViewerId) -> Option<&HelperCamera> {
        self.cameras.get(&viewer)
    }

    /// Returns the helper camera of `viewer`, spawning it on first use.
    pub fn acquire<H: ReflectionHost + ?Sized>(
        &mut self,
        host: &mut H,
        viewer: ViewerId,
    ) -> Result<CameraHandle, MirrorError> {
        if let Some(existing) = self.cameras.get(&viewer) {
            return Ok(existing.handle);
        }

        let label = format!("Mirror Reflection Camera (viewer {})", viewer.0);
        let handle = host
            .spawn_helper_camera(&label)
            .ok_or(MirrorError::HelperSpawnFailed(viewer))?;
        log::debug!(
            "HelperCameras: spawned {:?} for viewer {:?}",
            handle,
            viewer
        );
        self.cameras.insert(
            viewer,
            HelperCamera {
                handle,
                last_view: None,
            },
        );
        Ok(handle)
    }

    /// Configures the helper camera of `viewer` for `eye` and renders it into
    /// `target` with the quality overrides of `config` in place.
    pub fn render<H: ReflectionHost + ?Sized>(
        &mut self,
        host: &mut H,
        config: &MirrorConfig,
        plane: &ReflectionPlane,
        viewer: &Viewer,
        eye: Option<Eye>,
        target: &RenderTarget,
    ) -> Result<RenderView, MirrorError> {
        let handle = self.acquire(host, viewer.id)?;
        let view = configure_helper_view(config, plane, viewer, eye, host.depth_range());

        {
            let mut scope = QualityScope::apply(host, QualityOverrides::from_config(config));
            scope.render_helper_camera(handle, &view, target.texture)?;
        }

        if let Some(camera) = self.cameras.get_mut(&viewer.id) {
            camera.last_view = Some(view);
        }
        Ok(view)
    }

    /// Despawns every helper camera.
    pub fn release_all<H: ReflectionHost + ?Sized>(&mut self, host: &mut H) {
        for (viewer, camera) in self.cameras.drain() {
            log::debug!(
                "HelperCameras: despawning {:?} of viewer {:?}",
                camera.handle,
                viewer
            );
            host.despawn_helper_camera(camera.handle);
        }
    }
}

/// Builds the full render setup of a helper camera mirroring `viewer` (or one
/// of its eyes) across `plane`.
pub fn configure_helper_view(
    config: &MirrorConfig,
    plane: &ReflectionPlane,
    viewer: &Viewer,
    eye: Option<Eye>,
    depth_range: DepthRange,
) -> RenderView {
    let reflection = reflection_matrix(plane.normal, plane.position, config.clip_plane_offset);

    let view = viewer.view_matrix(eye) * reflection;

    let clip_plane = camera_space_plane(
        &view,
        plane.position,
        plane.normal,
        1.0,
        config.clip_plane_offset,
    );
    let projection =
        oblique_projection_with_depth(&viewer.projection_matrix(eye), clip_plane, depth_range);

    let rotation = mirror_orientation(viewer.rotation(eye));

    RenderView {
        camera: helper_camera_settings(config, &viewer.camera),
        view,
        projection,
        position: reflection.transform_point3(viewer.position(eye)),
        rotation,
        euler: rotation.to_euler(),
    }
}

/// Presentation settings of a helper camera: the viewer's camera with the
/// configured clear mode and visibility mask, never auto-rendered.
pub fn helper_camera_settings(config: &MirrorConfig, source: &Camera) -> Camera {
    let mut camera = *source;
    camera.is_active = false;
    camera.culling_mask = config.visibility_mask.without(LayerMask::HELPER_CAMERA);

    match config.clear_mode {
        ClearMode::FromReferenceCamera => {}
        ClearMode::Skybox => {
            camera.clear_flags = ClearFlags::Skybox;
            camera.skybox = config.skybox_override.or(source.skybox);
        }
        ClearMode::SolidColor => {
            camera.clear_flags = ClearFlags::SolidColor;
            camera.background = config.background;
            camera.skybox = None;
        }
        ClearMode::DepthOnly => {
            camera.clear_flags = ClearFlags::DepthOnly;
            camera.skybox = None;
        }
        ClearMode::Nothing => {
            camera.clear_flags = ClearFlags::Nothing;
            camera.skybox = None;
        }
    }

    camera
}
