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

// Mirror Sandbox
// Drives a floor mirror through a few simulated frames without a GPU.
//
// Usage: mirror-sandbox [config.ron]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{Context, Result};
use specula_core::math::{AffineTransform, Extent2D, Mat4, Vec3, FRAC_PI_2};
use specula_core::renderer::{
    Camera, GraphicsDevice, QualitySettings, RenderError, RenderView, ResourceError,
    SamplerDescriptor, SamplerId, ShadingParameters, TextureDescriptor, TextureId,
};
use specula_reflection::{
    CameraHandle, EyeView, MirrorConfig, ObjectId, PlanarMirror, ReflectionHost, StereoViews,
    TargetSlot, Viewer, ViewerId,
};

/// Hands out IDs and remembers which are alive.
#[derive(Debug, Default)]
struct HeadlessDevice {
    next_id: AtomicUsize,
    live: Mutex<HashSet<usize>>,
}

impl HeadlessDevice {
    fn allocate(&self) -> usize {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut live) = self.live.lock() {
            live.insert(id);
        }
        id
    }

    fn free(&self, id: usize) -> Result<(), ResourceError> {
        let mut live = self
            .live
            .lock()
            .map_err(|e| ResourceError::BackendError(e.to_string()))?;
        if live.remove(&id) {
            Ok(())
        } else {
            Err(ResourceError::InvalidHandle)
        }
    }

    fn live_count(&self) -> usize {
        self.live.lock().map(|live| live.len()).unwrap_or(0)
    }
}

impl GraphicsDevice for HeadlessDevice {
    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<TextureId, ResourceError> {
        let id = TextureId(self.allocate());
        log::debug!(
            "HeadlessDevice: created {:?} {:?} {}x{}",
            id,
            descriptor.label,
            descriptor.size.width,
            descriptor.size.height
        );
        Ok(id)
    }

    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError> {
        self.free(id.0)
    }

    fn recreate_texture(
        &self,
        _id: TextureId,
        _descriptor: &TextureDescriptor,
    ) -> Result<(), ResourceError> {
        Ok(())
    }

    fn is_texture_resident(&self, _id: TextureId) -> bool {
        true
    }

    fn create_sampler(&self, _descriptor: &SamplerDescriptor) -> Result<SamplerId, ResourceError> {
        Ok(SamplerId(self.allocate()))
    }

    fn destroy_sampler(&self, id: SamplerId) -> Result<(), ResourceError> {
        self.free(id.0)
    }
}

/// A scene with one floor mirror, a desktop viewer and a headset viewer.
struct SandboxHost {
    device: HeadlessDevice,
    viewers: HashMap<ViewerId, Viewer>,
    output: Extent2D,
    quality: QualitySettings,
    next_camera: u64,
    renders: usize,
}

impl SandboxHost {
    fn new() -> Self {
        Self {
            device: HeadlessDevice::default(),
            viewers: HashMap::new(),
            output: Extent2D::new(1280, 720),
            quality: QualitySettings::default(),
            next_camera: 1,
            renders: 0,
        }
    }

    fn place_desktop_viewer(&mut self, id: ViewerId, angle: f32) -> Result<()> {
        let eye = Vec3::new(5.0 * angle.sin(), 2.0, 5.0 * angle.cos());
        let view = Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y).context("degenerate camera")?;
        let transform = view.affine_inverse().context("camera view is not rigid")?;
        let mut camera = Camera::default_perspective();
        camera.set_aspect_ratio(self.output.width, self.output.height);
        self.viewers.insert(
            id,
            Viewer {
                id,
                transform: AffineTransform(transform),
                camera,
                pixel_size: self.output,
                stereo: None,
            },
        );
        Ok(())
    }

    fn place_headset_viewer(&mut self, id: ViewerId) -> Result<()> {
        let eye = |x: f32| -> Result<EyeView> {
            Ok(EyeView {
                view: Mat4::look_at_rh(Vec3::new(x, 1.7, 2.0), Vec3::new(x, 0.0, 0.0), Vec3::Y)
                    .context("degenerate eye")?,
                projection: Mat4::perspective_rh_zo(FRAC_PI_2, 0.9, 0.05, 100.0),
            })
        };
        let view = Mat4::look_at_rh(Vec3::new(0.0, 1.7, 2.0), Vec3::ZERO, Vec3::Y)
            .context("degenerate headset")?;
        self.viewers.insert(
            id,
            Viewer {
                id,
                transform: AffineTransform(view.affine_inverse().context("headset view")?),
                camera: Camera::default_perspective(),
                pixel_size: Extent2D::new(2880, 1600),
                stereo: Some(StereoViews {
                    left: eye(-0.032)?,
                    right: eye(0.032)?,
                    eye_extent: Extent2D::new(1440, 1600),
                }),
            },
        );
        Ok(())
    }
}

impl ReflectionHost for SandboxHost {
    fn device(&self) -> &dyn GraphicsDevice {
        &self.device
    }

    fn surface_enabled(&self) -> bool {
        true
    }

    fn viewer(&self, id: ViewerId) -> Option<Viewer> {
        self.viewers.get(&id).copied()
    }

    fn mirror_transform(&self) -> AffineTransform {
        AffineTransform::IDENTITY
    }

    fn object_transform(&self, _id: ObjectId) -> Option<AffineTransform> {
        None
    }

    fn output_extent(&self) -> Extent2D {
        self.output
    }

    fn quality(&self) -> QualitySettings {
        self.quality
    }

    fn set_quality(&mut self, settings: QualitySettings) {
        self.quality = settings;
    }

    fn spawn_helper_camera(&mut self, label: &str) -> Option<CameraHandle> {
        let handle = CameraHandle(self.next_camera);
        self.next_camera += 1;
        log::info!("Spawned helper camera '{}' as {:?}", label, handle);
        Some(handle)
    }

    fn despawn_helper_camera(&mut self, handle: CameraHandle) {
        log::info!("Despawned helper camera {:?}", handle);
    }

    fn render_helper_camera(
        &mut self,
        handle: CameraHandle,
        view: &RenderView,
        target: TextureId,
    ) -> Result<(), RenderError> {
        self.renders += 1;
        log::debug!(
            "Rendering {:?} into {:?} from ({:.2}, {:.2}, {:.2}), invert culling: {}",
            handle,
            target,
            view.position.x,
            view.position.y,
            view.position.z,
            self.quality.invert_culling
        );
        Ok(())
    }

    fn apply_shading_parameters(&mut self, parameters: &ShadingParameters) {
        for (name, texture) in parameters.textures() {
            log::debug!("Surface input {} = {:?}", name, texture);
        }
    }
}

fn load_config() -> Result<MirrorConfig> {
    match std::env::args().nth(1) {
        Some(path) => {
            let source = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read mirror config '{path}'"))?;
            let config = MirrorConfig::from_ron_str(&source)
                .with_context(|| format!("Failed to parse mirror config '{path}'"))?;
            log::info!("Loaded mirror config from '{}'", path);
            Ok(config)
        }
        None => Ok(MirrorConfig::default()),
    }
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = load_config()?;
    log::info!("Mirror config:\n{}", config.to_ron_string()?);

    let mut host = SandboxHost::new();
    let desktop = ViewerId(1);
    let headset = ViewerId(2);
    host.place_headset_viewer(headset)?;

    let mirror = PlanarMirror::new(config);

    // Runtime frames: an orbiting desktop viewer and a headset.
    for frame in 0..4 {
        host.place_desktop_viewer(desktop, frame as f32 * 0.2)?;
        for viewer in [desktop, headset] {
            let outcome = mirror.on_will_render(&mut host, viewer);
            log::info!("Frame {}: viewer {:?} -> {:?}", frame, viewer, outcome);
        }
        mirror.on_frame(&mut host);
        log::info!("Frame {}: {:?}", frame, mirror.last_frame_stats());
    }

    // The window grows.
    host.output = Extent2D::new(1920, 1080);
    host.place_desktop_viewer(desktop, 0.0)?;
    mirror.on_frame(&mut host);
    if let Some(mono) = mirror.target(TargetSlot::Mono) {
        log::info!(
            "After resize the shared target is {}x{}",
            mono.extent.width,
            mono.extent.height
        );
    }

    // Editor preview.
    let preview = mirror.on_editor_tick(&mut host, Some(desktop));
    log::info!("Editor preview -> {:?}", preview);

    mirror.disable(&mut host);
    log::info!(
        "Disabled: {} live GPU objects, {} helper cameras",
        host.device.live_count(),
        mirror.helper_camera_count()
    );

    mirror.enable();
    let outcome = mirror.on_will_render(&mut host, headset);
    log::info!("Re-enabled: headset -> {:?}", outcome);

    mirror.destroy(&mut host);
    log::info!(
        "Destroyed after {} helper renders; {} live GPU objects left",
        host.renders,
        host.device.live_count()
    );

    Ok(())
}
