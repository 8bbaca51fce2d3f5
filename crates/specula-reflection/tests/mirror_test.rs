use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use specula_core::math::{AffineTransform, Extent2D, Mat4, Quaternion, Vec3, FRAC_PI_2};
use specula_core::renderer::api::*;
use specula_core::renderer::traits::GraphicsDevice;
use specula_core::renderer::{
    Camera, LayerMask, RenderError, RenderView, ResourceError, ShadingParameters,
};
use specula_reflection::{
    CameraHandle, EyeView, MirrorConfig, ObjectId, PlanarMirror, PlaneSource, ReflectionHost,
    RenderOutcome, SkipReason, StereoViews, TargetSlot, Viewer, ViewerId, DEFAULT_LEFT_SLOT,
    DEFAULT_RIGHT_SLOT,
};

#[derive(Debug, Default)]
struct MockGraphicsDevice {
    next_id: AtomicUsize,
    textures_created: AtomicUsize,
    live_textures: Mutex<HashSet<usize>>,
    live_samplers: Mutex<HashSet<usize>>,
}

impl MockGraphicsDevice {
    fn live_textures(&self) -> usize {
        self.live_textures.lock().unwrap().len()
    }

    fn live_samplers(&self) -> usize {
        self.live_samplers.lock().unwrap().len()
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn create_texture(&self, _descriptor: &TextureDescriptor) -> Result<TextureId, ResourceError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.textures_created.fetch_add(1, Ordering::SeqCst);
        self.live_textures.lock().unwrap().insert(id);
        Ok(TextureId(id))
    }

    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError> {
        if self.live_textures.lock().unwrap().remove(&id.0) {
            Ok(())
        } else {
            Err(ResourceError::InvalidHandle)
        }
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
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.live_samplers.lock().unwrap().insert(id);
        Ok(SamplerId(id))
    }

    fn destroy_sampler(&self, id: SamplerId) -> Result<(), ResourceError> {
        self.live_samplers.lock().unwrap().remove(&id.0);
        Ok(())
    }
}

/// A recorded helper camera render.
#[derive(Debug, Clone)]
struct RenderCall {
    camera: CameraHandle,
    view: RenderView,
    target: TextureId,
    quality: QualitySettings,
}

struct MockHost {
    device: MockGraphicsDevice,
    surface_enabled: bool,
    viewers: HashMap<ViewerId, Viewer>,
    mirror_transform: AffineTransform,
    objects: HashMap<ObjectId, AffineTransform>,
    output: Extent2D,
    quality: QualitySettings,
    next_camera: u64,
    live_cameras: HashSet<CameraHandle>,
    renders: Vec<RenderCall>,
    applied: Vec<ShadingParameters>,
    fail_renders: bool,
    // Mirror to notify again from inside a helper render.
    nested: Option<(Rc<PlanarMirror>, ViewerId)>,
    nested_outcomes: Vec<RenderOutcome>,
    // What the mirror reported through its accessors from inside a render.
    nested_reads: Vec<NestedRead>,
}

#[derive(Debug, Clone, PartialEq)]
struct NestedRead {
    enabled: bool,
    config: MirrorConfig,
    helper_cameras: usize,
    mono_target: bool,
    enable_result: bool,
}

impl MockHost {
    fn new() -> Self {
        Self {
            device: MockGraphicsDevice::default(),
            surface_enabled: true,
            viewers: HashMap::new(),
            // A floor mirror at the origin.
            mirror_transform: AffineTransform::IDENTITY,
            objects: HashMap::new(),
            output: Extent2D::new(1280, 720),
            quality: QualitySettings::default(),
            next_camera: 100,
            live_cameras: HashSet::new(),
            renders: Vec::new(),
            applied: Vec::new(),
            fail_renders: false,
            nested: None,
            nested_outcomes: Vec::new(),
            nested_reads: Vec::new(),
        }
    }

    fn add_viewer(&mut self, viewer: Viewer) -> ViewerId {
        let id = viewer.id;
        self.viewers.insert(id, viewer);
        id
    }

    fn last_applied(&self) -> &ShadingParameters {
        self.applied.last().expect("nothing was published")
    }
}

impl ReflectionHost for MockHost {
    fn device(&self) -> &dyn GraphicsDevice {
        &self.device
    }

    fn surface_enabled(&self) -> bool {
        self.surface_enabled
    }

    fn viewer(&self, id: ViewerId) -> Option<Viewer> {
        self.viewers.get(&id).copied()
    }

    fn mirror_transform(&self) -> AffineTransform {
        self.mirror_transform
    }

    fn object_transform(&self, id: ObjectId) -> Option<AffineTransform> {
        self.objects.get(&id).copied()
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

    fn spawn_helper_camera(&mut self, _label: &str) -> Option<CameraHandle> {
        let handle = CameraHandle(self.next_camera);
        self.next_camera += 1;
        self.live_cameras.insert(handle);
        Some(handle)
    }

    fn despawn_helper_camera(&mut self, handle: CameraHandle) {
        assert!(self.live_cameras.remove(&handle), "double despawn");
    }

    fn render_helper_camera(
        &mut self,
        handle: CameraHandle,
        view: &RenderView,
        target: TextureId,
    ) -> Result<(), RenderError> {
        self.renders.push(RenderCall {
            camera: handle,
            view: *view,
            target,
            quality: self.quality,
        });

        if let Some((mirror, viewer)) = self.nested.clone() {
            let outcome = mirror.on_will_render(self, viewer);
            self.nested_outcomes.push(outcome);

            mirror.set_config(MirrorConfig {
                resolution_scale: 0.25,
                ..mirror.config()
            });
            let enable_result = mirror.enable();
            let _ = (mirror.shading_parameters(), mirror.stats(), mirror.last_frame_stats());
            self.nested_reads.push(NestedRead {
                enabled: mirror.is_enabled(),
                config: mirror.config(),
                helper_cameras: mirror.helper_camera_count(),
                mono_target: mirror.target(TargetSlot::Mono).is_some(),
                enable_result,
            });
        }

        if self.fail_renders {
            Err(RenderError::RenderingFailed("mock failure".to_string()))
        } else {
            Ok(())
        }
    }

    fn apply_shading_parameters(&mut self, parameters: &ShadingParameters) {
        self.applied.push(parameters.clone());
    }
}

fn mono_viewer(id: u64) -> Viewer {
    let view = Mat4::look_at_rh(Vec3::new(0.0, 2.0, 5.0), Vec3::ZERO, Vec3::Y).unwrap();
    let mut camera = Camera::default();
    camera.set_aspect_ratio(1280, 720);
    Viewer {
        id: ViewerId(id),
        transform: AffineTransform(view.affine_inverse().unwrap()),
        camera,
        pixel_size: Extent2D::new(1280, 720),
        stereo: None,
    }
}

fn stereo_viewer(id: u64) -> Viewer {
    let eye = |x: f32| {
        let position = Vec3::new(x, 1.7, 3.0);
        EyeView {
            view: Mat4::look_at_rh(position, Vec3::new(x, 0.0, 0.0), Vec3::Y).unwrap(),
            projection: Mat4::perspective_rh_zo(FRAC_PI_2, 0.9, 0.05, 100.0),
        }
    };
    let mut viewer = mono_viewer(id);
    viewer.stereo = Some(StereoViews {
        left: eye(-0.032),
        right: eye(0.032),
        eye_extent: Extent2D::new(1440, 1600),
    });
    viewer
}

#[test]
fn mono_viewer_publishes_one_target_to_both_slots() {
    let mut host = MockHost::new();
    let viewer = host.add_viewer(mono_viewer(1));
    let mirror = PlanarMirror::new(MirrorConfig::default());

    let outcome = mirror.on_will_render(&mut host, viewer);

    assert_eq!(outcome, RenderOutcome::Rendered { eyes: 1 });
    let mono = mirror.target(TargetSlot::Mono).expect("mono target");
    assert_eq!(mono.extent, Extent2D::new(1280, 720));
    assert!(mirror.target(TargetSlot::Left).is_none());

    let block = host.last_applied();
    assert_eq!(block.texture(DEFAULT_LEFT_SLOT), Some(mono.texture));
    assert_eq!(block.texture(DEFAULT_RIGHT_SLOT), Some(mono.texture));
    assert_eq!(host.renders.len(), 1);
    assert_eq!(host.renders[0].target, mono.texture);
}

#[test]
fn stereo_viewer_renders_each_eye_into_its_own_target() {
    let mut host = MockHost::new();
    let viewer = host.add_viewer(stereo_viewer(1));
    let mirror = PlanarMirror::new(MirrorConfig::default());

    let outcome = mirror.on_will_render(&mut host, viewer);

    assert_eq!(outcome, RenderOutcome::Rendered { eyes: 2 });
    let left = mirror.target(TargetSlot::Left).expect("left target");
    let right = mirror.target(TargetSlot::Right).expect("right target");
    assert_ne!(left.texture, right.texture);
    assert_eq!(left.extent, Extent2D::new(1440, 1600));
    assert!(mirror.target(TargetSlot::Mono).is_none());

    let block = host.last_applied();
    assert_eq!(block.texture(DEFAULT_LEFT_SLOT), Some(left.texture));
    assert_eq!(block.texture(DEFAULT_RIGHT_SLOT), Some(right.texture));

    // Both eyes share one helper camera but get their own view.
    assert_eq!(host.renders.len(), 2);
    assert_eq!(host.renders[0].camera, host.renders[1].camera);
    assert_ne!(host.renders[0].view.view, host.renders[1].view.view);
    assert_eq!(mirror.helper_camera_count(), 1);
}

#[test]
fn shared_texture_forces_the_mono_path_for_stereo_viewers() {
    let mut host = MockHost::new();
    let viewer = host.add_viewer(stereo_viewer(1));
    let mirror = PlanarMirror::new(MirrorConfig {
        shared_texture_for_both_eyes: true,
        ..Default::default()
    });

    assert_eq!(
        mirror.on_will_render(&mut host, viewer),
        RenderOutcome::Rendered { eyes: 1 }
    );
    let mono = mirror.target(TargetSlot::Mono).expect("mono target");
    let block = host.last_applied();
    assert_eq!(block.texture(DEFAULT_LEFT_SLOT), Some(mono.texture));
    assert_eq!(block.texture(DEFAULT_RIGHT_SLOT), Some(mono.texture));
}

#[test]
fn repeated_renders_reuse_targets_and_helper_cameras() {
    let mut host = MockHost::new();
    let first = host.add_viewer(mono_viewer(1));
    let second = host.add_viewer(mono_viewer(2));
    let mirror = PlanarMirror::new(MirrorConfig::default());

    for _ in 0..3 {
        mirror.on_will_render(&mut host, first);
        mirror.on_will_render(&mut host, second);
    }

    assert_eq!(host.device.textures_created.load(Ordering::SeqCst), 1);
    assert_eq!(mirror.helper_camera_count(), 2);
    assert_eq!(host.live_cameras.len(), 2);

    let stats = mirror.stats();
    assert_eq!(stats.renders_issued, 6);
    assert_eq!(stats.eyes_rendered, 6);
}

#[test]
fn helper_camera_is_hidden_and_mirrored() {
    let mut host = MockHost::new();
    let viewer = host.add_viewer(mono_viewer(1));
    let mirror = PlanarMirror::new(MirrorConfig {
        clip_plane_offset: 0.0,
        ..Default::default()
    });

    mirror.on_will_render(&mut host, viewer);

    let view = host.renders[0].view;
    assert!(!view.camera.is_active);
    assert!(!view.camera.culling_mask.contains(LayerMask::HELPER_CAMERA));
    assert!((view.position - Vec3::new(0.0, -2.0, 5.0)).length() < 1e-4);
}

#[test]
fn quality_overrides_are_scoped_to_the_render() {
    let mut host = MockHost::new();
    let viewer = host.add_viewer(mono_viewer(1));
    let original = host.quality;
    let mirror = PlanarMirror::new(MirrorConfig {
        pixel_light_override: Some(1),
        render_shadows: false,
        ..Default::default()
    });

    mirror.on_will_render(&mut host, viewer);

    let during = host.renders[0].quality;
    assert_eq!(during.invert_culling, !original.invert_culling);
    assert_eq!(during.pixel_light_count, 1);
    assert_eq!(during.shadows, ShadowQuality::Disabled);
    assert_eq!(host.quality, original);
}

#[test]
fn failed_render_restores_quality_and_reports_failure() {
    let mut host = MockHost::new();
    let viewer = host.add_viewer(mono_viewer(1));
    host.fail_renders = true;
    let original = host.quality;
    let mirror = PlanarMirror::new(MirrorConfig::default());

    assert_eq!(mirror.on_will_render(&mut host, viewer), RenderOutcome::Failed);
    assert_eq!(host.quality, original);
    assert!(host.applied.is_empty());

    // The guard was released: the next frame renders again.
    host.fail_renders = false;
    assert_eq!(
        mirror.on_will_render(&mut host, viewer),
        RenderOutcome::Rendered { eyes: 1 }
    );
}

#[test]
fn nested_render_request_is_ignored() {
    let mut host = MockHost::new();
    let viewer = host.add_viewer(mono_viewer(1));
    let original = host.quality;
    let mirror = Rc::new(PlanarMirror::new(MirrorConfig::default()));
    host.nested = Some((Rc::clone(&mirror), viewer));

    let outcome = mirror.on_will_render(&mut host, viewer);

    assert_eq!(outcome, RenderOutcome::Rendered { eyes: 1 });
    assert_eq!(
        host.nested_outcomes,
        vec![RenderOutcome::Skipped(SkipReason::Reentrant)]
    );
    // Only the outer request rendered; global state is back to normal.
    assert_eq!(host.renders.len(), 1);
    assert_eq!(host.quality, original);
    assert_eq!(mirror.stats().reentrant_skips, 1);

    host.nested = None;
    mirror.on_frame(&mut host);
    assert_eq!(mirror.last_frame_stats().reentrant_skips, 1);
    assert_eq!(mirror.stats().reentrant_skips, 0);
}

#[test]
fn accessors_stay_readable_inside_a_render_and_changes_are_refused() {
    let mut host = MockHost::new();
    let viewer = host.add_viewer(mono_viewer(1));
    let mirror = Rc::new(PlanarMirror::new(MirrorConfig::default()));
    host.nested = Some((Rc::clone(&mirror), viewer));

    // First render: the accessors report the mirror as it was before it.
    assert_eq!(
        mirror.on_will_render(&mut host, viewer),
        RenderOutcome::Rendered { eyes: 1 }
    );
    assert_eq!(
        host.nested_reads,
        vec![NestedRead {
            enabled: true,
            config: MirrorConfig::default(),
            helper_cameras: 0,
            mono_target: false,
            enable_result: true,
        }]
    );

    // Second render sees the result of the first one.
    mirror.on_will_render(&mut host, viewer);
    assert_eq!(host.nested_reads[1].helper_cameras, 1);
    assert!(host.nested_reads[1].mono_target);

    // The nested set_config was dropped.
    host.nested = None;
    assert_eq!(mirror.config(), MirrorConfig::default());
    let target = mirror.target(TargetSlot::Mono).expect("mono target");
    assert_eq!(target.extent, Extent2D::new(1280, 720));

    // Outside a render, changes apply again.
    mirror.set_config(MirrorConfig {
        resolution_scale: 0.25,
        ..Default::default()
    });
    assert_eq!(mirror.config().resolution_scale, 0.25);
}

#[test]
fn disable_releases_everything_and_enable_recreates_it() {
    let mut host = MockHost::new();
    let viewer = host.add_viewer(stereo_viewer(1));
    let mirror = PlanarMirror::new(MirrorConfig {
        resolution_scale: 0.5,
        ..Default::default()
    });
    mirror.on_will_render(&mut host, viewer);
    assert_eq!(host.device.live_textures(), 2);

    mirror.disable(&mut host);

    assert!(!mirror.is_enabled());
    assert_eq!(host.device.live_textures(), 0);
    assert_eq!(host.device.live_samplers(), 0);
    assert!(host.live_cameras.is_empty());
    assert_eq!(mirror.helper_camera_count(), 0);
    assert!(host.last_applied().is_empty());
    assert_eq!(
        mirror.on_will_render(&mut host, viewer),
        RenderOutcome::Skipped(SkipReason::Disabled)
    );

    // Disabling twice is harmless.
    let published = host.applied.len();
    mirror.disable(&mut host);
    assert_eq!(host.applied.len(), published);

    assert!(mirror.enable());
    assert_eq!(
        mirror.on_will_render(&mut host, viewer),
        RenderOutcome::Rendered { eyes: 2 }
    );
    let left = mirror.target(TargetSlot::Left).expect("left target");
    assert_eq!(left.extent, Extent2D::new(720, 800));
    assert_eq!(host.device.live_textures(), 2);
    assert_eq!(host.live_cameras.len(), 1);
}

#[test]
fn destroyed_mirror_stays_inert() {
    let mut host = MockHost::new();
    let viewer = host.add_viewer(mono_viewer(1));
    let mirror = PlanarMirror::new(MirrorConfig::default());
    mirror.on_will_render(&mut host, viewer);

    mirror.destroy(&mut host);

    assert_eq!(host.device.live_textures(), 0);
    assert!(host.live_cameras.is_empty());
    assert!(!mirror.enable());
    assert_eq!(
        mirror.on_will_render(&mut host, viewer),
        RenderOutcome::Skipped(SkipReason::Destroyed)
    );
}

#[test]
fn resize_reallocates_and_republishes() {
    let mut host = MockHost::new();
    let viewer = host.add_viewer(mono_viewer(1));
    let mirror = PlanarMirror::new(MirrorConfig::default());
    mirror.on_will_render(&mut host, viewer);
    mirror.on_frame(&mut host);
    assert_eq!(mirror.last_frame_stats().targets_allocated, 1);
    let before = mirror.target(TargetSlot::Mono).unwrap();

    // Same size: nothing happens.
    mirror.on_frame(&mut host);
    assert_eq!(mirror.last_frame_stats().targets_allocated, 0);

    host.output = Extent2D::new(1920, 1080);
    mirror.on_frame(&mut host);

    let after = mirror.target(TargetSlot::Mono).unwrap();
    assert_eq!(after.extent, Extent2D::new(1920, 1080));
    assert_ne!(after.texture, before.texture);
    assert_eq!(mirror.last_frame_stats().targets_allocated, 1);
    assert_eq!(host.device.live_textures(), 1);
    assert_eq!(host.last_applied().texture(DEFAULT_LEFT_SLOT), Some(after.texture));
    assert_eq!(host.last_applied().texture(DEFAULT_RIGHT_SLOT), Some(after.texture));
}

#[test]
fn stereo_targets_keep_the_eye_size_across_resizes() {
    let mut host = MockHost::new();
    let viewer = host.add_viewer(stereo_viewer(1));
    let mirror = PlanarMirror::new(MirrorConfig::default());
    mirror.on_will_render(&mut host, viewer);
    mirror.on_frame(&mut host);
    assert_eq!(mirror.last_frame_stats().targets_allocated, 2);
    let left = mirror.target(TargetSlot::Left).expect("left target");
    let right = mirror.target(TargetSlot::Right).expect("right target");
    assert_eq!(left.extent, Extent2D::new(1440, 1600));

    // The output resize does not touch targets sized for the eyes.
    host.output = Extent2D::new(1920, 1080);
    mirror.on_frame(&mut host);
    assert_eq!(mirror.target(TargetSlot::Left), Some(left));
    assert_eq!(mirror.target(TargetSlot::Right), Some(right));
    assert_eq!(mirror.last_frame_stats().targets_allocated, 0);

    // Nor does the next render.
    mirror.on_will_render(&mut host, viewer);
    mirror.on_frame(&mut host);
    assert_eq!(mirror.target(TargetSlot::Left), Some(left));
    assert_eq!(mirror.last_frame_stats().targets_allocated, 0);
    assert_eq!(host.device.textures_created.load(Ordering::SeqCst), 2);
}

#[test]
fn invalid_viewers_are_skipped() {
    let mut host = MockHost::new();
    let mut degenerate = mono_viewer(2);
    degenerate.pixel_size = Extent2D::new(0, 720);
    let degenerate = host.add_viewer(degenerate);
    let mirror = PlanarMirror::new(MirrorConfig::default());

    assert_eq!(
        mirror.on_will_render(&mut host, ViewerId(42)),
        RenderOutcome::Skipped(SkipReason::InvalidViewer)
    );
    assert_eq!(
        mirror.on_will_render(&mut host, degenerate),
        RenderOutcome::Skipped(SkipReason::InvalidViewer)
    );
    assert!(host.live_cameras.is_empty());
    assert_eq!(host.device.live_textures(), 0);
}

#[test]
fn disabled_surface_is_skipped() {
    let mut host = MockHost::new();
    let viewer = host.add_viewer(mono_viewer(1));
    host.surface_enabled = false;
    let mirror = PlanarMirror::new(MirrorConfig::default());

    assert_eq!(
        mirror.on_will_render(&mut host, viewer),
        RenderOutcome::Skipped(SkipReason::SurfaceDisabled)
    );
    assert!(host.renders.is_empty());
}

#[test]
fn editor_tick_renders_the_preview_viewer() {
    let mut host = MockHost::new();
    let viewer = host.add_viewer(mono_viewer(1));
    let mirror = PlanarMirror::new(MirrorConfig::default());

    assert_eq!(mirror.on_editor_tick(&mut host, None), None);
    assert_eq!(
        mirror.on_editor_tick(&mut host, Some(viewer)),
        Some(RenderOutcome::Rendered { eyes: 1 })
    );
}

#[test]
fn empty_slot_names_are_not_published() {
    let mut host = MockHost::new();
    let viewer = host.add_viewer(mono_viewer(1));
    let mirror = PlanarMirror::new(MirrorConfig {
        right_slot: String::new(),
        ..Default::default()
    });

    mirror.on_will_render(&mut host, viewer);

    let block = host.last_applied();
    assert!(block.texture(DEFAULT_LEFT_SLOT).is_some());
    assert_eq!(block.textures().count(), 1);
}

#[test]
fn plane_can_come_from_another_object() {
    let mut host = MockHost::new();
    let viewer = host.add_viewer(mono_viewer(1));
    // A wall facing +Z one unit behind the origin.
    host.objects.insert(
        ObjectId(7),
        AffineTransform::from_rotation_translation(
            Quaternion::from_axis_angle(Vec3::X, FRAC_PI_2),
            Vec3::new(0.0, 0.0, -1.0),
        ),
    );
    let mirror = PlanarMirror::new(MirrorConfig {
        plane_source: PlaneSource::Object(ObjectId(7)),
        clip_plane_offset: 0.0,
        ..Default::default()
    });

    mirror.on_will_render(&mut host, viewer);
    let view = host.renders[0].view;
    assert!((view.position - Vec3::new(0.0, 2.0, -7.0)).length() < 1e-4);

    // The object disappears: the mirror falls back to its own transform.
    host.objects.clear();
    mirror.on_will_render(&mut host, viewer);
    let view = host.renders[1].view;
    assert!((view.position - Vec3::new(0.0, -2.0, 5.0)).length() < 1e-4);
}

#[test]
fn config_round_trips_through_ron() {
    let config = MirrorConfig {
        resolution_scale: 0.25,
        plane_source: PlaneSource::Object(ObjectId(3)),
        ..Default::default()
    };
    let text = config.to_ron_string().unwrap();
    let mirror = PlanarMirror::from_ron_str(&text).unwrap();
    assert_eq!(mirror.config(), config);
}
