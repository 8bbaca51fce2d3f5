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

//! The planar mirror component and its host callbacks.

use std::cell::{Cell, RefCell, RefMut};

use specula_core::math::Extent2D;
use specula_core::renderer::{ShadingParameters, TextureId};

use crate::camera::HelperCameras;
use crate::config::{MirrorConfig, PlaneSource};
use crate::error::MirrorError;
use crate::host::{Eye, ReflectionHost, Viewer, ViewerId};
use crate::lifecycle::{Lifecycle, RenderGuard};
use crate::plane::{resolve_plane, ReflectionPlane};
use crate::targets::{ReflectionTargets, RenderTarget, TargetSlot};

/// Why a visibility notification did not render anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The mirror is disabled.
    Disabled,
    /// The host reports the reflective surface as disabled.
    SurfaceDisabled,
    /// The viewer is unknown or degenerate.
    InvalidViewer,
    /// A reflection render is already in progress.
    Reentrant,
    /// The mirror was destroyed.
    Destroyed,
}

/// Result of a visibility notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// The reflection was rendered and published.
    Rendered {
        /// Number of images rendered: 1 for the shared path, 2 per-eye.
        eyes: u32,
    },
    /// Nothing was done.
    Skipped(SkipReason),
    /// Rendering was attempted and failed. The failure has been logged.
    Failed,
}

/// Counters accumulated between two per-frame ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MirrorStats {
    /// Visibility notifications that rendered successfully.
    pub renders_issued: u32,
    /// Images rendered by those notifications.
    pub eyes_rendered: u32,
    /// Render targets allocated.
    pub targets_allocated: u32,
    /// Notifications ignored because a render was in progress.
    pub reentrant_skips: u32,
}

/// Everything a mirror owns. Only borrowed while no render is in progress
/// or by the render itself.
#[derive(Debug)]
struct MirrorInner {
    config: MirrorConfig,
    lifecycle: Lifecycle,
    targets: ReflectionTargets,
    cameras: HelperCameras,
    // The surface's per-instance shading block, as last applied.
    shading: ShadingParameters,
    // Target slots last published to the left and right shading slots.
    published_slots: Option<[TargetSlot; 2]>,
    // Output size seen by the last per-frame tick.
    last_output: Option<Extent2D>,
    // Counters of the frame in progress.
    stats: MirrorStats,
    // Counters of the last completed frame.
    last_frame_stats: MirrorStats,
}

/// What the read accessors report. Refreshed after every operation that
/// changes the mirror, so it stays readable while a render holds the state.
#[derive(Debug, Clone)]
struct MirrorSnapshot {
    config: MirrorConfig,
    lifecycle: Lifecycle,
    shading: ShadingParameters,
    stats: MirrorStats,
    last_frame_stats: MirrorStats,
    helper_cameras: usize,
    targets: [Option<RenderTarget>; 3],
}

/// A reflective plane rendering the scene from a mirrored viewpoint.
///
/// The host drives it through three callbacks:
/// [`PlanarMirror::on_will_render`] whenever the surface is about to be drawn
/// for a viewer, [`PlanarMirror::on_frame`] once per frame, and
/// [`PlanarMirror::on_editor_tick`] from an editor preview loop.
///
/// All callbacks take `&self`, so the host may call back into the mirror
/// while one of its helper cameras renders. Such nested notifications are
/// ignored, nested changes are refused with a warning, and the accessors
/// report the mirror as it was when the render started.
#[derive(Debug)]
pub struct PlanarMirror {
    // Set while a reflection renders. Checked before `state` is borrowed.
    rendering: Cell<bool>,
    // Nested notifications of the frame in progress.
    reentrant_skips: Cell<u32>,
    state: RefCell<MirrorInner>,
    snapshot: RefCell<MirrorSnapshot>,
}

impl PlanarMirror {
    /// Creates a mirror. Nothing is allocated until the first render.
    pub fn new(mut config: MirrorConfig) -> Self {
        config.validate();
        let lifecycle = if config.enabled {
            Lifecycle::Enabled
        } else {
            Lifecycle::Disabled
        };
        let inner = MirrorInner {
            config,
            lifecycle,
            targets: ReflectionTargets::new(),
            cameras: HelperCameras::new(),
            shading: ShadingParameters::new(),
            published_slots: None,
            last_output: None,
            stats: MirrorStats::default(),
            last_frame_stats: MirrorStats::default(),
        };
        Self {
            rendering: Cell::new(false),
            reentrant_skips: Cell::new(0),
            snapshot: RefCell::new(inner.snapshot()),
            state: RefCell::new(inner),
        }
    }

    fn refresh_snapshot(&self, inner: &MirrorInner) {
        *self.snapshot.borrow_mut() = inner.snapshot();
    }

    /// Loads a mirror from a RON configuration.
    pub fn from_ron_str(source: &str) -> Result<Self, MirrorError> {
        Ok(Self::new(MirrorConfig::from_ron_str(source)?))
    }

    /// A copy of the current configuration.
    pub fn config(&self) -> MirrorConfig {
        self.snapshot.borrow().config.clone()
    }

    /// Replaces the configuration. Targets follow on the next render.
    ///
    /// Bindings published under slot names that changed are dropped.
    /// Ignored while a reflection renders.
    pub fn set_config(&self, mut config: MirrorConfig) {
        let Some(mut inner) = self.try_state_mut("set_config") else {
            return;
        };
        config.validate();
        if config.left_slot != inner.config.left_slot
            || config.right_slot != inner.config.right_slot
        {
            inner.shading.clear();
        }
        inner.config = config;
        self.refresh_snapshot(&inner);
    }

    /// Where the mirror is in its lifecycle.
    pub fn lifecycle(&self) -> Lifecycle {
        self.snapshot.borrow().lifecycle
    }

    /// Returns `true` if visibility notifications render.
    pub fn is_enabled(&self) -> bool {
        self.lifecycle() == Lifecycle::Enabled
    }

    /// Re-enables a disabled mirror. A destroyed mirror stays destroyed.
    ///
    /// Returns `true` if the mirror is enabled afterwards. Ignored while a
    /// reflection renders.
    pub fn enable(&self) -> bool {
        let Some(mut inner) = self.try_state_mut("enable") else {
            return self.is_enabled();
        };
        let enabled = match inner.lifecycle {
            Lifecycle::Destroyed => {
                log::warn!("PlanarMirror: enable() called on a destroyed mirror");
                false
            }
            _ => {
                inner.lifecycle = Lifecycle::Enabled;
                inner.config.enabled = true;
                true
            }
        };
        self.refresh_snapshot(&inner);
        enabled
    }

    /// Despawns every helper camera, releases every target and clears the
    /// published textures. Safe to call repeatedly.
    pub fn disable<H: ReflectionHost + ?Sized>(&self, host: &mut H) {
        let Some(mut inner) = self.try_state_mut("disable") else {
            return;
        };
        if inner.lifecycle == Lifecycle::Enabled {
            inner.teardown(host);
            inner.lifecycle = Lifecycle::Disabled;
            inner.config.enabled = false;
        }
        self.refresh_snapshot(&inner);
    }

    /// Disables the mirror for good.
    pub fn destroy<H: ReflectionHost + ?Sized>(&self, host: &mut H) {
        let Some(mut inner) = self.try_state_mut("destroy") else {
            return;
        };
        if inner.lifecycle == Lifecycle::Enabled {
            inner.teardown(host);
        }
        inner.lifecycle = Lifecycle::Destroyed;
        inner.config.enabled = false;
        self.refresh_snapshot(&inner);
    }

    /// Borrows the state for a change, unless a reflection is rendering.
    fn try_state_mut(&self, operation: &str) -> Option<RefMut<'_, MirrorInner>> {
        if self.rendering.get() {
            log::warn!("PlanarMirror: {}() called while rendering, ignored", operation);
            return None;
        }
        self.state.try_borrow_mut().ok()
    }

    /// Visibility notification: the surface is about to be drawn for `viewer`.
    ///
    /// Renders the reflection for that viewer and publishes it to the
    /// surface's shading inputs. Never fails; problems are logged and
    /// reported through the returned [`RenderOutcome`].
    pub fn on_will_render<H: ReflectionHost + ?Sized>(
        &self,
        host: &mut H,
        viewer: ViewerId,
    ) -> RenderOutcome {
        let Some(_guard) = RenderGuard::try_acquire(&self.rendering) else {
            self.reentrant_skips.set(self.reentrant_skips.get() + 1);
            log::trace!(
                "PlanarMirror: nested render request for viewer {:?} ignored",
                viewer
            );
            return RenderOutcome::Skipped(SkipReason::Reentrant);
        };

        let mut inner = self.state.borrow_mut();
        match inner.lifecycle {
            Lifecycle::Destroyed => return RenderOutcome::Skipped(SkipReason::Destroyed),
            Lifecycle::Disabled => return RenderOutcome::Skipped(SkipReason::Disabled),
            Lifecycle::Enabled => {}
        }
        if !host.surface_enabled() {
            return RenderOutcome::Skipped(SkipReason::SurfaceDisabled);
        }

        let Some(source) = host.viewer(viewer) else {
            log::debug!("PlanarMirror: viewer {:?} is unknown, skipping", viewer);
            return RenderOutcome::Skipped(SkipReason::InvalidViewer);
        };
        if is_degenerate(&source) {
            log::warn!(
                "PlanarMirror: viewer {:?} has an empty viewport or a singular transform, skipping",
                viewer
            );
            return RenderOutcome::Skipped(SkipReason::InvalidViewer);
        }

        let outcome = match inner.render_viewer(host, &source) {
            Ok(eyes) => {
                inner.stats.renders_issued += 1;
                inner.stats.eyes_rendered += eyes;
                RenderOutcome::Rendered { eyes }
            }
            Err(e) => {
                log::error!(
                    "PlanarMirror: reflection for viewer {:?} failed: {}",
                    viewer,
                    e
                );
                RenderOutcome::Failed
            }
        };
        self.refresh_snapshot(&inner);
        outcome
    }

    /// Per-frame tick: detects output resizes, reallocating and republishing
    /// every active target, and closes the frame's statistics.
    pub fn on_frame<H: ReflectionHost + ?Sized>(&self, host: &mut H) {
        let Some(mut inner) = self.try_state_mut("on_frame") else {
            return;
        };

        if inner.lifecycle == Lifecycle::Enabled {
            let output = host.output_extent();
            if let Some(previous) = inner.last_output {
                if previous != output && !inner.targets.is_empty() {
                    log::debug!(
                        "PlanarMirror: output resized from {}x{} to {}x{}",
                        previous.width,
                        previous.height,
                        output.width,
                        output.height
                    );
                    if let Err(e) = inner.reallocate(host, output) {
                        log::warn!("PlanarMirror: failed to reallocate targets: {}", e);
                    }
                }
            }
            inner.last_output = Some(output);
        }

        let allocated = inner.targets.take_allocation_count();
        inner.stats.targets_allocated += allocated;
        inner.stats.reentrant_skips += self.reentrant_skips.take();

        let finished = std::mem::take(&mut inner.stats);
        log::trace!(
            "PlanarMirror: frame stats: {} renders, {} eyes, {} targets allocated, {} nested requests",
            finished.renders_issued,
            finished.eyes_rendered,
            finished.targets_allocated,
            finished.reentrant_skips
        );
        inner.last_frame_stats = finished;
        self.refresh_snapshot(&inner);
    }

    /// Editor preview tick: the per-frame tick, then a render for the
    /// editor's active preview viewer if there is one.
    pub fn on_editor_tick<H: ReflectionHost + ?Sized>(
        &self,
        host: &mut H,
        preview: Option<ViewerId>,
    ) -> Option<RenderOutcome> {
        self.on_frame(host);
        preview.map(|viewer| self.on_will_render(host, viewer))
    }

    /// The shading block as last applied to the surface.
    pub fn shading_parameters(&self) -> ShadingParameters {
        self.snapshot.borrow().shading.clone()
    }

    /// Counters of the frame in progress.
    pub fn stats(&self) -> MirrorStats {
        let mut stats = self.snapshot.borrow().stats;
        stats.reentrant_skips += self.reentrant_skips.get();
        stats
    }

    /// Counters of the last frame closed by [`PlanarMirror::on_frame`].
    pub fn last_frame_stats(&self) -> MirrorStats {
        self.snapshot.borrow().last_frame_stats
    }

    /// Number of live helper cameras.
    pub fn helper_camera_count(&self) -> usize {
        self.snapshot.borrow().helper_cameras
    }

    /// The target in `slot`, if allocated.
    pub fn target(&self, slot: TargetSlot) -> Option<RenderTarget> {
        self.snapshot.borrow().targets[slot.index()]
    }
}

impl Drop for PlanarMirror {
    fn drop(&mut self) {
        let inner = self.state.get_mut();
        if !inner.cameras.is_empty() || !inner.targets.is_empty() {
            log::warn!(
                "PlanarMirror: dropped with {} helper cameras and targets {:?} still alive; call destroy() first",
                inner.cameras.len(),
                inner.targets.active_slots()
            );
        }
    }
}

fn is_degenerate(viewer: &Viewer) -> bool {
    viewer.pixel_size.is_empty()
        || viewer.transform.inverse().is_none()
        || viewer
            .stereo
            .is_some_and(|stereo| stereo.eye_extent.is_empty())
}

impl MirrorInner {
    fn snapshot(&self) -> MirrorSnapshot {
        MirrorSnapshot {
            config: self.config.clone(),
            lifecycle: self.lifecycle,
            shading: self.shading.clone(),
            stats: self.stats,
            last_frame_stats: self.last_frame_stats,
            helper_cameras: self.cameras.len(),
            targets: TargetSlot::ALL.map(|slot| self.targets.get(slot)),
        }
    }

    fn render_viewer<H: ReflectionHost + ?Sized>(
        &mut self,
        host: &mut H,
        viewer: &Viewer,
    ) -> Result<u32, MirrorError> {
        let plane = self.resolve_plane(host);

        if self.config.renders_per_eye(viewer.is_stereo()) {
            log::trace!("PlanarMirror: per-eye render for viewer {:?}", viewer.id);
            let left = self.render_eye(host, &plane, viewer, Some(Eye::Left), TargetSlot::Left)?;
            let right =
                self.render_eye(host, &plane, viewer, Some(Eye::Right), TargetSlot::Right)?;
            self.publish(host, Some(left.texture), Some(right.texture));
            self.published_slots = Some([TargetSlot::Left, TargetSlot::Right]);
            Ok(2)
        } else {
            log::trace!("PlanarMirror: shared render for viewer {:?}", viewer.id);
            let target = self.render_eye(host, &plane, viewer, None, TargetSlot::Mono)?;
            self.publish(host, Some(target.texture), Some(target.texture));
            self.published_slots = Some([TargetSlot::Mono, TargetSlot::Mono]);
            Ok(1)
        }
    }

    fn render_eye<H: ReflectionHost + ?Sized>(
        &mut self,
        host: &mut H,
        plane: &ReflectionPlane,
        viewer: &Viewer,
        eye: Option<Eye>,
        slot: TargetSlot,
    ) -> Result<RenderTarget, MirrorError> {
        let target = self.targets.pick_target(
            host.device(),
            slot,
            viewer.viewport_extent(eye),
            &self.config,
        )?;
        self.targets.ensure_created(host.device(), slot)?;
        self.cameras
            .render(host, &self.config, plane, viewer, eye, &target)?;
        Ok(target)
    }

    fn resolve_plane<H: ReflectionHost + ?Sized>(&self, host: &H) -> ReflectionPlane {
        let mirror = host.mirror_transform();
        let source = match self.config.plane_source {
            PlaneSource::SelfTransform => None,
            PlaneSource::Object(id) => {
                let transform = host.object_transform(id);
                if transform.is_none() {
                    log::warn!(
                        "PlanarMirror: plane source {:?} is gone, using the mirror's own transform",
                        id
                    );
                }
                transform
            }
        };
        resolve_plane(&self.config, &mirror, source.as_ref())
    }

    fn publish<H: ReflectionHost + ?Sized>(
        &mut self,
        host: &mut H,
        left: Option<TextureId>,
        right: Option<TextureId>,
    ) {
        for (name, texture) in [(&self.config.left_slot, left), (&self.config.right_slot, right)] {
            if let Some(texture) = texture {
                self.shading.set_texture(name, texture);
            }
        }
        host.apply_shading_parameters(&self.shading);
    }

    fn reallocate<H: ReflectionHost + ?Sized>(
        &mut self,
        host: &mut H,
        output: Extent2D,
    ) -> Result<(), MirrorError> {
        // The shared target follows the output; eye targets keep following
        // the eye viewport they were last sized for.
        for slot in self.targets.active_slots() {
            let viewport = match slot {
                TargetSlot::Mono => Some(output),
                TargetSlot::Left | TargetSlot::Right => self.targets.viewport(slot),
            };
            if let Some(viewport) = viewport {
                self.targets
                    .pick_target(host.device(), slot, viewport, &self.config)?;
            }
        }

        if let Some([left, right]) = self.published_slots {
            let left = self.targets.get(left).map(|t| t.texture);
            let right = self.targets.get(right).map(|t| t.texture);
            self.publish(host, left, right);
        }
        Ok(())
    }

    fn teardown<H: ReflectionHost + ?Sized>(&mut self, host: &mut H) {
        log::debug!(
            "PlanarMirror: tearing down {} helper cameras and targets {:?}",
            self.cameras.len(),
            self.targets.active_slots()
        );
        self.cameras.release_all(host);
        self.targets.release_all(host.device());
        self.shading.clear();
        host.apply_shading_parameters(&self.shading);
        self.published_slots = None;
        self.last_output = None;
    }
}
