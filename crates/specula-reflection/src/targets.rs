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

//! Offscreen color buffers the reflection is rendered into.

use std::borrow::Cow;
use std::fmt;

use specula_core::math::{Extent2D, Extent3D};
use specula_core::renderer::{
    AddressMode, FilterMode, GraphicsDevice, MipmapFilterMode, SampleCount, SamplerDescriptor,
    SamplerId, TextureDescriptor, TextureFormat, TextureId, TextureUsage,
};

use crate::config::MirrorConfig;
use crate::error::MirrorError;

/// Which of the (up to three) targets is meant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetSlot {
    /// Shared by both eyes, or the only image of a mono viewer.
    Mono,
    /// Left eye of a stereo viewer.
    Left,
    /// Right eye of a stereo viewer.
    Right,
}

impl TargetSlot {
    /// All slots, in release order.
    pub const ALL: [TargetSlot; 3] = [TargetSlot::Mono, TargetSlot::Left, TargetSlot::Right];

    /// Position of the slot in [`TargetSlot::ALL`].
    pub const fn index(self) -> usize {
        match self {
            TargetSlot::Mono => 0,
            TargetSlot::Left => 1,
            TargetSlot::Right => 2,
        }
    }
}

impl fmt::Display for TargetSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TargetSlot::Mono => "Mono",
            TargetSlot::Left => "Left",
            TargetSlot::Right => "Right",
        };
        f.write_str(name)
    }
}

/// A color texture and the sampler the surface reads it with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderTarget {
    /// The color texture.
    pub texture: TextureId,
    /// Clamp-to-edge, bilinear sampler.
    pub sampler: SamplerId,
    /// Pixel size of the texture.
    pub extent: Extent2D,
    /// Samples per pixel.
    pub sample_count: SampleCount,
    /// Pixel format.
    pub format: TextureFormat,
}

impl RenderTarget {
    fn matches(&self, extent: Extent2D, sample_count: SampleCount, format: TextureFormat) -> bool {
        self.extent == extent && self.sample_count == sample_count && self.format == format
    }

    fn descriptor(
        slot: TargetSlot,
        extent: Extent2D,
        sample_count: SampleCount,
        format: TextureFormat,
    ) -> TextureDescriptor<'static> {
        TextureDescriptor {
            label: Some(Cow::Owned(format!("Mirror Reflection ({slot})"))),
            size: Extent3D::from(extent),
            mip_level_count: 1,
            sample_count,
            format,
            usage: TextureUsage::RENDER_ATTACHMENT | TextureUsage::TEXTURE_BINDING,
        }
    }

    fn sampler_descriptor(slot: TargetSlot) -> SamplerDescriptor<'static> {
        SamplerDescriptor {
            label: Some(Cow::Owned(format!("Mirror Reflection Sampler ({slot})"))),
            address_mode_u: AddressMode::ClampToEdge,
            address_mode_v: AddressMode::ClampToEdge,
            address_mode_w: AddressMode::ClampToEdge,
            mag_filter: FilterMode::Linear,
            min_filter: FilterMode::Linear,
            mipmap_filter: MipmapFilterMode::Nearest,
        }
    }
}

/// Owns the mono and per-eye targets of one mirror.
///
/// Every target matches the size, sample count and format it was last
/// picked with; a mismatching request releases it and allocates a new one.
#[derive(Debug, Default)]
pub struct ReflectionTargets {
    mono: Option<RenderTarget>,
    left: Option<RenderTarget>,
    right: Option<RenderTarget>,
    // Viewport each slot was last picked for, indexed by `TargetSlot::index`.
    viewports: [Option<Extent2D>; 3],
    allocations: u32,
}

impl ReflectionTargets {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// The target in `slot`, if allocated.
    pub fn get(&self, slot: TargetSlot) -> Option<RenderTarget> {
        match slot {
            TargetSlot::Mono => self.mono,
            TargetSlot::Left => self.left,
            TargetSlot::Right => self.right,
        }
    }

    fn slot_mut(&mut self, slot: TargetSlot) -> &mut Option<RenderTarget> {
        match slot {
            TargetSlot::Mono => &mut self.mono,
            TargetSlot::Left => &mut self.left,
            TargetSlot::Right => &mut self.right,
        }
    }

    /// The viewport size `slot` was last picked for through
    /// [`ReflectionTargets::pick_target`].
    pub fn viewport(&self, slot: TargetSlot) -> Option<Extent2D> {
        self.viewports[slot.index()]
    }

    /// Slots currently holding a target.
    pub fn active_slots(&self) -> Vec<TargetSlot> {
        TargetSlot::ALL
            .into_iter()
            .filter(|slot| self.get(*slot).is_some())
            .collect()
    }

    /// Returns `true` if no target is allocated.
    pub fn is_empty(&self) -> bool {
        self.mono.is_none() && self.left.is_none() && self.right.is_none()
    }

    /// Number of allocations since the last call, then resets the counter.
    pub fn take_allocation_count(&mut self) -> u32 {
        std::mem::take(&mut self.allocations)
    }

    /// Returns the target for `slot` sized for a viewport of `screen` pixels.
    ///
    /// A target that already matches the requested size, sample count and
    /// format is returned as is. Otherwise it is released and a new one is
    /// allocated with a single mip level, clamp-to-edge addressing and
    /// bilinear filtering.
    pub fn pick_target(
        &mut self,
        device: &dyn GraphicsDevice,
        slot: TargetSlot,
        screen: Extent2D,
        config: &MirrorConfig,
    ) -> Result<RenderTarget, MirrorError> {
        let extent = config.target_extent(screen);
        let target =
            self.pick_target_with(device, slot, extent, config.msaa, config.color_format)?;
        self.viewports[slot.index()] = Some(screen);
        Ok(target)
    }

    /// Like [`ReflectionTargets::pick_target`], with an explicit target size.
    pub fn pick_target_with(
        &mut self,
        device: &dyn GraphicsDevice,
        slot: TargetSlot,
        extent: Extent2D,
        sample_count: SampleCount,
        format: TextureFormat,
    ) -> Result<RenderTarget, MirrorError> {
        if let Some(current) = self.get(slot) {
            if current.matches(extent, sample_count, format) {
                return Ok(current);
            }
            log::debug!(
                "ReflectionTargets: {} target {}x{} x{} no longer matches {}x{} x{}, reallocating",
                slot,
                current.extent.width,
                current.extent.height,
                current.sample_count.count(),
                extent.width,
                extent.height,
                sample_count.count()
            );
            self.release(device, slot);
        }

        let target = Self::allocate(device, slot, extent, sample_count, format)?;
        *self.slot_mut(slot) = Some(target);
        self.allocations += 1;
        Ok(target)
    }

    fn allocate(
        device: &dyn GraphicsDevice,
        slot: TargetSlot,
        extent: Extent2D,
        sample_count: SampleCount,
        format: TextureFormat,
    ) -> Result<RenderTarget, MirrorError> {
        let texture =
            device.create_texture(&RenderTarget::descriptor(slot, extent, sample_count, format))?;
        let sampler = match device.create_sampler(&RenderTarget::sampler_descriptor(slot)) {
            Ok(sampler) => sampler,
            Err(e) => {
                if let Err(destroy_err) = device.destroy_texture(texture) {
                    log::warn!(
                        "ReflectionTargets: Failed to destroy {} texture after sampler failure: {:?}",
                        slot,
                        destroy_err
                    );
                }
                return Err(e.into());
            }
        };

        log::debug!(
            "ReflectionTargets: allocated {} target {}x{} x{} ({:?})",
            slot,
            extent.width,
            extent.height,
            sample_count.count(),
            format
        );

        Ok(RenderTarget {
            texture,
            sampler,
            extent,
            sample_count,
            format,
        })
    }

    /// Rebuilds the storage of the target in `slot` if the device lost it,
    /// keeping the same texture ID. Does nothing for an empty slot.
    pub fn ensure_created(
        &mut self,
        device: &dyn GraphicsDevice,
        slot: TargetSlot,
    ) -> Result<(), MirrorError> {
        let Some(target) = self.get(slot) else {
            return Ok(());
        };
        if device.is_texture_resident(target.texture) {
            return Ok(());
        }

        log::debug!(
            "ReflectionTargets: {} texture {:?} lost its storage, recreating",
            slot,
            target.texture
        );
        let descriptor =
            RenderTarget::descriptor(slot, target.extent, target.sample_count, target.format);
        device.recreate_texture(target.texture, &descriptor)?;
        Ok(())
    }

    /// Releases the target in `slot`. Safe on an empty slot.
    pub fn release(&mut self, device: &dyn GraphicsDevice, slot: TargetSlot) {
        self.viewports[slot.index()] = None;
        if let Some(target) = self.slot_mut(slot).take() {
            if let Err(e) = device.destroy_sampler(target.sampler) {
                log::warn!(
                    "ReflectionTargets: Failed to destroy {} sampler: {:?}",
                    slot,
                    e
                );
            }
            if let Err(e) = device.destroy_texture(target.texture) {
                log::warn!(
                    "ReflectionTargets: Failed to destroy {} texture: {:?}",
                    slot,
                    e
                );
            }
        }
    }

    /// Releases every target. Calling it again is a no-op.
    pub fn release_all(&mut self, device: &dyn GraphicsDevice) {
        for slot in TargetSlot::ALL {
            self.release(device, slot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use specula_core::renderer::ResourceError;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct CountingDevice {
        next_id: AtomicUsize,
        live_textures: Mutex<HashSet<usize>>,
        lost_textures: Mutex<HashSet<usize>>,
        live_samplers: Mutex<HashSet<usize>>,
        recreated: AtomicUsize,
        fail_samplers: bool,
    }

    impl CountingDevice {
        fn live_textures(&self) -> usize {
            self.live_textures.lock().unwrap().len()
        }

        fn live_samplers(&self) -> usize {
            self.live_samplers.lock().unwrap().len()
        }
    }

    impl GraphicsDevice for CountingDevice {
        fn create_texture(&self, _d: &TextureDescriptor) -> Result<TextureId, ResourceError> {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
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

        fn recreate_texture(&self, id: TextureId, _d: &TextureDescriptor) -> Result<(), ResourceError> {
            self.lost_textures.lock().unwrap().remove(&id.0);
            self.recreated.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn is_texture_resident(&self, id: TextureId) -> bool {
            !self.lost_textures.lock().unwrap().contains(&id.0)
        }

        fn create_sampler(&self, _d: &SamplerDescriptor) -> Result<SamplerId, ResourceError> {
            if self.fail_samplers {
                return Err(ResourceError::BackendError("no samplers left".to_string()));
            }
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            self.live_samplers.lock().unwrap().insert(id);
            Ok(SamplerId(id))
        }

        fn destroy_sampler(&self, id: SamplerId) -> Result<(), ResourceError> {
            self.live_samplers.lock().unwrap().remove(&id.0);
            Ok(())
        }
    }

    fn config() -> MirrorConfig {
        MirrorConfig::default()
    }

    #[test]
    fn pick_target_is_idempotent() {
        let device = CountingDevice::default();
        let mut targets = ReflectionTargets::new();

        let first = targets
            .pick_target(&device, TargetSlot::Mono, Extent2D::new(800, 600), &config())
            .unwrap();
        let second = targets
            .pick_target(&device, TargetSlot::Mono, Extent2D::new(800, 600), &config())
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(targets.take_allocation_count(), 1);
        assert_eq!(device.live_textures(), 1);
    }

    #[test]
    fn pick_target_reallocates_on_size_or_sample_change() {
        let device = CountingDevice::default();
        let mut targets = ReflectionTargets::new();
        let mut cfg = config();

        let a = targets
            .pick_target(&device, TargetSlot::Mono, Extent2D::new(800, 600), &cfg)
            .unwrap();
        let b = targets
            .pick_target(&device, TargetSlot::Mono, Extent2D::new(801, 600), &cfg)
            .unwrap();
        let c = targets
            .pick_target(&device, TargetSlot::Mono, Extent2D::new(801, 601), &cfg)
            .unwrap();
        cfg.msaa = SampleCount::X4;
        let d = targets
            .pick_target(&device, TargetSlot::Mono, Extent2D::new(801, 601), &cfg)
            .unwrap();

        assert_ne!(a.texture, b.texture);
        assert_ne!(b.texture, c.texture);
        assert_ne!(c.texture, d.texture);
        assert_eq!(d.sample_count, SampleCount::X4);
        assert_eq!(targets.take_allocation_count(), 4);
        // Old targets were destroyed along the way.
        assert_eq!(device.live_textures(), 1);
        assert_eq!(device.live_samplers(), 1);
    }

    #[test]
    fn resolution_policy_sizes_targets() {
        let device = CountingDevice::default();
        let mut targets = ReflectionTargets::new();

        let fixed = MirrorConfig {
            fixed_resolution: Extent2D::new(640, 480),
            resolution_scale: 3.0,
            ..config()
        };
        let t = targets
            .pick_target(&device, TargetSlot::Left, Extent2D::new(1920, 1080), &fixed)
            .unwrap();
        assert_eq!(t.extent, Extent2D::new(640, 480));

        let scaled = MirrorConfig {
            resolution_scale: 0.5,
            ..config()
        };
        let t = targets
            .pick_target(&device, TargetSlot::Right, Extent2D::new(1920, 1080), &scaled)
            .unwrap();
        assert_eq!(t.extent, Extent2D::new(960, 540));
    }

    #[test]
    fn release_all_is_idempotent() {
        let device = CountingDevice::default();
        let mut targets = ReflectionTargets::new();
        for slot in TargetSlot::ALL {
            targets
                .pick_target(&device, slot, Extent2D::new(64, 64), &config())
                .unwrap();
        }
        assert_eq!(targets.active_slots().len(), 3);

        targets.release_all(&device);
        assert!(targets.is_empty());
        assert_eq!(device.live_textures(), 0);
        assert_eq!(device.live_samplers(), 0);

        targets.release_all(&device);
        assert!(targets.is_empty());
    }

    #[test]
    fn ensure_created_rebuilds_lost_storage_in_place() {
        let device = CountingDevice::default();
        let mut targets = ReflectionTargets::new();
        let t = targets
            .pick_target(&device, TargetSlot::Mono, Extent2D::new(32, 32), &config())
            .unwrap();

        targets.ensure_created(&device, TargetSlot::Mono).unwrap();
        assert_eq!(device.recreated.load(Ordering::SeqCst), 0);

        device.lost_textures.lock().unwrap().insert(t.texture.0);
        targets.ensure_created(&device, TargetSlot::Mono).unwrap();
        assert_eq!(device.recreated.load(Ordering::SeqCst), 1);
        assert_eq!(targets.get(TargetSlot::Mono), Some(t));

        // Empty slots are left alone.
        targets.ensure_created(&device, TargetSlot::Left).unwrap();
        assert_eq!(targets.get(TargetSlot::Left), None);
    }

    #[test]
    fn viewport_is_remembered_per_slot_until_release() {
        let device = CountingDevice::default();
        let mut targets = ReflectionTargets::new();
        let cfg = MirrorConfig {
            resolution_scale: 0.5,
            ..config()
        };

        targets
            .pick_target(&device, TargetSlot::Left, Extent2D::new(1440, 1600), &cfg)
            .unwrap();
        targets
            .pick_target(&device, TargetSlot::Mono, Extent2D::new(1280, 720), &cfg)
            .unwrap();

        assert_eq!(targets.viewport(TargetSlot::Left), Some(Extent2D::new(1440, 1600)));
        assert_eq!(targets.viewport(TargetSlot::Mono), Some(Extent2D::new(1280, 720)));
        assert_eq!(targets.viewport(TargetSlot::Right), None);
        assert_eq!(
            targets.get(TargetSlot::Left).map(|t| t.extent),
            Some(Extent2D::new(720, 800))
        );

        targets.release(&device, TargetSlot::Left);
        assert_eq!(targets.viewport(TargetSlot::Left), None);
    }

    #[test]
    fn sampler_failure_does_not_leak_the_texture() {
        let device = CountingDevice {
            fail_samplers: true,
            ..Default::default()
        };
        let mut targets = ReflectionTargets::new();
        let result = targets.pick_target(&device, TargetSlot::Mono, Extent2D::new(8, 8), &config());

        assert!(matches!(result, Err(MirrorError::Resource(_))));
        assert_eq!(device.live_textures(), 0);
        assert!(targets.is_empty());
    }
}
