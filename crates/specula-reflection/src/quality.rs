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

//! Scoped overrides of the host's global quality settings.

use std::ops::{Deref, DerefMut};

use specula_core::renderer::{QualitySettings, ShadowQuality};

use crate::config::MirrorConfig;
use crate::host::ReflectionHost;

/// Quality changes applied while a reflection renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityOverrides {
    /// Pixel light budget, if overridden.
    pub pixel_light_count: Option<u32>,
    /// Whether shadows are switched off.
    pub disable_shadows: bool,
}

impl QualityOverrides {
    /// Overrides requested by `config`.
    pub fn from_config(config: &MirrorConfig) -> Self {
        Self {
            pixel_light_count: config
                .pixel_light_override
                .and_then(|count| u32::try_from(count).ok()),
            disable_shadows: !config.render_shadows,
        }
    }

    /// `saved` with these overrides and inverted face culling.
    pub fn apply_to(&self, saved: QualitySettings) -> QualitySettings {
        QualitySettings {
            invert_culling: !saved.invert_culling,
            pixel_light_count: self.pixel_light_count.unwrap_or(saved.pixel_light_count),
            shadows: if self.disable_shadows {
                ShadowQuality::Disabled
            } else {
                saved.shadows
            },
        }
    }
}

/// Holds the host with the overrides applied; restores the saved settings
/// when dropped, whichever way the render exits.
pub struct QualityScope<'h, H: ReflectionHost + ?Sized> {
    host: &'h mut H,
    saved: QualitySettings,
}

impl<'h, H: ReflectionHost + ?Sized> QualityScope<'h, H> {
    /// Saves the host's current settings and applies `overrides`.
    pub fn apply(host: &'h mut H, overrides: QualityOverrides) -> Self {
        let saved = host.quality();
        host.set_quality(overrides.apply_to(saved));
        Self { host, saved }
    }

    /// The settings that will be restored.
    pub fn saved(&self) -> QualitySettings {
        self.saved
    }
}

impl<H: ReflectionHost + ?Sized> Deref for QualityScope<'_, H> {
    type Target = H;

    fn deref(&self) -> &H {
        &*self.host
    }
}

impl<H: ReflectionHost + ?Sized> DerefMut for QualityScope<'_, H> {
    fn deref_mut(&mut self) -> &mut H {
        &mut *self.host
    }
}

impl<H: ReflectionHost + ?Sized> Drop for QualityScope<'_, H> {
    fn drop(&mut self) {
        self.host.set_quality(self.saved);
    }
}
