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

//! Global render-quality state that a render pass may temporarily override.

use serde::{Deserialize, Serialize};

/// Shadow rendering quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ShadowQuality {
    /// No shadows are rendered.
    Disabled,
    /// Only hard shadows.
    HardOnly,
    /// Hard and soft shadows.
    #[default]
    All,
}

/// The process-wide quality state consulted by the host renderer for every pass.
///
/// A pass that changes any of these must restore them before returning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QualitySettings {
    /// If `true`, the rasterizer culls front faces instead of back faces.
    pub invert_culling: bool,
    /// Maximum number of per-pixel lights.
    pub pixel_light_count: u32,
    /// Shadow quality.
    pub shadows: ShadowQuality,
}

impl Default for QualitySettings {
    fn default() -> Self {
        Self {
            invert_culling: false,
            pixel_light_count: 4,
            shadows: ShadowQuality::All,
        }
    }
}
