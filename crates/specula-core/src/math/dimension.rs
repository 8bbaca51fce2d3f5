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

//! Provides structs for representing pixel extents in 2D and 3D.

use serde::{Deserialize, Serialize};

/// A two-dimensional extent, typically representing width and height.
///
/// Used for viewport sizes and render target dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Extent2D {
    /// The width component of the extent.
    pub width: u32,
    /// The height component of the extent.
    pub height: u32,
}

impl Extent2D {
    /// Creates a new extent.
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns `true` if either dimension is zero.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Scales both dimensions by `factor`, rounding to the nearest pixel.
    ///
    /// Each dimension is clamped to at least one pixel.
    ///
    /// ```
    /// use specula_core::math::Extent2D;
    /// assert_eq!(Extent2D::new(1920, 1080).scaled(0.5), Extent2D::new(960, 540));
    /// assert_eq!(Extent2D::new(3, 1).scaled(0.1), Extent2D::new(1, 1));
    /// ```
    #[inline]
    pub fn scaled(&self, factor: f32) -> Self {
        let scale = |v: u32| ((v as f32 * factor).round() as u32).max(1);
        Self {
            width: scale(self.width),
            height: scale(self.height),
        }
    }

    /// Width divided by height. Zero-height extents report `1.0`.
    #[inline]
    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

/// A three-dimensional extent, representing width, height, and depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Extent3D {
    /// The width component of the extent.
    pub width: u32,
    /// The height component of the extent.
    pub height: u32,
    /// The depth or number of array layers.
    pub depth_or_array_layers: u32,
}

impl From<Extent2D> for Extent3D {
    /// A single-layer extent.
    fn from(e: Extent2D) -> Self {
        Self {
            width: e.width,
            height: e.height,
            depth_or_array_layers: 1,
        }
    }
}
