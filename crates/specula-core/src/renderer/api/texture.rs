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

//! Defines data structures related to GPU texture and sampler resources.

use crate::math::Extent3D;
use crate::renderer::api::{SampleCount, TextureFormat};
use std::borrow::Cow;

/// Defines how texture coordinates outside the `[0, 1]` range are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressMode {
    /// The texture repeats.
    Repeat,
    /// Coordinates are clamped to the edge texels.
    ClampToEdge,
    /// The texture repeats, mirroring on every integer boundary.
    MirrorRepeat,
}

/// Defines the filtering mode for texture sampling when magnifying or minifying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterMode {
    /// Nearest-neighbor sampling.
    Nearest,
    /// Linear interpolation between texels (bilinear in 2D).
    Linear,
}

/// Defines the filtering mode for sampling between mipmap levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MipmapFilterMode {
    /// Selects the nearest mipmap level.
    Nearest,
    /// Linearly interpolates between the two nearest mipmap levels.
    Linear,
}

/// Flags describing how a texture will be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureUsage {
    bits: u32,
}

impl TextureUsage {
    /// The texture can be the source of a copy.
    pub const COPY_SRC: Self = Self { bits: 1 << 0 };
    /// The texture can be the destination of a copy.
    pub const COPY_DST: Self = Self { bits: 1 << 1 };
    /// The texture can be bound and sampled in a shader.
    pub const TEXTURE_BINDING: Self = Self { bits: 1 << 2 };
    /// The texture can be used as a color attachment of a render pass.
    pub const RENDER_ATTACHMENT: Self = Self { bits: 1 << 4 };

    /// Returns the raw bits.
    pub const fn bits(&self) -> u32 {
        self.bits
    }

    /// Combines two sets of flags.
    pub const fn union(self, other: Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    /// Checks whether every flag of `other` is set in `self`.
    pub const fn contains(&self, other: Self) -> bool {
        (self.bits & other.bits) == other.bits
    }
}

impl std::ops::BitOr for TextureUsage {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

/// A descriptor used to create a [`TextureId`].
#[derive(Debug, Clone, PartialEq)]
pub struct TextureDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// The dimensions of the texture.
    pub size: Extent3D,
    /// The number of mip levels.
    pub mip_level_count: u32,
    /// The number of samples per pixel.
    pub sample_count: SampleCount,
    /// The format of the texture's pixels.
    pub format: TextureFormat,
    /// How the texture will be used.
    pub usage: TextureUsage,
}

impl TextureDescriptor<'_> {
    /// Clones the descriptor into one that owns its label.
    pub fn into_owned(self) -> TextureDescriptor<'static> {
        TextureDescriptor {
            label: self.label.map(|l| Cow::Owned(l.into_owned())),
            size: self.size,
            mip_level_count: self.mip_level_count,
            sample_count: self.sample_count,
            format: self.format,
            usage: self.usage,
        }
    }
}

/// A descriptor used to create a [`SamplerId`].
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// Addressing along the U (horizontal) axis.
    pub address_mode_u: AddressMode,
    /// Addressing along the V (vertical) axis.
    pub address_mode_v: AddressMode,
    /// Addressing along the W (depth) axis.
    pub address_mode_w: AddressMode,
    /// Filter used when the texture is magnified.
    pub mag_filter: FilterMode,
    /// Filter used when the texture is minified.
    pub min_filter: FilterMode,
    /// Filter used between mipmap levels.
    pub mipmap_filter: MipmapFilterMode,
}

/// An opaque handle to a GPU texture resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub usize);

/// An opaque handle to a GPU sampler resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SamplerId(pub usize);
