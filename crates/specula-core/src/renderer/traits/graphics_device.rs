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

//! Defines the `GraphicsDevice` trait, the resource-management contract of a rendering backend.

use crate::renderer::api::{SamplerDescriptor, SamplerId, TextureDescriptor, TextureId};
use crate::renderer::error::ResourceError;
use std::fmt::Debug;

/// The resource-management half of a graphics backend.
///
/// Only the operations needed by offscreen render targets are part of this
/// contract. A backend owns the actual GPU objects; callers only ever see the
/// opaque IDs.
pub trait GraphicsDevice: Send + Sync + Debug + 'static {
    /// Creates a new GPU texture.
    /// ## Arguments
    /// * `descriptor` - A reference to a `TextureDescriptor` containing the texture configuration.
    /// ## Returns
    /// A `Result` containing the ID of the created texture or an error if the creation fails.
    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<TextureId, ResourceError>;

    /// Destroys a GPU texture.
    /// ## Arguments
    /// * `id` - The ID of the texture to be destroyed.
    /// ## Returns
    /// A `Result` indicating success or failure of the operation.
    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError>;

    /// Recreates the backing storage of an existing texture after it was lost,
    /// keeping the same ID.
    /// ## Arguments
    /// * `id` - The texture whose storage must be rebuilt.
    /// * `descriptor` - The descriptor the texture was originally created with.
    fn recreate_texture(
        &self,
        id: TextureId,
        descriptor: &TextureDescriptor,
    ) -> Result<(), ResourceError>;

    /// Returns `true` if the texture still has valid GPU storage.
    ///
    /// Storage can disappear without the texture being destroyed, e.g. when
    /// the graphics context is lost and rebuilt.
    fn is_texture_resident(&self, id: TextureId) -> bool;

    /// Creates a new sampler.
    /// ## Arguments
    /// * `descriptor` - A reference to a `SamplerDescriptor` containing the sampler configuration.
    fn create_sampler(&self, descriptor: &SamplerDescriptor) -> Result<SamplerId, ResourceError>;

    /// Destroys a sampler.
    /// ## Arguments
    /// * `id` - The ID of the sampler to be destroyed.
    fn destroy_sampler(&self, id: SamplerId) -> Result<(), ResourceError>;
}
