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

//! Material handles and per-instance shading parameters.

use serde::{Deserialize, Serialize};

use crate::renderer::api::TextureId;

/// An opaque handle to a material owned by the host (e.g. a skybox material).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MaterialId(pub usize);

/// A per-instance block of named shading inputs, applied on top of a
/// surface's shared material without modifying it.
///
/// Only texture inputs are tracked. Insertion order is preserved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShadingParameters {
    textures: Vec<(String, TextureId)>,
}

impl ShadingParameters {
    /// Creates an empty block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `texture` under `name`, replacing any previous binding.
    ///
    /// An empty name is ignored and `false` is returned.
    pub fn set_texture(&mut self, name: &str, texture: TextureId) -> bool {
        if name.is_empty() {
            return false;
        }
        match self.textures.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = texture,
            None => self.textures.push((name.to_owned(), texture)),
        }
        true
    }

    /// Returns the texture bound under `name`.
    pub fn texture(&self, name: &str) -> Option<TextureId> {
        self.textures
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| *t)
    }

    /// Iterates over all bound textures.
    pub fn textures(&self) -> impl Iterator<Item = (&str, TextureId)> {
        self.textures.iter().map(|(n, t)| (n.as_str(), *t))
    }

    /// Removes every binding. The block itself stays attached to its surface.
    pub fn clear(&mut self) {
        self.textures.clear();
    }

    /// Returns `true` if nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_texture_replaces_existing_binding() {
        let mut block = ShadingParameters::new();
        assert!(block.set_texture("_Tex", TextureId(1)));
        assert!(block.set_texture("_Tex", TextureId(2)));
        assert_eq!(block.texture("_Tex"), Some(TextureId(2)));
        assert_eq!(block.textures().count(), 1);
    }

    #[test]
    fn empty_names_are_skipped() {
        let mut block = ShadingParameters::new();
        assert!(!block.set_texture("", TextureId(1)));
        assert!(block.is_empty());
    }

    #[test]
    fn clear_empties_the_block() {
        let mut block = ShadingParameters::new();
        block.set_texture("_A", TextureId(1));
        block.set_texture("_B", TextureId(2));
        block.clear();
        assert!(block.is_empty());
        assert_eq!(block.texture("_A"), None);
    }
}
