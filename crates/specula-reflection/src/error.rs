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

//! Error type of the reflection pipeline.

use specula_core::renderer::{RenderError, ResourceError};

use crate::host::ViewerId;

/// Everything that can go wrong while preparing or rendering a reflection.
///
/// None of these are fatal: [`crate::PlanarMirror`] logs them and reports a
/// failed [`crate::RenderOutcome`] for the frame.
#[derive(thiserror::Error, Debug)]
pub enum MirrorError {
    /// A render target or sampler could not be created or destroyed.
    #[error("Render target error: {0}")]
    Resource(#[from] ResourceError),

    /// The host failed to render the helper camera.
    #[error("Helper camera render failed: {0}")]
    Render(#[from] RenderError),

    /// The host refused to create a helper camera.
    #[error("Host could not spawn a helper camera for viewer {0:?}")]
    HelperSpawnFailed(ViewerId),

    /// A RON configuration could not be parsed.
    #[error("Invalid mirror configuration: {0}")]
    ConfigParse(#[from] ron::error::SpannedError),

    /// A configuration could not be written as RON.
    #[error("Could not serialize mirror configuration: {0}")]
    ConfigSerialize(#[from] ron::Error),
}
