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

//! Planar mirror reflections.
//!
//! A [`PlanarMirror`] renders the scene as seen from a viewer mirrored across
//! a plane, into its own offscreen targets, and hands those targets to the
//! reflective surface's shading inputs. The engine hosting it implements
//! [`ReflectionHost`] and forwards its visibility, per-frame and editor
//! callbacks.
//!
//! The pieces are usable on their own:
//! - [`plane`] derives the reflection plane from a transform.
//! - [`reflection_math`] builds the reflection matrix and oblique projections.
//! - [`targets`] owns the mono and per-eye render targets.
//! - [`camera`] configures and renders the hidden helper cameras.

#![warn(missing_docs)]

pub mod camera;
pub mod config;
pub mod error;
pub mod host;
pub mod lifecycle;
pub mod mirror;
pub mod plane;
pub mod quality;
pub mod reflection_math;
pub mod targets;

pub use camera::{configure_helper_view, HelperCamera, HelperCameras};
pub use config::{
    ClearMode, MirrorConfig, NormalAxis, PlaneSource, DEFAULT_LEFT_SLOT, DEFAULT_RIGHT_SLOT,
};
pub use error::MirrorError;
pub use host::{
    CameraHandle, Eye, EyeView, ObjectId, ReflectionHost, StereoViews, Viewer, ViewerId,
};
pub use lifecycle::Lifecycle;
pub use mirror::{MirrorStats, PlanarMirror, RenderOutcome, SkipReason};
pub use plane::{resolve_plane, ReflectionPlane};
pub use quality::{QualityOverrides, QualityScope};
pub use reflection_math::DepthRange;
pub use targets::{ReflectionTargets, RenderTarget, TargetSlot};
