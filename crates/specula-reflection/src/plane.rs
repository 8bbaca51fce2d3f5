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

//! Derives the world-space reflection plane from a transform and a normal axis.

use specula_core::math::{AffineTransform, Plane, Vec3, EPSILON};

use crate::config::{MirrorConfig, NormalAxis};

/// The mirror plane for one render call. Never cached across frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReflectionPlane {
    /// A point on the plane, already pushed by the configured offset.
    pub position: Vec3,
    /// Unit normal. The reflected scene is the one on this side.
    pub normal: Vec3,
}

impl ReflectionPlane {
    /// The plane in Hessian form.
    pub fn to_plane(&self) -> Plane {
        Plane::from_point_normal(self.position, self.normal)
    }
}

/// Resolves the plane from the mirror's own transform and, if the
/// configuration points at another object, that object's transform.
///
/// `source` is `None` when the plane comes from the mirror itself or the
/// referenced object is gone.
pub fn resolve_plane(
    config: &MirrorConfig,
    mirror: &AffineTransform,
    source: Option<&AffineTransform>,
) -> ReflectionPlane {
    let plane_transform = source.unwrap_or(mirror);

    let (origin, axis) = match config.normal_axis {
        NormalAxis::Forward => (plane_transform.translation(), plane_transform.forward()),
        NormalAxis::Up => (plane_transform.translation(), plane_transform.up()),
        NormalAxis::Right => (plane_transform.translation(), plane_transform.right()),
        NormalAxis::CustomForward => (mirror.translation(), plane_transform.forward()),
    };

    let normal = if axis.length_squared() > EPSILON * EPSILON {
        axis.normalize()
    } else {
        log::warn!(
            "ReflectionPlane: {:?} axis of the plane transform is degenerate, using +Y",
            config.normal_axis
        );
        Vec3::Y
    };

    ReflectionPlane {
        position: origin + normal * config.plane_offset,
        normal,
    }
}
