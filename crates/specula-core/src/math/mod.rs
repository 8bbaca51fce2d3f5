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

//! Provides the linear algebra used by the reflection pipeline.
//!
//! Everything here is right-handed: cameras look down their local `-Z` axis and
//! projection matrices map view depth into a `[0, 1]` clip range unless a
//! function explicitly states otherwise (e.g. [`Mat4::perspective_rh_no`]).
//!
//! All angular functions in this module operate in **radians**.

// --- Fundamental Constants ---

/// A small constant for floating-point comparisons.
pub const EPSILON: f32 = 1e-5;

pub use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI, TAU};

// --- Declare Sub-Modules ---

pub mod affine_transform;
pub mod color;
pub mod dimension;
pub mod matrix;
pub mod plane;
pub mod quaternion;
pub mod vector;

// --- Re-export Principal Types ---

pub use self::affine_transform::AffineTransform;
pub use self::color::LinearRgba;
pub use self::dimension::{Extent2D, Extent3D};
pub use self::matrix::Mat4;
pub use self::plane::Plane;
pub use self::quaternion::{EulerAngles, Quaternion};
pub use self::vector::{Vec3, Vec4};

// --- Utility Functions ---

/// Returns `1.0`, `-1.0` or `0.0` depending on the sign of `value`.
///
/// Unlike [`f32::signum`], zero maps to zero. The oblique clipping corner
/// relies on this: an axis the clip plane does not lean along contributes
/// nothing to the corner vector.
///
/// # Examples
///
/// ```
/// use specula_core::math::sign_or_zero;
/// assert_eq!(sign_or_zero(3.0), 1.0);
/// assert_eq!(sign_or_zero(-0.2), -1.0);
/// assert_eq!(sign_or_zero(0.0), 0.0);
/// ```
#[inline]
pub fn sign_or_zero(value: f32) -> f32 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}
