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

//! Provides a Quaternion type for representing 3D rotations, and the
//! Y-X-Z euler decomposition used to orient helper cameras.

use approx::AbsDiffEq;
use serde::{Deserialize, Serialize};

use super::{Mat4, Vec3, EPSILON};
use std::ops::{Mul, MulAssign, Neg};

/// Represents a quaternion for 3D rotations.
///
/// A quaternion is stored as `(x, y, z, w)`, where `[x, y, z]` is the "vector" part
/// and `w` is the "scalar" part. For representing rotations, it should be a "unit
/// quaternion" where `x² + y² + z² + w² = 1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(C)]
pub struct Quaternion {
    /// The x component of the vector part.
    pub x: f32,
    /// The y component of the vector part.
    pub y: f32,
    /// The z component of the vector part.
    pub z: f32,
    /// The scalar (real) part.
    pub w: f32,
}

/// Euler angles in radians, applied in Y-X-Z order (yaw, then pitch, then roll).
///
/// This matches the usual camera convention: `yaw` turns around the world up
/// axis, `pitch` tilts around the camera's right axis, `roll` spins around its
/// view axis.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EulerAngles {
    /// Rotation around the X-axis.
    pub pitch: f32,
    /// Rotation around the Y-axis.
    pub yaw: f32,
    /// Rotation around the Z-axis.
    pub roll: f32,
}

impl EulerAngles {
    /// Creates a new set of euler angles.
    #[inline]
    pub const fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Self { pitch, yaw, roll }
    }
}

impl Quaternion {
    /// The identity quaternion, representing no rotation.
    pub const IDENTITY: Quaternion = Quaternion {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    /// Creates a new quaternion from its raw components.
    ///
    /// Note: This does not guarantee a unit quaternion.
    #[inline]
    pub fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Creates a quaternion representing a rotation around a given axis by a given angle.
    #[inline]
    pub fn from_axis_angle(axis: Vec3, angle_radians: f32) -> Self {
        let normalized_axis = axis.normalize();
        let (s, c) = (angle_radians * 0.5).sin_cos();
        Self {
            x: normalized_axis.x * s,
            y: normalized_axis.y * s,
            z: normalized_axis.z * s,
            w: c,
        }
    }

    /// Creates a quaternion from a 4x4 rotation matrix.
    ///
    /// Only the upper 3x3 part is considered, and it must be a proper rotation
    /// (determinant +1). Reflections have no quaternion form.
    pub fn from_rotation_matrix(m: &Mat4) -> Self {
        let m00 = m.cols[0].x;
        let m10 = m.cols[0].y;
        let m20 = m.cols[0].z;
        let m01 = m.cols[1].x;
        let m11 = m.cols[1].y;
        let m21 = m.cols[1].z;
        let m02 = m.cols[2].x;
        let m12 = m.cols[2].y;
        let m22 = m.cols[2].z;

        let trace = m00 + m11 + m22;
        let mut q = Self::IDENTITY;

        if trace > 0.0 {
            let s = 2.0 * (trace + 1.0).sqrt();
            q.w = 0.25 * s;
            q.x = (m21 - m12) / s;
            q.y = (m02 - m20) / s;
            q.z = (m10 - m01) / s;
        } else if m00 > m11 && m00 > m22 {
            let s = 2.0 * (1.0 + m00 - m11 - m22).sqrt();
            q.w = (m21 - m12) / s;
            q.x = 0.25 * s;
            q.y = (m01 + m10) / s;
            q.z = (m02 + m20) / s;
        } else if m11 > m22 {
            let s = 2.0 * (1.0 + m11 - m00 - m22).sqrt();
            q.w = (m02 - m20) / s;
            q.x = (m01 + m10) / s;
            q.y = 0.25 * s;
            q.z = (m12 + m21) / s;
        } else {
            let s = 2.0 * (1.0 + m22 - m00 - m11).sqrt();
            q.w = (m10 - m01) / s;
            q.x = (m02 + m20) / s;
            q.y = (m12 + m21) / s;
            q.z = 0.25 * s;
        }
        q.normalize()
    }

    /// Composes a rotation from Y-X-Z euler angles: `Ry(yaw) * Rx(pitch) * Rz(roll)`.
    #[inline]
    pub fn from_euler(angles: EulerAngles) -> Self {
        Self::from_axis_angle(Vec3::Y, angles.yaw)
            * Self::from_axis_angle(Vec3::X, angles.pitch)
            * Self::from_axis_angle(Vec3::Z, angles.roll)
    }

    /// Decomposes the rotation into Y-X-Z euler angles.
    ///
    /// Pitch lands in `[-PI/2, PI/2]`. At the poles (pitch of ±90°) yaw and roll
    /// are coupled; roll is then reported as zero and the whole turn goes to yaw.
    pub fn to_euler(&self) -> EulerAngles {
        let q = self.normalize();
        let (x, y, z, w) = (q.x, q.y, q.z, q.w);

        let m12 = 2.0 * (y * z - w * x);
        let sin_pitch = (-m12).clamp(-1.0, 1.0);
        let pitch = sin_pitch.asin();

        if sin_pitch.abs() < 1.0 - EPSILON {
            let m02 = 2.0 * (x * z + w * y);
            let m22 = 1.0 - 2.0 * (x * x + y * y);
            let m10 = 2.0 * (x * y + w * z);
            let m11 = 1.0 - 2.0 * (x * x + z * z);
            EulerAngles {
                pitch,
                yaw: m02.atan2(m22),
                roll: m10.atan2(m11),
            }
        } else {
            // Gimbal lock.
            let m20 = 2.0 * (x * z - w * y);
            let m00 = 1.0 - 2.0 * (y * y + z * z);
            EulerAngles {
                pitch,
                yaw: (-m20).atan2(m00),
                roll: 0.0,
            }
        }
    }

    /// Calculates the squared length (magnitude) of the quaternion.
    #[inline]
    pub fn magnitude_squared(&self) -> f32 {
        self.dot(*self)
    }

    /// Returns a normalized version of the quaternion with a length of 1.
    /// If the quaternion has a near-zero magnitude, it returns the identity quaternion.
    pub fn normalize(&self) -> Self {
        let mag_sq = self.magnitude_squared();
        if mag_sq > EPSILON {
            let inv_mag = 1.0 / mag_sq.sqrt();
            Self {
                x: self.x * inv_mag,
                y: self.y * inv_mag,
                z: self.z * inv_mag,
                w: self.w * inv_mag,
            }
        } else {
            Self::IDENTITY
        }
    }

    /// Computes the inverse of the quaternion.
    /// For a unit quaternion, the inverse is equal to its conjugate.
    #[inline]
    pub fn inverse(&self) -> Self {
        let mag_squared = self.magnitude_squared();
        if mag_squared > EPSILON {
            let inv = 1.0 / mag_squared;
            Self::new(-self.x * inv, -self.y * inv, -self.z * inv, self.w * inv)
        } else {
            Self::IDENTITY
        }
    }

    /// Computes the dot product of two quaternions.
    #[inline]
    pub fn dot(&self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w
    }

    /// Returns `true` if `self` and `other` describe the same rotation.
    ///
    /// `q` and `-q` are the same rotation, so both signs are accepted.
    #[inline]
    pub fn same_rotation(&self, other: Self, epsilon: f32) -> bool {
        self.dot(other).abs() > 1.0 - epsilon
    }
}

impl Default for Quaternion {
    /// Returns the identity quaternion.
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul<Quaternion> for Quaternion {
    type Output = Self;
    /// Combines two rotations using the Hamilton product.
    /// Note that quaternion multiplication is not commutative.
    #[inline]
    fn mul(self, rhs: Self) -> Self::Output {
        Self {
            x: self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            y: self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            z: self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
            w: self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
        }
    }
}

impl MulAssign<Quaternion> for Quaternion {
    #[inline]
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl Mul<Vec3> for Quaternion {
    type Output = Vec3;
    /// Rotates a `Vec3` by this quaternion.
    #[inline]
    fn mul(self, rhs: Vec3) -> Self::Output {
        let q = self.normalize();
        let u = Vec3::new(q.x, q.y, q.z);
        let s = q.w;
        2.0 * u.dot(rhs) * u + (s * s - u.dot(u)) * rhs + 2.0 * s * u.cross(rhs)
    }
}

impl Neg for Quaternion {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y, -self.z, -self.w)
    }
}

impl AbsDiffEq for Quaternion {
    type Epsilon = f32;

    fn default_epsilon() -> Self::Epsilon {
        EPSILON
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.x.abs_diff_eq(&other.x, epsilon)
            && self.y.abs_diff_eq(&other.y, epsilon)
            && self.z.abs_diff_eq(&other.z, epsilon)
            && self.w.abs_diff_eq(&other.w, epsilon)
    }
}
