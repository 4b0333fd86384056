// Minimal 3D math used by the animators and the camera-driven scenarios.
//
// Conventions follow the scene the simulation was built for: +Y is up, yaw
// rotates around +Y in degrees, and a zero yaw looks down +Z.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Neg, Sub};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);
    pub const UP: Vec3 = Vec3::new(0.0, 1.0, 0.0);
    pub const FORWARD: Vec3 = Vec3::new(0.0, 0.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn distance(self, other: Vec3) -> f32 {
        (self - other).length()
    }

    /// Unit vector in the same direction, or zero for a zero-length input.
    pub fn normalized(self) -> Vec3 {
        let len = self.length();
        if len <= f32::EPSILON {
            Vec3::ZERO
        } else {
            self * (1.0 / len)
        }
    }

    /// Linear interpolation with `t` clamped to `0.0..=1.0`.
    pub fn lerp(self, to: Vec3, t: f32) -> Vec3 {
        let t = t.clamp(0.0, 1.0);
        // Weighted form so that `t == 1.0` lands exactly on `to`.
        Vec3::new(
            self.x * (1.0 - t) + to.x * t,
            self.y * (1.0 - t) + to.y * t,
            self.z * (1.0 - t) + to.z * t,
        )
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;

    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;

    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

/// Unit quaternion rotation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Quat {
    fn default() -> Self {
        Quat::IDENTITY
    }
}

impl Quat {
    pub const IDENTITY: Quat = Quat {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    /// Builds a rotation from Euler angles in degrees, applied Z, then X, then Y.
    pub fn from_euler_degrees(pitch: f32, yaw: f32, roll: f32) -> Quat {
        let (sx, cx) = (pitch.to_radians() * 0.5).sin_cos();
        let (sy, cy) = (yaw.to_radians() * 0.5).sin_cos();
        let (sz, cz) = (roll.to_radians() * 0.5).sin_cos();

        Quat {
            x: cy * sx * cz + sy * cx * sz,
            y: sy * cx * cz - cy * sx * sz,
            z: cy * cx * sz - sy * sx * cz,
            w: cy * cx * cz + sy * sx * sz,
        }
    }

    /// Rotation whose forward axis points along `direction` with +Y kept up.
    pub fn look_rotation(direction: Vec3) -> Quat {
        let dir = direction.normalized();
        if dir == Vec3::ZERO {
            return Quat::IDENTITY;
        }
        let yaw = dir.x.atan2(dir.z).to_degrees();
        let pitch = (-dir.y).asin().to_degrees();
        Quat::from_euler_degrees(pitch, yaw, 0.0)
    }

    pub fn dot(self, other: Quat) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w
    }

    pub fn normalized(self) -> Quat {
        let len = self.dot(self).sqrt();
        if len <= f32::EPSILON {
            return Quat::IDENTITY;
        }
        Quat {
            x: self.x / len,
            y: self.y / len,
            z: self.z / len,
            w: self.w / len,
        }
    }

    /// Normalized linear interpolation along the shortest arc, `t` clamped.
    pub fn nlerp(self, to: Quat, t: f32) -> Quat {
        let t = t.clamp(0.0, 1.0);
        // Flip the target into the same hemisphere to take the short way round.
        let to = if self.dot(to) < 0.0 {
            Quat {
                x: -to.x,
                y: -to.y,
                z: -to.z,
                w: -to.w,
            }
        } else {
            to
        };
        Quat {
            x: self.x + (to.x - self.x) * t,
            y: self.y + (to.y - self.y) * t,
            z: self.z + (to.z - self.z) * t,
            w: self.w + (to.w - self.w) * t,
        }
        .normalized()
    }
}

/// Position, rotation and scale of a scene object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }
}

/// Shortest signed difference between two angles in degrees, in `(-180, 180]`.
pub fn delta_angle(from: f32, to: f32) -> f32 {
    let mut delta = (to - from).rem_euclid(360.0);
    if delta > 180.0 {
        delta -= 360.0;
    }
    delta
}

/// Forward vector for a camera with the given yaw and pitch (degrees, pitch down positive).
pub fn forward_from_angles(yaw: f32, pitch: f32) -> Vec3 {
    let (sy, cy) = yaw.to_radians().sin_cos();
    let (sp, cp) = pitch.to_radians().sin_cos();
    Vec3::new(cp * sy, -sp, cp * cy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_angle_wraps_to_shortest_arc() {
        assert_eq!(delta_angle(350.0, 10.0), 20.0);
        assert_eq!(delta_angle(10.0, 350.0), -20.0);
        assert_eq!(delta_angle(0.0, 180.0), 180.0);
        assert_eq!(delta_angle(90.0, -90.0), 180.0);
    }

    #[test]
    fn lerp_clamps_its_factor() {
        let a = Vec3::ZERO;
        let b = Vec3::new(2.0, 0.0, 0.0);
        assert_eq!(a.lerp(b, 0.5), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(a.lerp(b, 3.0), b);
        assert_eq!(a.lerp(b, -1.0), a);
    }

    #[test]
    fn look_rotation_matches_forward_angles() {
        let forward = forward_from_angles(90.0, 0.0);
        assert!((forward.x - 1.0).abs() < 1e-5);
        assert!(forward.z.abs() < 1e-5);

        let q = Quat::look_rotation(forward);
        let expected = Quat::from_euler_degrees(0.0, 90.0, 0.0);
        assert!(q.dot(expected).abs() > 0.9999);
    }

    #[test]
    fn nlerp_reaches_target_at_one() {
        let from = Quat::IDENTITY;
        let to = Quat::from_euler_degrees(-90.0, 0.0, 0.0);
        let end = from.nlerp(to, 1.0);
        assert!(end.dot(to).abs() > 0.9999);
    }
}
