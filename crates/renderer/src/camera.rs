//! Fly camera for the scene, driven by the window loop.
//!
//! The rig keeps the mutable yaw/pitch state and hands the renderer an
//! immutable [`CameraSnapshot`] each frame, so nothing downstream can poke at
//! camera internals mid-frame. Basis updates guard against non-finite input:
//! a NaN yaw or pitch leaves the previously computed vectors untouched rather
//! than letting NaN bleed into the shaders.

use glam::Vec3;

pub const YAW_DEFAULT: f32 = -90.0;
pub const PITCH_DEFAULT: f32 = 0.0;
pub const SENSITIVITY_DEFAULT: f32 = 0.1;
const PITCH_LIMIT: f32 = 89.0;

/// Read-only per-frame view of the camera basis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraSnapshot {
    pub position: Vec3,
    pub front: Vec3,
    pub up: Vec3,
    pub right: Vec3,
}

/// Movement directions understood by [`CameraRig::advance`].
///
/// Vertical movement follows the world up axis, not the camera's tilted up,
/// so flying stays level while looking around.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Movement {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

/// Euler-angle camera rig.
pub struct CameraRig {
    position: Vec3,
    world_up: Vec3,
    yaw: f32,
    pitch: f32,
    front: Vec3,
    up: Vec3,
    right: Vec3,
    sensitivity: f32,
}

impl CameraRig {
    pub fn new(position: Vec3, yaw: f32, pitch: f32) -> Self {
        let mut rig = Self {
            position,
            world_up: Vec3::Y,
            yaw,
            pitch,
            front: Vec3::NEG_Z,
            up: Vec3::Y,
            right: Vec3::X,
            sensitivity: SENSITIVITY_DEFAULT,
        };
        rig.update_basis();
        rig
    }

    pub fn snapshot(&self) -> CameraSnapshot {
        CameraSnapshot {
            position: self.position,
            front: self.front,
            up: self.up,
            right: self.right,
        }
    }

    /// Applies a mouse delta in screen units; positive `dy` looks up.
    pub fn apply_mouse(&mut self, dx: f32, dy: f32) {
        if !dx.is_finite() || !dy.is_finite() {
            tracing::warn!(dx, dy, "ignoring non-finite mouse delta");
            return;
        }
        self.yaw += dx * self.sensitivity;
        self.pitch = (self.pitch + dy * self.sensitivity).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.update_basis();
    }

    /// Moves the camera by `amount` world units along a basis direction.
    pub fn advance(&mut self, movement: Movement, amount: f32) {
        if !amount.is_finite() {
            return;
        }
        let step = match movement {
            Movement::Forward => self.front * amount,
            Movement::Backward => -self.front * amount,
            Movement::Right => self.right * amount,
            Movement::Left => -self.right * amount,
            Movement::Up => self.world_up * amount,
            Movement::Down => -self.world_up * amount,
        };
        self.position += step;
    }

    fn update_basis(&mut self) {
        if !self.yaw.is_finite() || !self.pitch.is_finite() {
            tracing::warn!(
                yaw = self.yaw,
                pitch = self.pitch,
                "non-finite camera angles; keeping previous basis"
            );
            return;
        }
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        let front = Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        );
        if !front.is_finite() || front.length_squared() == 0.0 {
            tracing::warn!("degenerate camera front vector; keeping previous basis");
            return;
        }
        self.front = front.normalize();
        self.right = self.front.cross(self.world_up).normalize();
        self.up = self.right.cross(self.front).normalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Vec3, b: Vec3) {
        assert!((a - b).length() < 1e-5, "{a:?} != {b:?}");
    }

    #[test]
    fn default_orientation_looks_down_negative_z() {
        let rig = CameraRig::new(Vec3::ZERO, YAW_DEFAULT, PITCH_DEFAULT);
        let snap = rig.snapshot();
        assert_close(snap.front, Vec3::NEG_Z);
        assert_close(snap.right, Vec3::X);
        assert_close(snap.up, Vec3::Y);
    }

    #[test]
    fn basis_stays_orthonormal_after_mouse_input() {
        let mut rig = CameraRig::new(Vec3::ZERO, YAW_DEFAULT, PITCH_DEFAULT);
        rig.apply_mouse(123.0, -47.0);
        let snap = rig.snapshot();
        assert!((snap.front.length() - 1.0).abs() < 1e-5);
        assert!(snap.front.dot(snap.right).abs() < 1e-5);
        assert!(snap.front.dot(snap.up).abs() < 1e-5);
        assert!(snap.right.dot(snap.up).abs() < 1e-5);
    }

    #[test]
    fn pitch_is_clamped() {
        let mut rig = CameraRig::new(Vec3::ZERO, YAW_DEFAULT, PITCH_DEFAULT);
        rig.apply_mouse(0.0, 10_000.0);
        let snap = rig.snapshot();
        // At the clamp the front vector still has a horizontal component.
        assert!(snap.front.y < 1.0);
        assert!(snap.front.y > 0.99);
    }

    #[test]
    fn nan_mouse_delta_keeps_previous_basis() {
        let mut rig = CameraRig::new(Vec3::ZERO, YAW_DEFAULT, PITCH_DEFAULT);
        rig.apply_mouse(30.0, 10.0);
        let before = rig.snapshot();
        rig.apply_mouse(f32::NAN, 0.0);
        rig.apply_mouse(0.0, f32::NAN);
        let after = rig.snapshot();
        assert_eq!(before.front, after.front);
        assert_eq!(before.right, after.right);
        assert_eq!(before.up, after.up);
    }

    #[test]
    fn nan_movement_is_ignored() {
        let mut rig = CameraRig::new(Vec3::ZERO, YAW_DEFAULT, PITCH_DEFAULT);
        rig.advance(Movement::Forward, f32::NAN);
        assert_eq!(rig.snapshot().position, Vec3::ZERO);
        rig.advance(Movement::Up, 5.0);
        assert_close(rig.snapshot().position, Vec3::new(0.0, 5.0, 0.0));
    }
}
