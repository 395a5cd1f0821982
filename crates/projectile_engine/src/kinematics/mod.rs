//! Closed-form kinematic model
//!
//! Positions follow `s + v*dt + 0.5*g*dt^2` and rotations `r + w*dt`, where
//! `dt` is the elapsed frame count divided by the frame rate. All functions
//! here are pure and evaluate the closed form directly for any frame.

pub mod spherical;

use crate::foundation::math::{constants, Pose, Vec3};

/// Convert an elapsed frame count into seconds
#[inline]
pub fn frames_to_seconds(t_frames: f64, frame_rate: f64) -> f64 {
    t_frames / frame_rate
}

/// Position after `t_frames` frames of ballistic flight
///
/// `t_frames` may be negative to sample earlier frames. Pass a zero gravity
/// vector when gravity is disabled.
pub fn displace(initial: Vec3, velocity: Vec3, t_frames: f64, frame_rate: f64, gravity: Vec3) -> Vec3 {
    let dt = frames_to_seconds(t_frames, frame_rate);
    initial + velocity * dt + gravity * (0.5 * dt * dt)
}

/// Euler rotation after `t_frames` frames of constant angular velocity
pub fn rotate(initial: Vec3, angular_velocity: Vec3, t_frames: f64, frame_rate: f64) -> Vec3 {
    initial + angular_velocity * frames_to_seconds(t_frames, frame_rate)
}

/// Velocity of an object from its positions on two consecutive frames
pub fn finite_difference_velocity(current: Vec3, previous: Vec3, frame_rate: f64) -> Vec3 {
    (current - previous) * frame_rate
}

/// Scene-wide parameters the kinematic model depends on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicParams {
    /// Frames per second of the timeline
    pub frame_rate: f64,
    /// Effective gravity (zero when gravity is disabled)
    pub gravity: Vec3,
}

impl Default for KinematicParams {
    fn default() -> Self {
        Self::new(24.0, Vec3::new(0.0, 0.0, -constants::STANDARD_GRAVITY))
    }
}

impl KinematicParams {
    /// Create parameters from a frame rate and gravity vector
    pub const fn new(frame_rate: f64, gravity: Vec3) -> Self {
        Self { frame_rate, gravity }
    }

    /// Parameters for a scene without gravity
    pub fn weightless(frame_rate: f64) -> Self {
        Self::new(frame_rate, Vec3::zeros())
    }

    /// Position after `t_frames` frames
    pub fn displace(&self, initial: Vec3, velocity: Vec3, t_frames: f64) -> Vec3 {
        displace(initial, velocity, t_frames, self.frame_rate, self.gravity)
    }

    /// Rotation after `t_frames` frames
    pub fn rotate(&self, initial: Vec3, angular_velocity: Vec3, t_frames: f64) -> Vec3 {
        rotate(initial, angular_velocity, t_frames, self.frame_rate)
    }

    /// Full pose after `t_frames` frames
    pub fn advance(&self, initial: &Pose, velocity: Vec3, angular_velocity: Vec3, t_frames: f64) -> Pose {
        Pose::new(
            self.displace(initial.position, velocity, t_frames),
            self.rotate(initial.rotation, angular_velocity, t_frames),
        )
    }

    /// Velocity from positions one frame apart
    pub fn finite_difference(&self, current: Vec3, previous: Vec3) -> Vec3 {
        finite_difference_velocity(current, previous, self.frame_rate)
    }
}
