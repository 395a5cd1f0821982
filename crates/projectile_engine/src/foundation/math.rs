//! Math utilities and types
//!
//! Provides the double precision vector types used by the kinematic model and
//! the emitter scheduler. Everything that accumulates over long frame ranges
//! stays in `f64`.

pub use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// 3D vector type
pub type Vec3 = Vector3<f64>;

/// Position and Euler rotation of an object at one instant
///
/// Poses are immutable snapshots; the simulation creates new ones instead of
/// mutating host state.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    /// Location in world space
    pub position: Vec3,

    /// Euler rotation in radians (XYZ order)
    pub rotation: Vec3,
}

impl Pose {
    /// Create a pose from a position and Euler rotation
    pub const fn new(position: Vec3, rotation: Vec3) -> Self {
        Self { position, rotation }
    }

    /// Create a pose with only a position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            rotation: Vec3::zeros(),
        }
    }

    /// Check that every component is a finite number
    pub fn is_finite(&self) -> bool {
        self.position.iter().chain(self.rotation.iter()).all(|x| x.is_finite())
    }
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f64 = std::f64::consts::PI;

    /// Pi / 2
    pub const HALF_PI: f64 = PI * 0.5;

    /// Standard gravity along -Z, in metres per second squared
    pub const STANDARD_GRAVITY: f64 = 9.81;

    /// Below this length a direction vector is treated as zero
    pub const DIRECTION_EPSILON: f64 = 1.0e-12;
}

/// Math utility functions
pub mod utils {
    use super::{constants, Vec3};

    /// Normalize a direction, returning `None` for (near) zero vectors
    ///
    /// Ray casts go through this so that a degenerate segment never produces
    /// NaN components.
    pub fn safe_direction(v: &Vec3) -> Option<Vec3> {
        v.try_normalize(constants::DIRECTION_EPSILON)
    }
}
