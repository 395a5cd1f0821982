//! Emitter configuration and validation
//!
//! Configuration is plain serde data. Out-of-range values are rejected when
//! a change is applied, so the scheduler never sees an invalid config.

use crate::foundation::math::{Pose, Vec3};
use crate::foundation::time::{Frame, FrameRange};
use crate::kinematics::spherical::{Spherical, VelocityEditor, VelocityValue};
use serde::{Deserialize, Serialize};

/// Rigid body collision shape given to instances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionShapeKind {
    /// Axis-aligned box
    Box,
    /// Sphere
    Sphere,
    /// Capsule
    Capsule,
    /// Cylinder
    Cylinder,
    /// Cone
    Cone,
    /// Convex hull of the mesh
    #[default]
    ConvexHull,
    /// Exact triangle mesh
    Mesh,
}

/// Rigid body material copied onto every instance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialParams {
    /// Sliding friction
    pub friction: f64,
    /// Bounciness
    pub restitution: f64,
    /// Collision shape
    pub collision_shape: CollisionShapeKind,
}

impl Default for MaterialParams {
    fn default() -> Self {
        Self {
            friction: 0.5,
            restitution: 0.0,
            collision_shape: CollisionShapeKind::ConvexHull,
        }
    }
}

/// Initial pose and velocities of a projectile
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionSpec {
    /// Launch pose
    pub initial: Pose,
    /// Linear velocity in units per second
    pub linear_velocity: Vec3,
    /// Angular velocity in radians per second
    pub angular_velocity: Vec3,
}

impl MotionSpec {
    /// Create a motion spec
    pub const fn new(initial: Pose, linear_velocity: Vec3, angular_velocity: Vec3) -> Self {
        Self {
            initial,
            linear_velocity,
            angular_velocity,
        }
    }

    /// Take the object's current pose as the launch pose
    pub fn apply_transforms(&mut self, pose: Pose) {
        self.initial = pose;
    }

    /// Linear velocity in spherical form
    pub fn spherical_velocity(&self) -> Spherical {
        VelocityEditor::from_cartesian(self.linear_velocity).spherical()
    }

    /// Edit the linear velocity through either representation
    pub fn set_velocity(&mut self, value: VelocityValue) {
        let mut editor = VelocityEditor::from_cartesian(self.linear_velocity);
        editor.edit(value);
        self.linear_velocity = editor.cartesian();
    }

    fn is_finite(&self) -> bool {
        self.initial.is_finite()
            && self
                .linear_velocity
                .iter()
                .chain(self.angular_velocity.iter())
                .all(|x| x.is_finite())
    }
}

/// Rejected emitter configuration
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum EmitterConfigError {
    /// Instance count below one
    #[error("instance count must be at least 1, got {0}")]
    NonPositiveInstanceCount(i64),

    /// End frame before start frame
    #[error("end frame {end} is before start frame {start}")]
    EndBeforeStart {
        /// Configured start
        start: Frame,
        /// Configured end
        end: Frame,
    },

    /// Negative lifetime
    #[error("lifetime must not be negative, got {0}")]
    NegativeLifetime(Frame),

    /// NaN or infinite motion values
    #[error("motion values must be finite")]
    NonFiniteMotion,

    /// Negative or non-finite material values
    #[error("invalid material: {0}")]
    InvalidMaterial(String),
}

/// Emitter settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    /// First frame instances may spawn on
    pub start_frame: Frame,
    /// Last frame of the emission range, inclusive
    pub end_frame: Frame,
    /// Number of instances to spread over the range
    pub instance_count: i64,
    /// Frames an instance lives; 0 means forever
    pub lifetime: Frame,
    /// Hide instances on the frame before they spawn
    pub start_hidden: bool,
    /// Launch velocities
    pub motion: MotionSpec,
    /// Rigid body material for instances
    pub material: MaterialParams,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            start_frame: 1,
            end_frame: 50,
            instance_count: 1,
            lifetime: 0,
            start_hidden: false,
            motion: MotionSpec::default(),
            material: MaterialParams::default(),
        }
    }
}

impl EmitterConfig {
    /// Set the emission range
    pub fn with_range(mut self, start_frame: Frame, end_frame: Frame) -> Self {
        self.start_frame = start_frame;
        self.end_frame = end_frame;
        self
    }

    /// Set the instance count
    pub fn with_instance_count(mut self, count: i64) -> Self {
        self.instance_count = count;
        self
    }

    /// Set the instance lifetime
    pub fn with_lifetime(mut self, lifetime: Frame) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Hide instances before they spawn
    pub fn with_start_hidden(mut self, start_hidden: bool) -> Self {
        self.start_hidden = start_hidden;
        self
    }

    /// Set the launch motion
    pub fn with_motion(mut self, motion: MotionSpec) -> Self {
        self.motion = motion;
        self
    }

    /// Set the instance material
    pub fn with_material(mut self, material: MaterialParams) -> Self {
        self.material = material;
        self
    }

    /// Check every field
    pub fn validate(&self) -> Result<(), EmitterConfigError> {
        if self.instance_count < 1 {
            return Err(EmitterConfigError::NonPositiveInstanceCount(self.instance_count));
        }

        if self.end_frame < self.start_frame {
            return Err(EmitterConfigError::EndBeforeStart {
                start: self.start_frame,
                end: self.end_frame,
            });
        }

        if self.lifetime < 0 {
            return Err(EmitterConfigError::NegativeLifetime(self.lifetime));
        }

        if !self.motion.is_finite() {
            return Err(EmitterConfigError::NonFiniteMotion);
        }

        let material = &self.material;
        if !(material.friction.is_finite() && material.friction >= 0.0) {
            return Err(EmitterConfigError::InvalidMaterial(format!("friction {}", material.friction)));
        }
        if !(material.restitution.is_finite() && material.restitution >= 0.0) {
            return Err(EmitterConfigError::InvalidMaterial(format!(
                "restitution {}",
                material.restitution
            )));
        }

        Ok(())
    }

    /// Frames on which instances spawn, strictly increasing
    ///
    /// Spreads `min(end - start, instance_count)` spawns evenly over the
    /// range, so no two instances share a frame. A zero-length range spawns
    /// a single instance on the start frame.
    pub fn spawn_frames(&self) -> Vec<Frame> {
        let total = self.frame_range().span();
        if total < 0 || self.instance_count < 1 {
            return Vec::new();
        }

        let count = total.max(1).min(self.instance_count);
        let step = total as f64 / count as f64;
        let mut frames: Vec<Frame> = (0..count)
            .map(|i| self.start_frame + (i as f64 * step).floor() as Frame)
            .collect();
        frames.dedup();
        frames
    }

    /// Frames the scheduler steps through
    pub const fn frame_range(&self) -> FrameRange {
        FrameRange::new(self.start_frame, self.end_frame)
    }

    /// Frame an instance spawned on `frame` retires, if it ever does
    pub const fn retire_frame(&self, frame: Frame) -> Option<Frame> {
        if self.lifetime > 0 {
            Some(frame + self.lifetime)
        } else {
            None
        }
    }
}
