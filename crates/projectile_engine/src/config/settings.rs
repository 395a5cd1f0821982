//! # Simulation Settings
//!
//! Scene-wide values shared by the kinematic model, the trajectory preview
//! and the host rigid body world.
//!
//! ## Categories
//!
//! - **Timeline**: frame rate used to convert frames to seconds
//! - **Gravity**: acceleration vector and an enable toggle
//! - **Solver**: quality preset for the host rigid body world
//! - **Trajectory**: preview drawing options

use super::Config;
use crate::foundation::math::{constants, Vec3};
use crate::foundation::time::Frame;
use crate::kinematics::KinematicParams;
use crate::trajectory::TrajectoryLayout;
use serde::{Deserialize, Serialize};

/// Default scene frame rate
pub const DEFAULT_FRAME_RATE: f64 = 24.0;

/// Default trajectory horizon, the host's default scene end frame
pub const DEFAULT_TRAJECTORY_HORIZON: Frame = 250;

/// Quality preset for the host rigid body solver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverQuality {
    /// 4 substeps per frame
    Low,
    /// 10 substeps per frame
    #[default]
    Medium,
    /// 20 substeps per frame
    High,
}

impl SolverQuality {
    /// Solver substeps per animation frame
    pub const fn substeps_per_frame(self) -> u32 {
        match self {
            Self::Low => 4,
            Self::Medium => 10,
            Self::High => 20,
        }
    }
}

/// Values handed to the host rigid body world
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RigidBodyWorldSettings {
    /// Solver steps per second of simulated time
    pub steps_per_second: u32,
    /// Constraint solver iterations per step
    pub solver_iterations: u32,
}

impl RigidBodyWorldSettings {
    /// Iteration count used by every preset
    pub const SOLVER_ITERATIONS: u32 = 20;
}

/// Trajectory preview options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrajectorySettings {
    /// Whether trajectories are computed and drawn at all
    pub draw: bool,
    /// Frames to predict ahead
    pub horizon: Frame,
    /// Vertex layout expected by the renderer
    pub layout: TrajectoryLayout,
}

impl Default for TrajectorySettings {
    fn default() -> Self {
        Self {
            draw: true,
            horizon: DEFAULT_TRAJECTORY_HORIZON,
            layout: TrajectoryLayout::Polyline,
        }
    }
}

/// Scene simulation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Frames per second of the scene timeline
    pub frame_rate: f64,
    /// Gravity acceleration in scene units per second squared
    pub gravity: Vec3,
    /// When false the kinematic model runs weightless
    pub use_gravity: bool,
    /// Host solver preset
    pub quality: SolverQuality,
    /// Trajectory preview options
    pub trajectory: TrajectorySettings,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            frame_rate: DEFAULT_FRAME_RATE,
            gravity: Vec3::new(0.0, 0.0, -constants::STANDARD_GRAVITY),
            use_gravity: true,
            quality: SolverQuality::default(),
            trajectory: TrajectorySettings::default(),
        }
    }
}

impl Config for SimulationSettings {}

impl SimulationSettings {
    /// Set the frame rate
    pub fn with_frame_rate(mut self, frame_rate: f64) -> Self {
        self.frame_rate = frame_rate;
        self
    }

    /// Set the gravity vector
    pub fn with_gravity(mut self, gravity: Vec3) -> Self {
        self.gravity = gravity;
        self
    }

    /// Enable or disable gravity
    pub fn with_gravity_enabled(mut self, enabled: bool) -> Self {
        self.use_gravity = enabled;
        self
    }

    /// Set the solver quality preset
    pub fn with_quality(mut self, quality: SolverQuality) -> Self {
        self.quality = quality;
        self
    }

    /// Set the trajectory preview options
    pub fn with_trajectory(mut self, trajectory: TrajectorySettings) -> Self {
        self.trajectory = trajectory;
        self
    }

    /// Gravity actually applied, zero when disabled
    pub fn effective_gravity(&self) -> Vec3 {
        if self.use_gravity {
            self.gravity
        } else {
            Vec3::zeros()
        }
    }

    /// Parameters for the kinematic model
    pub fn kinematics(&self) -> KinematicParams {
        KinematicParams::new(self.frame_rate, self.effective_gravity())
    }

    /// Rigid body world values for the current preset
    pub fn rigid_body_world(&self) -> RigidBodyWorldSettings {
        let fps = self.frame_rate.round().max(1.0) as u32;
        RigidBodyWorldSettings {
            steps_per_second: fps * self.quality.substeps_per_frame(),
            solver_iterations: RigidBodyWorldSettings::SOLVER_ITERATIONS,
        }
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<(), String> {
        if !(self.frame_rate.is_finite() && self.frame_rate > 0.0) {
            return Err(format!("Frame rate must be positive, got {}", self.frame_rate));
        }

        if !self.gravity.iter().all(|g| g.is_finite()) {
            return Err("Gravity must be finite".to_string());
        }

        Ok(())
    }
}
