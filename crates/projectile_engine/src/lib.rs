//! # Projectile Engine
//!
//! Ballistic trajectory prediction and frame-based projectile emitters for
//! rigid body scenes.
//!
//! ## Features
//!
//! - **Kinematics**: closed-form displacement and rotation under gravity
//! - **Trajectories**: frame-by-frame prediction clipped by ray casts
//! - **Velocity editing**: Cartesian and spherical views kept in sync
//! - **Emitters**: pooled instances spawned, keyed and retired per frame
//! - **Host agnostic**: the scene, animation keys and timeline sit behind traits
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use projectile_engine::prelude::*;
//!
//! fn main() -> Result<(), EmitterError> {
//!     let settings = SimulationSettings::default();
//!     let mut scene = MemoryScene::new();
//!     let template = scene.add_object("rock", Pose::default());
//!     let emitter = scene.add_object("emitter", Pose::default());
//!
//!     let mut registry = EmitterRegistry::new(settings.kinematics(), RegistrySettings::default());
//!     let config = EmitterConfig::default().with_range(1, 48).with_instance_count(6);
//!     registry.promote(&scene, "rocks", emitter, template, config)?;
//!
//!     let mut writer = RecordingPoseWriter::new();
//!     let mut clock = FrameCursor::default();
//!     let mut target = BakeTarget {
//!         scene: &mut scene,
//!         writer: &mut writer,
//!         clock: &mut clock,
//!     };
//!     for (_, report) in registry.execute_all(&mut target, &AbortFlag::new())? {
//!         println!("spawned {} instances", report.spawned);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod emitter;
pub mod foundation;
pub mod kinematics;
pub mod physics;
pub mod scene;
pub mod trajectory;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, SimulationSettings, SolverQuality, TrajectorySettings},
        emitter::{
            launch_projectile, AbortFlag, BakeOutcome, BakeReport, BakeTarget, ChangeEffect, ConfigChange,
            EmitterConfig, EmitterError, EmitterRegistry, LaunchRequest, MaterialParams, MotionSpec,
            RegistrySettings,
        },
        foundation::{
            collections::{EmitterId, ObjectId},
            math::{Pose, Vec3},
            time::{Frame, FrameClock, FrameCursor},
        },
        kinematics::{
            spherical::{Spherical, VelocityEditor, VelocityValue},
            KinematicParams,
        },
        physics::{CollisionShape, OcclusionQuery, SceneOcclusion},
        scene::{InstanceHost, MemoryScene, PoseWriter, RecordingPoseWriter, SceneMotionSource},
        trajectory::{ProjectileState, Trajectory, TrajectoryPredictor, TrajectoryPreview},
    };
}
