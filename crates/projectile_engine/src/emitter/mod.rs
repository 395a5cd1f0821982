//! Projectile emitters
//!
//! An emitter spawns reusable instances of a template object over a frame
//! range. [`EmitterRegistry`] owns every emitter's configuration and pool;
//! [`EmitterScheduler`] bakes one emitter; [`launch_projectile`] bakes a
//! single object without an emitter.

pub mod config;
pub mod instance;
pub mod launch;
pub mod pool;
pub mod registry;
pub mod scheduler;

pub use config::{CollisionShapeKind, EmitterConfig, EmitterConfigError, MaterialParams, MotionSpec};
pub use instance::{ActiveInstanceSet, InstanceHandle};
pub use launch::{launch_projectile, LaunchRequest};
pub use pool::{InstancePool, PoolError};
pub use registry::{ChangeEffect, ConfigChange, EmitterEntry, EmitterRegistry, RegistrySettings};
pub use scheduler::{
    handoff_frame, AbortFlag, BakeOutcome, BakeReport, BakeTarget, EmitterBinding, EmitterScheduler, SchedulerState,
};

use crate::foundation::collections::{EmitterId, ObjectId};

/// Emitter errors
#[derive(thiserror::Error, Debug)]
pub enum EmitterError {
    /// Template or emitter object no longer exists
    #[error("source object {0} is missing")]
    MissingSource(ObjectId),

    /// No emitter registered under this key
    #[error("unknown emitter {0:?}")]
    UnknownEmitter(EmitterId),

    /// Rejected configuration
    #[error("configuration error: {0}")]
    Config(#[from] EmitterConfigError),

    /// Pool bookkeeping failure
    #[error("pool error: {0}")]
    Pool(#[from] PoolError),
}
