//! Host scene collaborators
//!
//! The scene graph, animation storage and object creation all belong to the
//! host application. The bake code talks to them only through the traits in
//! this module.
//!
//! ## Architecture
//!
//! ```text
//! EmitterScheduler
//!      ↓ samples (frame, object, value)
//! SampleBuffer (orders and deduplicates)
//!      ↓
//! PoseWriter (host animation system)
//! ```
//!
//! [`MemoryScene`] and [`RecordingPoseWriter`] are in-memory stand-ins for
//! the host, used by tests and the bake tool.

mod memory;
mod samples;

pub use memory::{MemoryScene, RecordedSample, RecordingPoseWriter, SceneObject};
pub use samples::{Channel, SampleBuffer, SampleValue};

use crate::emitter::MaterialParams;
use crate::foundation::collections::ObjectId;
use crate::foundation::math::{Pose, Vec3};
use crate::foundation::time::Frame;

/// Receives baked animation samples
///
/// Frame numbers must never decrease between calls within one bake run.
pub trait PoseWriter {
    /// Called once at the start of every bake run
    fn begin_run(&mut self) {}

    /// Key location and rotation
    fn write_pose(&mut self, frame: Frame, object: ObjectId, pose: &Pose);

    /// Key viewport and render visibility
    fn write_visibility(&mut self, frame: Frame, object: ObjectId, visible: bool);

    /// Key whether the rigid body solver owns the object
    fn write_active(&mut self, frame: Frame, object: ObjectId, active: bool);

    /// Remove every key previously written for `object`
    fn clear_animation(&mut self, object: ObjectId);
}

/// Evaluates animated object transforms on any frame
pub trait SceneMotionSource {
    /// World location of `object` at `frame`
    fn position_at(&self, object: ObjectId, frame: Frame) -> Vec3;

    /// World Euler rotation of `object` at `frame`
    fn rotation_at(&self, object: ObjectId, frame: Frame) -> Vec3;

    /// Location and rotation together
    fn pose_at(&self, object: ObjectId, frame: Frame) -> Pose {
        Pose::new(self.position_at(object, frame), self.rotation_at(object, frame))
    }
}

/// Creates and destroys instance objects
pub trait InstanceHost {
    /// Whether `object` still exists in the scene
    fn contains(&self, object: ObjectId) -> bool;

    /// Create a new rigid body sharing `template`'s data
    fn instantiate(&mut self, template: ObjectId, material: &MaterialParams) -> ObjectId;

    /// Delete an instance object
    fn destroy_instance(&mut self, object: ObjectId);
}

/// A host that can both evaluate motion and manage instances
pub trait SceneHost: SceneMotionSource + InstanceHost {}

impl<T: SceneMotionSource + InstanceHost> SceneHost for T {}
