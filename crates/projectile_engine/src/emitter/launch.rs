//! Single projectile launch
//!
//! Bakes one existing object with the same launch keys an emitter writes for
//! its instances, without pooling or retirement.

use super::config::MotionSpec;
use super::scheduler::{BakeTarget, HANDOFF_OFFSET, POSE_KEY_OFFSET};
use super::EmitterError;
use crate::foundation::collections::ObjectId;
use crate::foundation::time::Frame;
use crate::kinematics::KinematicParams;
use crate::scene::SampleBuffer;
use crate::trajectory::ProjectileState;
use serde::{Deserialize, Serialize};

/// A projectile to launch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchRequest {
    /// Object to animate
    pub object: ObjectId,
    /// Launch frame
    #[serde(default = "default_start_frame")]
    pub start_frame: Frame,
    /// Hide the object on the frame before launch
    #[serde(default)]
    pub start_hidden: bool,
    /// Launch pose and velocities
    #[serde(default)]
    pub motion: MotionSpec,
}

const fn default_start_frame() -> Frame {
    1
}

impl LaunchRequest {
    /// Launch state for trajectory preview
    pub fn projectile_state(&self) -> ProjectileState {
        ProjectileState {
            object: self.object,
            position: self.motion.initial.position,
            velocity: self.motion.linear_velocity,
        }
    }
}

/// Bake the launch keys for one object
///
/// Launch frames before `scene_start` are moved up to it. Returns the frame
/// actually used.
pub fn launch_projectile(
    request: &LaunchRequest,
    scene_start: Frame,
    kinematics: &KinematicParams,
    target: &mut BakeTarget<'_>,
) -> Result<Frame, EmitterError> {
    if !target.scene.contains(request.object) {
        log::error!("launch target {} is missing", request.object);
        return Err(EmitterError::MissingSource(request.object));
    }

    let frame = request.start_frame.max(scene_start);
    if frame != request.start_frame {
        log::debug!("launch frame {} clamped to scene start {}", request.start_frame, frame);
    }

    target.writer.begin_run();
    target.writer.clear_animation(request.object);
    target.clock.set_current_frame(frame);

    let id = request.object;
    let motion = &request.motion;
    let mut buffer = SampleBuffer::new();
    if request.start_hidden {
        buffer.visible(frame - 1, id, false);
        buffer.visible(frame, id, true);
    }
    buffer.pose(frame, id, motion.initial);
    buffer.pose(
        frame + POSE_KEY_OFFSET,
        id,
        kinematics.advance(
            &motion.initial,
            motion.linear_velocity,
            motion.angular_velocity,
            POSE_KEY_OFFSET as f64,
        ),
    );
    buffer.active(frame, id, false);
    buffer.active(frame + HANDOFF_OFFSET, id, true);
    buffer.flush_all(&mut *target.writer);

    target.clock.reset();
    log::info!("launched {} at frame {}", id, frame);
    Ok(frame)
}
