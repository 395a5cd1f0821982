//! Emitter scheduler
//!
//! Walks an emitter's frame range once, spawning instances on the spawn
//! frames, baking their launch keys and retiring them when their lifetime
//! runs out. Handles are drawn from and returned to the [`InstancePool`].
//!
//! # State machine
//!
//! ```text
//! Idle → Running (frame steps) → Draining (flush, reset clock) → Idle
//! ```
//!
//! Within a frame, retirements happen before spawns so a handle freed on
//! frame F can be reused by a spawn on F. The abort flag is checked between
//! frame steps; every step finishes its acquire/release pairs before the
//! check, so no handle is ever left neither pooled nor active.

use super::config::EmitterConfig;
use super::instance::{ActiveInstanceSet, InstanceHandle};
use super::pool::InstancePool;
use super::EmitterError;
use crate::foundation::collections::{EmitterId, ObjectId};
use crate::foundation::time::{Frame, FrameClock};
use crate::kinematics::KinematicParams;
use crate::scene::{PoseWriter, SampleBuffer, SceneHost};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Frames after spawning at which the second pose key is written
pub const POSE_KEY_OFFSET: Frame = 2;

/// Frames after spawning at which the solver takes over
pub const HANDOFF_OFFSET: Frame = 3;

/// Frame the solver takes over an instance spawned on `frame`
///
/// Short-lived instances are handed over on the frame before they retire.
/// `None` when the instance retires on the frame right after spawning.
pub fn handoff_frame(frame: Frame, end_frame: Option<Frame>) -> Option<Frame> {
    let handoff = frame + HANDOFF_OFFSET;
    match end_frame {
        Some(end) if end - 1 <= frame => None,
        Some(end) => Some(handoff.min(end - 1)),
        None => Some(handoff),
    }
}

/// Scheduler state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulerState {
    /// Not running
    #[default]
    Idle,
    /// Stepping through frames
    Running,
    /// Flushing samples and restoring the clock
    Draining,
}

/// Cooperative cancellation shared with the caller
#[derive(Debug, Clone, Default)]
pub struct AbortFlag(Arc<AtomicBool>);

impl AbortFlag {
    /// Create a cleared flag
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the run stop before its next frame step
    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether an abort was requested
    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear a previous request
    pub fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BakeOutcome {
    /// Every frame was processed
    Completed,
    /// Stopped early; keys up to `last_frame` are complete
    Aborted {
        /// Last fully processed frame, `None` if none was
        last_frame: Option<Frame>,
    },
}

/// Summary of one scheduler run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BakeReport {
    /// How the run ended
    pub outcome: BakeOutcome,
    /// Planned spawn frames
    pub spawn_frames: Vec<Frame>,
    /// Instances spawned
    pub spawned: usize,
    /// Instances retired
    pub retired: usize,
    /// New objects created
    pub allocated: usize,
    /// Spawns served from the pool
    pub reused: usize,
    /// Samples written
    pub samples: usize,
    /// Objects spawned, in spawn order
    pub spawn_log: Vec<(Frame, ObjectId)>,
}

impl BakeReport {
    fn new(spawn_frames: Vec<Frame>) -> Self {
        Self {
            outcome: BakeOutcome::Completed,
            spawn_frames,
            spawned: 0,
            retired: 0,
            allocated: 0,
            reused: 0,
            samples: 0,
            spawn_log: Vec::new(),
        }
    }

    /// Whether every frame was processed
    pub fn is_complete(&self) -> bool {
        self.outcome == BakeOutcome::Completed
    }
}

/// Host collaborators a run writes to
pub struct BakeTarget<'a> {
    /// Scene objects and motion
    pub scene: &'a mut dyn SceneHost,
    /// Animation key sink
    pub writer: &'a mut dyn PoseWriter,
    /// Shared timeline cursor
    pub clock: &'a mut dyn FrameClock,
}

/// Identity of the emitter being baked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmitterBinding {
    /// Registry key
    pub id: EmitterId,
    /// Object whose motion instances inherit
    pub emitter_object: ObjectId,
    /// Object instances are created from
    pub template: ObjectId,
}

/// One emitter bake run
pub struct EmitterScheduler<'a> {
    binding: EmitterBinding,
    config: &'a EmitterConfig,
    kinematics: KinematicParams,
    state: SchedulerState,
    active: ActiveInstanceSet,
    buffer: SampleBuffer,
}

impl<'a> EmitterScheduler<'a> {
    /// Prepare a run
    pub fn new(binding: EmitterBinding, config: &'a EmitterConfig, kinematics: KinematicParams) -> Self {
        Self {
            binding,
            config,
            kinematics,
            state: SchedulerState::Idle,
            active: ActiveInstanceSet::new(),
            buffer: SampleBuffer::new(),
        }
    }

    /// Current state
    pub const fn state(&self) -> SchedulerState {
        self.state
    }

    /// Instances still live
    pub const fn active(&self) -> &ActiveInstanceSet {
        &self.active
    }

    /// Bake the whole frame range
    ///
    /// Fails with [`EmitterError::MissingSource`] before touching the scene
    /// when the template or emitter object is gone.
    pub fn run(&mut self, pool: &mut InstancePool, target: &mut BakeTarget<'_>, abort: &AbortFlag) -> Result<BakeReport, EmitterError> {
        for object in [self.binding.template, self.binding.emitter_object] {
            if !target.scene.contains(object) {
                log::error!("emitter source {} is missing, bake aborted", object);
                return Err(EmitterError::MissingSource(object));
            }
        }

        let mut report = BakeReport::new(self.config.spawn_frames());
        log::info!(
            "baking emitter {} frames {}..={} with {} spawns",
            self.binding.emitter_object,
            self.config.start_frame,
            self.config.end_frame,
            report.spawn_frames.len()
        );

        self.state = SchedulerState::Running;
        target.writer.begin_run();
        pool.reset(self.binding.id);
        for object in pool.objects(self.binding.id) {
            target.writer.clear_animation(object);
        }
        self.active = ActiveInstanceSet::new();

        let result = self.step_frames(pool, target, abort, &mut report);

        self.state = SchedulerState::Draining;
        self.buffer.flush_all(&mut *target.writer);
        target.clock.reset();
        self.state = SchedulerState::Idle;

        result?;
        report.samples = self.buffer.flushed();
        match report.outcome {
            BakeOutcome::Completed => log::info!(
                "emitter {} baked: {} spawned ({} new, {} reused), {} retired",
                self.binding.emitter_object,
                report.spawned,
                report.allocated,
                report.reused,
                report.retired
            ),
            BakeOutcome::Aborted { last_frame } => log::warn!(
                "emitter {} bake aborted after frame {:?}",
                self.binding.emitter_object,
                last_frame
            ),
        }
        Ok(report)
    }

    fn step_frames(
        &mut self,
        pool: &mut InstancePool,
        target: &mut BakeTarget<'_>,
        abort: &AbortFlag,
        report: &mut BakeReport,
    ) -> Result<(), EmitterError> {
        let spawn_frames = report.spawn_frames.clone();
        let mut pending = spawn_frames.iter().copied().peekable();
        let mut last_frame = None;
        let mut freed = Vec::new();

        for frame in self.config.frame_range().frames() {
            if abort.is_aborted() {
                report.outcome = BakeOutcome::Aborted { last_frame };
                return Ok(());
            }

            target.clock.set_current_frame(frame);

            freed.clear();
            while let Some(handle) = self.active.pop_expiring(frame) {
                self.retire(&handle, frame);
                pool.release(&handle)?;
                freed.push(handle.id);
                report.retired += 1;
            }

            while pending.next_if_eq(&frame).is_some() {
                let object = self.spawn(frame, &freed, pool, target, report)?;
                report.spawn_log.push((frame, object));
                report.spawned += 1;
            }

            self.buffer.flush_through(frame - 1, &mut *target.writer);
            last_frame = Some(frame);
        }

        Ok(())
    }

    fn spawn(
        &mut self,
        frame: Frame,
        freed: &[ObjectId],
        pool: &mut InstancePool,
        target: &mut BakeTarget<'_>,
        report: &mut BakeReport,
    ) -> Result<ObjectId, EmitterError> {
        let mut handle = if let Some(handle) = pool.acquire(self.binding.id) {
            report.reused += 1;
            handle
        } else {
            let object = target.scene.instantiate(self.binding.template, &self.config.material);
            let handle = InstanceHandle::new(object, self.binding.id);
            if let Err(err) = pool.register(&handle) {
                target.scene.destroy_instance(object);
                return Err(err.into());
            }
            report.allocated += 1;
            handle
        };

        let emitter = self.binding.emitter_object;
        let pose = target.scene.pose_at(emitter, frame);
        let inherited = self
            .kinematics
            .finite_difference(pose.position, target.scene.position_at(emitter, frame - 1));

        handle.activate(
            frame,
            self.config.retire_frame(frame),
            self.config.motion.linear_velocity + inherited,
            self.config.motion.angular_velocity,
            self.config.start_hidden,
        );

        let id = handle.id;
        // A handle retired on this frame is already hidden up to it
        if handle.start_hidden && !freed.contains(&id) {
            self.buffer.visible(frame - 1, id, false);
        }
        self.buffer.visible(frame, id, true);
        self.buffer.pose(frame, id, pose);
        self.buffer.active(frame, id, false);

        if let Some(handoff) = handoff_frame(frame, handle.end_frame) {
            let key_frame = (frame + POSE_KEY_OFFSET).min(handoff);
            self.buffer.pose(
                key_frame,
                id,
                self.kinematics.advance(
                    &pose,
                    handle.linear_velocity,
                    handle.angular_velocity,
                    (key_frame - frame) as f64,
                ),
            );
            self.buffer.active(handoff, id, true);
        }

        log::debug!("spawned {} at frame {} (retires {:?})", id, frame, handle.end_frame);
        self.active.insert(handle);
        Ok(id)
    }

    fn retire(&mut self, handle: &InstanceHandle, frame: Frame) {
        self.buffer.discard_from(handle.id, frame);
        self.buffer.active(frame, handle.id, false);
        self.buffer.visible(frame, handle.id, false);
        log::debug!("retired {} at frame {}", handle.id, frame);
    }
}
