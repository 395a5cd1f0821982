//! Emitter registry
//!
//! Owns every emitter's configuration, dirty flag and instance pool.
//! Configuration edits go through [`EmitterRegistry::apply_config_change`],
//! which validates the edit, stores it, marks the emitter dirty and tells the
//! caller whether to rebake now, all in one step.

use super::config::{EmitterConfig, MaterialParams};
use super::pool::InstancePool;
use super::scheduler::{AbortFlag, BakeReport, BakeTarget, EmitterBinding, EmitterScheduler};
use super::EmitterError;
use crate::foundation::collections::{EmitterId, ObjectId, SlotMap};
use crate::foundation::math::{Pose, Vec3};
use crate::foundation::time::Frame;
use crate::kinematics::spherical::VelocityValue;
use crate::kinematics::KinematicParams;
use crate::scene::{InstanceHost, SceneMotionSource};
use crate::trajectory::ProjectileState;
use serde::{Deserialize, Serialize};

/// Registry-wide behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrySettings {
    /// Ask for an immediate rebake after every accepted change
    pub auto_update: bool,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self { auto_update: true }
    }
}

/// A single configuration edit
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigChange {
    /// First spawn frame
    StartFrame(Frame),
    /// Last frame of the range
    EndFrame(Frame),
    /// Number of instances
    InstanceCount(i64),
    /// Instance lifetime in frames
    Lifetime(Frame),
    /// Hide before spawning
    StartHidden(bool),
    /// Linear velocity in either representation
    Velocity(VelocityValue),
    /// Angular velocity
    AngularVelocity(Vec3),
    /// Launch pose
    InitialPose(Pose),
    /// Instance material
    Material(MaterialParams),
    /// Whole configuration
    Replace(EmitterConfig),
}

impl ConfigChange {
    fn apply(self, config: &mut EmitterConfig) {
        match self {
            Self::StartFrame(frame) => config.start_frame = frame,
            Self::EndFrame(frame) => config.end_frame = frame,
            Self::InstanceCount(count) => config.instance_count = count,
            Self::Lifetime(lifetime) => config.lifetime = lifetime,
            Self::StartHidden(hidden) => config.start_hidden = hidden,
            Self::Velocity(value) => config.motion.set_velocity(value),
            Self::AngularVelocity(w) => config.motion.angular_velocity = w,
            Self::InitialPose(pose) => config.motion.apply_transforms(pose),
            Self::Material(material) => config.material = material,
            Self::Replace(replacement) => *config = replacement,
        }
    }
}

/// What the caller should do after a change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeEffect {
    /// Nothing changed
    Unchanged,
    /// Rebake the affected emitters now
    RebakeNow,
    /// Left dirty for a later execute-all
    Deferred,
}

/// A registered emitter
#[derive(Debug, Clone)]
pub struct EmitterEntry {
    /// Display name
    pub name: String,
    /// Object whose motion instances inherit
    pub emitter_object: ObjectId,
    /// Object instances are created from
    pub template: ObjectId,
    config: EmitterConfig,
    dirty: bool,
    last_report: Option<BakeReport>,
}

impl EmitterEntry {
    /// Current configuration
    pub const fn config(&self) -> &EmitterConfig {
        &self.config
    }

    /// Whether the configuration changed since the last completed bake
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Report of the most recent bake
    pub const fn last_report(&self) -> Option<&BakeReport> {
        self.last_report.as_ref()
    }
}

/// All emitters in a scene
#[derive(Debug, Default)]
pub struct EmitterRegistry {
    emitters: SlotMap<EmitterId, EmitterEntry>,
    order: Vec<EmitterId>,
    pool: InstancePool,
    kinematics: KinematicParams,
    settings: RegistrySettings,
}

impl EmitterRegistry {
    /// Create an empty registry
    pub fn new(kinematics: KinematicParams, settings: RegistrySettings) -> Self {
        Self {
            kinematics,
            settings,
            ..Self::default()
        }
    }

    /// Registry settings
    pub const fn settings(&self) -> &RegistrySettings {
        &self.settings
    }

    /// Replace the registry settings
    pub fn set_settings(&mut self, settings: RegistrySettings) {
        self.settings = settings;
    }

    /// Scene parameters used for baking
    pub const fn kinematics(&self) -> &KinematicParams {
        &self.kinematics
    }

    /// Change frame rate or gravity; every emitter becomes dirty
    pub fn set_kinematics(&mut self, kinematics: KinematicParams) -> ChangeEffect {
        if kinematics == self.kinematics {
            return ChangeEffect::Unchanged;
        }

        self.kinematics = kinematics;
        for entry in self.emitters.values_mut() {
            entry.dirty = true;
        }
        self.effect()
    }

    /// Turn `emitter_object` into an emitter of `template`
    ///
    /// The new emitter starts dirty.
    pub fn promote(
        &mut self,
        host: &dyn InstanceHost,
        name: impl Into<String>,
        emitter_object: ObjectId,
        template: ObjectId,
        config: EmitterConfig,
    ) -> Result<EmitterId, EmitterError> {
        for object in [template, emitter_object] {
            if !host.contains(object) {
                return Err(EmitterError::MissingSource(object));
            }
        }
        config.validate()?;

        let name = name.into();
        log::info!("promoted {} to emitter '{}' of {}", emitter_object, name, template);
        let id = self.emitters.insert(EmitterEntry {
            name,
            emitter_object,
            template,
            config,
            dirty: true,
            last_report: None,
        });
        self.order.push(id);
        Ok(id)
    }

    /// Remove an emitter, destroying all of its instances
    ///
    /// Returns the template object, which is a plain object again.
    pub fn demote(&mut self, id: EmitterId, host: &mut dyn InstanceHost) -> Result<ObjectId, EmitterError> {
        let entry = self.emitters.remove(id).ok_or(EmitterError::UnknownEmitter(id))?;
        self.order.retain(|&other| other != id);

        let instances = self.pool.drain(id);
        log::info!("demoted emitter '{}', destroying {} instances", entry.name, instances.len());
        for object in instances {
            host.destroy_instance(object);
        }
        Ok(entry.template)
    }

    /// Look up an emitter
    pub fn get(&self, id: EmitterId) -> Option<&EmitterEntry> {
        self.emitters.get(id)
    }

    /// Emitter keys in registration order
    pub fn ids(&self) -> &[EmitterId] {
        &self.order
    }

    /// Number of emitters
    pub fn len(&self) -> usize {
        self.emitters.len()
    }

    /// Whether there are no emitters
    pub fn is_empty(&self) -> bool {
        self.emitters.is_empty()
    }

    /// Shared instance pool
    pub const fn pool(&self) -> &InstancePool {
        &self.pool
    }

    /// Dirty emitters in registration order
    pub fn dirty_emitters(&self) -> Vec<EmitterId> {
        self.order
            .iter()
            .copied()
            .filter(|&id| self.emitters.get(id).is_some_and(EmitterEntry::is_dirty))
            .collect()
    }

    /// Validate and store one configuration edit
    ///
    /// A rejected edit leaves the configuration and dirty flag unchanged.
    pub fn apply_config_change(&mut self, id: EmitterId, change: ConfigChange) -> Result<ChangeEffect, EmitterError> {
        let entry = self.emitters.get_mut(id).ok_or(EmitterError::UnknownEmitter(id))?;

        let mut candidate = entry.config.clone();
        change.apply(&mut candidate);
        if let Err(err) = candidate.validate() {
            log::warn!("rejected change to emitter '{}': {}", entry.name, err);
            return Err(err.into());
        }

        if candidate == entry.config {
            return Ok(ChangeEffect::Unchanged);
        }

        entry.config = candidate;
        entry.dirty = true;
        Ok(self.effect())
    }

    const fn effect(&self) -> ChangeEffect {
        if self.settings.auto_update {
            ChangeEffect::RebakeNow
        } else {
            ChangeEffect::Deferred
        }
    }

    /// Bake one emitter
    ///
    /// The dirty flag is cleared only when the run completes.
    pub fn bake(&mut self, id: EmitterId, target: &mut BakeTarget<'_>, abort: &AbortFlag) -> Result<BakeReport, EmitterError> {
        let entry = self.emitters.get_mut(id).ok_or(EmitterError::UnknownEmitter(id))?;
        let binding = EmitterBinding {
            id,
            emitter_object: entry.emitter_object,
            template: entry.template,
        };

        let report = EmitterScheduler::new(binding, &entry.config, self.kinematics).run(&mut self.pool, target, abort)?;
        if report.is_complete() {
            entry.dirty = false;
        }
        entry.last_report = Some(report.clone());
        Ok(report)
    }

    /// Rebake every dirty emitter in registration order
    ///
    /// Stops after an aborted run.
    pub fn execute_all(&mut self, target: &mut BakeTarget<'_>, abort: &AbortFlag) -> Result<Vec<(EmitterId, BakeReport)>, EmitterError> {
        let mut reports = Vec::new();
        for id in self.dirty_emitters() {
            let report = self.bake(id, target, abort)?;
            let complete = report.is_complete();
            reports.push((id, report));
            if !complete {
                break;
            }
        }
        Ok(reports)
    }

    /// Launch states for trajectory preview, one per emitter
    ///
    /// The velocity includes the emitter's own motion into the start frame,
    /// matching what the bake gives the first instance.
    pub fn projectile_states(&self, scene: &dyn SceneMotionSource) -> Vec<ProjectileState> {
        self.order
            .iter()
            .filter_map(|&id| self.emitters.get(id))
            .map(|entry| {
                let start = entry.config.start_frame;
                let position = scene.position_at(entry.emitter_object, start);
                let inherited = self
                    .kinematics
                    .finite_difference(position, scene.position_at(entry.emitter_object, start - 1));
                ProjectileState {
                    object: entry.emitter_object,
                    position,
                    velocity: entry.config.motion.linear_velocity + inherited,
                }
            })
            .collect()
    }
}
