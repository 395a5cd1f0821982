//! In-memory host scene
//!
//! A minimal stand-in for the host application: objects with keyed poses,
//! instance bookkeeping, colliders for occlusion queries and a pose writer
//! that records everything it receives.

use super::{InstanceHost, PoseWriter, SampleValue, SceneMotionSource};
use crate::emitter::MaterialParams;
use crate::foundation::collections::ObjectId;
use crate::foundation::math::{Pose, Vec3};
use crate::foundation::time::Frame;
use crate::physics::{CollisionShape, OcclusionQuery, RayHit, RigidBodyActivity, SceneOcclusion};
use std::collections::BTreeMap;

/// An object in the in-memory scene
#[derive(Debug, Clone, Default)]
pub struct SceneObject {
    /// Display name
    pub name: String,
    /// Pose keys, linearly interpolated and held past the ends
    pub keys: BTreeMap<Frame, Pose>,
    /// Template this object was instantiated from
    pub template: Option<ObjectId>,
    /// Rigid body material for instances
    pub material: Option<MaterialParams>,
}

impl SceneObject {
    /// Evaluate the object's pose at `frame`
    pub fn pose_at(&self, frame: Frame) -> Pose {
        let before = self.keys.range(..=frame).next_back();
        let after = self.keys.range(frame..).next();

        match (before, after) {
            (Some((&f0, p0)), Some((&f1, p1))) if f1 > f0 => {
                let t = (frame - f0) as f64 / (f1 - f0) as f64;
                Pose::new(p0.position.lerp(&p1.position, t), p0.rotation.lerp(&p1.rotation, t))
            }
            (Some((_, pose)), _) | (None, Some((_, pose))) => *pose,
            (None, None) => Pose::default(),
        }
    }
}

/// Host scene kept entirely in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryScene {
    objects: BTreeMap<ObjectId, SceneObject>,
    occlusion: SceneOcclusion,
    next_id: u64,
}

impl MemoryScene {
    /// Create an empty scene
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> ObjectId {
        self.next_id += 1;
        ObjectId(self.next_id)
    }

    /// Add a static object
    pub fn add_object(&mut self, name: impl Into<String>, pose: Pose) -> ObjectId {
        self.add_animated(name, [(0, pose)])
    }

    /// Add an object with pose keys
    pub fn add_animated(&mut self, name: impl Into<String>, keys: impl IntoIterator<Item = (Frame, Pose)>) -> ObjectId {
        let id = self.allocate_id();
        self.objects.insert(
            id,
            SceneObject {
                name: name.into(),
                keys: keys.into_iter().collect(),
                ..SceneObject::default()
            },
        );
        id
    }

    /// Add or replace a pose key
    pub fn insert_key(&mut self, object: ObjectId, frame: Frame, pose: Pose) -> bool {
        self.objects
            .get_mut(&object)
            .map(|entry| entry.keys.insert(frame, pose))
            .is_some()
    }

    /// Give `object` collision geometry for occlusion queries
    pub fn add_collider(&mut self, object: ObjectId, shape: CollisionShape) {
        self.occlusion.insert(object, shape);
    }

    /// Delete an object and its colliders
    pub fn remove_object(&mut self, object: ObjectId) -> bool {
        self.occlusion.remove(object);
        self.objects.remove(&object).is_some()
    }

    /// Look up an object
    pub fn object(&self, object: ObjectId) -> Option<&SceneObject> {
        self.objects.get(&object)
    }

    /// Number of objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the scene is empty
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Instances created from `template`, in creation order
    pub fn instances_of(&self, template: ObjectId) -> Vec<ObjectId> {
        self.objects
            .iter()
            .filter(|(_, object)| object.template == Some(template))
            .map(|(&id, _)| id)
            .collect()
    }

    /// Collider set used for occlusion queries
    pub const fn occlusion(&self) -> &SceneOcclusion {
        &self.occlusion
    }
}

impl SceneMotionSource for MemoryScene {
    fn position_at(&self, object: ObjectId, frame: Frame) -> Vec3 {
        self.objects
            .get(&object)
            .map_or_else(Vec3::zeros, |entry| entry.pose_at(frame).position)
    }

    fn rotation_at(&self, object: ObjectId, frame: Frame) -> Vec3 {
        self.objects
            .get(&object)
            .map_or_else(Vec3::zeros, |entry| entry.pose_at(frame).rotation)
    }

    fn pose_at(&self, object: ObjectId, frame: Frame) -> Pose {
        self.objects
            .get(&object)
            .map(|entry| entry.pose_at(frame))
            .unwrap_or_default()
    }
}

impl InstanceHost for MemoryScene {
    fn contains(&self, object: ObjectId) -> bool {
        self.objects.contains_key(&object)
    }

    fn instantiate(&mut self, template: ObjectId, material: &MaterialParams) -> ObjectId {
        let name = self
            .objects
            .get(&template)
            .map_or_else(|| "instance".to_string(), |entry| format!("{}_instance", entry.name));

        let id = self.allocate_id();
        self.objects.insert(
            id,
            SceneObject {
                name,
                keys: BTreeMap::new(),
                template: Some(template),
                material: Some(*material),
            },
        );
        log::trace!("instantiated {} from {}", id, template);
        id
    }

    fn destroy_instance(&mut self, object: ObjectId) {
        self.remove_object(object);
    }
}

impl OcclusionQuery for MemoryScene {
    fn cast(&self, origin: Vec3, direction: Vec3, max_distance: f64) -> Option<RayHit> {
        self.occlusion.cast(origin, direction, max_distance)
    }
}

/// One sample received by [`RecordingPoseWriter`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordedSample {
    /// Frame the sample was keyed on
    pub frame: Frame,
    /// Target object
    pub object: ObjectId,
    /// Keyed value
    pub value: SampleValue,
}

/// Pose writer that keeps every sample in memory
#[derive(Debug, Clone, Default)]
pub struct RecordingPoseWriter {
    samples: Vec<RecordedSample>,
    cleared: Vec<ObjectId>,
    last_frame: Option<Frame>,
    out_of_order: usize,
    runs: usize,
}

impl RecordingPoseWriter {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, frame: Frame, object: ObjectId, value: SampleValue) {
        if self.last_frame.is_some_and(|last| frame < last) {
            self.out_of_order += 1;
        }
        self.last_frame = Some(frame);
        self.samples.push(RecordedSample { frame, object, value });
    }

    /// Every sample currently keyed, in arrival order
    pub fn samples(&self) -> &[RecordedSample] {
        &self.samples
    }

    /// Samples for one object
    pub fn samples_for(&self, object: ObjectId) -> impl Iterator<Item = &RecordedSample> + '_ {
        self.samples.iter().filter(move |sample| sample.object == object)
    }

    /// Objects whose animation was cleared, in order
    pub fn cleared(&self) -> &[ObjectId] {
        &self.cleared
    }

    /// Number of bake runs started
    pub const fn runs(&self) -> usize {
        self.runs
    }

    /// Whether frames never went backwards within a run
    pub const fn is_monotonic(&self) -> bool {
        self.out_of_order == 0
    }

    fn find(&self, object: ObjectId, frame: Frame, mut pick: impl FnMut(&SampleValue) -> bool) -> Option<SampleValue> {
        self.samples
            .iter()
            .rev()
            .find(|sample| sample.object == object && sample.frame == frame && pick(&sample.value))
            .map(|sample| sample.value)
    }

    /// Pose keyed for `object` exactly at `frame`
    pub fn pose_at(&self, object: ObjectId, frame: Frame) -> Option<Pose> {
        match self.find(object, frame, |value| matches!(value, SampleValue::Pose(_))) {
            Some(SampleValue::Pose(pose)) => Some(pose),
            _ => None,
        }
    }

    /// Visibility keyed for `object` exactly at `frame`
    pub fn visible_at(&self, object: ObjectId, frame: Frame) -> Option<bool> {
        match self.find(object, frame, |value| matches!(value, SampleValue::Visible(_))) {
            Some(SampleValue::Visible(visible)) => Some(visible),
            _ => None,
        }
    }

    /// Activity keyed for `object` exactly at `frame`
    pub fn active_at(&self, object: ObjectId, frame: Frame) -> Option<bool> {
        match self.find(object, frame, |value| matches!(value, SampleValue::Active(_))) {
            Some(SampleValue::Active(active)) => Some(active),
            _ => None,
        }
    }

    /// Rigid body state keyed for `object` exactly at `frame`
    pub fn activity_at(&self, object: ObjectId, frame: Frame) -> Option<RigidBodyActivity> {
        self.active_at(object, frame).map(RigidBodyActivity::from_active)
    }

    /// Frames on which `object` was keyed visible, ascending
    pub fn shown_frames(&self, object: ObjectId) -> Vec<Frame> {
        self.samples_for(object)
            .filter(|sample| sample.value == SampleValue::Visible(true))
            .map(|sample| sample.frame)
            .collect()
    }
}

impl PoseWriter for RecordingPoseWriter {
    fn begin_run(&mut self) {
        self.runs += 1;
        self.last_frame = None;
    }

    fn write_pose(&mut self, frame: Frame, object: ObjectId, pose: &Pose) {
        self.record(frame, object, SampleValue::Pose(*pose));
    }

    fn write_visibility(&mut self, frame: Frame, object: ObjectId, visible: bool) {
        self.record(frame, object, SampleValue::Visible(visible));
    }

    fn write_active(&mut self, frame: Frame, object: ObjectId, active: bool) {
        self.record(frame, object, SampleValue::Active(active));
    }

    fn clear_animation(&mut self, object: ObjectId) {
        self.samples.retain(|sample| sample.object != object);
        self.cleared.push(object);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::Plane;
    use approx::assert_relative_eq;

    #[test]
    fn test_keys_interpolate_and_hold() {
        let mut scene = MemoryScene::new();
        let emitter = scene.add_animated(
            "emitter",
            [
                (0, Pose::from_position(Vec3::zeros())),
                (10, Pose::from_position(Vec3::new(10.0, 0.0, 0.0))),
            ],
        );

        assert_relative_eq!(scene.position_at(emitter, 4).x, 4.0);
        assert_relative_eq!(scene.position_at(emitter, -3).x, 0.0);
        assert_relative_eq!(scene.position_at(emitter, 25).x, 10.0);
    }

    #[test]
    fn test_instantiate_and_destroy() {
        let mut scene = MemoryScene::new();
        let template = scene.add_object("rock", Pose::default());

        let a = scene.instantiate(template, &MaterialParams::default());
        let b = scene.instantiate(template, &MaterialParams::default());
        assert_eq!(scene.instances_of(template), vec![a, b]);
        assert_eq!(scene.object(a).unwrap().name, "rock_instance");

        scene.destroy_instance(a);
        assert!(!scene.contains(a));
        assert_eq!(scene.instances_of(template), vec![b]);
    }

    #[test]
    fn test_scene_occlusion_delegates() {
        let mut scene = MemoryScene::new();
        let ground = scene.add_object("ground", Pose::default());
        scene.add_collider(ground, CollisionShape::Plane(Plane::ground(0.0)));

        let hit = scene.cast(Vec3::new(0.0, 0.0, 2.0), -Vec3::z(), 5.0).unwrap();
        assert_eq!(hit.object, ground);
        assert_relative_eq!(hit.distance, 2.0);
    }

    #[test]
    fn test_recorder_detects_backwards_frames() {
        let mut writer = RecordingPoseWriter::new();
        writer.begin_run();
        writer.write_visibility(5, ObjectId(1), true);
        writer.write_visibility(4, ObjectId(1), false);
        assert!(!writer.is_monotonic());
    }

    #[test]
    fn test_clear_animation_drops_samples() {
        let mut writer = RecordingPoseWriter::new();
        writer.write_active(1, ObjectId(1), false);
        writer.write_active(1, ObjectId(2), false);
        writer.clear_animation(ObjectId(1));

        assert_eq!(writer.samples().len(), 1);
        assert_eq!(writer.cleared(), &[ObjectId(1)]);
        assert_eq!(writer.activity_at(ObjectId(2), 1), Some(RigidBodyActivity::from_active(false)));
    }
}
