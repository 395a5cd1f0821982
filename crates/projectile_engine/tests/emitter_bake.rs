//! End-to-end bakes through the in-memory scene

use approx::assert_relative_eq;
use projectile_engine::emitter::scheduler::HANDOFF_OFFSET;
use projectile_engine::prelude::*;
use std::collections::HashSet;

/// Clock that raises the abort flag once the timeline reaches a frame
struct AbortingClock {
    inner: FrameCursor,
    abort_on: Frame,
    abort: AbortFlag,
}

impl FrameClock for AbortingClock {
    fn current_frame(&self) -> Frame {
        self.inner.current_frame()
    }

    fn set_current_frame(&mut self, frame: Frame) {
        if frame == self.abort_on {
            self.abort.abort();
        }
        self.inner.set_current_frame(frame);
    }
}

fn scene_with_emitter() -> (MemoryScene, ObjectId, ObjectId) {
    let mut scene = MemoryScene::new();
    let template = scene.add_object("rock", Pose::default());
    let emitter = scene.add_object("spout", Pose::from_position(Vec3::new(0.0, 0.0, 2.0)));
    (scene, template, emitter)
}

fn kinematics() -> KinematicParams {
    KinematicParams::new(24.0, Vec3::new(0.0, 0.0, -9.81))
}

#[test]
fn test_five_spawns_get_five_objects() {
    let (mut scene, template, emitter) = scene_with_emitter();
    let mut registry = EmitterRegistry::new(kinematics(), RegistrySettings::default());
    let config = EmitterConfig::default().with_range(1, 10).with_instance_count(5);
    let id = registry.promote(&scene, "rocks", emitter, template, config).unwrap();

    let mut writer = RecordingPoseWriter::new();
    let mut clock = FrameCursor::new(7);
    let mut target = BakeTarget {
        scene: &mut scene,
        writer: &mut writer,
        clock: &mut clock,
    };
    let report = registry.bake(id, &mut target, &AbortFlag::new()).unwrap();

    assert!(report.is_complete());
    assert_eq!(report.spawn_frames, vec![1, 2, 4, 6, 8]);
    assert!(report.spawn_frames.windows(2).all(|pair| pair[0] < pair[1]));
    assert_eq!(report.spawned, 5);
    assert_eq!(report.allocated, 5);
    assert_eq!(report.retired, 0);

    let objects: HashSet<ObjectId> = report.spawn_log.iter().map(|&(_, object)| object).collect();
    assert_eq!(objects.len(), 5);
    assert_eq!(scene.instances_of(template).len(), 5);
    assert_eq!(clock.current_frame(), 0);
    assert!(writer.is_monotonic());
    assert!(!registry.get(id).unwrap().is_dirty());

    for &(frame, object) in &report.spawn_log {
        assert_eq!(writer.visible_at(object, frame), Some(true));
        assert_eq!(writer.active_at(object, frame), Some(false));
        assert_eq!(writer.active_at(object, frame + 3), Some(true));
        assert_eq!(
            writer.pose_at(object, frame).map(|pose| pose.position),
            Some(Vec3::new(0.0, 0.0, 2.0))
        );
    }
}

#[test]
fn test_lifetime_recycles_instances() {
    let (mut scene, template, emitter) = scene_with_emitter();
    let mut registry = EmitterRegistry::new(kinematics(), RegistrySettings::default());
    let config = EmitterConfig::default()
        .with_range(1, 10)
        .with_instance_count(5)
        .with_lifetime(2);
    let id = registry.promote(&scene, "rocks", emitter, template, config).unwrap();

    let mut writer = RecordingPoseWriter::new();
    let mut clock = FrameCursor::default();
    let mut target = BakeTarget {
        scene: &mut scene,
        writer: &mut writer,
        clock: &mut clock,
    };
    let report = registry.bake(id, &mut target, &AbortFlag::new()).unwrap();

    // Spawns on 1, 2, 4, 6, 8 retire on 3, 4, 6, 8, 10
    assert_eq!(report.spawned, 5);
    assert_eq!(report.retired, 5);
    assert_eq!(report.allocated, 2);
    assert_eq!(report.reused, 3);
    assert_eq!(registry.pool().total_count(id), 2);
    assert_eq!(registry.pool().active_count(id), 0);
    assert_eq!(scene.instances_of(template).len(), 2);

    let (_, first) = report.spawn_log[0];
    assert_eq!(writer.visible_at(first, 3), Some(false));
    assert_eq!(writer.activity_at(first, 3).map(|activity| activity.is_active()), Some(false));

    // Reused on frame 4 after retiring on frame 4: the spawn keys win
    let (frame, reused) = report.spawn_log[2];
    assert_eq!(frame, 4);
    assert_eq!(writer.visible_at(reused, 4), Some(true));
    assert!(writer.is_monotonic());
}

#[test]
fn test_rebake_reuses_previous_objects() {
    let (mut scene, template, emitter) = scene_with_emitter();
    let mut registry = EmitterRegistry::new(kinematics(), RegistrySettings::default());
    let config = EmitterConfig::default().with_range(1, 20).with_instance_count(4);
    let id = registry.promote(&scene, "rocks", emitter, template, config).unwrap();

    let mut writer = RecordingPoseWriter::new();
    let mut clock = FrameCursor::default();
    let abort = AbortFlag::new();
    let mut target = BakeTarget {
        scene: &mut scene,
        writer: &mut writer,
        clock: &mut clock,
    };

    let first = registry.bake(id, &mut target, &abort).unwrap();
    let effect = registry
        .apply_config_change(id, ConfigChange::InstanceCount(3))
        .unwrap();
    assert_eq!(effect, ChangeEffect::RebakeNow);

    let second = registry.bake(id, &mut target, &abort).unwrap();

    assert_eq!(first.allocated, 4);
    assert_eq!(second.allocated, 0);
    assert_eq!(second.reused, 3);
    assert_eq!(registry.pool().total_count(id), 4);
    assert_eq!(scene.instances_of(template).len(), 4);
    assert_eq!(writer.runs(), 2);
}

#[test]
fn test_abort_keeps_emitter_dirty() {
    let (mut scene, template, emitter) = scene_with_emitter();
    let mut registry = EmitterRegistry::new(kinematics(), RegistrySettings::default());
    let first = registry
        .promote(
            &scene,
            "first",
            emitter,
            template,
            EmitterConfig::default().with_range(1, 30).with_instance_count(10),
        )
        .unwrap();
    let second = registry
        .promote(&scene, "second", emitter, template, EmitterConfig::default())
        .unwrap();

    let abort = AbortFlag::new();
    let mut writer = RecordingPoseWriter::new();
    let mut clock = AbortingClock {
        inner: FrameCursor::default(),
        abort_on: 12,
        abort: abort.clone(),
    };
    let mut target = BakeTarget {
        scene: &mut scene,
        writer: &mut writer,
        clock: &mut clock,
    };
    let reports = registry.execute_all(&mut target, &abort).unwrap();

    assert_eq!(reports.len(), 1);
    let (id, report) = &reports[0];
    assert_eq!(*id, first);
    assert_eq!(report.outcome, BakeOutcome::Aborted { last_frame: Some(12) });
    assert!(report.spawn_log.iter().all(|&(frame, _)| frame <= 12));
    assert_eq!(clock.current_frame(), 0);
    assert!(writer.samples().iter().all(|sample| sample.frame <= 12 + HANDOFF_OFFSET));
    assert_eq!(registry.dirty_emitters(), vec![first, second]);

    abort.clear();
    clock.abort_on = Frame::MAX;
    let mut target = BakeTarget {
        scene: &mut scene,
        writer: &mut writer,
        clock: &mut clock,
    };
    let reports = registry.execute_all(&mut target, &abort).unwrap();

    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|(_, report)| report.is_complete()));
    assert!(registry.dirty_emitters().is_empty());
}

#[test]
fn test_missing_template_fails_without_side_effects() {
    let (mut scene, template, emitter) = scene_with_emitter();
    let mut registry = EmitterRegistry::new(kinematics(), RegistrySettings::default());
    let id = registry
        .promote(&scene, "rocks", emitter, template, EmitterConfig::default())
        .unwrap();
    scene.remove_object(template);

    let mut writer = RecordingPoseWriter::new();
    let mut clock = FrameCursor::new(5);
    let mut target = BakeTarget {
        scene: &mut scene,
        writer: &mut writer,
        clock: &mut clock,
    };
    let result = registry.bake(id, &mut target, &AbortFlag::new());

    assert!(matches!(result, Err(EmitterError::MissingSource(object)) if object == template));
    assert_eq!(clock.current_frame(), 5);
    assert!(writer.samples().is_empty());
    assert_eq!(scene.len(), 1);
    assert!(registry.get(id).unwrap().is_dirty());
}

#[test]
fn test_moving_emitter_adds_its_velocity() {
    let mut scene = MemoryScene::new();
    let template = scene.add_object("rock", Pose::default());
    let emitter = scene.add_animated(
        "cart",
        [
            (0, Pose::from_position(Vec3::zeros())),
            (24, Pose::from_position(Vec3::new(24.0, 0.0, 0.0))),
        ],
    );

    let kinematics = KinematicParams::weightless(24.0);
    let mut registry = EmitterRegistry::new(kinematics, RegistrySettings::default());
    let config = EmitterConfig::default().with_range(12, 12).with_instance_count(1);
    let id = registry.promote(&scene, "cart", emitter, template, config).unwrap();

    let mut writer = RecordingPoseWriter::new();
    let mut clock = FrameCursor::default();
    let mut target = BakeTarget {
        scene: &mut scene,
        writer: &mut writer,
        clock: &mut clock,
    };
    let report = registry.bake(id, &mut target, &AbortFlag::new()).unwrap();

    // The cart moves one unit per frame, 24 units per second
    let (frame, object) = report.spawn_log[0];
    assert_eq!(frame, 12);
    let start = writer.pose_at(object, 12).unwrap();
    let later = writer.pose_at(object, 14).unwrap();
    assert_relative_eq!(start.position.x, 12.0, epsilon = 1e-9);
    assert_relative_eq!(later.position.x - start.position.x, 2.0, epsilon = 1e-9);
}

#[test]
fn test_trajectory_one_second_flight() {
    let predictor = TrajectoryPredictor::new(kinematics());
    let state = ProjectileState {
        object: ObjectId(1),
        position: Vec3::zeros(),
        velocity: Vec3::new(0.0, 0.0, 9.81),
    };
    let trajectory = predictor.predict(&state, 24, &projectile_engine::physics::NoOcclusion);

    assert!(!trajectory.is_obstructed());
    assert_eq!(trajectory.points.len(), 25);
    let end = trajectory.end_point().unwrap();
    assert_relative_eq!(end.z, 9.81 - 0.5 * 9.81, epsilon = 1e-9);
    assert_eq!(trajectory.line_list().len(), 48);
}

#[test]
fn test_trajectory_stops_at_ground() {
    let mut scene = MemoryScene::new();
    let ground = scene.add_object("ground", Pose::default());
    scene.add_collider(ground, CollisionShape::Plane(projectile_engine::physics::Plane::ground(0.0)));
    let ball = scene.add_object("ball", Pose::from_position(Vec3::new(0.0, 0.0, 1.0)));

    let predictor = TrajectoryPredictor::new(kinematics());
    let state = ProjectileState {
        object: ball,
        position: Vec3::new(0.0, 0.0, 1.0),
        velocity: Vec3::new(5.0, 0.0, 0.0),
    };
    let trajectory = predictor.predict(&state, 250, &scene);

    let hit = trajectory.obstruction.unwrap();
    assert_eq!(hit.object, ground);
    assert_relative_eq!(hit.point.z, 0.0, epsilon = 1e-9);
    assert_eq!(trajectory.end_point(), Some(hit.point));
    assert!(trajectory.points.len() < 250);
}
