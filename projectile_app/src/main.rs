//! Projectile bake tool
//!
//! Loads a scene description (TOML or RON), bakes every emitter and launch
//! into an in-memory scene and prints trajectory previews and bake summaries.
//!
//! ```text
//! projectile_bake [scene.toml|scene.ron]
//! ```

mod scene_file;

use projectile_engine::config::{Config, ConfigError};
use projectile_engine::emitter::{
    launch_projectile, AbortFlag, BakeOutcome, BakeTarget, EmitterError, EmitterRegistry, LaunchRequest,
};
use projectile_engine::foundation::collections::ObjectId;
use projectile_engine::foundation::logging;
use projectile_engine::foundation::time::FrameCursor;
use projectile_engine::scene::{MemoryScene, RecordingPoseWriter};
use projectile_engine::trajectory::{TrajectoryPredictor, TrajectoryPreview};
use scene_file::SceneFile;
use std::collections::HashMap;

/// Bake tool errors
#[derive(thiserror::Error, Debug)]
enum AppError {
    #[error("failed to load scene: {0}")]
    Config(#[from] ConfigError),

    #[error("bake failed: {0}")]
    Emitter(#[from] EmitterError),

    #[error("unknown object '{0}'")]
    UnknownObject(String),

    #[error("invalid settings: {0}")]
    InvalidSettings(String),
}

/// Scene objects by name
struct NameTable(HashMap<String, ObjectId>);

impl NameTable {
    fn resolve(&self, name: &str) -> Result<ObjectId, AppError> {
        self.0
            .get(name)
            .copied()
            .ok_or_else(|| AppError::UnknownObject(name.to_string()))
    }
}

fn build_scene(file: &SceneFile) -> (MemoryScene, NameTable) {
    let mut scene = MemoryScene::new();
    let mut names = HashMap::new();

    for spec in &file.objects {
        let keys = if spec.keys.is_empty() {
            vec![(0, spec.pose)]
        } else {
            spec.keys.iter().map(|key| (key.frame, key.pose)).collect()
        };
        let id = scene.add_animated(spec.name.clone(), keys);
        if let Some(collider) = &spec.collider {
            scene.add_collider(id, collider.shape());
        }
        names.insert(spec.name.clone(), id);
    }

    (scene, NameTable(names))
}

fn run(file: &SceneFile) -> Result<(), AppError> {
    file.settings.validate().map_err(AppError::InvalidSettings)?;

    let kinematics = file.settings.kinematics();
    let world = file.settings.rigid_body_world();
    log::info!(
        "{} fps, gravity {:?}, solver {} steps/s x {} iterations",
        kinematics.frame_rate,
        kinematics.gravity.as_slice(),
        world.steps_per_second,
        world.solver_iterations
    );

    let (mut scene, names) = build_scene(file);
    let mut registry = EmitterRegistry::new(kinematics, file.registry);
    for spec in &file.emitters {
        let emitter = names.resolve(&spec.emitter)?;
        let template = names.resolve(&spec.template)?;
        registry.promote(&scene, spec.name.clone(), emitter, template, spec.config.clone())?;
    }

    let launches = file
        .launches
        .iter()
        .map(|spec| {
            Ok(LaunchRequest {
                object: names.resolve(&spec.object)?,
                start_frame: spec.start_frame,
                start_hidden: spec.start_hidden,
                motion: spec.motion,
            })
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    // Preview before baking, the way the viewport shows it while editing
    let mut projectiles = registry.projectile_states(&scene);
    projectiles.extend(launches.iter().map(LaunchRequest::projectile_state));

    let predictor = TrajectoryPredictor::new(kinematics);
    let mut preview = TrajectoryPreview::new(file.settings.trajectory);
    let subscription = preview.subscribe();
    if preview.refresh(&predictor, &projectiles, &scene) {
        for (object, trajectory) in preview.paths() {
            let end = trajectory.end_point().unwrap_or_default();
            println!(
                "trajectory {object}: {} points, ends at ({:.3}, {:.3}, {:.3}){}",
                trajectory.points.len(),
                end.x,
                end.y,
                end.z,
                trajectory
                    .obstruction
                    .as_ref()
                    .map(|hit| format!(", blocked by {}", hit.object))
                    .unwrap_or_default()
            );
        }
        log::debug!("preview uses {} vertices", preview.vertices().len());
    }
    preview.unsubscribe(subscription);

    let mut writer = RecordingPoseWriter::new();
    let mut clock = FrameCursor::default();
    let abort = AbortFlag::new();
    let mut target = BakeTarget {
        scene: &mut scene,
        writer: &mut writer,
        clock: &mut clock,
    };

    for request in &launches {
        let frame = launch_projectile(request, file.scene_start, &kinematics, &mut target)?;
        println!("launched {} at frame {frame}", request.object);
    }

    for (id, report) in registry.execute_all(&mut target, &abort)? {
        let name = registry.get(id).map_or("?", |entry| entry.name.as_str());
        let status = match report.outcome {
            BakeOutcome::Completed => "complete".to_string(),
            BakeOutcome::Aborted { last_frame } => format!("aborted after {last_frame:?}"),
        };
        println!(
            "emitter '{name}': {status}, spawn frames {:?}, {} spawned, {} retired, {} objects ({} reused), {} samples",
            report.spawn_frames,
            report.spawned,
            report.retired,
            report.allocated,
            report.reused,
            report.samples
        );
    }

    log::info!(
        "{} samples keyed, {} objects in scene",
        writer.samples().len(),
        scene.len()
    );
    Ok(())
}

fn main() {
    logging::init_with_level("info");

    let file = match std::env::args().nth(1) {
        Some(path) => match SceneFile::load_from_file(&path) {
            Ok(file) => file,
            Err(e) => {
                log::error!("{}", AppError::from(e));
                std::process::exit(1);
            }
        },
        None => {
            log::info!("no scene file given, using the built-in demo");
            SceneFile::demo()
        }
    };

    if let Err(e) = run(&file) {
        log::error!("{e}");
        std::process::exit(1);
    }
}
