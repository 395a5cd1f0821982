//! Scene description files for the bake tool
//!
//! A scene file lists objects by name, the emitters built from them and any
//! single projectiles to launch. Names are resolved to object ids when the
//! in-memory scene is built.

use projectile_engine::config::{Config, SimulationSettings};
use projectile_engine::emitter::{EmitterConfig, MotionSpec, RegistrySettings};
use projectile_engine::foundation::math::{Pose, Vec3};
use projectile_engine::foundation::time::Frame;
use projectile_engine::physics::{BoundingSphere, CollisionShape, Plane};
use serde::{Deserialize, Serialize};

/// One pose key of an animated object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeySpec {
    pub frame: Frame,
    pub pose: Pose,
}

/// Collision geometry attached to an object
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColliderSpec {
    Ground { z: f64 },
    Sphere { center: Vec3, radius: f64 },
}

impl ColliderSpec {
    pub fn shape(&self) -> CollisionShape {
        match self {
            Self::Ground { z } => CollisionShape::Plane(Plane::ground(*z)),
            Self::Sphere { center, radius } => CollisionShape::Sphere(BoundingSphere::new(*center, *radius)),
        }
    }
}

/// A named scene object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectSpec {
    pub name: String,
    #[serde(default)]
    pub pose: Pose,
    #[serde(default)]
    pub keys: Vec<KeySpec>,
    #[serde(default)]
    pub collider: Option<ColliderSpec>,
}

/// An emitter built from two named objects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmitterSpec {
    pub name: String,
    pub emitter: String,
    pub template: String,
    #[serde(default)]
    pub config: EmitterConfig,
}

/// A single projectile launch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchSpec {
    pub object: String,
    #[serde(default = "default_start_frame")]
    pub start_frame: Frame,
    #[serde(default)]
    pub start_hidden: bool,
    #[serde(default)]
    pub motion: MotionSpec,
}

const fn default_start_frame() -> Frame {
    1
}

/// Whole scene description
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneFile {
    pub scene_start: Frame,
    pub settings: SimulationSettings,
    pub registry: RegistrySettings,
    pub objects: Vec<ObjectSpec>,
    pub emitters: Vec<EmitterSpec>,
    pub launches: Vec<LaunchSpec>,
}

impl Default for SceneFile {
    fn default() -> Self {
        Self {
            scene_start: 1,
            settings: SimulationSettings::default(),
            registry: RegistrySettings::default(),
            objects: Vec::new(),
            emitters: Vec::new(),
            launches: Vec::new(),
        }
    }
}

impl Config for SceneFile {}

impl SceneFile {
    /// Built-in scene used when no file is given
    pub fn demo() -> Self {
        let cannon_keys = vec![
            KeySpec {
                frame: 1,
                pose: Pose::from_position(Vec3::new(0.0, 0.0, 1.0)),
            },
            KeySpec {
                frame: 48,
                pose: Pose::from_position(Vec3::new(0.0, 4.0, 1.0)),
            },
        ];

        let mut volley = EmitterConfig::default()
            .with_range(1, 48)
            .with_instance_count(6)
            .with_lifetime(24)
            .with_start_hidden(true);
        volley.motion.linear_velocity = Vec3::new(6.0, 0.0, 8.0);

        Self {
            objects: vec![
                ObjectSpec {
                    name: "ground".to_string(),
                    pose: Pose::default(),
                    keys: Vec::new(),
                    collider: Some(ColliderSpec::Ground { z: 0.0 }),
                },
                ObjectSpec {
                    name: "cannonball".to_string(),
                    pose: Pose::default(),
                    keys: Vec::new(),
                    collider: None,
                },
                ObjectSpec {
                    name: "cannon".to_string(),
                    pose: Pose::default(),
                    keys: cannon_keys,
                    collider: None,
                },
                ObjectSpec {
                    name: "ball".to_string(),
                    pose: Pose::from_position(Vec3::new(-2.0, 0.0, 0.5)),
                    keys: Vec::new(),
                    collider: None,
                },
            ],
            emitters: vec![EmitterSpec {
                name: "volley".to_string(),
                emitter: "cannon".to_string(),
                template: "cannonball".to_string(),
                config: volley,
            }],
            launches: vec![LaunchSpec {
                object: "ball".to_string(),
                start_frame: 1,
                start_hidden: false,
                motion: MotionSpec::new(
                    Pose::from_position(Vec3::new(-2.0, 0.0, 0.5)),
                    Vec3::new(3.0, 0.0, 5.0),
                    Vec3::new(0.0, 2.0, 0.0),
                ),
            }],
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use projectile_engine::config::ConfigFormat;

    #[test]
    fn test_demo_round_trips_through_toml() {
        let demo = SceneFile::demo();
        let text = demo.to_string_as(ConfigFormat::Toml).unwrap();
        let parsed = SceneFile::from_str_as(&text, ConfigFormat::Toml).unwrap();

        assert_eq!(parsed.objects.len(), demo.objects.len());
        assert_eq!(parsed.emitters[0].config, demo.emitters[0].config);
    }

    #[test]
    fn test_sparse_toml_uses_defaults() {
        let text = r#"
            [[objects]]
            name = "rock"

            [[objects]]
            name = "spout"

            [[emitters]]
            name = "rocks"
            emitter = "spout"
            template = "rock"

            [emitters.config]
            instance_count = 3
        "#;
        let scene = SceneFile::from_str_as(text, ConfigFormat::Toml).unwrap();

        assert_eq!(scene.scene_start, 1);
        assert_eq!(scene.emitters[0].config.instance_count, 3);
        assert_eq!(scene.emitters[0].config.end_frame, 50);
    }
}
