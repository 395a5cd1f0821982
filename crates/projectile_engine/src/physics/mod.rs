//! Physics module for occlusion queries and rigid body hand-off state
//!
//! The rigid body solver itself is external; this module only provides ray
//! casting for trajectory clipping and the collision-layer mapping used when
//! baked instances are released to the solver.

pub mod collision;
pub mod collision_layers;

pub use collision::{
    BoundingSphere, Collider, CollisionShape, NoOcclusion, OcclusionQuery, Plane, Ray, RayHit,
    SceneOcclusion, Triangle,
};
pub use collision_layers::{CollisionLayers, RigidBodyActivity};
