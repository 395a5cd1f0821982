//! Collision layers for baked instances
//!
//! Instances waiting in the pool or still following their baked launch keys
//! must not collide with live bodies. The host solver filters collisions by
//! layer, so an inactive instance is parked on a layer nothing else uses.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Collision layer bits (one per solver collision collection)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct CollisionLayers: u32 {
        /// Regular scene layer shared with other rigid bodies
        const SCENE = 1 << 0;
        /// Isolated layer for parked or kinematic instances
        const PARKED = 1 << 19;
    }
}

impl CollisionLayers {
    /// Check if two bodies should collide based on their layers and masks
    ///
    /// A's layer must be in B's mask and B's layer must be in A's mask.
    pub fn should_collide(layer_a: Self, mask_a: Self, layer_b: Self, mask_b: Self) -> bool {
        layer_a.intersects(mask_b) && layer_b.intersects(mask_a)
    }
}

/// Rigid body state implied by an active/inactive sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RigidBodyActivity {
    /// Whether the body follows animation keys instead of the solver
    pub kinematic: bool,
    /// Layers the body occupies
    pub layers: CollisionLayers,
}

impl RigidBodyActivity {
    /// Map an active flag to solver state
    ///
    /// Active bodies are simulated on the scene layer. Inactive ones are
    /// kinematic and parked.
    pub const fn from_active(active: bool) -> Self {
        if active {
            Self {
                kinematic: false,
                layers: CollisionLayers::SCENE,
            }
        } else {
            Self {
                kinematic: true,
                layers: CollisionLayers::PARKED,
            }
        }
    }

    /// Whether the body is handed to the solver
    pub const fn is_active(&self) -> bool {
        !self.kinematic
    }
}
