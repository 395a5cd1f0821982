//! Identifier types shared between the scheduler and its host

use serde::{Deserialize, Serialize};
use std::fmt;

pub use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Stable key of a registered emitter
    pub struct EmitterId;
}

/// Identifier of an object owned by the host scene
///
/// The core never creates objects itself; it receives these from the host
/// (for source templates, emitters and instantiated copies).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

impl ObjectId {
    /// Get the raw identifier value
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "object#{}", self.0)
    }
}
