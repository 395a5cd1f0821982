//! Instance pool
//!
//! Per-emitter free lists of instance objects. Released handles are reused
//! before new objects are created, so the number of objects an emitter owns
//! never exceeds the most instances it ever had alive at once.
//!
//! Reuse is LIFO: the most recently released handle is handed out first.

use super::instance::InstanceHandle;
use crate::foundation::collections::{EmitterId, ObjectId};
use slotmap::SecondaryMap;
use std::collections::BTreeSet;

/// Pool bookkeeping errors
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// Released handle is not active for its emitter
    #[error("invalid handle: {object} is not active for its emitter")]
    InvalidHandle {
        /// Offending object
        object: ObjectId,
    },

    /// Registered handle is already tracked
    #[error("duplicate handle: {object} is already tracked")]
    DuplicateHandle {
        /// Offending object
        object: ObjectId,
    },
}

/// Free list and accounting for one emitter
#[derive(Debug, Clone, Default)]
struct EmitterPool {
    idle: Vec<ObjectId>,
    active: BTreeSet<ObjectId>,
    high_water: usize,
}

impl EmitterPool {
    fn total(&self) -> usize {
        self.idle.len() + self.active.len()
    }

    fn tracks(&self, object: ObjectId) -> bool {
        self.active.contains(&object) || self.idle.contains(&object)
    }

    fn mark_active(&mut self, object: ObjectId) {
        self.active.insert(object);
        self.high_water = self.high_water.max(self.active.len());
    }
}

/// Reusable instance handles keyed by emitter
#[derive(Debug, Clone, Default)]
pub struct InstancePool {
    pools: SecondaryMap<EmitterId, EmitterPool>,
}

impl InstancePool {
    /// Create an empty pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Take an idle handle for `emitter`
    ///
    /// `None` tells the caller to create a new object and [`register`] it.
    ///
    /// [`register`]: Self::register
    pub fn acquire(&mut self, emitter: EmitterId) -> Option<InstanceHandle> {
        let pool = self.pools.get_mut(emitter)?;
        let object = pool.idle.pop()?;
        pool.mark_active(object);
        Some(InstanceHandle::new(object, emitter))
    }

    /// Track a newly created handle as active
    pub fn register(&mut self, handle: &InstanceHandle) -> Result<(), PoolError> {
        let Some(pool) = self.pools.entry(handle.emitter).map(|entry| entry.or_default()) else {
            return Err(PoolError::InvalidHandle { object: handle.id });
        };

        if pool.tracks(handle.id) {
            return Err(PoolError::DuplicateHandle { object: handle.id });
        }

        debug_assert!(pool.idle.is_empty(), "registering while idle handles exist");
        pool.mark_active(handle.id);
        log::trace!("pool grew to {} handles", pool.total());
        Ok(())
    }

    /// Return an active handle to the free list
    ///
    /// Leaves all accounting untouched when the handle is not active.
    pub fn release(&mut self, handle: &InstanceHandle) -> Result<(), PoolError> {
        let invalid = PoolError::InvalidHandle { object: handle.id };
        let pool = self.pools.get_mut(handle.emitter).ok_or_else(|| invalid.clone())?;

        if !pool.active.remove(&handle.id) {
            log::error!("released {} which is not active", handle.id);
            return Err(invalid);
        }

        pool.idle.push(handle.id);
        Ok(())
    }

    /// Mark every handle of `emitter` idle
    ///
    /// Handles come back out lowest object id first.
    pub fn reset(&mut self, emitter: EmitterId) {
        if let Some(pool) = self.pools.get_mut(emitter) {
            let active = std::mem::take(&mut pool.active);
            pool.idle.extend(active);
            pool.idle.sort_unstable_by(|a, b| b.cmp(a));
        }
    }

    /// Forget `emitter` and return every object it owned
    pub fn drain(&mut self, emitter: EmitterId) -> Vec<ObjectId> {
        self.pools
            .remove(emitter)
            .map(|pool| pool.active.into_iter().chain(pool.idle).collect())
            .unwrap_or_default()
    }

    /// Every object owned by `emitter`, active first
    pub fn objects(&self, emitter: EmitterId) -> Vec<ObjectId> {
        self.pools
            .get(emitter)
            .map(|pool| pool.active.iter().chain(pool.idle.iter()).copied().collect())
            .unwrap_or_default()
    }

    /// Whether `object` is currently active for `emitter`
    pub fn is_active(&self, emitter: EmitterId, object: ObjectId) -> bool {
        self.pools.get(emitter).is_some_and(|pool| pool.active.contains(&object))
    }

    /// Number of idle handles
    pub fn idle_count(&self, emitter: EmitterId) -> usize {
        self.pools.get(emitter).map_or(0, |pool| pool.idle.len())
    }

    /// Number of active handles
    pub fn active_count(&self, emitter: EmitterId) -> usize {
        self.pools.get(emitter).map_or(0, |pool| pool.active.len())
    }

    /// Number of handles ever created and not drained
    pub fn total_count(&self, emitter: EmitterId) -> usize {
        self.pools.get(emitter).map_or(0, EmitterPool::total)
    }

    /// Most handles simultaneously active so far
    pub fn high_water_mark(&self, emitter: EmitterId) -> usize {
        self.pools.get(emitter).map_or(0, |pool| pool.high_water)
    }
}
