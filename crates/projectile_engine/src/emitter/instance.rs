//! Instance handles and the active instance set

use crate::foundation::collections::{EmitterId, ObjectId};
use crate::foundation::math::Vec3;
use crate::foundation::time::Frame;

/// A scene object temporarily bound to an emitter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstanceHandle {
    /// Host object
    pub id: ObjectId,
    /// Owning emitter
    pub emitter: EmitterId,
    /// Launch velocity captured at spawn
    pub linear_velocity: Vec3,
    /// Angular velocity captured at spawn
    pub angular_velocity: Vec3,
    /// Spawn frame of the current activation
    pub start_frame: Frame,
    /// Retirement frame, `None` when the instance lives forever
    pub end_frame: Option<Frame>,
    /// Whether the instance is hidden before spawning
    pub start_hidden: bool,
}

impl InstanceHandle {
    /// A fresh, never-activated handle
    pub fn new(id: ObjectId, emitter: EmitterId) -> Self {
        Self {
            id,
            emitter,
            linear_velocity: Vec3::zeros(),
            angular_velocity: Vec3::zeros(),
            start_frame: 0,
            end_frame: None,
            start_hidden: false,
        }
    }

    /// Reset the per-activation fields
    pub fn activate(
        &mut self,
        start_frame: Frame,
        end_frame: Option<Frame>,
        linear_velocity: Vec3,
        angular_velocity: Vec3,
        start_hidden: bool,
    ) {
        self.start_frame = start_frame;
        self.end_frame = end_frame;
        self.linear_velocity = linear_velocity;
        self.angular_velocity = angular_velocity;
        self.start_hidden = start_hidden;
    }

    /// Whether the instance retires exactly on `frame`
    pub fn expires_at(&self, frame: Frame) -> bool {
        self.end_frame == Some(frame)
    }

    fn expiry_key(&self) -> Frame {
        self.end_frame.unwrap_or(Frame::MAX)
    }
}

/// Live instances of one emitter ordered by retirement frame
///
/// Unbounded instances sort last. Equal retirement frames keep spawn order.
#[derive(Debug, Clone, Default)]
pub struct ActiveInstanceSet {
    handles: Vec<InstanceHandle>,
}

impl ActiveInstanceSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert keeping the set sorted
    pub fn insert(&mut self, handle: InstanceHandle) {
        let key = handle.expiry_key();
        let index = self.handles.partition_point(|h| h.expiry_key() <= key);
        self.handles.insert(index, handle);
    }

    /// Remove the earliest-expiring instance if it retires on `frame`
    pub fn pop_expiring(&mut self, frame: Frame) -> Option<InstanceHandle> {
        if self.handles.first().is_some_and(|h| h.expires_at(frame)) {
            Some(self.handles.remove(0))
        } else {
            None
        }
    }

    /// Whether `object` is live
    pub fn contains(&self, object: ObjectId) -> bool {
        self.handles.iter().any(|h| h.id == object)
    }

    /// Number of live instances
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Whether no instance is live
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Live instances in retirement order
    pub fn iter(&self) -> impl Iterator<Item = &InstanceHandle> {
        self.handles.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn handle(id: u64, emitter: EmitterId, end: Option<Frame>) -> InstanceHandle {
        let mut h = InstanceHandle::new(ObjectId(id), emitter);
        h.activate(0, end, Vec3::zeros(), Vec3::zeros(), false);
        h
    }

    #[test]
    fn test_sorted_by_end_frame() {
        let mut emitters: SlotMap<EmitterId, ()> = SlotMap::with_key();
        let e = emitters.insert(());

        let mut set = ActiveInstanceSet::new();
        set.insert(handle(1, e, None));
        set.insert(handle(2, e, Some(9)));
        set.insert(handle(3, e, Some(4)));
        set.insert(handle(4, e, Some(9)));

        let order: Vec<u64> = set.iter().map(|h| h.id.raw()).collect();
        assert_eq!(order, vec![3, 2, 4, 1]);
    }

    #[test]
    fn test_pop_expiring_only_on_exact_frame() {
        let mut emitters: SlotMap<EmitterId, ()> = SlotMap::with_key();
        let e = emitters.insert(());

        let mut set = ActiveInstanceSet::new();
        set.insert(handle(1, e, Some(5)));
        set.insert(handle(2, e, None));

        assert!(set.pop_expiring(4).is_none());
        assert_eq!(set.pop_expiring(5).unwrap().id, ObjectId(1));
        assert!(set.pop_expiring(5).is_none());
        assert_eq!(set.len(), 1);
        assert!(set.contains(ObjectId(2)));
    }
}
