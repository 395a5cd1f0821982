//! Buffered animation samples
//!
//! Bake steps write keys a few frames ahead of the cursor and sometimes one
//! frame behind it. The buffer holds samples keyed by frame, object and
//! channel so they reach the [`PoseWriter`] in frame order, with the last
//! write for a key winning.

use super::PoseWriter;
use crate::foundation::collections::ObjectId;
use crate::foundation::math::Pose;
use crate::foundation::time::Frame;
use std::collections::BTreeMap;

/// Animated property group a sample belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Channel {
    /// Location and rotation
    Pose,
    /// Viewport and render visibility
    Visibility,
    /// Rigid body activity
    Active,
}

/// Value of a buffered sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleValue {
    /// Location and rotation
    Pose(Pose),
    /// Visible flag
    Visible(bool),
    /// Active flag
    Active(bool),
}

impl SampleValue {
    /// Channel this value is keyed on
    pub const fn channel(&self) -> Channel {
        match self {
            Self::Pose(_) => Channel::Pose,
            Self::Visible(_) => Channel::Visibility,
            Self::Active(_) => Channel::Active,
        }
    }
}

type SampleKey = (Frame, ObjectId, Channel);

/// Frame-ordered sample buffer
#[derive(Debug, Default)]
pub struct SampleBuffer {
    samples: BTreeMap<SampleKey, SampleValue>,
    flushed: usize,
}

impl SampleBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer a sample, replacing any earlier value for the same key
    pub fn push(&mut self, frame: Frame, object: ObjectId, value: SampleValue) {
        self.samples.insert((frame, object, value.channel()), value);
    }

    /// Buffer a pose sample
    pub fn pose(&mut self, frame: Frame, object: ObjectId, pose: Pose) {
        self.push(frame, object, SampleValue::Pose(pose));
    }

    /// Buffer a visibility sample
    pub fn visible(&mut self, frame: Frame, object: ObjectId, visible: bool) {
        self.push(frame, object, SampleValue::Visible(visible));
    }

    /// Buffer an activity sample
    pub fn active(&mut self, frame: Frame, object: ObjectId, active: bool) {
        self.push(frame, object, SampleValue::Active(active));
    }

    /// Drop every pending sample of `object` at or after `frame`
    pub fn discard_from(&mut self, object: ObjectId, frame: Frame) {
        self.samples.retain(|&(f, o, _), _| o != object || f < frame);
    }

    /// Write out every sample with frame `<= frame`
    pub fn flush_through(&mut self, frame: Frame, writer: &mut dyn PoseWriter) {
        let Some(next) = frame.checked_add(1) else {
            self.flush_all(writer);
            return;
        };

        let pending = self.samples.split_off(&(next, ObjectId(0), Channel::Pose));
        let ready = std::mem::replace(&mut self.samples, pending);
        self.write(ready, writer);
    }

    /// Write out everything
    pub fn flush_all(&mut self, writer: &mut dyn PoseWriter) {
        let ready = std::mem::take(&mut self.samples);
        self.write(ready, writer);
    }

    /// Number of samples waiting
    pub fn pending(&self) -> usize {
        self.samples.len()
    }

    /// Number of samples written so far
    pub const fn flushed(&self) -> usize {
        self.flushed
    }

    fn write(&mut self, ready: BTreeMap<SampleKey, SampleValue>, writer: &mut dyn PoseWriter) {
        self.flushed += ready.len();
        for ((frame, object, _), value) in ready {
            match value {
                SampleValue::Pose(pose) => writer.write_pose(frame, object, &pose),
                SampleValue::Visible(visible) => writer.write_visibility(frame, object, visible),
                SampleValue::Active(active) => writer.write_active(frame, object, active),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::RecordingPoseWriter;

    #[test]
    fn test_flush_orders_by_frame() {
        let mut buffer = SampleBuffer::new();
        let mut writer = RecordingPoseWriter::new();

        buffer.active(7, ObjectId(1), true);
        buffer.visible(3, ObjectId(1), true);
        buffer.visible(2, ObjectId(1), false);

        buffer.flush_through(3, &mut writer);
        assert_eq!(writer.samples().len(), 2);
        assert_eq!(buffer.pending(), 1);

        buffer.flush_all(&mut writer);
        let frames: Vec<Frame> = writer.samples().iter().map(|s| s.frame).collect();
        assert_eq!(frames, vec![2, 3, 7]);
        assert!(writer.is_monotonic());
        assert_eq!(buffer.flushed(), 3);
    }

    #[test]
    fn test_last_write_wins() {
        let mut buffer = SampleBuffer::new();
        let mut writer = RecordingPoseWriter::new();

        buffer.active(5, ObjectId(1), false);
        buffer.active(5, ObjectId(1), true);
        buffer.flush_all(&mut writer);

        assert_eq!(writer.samples().len(), 1);
        assert_eq!(writer.active_at(ObjectId(1), 5), Some(true));
    }

    #[test]
    fn test_discard_from_only_touches_one_object() {
        let mut buffer = SampleBuffer::new();

        buffer.active(4, ObjectId(1), true);
        buffer.active(6, ObjectId(1), true);
        buffer.active(6, ObjectId(2), true);
        buffer.discard_from(ObjectId(1), 5);

        assert_eq!(buffer.pending(), 2);
    }
}
