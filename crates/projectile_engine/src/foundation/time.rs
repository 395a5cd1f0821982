//! Frame timeline utilities
//!
//! The scheduler works on a discrete frame timeline instead of wall-clock
//! time. The host owns the shared frame cursor and exposes it through
//! [`FrameClock`].

use serde::{Deserialize, Serialize};

/// Discrete frame number on the animation timeline
pub type Frame = i64;

/// Value the frame cursor is reset to after a bake
pub const NEUTRAL_FRAME: Frame = 0;

/// Shared timeline cursor owned by the host
pub trait FrameClock {
    /// Get the frame the host timeline currently shows
    fn current_frame(&self) -> Frame;

    /// Move the host timeline to `frame`
    fn set_current_frame(&mut self, frame: Frame);

    /// Reset the cursor to [`NEUTRAL_FRAME`]
    fn reset(&mut self) {
        self.set_current_frame(NEUTRAL_FRAME);
    }
}

/// Simple in-memory frame clock
///
/// Records how many times the cursor was moved, which lets tests check that
/// a bake touched the timeline at all.
#[derive(Debug, Clone, Default)]
pub struct FrameCursor {
    frame: Frame,
    moves: u64,
}

impl FrameCursor {
    /// Create a cursor positioned at `frame`
    pub fn new(frame: Frame) -> Self {
        Self { frame, moves: 0 }
    }

    /// Number of `set_current_frame` calls since creation
    pub fn move_count(&self) -> u64 {
        self.moves
    }
}

impl FrameClock for FrameCursor {
    fn current_frame(&self) -> Frame {
        self.frame
    }

    fn set_current_frame(&mut self, frame: Frame) {
        self.frame = frame;
        self.moves += 1;
    }
}

/// Inclusive range of frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRange {
    /// First frame
    pub start: Frame,
    /// Last frame (inclusive)
    pub end: Frame,
}

impl FrameRange {
    /// Create a new range
    pub const fn new(start: Frame, end: Frame) -> Self {
        Self { start, end }
    }

    /// Number of frame steps between start and end
    pub const fn span(&self) -> Frame {
        self.end - self.start
    }

    /// Check whether `frame` lies inside the range
    pub const fn contains(&self, frame: Frame) -> bool {
        frame >= self.start && frame <= self.end
    }

    /// Iterate every frame from start to end inclusive
    pub fn frames(&self) -> impl Iterator<Item = Frame> {
        self.start..=self.end
    }
}
