//! Trajectory prediction for preview and diagnostics
//!
//! Walks the kinematic model frame by frame from a projectile's initial
//! state, ray casting each segment against the scene and stopping at the
//! first obstruction that is not the projectile itself.

mod preview;

pub use preview::{PreviewSubscription, TrajectoryPreview};

use crate::foundation::collections::ObjectId;
use crate::foundation::math::{utils, Vec3};
use crate::foundation::time::Frame;
use crate::kinematics::KinematicParams;
use crate::physics::{OcclusionQuery, RayHit};
use serde::{Deserialize, Serialize};

/// Launch state of a single projectile
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileState {
    /// The projectile itself, excluded from occlusion hits
    pub object: ObjectId,
    /// Initial location
    pub position: Vec3,
    /// Initial linear velocity
    pub velocity: Vec3,
}

/// How trajectory points are handed to a renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrajectoryLayout {
    /// One point per sample, drawn as a connected strip
    #[default]
    Polyline,
    /// Explicit segment pairs for line-list primitives
    LineList,
}

/// A predicted flight path
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Trajectory {
    /// Sample points, starting at the launch position
    pub points: Vec<Vec3>,
    /// The obstruction that truncated the path, if any
    pub obstruction: Option<RayHit>,
}

impl Trajectory {
    /// Whether the path was cut short by scene geometry
    pub const fn is_obstructed(&self) -> bool {
        self.obstruction.is_some()
    }

    /// Last point of the path
    pub fn end_point(&self) -> Option<Vec3> {
        self.points.last().copied()
    }

    /// Segment pairs `[p0, p1, p1, p2, ...]` for line-list drawing
    pub fn line_list(&self) -> Vec<Vec3> {
        self.points
            .windows(2)
            .flat_map(|pair| [pair[0], pair[1]])
            .collect()
    }

    /// Points in the requested layout
    pub fn vertices(&self, layout: TrajectoryLayout) -> Vec<Vec3> {
        match layout {
            TrajectoryLayout::Polyline => self.points.clone(),
            TrajectoryLayout::LineList => self.line_list(),
        }
    }
}

/// Predicts projectile paths with occlusion clipping
#[derive(Debug, Clone, Copy)]
pub struct TrajectoryPredictor {
    kinematics: KinematicParams,
}

impl TrajectoryPredictor {
    /// Create a predictor for the given scene parameters
    pub const fn new(kinematics: KinematicParams) -> Self {
        Self { kinematics }
    }

    /// Scene parameters in use
    pub const fn kinematics(&self) -> &KinematicParams {
        &self.kinematics
    }

    /// Predict the path of `state` for `frame_horizon` frames
    ///
    /// Frames `1..frame_horizon` are tested against `query`. A hit on any
    /// object other than the projectile appends the hit point and ends the
    /// path. An unobstructed path ends with the exact position at
    /// `frame_horizon`.
    pub fn predict(&self, state: &ProjectileState, frame_horizon: Frame, query: &dyn OcclusionQuery) -> Trajectory {
        let start = self.kinematics.displace(state.position, state.velocity, 0.0);
        let mut trajectory = Trajectory {
            points: vec![start],
            obstruction: None,
        };

        if frame_horizon <= 0 {
            return trajectory;
        }

        let mut previous = start;
        for frame in 1..frame_horizon {
            let candidate = self.kinematics.displace(state.position, state.velocity, frame as f64);

            if let Some(hit) = cast_segment(query, previous, candidate) {
                if hit.object != state.object {
                    log::trace!("trajectory of {} obstructed by {} at frame {}", state.object, hit.object, frame);
                    trajectory.points.push(hit.point);
                    trajectory.obstruction = Some(hit);
                    return trajectory;
                }
            }

            trajectory.points.push(candidate);
            previous = candidate;
        }

        trajectory
            .points
            .push(self.kinematics.displace(state.position, state.velocity, frame_horizon as f64));
        trajectory
    }
}

/// Cast from `from` towards `to`, limited to the segment length
///
/// A zero-length segment still issues the query, with a zero direction and
/// zero distance, so the query answers "no hit" without normalizing.
fn cast_segment(query: &dyn OcclusionQuery, from: Vec3, to: Vec3) -> Option<RayHit> {
    let delta = to - from;
    let distance = delta.norm();
    let direction = utils::safe_direction(&delta).unwrap_or_else(Vec3::zeros);
    query.cast(from, direction, distance)
}
