//! Trajectory preview subscription
//!
//! The view layer subscribes while it wants trajectory lines and drops the
//! subscription when the view goes away. The preview only recomputes paths
//! while a subscription is live and drawing is enabled in the settings.

use super::{ProjectileState, Trajectory, TrajectoryPredictor};
use crate::config::settings::TrajectorySettings;
use crate::foundation::collections::ObjectId;
use crate::foundation::math::Vec3;
use crate::physics::OcclusionQuery;

/// Token proving ownership of the preview subscription
///
/// Not `Clone`: exactly one owner can tear the subscription down.
#[derive(Debug, PartialEq, Eq)]
pub struct PreviewSubscription {
    id: u64,
}

/// Cached trajectory lines for every projectile in the scene
#[derive(Debug, Clone, Default)]
pub struct TrajectoryPreview {
    settings: TrajectorySettings,
    active: Option<u64>,
    next_id: u64,
    paths: Vec<(ObjectId, Trajectory)>,
}

impl TrajectoryPreview {
    /// Create an unsubscribed preview
    pub fn new(settings: TrajectorySettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Current settings
    pub const fn settings(&self) -> &TrajectorySettings {
        &self.settings
    }

    /// Replace the settings; disabling drawing clears cached paths
    pub fn set_settings(&mut self, settings: TrajectorySettings) {
        self.settings = settings;
        if !self.settings.draw {
            self.paths.clear();
        }
    }

    /// Start receiving trajectory updates
    ///
    /// Replaces any previous subscription; the old token stops working.
    pub fn subscribe(&mut self) -> PreviewSubscription {
        self.next_id += 1;
        self.active = Some(self.next_id);
        log::debug!("trajectory preview subscribed (#{})", self.next_id);
        PreviewSubscription { id: self.next_id }
    }

    /// End a subscription; returns false for a stale token
    pub fn unsubscribe(&mut self, subscription: PreviewSubscription) -> bool {
        if self.active == Some(subscription.id) {
            self.active = None;
            self.paths.clear();
            log::debug!("trajectory preview unsubscribed (#{})", subscription.id);
            true
        } else {
            false
        }
    }

    /// Whether a subscription is live
    pub const fn is_subscribed(&self) -> bool {
        self.active.is_some()
    }

    /// Recompute all paths; returns false when nothing was computed
    pub fn refresh(&mut self, predictor: &TrajectoryPredictor, projectiles: &[ProjectileState], query: &dyn OcclusionQuery) -> bool {
        if !self.is_subscribed() || !self.settings.draw {
            return false;
        }

        self.paths = projectiles
            .iter()
            .map(|state| (state.object, predictor.predict(state, self.settings.horizon, query)))
            .collect();
        true
    }

    /// Cached paths from the last refresh
    pub fn paths(&self) -> &[(ObjectId, Trajectory)] {
        &self.paths
    }

    /// All cached paths flattened into the configured vertex layout
    pub fn vertices(&self) -> Vec<Vec3> {
        self.paths
            .iter()
            .flat_map(|(_, trajectory)| trajectory.vertices(self.settings.layout))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinematics::KinematicParams;
    use crate::physics::NoOcclusion;
    use crate::trajectory::TrajectoryLayout;

    fn projectiles() -> Vec<ProjectileState> {
        vec![
            ProjectileState {
                object: ObjectId(1),
                position: Vec3::zeros(),
                velocity: Vec3::x(),
            },
            ProjectileState {
                object: ObjectId(2),
                position: Vec3::zeros(),
                velocity: Vec3::y(),
            },
        ]
    }

    fn settings(horizon: i64, layout: TrajectoryLayout) -> TrajectorySettings {
        TrajectorySettings {
            draw: true,
            horizon,
            layout,
        }
    }

    #[test]
    fn test_refresh_requires_subscription() {
        let predictor = TrajectoryPredictor::new(KinematicParams::weightless(24.0));
        let mut preview = TrajectoryPreview::new(settings(4, TrajectoryLayout::Polyline));

        assert!(!preview.refresh(&predictor, &projectiles(), &NoOcclusion));

        let subscription = preview.subscribe();
        assert!(preview.refresh(&predictor, &projectiles(), &NoOcclusion));
        assert_eq!(preview.paths().len(), 2);
        assert_eq!(preview.vertices().len(), 10);

        assert!(preview.unsubscribe(subscription));
        assert!(preview.paths().is_empty());
    }

    #[test]
    fn test_stale_token_is_rejected() {
        let mut preview = TrajectoryPreview::new(TrajectorySettings::default());
        let first = preview.subscribe();
        let _second = preview.subscribe();

        assert!(!preview.unsubscribe(first));
        assert!(preview.is_subscribed());
    }

    #[test]
    fn test_line_list_layout() {
        let predictor = TrajectoryPredictor::new(KinematicParams::weightless(24.0));
        let mut preview = TrajectoryPreview::new(settings(3, TrajectoryLayout::LineList));
        let _subscription = preview.subscribe();
        preview.refresh(&predictor, &projectiles()[..1], &NoOcclusion);

        // Four points make three segments
        assert_eq!(preview.vertices().len(), 6);
    }

    #[test]
    fn test_disabled_drawing() {
        let predictor = TrajectoryPredictor::new(KinematicParams::weightless(24.0));
        let mut preview = TrajectoryPreview::new(settings(3, TrajectoryLayout::Polyline));
        let _subscription = preview.subscribe();
        preview.refresh(&predictor, &projectiles(), &NoOcclusion);

        preview.set_settings(TrajectorySettings {
            draw: false,
            ..*preview.settings()
        });

        assert!(preview.paths().is_empty());
        assert!(!preview.refresh(&predictor, &projectiles(), &NoOcclusion));
    }
}
