//! Cartesian <-> spherical velocity conversion
//!
//! Users may edit a launch velocity either as a Cartesian vector or as
//! (radius, incline, azimuth). Both representations are stored and kept in
//! sync by [`VelocityEditor`]. Each change carries the representation it
//! originated from, so the echo written into the other representation is
//! applied without being propagated back.

use crate::foundation::math::Vec3;
use serde::{Deserialize, Serialize};

/// Velocity expressed as magnitude plus two angles
///
/// `incline` is measured from the +Z axis, `azimuth` from +X towards +Y.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Spherical {
    /// Magnitude of the vector
    pub radius: f64,
    /// Polar angle from +Z in radians
    pub incline: f64,
    /// Azimuthal angle in the XY plane in radians
    pub azimuth: f64,
}

impl Spherical {
    /// Create spherical coordinates
    pub const fn new(radius: f64, incline: f64, azimuth: f64) -> Self {
        Self { radius, incline, azimuth }
    }

    /// Convert to a Cartesian vector
    pub fn to_cartesian(&self) -> Vec3 {
        to_cartesian(self.radius, self.incline, self.azimuth)
    }
}

/// Convert a Cartesian vector to (radius, incline, azimuth)
///
/// A zero vector maps to all zeros. The azimuth uses the two-argument
/// arctangent so every quadrant is recovered correctly.
pub fn to_spherical(v: &Vec3) -> Spherical {
    let radius = v.norm();

    let incline = if radius == 0.0 {
        0.0
    } else {
        (v.z / radius).clamp(-1.0, 1.0).acos()
    };

    let azimuth = if v.x == 0.0 && v.y == 0.0 {
        0.0
    } else {
        v.y.atan2(v.x)
    };

    Spherical::new(radius, incline, azimuth)
}

/// Convert (radius, incline, azimuth) to a Cartesian vector
pub fn to_cartesian(radius: f64, incline: f64, azimuth: f64) -> Vec3 {
    let (sin_incline, cos_incline) = incline.sin_cos();
    let (sin_azimuth, cos_azimuth) = azimuth.sin_cos();

    Vec3::new(
        radius * sin_incline * cos_azimuth,
        radius * sin_incline * sin_azimuth,
        radius * cos_incline,
    )
}

/// Which representation of the velocity a change came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Representation {
    /// The XYZ vector
    Cartesian,
    /// Radius / incline / azimuth
    Spherical,
}

/// New value for one representation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VelocityValue {
    /// Cartesian vector
    Cartesian(Vec3),
    /// Spherical coordinates
    Spherical(Spherical),
}

impl VelocityValue {
    /// Representation this value belongs to
    pub const fn representation(&self) -> Representation {
        match self {
            Self::Cartesian(_) => Representation::Cartesian,
            Self::Spherical(_) => Representation::Spherical,
        }
    }
}

/// A change notification tagged with the representation that started it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityChange {
    /// Representation the user actually edited
    pub origin: Representation,
    /// Value being written
    pub value: VelocityValue,
}

impl VelocityChange {
    /// A change made directly by the user; its origin is its own representation
    pub const fn user(value: VelocityValue) -> Self {
        Self {
            origin: value.representation(),
            value,
        }
    }

    /// Whether this change is the echo of an edit made to the other representation
    pub fn is_echo(&self) -> bool {
        self.origin != self.value.representation()
    }
}

/// Keeps the Cartesian and spherical views of one velocity in sync
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VelocityEditor {
    cartesian: Vec3,
    spherical: Spherical,
}

impl VelocityEditor {
    /// Create an editor from a Cartesian velocity
    pub fn from_cartesian(velocity: Vec3) -> Self {
        Self {
            cartesian: velocity,
            spherical: to_spherical(&velocity),
        }
    }

    /// Current Cartesian velocity
    pub const fn cartesian(&self) -> Vec3 {
        self.cartesian
    }

    /// Current spherical velocity
    pub const fn spherical(&self) -> Spherical {
        self.spherical
    }

    /// Handle one change notification
    ///
    /// A user change stores its value and returns the echo for the other
    /// representation, tagged with the same origin. An echo is stored and
    /// produces nothing further.
    pub fn apply(&mut self, change: VelocityChange) -> Option<VelocityChange> {
        match change.value {
            VelocityValue::Cartesian(v) => self.cartesian = v,
            VelocityValue::Spherical(s) => self.spherical = s,
        }

        if change.is_echo() {
            return None;
        }

        let derived = match change.value {
            VelocityValue::Cartesian(v) => VelocityValue::Spherical(to_spherical(&v)),
            VelocityValue::Spherical(s) => VelocityValue::Cartesian(s.to_cartesian()),
        };

        Some(VelocityChange {
            origin: change.origin,
            value: derived,
        })
    }

    /// Apply a user edit and all notifications it triggers
    ///
    /// Returns the number of notifications handled, which is always two.
    pub fn edit(&mut self, value: VelocityValue) -> usize {
        let mut handled = 0;
        let mut pending = Some(VelocityChange::user(value));
        while let Some(change) = pending {
            pending = self.apply(change);
            handled += 1;
        }
        handled
    }

    /// Set the Cartesian velocity
    pub fn set_cartesian(&mut self, velocity: Vec3) {
        self.edit(VelocityValue::Cartesian(velocity));
    }

    /// Set the spherical velocity
    pub fn set_spherical(&mut self, spherical: Spherical) {
        self.edit(VelocityValue::Spherical(spherical));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::constants::{HALF_PI, PI};
    use approx::assert_relative_eq;

    fn round_trip(v: Vec3) -> Vec3 {
        to_spherical(&v).to_cartesian()
    }

    #[test]
    fn test_round_trip_axis_aligned() {
        for v in [Vec3::zeros(), Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 5.0)] {
            assert_relative_eq!(round_trip(v), v, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_round_trip_all_quadrants() {
        for v in [
            Vec3::new(3.0, 4.0, 1.0),
            Vec3::new(-3.0, 4.0, -2.0),
            Vec3::new(-3.0, -4.0, 0.5),
            Vec3::new(3.0, -4.0, 0.0),
            Vec3::new(0.0, 2.0, 0.0),
            Vec3::new(0.0, -7.0, 3.0),
            Vec3::new(0.0, 0.0, -5.0),
        ] {
            assert_relative_eq!(round_trip(v), v, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_known_angles() {
        let s = to_spherical(&Vec3::new(0.0, 2.0, 0.0));
        assert_relative_eq!(s.radius, 2.0);
        assert_relative_eq!(s.incline, HALF_PI);
        assert_relative_eq!(s.azimuth, HALF_PI);

        let s = to_spherical(&Vec3::new(-1.0, 0.0, 0.0));
        assert_relative_eq!(s.azimuth, PI);
    }

    #[test]
    fn test_zero_vector() {
        assert_eq!(to_spherical(&Vec3::zeros()), Spherical::default());
    }

    #[test]
    fn test_cartesian_edit_updates_spherical_once() {
        let mut editor = VelocityEditor::default();
        let handled = editor.edit(VelocityValue::Cartesian(Vec3::new(0.0, 3.0, 4.0)));

        assert_eq!(handled, 2);
        assert_relative_eq!(editor.spherical().radius, 5.0);
        assert_eq!(editor.cartesian(), Vec3::new(0.0, 3.0, 4.0));
    }

    #[test]
    fn test_spherical_edit_updates_cartesian() {
        let mut editor = VelocityEditor::default();
        editor.set_spherical(Spherical::new(2.0, HALF_PI, 0.0));

        assert_relative_eq!(editor.cartesian(), Vec3::new(2.0, 0.0, 0.0), epsilon = 1e-12);
        assert_eq!(editor.spherical(), Spherical::new(2.0, HALF_PI, 0.0));
    }

    #[test]
    fn test_echo_does_not_propagate() {
        let mut editor = VelocityEditor::from_cartesian(Vec3::new(1.0, 1.0, 1.0));
        let echo = VelocityChange {
            origin: Representation::Cartesian,
            value: VelocityValue::Spherical(Spherical::new(9.0, 0.0, 0.0)),
        };

        assert!(echo.is_echo());
        assert!(editor.apply(echo).is_none());
        // The echo is stored without rewriting the Cartesian side
        assert_eq!(editor.cartesian(), Vec3::new(1.0, 1.0, 1.0));
        assert_relative_eq!(editor.spherical().radius, 9.0);
    }

    #[test]
    fn test_interleaved_editors_are_independent() {
        let mut a = VelocityEditor::default();
        let mut b = VelocityEditor::default();

        let pending_a = a.apply(VelocityChange::user(VelocityValue::Cartesian(Vec3::new(1.0, 0.0, 0.0))));
        let pending_b = b.apply(VelocityChange::user(VelocityValue::Spherical(Spherical::new(3.0, 0.0, 0.0))));

        // Deliver the echoes crosswise in time; each stays with its own editor
        assert!(b.apply(pending_b.unwrap()).is_none());
        assert!(a.apply(pending_a.unwrap()).is_none());

        assert_relative_eq!(a.spherical().radius, 1.0);
        assert_relative_eq!(b.cartesian(), Vec3::new(0.0, 0.0, 3.0), epsilon = 1e-12);
    }
}
