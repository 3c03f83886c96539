//! Tracking-error signals fed to the steering controller.
//!
//! Two strategies:
//! - cross-track error against a circle (signed radial distance)
//! - pure-pursuit heading error towards the first path point at least one
//!   lookahead distance away

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use steer_kinematics::Pose;

use crate::error::ControlError;
use crate::path::{Path, PathPoint};

/// Signed distance from `pose` to the circle: positive outside, negative
/// inside, zero on the circle.
pub fn cross_track_error(pose: &Pose, center: PathPoint, radius: f64) -> f64 {
    pose.distance_to(center.x, center.y) - radius
}

/// Heading error from `pose` towards `target`, wrapped to `(-PI, PI]`.
pub fn bearing_error(pose: &Pose, target: PathPoint) -> f64 {
    pose.bearing_error_to(target.x, target.y)
}

/// Circular reference for cross-track tracking.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleReference {
    center: PathPoint,
    radius: f64,
}

impl CircleReference {
    /// # Errors
    ///
    /// Returns `Err(ControlError::InvalidRadius)` if `radius` is negative or not finite.
    pub fn new(center: PathPoint, radius: f64) -> Result<Self, ControlError> {
        if !(radius >= 0.0 && radius.is_finite()) {
            return Err(ControlError::InvalidRadius("must be non-negative"));
        }
        Ok(CircleReference { center, radius })
    }

    /// Returns the centre.
    pub fn center(&self) -> PathPoint {
        self.center
    }

    /// Returns the radius.
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// See [`cross_track_error`].
    pub fn cross_track_error(&self, pose: &Pose) -> f64 {
        cross_track_error(pose, self.center, self.radius)
    }
}

/// Outcome of a lookahead search.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LookaheadTarget {
    /// A path point at or beyond the lookahead distance was found.
    Found {
        /// Index of the target point in the path.
        index: usize,
        /// Heading error towards the target, in `(-PI, PI]`.
        angle: f64,
    },
    /// Every path point is closer than the lookahead distance, or the path is empty.
    NotFound,
}

impl LookaheadTarget {
    /// The heading error, if a target was found.
    pub fn angle(&self) -> Option<f64> {
        match *self {
            LookaheadTarget::Found { angle, .. } => Some(angle),
            LookaheadTarget::NotFound => None,
        }
    }

    /// True if a target was found.
    pub fn is_found(&self) -> bool {
        matches!(self, LookaheadTarget::Found { .. })
    }
}

/// Scan `path` in order and aim at the first point whose distance from the
/// pose meets or exceeds `lookahead`.
///
/// Callers should validate `lookahead` through [`PurePursuit::new`].
pub fn lookahead_steering_error(pose: &Pose, path: &Path, lookahead: f64) -> LookaheadTarget {
    path.iter()
        .position(|p| pose.distance_to(p.x, p.y) >= lookahead)
        .map_or(LookaheadTarget::NotFound, |index| {
            let target = path.points()[index];
            LookaheadTarget::Found {
                index,
                angle: bearing_error(pose, target),
            }
        })
}

/// Pure-pursuit tracker with a fixed lookahead horizon.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PurePursuit {
    lookahead: f64,
}

impl PurePursuit {
    /// # Errors
    ///
    /// Returns `Err(ControlError::InvalidLookahead)` if `lookahead` is not positive and finite.
    pub fn new(lookahead: f64) -> Result<Self, ControlError> {
        if !(lookahead > 0.0 && lookahead.is_finite()) {
            return Err(ControlError::InvalidLookahead("must be positive"));
        }
        Ok(PurePursuit { lookahead })
    }

    /// Returns the lookahead distance.
    pub fn lookahead(&self) -> f64 {
        self.lookahead
    }

    /// See [`lookahead_steering_error`].
    pub fn steering_error(&self, pose: &Pose, path: &Path) -> LookaheadTarget {
        lookahead_steering_error(pose, path, self.lookahead)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};
    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_cross_track_sign_convention() {
        let center = PathPoint::new(0.0, 0.0);
        let outside = cross_track_error(&Pose::new(150.0, 0.0, 0.0), center, 100.0);
        let inside = cross_track_error(&Pose::new(0.0, 50.0, 0.0), center, 100.0);
        assert!((outside - 50.0).abs() < EPSILON);
        assert!((inside + 50.0).abs() < EPSILON);
        assert!(cross_track_error(&Pose::new(0.0, -100.0, 0.0), center, 100.0).abs() < EPSILON);
    }

    #[test]
    fn test_circle_reference() {
        let reference = CircleReference::new(PathPoint::new(400.0, 300.0), 100.0).unwrap();
        let pose = Pose::new(400.0, 180.0, 0.0);
        assert!((reference.cross_track_error(&pose) - 20.0).abs() < EPSILON);
        assert!(matches!(
            CircleReference::new(PathPoint::default(), -1.0),
            Err(ControlError::InvalidRadius(_))
        ));
    }

    #[test]
    fn test_lookahead_picks_first_far_enough_point() {
        let path = Path::from_points(
            vec![
                PathPoint::new(1.0, 0.0),
                PathPoint::new(2.0, 0.0),
                PathPoint::new(5.0, 5.0),
                PathPoint::new(10.0, 0.0),
            ],
            false,
        );
        let pose = Pose::new(0.0, 0.0, 0.0);
        let target = lookahead_steering_error(&pose, &path, 3.0);
        match target {
            LookaheadTarget::Found { index, angle } => {
                assert_eq!(index, 2);
                assert!((angle - FRAC_PI_4).abs() < EPSILON);
            }
            LookaheadTarget::NotFound => panic!("expected a target"),
        }
    }

    #[test]
    fn test_lookahead_distance_is_inclusive() {
        let path = Path::from_points(vec![PathPoint::new(0.0, 2.0)], false);
        let target = lookahead_steering_error(&Pose::new(0.0, 0.0, 0.0), &path, 2.0);
        assert!(target.is_found());
        assert!((target.angle().unwrap() - FRAC_PI_2).abs() < EPSILON);
    }

    #[test]
    fn test_lookahead_angle_wraps_to_shortest_turn() {
        let path = Path::from_points(vec![PathPoint::new(-10.0, -1.0)], false);
        let pose = Pose::new(0.0, 0.0, PI - 0.05);
        let angle = lookahead_steering_error(&pose, &path, 1.0).angle().unwrap();
        assert!(angle > 0.0 && angle < 0.2);
    }

    #[test]
    fn test_lookahead_no_target() {
        let path = Path::from_points(
            vec![PathPoint::new(1.0, 0.0), PathPoint::new(0.0, 1.0)],
            false,
        );
        let target = lookahead_steering_error(&Pose::default(), &path, 5.0);
        assert_eq!(target, LookaheadTarget::NotFound);
        assert_eq!(target.angle(), None);
        assert!(!target.is_found());

        let empty = Path::default();
        assert_eq!(
            lookahead_steering_error(&Pose::default(), &empty, 1.0),
            LookaheadTarget::NotFound
        );
    }

    #[test]
    fn test_pure_pursuit_constructor() {
        assert!(PurePursuit::new(25.0).is_ok());
        assert!(matches!(PurePursuit::new(0.0), Err(ControlError::InvalidLookahead(_))));
        assert!(PurePursuit::new(-3.0).is_err());
        assert!(PurePursuit::new(f64::NAN).is_err());
    }

    #[test]
    fn test_bearing_error() {
        let pose = Pose::new(0.0, 0.0, FRAC_PI_2);
        let err = bearing_error(&pose, PathPoint::new(1.0, 0.0));
        assert!((err + FRAC_PI_2).abs() < EPSILON);
    }
}
