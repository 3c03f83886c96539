//! Steering state, steering limits and the rear-axle coupling policy.

use core::fmt;
use core::f64::consts::FRAC_PI_2;
use libm::{atan2, fabs, tan};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::KinematicsError;
use crate::vehicle::VehicleGeometry;

/// Symmetric bound on any wheel angle, in radians.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteeringLimit {
    max_angle: f64,
}

impl SteeringLimit {
    /// Construct a steering limit.
    ///
    /// # Errors
    ///
    /// Returns `Err(KinematicsError::InvalidSteeringLimit)` unless `0 < max_angle < PI/2`.
    pub fn new(max_angle: f64) -> Result<Self, KinematicsError> {
        if !(max_angle > 0.0 && max_angle < FRAC_PI_2) {
            return Err(KinematicsError::InvalidSteeringLimit(
                "must be within (0, PI/2)",
            ));
        }
        Ok(SteeringLimit { max_angle })
    }

    /// Returns the maximum absolute wheel angle.
    pub fn max_angle(&self) -> f64 {
        self.max_angle
    }

    /// Clamp a single angle to `[-max_angle, max_angle]`.
    pub fn clamp(&self, angle: f64) -> f64 {
        angle.clamp(-self.max_angle, self.max_angle)
    }
}

/// Front and rear axle angles of the bicycle model (rad).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AxleSteering {
    /// Front axle angle (rad), positive turns left.
    pub front: f64,
    /// Rear axle angle (rad).
    pub rear: f64,
}

impl AxleSteering {
    /// Construct an axle pair.
    pub const fn new(front: f64, rear: f64) -> Self {
        AxleSteering { front, rear }
    }
}

/// Four independent wheel angles (rad).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WheelSteering {
    /// Front-left wheel angle (rad).
    pub front_left: f64,
    /// Front-right wheel angle (rad).
    pub front_right: f64,
    /// Rear-left wheel angle (rad).
    pub rear_left: f64,
    /// Rear-right wheel angle (rad).
    pub rear_right: f64,
}

impl WheelSteering {
    /// Construct four wheel angles.
    pub const fn new(front_left: f64, front_right: f64, rear_left: f64, rear_right: f64) -> Self {
        WheelSteering {
            front_left,
            front_right,
            rear_left,
            rear_right,
        }
    }

    /// Split axle angles into per-wheel angles using Ackermann geometry.
    ///
    /// Each axle's turn centre sits at `wheelbase / tan(angle)` to the side of the
    /// vehicle; the inner wheel points more sharply than the outer one by the
    /// half track width. A zero axle angle leaves both of its wheels straight.
    /// When the turn centre falls inside the half track the inner wheel passes
    /// `PI/2` but keeps the commanded direction, so clamping saturates it.
    pub fn ackermann(axles: AxleSteering, geometry: &VehicleGeometry) -> Self {
        let (front_left, front_right) = split_axle(axles.front, geometry);
        let (rear_left, rear_right) = split_axle(axles.rear, geometry);
        WheelSteering {
            front_left,
            front_right,
            rear_left,
            rear_right,
        }
    }

    /// Mean front and rear angles, i.e. the equivalent bicycle model.
    pub fn axle_average(&self) -> AxleSteering {
        AxleSteering {
            front: (self.front_left + self.front_right) / 2.0,
            rear: (self.rear_left + self.rear_right) / 2.0,
        }
    }
}

fn split_axle(angle: f64, geometry: &VehicleGeometry) -> (f64, f64) {
    if angle == 0.0 {
        return (0.0, 0.0);
    }
    let wheelbase = geometry.wheelbase();
    let half_track = geometry.track_width() / 2.0;
    // Distance to the turn centre; the sign of `angle` carries the direction.
    let radius = fabs(wheelbase / tan(angle));
    let inner = atan2(wheelbase, radius - half_track);
    let outer = atan2(wheelbase, radius + half_track);
    if angle > 0.0 {
        (inner, outer)
    } else {
        (-outer, -inner)
    }
}

/// Commanded steering for one integration step.
///
/// The variant selects the integration model used by
/// [`KinematicVehicle::integrate`](crate::KinematicVehicle::integrate).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SteeringState {
    /// Single effective steering angle on the front axle with a coupled rear angle.
    Axle(AxleSteering),
    /// Four independently steered wheels.
    FourWheel(WheelSteering),
}

impl Default for SteeringState {
    fn default() -> Self {
        SteeringState::Axle(AxleSteering::default())
    }
}

impl SteeringState {
    /// Returns a copy with every angle clamped to `limit`.
    pub fn clamped(&self, limit: &SteeringLimit) -> Self {
        match *self {
            SteeringState::Axle(a) => {
                SteeringState::Axle(AxleSteering::new(limit.clamp(a.front), limit.clamp(a.rear)))
            }
            SteeringState::FourWheel(w) => SteeringState::FourWheel(WheelSteering::new(
                limit.clamp(w.front_left),
                limit.clamp(w.front_right),
                limit.clamp(w.rear_left),
                limit.clamp(w.rear_right),
            )),
        }
    }

    /// True if no angle exceeds `limit` in absolute value.
    pub fn is_within(&self, limit: &SteeringLimit) -> bool {
        let max = limit.max_angle();
        let ok = |a: f64| fabs(a) <= max;
        match *self {
            SteeringState::Axle(a) => ok(a.front) && ok(a.rear),
            SteeringState::FourWheel(w) => {
                ok(w.front_left) && ok(w.front_right) && ok(w.rear_left) && ok(w.rear_right)
            }
        }
    }

    /// Front/rear view of the state, averaging wheel pairs for the four-wheel variant.
    pub fn axles(&self) -> AxleSteering {
        match *self {
            SteeringState::Axle(a) => a,
            SteeringState::FourWheel(w) => w.axle_average(),
        }
    }
}

impl fmt::Display for SteeringState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SteeringState::Axle(a) => {
                write!(f, "(front: {:.3} rad, rear: {:.3} rad)", a.front, a.rear)
            }
            SteeringState::FourWheel(w) => write!(
                f,
                "(fl: {:.3}, fr: {:.3}, rl: {:.3}, rr: {:.3} rad)",
                w.front_left, w.front_right, w.rear_left, w.rear_right
            ),
        }
    }
}

/// Policy deriving the rear axle angle from the front one.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum RearCoupling {
    /// Rear wheels stay straight (plain front steering).
    #[default]
    None,
    /// Rear angle is always `ratio * front`.
    Fixed(f64),
    /// Counter-phase below `threshold` speed, in-phase at or above it.
    VelocityPhased {
        /// Speed (absolute) at which the policy switches ratio.
        threshold: f64,
        /// Ratio applied below `threshold`, usually negative.
        low_speed_ratio: f64,
        /// Ratio applied at or above `threshold`, usually positive.
        high_speed_ratio: f64,
    },
}

impl RearCoupling {
    /// Counter-phase `-1/2` below a speed of 10, in-phase `+1/4` above.
    pub const fn velocity_phased() -> Self {
        RearCoupling::VelocityPhased {
            threshold: 10.0,
            low_speed_ratio: -0.5,
            high_speed_ratio: 0.25,
        }
    }

    /// Rear angle for a given front angle and forward velocity.
    pub fn rear_angle(&self, front: f64, velocity: f64) -> f64 {
        match *self {
            RearCoupling::None => 0.0,
            RearCoupling::Fixed(ratio) => ratio * front,
            RearCoupling::VelocityPhased {
                threshold,
                low_speed_ratio,
                high_speed_ratio,
            } => {
                if fabs(velocity) < threshold {
                    low_speed_ratio * front
                } else {
                    high_speed_ratio * front
                }
            }
        }
    }

    /// Pair the front angle with its coupled rear angle.
    pub fn couple(&self, front: f64, velocity: f64) -> AxleSteering {
        AxleSteering::new(front, self.rear_angle(front, velocity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    const EPSILON: f64 = 1e-9;

    fn geometry() -> VehicleGeometry {
        VehicleGeometry::new(2.5, 1.5).unwrap()
    }

    #[test]
    fn test_limit_constructor() {
        assert!(SteeringLimit::new(0.5).is_ok());
        assert!(matches!(
            SteeringLimit::new(0.0),
            Err(KinematicsError::InvalidSteeringLimit(_))
        ));
        assert!(matches!(
            SteeringLimit::new(FRAC_PI_2),
            Err(KinematicsError::InvalidSteeringLimit(_))
        ));
        assert!(SteeringLimit::new(f64::NAN).is_err());
    }

    #[test]
    fn test_clamp_axle_state() {
        let limit = SteeringLimit::new(0.5).unwrap();
        let state = SteeringState::Axle(AxleSteering::new(0.9, -0.7));
        assert!(!state.is_within(&limit));
        let clamped = state.clamped(&limit);
        assert_eq!(clamped, SteeringState::Axle(AxleSteering::new(0.5, -0.5)));
        assert!(clamped.is_within(&limit));
    }

    #[test]
    fn test_clamp_four_wheel_state() {
        let limit = SteeringLimit::new(0.3).unwrap();
        let state = SteeringState::FourWheel(WheelSteering::new(0.1, 0.4, -0.4, -0.2));
        let clamped = state.clamped(&limit);
        assert_eq!(
            clamped,
            SteeringState::FourWheel(WheelSteering::new(0.1, 0.3, -0.3, -0.2))
        );
    }

    #[test]
    fn test_ackermann_inner_wheel_turns_sharper() {
        let wheels = WheelSteering::ackermann(AxleSteering::new(0.3, 0.0), &geometry());
        // Left turn: left wheel is the inner wheel.
        assert!(wheels.front_left > 0.3);
        assert!(wheels.front_right < 0.3 && wheels.front_right > 0.0);
        assert_eq!(wheels.rear_left, 0.0);
        assert_eq!(wheels.rear_right, 0.0);

        let right_turn = WheelSteering::ackermann(AxleSteering::new(-0.3, 0.0), &geometry());
        assert!((right_turn.front_left + wheels.front_right).abs() < EPSILON);
        assert!((right_turn.front_right + wheels.front_left).abs() < EPSILON);
    }

    #[test]
    fn test_ackermann_zero_track_is_bicycle() {
        let narrow = VehicleGeometry::new(2.5, 0.0).unwrap();
        let wheels = WheelSteering::ackermann(AxleSteering::new(0.2, -0.1), &narrow);
        assert!((wheels.front_left - 0.2).abs() < EPSILON);
        assert!((wheels.front_right - 0.2).abs() < EPSILON);
        assert!((wheels.rear_left + 0.1).abs() < EPSILON);
        assert!((wheels.rear_right + 0.1).abs() < EPSILON);
    }

    #[test]
    fn test_ackermann_turn_centre_inside_track() {
        // Turn centre at ~1.83 from the axle, inside the 2.0 half track.
        let wide = VehicleGeometry::new(1.0, 4.0).unwrap();
        let limit = SteeringLimit::new(0.5).unwrap();

        let wheels = WheelSteering::ackermann(AxleSteering::new(0.5, 0.0), &wide);
        assert!(wheels.front_left > FRAC_PI_2);
        assert!(wheels.front_right > 0.0 && wheels.front_right < 0.5);

        let clamped = SteeringState::FourWheel(wheels).clamped(&limit);
        let axles = clamped.axles();
        assert!((axles.front - (0.5 + wheels.front_right) / 2.0).abs() < EPSILON);
        assert!(axles.front > 0.0);

        let vehicle = crate::KinematicVehicle::new(wide);
        let next = vehicle
            .integrate(crate::Pose::default(), clamped, 1.0, 0.1)
            .unwrap();
        assert!(next.yaw > 0.0);

        let right = WheelSteering::ackermann(AxleSteering::new(-0.5, 0.0), &wide);
        assert!((right.front_left + wheels.front_right).abs() < EPSILON);
        assert!((right.front_right + wheels.front_left).abs() < EPSILON);
        assert!(SteeringState::FourWheel(right).clamped(&limit).axles().front < 0.0);
    }

    #[test]
    fn test_axle_average() {
        let wheels = WheelSteering::new(0.2, 0.4, -0.1, -0.3);
        let axles = wheels.axle_average();
        assert!((axles.front - 0.3).abs() < EPSILON);
        assert!((axles.rear + 0.2).abs() < EPSILON);
    }

    #[test]
    fn test_rear_coupling_policies() {
        assert_eq!(RearCoupling::None.rear_angle(0.4, 5.0), 0.0);
        assert!((RearCoupling::Fixed(0.3).rear_angle(0.4, 5.0) - 0.12).abs() < EPSILON);

        let phased = RearCoupling::velocity_phased();
        assert!((phased.rear_angle(0.4, 5.0) - (-0.2)).abs() < EPSILON); // counter-phase
        assert!((phased.rear_angle(0.4, 30.0) - 0.1).abs() < EPSILON); // in-phase
        assert!((phased.rear_angle(0.4, -30.0) - 0.1).abs() < EPSILON); // reverse uses speed
        assert!((phased.rear_angle(0.4, 10.0) - 0.1).abs() < EPSILON); // threshold is in-phase
    }

    #[test]
    fn test_couple() {
        let axles = RearCoupling::Fixed(-0.5).couple(0.2, 1.0);
        assert_eq!(axles, AxleSteering::new(0.2, -0.1));
    }
}
