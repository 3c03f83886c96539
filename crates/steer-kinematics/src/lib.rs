#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![doc = "A `no_std` library for 2D steerable-vehicle kinematics."]
#![doc = ""]
#![doc = "This crate provides the vehicle pose, steering state and a fixed-step kinematic"]
#![doc = "integrator for bicycle (front/rear axle) and four-wheel-steering models."]

use core::f64::consts::{PI, TAU};
use core::fmt;
use libm::{atan2, hypot};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub mod error;
pub mod steering;
pub mod vehicle;

pub use error::KinematicsError;
pub use steering::{AxleSteering, RearCoupling, SteeringLimit, SteeringState, WheelSteering};
pub use vehicle::{KinematicVehicle, VehicleGeometry};

/// A 2‑D pose `(x, y, ψ)` in world units and radians (ψ measured counter‑clockwise
/// from the x‑axis in the world frame).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    /// World‑frame x position.
    pub x: f64,
    /// World‑frame y position.
    pub y: f64,
    /// Heading (rad), normalized to `[-PI, PI)`.
    pub yaw: f64,
}

impl Pose {
    /// Construct a new pose. The heading is normalized to `[-PI, PI)`.
    ///
    /// # Arguments
    ///
    /// * `x`: World-frame x position.
    /// * `y`: World-frame y position.
    /// * `yaw`: Heading in radians.
    pub fn new(x: f64, y: f64, yaw: f64) -> Self {
        Pose {
            x,
            y,
            yaw: Pose::normalize_angle(yaw),
        }
    }

    /// Normalize an angle to be within `[-PI, PI)`.
    ///
    /// Angles at `PI` will be normalized to `-PI`. This is the canonical range
    /// for stored headings.
    ///
    /// # Arguments
    ///
    /// * `angle`: The angle in radians to normalize.
    ///
    /// # Returns
    ///
    /// The normalized angle in radians.
    pub fn normalize_angle(angle: f64) -> f64 {
        let a = angle % TAU;
        if a >= PI {
            a - TAU
        } else if a < -PI {
            a + TAU
        } else {
            a
        }
    }

    /// Euclidean distance from this pose's position to `(x, y)`.
    pub fn distance_to(&self, x: f64, y: f64) -> f64 {
        hypot(x - self.x, y - self.y)
    }

    /// Heading error towards `(x, y)`: the bearing of the point minus the current
    /// heading, wrapped to `(-PI, PI]` so the sign gives the shortest turn.
    pub fn bearing_error_to(&self, x: f64, y: f64) -> f64 {
        let bearing = atan2(y - self.y, x - self.x);
        wrap_angle(bearing - self.yaw)
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(x: {:.2}, y: {:.2}, ψ: {:.2} rad)", self.x, self.y, self.yaw)
    }
}

/// Reduce an angle difference into the half-open interval `(-PI, PI]`.
///
/// Computed as `((a + PI) mod 2PI) - PI` with a floored modulo, then the lower
/// bound `-PI` is folded onto `PI`. Use this for heading *errors*; stored
/// headings use [`Pose::normalize_angle`].
pub fn wrap_angle(angle: f64) -> f64 {
    let mut a = (angle + PI) % TAU;
    if a < 0.0 {
        a += TAU;
    }
    let a = a - PI;
    if a <= -PI { PI } else { a }
}
