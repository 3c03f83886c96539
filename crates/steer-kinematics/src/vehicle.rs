//! Vehicle geometry and the fixed-step kinematic integrator.
//!
//! Two steering models share one integrator:
//!
//! * [`SteeringState::Axle`]: bicycle model driven by the front axle angle.
//!   Yaw is integrated first and the position is advanced along the *new* heading.
//! * [`SteeringState::FourWheel`]: wheel pairs are averaged per axle, each axle's
//!   turning radius is `wheelbase / tan(angle)` and the two radii are combined
//!   with a harmonic mean. The position is advanced along the heading held at the
//!   start of the step, then the heading is turned.
//!
//! Neither model clamps its input; callers clamp against a
//! [`SteeringLimit`](crate::SteeringLimit) before integrating.

use core::fmt;
use libm::{cos, sin, tan};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Pose;
use crate::error::KinematicsError;
use crate::steering::{AxleSteering, SteeringState, WheelSteering};

/// Fixed per-vehicle dimensions.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleGeometry {
    /// Front-to-rear axle distance.
    wheelbase: f64,
    /// Left-to-right wheel distance.
    track_width: f64,
}

impl VehicleGeometry {
    /// Construct vehicle geometry.
    ///
    /// # Arguments
    ///
    /// * `wheelbase`: Distance between the front and rear axles.
    /// * `track_width`: Distance between the left and right wheels. Zero is allowed
    ///   and reduces the four-wheel model to the bicycle model.
    ///
    /// # Errors
    ///
    /// Returns `Err(KinematicsError::InvalidWheelbase)` if `wheelbase` is not positive and finite.
    /// Returns `Err(KinematicsError::InvalidTrackWidth)` if `track_width` is negative or not
    /// finite.
    pub fn new(wheelbase: f64, track_width: f64) -> Result<Self, KinematicsError> {
        if !(wheelbase > 0.0 && wheelbase.is_finite()) {
            return Err(KinematicsError::InvalidWheelbase("must be positive"));
        }
        if !(track_width >= 0.0 && track_width.is_finite()) {
            return Err(KinematicsError::InvalidTrackWidth("must be non-negative"));
        }
        Ok(VehicleGeometry {
            wheelbase,
            track_width,
        })
    }

    /// Returns the wheelbase.
    pub fn wheelbase(&self) -> f64 {
        self.wheelbase
    }

    /// Returns the track width.
    pub fn track_width(&self) -> f64 {
        self.track_width
    }
}

impl fmt::Display for VehicleGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "VehicleGeometry (L: {:.2}, W: {:.2})",
            self.wheelbase, self.track_width
        )
    }
}

/// Kinematic (slip-free, massless) steerable vehicle.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicVehicle {
    geometry: VehicleGeometry,
}

impl KinematicVehicle {
    /// Construct a vehicle from validated geometry.
    pub const fn new(geometry: VehicleGeometry) -> Self {
        KinematicVehicle { geometry }
    }

    /// Returns the vehicle geometry.
    pub fn geometry(&self) -> &VehicleGeometry {
        &self.geometry
    }

    /// Advances `pose` by one Euler step of length `dt`.
    ///
    /// The steering variant picks the model. The returned heading is normalized
    /// to `[-PI, PI)`.
    ///
    /// # Arguments
    ///
    /// * `pose`: The vehicle pose at the start of the step.
    /// * `steering`: Steering command, already clamped by the caller.
    /// * `velocity`: Signed forward velocity; negative drives in reverse.
    /// * `dt`: Step length. Zero returns the pose unchanged.
    ///
    /// # Errors
    ///
    /// Returns `Err(KinematicsError::NegativeTimeDelta)` if `dt` is negative, and
    /// `Err(KinematicsError::NonFiniteInput)` if `dt` or `velocity` is infinite or NaN.
    pub fn integrate(
        &self,
        pose: Pose,
        steering: SteeringState,
        velocity: f64,
        dt: f64,
    ) -> Result<Pose, KinematicsError> {
        if dt < 0.0 {
            return Err(KinematicsError::NegativeTimeDelta("must be non-negative"));
        }
        if !dt.is_finite() {
            return Err(KinematicsError::NonFiniteInput("time delta must be finite"));
        }
        if !velocity.is_finite() {
            return Err(KinematicsError::NonFiniteInput("velocity must be finite"));
        }
        let next = match steering {
            SteeringState::Axle(axles) => self.integrate_axle(pose, axles, velocity, dt),
            SteeringState::FourWheel(wheels) => {
                self.integrate_four_wheel(pose, wheels, velocity, dt)
            }
        };
        Ok(next)
    }

    /// Bicycle-model yaw rate `v * tan(angle) / wheelbase`; zero for a straight wheel.
    pub fn yaw_rate(&self, steering_angle: f64, velocity: f64) -> f64 {
        if steering_angle == 0.0 {
            return 0.0;
        }
        velocity * tan(steering_angle) / self.geometry.wheelbase
    }

    /// Turning radius of a single axle, `wheelbase / tan(angle)`.
    ///
    /// Signed: positive turns left. Returns `f64::INFINITY` for a straight axle.
    pub fn axle_turning_radius(&self, angle: f64) -> f64 {
        if angle == 0.0 {
            return f64::INFINITY;
        }
        self.geometry.wheelbase / tan(angle)
    }

    /// Combined turning radius of both axles.
    ///
    /// Harmonic mean of the two axle radii when both are finite, otherwise the
    /// finite one, otherwise `f64::INFINITY`. Radii that cancel out (equal and
    /// opposite) also give `f64::INFINITY`.
    pub fn combined_turning_radius(&self, axles: AxleSteering) -> f64 {
        let front = self.axle_turning_radius(axles.front);
        let rear = self.axle_turning_radius(axles.rear);
        match (front.is_finite(), rear.is_finite()) {
            (true, true) => {
                let sum = front + rear;
                if sum == 0.0 {
                    f64::INFINITY
                } else {
                    2.0 * front * rear / sum
                }
            }
            (true, false) => front,
            (false, true) => rear,
            (false, false) => f64::INFINITY,
        }
    }

    fn integrate_axle(&self, pose: Pose, axles: AxleSteering, velocity: f64, dt: f64) -> Pose {
        let yaw = pose.yaw + self.yaw_rate(axles.front, velocity) * dt;
        Pose {
            x: pose.x + velocity * cos(yaw) * dt,
            y: pose.y + velocity * sin(yaw) * dt,
            yaw: Pose::normalize_angle(yaw),
        }
    }

    fn integrate_four_wheel(
        &self,
        pose: Pose,
        wheels: WheelSteering,
        velocity: f64,
        dt: f64,
    ) -> Pose {
        if velocity == 0.0 {
            return pose;
        }
        let radius = self.combined_turning_radius(wheels.axle_average());
        let angular_velocity = if radius.is_infinite() {
            0.0
        } else {
            velocity / radius
        };
        Pose {
            x: pose.x + velocity * cos(pose.yaw) * dt,
            y: pose.y + velocity * sin(pose.yaw) * dt,
            yaw: Pose::normalize_angle(pose.yaw + angular_velocity * dt),
        }
    }
}

impl fmt::Display for KinematicVehicle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KinematicVehicle ({})", self.geometry)
    }
}
