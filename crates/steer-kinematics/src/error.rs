//! Error types for the kinematics library.
//!
//! These are returned when a vehicle is configured with impossible geometry or
//! when an integration step is requested with a negative or non-finite input.

use core::fmt;

/// Errors that can occur while configuring or integrating a vehicle.
#[derive(Debug, Clone, PartialEq)]
pub enum KinematicsError {
    /// Error for invalid wheelbase.
    /// This variant is returned when the front-to-rear axle distance is not positive.
    InvalidWheelbase(&'static str),
    /// Error for invalid track width.
    /// This variant is returned when the left-to-right wheel distance is negative or not finite.
    InvalidTrackWidth(&'static str),
    /// Error for invalid steering limit.
    /// This variant is returned when the maximum steering angle is outside `(0, PI/2)`.
    InvalidSteeringLimit(&'static str),
    /// Error for negative time delta.
    /// This variant is returned when a negative time delta is used for pose updates.
    NegativeTimeDelta(&'static str),
    /// Error for non-finite input.
    /// This variant is returned when a time delta or velocity is infinite or NaN.
    NonFiniteInput(&'static str),
}

impl fmt::Display for KinematicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KinematicsError::InvalidWheelbase(msg) => write!(f, "Invalid wheelbase: {}", msg),
            KinematicsError::InvalidTrackWidth(msg) => write!(f, "Invalid track width: {}", msg),
            KinematicsError::InvalidSteeringLimit(msg) => {
                write!(f, "Invalid steering limit: {}", msg)
            }
            KinematicsError::NegativeTimeDelta(msg) => write!(f, "Negative time delta: {}", msg),
            KinematicsError::NonFiniteInput(msg) => write!(f, "Non-finite input: {}", msg),
        }
    }
}

impl core::error::Error for KinematicsError {}
