//! This module defines the error types used by the `steer-control` crate.

use steer_kinematics::KinematicsError;

/// Error type for control and path operations.
///
/// Returned when a path, tracker or simulation is configured with values that
/// would otherwise produce NaN or meaningless output.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlError {
    /// Error for invalid point count.
    /// This variant is returned when a path is requested with zero points.
    InvalidPointCount(&'static str),
    /// Error for invalid radius.
    /// This variant is returned when a circle radius is negative or not finite.
    InvalidRadius(&'static str),
    /// Error for invalid side length.
    /// This variant is returned when a square side is negative or not finite.
    InvalidSideLength(&'static str),
    /// Error for invalid segment count.
    /// This variant is returned when a random path is requested with zero segments.
    InvalidSegmentCount(&'static str),
    /// Error for invalid segment length.
    /// This variant is returned when a random path segment length is not positive.
    InvalidSegmentLength(&'static str),
    /// Error for invalid lookahead distance.
    /// This variant is returned when a pure-pursuit lookahead is not positive.
    InvalidLookahead(&'static str),
    /// Error for invalid time step.
    /// This variant is returned when a tick is requested with a negative or non-finite time step.
    InvalidTimeStep(&'static str),
    /// Error for invalid velocity.
    /// This variant is returned when the vehicle velocity is infinite or NaN.
    InvalidVelocity(&'static str),
    /// Error raised by the kinematics layer.
    Kinematics(KinematicsError),
}

impl core::fmt::Display for ControlError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ControlError::InvalidPointCount(msg) => write!(f, "Invalid point count: {}", msg),
            ControlError::InvalidRadius(msg) => write!(f, "Invalid radius: {}", msg),
            ControlError::InvalidSideLength(msg) => write!(f, "Invalid side length: {}", msg),
            ControlError::InvalidSegmentCount(msg) => write!(f, "Invalid segment count: {}", msg),
            ControlError::InvalidSegmentLength(msg) => {
                write!(f, "Invalid segment length: {}", msg)
            }
            ControlError::InvalidLookahead(msg) => write!(f, "Invalid lookahead distance: {}", msg),
            ControlError::InvalidTimeStep(msg) => write!(f, "Invalid time step: {}", msg),
            ControlError::InvalidVelocity(msg) => write!(f, "Invalid velocity: {}", msg),
            ControlError::Kinematics(err) => write!(f, "Kinematics error: {}", err),
        }
    }
}

impl core::error::Error for ControlError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            ControlError::Kinematics(err) => Some(err),
            _ => None,
        }
    }
}

impl From<KinematicsError> for ControlError {
    fn from(err: KinematicsError) -> Self {
        ControlError::Kinematics(err)
    }
}
