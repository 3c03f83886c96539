//! Closed-loop steering control for kinematic vehicles.
//!
//! The crate is organised leaf-first:
//! - [`pid`]: scalar PID controller
//! - [`path`]: circle, square and random-walk reference paths
//! - [`tracking`]: cross-track and pure-pursuit error signals
//! - [`sim`]: the per-tick error → PID → clamp → integrate loop
//! - [`experiment`]: open-loop turning-radius sweep

#![warn(missing_docs)]

pub mod error;
pub mod experiment;
pub mod path;
pub mod pid;
pub mod sim;
pub mod tracking;

pub use error::ControlError;
pub use path::{
    Path, PathClosure, PathPoint, generate_circle_path, generate_random_path, generate_square_path,
};
pub use pid::{PidController, PidGains};
pub use sim::{
    NoTargetPolicy, Reference, SimulationStep, SteeringMode, TickReport, TrackingOutcome,
    VehicleState,
};
pub use tracking::{
    CircleReference, LookaheadTarget, PurePursuit, bearing_error, cross_track_error,
    lookahead_steering_error,
};
