//! Per-tick closed-loop orchestration.
//!
//! Each [`SimulationStep::tick`] runs, in order: tracking error from the current
//! pose, PID update, steering derivation and clamping, then one integration
//! step of the vehicle. Nothing here is shared across threads; the caller owns
//! the step and drives it with its own clock.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use steer_kinematics::{
    KinematicVehicle, Pose, RearCoupling, SteeringLimit, SteeringState, WheelSteering,
};
use tracing::{debug, info, warn};

use crate::error::ControlError;
use crate::path::Path;
use crate::pid::PidController;
use crate::tracking::{CircleReference, LookaheadTarget, PurePursuit};

/// What the vehicle is asked to follow, and how its error is measured.
#[derive(Debug, Clone, PartialEq)]
pub enum Reference {
    /// Cross-track error against a circle.
    Circle(CircleReference),
    /// Pure-pursuit heading error against a polyline.
    Path {
        /// Reference polyline.
        path: Path,
        /// Lookahead tracker.
        pursuit: PurePursuit,
    },
}

/// Which integration model the commanded steering drives.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SteeringMode {
    /// Front/rear axle pair (bicycle model).
    #[default]
    Bicycle,
    /// Four wheels split from the axle pair with Ackermann geometry.
    FourWheel,
}

/// Fallback when pure pursuit finds no target.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoTargetPolicy {
    /// Skip the controller and keep the previous steering.
    #[default]
    HoldSteering,
    /// Feed a zero error into the controller.
    ZeroError,
}

/// Pose plus signed forward velocity.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VehicleState {
    /// Current pose.
    pub pose: Pose,
    /// Signed forward velocity.
    pub velocity: f64,
}

impl VehicleState {
    /// Construct a vehicle state.
    pub const fn new(pose: Pose, velocity: f64) -> Self {
        VehicleState { pose, velocity }
    }
}

/// Tracking measurement taken at the start of a tick.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackingOutcome {
    /// Signed cross-track error.
    CrossTrack(f64),
    /// Pure-pursuit heading error towards path point `index`.
    Lookahead {
        /// Index of the target point.
        index: usize,
        /// Heading error in `(-PI, PI]`.
        angle: f64,
    },
    /// Pure pursuit found no point far enough away.
    NoTarget,
}

impl TrackingOutcome {
    /// The measured error, if there is one.
    pub fn error(&self) -> Option<f64> {
        match *self {
            TrackingOutcome::CrossTrack(e) => Some(e),
            TrackingOutcome::Lookahead { angle, .. } => Some(angle),
            TrackingOutcome::NoTarget => None,
        }
    }
}

/// Result of one tick.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    /// Pose after integration.
    pub pose: Pose,
    /// Clamped steering applied during the tick.
    pub steering: SteeringState,
    /// Tracking measurement taken before the update.
    pub tracking: TrackingOutcome,
    /// Raw controller output, `None` when steering was held.
    pub command: Option<f64>,
}

/// Closed-loop steering simulation for one vehicle.
#[derive(Debug, Clone)]
pub struct SimulationStep {
    vehicle: KinematicVehicle,
    limit: SteeringLimit,
    mode: SteeringMode,
    coupling: RearCoupling,
    controller: PidController,
    reference: Reference,
    policy: NoTargetPolicy,
    state: VehicleState,
    steering: SteeringState,
    elapsed: f64,
    ticks: u64,
    target_lost: bool,
}

impl SimulationStep {
    /// Assemble a simulation with bicycle steering, no rear coupling and the
    /// hold-steering fallback.
    pub fn new(
        vehicle: KinematicVehicle,
        limit: SteeringLimit,
        controller: PidController,
        reference: Reference,
        initial: VehicleState,
    ) -> Self {
        info!(
            vehicle = %vehicle,
            max_steering = limit.max_angle(),
            initial_pose = %initial.pose,
            velocity = initial.velocity,
            "Simulation step assembled"
        );
        SimulationStep {
            vehicle,
            limit,
            mode: SteeringMode::default(),
            coupling: RearCoupling::default(),
            controller,
            reference,
            policy: NoTargetPolicy::default(),
            state: initial,
            steering: SteeringState::default(),
            elapsed: 0.0,
            ticks: 0,
            target_lost: false,
        }
    }

    /// Select the integration model.
    pub fn with_steering_mode(mut self, mode: SteeringMode) -> Self {
        self.mode = mode;
        self.steering = self.derive_steering(0.0);
        self
    }

    /// Select how the rear angle follows the front one.
    pub fn with_rear_coupling(mut self, coupling: RearCoupling) -> Self {
        self.coupling = coupling;
        self
    }

    /// Select the fallback used when pure pursuit finds no target.
    pub fn with_no_target_policy(mut self, policy: NoTargetPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Advance the simulation by `dt`.
    ///
    /// # Errors
    ///
    /// Returns `Err(ControlError::InvalidTimeStep)` if `dt` is negative or not finite,
    /// and `Err(ControlError::InvalidVelocity)` if the vehicle velocity is not finite.
    /// A rejected tick leaves the pose and the controller untouched.
    pub fn tick(&mut self, dt: f64) -> Result<TickReport, ControlError> {
        if !(dt >= 0.0 && dt.is_finite()) {
            return Err(ControlError::InvalidTimeStep("must be non-negative and finite"));
        }
        if !self.state.velocity.is_finite() {
            return Err(ControlError::InvalidVelocity("must be finite"));
        }
        let pose = self.state.pose;
        let tracking = self.measure(&pose);

        let error = match tracking.error() {
            Some(e) => {
                self.target_lost = false;
                Some(e)
            }
            None => {
                if !self.target_lost {
                    warn!(policy = ?self.policy, pose = %pose, "No lookahead target on path");
                    self.target_lost = true;
                }
                match self.policy {
                    NoTargetPolicy::HoldSteering => None,
                    NoTargetPolicy::ZeroError => Some(0.0),
                }
            }
        };

        let command = error.map(|e| self.controller.update(e, dt));
        if let Some(command) = command {
            self.steering = self.derive_steering(command);
        }
        let steering = self.steering.clamped(&self.limit);

        let next = self
            .vehicle
            .integrate(pose, steering, self.state.velocity, dt)?;
        self.state.pose = next;
        self.elapsed += dt;
        self.ticks += 1;

        debug!(
            tick = self.ticks,
            x = next.x,
            y = next.y,
            yaw = next.yaw,
            error = ?tracking.error(),
            command = ?command,
            "Simulation tick"
        );

        Ok(TickReport {
            pose: next,
            steering,
            tracking,
            command,
        })
    }

    fn measure(&self, pose: &Pose) -> TrackingOutcome {
        match &self.reference {
            Reference::Circle(circle) => {
                TrackingOutcome::CrossTrack(circle.cross_track_error(pose))
            }
            Reference::Path { path, pursuit } => match pursuit.steering_error(pose, path) {
                LookaheadTarget::Found { index, angle } => {
                    TrackingOutcome::Lookahead { index, angle }
                }
                LookaheadTarget::NotFound => TrackingOutcome::NoTarget,
            },
        }
    }

    fn derive_steering(&self, command: f64) -> SteeringState {
        let front = self.limit.clamp(command);
        let axles = self.coupling.couple(front, self.state.velocity);
        let steering = match self.mode {
            SteeringMode::Bicycle => SteeringState::Axle(axles),
            SteeringMode::FourWheel => {
                SteeringState::FourWheel(WheelSteering::ackermann(axles, self.vehicle.geometry()))
            }
        };
        steering.clamped(&self.limit)
    }

    /// Change the forward velocity used from the next tick on.
    ///
    /// # Errors
    ///
    /// Returns `Err(ControlError::InvalidVelocity)` if `velocity` is not finite;
    /// the previous velocity is kept.
    pub fn set_velocity(&mut self, velocity: f64) -> Result<(), ControlError> {
        if !velocity.is_finite() {
            return Err(ControlError::InvalidVelocity("must be finite"));
        }
        self.state.velocity = velocity;
        Ok(())
    }

    /// Zero the controller's integral and previous error.
    pub fn reset_controller(&mut self) {
        self.controller.reset();
    }

    /// Returns the current vehicle state.
    pub fn state(&self) -> &VehicleState {
        &self.state
    }

    /// Returns the steering held from the last controller update.
    pub fn steering(&self) -> &SteeringState {
        &self.steering
    }

    /// Returns the controller.
    pub fn controller(&self) -> &PidController {
        &self.controller
    }

    /// Returns the reference being tracked.
    pub fn reference(&self) -> &Reference {
        &self.reference
    }

    /// Returns the vehicle.
    pub fn vehicle(&self) -> &KinematicVehicle {
        &self.vehicle
    }

    /// Returns the steering mode.
    pub fn steering_mode(&self) -> SteeringMode {
        self.mode
    }

    /// Simulated time accumulated over all ticks.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Number of completed ticks.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
