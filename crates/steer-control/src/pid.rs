//! PID feedback controller.
//!
//! The integral is an Euler sum of `error * dt` and is unbounded unless an
//! integral limit is set. The derivative is a backward difference over `dt`
//! and is zero whenever `dt` is not positive.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Proportional, integral and derivative gains.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PidGains {
    /// Proportional gain.
    pub kp: f64,
    /// Integral gain.
    pub ki: f64,
    /// Derivative gain.
    pub kd: f64,
}

impl PidGains {
    /// Construct a set of gains.
    pub const fn new(kp: f64, ki: f64, kd: f64) -> Self {
        PidGains { kp, ki, kd }
    }
}

/// Stateful PID controller mapping a scalar error to a scalar control signal.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct PidController {
    gains: PidGains,
    integral: f64,
    previous_error: f64,
    previous_dt: f64,
    integral_limit: Option<f64>,
}

impl PidController {
    /// Construct a controller with zeroed state and no integral limit.
    pub fn new(gains: PidGains) -> Self {
        PidController {
            gains,
            integral: 0.0,
            previous_error: 0.0,
            previous_dt: 0.0,
            integral_limit: None,
        }
    }

    /// Clamp the integral accumulator to `[-limit, limit]` (anti-windup).
    ///
    /// The magnitude of `limit` is used.
    pub fn with_integral_limit(mut self, limit: f64) -> Self {
        self.integral_limit = Some(limit.abs());
        self
    }

    /// Feed one error sample and return the control signal.
    ///
    /// # Arguments
    ///
    /// * `error`: The current error signal.
    /// * `dt`: Time elapsed since the previous call. May be zero.
    ///
    /// # Returns
    ///
    /// `kp * error + ki * integral + kd * derivative`.
    pub fn update(&mut self, error: f64, dt: f64) -> f64 {
        self.integral += error * dt;
        if let Some(limit) = self.integral_limit {
            self.integral = self.integral.clamp(-limit, limit);
        }
        let derivative = if dt > 0.0 {
            (error - self.previous_error) / dt
        } else {
            0.0
        };
        self.previous_error = error;
        self.previous_dt = dt;

        self.gains.kp * error + self.gains.ki * self.integral + self.gains.kd * derivative
    }

    /// Zero the integral and previous error. Gains and limit are kept.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.previous_error = 0.0;
        self.previous_dt = 0.0;
    }

    /// Returns the gains.
    pub fn gains(&self) -> &PidGains {
        &self.gains
    }

    /// Returns the accumulated integral.
    pub fn integral(&self) -> f64 {
        self.integral
    }

    /// Returns the error passed to the last `update`.
    pub fn previous_error(&self) -> f64 {
        self.previous_error
    }

    /// Returns the time step passed to the last `update`.
    pub fn previous_dt(&self) -> f64 {
        self.previous_dt
    }

    /// Returns the anti-windup limit, if any.
    pub fn integral_limit(&self) -> Option<f64> {
        self.integral_limit
    }
}
