//! Open-loop turning-radius experiment.
//!
//! Drives the vehicle at a fixed steering angle and compares the radius of the
//! resulting trace with the analytic bicycle-model radius.

use steer_kinematics::{AxleSteering, KinematicVehicle, Pose, SteeringState};
use tracing::info;

use crate::error::ControlError;
use crate::path::PathPoint;

/// One steering angle of a sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurningSample {
    /// Front axle angle held for the run (rad).
    pub steering_angle: f64,
    /// `wheelbase / tan(angle)`, signed, infinite when straight.
    pub analytic_radius: f64,
    /// Radius of the circle through the first, middle and last positions,
    /// signed by turn direction, infinite when they are collinear.
    pub measured_radius: f64,
}

/// Steering angles from -30° to 30° in 5° steps, in radians.
pub fn default_sweep_angles() -> Vec<f64> {
    (-6..=6).map(|i| (5.0 * i as f64).to_radians()).collect()
}

/// Signed radius of the circle through `a`, `b` and `c`.
///
/// Positive when the points turn counter-clockwise. Collinear (or repeated)
/// points give `f64::INFINITY`.
pub fn circumradius(a: PathPoint, b: PathPoint, c: PathPoint) -> f64 {
    let cross = (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x);
    if cross.abs() < 1e-12 {
        return f64::INFINITY;
    }
    let ab = a.distance_to(&b);
    let bc = b.distance_to(&c);
    let ca = c.distance_to(&a);
    ab * bc * ca / (2.0 * cross)
}

/// Run one open-loop trace per angle, starting from the origin facing +x.
///
/// # Errors
///
/// Returns `Err(ControlError::InvalidPointCount)` if `steps < 2`, and
/// `Err(ControlError::Kinematics)` if `dt` is negative.
pub fn turning_radius_sweep<I>(
    vehicle: &KinematicVehicle,
    angles: I,
    velocity: f64,
    dt: f64,
    steps: usize,
) -> Result<Vec<TurningSample>, ControlError>
where
    I: IntoIterator<Item = f64>,
{
    if steps < 2 {
        return Err(ControlError::InvalidPointCount("need at least 2 steps"));
    }

    let mut samples = Vec::new();
    for angle in angles {
        let steering = SteeringState::Axle(AxleSteering::new(angle, 0.0));
        let mut pose = Pose::default();
        let mut trace = Vec::with_capacity(steps + 1);
        trace.push(PathPoint::new(pose.x, pose.y));
        for _ in 0..steps {
            pose = vehicle.integrate(pose, steering, velocity, dt)?;
            trace.push(PathPoint::new(pose.x, pose.y));
        }

        let sample = TurningSample {
            steering_angle: angle,
            analytic_radius: vehicle.axle_turning_radius(angle),
            measured_radius: circumradius(trace[0], trace[trace.len() / 2], trace[trace.len() - 1]),
        };
        info!(
            angle_deg = angle.to_degrees(),
            analytic = sample.analytic_radius,
            measured = sample.measured_radius,
            "Turning radius sample"
        );
        samples.push(sample);
    }
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use steer_kinematics::VehicleGeometry;

    fn vehicle() -> KinematicVehicle {
        KinematicVehicle::new(VehicleGeometry::new(2.5, 1.5).unwrap())
    }

    #[test]
    fn test_default_sweep_angles() {
        let angles = default_sweep_angles();
        assert_eq!(angles.len(), 13);
        assert!((angles[0] + 30f64.to_radians()).abs() < 1e-12);
        assert_eq!(angles[6], 0.0);
    }

    #[test]
    fn test_circumradius() {
        let r = circumradius(
            PathPoint::new(1.0, 0.0),
            PathPoint::new(0.0, 1.0),
            PathPoint::new(-1.0, 0.0),
        );
        assert!((r - 1.0).abs() < 1e-12);
        let cw = circumradius(
            PathPoint::new(-1.0, 0.0),
            PathPoint::new(0.0, 1.0),
            PathPoint::new(1.0, 0.0),
        );
        assert!((cw + 1.0).abs() < 1e-12);
        let collinear = circumradius(
            PathPoint::new(0.0, 0.0),
            PathPoint::new(1.0, 1.0),
            PathPoint::new(2.0, 2.0),
        );
        assert!(collinear.is_infinite());
    }

    #[test]
    fn test_measured_radius_matches_analytic() {
        let samples =
            turning_radius_sweep(&vehicle(), default_sweep_angles(), 2.0, 0.05, 60).unwrap();
        assert_eq!(samples.len(), 13);
        for s in &samples {
            if s.steering_angle == 0.0 {
                assert!(s.analytic_radius.is_infinite());
                assert!(s.measured_radius.is_infinite());
            } else {
                let rel = (s.measured_radius - s.analytic_radius).abs() / s.analytic_radius.abs();
                assert!(rel < 0.01, "angle {} rel error {}", s.steering_angle, rel);
            }
        }
    }

    #[test]
    fn test_sweep_requires_two_steps() {
        assert!(matches!(
            turning_radius_sweep(&vehicle(), [0.1], 1.0, 0.1, 1),
            Err(ControlError::InvalidPointCount(_))
        ));
    }
}
