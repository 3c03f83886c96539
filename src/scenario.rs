use std::fmt;

use anyhow::{Context, bail};
use rand::SeedableRng;
use rand::rngs::StdRng;
use steer_control::experiment::{TurningSample, default_sweep_angles, turning_radius_sweep};
use steer_control::{
    CircleReference, Path, PathClosure, PathPoint, PidController, PurePursuit, Reference,
    SimulationStep, TrackingOutcome, VehicleState, generate_circle_path, generate_random_path,
    generate_square_path,
};
use steer_kinematics::{KinematicVehicle, Pose, SteeringLimit, VehicleGeometry};
use tracing::{debug, info};

use crate::config::{PathKind, PathSettings, SimulationContext, TrackingStrategy};

/// Aggregate result of a path-following run.
#[derive(Debug, Clone, PartialEq)]
pub struct FollowSummary {
    pub ticks: u64,
    pub elapsed: f64,
    pub final_pose: Pose,
    pub mean_abs_error: f64,
    pub max_abs_error: f64,
    pub no_target_ticks: u64,
}

impl fmt::Display for FollowSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ticks over {:.2} s, final pose {}, mean |error| {:.3}, max |error| {:.3}, \
             {} ticks without target",
            self.ticks,
            self.elapsed,
            self.final_pose,
            self.mean_abs_error,
            self.max_abs_error,
            self.no_target_ticks
        )
    }
}

fn center(settings: &PathSettings) -> PathPoint {
    PathPoint::new(settings.center_x, settings.center_y)
}

/// Generate the reference path described by `settings`.
pub fn build_path(settings: &PathSettings) -> anyhow::Result<Path> {
    let path = match settings.kind {
        PathKind::Circle => generate_circle_path(
            center(settings),
            settings.radius,
            settings.point_count,
            PathClosure::Closed,
        )?,
        PathKind::Square => generate_square_path(center(settings), settings.side_length)?,
        PathKind::Random => {
            let mut rng = match settings.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            };
            generate_random_path(
                center(settings),
                settings.segment_count,
                settings.segment_length,
                &mut rng,
            )?
        }
    };
    info!(
        kind = ?settings.kind,
        points = path.len(),
        length = path.length(),
        "Reference path generated"
    );
    Ok(path)
}

/// Starting pose: explicit settings win, otherwise the bottom of the circle
/// facing +x, or the first path point facing the second.
fn initial_pose(context: &SimulationContext, path: &Path) -> Pose {
    let vehicle = &context.vehicle;
    let (default_x, default_y, default_heading) = match context.path.kind {
        PathKind::Circle => (
            context.path.center_x,
            context.path.center_y - context.path.radius,
            0.0,
        ),
        PathKind::Square | PathKind::Random => match path.points() {
            [first, second, ..] => (
                first.x,
                first.y,
                (second.y - first.y).atan2(second.x - first.x),
            ),
            [first] => (first.x, first.y, 0.0),
            [] => (context.path.center_x, context.path.center_y, 0.0),
        },
    };
    Pose::new(
        vehicle.start_x.unwrap_or(default_x),
        vehicle.start_y.unwrap_or(default_y),
        vehicle
            .start_heading_deg
            .map_or(default_heading, f64::to_radians),
    )
}

fn build_vehicle(context: &SimulationContext) -> anyhow::Result<(KinematicVehicle, SteeringLimit)> {
    if !context.vehicle.velocity.is_finite() {
        bail!("vehicle velocity must be finite, got {}", context.vehicle.velocity);
    }
    let geometry = VehicleGeometry::new(context.vehicle.wheelbase, context.vehicle.track_width)
        .context("invalid vehicle geometry")?;
    let limit = SteeringLimit::new(context.vehicle.max_steering_angle_deg.to_radians())
        .context("invalid steering limit")?;
    Ok((KinematicVehicle::new(geometry), limit))
}

/// Assemble the closed-loop simulation described by `context`.
pub fn build_simulation(context: &SimulationContext) -> anyhow::Result<SimulationStep> {
    let (vehicle, limit) = build_vehicle(context)?;

    let path = build_path(&context.path)?;
    let pose = initial_pose(context, &path);
    let reference = match context.tracking.strategy_for(context.path.kind) {
        TrackingStrategy::CrossTrack => {
            if context.path.kind != PathKind::Circle {
                bail!("cross-track tracking requires a circle path, got {:?}", context.path.kind);
            }
            Reference::Circle(
                CircleReference::new(center(&context.path), context.path.radius)
                    .context("invalid circle reference")?,
            )
        }
        TrackingStrategy::PurePursuit => Reference::Path {
            path,
            pursuit: PurePursuit::new(context.tracking.lookahead)
                .context("invalid pure-pursuit lookahead")?,
        },
    };

    let mut controller = PidController::new(context.controller.gains());
    if let Some(integral_limit) = context.controller.integral_limit {
        controller = controller.with_integral_limit(integral_limit);
    }

    Ok(SimulationStep::new(
        vehicle,
        limit,
        controller,
        reference,
        VehicleState::new(pose, context.vehicle.velocity),
    )
    .with_steering_mode(context.vehicle.steering_mode.into())
    .with_rear_coupling(context.vehicle.rear_coupling.into())
    .with_no_target_policy(context.tracking.no_target_policy.into()))
}

/// Run `context.run.steps` ticks and summarise the tracking error.
pub fn run_follow(context: &SimulationContext) -> anyhow::Result<FollowSummary> {
    let mut sim = build_simulation(context)?;
    let dt = context.run.dt;
    let log_every = context.run.log_every.max(1);

    let mut error_sum = 0.0;
    let mut max_abs_error: f64 = 0.0;
    let mut measured = 0u64;
    let mut no_target_ticks = 0u64;

    for i in 0..context.run.steps {
        let report = sim.tick(dt).with_context(|| format!("tick {} failed", i + 1))?;
        match report.tracking.error() {
            Some(e) => {
                error_sum += e.abs();
                max_abs_error = max_abs_error.max(e.abs());
                measured += 1;
            }
            None => no_target_ticks += 1,
        }
        if (i + 1) % log_every == 0 {
            info!(
                tick = i + 1,
                t = sim.elapsed(),
                pose = %report.pose,
                steering = %report.steering,
                error = ?report.tracking.error(),
                "Follow progress"
            );
        }
        if let TrackingOutcome::Lookahead { index, .. } = report.tracking {
            debug!(index, "Pursuing path point");
        }
    }

    Ok(FollowSummary {
        ticks: sim.ticks(),
        elapsed: sim.elapsed(),
        final_pose: sim.state().pose,
        mean_abs_error: if measured > 0 {
            error_sum / measured as f64
        } else {
            0.0
        },
        max_abs_error,
        no_target_ticks,
    })
}

/// Sweep steering angles open loop and compare measured and analytic radii.
pub fn run_turning_radius(context: &SimulationContext) -> anyhow::Result<Vec<TurningSample>> {
    let (vehicle, limit) = build_vehicle(context)?;
    let angles = default_sweep_angles()
        .into_iter()
        .filter(|a| a.abs() <= limit.max_angle() + 1e-12);
    let samples = turning_radius_sweep(
        &vehicle,
        angles,
        context.vehicle.velocity,
        context.run.dt,
        context.run.steps,
    )?;
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RearCouplingSetting, SteeringModeSetting, TrackingSettings};
    use steer_control::SteeringMode;

    #[test]
    fn test_default_context_builds_circle_follow() {
        let context = SimulationContext::default();
        let sim = build_simulation(&context).unwrap();
        assert!(matches!(sim.reference(), Reference::Circle(_)));
        let pose = sim.state().pose;
        assert_eq!((pose.x, pose.y, pose.yaw), (400.0, 200.0, 0.0));
        assert_eq!(sim.steering_mode(), SteeringMode::Bicycle);
    }

    #[test]
    fn test_non_finite_velocity_rejected() {
        let mut context = SimulationContext::default();
        context.vehicle.velocity = f64::NAN;
        assert!(build_simulation(&context).is_err());
        context.vehicle.velocity = f64::INFINITY;
        assert!(run_turning_radius(&context).is_err());
    }

    #[test]
    fn test_default_follow_stays_near_circle() {
        let mut context = SimulationContext::default();
        context.run.steps = 600;
        let summary = run_follow(&context).unwrap();
        assert_eq!(summary.ticks, 600);
        assert!((summary.elapsed - 10.0).abs() < 1e-6);
        assert_eq!(summary.no_target_ticks, 0);
        assert!(summary.max_abs_error < 25.0, "{summary}");
    }

    #[test]
    fn test_square_uses_pure_pursuit() {
        let mut context = SimulationContext::default();
        context.path.kind = PathKind::Square;
        context.vehicle.steering_mode = SteeringModeSetting::FourWheel;
        context.vehicle.rear_coupling = RearCouplingSetting::Fixed { ratio: 0.3 };
        let sim = build_simulation(&context).unwrap();
        match sim.reference() {
            Reference::Path { path, pursuit } => {
                assert_eq!(path.len(), 5);
                assert_eq!(pursuit.lookahead(), 30.0);
            }
            Reference::Circle(_) => panic!("expected a path reference"),
        }
        assert_eq!(sim.steering_mode(), SteeringMode::FourWheel);
        // Starts on the first corner facing along the first edge.
        let pose = sim.state().pose;
        assert_eq!((pose.x, pose.y, pose.yaw), (300.0, 200.0, 0.0));
    }

    #[test]
    fn test_seeded_random_path_is_reproducible() {
        let settings = PathSettings {
            kind: PathKind::Random,
            seed: Some(11),
            ..PathSettings::default()
        };
        let a = build_path(&settings).unwrap();
        let b = build_path(&settings).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), settings.segment_count + 1);
    }

    #[test]
    fn test_random_follow_runs_to_completion() {
        let mut context = SimulationContext::default();
        context.path.kind = PathKind::Random;
        context.path.seed = Some(3);
        context.controller.kp = 1.0;
        context.run.steps = 300;
        let summary = run_follow(&context).unwrap();
        assert_eq!(summary.ticks, 300);
        assert!(summary.final_pose.x.is_finite() && summary.final_pose.y.is_finite());
    }

    #[test]
    fn test_cross_track_requires_circle() {
        let mut context = SimulationContext::default();
        context.path.kind = PathKind::Square;
        context.tracking = TrackingSettings {
            strategy: Some(TrackingStrategy::CrossTrack),
            ..TrackingSettings::default()
        };
        assert!(build_simulation(&context).is_err());
    }

    #[test]
    fn test_invalid_geometry_fails_fast() {
        let mut context = SimulationContext::default();
        context.vehicle.wheelbase = 0.0;
        assert!(build_simulation(&context).is_err());
        context.vehicle.wheelbase = 50.0;
        context.tracking.strategy = Some(TrackingStrategy::PurePursuit);
        context.tracking.lookahead = -1.0;
        assert!(build_simulation(&context).is_err());
    }

    #[test]
    fn test_turning_radius_respects_limit() {
        let mut context = SimulationContext::default();
        context.vehicle.max_steering_angle_deg = 20.0;
        context.run.steps = 60;
        let samples = run_turning_radius(&context).unwrap();
        assert_eq!(samples.len(), 9); // -20..=20 in 5 degree steps
        assert!(samples.iter().all(|s| s.steering_angle.abs() <= 20f64.to_radians() + 1e-12));
    }
}
