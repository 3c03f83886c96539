use steer_control::*;
use steer_kinematics::{KinematicVehicle, Pose, RearCoupling, SteeringLimit, VehicleGeometry};

fn main() -> Result<(), ControlError> {
    let center = PathPoint::new(400.0, 300.0);
    let radius = 100.0;
    let dt = 1.0 / 60.0;
    let num_steps = 600;

    let vehicle = KinematicVehicle::new(VehicleGeometry::new(50.0, 20.0)?);
    let limit = SteeringLimit::new(30f64.to_radians())?;
    let controller = PidController::new(PidGains::new(0.1, 0.0, 0.01));
    let reference = Reference::Circle(CircleReference::new(center, radius)?);
    let initial = VehicleState::new(Pose::new(center.x, center.y - radius, 0.0), 30.0);

    let mut sim = SimulationStep::new(vehicle, limit, controller, reference, initial)
        .with_rear_coupling(RearCoupling::velocity_phased());

    println!("Following circle of radius {} around {}", radius, center);
    for i in 0..num_steps {
        let report = sim.tick(dt)?;
        if i % 60 == 0 {
            println!(
                "t = {:>5.2} s  pose: {}  cte: {:>6.2}  steering: {}",
                sim.elapsed(),
                report.pose,
                report.tracking.error().unwrap_or(0.0),
                report.steering
            );
        }
    }
    println!("Final state: {:?}", sim.state());
    Ok(())
}
