use steer_kinematics::*;

fn main() {
    let wheelbase = 2.5;
    let track_width = 1.5;
    let geometry_result = VehicleGeometry::new(wheelbase, track_width);

    let mut current_pose = Pose::new(0.0, 0.0, 0.0);
    let velocity = 3.0;
    let steering = SteeringState::Axle(RearCoupling::velocity_phased().couple(0.2, velocity));
    let dt = 0.1;
    let num_steps = 20;

    match geometry_result {
        Ok(geometry) => {
            let vehicle = KinematicVehicle::new(geometry);
            println!("Initializing simulation...");
            println!("  Vehicle:        {}", vehicle);
            println!("  Steering:       {}", steering);
            println!("  Turning radius: {:.2}", vehicle.axle_turning_radius(0.2));
            println!("  Time Step:      {} s", dt);
            println!("  Num Steps:      {}", num_steps);
            println!("\nSimulating...");

            for i in 0..num_steps {
                match vehicle.integrate(current_pose, steering, velocity, dt) {
                    Ok(new_pose) => {
                        current_pose = new_pose;
                        println!("Step {:>2}: Pose: {}", i + 1, current_pose);
                    }
                    Err(e) => {
                        eprintln!("Error during simulation step {}: {:?}", i + 1, e);
                        break;
                    }
                }
            }

            println!("\nSimulation complete.");
            println!("Final Pose: {:?}", current_pose);
        }
        Err(e) => {
            eprintln!("Failed to initialize vehicle geometry: {:?}", e);
            eprintln!(
                "Please ensure wheelbase ({}) is positive and track width ({}) is non-negative.",
                wheelbase, track_width
            );
        }
    }
}
