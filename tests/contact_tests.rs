use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use triaxial_dem::*;

fn config(extra: &str) -> SimulationConfig {
    let text = format!(
        "TimeStep=1e-6,Radius=20,Pressure=80000,Speed=1,sfSpeed=1,sfLength=0.0001,sfStiffness=1000,sfDamping=0,G=0,Generate=0{extra}"
    );
    SimulationConfig::from_parameters(&Parameters::parse(&text).expect("parameters")).expect("config")
}

fn grain_law(config: &SimulationConfig, coefficient: f32) -> ContactLaw {
    ContactLaw::between(
        &config.grain.material,
        &config.grain.material,
        config.normal_damping_rate,
        coefficient,
        config.static_friction,
    )
}

#[test]
fn normal_force_grows_with_depth() {
    let config = config("");
    let law = grain_law(&config, 0.0);
    let mut previous = 0.0;
    for step in 1..200 {
        let depth = step as f32 * 1e-7;
        let force = law.normal_force(depth, 0.0);
        assert!(force > previous, "depth {depth}: {force} <= {previous}");
        previous = force;
    }
}

#[test]
fn overlapping_grains_push_apart_along_x() {
    let config = config("");
    let r = config.grain.radius;
    let mut sim = Simulation::new(config).expect("simulation");
    let z = 0.02;
    sim.add_grain(Vec3::new(-r + 1e-5, 0.0, z), Vec3::ZERO, Quat::IDENTITY)
        .expect("grain");
    sim.add_grain(Vec3::new(r - 1e-5, 0.0, z), Vec3::ZERO, Quat::IDENTITY)
        .expect("grain");
    sim.compute_forces().expect("forces");

    let forces = &sim.grains.mass.forces;
    assert!(forces[0].x < 0.0, "left grain pushed {:?}", forces[0]);
    assert!(forces[1].x > 0.0, "right grain pushed {:?}", forces[1]);
    for f in forces {
        assert_eq!(f.y, 0.0);
        assert_eq!(f.z, 0.0);
    }
    assert!(sim.grains.torques.iter().all(|t| *t == Vec3::ZERO));
}

#[test]
fn pair_forces_obey_third_law() {
    let config = config(",Membrane=0");
    let r = config.grain.radius;
    let mut sim = Simulation::new(config).expect("simulation");
    let z = 0.02;
    sim.add_grain(Vec3::new(0.0, 0.0, z), Vec3::new(0.01, -0.02, 0.0), Quat::IDENTITY)
        .expect("grain");
    sim.add_grain(
        Vec3::new(1.9 * r, 0.3 * r, z + 0.1 * r),
        Vec3::new(-0.03, 0.0, 0.01),
        Quat::from_rotation_z(0.7),
    )
    .expect("grain");
    sim.grains.angular_velocities[0] = Vec3::new(3.0, -1.0, 2.0);
    sim.compute_forces().expect("forces");

    let forces = &sim.grains.mass.forces;
    let net = forces[0] + forces[1];
    assert!(forces[0].length() > 0.0);
    assert_relative_eq!(net.length(), 0.0, epsilon = forces[0].length() * 1e-6);
}

fn random_input(rng: &mut StdRng, r: f32) -> ContactInput {
    let direction = Vec3::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0));
    let normal = direction.normalize_or(Vec3::X);
    let depth = rng.gen_range(-1e-6..2e-5);
    let velocity = |rng: &mut StdRng| Vec3::new(rng.gen_range(-0.1..0.1), rng.gen_range(-0.1..0.1), rng.gen_range(-0.1..0.1));
    let rotation = Quat::from_euler(
        glam::EulerRot::XYZ,
        rng.gen_range(0.0..6.0),
        rng.gen_range(0.0..6.0),
        rng.gen_range(0.0..6.0),
    );
    let a_position = Vec3::new(0.0, 0.0, 0.01);
    let b_position = a_position - normal * (2.0 * r - depth);
    let friction = if rng.gen_bool(0.5) {
        FrictionState::UNSET
    } else {
        FrictionState {
            local_a: -r * normal + velocity(rng) * 1e-3,
            local_b: r * normal,
        }
    };
    ContactInput {
        a: ContactSide::grain(a_position, velocity(rng), velocity(rng) * 10.0, rotation, -r * normal),
        b: ContactSide::node(b_position, velocity(rng), r * normal),
        normal,
        depth,
        friction,
        spin_radius: 0.0,
    }
}

#[test]
fn batched_and_scalar_paths_are_bit_identical() {
    let config = config("");
    let law = grain_law(&config, 0.3);
    let mut rng = StdRng::seed_from_u64(7);
    let inputs: Vec<ContactInput> = (0..103).map(|_| random_input(&mut rng, config.grain.radius)).collect();
    let mut batched = vec![ContactOutput::default(); inputs.len()];
    evaluate_slice(&law, &inputs, &mut batched);
    for (input, out) in inputs.iter().zip(&batched) {
        let scalar = evaluate(&law, input);
        assert_eq!(scalar.force.to_array().map(f32::to_bits), out.force.to_array().map(f32::to_bits));
        assert_eq!(scalar.torque_a.to_array().map(f32::to_bits), out.torque_a.to_array().map(f32::to_bits));
        assert_eq!(scalar.normal_force.to_bits(), out.normal_force.to_bits());
        assert_eq!(scalar.friction, out.friction);
    }
}

#[test]
fn tangential_force_stays_within_coulomb_bound() {
    let config = config("");
    let coefficient = 0.1;
    let law = grain_law(&config, coefficient);
    // stiffness times static length equals the coefficient
    assert_relative_eq!(law.friction.stick.stiffness * law.friction.stick.length, coefficient, epsilon = 1e-6);

    let r = config.grain.radius;
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..500 {
        let mut input = random_input(&mut rng, r);
        input.depth = rng.gen_range(1e-7..1e-5);
        input.a.velocity = input.b.velocity;
        input.a.angular_velocity = Vec3::ZERO;
        let out = evaluate(&law, &input);
        let tangential = out.force - out.normal_force * input.normal;
        let bound = coefficient * out.normal_force.abs();
        assert!(
            tangential.length() <= bound * (1.0 + 1e-3) + 1e-9,
            "{} > {bound}",
            tangential.length()
        );
    }
}
