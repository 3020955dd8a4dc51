use approx::assert_relative_eq;
use triaxial_dem::*;

fn simulation(extra: &str) -> Simulation {
    let text = format!(
        "TimeStep=1e-6,Radius=20,Pressure=80000,Speed=1,sfSpeed=1,sfLength=0.001,sfStiffness=1,sfDamping=0{extra}"
    );
    let parameters = Parameters::parse(&text).expect("parameters");
    let config = SimulationConfig::from_parameters(&parameters).expect("config");
    Simulation::new(config).expect("simulation")
}

#[test]
fn pour_without_generation_stays_empty() {
    let mut sim = simulation(",Generate=0,Pattern=none");
    for _ in 0..500 {
        assert_eq!(sim.step(), ProcessState::Pour);
    }
    assert!(sim.grains.is_empty());
    assert!(sim.wire.is_empty());
    assert!(sim.failure().is_none());
}

#[test]
fn grain_below_bottom_plate_rebounds() {
    let mut sim = simulation(",Generate=0,G=0,Membrane=0");
    let r = sim.config().grain.radius;
    let start = r - 1e-5;
    sim.add_grain(Vec3::new(0.0, 0.0, start), Vec3::new(0.0, 0.0, -0.1), Quat::IDENTITY)
        .expect("grain");
    for _ in 0..5000 {
        assert_eq!(sim.step(), ProcessState::Pour);
    }
    let grain = sim.grains.get(0).expect("grain");
    assert!(grain.position().z > start, "grain sank to {}", grain.position().z);
    assert!(grain.velocity().z > -1e-3, "still moving down at {}", grain.velocity().z);
}

#[test]
fn spinning_grains_keep_unit_quaternions() {
    let mut sim = simulation(",Generate=0,G=0");
    let r = sim.config().grain.radius;
    for i in 0..4 {
        let position = Vec3::new(i as f32 * 3.0 * r - 4.5 * r, 0.0, 0.02);
        let index = sim
            .add_grain(position, Vec3::ZERO, Quat::from_rotation_x(i as f32))
            .expect("grain");
        sim.grains.angular_velocities[index] = Vec3::new(100.0, -250.0 * i as f32, 40.0);
    }
    for _ in 0..2000 {
        sim.step();
    }
    for rotation in &sim.grains.rotations {
        assert_relative_eq!(rotation.length(), 1.0, epsilon = 1e-5);
    }
}

#[test]
fn load_strain_follows_plate_speed() {
    let mut sim = simulation(",Generate=0,G=0,Membrane=0,Speed=1000");
    sim.start_loading().expect("load");
    assert_eq!(sim.state(), ProcessState::Load);

    let h0 = sim.plates.height();
    let fraction = 0.02;
    let speed = sim.config().plate_speed;
    let dt = sim.config().dt;
    let steps = (h0 * fraction / (2.0 * speed * dt)).round() as u64;
    for _ in 0..steps {
        assert_eq!(sim.step(), ProcessState::Load);
    }
    assert_relative_eq!(sim.strain(), fraction, epsilon = 5e-4);
    assert!(!sim.samples().is_empty());
    let last = sim.samples().last().expect("sample");
    assert!(last.strain > 0.0 && last.strain <= fraction + 5e-4);
}

#[test]
fn load_ends_at_strain_limit() {
    let mut sim = simulation(",Generate=0,G=0,Membrane=0,Speed=1000,StrainLimit=0.02");
    sim.start_loading().expect("load");
    let state = sim.run(Some(1_000_000)).expect("run");
    assert_eq!(state, ProcessState::Done);
    assert!(sim.strain() >= 0.02);
}

#[test]
fn engine_builds_from_run_id() {
    let engine = TriaxialEngine::from_id(
        "TimeStep=1e-6,Radius=20,Pressure=80000,Speed=1,sfSpeed=1,sfLength=0.001,sfStiffness=1,sfDamping=0,Pattern=helix",
    )
    .expect("engine");
    let config = engine.simulation().config();
    assert_eq!(config.pattern, Pattern::Helix);
    assert!(config.wire_capacity > 0);
    assert_eq!(engine.simulation().state(), ProcessState::Pour);
}

#[test]
fn small_pour_packs_and_loads() {
    let mut sim = simulation(
        ",Radius=12,Pattern=helix,linearSpeed=10,verticalSpeed=20,Pressure=1000,PressureRate=1e12,\
         SettleEnergy=1000,Speed=1000,StrainLimit=0.01",
    );
    let mut visited = vec![sim.state()];
    for _ in 0..20_000 {
        let state = sim.step();
        if visited.last() != Some(&state) {
            visited.push(state);
        }
        if state.is_finished() {
            break;
        }
    }

    assert!(sim.failure().is_none(), "{:?}", sim.failure());
    assert_eq!(
        visited,
        vec![ProcessState::Pour, ProcessState::Pack, ProcessState::Load, ProcessState::Done]
    );
    assert!(!sim.grains.is_empty());
    assert!(!sim.wire.is_empty());
    assert!(sim.plates.mass > 0.0);
    assert!(sim.strain() >= 0.01);
    assert!(!sim.samples().is_empty());
}

/// Three grains, two wire nodes and the membrane, placed so that one contact
/// of each kind overlaps.
fn placed_scene() -> Simulation {
    let mut sim = simulation(",Generate=0,Pattern=helix");
    let r = sim.config().grain.radius;
    let rw = sim.config().wire.radius;
    let internode = sim.config().wire.internode_length;

    let membrane = sim.membrane.as_ref().expect("membrane");
    let node = membrane.nodes.positions[membrane.index(4, 0)];
    let inward = -Vec3::new(node.x, node.y, 0.0).normalize();
    sim.add_grain(node + 0.9 * r * inward, Vec3::ZERO, Quat::IDENTITY)
        .expect("grain");

    let centre = Vec3::new(0.0, 0.0, 0.01);
    sim.add_grain(centre, Vec3::ZERO, Quat::IDENTITY).expect("grain");
    sim.add_grain(centre + Vec3::new(1.9 * r, 0.0, 0.0), Vec3::ZERO, Quat::IDENTITY)
        .expect("grain");

    let wire_node = centre + Vec3::new(0.0, 0.0, r + 0.5 * rw);
    sim.add_wire_node(wire_node).expect("wire");
    sim.add_wire_node(wire_node - Vec3::new(internode, 0.0, 0.0))
        .expect("wire");
    sim
}

#[test]
fn membrane_and_wire_contacts_inside_simulation() {
    let mut sim = placed_scene();
    sim.compute_forces().expect("forces");

    let contacts = sim.contacts();
    assert_eq!(contacts.set(Interaction::GrainGrain).records.len(), 1);
    assert_eq!(contacts.set(Interaction::GrainWire).records.len(), 1);
    assert!(!contacts.set(Interaction::GrainMembrane).records.is_empty());
    assert!(contacts.set(Interaction::GrainSide).records.is_empty());

    // The membrane pushes its grain inward, the wire pushes its grain down.
    assert!(sim.grains.mass.forces[0].truncate().dot(sim.grains.positions()[0].truncate()) < 0.0);
    let wire_record = contacts.set(Interaction::GrainWire).records[0];
    assert_eq!(wire_record.a, 1);
    assert!(wire_record.force.z < 0.0);
}

#[test]
fn snapshot_files_hold_points_and_contact_records() {
    let mut sim = placed_scene();
    sim.compute_forces().expect("forces");
    let snapshot = sim.snapshot();
    let membrane_contacts = sim.contacts().grain_membrane.records.len();

    let dir = std::env::temp_dir().join(format!("triaxial_dem_snapshot_{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("temp dir");
    let base = dir.join("placed");
    sim.write_snapshot(&base).expect("snapshot");

    let lines = |suffix: &str| -> Vec<String> {
        let path = dir.join(format!("placed.{suffix}"));
        std::fs::read_to_string(&path)
            .unwrap_or_else(|err| panic!("{}: {err}", path.display()))
            .lines()
            .map(str::to_owned)
            .collect()
    };

    let grains = lines("grain");
    assert_eq!(grains.len(), 2 + 3);
    assert_eq!(grains[1], "x y z contacts energy");
    assert_eq!(lines("wire").len(), 2 + 2);
    assert_eq!(lines("side").len(), snapshot.side.len());
    assert!(!snapshot.side.is_empty());
    assert_eq!(lines("grain-grain").len(), 1);
    assert_eq!(lines("grain-side").len(), membrane_contacts);
    assert_eq!(lines("grain-wire").len(), 1);
    assert_eq!(lines("wire-wire").len(), 1);
    for record in lines("grain-wire").iter().chain(&lines("grain-grain")) {
        assert_eq!(record.split_whitespace().count(), 9);
    }

    // The centre grain touches one grain and the wire.
    let centre: Vec<&str> = grains[3].split_whitespace().collect();
    assert_eq!(centre[3], "2");

    std::fs::remove_dir_all(&dir).expect("cleanup");
}
