use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use triaxial_dem::*;

const RUN_ID: &str =
    "TimeStep=1e-6,Radius=20,Pressure=80000,Speed=1,sfSpeed=1,sfLength=0.001,sfStiffness=1,sfDamping=0,G=0,Generate=0";

#[test]
fn test_simulation_is_sync_and_send() {
    fn assert_sync_send<T: Sync + Send>() {}
    assert_sync_send::<Simulation>();
    assert_sync_send::<TriaxialEngine>();
    assert_sync_send::<ResultSink>();
}

#[test]
fn test_shared_engine_across_threads() {
    let engine = Arc::new(Mutex::new(TriaxialEngine::from_id(RUN_ID).expect("engine")));

    let mut handles = vec![];
    for _ in 0..4 {
        let engine_clone = Arc::clone(&engine);
        handles.push(thread::spawn(move || {
            let mut engine = engine_clone.lock();
            engine.step();
        }));
    }
    for handle in handles {
        handle.join().expect("thread");
    }
    assert_eq!(engine.lock().simulation().step_count(), 4);
}

fn packed_grains(engine: &mut TriaxialEngine) {
    let sim = engine.simulation_mut();
    let r = sim.config().grain.radius;
    let mut index = 0;
    for z in 0..4 {
        for y in -2..=2 {
            for x in -2..=2 {
                let p = Vec3::new(x as f32 * 1.99 * r, y as f32 * 1.99 * r, 0.01 + z as f32 * 1.99 * r);
                let jitter = Vec3::new(0.0, 0.0, 1e-5 * (index % 3) as f32);
                sim.add_grain(p + jitter, Vec3::ZERO, Quat::IDENTITY).expect("grain");
                index += 1;
            }
        }
    }
}

#[test]
fn test_serial_and_parallel_steps_agree() {
    let mut serial = TriaxialEngine::from_id(RUN_ID).expect("engine");
    let mut parallel = TriaxialEngine::from_id(RUN_ID).expect("engine");
    serial.set_parallel_enabled(false);
    parallel.set_parallel_enabled(true);
    packed_grains(&mut serial);
    packed_grains(&mut parallel);

    for _ in 0..50 {
        serial.step();
        parallel.step();
    }
    let a = &serial.simulation().grains.mass.positions;
    let b = &parallel.simulation().grains.mass.positions;
    assert_eq!(a.len(), b.len());
    for (p, q) in a.iter().zip(b) {
        assert_eq!(p.to_array().map(f32::to_bits), q.to_array().map(f32::to_bits));
    }
}
