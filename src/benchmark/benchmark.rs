use std::time::Instant;
use crate::simulation::fields::{FieldSet, UniformField};
use crate::simulation::integrator::{push_population, push_population_serial};
use crate::simulation::physics::{ELEMENTARY_CHARGE, PROTON_MASS};
use crate::simulation::states::{NVec3, Particle, Population};

/// Helper to build a manual population of size `n`
fn make_population(n: usize) -> Population {
    (0..n)
        .map(|i| {
            let i_f = i as f64;
            // deterministic positions and velocities, no rand needed
            let x = NVec3::new(
                (i_f * 0.37).sin() * 5.0e6,
                (i_f * 0.13).cos() * 5.0e6,
                (i_f * 0.07).sin() * 5.0e6,
            );
            let v = NVec3::new((i_f * 0.11).cos() * 1.0e5, (i_f * 0.23).sin() * 1.0e5, 0.0);
            Particle::new(PROTON_MASS, ELEMENTARY_CHARGE, x, v)
        })
        .collect()
}

/// Helper for the benchmark fields: weak uniform B, small E
fn make_fields() -> FieldSet {
    FieldSet::new(
        UniformField::new(NVec3::new(1.0e-3, 0.0, 0.0)),
        UniformField::new(NVec3::new(0.0, 0.0, 1.0e-8)),
        UniformField::zero(),
    )
}

/// Compare the serial and the rayon population push for a range of n
pub fn bench_push() {
    let ns = [1_000, 10_000, 100_000, 1_000_000];
    let steps = 5; // pushes per measurement
    let fields = make_fields();

    for n in ns {
        let template = make_population(n);

        // Serial
        let mut serial = template.clone();
        push_population_serial(&mut serial, &fields, 0.01); // warm-up
        let t0 = Instant::now();
        for _ in 0..steps {
            push_population_serial(&mut serial, &fields, 0.01);
        }
        let serial_per_step = t0.elapsed().as_secs_f64() / steps as f64;

        // Parallel
        let mut parallel = template.clone();
        push_population(&mut parallel, &fields, 0.01); // warm-up
        let t1 = Instant::now();
        for _ in 0..steps {
            push_population(&mut parallel, &fields, 0.01);
        }
        let parallel_per_step = t1.elapsed().as_secs_f64() / steps as f64;

        println!("N = {:8}, serial step = {:8.6} s, parallel step = {:8.6} s", n, serial_per_step, parallel_per_step);
    }
}

/// Push cost per step over a range of n
/// Paste output directly into excel to graph
pub fn bench_push_curve() {
    println!("N,serial_ms,parallel_ms");
    let fields = make_fields();

    for n in (10_000..=200_000).step_by(10_000) {
        let template = make_population(n);

        let mut serial = template.clone();
        let t0 = Instant::now();
        push_population_serial(&mut serial, &fields, 0.01);
        let ms_serial = t0.elapsed().as_secs_f64() * 1000.0;

        let mut parallel = template.clone();
        let t1 = Instant::now();
        push_population(&mut parallel, &fields, 0.01);
        let ms_parallel = t1.elapsed().as_secs_f64() * 1000.0;

        println!("{},{:.6},{:.6}", n, ms_serial, ms_parallel);
    }
}
