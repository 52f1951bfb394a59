use std::f64::consts::PI;
use std::io::{self, Cursor, Write};
use std::sync::{Arc, Mutex};

use approx::assert_relative_eq;
use tempfile::tempdir;

use ptsim::configuration::config::{ParametersConfig, TracerConfig};
use ptsim::output::pattern::FilenamePattern;
use ptsim::output::snapshot::{read_particles, write_particles, write_sextuples};
use ptsim::simulation::engine::{Engine, Tracer};
use ptsim::simulation::fields::{DipoleField, FieldSet, UniformField};
use ptsim::simulation::integrator::{boris_push, push_population};
use ptsim::simulation::params::ParticleParameters;
use ptsim::simulation::physics::{ELEMENTARY_CHARGE, PROTON_MASS};
use ptsim::simulation::scenario::{
    build_scenario, AnalysatorScenario, PrecipitationScenario, Scenario, ScenarioIo, ScenarioKind,
    ShockReflectivityScenario,
};
use ptsim::simulation::states::{NVec3, Particle, Population, Provenance};
use ptsim::TracerError;

/// Log sink that tests can read back after handing it to a scenario
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Default parameters, as if loaded from an empty `parameters:` block
pub fn test_params() -> ParticleParameters {
    let cfg: ParametersConfig = serde_yaml::from_str("{}").unwrap();
    ParticleParameters::from(&cfg)
}

/// Scenario IO writing into `dir` and logging into `log`
pub fn test_io(dir: &std::path::Path, log: &SharedBuffer) -> ScenarioIo {
    ScenarioIo::new(dir, FilenamePattern::parse("snap.%03d.psnap").unwrap(), Box::new(log.clone()))
}

/// Uniform fields
pub fn uniform_fields(e: NVec3, b: NVec3, v: NVec3) -> FieldSet {
    FieldSet::new(UniformField::new(e), UniformField::new(b), UniformField::new(v))
}

pub fn proton_at(x: NVec3, v: NVec3) -> Particle {
    Particle::new(PROTON_MASS, ELEMENTARY_CHARGE, x, v)
}

// ==================================================================================
// Integrator tests
// ==================================================================================

#[test]
fn magnetic_push_conserves_speed() {
    let b = NVec3::new(3.0e-9, -1.0e-8, 2.0e-8);
    let e = NVec3::zeros();
    let starts = [
        NVec3::new(1.0e5, 0.0, 0.0),
        NVec3::new(-3.0e5, 2.0e5, 7.0e4),
        NVec3::new(0.0, 0.0, 0.9 * ptsim::simulation::physics::C),
    ];

    for v0 in starts {
        let mut p = proton_at(NVec3::zeros(), v0);
        for _ in 0..1000 {
            boris_push(&mut p, &b, &e, 0.5);
        }
        assert_relative_eq!(p.v.norm(), v0.norm(), max_relative = 1e-12);
    }
}

#[test]
fn electric_push_accelerates_along_field() {
    let e = NVec3::new(0.0, 1.0e-3, 0.0);
    let mut p = proton_at(NVec3::zeros(), NVec3::zeros());
    boris_push(&mut p, &NVec3::zeros(), &e, 1.0);

    let dv = ELEMENTARY_CHARGE * 1.0e-3 / PROTON_MASS;
    assert_relative_eq!(p.v.y, dv, max_relative = 1e-12);
    assert_relative_eq!(p.x.y, dv, max_relative = 1e-12);
    assert_eq!(p.v.x, 0.0);
}

#[test]
fn disabled_particles_stay_disabled() {
    let fields = FieldSet::new(
        UniformField::new(NVec3::new(1.0e-3, 2.0e-3, 0.0)),
        DipoleField { moment: NVec3::new(0.0, 0.0, -8.0e22), core_radius: 0.0 },
        UniformField::zero(),
    );
    let mut population = vec![
        proton_at(NVec3::new(2.0e7, 0.0, 0.0), NVec3::new(0.0, 1.0e5, 0.0)),
        proton_at(NVec3::new(3.0e7, 0.0, 0.0), NVec3::new(1.0e5, 0.0, 0.0)),
    ];
    population[1].disable();

    for _ in 0..10 {
        push_population(&mut population, &fields, 0.1);
        assert!(population[1].x[0].is_nan());
        assert_eq!(population[1].x[1], 0.0);
        assert_eq!(population[1].x[2], 0.0);
        assert_eq!(population[1].v, NVec3::zeros());
    }
    assert!(!population[0].is_disabled());
}

#[test]
fn raw_push_keeps_nan_position() {
    let mut p = proton_at(NVec3::zeros(), NVec3::zeros());
    p.disable();
    boris_push(&mut p, &NVec3::new(0.0, 0.0, 1.0e-8), &NVec3::zeros(), 1.0);
    assert!(p.is_disabled());
    assert_eq!(p.v, NVec3::zeros());
}

#[test]
fn gyration_closes_after_one_period() {
    let (m, q, b) = (1.67e-27, 1.6e-19, 1.0e-8);
    let v0 = NVec3::new(1.0e5, 0.0, 0.0);
    let mut p = Particle::new(m, q, NVec3::zeros(), v0);
    let b_vec = NVec3::new(0.0, 0.0, b);

    let period = 2.0 * PI * m / (q * b);
    let steps = period.round() as usize; // dt = 1
    let larmor = m * v0.norm() / (q * b);

    let mut farthest: f64 = 0.0;
    for _ in 0..steps {
        boris_push(&mut p, &b_vec, &NVec3::zeros(), 1.0);
        assert_eq!(p.x.z, 0.0);
        farthest = farthest.max(p.x.norm());
    }

    assert!(farthest > larmor, "orbit never left the start point");
    assert!(p.x.norm() < 0.05 * larmor, "orbit did not close: |dx| = {}", p.x.norm());
    assert_relative_eq!(p.v.norm(), v0.norm(), max_relative = 1e-12);
}

// ==================================================================================
// Scenario tests
// ==================================================================================

#[test]
fn single_scenario_traces_a_circle() {
    let dir = tempdir().unwrap();
    let log = SharedBuffer::default();
    let params = test_params(); // starts at the origin
    let scenario = build_scenario(ScenarioKind::Single, &params, test_io(dir.path(), &log)).unwrap();

    let fields = uniform_fields(NVec3::zeros(), NVec3::new(0.0, 0.0, 1.0e-8), NVec3::new(1.0e5, 0.0, 0.0));
    let period = 2.0 * PI * PROTON_MASS / (ELEMENTARY_CHARGE * 1.0e-8);
    let engine = Engine {
        scenario: ScenarioKind::Single,
        dt: 1.0,
        start_time: 0.0,
        end_time: period.round(),
        input_dt: 1.0,
    };

    let tracer = Tracer::new(engine, fields, scenario);
    assert_eq!(tracer.population[0].v, NVec3::new(1.0e5, 0.0, 0.0));
    let population = tracer.run();

    let larmor = PROTON_MASS * 1.0e5 / (ELEMENTARY_CHARGE * 1.0e-8);
    assert!(population[0].x.norm() < 0.05 * larmor);

    let text = log.contents();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), period.round() as usize);
    let fields: Vec<&str> = lines[0].split_whitespace().collect();
    assert_eq!(fields.len(), 8);
    assert_eq!(fields[0], "0");
    assert_eq!(fields[1], "0");
    assert!(lines[0].contains('\t'));
}

#[test]
fn distribution_scenario_clusters_at_start_point() {
    let dir = tempdir().unwrap();
    let log = SharedBuffer::default();
    let mut params = test_params();
    params.num_particles = 500;
    params.init_position = NVec3::new(1.0e6, 2.0e6, 3.0e6);

    let mut scenario = build_scenario(ScenarioKind::Distribution, &params, test_io(dir.path(), &log)).unwrap();
    let bulk = NVec3::new(4.0e5, 0.0, 0.0);
    let fields = uniform_fields(NVec3::zeros(), NVec3::zeros(), bulk);

    let mut population = scenario.initial_particles(&fields);
    assert_eq!(population.len(), 500);
    assert!(population.iter().all(|p| p.x == params.init_position));

    // thermal spread of 1e6 K protons is ~9e4 m/s per component
    let mean = population.iter().fold(NVec3::zeros(), |acc, p| acc + p.v) / population.len() as f64;
    assert!((mean - bulk).norm() < 2.0e4, "mean velocity {mean:?} far from bulk");

    scenario.new_timestep(1, 0, 0.0, &mut population, &fields);
    scenario.new_timestep(2, 10, 1.0, &mut population, &fields);
    scenario.finalize(&mut population, &fields);
    assert!(dir.path().join("snap.000.psnap").exists());
    assert!(dir.path().join("snap.001.psnap").exists());
    assert_eq!(read_particles(&dir.path().join("particles_final.psnap")).unwrap().len(), 500);
}

#[test]
fn precipitation_records_and_disables_inner_hits() {
    let dir = tempdir().unwrap();
    let log = SharedBuffer::default();
    let params = test_params();
    let mut scenario = PrecipitationScenario::new(&params, test_io(dir.path(), &log)).unwrap();
    let fields = uniform_fields(NVec3::zeros(), NVec3::zeros(), NVec3::zeros());

    let origin = Provenance { batch: 3, time: 0.0, x: -1.5e8 };
    let mut population: Population = vec![
        proton_at(NVec3::new(-1.5e8, 0.0, 0.0), NVec3::zeros()).with_origin(origin), // far from every boundary
        proton_at(NVec3::new(5.0e6, 0.0, 1.0e6), NVec3::new(1.0e5, 0.0, 0.0)).with_origin(origin), // inside
        proton_at(NVec3::new(-2.5e8, 0.0, 0.0), NVec3::zeros()).with_origin(origin), // beyond the outer boundary
    ];

    scenario.after_push(0, 0.0, &mut population, &fields);
    assert!(!population[0].is_disabled());
    assert!(population[1].is_disabled());
    assert!(population[2].is_disabled());
    assert_eq!(population[1].v, NVec3::zeros());

    let text = log.contents();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);

    let hit: Vec<&str> = lines[0].split_whitespace().collect();
    assert_eq!(hit[0], "1");
    assert_eq!(hit[1], "3");
    assert_relative_eq!(hit[2].parse::<f64>().unwrap(), -1.5e8);
    assert_relative_eq!(hit[3].parse::<f64>().unwrap(), (1.0e6f64).atan2(5.0e6), epsilon = 1e-6);
    let energy = 0.5 * PROTON_MASS * 1.0e10 / ELEMENTARY_CHARGE;
    assert_relative_eq!(hit[4].parse::<f64>().unwrap(), energy, epsilon = 1e-5);

    let lost: Vec<&str> = lines[1].split_whitespace().collect();
    assert_eq!(lost[0], "2");
    assert_eq!(&lost[3..], &["-5", "-1"]);

    // nothing is recorded twice, the survivor stays active
    for step in 1..100 {
        scenario.after_push(step, step as f64, &mut population, &fields);
    }
    assert_eq!(log.contents().lines().count(), 2);
    assert!(!population[0].is_disabled());
}

#[test]
fn precipitation_injects_at_weakest_field() {
    let dir = tempdir().unwrap();
    let log = SharedBuffer::default();
    let mut params = test_params();
    params.num_particles = 4;
    let mut scenario = PrecipitationScenario::new(&params, test_io(dir.path(), &log)).unwrap();

    // |B| has its minimum at z = 3e5, a point of the default scan
    let fields = FieldSet::new(
        UniformField::zero(),
        |x: &NVec3| NVec3::new(0.0, 0.0, (x.z - 3.0e5).abs() + 1.0e-9),
        UniformField::new(NVec3::new(0.0, 1.0e4, 0.0)),
    );

    let mut population = Population::new();
    scenario.new_timestep(1, 0, 0.0, &mut population, &fields);
    scenario.new_timestep(2, 100, 1.0, &mut population, &fields);
    assert_eq!(population.len(), 8);

    let geometry = &params.precipitation;
    for (i, p) in population.iter().enumerate() {
        let origin = p.origin.unwrap();
        assert_eq!(origin.batch, i / 4);
        assert_relative_eq!(origin.x, geometry.injection_x(i % 4, 4));
        assert_relative_eq!(p.x.z, 3.0e5, epsilon = 1e-3);
        assert_eq!(p.x.x, origin.x);
        assert_eq!(p.v, NVec3::new(0.0, 1.0e4, 0.0));
    }
    assert!(dir.path().join("snap.001.psnap").exists());
}

#[test]
fn reflectivity_counts_each_particle_once() {
    let dir = tempdir().unwrap();
    let log = SharedBuffer::default();
    let params = test_params();
    let mut scenario = ShockReflectivityScenario::new(&params, test_io(dir.path(), &log)).unwrap();
    let fields = uniform_fields(NVec3::zeros(), NVec3::zeros(), NVec3::zeros());

    // at t = 250 the front nose sits at x = 8e7, margins 2e7 on each side
    let origin = Provenance { batch: 0, time: 240.0, x: 8.0e7 };
    let mut population: Population = vec![
        proton_at(NVec3::new(5.0e7, 1.0, 0.0), NVec3::zeros()).with_origin(origin),
        proton_at(NVec3::new(1.1e8, 2.0, 0.0), NVec3::zeros()).with_origin(origin),
        proton_at(NVec3::new(8.0e7, 3.0, 0.0), NVec3::zeros()).with_origin(origin),
    ];

    scenario.after_push(0, 250.0, &mut population, &fields);
    scenario.after_push(1, 250.0, &mut population, &fields);

    assert_eq!(scenario.transmitted().values(), &[[1.0, 240.0]]);
    assert_eq!(scenario.reflected().values(), &[[2.0, 240.0]]);
    assert!(population[0].is_disabled());
    assert!(population[1].is_disabled());
    assert!(!population[2].is_disabled());
}

#[test]
fn reflectivity_crossings_are_exclusive() {
    let dir = tempdir().unwrap();
    let log = SharedBuffer::default();
    let params = test_params();
    let mut scenario = ShockReflectivityScenario::new(&params, test_io(dir.path(), &log)).unwrap();
    let fields = uniform_fields(NVec3::zeros(), NVec3::zeros(), NVec3::zeros());

    let mut population: Population = (0..2000)
        .map(|i| {
            let i_f = i as f64;
            let x = NVec3::new((i_f * 0.37).sin() * 1.5e8, (i_f * 0.13).cos() * 1.0e8, 0.0);
            proton_at(x, NVec3::zeros())
        })
        .collect();

    // the front sweeps across the cloud over time
    for step in 0..50 {
        let time = 250.0 + 20.0 * step as f64;
        scenario.after_push(step, time, &mut population, &fields);
    }

    let disabled = population.iter().filter(|p| p.is_disabled()).count();
    assert!(disabled > 0);
    assert_eq!(scenario.transmitted().len() + scenario.reflected().len(), disabled);
}

#[test]
fn reflectivity_injection_is_reproducible() {
    let dir = tempdir().unwrap();
    let log = SharedBuffer::default();
    let mut params = test_params();
    params.num_particles = 3;
    params.reflectivity.front_points = 4;
    params.random_seed = 99;

    let fields = uniform_fields(NVec3::zeros(), NVec3::zeros(), NVec3::new(-4.0e5, 0.0, 0.0));
    let inject = |step: usize| {
        let mut scenario = ShockReflectivityScenario::new(&params, test_io(dir.path(), &log)).unwrap();
        let mut population = Population::new();
        scenario.new_timestep(1, step, 250.0, &mut population, &fields);
        population
    };

    let a = inject(5);
    let b = inject(5);
    let c = inject(6);
    assert_eq!(a.len(), 12);
    assert_eq!(a, b);
    assert_ne!(a[0].v, c[0].v);

    let front = params.reflectivity.front;
    for (i, p) in a.iter().enumerate() {
        let y = params.reflectivity.injection_y(i / 3);
        assert_eq!(p.x, NVec3::new(front.x_at(y, 250.0), y, 0.0));
        assert_eq!(p.origin.unwrap().time, 250.0);
    }
}

#[test]
fn reflectivity_finalize_writes_histograms() {
    let dir = tempdir().unwrap();
    let log = SharedBuffer::default();
    let params = test_params();
    let mut scenario = ShockReflectivityScenario::new(&params, test_io(dir.path(), &log)).unwrap();
    let fields = uniform_fields(NVec3::zeros(), NVec3::zeros(), NVec3::zeros());

    let mut population = vec![proton_at(NVec3::new(0.0, 0.0, 0.0), NVec3::zeros())];
    scenario.after_push(0, 250.0, &mut population, &fields);
    scenario.finalize(&mut population, &fields);

    for name in ["transmitted", "reflected"] {
        assert!(dir.path().join(format!("{name}.dat")).exists());
        let bov = std::fs::read_to_string(dir.path().join(format!("{name}.dat.bov"))).unwrap();
        assert!(bov.contains(&format!("DATA_FILE: {name}.dat")));
    }
    assert_eq!(std::fs::metadata(dir.path().join("transmitted.dat")).unwrap().len(), 16);
    assert_eq!(std::fs::metadata(dir.path().join("reflected.dat")).unwrap().len(), 0);
}

#[test]
fn reflectivity_finalize_survives_missing_output_dir() {
    let dir = tempdir().unwrap();
    let gone = dir.path().join("gone");
    let log = SharedBuffer::default();
    let params = test_params();
    let mut scenario = ShockReflectivityScenario::new(&params, test_io(&gone, &log)).unwrap();
    let fields = uniform_fields(NVec3::zeros(), NVec3::zeros(), NVec3::zeros());

    let mut population = vec![proton_at(NVec3::new(0.0, 0.0, 0.0), NVec3::zeros())];
    scenario.after_push(0, 250.0, &mut population, &fields);
    scenario.finalize(&mut population, &fields);

    assert_eq!(scenario.transmitted().len(), 1);
    assert!(!gone.exists());
}

#[test]
fn analysator_reads_records_and_logs_every_particle() {
    let dir = tempdir().unwrap();
    let log = SharedBuffer::default();
    let input = "1 2 3 4 5 6\n-1 -2 -3 -4 -5 -6\n7 8\n";
    let io = test_io(dir.path(), &log).with_input(Box::new(Cursor::new(input.as_bytes().to_vec())));
    let mut scenario = AnalysatorScenario::new(io);
    let fields = uniform_fields(NVec3::zeros(), NVec3::zeros(), NVec3::zeros());

    let mut population = scenario.initial_particles(&fields);
    assert_eq!(population.len(), 2);
    assert_eq!(population[1].x, NVec3::new(-1.0, -2.0, -3.0));
    assert_eq!(population[1].v, NVec3::new(-4.0, -5.0, -6.0));
    assert_eq!(population[0].m, PROTON_MASS);

    scenario.new_timestep(1, 0, 2.5, &mut population, &fields);
    let text = log.contents();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines, vec!["0 2.5\t1 2 3\t4 5 6", "1 2.5\t-1 -2 -3\t-4 -5 -6"]);
}

#[test]
fn snapshot_round_trips_through_analysator() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("roundtrip.psnap");

    let mut population = vec![
        proton_at(NVec3::new(1.0e7, -2.5e6, 3.0), NVec3::new(1.0e5, 0.1, -7.0e4)),
        proton_at(NVec3::new(4.0, 5.0, 6.0), NVec3::new(7.0, 8.0, 9.0)),
        proton_at(NVec3::zeros(), NVec3::new(1.0, 0.0, 0.0)), // at the origin, still live
        proton_at(NVec3::new(0.1, 0.2, 0.3), NVec3::new(1.0 / 3.0, 2.0 / 3.0, PI)),
    ];
    population[1].disable();

    assert_eq!(write_particles(&population, &path).unwrap(), 3);
    let records = read_particles(&path).unwrap();

    let mut text = Vec::new();
    write_sextuples(&records, &mut text).unwrap();

    let log = SharedBuffer::default();
    let io = test_io(dir.path(), &log).with_input(Box::new(Cursor::new(text)));
    let mut analysator = AnalysatorScenario::new(io);
    let replayed = analysator.initial_particles(&uniform_fields(NVec3::zeros(), NVec3::zeros(), NVec3::zeros()));

    let live: Vec<(NVec3, NVec3)> = population.iter().filter(|p| !p.is_disabled()).map(|p| (p.x, p.v)).collect();
    let back: Vec<(NVec3, NVec3)> = replayed.iter().map(|p| (p.x, p.v)).collect();
    assert_eq!(live, back);
}

// ==================================================================================
// Configuration tests
// ==================================================================================

#[test]
fn unknown_scenario_is_rejected() {
    let params = test_params();
    let dir = tempdir().unwrap();
    let log = SharedBuffer::default();
    let err = ptsim::create_scenario("pinball", &params, test_io(dir.path(), &log)).err().unwrap();
    assert!(matches!(err, TracerError::UnknownScenario(name) if name == "pinball"));
}

#[test]
fn bad_distribution_fails_at_startup() {
    let mut params = test_params();
    params.distribution = ptsim::DistributionConfig::Kappa { kappa: 1.0, temperature: 1.0e6 };
    let dir = tempdir().unwrap();
    let log = SharedBuffer::default();
    let result = build_scenario(ScenarioKind::Reflectivity, &params, test_io(dir.path(), &log));
    assert!(matches!(result, Err(TracerError::InvalidDistribution(_))));
}

#[test]
fn run_from_yaml() {
    let dir = tempdir().unwrap();
    let yaml = format!(
        r#"
engine:
  scenario: "distribution"
  dt: 0.1
  end_time: 1.0
  input_dt: 0.5
  output_filename_pattern: "cloud.%02i.psnap"
  output_dir: "{}"
parameters:
  num_particles: 10
  random_seed: 7
  distribution: {{ family: monoenergetic, energy_ev: 1000.0 }}
fields:
  b: {{ type: uniform, value: [ 0.0, 0.0, 1.0e-8 ] }}
"#,
        dir.path().display()
    );
    let cfg: TracerConfig = serde_yaml::from_str(&yaml).unwrap();
    let tracer = Tracer::from_config(&cfg, Box::new(io::sink())).unwrap();
    assert_eq!(tracer.engine.total_steps(), 10);
    assert_eq!(tracer.engine.steps_per_input(), 5);

    let population = tracer.run();
    assert_eq!(population.len(), 10);
    assert!(dir.path().join("cloud.00.psnap").exists());
    assert!(dir.path().join("cloud.01.psnap").exists());
    assert!(!dir.path().join("cloud.02.psnap").exists());
    assert!(dir.path().join("particles_final.psnap").exists());
}

#[test]
fn snapshot_write_failure_does_not_stop_the_run() {
    let dir = tempdir().unwrap();
    let yaml = format!(
        r#"
engine:
  scenario: "distribution"
  dt: 0.1
  end_time: 1.0
  input_dt: 0.5
  output_filename_pattern: "missing/cloud.%02i.psnap"
  output_dir: "{}"
parameters:
  num_particles: 3
  random_seed: 7
"#,
        dir.path().display()
    );
    let cfg: TracerConfig = serde_yaml::from_str(&yaml).unwrap();
    let tracer = Tracer::from_config(&cfg, Box::new(io::sink())).unwrap();

    let population = tracer.run();
    assert_eq!(population.len(), 3);
    assert!(!dir.path().join("missing").exists());
    assert_eq!(read_particles(&dir.path().join("particles_final.psnap")).unwrap().len(), 3);
}

#[test]
fn engine_rejects_unknown_scenario_name() {
    let yaml = "scenario: \"nope\"\ndt: 1.0\nend_time: 2.0\n";
    let cfg: ptsim::EngineConfig = serde_yaml::from_str(yaml).unwrap();
    assert!(matches!(Engine::from_config(&cfg), Err(TracerError::UnknownScenario(_))));
}
