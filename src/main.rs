use ptsim::{TracerConfig, Tracer};
use ptsim::{bench_push, bench_push_curve};

use clap::Parser;
use anyhow::{Context, Result};

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

#[derive(Parser, Debug)]
struct Args {
    /// Run description, looked up in `scenarios/` unless it is an existing path
    #[arg(short, default_value = "single.yaml")]
    file_name: String,

    /// Override the scenario named in the run description
    #[arg(long)]
    scenario: Option<String>,

    /// Analysator input records (x y z vx vy vz), stdin if absent
    #[arg(long)]
    input: Option<String>,

    /// Time the particle pusher instead of running a scenario
    #[arg(long)]
    bench: bool,
}

// load here to keep main clean
fn load_config(args: &Args) -> Result<TracerConfig> {
    let given = PathBuf::from(&args.file_name);
    let config_path = if given.exists() {
        given
    } else {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios").join(&args.file_name)
    };
    let file = File::open(&config_path).with_context(|| format!("cannot open {}", config_path.display()))?;
    let reader = BufReader::new(file);
    let mut cfg: TracerConfig = serde_yaml::from_reader(reader)
        .with_context(|| format!("cannot parse {}", config_path.display()))?;

    if let Some(scenario) = &args.scenario {
        cfg.engine.scenario = scenario.clone();
    }
    if let Some(input) = &args.input {
        cfg.engine.input_file = Some(input.clone());
    }
    log::debug!("{:?}", cfg);

    Ok(cfg)
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.bench {
        bench_push();
        bench_push_curve();
        return Ok(());
    }

    let cfg = load_config(&args)?;
    // unknown scenarios and bad parameters stop the run here
    let tracer = Tracer::from_config(&cfg, Box::new(io::stdout())).context("invalid run configuration")?;
    tracer.run();

    Ok(())
}
