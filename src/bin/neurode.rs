use std::fs;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use neurode::{check_string, resolve_file, PipelineOptions};

/// resolves the ode of a neuron model into an exact update step where one exists
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input filename
    input: String,

    /// Output filename (stdout if omitted)
    #[arg(short, long)]
    out: Option<String>,

    /// Base directory for analysis jobs (system temp dir if omitted)
    #[arg(short, long)]
    work_dir: Option<String>,

    /// Interpreter that runs the analysis job
    #[arg(long)]
    python: Option<String>,

    /// Kill the analysis job after this many seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Keep the analysis job and its artifacts
    #[arg(short, long)]
    keep: bool,

    /// Read artifacts from a previous run in this directory instead of running the job
    #[arg(long)]
    replay: Option<String>,

    /// Only parse and check the model
    #[arg(long)]
    check: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Args::parse();
    if cli.check {
        let text = fs::read_to_string(&cli.input)?;
        check_string(text.as_str())?;
        return Ok(());
    }
    let options = PipelineOptions {
        interpreter: cli.python,
        timeout: cli.timeout.map(Duration::from_secs),
        keep_artifacts: cli.keep,
    };
    resolve_file(
        &cli.input,
        cli.out.as_deref(),
        cli.work_dir.as_deref(),
        cli.replay.as_deref(),
        options,
    )
}
