//! CLI tool to run the built-in demonstrations or a pipeline (.pipe) file.
//!
//! Usage:
//!   stream-run demo [SCENARIO]...
//!   stream-run pipe <pipeline.pipe> [input.data] [-o output.txt] [--rat] [--trace]
//!
//! Without an input file, pipelines read the built-in sample roster.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use stream_demos::{
    SAMPLE_DATA, Scenario, Variant, execute_pipeline, execute_pipeline_rat,
    execute_pipeline_rat_debug, list_values, run_all, sample_employees,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "stream-run")]
#[command(about = "Lazy record pipeline demonstrations", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run demonstrations against the sample roster (all when none named)
    Demo {
        #[arg(value_parser = parse_scenario)]
        scenarios: Vec<Scenario>,
    },

    /// Run a pipeline file against employee data
    Pipe {
        /// Pipeline definition file (.pipe)
        pipeline: PathBuf,

        /// Employee data file (name,age,salary per line)
        input: Option<PathBuf>,

        /// Write output to file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Use the record-at-a-time executor
        #[arg(long)]
        rat: bool,

        /// Log per-stage record counts (implies --rat)
        #[arg(long)]
        trace: bool,
    },
}

fn parse_scenario(name: &str) -> std::result::Result<Scenario, String> {
    Scenario::value_of(name)
        .map_err(|e| format!("{e} (expected one of {})", list_values::<Scenario>()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match cli.verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Demo { scenarios } => run_demos(&scenarios),
        Commands::Pipe {
            pipeline,
            input,
            output,
            rat,
            trace,
        } => run_pipe(&pipeline, input.as_deref(), output.as_deref(), rat, trace),
    }
}

fn run_demos(scenarios: &[Scenario]) -> Result<()> {
    let roster = sample_employees();

    if scenarios.is_empty() {
        let results = run_all(&roster)?;
        info!(scenarios = results.len(), "all demonstrations complete");
        return Ok(());
    }

    for scenario in scenarios {
        scenario
            .run(&roster)
            .with_context(|| format!("scenario '{scenario}' failed"))?;
    }
    Ok(())
}

fn run_pipe(
    pipeline_path: &Path,
    input_path: Option<&Path>,
    output_path: Option<&Path>,
    rat: bool,
    trace: bool,
) -> Result<()> {
    let pipeline_text = fs::read_to_string(pipeline_path).with_context(|| {
        format!("reading pipeline file '{}'", pipeline_path.display())
    })?;

    let input_text = match input_path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("reading input file '{}'", path.display()))?,
        None => SAMPLE_DATA.to_string(),
    };

    let (output, input_count, output_count) = if trace {
        let (output, input_count, output_count, trace) =
            execute_pipeline_rat_debug(&input_text, &pipeline_text)?;
        trace.log_summary();
        (output, input_count, output_count)
    } else if rat {
        execute_pipeline_rat(&input_text, &pipeline_text)?
    } else {
        execute_pipeline(&input_text, &pipeline_text)?
    };

    match output_path {
        Some(out_path) => {
            if let Some(parent) = out_path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent).with_context(|| {
                    format!("creating output directory for '{}'", out_path.display())
                })?;
            }
            fs::write(out_path, &output)
                .with_context(|| format!("writing output file '{}'", out_path.display()))?;
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(output.as_bytes())?;
            if !output.is_empty() && !output.ends_with('\n') {
                writeln!(stdout)?;
            }
        }
    }

    info!(
        pipeline = %pipeline_path.display(),
        executor = if rat || trace { "record-at-a-time" } else { "batch" },
        input_count,
        output_count,
        "pipeline complete"
    );
    Ok(())
}
