use anyhow::Context;
use clap::{ArgAction, Parser};
use is_terminal::IsTerminal;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use interactions_etl::{ConfigError, EventPipeline, InputFormat, JobConfig, JobFile};

#[derive(Parser)]
#[command(name = "interactions-etl")]
#[command(about = "Filter event-tracking JSON into an interactions CSV")]
#[command(version)]
struct Args {
    /// Job identifier, used for logging only
    #[arg(long = "job-name", alias = "JOB_NAME", value_name = "NAME")]
    job_name: Option<String>,

    /// Input file or directory of JSON event records ('-' for stdin)
    #[arg(short = 'i', long = "input-path", alias = "S3_JSON_INPUT_PATH", value_name = "PATH")]
    input_path: Option<PathBuf>,

    /// Output CSV file, or directory to receive part-00000.csv ('-' for stdout)
    #[arg(short = 'o', long = "output-path", alias = "S3_CSV_OUTPUT_PATH", value_name = "PATH")]
    output_path: Option<PathBuf>,

    /// YAML job file; command-line options take precedence over it
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config_file: Option<PathBuf>,

    /// Input format
    #[arg(long = "input-format", value_enum)]
    input_format: Option<InputFormat>,

    /// Omit the CSV header row
    #[arg(long)]
    no_header: bool,

    /// Fail on the first unparseable input line instead of skipping it
    #[arg(long)]
    fail_fast: bool,

    /// Accepted event type (repeatable, replaces the default list)
    #[arg(long = "event-type", action = ArgAction::Append, value_name = "EVENT")]
    event_types: Vec<String>,

    /// Print a processing summary to stderr
    #[arg(long)]
    stats: bool,

    /// Debug logging
    #[arg(long, conflicts_with = "quiet")]
    debug: bool,

    /// Only log warnings and errors
    #[arg(short = 'q', long)]
    quiet: bool,
}

impl Args {
    /// Command-line values as a job file layer, unset flags left empty
    fn overrides(&self) -> JobFile {
        JobFile {
            job_name: self.job_name.clone(),
            input_path: self.input_path.clone(),
            output_path: self.output_path.clone(),
            input_format: self.input_format,
            header: self.no_header.then_some(false),
            fail_fast: self.fail_fast.then_some(true),
            event_types: (!self.event_types.is_empty()).then(|| self.event_types.clone()),
        }
    }

    fn job_config(&self) -> Result<JobConfig, ConfigError> {
        let base = match &self.config_file {
            Some(path) => JobFile::load(path)?,
            None => JobFile::default(),
        };
        base.merge(self.overrides()).into_job_config()
    }
}

fn init_logging(args: &Args) {
    let filter = if args.debug {
        EnvFilter::new("interactions_etl=debug")
    } else if args.quiet {
        EnvFilter::new("interactions_etl=warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("interactions_etl=info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .init();
}

fn main() {
    let args = Args::parse();
    init_logging(&args);

    let job = match args.job_config() {
        Ok(job) => job,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };

    if let Err(e) = run(&args, &job) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args, job: &JobConfig) -> anyhow::Result<()> {
    let pipeline = EventPipeline::new(job.pipeline.clone());
    let stats = pipeline
        .run(job)
        .with_context(|| format!("Job '{}' failed", job.job_name))?;

    if args.stats {
        eprintln!("Final statistics:");
        eprintln!("  Files read: {}", stats.files_read);
        eprintln!("  Records read: {}", stats.records_read);
        eprintln!("  Records passing filter: {}", stats.records_passed_filter());
        eprintln!("  Rows written: {}", stats.records_output);
        eprintln!("  Unparseable timestamps: {}", stats.timestamps_unparsed);
        eprintln!("  Unparseable lines: {}", stats.parse_errors.len());
        for info in &stats.parse_errors {
            eprintln!("    {}:{}: {}", info.source_name, info.line_number, info.error);
        }
        eprintln!(
            "  Processing time: {}",
            humantime::format_duration(stats.processing_time)
        );
    }

    Ok(())
}
