//! Eye-Tracker Log CLI Application
//!
//! Command-line front end for the eyelog-decoder library. It adds:
//! - Batch processing of several `.asc` logs
//! - TOML configuration and external format descriptions
//! - Parallel trial assembly
//! - CSV/JSON output and a run summary

use anyhow::Result;
use clap::Parser;
use eyelog_decoder::{Decoder, DecoderError};
use std::path::{Path, PathBuf};

mod config;
mod output;
mod report;
mod runner;

use config::{OutputFormat, Overrides, Settings};
use report::{FileSummary, RunReport};

/// Eyelog - Extract per-trial records from eye-tracker logs
#[derive(Parser, Debug)]
#[command(name = "eyelog")]
#[command(about = "Extract per-trial records from eye-tracker .asc logs", long_about = None)]
#[command(version)]
struct Args {
    /// Log files to decode (.asc)
    #[arg(value_name = "FILE")]
    logs: Vec<PathBuf>,

    /// Output file (only with a single input; default: <stem>_data.csv next to the input)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Directory for output files
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum)]
    output_format: Option<OutputFormat>,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Format description file (TOML) replacing the built-in dialect
    #[arg(long, value_name = "FILE")]
    format_file: Option<PathBuf>,

    /// Abort the whole run at the first malformed trial instead of skipping it
    #[arg(long)]
    fail_fast: bool,

    /// Number of samples averaged on each side of the display line
    #[arg(long, value_name = "SAMPLES")]
    pupil_window: Option<usize>,

    /// Worker threads for trial assembly (default: one per core)
    #[arg(short, long, value_name = "N")]
    jobs: Option<usize>,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            files: self.logs.clone(),
            output: self.output.clone(),
            output_dir: self.output_dir.clone(),
            output_format: self.output_format,
            format_file: self.format_file.clone(),
            pupil_window: self.pupil_window,
            fail_fast: self.fail_fast,
            workers: self.jobs,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    log::info!("Eyelog CLI v{}", env!("CARGO_PKG_VERSION"));
    log::debug!("Using decoder library v{}", eyelog_decoder::VERSION);

    let app_config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => config::AppConfig::default(),
    };
    let settings = Settings::resolve(app_config, args.overrides())?;

    if settings.files.is_empty() {
        println!("Eyelog - No input specified");
        println!("\nQuick Start:");
        println!("  eyelog s01.asc");
        println!("  eyelog s01.asc s02.asc --output-dir out --output-format json");
        println!("\nFor batch runs:");
        println!("  eyelog --config config.toml");
        println!("\nUse --help for more options");
        return Ok(());
    }

    let decoder = Decoder::with_format(settings.format.clone(), settings.decoder.clone())?;
    log::debug!(
        "Pupil window {}, {:?}, {} worker(s)",
        settings.decoder.pupil_window,
        settings.decoder.failure_policy,
        settings.workers
    );

    let run = run_files(&decoder, &settings);

    if !args.quiet {
        print!("{}", run);
    }

    let failed = run.failed_files();
    if failed > 0 {
        anyhow::bail!("{} of {} file(s) failed", failed, run.files().len());
    }
    Ok(())
}

/// Process every input file in order
///
/// Under fail-fast, the first malformed trial ends the run: later files are not decoded.
fn run_files(decoder: &Decoder, settings: &Settings) -> RunReport {
    let mut run = RunReport::new();

    for (i, input) in settings.files.iter().enumerate() {
        match process_file(decoder, settings, input) {
            Ok(summary) => run.push(summary),
            Err(e) => {
                log::error!("{:?}: {:#}", input, e);
                let malformed = matches!(
                    e.downcast_ref::<DecoderError>(),
                    Some(DecoderError::MalformedTrial(_))
                );
                run.push(FileSummary::failed(input.clone(), &e));

                if malformed && settings.decoder.is_fail_fast() {
                    let remaining = settings.files.len() - i - 1;
                    if remaining > 0 {
                        log::warn!("Fail-fast: {} remaining file(s) not decoded", remaining);
                    }
                    break;
                }
            }
        }
    }

    run
}

/// Validate, decode and write one log file
fn process_file(decoder: &Decoder, settings: &Settings, input: &Path) -> Result<FileSummary> {
    config::validate_input(input)?;

    let report = runner::decode_log(decoder, input, settings.workers)?;
    let output_path = settings.output_path_for(input);
    output::write_records(
        &output_path,
        settings.output_format,
        decoder.format(),
        input,
        &report.records,
    )?;

    Ok(FileSummary::decoded(input.to_path_buf(), output_path, &report))
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
