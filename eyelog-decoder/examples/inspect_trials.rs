//! Trial inspection tool
//!
//! Prints how a `.asc` log splits into trials: line counts, where the anchor,
//! error and display lines were found, and the assembly outcome.
//!
//! Usage:
//!   inspect_trials <log_file.asc> [--window <samples>] [--limit <count>]
//!
//! Example:
//!   RUST_LOG=debug inspect_trials s01.asc --window 100 --limit 10

use eyelog_decoder::locator::locate;
use eyelog_decoder::lost_messages::detect_lost_messages;
use eyelog_decoder::{Decoder, DecoderConfig, FormatDescription};
use std::env;
use std::path::PathBuf;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <log_file.asc> [--window <samples>] [--limit <count>]", args[0]);
        std::process::exit(1);
    }

    let log_path = PathBuf::from(&args[1]);
    let mut window = 250;
    let mut limit: Option<usize> = None;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--window" if i + 1 < args.len() => {
                window = args[i + 1].parse().unwrap_or(window);
                i += 2;
            }
            "--limit" if i + 1 < args.len() => {
                limit = args[i + 1].parse().ok();
                i += 2;
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                std::process::exit(1);
            }
        }
    }

    let raw = match std::fs::read_to_string(&log_path) {
        Ok(raw) => raw,
        Err(e) => {
            eprintln!("Failed to read {:?}: {}", log_path, e);
            std::process::exit(1);
        }
    };

    let config = DecoderConfig::new().with_pupil_window(window);
    let decoder = match Decoder::with_format(FormatDescription::default(), config) {
        Ok(decoder) => decoder,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    let format = decoder.format();

    println!("=== {} ===", log_path.display());
    println!(
        "{:>5} {:>7} {:>6} {:>6} {:>6} {:>8}  outcome",
        "trial", "logline", "lines", "end", "draw", "lost"
    );

    for trial in decoder.trials(&raw).take(limit.unwrap_or(usize::MAX)) {
        let show = |index: Option<usize>| index.map_or("-".to_string(), |i| i.to_string());
        let lost = match detect_lost_messages(&trial, format) {
            Ok(Some(count)) => count.to_string(),
            Ok(None) => "-".to_string(),
            Err(_) => "bad".to_string(),
        };
        let outcome = match decoder.assemble(&trial) {
            Ok(record) => format!("ok, {} missing", record.missing_count()),
            Err(e) => e.to_string(),
        };

        println!(
            "{:>5} {:>7} {:>6} {:>6} {:>6} {:>8}  {}",
            trial.ordinal,
            trial.start_line,
            trial.len(),
            show(locate(&trial, &format.end_marker)),
            show(locate(&trial, &format.display_marker)),
            lost,
            outcome
        );
    }
}
