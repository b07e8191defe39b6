//! Per-file decoding, with optional parallel trial assembly

use anyhow::{Context, Result};
use eyelog_decoder::{DecodeReport, Decoder, Trial};
use rayon::prelude::*;
use std::fs;
use std::path::Path;

/// Decode one log file with `workers` assembly threads
pub fn decode_log(decoder: &Decoder, path: &Path, workers: usize) -> Result<DecodeReport> {
    let raw = fs::read_to_string(path).with_context(|| format!("Failed to read log: {:?}", path))?;

    let report = if workers <= 1 {
        decoder.decode_str(&raw)?
    } else {
        decode_parallel(decoder, &raw, workers)?
    };

    Ok(report)
}

/// Assemble trials on a dedicated pool, keeping log order
///
/// Results are collected in trial order before the failure policy is applied,
/// so fail-fast reports the earliest malformed trial no matter which worker saw it first.
pub fn decode_parallel(
    decoder: &Decoder,
    raw: &str,
    workers: usize,
) -> eyelog_decoder::Result<DecodeReport> {
    let policy = decoder.config().failure_policy;
    let trials: Vec<Trial<'_>> = decoder.trials(raw).collect();
    log::debug!("Assembling {} trials on {} workers", trials.len(), workers);

    let pool = match rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("assembler-{}", i))
        .build()
    {
        Ok(pool) => pool,
        Err(e) => {
            log::warn!("Failed to create thread pool: {}. Assembling sequentially.", e);
            let results = trials.iter().map(|trial| decoder.assemble(trial));
            return DecodeReport::from_results(results, policy);
        }
    };

    let results: Vec<_> = pool.install(|| {
        trials
            .par_iter()
            .map(|trial| decoder.assemble(trial))
            .collect()
    });

    DecodeReport::from_results(results, policy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use eyelog_decoder::{DecoderConfig, DecoderError, FailurePolicy, FormatDescription};
    use std::path::PathBuf;

    fn session() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../eyelog-decoder/tests/fixtures/session.asc")
    }

    fn decoder(policy: FailurePolicy) -> Decoder {
        let config = DecoderConfig::new()
            .with_pupil_window(3)
            .with_failure_policy(policy);
        Decoder::with_format(FormatDescription::default(), config).unwrap()
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let decoder = decoder(FailurePolicy::SkipAndContinue);
        let sequential = decode_log(&decoder, &session(), 1).unwrap();
        let parallel = decode_log(&decoder, &session(), 4).unwrap();

        assert_eq!(sequential, parallel);
        assert_eq!(parallel.assembled(), 3);
        assert_eq!(parallel.skipped(), 1);
    }

    #[test]
    fn test_parallel_fail_fast_reports_earliest_trial() {
        let raw = fs::read_to_string(session()).unwrap();
        let err = decode_parallel(&decoder(FailurePolicy::FailFast), &raw, 4).unwrap_err();

        match err {
            DecoderError::MalformedTrial(rejected) => assert_eq!(rejected.ordinal, 3),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_missing_log_is_an_error() {
        let decoder = decoder(FailurePolicy::SkipAndContinue);
        assert!(decode_log(&decoder, Path::new("nowhere/missing.asc"), 1).is_err());
    }
}
