//! Configuration loading, input validation and settings resolution

use anyhow::{Context, Result};
use eyelog_decoder::{DecoderConfig, FailurePolicy, FormatDescription, LOG_EXTENSION};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub decoding: DecodingConfig,
    /// Complete format description, replacing the built-in dialect
    pub format: Option<FormatDescription>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InputConfig {
    #[serde(default)]
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    pub output_dir: Option<PathBuf>,
    /// Appended to the input file stem to name the output file
    #[serde(default = "default_suffix")]
    pub suffix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            output_dir: None,
            suffix: default_suffix(),
        }
    }
}

fn default_suffix() -> String {
    "_data".to_string()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DecodingConfig {
    pub pupil_window: Option<usize>,
    pub failure_policy: Option<FailurePolicy>,
    /// Worker threads for trial assembly (1 = sequential)
    pub workers: Option<usize>,
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}

/// Load a standalone format description from a TOML file
pub fn load_format(path: &Path) -> Result<FormatDescription> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read format file: {:?}", path))?;

    let format: FormatDescription = toml::from_str(&content)
        .with_context(|| format!("Failed to parse format file: {:?}", path))?;

    Ok(format)
}

/// Problems with an input path, caught before any decoding
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("log file not found: {0:?}")]
    NotFound(PathBuf),

    #[error("expected a .{LOG_EXTENSION} log file, got {0:?}")]
    WrongExtension(PathBuf),
}

/// Check that `path` is an existing tracker log
pub fn validate_input(path: &Path) -> std::result::Result<(), InputError> {
    let is_log = path
        .extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case(LOG_EXTENSION));

    if !is_log {
        return Err(InputError::WrongExtension(path.to_path_buf()));
    }
    if !path.is_file() {
        return Err(InputError::NotFound(path.to_path_buf()));
    }
    Ok(())
}

/// Everything a run needs, after merging config file and flags
#[derive(Debug, Clone)]
pub struct Settings {
    pub files: Vec<PathBuf>,
    pub output: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub output_format: OutputFormat,
    pub suffix: String,
    pub format: FormatDescription,
    pub decoder: DecoderConfig,
    pub workers: usize,
}

/// Command-line values that override the config file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub files: Vec<PathBuf>,
    pub output: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub output_format: Option<OutputFormat>,
    pub format_file: Option<PathBuf>,
    pub pupil_window: Option<usize>,
    pub fail_fast: bool,
    pub workers: Option<usize>,
}

impl Settings {
    /// Merge the config file (if any) with command-line overrides
    pub fn resolve(config: AppConfig, overrides: Overrides) -> Result<Self> {
        let format = match &overrides.format_file {
            Some(path) => load_format(path)?,
            None => config.format.unwrap_or_default(),
        };

        let files = if overrides.files.is_empty() {
            config.input.files
        } else {
            overrides.files
        };

        if overrides.output.is_some() && files.len() > 1 {
            anyhow::bail!("--output needs exactly one input file, got {}", files.len());
        }

        let policy = if overrides.fail_fast {
            FailurePolicy::FailFast
        } else {
            config.decoding.failure_policy.unwrap_or_default()
        };

        let mut decoder = DecoderConfig::new().with_failure_policy(policy);
        if let Some(window) = overrides.pupil_window.or(config.decoding.pupil_window) {
            decoder = decoder.with_pupil_window(window);
        }

        let workers = overrides
            .workers
            .or(config.decoding.workers)
            .unwrap_or_else(rayon::current_num_threads)
            .max(1);

        Ok(Self {
            files,
            output: overrides.output,
            output_dir: overrides.output_dir.or(config.output.output_dir),
            output_format: overrides.output_format.unwrap_or(config.output.format),
            suffix: config.output.suffix,
            format,
            decoder,
            workers,
        })
    }

    /// Output path for one input log: `<stem><suffix>.<ext>`, next to the input by default
    pub fn output_path_for(&self, input: &Path) -> PathBuf {
        if let Some(output) = &self.output {
            return output.clone();
        }

        let stem = input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("trials");
        let name = format!("{}{}.{}", stem, self.suffix, self.output_format.extension());

        match &self.output_dir {
            Some(dir) => dir.join(name),
            None => input.with_file_name(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eyelog_decoder::{FieldSource, FieldSpec};

    #[test]
    fn test_config_deserialization() {
        let toml_content = r#"
            [input]
            files = ["s01.asc", "s02.asc"]

            [output]
            format = "json"
            output_dir = "out"

            [decoding]
            pupil_window = 100
            failure_policy = "fail-fast"
            workers = 2
        "#;

        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.input.files.len(), 2);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(config.output.suffix, "_data");
        assert_eq!(config.decoding.pupil_window, Some(100));
        assert_eq!(config.decoding.failure_policy, Some(FailurePolicy::FailFast));
        assert!(config.format.is_none());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        let settings = Settings::resolve(config, Overrides::default()).unwrap();

        assert_eq!(settings.output_format, OutputFormat::Csv);
        assert_eq!(settings.decoder, DecoderConfig::default());
        assert_eq!(settings.format, FormatDescription::default());
        assert!(settings.workers >= 1);
    }

    #[test]
    fn test_format_table_deserialization() {
        let toml_content = r#"
            [format]
            name = "eyelink-asc"
            version = 2
            end_marker = "TRIAL_END"

            [[format.fields]]
            name = "trial"
            source = { standard = { offset = 2 } }

            [[format.fields]]
            name = "reaction_time"
            token = "RT"
            source = { standard = { offset = 3 } }

            [[format.fields]]
            name = "IMG_DISP_TIME"
            source = "display_time"

            [[format.fields]]
            name = "TRIAL_RESULT"
            source = { result = { offset = 4 } }
        "#;

        let config: AppConfig = toml::from_str(toml_content).unwrap();
        let format = config.format.unwrap();
        assert_eq!(format.version, 2);
        assert_eq!(format.end_marker, "TRIAL_END");
        assert_eq!(format.trial_start_marker, "START\t");
        assert_eq!(format.standard_value_position, 5);
        assert_eq!(format.fields.len(), 4);
        assert_eq!(format.fields[1].identifying_token(), "RT");
        assert_eq!(format.fields[2].source, FieldSource::DisplayTime);
        assert_eq!(format.fields[3], FieldSpec::result("TRIAL_RESULT", 4));
        assert!(format.validate().is_ok());
    }

    #[test]
    fn test_flags_override_config() {
        let mut config = AppConfig::default();
        config.decoding.pupil_window = Some(100);
        config.decoding.workers = Some(8);
        config.output.format = OutputFormat::Json;

        let overrides = Overrides {
            files: vec![PathBuf::from("s01.asc")],
            pupil_window: Some(50),
            fail_fast: true,
            workers: Some(0),
            output_format: Some(OutputFormat::Csv),
            ..Overrides::default()
        };
        let settings = Settings::resolve(config, overrides).unwrap();

        assert_eq!(settings.decoder.pupil_window, 50);
        assert!(settings.decoder.is_fail_fast());
        assert_eq!(settings.workers, 1);
        assert_eq!(settings.output_format, OutputFormat::Csv);
    }

    #[test]
    fn test_single_output_needs_single_input() {
        let overrides = Overrides {
            files: vec![PathBuf::from("a.asc"), PathBuf::from("b.asc")],
            output: Some(PathBuf::from("out.csv")),
            ..Overrides::default()
        };
        assert!(Settings::resolve(AppConfig::default(), overrides).is_err());
    }

    #[test]
    fn test_output_path_naming() {
        let mut settings =
            Settings::resolve(AppConfig::default(), Overrides::default()).unwrap();
        assert_eq!(
            settings.output_path_for(Path::new("data/s01.asc")),
            PathBuf::from("data/s01_data.csv")
        );

        settings.output_dir = Some(PathBuf::from("out"));
        settings.output_format = OutputFormat::Json;
        assert_eq!(
            settings.output_path_for(Path::new("data/s01.asc")),
            PathBuf::from("out/s01_data.json")
        );
    }

    #[test]
    fn test_validate_input() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("s01.ASC");
        fs::write(&log, "** header\n").unwrap();

        assert!(validate_input(&log).is_ok());
        assert!(matches!(
            validate_input(&dir.path().join("s01.edf")),
            Err(InputError::WrongExtension(_))
        ));
        assert!(matches!(
            validate_input(&dir.path().join("missing.asc")),
            Err(InputError::NotFound(_))
        ));
    }
}
