use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use harvest_core::DEFAULT_GROBID_URL;
use harvest_core::config_file::ConfigFile;

pub const DEFAULT_INPUT_DIR: &str = "papers";
pub const DEFAULT_OUTPUT_DIR: &str = "grobid_output";
pub const DEFAULT_MAX_WORDS: usize = 200;
pub const DEFAULT_SEED: u64 = 42;

/// Flags of the `run` subcommand. Env-backed flags are filled in by clap.
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Directory containing the PDFs to process [default: papers]
    #[arg(short, long, env = "HARVEST_INPUT_DIR")]
    pub input: Option<PathBuf>,

    /// Directory the reports are written to [default: grobid_output]
    #[arg(short, long, env = "HARVEST_OUTPUT_DIR")]
    pub output: Option<PathBuf>,

    /// GROBID full-text endpoint
    #[arg(long, env = "GROBID_URL")]
    pub grobid_url: Option<String>,

    /// Number of PDFs in flight at once [default: 1]
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Per-request timeout in seconds (no timeout by default)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Keep every TEI response under <output>/tei
    #[arg(long)]
    pub keep_tei: bool,

    /// Keep every TEI response in this directory
    #[arg(long)]
    pub tei_dir: Option<PathBuf>,

    /// TrueType font for the word cloud and chart
    #[arg(long, env = "HARVEST_FONT")]
    pub font: Option<PathBuf>,

    /// Seed for word cloud placement and colours [default: 42]
    #[arg(long)]
    pub seed: Option<u64>,

    /// Maximum number of words in the word cloud [default: 200]
    #[arg(long)]
    pub max_words: Option<usize>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Don't check that GROBID is alive before starting
    #[arg(long)]
    pub skip_health_check: bool,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub grobid_url: String,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub tei_dir: Option<PathBuf>,
    pub concurrency: usize,
    pub timeout: Option<Duration>,
    pub font: Option<PathBuf>,
    pub max_words: usize,
    pub seed: u64,
}

/// GROBID endpoint: flag or env, then config file, then the local default.
pub fn resolve_url(flag: Option<String>, file: &ConfigFile) -> String {
    flag.or_else(|| file.service.as_ref().and_then(|s| s.url.clone()))
        .unwrap_or_else(|| DEFAULT_GROBID_URL.to_string())
}

impl Settings {
    /// Resolve: CLI flag > env var > config file > default.
    pub fn resolve(args: &RunArgs, file: &ConfigFile) -> Self {
        let service = file.service.clone().unwrap_or_default();
        let paths = file.paths.clone().unwrap_or_default();
        let charts = file.charts.clone().unwrap_or_default();

        let output_dir = args
            .output
            .clone()
            .or_else(|| paths.output_dir.map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

        let tei_dir = args
            .tei_dir
            .clone()
            .or_else(|| args.keep_tei.then(|| output_dir.join("tei")))
            .or_else(|| paths.tei_dir.map(PathBuf::from));

        Self {
            grobid_url: resolve_url(args.grobid_url.clone(), file),
            input_dir: args
                .input
                .clone()
                .or_else(|| paths.input_dir.map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT_DIR)),
            output_dir,
            tei_dir,
            concurrency: args.concurrency.or(service.concurrency).unwrap_or(1).max(1),
            timeout: args
                .timeout
                .or(service.timeout_secs)
                .map(Duration::from_secs),
            font: args
                .font
                .clone()
                .or_else(|| charts.font_path.map(PathBuf::from)),
            max_words: args
                .max_words
                .or(charts.max_words)
                .unwrap_or(DEFAULT_MAX_WORDS),
            seed: args.seed.or(charts.seed).unwrap_or(DEFAULT_SEED),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvest_core::config_file::{ChartsConfig, PathsConfig, ServiceConfig};

    #[test]
    fn defaults_without_flags_or_config() {
        let s = Settings::resolve(&RunArgs::default(), &ConfigFile::default());
        assert_eq!(s.grobid_url, DEFAULT_GROBID_URL);
        assert_eq!(s.input_dir, PathBuf::from("papers"));
        assert_eq!(s.output_dir, PathBuf::from("grobid_output"));
        assert_eq!(s.tei_dir, None);
        assert_eq!(s.concurrency, 1);
        assert_eq!(s.timeout, None);
        assert_eq!(s.font, None);
        assert_eq!(s.max_words, 200);
        assert_eq!(s.seed, 42);
    }

    #[test]
    fn config_file_fills_unset_flags() {
        let file = ConfigFile {
            service: Some(ServiceConfig {
                url: Some("http://grobid:8070/api/processFulltextDocument".into()),
                timeout_secs: Some(90),
                concurrency: Some(4),
            }),
            paths: Some(PathsConfig {
                input_dir: Some("in".into()),
                output_dir: None,
                tei_dir: Some("tei-cache".into()),
            }),
            charts: Some(ChartsConfig {
                font_path: Some("/fonts/a.ttf".into()),
                max_words: Some(50),
                seed: Some(7),
            }),
        };
        let args = RunArgs {
            output: Some("out".into()),
            seed: Some(1),
            ..RunArgs::default()
        };
        let s = Settings::resolve(&args, &file);
        assert_eq!(s.grobid_url, "http://grobid:8070/api/processFulltextDocument");
        assert_eq!(s.input_dir, PathBuf::from("in"));
        assert_eq!(s.output_dir, PathBuf::from("out"));
        assert_eq!(s.tei_dir, Some(PathBuf::from("tei-cache")));
        assert_eq!(s.concurrency, 4);
        assert_eq!(s.timeout, Some(Duration::from_secs(90)));
        assert_eq!(s.font, Some(PathBuf::from("/fonts/a.ttf")));
        assert_eq!(s.max_words, 50);
        assert_eq!(s.seed, 1);
    }

    #[test]
    fn keep_tei_goes_under_output() {
        let args = RunArgs {
            output: Some("out".into()),
            keep_tei: true,
            ..RunArgs::default()
        };
        let s = Settings::resolve(&args, &ConfigFile::default());
        assert_eq!(s.tei_dir, Some(PathBuf::from("out").join("tei")));

        let args = RunArgs {
            keep_tei: true,
            tei_dir: Some("elsewhere".into()),
            ..RunArgs::default()
        };
        let s = Settings::resolve(&args, &ConfigFile::default());
        assert_eq!(s.tei_dir, Some(PathBuf::from("elsewhere")));
    }

    #[test]
    fn zero_concurrency_means_sequential() {
        let args = RunArgs {
            concurrency: Some(0),
            ..RunArgs::default()
        };
        assert_eq!(Settings::resolve(&args, &ConfigFile::default()).concurrency, 1);
    }

    #[test]
    fn ping_url_resolution() {
        assert_eq!(resolve_url(None, &ConfigFile::default()), DEFAULT_GROBID_URL);
        assert_eq!(
            resolve_url(Some("http://x/api/processFulltextDocument".into()), &ConfigFile::default()),
            "http://x/api/processFulltextDocument"
        );
    }
}
