use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub service: Option<ServiceConfig>,
    pub paths: Option<PathsConfig>,
    pub charts: Option<ChartsConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub concurrency: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathsConfig {
    pub input_dir: Option<String>,
    pub output_dir: Option<String>,
    pub tei_dir: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChartsConfig {
    pub font_path: Option<String>,
    pub max_words: Option<usize>,
    pub seed: Option<u64>,
}

/// Platform config directory path: `<config_dir>/grobid-harvest/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("grobid-harvest").join("config.toml"))
}

/// Load config by cascading CWD `.grobid-harvest.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".grobid-harvest.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparsable config file");
            None
        }
    }
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    ConfigFile {
        service: Some(ServiceConfig {
            url: overlay
                .service
                .as_ref()
                .and_then(|s| s.url.clone())
                .or_else(|| base.service.as_ref().and_then(|s| s.url.clone())),
            timeout_secs: overlay
                .service
                .as_ref()
                .and_then(|s| s.timeout_secs)
                .or_else(|| base.service.as_ref().and_then(|s| s.timeout_secs)),
            concurrency: overlay
                .service
                .as_ref()
                .and_then(|s| s.concurrency)
                .or_else(|| base.service.as_ref().and_then(|s| s.concurrency)),
        }),
        paths: Some(PathsConfig {
            input_dir: overlay
                .paths
                .as_ref()
                .and_then(|p| p.input_dir.clone())
                .or_else(|| base.paths.as_ref().and_then(|p| p.input_dir.clone())),
            output_dir: overlay
                .paths
                .as_ref()
                .and_then(|p| p.output_dir.clone())
                .or_else(|| base.paths.as_ref().and_then(|p| p.output_dir.clone())),
            tei_dir: overlay
                .paths
                .as_ref()
                .and_then(|p| p.tei_dir.clone())
                .or_else(|| base.paths.as_ref().and_then(|p| p.tei_dir.clone())),
        }),
        charts: Some(ChartsConfig {
            font_path: overlay
                .charts
                .as_ref()
                .and_then(|c| c.font_path.clone())
                .or_else(|| base.charts.as_ref().and_then(|c| c.font_path.clone())),
            max_words: overlay
                .charts
                .as_ref()
                .and_then(|c| c.max_words)
                .or_else(|| base.charts.as_ref().and_then(|c| c.max_words)),
            seed: overlay
                .charts
                .as_ref()
                .and_then(|c| c.seed)
                .or_else(|| base.charts.as_ref().and_then(|c| c.seed)),
        }),
    }
}
