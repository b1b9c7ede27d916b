use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database_path: PathBuf,
    /// Where unclassified and malformed messages are appended.
    pub rejection_log: PathBuf,
    /// `tracing` filter directive; `RUST_LOG` takes precedence.
    pub log_filter: String,
    /// Optional TOML rule table replacing the built-in classifier rules.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_dir = data_dir();
        AppConfig {
            database_path: data_dir.join("momo.db"),
            rejection_log: data_dir.join("unprocessed_sms.log"),
            log_filter: "info".to_string(),
            rules_path: None,
        }
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "momo", "Momo")
}

fn data_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
}

/// `MOMO_DATABASE_PATH`, `MOMO_REJECTION_LOG`, `MOMO_RULES_PATH`, and
/// `MOMO_LOG` for the log filter.
fn env_provider() -> Env {
    Env::prefixed("MOMO_").map(|key| match key.as_str() {
        "log" => "log_filter".into(),
        other => other.to_string().into(),
    })
}

fn figment(file: Option<&Path>) -> Figment {
    let figment = Figment::new().merge(Serialized::defaults(AppConfig::default()));
    let figment = match file {
        Some(path) => figment.merge(Toml::file(path)),
        None => figment,
    };
    figment.merge(env_provider())
}

impl AppConfig {
    /// Defaults, then the config file, then `MOMO_*` variables.
    ///
    /// An explicitly requested file must exist; the default location is optional.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                bail!("Config file not found: {}", path.display());
            }
        }
        let file = explicit.map(Path::to_path_buf).or_else(default_config_path);
        figment(file.as_deref())
            .extract()
            .context("Failed to load configuration")
    }
}
