use crate::agent::AssistantOptions;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const FERRY_DIR: &str = ".ferry";
const FERRY_HOME_ENV: &str = "FERRY_HOME";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: Option<String>,
    pub base_url: Option<String>,
    pub model: String,
    pub debug: bool,
    pub max_rounds: Option<usize>,
    pub temperature: Option<f64>,
    #[serde(skip)]
    pub workspace_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            provider: None,
            base_url: None,
            model: "llama3.2".to_string(),
            debug: false,
            max_rounds: None,
            temperature: None,
            workspace_dir: get_ferry_dir().join("workspace"),
        }
    }
}

impl Config {
    pub fn load_or_init() -> Result<Self> {
        if config_exists() {
            load_config()
        } else {
            Ok(Config::default())
        }
    }

    /// Options for an assistant without any tools; callers add their own.
    pub fn to_assistant_options(&self) -> AssistantOptions {
        let options = AssistantOptions::new(self.model.clone()).with_debug(self.debug);
        match self.max_rounds {
            Some(max) => options.with_max_rounds(max),
            None => options,
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(content)?;
        config.workspace_dir = get_ferry_dir().join("workspace");
        Ok(config)
    }
}

/// `$FERRY_HOME`, or `~/.ferry`.
pub fn get_ferry_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(FERRY_HOME_ENV)
        && !dir.is_empty()
    {
        return PathBuf::from(dir);
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(FERRY_DIR)
}

pub fn get_config_path() -> PathBuf {
    get_ferry_dir().join("config.toml")
}

pub fn ensure_ferry_dir() -> Result<PathBuf> {
    let ferry_dir = get_ferry_dir();

    if !ferry_dir.exists() {
        std::fs::create_dir_all(&ferry_dir).with_context(|| {
            format!("Failed to create ferry directory at {}", ferry_dir.display())
        })?;
    }

    Ok(ferry_dir)
}

pub fn load_config() -> Result<Config> {
    let config_path = get_config_path();

    let content = std::fs::read_to_string(&config_path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            anyhow::anyhow!("Config file not found. Run 'ferry init' to set up your configuration.")
        } else {
            anyhow::anyhow!("Failed to read config from {}: {}", config_path.display(), e)
        }
    })?;

    Config::from_toml(&content)
        .with_context(|| format!("Failed to parse config from {}", config_path.display()))
}

pub fn save_config(config: &Config) -> Result<()> {
    ensure_ferry_dir()?;

    let config_path = get_config_path();
    let content =
        toml::to_string_pretty(config).with_context(|| "Failed to serialize config to TOML")?;

    std::fs::write(&config_path, content)
        .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

    Ok(())
}

pub fn config_exists() -> bool {
    get_config_path().exists()
}
