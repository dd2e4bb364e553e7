use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::PathBuf};

/// Environment variable holding the account username. Name inherited from
/// the original deployment scripts.
pub const USERNAME_VAR: &str = "WEATHERXMUSERNAME";

/// Environment variable holding the account password.
pub const PASSWORD_VAR: &str = "WEATHERXMPASSWORD";

fn default_base_url() -> String {
    "https://api.weatherxm.com".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./output")
}

/// WeatherXM account credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Top-level configuration, constructed once at startup.
///
/// Loaded from an optional TOML file in the platform config directory,
/// with credentials overridable through the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Account credentials; `None` until `wxm configure` has run or the
    /// environment supplies them.
    pub credentials: Option<Credentials>,

    /// Base URL of the WeatherXM API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Directory the exporter writes dated JSON files into.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            credentials: None,
            base_url: default_base_url(),
            output_dir: default_output_dir(),
        }
    }
}

impl Config {
    /// Return the configured credentials, or an error with a setup hint.
    pub fn credentials(&self) -> Result<&Credentials> {
        self.credentials.as_ref().ok_or_else(|| {
            anyhow!(
                "No WeatherXM credentials configured.\n\
                 Hint: run `wxm configure`, or set {USERNAME_VAR} and {PASSWORD_VAR} in the environment."
            )
        })
    }

    /// Load config from disk and apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut cfg = Self::load_file()?;
        cfg.apply_env_overrides(std::env::vars());
        Ok(cfg)
    }

    /// Load config from disk, or return the defaults if no file exists yet.
    fn load_file() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Replace file-stored credentials with ones from the environment, when
    /// both variables are present and non-empty.
    pub fn apply_env_overrides(&mut self, vars: impl IntoIterator<Item = (String, String)>) {
        let vars: HashMap<String, String> = vars.into_iter().collect();

        let username = vars.get(USERNAME_VAR).filter(|v| !v.is_empty());
        let password = vars.get(PASSWORD_VAR).filter(|v| !v.is_empty());

        if let (Some(username), Some(password)) = (username, password) {
            self.credentials = Some(Credentials {
                username: username.clone(),
                password: password.clone(),
            });
        }
    }

    pub fn set_credentials(&mut self, username: String, password: String) {
        self.credentials = Some(Credentials { username, password });
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "wxm", "wxm-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
