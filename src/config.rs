use crate::project_diff::DEFAULT_LARGE_VALUE_THRESHOLD;
use crate::remote::http::DEFAULT_BASE_URL;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(std::io::Error),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Unsupported config file version: {0}")]
    UnsupportedVersion(u32),
    #[error("Cannot determine home directory; pass --config or set HXUTIL_CONFIG")]
    NoHomeDir,
}

fn io_error(path: &Path, e: std::io::Error) -> ConfigError {
    if e.kind() == std::io::ErrorKind::PermissionDenied {
        ConfigError::PermissionDenied(path.to_path_buf())
    } else {
        ConfigError::Io(e)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct Metadata {
    version: u32,
}

/// Only the metadata table, so the version can be checked before the rest of
/// the file is parsed.
#[derive(Debug, Deserialize)]
struct MetadataOnly {
    metadata: Metadata,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_large_value_threshold() -> usize {
    DEFAULT_LARGE_VALUE_THRESHOLD
}

fn default_diff_timeout_ms() -> u64 {
    1000
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_large_value_threshold")]
    pub large_value_threshold: usize,
    /// Wait for Enter after each difference printed by `action diff`.
    #[serde(default)]
    pub pause_on_diff: bool,
    #[serde(default = "default_diff_timeout_ms")]
    pub diff_timeout_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            large_value_threshold: default_large_value_threshold(),
            pause_on_diff: false,
            diff_timeout_ms: default_diff_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct User {
    pub email: String,
    /// Only ever set by hand in the file. Kept as is when saving.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Project {
    pub p_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login_user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login_user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used_project: Option<String>,
    metadata: Metadata,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub projects: Vec<Project>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            last_login_user: None,
            last_used_project: None,
            metadata: Metadata {
                version: Self::SUPPORTED_VERSION,
            },
            settings: Settings::default(),
            users: Vec::new(),
            projects: Vec::new(),
        }
    }
}

impl Config {
    const SUPPORTED_VERSION: u32 = 1;

    /// `~/.config/hxutil/config.toml`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".config").join("hxutil").join("config.toml"))
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let metadata_only: MetadataOnly = toml::from_str(content)?;
        if metadata_only.metadata.version != Self::SUPPORTED_VERSION {
            return Err(ConfigError::UnsupportedVersion(
                metadata_only.metadata.version,
            ));
        }
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load the config, or an empty one if the file does not exist yet.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Config::default()),
            Err(e) => Err(io_error(path, e)),
        }
    }

    /// Save atomically, creating parent directories as needed.
    ///
    /// Writes to a temporary file, fsyncs it, then renames it into place.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        use std::io::Write;

        let content = self.to_toml()?;

        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;

        let mut temp_file =
            tempfile::NamedTempFile::new_in(parent).map_err(|e| io_error(parent, e))?;
        temp_file
            .write_all(content.as_bytes())
            .map_err(|e| io_error(path, e))?;
        temp_file.as_file().sync_all().map_err(ConfigError::Io)?;
        temp_file
            .persist(path)
            .map_err(|e| io_error(path, e.error))?;

        Ok(())
    }

    /// A copy safe to print, with stored passwords masked.
    pub fn masked(&self) -> Config {
        let mut masked = self.clone();
        for user in &mut masked.users {
            if user.password.is_some() {
                user.password = Some("********".to_string());
            }
        }
        masked
    }

    pub fn user(&self, email: &str) -> Option<&User> {
        self.users.iter().find(|u| u.email == email)
    }

    pub fn project(&self, p_id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.p_id == p_id)
    }

    /// Record a successful login.
    pub fn remember_login(&mut self, email: &str) {
        if self.user(email).is_none() {
            self.users.push(User {
                email: email.to_string(),
                password: None,
            });
        }
        self.last_login_user = Some(email.to_string());
    }

    /// Record that `p_id` was just used by `email`.
    pub fn remember_project(&mut self, p_id: &str, email: &str, now: DateTime<Utc>) {
        let index = match self.projects.iter().position(|p| p.p_id == p_id) {
            Some(index) => index,
            None => {
                self.projects.push(Project {
                    p_id: p_id.to_string(),
                    display_id: None,
                    last_login_user: None,
                    last_used: None,
                });
                self.projects.len() - 1
            }
        };
        let project = &mut self.projects[index];
        project.last_login_user = Some(email.to_string());
        project.last_used = Some(now);
        self.last_used_project = Some(p_id.to_string());
    }
}
