use std::path::{Path, PathBuf};

use anyhow::Result;
use directories::{ProjectDirs, UserDirs};

pub const APP_NAME: &str = "feature-shell";
/// The culture every feature is expected to ship strings for.
pub const DEFAULT_CULTURE: &str = "en-us";

const SETTINGS_DIR: &str = "Settings";
const SETTINGS_FILE: &str = "settings.json";
const TEMP_DIR: &str = "Temp";

/// Host-level configuration: where per-user data lives and which language to start in.
#[derive(Debug, Clone)]
pub struct HostConfig {
    pub app_name: String,
    /// User-specific base folder for settings and temporary files.
    pub data_dir: PathBuf,
    /// Initial UI language, e.g. `en-us`. Normalized to lower case.
    pub language: String,
}

impl HostConfig {
    pub fn new(app_name: impl Into<String>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            app_name: app_name.into(),
            data_dir: data_dir.into(),
            language: DEFAULT_CULTURE.to_string(),
        }
    }

    /// Configuration rooted at the platform data directory for [`APP_NAME`].
    pub fn from_defaults() -> Result<Self> {
        let dirs = ProjectDirs::from("", "", APP_NAME)
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        Ok(Self::new(APP_NAME, dirs.data_dir()))
    }

    pub fn with_language(mut self, language: impl AsRef<str>) -> Self {
        self.language = normalize_language(language.as_ref());
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn settings_dir(&self) -> PathBuf {
        self.data_dir.join(SETTINGS_DIR)
    }

    pub fn settings_file(&self) -> PathBuf {
        self.settings_dir().join(SETTINGS_FILE)
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.data_dir.join(TEMP_DIR)
    }

    /// Default location for new projects: `~/<app name>`, or under the data
    /// directory when no home directory is known.
    pub fn projects_dir(&self) -> PathBuf {
        match UserDirs::new() {
            Some(user) => user.home_dir().join(&self.app_name),
            None => self.data_dir.join("Projects"),
        }
    }
}

/// Lower-cases a culture name, falling back to [`DEFAULT_CULTURE`] when blank.
pub fn normalize_language(language: &str) -> String {
    let trimmed = language.trim();
    if trimmed.is_empty() {
        DEFAULT_CULTURE.to_string()
    } else {
        trimmed.to_lowercase()
    }
}
