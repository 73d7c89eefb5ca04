// Configuration
// Read from `config.toml` in the platform config directory. Every field is
// optional; a missing or broken file gives the defaults.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::snapshot::Mode;

const QUALIFIER: &str = "net";
const ORGANIZATION: &str = "format-copier";
const APPLICATION: &str = "format-copier";
const CONFIG_FILE_NAME: &str = "config.toml";
const STORE_FILE_NAME: &str = "storage.json";

pub const DEFAULT_HOST: &str = "mail.google.com";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Mode used by the context menu and by the CLI without `--words`
    pub mode: Mode,
    /// URL substrings of pages where commands are honoured
    pub hosts: Vec<String>,
    pub store_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            mode: Mode::Classic,
            hosts: vec![DEFAULT_HOST.to_string()],
            store_path: None,
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
}

pub fn config_file_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

pub fn default_store_path() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_local_dir().join(STORE_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(STORE_FILE_NAME))
}

impl Config {
    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Load `path`, or the default location when `None`
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path.map(Path::to_path_buf).or_else(config_file_path) else {
            return Config::default();
        };
        let Ok(contents) = fs::read_to_string(&path) else {
            debug!("no config at {}", path.display());
            return Config::default();
        };
        match Config::parse(&contents) {
            Ok(config) => config,
            Err(err) => {
                warn!("ignoring config file {}: {err}", path.display());
                Config::default()
            }
        }
    }

    pub fn store_path(&self) -> PathBuf {
        self.store_path.clone().unwrap_or_else(default_store_path)
    }

    /// Whether commands should run on a page at `url`
    pub fn allows(&self, url: &str) -> bool {
        self.hosts.iter().any(|host| url.contains(host.as_str()))
    }
}
