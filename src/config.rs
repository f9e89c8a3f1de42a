use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{IoResultExt, Result};

/// repository configuration stored in .VCS/config.toml
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// branch HEAD points at after init
    #[serde(default = "default_branch")]
    pub default_branch: String,
    /// fallback identity for commits when the caller provides none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Identity>,
}

fn default_branch() -> String {
    "main".to_string()
}

impl Config {
    /// load config from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).with_path(path)?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            crate::Error::InvalidInput(format!("bad config at {}: {}", path.display(), e))
        })?;
        Ok(config)
    }

    /// save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            crate::Error::InvalidInput(format!("unserializable config: {}", e))
        })?;
        std::fs::write(path, content).with_path(path)?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_branch: default_branch(),
            author: None,
        }
    }
}

/// a name/email pair for commit authorship
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub email: String,
}
