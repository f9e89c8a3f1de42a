use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{Error, IoResultExt, Result};
use crate::index::StagingIndex;
use crate::refs;

/// name of the repository directory under the root
pub const VCS_DIR: &str = ".VCS";

/// a cellvault repository
///
/// the `.VCS/` directory is process-wide shared state; this handle is
/// the single point through which all paths under it are derived.
pub struct Repo {
    root: PathBuf,
    config: Config,
    index: StagingIndex,
}

impl Repo {
    /// initialize a new repository at the given root
    pub fn init(root: &Path) -> Result<Self> {
        let vcs = root.join(VCS_DIR);
        if vcs.exists() {
            return Err(Error::InvalidInput(format!(
                "repository already exists at {}",
                root.display()
            )));
        }

        // create directory structure
        std::fs::create_dir_all(vcs.join("objects")).with_path(&vcs)?;
        std::fs::create_dir_all(vcs.join("refs/heads")).with_path(&vcs)?;
        std::fs::create_dir_all(vcs.join("tmp")).with_path(&vcs)?;

        let config = Config::default();
        config.save(&vcs.join("config.toml"))?;

        let repo = Self {
            root: root.to_path_buf(),
            index: StagingIndex::new(vcs.join("index")),
            config,
        };

        // HEAD starts attached to the (not yet existing) default branch
        let branch = repo.config.default_branch.clone();
        refs::write_head_symbolic(&repo, &branch)?;

        Ok(repo)
    }

    /// open an existing repository
    pub fn open(root: &Path) -> Result<Self> {
        let vcs = root.join(VCS_DIR);
        if !vcs.is_dir() {
            return Err(Error::NotFound(format!(
                "no repository at {}",
                root.display()
            )));
        }

        let config_path = vcs.join("config.toml");
        let config = if config_path.exists() {
            Config::load(&config_path)?
        } else {
            Config::default()
        };

        Ok(Self {
            root: root.to_path_buf(),
            index: StagingIndex::new(vcs.join("index")),
            config,
        })
    }

    /// repository root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// repository configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// the staging index
    pub fn index(&self) -> &StagingIndex {
        &self.index
    }

    /// path to the .VCS directory
    pub fn vcs_path(&self) -> PathBuf {
        self.root.join(VCS_DIR)
    }

    /// path to the objects directory
    pub fn objects_path(&self) -> PathBuf {
        self.vcs_path().join("objects")
    }

    /// path to the branch refs directory
    pub fn heads_path(&self) -> PathBuf {
        self.vcs_path().join("refs/heads")
    }

    /// path to the HEAD file
    pub fn head_path(&self) -> PathBuf {
        self.vcs_path().join("HEAD")
    }

    /// path to the staging index file
    pub fn index_path(&self) -> PathBuf {
        self.vcs_path().join("index")
    }

    /// path to config.toml
    pub fn config_path(&self) -> PathBuf {
        self.vcs_path().join("config.toml")
    }

    /// path to the tmp directory (for atomic writes)
    pub fn tmp_path(&self) -> PathBuf {
        self.vcs_path().join("tmp")
    }
}
