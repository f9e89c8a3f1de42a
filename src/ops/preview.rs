use std::str::FromStr;

use crate::error::{Error, Result};
use crate::ops::log::{commit_info, CommitInfo};
use crate::ops::{resolve_commit, walk};
use crate::refs;
use crate::repo::Repo;

/// the rollback operation being previewed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RollbackKind {
    HardReset,
    SoftReset,
    Revert,
    CherryPick,
}

impl RollbackKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RollbackKind::HardReset => "hard_reset",
            RollbackKind::SoftReset => "soft_reset",
            RollbackKind::Revert => "revert",
            RollbackKind::CherryPick => "cherry_pick",
        }
    }

    /// does this kind rewrite state beyond the ref
    pub fn is_destructive(self) -> bool {
        matches!(self, RollbackKind::HardReset | RollbackKind::Revert)
    }
}

impl FromStr for RollbackKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "hard_reset" | "hard-reset" => Ok(RollbackKind::HardReset),
            "soft_reset" | "soft-reset" => Ok(RollbackKind::SoftReset),
            "revert" => Ok(RollbackKind::Revert),
            "cherry_pick" | "cherry-pick" => Ok(RollbackKind::CherryPick),
            other => Err(Error::InvalidInput(format!("unknown rollback kind: {}", other))),
        }
    }
}

/// what a rollback would touch, without performing it
#[derive(Clone, Debug)]
pub struct RollbackPreview {
    pub kind: RollbackKind,
    pub destructive: bool,
    pub current: CommitInfo,
    pub target: CommitInfo,
    /// union of paths that differ between the two trees
    pub touched_paths: Vec<String>,
}

/// preview a rollback of the given kind against HEAD
pub fn preview_rollback(repo: &Repo, target: &str, kind: &str) -> Result<RollbackPreview> {
    let kind: RollbackKind = kind.parse()?;

    let target_hash = resolve_commit(repo, target)?;
    let head_hash = refs::read_head(repo)?
        .ok_or_else(|| Error::NotFound("HEAD has no commit".to_string()))?;

    let current = commit_info(repo, &head_hash)?;
    let target_info = commit_info(repo, &target_hash)?;

    let touched_paths = walk::changed_paths(repo, Some(&current.tree), Some(&target_info.tree))?;

    Ok(RollbackPreview {
        kind,
        destructive: kind.is_destructive(),
        current,
        target: target_info,
        touched_paths,
    })
}
