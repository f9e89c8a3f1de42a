use crate::error::Result;
use crate::ops::log::{commit_info, CommitInfo};
use crate::refs;
use crate::repo::Repo;

/// summary of the staging area and the current head
#[derive(Clone, Debug)]
pub struct Status {
    pub staged: usize,
    pub clean: bool,
    /// tree paths of the staged cells, oldest staged first
    pub staged_files: Vec<String>,
    pub last_commit: Option<CommitInfo>,
}

/// report the staging area and last commit
pub fn status(repo: &Repo) -> Result<Status> {
    let entries = repo.index().list()?;
    let staged_files: Vec<String> = entries.iter().map(|e| e.tree_path()).collect();

    let last_commit = match refs::read_head(repo)? {
        Some(hash) => Some(commit_info(repo, &hash)?),
        None => None,
    };

    Ok(Status {
        staged: entries.len(),
        clean: entries.is_empty(),
        staged_files,
        last_commit,
    })
}
