//! the public operations: staging, committing, history and rollback

pub mod commit;
pub mod log;
pub mod preview;
pub mod reset;
pub mod revert;
pub mod stage;
pub mod status;
pub mod walk;

pub use commit::{commit, CommitOutcome};
pub use log::{commit_info, history, CommitInfo, HISTORY_LIMIT_MAX};
pub use preview::{preview_rollback, RollbackKind, RollbackPreview};
pub use reset::{hard_reset, soft_reset, HardResetOutcome, SoftResetOutcome};
pub use revert::{cherry_pick, revert};
pub use stage::{stage, stage_batch, StageOutcome};
pub use status::{status, Status};
pub use walk::{entries_at, CellRecord};

use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::object;
use crate::repo::Repo;

/// seconds since the unix epoch
pub(crate) fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// resolve a rollback target: a 40-hex commit hash that exists in the
/// object store
pub(crate) fn resolve_commit(repo: &Repo, target: &str) -> Result<Hash> {
    let hash = Hash::from_hex(target.trim())?;
    if !object::exists(repo, &hash) {
        return Err(Error::NotFound(format!("commit {}", hash)));
    }
    Ok(hash)
}
