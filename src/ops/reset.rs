use tracing::warn;

use crate::error::Result;
use crate::hash::Hash;
use crate::object::commit::read_commit;
use crate::ops::{resolve_commit, unix_now, walk};
use crate::refs;
use crate::repo::Repo;
use crate::workbook::WorkbookStore;

/// result of a hard reset
#[derive(Clone, Debug)]
pub struct HardResetOutcome {
    pub target: Hash,
    /// cells written back to the workbook store and re-staged
    pub restored: usize,
    /// cells that failed and were skipped
    pub skipped: usize,
}

/// result of a soft reset
#[derive(Clone, Debug)]
pub struct SoftResetOutcome {
    pub target: Hash,
    /// paths that differ between the old head and the target
    /// (informational; nothing was rewritten)
    pub changed_paths: Vec<String>,
}

/// hard reset: move the current branch ref to `target`, rewrite the
/// workbook store to the target's tree, and rebuild the index from it
///
/// restoration is best-effort per cell: a failing cell is logged and
/// skipped, and the ref still advances.
pub fn hard_reset(
    repo: &Repo,
    store: &mut dyn WorkbookStore,
    target: &str,
) -> Result<HardResetOutcome> {
    let target = resolve_commit(repo, target)?;
    let commit = read_commit(repo, &target)?;
    let records = walk::entries_at(repo, &commit.tree)?;

    repo.index().clear()?;

    let now = unix_now();
    let mut entries = Vec::new();
    let mut skipped = 0usize;
    for record in records {
        match restore_cell(repo, store, &record, now) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                warn!(cell = %record.cell, error = %e, "skipping cell during hard reset");
                skipped += 1;
            }
        }
    }

    let restored = entries.len();
    repo.index().stage_all(entries)?;
    refs::advance_head(repo, &target)?;

    Ok(HardResetOutcome {
        target,
        restored,
        skipped,
    })
}

/// soft reset: move the current branch ref to `target` only
///
/// the index and the workbook store are untouched; the returned path
/// set describes what a hard reset would have rewritten.
pub fn soft_reset(repo: &Repo, target: &str) -> Result<SoftResetOutcome> {
    let target = resolve_commit(repo, target)?;
    let target_tree = read_commit(repo, &target)?.tree;

    let head_tree = match refs::read_head(repo)? {
        Some(head) => Some(read_commit(repo, &head)?.tree),
        None => None,
    };
    let changed_paths = walk::changed_paths(repo, head_tree.as_ref(), Some(&target_tree))?;

    refs::advance_head(repo, &target)?;

    Ok(SoftResetOutcome {
        target,
        changed_paths,
    })
}

fn restore_cell(
    repo: &Repo,
    store: &mut dyn WorkbookStore,
    record: &walk::CellRecord,
    timestamp: u64,
) -> Result<crate::index::IndexEntry> {
    let (entry, payload) = walk::index_entry_for(repo, &record.cell, record.blob_hash, timestamp)?;

    let value = std::str::from_utf8(&payload).map_err(|_| {
        crate::Error::CorruptObject(format!("non-utf8 cell value in {}", record.blob_hash))
    })?;
    store.write_cell(
        &record.cell.workbook_id,
        record.cell.sheet_number,
        &record.cell.row_letters,
        record.cell.col_number,
        value,
    )?;

    Ok(entry)
}
