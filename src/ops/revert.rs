use crate::error::{Error, Result};
use crate::object::commit::read_commit;
use crate::ops::commit::{commit, CommitOutcome};
use crate::ops::{resolve_commit, unix_now, walk};
use crate::repo::Repo;

/// create a commit undoing `target`
///
/// every path whose blob `target` changed or deleted is staged back at
/// its parent's version, then committed. paths `target` added stay in
/// place: the staging index has no deletion marker to express their
/// removal.
pub fn revert(repo: &Repo, target: &str, author: &str, email: &str) -> Result<CommitOutcome> {
    let target_hash = resolve_commit(repo, target)?;
    let target_commit = read_commit(repo, &target_hash)?;
    let parent_hash = target_commit
        .parent
        .ok_or_else(|| Error::NotFound(format!("parent of commit {}", target_hash)))?;
    let parent_commit = read_commit(repo, &parent_hash)?;

    let target_map = walk::cell_map(repo, &target_commit.tree)?;
    let parent_map = walk::cell_map(repo, &parent_commit.tree)?;

    repo.index().clear()?;

    let now = unix_now();
    let mut entries = Vec::new();
    for (path, parent_blob) in &parent_map {
        if target_map.get(path) == Some(parent_blob) {
            continue;
        }
        // changed or deleted by the target: restore the parent version
        let cell = crate::cell::CellRef::from_tree_path(path)?;
        let (entry, _payload) = walk::index_entry_for(repo, &cell, *parent_blob, now)?;
        entries.push(entry);
    }

    if entries.is_empty() {
        return Err(Error::Empty);
    }
    repo.index().stage_all(entries)?;

    let message = format!(
        "Revert \"{}\"\n\nThis reverts commit {}.",
        target_commit.summary(),
        target_hash
    );
    commit(repo, &message, author, email)
}

/// replay the snapshot of `target` as a new commit on top of HEAD
pub fn cherry_pick(repo: &Repo, target: &str, author: &str, email: &str) -> Result<CommitOutcome> {
    let target_hash = resolve_commit(repo, target)?;
    let target_commit = read_commit(repo, &target_hash)?;
    if target_commit.parent.is_none() {
        return Err(Error::NotFound(format!("parent of commit {}", target_hash)));
    }

    let records = walk::entries_at(repo, &target_commit.tree)?;

    repo.index().clear()?;

    let now = unix_now();
    let mut entries = Vec::new();
    for record in records {
        let (entry, _payload) = walk::index_entry_for(repo, &record.cell, record.blob_hash, now)?;
        entries.push(entry);
    }

    if entries.is_empty() {
        return Err(Error::Empty);
    }
    repo.index().stage_all(entries)?;

    let message = format!(
        "{}\n\n(cherry picked from commit {})",
        target_commit.message, target_hash
    );
    commit(repo, &message, author, email)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::commit::CommitOutcome;
    use crate::ops::history;
    use crate::ops::stage::stage;
    use crate::refs;
    use crate::workbook::{MemoryWorkbookStore, WorkbookStore};
    use tempfile::tempdir;

    fn setup() -> (tempfile::TempDir, Repo, MemoryWorkbookStore) {
        let dir = tempdir().unwrap();
        let repo = Repo::init(&dir.path().join("book")).unwrap();
        let store = MemoryWorkbookStore::new();
        (dir, repo, store)
    }

    fn commit_value(repo: &Repo, store: &mut MemoryWorkbookStore, value: &str, msg: &str) -> CommitOutcome {
        store.write_cell("wb1", 1, "A", 1, value).unwrap();
        stage(repo, store, "wb1", 1, "A", 1).unwrap();
        crate::ops::commit::commit(repo, msg, "Alice", "alice@x").unwrap()
    }

    #[test]
    fn test_revert_restores_parent_tree() {
        let (_dir, repo, mut store) = setup();

        let first = commit_value(&repo, &mut store, "Hello", "init");
        let second = commit_value(&repo, &mut store, "World", "update");

        let reverted = revert(&repo, &second.commit_hash.to_hex(), "Bob", "bob@x").unwrap();

        // the revert commit's tree equals the first commit's tree
        assert_eq!(reverted.tree_hash, first.tree_hash);
        assert_eq!(reverted.parent_hash, Some(second.commit_hash));
        assert_eq!(refs::read_head(&repo).unwrap(), Some(reverted.commit_hash));

        // message references the reverted commit
        let info = crate::ops::commit_info(&repo, &reverted.commit_hash).unwrap();
        assert!(info.message.starts_with("Revert \"update\""));
        assert!(info
            .message
            .contains(&format!("This reverts commit {}.", second.commit_hash)));
    }

    #[test]
    fn test_revert_initial_commit_fails() {
        let (_dir, repo, mut store) = setup();

        let first = commit_value(&repo, &mut store, "Hello", "init");

        assert!(matches!(
            revert(&repo, &first.commit_hash.to_hex(), "Bob", "bob@x"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_revert_restores_deleted_cells() {
        let (_dir, repo, mut store) = setup();

        // first commit: two cells
        store.write_cell("wb1", 1, "A", 1, "keep").unwrap();
        store.write_cell("wb1", 1, "B", 2, "victim").unwrap();
        stage(&repo, &store, "wb1", 1, "A", 1).unwrap();
        stage(&repo, &store, "wb1", 1, "B", 2).unwrap();
        crate::ops::commit::commit(&repo, "both", "Alice", "alice@x").unwrap();

        // second commit: only A (B dropped from the snapshot)
        stage(&repo, &store, "wb1", 1, "A", 1).unwrap();
        store.write_cell("wb1", 1, "A", 1, "keep2").unwrap();
        stage(&repo, &store, "wb1", 1, "A", 1).unwrap();
        let second = crate::ops::commit::commit(&repo, "dropped B", "Alice", "alice@x").unwrap();

        let reverted = revert(&repo, &second.commit_hash.to_hex(), "Bob", "bob@x").unwrap();

        // B2 is staged back at its old value in the revert commit's tree
        let records = crate::ops::entries_at(&repo, &reverted.tree_hash).unwrap();
        let paths: Vec<_> = records.iter().map(|r| r.cell.tree_path()).collect();
        assert!(paths.contains(&"wb1/1/B2".to_string()));
        assert!(paths.contains(&"wb1/1/A1".to_string()));
    }

    #[test]
    fn test_revert_of_pure_addition_is_empty() {
        let (_dir, repo, mut store) = setup();

        commit_value(&repo, &mut store, "Hello", "init");

        // second commit adds a new cell and keeps A1 identical
        stage(&repo, &store, "wb1", 1, "A", 1).unwrap();
        store.write_cell("wb1", 1, "B", 2, "added").unwrap();
        stage(&repo, &store, "wb1", 1, "B", 2).unwrap();
        let second = crate::ops::commit::commit(&repo, "add B", "Alice", "alice@x").unwrap();

        // no deletion marker exists, so there is nothing to stage
        assert!(matches!(
            revert(&repo, &second.commit_hash.to_hex(), "Bob", "bob@x"),
            Err(Error::Empty)
        ));
    }

    #[test]
    fn test_cherry_pick_replays_snapshot() {
        let (_dir, repo, mut store) = setup();

        commit_value(&repo, &mut store, "Hello", "init");
        let second = commit_value(&repo, &mut store, "World", "picked change");
        let third = commit_value(&repo, &mut store, "Other", "drift");

        let picked = cherry_pick(&repo, &second.commit_hash.to_hex(), "Bob", "bob@x").unwrap();

        // the new commit sits on top of the old head
        assert_eq!(picked.parent_hash, Some(third.commit_hash));
        // and reproduces the picked snapshot
        assert_eq!(picked.tree_hash, second.tree_hash);

        let info = crate::ops::commit_info(&repo, &picked.commit_hash).unwrap();
        assert!(info.message.starts_with("picked change"));
        assert!(info
            .message
            .contains(&format!("(cherry picked from commit {})", second.commit_hash)));

        assert_eq!(history(&repo, 10).unwrap().len(), 4);
    }

    #[test]
    fn test_cherry_pick_root_commit_fails() {
        let (_dir, repo, mut store) = setup();

        let first = commit_value(&repo, &mut store, "Hello", "init");
        commit_value(&repo, &mut store, "World", "update");

        assert!(matches!(
            cherry_pick(&repo, &first.commit_hash.to_hex(), "Bob", "bob@x"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_revert_then_workbook_unchanged() {
        let (_dir, repo, mut store) = setup();

        commit_value(&repo, &mut store, "Hello", "init");
        let second = commit_value(&repo, &mut store, "World", "update");

        revert(&repo, &second.commit_hash.to_hex(), "Bob", "bob@x").unwrap();

        // revert moves history, not the workbook store
        assert_eq!(store.read_cell("wb1", 1, "A", 1).unwrap(), "World");
    }
}
