use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::object::commit::{read_commit, Signature};
use crate::refs;
use crate::repo::Repo;

/// largest accepted history limit
pub const HISTORY_LIMIT_MAX: usize = 100;

/// a commit with its hash, for history output
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitInfo {
    pub hash: Hash,
    pub tree: Hash,
    pub parent: Option<Hash>,
    pub author: Signature,
    pub message: String,
}

/// read one commit's metadata
pub fn commit_info(repo: &Repo, hash: &Hash) -> Result<CommitInfo> {
    let commit = read_commit(repo, hash)?;
    Ok(CommitInfo {
        hash: *hash,
        tree: commit.tree,
        parent: commit.parent,
        author: commit.author,
        message: commit.message,
    })
}

/// walk the commit chain from HEAD, newest first
///
/// follows `parent` links until the chain ends or `limit` entries are
/// collected. an unborn HEAD yields an empty history.
pub fn history(repo: &Repo, limit: usize) -> Result<Vec<CommitInfo>> {
    if limit < 1 || limit > HISTORY_LIMIT_MAX {
        return Err(Error::InvalidInput(format!(
            "history limit must be 1..={}, got {}",
            HISTORY_LIMIT_MAX, limit
        )));
    }

    let mut entries = Vec::new();
    let mut cursor = refs::read_head(repo)?;

    while let Some(hash) = cursor {
        if entries.len() >= limit {
            break;
        }
        let info = commit_info(repo, &hash)?;
        cursor = info.parent;
        entries.push(info);
    }

    Ok(entries)
}

impl std::fmt::Display for CommitInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "commit {}", self.hash)?;
        writeln!(f, "Author: {} <{}>", self.author.name, self.author.email)?;

        let date = chrono::DateTime::from_timestamp(self.author.timestamp as i64, 0)
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S %z").to_string())
            .unwrap_or_else(|| self.author.timestamp.to_string());
        writeln!(f, "Date:   {}", date)?;

        writeln!(f)?;
        for line in self.message.lines() {
            writeln!(f, "    {}", line)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::commit::commit;
    use crate::ops::stage::stage;
    use crate::workbook::{MemoryWorkbookStore, WorkbookStore};
    use tempfile::tempdir;

    fn setup() -> (tempfile::TempDir, Repo, MemoryWorkbookStore) {
        let dir = tempdir().unwrap();
        let repo = Repo::init(&dir.path().join("book")).unwrap();
        let mut store = MemoryWorkbookStore::new();
        store.write_cell("wb1", 1, "A", 1, "v0").unwrap();
        (dir, repo, store)
    }

    fn commit_value(repo: &Repo, store: &mut MemoryWorkbookStore, value: &str, msg: &str) {
        store.write_cell("wb1", 1, "A", 1, value).unwrap();
        stage(repo, store, "wb1", 1, "A", 1).unwrap();
        commit(repo, msg, "Alice", "alice@x").unwrap();
    }

    #[test]
    fn test_history_empty_repo() {
        let (_dir, repo, _store) = setup();
        assert!(history(&repo, 10).unwrap().is_empty());
    }

    #[test]
    fn test_history_single_commit() {
        let (_dir, repo, mut store) = setup();
        commit_value(&repo, &mut store, "v1", "first");

        let entries = history(&repo, 10).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "first");
        assert!(entries[0].parent.is_none());
    }

    #[test]
    fn test_history_newest_first() {
        let (_dir, repo, mut store) = setup();
        commit_value(&repo, &mut store, "v1", "first");
        commit_value(&repo, &mut store, "v2", "second");
        commit_value(&repo, &mut store, "v3", "third");

        let messages: Vec<_> = history(&repo, 10)
            .unwrap()
            .iter()
            .map(|e| e.message.clone())
            .collect();
        assert_eq!(messages, vec!["third", "second", "first"]);
    }

    #[test]
    fn test_history_respects_limit() {
        let (_dir, repo, mut store) = setup();
        for i in 0..5 {
            commit_value(&repo, &mut store, &format!("v{}", i), &format!("commit {}", i));
        }

        assert_eq!(history(&repo, 2).unwrap().len(), 2);
    }

    #[test]
    fn test_history_limit_bounds() {
        let (_dir, repo, _store) = setup();
        assert!(matches!(history(&repo, 0), Err(Error::InvalidInput(_))));
        assert!(matches!(history(&repo, 101), Err(Error::InvalidInput(_))));
        assert!(history(&repo, 100).is_ok());
    }

    #[test]
    fn test_parent_links_chain() {
        let (_dir, repo, mut store) = setup();
        commit_value(&repo, &mut store, "v1", "first");
        commit_value(&repo, &mut store, "v2", "second");

        let entries = history(&repo, 10).unwrap();
        assert_eq!(entries[0].parent, Some(entries[1].hash));
    }

    #[test]
    fn test_display_format() {
        let (_dir, repo, mut store) = setup();
        commit_value(&repo, &mut store, "v1", "display me");

        let text = format!("{}", history(&repo, 1).unwrap()[0]);
        assert!(text.contains("commit "));
        assert!(text.contains("Author: Alice <alice@x>"));
        assert!(text.contains("    display me"));
    }
}
