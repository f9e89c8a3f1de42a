use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::index::IndexEntry;
use crate::object::commit::{write_commit, Commit, Signature};
use crate::object::tree::{write_tree, Tree, TreeEntry};
use crate::ops::unix_now;
use crate::refs;
use crate::repo::Repo;

/// result of a successful commit
#[derive(Clone, Debug)]
pub struct CommitOutcome {
    pub commit_hash: Hash,
    pub tree_hash: Hash,
    pub parent_hash: Option<Hash>,
    /// branch the ref advance went to, `"HEAD"` when detached
    pub branch: String,
    pub staged_files: usize,
    pub timestamp: u64,
}

/// record the staged entries as a commit
///
/// materializes the workbook/sheet/cell tree from the index, writes the
/// commit object, advances the current branch ref, and clears the
/// index. object writes happen before the ref advance, which happens
/// before the clear; a crash in between leaves only unreachable
/// objects.
pub fn commit(repo: &Repo, message: &str, author: &str, email: &str) -> Result<CommitOutcome> {
    let message = message.trim();
    if message.is_empty() {
        return Err(Error::InvalidInput("empty commit message".to_string()));
    }
    let author = author.trim();
    if author.is_empty() {
        return Err(Error::InvalidInput("empty author name".to_string()));
    }
    let email = email.trim();
    if !email.contains('@') {
        return Err(Error::InvalidInput(format!("email missing '@': {}", email)));
    }

    let entries = repo.index().list()?;
    if entries.is_empty() {
        return Err(Error::Empty);
    }

    let tree_hash = write_tree_from_entries(repo, &entries)?;
    let parent_hash = refs::read_head(repo)?;
    let timestamp = unix_now();

    let signature = Signature::new(author, email, timestamp);
    let commit = Commit {
        tree: tree_hash,
        parent: parent_hash,
        author: signature.clone(),
        committer: signature,
        message: message.to_string(),
    };

    let commit_hash = write_commit(repo, &commit)?;
    refs::advance_head(repo, &commit_hash)?;
    repo.index().clear()?;

    let branch = refs::current_branch(repo)?.unwrap_or_else(|| "HEAD".to_string());

    Ok(CommitOutcome {
        commit_hash,
        tree_hash,
        parent_hash,
        branch,
        staged_files: entries.len(),
        timestamp,
    })
}

/// build the nested workbook/sheet/cell trees bottom-up and return the
/// root tree hash
pub(crate) fn write_tree_from_entries(repo: &Repo, entries: &[IndexEntry]) -> Result<Hash> {
    // workbook -> sheet -> cell address -> blob
    let mut books: BTreeMap<&str, BTreeMap<u32, BTreeMap<String, Hash>>> = BTreeMap::new();
    for entry in entries {
        books
            .entry(entry.workbook_id.as_str())
            .or_default()
            .entry(entry.sheet_number)
            .or_default()
            .insert(entry.cell().address(), entry.blob_hash);
    }

    let mut root_children = Vec::new();
    for (workbook, sheets) in books {
        let mut workbook_children = Vec::new();
        for (sheet, cells) in sheets {
            let leaves = cells
                .into_iter()
                .map(|(address, blob)| TreeEntry::blob(address, blob))
                .collect();
            let sheet_hash = write_tree(repo, &Tree::new(leaves)?)?;
            workbook_children.push(TreeEntry::subtree(sheet.to_string(), sheet_hash));
        }
        let workbook_hash = write_tree(repo, &Tree::new(workbook_children)?)?;
        root_children.push(TreeEntry::subtree(workbook, workbook_hash));
    }

    write_tree(repo, &Tree::new(root_children)?)
}
