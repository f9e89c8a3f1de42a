use std::collections::BTreeMap;

use tracing::warn;

use crate::cell::CellRef;
use crate::error::Result;
use crate::hash::Hash;
use crate::index::IndexEntry;
use crate::object::{self, read_blob};
use crate::object::tree::read_tree;
use crate::repo::Repo;

/// one cell found in a commit tree
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellRecord {
    pub cell: CellRef,
    pub blob_hash: Hash,
}

/// enumerate every cell reachable from a tree
///
/// blob leaves whose path does not parse as workbook/sheet/cell are
/// skipped with a warning, as are entries with unknown modes.
pub fn entries_at(repo: &Repo, tree_hash: &Hash) -> Result<Vec<CellRecord>> {
    let mut records = Vec::new();
    collect(repo, tree_hash, "", &mut records)?;
    Ok(records)
}

fn collect(repo: &Repo, tree_hash: &Hash, prefix: &str, out: &mut Vec<CellRecord>) -> Result<()> {
    let tree = read_tree(repo, tree_hash)?;

    for entry in tree.entries() {
        let path = if prefix.is_empty() {
            entry.name.clone()
        } else {
            format!("{}/{}", prefix, entry.name)
        };

        if entry.is_tree() {
            collect(repo, &entry.hash, &path, out)?;
        } else if entry.is_blob() {
            match CellRef::from_tree_path(&path) {
                Ok(cell) => out.push(CellRecord {
                    cell,
                    blob_hash: entry.hash,
                }),
                Err(e) => warn!(path = %path, error = %e, "skipping malformed cell path"),
            }
        } else {
            warn!(mode = %entry.mode, path = %path, "ignoring tree entry with unknown mode");
        }
    }

    Ok(())
}

/// map of tree path -> blob hash for every cell under a tree
pub fn cell_map(repo: &Repo, tree_hash: &Hash) -> Result<BTreeMap<String, Hash>> {
    Ok(entries_at(repo, tree_hash)?
        .into_iter()
        .map(|r| (r.cell.tree_path(), r.blob_hash))
        .collect())
}

/// paths whose blob differs between two trees (either side may be
/// absent entirely), sorted
pub fn changed_paths(repo: &Repo, a: Option<&Hash>, b: Option<&Hash>) -> Result<Vec<String>> {
    let map_a = match a {
        Some(hash) => cell_map(repo, hash)?,
        None => BTreeMap::new(),
    };
    let map_b = match b {
        Some(hash) => cell_map(repo, hash)?,
        None => BTreeMap::new(),
    };

    let mut changed = Vec::new();
    for (path, blob) in &map_a {
        if map_b.get(path) != Some(blob) {
            changed.push(path.clone());
        }
    }
    for path in map_b.keys() {
        if !map_a.contains_key(path) {
            changed.push(path.clone());
        }
    }

    changed.sort();
    Ok(changed)
}

/// rebuild an index entry for an already-stored blob
///
/// sizes come from the stored object: the payload length and the
/// on-disk compressed length.
pub(crate) fn index_entry_for(
    repo: &Repo,
    cell: &CellRef,
    blob_hash: Hash,
    timestamp: u64,
) -> Result<(IndexEntry, Vec<u8>)> {
    let payload = read_blob(repo, &blob_hash)?;
    let entry = IndexEntry {
        workbook_id: cell.workbook_id.clone(),
        sheet_number: cell.sheet_number,
        row_letters: cell.row_letters.clone(),
        col_number: cell.col_number,
        blob_hash,
        timestamp,
        original_size: payload.len() as u64,
        compressed_size: object::stored_size(repo, &blob_hash)?,
    };
    Ok((entry, payload))
}
