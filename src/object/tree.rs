use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::object::{self, ObjectKind};
use crate::repo::Repo;

/// mode token for a subtree entry
pub const MODE_TREE: &str = "40000";
/// mode token for a blob entry
pub const MODE_BLOB: &str = "100644";

/// a single entry in a tree
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeEntry {
    pub mode: String,
    pub name: String,
    pub hash: Hash,
}

impl TreeEntry {
    /// create a subtree entry
    pub fn subtree(name: impl Into<String>, hash: Hash) -> Self {
        Self {
            mode: MODE_TREE.to_string(),
            name: name.into(),
            hash,
        }
    }

    /// create a blob entry
    pub fn blob(name: impl Into<String>, hash: Hash) -> Self {
        Self {
            mode: MODE_BLOB.to_string(),
            name: name.into(),
            hash,
        }
    }

    /// is this entry a subtree
    pub fn is_tree(&self) -> bool {
        self.mode == MODE_TREE
    }

    /// is this entry a blob
    pub fn is_blob(&self) -> bool {
        self.mode == MODE_BLOB
    }
}

/// a tree object: ordered (mode, name, hash) entries
///
/// children are sorted with subtrees first, ties broken by name. the
/// payload is the binary form `"<mode> <name>\0"` followed by the raw
/// 20-byte hash, per entry, with no separator or trailing newline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tree {
    entries: Vec<TreeEntry>,
}

impl Tree {
    /// create a new tree, validating names and sorting entries
    pub fn new(mut entries: Vec<TreeEntry>) -> Result<Self> {
        let mut seen = HashSet::new();
        for entry in &entries {
            validate_entry_name(&entry.name)?;
            if !seen.insert(entry.name.clone()) {
                return Err(Error::InvalidInput(format!(
                    "duplicate tree entry name: {}",
                    entry.name
                )));
            }
        }

        entries.sort_by(|a, b| match (a.is_tree(), b.is_tree()) {
            (true, false) => std::cmp::Ordering::Less,
            (false, true) => std::cmp::Ordering::Greater,
            _ => a.name.as_bytes().cmp(b.name.as_bytes()),
        });

        Ok(Self { entries })
    }

    /// create an empty tree
    pub fn empty() -> Self {
        Self { entries: vec![] }
    }

    /// get entries slice
    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    /// look up entry by name
    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// is tree empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// serialize to the binary tree payload
    pub fn to_payload(&self) -> Vec<u8> {
        let mut payload = Vec::new();
        for entry in &self.entries {
            payload.extend_from_slice(entry.mode.as_bytes());
            payload.push(b' ');
            payload.extend_from_slice(entry.name.as_bytes());
            payload.push(0);
            payload.extend_from_slice(entry.hash.as_bytes());
        }
        payload
    }

    /// parse a binary tree payload
    ///
    /// modes are not interpreted here; unknown modes are kept so the
    /// walker can decide what to skip.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let mut entries = Vec::new();
        let mut rest = payload;

        while !rest.is_empty() {
            let space = rest
                .iter()
                .position(|&b| b == b' ')
                .ok_or_else(|| Error::CorruptObject("tree entry missing mode".to_string()))?;
            let mode = std::str::from_utf8(&rest[..space])
                .map_err(|_| Error::CorruptObject("non-utf8 tree mode".to_string()))?;
            if mode.is_empty() {
                return Err(Error::CorruptObject("empty tree mode".to_string()));
            }
            rest = &rest[space + 1..];

            let nul = rest
                .iter()
                .position(|&b| b == 0)
                .ok_or_else(|| Error::CorruptObject("tree entry missing name".to_string()))?;
            let name = std::str::from_utf8(&rest[..nul])
                .map_err(|_| Error::CorruptObject("non-utf8 tree name".to_string()))?;
            if name.is_empty() {
                return Err(Error::CorruptObject("empty tree entry name".to_string()));
            }
            rest = &rest[nul + 1..];

            if rest.len() < 20 {
                return Err(Error::CorruptObject("truncated tree entry hash".to_string()));
            }
            let mut raw = [0u8; 20];
            raw.copy_from_slice(&rest[..20]);
            rest = &rest[20..];

            entries.push(TreeEntry {
                mode: mode.to_string(),
                name: name.to_string(),
                hash: Hash::from_bytes(raw),
            });
        }

        Ok(Self { entries })
    }
}

/// write a tree to the object store
pub fn write_tree(repo: &Repo, tree: &Tree) -> Result<Hash> {
    let write = object::put(repo, ObjectKind::Tree, &tree.to_payload())?;
    Ok(write.hash)
}

/// read a tree from the object store
pub fn read_tree(repo: &Repo, hash: &Hash) -> Result<Tree> {
    let (kind, payload) = object::get(repo, hash)?;
    if kind != ObjectKind::Tree {
        return Err(Error::CorruptObject(format!(
            "expected tree at {}, found {}",
            hash, kind
        )));
    }
    Tree::parse(&payload)
}

/// validate an entry name
fn validate_entry_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidInput("empty tree entry name".to_string()));
    }
    if name.contains('/') {
        return Err(Error::InvalidInput(format!("tree entry name contains '/': {}", name)));
    }
    if name.contains('\0') {
        return Err(Error::InvalidInput(format!("tree entry name contains null: {}", name)));
    }
    if name == "." || name == ".." {
        return Err(Error::InvalidInput(format!("reserved tree entry name: {}", name)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn test_repo() -> (tempfile::TempDir, Repo) {
        let dir = tempdir().unwrap();
        let root = dir.path().join("book");
        let repo = Repo::init(&root).unwrap();
        (dir, repo)
    }

    fn hash_n(n: u8) -> Hash {
        Hash::from_bytes([n; 20])
    }

    #[test]
    fn test_tree_sorting_directories_first() {
        let entries = vec![
            TreeEntry::blob("A1", hash_n(1)),
            TreeEntry::subtree("9", hash_n(2)),
            TreeEntry::blob("B2", hash_n(3)),
            TreeEntry::subtree("0", hash_n(4)),
        ];
        let tree = Tree::new(entries).unwrap();

        let order: Vec<_> = tree.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(order, vec!["0", "9", "A1", "B2"]);
        assert!(tree.entries()[0].is_tree());
        assert!(tree.entries()[1].is_tree());
        assert!(tree.entries()[2].is_blob());
    }

    #[test]
    fn test_tree_rejects_bad_names() {
        for bad in ["", "a/b", "a\0b", ".", ".."] {
            let entries = vec![TreeEntry::blob(bad, hash_n(1))];
            assert!(Tree::new(entries).is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_tree_rejects_duplicates() {
        let entries = vec![
            TreeEntry::blob("same", hash_n(1)),
            TreeEntry::subtree("same", hash_n(2)),
        ];
        assert!(Tree::new(entries).is_err());
    }

    #[test]
    fn test_payload_layout() {
        let tree = Tree::new(vec![TreeEntry::blob("A1", hash_n(7))]).unwrap();
        let payload = tree.to_payload();

        let mut expected = Vec::new();
        expected.extend_from_slice(b"100644 A1\0");
        expected.extend_from_slice(&[7u8; 20]);
        assert_eq!(payload, expected);
    }

    #[test]
    fn test_payload_parse_roundtrip() {
        let tree = Tree::new(vec![
            TreeEntry::subtree("1", hash_n(1)),
            TreeEntry::blob("A1", hash_n(2)),
            TreeEntry::blob("B2", hash_n(3)),
        ])
        .unwrap();

        let parsed = Tree::parse(&tree.to_payload()).unwrap();
        assert_eq!(parsed, tree);
    }

    #[test]
    fn test_parse_empty_payload() {
        let tree = Tree::parse(b"").unwrap();
        assert!(tree.is_empty());
    }

    #[test]
    fn test_parse_keeps_unknown_modes() {
        let mut payload = Vec::new();
        payload.extend_from_slice(b"120000 link\0");
        payload.extend_from_slice(&[9u8; 20]);

        let tree = Tree::parse(&payload).unwrap();
        assert_eq!(tree.entries()[0].mode, "120000");
        assert!(!tree.entries()[0].is_tree());
        assert!(!tree.entries()[0].is_blob());
    }

    #[test]
    fn test_parse_rejects_truncation() {
        let tree = Tree::new(vec![TreeEntry::blob("A1", hash_n(7))]).unwrap();
        let payload = tree.to_payload();

        assert!(Tree::parse(&payload[..payload.len() - 1]).is_err());
        assert!(Tree::parse(b"100644 A1").is_err()); // no NUL
        assert!(Tree::parse(b"nomode").is_err()); // no space
    }

    #[test]
    fn test_write_and_read_tree() {
        let (_dir, repo) = test_repo();

        let tree = Tree::new(vec![
            TreeEntry::subtree("1", hash_n(1)),
            TreeEntry::blob("A1", hash_n(2)),
        ])
        .unwrap();

        let hash = write_tree(&repo, &tree).unwrap();
        let read_back = read_tree(&repo, &hash).unwrap();
        assert_eq!(read_back, tree);
    }

    #[test]
    fn test_tree_hash_is_deterministic() {
        let (_dir, repo) = test_repo();

        // entry order at construction does not affect the stored hash
        let t1 = Tree::new(vec![
            TreeEntry::blob("A1", hash_n(1)),
            TreeEntry::blob("B2", hash_n(2)),
        ])
        .unwrap();
        let t2 = Tree::new(vec![
            TreeEntry::blob("B2", hash_n(2)),
            TreeEntry::blob("A1", hash_n(1)),
        ])
        .unwrap();

        assert_eq!(write_tree(&repo, &t1).unwrap(), write_tree(&repo, &t2).unwrap());
    }

    #[test]
    fn test_read_tree_rejects_other_kinds() {
        let (_dir, repo) = test_repo();

        let write = object::put(&repo, ObjectKind::Blob, b"not a tree").unwrap();
        assert!(matches!(
            read_tree(&repo, &write.hash),
            Err(Error::CorruptObject(_))
        ));
    }
}
