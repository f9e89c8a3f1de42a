//! the content-addressed object store
//!
//! every object is stored as the zlib-compressed bytes of
//! `"<type> <len>\0<payload>"` under `objects/<hh>/<rest>`, where the
//! path components come from the SHA-1 of the framed (uncompressed)
//! form. objects are write-once; writing an existing hash is a no-op.

pub mod blob;
pub mod commit;
pub mod tree;

pub use blob::{read_blob, write_blob};
pub use commit::{read_commit, write_commit, Commit, Signature};
pub use tree::{read_tree, write_tree, Tree, TreeEntry, MODE_BLOB, MODE_TREE};

use std::fmt;
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;

use crate::compress::{deflate, inflate};
use crate::error::{Error, IoResultExt, Result};
use crate::hash::{frame_and_hash, Hash};
use crate::repo::Repo;

/// the kind of a stored object
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectKind {
    Blob,
    Tree,
    Commit,
}

impl ObjectKind {
    /// the type token used in the object header
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectKind::Blob => "blob",
            ObjectKind::Tree => "tree",
            ObjectKind::Commit => "commit",
        }
    }

    /// parse a header type token
    pub fn from_token(token: &str) -> Result<Self> {
        match token {
            "blob" => Ok(ObjectKind::Blob),
            "tree" => Ok(ObjectKind::Tree),
            "commit" => Ok(ObjectKind::Commit),
            other => Err(Error::CorruptObject(format!("unknown object type: {}", other))),
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// result of storing an object
#[derive(Clone, Copy, Debug)]
pub struct StoreWrite {
    pub hash: Hash,
    /// payload length before framing and compression
    pub original_size: u64,
    /// on-disk (compressed) length
    pub compressed_size: u64,
}

/// filesystem path for an object
pub fn object_path(repo: &Repo, hash: &Hash) -> PathBuf {
    let (dir, file) = hash.to_path_components();
    repo.objects_path().join(dir).join(file)
}

/// check whether an object exists in the store
pub fn exists(repo: &Repo, hash: &Hash) -> bool {
    object_path(repo, hash).exists()
}

/// store an object, returning its hash and sizes
///
/// writing a hash that already exists skips the write entirely.
pub fn put(repo: &Repo, kind: ObjectKind, payload: &[u8]) -> Result<StoreWrite> {
    let (framed, hash) = frame_and_hash(kind.as_str(), payload)?;

    let path = object_path(repo, &hash);
    if path.exists() {
        let meta = fs::metadata(&path).with_path(&path)?;
        return Ok(StoreWrite {
            hash,
            original_size: payload.len() as u64,
            compressed_size: meta.len(),
        });
    }

    let compressed = deflate(&framed)?;

    let parent = path.parent().expect("object path has a fanout parent");
    fs::create_dir_all(parent).with_path(parent)?;

    // atomic write: temp -> fsync -> rename
    let tmp_path = repo.tmp_path().join(uuid::Uuid::new_v4().to_string());
    {
        let mut tmp_file = File::create(&tmp_path).with_path(&tmp_path)?;
        tmp_file.write_all(&compressed).with_path(&tmp_path)?;
        tmp_file.sync_all().with_path(&tmp_path)?;
    }
    fs::rename(&tmp_path, &path).with_path(&path)?;

    Ok(StoreWrite {
        hash,
        original_size: payload.len() as u64,
        compressed_size: compressed.len() as u64,
    })
}

/// read an object back as (kind, payload)
pub fn get(repo: &Repo, hash: &Hash) -> Result<(ObjectKind, Vec<u8>)> {
    let path = object_path(repo, hash);

    let compressed = fs::read(&path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::NotFound(format!("object {}", hash))
        } else {
            Error::Io { path: path.clone(), source: e }
        }
    })?;

    let framed = inflate(&compressed)?;

    // verify the content address before trusting the framing
    if Hash::of(&framed) != *hash {
        return Err(Error::CorruptObject(format!("hash mismatch for {}", hash)));
    }

    let nul = framed
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| Error::CorruptObject(format!("missing header in {}", hash)))?;

    let header = std::str::from_utf8(&framed[..nul])
        .map_err(|_| Error::CorruptObject(format!("non-utf8 header in {}", hash)))?;
    let (token, len_digits) = header
        .split_once(' ')
        .ok_or_else(|| Error::CorruptObject(format!("bad header in {}", hash)))?;

    let kind = ObjectKind::from_token(token)?;
    let declared_len: usize = len_digits
        .parse()
        .map_err(|_| Error::CorruptObject(format!("bad length in {}", hash)))?;

    let payload = &framed[nul + 1..];
    if payload.len() != declared_len {
        return Err(Error::CorruptObject(format!(
            "length mismatch for {}: header says {}, found {}",
            hash,
            declared_len,
            payload.len()
        )));
    }

    Ok((kind, payload.to_vec()))
}

/// on-disk (compressed) size of an existing object
pub fn stored_size(repo: &Repo, hash: &Hash) -> Result<u64> {
    let path = object_path(repo, hash);
    let meta = fs::metadata(&path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::NotFound(format!("object {}", hash))
        } else {
            Error::Io { path: path.clone(), source: e }
        }
    })?;
    Ok(meta.len())
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

    #[test]
    fn test_put_get_roundtrip() {
        let (_dir, repo) = test_repo();

        for kind in [ObjectKind::Blob, ObjectKind::Tree, ObjectKind::Commit] {
            let payload = format!("payload for {}", kind).into_bytes();
            let write = put(&repo, kind, &payload).unwrap();
            let (read_kind, read_payload) = get(&repo, &write.hash).unwrap();
            assert_eq!(read_kind, kind);
            assert_eq!(read_payload, payload);
        }
    }

    #[test]
    fn test_put_is_idempotent() {
        let (_dir, repo) = test_repo();

        let w1 = put(&repo, ObjectKind::Blob, b"same bytes").unwrap();
        let w2 = put(&repo, ObjectKind::Blob, b"same bytes").unwrap();

        assert_eq!(w1.hash, w2.hash);
        assert_eq!(w1.compressed_size, w2.compressed_size);
    }

    #[test]
    fn test_put_reports_sizes() {
        let (_dir, repo) = test_repo();

        let write = put(&repo, ObjectKind::Blob, b"Hello").unwrap();
        assert_eq!(write.original_size, 5);
        assert_eq!(write.compressed_size, stored_size(&repo, &write.hash).unwrap());
    }

    #[test]
    fn test_fanout_layout() {
        let (_dir, repo) = test_repo();

        let write = put(&repo, ObjectKind::Blob, b"laid out").unwrap();
        let hex = write.hash.to_hex();
        let expected = repo.objects_path().join(&hex[..2]).join(&hex[2..]);
        assert!(expected.is_file());
    }

    #[test]
    fn test_exists() {
        let (_dir, repo) = test_repo();

        let write = put(&repo, ObjectKind::Blob, b"here").unwrap();
        assert!(exists(&repo, &write.hash));
        assert!(!exists(&repo, &Hash::ZERO));
    }

    #[test]
    fn test_get_missing_object() {
        let (_dir, repo) = test_repo();
        assert!(matches!(get(&repo, &Hash::ZERO), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_get_rejects_uncompressed_file() {
        let (_dir, repo) = test_repo();

        let write = put(&repo, ObjectKind::Blob, b"will be clobbered").unwrap();
        fs::write(object_path(&repo, &write.hash), b"raw garbage").unwrap();

        assert!(matches!(get(&repo, &write.hash), Err(Error::CorruptObject(_))));
    }

    #[test]
    fn test_get_rejects_hash_mismatch() {
        let (_dir, repo) = test_repo();

        // a valid object stored under the wrong name
        let w1 = put(&repo, ObjectKind::Blob, b"original").unwrap();
        let w2 = put(&repo, ObjectKind::Blob, b"impostor").unwrap();
        fs::copy(object_path(&repo, &w2.hash), object_path(&repo, &w1.hash)).unwrap();

        assert!(matches!(get(&repo, &w1.hash), Err(Error::CorruptObject(_))));
    }

    #[test]
    fn test_kind_tokens() {
        assert_eq!(ObjectKind::Blob.as_str(), "blob");
        assert_eq!(ObjectKind::from_token("tree").unwrap(), ObjectKind::Tree);
        assert!(matches!(
            ObjectKind::from_token("tag"),
            Err(Error::CorruptObject(_))
        ));
    }

    #[test]
    fn test_empty_payload_frames_as_zero_length() {
        let (_dir, repo) = test_repo();

        let write = put(&repo, ObjectKind::Blob, b"").unwrap();
        let (kind, payload) = get(&repo, &write.hash).unwrap();
        assert_eq!(kind, ObjectKind::Blob);
        assert!(payload.is_empty());

        // identity is the hash of "blob 0\0"
        let (framed, expected) = crate::hash::frame_and_hash("blob", b"").unwrap();
        assert_eq!(framed, b"blob 0\0");
        assert_eq!(write.hash, expected);
    }
}
