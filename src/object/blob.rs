use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::object::{self, ObjectKind, StoreWrite};
use crate::repo::Repo;

/// write a cell value to the object store as a blob
pub fn write_blob(repo: &Repo, content: &[u8]) -> Result<StoreWrite> {
    object::put(repo, ObjectKind::Blob, content)
}

/// read a blob's payload (the cell value, framing stripped)
pub fn read_blob(repo: &Repo, hash: &Hash) -> Result<Vec<u8>> {
    let (kind, payload) = object::get(repo, hash)?;
    if kind != ObjectKind::Blob {
        return Err(Error::CorruptObject(format!(
            "expected blob at {}, found {}",
            hash, kind
        )));
    }
    Ok(payload)
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
    fn test_write_and_read_blob() {
        let (_dir, repo) = test_repo();

        let write = write_blob(&repo, b"=SUM(A1:A9)").unwrap();
        assert_eq!(read_blob(&repo, &write.hash).unwrap(), b"=SUM(A1:A9)");
    }

    #[test]
    fn test_blob_deduplication() {
        let (_dir, repo) = test_repo();

        let w1 = write_blob(&repo, b"duplicate value").unwrap();
        let w2 = write_blob(&repo, b"duplicate value").unwrap();
        assert_eq!(w1.hash, w2.hash);
    }

    #[test]
    fn test_read_blob_rejects_other_kinds() {
        let (_dir, repo) = test_repo();

        let write = object::put(&repo, ObjectKind::Tree, b"").unwrap();
        assert!(matches!(
            read_blob(&repo, &write.hash),
            Err(Error::CorruptObject(_))
        ));
    }
}
