use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;

use crate::error::{Error, IoResultExt, Result};
use crate::hash::Hash;
use crate::repo::Repo;

const HEAD_REF_PREFIX: &str = "ref: refs/heads/";

/// what HEAD points at
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HeadTarget {
    /// attached: HEAD names a branch under refs/heads/
    Branch(String),
    /// detached: HEAD holds a commit hash directly
    Detached(Hash),
}

/// write a branch ref (create or update)
pub fn write_branch(repo: &Repo, name: &str, hash: &Hash) -> Result<()> {
    validate_branch_name(name)?;
    atomic_write(repo, branch_path(repo, name), format!("{}\n", hash.to_hex()))
}

/// read a branch ref, `None` if the branch does not exist yet
pub fn read_branch(repo: &Repo, name: &str) -> Result<Option<Hash>> {
    validate_branch_name(name)?;
    let path = branch_path(repo, name);

    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(Error::Io { path, source }),
    };

    parse_ref_hash(content.trim())
        .map(Some)
        .map_err(|_| Error::CorruptObject(format!("malformed branch ref: {}", name)))
}

/// list all branches, sorted
pub fn list_branches(repo: &Repo) -> Result<Vec<String>> {
    let heads = repo.heads_path();
    let mut names = Vec::new();

    if heads.is_dir() {
        for entry in fs::read_dir(&heads).with_path(&heads)? {
            let entry = entry.with_path(&heads)?;
            if entry.path().is_file() {
                names.push(entry.file_name().to_string_lossy().to_string());
            }
        }
    }

    names.sort();
    Ok(names)
}

/// point HEAD at a branch (attached)
pub fn write_head_symbolic(repo: &Repo, branch: &str) -> Result<()> {
    validate_branch_name(branch)?;
    atomic_write(repo, repo.head_path(), format!("{}{}\n", HEAD_REF_PREFIX, branch))
}

/// point HEAD at a commit directly (detached)
pub fn write_head_detached(repo: &Repo, hash: &Hash) -> Result<()> {
    atomic_write(repo, repo.head_path(), format!("{}\n", hash.to_hex()))
}

/// read what HEAD points at
pub fn read_head_target(repo: &Repo) -> Result<HeadTarget> {
    let path = repo.head_path();
    let content = fs::read_to_string(&path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::NotFound("HEAD".to_string())
        } else {
            Error::Io { path: path.clone(), source: e }
        }
    })?;

    let line = content.trim();
    if let Some(branch) = line.strip_prefix(HEAD_REF_PREFIX) {
        if branch.is_empty() {
            return Err(Error::CorruptObject("malformed HEAD: empty branch".to_string()));
        }
        return Ok(HeadTarget::Branch(branch.to_string()));
    }

    parse_ref_hash(line)
        .map(HeadTarget::Detached)
        .map_err(|_| Error::CorruptObject("malformed HEAD".to_string()))
}

/// resolve HEAD to a commit hash, `None` before the first commit
pub fn read_head(repo: &Repo) -> Result<Option<Hash>> {
    match read_head_target(repo)? {
        HeadTarget::Branch(name) => read_branch(repo, &name),
        HeadTarget::Detached(hash) => Ok(Some(hash)),
    }
}

/// the branch HEAD is attached to, `None` when detached
pub fn current_branch(repo: &Repo) -> Result<Option<String>> {
    match read_head_target(repo)? {
        HeadTarget::Branch(name) => Ok(Some(name)),
        HeadTarget::Detached(_) => Ok(None),
    }
}

/// move the current head to a new commit
///
/// attached HEAD advances the branch file; detached HEAD is rewritten
/// in place.
pub fn advance_head(repo: &Repo, hash: &Hash) -> Result<()> {
    match read_head_target(repo)? {
        HeadTarget::Branch(name) => write_branch(repo, &name, hash),
        HeadTarget::Detached(_) => write_head_detached(repo, hash),
    }
}

/// filesystem path for a branch ref
fn branch_path(repo: &Repo, name: &str) -> PathBuf {
    repo.heads_path().join(name)
}

fn parse_ref_hash(line: &str) -> Result<Hash> {
    Hash::from_hex(line)
}

/// atomic write: temp in .VCS/tmp -> fsync -> rename
fn atomic_write(repo: &Repo, target: PathBuf, content: String) -> Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).with_path(parent)?;
    }

    let tmp_path = repo.tmp_path().join(uuid::Uuid::new_v4().to_string());
    {
        let mut tmp_file = File::create(&tmp_path).with_path(&tmp_path)?;
        tmp_file.write_all(content.as_bytes()).with_path(&tmp_path)?;
        tmp_file.sync_all().with_path(&tmp_path)?;
    }

    fs::rename(&tmp_path, &target).with_path(&target)?;
    Ok(())
}

/// validate a branch name
fn validate_branch_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidInput("empty branch name".to_string()));
    }

    if name.contains('/') || name.contains('\0') {
        return Err(Error::InvalidInput(format!(
            "branch name cannot contain '/' or null: {}",
            name
        )));
    }

    if name == "." || name == ".." {
        return Err(Error::InvalidInput(format!("reserved branch name: {}", name)));
    }

    Ok(())
}
