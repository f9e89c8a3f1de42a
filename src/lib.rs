//! cellvault - cell-granular version control for spreadsheet workbooks
//!
//! a content-addressed store that versions individual cell values the
//! way git versions files: values become compressed blobs, cells are
//! grouped into workbook/sheet/cell trees, and commits chain into a
//! history reachable from a branch ref.
//!
//! # Core concepts
//!
//! - **Blob**: one cell's value, zlib-compressed under its SHA-1
//! - **Tree**: a directory object over workbooks, sheets and cells
//! - **Commit**: a snapshot of a root tree with authorship metadata
//! - **Index**: the staged cell changes that form the next commit
//! - **HEAD / branches**: movable pointers into the commit chain
//!
//! # Wire format
//!
//! every object is stored as `zlib("<type> <len>\0<payload>")` under
//! `.VCS/objects/<hh>/<rest>`, addressed by the SHA-1 of the framed,
//! uncompressed bytes.
//!
//! # Example usage
//!
//! ```no_run
//! use cellvault::{ops, MemoryWorkbookStore, Repo, WorkbookStore};
//! use std::path::Path;
//!
//! let repo = Repo::init(Path::new("/path/to/book")).unwrap();
//!
//! let mut workbooks = MemoryWorkbookStore::new();
//! workbooks.write_cell("wb1", 1, "A", 1, "Hello").unwrap();
//!
//! ops::stage(&repo, &workbooks, "wb1", 1, "A", 1).unwrap();
//! let outcome = ops::commit(&repo, "initial snapshot", "Alice", "alice@example.com").unwrap();
//! println!("committed {}", outcome.commit_hash);
//! ```

mod compress;
mod config;
mod error;
mod hash;
mod repo;

pub mod cell;
pub mod index;
pub mod object;
pub mod ops;
pub mod refs;
pub mod workbook;

pub use cell::{letters_to_number, number_to_letters, CellRef};
pub use compress::{deflate, inflate};
pub use config::{Config, Identity};
pub use error::{Error, Result};
pub use hash::{frame, frame_and_hash, Hash};
pub use index::{IndexEntry, IndexStats, StageStatus, StagingIndex};
pub use object::{Commit, ObjectKind, Signature, Tree, TreeEntry};
pub use refs::HeadTarget;
pub use repo::Repo;
pub use workbook::{MemoryWorkbookStore, WorkbookStore};
