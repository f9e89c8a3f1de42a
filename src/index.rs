//! the staging index
//!
//! a durable map of pending cell changes at `.VCS/index`, stored as a
//! pretty-printed JSON object keyed `"<workbook>:<sheet>:<ROW>:<col>"`.
//! all operations run a load/modify/save cycle under a process-wide
//! readers-writer lock; saves go to a sibling temp file and are renamed
//! into place.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cell::CellRef;
use crate::error::{IoResultExt, Result};
use crate::hash::Hash;

/// a staged cell change
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub workbook_id: String,
    pub sheet_number: u32,
    pub row_letters: String,
    pub col_number: u32,
    pub blob_hash: Hash,
    /// seconds since epoch at staging time
    pub timestamp: u64,
    pub original_size: u64,
    pub compressed_size: u64,
}

impl IndexEntry {
    /// the cell this entry stages
    pub fn cell(&self) -> CellRef {
        CellRef {
            workbook_id: self.workbook_id.clone(),
            sheet_number: self.sheet_number,
            row_letters: self.row_letters.clone(),
            col_number: self.col_number,
        }
    }

    /// the index key for this entry
    pub fn key(&self) -> String {
        self.cell().index_key()
    }

    /// the commit-tree path for this entry
    pub fn tree_path(&self) -> String {
        self.cell().tree_path()
    }
}

/// outcome of staging one cell
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageStatus {
    Added,
    Updated,
    Unchanged,
}

impl StageStatus {
    /// did this stage call change the index
    pub fn staged(self) -> bool {
        !matches!(self, StageStatus::Unchanged)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StageStatus::Added => "added",
            StageStatus::Updated => "updated",
            StageStatus::Unchanged => "unchanged",
        }
    }
}

/// aggregate numbers over the staged entries
#[derive(Clone, Debug, PartialEq)]
pub struct IndexStats {
    pub staged: usize,
    pub per_workbook: BTreeMap<String, usize>,
    pub original_bytes: u64,
    pub compressed_bytes: u64,
    /// compressed / original, 0 when nothing is staged
    pub ratio: f64,
}

/// the staging index handle
pub struct StagingIndex {
    path: PathBuf,
    lock: RwLock<()>,
}

impl StagingIndex {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: RwLock::new(()),
        }
    }

    /// stage one entry; an existing entry with the same blob hash is a
    /// no-op reported as `Unchanged`
    pub fn stage(&self, entry: IndexEntry) -> Result<StageStatus> {
        let _guard = self.write_lock();
        let mut map = self.load()?;
        let status = insert_entry(&mut map, entry);
        if status.staged() {
            self.save(&map)?;
        }
        Ok(status)
    }

    /// stage a batch of entries under a single load/save cycle
    pub fn stage_all(&self, entries: Vec<IndexEntry>) -> Result<Vec<StageStatus>> {
        let _guard = self.write_lock();
        let mut map = self.load()?;
        let statuses: Vec<StageStatus> = entries
            .into_iter()
            .map(|entry| insert_entry(&mut map, entry))
            .collect();
        if statuses.iter().any(|s| s.staged()) {
            self.save(&map)?;
        }
        Ok(statuses)
    }

    /// remove a staged entry by key, reporting whether it was present
    pub fn unstage(&self, key: &str) -> Result<bool> {
        let _guard = self.write_lock();
        let mut map = self.load()?;
        let removed = map.remove(key).is_some();
        if removed {
            self.save(&map)?;
        }
        Ok(removed)
    }

    /// drop every staged entry
    pub fn clear(&self) -> Result<()> {
        let _guard = self.write_lock();
        self.save(&BTreeMap::new())
    }

    /// all entries, oldest staged first
    pub fn list(&self) -> Result<Vec<IndexEntry>> {
        let _guard = self.read_lock();
        let map = self.load()?;
        let mut entries: Vec<IndexEntry> = map.into_values().collect();
        entries.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.key().cmp(&b.key())));
        Ok(entries)
    }

    /// entries for one workbook, in key order
    pub fn list_for_workbook(&self, workbook_id: &str) -> Result<Vec<IndexEntry>> {
        let _guard = self.read_lock();
        let map = self.load()?;
        Ok(map
            .into_values()
            .filter(|e| e.workbook_id == workbook_id)
            .collect())
    }

    /// entries for one sheet, in key order
    pub fn list_for_sheet(&self, workbook_id: &str, sheet_number: u32) -> Result<Vec<IndexEntry>> {
        let _guard = self.read_lock();
        let map = self.load()?;
        Ok(map
            .into_values()
            .filter(|e| e.workbook_id == workbook_id && e.sheet_number == sheet_number)
            .collect())
    }

    /// number of staged entries
    pub fn len(&self) -> Result<usize> {
        let _guard = self.read_lock();
        Ok(self.load()?.len())
    }

    /// is the index empty
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// per-workbook counts and size totals
    pub fn stats(&self) -> Result<IndexStats> {
        let _guard = self.read_lock();
        let map = self.load()?;

        let mut per_workbook: BTreeMap<String, usize> = BTreeMap::new();
        let mut original_bytes = 0u64;
        let mut compressed_bytes = 0u64;
        for entry in map.values() {
            *per_workbook.entry(entry.workbook_id.clone()).or_default() += 1;
            original_bytes += entry.original_size;
            compressed_bytes += entry.compressed_size;
        }

        let ratio = if original_bytes > 0 {
            compressed_bytes as f64 / original_bytes as f64
        } else {
            0.0
        };

        Ok(IndexStats {
            staged: map.len(),
            per_workbook,
            original_bytes,
            compressed_bytes,
            ratio,
        })
    }

    /// load the on-disk map
    ///
    /// a missing file is an empty index. an unparseable file is also
    /// treated as empty (lenient recovery) but logged; the next save
    /// replaces it.
    fn load(&self) -> Result<BTreeMap<String, IndexEntry>> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(crate::Error::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        match serde_json::from_slice(&data) {
            Ok(map) => Ok(map),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "unparseable staging index, treating as empty");
                Ok(BTreeMap::new())
            }
        }
    }

    /// durable save: serialize, write a sibling temp file, rename over
    /// the final name
    fn save(&self, map: &BTreeMap<String, IndexEntry>) -> Result<()> {
        let json = serde_json::to_vec_pretty(map).map_err(|e| {
            crate::Error::InvalidInput(format!("unserializable index: {}", e))
        })?;

        let tmp_path = self
            .path
            .with_file_name(format!("index.{}.tmp", uuid::Uuid::new_v4()));
        {
            let mut tmp_file = File::create(&tmp_path).with_path(&tmp_path)?;
            tmp_file.write_all(&json).with_path(&tmp_path)?;
            tmp_file.sync_all().with_path(&tmp_path)?;
        }
        fs::rename(&tmp_path, &self.path).with_path(&self.path)?;

        Ok(())
    }

    fn read_lock(&self) -> std::sync::RwLockReadGuard<'_, ()> {
        self.lock.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_lock(&self) -> std::sync::RwLockWriteGuard<'_, ()> {
        self.lock.write().unwrap_or_else(|e| e.into_inner())
    }
}

fn insert_entry(map: &mut BTreeMap<String, IndexEntry>, entry: IndexEntry) -> StageStatus {
    let key = entry.key();
    match map.get(&key) {
        Some(existing) if existing.blob_hash == entry.blob_hash => StageStatus::Unchanged,
        Some(_) => {
            map.insert(key, entry);
            StageStatus::Updated
        }
        None => {
            map.insert(key, entry);
            StageStatus::Added
        }
    }
}
