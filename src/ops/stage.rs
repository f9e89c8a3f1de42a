use crate::cell::CellRef;
use crate::error::Result;
use crate::hash::Hash;
use crate::index::{IndexEntry, StageStatus};
use crate::object::blob::write_blob;
use crate::ops::unix_now;
use crate::repo::Repo;
use crate::workbook::WorkbookStore;

/// result of staging one cell
#[derive(Clone, Debug)]
pub struct StageOutcome {
    pub blob_hash: Hash,
    /// cell address within the sheet, e.g. `"A1"`
    pub cell_address: String,
    pub original_size: u64,
    pub compressed_size: u64,
    pub status: StageStatus,
}

impl StageOutcome {
    /// did this call change the index
    pub fn staged(&self) -> bool {
        self.status.staged()
    }
}

/// stage one cell: read its current value from the workbook store,
/// write the value blob, record an index entry
pub fn stage(
    repo: &Repo,
    store: &dyn WorkbookStore,
    workbook_id: &str,
    sheet_number: u32,
    row_letters: &str,
    col_number: u32,
) -> Result<StageOutcome> {
    let cell = CellRef::new(workbook_id, sheet_number, row_letters, col_number)?;
    let entry = build_entry(repo, store, &cell, unix_now())?;

    let outcome = StageOutcome {
        blob_hash: entry.blob_hash,
        cell_address: cell.address(),
        original_size: entry.original_size,
        compressed_size: entry.compressed_size,
        status: repo.index().stage(entry)?,
    };
    Ok(outcome)
}

/// stage several cells under a single index write-lock cycle
pub fn stage_batch(
    repo: &Repo,
    store: &dyn WorkbookStore,
    cells: &[CellRef],
) -> Result<Vec<StageOutcome>> {
    let now = unix_now();
    let entries = cells
        .iter()
        .map(|cell| build_entry(repo, store, cell, now))
        .collect::<Result<Vec<_>>>()?;

    let statuses = repo.index().stage_all(entries.clone())?;

    Ok(entries
        .into_iter()
        .zip(statuses)
        .map(|(entry, status)| StageOutcome {
            blob_hash: entry.blob_hash,
            cell_address: entry.cell().address(),
            original_size: entry.original_size,
            compressed_size: entry.compressed_size,
            status,
        })
        .collect())
}

fn build_entry(
    repo: &Repo,
    store: &dyn WorkbookStore,
    cell: &CellRef,
    timestamp: u64,
) -> Result<IndexEntry> {
    let value = store.read_cell(
        &cell.workbook_id,
        cell.sheet_number,
        &cell.row_letters,
        cell.col_number,
    )?;
    let write = write_blob(repo, value.as_bytes())?;

    Ok(IndexEntry {
        workbook_id: cell.workbook_id.clone(),
        sheet_number: cell.sheet_number,
        row_letters: cell.row_letters.clone(),
        col_number: cell.col_number,
        blob_hash: write.hash,
        timestamp,
        original_size: write.original_size,
        compressed_size: write.compressed_size,
    })
}
