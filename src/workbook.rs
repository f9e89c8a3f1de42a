//! the external workbook store contract
//!
//! the core only ever touches workbooks through this narrow
//! read/write-cell interface; persistence of the mutable workbooks
//! themselves lives outside the version store.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cell::CellRef;
use crate::error::{Error, IoResultExt, Result};

/// the contract the core consumes
pub trait WorkbookStore {
    /// read one cell's current value
    fn read_cell(
        &self,
        workbook_id: &str,
        sheet_number: u32,
        row_letters: &str,
        col_number: u32,
    ) -> Result<String>;

    /// write one cell's value, creating workbook and sheets on demand
    fn write_cell(
        &mut self,
        workbook_id: &str,
        sheet_number: u32,
        row_letters: &str,
        col_number: u32,
        value: &str,
    ) -> Result<()>;
}

/// in-memory workbook store: workbook id -> list of sheets -> cell
/// address -> value
///
/// serves as the test double and, JSON-persisted, as the CLI's
/// document layer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryWorkbookStore {
    workbooks: BTreeMap<String, Vec<BTreeMap<String, String>>>,
}

impl MemoryWorkbookStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// load from a JSON file; a missing file is an empty store
    pub fn load(path: &Path) -> Result<Self> {
        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(source) => {
                return Err(Error::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        serde_json::from_slice(&data)
            .map_err(|e| Error::InvalidInput(format!("bad workbook file {}: {}", path.display(), e)))
    }

    /// save to a JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(self)
            .map_err(|e| Error::InvalidInput(format!("unserializable workbooks: {}", e)))?;
        std::fs::write(path, json).with_path(path)?;
        Ok(())
    }

    /// number of workbooks held
    pub fn workbook_count(&self) -> usize {
        self.workbooks.len()
    }
}

impl WorkbookStore for MemoryWorkbookStore {
    fn read_cell(
        &self,
        workbook_id: &str,
        sheet_number: u32,
        row_letters: &str,
        col_number: u32,
    ) -> Result<String> {
        let cell = CellRef::new(workbook_id, sheet_number, row_letters, col_number)?;

        self.workbooks
            .get(&cell.workbook_id)
            .and_then(|sheets| sheets.get(sheet_number as usize))
            .and_then(|sheet| sheet.get(&cell.address()))
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("cell {}", cell)))
    }

    fn write_cell(
        &mut self,
        workbook_id: &str,
        sheet_number: u32,
        row_letters: &str,
        col_number: u32,
        value: &str,
    ) -> Result<()> {
        let cell = CellRef::new(workbook_id, sheet_number, row_letters, col_number)?;

        let sheets = self.workbooks.entry(cell.workbook_id.clone()).or_default();
        while sheets.len() <= sheet_number as usize {
            sheets.push(BTreeMap::new());
        }
        sheets[sheet_number as usize].insert(cell.address(), value.to_string());
        Ok(())
    }
}
