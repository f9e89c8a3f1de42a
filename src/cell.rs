//! cell addressing
//!
//! a cell is identified by `(workbook_id, sheet_number, row_letters,
//! col_number)`. the letter run uses bijective base-26 (A=1, Z=26,
//! AA=27), and the canonical on-disk cell path is the letter run
//! followed by the number, e.g. `"A1"`. note that in conventional
//! spreadsheet terms the letters select a column; the field names here
//! follow the store's public API.

use std::fmt;

use crate::error::{Error, Result};

/// convert a letter run to its 1-based base-26 index (A=1, Z=26, AA=27)
pub fn letters_to_number(letters: &str) -> Result<u64> {
    if letters.is_empty() {
        return Err(Error::InvalidInput("empty cell letters".to_string()));
    }
    let mut n: u64 = 0;
    for b in letters.bytes() {
        if !b.is_ascii_uppercase() {
            return Err(Error::InvalidInput(format!(
                "bad cell letters (A-Z only): {}",
                letters
            )));
        }
        n = n * 26 + u64::from(b - b'A' + 1);
    }
    Ok(n)
}

/// convert a 1-based base-26 index back to its letter run
pub fn number_to_letters(mut n: u64) -> Result<String> {
    if n == 0 {
        return Err(Error::InvalidInput("cell letter index must be >= 1".to_string()));
    }
    let mut out = Vec::new();
    while n > 0 {
        n -= 1;
        out.push(b'A' + (n % 26) as u8);
        n /= 26;
    }
    out.reverse();
    // out is built from ascii uppercase bytes only
    Ok(String::from_utf8(out).expect("ascii"))
}

/// split a cell address like `"A1"` into its letter run and number
pub fn parse_address(address: &str) -> Result<(String, u32)> {
    let split = address
        .bytes()
        .position(|b| b.is_ascii_digit())
        .ok_or_else(|| Error::InvalidInput(format!("bad cell address: {}", address)))?;

    let (letters, digits) = address.split_at(split);
    if letters.is_empty() || !letters.bytes().all(|b| b.is_ascii_uppercase()) {
        return Err(Error::InvalidInput(format!("bad cell address: {}", address)));
    }
    let number: u32 = digits
        .parse()
        .map_err(|_| Error::InvalidInput(format!("bad cell address: {}", address)))?;
    if number == 0 {
        return Err(Error::InvalidInput(format!("bad cell address: {}", address)));
    }

    Ok((letters.to_string(), number))
}

/// a fully-qualified cell reference
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct CellRef {
    pub workbook_id: String,
    pub sheet_number: u32,
    pub row_letters: String,
    pub col_number: u32,
}

impl CellRef {
    /// create a validated cell reference; letters are uppercased
    pub fn new(
        workbook_id: impl Into<String>,
        sheet_number: u32,
        row_letters: &str,
        col_number: u32,
    ) -> Result<Self> {
        let workbook_id = workbook_id.into();
        validate_workbook_id(&workbook_id)?;

        let row_letters = row_letters.to_ascii_uppercase();
        if row_letters.is_empty() || !row_letters.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(Error::InvalidInput(format!(
                "bad cell letters (A-Z only): {}",
                row_letters
            )));
        }
        if col_number == 0 {
            return Err(Error::InvalidInput(
                "cell number must be >= 1".to_string(),
            ));
        }

        Ok(Self {
            workbook_id,
            sheet_number,
            row_letters,
            col_number,
        })
    }

    /// the cell address within a sheet, e.g. `"A1"`
    pub fn address(&self) -> String {
        format!("{}{}", self.row_letters, self.col_number)
    }

    /// the staging index key: `"<workbook>:<sheet>:<LETTERS>:<number>"`
    pub fn index_key(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.workbook_id, self.sheet_number, self.row_letters, self.col_number
        )
    }

    /// the path of this cell inside a commit tree:
    /// `"<workbook>/<sheet>/<address>"`
    pub fn tree_path(&self) -> String {
        format!(
            "{}/{}/{}",
            self.workbook_id,
            self.sheet_number,
            self.address()
        )
    }

    /// reconstruct a cell reference from a commit tree path
    pub fn from_tree_path(path: &str) -> Result<Self> {
        let mut parts = path.split('/');
        let (workbook, sheet, address) = match (parts.next(), parts.next(), parts.next(), parts.next())
        {
            (Some(w), Some(s), Some(a), None) => (w, s, a),
            _ => {
                return Err(Error::InvalidInput(format!("bad cell path: {}", path)));
            }
        };

        let sheet_number: u32 = sheet
            .parse()
            .map_err(|_| Error::InvalidInput(format!("bad sheet number in path: {}", path)))?;
        let (row_letters, col_number) = parse_address(address)?;

        Self::new(workbook, sheet_number, &row_letters, col_number)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tree_path())
    }
}

/// workbook ids appear in index keys and tree paths, so the separators
/// used there cannot occur in the id itself
fn validate_workbook_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(Error::InvalidInput("empty workbook id".to_string()));
    }
    if id.contains('/') || id.contains(':') || id.contains('\0') {
        return Err(Error::InvalidInput(format!(
            "workbook id cannot contain '/', ':' or null: {}",
            id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letters_to_number_base_cases() {
        assert_eq!(letters_to_number("A").unwrap(), 1);
        assert_eq!(letters_to_number("Z").unwrap(), 26);
        assert_eq!(letters_to_number("AA").unwrap(), 27);
        assert_eq!(letters_to_number("AZ").unwrap(), 52);
        assert_eq!(letters_to_number("ZZ").unwrap(), 702);
    }

    #[test]
    fn test_number_to_letters_base_cases() {
        assert_eq!(number_to_letters(1).unwrap(), "A");
        assert_eq!(number_to_letters(26).unwrap(), "Z");
        assert_eq!(number_to_letters(27).unwrap(), "AA");
        assert_eq!(number_to_letters(702).unwrap(), "ZZ");
        assert_eq!(number_to_letters(703).unwrap(), "AAA");
    }

    #[test]
    fn test_letters_number_roundtrip() {
        for n in 1..2000u64 {
            let letters = number_to_letters(n).unwrap();
            assert_eq!(letters_to_number(&letters).unwrap(), n);
        }
    }

    #[test]
    fn test_letters_rejects_bad_input() {
        assert!(letters_to_number("").is_err());
        assert!(letters_to_number("a").is_err());
        assert!(letters_to_number("A1").is_err());
        assert!(number_to_letters(0).is_err());
    }

    #[test]
    fn test_parse_address() {
        assert_eq!(parse_address("A1").unwrap(), ("A".to_string(), 1));
        assert_eq!(parse_address("ZZ99").unwrap(), ("ZZ".to_string(), 99));
    }

    #[test]
    fn test_parse_address_rejects_malformed() {
        assert!(parse_address("").is_err());
        assert!(parse_address("A").is_err());
        assert!(parse_address("1").is_err());
        assert!(parse_address("A0").is_err());
        assert!(parse_address("a1").is_err());
        assert!(parse_address("A1B").is_err());
    }

    #[test]
    fn test_cell_ref_uppercases_letters() {
        let cell = CellRef::new("wb1", 1, "aa", 3).unwrap();
        assert_eq!(cell.row_letters, "AA");
        assert_eq!(cell.address(), "AA3");
    }

    #[test]
    fn test_cell_ref_keys() {
        let cell = CellRef::new("wb1", 2, "B", 7).unwrap();
        assert_eq!(cell.index_key(), "wb1:2:B:7");
        assert_eq!(cell.tree_path(), "wb1/2/B7");
    }

    #[test]
    fn test_cell_ref_rejects_bad_input() {
        assert!(CellRef::new("", 0, "A", 1).is_err());
        assert!(CellRef::new("wb/1", 0, "A", 1).is_err());
        assert!(CellRef::new("wb:1", 0, "A", 1).is_err());
        assert!(CellRef::new("wb1", 0, "", 1).is_err());
        assert!(CellRef::new("wb1", 0, "A1", 1).is_err());
        assert!(CellRef::new("wb1", 0, "A", 0).is_err());
    }

    #[test]
    fn test_from_tree_path_roundtrip() {
        let cell = CellRef::new("budget", 3, "AB", 12).unwrap();
        let parsed = CellRef::from_tree_path(&cell.tree_path()).unwrap();
        assert_eq!(parsed, cell);
    }

    #[test]
    fn test_from_tree_path_rejects_malformed() {
        assert!(CellRef::from_tree_path("only/two").is_err());
        assert!(CellRef::from_tree_path("a/b/c/d").is_err());
        assert!(CellRef::from_tree_path("wb/notanumber/A1").is_err());
        assert!(CellRef::from_tree_path("wb/1/1A").is_err());
    }
}
