//! Cell references for statistics formulas

use crate::error::{SheetMapError, SheetMapResult};

/// Single-letter column name: 0 → A, 25 → Z.
///
/// Statistics formulas only reference columns A..Z; wider indices are
/// rejected rather than translated to multi-letter names.
pub fn column_letter(col: u16) -> SheetMapResult<char> {
    if col >= 26 {
        return Err(SheetMapError::Configuration(format!(
            "Statistics column index {} is outside the supported range A..Z",
            col
        )));
    }
    Ok((b'A' + col as u8) as char)
}

/// A1-style reference for a zero-based row/column.
pub fn cell_reference(row: u32, col: u16) -> SheetMapResult<String> {
    Ok(format!("{}{}", column_letter(col)?, row + 1))
}

/// `FORMULA(<first>:<last>)` over one column, rows zero-based and inclusive.
pub fn range_formula(function: &str, col: u16, first_row: u32, last_row: u32) -> SheetMapResult<String> {
    Ok(format!(
        "{}({}:{})",
        function,
        cell_reference(first_row, col)?,
        cell_reference(last_row, col)?
    ))
}
