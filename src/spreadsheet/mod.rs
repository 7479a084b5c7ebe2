//! # Workbook Reading Module
//!
//! Reads the zip-based Office Open XML workbook container (.xlsx, .xlsm)
//! from memory. Only one worksheet is read per upload: the first one, or the
//! first whose name matches the criteria pattern. Cells keep their position
//! and type so the table loader can lay them out as header and rows.

pub(crate) mod cell;
pub(crate) mod criteria;
pub(crate) mod excel;
pub(crate) mod reference;
pub(crate) mod sheet;
pub(crate) mod xlsx;

use crate::error::SalesMatrixError;
use crate::spreadsheet::criteria::Criteria;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::xlsx::XlsxWorkbook;
use thiserror::Error;

/// Errors raised while reading a workbook
#[derive(Error, Debug)]
pub enum SpreadsheetError {
    /// A required part is missing from the package
    #[error("Missing workbook part '{0}'")]
    FileError(String),

    /// The workbook lists no worksheets
    #[error("Workbook contains no worksheets")]
    SpreadsheetEmptyError,

    /// No worksheet matches the requested name pattern
    #[error("No worksheet matches '{0}'")]
    SheetNotFoundError(String),

    /// The selected worksheet has no cells
    #[error("Worksheet '{0}' is empty")]
    SheetEmptyError(String),

    /// A cell refers to a shared string that does not exist
    #[error("Worksheet '{0}' refers to missing shared string #{1}")]
    SharedStringError(String, usize),
}

/// Reads the selected worksheet of an in-memory workbook.
///
/// # Arguments
/// * `bytes` - Raw workbook content (must start with a zip signature)
/// * `criteria` - Sheet selection and cell conversion options
///
/// # Returns
/// The non-empty selected sheet
pub(crate) fn read_workbook(bytes: &[u8], criteria: &Criteria) -> Result<Sheet, SalesMatrixError> {
    let mut workbook = XlsxWorkbook::open(bytes.to_vec())?;
    log::debug!("Workbook sheets: {:?}", workbook.sheet_names());
    let sheet = workbook.read_sheet(criteria)?;
    if sheet.is_empty() {
        Err(SpreadsheetError::SheetEmptyError(sheet.name.to_owned()))?
    }
    Ok(sheet)
}
