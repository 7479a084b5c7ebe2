use thiserror::Error;

/// Main error type for the sales matrix pipeline.
/// Aggregates number parsing, archive, XML and internal module errors
/// so that `?` can cross module boundaries.
#[derive(Error, Debug)]
pub enum SalesMatrixError {
    #[error("{0}")]
    WithContextError(String),

    // Standard library errors
    #[error("{0}")]
    ParseIntError(#[from] std::num::ParseIntError),

    #[error("{0}")]
    ParseFloatError(#[from] std::num::ParseFloatError),

    // Third-party library errors
    #[error("{0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("{0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("{0}")]
    XmlEncodingError(#[from] quick_xml::encoding::EncodingError),

    #[error("{0}")]
    XmlAttributeError(#[from] quick_xml::events::attributes::AttrError),

    // Helper module errors
    #[error("{0}")]
    XmlHelperError(#[from] crate::helpers::xml::XmlError),

    // Spreadsheet module errors
    #[error("{0}")]
    SpreadsheetError(#[from] crate::spreadsheet::SpreadsheetError),
}

pub(crate) trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for Result<T, SalesMatrixError> {
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|e| SalesMatrixError::WithContextError(format!("{}: {}", message, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_prefix_wraps_message() {
        let result: Result<(), SalesMatrixError> = Err(SalesMatrixError::WithContextError("boom".to_owned()));
        let error = result.with_prefix("xl/workbook.xml").unwrap_err();
        assert_eq!(error.to_string(), "xl/workbook.xml: boom");
    }

    #[test]
    fn number_errors_convert() {
        let error: SalesMatrixError = "x".parse::<usize>().unwrap_err().into();
        assert!(matches!(error, SalesMatrixError::ParseIntError(_)));
        assert_eq!(error.to_string(), "invalid digit found in string");
    }
}
