//! Turns uploaded bytes into a generic table.
//!
//! Content starting with the zip signature is read as a workbook; anything
//! else is decoded as delimited text after encoding detection.

use crate::error::SalesMatrixError;
use crate::helpers::encoding::decode_strict;
use crate::helpers::encoding::detect_encoding;
use crate::helpers::encoding::DetectedEncoding;
use crate::helpers::encoding::DEFAULT_MIN_CONFIDENCE;
use crate::helpers::zip::is_zip;
use crate::spreadsheet::criteria::Criteria;
use crate::spreadsheet::read_workbook;
use crate::table::delimited::parse_delimited;
use crate::table::Value;
use encoding_rs::Encoding;
use encoding_rs::UTF_8;
use glob::Pattern;
use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;

/// Text values treated as missing unless configured otherwise
pub const DEFAULT_NULL_VALUES: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Name used in messages when the upload has no file name
const UNNAMED_UPLOAD: &str = "upload";

/// Reasons an upload cannot become a table. Each renders as a one-line message.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("No file uploaded")]
    NoContent,

    #[error("Could not decode '{file_name}' as {encoding}")]
    Decode {
        file_name: String,
        encoding: &'static str,
    },

    #[error("Invalid sheet pattern '{pattern}': {source}")]
    SheetPattern {
        pattern: String,
        source: glob::PatternError,
    },

    #[error("Could not read workbook '{file_name}': {source}")]
    Workbook {
        file_name: String,
        source: SalesMatrixError,
    },

    #[error("Could not read '{file_name}': {source}")]
    Delimited {
        file_name: String,
        source: csv::Error,
    },

    #[error("'{0}' has no header row")]
    MissingHeader(String),

    #[error("'{0}' contains no data rows")]
    NoRows(String),
}

/// Options for turning bytes into a table
#[derive(Clone, Debug)]
pub struct LoadOptions {
    /// Glob pattern selecting the worksheet; the first sheet is read when absent
    pub sheet: Option<String>,

    /// Field separator for delimited text
    pub delimiter: u8,

    /// Text values that become `Value::Blank`
    pub null_values: HashSet<String>,

    /// Skip rows where all columns are empty (workbooks)
    pub skip_empty_rows: bool,

    /// Convert error cells to blanks instead of `Value::Error` (workbooks)
    pub error_as_null: bool,

    /// Encoding used when detection is not confident enough
    pub fallback_encoding: &'static Encoding,

    /// Confidence the detected encoding must exceed to be used
    pub min_confidence: f32,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            sheet: None,
            delimiter: b',',
            null_values: DEFAULT_NULL_VALUES.iter().map(|value| value.to_string()).collect(),
            skip_empty_rows: true,
            error_as_null: false,
            fallback_encoding: UTF_8,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }
}

/// Where a loaded table came from
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum TableSource {
    Workbook {
        sheet: String,
    },
    Delimited {
        #[serde(flatten)]
        encoding: DetectedEncoding,
        skipped_lines: usize,
    },
}

/// Original headers and values of an upload, before key normalization
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawTable {
    pub labels: Vec<String>,
    /// Rows aligned with `labels`
    pub rows: Vec<Vec<Value>>,
    pub source: Option<TableSource>,
}

/// Loads an upload into a table.
///
/// # Arguments
/// * `bytes` - Raw upload content
/// * `file_name` - Name of the uploaded file, used in messages
/// * `options` - Parsing options
///
/// # Returns
/// The header labels and rows, or a `LoadError` when nothing usable was found
pub fn load(bytes: &[u8], file_name: Option<&str>, options: &LoadOptions) -> Result<RawTable, LoadError> {
    let file_name = file_name.unwrap_or(UNNAMED_UPLOAD);
    if bytes.is_empty() {
        return Err(LoadError::NoContent);
    }

    let raw = if is_zip(bytes) {
        load_workbook(bytes, file_name, options)?
    } else {
        load_delimited(bytes, file_name, options)?
    };

    if raw.labels.is_empty() {
        return Err(LoadError::MissingHeader(file_name.to_owned()));
    }
    if raw.rows.is_empty() {
        return Err(LoadError::NoRows(file_name.to_owned()));
    }
    log::info!("Loaded '{}': {} rows, {} columns", file_name, raw.rows.len(), raw.labels.len());
    Ok(raw)
}

fn load_workbook(bytes: &[u8], file_name: &str, options: &LoadOptions) -> Result<RawTable, LoadError> {
    let sheet_name_pattern = options.sheet
        .as_deref()
        .map(Pattern::new)
        .transpose()
        .map_err(|source| LoadError::SheetPattern {
            pattern: options.sheet.to_owned().unwrap_or_default(),
            source,
        })?;
    let criteria = Criteria {
        sheet_name_pattern,
        error_as_null: options.error_as_null,
        skip_empty_rows: options.skip_empty_rows,
    };
    let sheet = read_workbook(bytes, &criteria).map_err(|source| LoadError::Workbook {
        file_name: file_name.to_owned(),
        source,
    })?;

    let mut grid = sheet.rows(criteria.skip_empty_rows).into_iter();
    let labels = match grid.next() {
        Some(header) => header
            .iter()
            .enumerate()
            .map(|(index, cell)| {
                let label = cell.map(|cell| cell.to_value(true).text()).unwrap_or_default();
                header_label(label, index)
            })
            .collect(),
        None => Vec::new(),
    };
    let rows = grid
        .map(|row| {
            row.iter()
                .map(|cell| {
                    let value = cell.map(|cell| cell.to_value(criteria.error_as_null)).unwrap_or(Value::Blank);
                    apply_null_values(value, &options.null_values)
                })
                .collect()
        })
        .collect();

    Ok(RawTable {
        labels,
        rows,
        source: Some(TableSource::Workbook { sheet: sheet.name.to_owned() }),
    })
}

fn load_delimited(bytes: &[u8], file_name: &str, options: &LoadOptions) -> Result<RawTable, LoadError> {
    let detected = detect_encoding(bytes, options.fallback_encoding, options.min_confidence);
    let text = decode_strict(bytes, detected.encoding).ok_or_else(|| LoadError::Decode {
        file_name: file_name.to_owned(),
        encoding: detected.name(),
    })?;
    let parsed = parse_delimited(&text, options.delimiter).map_err(|source| LoadError::Delimited {
        file_name: file_name.to_owned(),
        source,
    })?;
    if parsed.skipped > 0 {
        log::warn!("Skipped {} malformed lines in '{}'", parsed.skipped, file_name);
    }

    let labels = parsed.labels
        .into_iter()
        .enumerate()
        .map(|(index, label)| header_label(label, index))
        .collect();
    let rows = parsed.rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|field| apply_null_values(Value::Text(field), &options.null_values))
                .collect()
        })
        .collect();

    Ok(RawTable {
        labels,
        rows,
        source: Some(TableSource::Delimited {
            encoding: detected,
            skipped_lines: parsed.skipped,
        }),
    })
}

/// Blank headers are named after their 0-based position
fn header_label(label: String, index: usize) -> String {
    if label.trim().is_empty() {
        format!("Unnamed: {index}")
    } else {
        label
    }
}

fn apply_null_values(value: Value, null_values: &HashSet<String>) -> Value {
    match value {
        Value::Text(text) if null_values.contains(&text) => Value::Blank,
        value => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::encoding::EncodingSource;
    use encoding_rs::SHIFT_JIS;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn text(value: &str) -> Value {
        Value::Text(value.to_owned())
    }

    #[test]
    fn delimited_upload() {
        let csv = indoc! {"
            Agency Name,Has EHR,,Stage
            Acme,Yes,x,Orders 360 Full
            Globex,N/A,,
        "};
        let raw = load(csv.as_bytes(), Some("agencies.csv"), &LoadOptions::default()).unwrap();
        assert_eq!(raw.labels, vec!["Agency Name", "Has EHR", "Unnamed: 2", "Stage"]);
        assert_eq!(raw.rows, vec![
            vec![text("Acme"), text("Yes"), text("x"), text("Orders 360 Full")],
            vec![text("Globex"), Value::Blank, Value::Blank, Value::Blank],
        ]);
        assert!(matches!(raw.source, Some(TableSource::Delimited { skipped_lines: 0, .. })));
    }

    #[test]
    fn custom_delimiter_and_null_values() {
        let options = LoadOptions {
            delimiter: b'\t',
            null_values: ["-".to_owned()].into_iter().collect(),
            ..LoadOptions::default()
        };
        let raw = load(b"name\tflag\nAcme\t-\nNA\t1\n", None, &options).unwrap();
        assert_eq!(raw.rows, vec![vec![text("Acme"), Value::Blank], vec![text("NA"), text("1")]]);
    }

    #[test]
    fn byte_order_mark_is_honoured() {
        let raw = load(b"\xEF\xBB\xBFname,flag\nAcme,yes\n", None, &LoadOptions::default()).unwrap();
        assert_eq!(raw.labels, vec!["name", "flag"]);
        match raw.source {
            Some(TableSource::Delimited { encoding, .. }) => assert_eq!(encoding.source, EncodingSource::Bom),
            other => panic!("unexpected source {other:?}"),
        }
    }

    #[test]
    fn legacy_encoding_is_detected() {
        let mut csv = String::from("代理店名,営業段階,電子カルテ\n");
        for _ in 0..8 {
            csv.push_str("東京在宅医療センター,フル契約,はい\n");
            csv.push_str("大阪訪問看護ステーション,無料プラン,いいえ\n");
            csv.push_str("名古屋ホームヘルスケア株式会社,ライト契約,はい\n");
        }
        let (bytes, _, _) = SHIFT_JIS.encode(&csv);
        let raw = load(&bytes, Some("agencies.csv"), &LoadOptions::default()).unwrap();

        match &raw.source {
            Some(TableSource::Delimited { encoding, .. }) => {
                assert_eq!(encoding.source, EncodingSource::Detected);
                assert_eq!(encoding.encoding, SHIFT_JIS);
            }
            other => panic!("unexpected source {other:?}"),
        }
        assert_eq!(raw.labels, vec!["代理店名", "営業段階", "電子カルテ"]);
        assert_eq!(raw.rows.len(), 24);
        assert_eq!(raw.rows[1], vec![text("大阪訪問看護ステーション"), text("無料プラン"), text("いいえ")]);
    }

    #[test]
    fn load_errors() {
        let options = LoadOptions::default();
        assert!(matches!(load(b"", Some("a.csv"), &options), Err(LoadError::NoContent)));
        assert!(matches!(load(b"name,flag\n", Some("a.csv"), &options), Err(LoadError::NoRows(_))));
        assert!(matches!(load(b"\n\n", Some("a.csv"), &options), Err(LoadError::MissingHeader(_))));
        assert!(matches!(load(b"PK\x03\x04garbage", Some("a.xlsx"), &options), Err(LoadError::Workbook { .. })));

        let error = load(b"name,flag\n", Some("a.csv"), &options).unwrap_err();
        assert_eq!(error.to_string(), "'a.csv' contains no data rows");
    }

    #[test]
    fn malformed_text_is_a_decode_error() {
        let options = LoadOptions {
            min_confidence: 1.0,
            ..LoadOptions::default()
        };
        let error = load(b"name,flag\nCaf\xE9,yes\n", Some("latin.csv"), &options).unwrap_err();
        assert!(matches!(error, LoadError::Decode { encoding: "UTF-8", .. }));
    }

    #[test]
    fn invalid_sheet_pattern() {
        let options = LoadOptions {
            sheet: Some("[".to_owned()),
            ..LoadOptions::default()
        };
        let error = load(b"PK\x03\x04", None, &options).unwrap_err();
        assert!(matches!(error, LoadError::SheetPattern { .. }));
    }
}
