//! Delimited text (CSV, TSV, semicolon separated) parsing with tolerant record handling.

use csv::ReaderBuilder;
use csv::StringRecord;

/// Header and records of a delimited text upload
#[derive(Debug, Default, PartialEq)]
pub(crate) struct DelimitedText {
    /// Header fields, as written
    pub(crate) labels: Vec<String>,
    /// Records padded to the header width
    pub(crate) rows: Vec<Vec<String>>,
    /// Number of records dropped as malformed
    pub(crate) skipped: usize,
}

/// Parses decoded text into a header and records.
///
/// Records with more fields than the header, and records the parser cannot
/// read, are skipped with a warning. Short records are padded with empty
/// fields. Blank lines are ignored.
///
/// # Arguments
/// * `text` - Decoded upload content
/// * `delimiter` - Field separator byte
///
/// # Returns
/// The header and the surviving records; fails only if the header itself cannot be read
pub(crate) fn parse_delimited(text: &str, delimiter: u8) -> Result<DelimitedText, csv::Error> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let labels: Vec<String> = reader.headers()?.iter().map(str::to_owned).collect();
    let width = labels.len();
    let mut parsed = DelimitedText {
        labels,
        ..DelimitedText::default()
    };

    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(error) => {
                log::warn!("Skipping unreadable line: {}", error);
                parsed.skipped += 1;
                continue;
            }
        };
        if is_blank(&record) {
            continue;
        }
        if record.len() > width {
            log::warn!(
                "Skipping line {}: expected {} fields, saw {}",
                line_number(&record),
                width,
                record.len()
            );
            parsed.skipped += 1;
            continue;
        }

        let mut row: Vec<String> = record.iter().map(str::to_owned).collect();
        row.resize(width, String::new());
        parsed.rows.push(row);
    }

    Ok(parsed)
}

fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(|field| field.trim().is_empty())
}

fn line_number(record: &StringRecord) -> u64 {
    record.position().map(|position| position.line()).unwrap_or_default()
}
