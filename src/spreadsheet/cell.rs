use crate::error::SalesMatrixError;
use crate::spreadsheet::reference::index_to_reference;
use crate::table::Value;
use chrono::Duration;
use chrono::NaiveDate;

/// Types of cell data in a worksheet.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) enum CellType {
    #[default]
    Empty,
    /// Boolean values stored as 0/1
    Boolean,
    /// Numeric values
    Number,
    /// Date/time values stored as numbers from the 1900 epoch
    NumberDateTime1900,
    /// Date values stored as numbers from the 1900 epoch
    NumberDate1900,
    /// Time values stored as day fractions
    NumberTime1900,
    /// Date/time values stored as numbers from the 1904 epoch
    NumberDateTime1904,
    /// Date values stored as numbers from the 1904 epoch
    NumberDate1904,
    /// Time values stored as day fractions (1904 workbook)
    NumberTime1904,
    /// ISO 8601 date/time strings (`t="d"`)
    IsoDateTime,
    /// Inline string values
    InlineString,
    /// Shared string table references
    SharedString,
    /// Error values such as `#N/A`
    Error,
}

impl CellType {
    /// Cell type declared by the `t` attribute of a worksheet cell.
    /// Cells without the attribute hold numbers.
    pub(crate) fn from_type_attribute(kind: Option<&str>, error_as_null: bool) -> Self {
        match kind {
            Some("inlineStr" | "str") => Self::InlineString,
            Some("s") => Self::SharedString,
            Some("d") => Self::IsoDateTime,
            Some("b") => Self::Boolean,
            Some("e") if error_as_null => Self::Empty,
            Some("e") => Self::Error,
            _ => Self::Number,
        }
    }

    /// Maps built-in number format IDs to date and time cell types.
    pub(crate) fn parse_builtin_number_format_id(id: &str, is_1904: bool) -> Option<Self> {
        match id {
            "22" => Some(if is_1904 { Self::NumberDateTime1904 } else { Self::NumberDateTime1900 }),
            "14" | "15" | "16" | "17" => Some(if is_1904 { Self::NumberDate1904 } else { Self::NumberDate1900 }),
            "18" | "19" | "20" | "21" | "45" | "46" | "47" => Some(if is_1904 { Self::NumberTime1904 } else { Self::NumberTime1900 }),
            _ => None,
        }
    }

    /// Classifies a custom number format code by the date/time tokens outside
    /// quoted literals, escapes and bracketed sections.
    pub(crate) fn parse_custom_number_format(format: &str, is_1904: bool) -> Self {
        let mut is_escaped = false;
        let mut is_literal = false;
        let mut is_date = false;
        let mut is_time = false;
        let mut is_bracket = false;
        for character in format.chars() {
            match character {
                _ if is_escaped => is_escaped = false,
                '_' | '\\' => is_escaped = true,

                '"' if is_literal => is_literal = false,
                '"' if !is_bracket => is_literal = true,

                ']' if is_bracket => is_bracket = false,
                '[' if !is_literal => is_bracket = true,
                _ if is_literal || is_bracket => (),

                'Y' | 'y' | 'D' | 'd' => is_date = true,
                'H' | 'h' | 'S' | 's' => is_time = true,
                _ => (),
            }
        }

        match (is_date, is_time, is_1904) {
            (true, true, false) => Self::NumberDateTime1900,
            (true, true, true) => Self::NumberDateTime1904,
            (true, false, false) => Self::NumberDate1900,
            (true, false, true) => Self::NumberDate1904,
            (false, true, false) => Self::NumberTime1900,
            (false, true, true) => Self::NumberTime1904,
            (false, false, _) => Self::Number,
        }
    }
}

/// A single worksheet cell with its position, type and raw value.
#[derive(Clone, Debug)]
pub(crate) struct Cell {
    /// Row index (0-based)
    pub(crate) row: usize,
    /// Column index (0-based)
    pub(crate) col: usize,
    pub(crate) kind: CellType,
    /// Raw value as stored in the worksheet (shared strings already resolved)
    pub(crate) value: String,
}

impl Cell {
    /// Returns the A1-style reference of this cell
    pub(crate) fn reference(&self) -> String {
        index_to_reference(self.row, self.col)
    }

    /// Converts the raw cell into a table value.
    /// Date and time styled numbers become ISO text; error cells become
    /// `Value::Error` unless `error_as_null` is set.
    pub(crate) fn to_value(&self, error_as_null: bool) -> Value {
        match self.kind {
            CellType::Empty => Value::Blank,
            CellType::Boolean => Value::Bool(self.value == "1" || self.value.eq_ignore_ascii_case("true")),
            CellType::Number => self.to_number(),
            CellType::NumberDateTime1900 => self.to_formatted(|value| to_datetime_string(value, false)),
            CellType::NumberDateTime1904 => self.to_formatted(|value| to_datetime_string(value, true)),
            CellType::NumberDate1900 => self.to_formatted(|value| to_date_string(value, false)),
            CellType::NumberDate1904 => self.to_formatted(|value| to_date_string(value, true)),
            CellType::NumberTime1900 | CellType::NumberTime1904 => self.to_formatted(to_time_string),
            CellType::IsoDateTime => Value::Text(self.value.replace('T', " ")),
            CellType::InlineString | CellType::SharedString => Value::Text(self.value.to_owned()),
            CellType::Error if error_as_null => Value::Blank,
            CellType::Error => Value::Error(self.value.to_owned()),
        }
    }

    fn to_number(&self) -> Value {
        match self.value.trim().parse::<f64>() {
            Ok(number) => Value::Number(number),
            Err(_) => Value::Text(self.value.to_owned()),
        }
    }

    /// Falls back to the plain number when the serial cannot be rendered as a date
    fn to_formatted<F>(&self, format: F) -> Value
    where
        F: Fn(&str) -> Result<String, SalesMatrixError>,
    {
        match format(&self.value) {
            Ok(text) => Value::Text(text),
            Err(error) => {
                log::debug!("Cell {} keeps its numeric value: {}", self.reference(), error);
                self.to_number()
            }
        }
    }
}

/// Converts a serial day number to an ISO date.
/// Serials below 60 are shifted by one day for the fictitious 1900-02-29.
fn to_date_string(value: &str, is_1904: bool) -> Result<String, SalesMatrixError> {
    let days = value.trim().parse::<f64>()?.trunc() as i64;
    let offset = if is_1904 {
        1462
    } else if days < 60 {
        1
    } else {
        0
    };
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30).expect("NaiveDate Literal");
    let date = Duration::try_days(days + offset)
        .and_then(|duration| epoch.checked_add_signed(duration))
        .ok_or_else(|| SalesMatrixError::WithContextError(format!("date serial '{value}' out of range")))?;
    Ok(date.format("%Y-%m-%d").to_string())
}

/// Converts the fractional part of a serial to a time of day
fn to_time_string(value: &str) -> Result<String, SalesMatrixError> {
    let fraction = value.trim().parse::<f64>()?.fract().abs();
    let mut total = (fraction * 86_400_000f64).round() as i64;
    let milliseconds = total % 1_000; total /= 1_000;
    let seconds = total % 60; total /= 60;
    let minutes = total % 60; total /= 60;
    let hours = total % 24;
    let time = if milliseconds > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}.{milliseconds:03}")
    } else {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    };
    Ok(time)
}

/// Converts a serial to "YYYY-MM-DD HH:MM:SS"
fn to_datetime_string(value: &str, is_1904: bool) -> Result<String, SalesMatrixError> {
    let date = to_date_string(value, is_1904)?;
    let time = to_time_string(value)?;
    Ok(format!("{date} {time}"))
}
