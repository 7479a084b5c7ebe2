//! Conversion between A1-style cell references and 0-based indexes.

use regex::Regex;
use std::sync::LazyLock;

static REFERENCE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$?([A-Za-z]{1,3})\$?(\d+)$").expect("Hardcode regex pattern"));

/// Converts column letters to a 0-based index ("A" = 0, "Z" = 25, "AA" = 26)
pub(crate) fn col_to_index(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    letters.chars().try_fold(0usize, |index, letter| {
        letter
            .is_ascii_alphabetic()
            .then(|| index * 26 + (letter.to_ascii_uppercase() as usize - 'A' as usize + 1))
    }).map(|index| index - 1)
}

/// Converts a 1-based row number to a 0-based index
pub(crate) fn row_to_index(digits: &str) -> Option<usize> {
    digits.parse::<usize>().ok().filter(|row| *row > 0).map(|row| row - 1)
}

/// Parses a reference such as "B12" into `(row, col)`
pub(crate) fn reference_to_index(reference: &str) -> Option<(usize, usize)> {
    let captures = REFERENCE_PATTERN.captures(reference)?;
    let col = col_to_index(captures.get(1)?.as_str())?;
    let row = row_to_index(captures.get(2)?.as_str())?;
    Some((row, col))
}

/// Formats `(row, col)` as an A1-style reference
pub(crate) fn index_to_reference(row: usize, col: usize) -> String {
    let mut letters = Vec::<char>::new();
    let mut col = col + 1;
    while col > 0 {
        col -= 1;
        letters.push((b'A' + (col % 26) as u8) as char);
        col /= 26;
    }
    let mut reference: String = letters.into_iter().rev().collect();
    reference.push_str(&(row + 1).to_string());
    reference
}
