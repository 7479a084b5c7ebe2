use glob::Pattern;

/// Criteria for selecting and reading a worksheet from an uploaded workbook.
#[derive(Clone, Debug)]
pub(crate) struct Criteria {
    /// Sheet name pattern; the first matching sheet is read.
    /// `None` selects the first sheet of the workbook.
    pub(crate) sheet_name_pattern: Option<Pattern>,

    /// Convert error cells (`#N/A`, `#DIV/0!`) to blanks instead of keeping them as errors.
    pub(crate) error_as_null: bool,

    /// Skip rows where all columns are empty.
    pub(crate) skip_empty_rows: bool,
}

impl Default for Criteria {
    fn default() -> Self {
        Self {
            sheet_name_pattern: None,
            error_as_null: false,
            skip_empty_rows: true,
        }
    }
}

impl Criteria {
    /// Checks if a sheet name matches the criteria pattern.
    /// Returns true if no pattern is specified.
    pub(crate) fn accept(&self, sheet_name: &str) -> bool {
        self.sheet_name_pattern
            .as_ref()
            .map(|pattern| pattern.matches(sheet_name))
            .unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accept_without_pattern() {
        let criteria = Criteria::default();
        assert!(criteria.accept("Sheet1"));
        assert!(criteria.skip_empty_rows);
    }

    #[test]
    fn accept_with_pattern() {
        let criteria = Criteria {
            sheet_name_pattern: Some(Pattern::new("Agenc*").unwrap()),
            ..Criteria::default()
        };
        assert!(criteria.accept("Agencies 2024"));
        assert!(!criteria.accept("Summary"));
    }
}
