use crate::spreadsheet::cell::Cell;

/// A worksheet read from a workbook, holding its non-empty cells and the used range.
#[derive(Debug)]
pub(crate) struct Sheet {
    /// Sheet name as listed in the workbook
    pub(crate) name: String,
    /// Non-empty cells, ordered by row then column after `finish`
    pub(crate) cells: Vec<Cell>,
    /// Used range (determined from cell data); the last row is the last cell's
    pub(crate) row_lower_bound: Option<usize>,
    pub(crate) col_lower_bound: Option<usize>,
    pub(crate) col_upper_bound: Option<usize>,
}

impl Sheet {
    pub(super) fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            cells: Vec::new(),
            row_lower_bound: None,
            col_lower_bound: None,
            col_upper_bound: None,
        }
    }

    /// Returns true if the sheet contains no cells.
    pub(crate) fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Adds a cell, widening the used range.
    pub(super) fn push(&mut self, cell: Cell) {
        self.update_bound(cell.row, cell.col);
        self.cells.push(cell);
    }

    fn update_bound(&mut self, row: usize, col: usize) {
        self.row_lower_bound = Some(self.row_lower_bound.map_or(row, |bound| bound.min(row)));
        self.col_lower_bound = Some(self.col_lower_bound.map_or(col, |bound| bound.min(col)));
        self.col_upper_bound = Some(self.col_upper_bound.map_or(col, |bound| bound.max(col)));
    }

    /// Orders cells by position; writers are not required to emit them sorted.
    /// When a position occurs more than once, the cell written last wins.
    pub(super) fn finish(&mut self) {
        self.cells.sort_by_key(|cell| (cell.row, cell.col));
        let before = self.cells.len();
        self.cells.dedup_by(|later, earlier| {
            let same = later.row == earlier.row && later.col == earlier.col;
            if same {
                std::mem::swap(later, earlier);
            }
            same
        });
        if self.cells.len() < before {
            log::warn!("Sheet '{}' repeats {} cell positions; keeping the last value of each", self.name, before - self.cells.len());
        }
    }

    /// Lays the used range out as a grid of optional cell references,
    /// one row per row index that holds a cell. Rows in between are filled
    /// with empty records unless `skip_empty_rows` is set.
    pub(crate) fn rows(&self, skip_empty_rows: bool) -> Vec<Vec<Option<&Cell>>> {
        let (Some(row_lower), Some(col_lower), Some(col_upper)) = (
            self.row_lower_bound,
            self.col_lower_bound,
            self.col_upper_bound,
        ) else {
            return Vec::new();
        };

        let width = col_upper - col_lower + 1;
        let mut next_row = row_lower;
        let mut table = Vec::<Vec<Option<&Cell>>>::new();
        for cells in self.cells.chunk_by(|left, right| left.row == right.row) {
            let row = cells[0].row;
            if !skip_empty_rows {
                table.extend((next_row..row).map(|_| vec![None; width]));
            }
            let mut record = vec![None; width];
            for cell in cells {
                record[cell.col - col_lower] = Some(cell);
            }
            table.push(record);
            next_row = row + 1;
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::cell::CellType;

    fn push(sheet: &mut Sheet, row: usize, col: usize) {
        push_value(sheet, row, col, &format!("{row}:{col}"));
    }

    fn push_value(sheet: &mut Sheet, row: usize, col: usize, value: &str) {
        sheet.push(Cell {
            row,
            col,
            kind: CellType::InlineString,
            value: value.to_owned(),
        });
    }

    fn values(rows: &[Vec<Option<&Cell>>]) -> Vec<Vec<Option<String>>> {
        rows.iter()
            .map(|row| row.iter().map(|cell| cell.map(|cell| cell.value.to_owned())).collect())
            .collect()
    }

    #[test]
    fn sheet_initial() {
        let sheet = Sheet::new("Agencies");

        assert!(sheet.is_empty());
        assert_eq!(sheet.row_lower_bound, None);
        assert_eq!(sheet.col_upper_bound, None);
        assert!(sheet.rows(true).is_empty());
    }

    #[test]
    fn sheet_bounds_and_grid() {
        let mut sheet = Sheet::new("Agencies");
        push(&mut sheet, 3, 3);
        push(&mut sheet, 1, 1);
        push(&mut sheet, 1, 3);
        push(&mut sheet, 3, 1);
        sheet.finish();

        assert_eq!(sheet.row_lower_bound, Some(1));
        assert_eq!(sheet.col_lower_bound, Some(1));
        assert_eq!(sheet.col_upper_bound, Some(3));

        let some = |value: &str| Some(value.to_owned());
        assert_eq!(values(&sheet.rows(true)), vec![
            vec![some("1:1"), None, some("1:3")],
            vec![some("3:1"), None, some("3:3")],
        ]);
        assert_eq!(sheet.rows(false).len(), 3);
        assert_eq!(values(&sheet.rows(false))[1], vec![None, None, None]);
    }

    #[test]
    fn repeated_positions_keep_the_last_cell() {
        let mut sheet = Sheet::new("Agencies");
        push_value(&mut sheet, 0, 0, "Agency Name");
        push_value(&mut sheet, 0, 1, "Stage");
        push_value(&mut sheet, 1, 1, "Lite");
        push_value(&mut sheet, 1, 0, "Acme");
        push_value(&mut sheet, 1, 1, "Orders 360 Full");
        sheet.finish();

        assert_eq!(sheet.cells.len(), 4);
        let some = |value: &str| Some(value.to_owned());
        assert_eq!(values(&sheet.rows(true)), vec![
            vec![some("Agency Name"), some("Stage")],
            vec![some("Acme"), some("Orders 360 Full")],
        ]);
    }

    #[test]
    fn sparse_rows_are_not_materialized_when_skipped() {
        let mut sheet = Sheet::new("Agencies");
        push(&mut sheet, 0, 0);
        push(&mut sheet, 1_000_000, 2);
        sheet.finish();

        let some = |value: &str| Some(value.to_owned());
        assert_eq!(values(&sheet.rows(true)), vec![
            vec![some("0:0"), None, None],
            vec![None, None, some("1000000:2")],
        ]);
    }
}
