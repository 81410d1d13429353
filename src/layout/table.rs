//! # Table Pagination
//!
//! Splits a table block across columns and pages at row boundaries. The
//! sub-engine owns no page state: it reaches the page through the narrow
//! [`TableHost`] capability, so it can be driven by the paginator or by a
//! fake host in tests.
//!
//! Rules:
//! - rows are placed top to bottom and never divided;
//! - a row that does not fit moves, with everything after it, to the next
//!   column or page;
//! - header rows are repeated above every continuation;
//! - the first fragment never holds only header rows;
//! - a `cannotSplit` table moves whole when an empty column can hold it.

use crate::model::{FlowBlock, TableBlock, TableMeasure};

use super::page_break::fitting_count;
use super::{DocPos, Fragment, FragmentKind};

/// Snapshot of the active column, handed back by every host call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub cursor_y: f64,
    /// Top of the column region.
    pub top: f64,
    pub bottom: f64,
    pub allowance: f64,
    pub at_column_top: bool,
    /// Empty column whose region starts at the top of the body.
    pub fresh: bool,
    pub column: usize,
}

impl Region {
    /// Space left below the cursor, allowance included.
    pub fn remaining(&self) -> f64 {
        (self.bottom - self.cursor_y).max(0.0) + self.allowance
    }

    /// Space in an empty column, allowance included.
    pub fn column_height(&self) -> f64 {
        (self.bottom - self.top).max(0.0) + self.allowance
    }
}

/// Page access granted to the table sub-engine.
pub trait TableHost {
    /// The active column, opening a page at `pos` if none is open.
    fn ensure_page(&mut self, pos: DocPos) -> Region;

    /// Move to the next column, or to a new page after the last column.
    fn advance_column(&mut self, pos: DocPos) -> Region;

    /// Left edge of the active column.
    fn column_x(&self) -> f64;

    /// Record a fragment and move the cursor below it.
    fn push_fragment(&mut self, fragment: Fragment) -> Region;
}

pub struct TableLayoutInput<'a> {
    pub block_index: usize,
    pub block: &'a FlowBlock,
    pub table: &'a TableBlock,
    pub measure: &'a TableMeasure,
    pub column_width: f64,
}

pub fn layout_table_block(input: TableLayoutInput<'_>, host: &mut dyn TableHost) {
    let TableLayoutInput {
        block_index,
        block,
        table,
        measure,
        column_width,
    } = input;
    let pos = |row: usize| DocPos::new(block_index, row);

    let heights: Vec<f64> = measure.rows.iter().map(|r| r.height.max(0.0)).collect();
    let row_count = heights.len();
    let header_count = table.header_row_count.min(row_count);
    let header_height: f64 = heights[..header_count].iter().sum();
    let width = if measure.total_width > 0.0 {
        measure.total_width.min(column_width)
    } else {
        column_width
    };

    let fragment = |from_row: usize, to_row: usize, repeated: usize, x: f64, region: Region| {
        let height = heights[..repeated].iter().sum::<f64>()
            + heights[from_row..to_row].iter().sum::<f64>();
        Fragment {
            block_id: block.id.clone(),
            block_index,
            kind: FragmentKind::Table {
                from_row,
                to_row,
                repeated_header_rows: repeated,
            },
            x,
            y: region.cursor_y,
            width,
            height,
            column: region.column,
            anchors: Vec::new(),
        }
    };

    let mut region = host.ensure_page(pos(0));
    if row_count == 0 {
        let x = host.column_x();
        host.push_fragment(fragment(0, 0, 0, x, region));
        return;
    }

    let total: f64 = heights.iter().sum();
    if block.cannot_split
        && !region.at_column_top
        && total > region.remaining()
        && total <= region.column_height()
    {
        log::debug!("table `{}` cannot split; moving it whole", block.id);
        region = host.advance_column(pos(0));
    }

    // Headers repeat only when they leave room for the next body row
    let repeat_for = |row: usize, region: &Region| -> usize {
        let repeats = table.repeat_header && header_count > 0 && row >= header_count;
        if repeats && header_height + heights[row] <= region.column_height() {
            header_count
        } else {
            0
        }
    };

    let mut row = 0;
    let mut repeated = 0;
    loop {
        let repeat_height: f64 = heights[..repeated].iter().sum();
        let available = region.remaining() - repeat_height;
        let mut take = fitting_count(available, &heights[row..]);

        // Header rows alone never end a column
        if row < header_count && row + take <= header_count && row + take < row_count {
            take = 0;
        }

        if take == 0 {
            if !region.fresh {
                region = host.advance_column(pos(row));
                repeated = repeat_for(row, &region);
                continue;
            }
            take = if row < header_count {
                (header_count + 1).min(row_count) - row
            } else {
                1
            };
            log::warn!(
                "table `{}`: row {row} is taller than an empty page column; placing it unsplit",
                block.id
            );
        }

        let to = row + take;
        let x = host.column_x();
        region = host.push_fragment(fragment(row, to, repeated, x, region));
        row = to;
        if row >= row_count {
            return;
        }

        log::debug!("table `{}` continues at row {row}", block.id);
        region = host.advance_column(pos(row));
        repeated = repeat_for(row, &region);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BlockKind, TableRow};

    /// A single-column host with fixed-height pages.
    struct FakeHost {
        page_height: f64,
        pages: Vec<Vec<Fragment>>,
        cursor_y: f64,
    }

    impl FakeHost {
        fn new(page_height: f64) -> Self {
            Self {
                page_height,
                pages: Vec::new(),
                cursor_y: 0.0,
            }
        }

        fn at_column_top(&self) -> bool {
            self.pages.last().map_or(true, |p| p.is_empty())
        }

        fn region(&self) -> Region {
            Region {
                cursor_y: self.cursor_y,
                top: 0.0,
                bottom: self.page_height,
                allowance: 0.0,
                at_column_top: self.at_column_top(),
                fresh: self.at_column_top(),
                column: 0,
            }
        }
    }

    impl TableHost for FakeHost {
        fn ensure_page(&mut self, _pos: DocPos) -> Region {
            if self.pages.is_empty() {
                self.pages.push(Vec::new());
            }
            self.region()
        }

        fn advance_column(&mut self, _pos: DocPos) -> Region {
            self.pages.push(Vec::new());
            self.cursor_y = 0.0;
            self.region()
        }

        fn column_x(&self) -> f64 {
            0.0
        }

        fn push_fragment(&mut self, fragment: Fragment) -> Region {
            self.cursor_y = fragment.y + fragment.height;
            if let Some(page) = self.pages.last_mut() {
                page.push(fragment);
            }
            self.region()
        }
    }

    fn table(rows: usize, header_rows: usize) -> (FlowBlock, TableBlock) {
        let table = TableBlock {
            rows: vec![TableRow::default(); rows],
            header_row_count: header_rows,
            repeat_header: true,
        };
        (
            FlowBlock::new("t", BlockKind::Table(table.clone())),
            table,
        )
    }

    fn run(host: &mut FakeHost, block: &FlowBlock, table: &TableBlock, heights: &[f64]) {
        let measure = TableMeasure::from_row_heights(heights, &[100.0, 100.0]);
        layout_table_block(
            TableLayoutInput {
                block_index: 0,
                block,
                table,
                measure: &measure,
                column_width: 400.0,
            },
            host,
        );
    }

    fn rows_of(fragment: &Fragment) -> (usize, usize, usize) {
        match fragment.kind {
            FragmentKind::Table {
                from_row,
                to_row,
                repeated_header_rows,
            } => (from_row, to_row, repeated_header_rows),
            _ => panic!("expected a table fragment"),
        }
    }

    #[test]
    fn fits_on_one_page() {
        let (block, table) = table(3, 0);
        let mut host = FakeHost::new(100.0);
        run(&mut host, &block, &table, &[20.0, 20.0, 20.0]);
        assert_eq!(host.pages.len(), 1);
        assert_eq!(rows_of(&host.pages[0][0]), (0, 3, 0));
        assert_eq!(host.pages[0][0].width, 200.0);
    }

    #[test]
    fn splits_between_rows_and_repeats_header() {
        let (block, table) = table(6, 1);
        let mut host = FakeHost::new(100.0);
        run(&mut host, &block, &table, &[20.0, 30.0, 30.0, 30.0, 30.0, 30.0]);
        assert_eq!(host.pages.len(), 3);
        assert_eq!(rows_of(&host.pages[0][0]), (0, 3, 0));
        assert_eq!(rows_of(&host.pages[1][0]), (3, 5, 1));
        assert_eq!(host.pages[1][0].height, 80.0);
        assert_eq!(rows_of(&host.pages[2][0]), (5, 6, 1));
    }

    #[test]
    fn header_alone_is_not_left_behind() {
        let (block, table) = table(3, 1);
        let mut host = FakeHost::new(100.0);
        host.ensure_page(DocPos::default());
        host.cursor_y = 60.0;
        host.pages[0].push(Fragment {
            block_id: "p".to_string(),
            block_index: 0,
            kind: FragmentKind::Marker,
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 60.0,
            column: 0,
            anchors: Vec::new(),
        });
        run(&mut host, &block, &table, &[20.0, 30.0, 30.0]);
        // Header fits in the 40px left, header + first row does not
        assert_eq!(host.pages.len(), 2);
        assert_eq!(rows_of(&host.pages[1][0]), (0, 3, 0));
    }

    #[test]
    fn oversized_row_is_placed_whole() {
        let (block, table) = table(2, 0);
        let mut host = FakeHost::new(100.0);
        run(&mut host, &block, &table, &[150.0, 20.0]);
        assert_eq!(host.pages.len(), 2);
        assert_eq!(host.pages[0][0].height, 150.0);
        assert_eq!(rows_of(&host.pages[1][0]), (1, 2, 0));
    }

    #[test]
    fn cannot_split_table_moves_whole() {
        let (block, table) = table(3, 0);
        let block = block.with_cannot_split();
        let mut host = FakeHost::new(100.0);
        host.ensure_page(DocPos::default());
        host.push_fragment(Fragment {
            block_id: "p".to_string(),
            block_index: 0,
            kind: FragmentKind::Marker,
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 50.0,
            column: 0,
            anchors: Vec::new(),
        });
        run(&mut host, &block, &table, &[20.0, 20.0, 20.0]);
        assert_eq!(host.pages.len(), 2);
        assert_eq!(rows_of(&host.pages[1][0]), (0, 3, 0));
    }
}
