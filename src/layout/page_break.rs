//! # Page Break Decisions
//!
//! Logic for deciding when and how to break a run of lines (or rows) across
//! pages and columns. The caller supplies the space left in the current
//! column, already widened by the rounding allowance.

/// What to do with the remaining lines of a block.
#[derive(Debug, Clone, PartialEq)]
pub enum BreakDecision {
    /// Place all remaining lines here.
    Place,
    /// Move everything to the next column or page.
    MoveToNextPage,
    /// Place some lines here and continue in the next column or page.
    Split {
        /// How many lines fit in the current column.
        items_on_current_page: usize,
    },
}

/// How many leading items fit within `available`.
pub fn fitting_count(available: f64, heights: &[f64]) -> usize {
    let mut running = 0.0;
    let mut count = 0;
    for &h in heights {
        if running + h > available {
            break;
        }
        running += h;
        count += 1;
    }
    count
}

/// Given the remaining space in a column and the heights of the remaining
/// lines, decide how to break.
///
/// `min_orphan_lines` is the fewest lines allowed at the bottom of a column,
/// `min_widow_lines` the fewest carried over to the next one.
pub fn decide_break(
    remaining_height: f64,
    child_heights: &[f64],
    is_breakable: bool,
    min_orphan_lines: usize,
    min_widow_lines: usize,
) -> BreakDecision {
    let total: f64 = child_heights.iter().sum();

    if total <= remaining_height {
        return BreakDecision::Place;
    }

    if !is_breakable {
        return BreakDecision::MoveToNextPage;
    }

    let fit_count = fitting_count(remaining_height, child_heights);
    let total_items = child_heights.len();

    // Too few lines would stay behind (orphan)
    if fit_count < min_orphan_lines && fit_count < total_items {
        return BreakDecision::MoveToNextPage;
    }

    // Too few lines would be carried over (widow): pull some back
    let remaining_items = total_items - fit_count;
    if remaining_items < min_widow_lines && remaining_items > 0 {
        let adjusted = fit_count.saturating_sub(min_widow_lines - remaining_items);
        if adjusted == 0 || adjusted < min_orphan_lines {
            return BreakDecision::MoveToNextPage;
        }
        return BreakDecision::Split {
            items_on_current_page: adjusted,
        };
    }

    if fit_count == 0 {
        return BreakDecision::MoveToNextPage;
    }

    BreakDecision::Split {
        items_on_current_page: fit_count,
    }
}
