//! Page state for one layout invocation.
//!
//! A [`PageState`] is the page currently being filled: its geometry, the
//! active column and the vertical cursor. It is owned by the paginator and
//! handed to each placement step by `&mut`; nothing else holds it.

use crate::model::{ColumnLayout, HeaderFooterOptions, HeaderFooterVariant, Margins, PageSize};

use super::page_window::{compute_page_window, PageWindowInput};
use super::{
    BreakKind, DocPos, Fragment, HeaderFooterArea, HeaderFooterAreas, HeaderFooterMetrics, Page,
    PageBreakInfo, PageMetrics,
};

/// Page geometry of a document section.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionGeometry {
    pub page_size: PageSize,
    pub margins: Margins,
    pub columns: ColumnLayout,
}

impl SectionGeometry {
    /// Horizontal space between the left and right margins.
    pub fn content_width(&self) -> f64 {
        (self.page_size.w.max(0.0) - self.margins.left.max(0.0) - self.margins.right.max(0.0))
            .max(0.0)
    }
}

/// Tracks where we are on the current page during layout.
#[derive(Debug, Clone)]
pub struct PageState {
    number: usize,
    start: DocPos,
    geometry: SectionGeometry,
    fragments: Vec<Fragment>,
    header_footer_areas: HeaderFooterAreas,
    metrics: PageMetrics,
    page_gap_px: f64,

    pub column: usize,
    pub cursor_y: f64,
    /// Top of the body area.
    pub content_top: f64,
    /// Top of the current column region. Equal to `content_top` unless a
    /// continuous section changed the column layout mid-page.
    pub region_top: f64,
    pub content_bottom: f64,
    pub allowance: f64,
    pub columns: ColumnLayout,
    pub column_width: f64,
    /// Lowest point reached by any column of the current region.
    region_bottom: f64,
    column_has_content: bool,
}

impl PageState {
    /// Open page `number` for a section, reserving header/footer bands.
    pub fn open(
        number: usize,
        start: DocPos,
        geometry: &SectionGeometry,
        header_footer: &HeaderFooterOptions,
        page_gap_px: f64,
    ) -> Self {
        let margins = &geometry.margins;
        let variant = header_footer.variant_for_page(number);
        let header_height = header_footer.header.height_for(variant).map(|h| h.max(0.0));
        let footer_height = header_footer.footer.height_for(variant).map(|h| h.max(0.0));

        // Band content taller than the margin pushes the body inward
        let top = match header_height {
            Some(h) => margins.top.max(margins.header.max(0.0) + h),
            None => margins.top,
        };
        let bottom = match footer_height {
            Some(h) => margins.bottom.max(margins.footer.max(0.0) + h),
            None => margins.bottom,
        };

        let window = compute_page_window(PageWindowInput {
            page_height_px: geometry.page_size.h,
            top_margin_px: top,
            bottom_margin_px: bottom,
        });

        let header_footer_areas = HeaderFooterAreas {
            header: header_height.map(|h| band_area(variant, window.safe_top_margin, margins.header, h)),
            footer: footer_height
                .map(|h| band_area(variant, window.safe_bottom_margin, margins.footer, h)),
        };

        let metrics = PageMetrics {
            page_width_px: geometry.page_size.w.max(0.0),
            page_height_px: geometry.page_size.h.max(0.0),
            margin_top_px: window.safe_top_margin,
            margin_bottom_px: window.safe_bottom_margin,
            margin_left_px: margins.left.max(0.0),
            margin_right_px: margins.right.max(0.0),
            content_height_px: window.content_height_px,
            allowance_px: window.allowance_px,
        };

        let content_top = window.content_top();
        Self {
            number,
            start,
            geometry: geometry.clone(),
            fragments: Vec::new(),
            header_footer_areas,
            metrics,
            page_gap_px,
            column: 0,
            cursor_y: content_top,
            content_top,
            region_top: content_top,
            content_bottom: window.content_bottom(),
            allowance: window.allowance_px,
            columns: geometry.columns,
            column_width: geometry.columns.column_width(geometry.content_width()),
            region_bottom: content_top,
            column_has_content: false,
        }
    }

    pub fn number(&self) -> usize {
        self.number
    }

    /// Space left in the current column, without the allowance.
    pub fn remaining_height(&self) -> f64 {
        (self.content_bottom - self.cursor_y).max(0.0)
    }

    /// Height of an empty column in the current region.
    pub fn column_height(&self) -> f64 {
        (self.content_bottom - self.region_top).max(0.0)
    }

    /// Nothing has been placed in the current column yet.
    pub fn at_column_top(&self) -> bool {
        !self.column_has_content
    }

    /// Nothing placed in the current column, and the column region starts at
    /// the top of the body. Only such a column may take content that does
    /// not fit it.
    pub fn at_fresh_column(&self) -> bool {
        self.at_column_top() && self.region_top <= self.content_top
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn column_x(&self) -> f64 {
        let gap = self.columns.gap.max(0.0);
        self.geometry.margins.left.max(0.0) + self.column as f64 * (self.column_width + gap)
    }

    pub fn has_next_column(&self) -> bool {
        self.column + 1 < self.columns.count()
    }

    /// Move to the top of the next column. The caller checks
    /// [`has_next_column`](Self::has_next_column) first.
    pub fn next_column(&mut self) {
        self.region_bottom = self.region_bottom.max(self.cursor_y);
        self.column += 1;
        self.cursor_y = self.region_top;
        self.column_has_content = false;
    }

    /// Start a new column region below everything placed so far.
    pub fn start_region(&mut self, columns: ColumnLayout) {
        let top = self.region_bottom.max(self.cursor_y);
        self.columns = columns;
        self.column_width = columns.column_width(self.geometry.content_width());
        self.column = 0;
        self.region_top = top;
        self.region_bottom = top;
        self.cursor_y = top;
        self.column_has_content = false;
    }

    /// Record a fragment and move the cursor to its bottom.
    pub fn push(&mut self, fragment: Fragment) {
        self.cursor_y = fragment.y + fragment.height;
        self.region_bottom = self.region_bottom.max(self.cursor_y);
        self.column_has_content = true;
        self.fragments.push(fragment);
    }

    /// Add vertical space (paragraph spacing) below the last fragment.
    pub fn advance(&mut self, dy: f64) {
        self.cursor_y += dy.max(0.0);
    }

    /// Close the page. `pos` is where the next page's content starts.
    pub fn finish(self, pos: DocPos, kind: BreakKind) -> Page {
        let fitted_bottom = self
            .fragments
            .iter()
            .map(|f| f.y + f.height)
            .fold(self.content_top, f64::max);

        Page {
            number: self.number,
            size: self.geometry.page_size,
            columns: self.geometry.columns,
            start: self.start,
            fragments: self.fragments,
            break_info: PageBreakInfo {
                pos,
                kind,
                start_offset_px: self.content_top,
                fitted_bottom,
                bottom: self.content_bottom,
            },
            page_bottom_spacing_px: (self.content_bottom - fitted_bottom).max(0.0),
            page_gap_px: self.page_gap_px,
            header_footer_areas: self.header_footer_areas,
            metrics: self.metrics,
        }
    }
}

fn band_area(
    variant: HeaderFooterVariant,
    effective_margin: f64,
    distance: f64,
    content_height: f64,
) -> HeaderFooterArea {
    HeaderFooterArea {
        variant,
        metrics: HeaderFooterMetrics {
            effective_height_px: effective_margin,
            offset_px: distance.max(0.0),
            content_height_px: content_height,
        },
    }
}
