//! # Flow Layout Engine
//!
//! This is the heart of Folio.
//!
//! The engine never lays content out on an infinite canvas and slices it
//! afterwards. It walks the measured blocks in document order and, before
//! placing anything, asks: "does this fit in the current column?"
//!
//! 1. Apply any pending forced break (page, column, section).
//! 2. If the block fits: place it, move the cursor down.
//! 3. If it doesn't fit and is unbreakable: move to the next column or page
//!    and place it there.
//! 4. If it doesn't fit and is breakable: place the lines that fit (honoring
//!    widow/orphan control), continue the rest in the next column or page.
//! 5. Tables go to [`table`], which splits them between rows and repeats
//!    header rows on every continuation.
//!
//! The only mutable state is the [`PageState`](cursor::PageState) of the page
//! being filled, owned by the paginator for the duration of one call. The
//! same inputs always produce the same [`Layout`].

pub mod cursor;
pub mod page_break;
pub mod page_window;
pub mod table;

use serde::Serialize;

use crate::error::LayoutError;
use crate::model::*;

use cursor::{PageState, SectionGeometry};
use page_break::{decide_break, fitting_count, BreakDecision};
use table::{Region, TableHost, TableLayoutInput};

// ── Output ──────────────────────────────────────────────────────

/// A logical position in the document: a block index and, for paragraphs
/// and tables, the line or row within it. Orders by block, then line.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
)]
pub struct DocPos {
    pub block: usize,
    pub line: usize,
}

impl DocPos {
    pub fn new(block: usize, line: usize) -> Self {
        Self { block, line }
    }
}

/// The paginated result of one layout call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Layout {
    pub pages: Vec<Page>,
}

impl Layout {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Every fragment of a block, with the 1-based page it sits on.
    pub fn fragments_for<'a>(
        &'a self,
        block_id: &'a str,
    ) -> impl Iterator<Item = (usize, &'a Fragment)> + 'a {
        self.pages.iter().flat_map(move |page| {
            page.fragments
                .iter()
                .filter(move |f| f.block_id == block_id)
                .map(move |f| (page.number, f))
        })
    }

    /// Break positions of every page, in order.
    pub fn break_positions(&self) -> Vec<DocPos> {
        self.pages.iter().map(|p| p.break_info.pos).collect()
    }
}

/// A fully laid-out page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// 1-based page number.
    pub number: usize,
    pub size: PageSize,
    /// Column layout the page opened with.
    pub columns: ColumnLayout,
    /// Position of the first content on this page.
    pub start: DocPos,
    pub fragments: Vec<Fragment>,
    #[serde(rename = "break")]
    pub break_info: PageBreakInfo,
    pub page_bottom_spacing_px: f64,
    pub page_gap_px: f64,
    pub header_footer_areas: HeaderFooterAreas,
    pub metrics: PageMetrics,
}

/// Where and why a page ended.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageBreakInfo {
    /// Position at which the next page's content starts.
    pub pos: DocPos,
    pub kind: BreakKind,
    /// Top of the body area.
    pub start_offset_px: f64,
    /// Bottom of the last placed fragment.
    pub fitted_bottom: f64,
    /// Bottom boundary of the body area.
    pub bottom: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BreakKind {
    /// Content overflowed the page.
    Fitted,
    /// Manual page break.
    Page,
    /// Manual column break on the last column.
    Column,
    /// Section boundary.
    Section,
    /// Last page of the document.
    End,
}

impl BreakKind {
    pub fn is_forced(&self) -> bool {
        matches!(self, BreakKind::Page | BreakKind::Column | BreakKind::Section)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct HeaderFooterAreas {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<HeaderFooterArea>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<HeaderFooterArea>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeaderFooterArea {
    pub variant: HeaderFooterVariant,
    pub metrics: HeaderFooterMetrics,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderFooterMetrics {
    /// Margin actually reserved: the configured margin, or more when the
    /// band content needs it.
    pub effective_height_px: f64,
    /// Distance from the page edge to the band.
    pub offset_px: f64,
    pub content_height_px: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetrics {
    pub page_width_px: f64,
    pub page_height_px: f64,
    pub margin_top_px: f64,
    pub margin_bottom_px: f64,
    pub margin_left_px: f64,
    pub margin_right_px: f64,
    pub content_height_px: f64,
    pub allowance_px: f64,
}

/// The part of one block placed in one column of one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Fragment {
    pub block_id: String,
    pub block_index: usize,
    pub kind: FragmentKind,
    /// Absolute position on the page (top-left corner).
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub column: usize,
    /// Bookmarks that resolve to this fragment's page.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub anchors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FragmentKind {
    #[serde(rename_all = "camelCase")]
    Paragraph {
        from_line: usize,
        to_line: usize,
        continues_from_prev: bool,
        continues_on_next: bool,
    },
    Image,
    #[serde(rename_all = "camelCase")]
    Table {
        from_row: usize,
        to_row: usize,
        /// Header rows repeated above `from_row`.
        repeated_header_rows: usize,
    },
    /// Zero-height placeholder (section boundaries, unknown blocks).
    Marker,
}

// ── Entry points ────────────────────────────────────────────────

/// Lay out measured blocks into pages.
pub fn layout_document(
    blocks: &[FlowBlock],
    measures: &[Measure],
    options: &LayoutOptions,
) -> Result<Layout, LayoutError> {
    LayoutEngine::new(options).layout(blocks, measures)
}

/// The main layout engine.
pub struct LayoutEngine<'a> {
    options: &'a LayoutOptions,
}

impl<'a> LayoutEngine<'a> {
    pub fn new(options: &'a LayoutOptions) -> Self {
        Self { options }
    }

    /// Main entry point: lay out a document into pages.
    pub fn layout(&self, blocks: &[FlowBlock], measures: &[Measure]) -> Result<Layout, LayoutError> {
        validate_inputs(blocks, measures)?;

        let mut paginator = Paginator::new(self.options);
        for index in 0..blocks.len() {
            paginator.place_block(blocks, measures, index);
        }
        let layout = paginator.finish(blocks.len());

        log::debug!(
            "laid out {} blocks into {} pages",
            blocks.len(),
            layout.pages.len()
        );
        Ok(layout)
    }
}

/// Check the index correspondence between blocks and measures.
pub(crate) fn validate_inputs(blocks: &[FlowBlock], measures: &[Measure]) -> Result<(), LayoutError> {
    if blocks.len() != measures.len() {
        return Err(LayoutError::MeasureCountMismatch {
            blocks: blocks.len(),
            measures: measures.len(),
        });
    }

    for (index, (block, measure)) in blocks.iter().zip(measures).enumerate() {
        let matches = matches!(
            (&block.kind, measure),
            (BlockKind::Paragraph(_), Measure::Paragraph(_))
                | (BlockKind::Image(_), Measure::Image(_))
                | (BlockKind::Table(_), Measure::Table(_))
                | (
                    BlockKind::SectionBreak(_) | BlockKind::PageBreak | BlockKind::ColumnBreak,
                    Measure::Empty
                )
                | (BlockKind::Unknown, _)
        );
        if !matches {
            return Err(LayoutError::MeasureKindMismatch {
                index,
                id: block.id.clone(),
                expected: block.kind_name(),
                found: measure.name(),
            });
        }

        if let (BlockKind::Table(table), Measure::Table(tm)) = (&block.kind, measure) {
            if table.rows.len() != tm.rows.len() {
                return Err(LayoutError::TableRowMismatch {
                    id: block.id.clone(),
                    rows: table.rows.len(),
                    measured: tm.rows.len(),
                });
            }
        }
    }
    Ok(())
}

// ── Paginator ───────────────────────────────────────────────────

/// A break requested by a marker, applied when the next block arrives so
/// that a trailing marker never produces an empty page.
#[derive(Debug, Clone, Copy, PartialEq)]
enum PendingBreak {
    Page,
    Column,
    Section(SectionStart),
}

struct Paginator<'a> {
    options: &'a LayoutOptions,
    section: SectionGeometry,
    pages: Vec<Page>,
    state: Option<PageState>,
    pending: Option<PendingBreak>,
}

impl<'a> Paginator<'a> {
    fn new(options: &'a LayoutOptions) -> Self {
        Self {
            options,
            section: SectionGeometry {
                page_size: options.page_size,
                margins: options.margins,
                columns: options.columns,
            },
            pages: Vec::new(),
            state: None,
            pending: None,
        }
    }

    fn finish(mut self, block_count: usize) -> Layout {
        self.finish_page(DocPos::new(block_count, 0), BreakKind::End);
        Layout { pages: self.pages }
    }

    /// The open page, opening one that starts at `pos` if needed.
    fn ensure_page(&mut self, pos: DocPos) -> &mut PageState {
        let number = self.pages.len() + 1;
        let section = &self.section;
        let options = self.options;
        self.state.get_or_insert_with(|| {
            PageState::open(number, pos, section, &options.header_footer, options.page_gap_px)
        })
    }

    fn finish_page(&mut self, pos: DocPos, kind: BreakKind) {
        if let Some(state) = self.state.take() {
            self.pages.push(state.finish(pos, kind));
        }
    }

    /// Overflow: next column, or a fresh page after the last column.
    fn advance_column(&mut self, pos: DocPos) -> &mut PageState {
        if !self.next_column() {
            self.finish_page(pos, BreakKind::Fitted);
        }
        self.ensure_page(pos)
    }

    /// Move to the next column of the open page, if there is one.
    fn next_column(&mut self) -> bool {
        match self.state.as_mut() {
            Some(state) if state.has_next_column() => {
                state.next_column();
                true
            }
            _ => false,
        }
    }

    fn apply_pending(&mut self, pending: PendingBreak, pos: DocPos) {
        match pending {
            PendingBreak::Page => self.finish_page(pos, BreakKind::Page),
            PendingBreak::Column => {
                if !self.next_column() {
                    self.finish_page(pos, BreakKind::Column);
                }
            }
            PendingBreak::Section(start) => {
                self.finish_page(pos, BreakKind::Section);
                let next_number = self.pages.len() + 1;
                let blank_needed = match start {
                    SectionStart::EvenPage => next_number % 2 == 1,
                    SectionStart::OddPage => next_number % 2 == 0,
                    _ => false,
                };
                if blank_needed && !self.pages.is_empty() {
                    log::debug!("inserting blank page {next_number} for {start:?} section");
                    self.ensure_page(pos);
                    self.finish_page(pos, BreakKind::Section);
                }
            }
        }
    }

    fn apply_break_before(&mut self, kind: BreakBefore, pos: DocPos) {
        let Some(state) = self.state.as_ref() else {
            return;
        };
        let (page_empty, at_column_top) = (state.is_empty(), state.at_column_top());
        match kind {
            BreakBefore::Page if !page_empty => self.finish_page(pos, BreakKind::Page),
            BreakBefore::Column if !at_column_top => {
                if !self.next_column() {
                    self.finish_page(pos, BreakKind::Column);
                }
            }
            _ => {}
        }
    }

    fn place_block(&mut self, blocks: &[FlowBlock], measures: &[Measure], index: usize) {
        let block = &blocks[index];
        let pos = DocPos::new(index, 0);

        if let Some(pending) = self.pending.take() {
            self.apply_pending(pending, pos);
        }
        if let Some(kind) = block.break_before {
            self.apply_break_before(kind, pos);
        }

        match (&block.kind, &measures[index]) {
            (BlockKind::PageBreak, _) => {
                self.ensure_page(pos);
                self.pending = Some(PendingBreak::Page);
            }
            (BlockKind::ColumnBreak, _) => {
                self.ensure_page(pos);
                self.pending = Some(PendingBreak::Column);
            }
            (BlockKind::SectionBreak(section), _) => {
                self.place_section_break(index, block, section);
            }
            (BlockKind::Paragraph(paragraph), Measure::Paragraph(measure)) => {
                self.keep_with_next(blocks, measures, index);
                self.place_paragraph(index, block, paragraph, measure);
            }
            (BlockKind::Image(_), Measure::Image(measure)) => {
                self.keep_with_next(blocks, measures, index);
                self.place_image(index, block, measure);
            }
            (BlockKind::Table(table), Measure::Table(measure)) => {
                self.keep_with_next(blocks, measures, index);
                let column_width = self.ensure_page(pos).column_width;
                table::layout_table_block(
                    TableLayoutInput {
                        block_index: index,
                        block,
                        table,
                        measure,
                        column_width,
                    },
                    self,
                );
            }
            _ => self.place_marker(index, block),
        }
    }

    fn place_marker(&mut self, index: usize, block: &FlowBlock) {
        let state = self.ensure_page(DocPos::new(index, 0));
        let fragment = Fragment {
            block_id: block.id.clone(),
            block_index: index,
            kind: FragmentKind::Marker,
            x: state.column_x(),
            y: state.cursor_y,
            width: state.column_width,
            height: 0.0,
            column: state.column,
            anchors: Vec::new(),
        };
        state.push(fragment);
    }

    /// The marker stays with the section it ends; the next section's
    /// geometry applies from the next page (or region, for continuous).
    fn place_section_break(&mut self, index: usize, block: &FlowBlock, section: &SectionBreak) {
        self.place_marker(index, block);

        let next = SectionGeometry {
            page_size: section.page_size.unwrap_or(self.section.page_size),
            margins: section.margins.unwrap_or(self.section.margins),
            columns: section.columns.unwrap_or(self.section.columns),
        };

        match section.start {
            SectionStart::Continuous => {
                if let Some(state) = self.state.as_mut() {
                    if state.columns != next.columns {
                        log::debug!(
                            "continuous section at block {index}: {} -> {} columns",
                            state.columns.count(),
                            next.columns.count()
                        );
                        state.start_region(next.columns);
                    }
                }
            }
            start => self.pending = Some(PendingBreak::Section(start)),
        }
        self.section = next;
    }

    /// Move a keep-with-next chain to the next column when it would be
    /// separated from the start of the block that follows it.
    fn keep_with_next(&mut self, blocks: &[FlowBlock], measures: &[Measure], index: usize) {
        if !blocks[index].keep_with_next {
            return;
        }
        let Some(state) = self.state.as_ref() else {
            return;
        };
        if state.at_column_top() {
            return;
        }

        let mut required = full_height(&blocks[index], &measures[index]);
        let mut kept_with = 0;
        let mut i = index;
        loop {
            let next = i + 1;
            if !blocks[i].keep_with_next || next >= blocks.len() || forces_break(&blocks[next]) {
                break;
            }
            kept_with += 1;
            if blocks[next].keep_with_next {
                required += full_height(&blocks[next], &measures[next]);
                i = next;
            } else {
                required += leading_height(&blocks[next], &measures[next]);
                break;
            }
        }
        if kept_with == 0 {
            return;
        }

        let available = state.remaining_height() + state.allowance;
        if required > available && required <= state.column_height() + state.allowance {
            log::debug!(
                "keep-with-next: moving block {index} ({required:.2}px needed, {available:.2}px left)"
            );
            self.advance_column(DocPos::new(index, 0));
        }
    }

    fn place_paragraph(
        &mut self,
        index: usize,
        block: &FlowBlock,
        paragraph: &ParagraphBlock,
        measure: &ParagraphMeasure,
    ) {
        let heights = measure.line_heights();
        if heights.is_empty() {
            self.place_atomic(
                index,
                block,
                measure.total_height,
                None,
                FragmentKind::Paragraph {
                    from_line: 0,
                    to_line: 0,
                    continues_from_prev: false,
                    continues_on_next: false,
                },
            );
            return;
        }

        let (min_orphans, min_widows) = if paragraph.widow_control { (2, 2) } else { (1, 1) };
        let breakable = !block.cannot_split;
        let mut from = 0;

        loop {
            let pos = DocPos::new(index, from);
            let state = self.ensure_page(pos);
            let at_top = state.at_column_top();
            let fresh = state.at_fresh_column();
            let spacing_before = if from == 0 && !at_top { paragraph.spacing.before } else { 0.0 };
            let available = state.remaining_height() + state.allowance - spacing_before;
            let rest = &heights[from..];

            let mut take = match decide_break(available, rest, breakable, min_orphans, min_widows) {
                BreakDecision::Place => rest.len(),
                BreakDecision::Split {
                    items_on_current_page,
                } => items_on_current_page,
                BreakDecision::MoveToNextPage => 0,
            };

            if take == 0 {
                if !fresh {
                    self.advance_column(pos);
                    continue;
                }
                // Not even an empty page-top column holds it
                take = if breakable {
                    fitting_count(available, rest).max(1)
                } else {
                    rest.len()
                };
                log::warn!(
                    "block `{}` overflows an empty column; placing {take} line(s) anyway",
                    block.id
                );
            }

            let to = from + take;
            let height: f64 = rest[..take].iter().sum();
            let state = self.ensure_page(pos);
            let fragment = Fragment {
                block_id: block.id.clone(),
                block_index: index,
                kind: FragmentKind::Paragraph {
                    from_line: from,
                    to_line: to,
                    continues_from_prev: from > 0,
                    continues_on_next: to < heights.len(),
                },
                x: state.column_x(),
                y: state.cursor_y + spacing_before,
                width: state.column_width,
                height,
                column: state.column,
                anchors: if from == 0 {
                    paragraph.bookmarks.clone()
                } else {
                    Vec::new()
                },
            };
            state.push(fragment);

            if to >= heights.len() {
                state.advance(paragraph.spacing.after);
                return;
            }
            from = to;
            self.advance_column(DocPos::new(index, from));
        }
    }

    fn place_image(&mut self, index: usize, block: &FlowBlock, measure: &ImageMeasure) {
        self.place_atomic(index, block, measure.height, Some(measure.width), FragmentKind::Image);
    }

    /// Place a block that is never divided.
    fn place_atomic(
        &mut self,
        index: usize,
        block: &FlowBlock,
        height: f64,
        width: Option<f64>,
        kind: FragmentKind,
    ) {
        let pos = DocPos::new(index, 0);
        let height = height.max(0.0);
        loop {
            let state = self.ensure_page(pos);
            if height <= state.remaining_height() + state.allowance {
                break;
            }
            if state.at_fresh_column() {
                log::warn!("block `{}` ({height:.2}px) is taller than an empty column", block.id);
                break;
            }
            self.advance_column(pos);
        }

        let state = self.ensure_page(pos);
        let fragment = Fragment {
            block_id: block.id.clone(),
            block_index: index,
            kind,
            x: state.column_x(),
            y: state.cursor_y,
            width: width.unwrap_or(state.column_width),
            height,
            column: state.column,
            anchors: Vec::new(),
        };
        state.push(fragment);
    }
}

impl TableHost for Paginator<'_> {
    fn ensure_page(&mut self, pos: DocPos) -> Region {
        Region::of(Paginator::ensure_page(self, pos))
    }

    fn advance_column(&mut self, pos: DocPos) -> Region {
        Region::of(Paginator::advance_column(self, pos))
    }

    fn column_x(&self) -> f64 {
        self.state.as_ref().map_or(0.0, PageState::column_x)
    }

    fn push_fragment(&mut self, fragment: Fragment) -> Region {
        let pos = DocPos::new(fragment.block_index, 0);
        let state = Paginator::ensure_page(self, pos);
        state.push(fragment);
        Region::of(state)
    }
}

impl Region {
    fn of(state: &PageState) -> Self {
        Region {
            cursor_y: state.cursor_y,
            top: state.region_top,
            bottom: state.content_bottom,
            allowance: state.allowance,
            at_column_top: state.at_column_top(),
            fresh: state.at_fresh_column(),
            column: state.column,
        }
    }
}

/// Height of a block laid out in one piece, spacing included.
fn full_height(block: &FlowBlock, measure: &Measure) -> f64 {
    match (&block.kind, measure) {
        (BlockKind::Paragraph(p), Measure::Paragraph(m)) => {
            p.spacing.before + m.total_height + p.spacing.after
        }
        _ => measure.total_height(),
    }
}

/// The smallest leading part of a block that may start a column.
fn leading_height(block: &FlowBlock, measure: &Measure) -> f64 {
    if block.cannot_split {
        return full_height(block, measure);
    }
    match (&block.kind, measure) {
        (BlockKind::Paragraph(p), Measure::Paragraph(m)) => {
            let lines = if p.widow_control { 2 } else { 1 };
            p.spacing.before + m.lines.iter().take(lines).map(|l| l.height).sum::<f64>()
        }
        (BlockKind::Table(t), Measure::Table(m)) => {
            let end = (t.header_row_count + 1).min(m.rows.len());
            m.rows_height(0..end)
        }
        _ => measure.total_height(),
    }
}

fn forces_break(block: &FlowBlock) -> bool {
    block.break_before.is_some()
        || match &block.kind {
            BlockKind::PageBreak | BlockKind::ColumnBreak => true,
            BlockKind::SectionBreak(s) => s.start != SectionStart::Continuous,
            _ => false,
        }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(page_h: f64, margin: f64) -> LayoutOptions {
        LayoutOptions::default()
            .with_page_size(600.0, page_h)
            .with_margins(Margins::uniform(margin))
    }

    fn para(id: &str, lines: usize, line_h: f64) -> (FlowBlock, Measure) {
        (
            FlowBlock::paragraph(id, id),
            Measure::Paragraph(ParagraphMeasure::from_heights(&vec![line_h; lines])),
        )
    }

    fn run(items: Vec<(FlowBlock, Measure)>, options: &LayoutOptions) -> Layout {
        let (blocks, measures): (Vec<_>, Vec<_>) = items.into_iter().unzip();
        layout_document(&blocks, &measures, options).unwrap()
    }

    #[test]
    fn empty_document_has_no_pages() {
        let layout = run(vec![], &LayoutOptions::default());
        assert!(layout.pages.is_empty());
    }

    #[test]
    fn mismatched_lengths_fail_fast() {
        let blocks = vec![FlowBlock::paragraph("a", "a")];
        let err = layout_document(&blocks, &[], &LayoutOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            LayoutError::MeasureCountMismatch {
                blocks: 1,
                measures: 0
            }
        ));
    }

    #[test]
    fn wrong_measure_kind_is_rejected() {
        let blocks = vec![FlowBlock::paragraph("a", "a")];
        let measures = vec![Measure::Image(ImageMeasure {
            width: 10.0,
            height: 10.0,
        })];
        let err = layout_document(&blocks, &measures, &LayoutOptions::default()).unwrap_err();
        assert!(matches!(err, LayoutError::MeasureKindMismatch { index: 0, .. }));
    }

    #[test]
    fn paragraph_splits_at_line_boundary() {
        // 200px content, 20px lines: 10 lines per page
        let layout = run(vec![para("p", 15, 20.0)], &options(400.0, 100.0));
        assert_eq!(layout.page_count(), 2);
        let first = &layout.pages[0].fragments[0];
        assert_eq!(
            first.kind,
            FragmentKind::Paragraph {
                from_line: 0,
                to_line: 10,
                continues_from_prev: false,
                continues_on_next: true,
            }
        );
        assert_eq!(layout.pages[0].break_info.pos, DocPos::new(0, 10));
        assert_eq!(layout.pages[0].break_info.kind, BreakKind::Fitted);
        assert_eq!(layout.pages[1].break_info.kind, BreakKind::End);
    }

    #[test]
    fn single_trailing_line_is_pushed_to_next_page() {
        // 9 lines used; the next paragraph would leave one line at the bottom
        let layout = run(
            vec![para("a", 9, 20.0), para("b", 3, 20.0)],
            &options(400.0, 100.0),
        );
        assert_eq!(layout.page_count(), 2);
        assert_eq!(layout.pages[0].fragments.len(), 1);
        assert_eq!(layout.pages[1].fragments[0].block_id, "b");
        assert_eq!(layout.pages[1].start, DocPos::new(1, 0));
    }

    #[test]
    fn allowance_absorbs_rounding() {
        // 200.5px of lines in a 200px window
        let layout = run(
            vec![(
                FlowBlock::paragraph("p", "p"),
                Measure::Paragraph(ParagraphMeasure::from_heights(&[100.0, 100.5])),
            )],
            &options(400.0, 100.0),
        );
        assert_eq!(layout.page_count(), 1);
    }

    #[test]
    fn cannot_split_moves_whole() {
        let (block, measure) = para("b", 5, 20.0);
        let layout = run(
            vec![para("a", 7, 20.0), (block.with_cannot_split(), measure)],
            &options(400.0, 100.0),
        );
        assert_eq!(layout.page_count(), 2);
        let (page, fragment) = layout.fragments_for("b").next().unwrap();
        assert_eq!(page, 2);
        assert_eq!(fragment.height, 100.0);
        assert_eq!(layout.fragments_for("b").count(), 1);
    }

    #[test]
    fn columns_fill_before_new_page() {
        let opts = options(400.0, 100.0).with_columns(2, 20.0);
        let layout = run(vec![para("p", 15, 20.0)], &opts);
        assert_eq!(layout.page_count(), 1);
        let fragments = &layout.pages[0].fragments;
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[1].column, 1);
        assert_eq!(fragments[1].y, 100.0);
        assert_eq!(fragments[1].x, 100.0 + 190.0 + 20.0);
    }

    #[test]
    fn keep_with_next_moves_heading() {
        let (heading, heading_m) = para("h", 1, 20.0);
        let layout = run(
            vec![
                para("a", 8, 20.0),
                (heading.with_keep_with_next(), heading_m),
                para("b", 4, 20.0),
            ],
            &options(400.0, 100.0),
        );
        // Heading fits (9 lines) but the next paragraph's first two lines don't
        let (page, _) = layout.fragments_for("h").next().unwrap();
        assert_eq!(page, 2);
    }

    #[test]
    fn trailing_page_break_adds_no_page() {
        let layout = run(
            vec![
                para("a", 1, 20.0),
                (FlowBlock::new("br", BlockKind::PageBreak), Measure::Empty),
            ],
            &options(400.0, 100.0),
        );
        assert_eq!(layout.page_count(), 1);
    }

    #[test]
    fn consecutive_page_breaks_leave_a_blank_page() {
        let layout = run(
            vec![
                para("a", 1, 20.0),
                (FlowBlock::new("br1", BlockKind::PageBreak), Measure::Empty),
                (FlowBlock::new("br2", BlockKind::PageBreak), Measure::Empty),
                para("b", 1, 20.0),
            ],
            &options(400.0, 100.0),
        );
        assert_eq!(layout.page_count(), 3);
        assert!(layout.pages[1].fragments.is_empty());
        assert_eq!(layout.pages[0].break_info.kind, BreakKind::Page);
    }

    #[test]
    fn unknown_blocks_are_zero_height_markers() {
        let layout = run(
            vec![
                (FlowBlock::new("x", BlockKind::Unknown), Measure::Empty),
                para("a", 1, 20.0),
            ],
            &options(400.0, 100.0),
        );
        let marker = &layout.pages[0].fragments[0];
        assert_eq!(marker.kind, FragmentKind::Marker);
        assert_eq!(marker.height, 0.0);
        assert_eq!(layout.pages[0].fragments[1].y, 100.0);
    }

    #[test]
    fn spacing_before_is_suppressed_at_page_top() {
        let mut block = FlowBlock::paragraph("a", "a");
        if let BlockKind::Paragraph(p) = &mut block.kind {
            p.spacing = ParagraphSpacing {
                before: 30.0,
                after: 10.0,
            };
        }
        let measure = Measure::Paragraph(ParagraphMeasure::from_heights(&[20.0]));
        let layout = run(
            vec![(block.clone(), measure.clone()), (block, measure)],
            &options(400.0, 100.0),
        );
        let fragments = &layout.pages[0].fragments;
        assert_eq!(fragments[0].y, 100.0);
        // 100 + 20 + 10 after + 30 before
        assert_eq!(fragments[1].y, 160.0);
    }

    fn continuous_two_columns() -> (FlowBlock, Measure) {
        let section = SectionBreak {
            start: SectionStart::Continuous,
            columns: Some(ColumnLayout { count: 2, gap: 20.0 }),
            ..Default::default()
        };
        (FlowBlock::new("s", BlockKind::SectionBreak(section)), Measure::Empty)
    }

    fn assert_inside_body(layout: &Layout) {
        for page in &layout.pages {
            for f in &page.fragments {
                assert!(
                    f.y + f.height <= page.break_info.bottom + page.metrics.allowance_px,
                    "{} overflows page {}",
                    f.block_id,
                    page.number
                );
            }
        }
    }

    #[test]
    fn paragraph_after_continuous_section_at_page_bottom_moves_on() {
        let layout = run(
            vec![para("a", 10, 20.0), continuous_two_columns(), para("b", 4, 20.0)],
            &options(400.0, 100.0),
        );
        assert_inside_body(&layout);
        let b: Vec<_> = layout.fragments_for("b").collect();
        assert_eq!(b.len(), 1, "lines were stranded across columns");
        assert_eq!(b[0].0, 2);
        assert_eq!(b[0].1.y, 100.0);
        assert_eq!(b[0].1.column, 0);
        assert_eq!(layout.pages[0].break_info.kind, BreakKind::Fitted);
    }

    #[test]
    fn image_after_continuous_section_near_page_bottom_moves_on() {
        let image = FlowBlock::new("img", BlockKind::Image(ImageBlock::default()));
        let measure = Measure::Image(ImageMeasure {
            width: 100.0,
            height: 150.0,
        });
        let layout = run(
            vec![para("a", 8, 20.0), continuous_two_columns(), (image, measure)],
            &options(400.0, 100.0),
        );
        assert_inside_body(&layout);
        let (page, fragment) = layout.fragments_for("img").next().unwrap();
        assert_eq!(page, 2);
        assert_eq!(fragment.y, 100.0);
    }

    #[test]
    fn table_after_continuous_section_near_page_bottom_moves_on() {
        let table = TableBlock {
            rows: vec![TableRow::default(); 3],
            header_row_count: 1,
            repeat_header: true,
        };
        let measure = Measure::Table(TableMeasure::from_row_heights(&[30.0; 3], &[90.0]));
        let layout = run(
            vec![
                para("a", 9, 20.0),
                continuous_two_columns(),
                (FlowBlock::new("t", BlockKind::Table(table)), measure),
            ],
            &options(400.0, 100.0),
        );
        assert_inside_body(&layout);
        let fragments: Vec<_> = layout.fragments_for("t").collect();
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].0, 2);
        assert_eq!(
            fragments[0].1.kind,
            FragmentKind::Table {
                from_row: 0,
                to_row: 3,
                repeated_header_rows: 0,
            }
        );
    }

    #[test]
    fn column_break_moves_to_next_column() {
        let layout = run(
            vec![
                para("a", 1, 20.0),
                (FlowBlock::new("cb", BlockKind::ColumnBreak), Measure::Empty),
                para("b", 1, 20.0),
            ],
            &options(400.0, 100.0).with_columns(2, 20.0),
        );
        assert_eq!(layout.page_count(), 1);
        let (_, b) = layout.fragments_for("b").next().unwrap();
        assert_eq!(b.column, 1);
        assert_eq!(b.y, 100.0);
    }

    #[test]
    fn column_break_in_last_column_ends_the_page() {
        let layout = run(
            vec![
                para("a", 1, 20.0),
                (FlowBlock::new("cb", BlockKind::ColumnBreak), Measure::Empty),
                para("b", 1, 20.0),
            ],
            &options(400.0, 100.0),
        );
        assert_eq!(layout.page_count(), 2);
        assert_eq!(layout.pages[0].break_info.kind, BreakKind::Column);
        assert_eq!(layout.pages[1].start, DocPos::new(2, 0));
    }

    #[test]
    fn break_before_page_on_an_empty_page_adds_nothing() {
        let (b, b_m) = para("b", 1, 20.0);
        let layout = run(
            vec![(b.with_break_before(BreakBefore::Page), b_m)],
            &options(400.0, 100.0),
        );
        assert_eq!(layout.page_count(), 1);
    }

    #[test]
    fn break_before_page_starts_a_new_page() {
        let (b, b_m) = para("b", 1, 20.0);
        let layout = run(
            vec![para("a", 1, 20.0), (b.with_break_before(BreakBefore::Page), b_m)],
            &options(400.0, 100.0),
        );
        assert_eq!(layout.page_count(), 2);
        assert_eq!(layout.pages[0].break_info.kind, BreakKind::Page);
        assert_eq!(layout.fragments_for("b").next().unwrap().0, 2);
    }

    #[test]
    fn break_before_column_uses_the_next_column() {
        let (b, b_m) = para("b", 1, 20.0);
        let layout = run(
            vec![para("a", 1, 20.0), (b.with_break_before(BreakBefore::Column), b_m)],
            &options(400.0, 100.0).with_columns(2, 20.0),
        );
        assert_eq!(layout.page_count(), 1);
        assert_eq!(layout.fragments_for("b").next().unwrap().1.column, 1);
    }

    #[test]
    fn odd_page_section_inserts_blank_page() {
        let section = SectionBreak {
            start: SectionStart::OddPage,
            ..Default::default()
        };
        let layout = run(
            vec![
                para("a", 1, 20.0),
                (FlowBlock::new("s", BlockKind::SectionBreak(section)), Measure::Empty),
                para("b", 1, 20.0),
            ],
            &options(400.0, 100.0),
        );
        // Page 2 would be even; a blank page keeps the section on page 3
        assert_eq!(layout.page_count(), 3);
        assert!(layout.pages[1].fragments.is_empty());
        assert_eq!(layout.fragments_for("b").next().unwrap().0, 3);
    }
}
