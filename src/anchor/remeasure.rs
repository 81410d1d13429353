//! Bounded re-layout for page-number fields.
//!
//! Rendering a page number can change the width of its line, which can move
//! a page boundary, which can change the number. The loop below lays out,
//! resolves fields, asks the caller to remeasure what changed and lays out
//! again, stopping once the anchor map is stable or after
//! [`MAX_PAGE_REF_PASSES`] resolution passes.

use crate::error::LayoutError;
use crate::layout::{layout_document, Layout};
use crate::model::{FlowBlock, LayoutOptions, Measure};

use super::{build_anchor_map, is_toc_entry, resolve_page_ref_tokens};

/// Resolution passes run before the last layout is accepted as final.
pub const MAX_PAGE_REF_PASSES: usize = 3;

/// Measures a block again after its page-number text changed.
pub trait Remeasure {
    fn remeasure(&self, block: &FlowBlock, max_width: f64) -> Measure;
}

impl<F> Remeasure for F
where
    F: Fn(&FlowBlock, f64) -> Measure,
{
    fn remeasure(&self, block: &FlowBlock, max_width: f64) -> Measure {
        self(block, max_width)
    }
}

/// Whether page-number fields are resolved at all.
#[derive(Clone, Copy)]
pub enum Remeasurement<'a> {
    /// One layout pass; fields keep the text they came with.
    Disabled,
    Enabled(&'a dyn Remeasure),
}

/// Final layout together with the blocks and measures that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLayout {
    pub layout: Layout,
    pub blocks: Vec<FlowBlock>,
    pub measures: Vec<Measure>,
    /// Layout runs, the initial one included.
    pub passes: usize,
    /// False when the pass bound was hit with the anchor map still moving.
    pub converged: bool,
}

/// Lay out a document and settle its page-number fields.
pub fn layout_with_page_refs(
    blocks: &[FlowBlock],
    measures: &[Measure],
    options: &LayoutOptions,
    remeasurement: Remeasurement<'_>,
) -> Result<ResolvedLayout, LayoutError> {
    let mut layout = layout_document(blocks, measures, options)?;
    let mut blocks = blocks.to_vec();
    let mut measures = measures.to_vec();

    let remeasurer = match remeasurement {
        Remeasurement::Disabled => {
            return Ok(ResolvedLayout {
                layout,
                blocks,
                measures,
                passes: 1,
                converged: true,
            })
        }
        Remeasurement::Enabled(remeasurer) => remeasurer,
    };

    let mut anchors = build_anchor_map(&layout);
    let mut passes = 1;

    for pass in 1..=MAX_PAGE_REF_PASSES {
        let resolved = resolve_page_ref_tokens(&blocks, &measures, &anchors);
        let mut dirty = resolved.dirty;
        if pass == 1 {
            dirty.extend(
                resolved
                    .blocks
                    .iter()
                    .enumerate()
                    .filter(|(_, b)| is_toc_entry(b))
                    .map(|(i, _)| i),
            );
            dirty.sort_unstable();
            dirty.dedup();
        }
        if dirty.is_empty() {
            return Ok(ResolvedLayout {
                layout,
                blocks,
                measures,
                passes,
                converged: true,
            });
        }

        blocks = resolved.blocks;
        measures = resolved.measures;
        for &index in &dirty {
            let width = remeasure_width(&layout, &blocks[index], options);
            measures[index] = remeasurer.remeasure(&blocks[index], width);
        }

        layout = layout_document(&blocks, &measures, options)?;
        passes += 1;

        let next = build_anchor_map(&layout);
        let stable = next == anchors;
        log::debug!(
            "page-ref pass {pass}: {} block(s) remeasured, {} pages, anchors {}",
            dirty.len(),
            layout.page_count(),
            if stable { "stable" } else { "moved" }
        );
        if stable {
            return Ok(ResolvedLayout {
                layout,
                blocks,
                measures,
                passes,
                converged: true,
            });
        }
        anchors = next;
    }

    log::warn!(
        "page references did not settle after {MAX_PAGE_REF_PASSES} passes; keeping the last layout"
    );
    Ok(ResolvedLayout {
        layout,
        blocks,
        measures,
        passes,
        converged: false,
    })
}

/// Width the block was last laid out at.
fn remeasure_width(layout: &Layout, block: &FlowBlock, options: &LayoutOptions) -> f64 {
    layout
        .fragments_for(&block.id)
        .next()
        .map_or_else(|| options.column_width(), |(_, f)| f.width)
}
