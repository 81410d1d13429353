//! # Anchors and Page References
//!
//! After a layout pass every block id and bookmark resolves to the page its
//! first fragment landed on. Page-number fields (`pageNumber`, `totalPages`,
//! `pageRef`) are then rewritten from that map. Because the rewritten text
//! can change a paragraph's measure, and with it the pagination, the
//! [`remeasure`] module drives a bounded re-layout loop on top of this.

pub mod remeasure;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::layout::Layout;
use crate::model::{BlockKind, FlowBlock, Measure, PageToken, Run};

pub use remeasure::{
    layout_with_page_refs, Remeasure, Remeasurement, ResolvedLayout, MAX_PAGE_REF_PASSES,
};

/// Block ids and bookmark names mapped to 1-based page numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorMap {
    pub anchors: BTreeMap<String, usize>,
    pub total_pages: usize,
}

impl AnchorMap {
    pub fn page_of(&self, anchor: &str) -> Option<usize> {
        self.anchors.get(anchor).copied()
    }
}

/// Record the first page of every block and bookmark in a layout.
pub fn build_anchor_map(layout: &Layout) -> AnchorMap {
    let mut anchors = BTreeMap::new();
    for page in &layout.pages {
        for fragment in &page.fragments {
            anchors
                .entry(fragment.block_id.clone())
                .or_insert(page.number);
            for bookmark in &fragment.anchors {
                anchors.entry(bookmark.clone()).or_insert(page.number);
            }
        }
    }
    AnchorMap {
        anchors,
        total_pages: layout.page_count(),
    }
}

/// Blocks and measures after page-number fields were rewritten.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRefs {
    pub blocks: Vec<FlowBlock>,
    /// Unchanged copies; only a remeasurer can produce new geometry.
    pub measures: Vec<Measure>,
    pub changed: bool,
    /// Indices of blocks whose rendered text changed.
    pub dirty: Vec<usize>,
}

/// Rewrite the text of every page-number field from `anchors`.
///
/// `pageNumber` renders the page the block starts on, `totalPages` the page
/// count and `pageRef` the page of its anchor. Fields whose target is not in
/// the map keep their current text.
pub fn resolve_page_ref_tokens(
    blocks: &[FlowBlock],
    measures: &[Measure],
    anchors: &AnchorMap,
) -> ResolvedRefs {
    let mut resolved = blocks.to_vec();
    let mut dirty = Vec::new();

    for (index, block) in resolved.iter_mut().enumerate() {
        let own_page = anchors.page_of(&block.id);
        let BlockKind::Paragraph(paragraph) = &mut block.kind else {
            continue;
        };

        let mut block_changed = false;
        for run in &mut paragraph.runs {
            let Run::Token { token, text } = run else {
                continue;
            };
            let page = match token {
                PageToken::PageNumber { .. } => own_page,
                PageToken::TotalPages { .. } => Some(anchors.total_pages),
                PageToken::PageRef { anchor, .. } => anchors.page_of(anchor),
            };
            let Some(page) = page else {
                log::debug!("unresolved page field in `{}`; keeping `{text}`", block.id);
                continue;
            };
            let rendered = token.format().format(page);
            if *text != rendered {
                *text = rendered;
                block_changed = true;
            }
        }

        if block_changed {
            dirty.push(index);
        }
    }

    ResolvedRefs {
        blocks: resolved,
        measures: measures.to_vec(),
        changed: !dirty.is_empty(),
        dirty,
    }
}

/// Table-of-contents entries. Their page numbers are remeasured on the first
/// resolution pass even when the text already looks right.
pub fn get_toc_blocks_for_remeasurement(blocks: &[FlowBlock]) -> Vec<&FlowBlock> {
    blocks.iter().filter(|b| is_toc_entry(b)).collect()
}

pub(crate) fn is_toc_entry(block: &FlowBlock) -> bool {
    block.as_paragraph().is_some_and(|p| p.toc_entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::layout_document;
    use crate::model::*;

    fn field(id: &str, token: PageToken) -> FlowBlock {
        FlowBlock::new(
            id,
            BlockKind::Paragraph(ParagraphBlock {
                runs: vec![
                    Run::Text {
                        text: "Page ".to_string(),
                    },
                    Run::Token {
                        token,
                        text: String::new(),
                    },
                ],
                ..Default::default()
            }),
        )
    }

    fn two_page_layout() -> (Vec<FlowBlock>, Vec<Measure>, Layout) {
        let mut target = FlowBlock::paragraph("target", "Target");
        if let BlockKind::Paragraph(p) = &mut target.kind {
            p.bookmarks.push("intro".to_string());
        }
        let blocks = vec![
            FlowBlock::paragraph("a", "a"),
            FlowBlock::new("br", BlockKind::PageBreak),
            target,
        ];
        let measures = vec![
            Measure::Paragraph(ParagraphMeasure::from_heights(&[20.0])),
            Measure::Empty,
            Measure::Paragraph(ParagraphMeasure::from_heights(&[20.0])),
        ];
        let layout = layout_document(&blocks, &measures, &LayoutOptions::default()).unwrap();
        (blocks, measures, layout)
    }

    #[test]
    fn map_records_blocks_and_bookmarks() {
        let (_, _, layout) = two_page_layout();
        let map = build_anchor_map(&layout);
        assert_eq!(map.total_pages, 2);
        assert_eq!(map.page_of("a"), Some(1));
        assert_eq!(map.page_of("target"), Some(2));
        assert_eq!(map.page_of("intro"), Some(2));
        assert_eq!(map.page_of("missing"), None);
    }

    #[test]
    fn fields_render_from_the_map() {
        let map = AnchorMap {
            anchors: BTreeMap::from([("p".to_string(), 3), ("intro".to_string(), 4)]),
            total_pages: 9,
        };
        let blocks = vec![
            field(
                "p",
                PageToken::PageNumber {
                    format: NumberFormat::Decimal,
                },
            ),
            field(
                "q",
                PageToken::TotalPages {
                    format: NumberFormat::UpperRoman,
                },
            ),
            field(
                "r",
                PageToken::PageRef {
                    anchor: "intro".to_string(),
                    format: NumberFormat::LowerRoman,
                },
            ),
        ];
        let measures = vec![Measure::Paragraph(ParagraphMeasure::default()); 3];
        let resolved = resolve_page_ref_tokens(&blocks, &measures, &map);
        assert!(resolved.changed);
        assert_eq!(resolved.dirty, vec![0, 1, 2]);
        let texts: Vec<String> = resolved
            .blocks
            .iter()
            .map(|b| b.as_paragraph().unwrap().text())
            .collect();
        assert_eq!(texts, vec!["Page 3", "Page IX", "Page iv"]);
        assert_eq!(resolved.measures, measures);
    }

    #[test]
    fn unresolved_refs_keep_their_text() {
        let mut block = field(
            "r",
            PageToken::PageRef {
                anchor: "nowhere".to_string(),
                format: NumberFormat::Decimal,
            },
        );
        if let BlockKind::Paragraph(p) = &mut block.kind {
            if let Run::Token { text, .. } = &mut p.runs[1] {
                *text = "??".to_string();
            }
        }
        let resolved = resolve_page_ref_tokens(
            &[block],
            &[Measure::Paragraph(ParagraphMeasure::default())],
            &AnchorMap::default(),
        );
        assert!(!resolved.changed);
        assert_eq!(resolved.blocks[0].as_paragraph().unwrap().text(), "Page ??");
    }

    #[test]
    fn already_resolved_fields_are_clean() {
        let (blocks, measures, layout) = two_page_layout();
        let map = build_anchor_map(&layout);
        let resolved = resolve_page_ref_tokens(&blocks, &measures, &map);
        assert!(!resolved.changed);
        assert!(resolved.dirty.is_empty());
    }

    #[test]
    fn toc_entries_are_selected() {
        let mut entry = FlowBlock::paragraph("toc1", "Intro ..... 2");
        if let BlockKind::Paragraph(p) = &mut entry.kind {
            p.toc_entry = true;
        }
        let blocks = vec![FlowBlock::paragraph("a", "a"), entry];
        let toc = get_toc_blocks_for_remeasurement(&blocks);
        assert_eq!(toc.len(), 1);
        assert_eq!(toc[0].id, "toc1");
    }
}
