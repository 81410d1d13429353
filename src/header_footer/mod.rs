//! # Header/Footer Bands
//!
//! Headers and footers are laid out once, against a fixed band, instead of
//! flowing through pages. Nothing inside a band paginates: content taller
//! than the band is reported through the height metrics and the caller
//! decides whether to grow the margin (see
//! [`LayoutOptions::with_header`](crate::model::LayoutOptions::with_header)).

use serde::{Deserialize, Serialize};

use crate::error::LayoutError;
use crate::layout::{validate_inputs, Fragment, FragmentKind};
use crate::model::*;

/// Fixed geometry of one band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderFooterConstraints {
    pub width: f64,
    pub height: f64,
    /// Keeps page-anchored images on the page.
    #[serde(default)]
    pub page_width: Option<f64>,
    #[serde(default)]
    pub margins: Option<HorizontalMargins>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HorizontalMargins {
    pub left: f64,
    pub right: f64,
}

/// A laid-out header or footer. Fragment coordinates are relative to the
/// band's top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderFooterLayout {
    /// Band height from the constraints.
    pub height: f64,
    /// Height actually occupied by the content.
    pub content_height_px: f64,
    /// The larger of the band and the content.
    pub effective_height_px: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub overflows: bool,
    pub fragments: Vec<Fragment>,
}

pub fn layout_header_footer(
    blocks: &[FlowBlock],
    measures: &[Measure],
    constraints: &HeaderFooterConstraints,
) -> Result<HeaderFooterLayout, LayoutError> {
    validate_inputs(blocks, measures)?;

    let band_width = constraints.width.max(0.0);
    let band_height = constraints.height.max(0.0);
    let mut fragments = Vec::new();
    let mut cursor_y = 0.0;
    let mut min_y: f64 = 0.0;
    let mut max_y: f64 = 0.0;

    for (index, (block, measure)) in blocks.iter().zip(measures).enumerate() {
        let mut fragment = Fragment {
            block_id: block.id.clone(),
            block_index: index,
            kind: FragmentKind::Marker,
            x: 0.0,
            y: cursor_y,
            width: band_width,
            height: 0.0,
            column: 0,
            anchors: Vec::new(),
        };

        match (&block.kind, measure) {
            (BlockKind::Paragraph(p), Measure::Paragraph(m)) => {
                fragment.kind = FragmentKind::Paragraph {
                    from_line: 0,
                    to_line: m.lines.len(),
                    continues_from_prev: false,
                    continues_on_next: false,
                };
                fragment.y = cursor_y + p.spacing.before;
                fragment.height = m.total_height.max(0.0);
                cursor_y = fragment.y + fragment.height + p.spacing.after;
            }
            (BlockKind::Table(_), Measure::Table(m)) => {
                fragment.kind = FragmentKind::Table {
                    from_row: 0,
                    to_row: m.rows.len(),
                    repeated_header_rows: 0,
                };
                fragment.width = if m.total_width > 0.0 {
                    m.total_width.min(band_width)
                } else {
                    band_width
                };
                fragment.height = m.total_height.max(0.0);
                cursor_y += fragment.height;
            }
            (BlockKind::Image(image), Measure::Image(m)) => {
                let (width, height) = fit_width(m.width.max(0.0), m.height.max(0.0), band_width);
                fragment.kind = FragmentKind::Image;
                fragment.width = width;
                fragment.height = height;
                match image.anchor {
                    // Floating: positioned, takes no flow space
                    Some(anchor) => {
                        fragment.x = anchored_x(&anchor, width, constraints);
                        fragment.y = anchor.offset_y;
                    }
                    None => cursor_y += height,
                }
            }
            _ => {}
        }

        min_y = min_y.min(fragment.y);
        max_y = max_y.max(fragment.y + fragment.height);
        fragments.push(fragment);
    }

    let content_height_px = max_y - min_y;
    let overflows = content_height_px > band_height;
    if overflows {
        log::debug!(
            "header/footer content {content_height_px:.2}px exceeds its {band_height:.2}px band"
        );
    }

    Ok(HeaderFooterLayout {
        height: band_height,
        content_height_px,
        effective_height_px: band_height.max(content_height_px),
        min_y,
        max_y,
        overflows,
        fragments,
    })
}

/// Scale an image down proportionally to the band width.
fn fit_width(width: f64, height: f64, max_width: f64) -> (f64, f64) {
    if width > max_width && width > 0.0 {
        let scale = max_width / width;
        (max_width, height * scale)
    } else {
        (width, height)
    }
}

/// X relative to the band's left edge, which sits on the left margin.
/// Page-anchored images are kept on the page when its width is known.
fn anchored_x(anchor: &ImageAnchor, width: f64, constraints: &HeaderFooterConstraints) -> f64 {
    match anchor.relative_from {
        AnchorFrame::Margin => anchor.offset_x,
        AnchorFrame::Page => {
            let left = constraints.margins.map_or(0.0, |m| m.left);
            let page_x = match constraints.page_width {
                Some(page_width) => anchor.offset_x.min(page_width - width).max(0.0),
                None => anchor.offset_x,
            };
            page_x - left
        }
    }
}
