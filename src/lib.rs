//! # Folio
//!
//! A deterministic pagination engine.
//!
//! Text shaping happens elsewhere. Folio receives a flat list of blocks
//! (paragraphs, images, tables, break markers) together with their measured
//! geometry and decides where every page, column and fragment boundary
//! falls. **The page is the unit of layout:** every placement decision is
//! made against the boundary of the page being filled, never by slicing a
//! tall canvas afterwards.
//!
//! ## Architecture
//!
//! ```text
//! FlowBlock[] + Measure[] + LayoutOptions
//!       ↓
//!   [layout::page_window]  — Usable body area for one page
//!       ↓
//!   [layout]               — Flow blocks into columns and pages
//!       ↓  (tables)
//!   [layout::table]        — Row-boundary splits, repeated headers
//!       ↓
//!   [anchor]               — Anchor map, page-number fields, re-layout
//!
//!   [header_footer]        — Independent fixed-band layout
//! ```

pub mod anchor;
pub mod error;
pub mod header_footer;
pub mod layout;
pub mod model;

#[cfg(feature = "wasm")]
pub mod wasm;

use serde::Deserialize;

pub use anchor::{
    build_anchor_map, get_toc_blocks_for_remeasurement, layout_with_page_refs,
    resolve_page_ref_tokens, AnchorMap, Remeasure, Remeasurement, ResolvedLayout,
};
pub use error::LayoutError;
pub use header_footer::{layout_header_footer, HeaderFooterConstraints, HeaderFooterLayout};
pub use layout::{layout_document, Layout};

use model::{FlowBlock, LayoutOptions, Measure};

/// The JSON envelope accepted by [`layout_json`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutRequest {
    pub blocks: Vec<FlowBlock>,
    pub measures: Vec<Measure>,
    #[serde(default)]
    pub options: LayoutOptions,
    /// Default header content; its height is reserved on every page.
    #[serde(default)]
    pub header: Option<BandRequest>,
    #[serde(default)]
    pub footer: Option<BandRequest>,
}

/// Content of one header or footer band.
#[derive(Debug, Clone, Deserialize)]
pub struct BandRequest {
    pub blocks: Vec<FlowBlock>,
    pub measures: Vec<Measure>,
    pub constraints: HeaderFooterConstraints,
}

impl LayoutRequest {
    /// Lay out the bands, reserve their height and paginate the body.
    pub fn layout(&self) -> Result<Layout, LayoutError> {
        let mut options = self.options.clone();
        if let Some(band) = &self.header {
            let header = layout_header_footer(&band.blocks, &band.measures, &band.constraints)?;
            options = options.with_header(&header);
        }
        if let Some(band) = &self.footer {
            let footer = layout_header_footer(&band.blocks, &band.measures, &band.constraints)?;
            options = options.with_footer(&footer);
        }
        layout_document(&self.blocks, &self.measures, &options)
    }
}

/// Lay out a request described as JSON and return the layout as JSON.
pub fn layout_json(json: &str) -> Result<String, LayoutError> {
    let request: LayoutRequest = serde_json::from_str(json)?;
    let layout = request.layout()?;
    Ok(serde_json::to_string_pretty(&layout)?)
}
