//! Page configuration: size, margins, columns, header/footer reservation.

use serde::{Deserialize, Serialize};

use crate::header_footer::HeaderFooterLayout;

/// Options for one layout call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutOptions {
    /// Page size. Defaults to US Letter at 96 dpi.
    #[serde(default)]
    pub page_size: PageSize,

    /// Page margins in pixels.
    #[serde(default)]
    pub margins: Margins,

    /// Column layout of the first section.
    #[serde(default)]
    pub columns: ColumnLayout,

    /// Display gap between consecutive pages.
    #[serde(default = "default_page_gap")]
    pub page_gap_px: f64,

    /// Measured header/footer content to reserve space for.
    #[serde(default)]
    pub header_footer: HeaderFooterOptions,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            page_size: PageSize::default(),
            margins: Margins::default(),
            columns: ColumnLayout::default(),
            page_gap_px: default_page_gap(),
            header_footer: HeaderFooterOptions::default(),
        }
    }
}

impl LayoutOptions {
    pub fn with_page_size(mut self, w: f64, h: f64) -> Self {
        self.page_size = PageSize { w, h };
        self
    }

    pub fn with_margins(mut self, margins: Margins) -> Self {
        self.margins = margins;
        self
    }

    pub fn with_columns(mut self, count: usize, gap: f64) -> Self {
        self.columns = ColumnLayout { count, gap };
        self
    }

    /// Reserve room for a laid-out default header.
    pub fn with_header(mut self, header: &HeaderFooterLayout) -> Self {
        self.header_footer.header.default = Some(header.content_height_px);
        self
    }

    /// Reserve room for a laid-out default footer.
    pub fn with_footer(mut self, footer: &HeaderFooterLayout) -> Self {
        self.header_footer.footer.default = Some(footer.content_height_px);
        self
    }

    /// Width of one column of the first section.
    pub fn column_width(&self) -> f64 {
        let content_width =
            (self.page_size.w - self.margins.left.max(0.0) - self.margins.right.max(0.0)).max(0.0);
        self.columns.column_width(content_width)
    }
}

fn default_page_gap() -> f64 {
    24.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub w: f64,
    pub h: f64,
}

impl Default for PageSize {
    fn default() -> Self {
        // 8.5 × 11 in at 96 dpi
        Self { w: 816.0, h: 1056.0 }
    }
}

/// Page margins. `header` and `footer` are the distances from the page
/// edge to the header and footer bands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
    #[serde(default = "default_band_distance")]
    pub header: f64,
    #[serde(default = "default_band_distance")]
    pub footer: f64,
}

impl Default for Margins {
    fn default() -> Self {
        Self::uniform(96.0)
    }
}

impl Margins {
    pub fn uniform(v: f64) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
            header: default_band_distance(),
            footer: default_band_distance(),
        }
    }
}

fn default_band_distance() -> f64 {
    48.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnLayout {
    #[serde(default = "default_column_count")]
    pub count: usize,
    #[serde(default)]
    pub gap: f64,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self { count: 1, gap: 0.0 }
    }
}

impl ColumnLayout {
    /// At least one column.
    pub fn count(&self) -> usize {
        self.count.max(1)
    }

    pub fn column_width(&self, content_width: f64) -> f64 {
        let count = self.count() as f64;
        let gaps = self.gap.max(0.0) * (count - 1.0);
        ((content_width - gaps) / count).max(0.0)
    }
}

fn default_column_count() -> usize {
    1
}

/// Content heights of the header and footer variants.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderFooterOptions {
    #[serde(default)]
    pub header: BandHeights,
    #[serde(default)]
    pub footer: BandHeights,
    /// Page 1 uses the `first` variant.
    #[serde(default)]
    pub title_page: bool,
    /// Even pages use the `even` variant.
    #[serde(default)]
    pub even_and_odd: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BandHeights {
    #[serde(default)]
    pub default: Option<f64>,
    #[serde(default)]
    pub first: Option<f64>,
    #[serde(default)]
    pub even: Option<f64>,
}

/// Which header/footer variant a page uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HeaderFooterVariant {
    Default,
    First,
    Even,
}

impl HeaderFooterOptions {
    pub fn variant_for_page(&self, page_number: usize) -> HeaderFooterVariant {
        if self.title_page && page_number == 1 {
            HeaderFooterVariant::First
        } else if self.even_and_odd && page_number % 2 == 0 {
            HeaderFooterVariant::Even
        } else {
            HeaderFooterVariant::Default
        }
    }
}

impl BandHeights {
    /// Content height for a variant. A title page or even page without its
    /// own content has an empty band.
    pub fn height_for(&self, variant: HeaderFooterVariant) -> Option<f64> {
        match variant {
            HeaderFooterVariant::Default => self.default,
            HeaderFooterVariant::First => self.first,
            HeaderFooterVariant::Even => self.even,
        }
    }
}
