//! # Page Window
//!
//! Derives the vertical window available to body content from the page
//! height and the effective top/bottom margins. Degenerate geometry is
//! clamped, never rejected: collapsed margins during editing must still
//! paginate.

/// Tolerance absorbing sub-pixel rounding in measured heights.
pub const ALLOWANCE_PX: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageWindowInput {
    pub page_height_px: f64,
    pub top_margin_px: f64,
    pub bottom_margin_px: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PageWindow {
    pub safe_top_margin: f64,
    pub safe_bottom_margin: f64,
    pub printable_height_px: f64,
    /// Starts equal to the printable height.
    pub content_height_px: f64,
    /// Never larger than the content height.
    pub allowance_px: f64,
}

impl PageWindow {
    /// Absolute y of the top of the body area.
    pub fn content_top(&self) -> f64 {
        self.safe_top_margin
    }

    /// Absolute y of the bottom of the body area.
    pub fn content_bottom(&self) -> f64 {
        self.safe_top_margin + self.content_height_px
    }
}

pub fn compute_page_window(input: PageWindowInput) -> PageWindow {
    let page_height = clamp(input.page_height_px);
    let safe_top_margin = clamp(input.top_margin_px);
    let safe_bottom_margin = clamp(input.bottom_margin_px);
    let printable_height_px = (page_height - safe_top_margin - safe_bottom_margin).max(0.0);
    let content_height_px = printable_height_px;

    PageWindow {
        safe_top_margin,
        safe_bottom_margin,
        printable_height_px,
        content_height_px,
        allowance_px: ALLOWANCE_PX.min(content_height_px),
    }
}

// NaN counts as degenerate too.
fn clamp(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 {
        v
    } else {
        0.0
    }
}
