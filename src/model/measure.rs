//! Geometry for flow blocks, produced by an external measurer.

use serde::{Deserialize, Serialize};

/// Measured geometry for one [`FlowBlock`](super::FlowBlock).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Measure {
    Paragraph(ParagraphMeasure),
    Image(ImageMeasure),
    Table(TableMeasure),
    /// Break markers and blocks without geometry.
    Empty,
}

impl Measure {
    pub fn name(&self) -> &'static str {
        match self {
            Measure::Paragraph(_) => "paragraph",
            Measure::Image(_) => "image",
            Measure::Table(_) => "table",
            Measure::Empty => "empty",
        }
    }

    /// Full height of the block when laid out in one piece.
    pub fn total_height(&self) -> f64 {
        match self {
            Measure::Paragraph(p) => p.total_height,
            Measure::Image(i) => i.height,
            Measure::Table(t) => t.total_height,
            Measure::Empty => 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphMeasure {
    pub lines: Vec<LineBox>,
    pub total_height: f64,
}

impl ParagraphMeasure {
    /// Build a measure from line heights, summing the total.
    pub fn from_heights(heights: &[f64]) -> Self {
        Self {
            lines: heights
                .iter()
                .map(|&height| LineBox {
                    height,
                    width: 0.0,
                    tokens: Vec::new(),
                })
                .collect(),
            total_height: heights.iter().sum(),
        }
    }

    pub fn line_heights(&self) -> Vec<f64> {
        self.lines.iter().map(|l| l.height).collect()
    }

    /// Whether any line renders a page-number field.
    pub fn has_token_spans(&self) -> bool {
        self.lines.iter().any(|l| !l.tokens.is_empty())
    }
}

/// One laid-out line of a paragraph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineBox {
    pub height: f64,
    #[serde(default)]
    pub width: f64,
    /// Page-number fields rendered on this line.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tokens: Vec<TokenSpan>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSpan {
    /// Index into the paragraph's runs.
    pub run_index: usize,
    #[serde(default)]
    pub width_px: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageMeasure {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableMeasure {
    pub rows: Vec<RowMeasure>,
    #[serde(default)]
    pub column_widths: Vec<f64>,
    #[serde(default)]
    pub total_width: f64,
    pub total_height: f64,
}

impl TableMeasure {
    /// Build a measure from row heights with uniform column widths.
    pub fn from_row_heights(heights: &[f64], column_widths: &[f64]) -> Self {
        let total_width = column_widths.iter().sum();
        Self {
            rows: heights
                .iter()
                .map(|&height| RowMeasure {
                    height,
                    cells: column_widths
                        .iter()
                        .map(|&width| CellMeasure { width, height })
                        .collect(),
                })
                .collect(),
            column_widths: column_widths.to_vec(),
            total_width,
            total_height: heights.iter().sum(),
        }
    }

    pub fn rows_height(&self, range: std::ops::Range<usize>) -> f64 {
        self.rows[range].iter().map(|r| r.height).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowMeasure {
    pub height: f64,
    #[serde(default)]
    pub cells: Vec<CellMeasure>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CellMeasure {
    pub width: f64,
    pub height: f64,
}
