//! # Input Model
//!
//! The input representation for the pagination engine. A document arrives as
//! a flat, ordered list of [`FlowBlock`]s together with a parallel list of
//! [`Measure`]s produced by an external text shaper. Index `i` of one list
//! always describes index `i` of the other.
//!
//! Blocks carry identity and pagination policy (keep-with-next, cannot-split,
//! break markers). Measures carry geometry. The engine never mutates either;
//! page-reference resolution returns new copies.

pub mod measure;
pub mod options;

pub use measure::*;
pub use options::*;

use serde::{Deserialize, Serialize};

/// One unit of flowable content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowBlock {
    /// Stable identity, used by anchors and fragments.
    pub id: String,

    /// What kind of block this is.
    pub kind: BlockKind,

    /// Keep this block on the same page as the block that follows it.
    #[serde(default)]
    pub keep_with_next: bool,

    /// Never divide this block across pages or columns.
    #[serde(default)]
    pub cannot_split: bool,

    /// Start this block on a new page or column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub break_before: Option<BreakBefore>,
}

impl FlowBlock {
    pub fn new(id: impl Into<String>, kind: BlockKind) -> Self {
        Self {
            id: id.into(),
            kind,
            keep_with_next: false,
            cannot_split: false,
            break_before: None,
        }
    }

    pub fn paragraph(id: impl Into<String>, text: &str) -> Self {
        Self::new(
            id,
            BlockKind::Paragraph(ParagraphBlock {
                runs: vec![Run::Text {
                    text: text.to_string(),
                }],
                ..Default::default()
            }),
        )
    }

    pub fn with_keep_with_next(mut self) -> Self {
        self.keep_with_next = true;
        self
    }

    pub fn with_cannot_split(mut self) -> Self {
        self.cannot_split = true;
        self
    }

    pub fn with_break_before(mut self, kind: BreakBefore) -> Self {
        self.break_before = Some(kind);
        self
    }

    /// The paragraph payload, if this is a paragraph.
    pub fn as_paragraph(&self) -> Option<&ParagraphBlock> {
        match &self.kind {
            BlockKind::Paragraph(p) => Some(p),
            _ => None,
        }
    }

    pub(crate) fn kind_name(&self) -> &'static str {
        self.kind.name()
    }
}

/// The content-specific part of a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BlockKind {
    Paragraph(ParagraphBlock),
    Image(ImageBlock),
    Table(TableBlock),
    /// Ends the current section. Its properties describe the next one.
    SectionBreak(SectionBreak),
    PageBreak,
    ColumnBreak,
    /// Anything this engine does not understand. Laid out as a zero-height
    /// marker so the rest of the document still flows.
    #[serde(other)]
    Unknown,
}

impl BlockKind {
    pub fn name(&self) -> &'static str {
        match self {
            BlockKind::Paragraph(_) => "paragraph",
            BlockKind::Image(_) => "image",
            BlockKind::Table(_) => "table",
            BlockKind::SectionBreak(_) => "sectionBreak",
            BlockKind::PageBreak => "pageBreak",
            BlockKind::ColumnBreak => "columnBreak",
            BlockKind::Unknown => "unknown",
        }
    }
}

/// Where a `breakBefore` block starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BreakBefore {
    Page,
    Column,
}

// ── Paragraphs ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphBlock {
    #[serde(default)]
    pub runs: Vec<Run>,

    #[serde(default)]
    pub spacing: ParagraphSpacing,

    /// Avoid a lone first or last line at a page boundary.
    #[serde(default = "default_true")]
    pub widow_control: bool,

    /// Bookmark names that resolve to the page this paragraph starts on.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bookmarks: Vec<String>,

    /// This paragraph is a table-of-contents entry.
    #[serde(default)]
    pub toc_entry: bool,
}

impl Default for ParagraphBlock {
    fn default() -> Self {
        Self {
            runs: Vec::new(),
            spacing: ParagraphSpacing::default(),
            widow_control: true,
            bookmarks: Vec::new(),
            toc_entry: false,
        }
    }
}

impl ParagraphBlock {
    /// Whether any run is a page-number field.
    pub fn has_page_tokens(&self) -> bool {
        self.runs.iter().any(|r| matches!(r, Run::Token { .. }))
    }

    /// Concatenated run text, tokens included at their current rendering.
    pub fn text(&self) -> String {
        self.runs
            .iter()
            .map(|r| match r {
                Run::Text { text } | Run::Token { text, .. } => text.as_str(),
            })
            .collect()
    }
}

/// Vertical space around a paragraph, in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ParagraphSpacing {
    #[serde(default)]
    pub before: f64,
    #[serde(default)]
    pub after: f64,
}

/// A run of paragraph content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Run {
    Text {
        text: String,
    },
    /// A field whose text depends on the final layout.
    Token {
        token: PageToken,
        /// The text currently rendered for the field.
        #[serde(default)]
        text: String,
    },
}

/// Page-number fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PageToken {
    /// The page the containing block starts on.
    PageNumber {
        #[serde(default)]
        format: NumberFormat,
    },
    /// The number of pages in the document.
    TotalPages {
        #[serde(default)]
        format: NumberFormat,
    },
    /// The page a block id or bookmark starts on.
    PageRef {
        anchor: String,
        #[serde(default)]
        format: NumberFormat,
    },
}

impl PageToken {
    pub fn format(&self) -> NumberFormat {
        match self {
            PageToken::PageNumber { format }
            | PageToken::TotalPages { format }
            | PageToken::PageRef { format, .. } => *format,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NumberFormat {
    #[default]
    Decimal,
    LowerRoman,
    UpperRoman,
}

impl NumberFormat {
    /// Render a page number.
    pub fn format(&self, n: usize) -> String {
        match self {
            NumberFormat::Decimal => n.to_string(),
            NumberFormat::LowerRoman => to_roman(n).to_lowercase(),
            NumberFormat::UpperRoman => to_roman(n),
        }
    }
}

fn to_roman(mut n: usize) -> String {
    const NUMERALS: [(usize, &str); 13] = [
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    if n == 0 {
        return "0".to_string();
    }
    let mut out = String::new();
    for &(value, numeral) in &NUMERALS {
        while n >= value {
            out.push_str(numeral);
            n -= value;
        }
    }
    out
}

// ── Images ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageBlock {
    /// Floating placement. Only honored inside header/footer bands; body
    /// flow places every image inline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<ImageAnchor>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAnchor {
    pub relative_from: AnchorFrame,
    #[serde(default)]
    pub offset_x: f64,
    #[serde(default)]
    pub offset_y: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnchorFrame {
    Page,
    #[default]
    Margin,
}

// ── Tables ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableBlock {
    pub rows: Vec<TableRow>,

    /// Leading rows that form the table header.
    #[serde(default)]
    pub header_row_count: usize,

    /// Repeat the header rows at the top of every continuation.
    #[serde(default = "default_true")]
    pub repeat_header: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    #[serde(default)]
    pub cells: Vec<TableCell>,
    /// Accepted for input compatibility. Rows are never divided, so it has
    /// no further effect on layout.
    #[serde(default)]
    pub cant_split: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    /// Ids of the blocks rendered inside this cell. Cell content is measured
    /// into the row height upstream; layout carries the ids through untouched.
    #[serde(default)]
    pub blocks: Vec<String>,
}

// ── Sections ────────────────────────────────────────────────────

/// Properties of the section that starts after this marker. Unset fields
/// keep the current section's values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionBreak {
    #[serde(default)]
    pub start: SectionStart,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<PageSize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margins: Option<Margins>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<ColumnLayout>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionStart {
    #[default]
    NextPage,
    Continuous,
    EvenPage,
    OddPage,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_block_kinds_deserialize() {
        let block: FlowBlock =
            serde_json::from_str(r#"{ "id": "x", "kind": { "type": "chart" } }"#).unwrap();
        assert_eq!(block.kind, BlockKind::Unknown);
    }

    #[test]
    fn paragraph_defaults() {
        let block: FlowBlock = serde_json::from_str(
            r#"{ "id": "p", "kind": { "type": "paragraph", "runs": [ { "type": "text", "text": "Hi" } ] } }"#,
        )
        .unwrap();
        let para = block.as_paragraph().unwrap();
        assert!(para.widow_control);
        assert!(!block.keep_with_next);
        assert_eq!(para.text(), "Hi");
    }

    #[test]
    fn roman_numerals() {
        assert_eq!(NumberFormat::UpperRoman.format(14), "XIV");
        assert_eq!(NumberFormat::LowerRoman.format(1994), "mcmxciv");
        assert_eq!(NumberFormat::Decimal.format(7), "7");
    }
}
