//! Structured error types for the Folio layout engine.
//!
//! Only input contract violations are errors. Degenerate geometry is clamped
//! and a page-reference pass that fails to settle still returns a layout.

use thiserror::Error;

/// The unified error type returned by all public Folio API functions.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// `blocks` and `measures` must be index-correspondent.
    #[error("Expected one measure per block, got {blocks} blocks and {measures} measures")]
    MeasureCountMismatch { blocks: usize, measures: usize },

    /// A block was paired with a measure of the wrong kind.
    #[error("Block `{id}` at index {index} is a {expected} block but its measure is {found}")]
    MeasureKindMismatch {
        index: usize,
        id: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A table measure does not describe every row of its table.
    #[error("Table `{id}` has {rows} rows but its measure describes {measured}")]
    TableRowMismatch {
        id: String,
        rows: usize,
        measured: usize,
    },

    /// JSON input failed to parse as a layout request.
    #[error("Failed to parse layout input: {source}{}", format_hint(.hint))]
    Parse {
        #[source]
        source: serde_json::Error,
        hint: String,
    },
}

fn format_hint(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {hint}")
    }
}

impl From<serde_json::Error> for LayoutError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the layout request schema. Check block `type` and measure `kind` tags.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input, is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        LayoutError::Parse { source: e, hint }
    }
}
