//! Row/column reconstruction from unordered OCR fragments.
//!
//! Fragments whose top edges lie within `tolerance` pixels of the current
//! row's reference edge are grouped into one row; each row is then ordered
//! left to right. Rows may have differing cell counts: no column alignment
//! is attempted.

use serde::Serialize;
use tracing::{debug, warn};

use crate::ocr::{OcrOutput, TextFragment};

pub const DEFAULT_ROW_TOLERANCE: u32 = 10;

/// Fragments believed to share one horizontal line, ordered by `x0`.
pub type Row = Vec<TextFragment>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Text,
    Table,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Text => "text",
            Mode::Table => "table",
        }
    }
}

/// How fragments are fed into the row grouping pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowOrder {
    /// Single pass in the order the engine reported fragments.
    #[default]
    AdapterOrder,
    /// Stable sort by top edge first, so out-of-order engines still group.
    TopEdge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableOptions {
    pub tolerance: u32,
    pub row_order: RowOrder,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_ROW_TOLERANCE,
            row_order: RowOrder::AdapterOrder,
        }
    }
}

/// Rows of cell text, top to bottom. Never empty, and no row is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Table {
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Vec<String>> {
        self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn from_rows(rows: Vec<Row>) -> Option<Self> {
        if rows.is_empty() {
            return None;
        }
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(|fragment| fragment.text).collect())
            .collect();
        Some(Self { rows })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Text(String),
    Table(Table),
    /// Table mode produced no fragments. Distinct from a table with one
    /// empty cell.
    NoTable,
}

/// Text mode returns the engine transcript untouched; table mode groups the
/// fragments into rows.
pub fn reconstruct(output: OcrOutput, mode: Mode, options: &TableOptions) -> Extraction {
    match mode {
        Mode::Text => Extraction::Text(output.transcript),
        Mode::Table => match build_table(output.fragments, options) {
            Some(table) => Extraction::Table(table),
            None => Extraction::NoTable,
        },
    }
}

pub fn build_table(fragments: Vec<TextFragment>, options: &TableOptions) -> Option<Table> {
    let rows = group_rows(fragments, options);
    debug!("table: {} rows", rows.len());
    Table::from_rows(rows)
}

struct RowFold {
    rows: Vec<Row>,
    current: Row,
    reference_y: u32,
}

impl RowFold {
    fn close_current(&mut self) {
        if !self.current.is_empty() {
            self.rows.push(std::mem::take(&mut self.current));
        }
    }
}

pub fn group_rows(fragments: Vec<TextFragment>, options: &TableOptions) -> Vec<Row> {
    let mut fragments = drop_malformed(fragments);
    if options.row_order == RowOrder::TopEdge {
        fragments.sort_by_key(|fragment| fragment.bbox.y0);
    }
    let Some(first) = fragments.first() else {
        return Vec::new();
    };

    let seed = RowFold {
        rows: Vec::new(),
        current: Vec::new(),
        reference_y: first.bbox.y0,
    };
    let mut fold = fragments.into_iter().fold(seed, |mut state, fragment| {
        if fragment.bbox.y0.abs_diff(state.reference_y) > options.tolerance {
            state.close_current();
            state.reference_y = fragment.bbox.y0;
        }
        state.current.push(fragment);
        state
    });
    fold.close_current();

    let mut rows = fold.rows;
    for row in &mut rows {
        row.sort_by_key(|fragment| fragment.bbox.x0);
    }
    rows
}

fn drop_malformed(fragments: Vec<TextFragment>) -> Vec<TextFragment> {
    let total = fragments.len();
    let kept = fragments
        .into_iter()
        .filter(|fragment| fragment.bbox.is_valid())
        .collect::<Vec<_>>();
    if kept.len() < total {
        warn!(
            "table: skipped {} fragment(s) with inverted bounding boxes",
            total - kept.len()
        );
    }
    kept
}
