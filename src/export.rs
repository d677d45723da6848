use anyhow::Result;
use serde_json::json;

use crate::table::{Extraction, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Tsv,
    Json,
}

impl Format {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "tsv" | "text" | "plain" => Some(Format::Tsv),
            "json" => Some(Format::Json),
            _ => None,
        }
    }
}

/// Tab between cells, newline between rows, no trailing newline.
pub fn to_tsv(table: &Table) -> String {
    table
        .rows()
        .iter()
        .map(|row| row.join("\t"))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render(extraction: &Extraction, format: Format) -> Result<String> {
    match format {
        Format::Tsv => Ok(match extraction {
            Extraction::Text(text) => text.clone(),
            Extraction::Table(table) => to_tsv(table),
            Extraction::NoTable => String::new(),
        }),
        Format::Json => {
            let value = match extraction {
                Extraction::Text(text) => json!({ "kind": "text", "text": text }),
                Extraction::Table(table) => json!({ "kind": "table", "rows": table }),
                Extraction::NoTable => json!({ "kind": "no_table" }),
            };
            Ok(serde_json::to_string_pretty(&value)?)
        }
    }
}
