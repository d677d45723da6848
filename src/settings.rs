use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::ocr::{DEFAULT_COMMAND, DEFAULT_THRESHOLD, PageSegMode};
use crate::table::{DEFAULT_ROW_TOLERANCE, RowOrder, TableOptions};

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");
const BASE_DIR_ENV: &str = "OCR_TABLE_EXTRACTOR_DIR";

pub const DEFAULT_WHITELIST: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789.,;:!?@#$%^&*()[]{}<>\"'/\\-_+=~ ";

#[derive(Debug, Clone)]
pub struct Settings {
    pub ocr_languages: String,
    pub ocr_whitelist: Option<String>,
    pub preserve_interword_spaces: bool,
    pub text_psm: PageSegMode,
    pub table_psm: PageSegMode,
    pub binarize: bool,
    pub threshold: u8,
    pub ocr_command: String,
    pub row_tolerance: u32,
    pub row_order: RowOrder,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ocr_languages: "eng".to_string(),
            ocr_whitelist: Some(DEFAULT_WHITELIST.to_string()),
            preserve_interword_spaces: true,
            text_psm: PageSegMode::Auto,
            table_psm: PageSegMode::SingleBlock,
            binarize: true,
            threshold: DEFAULT_THRESHOLD,
            ocr_command: DEFAULT_COMMAND.to_string(),
            row_tolerance: DEFAULT_ROW_TOLERANCE,
            row_order: RowOrder::AdapterOrder,
        }
    }
}

impl Settings {
    pub fn table_options(&self) -> TableOptions {
        TableOptions {
            tolerance: self.row_tolerance,
            row_order: self.row_order,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    ocr: Option<OcrSettings>,
    table: Option<TableSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct OcrSettings {
    languages: Option<String>,
    whitelist: Option<String>,
    preserve_interword_spaces: Option<bool>,
    text_psm: Option<u32>,
    table_psm: Option<u32>,
    binarize: Option<bool>,
    threshold: Option<u8>,
    command: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TableSettings {
    row_tolerance: Option<u32>,
    row_order: Option<String>,
}

pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();
    ensure_home_settings_file()?;

    let mut ordered_paths = Vec::new();
    ordered_paths.push(PathBuf::from("settings.toml"));
    ordered_paths.push(PathBuf::from("settings.local.toml"));

    if let Some(home) = home_dir() {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }

    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            let parsed: SettingsFile = toml::from_str(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
            settings
                .merge(parsed)
                .with_context(|| format!("invalid settings: {}", path.display()))?;
        }
    }

    Ok(settings)
}

impl Settings {
    fn merge(&mut self, incoming: SettingsFile) -> Result<()> {
        if let Some(ocr) = incoming.ocr {
            if let Some(languages) = ocr.languages {
                if !languages.trim().is_empty() {
                    self.ocr_languages = languages;
                }
            }
            if let Some(whitelist) = ocr.whitelist {
                if !whitelist.is_empty() {
                    self.ocr_whitelist = Some(whitelist);
                }
            }
            if let Some(preserve) = ocr.preserve_interword_spaces {
                self.preserve_interword_spaces = preserve;
            }
            if let Some(psm) = ocr.text_psm {
                self.text_psm = PageSegMode::from_psm(psm);
            }
            if let Some(psm) = ocr.table_psm {
                self.table_psm = PageSegMode::from_psm(psm);
            }
            if let Some(binarize) = ocr.binarize {
                self.binarize = binarize;
            }
            if let Some(threshold) = ocr.threshold {
                self.threshold = threshold;
            }
            if let Some(command) = ocr.command {
                if !command.trim().is_empty() {
                    self.ocr_command = command;
                }
            }
        }
        if let Some(table) = incoming.table {
            if let Some(tolerance) = table.row_tolerance {
                if tolerance > 0 {
                    self.row_tolerance = tolerance;
                }
            }
            if let Some(order) = table.row_order {
                self.row_order = parse_row_order(&order)?;
            }
        }
        Ok(())
    }
}

pub fn parse_row_order(value: &str) -> Result<RowOrder> {
    match value.trim().to_ascii_lowercase().as_str() {
        "adapter" | "engine" => Ok(RowOrder::AdapterOrder),
        "top" | "top_edge" => Ok(RowOrder::TopEdge),
        other => Err(anyhow!(
            "unknown row_order '{}' (expected adapter or top)",
            other
        )),
    }
}

fn ensure_home_settings_file() -> Result<()> {
    let Some(home) = home_dir() else {
        return Ok(());
    };
    fs::create_dir_all(&home)
        .with_context(|| format!("failed to create settings directory: {}", home.display()))?;
    let path = home.join("settings.toml");
    if !path.exists() {
        fs::write(&path, DEFAULT_SETTINGS_TOML)
            .with_context(|| format!("failed to write settings: {}", path.display()))?;
    }
    Ok(())
}

fn home_dir() -> Option<PathBuf> {
    if let Some(dir) = std::env::var(BASE_DIR_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
    {
        return Some(PathBuf::from(dir.trim()));
    }
    std::env::var("HOME").ok().and_then(|home| {
        let home = home.trim();
        if home.is_empty() {
            None
        } else {
            Some(Path::new(home).join(".ocr-table-extractor"))
        }
    })
}
