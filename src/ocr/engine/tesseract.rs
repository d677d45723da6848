use anyhow::{Context, Result, anyhow};
use image::{DynamicImage, RgbaImage};
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::ocr::{OcrEngine, OcrFuture, OcrOutput, ProgressFn, RecognizeParams};

use super::parse::parse_tsv_fragments;

pub(crate) const DEFAULT_COMMAND: &str = "tesseract";

/// Adapter around the `tesseract` binary. Each call gets its own scratch
/// directory and child process; nothing is shared between requests.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    command: String,
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new(DEFAULT_COMMAND)
    }
}

impl TesseractEngine {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize(
        &self,
        image: RgbaImage,
        params: RecognizeParams,
        progress: ProgressFn,
    ) -> OcrFuture {
        let command = self.command.clone();
        Box::pin(async move { run_recognition(&command, image, params, progress).await })
    }
}

async fn run_recognition(
    command: &str,
    image: RgbaImage,
    params: RecognizeParams,
    progress: ProgressFn,
) -> Result<OcrOutput> {
    progress(0.0);
    let languages = normalize_ocr_languages(command, &params.languages).await?;

    // Dropped on every exit path, taking the input image and outputs with it.
    let scratch = tempfile::Builder::new()
        .prefix("ocr-table-")
        .tempdir()
        .with_context(|| "failed to create temp dir for OCR")?;
    let input = scratch.path().join("input.png");
    DynamicImage::ImageRgba8(image)
        .save_with_format(&input, image::ImageFormat::Png)
        .with_context(|| "failed to write temp image for OCR")?;
    let out_base = scratch.path().join("out");

    run_tesseract(command, &input, &out_base, &languages, &params).await?;
    progress(0.5);

    let transcript = read_output(&out_base, "txt")?;
    let tsv = read_output(&out_base, "tsv")?;
    let fragments = parse_tsv_fragments(&tsv, params.preserve_interword_spaces);
    debug!(
        "tesseract: {} fragments, {} transcript chars",
        fragments.len(),
        transcript.chars().count()
    );
    progress(1.0);

    Ok(OcrOutput {
        transcript,
        fragments,
    })
}

async fn run_tesseract(
    command: &str,
    input: &Path,
    out_base: &Path,
    languages: &str,
    params: &RecognizeParams,
) -> Result<()> {
    let mut cmd = Command::new(command);
    cmd.arg(input)
        .arg(out_base)
        .arg("-l")
        .arg(languages)
        .arg("--psm")
        .arg(params.psm.as_psm().to_string())
        .arg("-c")
        .arg(format!(
            "preserve_interword_spaces={}",
            u8::from(params.preserve_interword_spaces)
        ));
    if let Some(whitelist) = params.whitelist.as_deref().filter(|value| !value.is_empty()) {
        cmd.arg("-c")
            .arg(format!("tessedit_char_whitelist={}", whitelist));
    }
    cmd.arg("txt").arg("tsv").kill_on_drop(true);

    let output = cmd
        .output()
        .await
        .with_context(|| format!("failed to run {} (is it installed?)", command))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!("tesseract failed: {}", stderr.trim()));
    }
    Ok(())
}

fn read_output(out_base: &Path, ext: &str) -> Result<String> {
    let path = out_base.with_extension(ext);
    let bytes = std::fs::read(&path)
        .with_context(|| format!("failed to read tesseract output: {}", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).to_string())
}

pub async fn list_tesseract_languages(command: &str) -> Result<Vec<String>> {
    let output = Command::new(command)
        .arg("--list-langs")
        .kill_on_drop(true)
        .output()
        .await
        .with_context(|| format!("failed to run {} --list-langs", command))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!("tesseract --list-langs failed: {}", stderr.trim()));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(parse_language_list(&stdout))
}

fn parse_language_list(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .skip(1)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect()
}

async fn normalize_ocr_languages(command: &str, requested: &str) -> Result<String> {
    let trimmed = requested.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("ocr languages is empty"));
    }
    let available = match list_tesseract_languages(command).await {
        Ok(list) => list,
        Err(_) => return Ok(trimmed.to_string()),
    };
    select_languages(trimmed, &available)
}

fn select_languages(requested: &str, available: &[String]) -> Result<String> {
    let mut chosen = Vec::new();
    let mut missing = Vec::new();
    for raw in requested.split(['+', ',', ' ']) {
        let lang = raw.trim();
        if lang.is_empty() {
            continue;
        }
        if available.iter().any(|value| value == lang) {
            chosen.push(lang.to_string());
        } else {
            missing.push(lang.to_string());
        }
    }

    if chosen.is_empty() {
        return Err(anyhow!(
            "ocr language(s) not available: {} (available: {})",
            missing.join(", "),
            available.join(", ")
        ));
    }
    if !missing.is_empty() {
        warn!(
            "ocr language(s) not available: {} (available: {})",
            missing.join(", "),
            available.join(", ")
        );
    }
    Ok(chosen.join("+"))
}
