use anyhow::{Result, anyhow};
use clap::Parser;

use ocr_table_extractor::{CropChoice, CropRect, Extraction, Format, Mode, Size};

#[derive(Parser, Debug)]
#[command(
    name = "ocr-table-extractor",
    version,
    about = "Extract text or a table from a region of an image"
)]
struct Cli {
    /// Image file (png, jpeg, gif, bmp)
    #[arg(short = 'i', long = "image")]
    image: Option<String>,

    /// Extraction mode: text or table
    #[arg(short = 'm', long = "mode", default_value = "text")]
    mode: String,

    /// Crop rectangle in displayed coordinates: X,Y,WIDTH,HEIGHT
    #[arg(short = 'c', long = "crop")]
    crop: Option<String>,

    /// Use a centred half-width 16:9 crop
    #[arg(long = "center-crop", conflicts_with_all = ["crop", "full"])]
    center_crop: bool,

    /// Use the whole image
    #[arg(long = "full", conflicts_with = "crop")]
    full: bool,

    /// Size the crop coordinates refer to: WIDTHxHEIGHT (default: native size)
    #[arg(short = 'd', long = "display")]
    display: Option<String>,

    /// OCR languages (e.g. eng or eng+jpn)
    #[arg(short = 'l', long = "lang")]
    lang: Option<String>,

    /// Output format: tsv or json
    #[arg(short = 'f', long = "format", default_value = "tsv")]
    format: String,

    /// Row grouping tolerance in pixels
    #[arg(long = "tolerance")]
    tolerance: Option<u32>,

    /// Sort fragments by top edge before grouping rows
    #[arg(long = "sort-rows")]
    sort_rows: bool,

    /// Skip black/white binarization before OCR
    #[arg(long = "no-binarize")]
    no_binarize: bool,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<String>,

    /// Enable verbose logging
    #[arg(long = "verbose")]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(err) = ocr_table_extractor::logging::init(cli.verbose) {
        eprintln!("failed to initialize logging: {:#}", err);
    }
    match run(cli).await {
        Ok(()) => {}
        Err(err) => {
            eprintln!("failed to extract text: {:#}", err);
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mode = parse_mode(&cli.mode)?;
    let format =
        Format::parse(&cli.format).ok_or_else(|| anyhow!("unknown format '{}'", cli.format))?;
    let crop = if let Some(value) = cli.crop.as_deref() {
        let rect = CropRect::parse(value)
            .ok_or_else(|| anyhow!("invalid crop '{}' (expected X,Y,WIDTH,HEIGHT)", value))?;
        CropChoice::Explicit(rect)
    } else if cli.center_crop {
        CropChoice::Centered
    } else if cli.full {
        CropChoice::Full
    } else {
        CropChoice::None
    };
    let displayed = cli.display.as_deref().map(parse_display).transpose()?;

    let output = ocr_table_extractor::run(ocr_table_extractor::Config {
        image_path: cli.image,
        mode,
        crop,
        displayed,
        format,
        languages: cli.lang,
        tolerance: cli.tolerance,
        sort_rows: cli.sort_rows,
        no_binarize: cli.no_binarize,
        settings_path: cli.read_settings,
    })
    .await?;

    if output.extraction == Extraction::NoTable && format == Format::Tsv {
        eprintln!("no table detected");
        return Ok(());
    }
    println!("{}", output.rendered);
    Ok(())
}

fn parse_mode(value: &str) -> Result<Mode> {
    match value.trim().to_ascii_lowercase().as_str() {
        "text" => Ok(Mode::Text),
        "table" | "grid" => Ok(Mode::Table),
        other => Err(anyhow!("unknown mode '{}' (expected text or table)", other)),
    }
}

fn parse_display(value: &str) -> Result<Size> {
    let (w, h) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| anyhow!("invalid display size '{}' (expected WIDTHxHEIGHT)", value))?;
    let width: f64 = w
        .trim()
        .parse()
        .map_err(|_| anyhow!("invalid display width '{}'", w))?;
    let height: f64 = h
        .trim()
        .parse()
        .map_err(|_| anyhow!("invalid display height '{}'", h))?;
    Ok(Size::new(width, height))
}
