//! # mpop-pdf CLI
//!
//! Usage:
//!   mpop-pdf render record.json [--sheet sheet.json] [--braille-font font.ttf]
//!                   [--asset KEY=logo.png]... [-o out.pdf]
//!   mpop-pdf manual record.json [-o out.pdf]
//!   mpop-pdf braille record.json --pages pages.json [-o out.pdf]
//!   mpop-pdf example > sheet.json
//!
//! A record path of `-` reads the record from stdin. Without `-o` the file
//! is named after the record (`mpop-{id}.pdf`, `mpop-manual-{title}.pdf`).

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mpop_pdf::font::FontContext;
use mpop_pdf::image_loader::{Assets, ImageAsset};
use mpop_pdf::model::{Record, Sheet};
use mpop_pdf::output::{manual_filename, sheet_filename};
use mpop_pdf::style::BRAILLE_FAMILY;
use mpop_pdf::RenderError;

#[derive(Parser, Debug)]
#[command(name = "mpop-pdf")]
#[command(version, about = "Render mpop item records to printable PDF sheets")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a record onto the grid sheet
    Render {
        /// Record JSON file, or `-` for stdin
        record: PathBuf,

        /// Sheet JSON (grid, styles, layout); defaults to the reference sheet
        #[arg(long)]
        sheet: Option<PathBuf>,

        /// TrueType font for the braille style
        #[arg(long)]
        braille_font: Option<PathBuf>,

        /// JPEG or PNG image for image cells, keyed by the cell's value
        #[arg(long = "asset", value_name = "KEY=PATH")]
        assets: Vec<String>,

        /// Outline every cell, for designing layouts
        #[arg(long)]
        show_grid: bool,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render the item manual
    Manual {
        /// Record JSON file, or `-` for stdin
        record: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render the Braille transcript from the item's page rows
    Braille {
        /// Record JSON file, or `-` for stdin
        record: PathBuf,

        /// JSON array of page rows (page_no, title_letters, text, remarks)
        #[arg(long)]
        pages: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the reference sheet as JSON
    Example,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // stdout may carry JSON, so logs go to stderr.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<(), RenderError> {
    match command {
        Command::Render {
            record,
            sheet,
            braille_font,
            assets,
            show_grid,
            output,
        } => {
            let record = Record::from_json(&read_input(&record)?)?;
            let mut sheet = match sheet {
                Some(path) => Sheet::from_json(&fs::read_to_string(path)?)?,
                None => Sheet::reference(),
            };
            sheet.show_grid |= show_grid;

            let mut fonts = FontContext::new();
            if let Some(path) = braille_font {
                load_braille_font(&mut fonts, &path);
            }
            let assets = load_assets(&assets)?;

            let bytes = mpop_pdf::render_sheet(&record, &sheet, &fonts, &assets)?;
            let path = output.unwrap_or_else(|| sheet_filename(&record).into());
            write_output(&path, &bytes)
        }

        Command::Manual { record, output } => {
            let record = Record::from_json(&read_input(&record)?)?;
            let bytes = mpop_pdf::render_manual(&record, &FontContext::new())?;
            let path = output.unwrap_or_else(|| manual_filename(&record).into());
            write_output(&path, &bytes)
        }

        Command::Braille {
            record,
            pages,
            output,
        } => {
            let record = Record::from_json(&read_input(&record)?)?;
            let pages: Vec<Record> = serde_json::from_str(&fs::read_to_string(pages)?)?;
            let bytes = mpop_pdf::render_braille_pages(&record, &pages, &FontContext::new())?;
            let path = output.unwrap_or_else(|| sheet_filename(&record).into());
            write_output(&path, &bytes)
        }

        Command::Example => {
            let json = serde_json::to_string_pretty(&Sheet::reference())?;
            println!("{}", json);
            Ok(())
        }
    }
}

fn read_input(path: &Path) -> Result<String, RenderError> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

/// The braille font is optional: on failure the style falls back.
fn load_braille_font(fonts: &mut FontContext, path: &Path) {
    let result = fs::read(path)
        .map_err(RenderError::from)
        .and_then(|data| fonts.register_font(BRAILLE_FAMILY, 400, false, data));
    if let Err(e) = result {
        tracing::warn!(path = %path.display(), error = %e, "braille font not loaded");
    }
}

fn load_assets(specs: &[String]) -> Result<Assets, RenderError> {
    let mut assets = Assets::new();
    for spec in specs {
        // Keys may be URLs containing '=', paths rarely do.
        let (key, path) = spec.rsplit_once('=').ok_or_else(|| {
            RenderError::Image(format!("--asset expects KEY=PATH, got '{}'", spec))
        })?;
        match fs::read(path).map_err(RenderError::from).and_then(ImageAsset::from_bytes) {
            Ok(image) => assets.insert(key, image),
            Err(e) => tracing::warn!(key, path, error = %e, "skipping image asset"),
        }
    }
    Ok(assets)
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<(), RenderError> {
    fs::write(path, bytes)?;
    tracing::info!(bytes = bytes.len(), path = %path.display(), "wrote PDF");
    Ok(())
}
