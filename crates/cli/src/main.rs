//! inkpdf - freehand ink annotations for PDF files

mod commands;

use annotator::Settings;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "inkpdf", version, about = "Freehand ink annotations for PDF files")]
pub struct Args {
    /// Settings file (defaults to the user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show page count and page geometry
    Info {
        pdf: PathBuf,
    },

    /// List PDFs in a folder
    Browse {
        #[arg(default_value = ".")]
        dir: PathBuf,
    },

    /// Write sidecar strokes into the PDF as ink annotations
    Apply {
        pdf: PathBuf,
        /// Stroke file (defaults to `<pdf>.ink.json`)
        #[arg(long)]
        ink: Option<PathBuf>,
        /// Output PDF (defaults to overwriting the input)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Keep ink annotations from earlier saves
        #[arg(long)]
        keep_existing: bool,
    },

    /// Read ink annotations into a stroke file
    Extract {
        pdf: PathBuf,
        /// Stroke file (defaults to `<pdf>.ink.json`)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Remove the extracted annotations from the PDF
        #[arg(long)]
        remove: bool,
        /// Only annotations written by inkpdf
        #[arg(long)]
        only_own: bool,
    },

    /// Map a point between page-view and PDF coordinates
    Map {
        pdf: PathBuf,
        page: usize,
        #[arg(allow_negative_numbers = true)]
        x: f64,
        #[arg(allow_negative_numbers = true)]
        y: f64,
        /// Map from PDF to view coordinates
        #[arg(long)]
        inverse: bool,
    },

    /// Render a page's strokes to PNG
    Preview {
        pdf: PathBuf,
        page: usize,
        #[arg(long)]
        out: PathBuf,
        /// Stroke file (defaults to `<pdf>.ink.json`)
        #[arg(long)]
        ink: Option<PathBuf>,
        /// Pixels per view unit
        #[arg(long, default_value_t = 1.0)]
        scale: f64,
    },

    /// Show recently opened documents
    Recent {
        /// Forget documents that no longer exist
        #[arg(long)]
        prune: bool,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let settings = match &args.config {
        // An explicit config file must be usable
        Some(path) => Settings::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Settings::load_or_default(Settings::default_path()),
    };

    commands::run(args.command, &settings)
}
