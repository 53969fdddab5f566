use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

/// Convert tables in PDF documents into xlsx workbooks.
#[derive(Debug, Parser)]
#[command(name = "pdf2sheet", about, version)]
pub struct Cli {
    /// Log more (-v info, -vv debug). RUST_LOG overrides this
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Convert a PDF into an .xlsx workbook, one sheet per detected block
    Convert {
        /// Path to the PDF file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output workbook. Default: FILE with an .xlsx extension
        #[arg(short, long, value_name = "OUT")]
        output: Option<PathBuf>,

        #[command(flatten)]
        extraction: ExtractionArgs,

        /// Write every cell as text, even numeric-looking ones
        #[arg(long)]
        no_numbers: bool,

        /// Prefix for generated sheet names
        #[arg(long, default_value = "")]
        sheet_prefix: String,

        /// When to add the detection_info sheet
        #[arg(long, value_enum, default_value_t = MetadataArg::Auto)]
        metadata: MetadataArg,
    },

    /// Print the detected blocks without writing a workbook
    Blocks {
        /// Path to the PDF file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[command(flatten)]
        extraction: ExtractionArgs,

        /// Output format
        #[arg(long, value_enum, default_value_t = BlockFormat::Text)]
        format: BlockFormat,
    },
}

/// Options shared by every command that runs the cascade.
#[derive(Debug, Clone, Args)]
pub struct ExtractionArgs {
    /// Page range (e.g. '1,3-5'). Default: all pages
    #[arg(long)]
    pub pages: Option<String>,

    /// JSON file with extraction settings; flags below override it
    #[arg(long, value_name = "JSON")]
    pub config: Option<PathBuf>,

    /// Gap above which text rows split into a new column
    #[arg(long)]
    pub column_gap: Option<f64>,

    /// Decimal places used to group glyphs into text rows
    #[arg(long)]
    pub row_precision: Option<u32>,

    /// Fewest text rows accepted as structure
    #[arg(long)]
    pub min_rows: Option<usize>,

    /// Snap tolerance for ruled-table edges
    #[arg(long)]
    pub snap_tolerance: Option<f64>,

    /// Skip text-gap table detection
    #[arg(long)]
    pub no_text_gaps: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MetadataArg {
    Auto,
    Always,
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BlockFormat {
    Text,
    Json,
}
