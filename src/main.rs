use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use tabella::cli;
use tabella::config::TabellaOptions;

#[derive(Parser)]
#[command(name = "tabella")]
#[command(about = "Map spreadsheet worksheets onto typed rows and back")]
#[command(long_about = "Tabella - declarative spreadsheet import/export

Worksheets are matched by name, header cells by normalised text, and every
data row is coerced, validated and keyed according to a YAML mapping file.

COMMANDS:
  import    - Read an .xlsx file through a mapping, report diagnostics
  export    - Write JSON rows to an .xlsx file through a mapping
  template  - Write an empty workbook with the mapped header rows

EXAMPLES:
  tabella import prices.xlsx --mapping prices.yaml --output rows.json
  tabella export prices.xlsx --mapping prices.yaml --data rows.json
  tabella template blank.xlsx --mapping prices.yaml")]
#[command(version)]
struct Cli {
    /// Options file (sender, header colours, message keys)
    #[arg(long, global = true, env = "TABELLA_CONFIG")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(long_about = "Import an Excel .xlsx file through a mapping.

Each declared sheet is matched against the workbook's visible worksheets.
The header row is located by index among the visible, non-blank rows and
every data row after it is processed. Diagnostics are printed grouped by
sheet and row.

EXAMPLE:
  tabella import prices.xlsx --mapping prices.yaml --header-row 0 --output rows.json")]
    /// Import an Excel .xlsx file through a mapping
    Import {
        /// Path to Excel file (.xlsx)
        file: PathBuf,

        /// Mapping file (YAML)
        #[arg(short, long)]
        mapping: PathBuf,

        /// Zero-based index of the header among visible, non-blank rows
        #[arg(long, default_value = "0")]
        header_row: usize,

        /// Write accepted rows and messages as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Report rows whose composite key was already seen
        #[arg(long)]
        check_duplicates: bool,
    },

    /// Export JSON rows to an Excel .xlsx file
    Export {
        /// Output Excel file path (.xlsx)
        output: PathBuf,

        /// Mapping file (YAML)
        #[arg(short, long)]
        mapping: PathBuf,

        /// JSON object of sheet name → array of rows
        #[arg(short, long)]
        data: PathBuf,
    },

    /// Write header-only worksheets for a mapping
    Template {
        /// Output Excel file path (.xlsx)
        output: PathBuf,

        /// Mapping file (YAML)
        #[arg(short, long)]
        mapping: PathBuf,
    },
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "tabella=warn",
        1 => "tabella=info",
        _ => "tabella=debug",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let options = match &cli.config {
        Some(path) => TabellaOptions::load(path)
            .with_context(|| format!("failed to load options from {}", path.display()))?,
        None => TabellaOptions::default(),
    };

    match cli.command {
        Commands::Import {
            file,
            mapping,
            header_row,
            output,
            check_duplicates,
        } => cli::import(file, mapping, header_row, output, check_duplicates, &options)?,
        Commands::Export {
            output,
            mapping,
            data,
        } => cli::export(output, mapping, data, &options).await?,
        Commands::Template { output, mapping } => cli::template(output, mapping, &options)?,
    }

    Ok(())
}
