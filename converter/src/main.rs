//! Freightsheet CLI - Convert spreadsheet exports to JSON
//!
//! ```bash
//! freightsheet shipment-export 2023.01_ship.xls out/   # writes out/2023.01_ship.xls.json
//! freightsheet orders-report orders.xls out/            # writes out/orders.xls.json
//! freightsheet columns shipment-export                  # show a pipeline definition
//! ```

use clap::{Parser, Subcommand};
use freightsheet::{convert_file, ConvertOptions, PipelineKind};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "freightsheet")]
#[command(about = "Convert shipment and order spreadsheets to JSON", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a shipment export (.xls)
    ShipmentExport {
        /// Input workbook; its name must start with the reporting month (YYYY.MM)
        input: PathBuf,

        /// Existing folder receiving <input name>.json
        output_folder: PathBuf,
    },

    /// Convert an orders report (first row is a title)
    OrdersReport {
        /// Input workbook
        input: PathBuf,

        /// Existing folder receiving <input name>.json
        output_folder: PathBuf,
    },

    /// Show a pipeline definition as JSON
    Columns {
        /// shipment-export or orders-report
        pipeline: PipelineKind,
    },
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::ShipmentExport {
            input,
            output_folder,
        } => cmd_convert(PipelineKind::ShipmentExport, &input, &output_folder),

        Commands::OrdersReport {
            input,
            output_folder,
        } => cmd_convert(PipelineKind::OrdersReport, &input, &output_folder),

        Commands::Columns { pipeline } => cmd_columns(pipeline),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_convert(
    kind: PipelineKind,
    input: &Path,
    output_folder: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = ConvertOptions::from_env(output_folder)?;
    let report = convert_file(kind.spec(), input, &options)?;

    if options.echo_logs {
        eprintln!("   Rows: {}", report.row_count);
        eprintln!("   Columns: {}", report.columns.join(", "));
        if !report.derived {
            eprintln!("   ⚠️  Derived fields were not applied");
        }
        eprintln!("\n✨ Done!");
    }
    Ok(())
}

fn cmd_columns(kind: PipelineKind) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", kind.spec().to_json()?);
    Ok(())
}
