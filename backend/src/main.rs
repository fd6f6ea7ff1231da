//! caserecon CLI - Reconcile state and CDC case exports
//!
//! ```bash
//! caserecon compare -s state.csv -r cdc.csv -o report/   # Write results.csv + stats.csv
//! caserecon compare -s state.csv -r cdc.csv              # Print JSON report to stdout
//! caserecon serve                                        # Start HTTP server (port 8000)
//! caserecon parse cdc.csv                                # Debug: show how a CSV is read
//! ```

use clap::{Parser, Subcommand};
use caserecon::{
    parse_csv_file_auto, reconcile_files, table_to_json, write_report_dir, EventCodeFilter,
    ReconcileOptions,
    ReportResponse, ServerConfig,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "caserecon")]
#[command(about = "Reconcile state and CDC case datasets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare a state CSV with a CDC CSV
    Compare {
        /// State-side CSV file
        #[arg(short, long)]
        source: PathBuf,

        /// CDC-side CSV file
        #[arg(short, long)]
        reference: PathBuf,

        /// Folder for results.csv and stats.csv (default: JSON on stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only compare these event codes (comma separated)
        #[arg(short, long, value_delimiter = ',')]
        event_codes: Option<Vec<String>>,

        /// Only compare event codes present in the CDC file
        #[arg(short, long)]
        filter_by_reference: bool,
    },

    /// Parse a CSV file and output JSON
    Parse {
        /// Input CSV file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "CASERECON_PORT")]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Compare {
            source,
            reference,
            output,
            event_codes,
            filter_by_reference,
        } => {
            let options = ReconcileOptions {
                event_codes: event_codes.map(EventCodeFilter::new),
                filter_by_reference,
            };
            cmd_compare(&source, &reference, output.as_deref(), options)
        }

        Commands::Parse { input, output } => cmd_parse(&input, output.as_deref()),

        Commands::Serve { port } => cmd_serve(port).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_compare(
    source: &Path,
    reference: &Path,
    output: Option<&Path>,
    options: ReconcileOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("🔍 Comparing {} against {}", source.display(), reference.display());

    let report = reconcile_files(source, reference, options)?;

    match output {
        Some(dir) => {
            let files = write_report_dir(dir, &report.reconciliation)?;
            eprintln!("💾 Results written to: {}", files.results.display());
            eprintln!("💾 Statistics written to: {}", files.stats.display());
        }
        None => {
            let response = ReportResponse::from(report);
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    eprintln!("✨ Done!");
    Ok(())
}

fn cmd_parse(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Parsing CSV: {}", input.display());

    let result = parse_csv_file_auto(input)?;

    eprintln!("   Encoding: {}", result.encoding);
    eprintln!(
        "   Delimiter: '{}'",
        caserecon::reconcile::format_delimiter(result.delimiter)
    );
    eprintln!("   Columns: {}", result.table.headers.join(", "));
    eprintln!("✅ Parsed {} records", result.table.len());

    let json = serde_json::to_string_pretty(&table_to_json(&result.table))?;
    write_output(&json, output)?;

    Ok(())
}

async fn cmd_serve(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = ServerConfig::from_env();
    if let Some(port) = port {
        config = config.with_port(port);
    }
    caserecon::server::start_server(config).await
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
