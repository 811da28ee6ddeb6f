//! Defrag CLI
//!
//! Reads a run-length-encoded disk map, evaluates both compaction policies,
//! and prints their checksums as text or JSON.

use clap::Parser;
use defrag_rs::DefragReport;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "defrag")]
#[command(about = "Evaluate compaction policies over a run-length-encoded disk map")]
#[command(version)]
struct Args {
    /// Path to a file containing the disk map
    #[arg(conflicts_with = "map")]
    input: Option<PathBuf>,

    /// Inline disk map (digits only)
    #[arg(short = 'm', long, conflicts_with = "input")]
    map: Option<String>,

    /// Emit the report as JSON instead of text
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let args = Args::parse();

    let disk_map = match read_map(&args) {
        Ok(map) => map,
        Err(e) => {
            error!("failed to read disk map: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match defrag_rs::run(&disk_map) {
        Ok(report) => {
            info!("run complete");
            print_report(&report, args.json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn read_map(args: &Args) -> std::io::Result<String> {
    match (&args.input, &args.map) {
        (Some(path), _) => std::fs::read_to_string(path),
        (None, Some(map)) => Ok(map.clone()),
        (None, None) => {
            use std::io::Read;
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn print_report(report: &DefragReport, json: bool) {
    if json {
        // Serialization of a plain struct of integers cannot fail
        println!(
            "{}",
            serde_json::to_string_pretty(report).expect("report serialization")
        );
    } else {
        println!(
            "{} blocks, {} files, {} free",
            report.total_blocks, report.file_count, report.free_blocks
        );
        println!("single-block checksum: {}", report.single_block_checksum);
        println!("whole-file checksum:   {}", report.whole_file_checksum);
    }
}
