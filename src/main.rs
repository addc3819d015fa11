//! Main entry point for the skillpack CLI application.
//!
//! Packages skill directories into `.skill` archives and inspects existing
//! archives.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use skillpack::cli::{Command, PackageArgs};
use skillpack::package::{discover, package_all, select};
use skillpack::{Cli, LocalFileReader, LocalFs, ZipExtractor};

/// Application entry point.
///
/// Parses command-line arguments, sets up logging and dispatches to the
/// handler for the chosen subcommand.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    match &cli.command {
        Command::Package(args) => package(args, cli.quiet).await,
        Command::List { file, long } => list_files(file, *long).await,
        Command::Verify { file } => verify(file, cli.quiet).await,
    }
}

/// Log to stderr; `RUST_LOG` wins over the `-q`/`-v` flags.
fn init_tracing(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Package the selected skills and print one line per skill.
///
/// Fails when any skill failed, after every skill has been attempted.
async fn package(args: &PackageArgs, quiet: bool) -> Result<()> {
    let fs = Arc::new(LocalFs);

    let targets = discover(fs.as_ref(), &args.skills_dir).await?;
    let targets = select(targets, args.skill.as_deref())?;

    if !quiet {
        println!("Packaging .skill files...\n");
    }

    let summary = package_all(fs, targets, &args.outdir).await;

    for report in &summary.reports {
        match &report.outcome {
            Ok(archive) => {
                if !quiet {
                    println!(
                        "  {}.skill ({} files, {})",
                        report.name,
                        archive.stats.entries,
                        format_size(archive.stats.bytes as u64)
                    );
                }
            }
            Err(e) => eprintln!("  {}: {}", report.name, e),
        }
    }

    let written = summary.succeeded().count();
    let failed = summary.failed().count();
    if !quiet {
        println!(
            "\n{} .skill file(s) written to {}",
            written,
            args.outdir.display()
        );
    }

    if failed > 0 {
        bail!("{} of {} skill(s) failed", failed, summary.reports.len());
    }
    Ok(())
}

/// List files in an archive.
///
/// Supports two output formats:
/// - Simple format: just file names, one per line
/// - Long format (`-l`): size, method and CRC-32 per entry, plus totals
async fn list_files(path: &Path, long: bool) -> Result<()> {
    let reader = Arc::new(
        LocalFileReader::new(path).with_context(|| format!("opening {}", path.display()))?,
    );
    let extractor = ZipExtractor::new(reader);
    let entries = extractor.list_files().await?;

    if !long {
        for entry in &entries {
            println!("{}", entry.file_name);
        }
        return Ok(());
    }

    println!("{:>10}  {:>6}  {:>8}  Name", "Length", "Method", "CRC-32");
    println!("{}", "-".repeat(50));

    let mut total = 0u64;
    for entry in &entries {
        let method = match entry.compression_method.as_u16() {
            0 => "Stored".to_string(),
            other => format!("#{}", other),
        };
        println!(
            "{:>10}  {:>6}  {:08x}  {}",
            entry.uncompressed_size, method, entry.crc32, entry.file_name
        );
        total += entry.uncompressed_size;
    }

    println!("{}", "-".repeat(50));
    println!("{:>10}  {:>18}  {} files", total, "", entries.len());
    Ok(())
}

/// Extract every entry in memory and compare it with its recorded CRC-32.
async fn verify(path: &Path, quiet: bool) -> Result<()> {
    let reader = Arc::new(
        LocalFileReader::new(path).with_context(|| format!("opening {}", path.display()))?,
    );
    let extractor = ZipExtractor::new(reader);
    let entries = extractor.list_files().await?;

    let mut bad = 0usize;
    for entry in &entries {
        match extractor.extract_to_memory(entry).await {
            Ok(_) => {
                if !quiet {
                    println!("  OK    {}", entry.file_name);
                }
            }
            Err(e) => {
                bad += 1;
                eprintln!("  FAIL  {}: {}", entry.file_name, e);
            }
        }
    }

    if bad > 0 {
        bail!("{} of {} entries failed verification", bad, entries.len());
    }
    if !quiet {
        println!("\n{}: {} entries OK", path.display(), entries.len());
    }
    Ok(())
}

/// Format a byte size into a human-readable string.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(format_size(500), "500 bytes");
/// assert_eq!(format_size(1536), "1.5KB");
/// assert_eq!(format_size(1048576), "1.0MB");
/// ```
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if size >= MB {
        format!("{:.1}MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.1}KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
