#![deny(warnings)]

// Binary crate for filewriter - uses library crate

use anyhow::Context;
use clap::Parser;
use filewriter::logging::init_logging;
use filewriter::report::OpReport;
use filewriter::FileWriter;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "filewriter")]
#[command(about = "Whole-file writer")]
#[command(
    long_about = "filewriter overwrites, appends to, prepends to, or deletes a single file, creating it and its parent directory when missing.\n\nUsage:\n  filewriter overwrite notes/today.txt 'First line'\n  echo 'Second line' | filewriter append notes/today.txt\n  filewriter --json delete notes/today.txt"
)]
#[command(version)]
struct Cli {
    /// Print a JSON report instead of human-readable output
    #[arg(long, global = true)]
    json: bool,

    /// Log filter directive (overrides RUST_LOG)
    #[arg(long, global = true, env = "FILEWRITER_LOG")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Replace the file content
    Overwrite {
        path: PathBuf,
        /// Content to write (read from stdin when omitted)
        content: Option<String>,
    },
    /// Add content to the end of the file
    Append {
        path: PathBuf,
        /// Content to append (read from stdin when omitted)
        content: Option<String>,
    },
    /// Add content to the beginning of the file
    Prepend {
        path: PathBuf,
        /// Content to prepend (read from stdin when omitted)
        content: Option<String>,
    },
    /// Remove the file
    Delete { path: PathBuf },
    /// Print the file content
    Cat { path: PathBuf },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.log_level.as_deref()) {
        eprintln!("{e}");
    }

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Run the selected command. `Ok(false)` means the file operation failed and
/// was already reported.
fn run(cli: Cli) -> anyhow::Result<bool> {
    let (operation, writer, result) = match cli.command {
        Commands::Overwrite { path, content } => {
            let content = content_or_stdin(content)?;
            let writer = FileWriter::new(path);
            let result = writer.try_overwrite(content);
            ("overwrite", writer, result)
        }
        Commands::Append { path, content } => {
            let content = content_or_stdin(content)?;
            let writer = FileWriter::new(path);
            let result = writer.try_append(content);
            ("append", writer, result)
        }
        Commands::Prepend { path, content } => {
            let content = content_or_stdin(content)?;
            let writer = FileWriter::new(path);
            let result = writer.try_prepend(content);
            ("prepend", writer, result)
        }
        Commands::Delete { path } => {
            let writer = FileWriter::bind(path);
            let result = writer.try_delete();
            ("delete", writer, result)
        }
        Commands::Cat { path } => {
            let writer = FileWriter::bind(path);
            return cat(&writer, cli.json);
        }
    };

    let report = OpReport::new(&writer, operation, &result);
    if cli.json {
        print_json(&report)?;
    } else if let Some(error) = &report.error {
        eprintln!("{operation} failed: {error}");
    }

    Ok(report.is_ok())
}

fn cat(writer: &FileWriter, json: bool) -> anyhow::Result<bool> {
    let content = match writer.read() {
        Ok(content) => content,
        Err(e) => {
            let report = OpReport::new(writer, "cat", &Err(e));
            if json {
                print_json(&report)?;
            } else if let Some(error) = &report.error {
                eprintln!("cat failed: {error}");
            }
            return Ok(false);
        }
    };

    let mut stdout = io::stdout().lock();
    stdout
        .write_all(&content)
        .and_then(|_| stdout.flush())
        .context("Failed to write to stdout")?;
    Ok(true)
}

fn content_or_stdin(content: Option<String>) -> anyhow::Result<Vec<u8>> {
    match content {
        Some(content) => Ok(content.into_bytes()),
        None => {
            let mut buf = Vec::new();
            io::stdin()
                .read_to_end(&mut buf)
                .context("Failed to read content from stdin")?;
            Ok(buf)
        }
    }
}

fn print_json(report: &OpReport) -> anyhow::Result<()> {
    let line = serde_json::to_string(report).context("Failed to serialize report")?;
    println!("{line}");
    Ok(())
}
