//! pdfpress - Validate, repair, merge and recompress PDF documents.
//!
//! Command-line front end for the `pdfpress` pipeline.

mod cli;
mod logging;
mod output;

use clap::Parser;
use std::path::{Path, PathBuf};
use std::process;

use crate::cli::Cli;
use crate::output::{OutputFormatter, diagnostic_line, display_report, display_session};
use pdfpress::io::DocumentHandle;
use pdfpress::pipeline::{Pipeline, Session};
use pdfpress::utils::{collect_paths_for_patterns, format_file_size};
use pdfpress::{PdfPressError, Result};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose, cli.quiet);

    let formatter = OutputFormatter::new(cli.quiet, cli.verbose);

    if let Err(err) = run(cli).await {
        formatter.error(&format!("Error: {err}"));
        process::exit(err.exit_code());
    }
}

/// Main application logic.
async fn run(cli: Cli) -> Result<()> {
    cli.validate()?;

    let config = cli.to_config()?;
    let strategy = cli.strategy()?;
    let output_path = cli.output_path()?;

    // Machine-readable output owns stdout
    let formatter = if cli.json {
        OutputFormatter::quiet()
    } else {
        OutputFormatter::new(cli.quiet, cli.verbose)
    };

    if formatter.should_print() {
        formatter.section(&format!("{} v{}", pdfpress::NAME, pdfpress::VERSION));
        formatter.blank_line();
    }

    check_overwrite(&output_path, cli.force)?;

    let handles = load_handles(&cli.inputs, &formatter).await?;

    let pipeline = Pipeline::new(config)?;
    let mut session = Session::new();

    formatter.info("Validating input files...");
    pipeline.ingest(&mut session, handles).await?;
    display_session(&formatter, &session);

    let output_name = output_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| {
            PdfPressError::invalid_output_name(output_path.display().to_string(), "no file name")
        })?;

    formatter.info(&format!("Merging documents ({strategy})..."));
    let merge_output = match pipeline.merge(&mut session, &output_name, strategy).await {
        Ok(merge_output) => merge_output,
        Err(err) => {
            for diagnostic in session.diagnostics() {
                formatter.warning(&diagnostic_line(&diagnostic));
            }
            return Err(err);
        }
    };

    let write_stats = merge_output.artifact.persist_to(&output_path).await?;

    if cli.json {
        let mut value = serde_json::to_value(merge_output)
            .map_err(|err| PdfPressError::other(format!("Failed to encode report: {err}")))?;
        if let Some(object) = value.as_object_mut() {
            object.insert(
                "output".to_string(),
                serde_json::Value::String(write_stats.output_path.display().to_string()),
            );
        }
        println!("{value}");
        return Ok(());
    }

    display_report(&formatter, merge_output);

    formatter.blank_line();
    formatter.success(&format!(
        "Successfully created {} ({})",
        output_path.display(),
        format_file_size(write_stats.file_size)
    ));
    formatter.detail(
        "Write time",
        &format!("{:.2}s", write_stats.write_time.as_secs_f64()),
    );

    Ok(())
}

/// Refuse to replace an existing output unless forced.
fn check_overwrite(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        return Err(PdfPressError::other(format!(
            "Output file already exists: {} (use --force to overwrite)",
            output.display()
        )));
    }
    Ok(())
}

/// Expand the input patterns and open a handle for each file.
///
/// Files that cannot be opened are reported and skipped; the pipeline
/// decides whether enough inputs remain.
async fn load_handles(patterns: &[String], formatter: &OutputFormatter) -> Result<Vec<DocumentHandle>> {
    let mut paths: Vec<PathBuf> = Vec::new();
    for pattern in patterns {
        let matched = collect_paths_for_patterns([pattern])?;
        if matched.is_empty() {
            formatter.warning(&format!("No files match '{pattern}'"));
        }
        paths.extend(matched);
    }

    let mut handles = Vec::with_capacity(paths.len());
    for path in paths {
        match DocumentHandle::from_path(&path).await {
            Ok(handle) => handles.push(handle),
            Err(err) => formatter.warning(&format!("Skipping {}: {err}", path.display())),
        }
    }

    Ok(handles)
}
