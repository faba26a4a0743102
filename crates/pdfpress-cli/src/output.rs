//! User-facing output for the pdfpress CLI.
//!
//! Status lines go through an [`OutputFormatter`] that honors quiet and
//! verbose modes. Diagnostics logged by the library go to stderr through
//! `tracing` instead, see `logging.rs`.

use std::io::{self, IsTerminal};

use pdfpress::pipeline::{FileDiagnostic, MergeOutput, Session};
use pdfpress::utils::format_file_size;

/// Level of output message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    /// Informational message.
    Info,
    /// Success message.
    Success,
    /// Warning message.
    Warning,
    /// Error message.
    Error,
}

/// Output formatter with configurable verbosity.
#[derive(Debug)]
pub struct OutputFormatter {
    quiet: bool,
    verbose: bool,
    colored: bool,
}

impl OutputFormatter {
    /// Create a new output formatter.
    pub fn new(quiet: bool, verbose: bool) -> Self {
        Self {
            quiet,
            verbose,
            colored: io::stdout().is_terminal() && std::env::var("TERM").is_ok(),
        }
    }

    /// Create a quiet formatter (only errors and warnings).
    pub fn quiet() -> Self {
        Self::new(true, false)
    }

    /// Print an informational message. Suppressed in quiet mode.
    pub fn info(&self, message: &str) {
        if !self.quiet {
            self.print_message(MessageLevel::Info, message);
        }
    }

    /// Print a success message. Suppressed in quiet mode.
    pub fn success(&self, message: &str) {
        if !self.quiet {
            self.print_message(MessageLevel::Success, message);
        }
    }

    /// Print a warning message, always.
    pub fn warning(&self, message: &str) {
        self.print_message(MessageLevel::Warning, message);
    }

    /// Print an error message, always.
    pub fn error(&self, message: &str) {
        self.print_message(MessageLevel::Error, message);
    }

    fn print_message(&self, level: MessageLevel, message: &str) {
        let (prefix, color_code) = match level {
            MessageLevel::Info => ("", ""),
            MessageLevel::Success => ("✓ ", "\x1b[32m"),
            MessageLevel::Warning => ("⚠ ", "\x1b[33m"),
            MessageLevel::Error => ("✗ ", "\x1b[31m"),
        };

        let line = if self.colored && !color_code.is_empty() {
            format!("{color_code}{prefix}{message}\x1b[0m")
        } else {
            format!("{prefix}{message}")
        };

        match level {
            MessageLevel::Warning | MessageLevel::Error => eprintln!("{line}"),
            _ => println!("{line}"),
        }
    }

    /// Print a section header. Suppressed in quiet mode.
    pub fn section(&self, title: &str) {
        if !self.quiet {
            println!("\n{title}");
        }
    }

    /// Print a labelled value. Only shown in verbose mode.
    pub fn detail(&self, label: &str, value: &str) {
        if self.verbose {
            println!("  {label}: {value}");
        }
    }

    /// Print a list item. Suppressed in quiet mode.
    pub fn list_item(&self, index: usize, message: &str) {
        if !self.quiet {
            println!("  {index}. {message}");
        }
    }

    /// Print a blank line. Suppressed in quiet mode.
    pub fn blank_line(&self) {
        if !self.quiet {
            println!();
        }
    }

    /// Check if output should be shown.
    pub fn should_print(&self) -> bool {
        !self.quiet
    }

    /// Check if verbose output should be shown.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

impl Default for OutputFormatter {
    fn default() -> Self {
        Self::new(false, false)
    }
}

/// One status line per ingested document.
pub fn document_lines(session: &Session) -> Vec<String> {
    session
        .documents()
        .iter()
        .map(|doc| match doc.validation() {
            Some(v) if v.is_valid() => format!(
                "{} ({} page{}, {})",
                doc.name(),
                v.page_count,
                if v.page_count == 1 { "" } else { "s" },
                format_file_size(doc.handle().declared_size())
            ),
            Some(v) => format!(
                "{} [invalid: {}] {}",
                doc.name(),
                v.code.map_or("unknown", |c| c.as_str()),
                v.message
            ),
            None => format!("{} [not validated]", doc.name()),
        })
        .collect()
}

/// Describe a diagnostic in one line.
pub fn diagnostic_line(diagnostic: &FileDiagnostic) -> String {
    let verdict = if diagnostic.excluded { "excluded" } else { "included" };
    let code = diagnostic.code.map_or("unknown", |c| c.as_str());
    format!("{} ({verdict}, {code}): {}", diagnostic.name, diagnostic.message)
}

/// Display the session before merging.
pub fn display_session(formatter: &OutputFormatter, session: &Session) {
    if !formatter.should_print() {
        return;
    }

    formatter.section("Input files");
    for (index, line) in document_lines(session).iter().enumerate() {
        formatter.list_item(index + 1, line);
    }

    let summary = session.summary();
    formatter.info(&format!(
        "{} of {} file(s) valid, {} total",
        summary.valid,
        summary.files,
        format_file_size(summary.valid_size)
    ));
}

/// Display the report of a finished merge.
pub fn display_report(formatter: &OutputFormatter, output: &MergeOutput) {
    for diagnostic in output.diagnostics.iter().filter(|d| !d.excluded) {
        formatter.info(&format!("Repaired {}", diagnostic_line(diagnostic)));
    }
    for diagnostic in output.diagnostics.iter().filter(|d| d.excluded) {
        formatter.warning(&format!("Skipped {}", diagnostic_line(diagnostic)));
    }
    if let Some(ref reason) = output.compression_error {
        formatter.warning(&format!("Compression skipped: {reason}"));
    }

    let report = &output.report;
    formatter.blank_line();
    formatter.info(&format!(
        "Merged {} file(s) into {} pages",
        report.files_merged, report.page_count
    ));

    if report.compressed {
        formatter.info(&format!(
            "Size: {} -> {} ({} smaller)",
            report.format_original_size(),
            report.format_final_size(),
            report.format_reduction()
        ));
    } else {
        formatter.info(&format!("Size: {}", report.format_final_size()));
    }

    if formatter.is_verbose() {
        formatter.section("Statistics");
        formatter.detail("Input files", &report.files_merged.to_string());
        formatter.detail("Total pages", &report.page_count.to_string());
        formatter.detail("Input size", &report.format_original_size());
        formatter.detail("Output size", &report.format_final_size());
        formatter.detail(
            "Compression",
            match (report.compression_attempted, report.compressed) {
                (false, _) => "Disabled",
                (true, true) => "Applied",
                (true, false) => "Not applied",
            },
        );
        if let Some(tier) = report.tier {
            formatter.detail(
                "Quality tier",
                &format!("{tier} ({} dpi)", tier.resolution()),
            );
        }
    }
}
