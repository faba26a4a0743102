//! Ghostscript `pdfwrite` wrapper.
//!
//! The child process is spawned with `kill_on_drop`, so a run abandoned by
//! the compressor's timeout does not outlive it.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command;
use tracing::debug;

use crate::compress::RasterTransform;
use crate::config::ToolConfig;
use crate::error::CompressionError;
use crate::utils::truncate_diagnostic;

/// Runs the Ghostscript binary as a subprocess.
#[derive(Debug, Clone)]
pub struct Ghostscript {
    binary: PathBuf,
}

impl Ghostscript {
    /// Create a wrapper around `binary`.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Create a wrapper from tool settings.
    pub fn from_config(config: &ToolConfig) -> Self {
        Self::new(config.binary.clone())
    }

    /// Binary this wrapper runs.
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Arguments for one downsampling run.
    pub fn arguments(input: &Path, output: &Path, resolution: u32) -> Vec<OsString> {
        let mut args: Vec<OsString> = [
            "-sDEVICE=pdfwrite",
            "-dCompatibilityLevel=1.4",
            "-dPDFSETTINGS=/ebook",
            "-dNOPAUSE",
            "-dQUIET",
            "-dBATCH",
            "-dDownsampleColorImages=true",
            "-dDownsampleGrayImages=true",
            "-dDownsampleMonoImages=true",
        ]
        .into_iter()
        .map(OsString::from)
        .collect();

        for kind in ["Color", "Gray", "Mono"] {
            args.push(format!("-d{kind}ImageResolution={resolution}").into());
        }

        let mut output_arg = OsString::from("-sOutputFile=");
        output_arg.push(output.as_os_str());
        args.push(output_arg);
        args.push(input.as_os_str().to_owned());

        args
    }

    async fn execute(&self, args: Vec<OsString>) -> Result<Output, CompressionError> {
        let mut command = Command::new(&self.binary);
        command.args(&args).kill_on_drop(true);

        debug!(binary = %self.binary.display(), ?args, "running compression tool");

        command.output().await.map_err(|e| self.spawn_error(e))
    }

    fn spawn_error(&self, error: io::Error) -> CompressionError {
        let reason = if error.kind() == io::ErrorKind::NotFound {
            "not found".to_string()
        } else {
            format!("failed to execute: {error}")
        };
        CompressionError::unavailable(self.binary.display().to_string(), reason)
    }
}

impl Default for Ghostscript {
    fn default() -> Self {
        Self::from_config(&ToolConfig::default())
    }
}

impl RasterTransform for Ghostscript {
    async fn probe(&self) -> Result<String, CompressionError> {
        let output = self.execute(vec!["--version".into()]).await?;

        if !output.status.success() {
            return Err(CompressionError::unavailable(
                self.binary.display().to_string(),
                format!(
                    "version check exited with {}",
                    output.status.code().map_or_else(|| "signal".to_string(), |c| c.to_string())
                ),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn run(&self, input: &Path, output: &Path, resolution: u32) -> Result<(), CompressionError> {
        let result = self
            .execute(Self::arguments(input, output, resolution))
            .await?;

        if result.status.success() {
            Ok(())
        } else {
            Err(CompressionError::ToolFailed {
                code: result.status.code(),
                stderr: truncate_diagnostic(&String::from_utf8_lossy(&result.stderr)),
            })
        }
    }
}
