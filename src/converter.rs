//! Presentation to PDF conversion via an external office-document converter.

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing::info;

/// Capability interface for turning one document into a PDF.
///
/// The pipeline only depends on this trait, so tests can substitute a
/// stub instead of launching a real converter process.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentConverter: Send + Sync {
    /// Converts `input` into a PDF inside `outdir` and returns the path
    /// of the produced file.
    async fn convert(&self, input: &Path, outdir: &Path) -> Result<PathBuf>;
}

/// Converter backed by a LibreOffice-compatible `soffice` executable.
///
/// Invocation contract: `<soffice> --headless --convert-to pdf
/// --outdir <dir> <input>` writes `<input-stem>.pdf` into `<dir>` on
/// success and exits nonzero on failure.
pub struct SofficeConverter {
    soffice_path: PathBuf,
    timeout: Duration,
}

impl SofficeConverter {
    pub fn new(soffice_path: PathBuf, timeout: Duration) -> Self {
        Self {
            soffice_path,
            timeout,
        }
    }
}

#[async_trait]
impl DocumentConverter for SofficeConverter {
    /// Runs the converter synchronously with respect to the calling
    /// request and verifies the expected output file exists afterwards.
    ///
    /// # Errors
    ///
    /// All failure modes surface as `ConversionFailed` carrying the input
    /// filename and process diagnostics:
    /// - the process cannot be launched
    /// - the timeout expires (the child is killed on drop)
    /// - the process exits nonzero
    /// - the process exits zero without writing the expected output
    async fn convert(&self, input: &Path, outdir: &Path) -> Result<PathBuf> {
        let filename = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| input.display().to_string());

        tokio::fs::create_dir_all(outdir).await?;

        info!(
            "Converting to PDF: input={}, outdir={}",
            input.display(),
            outdir.display()
        );

        let invocation = Command::new(&self.soffice_path)
            .arg("--headless")
            .arg("--convert-to")
            .arg("pdf")
            .arg("--outdir")
            .arg(outdir)
            .arg(input)
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, invocation).await {
            Ok(spawned) => spawned.map_err(|e| Error::ConversionFailed {
                filename: filename.clone(),
                diagnostics: format!("failed to launch {}: {}", self.soffice_path.display(), e),
            })?,
            Err(_) => {
                return Err(Error::ConversionFailed {
                    filename,
                    diagnostics: format!(
                        "converter timed out after {}s",
                        self.timeout.as_secs_f64()
                    ),
                });
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::ConversionFailed {
                filename,
                diagnostics: format!("{}: {}", output.status, stderr.trim()),
            });
        }

        // A zero exit does not guarantee output; soffice reports some
        // failures only on stdout.
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let expected = outdir.join(format!("{stem}.pdf"));
        if !tokio::fs::try_exists(&expected).await.unwrap_or(false) {
            let stdout = String::from_utf8_lossy(&output.stdout);
            return Err(Error::ConversionFailed {
                filename,
                diagnostics: format!(
                    "converter exited successfully but {} was not produced: {}",
                    expected.display(),
                    stdout.trim()
                ),
            });
        }

        info!("Conversion complete: output={}", expected.display());
        Ok(expected)
    }
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Writes an executable shell script standing in for soffice.
    fn fake_converter(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("fake-soffice");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn sample_input(dir: &Path) -> PathBuf {
        let input = dir.join("deck.pptx");
        std::fs::write(&input, b"not really a pptx").unwrap();
        input
    }

    #[tokio::test]
    async fn test_convert_success() {
        let dir = TempDir::new().unwrap();
        // Positional args: --headless --convert-to pdf --outdir $5 $6
        let script = fake_converter(
            dir.path(),
            r#"base=$(basename "$6"); printf 'fake pdf' > "$5/${base%.*}.pdf""#,
        );
        let converter = SofficeConverter::new(script, Duration::from_secs(5));

        let input = sample_input(dir.path());
        let outdir = dir.path().join("out");
        let produced = converter.convert(&input, &outdir).await.unwrap();

        assert_eq!(produced, outdir.join("deck.pdf"));
        assert!(produced.exists());
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_conversion_failed() {
        let dir = TempDir::new().unwrap();
        let script = fake_converter(dir.path(), r#"echo "cannot load document" >&2; exit 3"#);
        let converter = SofficeConverter::new(script, Duration::from_secs(5));

        let input = sample_input(dir.path());
        let err = converter
            .convert(&input, &dir.path().join("out"))
            .await
            .unwrap_err();

        match err {
            Error::ConversionFailed {
                filename,
                diagnostics,
            } => {
                assert_eq!(filename, "deck.pptx");
                assert!(diagnostics.contains("cannot load document"));
            }
            other => panic!("expected ConversionFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_silent_failure_is_conversion_failed() {
        let dir = TempDir::new().unwrap();
        let script = fake_converter(dir.path(), "exit 0");
        let converter = SofficeConverter::new(script, Duration::from_secs(5));

        let input = sample_input(dir.path());
        let err = converter
            .convert(&input, &dir.path().join("out"))
            .await
            .unwrap_err();

        match err {
            Error::ConversionFailed { diagnostics, .. } => {
                assert!(diagnostics.contains("was not produced"));
            }
            other => panic!("expected ConversionFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_timeout_is_conversion_failed() {
        let dir = TempDir::new().unwrap();
        let script = fake_converter(dir.path(), "sleep 5");
        let converter = SofficeConverter::new(script, Duration::from_millis(100));

        let input = sample_input(dir.path());
        let err = converter
            .convert(&input, &dir.path().join("out"))
            .await
            .unwrap_err();

        match err {
            Error::ConversionFailed { diagnostics, .. } => {
                assert!(diagnostics.contains("timed out"));
            }
            other => panic!("expected ConversionFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_executable_is_conversion_failed() {
        let dir = TempDir::new().unwrap();
        let converter = SofficeConverter::new(
            dir.path().join("no-such-soffice"),
            Duration::from_secs(5),
        );

        let input = sample_input(dir.path());
        let err = converter
            .convert(&input, &dir.path().join("out"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ConversionFailed { .. }));
    }
}
