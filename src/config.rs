//! Process configuration, read from the environment at startup.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Extension accepted without conversion.
pub const PASS_THROUGH_EXTENSION: &str = "pdf";

/// Service configuration.
///
/// Built once in `main` and passed into the pipeline at construction, so
/// tests can swap the converter path or the working-area root freely.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP listen address.
    pub bind_addr: SocketAddr,
    /// Path to the external converter executable.
    pub soffice_path: PathBuf,
    /// Lowercased extensions handed to the converter.
    pub convertible_extensions: Vec<String>,
    /// Per-file converter timeout.
    pub convert_timeout: Duration,
    /// Process-wide cap on concurrent converter invocations.
    pub convert_concurrency: usize,
    /// Upper bound on the multipart request body.
    pub max_upload_bytes: usize,
    /// Attachment filename for the merged result.
    pub download_filename: String,
    /// Parent directory for per-request working areas.
    pub work_root: PathBuf,
}

impl Config {
    /// Loads configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let bind_addr = std::env::var("BIND_ADDR")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.bind_addr);
        let soffice_path = std::env::var("SOFFICE_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.soffice_path);
        let convertible_extensions = std::env::var("CONVERTIBLE_EXTENSIONS")
            .map(|v| {
                v.split(',')
                    .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
                    .filter(|e| !e.is_empty())
                    .collect()
            })
            .unwrap_or(defaults.convertible_extensions);
        let convert_timeout = std::env::var("CONVERT_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.convert_timeout);
        let convert_concurrency = std::env::var("CONVERT_CONCURRENCY")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|&n: &usize| n > 0)
            .unwrap_or(defaults.convert_concurrency);
        let max_upload_bytes = std::env::var("MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_upload_bytes);
        let download_filename = std::env::var("DOWNLOAD_FILENAME")
            .unwrap_or(defaults.download_filename);

        Self {
            bind_addr,
            soffice_path,
            convertible_extensions,
            convert_timeout,
            convert_concurrency,
            max_upload_bytes,
            download_filename,
            work_root: defaults.work_root,
        }
    }

    /// Whether `ext` (lowercased, no dot) goes through the converter.
    pub fn is_convertible(&self, ext: &str) -> bool {
        self.convertible_extensions.iter().any(|e| e == ext)
    }

    /// Whether `ext` (lowercased, no dot) is accepted as-is.
    pub fn is_pass_through(&self, ext: &str) -> bool {
        ext == PASS_THROUGH_EXTENSION
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: ([0, 0, 0, 0], 8080).into(),
            soffice_path: PathBuf::from("soffice"),
            convertible_extensions: vec!["pptx".into(), "ppt".into(), "odp".into()],
            convert_timeout: Duration::from_secs(120),
            convert_concurrency: 1,
            max_upload_bytes: 100 * 1024 * 1024,
            download_filename: "merged.pdf".into(),
            work_root: std::env::temp_dir(),
        }
    }
}
