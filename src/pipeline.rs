//! The request pipeline: validate, materialize, convert, merge.
//!
//! Each request owns an isolated working area (a fresh temp directory)
//! holding `uploads/` and `converted/`. The directory is removed when the
//! pipeline returns, on every exit path; if the client disconnects and
//! the handler future is dropped, the guard still cleans up.

use crate::config::Config;
use crate::converter::DocumentConverter;
use crate::error::{Error, Result};
use crate::job::MergeJob;
use crate::{merger, telemetry};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{info, warn};

/// One uploaded file. Sequence position determines merge order.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content: Vec<u8>,
}

/// The merged result handed back to the HTTP layer.
#[derive(Debug)]
pub struct MergedOutput {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub page_count: usize,
}

enum FileKind {
    PassThrough,
    Convertible,
}

/// Upload-to-merged-PDF pipeline.
///
/// Holds the process-wide conversion semaphore: converter invocations
/// across all in-flight requests share `convert_concurrency` permits.
pub struct Pipeline {
    config: Arc<Config>,
    converter: Arc<dyn DocumentConverter>,
    conversion_slots: Arc<Semaphore>,
}

impl Pipeline {
    pub fn new(config: Arc<Config>, converter: Arc<dyn DocumentConverter>) -> Self {
        let conversion_slots = Arc::new(Semaphore::new(config.convert_concurrency));
        Self {
            config,
            converter,
            conversion_slots,
        }
    }

    /// Runs the whole pipeline for one upload batch.
    ///
    /// Fail-fast, all-or-nothing: the first error aborts the batch and
    /// nothing partial is ever returned.
    pub async fn run(&self, files: Vec<UploadedFile>) -> Result<MergedOutput> {
        let mut job = MergeJob::new(files.len());
        info!(
            "Processing merge request: job_id={}, files={}",
            job.job_id, job.file_count
        );

        let result = self.execute(&mut job, files).await;

        match &result {
            Ok(output) => {
                job.mark_complete(output.page_count);
                info!(
                    "Merge request complete: job_id={}, pages={}, duration_ms={:?}",
                    job.job_id,
                    output.page_count,
                    job.processing_duration_ms()
                );
            }
            Err(e) => {
                job.mark_failed(e.to_string());
                warn!("Merge request failed: job_id={}, error={}", job.job_id, e);
            }
        }

        telemetry::record_job_telemetry(&job);
        result
    }

    async fn execute(&self, job: &mut MergeJob, files: Vec<UploadedFile>) -> Result<MergedOutput> {
        if files.is_empty() {
            return Err(Error::NoFilesProvided);
        }

        // Classify every file before touching the filesystem, so an
        // unsupported name aborts the batch with zero conversion work.
        let mut kinds = Vec::with_capacity(files.len());
        for file in &files {
            kinds.push(classify(&self.config, &file.filename)?);
        }

        let workdir = tempfile::tempdir_in(&self.config.work_root)?;
        let uploads_dir = workdir.path().join("uploads");
        let converted_dir = workdir.path().join("converted");
        tokio::fs::create_dir(&uploads_dir).await?;

        // Index-prefixed names keep merge order explicit and make
        // duplicate basenames collision-free in converted/.
        let mut stored: Vec<PathBuf> = Vec::with_capacity(files.len());
        for (idx, file) in files.iter().enumerate() {
            let path = uploads_dir.join(format!("{:03}_{}", idx, sanitize(&file.filename)));
            tokio::fs::write(&path, &file.content).await?;
            stored.push(path);
        }

        job.start_converting();
        let mut pdf_paths: Vec<PathBuf> = Vec::with_capacity(files.len());
        for (path, kind) in stored.iter().zip(&kinds) {
            match kind {
                FileKind::PassThrough => pdf_paths.push(path.clone()),
                FileKind::Convertible => {
                    let _permit = self
                        .conversion_slots
                        .acquire()
                        .await
                        .expect("conversion semaphore closed");
                    let pdf = self.converter.convert(path, &converted_dir).await?;
                    pdf_paths.push(pdf);
                }
            }
        }

        job.start_merging();
        let merged_path = workdir.path().join("merged.pdf");
        let page_count = {
            let inputs = pdf_paths.clone();
            let output = merged_path.clone();
            tokio::task::spawn_blocking(move || merger::merge_documents(&inputs, &output))
                .await
                .map_err(|e| Error::MergeFailed(format!("merge task failed: {e}")))??
        };

        let bytes = tokio::fs::read(&merged_path).await?;

        Ok(MergedOutput {
            bytes,
            filename: self.config.download_filename.clone(),
            page_count,
        })
        // workdir drops here, removing the working area
    }
}

fn classify(config: &Config, filename: &str) -> Result<FileKind> {
    let ext = Path::new(filename)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase());

    match ext.as_deref() {
        Some(ext) if config.is_pass_through(ext) => Ok(FileKind::PassThrough),
        Some(ext) if config.is_convertible(ext) => Ok(FileKind::Convertible),
        _ => Err(Error::UnsupportedType(filename.to_string())),
    }
}

/// Reduces a client-supplied filename to its final path component.
fn sanitize(filename: &str) -> String {
    Path::new(filename)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string())
}
