//! Directory walk and job scheduling.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::converter::{AudioConverter, ConversionJob, Converter, ConverterError, ImageConverter};
use crate::cue::load_cue_sheet;
use crate::paths::dotted_extension;
use crate::pool::WorkerPool;

use super::copy::{copy_file, rewrite_cue};
use super::handlers::HandlerTable;
use super::types::{DispatchError, HandlerCategory, JobReport, Mode, RunSummary};

/// Walks a source tree and turns every matched file into a bounded job.
pub struct Dispatcher {
    mode: Mode,
    config: Arc<Config>,
    handlers: HandlerTable,
    audio: Arc<dyn Converter>,
    image: Arc<dyn Converter>,
    pool: WorkerPool,
}

impl Dispatcher {
    /// Creates a dispatcher with the converters `config` selects for `mode`.
    pub fn new(config: Arc<Config>, mode: Mode) -> Self {
        let (audio, image): (Arc<dyn Converter>, Arc<dyn Converter>) = match mode {
            Mode::Lossy => (
                Arc::new(AudioConverter::lossy(&config)),
                Arc::new(ImageConverter::lossy(&config)),
            ),
            Mode::Lossless => (
                Arc::new(AudioConverter::lossless(&config)),
                Arc::new(ImageConverter::lossless(&config)),
            ),
        };
        Self::with_converters(config, mode, audio, image)
    }

    /// Creates a dispatcher with explicit converters.
    pub fn with_converters(
        config: Arc<Config>,
        mode: Mode,
        audio: Arc<dyn Converter>,
        image: Arc<dyn Converter>,
    ) -> Self {
        Self {
            mode,
            handlers: HandlerTable::new(mode, config.copy_unmapped),
            pool: WorkerPool::new(config.worker_num),
            config,
            audio,
            image,
        }
    }

    /// The shared worker pool.
    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Converts or copies everything under `src` into `dst`.
    ///
    /// Per-file failures are collected into the summary; only problems with
    /// the roots themselves are returned as errors.
    pub async fn run(
        &self,
        src: &Path,
        dst: &Path,
        cancel: &CancellationToken,
    ) -> Result<RunSummary, DispatchError> {
        let (src, dst) = prepare_roots(src, dst).await?;
        info!(
            "Starting {} run: {} -> {} ({} workers)",
            self.mode,
            src.display(),
            dst.display(),
            self.pool.capacity()
        );

        let (tx, mut rx) = mpsc::unbounded_channel();
        let walk_root = src.clone();
        let walker = tokio::task::spawn_blocking(move || walk_files(&walk_root, tx));

        let mut summary = RunSummary::default();
        let mut tasks = JoinSet::new();

        while let Some(path) = rx.recv().await {
            let Some(category) = self.handlers.classify(&path) else {
                debug!("Skipping {}", path.display());
                summary.skipped += 1;
                continue;
            };

            summary.jobs += 1;
            let job = ConversionJob::new(path, &src, &dst);
            let context = self.job_context(cancel.clone());
            tasks.spawn(async move {
                let source = job.source.clone();
                match AssertUnwindSafe(context.process(category, job))
                    .catch_unwind()
                    .await
                {
                    Ok(report) => report,
                    Err(panic) => {
                        let reason = panic_message(&*panic);
                        error!("Job for {} panicked: {}", source.display(), reason);
                        let mut report = JobReport::default();
                        report.failed(source, None, format!("job panicked: {}", reason));
                        report
                    }
                }
            });
        }

        if let Err(e) = walker.await {
            error!("Directory walker stopped unexpectedly: {}", e);
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(report) => summary.absorb(report),
                // Panics are caught inside the task; this is an abort.
                Err(e) => {
                    error!("Job task failed: {}", e);
                    let mut report = JobReport::default();
                    report.failed(PathBuf::new(), None, format!("task failed: {}", e));
                    summary.absorb(report);
                }
            }
        }

        summary.cancelled = cancel.is_cancelled();
        info!(
            "Run finished: {} jobs, {} tracks, {} succeeded, {} failed, {} skipped",
            summary.jobs,
            summary.track_jobs,
            summary.succeeded,
            summary.failures.len(),
            summary.skipped
        );
        Ok(summary)
    }

    fn job_context(&self, cancel: CancellationToken) -> JobContext {
        JobContext {
            mode: self.mode,
            split_lossless_cue: self.config.split_lossless_cue,
            audio: self.audio.clone(),
            image: self.image.clone(),
            pool: self.pool.clone(),
            cancel,
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Checks the source root and creates the destination root.
async fn prepare_roots(src: &Path, dst: &Path) -> Result<(PathBuf, PathBuf), DispatchError> {
    let is_dir = tokio::fs::metadata(src)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false);
    if !is_dir {
        return Err(DispatchError::SourceNotFound(src.to_path_buf()));
    }

    tokio::fs::create_dir_all(dst)
        .await
        .map_err(|source| DispatchError::Destination {
            path: dst.to_path_buf(),
            source,
        })?;

    let canonical_src = tokio::fs::canonicalize(src)
        .await
        .map_err(|_| DispatchError::SourceNotFound(src.to_path_buf()))?;
    let canonical_dst = tokio::fs::canonicalize(dst)
        .await
        .map_err(|source| DispatchError::Destination {
            path: dst.to_path_buf(),
            source,
        })?;
    if canonical_dst.starts_with(&canonical_src) {
        return Err(DispatchError::DestinationInsideSource {
            dest: dst.to_path_buf(),
            source_root: src.to_path_buf(),
        });
    }

    Ok((src.to_path_buf(), dst.to_path_buf()))
}

/// Streams every regular file below `root`. Runs on a blocking thread.
fn walk_files(root: &Path, tx: mpsc::UnboundedSender<PathBuf>) {
    for entry in WalkDir::new(root).follow_links(true) {
        match entry {
            Ok(entry) if entry.file_type().is_file() => {
                if tx.send(entry.into_path()).is_err() {
                    return;
                }
            }
            Ok(_) => {}
            Err(e) => warn!("Skipping unreadable entry: {}", e),
        }
    }
}

/// Everything one spawned job needs.
struct JobContext {
    mode: Mode,
    split_lossless_cue: bool,
    audio: Arc<dyn Converter>,
    image: Arc<dyn Converter>,
    pool: WorkerPool,
    cancel: CancellationToken,
}

impl JobContext {
    async fn process(self, category: HandlerCategory, job: ConversionJob) -> JobReport {
        let mut report = JobReport::default();
        match category {
            HandlerCategory::Audio => self.process_audio(&job, &mut report).await,
            HandlerCategory::Image => self.process_image(&job, &mut report).await,
            HandlerCategory::Copy => self.process_copy(&job, &mut report).await,
        }
        report
    }

    async fn process_audio(&self, job: &ConversionJob, report: &mut JobReport) {
        let cue_path = job.companion_cue();
        let has_cue = tokio::fs::try_exists(&cue_path).await.unwrap_or(false);
        let split = has_cue && (self.mode == Mode::Lossy || self.split_lossless_cue);

        let converted = if split {
            self.split_by_cue(job, &cue_path, report).await
        } else {
            self.convert_whole(self.audio.as_ref(), job, report).await
        };

        if converted && has_cue && self.mode == Mode::Lossless {
            self.emit_cue(job, &cue_path, report).await;
        }
    }

    async fn process_image(&self, job: &ConversionJob, report: &mut JobReport) {
        self.convert_whole(self.image.as_ref(), job, report).await;
    }

    async fn process_copy(&self, job: &ConversionJob, report: &mut JobReport) {
        let permit = match self.pool.acquire(&self.cancel).await {
            Ok(permit) => permit,
            Err(_) => {
                report.cancelled = true;
                return;
            }
        };

        let result = copy_file(job).await;
        permit.finish(result.is_ok());
        if let Err(e) = result {
            warn!("Copy of {} failed: {}", job.source.display(), e);
            report.failed(job.source.clone(), None, e);
        }
    }

    /// Runs a whole-file conversion under one permit. Returns true on success.
    async fn convert_whole(
        &self,
        converter: &dyn Converter,
        job: &ConversionJob,
        report: &mut JobReport,
    ) -> bool {
        let permit = match self.pool.acquire(&self.cancel).await {
            Ok(permit) => permit,
            Err(_) => {
                report.cancelled = true;
                return false;
            }
        };

        let result = converter.convert_whole(job, &self.cancel).await;
        permit.finish(result.is_ok());

        match result {
            Ok(output) => {
                debug!("Wrote {}", output.display());
                true
            }
            Err(e) if e.is_cancelled() => {
                report.cancelled = true;
                false
            }
            Err(e) => {
                warn!("Conversion of {} failed: {}", job.source.display(), e);
                report.failed(job.source.clone(), None, e);
                false
            }
        }
    }

    /// Splits by the companion cue sheet. No permit is held here; each
    /// track takes its own. Returns true when every track succeeded.
    async fn split_by_cue(&self, job: &ConversionJob, cue_path: &Path, report: &mut JobReport) -> bool {
        let stem = match job.stem() {
            Ok(stem) => stem,
            Err(e) => {
                report.failed(job.source.clone(), None, e);
                return false;
            }
        };

        let sheet = match load_cue_sheet(cue_path, &stem).await {
            Ok(sheet) => sheet,
            Err(e) => {
                warn!("Cue sheet {} rejected: {}", cue_path.display(), e);
                report.failed(job.source.clone(), None, e);
                return false;
            }
        };

        let outcomes = match self
            .audio
            .convert_by_cue(job, &sheet, &self.pool, &self.cancel)
            .await
        {
            Ok(outcomes) => outcomes,
            Err(e) => {
                report.failed(job.source.clone(), None, e);
                return false;
            }
        };

        report.track_jobs += outcomes.len();
        let mut all_ok = true;
        for outcome in outcomes {
            match outcome.result {
                Ok(()) => debug!("Wrote {}", outcome.output.display()),
                Err(e) if e.is_cancelled() => {
                    report.cancelled = true;
                    all_ok = false;
                }
                Err(e) => {
                    report.failed(job.source.clone(), Some(outcome.index), e);
                    all_ok = false;
                }
            }
        }
        all_ok
    }

    /// Writes the cue sheet next to the converted audio, pointing at the
    /// new extension.
    async fn emit_cue(&self, job: &ConversionJob, cue_path: &Path, report: &mut JobReport) {
        let result = write_companion_cue(job, cue_path, self.audio.output_extension()).await;
        if let Err(e) = result {
            warn!("Rewriting {} failed: {}", cue_path.display(), e);
            report.failed(cue_path.to_path_buf(), None, e);
        }
    }
}

async fn write_companion_cue(
    job: &ConversionJob,
    cue_path: &Path,
    new_extension: &str,
) -> Result<(), ConverterError> {
    let cue_job = ConversionJob::new(cue_path, &job.source_root, &job.dest_root);
    let target = cue_job.output_path(".cue").await?;
    rewrite_cue(cue_path, &target, &dotted_extension(&job.source), new_extension).await
}
