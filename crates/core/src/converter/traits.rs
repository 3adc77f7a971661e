//! Trait definitions for the converter module.

use async_trait::async_trait;
use futures::future::join_all;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::cue::CueSheet;
use crate::pool::WorkerPool;

use super::error::ConverterError;
use super::types::{ConversionJob, TrackJob, TrackOutcome};

/// A converter that transcodes one source file, whole or per cue track.
///
/// Implementations do not acquire pool permits for whole-file work; the
/// caller holds one around [`Converter::convert_whole`].
#[async_trait]
pub trait Converter: Send + Sync {
    /// Returns the name of this converter implementation.
    fn name(&self) -> &str;

    /// Output extension including the dot, e.g. `.flac`.
    fn output_extension(&self) -> &str;

    /// Converts `job.source` into its mirrored destination path and returns
    /// that path.
    async fn convert_whole(
        &self,
        job: &ConversionJob,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, ConverterError>;

    /// Extracts and encodes one cue track.
    async fn convert_track(
        &self,
        job: &TrackJob,
        cancel: &CancellationToken,
    ) -> Result<(), ConverterError>;

    /// Splits `job.source` by `sheet` into `<dest>/<rel dir>/<stem>/`.
    ///
    /// Track jobs run concurrently and each takes its own permit from
    /// `pool`, so the caller must not hold one while awaiting this.
    async fn convert_by_cue(
        &self,
        job: &ConversionJob,
        sheet: &CueSheet,
        pool: &WorkerPool,
        cancel: &CancellationToken,
    ) -> Result<Vec<TrackOutcome>, ConverterError> {
        let album_dir = job.album_dir().await?;
        let track_jobs: Vec<TrackJob> = sheet
            .tracks
            .iter()
            .map(|track| {
                TrackJob::from_track(&job.source, &album_dir, track, self.output_extension())
            })
            .collect();

        let outcomes = join_all(track_jobs.iter().map(|track_job| async move {
            let result = match pool.acquire(cancel).await {
                Ok(permit) => {
                    let result = self.convert_track(track_job, cancel).await;
                    permit.finish(result.is_ok());
                    result
                }
                Err(e) => Err(e.into()),
            };

            if let Err(ref e) = result {
                if !e.is_cancelled() {
                    warn!(
                        "Track {:02} of {} failed: {}",
                        track_job.index,
                        job.source.display(),
                        e
                    );
                }
            }

            TrackOutcome {
                index: track_job.index,
                output: track_job.output.clone(),
                result,
            }
        }))
        .await;

        Ok(outcomes)
    }
}
