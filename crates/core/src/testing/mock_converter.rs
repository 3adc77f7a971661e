//! Mock converter for testing.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::converter::{ConversionJob, Converter, ConverterError, TrackJob};

/// A recorded conversion for test assertions.
#[derive(Debug, Clone)]
pub enum RecordedConversion {
    Whole { job: ConversionJob, success: bool },
    Track { job: TrackJob, success: bool },
}

impl RecordedConversion {
    pub fn success(&self) -> bool {
        match self {
            Self::Whole { success, .. } | Self::Track { success, .. } => *success,
        }
    }

    pub fn is_track(&self) -> bool {
        matches!(self, Self::Track { .. })
    }
}

/// Mock implementation of the Converter trait.
///
/// Provides controllable behavior for testing:
/// - Track conversion jobs for assertions
/// - Simulate duration and failure
/// - Measure how many conversions ran at once
///
/// Successful conversions write an empty file at the output path.
///
/// # Example
///
/// ```rust,ignore
/// use condense_core::testing::MockConverter;
///
/// let converter = MockConverter::new(".opus");
/// converter.set_conversion_duration(Duration::from_millis(20)).await;
/// converter.set_fail_marker("broken").await;
///
/// // ... run a dispatcher with it ...
///
/// assert_eq!(converter.peak_concurrency(), 2);
/// ```
#[derive(Debug)]
pub struct MockConverter {
    extension: String,
    conversions: Arc<RwLock<Vec<RecordedConversion>>>,
    /// Simulated conversion duration in milliseconds.
    conversion_duration_ms: Arc<RwLock<u64>>,
    /// Sources whose path contains this fail.
    fail_marker: Arc<RwLock<Option<String>>>,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl Default for MockConverter {
    fn default() -> Self {
        Self::new(".out")
    }
}

impl MockConverter {
    /// Create a mock producing files with `extension` (including the dot).
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
            conversions: Arc::new(RwLock::new(Vec::new())),
            conversion_duration_ms: Arc::new(RwLock::new(10)),
            fail_marker: Arc::new(RwLock::new(None)),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Get all recorded conversions.
    pub async fn recorded_conversions(&self) -> Vec<RecordedConversion> {
        self.conversions.read().await.clone()
    }

    /// Get the number of conversions performed.
    pub async fn conversion_count(&self) -> usize {
        self.conversions.read().await.len()
    }

    /// Set the simulated conversion duration.
    pub async fn set_conversion_duration(&self, duration: Duration) {
        *self.conversion_duration_ms.write().await = duration.as_millis() as u64;
    }

    /// Fail every conversion whose source path contains `marker`.
    pub async fn set_fail_marker(&self, marker: impl Into<String>) {
        *self.fail_marker.write().await = Some(marker.into());
    }

    /// Highest number of conversions observed running at the same time.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    async fn simulate(
        &self,
        source: &std::path::Path,
        output: &std::path::Path,
        cancel: &CancellationToken,
    ) -> Result<(), ConverterError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let duration = Duration::from_millis(*self.conversion_duration_ms.read().await);
        let result = tokio::select! {
            _ = cancel.cancelled() => Err(ConverterError::Cancelled),
            _ = tokio::time::sleep(duration) => Ok(()),
        };

        self.active.fetch_sub(1, Ordering::SeqCst);
        result?;

        let fails = self
            .fail_marker
            .read()
            .await
            .as_deref()
            .map(|marker| source.to_string_lossy().contains(marker))
            .unwrap_or(false);
        if fails {
            return Err(ConverterError::ProcessFailed {
                program: "mock".to_string(),
                code: Some(1),
                stderr: Some("simulated failure".to_string()),
            });
        }

        tokio::fs::write(output, b"").await?;
        Ok(())
    }
}

#[async_trait]
impl Converter for MockConverter {
    fn name(&self) -> &str {
        "mock"
    }

    fn output_extension(&self) -> &str {
        &self.extension
    }

    async fn convert_whole(
        &self,
        job: &ConversionJob,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, ConverterError> {
        let output = job.output_path(&self.extension).await?;
        let result = self.simulate(&job.source, &output, cancel).await;

        self.conversions.write().await.push(RecordedConversion::Whole {
            job: job.clone(),
            success: result.is_ok(),
        });

        result.map(|_| output)
    }

    async fn convert_track(
        &self,
        job: &TrackJob,
        cancel: &CancellationToken,
    ) -> Result<(), ConverterError> {
        let result = self.simulate(&job.source, &job.output, cancel).await;

        self.conversions.write().await.push(RecordedConversion::Track {
            job: job.clone(),
            success: result.is_ok(),
        });

        result
    }
}
