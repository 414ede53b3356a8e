//! Sequential batch conversion on a single background worker.
//!
//! A [`BatchQueue`] owns one tokio task that pulls [`ConversionRequest`]s
//! from an unbounded channel and converts them one at a time, in
//! submission order. Front-ends submit work and keep their own thread free;
//! status flows back through a [`BatchProgressCallback`].
//!
//! What happens after a failure is a caller decision, expressed as an
//! [`ErrorPolicy`]:
//!
//! | Policy | After a failed file |
//! |--------|---------------------|
//! | [`ErrorPolicy::AbortOnError`] (default) | every later file is reported as skipped |
//! | [`ErrorPolicy::ContinueOnError`] | the worker carries on with the next file |

use crate::config::{ConversionConfig, ConversionRequest};
use crate::convert::convert;
use crate::error::Pdf2TifError;
use crate::output::ConversionOutput;
use crate::progress::{NoopProgressCallback, ProgressCallback};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// What the worker does after a file fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ErrorPolicy {
    /// Stop converting; remaining files are skipped.
    #[default]
    AbortOnError,
    /// Keep going with the next file.
    ContinueOnError,
}

/// Outcome of one queued file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    Converted(ConversionOutput),
    Failed { message: String },
    Skipped,
}

/// One line of a [`BatchReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReport {
    /// 1-based submission index.
    pub index: usize,
    pub source: PathBuf,
    #[serde(flatten)]
    pub outcome: FileOutcome,
}

/// Per-file outcomes in submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
}

impl BatchReport {
    pub fn converted(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Converted(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Failed { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Skipped))
    }

    /// `true` when every submitted file converted.
    pub fn is_success(&self) -> bool {
        self.converted() == self.files.len()
    }

    /// The first failure, if any.
    pub fn first_error(&self) -> Option<&str> {
        self.files.iter().find_map(|f| match &f.outcome {
            FileOutcome::Failed { message } => Some(message.as_str()),
            _ => None,
        })
    }

    fn count(&self, pred: impl Fn(&FileOutcome) -> bool) -> usize {
        self.files.iter().filter(|f| pred(&f.outcome)).count()
    }
}

/// Handle to a running single-worker conversion queue.
///
/// Must be created inside a tokio runtime.
pub struct BatchQueue {
    tx: mpsc::UnboundedSender<ConversionRequest>,
    submitted: Arc<AtomicUsize>,
    worker: JoinHandle<BatchReport>,
}

impl BatchQueue {
    /// Start the worker.
    pub fn spawn(
        config: ConversionConfig,
        policy: ErrorPolicy,
        progress: Option<ProgressCallback>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let submitted = Arc::new(AtomicUsize::new(0));
        let worker = start_worker(rx, config, policy, progress, Arc::clone(&submitted));
        Self {
            tx,
            submitted,
            worker,
        }
    }

    /// Queue one request. Returns its 1-based index.
    pub fn submit(&self, request: ConversionRequest) -> Result<usize, Pdf2TifError> {
        let index = self.submitted.fetch_add(1, Ordering::SeqCst) + 1;
        self.tx
            .send(request)
            .map_err(|_| Pdf2TifError::Internal("batch worker has stopped".into()))?;
        Ok(index)
    }

    /// Number of requests submitted so far.
    pub fn submitted(&self) -> usize {
        self.submitted.load(Ordering::SeqCst)
    }

    /// Close the queue, wait for the worker to drain it, and return the report.
    pub async fn finish(self) -> Result<BatchReport, Pdf2TifError> {
        drop(self.tx);
        self.worker
            .await
            .map_err(|e| Pdf2TifError::Internal(format!("Batch worker panicked: {}", e)))
    }
}

/// Convert `requests` in order on one worker and wait for the report.
///
/// `on_batch_start` fires with the full count, and every event sees that
/// count as `total`.
pub async fn convert_batch(
    requests: impl IntoIterator<Item = ConversionRequest>,
    config: &ConversionConfig,
    policy: ErrorPolicy,
    progress: Option<ProgressCallback>,
) -> Result<BatchReport, Pdf2TifError> {
    let (tx, rx) = mpsc::unbounded_channel();
    let mut total = 0;
    for request in requests {
        tx.send(request)
            .map_err(|_| Pdf2TifError::Internal("batch channel closed".into()))?;
        total += 1;
    }

    if let Some(ref cb) = progress {
        cb.on_batch_start(total);
    }

    let queue = BatchQueue {
        worker: start_worker(
            rx,
            config.clone(),
            policy,
            progress,
            Arc::new(AtomicUsize::new(total)),
        ),
        tx,
        submitted: Arc::new(AtomicUsize::new(total)),
    };
    queue.finish().await
}

fn start_worker(
    mut rx: mpsc::UnboundedReceiver<ConversionRequest>,
    config: ConversionConfig,
    policy: ErrorPolicy,
    progress: Option<ProgressCallback>,
    submitted: Arc<AtomicUsize>,
) -> JoinHandle<BatchReport> {
    let cb: ProgressCallback = progress.unwrap_or_else(|| Arc::new(NoopProgressCallback));

    tokio::spawn(async move {
        let mut report = BatchReport::default();
        let mut aborted = false;
        let mut index = 0;

        while let Some(request) = rx.recv().await {
            index += 1;
            let total = submitted.load(Ordering::SeqCst).max(index);
            let source = request.source().to_path_buf();

            if aborted {
                cb.on_file_skipped(index, total, &source);
                report.files.push(FileReport {
                    index,
                    source,
                    outcome: FileOutcome::Skipped,
                });
                continue;
            }

            cb.on_file_start(index, total, &source);
            let outcome = match convert(&request, &config).await {
                Ok(output) => {
                    cb.on_file_complete(index, total, &output);
                    FileOutcome::Converted(output)
                }
                Err(e) => {
                    let message = e.to_string();
                    warn!("({}/{}) {}", index, total, message);
                    cb.on_file_error(index, total, &source, &message);
                    if policy == ErrorPolicy::AbortOnError {
                        aborted = true;
                    }
                    FileOutcome::Failed { message }
                }
            };

            report.files.push(FileReport {
                index,
                source,
                outcome,
            });
        }

        info!(
            "Batch finished: {} converted, {} failed, {} skipped",
            report.converted(),
            report.failed(),
            report.skipped()
        );
        cb.on_batch_complete(&report);
        report
    })
}
