//! Progress-callback trait for batch conversion events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] into
//! [`crate::batch::BatchQueue::spawn`] or [`crate::batch::convert_batch`] to
//! receive status events as the worker moves through the queue. A terminal
//! progress bar, a GUI status label, or a log sink can all sit behind it.
//!
//! The batch worker is single-threaded, so events for file N always arrive
//! before events for file N+1, in submission order.
//!
//! # Example
//!
//! ```rust
//! use pdf2tif::{BatchProgressCallback, ConversionOutput};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! struct CountingCallback {
//!     converted: AtomicUsize,
//! }
//!
//! impl BatchProgressCallback for CountingCallback {
//!     fn on_file_complete(&self, index: usize, total: usize, output: &ConversionOutput) {
//!         self.converted.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("({index}/{total}) wrote {}", output.output_path.display());
//!     }
//! }
//! ```

use crate::batch::BatchReport;
use crate::output::ConversionOutput;
use std::path::Path;
use std::sync::Arc;

/// Called by the batch worker as it processes each file.
///
/// `index` is 1-based in submission order. `total` is the number of files
/// submitted so far; for [`crate::batch::convert_batch`] it is the batch size.
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once when the batch size is known up front.
    fn on_batch_start(&self, total: usize) {
        let _ = total;
    }

    /// Called just before a file is handed to the converter.
    fn on_file_start(&self, index: usize, total: usize, source: &Path) {
        let _ = (index, total, source);
    }

    /// Called when a file converted successfully.
    fn on_file_complete(&self, index: usize, total: usize, output: &ConversionOutput) {
        let _ = (index, total, output);
    }

    /// Called when a file failed. `error` is the human-readable message.
    fn on_file_error(&self, index: usize, total: usize, source: &Path, error: &str) {
        let _ = (index, total, source, error);
    }

    /// Called for each file not attempted because an earlier one failed
    /// under [`crate::batch::ErrorPolicy::AbortOnError`].
    fn on_file_skipped(&self, index: usize, total: usize, source: &Path) {
        let _ = (index, total, source);
    }

    /// Called once after the queue is drained.
    fn on_batch_complete(&self, report: &BatchReport) {
        let _ = report;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias for the shared callback handle.
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        let src = PathBuf::from("a.pdf");
        cb.on_batch_start(2);
        cb.on_file_start(1, 2, &src);
        cb.on_file_error(1, 2, &src, "boom");
        cb.on_file_skipped(2, 2, &src);
        cb.on_batch_complete(&BatchReport::default());
    }

    #[test]
    fn arc_dyn_callback_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn BatchProgressCallback>();
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_batch_start(0);
    }
}
