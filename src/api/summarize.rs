//! Cancellable summarization jobs
//!
//! At most one summary streams at a time. Selecting a different stream aborts
//! the in-flight job, so a stale SSE stream can never write into the state of
//! a video that is no longer selected.

use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, info};

use super::client::BackendClient;
use super::types::SummarizeParams;
use super::{ApiError, Result};
use crate::compare::StreamId;

/// A spawned summarize call for one stream
#[derive(Debug)]
pub struct SummaryJob {
    stream: StreamId,
    handle: JoinHandle<Result<String>>,
}

impl SummaryJob {
    #[must_use]
    pub fn stream(&self) -> StreamId {
        self.stream
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the summary; [`ApiError::Cancelled`] if the job was aborted
    pub async fn wait(self) -> Result<String> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(ApiError::Cancelled),
            Err(e) => std::panic::resume_unwind(e.into_panic()),
        }
    }
}

/// Tracks the single in-flight summary and the stream it belongs to
#[derive(Debug, Default)]
pub struct SummaryTracker {
    current: Option<(StreamId, AbortHandle)>,
}

impl SummaryTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stream whose summary is still running, if any
    #[must_use]
    pub fn active_stream(&self) -> Option<StreamId> {
        self.current
            .as_ref()
            .filter(|(_, handle)| !handle.is_finished())
            .map(|(stream, _)| *stream)
    }

    /// Spawn a summary for `stream`, aborting whatever was running before.
    ///
    /// `on_chunk` receives each text fragment as it arrives.
    pub fn start<F>(
        &mut self,
        stream: StreamId,
        client: BackendClient,
        params: SummarizeParams,
        on_chunk: F,
    ) -> SummaryJob
    where
        F: FnMut(&str) + Send + 'static,
    {
        self.cancel();
        info!("Summarizing stream {stream} (file {})", params.id);

        let handle = tokio::spawn(async move { client.summarize(&params, on_chunk).await });
        self.current = Some((stream, handle.abort_handle()));
        SummaryJob { stream, handle }
    }

    /// Note a selection change; aborts the running job if it belongs to a
    /// different stream. Returns whether a job was aborted.
    pub fn select(&mut self, selected: Option<StreamId>) -> bool {
        let stale = matches!(&self.current, Some((stream, _)) if Some(*stream) != selected);
        stale && self.cancel()
    }

    /// Abort the running job, if any
    pub fn cancel(&mut self) -> bool {
        let Some((stream, handle)) = self.current.take() else {
            return false;
        };
        if handle.is_finished() {
            return false;
        }
        debug!("Aborting summary for stream {stream}");
        handle.abort();
        true
    }
}

impl Drop for SummaryTracker {
    fn drop(&mut self) {
        self.cancel();
    }
}
