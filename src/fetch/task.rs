//! Background fetch tasks.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::warn;

use super::client::AttachmentFetcher;
use super::error::DownloadError;

/// A download running on the tokio runtime.
///
/// Created by [`FetchTask::spawn`]; the download starts immediately and
/// [`FetchTask::bytes`] is the only point that waits for it.
#[derive(Debug)]
pub struct FetchTask {
    url: String,
    handle: JoinHandle<Result<Vec<u8>, DownloadError>>,
}

impl FetchTask {
    /// Spawns a fetch of `url`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(fetcher: Arc<dyn AttachmentFetcher>, url: impl Into<String>) -> Self {
        let url = url.into();
        let task_url = url.clone();
        let handle = tokio::spawn(async move { fetcher.fetch(&task_url).await });
        Self { url, handle }
    }

    /// URL being fetched.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// True once the download has finished, successfully or not.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the download and returns its bytes.
    ///
    /// # Errors
    ///
    /// Returns the fetcher's error, or [`DownloadError::TaskFailed`] if the
    /// task panicked.
    pub async fn bytes(self) -> Result<Vec<u8>, DownloadError> {
        match self.handle.await {
            Ok(result) => result,
            Err(join_error) => {
                warn!(url = %self.url, error = %join_error, "fetch task panicked");
                Err(DownloadError::task_failed(self.url, &join_error))
            }
        }
    }
}
