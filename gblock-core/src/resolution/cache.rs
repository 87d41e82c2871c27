use std::future::Future;

use gblock_common::GblockError;
use tokio::sync::OnceCell;

use super::BlockStatus;

/// Holds the outcome of resolving one actor for the duration of one request.
///
/// Create one per incoming request and drop it with the response. Sharing an
/// instance between requests (or between different actors) returns stale or
/// foreign results.
#[derive(Debug, Default)]
pub struct RequestBlockCache {
    status: OnceCell<BlockStatus>,
}

impl RequestBlockCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<&BlockStatus> {
        self.status.get()
    }

    pub(crate) async fn get_or_try_resolve<F, Fut>(&self, resolve: F) -> Result<BlockStatus, GblockError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<BlockStatus, GblockError>>,
    {
        self.status.get_or_try_init(resolve).await.cloned()
    }
}
