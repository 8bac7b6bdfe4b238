//! Relay-owned progress state and the load handle for the long-running
//! SDK traversal.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use sdk_extract::{ExtractError, SdkBundle};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::errors::BridgeError;

/// Phases of one SDK-load operation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SdkLoadState {
    Idle,
    Requested,
    Polling,
    Complete,
}

/// Shared completion signal between the relay side (which runs the
/// traversal) and the control side (which polls).
///
/// The ready flag flips exactly once, after the outcome slot is filled.
pub struct SdkProgress {
    ready: AtomicBool,
    outcome: Mutex<Option<Result<SdkBundle, String>>>,
}

impl SdkProgress {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            ready: AtomicBool::new(false),
            outcome: Mutex::new(None),
        })
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Publish the traversal outcome. Slot first, flag second, so a reader
    /// that observes `ready` always finds the outcome.
    pub fn complete(&self, outcome: Result<SdkBundle, ExtractError>) {
        *self.outcome.lock() = Some(outcome.map_err(|err| err.to_string()));
        self.ready.store(true, Ordering::Release);
    }

    /// Fetch the outcome once; later calls return `None`.
    pub fn take(&self) -> Option<Result<SdkBundle, String>> {
        self.outcome.lock().take()
    }
}

/// Handle to an in-flight SDK load. Dropping the handle does not stop the
/// poll; call [`SdkLoadHandle::cancel`] (or tear the session down) for that.
pub struct SdkLoadHandle {
    pub(crate) cancel: CancellationToken,
    pub(crate) task: JoinHandle<Result<SdkBundle, BridgeError>>,
}

impl SdkLoadHandle {
    /// Token observed by the poll loop; cancelling it ends the wait.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the load to finish, fail, or get cancelled.
    pub async fn wait(self) -> Result<SdkBundle, BridgeError> {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(err) if err.is_cancelled() => Err(BridgeError::Cancelled),
            Err(err) => Err(BridgeError::Internal(format!("poll task failed: {err}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdk_extract::{ExtractionResult, ProjectHeader};

    fn bundle() -> SdkBundle {
        SdkBundle {
            header: ProjectHeader {
                title: "t".into(),
                project_id: "p".into(),
                logo: None,
            },
            extraction: ExtractionResult::default(),
        }
    }

    #[test]
    fn ready_flips_only_after_completion() {
        let progress = SdkProgress::new();
        assert!(!progress.is_ready());
        assert!(progress.take().is_none());

        progress.complete(Ok(bundle()));
        assert!(progress.is_ready());
    }

    #[test]
    fn outcome_can_be_taken_exactly_once() {
        let progress = SdkProgress::new();
        progress.complete(Ok(bundle()));

        assert!(progress.take().is_some());
        assert!(progress.take().is_none());
    }
}
