//! The browser-automation seam and its simulated implementation.

use std::sync::Arc;

use async_trait::async_trait;
use canvasprobe_core_types::TabId;
use parking_lot::Mutex;
use project_store::DirRef;
use tokio::sync::broadcast;
use tracing::warn;

use crate::errors::BridgeError;
use crate::message::Envelope;
use crate::page::SimulatedPage;
use crate::sdk::SdkProgress;
use crate::transport::{parse_post_message_script, CANVAS_FRAME};

/// Storage slot shared between the control context and the injected
/// content-script context.
pub type SharedSlot = Arc<Mutex<Option<String>>>;

/// Everything the relay needs from the hosting browser. A production
/// backend drives a real devtools connection; [`SimulatedTab`] stands in
/// for tests and offline sessions.
#[async_trait]
pub trait TabHost: Send + Sync {
    /// The active tab of the current window, when the target is local.
    async fn active_tab(&self) -> Result<TabId, BridgeError>;

    /// Fallback query across all windows.
    async fn any_window_tab(&self) -> Result<TabId, BridgeError>;

    /// Slot the local transport parks serialized envelopes in.
    fn message_slot(&self) -> SharedSlot;

    /// Run the injector in the tab's content-script context; it drains the
    /// shared slot and re-dispatches the payload to the page.
    async fn run_injector(&self, tab: TabId) -> Result<(), BridgeError>;

    /// Evaluate a literal script inside a named sub-frame of the tab.
    async fn eval_in_frame(&self, tab: TabId, frame: &str, script: &str)
        -> Result<(), BridgeError>;

    /// Messages the page posts back to the control side.
    fn page_events(&self) -> broadcast::Receiver<Envelope>;

    /// Completion signal for the SDK traversal running relay-side.
    fn sdk_progress(&self) -> Arc<SdkProgress>;
}

/// In-process stand-in for an inspected tab hosting an Interactive Canvas
/// page.
pub struct SimulatedTab {
    tab: TabId,
    local_target: bool,
    slot: SharedSlot,
    events: broadcast::Sender<Envelope>,
    page: Arc<SimulatedPage>,
    progress: Arc<SdkProgress>,
}

impl SimulatedTab {
    /// A tab that is the active tab of the current window.
    pub fn new(project: Option<DirRef>) -> Arc<Self> {
        Self::with_locality(project, true)
    }

    /// A tab reachable only through the all-windows query, forcing the
    /// remote transport.
    pub fn remote_only(project: Option<DirRef>) -> Arc<Self> {
        Self::with_locality(project, false)
    }

    fn with_locality(project: Option<DirRef>, local_target: bool) -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        let progress = SdkProgress::new();
        let page = SimulatedPage::new(project, Arc::clone(&progress), events.clone());
        Arc::new(Self {
            tab: TabId::new(),
            local_target,
            slot: Arc::new(Mutex::new(None)),
            events,
            page,
            progress,
        })
    }

    pub fn page(&self) -> Arc<SimulatedPage> {
        Arc::clone(&self.page)
    }

    fn check_tab(&self, tab: TabId) -> Result<(), BridgeError> {
        if tab != self.tab {
            return Err(BridgeError::Delivery(format!("unknown tab {tab}")));
        }
        Ok(())
    }
}

#[async_trait]
impl TabHost for SimulatedTab {
    async fn active_tab(&self) -> Result<TabId, BridgeError> {
        if !self.local_target {
            return Err(BridgeError::TransportUnavailable(
                "no active tab in the current window".into(),
            ));
        }
        Ok(self.tab)
    }

    async fn any_window_tab(&self) -> Result<TabId, BridgeError> {
        Ok(self.tab)
    }

    fn message_slot(&self) -> SharedSlot {
        Arc::clone(&self.slot)
    }

    async fn run_injector(&self, tab: TabId) -> Result<(), BridgeError> {
        self.check_tab(tab)?;
        let Some(serialized) = self.slot.lock().take() else {
            warn!(target: "canvas-bridge", "injector ran against an empty slot");
            return Ok(());
        };
        let envelope: Envelope = serde_json::from_str(&serialized)
            .map_err(|err| BridgeError::Delivery(format!("slot content unreadable: {err}")))?;
        self.page.dispatch(envelope).await;
        Ok(())
    }

    async fn eval_in_frame(
        &self,
        tab: TabId,
        frame: &str,
        script: &str,
    ) -> Result<(), BridgeError> {
        self.check_tab(tab)?;
        if frame != CANVAS_FRAME {
            return Err(BridgeError::Delivery(format!("unknown frame {frame}")));
        }
        let Some(envelope) = parse_post_message_script(script) else {
            return Err(BridgeError::Delivery("unrecognized delivery script".into()));
        };
        self.page.dispatch(envelope).await;
        Ok(())
    }

    fn page_events(&self) -> broadcast::Receiver<Envelope> {
        self.events.subscribe()
    }

    fn sdk_progress(&self) -> Arc<SdkProgress> {
        Arc::clone(&self.progress)
    }
}
