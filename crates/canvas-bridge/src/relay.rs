//! The control-side relay: transport selection, serialized sends, inbound
//! routing, and the SDK-load poll.

use std::sync::Arc;
use std::time::Duration;

use canvasprobe_core_types::{TabId, UnsupportedApiBehavior};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::BridgeError;
use crate::history::HistoryEntry;
use crate::message::{Envelope, MessageBody};
use crate::sdk::{SdkLoadHandle, SdkLoadState, SdkProgress};
use crate::tab::TabHost;
use crate::transport::{LocalTransport, PageTransport, RemoteTransport, TransportMode};

#[derive(Clone, Debug)]
pub struct BridgeConfig {
    /// Cadence of the SDK-load poll. Must be positive.
    pub poll_interval: Duration,
    /// Skip the local probe and go straight to the remote transport.
    pub force_remote: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(250),
            force_remote: false,
        }
    }
}

/// One session against one inspected tab.
///
/// The transport decision is made in [`Bridge::connect`] and holds for the
/// session's lifetime. Sends are serialized, so envelopes reach the page
/// in send order; nothing is promised about when the page processes them.
pub struct Bridge {
    host: Arc<dyn TabHost>,
    transport: Arc<dyn PageTransport>,
    mode: TransportMode,
    tab: TabId,
    send_gate: tokio::sync::Mutex<()>,
    inbound: Arc<InboundState>,
    progress: Arc<SdkProgress>,
    poll_interval: Duration,
    shutdown: CancellationToken,
    pump: Mutex<Option<JoinHandle<()>>>,
}

/// Control-side view of what the page reported, fed by the event pump.
#[derive(Default)]
struct InboundState {
    api_present: Mutex<Option<bool>>,
    history_view: Mutex<Vec<HistoryEntry>>,
}

impl InboundState {
    fn route(&self, envelope: Envelope) {
        match envelope.body {
            MessageBody::Init(api_present) => {
                debug!(target: "canvas-bridge", api_present, "page initialized");
                *self.api_present.lock() = Some(api_present);
            }
            MessageBody::History(entries) => {
                *self.history_view.lock() = entries;
            }
            MessageBody::SdkResult(result) => {
                debug!(
                    target: "canvas-bridge",
                    ready = result.ready,
                    payloads = result.data.data.len(),
                    marks = result.data.marks.len(),
                    "sdk traversal reported"
                );
            }
            other => {
                debug!(target: "canvas-bridge", tag = other.tag(), "ignoring outbound-only tag");
            }
        }
    }
}

impl Bridge {
    /// Select a transport and start routing page events.
    ///
    /// Local wins when the current window has an active tab; otherwise the
    /// all-windows query decides, and the session stays remote for its
    /// lifetime. No target at all surfaces `TransportUnavailable`.
    pub async fn connect(
        host: Arc<dyn TabHost>,
        config: BridgeConfig,
    ) -> Result<Arc<Self>, BridgeError> {
        if config.poll_interval.is_zero() {
            return Err(BridgeError::Internal("poll interval must be positive".into()));
        }

        let (tab, mode) = if config.force_remote {
            (host.any_window_tab().await?, TransportMode::Remote)
        } else {
            match host.active_tab().await {
                Ok(tab) => (tab, TransportMode::Local),
                Err(err) => {
                    info!(target: "canvas-bridge", %err, "falling back to remote transport");
                    (host.any_window_tab().await?, TransportMode::Remote)
                }
            }
        };
        debug!(target: "canvas-bridge", ?mode, %tab, "transport selected");

        let transport: Arc<dyn PageTransport> = match mode {
            TransportMode::Local => Arc::new(LocalTransport::new(Arc::clone(&host))),
            TransportMode::Remote => Arc::new(RemoteTransport::new(Arc::clone(&host))),
        };

        let events = host.page_events();
        let progress = host.sdk_progress();
        let inbound = Arc::new(InboundState::default());
        let shutdown = CancellationToken::new();

        let pump = tokio::spawn(Self::pump_events(
            Arc::clone(&inbound),
            events,
            shutdown.clone(),
        ));

        Ok(Arc::new(Self {
            host,
            transport,
            mode,
            tab,
            send_gate: tokio::sync::Mutex::new(()),
            inbound,
            progress,
            poll_interval: config.poll_interval,
            shutdown,
            pump: Mutex::new(Some(pump)),
        }))
    }

    async fn pump_events(
        inbound: Arc<InboundState>,
        mut events: broadcast::Receiver<Envelope>,
        shutdown: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                event = events.recv() => {
                    match event {
                        Ok(envelope) => inbound.route(envelope),
                        Err(broadcast::error::RecvError::Closed) => break,
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(target: "canvas-bridge", skipped, "page event stream lagged");
                        }
                    }
                }
            }
        }
        debug!(target: "canvas-bridge", "event pump exited");
    }

    pub fn mode(&self) -> TransportMode {
        self.mode
    }

    /// Latest host-API announcement from the page, if any arrived yet.
    pub fn api_present(&self) -> Option<bool> {
        *self.inbound.api_present.lock()
    }

    /// Latest republished history snapshot, oldest first.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.inbound.history_view.lock().clone()
    }

    /// Deliver one data payload to the page's update callback.
    pub async fn send_payload(&self, data: serde_json::Value) -> Result<(), BridgeError> {
        self.send(MessageBody::CanvasData(vec![data])).await
    }

    /// Notify the page that synthesized speech reached a named mark.
    pub async fn send_tts_mark(&self, name: impl Into<String>) -> Result<(), BridgeError> {
        self.send(MessageBody::TtsMark(name.into())).await
    }

    pub async fn show_header(&self) -> Result<(), BridgeError> {
        self.send(MessageBody::ShowHeader).await
    }

    pub async fn set_unsupported_api_behavior(
        &self,
        mode: UnsupportedApiBehavior,
    ) -> Result<(), BridgeError> {
        self.send(MessageBody::UnsupportedApiBehavior(mode)).await
    }

    /// Kick off the SDK traversal and poll for its completion.
    ///
    /// The returned handle owns a cancellation token; session shutdown
    /// cancels outstanding polls as well.
    pub async fn start_sdk_load(&self) -> Result<SdkLoadHandle, BridgeError> {
        debug!(target: "canvas-bridge", state = ?SdkLoadState::Requested, "sdk load");
        self.send(MessageBody::ProcessSdk).await?;

        let progress = Arc::clone(&self.progress);
        let cancel = self.shutdown.child_token();
        let poll_cancel = cancel.clone();
        let poll_interval = self.poll_interval;

        let task = tokio::spawn(async move {
            debug!(target: "canvas-bridge", state = ?SdkLoadState::Polling, "sdk load");
            let mut ticker = interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = poll_cancel.cancelled() => {
                        debug!(target: "canvas-bridge", "sdk poll cancelled");
                        return Err(BridgeError::Cancelled);
                    }
                    _ = ticker.tick() => {
                        if !progress.is_ready() {
                            continue;
                        }
                        debug!(target: "canvas-bridge", state = ?SdkLoadState::Complete, "sdk load");
                        return match progress.take() {
                            Some(Ok(bundle)) => Ok(bundle),
                            Some(Err(reason)) => Err(BridgeError::SdkLoad(reason)),
                            None => Err(BridgeError::Internal("sdk outcome already taken".into())),
                        };
                    }
                }
            }
        });

        Ok(SdkLoadHandle { cancel, task })
    }

    async fn send(&self, body: MessageBody) -> Result<(), BridgeError> {
        let _gate = self.send_gate.lock().await;
        let envelope = Envelope::new(body);
        debug!(target: "canvas-bridge", tag = envelope.body.tag(), "delivering envelope");
        self.transport.deliver(self.tab, &envelope).await
    }

    /// Tear the session down: stops the event pump and cancels any
    /// outstanding SDK polls.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let handle = self.pump.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    /// Host handle, for callers that need to drive the simulated side.
    pub fn host(&self) -> Arc<dyn TabHost> {
        Arc::clone(&self.host)
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        self.shutdown.cancel();
        if let Some(handle) = self.pump.lock().take() {
            handle.abort();
        }
    }
}
