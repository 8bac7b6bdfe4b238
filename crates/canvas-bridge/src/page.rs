//! Simulated Interactive Canvas page.
//!
//! Stands in for the inspected web app: honors delivered envelopes the way
//! the page-side conventions do (update callback, TTS mark callback, header
//! overlay, SDK traversal trigger), and produces outbound history events
//! when its overridden capabilities are driven.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use canvasprobe_core_types::{ProbeError, UnsupportedApiBehavior};
use parking_lot::Mutex;
use project_store::DirRef;
use sdk_extract::{ExtractError, SdkProcessor};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::history::{HistoryKind, HistoryLog};
use crate::message::{Envelope, MessageBody, SdkResultPayload};
use crate::sdk::SdkProgress;

pub struct SimulatedPage {
    behavior: Mutex<UnsupportedApiBehavior>,
    header_visible: AtomicBool,
    history: HistoryLog,
    payloads: Mutex<Vec<serde_json::Value>>,
    marks: Mutex<Vec<String>>,
    outbound: broadcast::Sender<Envelope>,
    project: Option<DirRef>,
    progress: Arc<SdkProgress>,
}

impl SimulatedPage {
    pub(crate) fn new(
        project: Option<DirRef>,
        progress: Arc<SdkProgress>,
        outbound: broadcast::Sender<Envelope>,
    ) -> Arc<Self> {
        Arc::new(Self {
            behavior: Mutex::new(UnsupportedApiBehavior::default()),
            header_visible: AtomicBool::new(false),
            history: HistoryLog::default(),
            payloads: Mutex::new(Vec::new()),
            marks: Mutex::new(Vec::new()),
            outbound,
            project,
            progress,
        })
    }

    /// Handle one control-to-page envelope.
    pub async fn dispatch(self: &Arc<Self>, envelope: Envelope) {
        match envelope.body {
            MessageBody::CanvasData(values) => {
                self.payloads.lock().extend(values);
            }
            MessageBody::TtsMark(name) => {
                self.marks.lock().push(name);
            }
            MessageBody::ShowHeader => {
                self.header_visible.store(true, Ordering::Release);
            }
            MessageBody::UnsupportedApiBehavior(mode) => {
                *self.behavior.lock() = mode;
            }
            MessageBody::ProcessSdk => {
                let page = Arc::clone(self);
                tokio::spawn(async move {
                    page.run_sdk_traversal().await;
                });
            }
            other => {
                debug!(target: "canvas-bridge", tag = other.tag(), "page ignoring inbound-only tag");
            }
        }
    }

    async fn run_sdk_traversal(&self) {
        let outcome = match &self.project {
            Some(root) => SdkProcessor::new(Arc::clone(root)).process().await,
            None => Err(ExtractError::Required("project root".into())),
        };
        match &outcome {
            Ok(bundle) => {
                self.post(MessageBody::SdkResult(SdkResultPayload {
                    data: bundle.extraction.clone(),
                    ready: true,
                }));
            }
            Err(err) => {
                warn!(target: "canvas-bridge", %err, "sdk traversal failed");
            }
        }
        self.progress.complete(outcome);
    }

    /// Page announcement of whether the host canvas API is reachable.
    pub fn announce_init(&self, api_present: bool) {
        self.post(MessageBody::Init(api_present));
    }

    /// Overridden send-text-query capability: record, then republish the
    /// whole history.
    pub fn send_text_query(&self, query: impl Into<String>) {
        let snapshot = self.history.append(HistoryKind::TextQuery, query);
        self.post(MessageBody::History(snapshot));
    }

    /// Overridden state-update capability.
    pub fn set_canvas_state(&self, state: serde_json::Value) {
        let snapshot = self.history.append(HistoryKind::StateUpdate, state.to_string());
        self.post(MessageBody::History(snapshot));
    }

    /// Emulate the page calling a host API the runtime does not support.
    pub fn call_unsupported(&self, api: &str) -> Result<(), ProbeError> {
        match *self.behavior.lock() {
            UnsupportedApiBehavior::Off => Ok(()),
            UnsupportedApiBehavior::Warn => {
                warn!(target: "canvas-bridge", api, "unsupported host api called");
                Ok(())
            }
            UnsupportedApiBehavior::Error => {
                Err(ProbeError::new(format!("unsupported host api: {api}")))
            }
        }
    }

    fn post(&self, body: MessageBody) {
        let envelope = Envelope::new(body);
        if self.outbound.send(envelope).is_err() {
            debug!(target: "canvas-bridge", "no control-side listener for page event");
        }
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn received_payloads(&self) -> Vec<serde_json::Value> {
        self.payloads.lock().clone()
    }

    pub fn received_marks(&self) -> Vec<String> {
        self.marks.lock().clone()
    }

    pub fn header_visible(&self) -> bool {
        self.header_visible.load(Ordering::Acquire)
    }

    pub fn behavior(&self) -> UnsupportedApiBehavior {
        *self.behavior.lock()
    }
}
