//! Delivery strategies for control-to-page messages.

use std::sync::Arc;

use async_trait::async_trait;
use canvasprobe_core_types::TabId;
use tracing::trace;

use crate::errors::BridgeError;
use crate::message::Envelope;
use crate::tab::TabHost;

/// Name of the sub-frame the remote strategy evaluates into.
pub const CANVAS_FRAME: &str = "assistant-frame";

/// Which delivery strategy a session settled on. Decided once, never
/// re-evaluated.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TransportMode {
    Local,
    Remote,
}

#[async_trait]
pub trait PageTransport: Send + Sync {
    async fn deliver(&self, tab: TabId, envelope: &Envelope) -> Result<(), BridgeError>;
}

/// Local strategy: park the serialized envelope in the shared slot, then
/// run the injector, which drains the slot inside the page's context and
/// re-dispatches the payload as a page-level event.
pub struct LocalTransport {
    host: Arc<dyn TabHost>,
}

impl LocalTransport {
    pub fn new(host: Arc<dyn TabHost>) -> Self {
        Self { host }
    }
}

#[async_trait]
impl PageTransport for LocalTransport {
    async fn deliver(&self, tab: TabId, envelope: &Envelope) -> Result<(), BridgeError> {
        let serialized = serde_json::to_string(envelope)?;
        trace!(target: "canvas-bridge", tag = envelope.body.tag(), "parking envelope in shared slot");
        *self.host.message_slot().lock() = Some(serialized);
        self.host.run_injector(tab).await
    }
}

/// Remote strategy: serialize the envelope into a literal script and
/// evaluate it inside the canvas sub-frame. Trades safety for reach when
/// no local active tab exists.
pub struct RemoteTransport {
    host: Arc<dyn TabHost>,
}

impl RemoteTransport {
    pub fn new(host: Arc<dyn TabHost>) -> Self {
        Self { host }
    }
}

#[async_trait]
impl PageTransport for RemoteTransport {
    async fn deliver(&self, tab: TabId, envelope: &Envelope) -> Result<(), BridgeError> {
        let script = post_message_script(envelope)?;
        trace!(target: "canvas-bridge", tag = envelope.body.tag(), "evaluating delivery script");
        self.host.eval_in_frame(tab, CANVAS_FRAME, &script).await
    }
}

const SCRIPT_PREFIX: &str = "window.postMessage(";
const SCRIPT_SUFFIX: &str = ", \"*\");";

/// Build the literal delivery script the remote strategy evaluates.
pub fn post_message_script(envelope: &Envelope) -> Result<String, BridgeError> {
    let serialized = serde_json::to_string(envelope)?;
    Ok(format!("{SCRIPT_PREFIX}{serialized}{SCRIPT_SUFFIX}"))
}

/// Recover the envelope from a delivery script. Used by simulated hosts to
/// "execute" evaluated code.
pub fn parse_post_message_script(script: &str) -> Option<Envelope> {
    let inner = script
        .strip_prefix(SCRIPT_PREFIX)?
        .strip_suffix(SCRIPT_SUFFIX)?;
    serde_json::from_str(inner).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageBody;

    #[test]
    fn delivery_scripts_round_trip() {
        let envelope = Envelope::new(MessageBody::TtsMark("intro".into()));
        let script = post_message_script(&envelope).unwrap();
        assert!(script.starts_with(SCRIPT_PREFIX));
        assert!(script.ends_with(SCRIPT_SUFFIX));

        let parsed = parse_post_message_script(&script).expect("parse back");
        assert_eq!(parsed.msg_id, envelope.msg_id);
        assert_eq!(parsed.body.tag(), "TtsEndpointEvent");
    }

    #[test]
    fn foreign_scripts_are_rejected() {
        assert!(parse_post_message_script("alert(1);").is_none());
        assert!(parse_post_message_script("window.postMessage(not json, \"*\");").is_none());
    }
}
