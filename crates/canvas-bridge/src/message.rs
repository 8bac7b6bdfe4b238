use canvasprobe_core_types::UnsupportedApiBehavior;
use sdk_extract::ExtractionResult;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::history::HistoryEntry;

/// One unit of cross-context communication. Delivered to exactly one
/// target per send; never persisted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Envelope {
    pub msg_id: Uuid,
    #[serde(flatten)]
    pub body: MessageBody,
}

impl Envelope {
    pub fn new(body: MessageBody) -> Self {
        Self {
            msg_id: Uuid::new_v4(),
            body,
        }
    }
}

/// Wire body, tagged with the message types the page convention defines.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum MessageBody {
    /// Data delivered to the page's update callback; carries an array with
    /// one parsed object.
    #[serde(rename = "payload")]
    CanvasData(Vec<serde_json::Value>),
    #[serde(rename = "TtsEndpointEvent")]
    TtsMark(String),
    #[serde(rename = "Ext-ShowHeader")]
    ShowHeader,
    #[serde(rename = "Ext-ProcessSdk")]
    ProcessSdk,
    #[serde(rename = "Ext-UnsupportedApiBehavior")]
    UnsupportedApiBehavior(UnsupportedApiBehavior),
    /// Page announcement: is the host canvas API present.
    #[serde(rename = "InteractiveCanvas_Init")]
    Init(bool),
    /// Full outbound-call history, republished on every append.
    #[serde(rename = "InteractiveCanvas_History")]
    History(Vec<HistoryEntry>),
    #[serde(rename = "InteractiveCanvas_ProcessSdk")]
    SdkResult(SdkResultPayload),
}

impl MessageBody {
    /// Wire tag, for diagnostics.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::CanvasData(_) => "payload",
            Self::TtsMark(_) => "TtsEndpointEvent",
            Self::ShowHeader => "Ext-ShowHeader",
            Self::ProcessSdk => "Ext-ProcessSdk",
            Self::UnsupportedApiBehavior(_) => "Ext-UnsupportedApiBehavior",
            Self::Init(_) => "InteractiveCanvas_Init",
            Self::History(_) => "InteractiveCanvas_History",
            Self::SdkResult(_) => "InteractiveCanvas_ProcessSdk",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SdkResultPayload {
    pub data: ExtractionResult,
    pub ready: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_tags_match_the_page_convention() {
        let env = Envelope::new(MessageBody::TtsMark("intro".into()));
        let wire = serde_json::to_value(&env).unwrap();
        assert_eq!(wire["type"], "TtsEndpointEvent");
        assert_eq!(wire["payload"], "intro");

        let env = Envelope::new(MessageBody::ShowHeader);
        let wire = serde_json::to_value(&env).unwrap();
        assert_eq!(wire["type"], "Ext-ShowHeader");

        let env = Envelope::new(MessageBody::CanvasData(vec![serde_json::json!({"a": 1})]));
        let wire = serde_json::to_value(&env).unwrap();
        assert_eq!(wire["type"], "payload");
        assert_eq!(wire["payload"][0]["a"], 1);
    }

    #[test]
    fn envelopes_round_trip() {
        let env = Envelope::new(MessageBody::SdkResult(SdkResultPayload {
            data: ExtractionResult {
                data: vec!["{}".into()],
                marks: vec!["m".into()],
            },
            ready: true,
        }));
        let wire = serde_json::to_string(&env).unwrap();
        let back: Envelope = serde_json::from_str(&wire).unwrap();
        assert_eq!(back.msg_id, env.msg_id);
        assert_eq!(back.body.tag(), "InteractiveCanvas_ProcessSdk");
    }
}
