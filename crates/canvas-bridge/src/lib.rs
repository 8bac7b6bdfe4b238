//! Cross-context message relay for driving an Interactive Canvas page.
//!
//! One probe session talks to one inspected tab through a typed envelope.
//! Delivery goes over one of two transports, chosen once per session: a
//! local slot-and-injector path when the target is the active tab, or a
//! remote code-evaluation path when the target lives in another window.
//! Everything the page sends back arrives on a single inbound event stream.

pub mod errors;
pub mod history;
pub mod message;
pub mod page;
pub mod relay;
pub mod sdk;
pub mod tab;
pub mod transport;

pub use errors::BridgeError;
pub use history::{HistoryEntry, HistoryKind, HistoryLog};
pub use message::{Envelope, MessageBody, SdkResultPayload};
pub use page::SimulatedPage;
pub use relay::{Bridge, BridgeConfig};
pub use sdk::{SdkLoadHandle, SdkLoadState, SdkProgress};
pub use tab::{SimulatedTab, TabHost};
pub use transport::{LocalTransport, PageTransport, RemoteTransport, TransportMode, CANVAS_FRAME};
