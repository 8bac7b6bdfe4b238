//! Session-level tests driving the bridge against the simulated tab.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use canvas_bridge::{
    Bridge, BridgeConfig, BridgeError, Envelope, HistoryKind, MessageBody, SdkProgress,
    SimulatedTab, TabHost, TransportMode,
};
use canvasprobe_core_types::{TabId, UnsupportedApiBehavior};
use project_store::{DirRef, MemoryDirectory};
use tokio::sync::broadcast;
use tokio::time::sleep;

fn fast_config() -> BridgeConfig {
    BridgeConfig {
        poll_interval: Duration::from_millis(10),
        force_remote: false,
    }
}

fn sample_project() -> DirRef {
    MemoryDirectory::new("sample")
        .with_dir(MemoryDirectory::new("settings").with_file(
            "settings.yaml",
            "projectId: p1\nlocalizedSettings:\n  displayName: Sample\n",
        ))
        .with_dir(
            MemoryDirectory::new("custom")
                .with_dir(MemoryDirectory::new("global").with_file(
                    "main.yaml",
                    r#"
handler:
  staticPrompt:
    candidates:
      - promptResponse:
          canvas:
            data:
              - command: HELLO
          firstSimple:
            variants:
              - speech: '<speak><mark name="hello"/></speak>'
"#,
                ))
                .with_dir(MemoryDirectory::new("scenes")),
        )
        .into_handle()
}

#[tokio::test]
async fn local_transport_reaches_the_page() {
    let tab = SimulatedTab::new(None);
    let page = tab.page();
    let bridge = Bridge::connect(tab, fast_config()).await.expect("connect");
    assert_eq!(bridge.mode(), TransportMode::Local);

    bridge
        .send_payload(serde_json::json!({"command": "PLAY"}))
        .await
        .expect("payload send");
    bridge.send_tts_mark("intro").await.expect("mark send");
    bridge.show_header().await.expect("header send");

    assert_eq!(page.received_payloads().len(), 1);
    assert_eq!(page.received_payloads()[0]["command"], "PLAY");
    assert_eq!(page.received_marks(), vec!["intro"]);
    assert!(page.header_visible());

    bridge.shutdown().await;
}

#[tokio::test]
async fn remote_fallback_holds_for_the_session() {
    let tab = SimulatedTab::remote_only(None);
    let page = tab.page();
    let bridge = Bridge::connect(tab, fast_config()).await.expect("connect");
    assert_eq!(bridge.mode(), TransportMode::Remote);

    bridge.send_tts_mark("far").await.expect("mark send");
    assert_eq!(page.received_marks(), vec!["far"]);

    bridge.shutdown().await;
}

#[tokio::test]
async fn sdk_load_polls_to_completion() {
    let tab = SimulatedTab::new(Some(sample_project()));
    let progress = tab.sdk_progress();
    let bridge = Bridge::connect(tab, fast_config()).await.expect("connect");

    let handle = bridge.start_sdk_load().await.expect("request");
    let bundle = handle.wait().await.expect("load completes");

    assert_eq!(bundle.header.title, "Sample");
    assert_eq!(bundle.extraction.marks, vec!["hello"]);
    // The outcome is fetched exactly once by the poll.
    assert!(progress.take().is_none());

    bridge.shutdown().await;
}

#[tokio::test]
async fn sdk_result_is_published_ready_exactly_once() {
    let tab = SimulatedTab::new(Some(sample_project()));
    let mut events = tab.page_events();
    let bridge = Bridge::connect(tab, fast_config()).await.expect("connect");

    let handle = bridge.start_sdk_load().await.expect("request");
    handle.wait().await.expect("load completes");

    // The page posts its traversal report before the ready flag flips, so
    // by the time the poll returns the report is already in the channel.
    let mut reports = 0;
    while let Ok(envelope) = events.try_recv() {
        if let MessageBody::SdkResult(result) = envelope.body {
            assert!(result.ready);
            assert_eq!(result.data.marks, vec!["hello"]);
            reports += 1;
        }
    }
    assert_eq!(reports, 1);

    bridge.shutdown().await;
}

#[tokio::test]
async fn sdk_load_failure_surfaces_to_the_caller() {
    // No project behind the page: the traversal fails fast.
    let tab = SimulatedTab::new(None);
    let bridge = Bridge::connect(tab, fast_config()).await.expect("connect");

    let handle = bridge.start_sdk_load().await.expect("request");
    let err = handle.wait().await.expect_err("load fails");
    assert!(matches!(err, BridgeError::SdkLoad(_)), "got {err:?}");

    bridge.shutdown().await;
}

#[tokio::test]
async fn history_snapshots_preserve_call_order() {
    let tab = SimulatedTab::new(None);
    let page = tab.page();
    let bridge = Bridge::connect(tab, fast_config()).await.expect("connect");

    page.send_text_query("yes");
    page.send_text_query("no");
    page.set_canvas_state(serde_json::json!({"score": 3}));
    sleep(Duration::from_millis(50)).await;

    let history = bridge.history();
    assert_eq!(history.len(), 3);
    let kinds: Vec<HistoryKind> = history.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            HistoryKind::TextQuery,
            HistoryKind::TextQuery,
            HistoryKind::StateUpdate
        ]
    );
    assert_eq!(history[0].label, "yes");

    bridge.shutdown().await;
}

#[tokio::test]
async fn init_announcement_reaches_the_control_side() {
    let tab = SimulatedTab::new(None);
    let page = tab.page();
    let bridge = Bridge::connect(tab, fast_config()).await.expect("connect");

    assert_eq!(bridge.api_present(), None);
    page.announce_init(true);
    sleep(Duration::from_millis(50)).await;
    assert_eq!(bridge.api_present(), Some(true));

    bridge.shutdown().await;
}

#[tokio::test]
async fn behavior_mode_is_plumbed_to_the_page() {
    let tab = SimulatedTab::new(None);
    let page = tab.page();
    let bridge = Bridge::connect(tab, fast_config()).await.expect("connect");

    assert!(page.call_unsupported("setCanvasState").is_ok());

    bridge
        .set_unsupported_api_behavior(UnsupportedApiBehavior::Error)
        .await
        .expect("behavior send");
    assert_eq!(page.behavior(), UnsupportedApiBehavior::Error);
    assert!(page.call_unsupported("setCanvasState").is_err());

    bridge.shutdown().await;
}

/// Host whose page never answers the traversal request; used to exercise
/// the poll's cancellation paths.
struct IdleHost {
    tab: TabId,
    slot: canvas_bridge::tab::SharedSlot,
    events: broadcast::Sender<Envelope>,
    progress: Arc<SdkProgress>,
}

impl IdleHost {
    fn new() -> Arc<Self> {
        let (events, _) = broadcast::channel(8);
        Arc::new(Self {
            tab: TabId::new(),
            slot: Arc::new(parking_lot::Mutex::new(None)),
            events,
            progress: SdkProgress::new(),
        })
    }
}

#[async_trait]
impl TabHost for IdleHost {
    async fn active_tab(&self) -> Result<TabId, BridgeError> {
        Ok(self.tab)
    }

    async fn any_window_tab(&self) -> Result<TabId, BridgeError> {
        Ok(self.tab)
    }

    fn message_slot(&self) -> canvas_bridge::tab::SharedSlot {
        Arc::clone(&self.slot)
    }

    async fn run_injector(&self, _tab: TabId) -> Result<(), BridgeError> {
        self.slot.lock().take();
        Ok(())
    }

    async fn eval_in_frame(
        &self,
        _tab: TabId,
        _frame: &str,
        _script: &str,
    ) -> Result<(), BridgeError> {
        Ok(())
    }

    fn page_events(&self) -> broadcast::Receiver<Envelope> {
        self.events.subscribe()
    }

    fn sdk_progress(&self) -> Arc<SdkProgress> {
        Arc::clone(&self.progress)
    }
}

#[tokio::test]
async fn sdk_poll_honors_explicit_cancellation() {
    let bridge = Bridge::connect(IdleHost::new(), fast_config())
        .await
        .expect("connect");

    let handle = bridge.start_sdk_load().await.expect("request");
    handle.cancel();
    let err = handle.wait().await.expect_err("cancelled");
    assert!(matches!(err, BridgeError::Cancelled));

    bridge.shutdown().await;
}

#[tokio::test]
async fn session_shutdown_cancels_outstanding_polls() {
    let bridge = Bridge::connect(IdleHost::new(), fast_config())
        .await
        .expect("connect");

    let handle = bridge.start_sdk_load().await.expect("request");
    bridge.shutdown().await;
    let err = handle.wait().await.expect_err("cancelled by teardown");
    assert!(matches!(err, BridgeError::Cancelled));
}
