//! Command-line control surface.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use canvas_bridge::{Bridge, BridgeConfig, SimulatedTab};
use canvasprobe_core_types::UnsupportedApiBehavior;
use clap::{Args, Parser, Subcommand};
use project_store::FsDirectory;
use sdk_extract::{SdkBundle, SdkProcessor};
use serde_json::json;
use tracing::{info, warn};

use crate::prefs::{PrefsStore, ProbePrefs};

#[derive(Parser)]
#[command(author, version, about = "Drive an Interactive Canvas page without a live backend")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Preferences file (defaults to the platform config dir)
    #[arg(long, value_name = "FILE", global = true)]
    prefs_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a project tree for canvas payloads and SSML marks
    ProcessSdk(ProcessSdkArgs),

    /// Run a scripted session against a simulated canvas page
    Simulate(SimulateArgs),

    /// Show or change persisted preferences
    Prefs(PrefsArgs),
}

#[derive(Args)]
struct ProcessSdkArgs {
    /// Project root containing settings/, custom/ and optionally webhooks/
    root: PathBuf,
}

#[derive(Args)]
struct SimulateArgs {
    /// Project root backing the simulated page's SDK traversal
    root: PathBuf,

    /// Skip the local-tab probe and use the remote transport
    #[arg(long)]
    remote: bool,

    /// Cadence of the SDK-load poll, in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 250)]
    poll_interval: u64,
}

#[derive(Args)]
struct PrefsArgs {
    #[command(subcommand)]
    action: PrefsAction,
}

#[derive(Subcommand)]
enum PrefsAction {
    /// Print the current preferences and where they live
    Show,
    /// Change one preference
    Set(SetArgs),
}

#[derive(Args)]
struct SetArgs {
    key: PrefKey,
    value: String,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum PrefKey {
    DebugExtension,
    DebugClient,
    UnsupportedApiBehavior,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let store = match &self.prefs_path {
            Some(path) => PrefsStore::at(path),
            None => PrefsStore::default_location()?,
        };
        match self.command {
            Commands::ProcessSdk(args) => process_sdk(args).await,
            Commands::Simulate(args) => simulate(args, &store).await,
            Commands::Prefs(args) => prefs(args, &store),
        }
    }
}

async fn process_sdk(args: ProcessSdkArgs) -> Result<()> {
    let root = FsDirectory::open(&args.root)
        .await
        .with_context(|| format!("opening project root {}", args.root.display()))?;
    let bundle = SdkProcessor::new(root)
        .process()
        .await
        .context("sdk traversal failed")?;
    print_bundle(&bundle);
    Ok(())
}

async fn simulate(args: SimulateArgs, store: &PrefsStore) -> Result<()> {
    let prefs = store.load()?;
    let root = FsDirectory::open(&args.root)
        .await
        .with_context(|| format!("opening project root {}", args.root.display()))?;

    let tab = SimulatedTab::new(Some(root));
    let page = tab.page();
    let bridge = Bridge::connect(
        tab,
        BridgeConfig {
            poll_interval: Duration::from_millis(args.poll_interval),
            force_remote: args.remote,
        },
    )
    .await
    .context("no inspectable target")?;
    info!(target: "canvasprobe", mode = ?bridge.mode(), "session connected");

    page.announce_init(true);
    bridge
        .set_unsupported_api_behavior(prefs.unsupported_api_behavior)
        .await?;
    bridge.show_header().await?;

    let handle = bridge.start_sdk_load().await?;
    let bundle = handle.wait().await.context("sdk load did not complete")?;
    print_bundle(&bundle);

    // Feed the first discoveries back into the page, falling back to a
    // canned payload when the project carries none.
    let payload = bundle
        .extraction
        .data
        .iter()
        .find_map(|text| serde_json::from_str(text).ok())
        .unwrap_or_else(|| json!({ "command": "PING" }));
    bridge.send_payload(payload).await?;
    if let Some(mark) = bundle.extraction.marks.first() {
        bridge.send_tts_mark(mark.clone()).await?;
    }

    // Drive the page's outbound capabilities the way a developer would.
    page.send_text_query("yes");
    page.send_text_query("help");
    page.set_canvas_state(json!({ "screen": "results" }));
    if let Err(err) = page.call_unsupported("setInactivityTimeout") {
        warn!(target: "canvasprobe", %err, "unsupported api call rejected by the page");
    }
    tokio::time::sleep(Duration::from_millis(100)).await;

    println!();
    println!("Page state:");
    println!("  host api present: {:?}", bridge.api_present());
    println!("  payloads received: {}", page.received_payloads().len());
    println!("  marks received: {:?}", page.received_marks());
    println!("  header visible: {}", page.header_visible());

    println!();
    println!("History (newest first):");
    let mut history = bridge.history();
    history.reverse();
    for entry in &history {
        println!(
            "  [{}] {:<12} {}",
            entry.at.format("%H:%M:%S%.3f"),
            entry.kind.as_str(),
            entry.label
        );
    }

    bridge.shutdown().await;
    Ok(())
}

fn prefs(args: PrefsArgs, store: &PrefsStore) -> Result<()> {
    match args.action {
        PrefsAction::Show => {
            let prefs = store.load()?;
            println!("Preferences at {}:", store.path().display());
            println!("  flagDebugExtension: {}", prefs.debug_extension);
            println!("  flagDebugClient: {}", prefs.debug_client);
            println!("  unsupportedApiBehavior: {}", prefs.unsupported_api_behavior);
        }
        PrefsAction::Set(set) => {
            let mut prefs = store.load()?;
            apply_pref(&mut prefs, set.key, &set.value)?;
            store.save(&prefs)?;
            println!("Saved to {}", store.path().display());
        }
    }
    Ok(())
}

fn apply_pref(prefs: &mut ProbePrefs, key: PrefKey, value: &str) -> Result<()> {
    match key {
        PrefKey::DebugExtension => {
            prefs.debug_extension = parse_bool(value)?;
        }
        PrefKey::DebugClient => {
            prefs.debug_client = parse_bool(value)?;
        }
        PrefKey::UnsupportedApiBehavior => {
            prefs.unsupported_api_behavior = value
                .parse::<UnsupportedApiBehavior>()
                .map_err(|err| anyhow::anyhow!("{err}"))?;
        }
    }
    Ok(())
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "1" => Ok(true),
        "false" | "off" | "0" => Ok(false),
        other => anyhow::bail!("expected a boolean, got {other:?}"),
    }
}

fn print_bundle(bundle: &SdkBundle) {
    println!("Project: {}", bundle.header.title);
    println!("  id: {}", bundle.header.project_id);
    match &bundle.header.logo {
        Some(logo) => println!("  logo: {}", logo.name()),
        None => println!("  logo: (none)"),
    }

    println!();
    println!("Canvas payloads ({}):", bundle.extraction.data.len());
    for (index, data) in bundle.extraction.data.iter().enumerate() {
        println!("  #{index}");
        for line in data.lines() {
            println!("    {line}");
        }
    }

    println!();
    println!("SSML marks ({}):", bundle.extraction.marks.len());
    for mark in &bundle.extraction.marks {
        println!("  {mark}");
    }
}
