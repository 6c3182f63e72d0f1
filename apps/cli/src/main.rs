use std::{
    path::{Path, PathBuf},
    sync::{Arc, atomic::Ordering},
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use pixeltap_core::{
    EventHubBuilder, FileStore, Host, HttpTransport, KeyValueStore, RawEvent, Settings, Transport,
    activate, format_event_summary, identity::VISITOR_ID_MAX_AGE,
};
use tokio::{fs, io::AsyncReadExt};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::dry_run::DryRunTransport;

mod dry_run;

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.0}m {:.0}s", secs / 60.0, secs % 60.0)
    }
}

#[derive(Parser)]
#[command(name = "pixeltap")]
#[command(
    about = "Replay storefront events through the pixel tap and forward them to a collection endpoint"
)]
struct Cli {
    /// JSON-lines file of raw storefront events ("-" reads stdin)
    events: PathBuf,

    /// Collection endpoint URL
    #[arg(short, long, env = "PIXELTAP_WEBHOOK_URL")]
    webhook_url: Option<String>,

    /// Shop name sent with every event
    #[arg(short, long, env = "PIXELTAP_SHOP_NAME")]
    shop_name: Option<String>,

    /// JSON settings file (webhookUrl, shopName, forwardCookies)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Initial-state snapshot (JSON) used when an event carries no cart lines
    #[arg(long)]
    initial_state: Option<PathBuf>,

    /// Persistent store file. Defaults to the user cache directory.
    #[arg(long)]
    store: Option<PathBuf>,

    /// Seed a store value before activation, e.g. --cookie _fbp=fb.1.123
    #[arg(long = "cookie", value_name = "NAME=VALUE")]
    cookies: Vec<String>,

    /// Do not send captured signals as a Cookie header
    #[arg(long)]
    no_cookies: bool,

    /// Print outbound requests instead of sending them
    #[arg(long)]
    dry_run: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn create_progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("=> "),
    );
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn read_events(path: &Path) -> Result<Vec<RawEvent>> {
    let content = if path == Path::new("-") {
        let mut buf = String::new();
        tokio::io::stdin().read_to_string(&mut buf).await?;
        buf
    } else {
        fs::read_to_string(path)
            .await
            .with_context(|| format!("reading events from {}", path.display()))?
    };
    Ok(parse_events(&content))
}

/// One event per line. Blank lines are skipped and malformed lines are logged and dropped.
fn parse_events(content: &str) -> Vec<RawEvent> {
    let mut events = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<serde_json::Value>(line) {
            Ok(value) => events.push(RawEvent::new(value)),
            Err(e) => warn!(line = index + 1, error = %e, "skipping malformed event"),
        }
    }
    events
}

async fn read_initial_state(path: Option<&Path>) -> Result<Option<RawEvent>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let json_content = fs::read_to_string(path)
        .await
        .with_context(|| format!("reading initial state from {}", path.display()))?;
    Ok(Some(RawEvent::new(serde_json::from_str(&json_content)?)))
}

async fn seed_store(store: &dyn KeyValueStore, cookies: &[String]) -> Result<()> {
    for cookie in cookies {
        let (name, value) = cookie
            .split_once('=')
            .with_context(|| format!("--cookie expects NAME=VALUE, got '{}'", cookie))?;
        if let Err(e) = store.set(name.trim(), value.trim(), VISITOR_ID_MAX_AGE).await {
            warn!(error = %e, "could not seed store");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let file_settings = match &cli.settings {
        Some(path) => Settings::load(path)
            .await
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => Settings::default(),
    };
    let settings = file_settings.merge(Settings {
        webhook_url: cli.webhook_url.clone(),
        shop_name: cli.shop_name.clone(),
        forward_cookies: cli.no_cookies.then_some(false),
    });

    let store: Arc<dyn KeyValueStore> = Arc::new(match &cli.store {
        Some(path) => FileStore::new(path),
        None => FileStore::default(),
    });
    seed_store(store.as_ref(), &cli.cookies).await?;

    let transport: Arc<dyn Transport> = if cli.dry_run {
        Arc::new(DryRunTransport)
    } else {
        Arc::new(HttpTransport::new()?)
    };

    let events = read_events(&cli.events).await?;
    let initial_state = read_initial_state(cli.initial_state.as_deref()).await?;

    println!(
        "\n{}  {}\n",
        style("pixeltap").cyan().bold(),
        style("Storefront Event Tap").dim()
    );

    let mut builder = EventHubBuilder::new();
    let tap = activate(Host {
        analytics: &mut builder,
        store,
        transport,
        settings,
        initial_state,
    })
    .await?;
    let hub = builder.build()?;

    println!(
        "{} Visitor {} {}",
        style("✓").green().bold(),
        style(tap.correlation().identity.as_str()).yellow(),
        style(format!("(session {})", tap.correlation().session)).dim()
    );
    println!("{}", style("─".repeat(60)).dim());

    let total_start = Instant::now();
    let pb = create_progress_bar(events.len() as u64);
    for event in events {
        pb.set_message(format_event_summary(&tap.canonicalize(&event)));
        hub.publish(event);
        pb.inc(1);
    }
    pb.set_message("waiting for deliveries...");
    hub.drain().await;
    pb.finish_and_clear();

    let stats = tap.stats();
    let metrics = hub.metrics();
    println!(
        "{} Captured {} | delivered {} | failed {}",
        style("✓").green().bold(),
        style(stats.captured_total.load(Ordering::Relaxed)).cyan(),
        style(stats.delivered_total.load(Ordering::Relaxed)).green(),
        style(stats.failed_total.load(Ordering::Relaxed)).red(),
    );
    let aborted = metrics.handler_panics_total.load(Ordering::Relaxed);
    if aborted > 0 {
        println!(
            "{} {} handler invocation(s) aborted",
            style("!").yellow().bold(),
            aborted
        );
    }

    println!(
        "\n{} {}\n",
        style("Total time:").dim(),
        style(format_duration(total_start.elapsed())).cyan().bold()
    );

    Ok(())
}
