mod api;
mod app;
mod config;
mod demo;
mod domain;
mod format;
mod ranking;
mod refresh;
mod report;
mod state;
mod tui;
mod ui;
mod webui;

use api::{ApiClient, DashboardSource};
use app::App;
use clap::Parser;
use config::DashboardConfig;
use demo::DemoSource;
use refresh::{Poller, RefreshEvent, RefreshSettings};
use std::fs::OpenOptions;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Modelboard: terminal dashboard for trading-model leaderboards, news and social feeds",
    after_help = "EXAMPLES:
    # Dashboard against the backend from MODELBOARD_API_URL / .env
    cargo run --release

    # Offline with synthetic data
    cargo run --release -- --demo

    # One cycle, print the leaderboard, exit
    cargo run --release -- --once --api-url http://localhost:8000

    # JSON mirror on port 9090
    cargo run --release -- --webui --webui-port 9090"
)]
struct Args {
    /// Use synthetic random-walk data instead of the backend
    #[arg(long)]
    demo: bool,

    /// Seed for --demo, for a reproducible session
    #[arg(long, requires = "demo")]
    demo_seed: Option<u64>,

    /// Fetch one full cycle, print the leaderboard and exit
    #[arg(long, conflicts_with = "webui")]
    once: bool,

    /// Serve the dashboard snapshot as JSON instead of the terminal UI
    #[arg(long)]
    webui: bool,

    /// WebUI server port (default: MODELBOARD_WEBUI_PORT or 8080)
    #[arg(long)]
    webui_port: Option<u16>,

    /// Backend base URL, overrides MODELBOARD_API_URL
    #[arg(long)]
    api_url: Option<String>,

    /// Models and system status refresh interval in seconds (default: 60)
    #[arg(long)]
    models_interval_secs: Option<u64>,

    /// News and social refresh interval in seconds (default: 600)
    #[arg(long)]
    feeds_interval_secs: Option<u64>,

    /// Comma-separated categories to poll (stock,polymarket,bitmex,forex)
    #[arg(long)]
    category: Option<String>,
}

fn init_logging(to_file: bool) -> io::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("modelboard=info"));
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter);
    if to_file {
        // The alternate screen owns stdout/stderr while the TUI runs.
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(config::LOG_FILE)?;
        builder
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
            .init();
    } else {
        builder.with_writer(io::stderr).init();
    }
    Ok(())
}

fn load_config(args: &Args) -> anyhow::Result<DashboardConfig> {
    let mut cfg = DashboardConfig::from_env()?;
    if let Some(url) = &args.api_url {
        cfg.api.base_url = config::normalize_base_url(url)?;
    }
    if let Some(secs) = args.models_interval_secs {
        let (min, max) = config::MODELS_INTERVAL_BOUNDS;
        cfg.models_interval = Duration::from_secs(secs.clamp(min, max));
    }
    if let Some(secs) = args.feeds_interval_secs {
        let (min, max) = config::FEEDS_INTERVAL_BOUNDS;
        cfg.feeds_interval = Duration::from_secs(secs.clamp(min, max));
    }
    if let Some(raw) = &args.category {
        cfg.categories = config::parse_categories(raw)?;
    }
    if let Some(port) = args.webui_port {
        cfg.webui_port = port;
    }
    Ok(cfg)
}

fn build_source(args: &Args, cfg: &DashboardConfig) -> anyhow::Result<Arc<dyn DashboardSource>> {
    if args.demo {
        info!("Using synthetic demo data (seed: {:?})", args.demo_seed);
        let source = match args.demo_seed {
            Some(seed) => DemoSource::seeded(seed),
            None => DemoSource::new(),
        };
        return Ok(Arc::new(source));
    }
    info!("Polling backend at {}", cfg.api.base_url);
    Ok(Arc::new(ApiClient::new(cfg.api.clone())?))
}

async fn run_once(source: Arc<dyn DashboardSource>, cfg: &DashboardConfig) -> io::Result<()> {
    let shared = state::new_shared();
    let (events_tx, mut events_rx) = mpsc::channel(refresh::EVENT_QUEUE);
    let poller = Poller::new(source, shared.clone(), cfg.categories.clone(), events_tx);
    poller.refresh_all().await;

    let mut models_ok = true;
    while let Ok(event) = events_rx.try_recv() {
        if let RefreshEvent::ModelsUpdated { ok: false, .. } = event {
            models_ok = false;
        }
    }

    let state = shared.read().await;
    print!("{}", report::render_report(&state, &cfg.categories, chrono::Utc::now()));
    if !models_ok {
        return Err(io::Error::other("models endpoint unavailable"));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> io::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Ignoring unreadable .env: {}", e);
        }
    }
    let args = Args::parse();
    let tui_mode = !args.once && !args.webui;
    init_logging(tui_mode)?;

    let cfg = load_config(&args).map_err(|e| io::Error::other(format!("{:#}", e)))?;
    let source = build_source(&args, &cfg).map_err(|e| io::Error::other(format!("{:#}", e)))?;

    if args.once {
        return run_once(source, &cfg).await;
    }

    let shared = state::new_shared();
    let (events_tx, mut events_rx) = mpsc::channel::<RefreshEvent>(refresh::EVENT_QUEUE);
    let handle = refresh::spawn(source, shared.clone(), RefreshSettings::from(&cfg), events_tx);

    if args.webui {
        let server = webui::run_webui_server(cfg.webui_port, shared.clone(), handle.commands());
        tokio::select! {
            res = server => match res {
                Ok(_) => info!("WebUI exited."),
                Err(e) => error!("WebUI failed: {}", e),
            },
            _ = tokio::signal::ctrl_c() => info!("Interrupted, shutting down"),
        }
        handle.shutdown().await;
        return Ok(());
    }

    let mut terminal = tui::init()?;
    let mut app = App::new(cfg.timezone);
    let res = app.run(&mut terminal, shared, &handle, &mut events_rx).await;

    tui::restore()?;
    handle.shutdown().await;

    if let Err(e) = res {
        error!("Error: {:?}", e);
        return Err(e);
    }

    Ok(())
}
