//! Activity engine daemon: replay update streams and inspect account histories.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::sync::{broadcast, mpsc, oneshot};

use mtw_engine::{
    init_logging, ActivitiesChanged, ActivityStore, ActivityUpdate, EngineConfig, EngineMetrics,
    LogFormat, ShutdownController,
};
use mtw_fetch::BridgeClient;
use mtw_types::AccountId;

#[derive(Parser)]
#[command(name = "mtw-daemon", about = "Wallet activity reconciliation engine")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "MTW_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory for the LMDB environment.
    #[arg(long, env = "MTW_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "MTW_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "MTW_LOG_FORMAT")]
    log_format: Option<String>,

    /// Wallet bridge JSON-RPC endpoint used for pagination and details.
    #[arg(long, env = "MTW_BRIDGE_URL")]
    bridge_url: Option<String>,

    /// Subcommand.
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Feed a JSON-lines file of activity updates through the store and print
    /// every change notification as JSON.
    Replay {
        file: PathBuf,
        /// Print Prometheus metrics when done.
        #[arg(long)]
        metrics: bool,
    },
    /// Print an account's timeline, newest first.
    Show {
        account: String,
        /// Token slug; the cross-token timeline when omitted.
        #[arg(long)]
        slug: Option<String>,
    },
    /// Load older history from the bridge.
    LoadMore {
        account: String,
        #[arg(long)]
        slug: Option<String>,
        /// Visible activities to load (defaults to the configured page limit).
        #[arg(long)]
        limit: Option<usize>,
        /// Load one more batch after the limit is reached.
        #[arg(long)]
        with_budget: bool,
    },
    /// Report broken index invariants of an account.
    Check { account: String },
    /// Delete one account's state.
    Forget { account: String },
    /// Delete every account's state.
    Clean,
    /// Print the effective configuration as TOML.
    Config,
}

fn load_config(cli: &Cli) -> anyhow::Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_toml_file(&path.to_string_lossy())
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.log_format = format.clone();
    }
    if let Some(url) = &cli.bridge_url {
        config.bridge_url = url.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let format: LogFormat = config.log_format.parse()?;
    init_logging(format, &config.log_level)?;

    if let Command::Config = cli.command {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    tracing::info!(
        data_dir = %config.data_dir.display(),
        bridge = %config.bridge_url,
        "opening activity store"
    );
    let fetcher = Arc::new(BridgeClient::new(config.bridge_url.clone())?);
    let metrics = Arc::new(EngineMetrics::new());
    let page_limit = config.page_limit;
    let store = Arc::new(ActivityStore::open_lmdb(config, fetcher, metrics).await?);

    let result = match cli.command {
        Command::Replay { file, metrics } => replay(&store, &file, metrics).await,
        Command::Show { account, slug } => show(&store, &AccountId::new(account), slug.as_deref()).await,
        Command::LoadMore {
            account,
            slug,
            limit,
            with_budget,
        } => {
            let account = AccountId::new(account);
            let loaded = store
                .load_past_activities(&account, slug.as_deref(), limit.unwrap_or(page_limit), with_budget)
                .await?;
            let end = store.account_state(&account).await.is_history_end_reached(slug.as_deref());
            println!("loaded {loaded} activities (history end: {end})");
            Ok(())
        }
        Command::Check { account } => check(&store, &AccountId::new(account)).await,
        Command::Forget { account } => {
            store.remove_account(&AccountId::new(account)).await;
            Ok(())
        }
        Command::Clean => {
            store.clean().await;
            Ok(())
        }
        Command::Config => Ok(()),
    };

    store.flush().await?;
    result
}

async fn replay(store: &Arc<ActivityStore>, file: &Path, print_metrics: bool) -> anyhow::Result<()> {
    let contents = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;

    let shutdown = Arc::new(ShutdownController::new());
    let signals = {
        let shutdown = Arc::clone(&shutdown);
        tokio::spawn(async move { shutdown.wait_for_signal().await })
    };

    let (done_tx, done_rx) = oneshot::channel();
    let printer = tokio::spawn(print_changes(store.subscribe(), done_rx));

    let (updates_tx, updates_rx) = mpsc::channel(64);
    let runner = {
        let store = Arc::clone(store);
        let shutdown_rx = shutdown.subscribe();
        tokio::spawn(async move { store.run(updates_rx, shutdown_rx).await })
    };

    let mut sent = 0usize;
    for (n, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let update: ActivityUpdate =
            serde_json::from_str(line).with_context(|| format!("invalid update on line {}", n + 1))?;
        if updates_tx.send(update).await.is_err() {
            tracing::warn!(sent, "update loop stopped early");
            break;
        }
        sent += 1;
    }
    drop(updates_tx);

    runner.await?;
    signals.abort();
    let _ = done_tx.send(());
    printer.await??;

    tracing::info!(updates = sent, "replay finished");
    if print_metrics {
        print!("{}", store.metrics().encode_text());
    }
    Ok(())
}

async fn print_changes(
    mut changes: broadcast::Receiver<ActivitiesChanged>,
    mut done: oneshot::Receiver<()>,
) -> anyhow::Result<()> {
    loop {
        tokio::select! {
            biased;
            change = changes.recv() => match change {
                Ok(change) => println!("{}", serde_json::to_string(&change)?),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "change printer fell behind");
                }
                Err(broadcast::error::RecvError::Closed) => return Ok(()),
            },
            _ = &mut done => break,
        }
    }
    while let Ok(change) = changes.try_recv() {
        println!("{}", serde_json::to_string(&change)?);
    }
    Ok(())
}

async fn show(store: &ActivityStore, account: &AccountId, slug: Option<&str>) -> anyhow::Result<()> {
    let state = store.account_state(account).await;
    let ids = match slug {
        None => state.ids_main(),
        Some(slug) => state.ids_for_slug(slug),
    };
    for id in ids {
        let Some(activity) = state.activity(id) else {
            println!("{id}\t<missing>");
            continue;
        };
        let hidden = if activity.should_hide() { "\thidden" } else { "" };
        println!(
            "{}\t{}\t{:?}\t{}{}",
            activity.timestamp().as_millis(),
            id,
            activity.status(),
            activity.token_slugs().join(","),
            hidden
        );
    }
    println!(
        "{} activities, history end: {}",
        ids.len(),
        state.is_history_end_reached(slug)
    );
    Ok(())
}

async fn check(store: &ActivityStore, account: &AccountId) -> anyhow::Result<()> {
    let violations = store.account_state(account).await.invariant_violations();
    for violation in &violations {
        println!("{violation}");
    }
    if !violations.is_empty() {
        anyhow::bail!("{} invariant violations in {account}", violations.len());
    }
    println!("{account}: ok");
    Ok(())
}
