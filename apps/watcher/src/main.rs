//! FFPInvest alert watcher.
//!
//! Polls the trade alert service, renders the current alerts in the terminal
//! and rings the bell when a new alert arrives.

mod config;
mod identity;
mod telegram;
mod terminal;

use clap::{Parser, ValueEnum};
use config::WatcherConfig;
use ffpinvest_alerts::{
    AlertBoard, AlertPoller, DeviceEffects, KeyValueStore, Lifecycle, LocalNotifier,
    NotificationPreference, PollOutcome, SessionService, SqliteStore,
};
use ffpinvest_feeds::RestAlertFetcher;
use identity::EnvIdentity;
use std::sync::Arc;
use std::time::Duration;
use telegram::TelegramNotifier;
use terminal::{render_board, ConsoleNotifier, LogVibrator, NotifierChain, TerminalBell};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Toggle {
    On,
    Off,
}

/// FFPInvest alert watcher CLI
#[derive(Parser, Debug)]
#[command(name = "ffpinvest-watcher")]
#[command(about = "Watch FFPInvest trade alerts from the terminal", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "watcher.json")]
    config: String,

    /// Alert service base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Poll interval in seconds
    #[arg(short, long)]
    interval: Option<u64>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short, long)]
    log_level: Option<String>,

    /// SQLite database URL for local preferences
    #[arg(long)]
    database: Option<String>,

    /// Persist the notification preference before polling
    #[arg(long, value_enum)]
    notifications: Option<Toggle>,

    /// Run a single poll cycle, print the board and exit
    #[arg(long, default_value_t = false)]
    once: bool,
}

impl Args {
    fn apply(&self, config: &mut WatcherConfig) {
        if let Some(base_url) = &self.base_url {
            config.rest.base_url = base_url.clone();
        }
        if let Some(interval) = self.interval {
            config.poller.poll_interval_secs = interval;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(database) = &self.database {
            config.database_url = database.clone();
        }
    }
}

fn init_logging(level: &str) {
    let level = level.parse::<Level>().unwrap_or(Level::INFO);

    // RUST_LOG wins over the configured level when present.
    let result = match EnvFilter::try_from_default_env() {
        Ok(filter) => tracing::subscriber::set_global_default(
            FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_target(false)
                .compact()
                .finish(),
        ),
        Err(_) => tracing::subscriber::set_global_default(
            FmtSubscriber::builder()
                .with_max_level(level)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact()
                .finish(),
        ),
    };

    if let Err(e) = result {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

fn build_effects(config: &WatcherConfig) -> DeviceEffects {
    let mut notifiers: Vec<Arc<dyn LocalNotifier>> = vec![Arc::new(ConsoleNotifier)];
    if let Some(telegram) = TelegramNotifier::try_from_env() {
        notifiers.push(Arc::new(telegram));
    }

    DeviceEffects::new(
        Arc::new(TerminalBell::new(config.effects.terminal_bell)),
        Arc::new(LogVibrator),
    )
    .with_notifier(Arc::new(NotifierChain::new(notifiers)))
    .with_sound_attempts(config.effects.sound_attempts)
    .with_timeout(Duration::from_millis(config.effects.timeout_ms))
}

struct Watcher {
    poller: AlertPoller,
    session: SessionService,
    preference: NotificationPreference,
}

async fn setup(config: &WatcherConfig, notifications: Option<Toggle>) -> Result<Watcher, BoxError> {
    let store: Arc<dyn KeyValueStore> = Arc::new(SqliteStore::connect(&config.database_url).await?);

    let preference = NotificationPreference::new(store.clone());
    if let Some(toggle) = notifications {
        preference.set(toggle == Toggle::On).await?;
    }
    info!("  Notifications: {}", preference.is_enabled().await);

    let session = SessionService::new(store, Arc::new(EnvIdentity::new()));
    if let Err(e) = session.start().await {
        warn!("Session not established: {}", e);
    }

    let fetcher = RestAlertFetcher::new(&config.rest)?;
    let poller = AlertPoller::new(
        Arc::new(fetcher),
        build_effects(config),
        preference.clone(),
        config.poller.clone(),
    );
    Ok(Watcher {
        poller,
        session,
        preference,
    })
}

/// Print the board every time it changes.
async fn run_render_loop(mut rx: watch::Receiver<AlertBoard>) {
    loop {
        let text = render_board(&rx.borrow_and_update(), tokio::time::Instant::now());
        println!("\n{}", text);
        if rx.changed().await.is_err() {
            break;
        }
    }
}

/// Handle `r` (retry), `n` (toggle notifications) and `q` (quit) from stdin.
/// Returns when the user quits or stdin closes.
async fn run_commands(poller: &AlertPoller, preference: &NotificationPreference) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                // Detached stdin; keep running until Ctrl+C.
                std::future::pending::<()>().await;
                return;
            }
            Err(e) => {
                warn!("Failed to read stdin: {}", e);
                std::future::pending::<()>().await;
                return;
            }
        };

        match line.trim() {
            "r" => {
                if let PollOutcome::Failed(e) = poller.retry().await {
                    warn!("Retry failed: {}", e);
                }
            }
            "n" => match preference.toggle().await {
                Ok(enabled) => info!("Notifications {}", if enabled { "on" } else { "off" }),
                Err(e) => error!("Failed to save notification preference: {}", e),
            },
            "q" => return,
            "" => {}
            other => warn!("Unknown command {:?} (r = retry, n = notifications, q = quit)", other),
        }
    }
}

#[tokio::main]
async fn main() {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let mut config = match WatcherConfig::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    args.apply(&mut config);

    init_logging(&config.log_level);

    info!("🚀 FFPInvest watcher starting...");
    info!("  Service: {}", config.rest.base_url);
    info!("  Poll interval: {}s", config.poller.poll_interval_secs);
    info!("  Database: {}", config.database_url);

    let Watcher {
        poller,
        session,
        preference,
    } = match setup(&config, args.notifications).await {
        Ok(watcher) => watcher,
        Err(e) => {
            error!("Startup failed: {}", e);
            std::process::exit(1);
        }
    };

    if args.once {
        match poller.poll_once().await {
            PollOutcome::Failed(e) => error!("Poll failed: {}", e),
            outcome => {
                outcome.effects().await;
            }
        }
        println!("{}", render_board(&poller.board(), tokio::time::Instant::now()));
        poller.shutdown();
        session.stop();
        return;
    }

    let render = tokio::spawn(run_render_loop(poller.subscribe()));
    poller.start();

    info!("Commands: r = retry, n = toggle notifications, q = quit. Ctrl+C to stop.");

    tokio::select! {
        _ = run_commands(&poller, &preference) => {}
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!("Failed to listen for Ctrl+C: {}", e);
            }
            warn!("Shutdown signal received");
        }
    }

    poller.shutdown();
    session.stop();
    render.abort();

    let board = poller.board();
    info!("📈 Final Stats:");
    info!("  Successful polls: {}", board.successful_polls);
    info!("  Failed polls: {}", board.failed_polls);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cli_overrides_config() {
        let args = Args::parse_from([
            "ffpinvest-watcher",
            "--base-url",
            "http://localhost:9000",
            "--interval",
            "30",
            "--notifications",
            "off",
        ]);
        let mut config = WatcherConfig::default();
        args.apply(&mut config);

        assert_eq!(config.rest.base_url, "http://localhost:9000");
        assert_eq!(config.poller.poll_interval_secs, 30);
        assert_eq!(config.log_level, "info");
        assert_eq!(args.notifications, Some(Toggle::Off));
        assert_eq!(args.config, "watcher.json");
        assert!(!args.once);
    }
}
