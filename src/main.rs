//! live-notify CLI
//!
//! Headless notification client:
//! - Watch the unread badge
//! - List, toggle and mark notifications
//! - Generate a config file
//!
//! Environment variables (see `live-notify config`) override the config
//! file; `RUST_LOG` overrides the log level.

use anyhow::Context;
use clap::{Parser, Subcommand};
use live_notify::render::{BadgeView, ItemFragment, ListView, Surface};
use live_notify::{
    generate_default_config, Config, HttpNotificationClient, LoggingConfig, NotificationApi,
    NotificationWidget,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "live-notify")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Live notification client")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Site URL, overrides the config file
    #[arg(long, global = true)]
    pub base_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Poll the unread count until interrupted
    Watch {
        /// Open the notification panel once at start
        #[arg(long)]
        open: bool,
    },

    /// Print the unread count once
    Count,

    /// Print one page of notifications
    List {
        /// Skip this many notifications
        #[arg(long, default_value = "0")]
        offset: usize,
        /// Print JSON instead of HTML
        #[arg(long)]
        json: bool,
        /// Do not mark the listed notifications as read
        #[arg(long)]
        keep_unread: bool,
    },

    /// Toggle the read state of a notification
    Toggle {
        /// Notification slug or id
        key: String,
    },

    /// Mark all notifications as read
    MarkAll,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::Config { output } = &cli.command {
        return write_default_config(output.as_ref());
    }

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::load_default(),
    };
    if let Some(url) = cli.base_url {
        config.server.base_url = url;
    }

    init_logging(&config.logging);
    tracing::debug!(base_url = %config.server.base_url, "Using notification server");

    let api: Arc<dyn NotificationApi> = Arc::new(
        HttpNotificationClient::new(config.server.clone(), &config.csrf)
            .context("creating notification client")?,
    );

    match cli.command {
        Commands::Watch { open } => {
            let mut widget = NotificationWidget::new(api, config.poll, TerminalSurface);
            widget.start();

            if open {
                if let Err(e) = widget.interactions().open_panel(false).await {
                    tracing::warn!(error = %e, "Could not open notification panel");
                }
            }

            tokio::signal::ctrl_c()
                .await
                .context("waiting for interrupt")?;
            tracing::info!("Interrupted, shutting down");
            widget.shutdown().await;
        }

        Commands::Count => {
            let widget = NotificationWidget::new(api, config.poll, TerminalSurface);
            let count = widget.poller().fetch_count().await?;
            println!("{}", count);
        }

        Commands::List {
            offset,
            json,
            keep_unread,
        } => {
            let mut poll = config.poll;
            poll.mark_as_read_on_open = !keep_unread;
            let widget = NotificationWidget::new(api, poll, QuietSurface);

            let page = widget.poller().fetch_list(offset).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&page.items)?);
            } else {
                println!("{}", live_notify::render::list_view(&page.items).html());
            }
        }

        Commands::Toggle { key } => {
            let widget = NotificationWidget::new(api, config.poll, QuietSurface);
            match widget.interactions().toggle_read(&key).await? {
                Some(true) => println!("{} marked as unread", key),
                Some(false) => println!("{} marked as read", key),
                None => println!("{} toggled", key),
            }
        }

        Commands::MarkAll => {
            let widget = NotificationWidget::new(api, config.poll, QuietSurface);
            widget.interactions().mark_all_read().await?;
            println!("All notifications marked as read");
        }

        Commands::Config { .. } => unreachable!("handled before loading config"),
    }

    Ok(())
}

fn init_logging(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("live_notify={}", logging.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn write_default_config(output: Option<&PathBuf>) -> anyhow::Result<()> {
    let content = generate_default_config();
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("writing {}", path.display()))?;
            eprintln!("Config written to {}", path.display());
        }
        None => print!("{}", content),
    }
    Ok(())
}

/// Prints badge and panel changes to stdout
struct TerminalSurface;

impl Surface for TerminalSurface {
    fn patch_badge(&mut self, badge: &BadgeView) {
        if badge.degraded {
            println!("[notifications] connection lost, reload required");
        } else {
            println!("[notifications] {} unread", badge.text);
        }
    }

    fn set_list(&mut self, list: &ListView) {
        println!("{}", list.html());
    }

    fn replace_item(&mut self, item: &ItemFragment) {
        println!("{}", item.html);
    }

    fn set_panel_open(&mut self, open: bool) {
        tracing::debug!(open, "Panel visibility changed");
    }
}

/// Discards rendering for one-shot commands that print their own output
struct QuietSurface;

impl Surface for QuietSurface {
    fn patch_badge(&mut self, _badge: &BadgeView) {}

    fn set_list(&mut self, _list: &ListView) {}

    fn replace_item(&mut self, _item: &ItemFragment) {}

    fn set_panel_open(&mut self, _open: bool) {}
}
