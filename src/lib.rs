//! # live-notify
//!
//! Live notification client for a publishing site: keeps an unread badge
//! current, renders the notification popover and sends read/unread toggles
//! back to the server.
//!
//! ## Features
//!
//! - **Polling**: fixed-delay unread count refresh with a failure threshold
//! - **Safe rendering**: every notification field is escaped before it
//!   reaches the page
//! - **Ordering**: stale responses are discarded, local toggles survive
//!   racing list fetches
//! - **CSRF**: tokens only go to same-origin mutating requests
//!
//! ## Modules
//!
//! - [`client`]: endpoint client and CSRF policy
//! - [`render`]: fragment templates and surface patching
//! - [`widget`]: poller, interaction handler and the shared state
//! - [`config`]: TOML and environment configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use live_notify::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     let api = HttpNotificationClient::new(config.server.clone(), &config.csrf)?;
//!
//!     let surface = MemorySurface::new();
//!     let mut widget = NotificationWidget::new(Arc::new(api), config.poll, surface.clone());
//!     widget.start();
//!
//!     // Open the popover and mark the first item as read
//!     widget.interactions().open_panel(false).await?;
//!     if let Some(key) = widget.snapshot().await.items.first().and_then(|i| i.key()) {
//!         widget.interactions().toggle_read(&key).await?;
//!     }
//!
//!     println!("{:?}", surface.snapshot().badge_text());
//!     widget.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod render;
pub mod widget;

pub use client::{ApiError, CsrfPolicy, HttpNotificationClient, ListQuery, NotificationApi};

pub use config::{
    generate_default_config, Config, ConfigError, CsrfConfig, LoggingConfig, PollConfig,
    ServerConfig,
};

pub use error::{NotifyError, NotifyResult};

pub use model::{
    CountResponse, ItemId, Level, ListResponse, MarkAllResponse, NotificationBadgeState,
    NotificationItem, ToggleResponse,
};

pub use render::{BadgeView, DomSnapshot, ListView, MemorySurface, Renderer, Surface};

pub use widget::{
    ConnectionState, InteractionHandler, ListPage, NotificationWidget, PanelState, Poller,
    WidgetSnapshot,
};
