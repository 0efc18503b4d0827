//! Notification Widget
//!
//! Ties the poller, the renderer and the interaction handler to one
//! instance-scoped state object.
//!
//! ## Lifecycle
//!
//! 1. [`NotificationWidget::new`] builds the shared context for one page view
//! 2. [`NotificationWidget::start`] spawns the polling loop
//! 3. Gestures go through [`NotificationWidget::interactions`]
//! 4. [`NotificationWidget::shutdown`] stops polling and waits for the loop

mod interaction;
mod poller;
mod state;

pub use interaction::InteractionHandler;
pub use poller::{ListPage, Poller};
pub use state::{ConnectionState, PanelState, WidgetSnapshot};

use crate::client::NotificationApi;
use crate::config::PollConfig;
use crate::render::{Renderer, Surface};
use state::WidgetView;
use std::sync::Arc;
use tokio::sync::{watch, Mutex, Notify};
use tokio::task::JoinHandle;

/// Shared state of one widget instance
pub(crate) struct WidgetContext {
    pub(crate) api: Arc<dyn NotificationApi>,
    pub(crate) config: PollConfig,
    pub(crate) view: Mutex<WidgetView>,
    /// Wakes the poll loop for an immediate cycle
    pub(crate) refresh: Notify,
}

impl WidgetContext {
    pub(crate) async fn is_connection_lost(&self) -> bool {
        self.view.lock().await.state.connection == ConnectionState::Lost
    }
}

/// A live notification badge and panel bound to one surface
pub struct NotificationWidget {
    ctx: Arc<WidgetContext>,
    poller: Arc<Poller>,
    interactions: InteractionHandler,
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl NotificationWidget {
    /// Create a widget; nothing is fetched until [`start`](Self::start) or
    /// an explicit call.
    pub fn new(
        api: Arc<dyn NotificationApi>,
        config: PollConfig,
        surface: impl Surface + 'static,
    ) -> Self {
        let ctx = Arc::new(WidgetContext {
            api,
            config,
            view: Mutex::new(WidgetView::new(Renderer::new(surface))),
            refresh: Notify::new(),
        });
        let poller = Arc::new(Poller::new(Arc::clone(&ctx)));
        let interactions = InteractionHandler::new(Arc::clone(&ctx), Arc::clone(&poller));
        let (shutdown, _) = watch::channel(false);

        Self {
            ctx,
            poller,
            interactions,
            shutdown,
            task: None,
        }
    }

    /// Start the background polling loop
    pub fn start(&mut self) {
        if self.task.is_some() {
            tracing::warn!("Notification widget already started");
            return;
        }
        let handle = Arc::clone(&self.poller).start(self.shutdown.subscribe());
        self.task = Some(handle);
    }

    /// Whether the polling loop is still alive
    pub fn is_polling(&self) -> bool {
        self.task
            .as_ref()
            .map(|task| !task.is_finished())
            .unwrap_or(false)
    }

    pub fn poller(&self) -> &Poller {
        &self.poller
    }

    pub fn interactions(&self) -> &InteractionHandler {
        &self.interactions
    }

    pub fn config(&self) -> &PollConfig {
        &self.ctx.config
    }

    /// Ask the polling loop for an immediate count refresh
    pub fn request_refresh(&self) {
        self.ctx.refresh.notify_one();
    }

    pub async fn snapshot(&self) -> WidgetSnapshot {
        self.ctx.view.lock().await.state.snapshot()
    }

    /// Stop polling and wait for the loop to exit
    pub async fn shutdown(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Notification poller ended abnormally");
            }
        }
        tracing::debug!("Notification widget shut down");
    }
}

impl Drop for NotificationWidget {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
