//! Poller
//!
//! Fetches the unread count on a fixed-delay timer and fetches list pages on
//! demand. A new count cycle is armed only after the previous one settled,
//! so fetches never overlap.

use super::state::Ticket;
use super::WidgetContext;
use crate::client::ListQuery;
use crate::error::{NotifyError, NotifyResult};
use crate::model::NotificationItem;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// One fetched list page
#[derive(Debug, Clone)]
pub struct ListPage {
    pub(crate) ticket: Ticket,
    pub offset: usize,
    pub items: Vec<NotificationItem>,
    /// Unread count reported alongside the page, if any
    pub unread_count: Option<u32>,
}

/// Periodic count fetcher and list page fetcher
pub struct Poller {
    ctx: Arc<WidgetContext>,
}

impl Poller {
    pub(crate) fn new(ctx: Arc<WidgetContext>) -> Self {
        Self { ctx }
    }

    /// Fetch the unread count and update the badge.
    ///
    /// Returns the count reported by the server. A count whose request was
    /// superseded, or that raced a local mutation, is returned but not
    /// rendered.
    pub async fn fetch_count(&self) -> NotifyResult<u32> {
        let ticket = {
            let mut view = self.ctx.view.lock().await;
            view.state.ensure_live()?;
            view.state.issue_count()
        };

        let result = self.ctx.api.unread_count(self.ctx.config.max_items).await;

        let mut view = self.ctx.view.lock().await;
        match result {
            Ok(response) => {
                view.state.record_success();
                if view.state.count_is_current(ticket) {
                    view.state.badge.unread_count = response.unread_count;
                    view.render_badge();
                } else {
                    tracing::debug!(
                        unread = response.unread_count,
                        "Discarding stale unread count"
                    );
                }
                Ok(response.unread_count)
            }
            Err(e) => {
                let err = NotifyError::from_fetch(e);
                view.record_failure(self.ctx.config.failure_threshold, &err);
                Err(err)
            }
        }
    }

    /// Fetch one list page starting at `offset`.
    ///
    /// The page is not applied to the widget; the interaction handler does
    /// that once it knows the page is still the latest one issued.
    pub async fn fetch_list(&self, offset: usize) -> NotifyResult<ListPage> {
        let page = self.fetch_list_ticketed(offset).await.1?;
        self.ctx.view.lock().await.state.settle_list(page.ticket);
        Ok(page)
    }

    pub(crate) async fn fetch_list_ticketed(
        &self,
        offset: usize,
    ) -> (Option<Ticket>, NotifyResult<ListPage>) {
        let ticket = {
            let mut view = self.ctx.view.lock().await;
            if let Err(e) = view.state.ensure_live() {
                return (None, Err(e));
            }
            view.state.issue_list()
        };

        let query = ListQuery {
            offset,
            max: self.ctx.config.max_items,
            mark_as_read: self.ctx.config.mark_as_read_on_open,
        };
        let result = self.ctx.api.list(query).await;

        let mut view = self.ctx.view.lock().await;
        let page = match result {
            Ok(response) => {
                view.state.record_success();
                tracing::debug!(
                    offset,
                    items = response.list.len(),
                    "Fetched notification page"
                );
                Ok(ListPage {
                    ticket,
                    offset,
                    items: response.list,
                    unread_count: response.unread_count,
                })
            }
            Err(e) => {
                view.state.settle_list(ticket);
                let err = NotifyError::from_fetch(e);
                view.record_failure(self.ctx.config.failure_threshold, &err);
                Err(err)
            }
        };

        (Some(ticket), page)
    }

    /// Spawn the polling loop.
    ///
    /// The first cycle runs immediately. After each cycle the loop waits for
    /// the refresh period, a refresh request, or shutdown. It exits for good
    /// once the connection is lost.
    pub(crate) fn start(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        let period = self.ctx.config.refresh_period();

        tracing::info!(
            period_ms = self.ctx.config.refresh_period_ms,
            failure_threshold = self.ctx.config.failure_threshold,
            "Starting notification poller"
        );

        tokio::spawn(async move {
            loop {
                if *shutdown.borrow() {
                    break;
                }

                match self.fetch_count().await {
                    Ok(count) => tracing::debug!(unread = count, "Unread count refreshed"),
                    Err(NotifyError::ConnectionLost { .. }) => break,
                    Err(_) => {}
                }

                if self.ctx.is_connection_lost().await {
                    tracing::warn!("Notification polling stopped, reload required");
                    break;
                }

                tokio::select! {
                    _ = tokio::time::sleep(period) => {}
                    _ = self.ctx.refresh.notified() => {
                        tracing::debug!("Refresh requested");
                    }
                    _ = shutdown.changed() => break,
                }
            }

            tracing::debug!("Notification poller exited");
        })
    }
}
