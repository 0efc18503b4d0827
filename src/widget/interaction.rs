//! Interaction Handler
//!
//! Turns user gestures into server calls and local updates. Failed user
//! actions never change what is shown.

use super::poller::Poller;
use super::state::PanelState;
use super::WidgetContext;
use crate::error::{NotifyError, NotifyResult};
use std::sync::Arc;

/// Handles panel, toggle and mark-all gestures
pub struct InteractionHandler {
    ctx: Arc<WidgetContext>,
    poller: Arc<Poller>,
}

impl InteractionHandler {
    pub(crate) fn new(ctx: Arc<WidgetContext>, poller: Arc<Poller>) -> Self {
        Self { ctx, poller }
    }

    /// Open the notification panel.
    ///
    /// The list is fetched on the first open only; later opens reuse the
    /// cached items unless `force` is set or the list was invalidated.
    /// Opening while already open or opening is a no-op unless forced.
    pub async fn open_panel(&self, force: bool) -> NotifyResult<PanelState> {
        {
            let mut view = self.ctx.view.lock().await;
            view.state.ensure_live()?;

            match view.state.panel {
                PanelState::Open | PanelState::Opening if !force => {
                    return Ok(view.state.panel);
                }
                PanelState::Closed if !force && view.state.list_loaded => {
                    view.state.panel = PanelState::Open;
                    view.renderer.set_panel_open(true);
                    return Ok(PanelState::Open);
                }
                _ => {}
            }

            view.state.panel = PanelState::Opening;
        }

        let (ticket, result) = self.poller.fetch_list_ticketed(0).await;

        let mut view = self.ctx.view.lock().await;
        if let Some(ticket) = ticket {
            if !view.state.list_is_current(ticket) {
                tracing::debug!("Discarding superseded notification list");
                view.state.settle_list(ticket);
                // Show cached items; without any, the newest fetch settles the panel
                if view.state.panel == PanelState::Opening && view.state.list_loaded {
                    view.state.panel = PanelState::Open;
                    view.renderer.set_panel_open(true);
                }
                return Ok(view.state.panel);
            }
        }

        match result {
            Ok(page) => {
                view.state.apply_list(page.ticket, page.items, false);
                let view = &mut *view;
                view.renderer.render_list(&view.state.items);

                if let Some(count) = page.unread_count {
                    if view.state.no_mutation_since(page.ticket) {
                        view.state.badge.unread_count = count;
                        view.render_badge();
                    }
                }

                // Closed while the fetch was in flight: keep the items, stay closed
                if view.state.panel == PanelState::Opening {
                    view.state.panel = PanelState::Open;
                    view.renderer.set_panel_open(true);
                }
                Ok(view.state.panel)
            }
            Err(e) => {
                if view.state.panel == PanelState::Opening {
                    view.state.panel = PanelState::Closed;
                    view.renderer.set_panel_open(false);
                }
                tracing::warn!(error = %e, "Failed to load notifications");
                Err(e)
            }
        }
    }

    /// Close the notification panel, keeping the cached items
    pub async fn close_panel(&self) {
        let mut view = self.ctx.view.lock().await;
        view.state.panel = PanelState::Closed;
        view.renderer.set_panel_open(false);
    }

    /// Force the next open to fetch the list again
    pub async fn invalidate_list(&self) {
        let mut view = self.ctx.view.lock().await;
        view.state.list_loaded = false;
    }

    /// Fetch the next page and append it. Returns the number of new items.
    ///
    /// Does nothing while the panel is opening; the first page is still in
    /// flight.
    pub async fn load_more(&self) -> NotifyResult<usize> {
        let offset = {
            let view = self.ctx.view.lock().await;
            view.state.ensure_live()?;
            if view.state.panel == PanelState::Opening {
                tracing::debug!("Panel still opening, not loading more");
                return Ok(0);
            }
            view.state.items.len()
        };

        let (_, result) = self.poller.fetch_list_ticketed(offset).await;
        let page = result?;

        let mut view = self.ctx.view.lock().await;
        if !view.state.list_is_current(page.ticket) {
            tracing::debug!(offset, "Discarding superseded notification page");
            view.state.settle_list(page.ticket);
            return Ok(0);
        }

        let added = view.state.apply_list(page.ticket, page.items, true);
        let view = &mut *view;
        view.renderer.render_list(&view.state.items);
        Ok(added)
    }

    /// Flip the read state of one notification.
    ///
    /// Returns the new unread state, or `None` when the item is not cached
    /// and the server did not report it.
    pub async fn toggle_read(&self, key: &str) -> NotifyResult<Option<bool>> {
        {
            let view = self.ctx.view.lock().await;
            view.state.ensure_live()?;
        }

        let response = match self.ctx.api.toggle(key).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Toggle read failed");
                return Err(NotifyError::UserAction {
                    action: "toggle read",
                    source: e,
                });
            }
        };

        let unread = {
            let mut view = self.ctx.view.lock().await;
            match view.state.apply_toggle(key, response.unread) {
                Some(item) => {
                    view.renderer.render_item(&item);
                    view.render_badge();
                    Some(item.unread)
                }
                None => response.unread,
            }
        };

        tracing::debug!(key = %key, unread = ?unread, "Notification toggled");
        // Reconcile the badge with the server on the next cycle
        self.ctx.refresh.notify_one();
        Ok(unread)
    }

    /// Mark every notification as read
    pub async fn mark_all_read(&self) -> NotifyResult<()> {
        {
            let view = self.ctx.view.lock().await;
            view.state.ensure_live()?;
        }

        if let Err(e) = self.ctx.api.mark_all_read().await {
            tracing::warn!(error = %e, "Mark all read failed");
            return Err(NotifyError::UserAction {
                action: "mark all read",
                source: e,
            });
        }

        let mut view = self.ctx.view.lock().await;
        view.state.apply_mark_all();
        if view.state.list_loaded {
            let view = &mut *view;
            view.renderer.render_list(&view.state.items);
        }
        view.render_badge();

        tracing::debug!("All notifications marked as read");
        Ok(())
    }
}
