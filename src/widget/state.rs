//! Instance-scoped widget state
//!
//! One [`WidgetState`] exists per widget. It owns the badge count, the cached
//! list, the panel state machine, the failure counter and the sequencing
//! data used to discard stale responses.

use crate::error::{NotifyError, NotifyResult};
use crate::model::{NotificationBadgeState, NotificationItem};
use crate::render::Renderer;
use serde::Serialize;

/// Popover state machine: Closed → Opening → Open → Closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PanelState {
    Closed,
    /// List fetch in flight
    Opening,
    Open,
}

/// Whether the widget still talks to the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConnectionState {
    Live,
    /// Failure threshold reached; nothing is fetched until the page reloads
    Lost,
}

/// Sequence number and mutation epoch captured when a request is issued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Ticket {
    seq: u64,
    epoch: u64,
}

/// Local mutation that a list response issued earlier does not know about
#[derive(Debug, Clone, PartialEq, Eq)]
enum Override {
    Toggle { key: String, unread: bool },
    MarkAll,
}

/// Read-only copy of the widget state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WidgetSnapshot {
    pub badge: NotificationBadgeState,
    pub items: Vec<NotificationItem>,
    pub panel: PanelState,
    pub connection: ConnectionState,
    pub consecutive_failures: u32,
    pub list_loaded: bool,
}

#[derive(Debug)]
pub(crate) struct WidgetState {
    pub(crate) badge: NotificationBadgeState,
    pub(crate) items: Vec<NotificationItem>,
    pub(crate) panel: PanelState,
    pub(crate) connection: ConnectionState,
    pub(crate) consecutive_failures: u32,
    /// Cached items are valid for reuse on the next open
    pub(crate) list_loaded: bool,
    count_seq: u64,
    list_seq: u64,
    epoch: u64,
    /// List requests issued but not yet applied or discarded
    pending_lists: Vec<Ticket>,
    overrides: Vec<(u64, Override)>,
}

impl WidgetState {
    pub(crate) fn new() -> Self {
        Self {
            badge: NotificationBadgeState::default(),
            items: Vec::new(),
            panel: PanelState::Closed,
            connection: ConnectionState::Live,
            consecutive_failures: 0,
            list_loaded: false,
            count_seq: 0,
            list_seq: 0,
            epoch: 0,
            pending_lists: Vec::new(),
            overrides: Vec::new(),
        }
    }

    pub(crate) fn ensure_live(&self) -> NotifyResult<()> {
        match self.connection {
            ConnectionState::Live => Ok(()),
            ConnectionState::Lost => Err(NotifyError::ConnectionLost {
                failures: self.consecutive_failures,
            }),
        }
    }

    pub(crate) fn issue_count(&mut self) -> Ticket {
        self.count_seq += 1;
        Ticket {
            seq: self.count_seq,
            epoch: self.epoch,
        }
    }

    /// A count is applied only if it is the latest issued and no local
    /// mutation happened while it was in flight.
    pub(crate) fn count_is_current(&self, ticket: Ticket) -> bool {
        ticket.seq == self.count_seq && ticket.epoch == self.epoch
    }

    pub(crate) fn issue_list(&mut self) -> Ticket {
        self.list_seq += 1;
        let ticket = Ticket {
            seq: self.list_seq,
            epoch: self.epoch,
        };
        self.pending_lists.push(ticket);
        ticket
    }

    /// Forget a list request that failed, was discarded or was applied
    pub(crate) fn settle_list(&mut self, ticket: Ticket) {
        self.pending_lists.retain(|pending| pending.seq != ticket.seq);
        self.prune_overrides();
    }

    /// Keep only overrides some pending list was issued before
    fn prune_overrides(&mut self) {
        match self.pending_lists.iter().map(|t| t.epoch).min() {
            Some(oldest) => self.overrides.retain(|(epoch, _)| *epoch > oldest),
            None => self.overrides.clear(),
        }
    }

    pub(crate) fn list_is_current(&self, ticket: Ticket) -> bool {
        ticket.seq == self.list_seq
    }

    /// Whether a server-reported count issued with `ticket` may replace the
    /// local count
    pub(crate) fn no_mutation_since(&self, ticket: Ticket) -> bool {
        ticket.epoch == self.epoch
    }

    pub(crate) fn record_success(&mut self) {
        self.consecutive_failures = 0;
    }

    /// Count a failed fetch. Returns true when this failure crossed the
    /// threshold.
    pub(crate) fn record_failure(&mut self, threshold: u32) -> bool {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        if self.connection == ConnectionState::Live && self.consecutive_failures >= threshold {
            self.connection = ConnectionState::Lost;
            return true;
        }
        false
    }

    /// Store a fetched page. With `append`, only items not already cached
    /// are added. Returns the number of items added or replaced.
    pub(crate) fn apply_list(
        &mut self,
        ticket: Ticket,
        mut items: Vec<NotificationItem>,
        append: bool,
    ) -> usize {
        for (epoch, change) in &self.overrides {
            if *epoch > ticket.epoch {
                apply_override(&mut items, change);
            }
        }
        self.settle_list(ticket);

        let added = if append {
            let before = self.items.len();
            for item in items {
                let known = item.key().is_some()
                    && self.items.iter().any(|cached| cached.key() == item.key());
                if !known {
                    self.items.push(item);
                }
            }
            self.items.len() - before
        } else {
            let count = items.len();
            self.items = items;
            count
        };

        self.list_loaded = true;
        added
    }

    /// Record a successful toggle. `server_unread` is the state reported by
    /// the server, if any. Returns the updated item when it is cached.
    pub(crate) fn apply_toggle(
        &mut self,
        key: &str,
        server_unread: Option<bool>,
    ) -> Option<NotificationItem> {
        self.epoch += 1;

        let cached = self
            .items
            .iter_mut()
            .find(|item| item.key().as_deref() == Some(key));

        let Some(item) = cached else {
            if let Some(unread) = server_unread {
                self.overrides.push((
                    self.epoch,
                    Override::Toggle {
                        key: key.to_string(),
                        unread,
                    },
                ));
                self.prune_overrides();
            }
            return None;
        };

        let was_unread = item.unread;
        let unread = server_unread.unwrap_or(!was_unread);
        item.unread = unread;
        let updated = item.clone();

        match (was_unread, unread) {
            (true, false) => {
                self.badge.unread_count = self.badge.unread_count.saturating_sub(1);
            }
            (false, true) => {
                self.badge.unread_count = self.badge.unread_count.saturating_add(1);
            }
            _ => {}
        }

        self.overrides.push((
            self.epoch,
            Override::Toggle {
                key: key.to_string(),
                unread,
            },
        ));
        self.prune_overrides();
        Some(updated)
    }

    /// Record a successful mark-all
    pub(crate) fn apply_mark_all(&mut self) {
        self.epoch += 1;
        apply_override(&mut self.items, &Override::MarkAll);
        self.badge.unread_count = 0;
        self.overrides.push((self.epoch, Override::MarkAll));
        self.prune_overrides();
    }

    pub(crate) fn snapshot(&self) -> WidgetSnapshot {
        WidgetSnapshot {
            badge: self.badge,
            items: self.items.clone(),
            panel: self.panel,
            connection: self.connection,
            consecutive_failures: self.consecutive_failures,
            list_loaded: self.list_loaded,
        }
    }
}

fn apply_override(items: &mut [NotificationItem], change: &Override) {
    match change {
        Override::Toggle { key, unread } => {
            if let Some(item) = items
                .iter_mut()
                .find(|item| item.key().as_deref() == Some(key.as_str()))
            {
                item.unread = *unread;
            }
        }
        Override::MarkAll => {
            for item in items.iter_mut() {
                item.unread = false;
            }
        }
    }
}

/// State and renderer, guarded together by the widget lock
pub(crate) struct WidgetView {
    pub(crate) state: WidgetState,
    pub(crate) renderer: Renderer,
}

impl WidgetView {
    pub(crate) fn new(renderer: Renderer) -> Self {
        Self {
            state: WidgetState::new(),
            renderer,
        }
    }

    /// Render the current count unless the badge shows connection lost
    pub(crate) fn render_badge(&mut self) {
        if self.state.connection == ConnectionState::Live {
            self.renderer.render_badge(self.state.badge.unread_count);
        }
    }

    /// Count a failed fetch and degrade the badge once the threshold is hit
    pub(crate) fn record_failure(&mut self, threshold: u32, err: &NotifyError) {
        if !err.counts_as_failure() {
            return;
        }
        if self.state.record_failure(threshold) {
            tracing::warn!(
                failures = self.state.consecutive_failures,
                error = %err,
                "Notification server unreachable, showing connection lost"
            );
            self.renderer.render_connection_lost();
        } else {
            tracing::debug!(
                failures = self.state.consecutive_failures,
                error = %err,
                "Notification fetch failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(slug: &str, unread: bool) -> NotificationItem {
        NotificationItem {
            slug: Some(slug.to_string()),
            unread,
            ..Default::default()
        }
    }

    #[test]
    fn test_failure_threshold() {
        let mut state = WidgetState::new();
        for _ in 0..9 {
            assert!(!state.record_failure(10));
        }
        assert!(state.ensure_live().is_ok());

        assert!(state.record_failure(10));
        assert_eq!(state.connection, ConnectionState::Lost);
        assert!(matches!(
            state.ensure_live(),
            Err(NotifyError::ConnectionLost { failures: 10 })
        ));

        // Only the crossing failure reports a transition
        assert!(!state.record_failure(10));
    }

    #[test]
    fn test_success_resets_failures() {
        let mut state = WidgetState::new();
        state.record_failure(10);
        state.record_failure(10);
        state.record_success();
        assert_eq!(state.consecutive_failures, 0);
    }

    #[test]
    fn test_only_latest_count_is_current() {
        let mut state = WidgetState::new();
        let first = state.issue_count();
        let second = state.issue_count();
        assert!(!state.count_is_current(first));
        assert!(state.count_is_current(second));

        state.apply_mark_all();
        assert!(!state.count_is_current(second));
    }

    #[test]
    fn test_toggle_flips_only_that_item() {
        let mut state = WidgetState::new();
        let ticket = state.issue_list();
        state.apply_list(
            ticket,
            vec![item("a", true), item("b", true), item("c", false)],
            false,
        );
        state.badge.unread_count = 2;

        let updated = state.apply_toggle("b", None).unwrap();
        assert!(!updated.unread);
        assert!(state.items[0].unread);
        assert!(!state.items[1].unread);
        assert!(!state.items[2].unread);
        assert_eq!(state.badge.unread_count, 1);
    }

    #[test]
    fn test_server_reported_state_wins() {
        let mut state = WidgetState::new();
        let ticket = state.issue_list();
        state.apply_list(ticket, vec![item("a", true)], false);

        // Server says it is still unread
        let updated = state.apply_toggle("a", Some(true)).unwrap();
        assert!(updated.unread);
    }

    #[test]
    fn test_toggle_survives_racing_list() {
        let mut state = WidgetState::new();
        let ticket = state.issue_list();

        // Toggle lands while the list is in flight
        state.apply_toggle("a", Some(false));

        state.apply_list(ticket, vec![item("a", true), item("b", true)], false);
        assert!(!state.items[0].unread);
        assert!(state.items[1].unread);

        // A list issued after the toggle is taken as-is
        let later = state.issue_list();
        state.apply_list(later, vec![item("a", true)], false);
        assert!(state.items[0].unread);
    }

    #[test]
    fn test_append_skips_known_items() {
        let mut state = WidgetState::new();
        let ticket = state.issue_list();
        state.apply_list(ticket, vec![item("a", false), item("b", false)], false);

        let ticket = state.issue_list();
        let added = state.apply_list(ticket, vec![item("b", false), item("c", true)], true);
        assert_eq!(added, 1);
        assert_eq!(state.items.len(), 3);
        assert_eq!(state.items[2].key().as_deref(), Some("c"));
    }

    #[test]
    fn test_overrides_kept_only_while_a_list_is_pending() {
        let mut state = WidgetState::new();

        // No list in flight: nothing to protect
        for n in 0..100 {
            state.apply_toggle(&format!("k{}", n), Some(false));
        }
        state.apply_mark_all();
        assert!(state.overrides.is_empty());

        let first = state.issue_list();
        state.apply_toggle("a", Some(false));
        let second = state.issue_list();
        state.apply_toggle("b", Some(false));
        assert_eq!(state.overrides.len(), 2);

        // The older list failed; only the change after the newer one remains
        state.settle_list(first);
        assert_eq!(state.overrides.len(), 1);

        state.apply_list(second, vec![item("a", true), item("b", true)], false);
        assert!(state.items[0].unread);
        assert!(!state.items[1].unread);
        assert!(state.overrides.is_empty());
        assert!(state.pending_lists.is_empty());
    }

    #[test]
    fn test_user_action_failure_not_counted() {
        let mut view = WidgetView::new(Renderer::new(crate::render::MemorySurface::new()));
        let err = NotifyError::UserAction {
            action: "toggle read",
            source: crate::client::ApiError::Timeout,
        };
        for _ in 0..3 {
            view.record_failure(2, &err);
        }
        assert_eq!(view.state.consecutive_failures, 0);
        assert_eq!(view.state.connection, ConnectionState::Live);

        let err = NotifyError::from_fetch(crate::client::ApiError::Unavailable);
        view.record_failure(2, &err);
        view.record_failure(2, &err);
        assert_eq!(view.state.connection, ConnectionState::Lost);
    }

    #[test]
    fn test_mark_all() {
        let mut state = WidgetState::new();
        let ticket = state.issue_list();
        state.apply_list(ticket, vec![item("a", true), item("b", true)], false);
        state.badge.unread_count = 2;

        state.apply_mark_all();
        assert!(state.items.iter().all(|i| !i.unread));
        assert_eq!(state.badge.unread_count, 0);
    }
}
