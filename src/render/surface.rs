//! Rendering surfaces
//!
//! A [`Surface`] is the part of the page the widget owns: the badge, the
//! popover list and the popover visibility. The renderer only ever talks to
//! the page through this trait.

use super::fragment::{BadgeView, ItemFragment, ListView};
use serde::Serialize;
use std::sync::{Arc, Mutex};

/// Page region patched by the renderer
pub trait Surface: Send {
    /// Replace badge text and container classes
    fn patch_badge(&mut self, badge: &BadgeView);

    /// Replace the whole list content
    fn set_list(&mut self, list: &ListView);

    /// Replace a single item in place, matched by key
    fn replace_item(&mut self, item: &ItemFragment);

    /// Show or hide the popover
    fn set_panel_open(&mut self, open: bool);
}

/// Point-in-time copy of a [`MemorySurface`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomSnapshot {
    pub badge: Option<BadgeView>,
    pub list: Option<ListView>,
    pub panel_open: bool,
    /// Number of mutations applied so far
    pub writes: u64,
}

impl DomSnapshot {
    pub fn badge_text(&self) -> Option<&str> {
        self.badge.as_ref().map(|b| b.text.as_str())
    }

    pub fn list_html(&self) -> Option<String> {
        self.list.as_ref().map(ListView::html)
    }

    /// Markup of one item, by key
    pub fn item_html(&self, key: &str) -> Option<&str> {
        match &self.list {
            Some(ListView::Items(items)) => items
                .iter()
                .find(|i| i.key.as_deref() == Some(key))
                .map(|i| i.html.as_str()),
            _ => None,
        }
    }
}

/// In-memory page model.
///
/// Clones share the same underlying state, so a caller can keep a handle
/// while the widget owns another.
#[derive(Debug, Clone)]
pub struct MemorySurface {
    dom: Arc<Mutex<DomSnapshot>>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self {
            dom: Arc::new(Mutex::new(DomSnapshot {
                badge: None,
                list: None,
                panel_open: false,
                writes: 0,
            })),
        }
    }

    pub fn snapshot(&self) -> DomSnapshot {
        self.with_dom(|dom| dom.clone())
    }

    fn with_dom<R>(&self, f: impl FnOnce(&mut DomSnapshot) -> R) -> R {
        let mut dom = match self.dom.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut dom)
    }
}

impl Default for MemorySurface {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface for MemorySurface {
    fn patch_badge(&mut self, badge: &BadgeView) {
        self.with_dom(|dom| {
            dom.badge = Some(badge.clone());
            dom.writes += 1;
        });
    }

    fn set_list(&mut self, list: &ListView) {
        self.with_dom(|dom| {
            dom.list = Some(list.clone());
            dom.writes += 1;
        });
    }

    fn replace_item(&mut self, item: &ItemFragment) {
        self.with_dom(|dom| {
            if let Some(ListView::Items(items)) = &mut dom.list {
                if let Some(slot) = items.iter_mut().find(|i| i.key == item.key) {
                    *slot = item.clone();
                    dom.writes += 1;
                }
            }
        });
    }

    fn set_panel_open(&mut self, open: bool) {
        self.with_dom(|dom| {
            dom.panel_open = open;
            dom.writes += 1;
        });
    }
}
