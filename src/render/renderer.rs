//! Idempotent surface patching

use super::fragment::{item_fragment, list_view, BadgeView, ListView};
use super::surface::Surface;
use crate::model::NotificationItem;

/// Patches a [`Surface`] with rendered fragments.
///
/// The renderer remembers what it last wrote and skips writes that would not
/// change anything, so repeated renders of the same data leave the surface
/// untouched.
pub struct Renderer {
    surface: Box<dyn Surface>,
    badge: Option<BadgeView>,
    list: Option<ListView>,
    panel_open: Option<bool>,
}

impl Renderer {
    pub fn new(surface: impl Surface + 'static) -> Self {
        Self {
            surface: Box::new(surface),
            badge: None,
            list: None,
            panel_open: None,
        }
    }

    /// Show `count` on the badge. Returns whether the surface was patched.
    pub fn render_badge(&mut self, count: u32) -> bool {
        self.patch_badge(BadgeView::count(count))
    }

    /// Replace the badge with the connection-lost indicator
    pub fn render_connection_lost(&mut self) -> bool {
        self.patch_badge(BadgeView::connection_lost())
    }

    fn patch_badge(&mut self, view: BadgeView) -> bool {
        if self.badge.as_ref() == Some(&view) {
            return false;
        }
        self.surface.patch_badge(&view);
        self.badge = Some(view);
        true
    }

    /// Render the full list. Returns whether the surface was patched.
    pub fn render_list(&mut self, items: &[NotificationItem]) -> bool {
        let view = list_view(items);
        if self.list.as_ref() == Some(&view) {
            return false;
        }
        self.surface.set_list(&view);
        self.list = Some(view);
        true
    }

    /// Re-render a single item already on the surface
    pub fn render_item(&mut self, item: &NotificationItem) -> bool {
        let fragment = item_fragment(item);
        let Some(ListView::Items(rendered)) = &mut self.list else {
            return false;
        };
        let Some(slot) = rendered
            .iter_mut()
            .find(|f| f.key.is_some() && f.key == fragment.key)
        else {
            return false;
        };
        if *slot == fragment {
            return false;
        }

        self.surface.replace_item(&fragment);
        *slot = fragment;
        true
    }

    pub fn set_panel_open(&mut self, open: bool) {
        if self.panel_open == Some(open) {
            return;
        }
        self.surface.set_panel_open(open);
        self.panel_open = Some(open);
    }
}
