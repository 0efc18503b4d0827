//! Notification Rendering
//!
//! Turns fetched notification data into HTML fragments and patches them
//! onto a [`Surface`].
//!
//! ## Architecture
//!
//! - **html**: escaping of untrusted text and link sanitizing
//! - **fragment**: pure templates for the badge and list items
//! - **surface**: the page region the widget owns, plus an in-memory model
//! - **renderer**: idempotent patching of a surface

mod fragment;
mod html;
mod renderer;
mod surface;

pub use fragment::{
    item_fragment, list_view, BadgeView, ItemFragment, ListView, CONNECTION_LOST_TEXT,
    DEGRADED_CLASS, EMPTY_LIST_HTML, POSITIVE_CLASS,
};
pub use html::{escape_attr, escape_text, safe_href};
pub use renderer::Renderer;
pub use surface::{DomSnapshot, MemorySurface, Surface};
