//! Fragment templates
//!
//! Pure functions from notification data to presentational fragments. The
//! markup follows the popover template of the site's notification widget.

use super::html::{escape_attr, escape_text, safe_href};
use crate::model::NotificationItem;
use serde::Serialize;

/// Placeholder shown when the list is empty
pub const EMPTY_LIST_HTML: &str =
    r#"<li class="item px-5"><em>You have no new notifications</em></li>"#;

/// Badge text shown once the connection is considered lost
pub const CONNECTION_LOST_TEXT: &str = "!";

/// Container class present while the unread count is positive
pub const POSITIVE_CLASS: &str = "positive_count";

/// Container class present once the connection is lost
pub const DEGRADED_CLASS: &str = "connection_lost";

/// Presentational state of the unread badge
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BadgeView {
    pub text: String,
    pub positive: bool,
    pub degraded: bool,
}

impl BadgeView {
    pub fn count(count: u32) -> Self {
        Self {
            text: count.to_string(),
            positive: count > 0,
            degraded: false,
        }
    }

    pub fn connection_lost() -> Self {
        Self {
            text: CONNECTION_LOST_TEXT.to_string(),
            positive: false,
            degraded: true,
        }
    }

    /// Container classes implied by this badge
    pub fn classes(&self) -> Vec<&'static str> {
        let mut classes = Vec::new();
        if self.positive {
            classes.push(POSITIVE_CLASS);
        }
        if self.degraded {
            classes.push(DEGRADED_CLASS);
        }
        classes
    }
}

/// Rendered markup of one list item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFragment {
    /// Item key; `None` for items the server sent without identifier
    pub key: Option<String>,
    pub html: String,
}

/// Rendered content of the notification list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ListView {
    Empty,
    Items(Vec<ItemFragment>),
}

impl ListView {
    /// Full list markup
    pub fn html(&self) -> String {
        match self {
            ListView::Empty => EMPTY_LIST_HTML.to_string(),
            ListView::Items(items) => items.iter().map(|i| i.html.as_str()).collect(),
        }
    }
}

/// Render the list content for a sequence of items
pub fn list_view(items: &[NotificationItem]) -> ListView {
    if items.is_empty() {
        ListView::Empty
    } else {
        ListView::Items(items.iter().map(item_fragment).collect())
    }
}

/// Render one notification
pub fn item_fragment(item: &NotificationItem) -> ItemFragment {
    let key = item.key();
    let link = item.forward_link.as_deref().and_then(safe_href);

    let mut message = String::new();
    if let Some(actor) = &item.actor {
        message.push_str("<strong>");
        message.push_str(&escape_text(actor));
        message.push_str("</strong>");
    }
    if let Some(verb) = &item.verb {
        message.push(' ');
        message.push_str(&escape_text(verb));
    }
    if let Some(target) = &item.target {
        if let Some(action_object) = &item.action_object {
            message.push(' ');
            message.push_str(&escape_text(action_object));
            message.push_str(" on");
        }
        message.push(' ');
        match link {
            Some(href) => {
                message.push_str(&format!(
                    r#"<a href="{}">{}</a>"#,
                    escape_attr(href),
                    escape_text(target)
                ));
            }
            None => message.push_str(&escape_text(target)),
        }
    } else if let Some(action_object) = &item.action_object {
        message.push(' ');
        message.push_str(&escape_text(action_object));
    }
    if let Some(description) = item.description.as_deref().filter(|d| !d.is_empty()) {
        message.push_str(&format!(
            r#"<div class="description text-muted">{}</div>"#,
            escape_text(description)
        ));
    }
    if let Some(age) = item.age() {
        message.push_str(r#"<div class="meta">"#);
        if let Some(href) = link {
            message.push_str(&format!(
                r#"<a href="{}">Direct link</a> &middot; "#,
                escape_attr(href)
            ));
        }
        message.push_str(&format!(
            r#"<span class="text-muted">{}</span></div>"#,
            escape_text(&age)
        ));
    }

    let mut actions = String::new();
    if let Some(key) = &key {
        let (icon, title) = if item.unread {
            ("fa-circle", "Mark as read")
        } else {
            ("fa-circle-o", "Mark as unread")
        };
        actions.push_str(&format!(
            r#"<a href="javascript:;" class="mark-toggle" data-slug="{}"><i class="fa {}" data-toggle="tooltip" data-placement="auto" title="{}" aria-hidden="true"></i></a>"#,
            escape_attr(key),
            icon,
            title
        ));
    }
    if let Some(href) = link {
        actions.push_str(&format!(
            r#"<br><a href="{}" data-toggle="tooltip" data-placement="auto" title="Go to item"><i class="fa fa-share" aria-hidden="true"></i></a>"#,
            escape_attr(href)
        ));
    }

    let mut class = String::from("item");
    if item.unread {
        class.push_str(" active");
    }
    if let Some(level) = item.level.and_then(|l| l.css_class()) {
        class.push(' ');
        class.push_str(level);
    }

    let mut attrs = format!(r#" class="{}""#, class);
    if let Some(key) = &key {
        attrs.push_str(&format!(r#" data-slug="{}""#, escape_attr(key)));
    }
    if let Some(href) = link {
        attrs.push_str(&format!(r#" href="{}""#, escape_attr(href)));
    }

    ItemFragment {
        html: format!(
            r#"<li{}><div>{}</div><div class="actions">{}</div></li>"#,
            attrs, message, actions
        ),
        key,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ItemId, Level};

    fn item(slug: &str, unread: bool) -> NotificationItem {
        NotificationItem {
            id: Some(ItemId::Number(1)),
            slug: Some(slug.to_string()),
            actor: Some("Jane Doe".to_string()),
            verb: Some("submitted a report on".to_string()),
            target: Some("Submission 2101.00001v1".to_string()),
            timesince: Some("2 hours".to_string()),
            unread,
            ..Default::default()
        }
    }

    #[test]
    fn test_badge_views() {
        let zero = BadgeView::count(0);
        assert_eq!(zero.text, "0");
        assert!(zero.classes().is_empty());

        let three = BadgeView::count(3);
        assert_eq!(three.text, "3");
        assert_eq!(three.classes(), vec![POSITIVE_CLASS]);

        let lost = BadgeView::connection_lost();
        assert_eq!(lost.text, "!");
        assert_eq!(lost.classes(), vec![DEGRADED_CLASS]);
    }

    #[test]
    fn test_empty_list_placeholder() {
        let view = list_view(&[]);
        assert_eq!(view, ListView::Empty);
        assert_eq!(view.html(), EMPTY_LIST_HTML);
    }

    #[test]
    fn test_target_link_only_with_forward_link() {
        let mut linked = item("a1", true);
        linked.forward_link = Some("/notifications/forward/a1/".to_string());
        let plain = item("b2", false);

        let view = list_view(&[linked, plain]);
        let ListView::Items(fragments) = view else {
            panic!("expected items");
        };

        assert!(fragments[0]
            .html
            .contains(r#"<a href="/notifications/forward/a1/">Submission 2101.00001v1</a>"#));
        assert!(fragments[0].html.contains("Direct link"));

        assert!(fragments[1].html.contains(" Submission 2101.00001v1<div"));
        assert!(!fragments[1].html.contains("Direct link"));
        assert!(!fragments[1].html.contains("fa-share"));
    }

    #[test]
    fn test_unread_state_markup() {
        let unread = item_fragment(&item("a1", true));
        assert!(unread.html.starts_with(r#"<li class="item active" data-slug="a1">"#));
        assert!(unread.html.contains("fa-circle\""));
        assert!(unread.html.contains("Mark as read"));

        let read = item_fragment(&item("a1", false));
        assert!(read.html.starts_with(r#"<li class="item" data-slug="a1">"#));
        assert!(read.html.contains("fa-circle-o"));
        assert!(read.html.contains("Mark as unread"));
    }

    #[test]
    fn test_untrusted_fields_are_escaped() {
        let hostile = NotificationItem {
            slug: Some(r#"x" onclick="evil()"#.to_string()),
            actor: Some("<img src=x onerror=alert(1)>".to_string()),
            verb: Some("<b>shouted</b>".to_string()),
            target: Some("</li><script>steal()</script>".to_string()),
            forward_link: Some("javascript:steal()".to_string()),
            unread: true,
            ..Default::default()
        };

        let html = item_fragment(&hostile).html;
        assert!(!html.contains("<img"));
        assert!(!html.contains("<script>"));
        assert!(!html.contains("<b>"));
        assert!(!html.contains("javascript:steal"));
        assert!(html.contains("&lt;img src=x onerror=alert(1)&gt;"));
        assert!(html.contains(r#"data-slug="x&quot; onclick=&quot;evil()""#));
    }

    #[test]
    fn test_action_object_and_level() {
        let mut n = item("c3", false);
        n.action_object = Some("Report 4".to_string());
        n.level = Some(Level::Warning);

        let html = item_fragment(&n).html;
        assert!(html.contains("submitted a report on Report 4 on Submission 2101.00001v1"));
        assert!(html.starts_with(r#"<li class="item level-warning""#));
    }

    #[test]
    fn test_description_line() {
        let mut n = item("d4", true);
        n.description = Some("Deadline in <3> days".to_string());

        let html = item_fragment(&n).html;
        assert!(html.contains(
            r#"Submission 2101.00001v1<div class="description text-muted">Deadline in &lt;3&gt; days</div><div class="meta">"#
        ));

        n.description = Some(String::new());
        assert!(!item_fragment(&n).html.contains("description"));
    }

    #[test]
    fn test_item_without_key_has_no_toggle() {
        let n = NotificationItem {
            verb: Some("System maintenance tonight".to_string()),
            ..Default::default()
        };
        let fragment = item_fragment(&n);
        assert!(fragment.key.is_none());
        assert!(!fragment.html.contains("mark-toggle"));
        assert_eq!(
            fragment.html,
            r#"<li class="item"><div> System maintenance tonight</div><div class="actions"></div></li>"#
        );
    }
}
