//! HTML escaping
//!
//! Every notification field originates from user-controlled data and goes
//! through these helpers before it reaches a fragment.

/// Escape text content
pub fn escape_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape a value placed inside a quoted attribute
pub fn escape_attr(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '`' => out.push_str("&#x60;"),
            _ => out.push(c),
        }
    }
    out
}

/// Return the link when it is safe to use as an `href`.
///
/// Relative links and http(s) links pass. Anything carrying another scheme
/// (`javascript:`, `data:`, ...) is rejected.
pub fn safe_href(link: &str) -> Option<&str> {
    let trimmed = link.trim();
    if trimmed.is_empty() {
        return None;
    }

    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return Some(trimmed);
    }

    // A scheme is anything before the first ':' that precedes any '/', '?' or '#'
    let scheme_end = trimmed.find(':');
    let path_start = trimmed.find(['/', '?', '#']);
    match (scheme_end, path_start) {
        (Some(colon), Some(slash)) if slash < colon => Some(trimmed),
        (Some(_), _) => None,
        (None, _) => Some(trimmed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_text() {
        assert_eq!(
            escape_text("<script>alert('x')</script> & co"),
            "&lt;script&gt;alert('x')&lt;/script&gt; &amp; co"
        );
        assert_eq!(escape_text("Jean-Sébastien"), "Jean-Sébastien");
    }

    #[test]
    fn test_escape_attr() {
        assert_eq!(
            escape_attr(r#"x" onmouseover="alert(1)"#),
            "x&quot; onmouseover=&quot;alert(1)"
        );
        assert_eq!(escape_attr("a'b`c"), "a&#x27;b&#x60;c");
    }

    #[test]
    fn test_safe_href() {
        assert_eq!(safe_href("/notifications/forward/ab/"), Some("/notifications/forward/ab/"));
        assert_eq!(safe_href("https://scipost.example/x"), Some("https://scipost.example/x"));
        assert_eq!(safe_href("forward/ab/?next=a:b"), Some("forward/ab/?next=a:b"));
        assert_eq!(safe_href("javascript:alert(1)"), None);
        assert_eq!(safe_href(" JavaScript:alert(1)"), None);
        assert_eq!(safe_href("data:text/html,hi"), None);
        assert_eq!(safe_href("   "), None);
    }
}
