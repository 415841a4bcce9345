//! Plain-text extraction for analysis and fingerprinting.
//!
//! Content bodies may carry HTML markup. The engine analyzes and hashes a
//! normalized plain-text rendition: tags stripped, non-breaking spaces
//! replaced, all whitespace runs collapsed to single spaces, trimmed.

/// Strip markup from a content body and normalize whitespace.
pub fn plain_text(html: &str) -> String {
    let stripped = strip_tags(html);
    let replaced = stripped.replace("&nbsp;", " ");

    let mut out = String::with_capacity(replaced.len());
    let mut in_space = false;
    for ch in replaced.chars() {
        if ch.is_whitespace() {
            if !in_space && !out.is_empty() {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(ch);
            in_space = false;
        }
    }

    out.trim_end().to_string()
}

/// The full analyzable text of an item: title plus stripped body.
pub fn analyzable_text(title: &str, body: &str) -> String {
    let body_text = plain_text(body);
    if title.is_empty() {
        return body_text;
    }
    if body_text.is_empty() {
        return title.to_string();
    }
    format!("{} {}", title, body_text)
}

/// Remove `<...>` tag spans. Unterminated tags are dropped to the end of
/// input, matching the usual strip-tags behavior.
fn strip_tags(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_tag = false;
    for ch in input.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_tags() {
        assert_eq!(plain_text("<p>Hello <b>world</b></p>"), "Hello world");
    }

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(plain_text("a\n\n  b\t\tc"), "a b c");
    }

    #[test]
    fn test_nbsp_replaced() {
        assert_eq!(plain_text("one&nbsp;&nbsp;two"), "one two");
    }

    #[test]
    fn test_plain_text_passthrough() {
        assert_eq!(plain_text("no markup here"), "no markup here");
    }

    #[test]
    fn test_unterminated_tag_dropped() {
        assert_eq!(plain_text("before <a href="), "before");
    }

    #[test]
    fn test_analyzable_text_combines_title_and_body() {
        assert_eq!(
            analyzable_text("Title", "<p>Body text.</p>"),
            "Title Body text."
        );
        assert_eq!(analyzable_text("", "<p>Body only</p>"), "Body only");
        assert_eq!(analyzable_text("Title only", ""), "Title only");
    }
}
