// Placeholder substitution for prompt and first-message templates.
// Templates written for the production bot reference live values such as
// `{subreddit}` or `{comment}`; the testing utility fills every
// placeholder with a fixed bracketed stand-in so nothing reaches the
// model unresolved.

/// Placeholders with dedicated stand-in values. Anything else that looks
/// like `{identifier}` is rendered as `[identifier]`.
const KNOWN_PLACEHOLDERS: &[(&str, &str)] = &[
    ("user", "[test_user]"),
    ("subreddit_rules", "[test subreddit rules]"),
    ("subreddit", "[test_subreddit]"),
    ("comment", "[test comment]"),
];

fn is_placeholder_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Replace every `{identifier}` in `text` with its fixed test value.
///
/// Braces that do not wrap a plain identifier (`{}`, `{no close`,
/// `{two words}`) are left untouched.
pub fn fill_placeholders(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 1..];

        match after_open.find('}') {
            Some(close) if is_placeholder_name(&after_open[..close]) => {
                let name = &after_open[..close];
                match KNOWN_PLACEHOLDERS.iter().find(|(key, _)| *key == name) {
                    Some((_, value)) => out.push_str(value),
                    None => {
                        out.push('[');
                        out.push_str(name);
                        out.push(']');
                    }
                }
                rest = &after_open[close + 1..];
            }
            _ => {
                // Not a placeholder; keep the brace literal.
                out.push('{');
                rest = after_open;
            }
        }
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_placeholders_get_fixed_values() {
        assert_eq!(
            fill_placeholders("Hello {user}, welcome to {subreddit}."),
            "Hello [test_user], welcome to [test_subreddit]."
        );
        assert_eq!(
            fill_placeholders("Rules: {subreddit_rules}\nComment: {comment}"),
            "Rules: [test subreddit rules]\nComment: [test comment]"
        );
    }

    #[test]
    fn unknown_placeholders_are_bracketed() {
        assert_eq!(
            fill_placeholders("Reply to {post_title} politely"),
            "Reply to [post_title] politely"
        );
    }

    #[test]
    fn text_without_braces_is_unchanged() {
        assert_eq!(fill_placeholders("plain text"), "plain text");
    }

    #[test]
    fn non_placeholder_braces_stay_literal() {
        assert_eq!(fill_placeholders("set x = {}"), "set x = {}");
        assert_eq!(fill_placeholders("open { brace"), "open { brace");
        assert_eq!(fill_placeholders("{two words}"), "{two words}");
    }

    #[test]
    fn adjacent_placeholders_all_resolve() {
        assert_eq!(
            fill_placeholders("{user}{comment}"),
            "[test_user][test comment]"
        );
    }
}
