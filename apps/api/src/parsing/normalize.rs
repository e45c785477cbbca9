//! Text normalizer for extracted blocks. Best-effort, never fails.

use once_cell::sync::Lazy;
use regex::Regex;

static BOILERPLATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)show\s+(?:more|less)").expect("Invalid boilerplate regex"));

static TRAILING_ELLIPSIS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)[ \t]*(?:\.{3,}|…)[ \t]*$").expect("Invalid ellipsis regex"));

static TRAILING_SPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)[ \t]+$").expect("Invalid trailing space regex"));

static BLANK_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("Invalid blank run regex"));

static HTML_TAG_RE: Lazy<Regex> =
    Lazy::new(|| {
        Regex::new(r"<\s*/?\s*[a-zA-Z][a-zA-Z0-9]*(?:\s[^<>]*)?/?>").expect("Invalid HTML tag regex")
    });

static BLOCK_TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<\s*(?:br|/p|/div|/li|/h[1-6]|/tr)\s*/?\s*>").expect("Invalid block tag regex")
});

static LIST_ITEM_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<\s*li[^>]*>").expect("Invalid list item regex"));

/// Cleans one paragraph or list item.
///
/// Removes "show more"/"show less" in any casing and trailing ellipses,
/// strips trailing spaces, collapses blank-line runs to one blank line and trims.
pub fn clean_text(raw: &str) -> String {
    let mut text = raw.replace("\r\n", "\n").replace('\r', "\n");

    // Removal can splice a new occurrence together ("show show moremore").
    loop {
        let next = BOILERPLATE_RE.replace_all(&text, "").into_owned();
        if next == text {
            break;
        }
        text = next;
    }

    let text = TRAILING_ELLIPSIS_RE.replace_all(&text, "");
    let text = TRAILING_SPACE_RE.replace_all(&text, "");
    let text = BLANK_RUN_RE.replace_all(&text, "\n\n");
    text.trim().to_string()
}

/// Cleans every item and discards the ones left empty.
pub fn clean_items<S: AsRef<str>>(items: &[S]) -> Vec<String> {
    items
        .iter()
        .map(|item| clean_text(item.as_ref()))
        .filter(|item| !item.is_empty())
        .collect()
}

/// Cheap check for pasted markup.
pub fn looks_like_html(text: &str) -> bool {
    HTML_TAG_RE.is_match(text)
}

/// Converts pasted HTML into plain text: block tags become line breaks,
/// list items become bullets, remaining tags are dropped, common entities decoded.
pub fn html_to_text(html: &str) -> String {
    let text = LIST_ITEM_TAG_RE.replace_all(html, "\n- ");
    let text = BLOCK_TAG_RE.replace_all(&text, "\n");
    let text = HTML_TAG_RE.replace_all(&text, "");
    let text = decode_entities(&text);
    clean_text(&text)
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removes_show_more_variants() {
        let input = "Great team. show more\nShow Less\nSHOW MORE details";
        let out = clean_text(input);
        assert!(!out.to_lowercase().contains("show more"));
        assert!(!out.to_lowercase().contains("show less"));
        assert!(out.contains("Great team."));
        assert!(out.contains("details"));
    }

    #[test]
    fn test_removal_does_not_leave_spliced_boilerplate() {
        let out = clean_text("show show moremore");
        assert!(!out.to_lowercase().contains("show more"));
    }

    #[test]
    fn test_collapses_blank_line_runs() {
        let out = clean_text("first\n\n\n\nsecond\r\n\r\n\r\nthird\n \n\t\n\nfourth");
        assert!(!out.contains("\n\n\n"));
        assert_eq!(out, "first\n\nsecond\n\nthird\n\nfourth");
    }

    #[test]
    fn test_strips_trailing_ellipsis_and_trims() {
        assert_eq!(clean_text("  We build tools...  "), "We build tools");
        assert_eq!(clean_text("Line one…\nLine two"), "Line one\nLine two");
    }

    #[test]
    fn test_keeps_inline_ellipsis() {
        assert_eq!(clean_text("Rust... and Go"), "Rust... and Go");
    }

    #[test]
    fn test_idempotent() {
        let once = clean_text("A\n\n\n\nB show more...\n\n");
        assert_eq!(clean_text(&once), once);
    }

    #[test]
    fn test_clean_items_drops_empty() {
        let items = vec!["  Rust ", "Show more", "", "SQL..."];
        assert_eq!(clean_items(&items), vec!["Rust".to_string(), "SQL".to_string()]);
    }

    #[test]
    fn test_html_to_text() {
        let html = "<p>About us</p><ul><li>Remote &amp; async</li><li>Equity</li></ul>";
        assert!(looks_like_html(html));
        let text = html_to_text(html);
        assert!(text.starts_with("About us"));
        assert!(text.contains("- Remote & async"));
        assert!(text.contains("- Equity"));
        assert!(!text.contains('<'));
    }

    #[test]
    fn test_plain_text_is_not_html() {
        assert!(!looks_like_html("Salary: 5 < 10 and 10 > 5"));
    }
}
