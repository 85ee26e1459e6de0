//! HTML content extraction — strips boilerplate and returns readable text.
//!
//! Pure functions over parsed markup: no I/O, no failure. The extractor
//! removes non-content elements, hunts for the main content container
//! using an ordered list of structural hints, and falls back through
//! paragraph concatenation to the whole page's visible text. Any parse
//! failure or contentless page yields a fixed sentinel string instead
//! of an error, so a bad page never fails its candidate.

use scraper::{ElementRef, Html, Selector};

/// Default maximum characters to return from extracted content.
pub const DEFAULT_MAX_CHARS: usize = 10_000;

/// Minimum visible text length for a structural container to qualify as
/// the main content block. Shorter matches are decorative fragments.
const MIN_CANDIDATE_CHARS: usize = 100;

/// Fixed sentinel returned when nothing usable can be extracted.
pub const CONTENT_UNAVAILABLE: &str = "No meaningful content could be extracted from this page.";

/// Marker appended when extracted text was cut at the length limit.
const TRUNCATION_MARKER: &str = "... (content truncated)";

/// Content container hints, tried in priority order. `body` is the last
/// structural resort before the paragraph fallback.
const CONTENT_SELECTORS: &[&str] = &[
    "article",
    "main",
    "div.content",
    "div.article",
    "div.post",
    "body",
];

/// Non-content elements stripped before the content hunt.
const BOILERPLATE_TAGS: &[&str] = &[
    "script", "style", "meta", "noscript", "header", "footer", "nav", "aside",
];

/// Extract readable text content from raw HTML.
///
/// Equivalent to [`extract_content_with_limit`] with
/// [`DEFAULT_MAX_CHARS`].
pub fn extract_content(html: &str) -> String {
    extract_content_with_limit(html, DEFAULT_MAX_CHARS)
}

/// Extract readable text content from raw HTML with a custom character
/// limit.
///
/// Total: always returns a non-empty string. Pages with no usable text
/// yield [`CONTENT_UNAVAILABLE`].
pub fn extract_content_with_limit(html: &str, max_chars: usize) -> String {
    match extract_inner(html, max_chars) {
        Some(text) => text,
        None => CONTENT_UNAVAILABLE.to_owned(),
    }
}

fn extract_inner(html: &str, max_chars: usize) -> Option<String> {
    let stripped = strip_boilerplate_tags(html);
    let document = Html::parse_document(&stripped);

    let raw = select_main_text(&document)?;
    let collapsed = collapse_whitespace(&raw);
    if collapsed.is_empty() {
        return None;
    }
    Some(truncate_chars(&collapsed, max_chars))
}

/// Hunt for the main content block.
///
/// 1. Collect every element matching a content selector; among those
///    with at least [`MIN_CANDIDATE_CHARS`] of visible text, pick the
///    longest.
/// 2. Otherwise concatenate all `<p>` elements.
/// 3. Otherwise take the whole page's visible text.
fn select_main_text(document: &Html) -> Option<String> {
    let mut best: Option<String> = None;

    for selector_str in CONTENT_SELECTORS {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        for element in document.select(&selector) {
            let text = visible_text(element);
            if text.len() < MIN_CANDIDATE_CHARS {
                continue;
            }
            if best.as_ref().map_or(true, |b| text.len() > b.len()) {
                best = Some(text);
            }
        }
    }
    if best.is_some() {
        return best;
    }

    if let Ok(selector) = Selector::parse("p") {
        let paragraphs: Vec<String> = document
            .select(&selector)
            .map(visible_text)
            .filter(|t| !t.is_empty())
            .collect();
        if !paragraphs.is_empty() {
            return Some(paragraphs.join(" "));
        }
    }

    let whole = document
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ");
    let whole = whole.trim();
    if whole.is_empty() {
        None
    } else {
        Some(whole.to_owned())
    }
}

/// Visible text of an element, space-joined and trimmed.
fn visible_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_owned()
}

/// Remove boilerplate HTML tags and their content before parsing.
fn strip_boilerplate_tags(html: &str) -> String {
    let mut result = html.to_owned();
    for tag in BOILERPLATE_TAGS {
        result = strip_tag(&result, tag);
    }
    result
}

/// Remove all instances of a specific HTML tag and its content.
fn strip_tag(html: &str, tag: &str) -> String {
    let lower = html.to_lowercase();
    let open_tag = format!("<{tag}");
    let close_tag = format!("</{tag}>");

    let mut kept = String::with_capacity(html.len());
    let mut cursor = 0;
    while let Some(offset) = lower[cursor..].find(&open_tag) {
        let start = cursor + offset;
        let name_end = start + open_tag.len();

        // The tag name must end here, so that `<nav` does not swallow
        // `<navigate>`.
        let name_boundary = matches!(
            lower.as_bytes().get(name_end),
            None | Some(b' ' | b'>' | b'/' | b'\t' | b'\n' | b'\r')
        );
        if !name_boundary {
            kept.push_str(&html[cursor..name_end]);
            cursor = name_end;
            continue;
        }

        kept.push_str(&html[cursor..start]);
        cursor = match lower[start..].find(&close_tag) {
            Some(close) => start + close + close_tag.len(),
            // Unterminated: drop only the opening tag itself.
            None => lower[start..]
                .find('>')
                .map_or(html.len(), |gt| start + gt + 1),
        };
    }
    kept.push_str(&html[cursor..]);
    kept
}

/// Collapse all whitespace runs to single spaces and trim.
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate to `max_chars` characters, appending the truncation marker
/// only when the text was actually shortened.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => {
            let mut truncated = text[..byte_idx].to_owned();
            truncated.push_str(TRUNCATION_MARKER);
            truncated
        }
        None => text.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Long enough to pass the 100-char candidate threshold.
    fn filler(label: &str) -> String {
        format!("{label} ").repeat(30)
    }

    #[test]
    fn article_preferred_over_surrounding_chrome() {
        let body = filler("article-text");
        let html = format!(
            "<html><body><nav>Navigation links</nav><article>{body}</article>\
             <footer>Footer notice</footer></body></html>"
        );
        let text = extract_content(&html);
        assert!(text.contains("article-text"));
        assert!(!text.contains("Navigation"));
        assert!(!text.contains("Footer"));
    }

    #[test]
    fn longest_qualifying_container_wins() {
        let short = filler("short-block");
        let long = filler("long-block") + &filler("long-block");
        let html = format!(
            "<html><body><article>{short}</article><div class=\"content\">{long}</div></body></html>"
        );
        let text = extract_content(&html);
        assert!(text.contains("long-block"));
    }

    #[test]
    fn short_containers_fall_back_to_paragraphs() {
        // Article under 100 chars must not qualify; paragraphs win.
        let html = "<html><body><article>tiny</article>\
                    <p>First paragraph of real text.</p><p>Second paragraph.</p></body></html>";
        let text = extract_content(html);
        assert!(text.contains("First paragraph"));
        assert!(text.contains("Second paragraph"));
    }

    #[test]
    fn strips_scripts_and_styles() {
        let body = filler("visible");
        let html = format!(
            "<html><body><article>{body}</article>\
             <script>var x = 1; alert('hi');</script>\
             <style>.foo {{ color: red; }}</style></body></html>"
        );
        let text = extract_content(&html);
        assert!(text.contains("visible"));
        assert!(!text.contains("alert"));
        assert!(!text.contains("color: red"));
    }

    #[test]
    fn nav_tag_not_confused_with_similar_words() {
        let body = filler("navigate-me");
        let html = format!("<html><body><nav>Skip this</nav><article>{body}</article></body></html>");
        let text = extract_content(&html);
        assert!(!text.contains("Skip this"));
        assert!(text.contains("navigate-me"));
    }

    #[test]
    fn unterminated_boilerplate_tag_drops_only_the_opening_tag() {
        let body = filler("after-the-nav");
        let html = format!("<html><body><nav class=\"menu\"><article>{body}</article></body></html>");
        let text = extract_content(&html);
        assert!(text.contains("after-the-nav"));
    }

    #[test]
    fn empty_markup_returns_sentinel() {
        assert_eq!(extract_content(""), CONTENT_UNAVAILABLE);
    }

    #[test]
    fn whitespace_only_markup_returns_sentinel() {
        let html = "<html><body>   \n\n\n   </body></html>";
        assert_eq!(extract_content(html), CONTENT_UNAVAILABLE);
    }

    #[test]
    fn scripts_only_page_returns_sentinel() {
        let html = "<html><head><style>body{color:red}</style></head>\
                    <body><script>console.log('x');</script></body></html>";
        assert_eq!(extract_content(html), CONTENT_UNAVAILABLE);
    }

    #[test]
    fn whitespace_collapsed_to_single_spaces() {
        let html = "<html><body><p>Word1    Word2\n\n\n\nWord3</p></body></html>";
        let text = extract_content(html);
        assert!(text.contains("Word1 Word2 Word3"));
        assert!(!text.contains("  "));
    }

    #[test]
    fn truncation_marker_only_when_shortened() {
        let long_body = "word ".repeat(5000);
        let html = format!("<html><body><article>{long_body}</article></body></html>");
        let truncated = extract_content_with_limit(&html, 200);
        assert!(truncated.contains(TRUNCATION_MARKER));
        assert!(truncated.chars().count() <= 200 + TRUNCATION_MARKER.chars().count());

        let short_html = format!("<html><body><article>{}</article></body></html>", filler("ok"));
        let untouched = extract_content(&short_html);
        assert!(!untouched.contains(TRUNCATION_MARKER));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let text = "é".repeat(500);
        let html = format!("<html><body><article>{text}</article></body></html>");
        // Must not panic on a multi-byte boundary.
        let out = extract_content_with_limit(&html, 100);
        assert!(out.contains(TRUNCATION_MARKER));
    }

    #[test]
    fn page_with_no_structure_uses_visible_text() {
        let html = "<html><body><span>Loose inline text only</span></body></html>";
        let text = extract_content(html);
        assert!(text.contains("Loose inline text"));
    }

    #[test]
    fn default_max_chars_constant() {
        assert_eq!(DEFAULT_MAX_CHARS, 10_000);
    }

    // ── Fixture-based tests ──────────────────────────────────────────────

    const FIXTURE_ARTICLE: &str = include_str!("../test-data/article_page.html");

    #[test]
    fn fixture_extracts_article_body() {
        let text = extract_content(FIXTURE_ARTICLE);
        assert!(text.contains("Solid-state batteries replace the liquid electrolyte"));
        assert!(text.contains("pilot production lines"));
    }

    #[test]
    fn fixture_strips_boilerplate() {
        let text = extract_content(FIXTURE_ARTICLE);
        assert!(!text.contains("analytics.track"));
        assert!(!text.contains("Subscribe to our newsletter"));
        assert!(!text.contains("All rights reserved"));
        assert!(!text.contains("Related articles"));
    }

    #[test]
    fn fixture_text_is_whitespace_normalised() {
        let text = extract_content(FIXTURE_ARTICLE);
        assert!(!text.contains('\n'));
        assert!(!text.contains("  "));
    }
}
