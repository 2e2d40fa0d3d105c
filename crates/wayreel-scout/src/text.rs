//! Pure text processing for the Scout iteration (spec §4.8 steps 5-8):
//! tokenization, plugin detection, and pulling URLs out of query-string
//! values (catches redirector links like `?url=http://...`).

use regex::Regex;
use std::sync::OnceLock;

/// Delimiters are every non-letter Unicode code point, matching the
/// original's `PAGE_TEXT_DELIMITER_REGEX` built from configured
/// delimiter characters generalized to "not a letter".
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphabetic())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Same delimiter split as [`tokenize`], but when `tokenize_japanese` is
/// set, each segment is further split into script-boundary runs (Hiragana/
/// Katakana/Kanji/other) instead of being kept whole — no dictionary
/// tagger is wired up, so this is a heuristic stand-in for the original's
/// morphological segmenter. A segment that doesn't yield at least two
/// script runs is kept as-is, matching the original's "couldn't split it,
/// store the whole string" fallback.
pub fn tokenize_japanese_aware(text: &str, tokenize_japanese: bool) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut out = Vec::new();
    for segment in lowered.split(|c: char| !c.is_alphabetic()).filter(|s| !s.is_empty()) {
        if tokenize_japanese {
            let runs = japanese_script_runs(segment);
            if runs.len() >= 2 {
                out.extend(runs);
                continue;
            }
        }
        out.push(segment.to_string());
    }
    out
}

#[derive(PartialEq, Clone, Copy)]
enum ScriptKind {
    Hiragana,
    Katakana,
    Kanji,
    Other,
}

fn script_kind(c: char) -> ScriptKind {
    match c {
        '\u{3040}'..='\u{309f}' => ScriptKind::Hiragana,
        '\u{30a0}'..='\u{30ff}' => ScriptKind::Katakana,
        '\u{4e00}'..='\u{9fff}' => ScriptKind::Kanji,
        _ => ScriptKind::Other,
    }
}

fn japanese_script_runs(segment: &str) -> Vec<String> {
    let mut runs = Vec::new();
    let mut current = String::new();
    let mut current_kind: Option<ScriptKind> = None;
    for c in segment.chars() {
        let kind = script_kind(c);
        if current_kind.is_some_and(|k| k != kind) {
            runs.push(std::mem::take(&mut current));
        }
        current.push(c);
        current_kind = Some(kind);
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

const PLUGIN_TAGS: [&str; 5] = ["object", "embed", "applet", "app", "bgsound"];

pub fn uses_plugin_tag(tag_name: &str) -> bool {
    PLUGIN_TAGS.iter().any(|t| t.eq_ignore_ascii_case(tag_name))
}

fn url_in_text_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"https?://[^\s"'<>&]+"#).expect("static regex"))
}

/// Extract URLs embedded inside a query string value, e.g.
/// `?redirect=http://example.com/page` — redirector links hide their real
/// target this way instead of in an `href`.
pub fn urls_in_query_string(href: &str) -> Vec<String> {
    let Some((_, query)) = href.split_once('?') else {
        return Vec::new();
    };
    url_in_text_regex()
        .find_iter(query)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Does `href` point back at the archive's own domain? Those links should
/// never be treated as page content to scout further.
pub fn is_archive_domain(href: &str, archive_host: &str) -> bool {
    href.to_lowercase().contains(&archive_host.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_on_non_letters() {
        let tokens = tokenize("Hello, World! 123 foo-bar");
        assert_eq!(tokens, vec!["hello", "world", "foo", "bar"]);
    }

    #[test]
    fn tokenize_lowercases() {
        assert_eq!(tokenize("ABC"), vec!["abc"]);
    }

    #[test]
    fn plugin_tags_match_case_insensitively() {
        assert!(uses_plugin_tag("OBJECT"));
        assert!(uses_plugin_tag("bgsound"));
        assert!(!uses_plugin_tag("div"));
    }

    #[test]
    fn extracts_urls_from_query_string() {
        let urls = urls_in_query_string("http://redirector.example/go?target=http://real.example/page&x=1");
        assert_eq!(urls, vec!["http://real.example/page".to_string()]);
    }

    #[test]
    fn no_query_string_yields_no_urls() {
        assert!(urls_in_query_string("http://a.example/page").is_empty());
    }

    #[test]
    fn detects_archive_domain_links() {
        assert!(is_archive_domain("https://web.archive.org/web/123/http://a.example", "web.archive.org"));
        assert!(!is_archive_domain("http://a.example/page", "web.archive.org"));
    }

    #[test]
    fn japanese_aware_tokenize_disabled_behaves_like_tokenize() {
        let text = "Hello World";
        assert_eq!(tokenize_japanese_aware(text, false), tokenize(text));
    }

    #[test]
    fn japanese_aware_tokenize_splits_script_runs() {
        let tokens = tokenize_japanese_aware("こんにちは世界", true);
        assert_eq!(tokens, vec!["こんにちは".to_string(), "世界".to_string()]);
    }

    #[test]
    fn japanese_aware_tokenize_keeps_non_japanese_segment_whole() {
        let tokens = tokenize_japanese_aware("hello", true);
        assert_eq!(tokens, vec!["hello".to_string()]);
    }
}
