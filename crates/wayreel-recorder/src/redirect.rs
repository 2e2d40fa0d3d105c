//! Redirection detection for captures (spec §4.9.2): did the browser
//! actually stay on the snapshot it was asked to render?

use wayreel_types::url_key::WaybackUrl;

/// What the browser reported after navigation settled.
#[derive(Debug, Clone)]
pub struct ObservedNavigation {
    pub current_url: String,
    pub redirect_count: u32,
}

/// A capture is "redirected" when the current URL doesn't parse as a
/// wayback snapshot URL at all, or parses but disagrees with the
/// requested one on modifier, timestamp, or (case/percent-insensitively)
/// path and host — or the browser itself reports it followed a redirect.
pub fn is_redirected(requested: &WaybackUrl, observed: &ObservedNavigation) -> bool {
    let Ok(current) = WaybackUrl::parse(&observed.current_url) else {
        return true;
    };
    if observed.redirect_count > 0 {
        return true;
    }
    if current.modifier != requested.modifier {
        return true;
    }
    if current.timestamp != requested.timestamp {
        return true;
    }
    !urls_match_ignoring_case_and_encoding(&requested.url, &current.url)
}

fn urls_match_ignoring_case_and_encoding(a: &str, b: &str) -> bool {
    percent_decode_lower(a) == percent_decode_lower(b)
}

fn percent_decode_lower(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let Ok(byte) = u8::from_str_radix(&s[i + 1..i + 3], 16) {
                out.push(byte as char);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i] as char);
        i += 1;
    }
    out.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayreel_types::url_key::Modifier;

    fn requested() -> WaybackUrl {
        WaybackUrl::new("20100823194716", Some(Modifier::Iframe), "http://x/")
    }

    #[test]
    fn identical_navigation_is_not_redirected() {
        let observed = ObservedNavigation {
            current_url: "https://web.archive.org/web/20100823194716if_/http://x/".to_string(),
            redirect_count: 0,
        };
        assert!(!is_redirected(&requested(), &observed));
    }

    #[test]
    fn different_timestamp_is_redirected() {
        let observed = ObservedNavigation {
            current_url: "https://web.archive.org/web/20100822160707if_/http://x/loan".to_string(),
            redirect_count: 0,
        };
        assert!(is_redirected(&requested(), &observed));
    }

    #[test]
    fn nonzero_redirect_count_is_redirected_even_if_url_matches() {
        let observed = ObservedNavigation {
            current_url: "https://web.archive.org/web/20100823194716if_/http://x/".to_string(),
            redirect_count: 1,
        };
        assert!(is_redirected(&requested(), &observed));
    }

    #[test]
    fn non_wayback_current_url_is_redirected() {
        let observed = ObservedNavigation { current_url: "http://evil.example/".to_string(), redirect_count: 0 };
        assert!(is_redirected(&requested(), &observed));
    }

    #[test]
    fn case_and_percent_encoding_differences_are_not_redirected() {
        let observed = ObservedNavigation {
            current_url: "https://web.archive.org/web/20100823194716if_/HTTP://X%2f".to_string(),
            redirect_count: 0,
        };
        assert!(!is_redirected(&requested(), &observed));
    }
}
