//! Archive-normalized URL keys and wayback snapshot URL parsing/composition.
//!
//! A url_key looks like `com,example)/path/to/page` — the registrable domain
//! labels reversed and comma-joined, closed with `)`, followed by the path.
//! `SnapshotInfo::url_host` is everything before the `)`.

use crate::error::TypesError;

/// Compute the archive-style url_key for a URL: `tld1,tld0,host)/path`,
/// case-folded. Best-effort: does not attempt full public-suffix awareness,
/// it just reverses every label in the host.
pub fn url_key(url: &str) -> String {
    let lower = url.to_lowercase();
    let without_scheme = lower
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(&lower);
    let (host, rest) = without_scheme
        .split_once('/')
        .unwrap_or((without_scheme, ""));
    let host = host.split(['?', '#']).next().unwrap_or(host);
    let host = host.rsplit_once('@').map(|(_, h)| h).unwrap_or(host);
    let host = host.split(':').next().unwrap_or(host);

    let mut labels: Vec<&str> = host.split('.').filter(|s| !s.is_empty()).collect();
    labels.reverse();
    let reversed_host = labels.join(",");

    if rest.is_empty() {
        format!("{reversed_host})/")
    } else {
        format!("{reversed_host})/{rest}")
    }
}

/// The `url_host` projection: everything in a url_key up to (excluding) `)`.
pub fn url_host(key: &str) -> &str {
    key.split_once(')').map(|(h, _)| h).unwrap_or(key)
}

/// The rendering-variant suffix on an archive snapshot URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    /// Iframe / toolbar-hidden variant (`if_`).
    Iframe,
    /// Object/embed variant, used for media (`oe_`).
    ObjectEmbed,
    /// Identical / raw-bytes variant, no DOM injection (`id_`).
    Identical,
}

impl Modifier {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Iframe => "if_",
            Self::ObjectEmbed => "oe_",
            Self::Identical => "id_",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "if_" => Some(Self::Iframe),
            "oe_" => Some(Self::ObjectEmbed),
            "id_" => Some(Self::Identical),
            _ => None,
        }
    }
}

/// A parsed `https://web.archive.org/web/{timestamp}{modifier}/{url}` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaybackUrl {
    pub timestamp: String,
    pub modifier: Option<Modifier>,
    pub url: String,
}

impl WaybackUrl {
    pub fn new(timestamp: impl Into<String>, modifier: Option<Modifier>, url: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            modifier,
            url: url.into(),
        }
    }

    /// `https://web.archive.org/web/{timestamp}{modifier}/{url}`. Composing
    /// with `modifier = None` emits the empty modifier segment (spec §8).
    pub fn compose(&self) -> String {
        let modifier = self.modifier.map(Modifier::as_str).unwrap_or("");
        format!(
            "https://web.archive.org/web/{}{}/{}",
            self.timestamp, modifier, self.url
        )
    }

    pub fn parse(s: &str) -> Result<Self, TypesError> {
        const PREFIX: &str = "https://web.archive.org/web/";
        let rest = s
            .strip_prefix(PREFIX)
            .ok_or_else(|| TypesError::MalformedTimestamp(s.to_string()))?;
        let (segment, url) = rest
            .split_once('/')
            .ok_or_else(|| TypesError::MalformedTimestamp(s.to_string()))?;

        let digits_end = segment
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(segment.len());
        let (timestamp, modifier_str) = segment.split_at(digits_end);
        if timestamp.len() != 14 {
            return Err(TypesError::MalformedTimestamp(s.to_string()));
        }
        let modifier = if modifier_str.is_empty() {
            None
        } else {
            Some(Modifier::parse(modifier_str).ok_or_else(|| TypesError::MalformedTimestamp(s.to_string()))?)
        };

        Ok(Self {
            timestamp: timestamp.to_string(),
            modifier,
            url: url.to_string(),
        })
    }
}

/// Validate the 14-digit `YYYYMMDDHHMMSS` shape spec §8 requires of every
/// Snapshot timestamp.
pub fn is_wayback_timestamp(s: &str) -> bool {
    s.len() == 14 && s.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_key_reverses_domain_labels() {
        assert_eq!(url_key("http://www.example.com/a/b"), "com,example,www)/a/b");
    }

    #[test]
    fn url_host_is_prefix_before_paren() {
        let key = url_key("http://example.com/path");
        assert_eq!(url_host(&key), "com,example");
    }

    #[test]
    fn wayback_url_round_trips_with_modifier() {
        let original = "https://web.archive.org/web/20020120142510if_/http://example.com/";
        let parsed = WaybackUrl::parse(original).unwrap();
        assert_eq!(parsed.modifier, Some(Modifier::Iframe));
        assert_eq!(parsed.compose(), original);
    }

    #[test]
    fn wayback_url_round_trips_without_modifier() {
        let original = "https://web.archive.org/web/20020120142510/http://example.com/";
        let parsed = WaybackUrl::parse(original).unwrap();
        assert_eq!(parsed.modifier, None);
        assert_eq!(parsed.compose(), original);
    }

    #[test]
    fn rejects_non_14_digit_timestamp() {
        assert!(!is_wayback_timestamp("2002012014251"));
        assert!(is_wayback_timestamp("20020120142510"));
    }
}
