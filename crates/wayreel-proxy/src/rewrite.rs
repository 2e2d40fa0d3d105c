//! Pure request-rewriting rules from the ProxyBridge contract (spec
//! §4.7). These decide what a scoped request becomes; the actual HTTP
//! interception and CDX lookups live in the process driving
//! `wayreel_proxy::bridge`.

use wayreel_types::url_key::{Modifier, WaybackUrl};

/// Point 3: any frame request without an explicit modifier gets the
/// iframe modifier, so the archive's toolbar chrome never appears inside
/// an embedded frame.
pub fn ensure_iframe_modifier(wayback: &WaybackUrl) -> WaybackUrl {
    if wayback.modifier.is_some() {
        wayback.clone()
    } else {
        WaybackUrl::new(wayback.timestamp.clone(), Some(Modifier::Iframe), wayback.url.clone())
    }
}

/// Point 4: when the Wayback response is non-200, build the CDX queries to
/// try before giving up — a subdomain-wide domain search on the tail of
/// the path, and (if a query string is present) the same URL stripped of
/// it.
pub fn cdx_fallback_queries(original_url: &str, max_path_components: Option<usize>) -> Vec<String> {
    let (base, query) = original_url.split_once('?').map_or((original_url, None), |(b, q)| (b, Some(q)));
    let mut queries = vec![domain_wide_query(base, max_path_components)];
    if query.is_some() {
        queries.push(base.to_string());
    }
    queries
}

fn domain_wide_query(url: &str, max_path_components: Option<usize>) -> String {
    let without_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    let Some((_, path)) = without_scheme.split_once('/') else {
        return url.to_string();
    };
    let components: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let tail = match max_path_components {
        Some(n) if n < components.len() => &components[components.len() - n..],
        _ => components.as_slice(),
    };
    format!("/{}", tail.join("/"))
}

/// Point 6: is `referer` a VRML world? The Cosmo Player plugin can't
/// follow an HTTP redirect, so assets it requests must be synthesized
/// directly instead of redirected.
pub fn is_vrml_referer(referer: &str) -> bool {
    let path = referer.split(['?', '#']).next().unwrap_or(referer).to_ascii_lowercase();
    path.ends_with(".wrl") || path.ends_with(".wrz") || path.ends_with(".wrl.gz")
}

/// Point 7: a RealMedia playlist response worth re-targeting the
/// recording to, by content-type.
pub fn is_realmedia_playlist(content_type: &str) -> bool {
    let ct = content_type.to_ascii_lowercase();
    ct.contains("x-pn-realaudio") || ct.contains("vnd.rn-realmedia")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adds_iframe_modifier_when_absent() {
        let url = WaybackUrl::new("20200101000000", None, "http://a.example/");
        let rewritten = ensure_iframe_modifier(&url);
        assert_eq!(rewritten.modifier, Some(Modifier::Iframe));
    }

    #[test]
    fn preserves_explicit_modifier() {
        let url = WaybackUrl::new("20200101000000", Some(Modifier::ObjectEmbed), "http://a.example/x.swf");
        let rewritten = ensure_iframe_modifier(&url);
        assert_eq!(rewritten.modifier, Some(Modifier::ObjectEmbed));
    }

    #[test]
    fn domain_wide_query_trims_to_tail_components() {
        let q = domain_wide_query("http://www.example.com/path1/path2/file.ext", Some(2));
        assert_eq!(q, "/path2/file.ext");
    }

    #[test]
    fn cdx_fallback_adds_no_query_variant_when_query_present() {
        let queries = cdx_fallback_queries("http://a.example/file.swf?v=1", Some(2));
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[1], "http://a.example/file.swf");
    }

    #[test]
    fn cdx_fallback_single_query_without_query_string() {
        let queries = cdx_fallback_queries("http://a.example/file.swf", None);
        assert_eq!(queries.len(), 1);
    }

    #[test]
    fn detects_vrml_referer_variants() {
        assert!(is_vrml_referer("http://a.example/world.wrl"));
        assert!(is_vrml_referer("http://a.example/world.WRZ"));
        assert!(is_vrml_referer("http://a.example/world.wrl.gz"));
        assert!(!is_vrml_referer("http://a.example/page.html"));
    }

    #[test]
    fn detects_realmedia_content_type() {
        assert!(is_realmedia_playlist("audio/x-pn-realaudio-plugin"));
        assert!(is_realmedia_playlist("application/vnd.rn-realmedia"));
        assert!(!is_realmedia_playlist("text/html"));
    }
}
