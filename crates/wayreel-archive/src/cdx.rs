//! Thin model of the archive's CDX index response rows.

use serde::Deserialize;

/// One row of a CDX query, selected fields (spec §4.6).
#[derive(Debug, Clone, Deserialize)]
pub struct CdxCapture {
    pub urlkey: String,
    pub timestamp: String,
    pub original: String,
    pub mimetype: String,
    pub statuscode: String,
    pub digest: String,
}

impl CdxCapture {
    /// A capture is media iff its MIME type is neither `text/html` nor
    /// `text/plain` (plain text gets an exception because early HTML pages
    /// were sometimes served with that MIME type).
    pub fn is_media(&self) -> bool {
        !matches!(self.mimetype.as_str(), "text/html" | "text/plain")
    }

    pub fn media_extension(&self) -> Option<String> {
        if !self.is_media() {
            return None;
        }
        self.original
            .rsplit('.')
            .next()
            .filter(|ext| ext.len() <= 5 && !ext.contains('/'))
            .map(|ext| ext.to_ascii_lowercase())
    }
}

/// Parse the CDX API's default `json` output format: a header row followed
/// by one array per capture.
pub fn parse_cdx_rows(body: &str) -> Vec<CdxCapture> {
    let Ok(rows) = serde_json::from_str::<Vec<Vec<String>>>(body) else {
        return Vec::new();
    };
    let Some((header, rows)) = rows.split_first() else {
        return Vec::new();
    };
    let col = |name: &str| header.iter().position(|h| h == name);
    let (Some(urlkey_i), Some(ts_i), Some(orig_i), Some(mime_i), Some(status_i), Some(digest_i)) = (
        col("urlkey"),
        col("timestamp"),
        col("original"),
        col("mimetype"),
        col("statuscode"),
        col("digest"),
    ) else {
        return Vec::new();
    };
    rows.iter()
        .filter_map(|row| {
            Some(CdxCapture {
                urlkey: row.get(urlkey_i)?.clone(),
                timestamp: row.get(ts_i)?.clone(),
                original: row.get(orig_i)?.clone(),
                mimetype: row.get(mime_i)?.clone(),
                statuscode: row.get(status_i)?.clone(),
                digest: row.get(digest_i)?.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_html_and_plain_text_as_non_media() {
        let html = CdxCapture {
            urlkey: "".into(),
            timestamp: "".into(),
            original: "http://a/b".into(),
            mimetype: "text/html".into(),
            statuscode: "200".into(),
            digest: "".into(),
        };
        assert!(!html.is_media());
        let plain = CdxCapture { mimetype: "text/plain".into(), ..html.clone() };
        assert!(!plain.is_media());
    }

    #[test]
    fn classifies_other_mime_types_as_media() {
        let capture = CdxCapture {
            urlkey: "".into(),
            timestamp: "".into(),
            original: "http://a/movie.mpg".into(),
            mimetype: "video/mpeg".into(),
            statuscode: "200".into(),
            digest: "".into(),
        };
        assert!(capture.is_media());
        assert_eq!(capture.media_extension().as_deref(), Some("mpg"));
    }

    #[test]
    fn parses_cdx_json_rows() {
        let body = r#"[["urlkey","timestamp","original","mimetype","statuscode","digest"],
                       ["com,example)/","20200101000000","http://example.com/","text/html","200","ABC123"]]"#;
        let rows = parse_cdx_rows(body);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].timestamp, "20200101000000");
    }
}
