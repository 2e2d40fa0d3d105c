//! The proxy process's line-oriented stdio protocol (spec §4.7). Every
//! event the proxy emits on stdout is one bracketed-field line; every
//! command the Recorder sends on stdin is an assignment to
//! `current_timestamp`, mirroring the original addon's `exec(command,
//! globals())` loop but restricted to the one operation it actually used.

use std::fmt;

/// One line emitted by the proxy process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyEvent {
    /// `[REQUEST] [http_version method] [url] [flow_id]`
    Request { method_line: String, url: String, flow_id: String },
    /// `[RESPONSE] [status] [mark] [content-type] [url] [flow_id]`
    Response { status: u16, mark: String, content_type: String, url: String, flow_id: String },
    /// `[SAVE] [url]` — live backfill candidate.
    Save { url: String },
    /// `[RAM] [url]` — RealMedia playlist pointing at an archived stream.
    Ram { url: String },
    /// Echo of an executed command, e.g. `[current_timestamp = '...']`.
    CommandAck { command: String },
    /// A line that didn't match any known shape.
    Unknown(String),
}

impl ProxyEvent {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let fields = bracketed_fields(line);
        match fields.first().map(String::as_str) {
            Some("REQUEST") if fields.len() == 4 => ProxyEvent::Request {
                method_line: fields[1].clone(),
                url: fields[2].clone(),
                flow_id: fields[3].clone(),
            },
            Some("RESPONSE") if fields.len() == 6 => match fields[1].parse() {
                Ok(status) => ProxyEvent::Response {
                    status,
                    mark: fields[2].clone(),
                    content_type: fields[3].clone(),
                    url: fields[4].clone(),
                    flow_id: fields[5].clone(),
                },
                Err(_) => ProxyEvent::Unknown(line.to_string()),
            },
            Some("SAVE") if fields.len() == 2 => ProxyEvent::Save { url: fields[1].clone() },
            Some("RAM") if fields.len() == 2 => ProxyEvent::Ram { url: fields[1].clone() },
            Some(single) if fields.len() == 1 => ProxyEvent::CommandAck { command: single.to_string() },
            _ => ProxyEvent::Unknown(line.to_string()),
        }
    }
}

fn bracketed_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut rest = line;
    while let Some(start) = rest.find('[') {
        let Some(end) = rest[start..].find(']') else { break };
        fields.push(rest[start + 1..start + end].to_string());
        rest = &rest[start + end + 1..];
    }
    fields
}

/// A command sent to the proxy on stdin. Only assignment to
/// `current_timestamp` is valid (spec §4.7 point 8): set to scope the
/// proxy to one snapshot, or clear to go transparent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyCommand {
    SetTimestamp(String),
    ClearTimestamp,
}

impl fmt::Display for ProxyCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyCommand::SetTimestamp(ts) => write!(f, "current_timestamp = '{ts}'"),
            ProxyCommand::ClearTimestamp => write!(f, "current_timestamp = None"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_request_line() {
        let event = ProxyEvent::parse(
            "[REQUEST] [HTTP/1.1 GET] [https://web.archive.org/web/20200101000000if_/http://a.example/] [abc]",
        );
        assert_eq!(
            event,
            ProxyEvent::Request {
                method_line: "HTTP/1.1 GET".into(),
                url: "https://web.archive.org/web/20200101000000if_/http://a.example/".into(),
                flow_id: "abc".into(),
            }
        );
    }

    #[test]
    fn parses_response_line() {
        let event = ProxyEvent::parse(
            "[RESPONSE] [200] [LIVE, VRML] [text/html] [http://a.example/] [abc]",
        );
        assert_eq!(
            event,
            ProxyEvent::Response {
                status: 200,
                mark: "LIVE, VRML".into(),
                content_type: "text/html".into(),
                url: "http://a.example/".into(),
                flow_id: "abc".into(),
            }
        );
    }

    #[test]
    fn parses_save_and_ram() {
        assert_eq!(
            ProxyEvent::parse("[SAVE] [http://a.example/]"),
            ProxyEvent::Save { url: "http://a.example/".into() }
        );
        assert_eq!(
            ProxyEvent::parse("[RAM] [http://a.example/stream.ram]"),
            ProxyEvent::Ram { url: "http://a.example/stream.ram".into() }
        );
    }

    #[test]
    fn unrecognized_line_is_unknown() {
        assert_eq!(
            ProxyEvent::parse("garbage with no brackets"),
            ProxyEvent::Unknown("garbage with no brackets".into())
        );
    }

    #[test]
    fn command_display_matches_eval_protocol() {
        assert_eq!(
            ProxyCommand::SetTimestamp("20200101000000".into()).to_string(),
            "current_timestamp = '20200101000000'"
        );
        assert_eq!(ProxyCommand::ClearTimestamp.to_string(), "current_timestamp = None");
    }
}
