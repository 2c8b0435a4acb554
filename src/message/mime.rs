//! Generic RFC 5322 wire form: an ordered header list plus a flat body.
//!
//! Signing and encryption splice a PKCS7 structure's headers and body into
//! an existing message, so headers are case-preserved, ordered, and may
//! repeat.

use uuid::Uuid;

/// A message in wire form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MimeMessage {
    headers: Vec<(String, String)>,
    body: String,
}

impl MimeMessage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split raw wire text into headers and body. Folded (continuation)
    /// header lines are unfolded with a single space. Input whose first
    /// line is not a header is treated as all body.
    pub fn parse(raw: &str) -> Self {
        let (head, body) = split_head_body(raw);

        let mut message = Self {
            headers: Vec::new(),
            body: body.to_string(),
        };

        let mut current: Option<(String, String)> = None;
        for line in head.lines() {
            if line.starts_with(' ') || line.starts_with('\t') {
                if let Some((_, value)) = current.as_mut() {
                    value.push(' ');
                    value.push_str(line.trim_start());
                }
                continue;
            }
            if let Some(header) = current.take() {
                message.headers.push(header);
            }
            if let Some((name, value)) = line.split_once(':') {
                current = Some((name.trim().to_string(), value.trim().to_string()));
            }
        }
        if let Some(header) = current.take() {
            message.headers.push(header);
        }

        message
    }

    /// First header value matching `name`, case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = body.into();
    }

    pub fn append_header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_string(), value.to_string()));
    }

    /// Drop every header matching `name` and append the new value.
    pub fn replace_header(&mut self, name: &str, value: &str) {
        self.remove_header(name);
        self.append_header(name, value);
    }

    pub fn remove_header(&mut self, name: &str) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
    }

    /// Discard any existing Message-ID and assign a freshly generated one
    /// keyed on `domain`. Signing and encryption change the payload, which
    /// invalidates the old identifier.
    pub fn regenerate_message_id(&mut self, domain: &str) {
        self.replace_header("Message-ID", &make_msgid(domain));
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.body.is_empty()
    }

    /// Canonical wire string: CRLF-terminated headers, blank line, body.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (name, value) in &self.headers {
            out.push_str(name);
            out.push_str(": ");
            out.push_str(value);
            out.push_str("\r\n");
        }
        out.push_str("\r\n");
        out.push_str(&self.body);
        out
    }
}

fn split_head_body(raw: &str) -> (&str, &str) {
    let first_line = raw.lines().next().unwrap_or("");
    if !first_line.contains(':') {
        return ("", raw);
    }
    // split at the earliest blank line, whichever line-ending style it
    // uses; later blank lines belong to the body
    match (raw.find("\r\n\r\n"), raw.find("\n\n")) {
        (Some(crlf), Some(lf)) if lf < crlf => (&raw[..lf], &raw[lf + 2..]),
        (Some(crlf), _) => (&raw[..crlf], &raw[crlf + 4..]),
        (None, Some(lf)) => (&raw[..lf], &raw[lf + 2..]),
        (None, None) => (raw, ""),
    }
}

/// Generate a fresh RFC 5322 message identifier for the given domain.
pub fn make_msgid(domain: &str) -> String {
    format!("<{}@{}>", Uuid::new_v4().simple(), domain)
}

/// Random boundary for multipart bodies.
pub fn make_boundary() -> String {
    format!("=_{}", hex::encode(rand::random::<[u8; 16]>()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_headers_and_body() {
        let msg = MimeMessage::parse("Subject: Hello\r\nMIME-Version: 1.0\r\n\r\nBody text");
        assert_eq!(msg.header("Subject"), Some("Hello"));
        assert_eq!(msg.header("subject"), Some("Hello"));
        assert_eq!(msg.header("MIME-Version"), Some("1.0"));
        assert_eq!(msg.body(), "Body text");
    }

    #[test]
    fn parse_unfolds_continuation_lines() {
        let msg = MimeMessage::parse(
            "Content-Type: multipart/signed;\r\n protocol=\"application/x-pkcs7-signature\";\r\n boundary=\"xyz\"\r\n\r\nbody",
        );
        let value = msg.header("Content-Type").unwrap();
        assert!(value.contains("multipart/signed; protocol=\"application/x-pkcs7-signature\""));
        assert!(value.contains("boundary=\"xyz\""));
    }

    #[test]
    fn parse_without_headers_is_all_body() {
        let msg = MimeMessage::parse("just a body line\nanother");
        assert!(msg.headers().is_empty());
        assert_eq!(msg.body(), "just a body line\nanother");
    }

    #[test]
    fn parse_accepts_bare_lf_separator() {
        let msg = MimeMessage::parse("Subject: x\n\nbody");
        assert_eq!(msg.header("Subject"), Some("x"));
        assert_eq!(msg.body(), "body");
    }

    #[test]
    fn render_round_trips() {
        let mut msg = MimeMessage::new();
        msg.append_header("Subject", "Test");
        msg.append_header("MIME-Version", "1.0");
        msg.set_body("content");

        let rendered = msg.render();
        assert_eq!(rendered, "Subject: Test\r\nMIME-Version: 1.0\r\n\r\ncontent");
        assert_eq!(MimeMessage::parse(&rendered), msg);
    }

    #[test]
    fn replace_header_drops_all_matches() {
        let mut msg = MimeMessage::new();
        msg.append_header("X-Tag", "one");
        msg.append_header("X-Tag", "two");
        msg.replace_header("x-tag", "three");

        let tags: Vec<&str> = msg
            .headers()
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case("X-Tag"))
            .map(|(_, v)| v.as_str())
            .collect();
        assert_eq!(tags, vec!["three"]);
    }

    #[test]
    fn regenerate_message_id_replaces_old_one() {
        let mut msg = MimeMessage::new();
        msg.append_header("Message-ID", "<old@example.com>");
        msg.regenerate_message_id("example.com");

        let id = msg.header("Message-ID").unwrap();
        assert_ne!(id, "<old@example.com>");
        assert!(id.starts_with('<'));
        assert!(id.ends_with("@example.com>"));
    }

    #[test]
    fn msgids_are_unique() {
        assert_ne!(make_msgid("example.com"), make_msgid("example.com"));
    }
}
