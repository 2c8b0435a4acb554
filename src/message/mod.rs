//! Outbound message model.
//!
//! [`Message`] is the user-level value handed to the mailer; it renders to
//! a [`MimeMessage`] wire form, which is what signing and encryption
//! transform.

pub mod address;
pub mod mime;
pub mod payload;

use base64::Engine;

use self::mime::{make_boundary, make_msgid, MimeMessage};

/// A user-level outbound mail message. Immutable once handed to the
/// mailer; every pipeline stage works on derived [`MimeMessage`] values.
#[derive(Debug, Clone)]
pub struct Message {
    pub from_email: String,
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub subject: String,
    pub body: String,
    /// Charset declared on text parts.
    pub encoding: String,
    alternatives: Vec<Alternative>,
    attachments: Vec<Attachment>,
    extra_headers: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
struct Alternative {
    content: String,
    mime_type: String,
}

/// A file attached to a message; base64-encoded on the wire.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub filename: String,
    pub mime_type: String,
    pub content: Vec<u8>,
}

impl Message {
    pub fn new(
        subject: impl Into<String>,
        body: impl Into<String>,
        from_email: impl Into<String>,
        to: Vec<String>,
    ) -> Self {
        Self {
            from_email: from_email.into(),
            to,
            cc: Vec::new(),
            bcc: Vec::new(),
            subject: subject.into(),
            body: body.into(),
            encoding: "utf-8".to_string(),
            alternatives: Vec::new(),
            attachments: Vec::new(),
            extra_headers: Vec::new(),
        }
    }

    pub fn with_cc(mut self, cc: Vec<String>) -> Self {
        self.cc = cc;
        self
    }

    pub fn with_bcc(mut self, bcc: Vec<String>) -> Self {
        self.bcc = bcc;
        self
    }

    /// Attach an alternative rendering of the body, e.g. text/html.
    pub fn with_alternative(
        mut self,
        content: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        self.alternatives.push(Alternative {
            content: content.into(),
            mime_type: mime_type.into(),
        });
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.push((name.into(), value.into()));
        self
    }

    /// All recipients, to/cc/bcc merged, in declaration order.
    pub fn recipients(&self) -> Vec<String> {
        self.to
            .iter()
            .chain(self.cc.iter())
            .chain(self.bcc.iter())
            .cloned()
            .collect()
    }

    /// Render the outer envelope. Bcc recipients never appear as a header;
    /// they ride only on the transport envelope.
    pub fn to_mime(&self, message_id_domain: &str) -> MimeMessage {
        let mut wire = MimeMessage::new();

        wire.append_header("From", &self.from_email);
        if !self.to.is_empty() {
            wire.append_header("To", &self.to.join(", "));
        }
        if !self.cc.is_empty() {
            wire.append_header("Cc", &self.cc.join(", "));
        }
        if !self.subject.is_empty() {
            wire.append_header("Subject", &self.subject);
        }
        wire.append_header("Date", &chrono::Utc::now().to_rfc2822());
        wire.append_header("Message-ID", &make_msgid(message_id_domain));
        for (name, value) in &self.extra_headers {
            wire.append_header(name, value);
        }
        wire.append_header("MIME-Version", "1.0");

        let (content_type, body) = self.build_content();
        wire.append_header("Content-Type", &content_type);
        wire.set_body(body);

        wire
    }

    fn build_content(&self) -> (String, String) {
        let text_type = format!("text/plain; charset=\"{}\"", self.encoding);
        let text_body = normalize_crlf(&self.body);

        let (mut content_type, mut body) = if self.alternatives.is_empty() {
            (text_type, text_body)
        } else {
            let boundary = make_boundary();
            let mut parts = vec![render_part(&text_type, &text_body)];
            for alternative in &self.alternatives {
                let part_type =
                    format!("{}; charset=\"{}\"", alternative.mime_type, self.encoding);
                parts.push(render_part(&part_type, &normalize_crlf(&alternative.content)));
            }
            (
                format!("multipart/alternative; boundary=\"{}\"", boundary),
                join_multipart(&boundary, &parts),
            )
        };

        if !self.attachments.is_empty() {
            let boundary = make_boundary();
            let mut parts = vec![render_part(&content_type, &body)];
            for attachment in &self.attachments {
                parts.push(render_attachment(attachment));
            }
            content_type = format!("multipart/mixed; boundary=\"{}\"", boundary);
            body = join_multipart(&boundary, &parts);
        }

        (content_type, body)
    }
}

fn render_part(content_type: &str, body: &str) -> String {
    format!("Content-Type: {}\r\n\r\n{}", content_type, body)
}

fn render_attachment(attachment: &Attachment) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(&attachment.content);
    let wrapped: Vec<&str> = encoded
        .as_bytes()
        .chunks(76)
        .map(|chunk| std::str::from_utf8(chunk).unwrap_or_default())
        .collect();
    format!(
        "Content-Type: {}\r\nContent-Transfer-Encoding: base64\r\nContent-Disposition: attachment; filename=\"{}\"\r\n\r\n{}",
        attachment.mime_type,
        attachment.filename,
        wrapped.join("\r\n")
    )
}

fn join_multipart(boundary: &str, parts: &[String]) -> String {
    let mut out = String::new();
    for part in parts {
        out.push_str("--");
        out.push_str(boundary);
        out.push_str("\r\n");
        out.push_str(part);
        out.push_str("\r\n");
    }
    out.push_str("--");
    out.push_str(boundary);
    out.push_str("--\r\n");
    out
}

fn normalize_crlf(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\n', "\r\n")
}
