use super::mime::MimeMessage;

/// The structural headers that travel with the protected payload. Routing
/// and identity headers (From, Subject, Received, ...) stay on the outer
/// envelope.
const PAYLOAD_MIME_HEADERS: [&str; 3] = ["Content-Disposition", "Content-Type", "MIME-Version"];

/// Build the minimal sub-message whose canonical string is fed to sign and
/// encrypt: the current body plus exactly the structural headers above,
/// copied when present and omitted when absent.
pub fn extract_payload(message: &MimeMessage) -> MimeMessage {
    let mut payload = MimeMessage::new();
    for name in PAYLOAD_MIME_HEADERS {
        if let Some(value) = message.header(name) {
            payload.append_header(name, value);
        }
    }
    payload.set_body(message.body());
    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copies_only_whitelisted_headers() {
        let mut msg = MimeMessage::new();
        msg.append_header("From", "a@example.com");
        msg.append_header("Subject", "secret subject");
        msg.append_header("Content-Type", "text/plain; charset=\"utf-8\"");
        msg.append_header("MIME-Version", "1.0");
        msg.append_header("Message-ID", "<id@example.com>");
        msg.set_body("the body");

        let payload = extract_payload(&msg);
        assert_eq!(payload.headers().len(), 2);
        assert_eq!(
            payload.header("Content-Type"),
            Some("text/plain; charset=\"utf-8\"")
        );
        assert_eq!(payload.header("MIME-Version"), Some("1.0"));
        assert_eq!(payload.header("Subject"), None);
        assert_eq!(payload.header("From"), None);
        assert_eq!(payload.body(), "the body");
    }

    #[test]
    fn absent_headers_are_omitted_not_defaulted() {
        let mut msg = MimeMessage::new();
        msg.append_header("Subject", "x");
        msg.set_body("body only");

        let payload = extract_payload(&msg);
        assert!(payload.headers().is_empty());
        assert_eq!(payload.body(), "body only");
    }

    #[test]
    fn content_disposition_travels_when_present() {
        let mut msg = MimeMessage::new();
        msg.append_header("Content-Disposition", "attachment; filename=\"smime.p7m\"");
        msg.set_body("data");

        let payload = extract_payload(&msg);
        assert_eq!(
            payload.header("Content-Disposition"),
            Some("attachment; filename=\"smime.p7m\"")
        );
    }
}
