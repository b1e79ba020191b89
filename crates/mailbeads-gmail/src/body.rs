// SPDX-FileCopyrightText: 2026 Mailbeads Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Body decoding and MIME-tree text extraction.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use crate::types::MessagePart;

/// Prefix for bodies that only had an HTML part.
pub const HTML_PREFIX: &str = "(HTML content)\n";

/// Returned when no part carries readable text.
pub const NO_BODY: &str = "(No readable body found)";

/// Decode Gmail's base64url body data. Trailing padding is optional.
pub fn decode_base64url(data: &str) -> Option<String> {
    let trimmed = data.trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD.decode(trimmed.as_bytes()).ok()?;
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

/// Extract the readable body of a message payload.
///
/// Order: data on the payload itself, then the first `text/plain` part
/// anywhere in the tree, then the first `text/html` part (prefixed), then a
/// fixed placeholder.
pub fn extract_body(payload: &MessagePart) -> String {
    if let Some(text) = payload.data().and_then(decode_base64url) {
        return text;
    }
    if let Some(text) = find_part(payload, "text/plain") {
        return text;
    }
    if let Some(html) = find_part(payload, "text/html") {
        return format!("{HTML_PREFIX}{html}");
    }
    NO_BODY.to_string()
}

fn find_part(part: &MessagePart, mime_type: &str) -> Option<String> {
    part.parts.iter().find_map(|child| {
        let own = child
            .mime_type
            .eq_ignore_ascii_case(mime_type)
            .then(|| child.data().and_then(decode_base64url))
            .flatten();
        own.or_else(|| find_part(child, mime_type))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PartBody;

    fn encode(text: &str) -> String {
        URL_SAFE_NO_PAD.encode(text)
    }

    fn leaf(mime_type: &str, text: &str) -> MessagePart {
        MessagePart {
            mime_type: mime_type.into(),
            body: Some(PartBody {
                data: Some(encode(text)),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn multipart(mime_type: &str, parts: Vec<MessagePart>) -> MessagePart {
        MessagePart {
            mime_type: mime_type.into(),
            parts,
            ..Default::default()
        }
    }

    #[test]
    fn decodes_with_and_without_padding() {
        assert_eq!(decode_base64url("aGk").as_deref(), Some("hi"));
        assert_eq!(decode_base64url("aGk=").as_deref(), Some("hi"));
        // url-safe alphabet
        assert_eq!(decode_base64url("Pz8-").as_deref(), Some("??>"));
        assert!(decode_base64url("!!!").is_none());
    }

    #[test]
    fn direct_body_wins() {
        let payload = leaf("text/plain", "hello there");
        assert_eq!(extract_body(&payload), "hello there");
    }

    #[test]
    fn plain_preferred_over_html() {
        let payload = multipart(
            "multipart/alternative",
            vec![leaf("text/html", "<p>hi</p>"), leaf("text/plain", "hi")],
        );
        assert_eq!(extract_body(&payload), "hi");
    }

    #[test]
    fn nested_plain_is_found() {
        let payload = multipart(
            "multipart/mixed",
            vec![
                multipart(
                    "multipart/alternative",
                    vec![leaf("text/plain", "nested"), leaf("text/html", "<b>n</b>")],
                ),
                leaf("application/pdf", "%PDF"),
            ],
        );
        assert_eq!(extract_body(&payload), "nested");
    }

    #[test]
    fn html_only_is_prefixed() {
        let payload = multipart("multipart/alternative", vec![leaf("text/html", "<p>x</p>")]);
        assert_eq!(extract_body(&payload), "(HTML content)\n<p>x</p>");
    }

    #[test]
    fn nothing_readable() {
        let payload = multipart("multipart/mixed", vec![leaf("image/png", "png")]);
        assert_eq!(extract_body(&payload), NO_BODY);
        assert_eq!(extract_body(&MessagePart::default()), NO_BODY);
    }
}
