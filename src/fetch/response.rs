//! Response header and body handling.

use std::time::Instant;

use bytes::BytesMut;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::header::{HeaderMap, CONTENT_TYPE};

use super::BodyRead;
use crate::config::MAX_RESPONSE_BODY_SIZE;
use crate::error_handling::FetchError;

/// Extracts the `charset` parameter of the `Content-Type` header, lowercased.
pub(super) fn charset(headers: &HeaderMap) -> Option<String> {
    let content_type = headers.get(CONTENT_TYPE)?.to_str().ok()?;
    charset_from_content_type(content_type)
}

fn charset_from_content_type(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if !name.trim().eq_ignore_ascii_case("charset") {
            return None;
        }
        let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
        (!value.is_empty()).then(|| value.to_ascii_lowercase())
    })
}

/// Reads the body up to `MAX_RESPONSE_BODY_SIZE`, recording when the first
/// data byte arrived and when reading stopped.
pub(super) async fn read_body(
    mut body: Incoming,
    url: &str,
    start: Instant,
) -> Result<BodyRead, FetchError> {
    let mut buf = BytesMut::new();
    let mut first_byte_at = None;

    while let Some(frame) = body.frame().await {
        let frame = frame.map_err(|e| FetchError::protocol(url, format!("body read failed: {e}")))?;
        let Some(chunk) = frame.data_ref() else {
            continue;
        };
        if chunk.is_empty() {
            continue;
        }
        if first_byte_at.is_none() {
            first_byte_at = Some(start.elapsed());
        }
        let remaining = MAX_RESPONSE_BODY_SIZE - buf.len();
        if chunk.len() >= remaining {
            buf.extend_from_slice(&chunk[..remaining]);
            log::debug!("Body of {url} truncated at {MAX_RESPONSE_BODY_SIZE} bytes");
            break;
        }
        buf.extend_from_slice(chunk);
    }

    Ok(BodyRead::new(buf, first_byte_at, start.elapsed()))
}

#[cfg(test)]
mod tests {
    use super::charset_from_content_type;

    #[test]
    fn test_charset_from_content_type() {
        assert_eq!(
            charset_from_content_type("text/html; charset=UTF-8"),
            Some("utf-8".to_string())
        );
        assert_eq!(
            charset_from_content_type("text/html;Charset=\"ISO-8859-1\""),
            Some("iso-8859-1".to_string())
        );
        assert_eq!(charset_from_content_type("text/html"), None);
        assert_eq!(charset_from_content_type("text/html; charset="), None);
        assert_eq!(
            charset_from_content_type("text/html; boundary=x; charset=windows-1252"),
            Some("windows-1252".to_string())
        );
    }
}
