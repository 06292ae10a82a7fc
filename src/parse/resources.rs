//! Resource hostname extraction.

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::sync::LazyLock;

use encoding_rs::{Encoding, UTF_8};
use scraper::{Html, Selector};
use url::Url;

const RESOURCE_SELECTOR_STR: &str = "img[src], script[src], link[href]";

static RESOURCE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(RESOURCE_SELECTOR_STR).expect("resource selector is a valid CSS selector")
});

/// Decodes a response body using its declared charset.
///
/// A byte order mark takes precedence over the declared label. Unknown or
/// missing labels fall back to UTF-8; malformed sequences become U+FFFD.
pub fn decode_body<'a>(bytes: &'a [u8], encoding: Option<&str>) -> Cow<'a, str> {
    let declared = encoding
        .and_then(|label| Encoding::for_label(label.trim().as_bytes()))
        .unwrap_or(UTF_8);
    let (text, _, _) = declared.decode(bytes);
    text
}

/// Extracts the hostnames of resources embedded in an HTML page.
///
/// Reads `src` of `img` and `script` tags and `href` of `link` tags. Each value
/// must be an absolute URL or a protocol-relative `//host/...` reference; its
/// host is kept. Empty, relative, host-less and unparseable values are skipped.
/// Other tags (`a`, `iframe`, ...) are ignored.
///
/// # Arguments
///
/// * `body` - Raw response body
/// * `encoding` - Declared charset, lowercased
pub fn extract_resource_hostnames(body: &[u8], encoding: Option<&str>) -> BTreeSet<String> {
    let html = decode_body(body, encoding);
    let document = Html::parse_document(&html);

    document
        .select(&RESOURCE_SELECTOR)
        .filter_map(|element| {
            let attr = match element.value().name() {
                "link" => "href",
                _ => "src",
            };
            element.value().attr(attr)
        })
        .filter_map(resource_host)
        .collect()
}

fn resource_host(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let parsed = if value.starts_with("//") {
        Url::parse(&format!("http:{value}"))
    } else {
        Url::parse(value)
    };
    let url = parsed.ok()?;
    url.host_str()
        .filter(|host| !host.is_empty())
        .map(|host| host.to_ascii_lowercase())
}
