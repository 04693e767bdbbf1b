//! Browser-like request headers.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::site::SiteHandler;

/// Headers a desktop Chrome sends for a top-level navigation.
///
/// `Accept-Encoding` is left to reqwest so responses are always decodable.
const BROWSER_HEADERS: [(&str, &str); 13] = [
    (
        "accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8",
    ),
    ("accept-language", "pt-PT,pt;q=0.9,en-US;q=0.8,en;q=0.7"),
    ("connection", "keep-alive"),
    ("upgrade-insecure-requests", "1"),
    ("sec-fetch-dest", "document"),
    ("sec-fetch-mode", "navigate"),
    ("sec-fetch-site", "none"),
    ("sec-fetch-user", "?1"),
    ("cache-control", "max-age=0"),
    (
        "sec-ch-ua",
        "\"Google Chrome\";v=\"131\", \"Chromium\";v=\"131\", \"Not_A Brand\";v=\"24\"",
    ),
    ("sec-ch-ua-mobile", "?0"),
    ("sec-ch-ua-platform", "\"macOS\""),
    ("pragma", "no-cache"),
];

/// Browser defaults overlaid with the site handler's headers for `url`.
pub(super) fn headers_for(url: &str, handler: SiteHandler) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(BROWSER_HEADERS.len());
    for (name, value) in BROWSER_HEADERS {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }

    for (name, value) in &handler.custom_headers(&extract_domain(url)) {
        headers.insert(name.clone(), value.clone());
    }
    headers
}

/// Host (with explicit port) of `url`. Falls back to the full string when it
/// does not parse.
pub(super) fn extract_domain(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| {
            u.host_str().map(|host| match u.port() {
                Some(port) => format!("{host}:{port}"),
                None => host.to_owned(),
            })
        })
        .unwrap_or_else(|| url.to_owned())
}
