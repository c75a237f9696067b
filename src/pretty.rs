//! Human-readable renderings of requests and responses for log lines and
//! error messages.

use std::fmt::Write;

use reqwest::header::{self, HeaderMap, HeaderName};

use crate::{RequestSpec, Response};

const BODY_PREVIEW_CHARS: usize = 256;

/// Renders a request as `METHOD url?query headers={..} body=..`.
///
/// Credentials are replaced with `<redacted>`.
pub fn prettify_request(spec: &RequestSpec) -> String {
    let mut out = format!("{} {}", spec.method(), spec.url());

    let query = spec.query_pairs();
    if !query.is_empty() {
        let separator = if spec.url().contains('?') { '&' } else { '?' };
        out.push(separator);
        let pairs: Vec<String> = query.iter().map(|(k, v)| format!("{k}={v}")).collect();
        out.push_str(&pairs.join("&"));
    }

    if !spec.headers().is_empty() {
        let _ = write!(out, " headers={}", render_headers(spec.headers()));
    }

    if let Some(body) = spec.body_bytes() {
        match std::str::from_utf8(body) {
            Ok(text) => {
                let preview: String = text.chars().take(BODY_PREVIEW_CHARS).collect();
                let ellipsis = if text.chars().count() > BODY_PREVIEW_CHARS {
                    "..."
                } else {
                    ""
                };
                let _ = write!(out, " body={preview}{ellipsis}");
            }
            Err(_) => {
                let _ = write!(out, " body=<{} bytes>", body.len());
            }
        }
    }

    if let Some(timeout) = spec.timeout_duration() {
        let _ = write!(out, " timeout={}ms", timeout.as_millis());
    }

    out
}

/// Renders a response as `<Response [status]> url`, with the attempt that
/// produced it.
pub fn prettify_response(response: &Response) -> String {
    let mut out = format!("<Response [{}]> {}", response.status(), response.url());
    let _ = write!(out, " attempt={}", response.attempt());
    if let Some(length) = response.content_length() {
        let _ = write!(out, " content_length={length}");
    }
    out
}

fn render_headers(headers: &HeaderMap) -> String {
    let rendered: Vec<String> = headers
        .iter()
        .map(|(name, value)| {
            let value = if is_redacted(name) || value.is_sensitive() {
                "<redacted>".to_owned()
            } else {
                String::from_utf8_lossy(value.as_bytes()).into_owned()
            };
            format!("{name}: {value}")
        })
        .collect();
    format!("{{{}}}", rendered.join(", "))
}

fn is_redacted(name: &HeaderName) -> bool {
    *name == header::AUTHORIZATION
        || *name == header::COOKIE
        || *name == header::PROXY_AUTHORIZATION
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::prettify_request;
    use crate::RequestSpec;

    #[test]
    fn renders_method_url_and_query() {
        let spec = RequestSpec::get("http://localhost:5000/ping")
            .query("a", "1")
            .query("b", "2");
        assert_eq!(
            prettify_request(&spec),
            "GET http://localhost:5000/ping?a=1&b=2"
        );
    }

    #[test]
    fn redacts_authorization_value() {
        let spec = RequestSpec::get("http://localhost/protected/ping")
            .bearer_auth("secret-token")
            .unwrap();
        let rendered = prettify_request(&spec);
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("secret-token"));
    }

    #[test]
    fn truncates_long_text_bodies() {
        let spec = RequestSpec::post("http://localhost/echo").body("x".repeat(1_000));
        let rendered = prettify_request(&spec);
        assert!(rendered.ends_with("..."));
        assert!(rendered.len() < 400);
    }

    #[test]
    fn summarises_binary_bodies_and_timeout() {
        let spec = RequestSpec::post("http://localhost/upload")
            .body(vec![0xffu8, 0xfe, 0x00])
            .timeout(Duration::from_millis(250));
        assert_eq!(
            prettify_request(&spec),
            "POST http://localhost/upload body=<3 bytes> timeout=250ms"
        );
    }

    #[test]
    fn display_matches_prettify() {
        let spec = RequestSpec::delete("http://localhost/item/1");
        assert_eq!(spec.to_string(), prettify_request(&spec));
    }
}
