//! Mapping lookup results to HTTP responses.
//!
//! | Result | Status | Body |
//! |---|---|---|
//! | `NotFound` | 404 | HTML diagnostic with path and fingerprint |
//! | `OutOfSync` | 500 | HTML diagnostic |
//! | `Gone` | 410 | HTML diagnostic |
//! | `Ok`, `If-None-Match` hit | 304 | empty |
//! | `Ok` | 200 | payload as stored |
//! | lookup error | 500 | HTML diagnostic |
//!
//! Compressed payloads are passed through with `Content-Encoding: deflate`.

use crate::mime::MimeTable;
use axum::body::Body;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use bigpack_format::Fingerprint;
use bigpack_storage::{Content, ContentResult, StorageError};

/// Renders lookup results as responses
#[derive(Debug, Clone)]
pub struct ServingAdapter {
    mime: MimeTable,
    cache_control: HeaderValue,
}

/// What was asked for, as seen by the adapter
#[derive(Debug, Clone, Copy)]
pub struct Requested<'a> {
    /// Normalized archive key
    pub key: &'a str,
    /// Path fingerprint of the key
    pub fingerprint: &'a Fingerprint,
    /// Raw `If-None-Match` header, if sent
    pub if_none_match: Option<&'a str>,
}

impl<'a> Requested<'a> {
    /// Collect the request details the adapter needs
    pub fn new(key: &'a str, fingerprint: &'a Fingerprint, headers: &'a HeaderMap) -> Self {
        Self {
            key,
            fingerprint,
            if_none_match: headers
                .get(header::IF_NONE_MATCH)
                .and_then(|value| value.to_str().ok()),
        }
    }
}

impl ServingAdapter {
    /// Create an adapter using `mime` for content types and `max_age`
    /// seconds for `Cache-Control`
    pub fn new(mime: MimeTable, max_age: u64) -> Self {
        let cache_control = HeaderValue::from_str(&format!("public, max-age={max_age}"))
            .unwrap_or_else(|_| HeaderValue::from_static("public"));
        Self {
            mime,
            cache_control,
        }
    }

    /// MIME table in use
    pub const fn mime(&self) -> &MimeTable {
        &self.mime
    }

    /// Render a lookup result
    pub fn render(&self, requested: &Requested<'_>, result: ContentResult) -> Response {
        match result {
            ContentResult::NotFound => html_error(
                StatusCode::NOT_FOUND,
                &format!(
                    "<h1>Error 404 - File <u>{}</u> Not Found</h1>\n<p>Fingerprint: {}</p>",
                    escape_html(requested.key),
                    requested.fingerprint
                ),
            ),
            ContentResult::OutOfSync => html_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "<h1>Error 500 - Source files out of sync</h1>",
            ),
            ContentResult::Gone => html_error(
                StatusCode::GONE,
                &format!(
                    "<h1>Error 410 - File <u>{}</u> Gone</h1>",
                    escape_html(requested.key)
                ),
            ),
            ContentResult::Ok(content) => self.content(requested, content),
        }
    }

    /// Render a lookup failure
    pub fn failure(&self, requested: &Requested<'_>, err: &StorageError) -> Response {
        tracing::error!("Lookup of {} failed: {}", requested.key, err);
        html_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "<h1>Error 500 - Internal Server Error</h1>",
        )
    }

    fn content(&self, requested: &Requested<'_>, content: Content) -> Response {
        let etag = content.etag();
        let etag_value = HeaderValue::from_str(&etag).unwrap_or_else(|_| HeaderValue::from_static(""));

        if requested
            .if_none_match
            .is_some_and(|header| etag_matches(header, &etag))
        {
            return (
                StatusCode::NOT_MODIFIED,
                [
                    (header::ETAG, etag_value),
                    (header::CACHE_CONTROL, self.cache_control.clone()),
                ],
            )
                .into_response();
        }

        let mime = self.mime.for_key(requested.key);
        let content_type =
            HeaderValue::from_str(mime).unwrap_or_else(|_| HeaderValue::from_static("text/html"));

        let mut response = Response::new(Body::from(content.payload));
        let headers = response.headers_mut();
        headers.insert(header::CONTENT_TYPE, content_type);
        headers.insert(header::ETAG, etag_value);
        headers.insert(header::CACHE_CONTROL, self.cache_control.clone());
        if content.compressed {
            headers.insert(header::CONTENT_ENCODING, HeaderValue::from_static("deflate"));
        }
        response
    }
}

/// Whether an `If-None-Match` header names `etag`.
///
/// The header may list several tags separated by commas; each may be
/// quoted and carry a `W/` weak prefix. Only the content fingerprint itself
/// matches, so `*` does not.
pub fn etag_matches(header: &str, etag: &str) -> bool {
    header.split(',').any(|candidate| {
        let candidate = candidate.trim();
        let candidate = candidate.strip_prefix("W/").unwrap_or(candidate);
        let candidate = candidate.trim_matches('"');
        candidate == etag
    })
}

fn html_error(status: StatusCode, body: &str) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        format!("{body}\n"),
    )
        .into_response()
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
