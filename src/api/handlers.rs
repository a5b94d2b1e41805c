//! Request routing and the five route handlers.

use std::io::Read;

use log::{debug, warn};
use serde::Serialize;
use tiny_http::{Header, Method, Request, Response, ResponseBox, StatusCode};

use crate::api::{content_type_for, ApiError};
use crate::browse;
use crate::sizing::Aggregator;

/// Hard ceiling on upload bodies. Bodies are buffered in memory before the
/// write, so this bounds per-request memory too.
const MAX_UPLOAD_BYTES: u64 = 1024 * 1024 * 1024;

/// Dispatch one request and send its response.
///
/// Never panics on malformed input; everything unexpected turns into a
/// JSON error response. A failure to write the response back is logged and
/// dropped, since the client is gone either way.
pub fn handle_request(sizes: &Aggregator, request: Request) {
    let method = request.method().clone();
    let url = request.url().to_string();
    debug!("{} {}", method, url);

    let mut request = request;
    let response = match route(sizes, &method, &url, &mut request) {
        Ok(response) => response,
        Err(err) => err.into_response(),
    };
    if let Err(err) = request.respond(response) {
        warn!("Failed to send response for {} {}: {}", method, url, err);
    }
}

fn route(
    sizes: &Aggregator,
    method: &Method,
    url: &str,
    request: &mut Request,
) -> Result<ResponseBox, ApiError> {
    let (path, query) = match url.split_once('?') {
        Some((path, query)) => (path, query),
        None => (url, ""),
    };

    if let Some(rest) = strip_route(path, "/v1/files") {
        return match method {
            Method::Get => list(sizes, rest),
            Method::Post => upload(sizes, rest, request),
            Method::Delete => delete(sizes, rest),
            _ => Err(ApiError::method_not_allowed()),
        };
    }
    if let Some(rest) = strip_route(path, "/v1/download") {
        return match method {
            Method::Get => download(sizes, rest),
            _ => Err(ApiError::method_not_allowed()),
        };
    }
    if path == "/v1/search" {
        return match method {
            Method::Get => search(sizes, query),
            _ => Err(ApiError::method_not_allowed()),
        };
    }
    Err(ApiError::not_found("No such route"))
}

fn list(sizes: &Aggregator, raw_path: &str) -> Result<ResponseBox, ApiError> {
    let request_path = decode_path(raw_path)?;
    let dir = browse::resolve_under_root(sizes.root(), &request_path)?;
    let entries = browse::list_directory(sizes, &dir)?;
    json_response(200, &entries)
}

fn upload(
    sizes: &Aggregator,
    raw_path: &str,
    request: &mut Request,
) -> Result<ResponseBox, ApiError> {
    let request_path = decode_path(raw_path)?;
    if request_path.is_empty() {
        return Err(ApiError::bad_request("Upload requires a file path"));
    }
    let destination = browse::resolve_under_root(sizes.root(), &request_path)?;

    if request
        .body_length()
        .is_some_and(|length| length as u64 > MAX_UPLOAD_BYTES)
    {
        return Err(ApiError::payload_too_large());
    }
    let mut body = Vec::new();
    request
        .as_reader()
        .take(MAX_UPLOAD_BYTES + 1)
        .read_to_end(&mut body)
        .map_err(|err| {
            warn!("Failed to read upload body for {}: {}", raw_path, err);
            ApiError::bad_request("Failed to read request body")
        })?;
    if body.len() as u64 > MAX_UPLOAD_BYTES {
        return Err(ApiError::payload_too_large());
    }

    let saved = browse::save_file(sizes, &destination, &body)?;
    json_response(201, &saved)
}

fn delete(sizes: &Aggregator, raw_path: &str) -> Result<ResponseBox, ApiError> {
    let request_path = decode_path(raw_path)?;
    let target = browse::resolve_under_root(sizes.root(), &request_path)?;
    browse::remove_entry(sizes, &target)?;
    Ok(Response::empty(StatusCode(204)).boxed())
}

fn download(sizes: &Aggregator, raw_path: &str) -> Result<ResponseBox, ApiError> {
    let request_path = decode_path(raw_path)?;
    if request_path.is_empty() {
        return Err(ApiError::bad_request("Download requires a file path"));
    }
    let target = browse::resolve_under_root(sizes.root(), &request_path)?;
    let (file, _) = browse::open_download(&target)?;

    let filename = target
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut response = Response::from_file(file);
    if let Ok(header) =
        Header::from_bytes(&b"Content-Type"[..], content_type_for(&target).as_bytes())
    {
        response = response.with_header(header);
    }
    let disposition = format!(
        "attachment; filename=\"{}\"",
        header_safe_filename(&filename)
    );
    if let Ok(header) = Header::from_bytes(&b"Content-Disposition"[..], disposition.as_bytes()) {
        response = response.with_header(header);
    }
    Ok(response.boxed())
}

fn search(sizes: &Aggregator, raw_query: &str) -> Result<ResponseBox, ApiError> {
    let query = query_param(raw_query, "q").unwrap_or_default();
    if query.trim().is_empty() {
        return Err(ApiError::bad_request("Search query must not be empty"));
    }
    let hits = browse::search(sizes, sizes.root(), &query)?;
    json_response(200, &hits)
}

/// `"/v1/files"` and `"/v1/files/a/b"` match the prefix `"/v1/files"`,
/// yielding `""` and `"a/b"`. `"/v1/filesystem"` does not.
fn strip_route<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() {
        Some("")
    } else {
        rest.strip_prefix('/')
    }
}

fn json_response<T: Serialize>(status: u16, payload: &T) -> Result<ResponseBox, ApiError> {
    let body = serde_json::to_string(payload)?;
    let mut response = Response::from_string(body).with_status_code(StatusCode(status));
    if let Ok(content_type) = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]) {
        response = response.with_header(content_type);
    }
    Ok(response.boxed())
}

/// Percent-decode a request path. `+` stays literal in paths.
fn decode_path(raw: &str) -> Result<String, ApiError> {
    percent_decode(raw, false).ok_or_else(|| ApiError::bad_request("Malformed path encoding"))
}

/// First value of `name` in a query string, form-decoded.
fn query_param(raw_query: &str, name: &str) -> Option<String> {
    for pair in raw_query.split('&') {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        if key == name {
            return percent_decode(value, true);
        }
    }
    None
}

/// Percent-decode `input`, optionally treating `+` as a space (form
/// encoding). Returns `None` on truncated escapes or invalid UTF-8.
fn percent_decode(input: &str, plus_as_space: bool) -> Option<String> {
    let bytes = input.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let hi = hex_value(*bytes.get(i + 1)?)?;
                let lo = hex_value(*bytes.get(i + 2)?)?;
                decoded.push(hi << 4 | lo);
                i += 3;
            }
            b'+' if plus_as_space => {
                decoded.push(b' ');
                i += 1;
            }
            other => {
                decoded.push(other);
                i += 1;
            }
        }
    }
    String::from_utf8(decoded).ok()
}

fn hex_value(byte: u8) -> Option<u8> {
    (byte as char).to_digit(16).map(|value| value as u8)
}

/// Strip characters that would break the quoted filename parameter.
fn header_safe_filename(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '"' && *c != '\\' && !c.is_control())
        .collect()
}
