//! Request routing and responses.

use http::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT_RANGES, CONTENT_TYPE, DATE, SERVER, VARY,
};
use http::{Request, Response};
use http_body_util::Full;
use hyper::body::Bytes;
use serde::Serialize;

use crate::config::{Config, VALID_STATUS};

pub const HEARTBEAT_BODY: &str = "Last seen updated successfully";
pub const INVALID_IP_BODY: &str = "Invalid IP!";

const STATIC_HEADERS: &[(&str, &str)] = &[
    ("x-xss-protection", "1; mode=block"),
    ("server-timing", "total;dur=206"),
    ("x-cache", "BYPASS"),
    ("x-sid", "2092"),
];

#[derive(Debug, Serialize)]
struct LicenseResponse<'a> {
    status: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
}

/// Route a request by path. Every route answers 200 with the same header set.
pub fn handle<B>(req: &Request<B>, config: &Config, tls: bool) -> Response<Full<Bytes>> {
    log_request(req, tls);

    let body = match req.uri().path() {
        "/license-validation2" | "/renew-license" => license_body(req, config),
        "/heartbeat" => HEARTBEAT_BODY.to_string(),
        _ => to_json(&LicenseResponse {
            status: VALID_STATUS,
            message: Some("License is valid"),
        }),
    };

    let mut response = Response::new(Full::from(body));
    apply_headers(response.headers_mut());
    response
}

fn license_body<B>(req: &Request<B>, config: &Config) -> String {
    let Some(server_ip) = server_ip(req) else {
        return INVALID_IP_BODY.to_string();
    };
    match &config.license_key {
        Some(key) => tracing::info!(%server_ip, license = %key, "License found for IP"),
        None => tracing::info!(%server_ip, "No license key provided, returning VALID"),
    }
    to_json(&LicenseResponse {
        status: config.license_status(),
        message: None,
    })
}

/// First `server_ip` query parameter, percent-decoded; empty counts as missing.
fn server_ip<B>(req: &Request<B>) -> Option<String> {
    let query = req.uri().query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == "server_ip")
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())
}

fn to_json(response: &LicenseResponse<'_>) -> String {
    serde_json::to_string(response).unwrap_or_else(|e| {
        tracing::error!(error = %e, "serialize response");
        String::new()
    })
}

fn apply_headers(headers: &mut HeaderMap) {
    let now = chrono::Utc::now();
    if let Ok(date) = HeaderValue::from_str(&now.format("%a, %d %b %Y %H:%M:%S GMT").to_string()) {
        headers.insert(DATE, date);
    }
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(VARY, HeaderValue::from_static("Accept-Encoding"));
    headers.insert(SERVER, HeaderValue::from_static("ArvanCloud"));
    headers.insert(ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    for &(name, value) in STATIC_HEADERS {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
    let request_id = now.timestamp_nanos_opt().unwrap_or_default();
    headers.insert(
        HeaderName::from_static("x-request-id"),
        HeaderValue::from(request_id),
    );
}

fn log_request<B>(req: &Request<B>, tls: bool) {
    let host = req
        .headers()
        .get(http::header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| req.uri().host())
        .unwrap_or("");
    tracing::info!(
        method = %req.method(),
        path = %req.uri().path(),
        host = %host,
        tls,
        "Request"
    );
    for (name, value) in req.headers() {
        tracing::debug!(header = %name, value = ?value, "Request header");
    }
}
