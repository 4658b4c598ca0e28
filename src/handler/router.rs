//! Request routing dispatch module
//!
//! Entry point for HTTP request processing, responsible for method validation,
//! route matching, dispatching and the headers every response carries.

use hyper::header::{HeaderMap, HeaderValue};
use hyper::http::request::Parts;
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use crate::config::{AppState, RoutesConfig};
use crate::handler::{listing, stream};
use crate::http::cache::ConditionalContext;
use crate::http::response::empty_body;
use crate::http::{self, ResponseBody};
use crate::logger::{self, AccessLogEntry};
use crate::media::MediaClass;

const EXPOSED_HEADERS: &str = "Content-Length, Content-Range, Accept-Ranges, ETag, Last-Modified";

/// Request context encapsulating information needed for request processing
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub is_head: bool,
    pub conditional: ConditionalContext,
    pub range_header: Option<String>,
}

/// Where a path leads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route<'p> {
    Health,
    Listing(MediaClass),
    /// Class plus the still-encoded object name
    Object(MediaClass, &'p str),
    NotFound,
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer: SocketAddr,
) -> Result<Response<ResponseBody>, Infallible> {
    let started = Instant::now();
    // Media requests carry no body worth reading
    let (parts, _) = req.into_parts();

    let mut response = match check_http_method(&parts.method, state.config.http.enable_cors) {
        Some(resp) => resp,
        None => {
            let ctx = RequestContext {
                path: parts.uri.path(),
                is_head: parts.method == Method::HEAD,
                conditional: ConditionalContext {
                    if_none_match: header_string(&parts.headers, "if-none-match"),
                    if_modified_since: header_string(&parts.headers, "if-modified-since"),
                },
                range_header: header_string(&parts.headers, "range"),
            };
            let mut resp = route_request(&ctx, &state).await;
            if ctx.is_head {
                *resp.body_mut() = empty_body();
            }
            resp
        }
    };

    apply_common_headers(&mut response, &state);

    if state.config.logging.access_log {
        log_access(&parts, &response, peer, started, &state);
    }

    Ok(response)
}

/// Check HTTP method and return appropriate response for non-GET/HEAD methods
fn check_http_method(method: &Method, enable_cors: bool) -> Option<Response<ResponseBody>> {
    match method {
        &Method::GET | &Method::HEAD => None,
        &Method::OPTIONS => Some(http::build_options_response(enable_cors)),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            Some(http::build_405_response())
        }
    }
}

async fn route_request(ctx: &RequestContext<'_>, state: &AppState) -> Response<ResponseBody> {
    match resolve(ctx.path, &state.config.routes) {
        Route::Health => http::build_health_response(),
        Route::Listing(class) => listing::serve_listing(state, class).await,
        Route::Object(class, name) => stream::serve_object(ctx, state, class, name).await,
        Route::NotFound => http::build_404_response(),
    }
}

fn resolve<'p>(path: &'p str, routes: &RoutesConfig) -> Route<'p> {
    if path == routes.health_path {
        return Route::Health;
    }

    let prefix = routes.api_prefix.trim_end_matches('/');
    let Some(rest) = path
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('/'))
    else {
        return Route::NotFound;
    };

    for class in MediaClass::ALL {
        let Some(tail) = rest.strip_prefix(class.route_segment()) else {
            continue;
        };
        if tail.is_empty() {
            return Route::Listing(class);
        }
        if let Some(name) = tail.strip_prefix('/') {
            return Route::Object(class, name);
        }
    }

    Route::NotFound
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

/// `Server` and, when enabled, CORS headers
fn apply_common_headers(response: &mut Response<ResponseBody>, state: &AppState) {
    let headers = response.headers_mut();
    if let Ok(server) = HeaderValue::from_str(&state.config.http.server_name) {
        headers.insert("Server", server);
    }
    if state.config.http.enable_cors {
        headers.insert("Access-Control-Allow-Origin", HeaderValue::from_static("*"));
        headers.insert(
            "Access-Control-Expose-Headers",
            HeaderValue::from_static(EXPOSED_HEADERS),
        );
    }
}

fn log_access(
    req: &Parts,
    response: &Response<ResponseBody>,
    peer: SocketAddr,
    started: Instant,
    state: &AppState,
) {
    let mut entry = AccessLogEntry::new(
        peer.ip().to_string(),
        req.method.to_string(),
        req.uri.path().to_string(),
    );
    entry.query = req.uri.query().map(ToString::to_string);
    entry.http_version = format!("{:?}", req.version)
        .trim_start_matches("HTTP/")
        .to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = response
        .headers()
        .get("Content-Length")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    entry.range = header_string(&req.headers, "range");
    entry.user_agent = header_string(&req.headers, "user-agent");
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);

    logger::log_access(&entry, &state.config.logging.access_log_format);
}
