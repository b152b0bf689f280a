//! Fingerprint extraction
//!
//! Pulls the sparse set of identifying fields out of an inbound request.
//! Absent fields stay `None`; nothing here fails.

use axum::http::HeaderMap;
use std::collections::HashMap;

use crate::session::SessionQuery;

pub const UNICORN_PARAM: &str = "unicorn";
pub const SESSION_PARAM: &str = "session";
pub const SESSION_IDENTIFIER: &str = "X-Plex-Session-Identifier";
pub const CLIENT_IDENTIFIER: &str = "X-Plex-Client-Identifier";

/// Build a fingerprint from query parameters, the optional `sessionId` route
/// parameter and request headers. The route parameter wins over the
/// `session` query parameter; for the Plex identifiers the query wins over
/// the header.
pub fn extract(
    query: &HashMap<String, String>,
    route_session: Option<&str>,
    headers: &HeaderMap,
) -> SessionQuery {
    SessionQuery {
        unicorn: query.get(UNICORN_PARAM).cloned(),
        session: route_session
            .map(str::to_string)
            .or_else(|| query.get(SESSION_PARAM).cloned()),
        session_identifier: query_or_header(query, headers, SESSION_IDENTIFIER),
        client_identifier: query_or_header(query, headers, CLIENT_IDENTIFIER),
        ..Default::default()
    }
}

fn query_or_header(query: &HashMap<String, String>, headers: &HeaderMap, name: &str) -> Option<String> {
    query.get(name).cloned().or_else(|| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    })
}
