//! Transcoder argument rewriting
//!
//! Plex spawns its transcoder with URLs that point at the local engine
//! (`http://127.0.0.1:32400/`). Before the arguments are handed to a remote
//! transcoder they are rewritten to go through the balancer, and the segment
//! list output is redirected and made unbounded.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::Config;
use crate::session::record::SessionQuery;

/// Routing token resolved by the proxy layer to the local transcoding engine
pub const INTERNAL_TRANSCODER: &str = "{INTERNAL_TRANSCODER}";
/// Routing token resolved by the proxy layer to the Plex install prefix
pub const INTERNAL_RESOURCES: &str = "{INTERNAL_RESOURCES}";

const TRANSCODE_SESSION_PATH: &str = "video/:/transcode/session/";
const PUBLIC_SESSIONS_PATH: &str = "api/sessions/";

const SEGMENT_LIST: &str = "-segment_list";
const SEGMENT_LIST_TYPE: &str = "-segment_list_type";
const SEGMENT_LIST_INJECTION: [&str; 4] = [SEGMENT_LIST_TYPE, "csv", "-segment_list_size", "2147483647"];

static PROGRESS_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^http://127\.0\.0\.1:32400/video/:/transcode/session/(.*)/progress$")
        .expect("progress url pattern is valid")
});

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RewriteError {
    #[error("no transcode session progress url in arguments")]
    NoSession,
}

/// Result of a successful rewrite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedFfmpeg {
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    /// Primary session id
    pub session: String,
    /// Full two-level session id
    pub session_full: String,
}

impl ParsedFfmpeg {
    /// As a registry update
    pub fn to_query(&self) -> SessionQuery {
        SessionQuery {
            args: Some(self.args.clone()),
            env: Some(self.env.clone()),
            session: Some(self.session.clone()),
            session_full: Some(self.session_full.clone()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct FfmpegRewriter {
    /// Internal engine base URL, e.g. `http://127.0.0.1:32400/`
    plex_url: String,
    /// Balancer base URL, e.g. `https://proxy.example/`
    public_url: String,
    sessions_path: String,
    resources_path: String,
}

impl FfmpegRewriter {
    pub fn new(
        plex_url: impl Into<String>,
        public_url: impl Into<String>,
        sessions_path: impl Into<String>,
        resources_path: impl Into<String>,
    ) -> Self {
        Self {
            plex_url: plex_url.into(),
            public_url: public_url.into(),
            sessions_path: sessions_path.into(),
            resources_path: resources_path.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.plex.url(),
            config.server.public_url(),
            config.plex.sessions_path.clone(),
            config.plex.resources_path.clone(),
        )
    }

    pub fn parse(&self, args: &[String], env: HashMap<String, String>) -> Result<ParsedFfmpeg, RewriteError> {
        let (session, session_full) = extract_session(args).ok_or(RewriteError::NoSession)?;
        tracing::debug!("Session found: {} ({})", session, session_full);

        let rewritten: Vec<String> = args.iter().map(|arg| self.rewrite_arg(arg)).collect();
        let args = fix_segment_list(rewritten, &session_full);

        Ok(ParsedFfmpeg {
            args,
            env,
            session,
            session_full,
        })
    }

    fn rewrite_arg(&self, arg: &str) -> String {
        if arg.contains("/progress") {
            return arg.replacen(&self.plex_url, &self.public_url, 1);
        }
        if arg.contains("/manifest") || arg.contains("/seglist") {
            return arg.replacen(&self.plex_url, INTERNAL_TRANSCODER, 1);
        }
        let public_sessions = format!("{}{}", self.public_url, PUBLIC_SESSIONS_PATH);
        arg.replacen(&self.plex_url, &self.public_url, 1)
            .replacen(&self.sessions_path, &public_sessions, 1)
            .replacen(&self.resources_path, INTERNAL_RESOURCES, 1)
    }
}

/// `(primary, full)` session ids from the first progress url argument
fn extract_session(args: &[String]) -> Option<(String, String)> {
    let full = args
        .iter()
        .find_map(|arg| PROGRESS_URL.captures(arg))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())?;
    let primary = full.split('/').next().unwrap_or_default().to_string();
    if primary.is_empty() {
        return None;
    }
    Some((primary, full))
}

/// Point `-segment_list` at the balancer's seglist endpoint and lift the
/// default list size limit unless the caller already set a list type.
fn fix_segment_list(args: Vec<String>, session_full: &str) -> Vec<String> {
    let seglist = format!("{}{}{}/seglist", INTERNAL_TRANSCODER, TRANSCODE_SESSION_PATH, session_full);
    let mut out = Vec::with_capacity(args.len() + SEGMENT_LIST_INJECTION.len());
    let mut expect_value = false;

    for (i, arg) in args.iter().enumerate() {
        if arg == SEGMENT_LIST {
            expect_value = true;
            out.push(arg.clone());
            continue;
        }
        if expect_value {
            expect_value = false;
            out.push(seglist.clone());
            if args.get(i + 1).map(String::as_str) != Some(SEGMENT_LIST_TYPE) {
                out.extend(SEGMENT_LIST_INJECTION.iter().map(|s| s.to_string()));
            }
            continue;
        }
        out.push(arg.clone());
    }
    out
}
