//! Session record and the sparse query/update type used to find and patch it

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One tracked transcoding session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// Internal id, assigned at creation and never changed
    #[serde(rename = "unicorn")]
    pub id: String,
    #[serde(default)]
    pub session: String,
    #[serde(default)]
    pub session_full: String,
    #[serde(default)]
    pub session_identifier: String,
    #[serde(default)]
    pub client_identifier: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default)]
    pub server_url: String,
}

impl SessionRecord {
    /// Fresh record with a generated id and every other field empty
    pub fn new() -> Self {
        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            ..Self::default()
        }
    }

    /// Shallow merge: every field set in `update` overwrites, the rest survive.
    /// The id is never touched.
    pub fn merge(&mut self, update: &SessionQuery) {
        if let Some(v) = &update.session {
            self.session = v.clone();
        }
        if let Some(v) = &update.session_full {
            self.session_full = v.clone();
        }
        if let Some(v) = &update.session_identifier {
            self.session_identifier = v.clone();
        }
        if let Some(v) = &update.client_identifier {
            self.client_identifier = v.clone();
        }
        if let Some(v) = &update.args {
            self.args = v.clone();
        }
        if let Some(v) = &update.env {
            self.env = v.clone();
        }
        if let Some(v) = &update.server_url {
            self.server_url = v.clone();
        }
    }

    /// Value of an identifying field
    pub fn key(&self, key: SessionKey) -> &str {
        match key {
            SessionKey::Unicorn => &self.id,
            SessionKey::Session => &self.session,
            SessionKey::SessionFull => &self.session_full,
            SessionKey::SessionIdentifier => &self.session_identifier,
            SessionKey::ClientIdentifier => &self.client_identifier,
        }
    }
}

/// Identifying fields a record can be matched on, in matching priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKey {
    Unicorn,
    Session,
    SessionFull,
    SessionIdentifier,
    ClientIdentifier,
}

impl SessionKey {
    pub const ALL: [SessionKey; 5] = [
        SessionKey::Unicorn,
        SessionKey::Session,
        SessionKey::SessionFull,
        SessionKey::SessionIdentifier,
        SessionKey::ClientIdentifier,
    ];
}

/// Sparse set of session fields. Used both as lookup criteria (a fingerprint)
/// and as a partial update; `None` means "not present".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unicorn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_full: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<HashMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,
}

impl SessionQuery {
    pub fn key(&self, key: SessionKey) -> Option<&str> {
        match key {
            SessionKey::Unicorn => self.unicorn.as_deref(),
            SessionKey::Session => self.session.as_deref(),
            SessionKey::SessionFull => self.session_full.as_deref(),
            SessionKey::SessionIdentifier => self.session_identifier.as_deref(),
            SessionKey::ClientIdentifier => self.client_identifier.as_deref(),
        }
    }

    /// True when no field at all is present
    pub fn is_empty(&self) -> bool {
        SessionKey::ALL.iter().all(|k| self.key(*k).is_none())
            && self.args.is_none()
            && self.env.is_none()
            && self.server_url.is_none()
    }

    /// True when at least one of the fields that can anchor a new record is
    /// set to a non-empty value. The internal id alone does not count.
    pub fn is_anchored(&self) -> bool {
        [
            SessionKey::Session,
            SessionKey::SessionFull,
            SessionKey::SessionIdentifier,
            SessionKey::ClientIdentifier,
        ]
        .iter()
        .any(|k| self.key(*k).is_some_and(|v| !v.is_empty()))
    }

    /// `session` is absent or empty
    pub(crate) fn lacks_session(&self) -> bool {
        self.session.as_deref().map_or(true, str::is_empty)
    }
}
