//! Session registry
//!
//! Chronologically ordered list of session records plus the fuzzy lookup used
//! to reconcile a partial fingerprint with a known session. Lookups scan the
//! most recent record first and accept a record as soon as any single
//! non-empty identifying field matches.

use crate::session::record::{SessionKey, SessionQuery, SessionRecord};

/// Outcome of [`SessionRegistry::upsert`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// No match, a new record was appended
    Created,
    /// Merged into an existing record
    Merged,
    /// Nothing to anchor a session on; registry untouched
    Ignored,
}

/// Rewrites criteria that found nothing into a second attempt.
type Promotion = fn(&SessionQuery) -> Option<SessionQuery>;

/// Clients that never send a session id: retry with their session
/// identifier, then with their client identifier, standing in for it.
const PROMOTIONS: [Promotion; 2] = [promote_session_identifier, promote_client_identifier];

fn promote_session_identifier(criteria: &SessionQuery) -> Option<SessionQuery> {
    promote(criteria, criteria.session_identifier.as_deref())
}

fn promote_client_identifier(criteria: &SessionQuery) -> Option<SessionQuery> {
    promote(criteria, criteria.client_identifier.as_deref())
}

fn promote(criteria: &SessionQuery, value: Option<&str>) -> Option<SessionQuery> {
    let value = value.filter(|v| !v.is_empty())?;
    if !criteria.lacks_session() {
        return None;
    }
    Some(SessionQuery {
        session: Some(value.to_string()),
        ..criteria.clone()
    })
}

#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Vec<SessionRecord>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// All records in creation order
    pub fn list(&self) -> &[SessionRecord] {
        &self.sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Find the session matching `criteria`, if any
    pub fn find(&self, criteria: &SessionQuery) -> Option<&SessionRecord> {
        self.position_of(criteria).map(|idx| &self.sessions[idx])
    }

    /// Same lookup as [`find`](Self::find), returning the record's index in
    /// creation order
    pub fn position_of(&self, criteria: &SessionQuery) -> Option<usize> {
        if let Some(idx) = self.scan(criteria) {
            return Some(idx);
        }
        PROMOTIONS
            .iter()
            .filter_map(|promotion| promotion(criteria))
            .find_map(|promoted| self.scan(&promoted))
    }

    /// Merge `fields` into the matching record, or append a new one.
    pub fn upsert(&mut self, fields: &SessionQuery) -> Upsert {
        // Requests without any session semantics (downloads, artwork...)
        // must not create placeholder records.
        if fields.is_empty() || !fields.is_anchored() {
            return Upsert::Ignored;
        }

        match self.position_of(fields) {
            Some(idx) => {
                self.sessions[idx].merge(fields);
                Upsert::Merged
            }
            None => {
                let mut record = SessionRecord::new();
                record.merge(fields);
                tracing::debug!(
                    "New session {} (session: {:?}, identifier: {:?}, client: {:?})",
                    record.id,
                    record.session,
                    record.session_identifier,
                    record.client_identifier
                );
                self.sessions.push(record);
                Upsert::Created
            }
        }
    }

    fn scan(&self, criteria: &SessionQuery) -> Option<usize> {
        let keys = candidate_keys(criteria);
        self.sessions
            .iter()
            .enumerate()
            .rev()
            .find(|(_, record)| {
                keys.iter().any(|key| {
                    let value = record.key(*key);
                    !value.is_empty() && criteria.key(*key) == Some(value)
                })
            })
            .map(|(idx, _)| idx)
    }
}

/// Keys present in `criteria`, with the client identifier always last
fn candidate_keys(criteria: &SessionQuery) -> Vec<SessionKey> {
    let mut keys: Vec<SessionKey> = SessionKey::ALL
        .iter()
        .copied()
        .filter(|k| *k != SessionKey::ClientIdentifier && criteria.key(*k).is_some())
        .collect();
    keys.push(SessionKey::ClientIdentifier);
    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn query(f: impl FnOnce(&mut SessionQuery)) -> SessionQuery {
        let mut q = SessionQuery::default();
        f(&mut q);
        q
    }

    fn registry_with(records: &[SessionQuery]) -> SessionRegistry {
        let mut registry = SessionRegistry::new();
        for record in records {
            let mut r = SessionRecord::new();
            r.merge(record);
            registry.sessions.push(r);
        }
        registry
    }

    #[test]
    fn single_shared_field_matches() {
        let registry = registry_with(&[
            query(|q| q.session = Some("aaa".into())),
            query(|q| q.session_identifier = Some("sid-b".into())),
            query(|q| q.client_identifier = Some("client-c".into())),
        ]);

        let found = registry
            .find(&query(|q| {
                q.session = Some("nope".into());
                q.session_identifier = Some("sid-b".into());
            }))
            .unwrap();
        assert_eq!(found.session_identifier, "sid-b");

        assert_eq!(
            registry.position_of(&query(|q| q.client_identifier = Some("client-c".into()))),
            Some(2)
        );
    }

    #[test]
    fn most_recent_record_wins() {
        let registry = registry_with(&[
            query(|q| {
                q.session = Some("old".into());
                q.client_identifier = Some("shared".into());
            }),
            query(|q| {
                q.session = Some("new".into());
                q.client_identifier = Some("shared".into());
            }),
        ]);

        let found = registry
            .find(&query(|q| q.client_identifier = Some("shared".into())))
            .unwrap();
        assert_eq!(found.session, "new");
    }

    #[test]
    fn recency_beats_key_priority() {
        // The older record matches on `session`, the newer one only on the
        // client identifier: the newer one is still returned.
        let registry = registry_with(&[
            query(|q| q.session = Some("abc".into())),
            query(|q| q.client_identifier = Some("client".into())),
        ]);

        let found = registry
            .find(&query(|q| {
                q.session = Some("abc".into());
                q.client_identifier = Some("client".into());
            }))
            .unwrap();
        assert_eq!(found.client_identifier, "client");
    }

    #[test]
    fn empty_values_never_match() {
        let registry = registry_with(&[query(|q| q.session = Some("abc".into()))]);
        assert!(registry
            .find(&query(|q| q.session_full = Some(String::new())))
            .is_none());
    }

    #[test]
    fn internal_id_matches() {
        let registry = registry_with(&[query(|q| q.session = Some("abc".into()))]);
        let id = registry.list()[0].id.clone();
        let found = registry.find(&query(|q| q.unicorn = Some(id))).unwrap();
        assert_eq!(found.session, "abc");
    }

    #[test]
    fn unknown_criteria_is_not_found() {
        let registry = registry_with(&[query(|q| q.session = Some("abc".into()))]);
        assert!(registry.find(&query(|q| q.session = Some("zzz".into()))).is_none());
        assert!(registry.find(&SessionQuery::default()).is_none());
    }

    #[test]
    fn session_identifier_is_promoted_to_session() {
        let registry = registry_with(&[query(|q| q.session = Some("android-sid".into()))]);
        let found = registry
            .find(&query(|q| q.session_identifier = Some("android-sid".into())))
            .unwrap();
        assert_eq!(found.session, "android-sid");
    }

    #[test]
    fn client_identifier_is_promoted_after_session_identifier() {
        let registry = registry_with(&[query(|q| q.session = Some("device-1".into()))]);
        let found = registry.find(&query(|q| {
            q.session_identifier = Some("unrelated".into());
            q.client_identifier = Some("device-1".into());
        }));
        assert_eq!(found.map(|r| r.session.as_str()), Some("device-1"));
    }

    #[test]
    fn promotion_skipped_when_session_present() {
        let registry = registry_with(&[query(|q| q.session = Some("sid".into()))]);
        assert!(registry
            .find(&query(|q| {
                q.session = Some("other".into());
                q.session_identifier = Some("sid".into());
            }))
            .is_none());
    }

    #[test]
    fn upsert_ignores_empty_and_unanchored() {
        let mut registry = SessionRegistry::new();
        assert_eq!(registry.upsert(&SessionQuery::default()), Upsert::Ignored);

        let unanchored = query(|q| {
            q.args = Some(vec!["-i".into()]);
            q.env = Some(HashMap::from([("A".to_string(), "1".to_string())]));
            q.server_url = Some("x".into());
        });
        assert_eq!(registry.upsert(&unanchored), Upsert::Ignored);
        assert!(registry.is_empty());
    }

    #[test]
    fn upsert_creates_then_merges() {
        let mut registry = SessionRegistry::new();
        let created = registry.upsert(&query(|q| {
            q.session = Some("abc".into());
            q.server_url = Some("http://origin/".into());
            q.client_identifier = Some("client".into());
        }));
        assert_eq!(created, Upsert::Created);
        let id = registry.list()[0].id.clone();

        let merged = registry.upsert(&query(|q| {
            q.session = Some("abc".into());
            q.server_url = Some(String::new());
            q.args = Some(vec!["-y".into()]);
        }));
        assert_eq!(merged, Upsert::Merged);
        assert_eq!(registry.len(), 1);

        let record = &registry.list()[0];
        assert_eq!(record.id, id);
        assert_eq!(record.server_url, "");
        assert_eq!(record.client_identifier, "client");
        assert_eq!(record.args, vec!["-y".to_string()]);
    }

    #[test]
    fn upsert_merges_in_place_without_reordering() {
        let mut registry = SessionRegistry::new();
        registry.upsert(&query(|q| q.session = Some("first".into())));
        registry.upsert(&query(|q| q.session = Some("second".into())));
        registry.upsert(&query(|q| {
            q.session = Some("first".into());
            q.session_full = Some("first/0".into());
        }));

        let sessions: Vec<_> = registry.list().iter().map(|r| r.session.as_str()).collect();
        assert_eq!(sessions, ["first", "second"]);
        assert_eq!(registry.list()[0].session_full, "first/0");
    }

    #[test]
    fn upsert_generates_id_even_when_unicorn_given() {
        let mut registry = SessionRegistry::new();
        registry.upsert(&query(|q| {
            q.unicorn = Some("client-chosen".into());
            q.session = Some("abc".into());
        }));
        assert_ne!(registry.list()[0].id, "client-chosen");
    }
}
