//! Sessions manager
//!
//! Owns the registry and serialises every lookup/upsert behind one lock, so a
//! fingerprint reconciliation or an argument submission always runs to
//! completion before the next one starts. Snapshot writes are handed to a
//! single writer task in registry order, so the durable copy never rolls back
//! to an older state.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};

use crate::session::ffmpeg::{FfmpegRewriter, ParsedFfmpeg, RewriteError};
use crate::session::record::{SessionQuery, SessionRecord};
use crate::session::registry::SessionRegistry;
use crate::store::SessionStore;

const SNAPSHOT_POLL_INTERVAL: Duration = Duration::from_millis(100);

type Snapshot = (String, SessionRecord);

pub struct SessionsManager {
    registry: RwLock<SessionRegistry>,
    rewriter: FfmpegRewriter,
    store: Arc<dyn SessionStore>,
    snapshots: mpsc::UnboundedSender<Snapshot>,
}

impl SessionsManager {
    /// Must be called from within a tokio runtime: spawns the snapshot writer.
    pub fn new(rewriter: FfmpegRewriter, store: Arc<dyn SessionStore>) -> Self {
        let (snapshots, rx) = mpsc::unbounded_channel();
        tokio::spawn(write_snapshots(Arc::clone(&store), rx));
        Self {
            registry: RwLock::new(SessionRegistry::new()),
            rewriter,
            store,
            snapshots,
        }
    }

    /// Snapshot of every live record, in creation order
    pub async fn list(&self) -> Vec<SessionRecord> {
        self.registry.read().await.list().to_vec()
    }

    #[cfg(test)]
    pub async fn update_session(&self, fields: &SessionQuery) -> crate::session::Upsert {
        self.registry.write().await.upsert(fields)
    }

    /// Upsert a request fingerprint and return the session it resolves to
    pub async fn resolve(&self, fingerprint: &SessionQuery) -> Option<SessionRecord> {
        let mut registry = self.registry.write().await;
        let outcome = registry.upsert(fingerprint);
        let record = registry.find(fingerprint).cloned();
        if let Some(record) = &record {
            tracing::debug!("Fingerprint {:?} -> session {} ({:?})", fingerprint, record.id, outcome);
        }
        record
    }

    /// Rewrite a transcoder invocation, merge it into the registry and queue a
    /// snapshot write. The write is not awaited and its failure is dropped.
    pub async fn store_ffmpeg_parameters(
        &self,
        args: &[String],
        env: HashMap<String, String>,
    ) -> Result<ParsedFfmpeg, RewriteError> {
        let parsed = self.rewriter.parse(args, env)?;

        let mut registry = self.registry.write().await;
        registry.upsert(&parsed.to_query());
        let snapshot = registry
            .find(&SessionQuery {
                session: Some(parsed.session.clone()),
                session_full: Some(parsed.session_full.clone()),
                ..Default::default()
            })
            .cloned();

        // Queued while the registry is still locked, so snapshots reach the
        // writer in the order the registry changed.
        if let Some(record) = snapshot {
            if self.snapshots.send((parsed.session.clone(), record)).is_err() {
                tracing::debug!("Snapshot writer gone, session {} not persisted", parsed.session);
            }
        }
        drop(registry);

        Ok(parsed)
    }

    /// Drop the persisted snapshot. The live registry entry is kept.
    pub async fn clean_session(&self, session: &str) -> anyhow::Result<()> {
        self.store.delete(session).await
    }

    /// Persisted snapshot for `session`, polling until it shows up or
    /// `timeout` elapses
    pub async fn wait_for_snapshot(
        &self,
        session: &str,
        timeout: Duration,
    ) -> anyhow::Result<Option<SessionRecord>> {
        let poll = async {
            loop {
                if let Some(record) = self.store.get(session).await? {
                    return Ok::<_, anyhow::Error>(record);
                }
                tokio::time::sleep(SNAPSHOT_POLL_INTERVAL).await;
            }
        };
        match tokio::time::timeout(timeout, poll).await {
            Ok(result) => result.map(Some),
            Err(_) => Ok(None),
        }
    }
}

async fn write_snapshots(store: Arc<dyn SessionStore>, mut rx: mpsc::UnboundedReceiver<Snapshot>) {
    while let Some((key, record)) = rx.recv().await {
        if let Err(e) = store.set(&key, &record).await {
            tracing::debug!("Failed to persist session {}: {}", key, e);
        }
    }
}
