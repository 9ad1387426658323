//! Process-local session store

use crate::error::{StorageError, StorageResult};
use crate::session::Session;
use crate::storage::SessionStore;
use crate::types::SessionId;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Sessions kept in a map for the lifetime of the process
///
/// Clones share the same map.
///
/// ```
/// use flyme::storage::SessionStore;
/// use flyme::{InMemorySessionStore, Session};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemorySessionStore::new();
/// let id = store.create(Session::new()).await?;
///
/// let mut session = store.get(&id).await?.expect("just created");
/// session.reset();
/// assert_eq!(store.update(&id, session).await?, 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, Session>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, session: Session) -> StorageResult<SessionId> {
        let id = session.id;
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&id) {
            return Err(StorageError::AlreadyExists(format!("session {}", id)));
        }
        sessions.insert(id, session);
        Ok(id)
    }

    async fn get(&self, id: &SessionId) -> StorageResult<Option<Session>> {
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn update(&self, id: &SessionId, mut session: Session) -> StorageResult<u64> {
        let mut sessions = self.sessions.write().await;
        let stored = sessions
            .get(id)
            .ok_or_else(|| StorageError::NotFound(format!("session {}", id)))?;

        if stored.version != session.version {
            warn!(
                session_id = %id,
                stored = stored.version,
                written = session.version,
                "Rejected stale session write"
            );
            return Err(StorageError::Conflict(format!(
                "session {} is at version {}, write was based on {}",
                id, stored.version, session.version
            )));
        }

        session.version += 1;
        let version = session.version;
        sessions.insert(*id, session);
        debug!(session_id = %id, version, "Session stored");
        Ok(version)
    }

    async fn delete(&self, id: &SessionId) -> StorageResult<()> {
        self.sessions
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(format!("session {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::BookingRequest;
    use crate::dialog::BookingDialog;

    #[tokio::test]
    async fn test_reused_id_is_rejected() {
        let store = InMemorySessionStore::new();
        let session = Session::new();

        store.create(session.clone()).await.unwrap();
        let result = store.create(session).await;
        assert!(matches!(result, Err(StorageError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_update_bumps_version_and_keeps_dialog() {
        let store = InMemorySessionStore::new();
        let id = store.create(Session::new()).await.unwrap();

        let mut session = store.get(&id).await.unwrap().unwrap();
        let (dialog, _) = BookingDialog::begin(BookingRequest::new().with_origin("Paris"));
        session.start_booking(dialog.clone());
        assert_eq!(store.update(&id, session).await.unwrap(), 1);

        let stored = store.get(&id).await.unwrap().unwrap();
        assert_eq!(stored.version, 1);
        assert_eq!(stored.booking_dialog(), Some(&dialog));
    }

    #[tokio::test]
    async fn test_stale_copy_cannot_overwrite() {
        let store = InMemorySessionStore::new();
        let id = store.create(Session::new()).await.unwrap();

        let first = store.get(&id).await.unwrap().unwrap();
        let second = first.clone();

        store.update(&id, first).await.unwrap();
        let result = store.update(&id, second).await;
        assert!(matches!(result, Err(StorageError::Conflict(_))));
        assert_eq!(store.get(&id).await.unwrap().unwrap().version, 1);
    }

    #[tokio::test]
    async fn test_unknown_ids() {
        let store = InMemorySessionStore::new();
        let session = Session::new();
        let id = session.id;

        assert!(store.get(&id).await.unwrap().is_none());
        assert!(matches!(
            store.update(&id, session).await,
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            store.delete(&id).await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_clones_share_sessions() {
        let store = InMemorySessionStore::new();
        let other = store.clone();

        let id = other.create(Session::new()).await.unwrap();
        assert!(store.get(&id).await.unwrap().is_some());

        store.delete(&id).await.unwrap();
        assert!(other.get(&id).await.unwrap().is_none());
    }
}
