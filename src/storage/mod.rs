//! Where sessions wait between turns
//!
//! The bot loads a [`Session`] at the start of a turn and writes it back at
//! the end. Every session carries a `version`; a store only accepts a write
//! made from the version it currently holds, so a turn that worked on a stale
//! copy fails instead of silently overwriting a newer conversation state.

use crate::error::StorageResult;
use crate::session::Session;
use crate::types::SessionId;
use async_trait::async_trait;

pub mod memory;

/// Session persistence used by [`Bot`](crate::Bot)
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Store a brand-new session; fails with `AlreadyExists` on a reused id
    async fn create(&self, session: Session) -> StorageResult<SessionId>;

    /// Current copy of a session, `None` when unknown
    async fn get(&self, id: &SessionId) -> StorageResult<Option<Session>>;

    /// Replace a session and return its new version
    ///
    /// `session.version` must equal the stored version, otherwise the write is
    /// rejected with `Conflict`. Unknown ids give `NotFound`.
    async fn update(&self, id: &SessionId, session: Session) -> StorageResult<u64>;

    /// Forget a session; unknown ids give `NotFound`
    async fn delete(&self, id: &SessionId) -> StorageResult<()>;
}
