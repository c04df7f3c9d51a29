use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::kv::KvStore;
use crate::session::StoredSession;

/// Slot holding the journal as a JSON array
pub const SESSIONS_KEY: &str = "focusSessions";

/// Durable, append-only journal of completed sessions.
pub trait SessionStore {
    /// Append `session`, assigning an id if it has none. Returns the id.
    fn insert(&self, session: StoredSession) -> StoreResult<String>;
    /// Every record, oldest first.
    fn list_all(&self) -> StoreResult<Vec<StoredSession>>;
    /// Remove the record with `id`. Returns whether anything was removed;
    /// an unknown id is not an error.
    fn delete_by_id(&self, id: &str) -> StoreResult<bool>;
    fn clear_all(&self) -> StoreResult<()>;
}

/// [`SessionStore`] that keeps the whole journal in one slot of a
/// [`KvStore`].
#[derive(Debug)]
pub struct KvSessionStore<K> {
    kv: K,
    key: String,
}

impl<K: KvStore> KvSessionStore<K> {
    pub fn new(kv: K) -> Self {
        Self::with_key(kv, SESSIONS_KEY)
    }

    pub fn with_key(kv: K, key: impl Into<String>) -> Self {
        Self {
            kv,
            key: key.into(),
        }
    }

    pub fn kv(&self) -> &K {
        &self.kv
    }

    /// Where a corrupted blob is moved before the slot is rewritten
    pub fn backup_key(&self) -> String {
        format!("{}.corrupt", self.key)
    }

    fn decode(raw: &str) -> StoreResult<Vec<StoredSession>> {
        serde_json::from_str(raw).map_err(|e| StoreError::deserialization(e.to_string()))
    }

    fn read(&self) -> StoreResult<Vec<StoredSession>> {
        match self.kv.get(&self.key)? {
            Some(raw) => Self::decode(&raw),
            None => Ok(Vec::new()),
        }
    }

    /// First backup slot not already holding an earlier corrupt blob:
    /// `<key>.corrupt`, then `<key>.corrupt.1`, `<key>.corrupt.2`, ...
    fn free_backup_key(&self) -> StoreResult<String> {
        let base = self.backup_key();
        if self.kv.get(&base)?.is_none() {
            return Ok(base);
        }
        let mut n = 1u32;
        loop {
            let candidate = format!("{}.{}", base, n);
            if self.kv.get(&candidate)?.is_none() {
                return Ok(candidate);
            }
            n += 1;
        }
    }

    /// Like `read`, but an unreadable blob is set aside and the journal
    /// starts over empty so the pending write can land.
    fn read_for_update(&self) -> StoreResult<Vec<StoredSession>> {
        let Some(raw) = self.kv.get(&self.key)? else {
            return Ok(Vec::new());
        };
        match Self::decode(&raw) {
            Ok(sessions) => Ok(sessions),
            Err(err) => {
                let backup = self.free_backup_key()?;
                warn!(error = %err, %backup, "stored sessions are corrupt, starting a fresh journal");
                self.kv.set(&backup, &raw)?;
                Ok(Vec::new())
            }
        }
    }

    fn write(&self, sessions: &[StoredSession]) -> StoreResult<()> {
        let raw = serde_json::to_string(sessions)
            .map_err(|e| StoreError::storage(format!("could not encode sessions: {}", e)))?;
        self.kv.set(&self.key, &raw)
    }
}

impl<K: KvStore> SessionStore for KvSessionStore<K> {
    fn insert(&self, mut session: StoredSession) -> StoreResult<String> {
        let mut sessions = self.read_for_update()?;
        if !session.has_id() || sessions.iter().any(|s| s.id == session.id) {
            session.id = Uuid::new_v4().to_string();
        }
        let id = session.id.clone();
        sessions.push(session);
        self.write(&sessions)?;
        debug!(%id, total = sessions.len(), "session stored");
        Ok(id)
    }

    fn list_all(&self) -> StoreResult<Vec<StoredSession>> {
        self.read()
    }

    fn delete_by_id(&self, id: &str) -> StoreResult<bool> {
        let mut sessions = self.read_for_update()?;
        let before = sessions.len();
        sessions.retain(|s| s.id != id);
        if sessions.len() == before {
            return Ok(false);
        }
        self.write(&sessions)?;
        debug!(%id, "session deleted");
        Ok(true)
    }

    fn clear_all(&self) -> StoreResult<()> {
        // a corrupt blob is backed up rather than wiped
        self.read_for_update()?;
        self.write(&[])?;
        debug!("journal cleared");
        Ok(())
    }
}
