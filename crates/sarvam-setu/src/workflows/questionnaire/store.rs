use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use super::domain::{Session, UserId};

/// Keyed session storage. Every operation is atomic for its key.
pub trait SessionStore: Send + Sync {
    /// Store `session` for `user`, returning whatever was there before.
    fn replace(&self, user: &UserId, session: Session) -> Result<Option<Session>, SessionStoreError>;
    fn fetch(&self, user: &UserId) -> Result<Option<Session>, SessionStoreError>;
    /// Overwrite an existing session; fails with `NotFound` when the user has none.
    fn update(&self, user: &UserId, session: Session) -> Result<(), SessionStoreError>;
    /// Remove and return the session. Removing an absent session is not an error.
    fn remove(&self, user: &UserId) -> Result<Option<Session>, SessionStoreError>;
    /// Drop sessions whose last activity is older than `cutoff`.
    fn evict_idle(&self, cutoff: DateTime<Utc>) -> Result<Vec<UserId>, SessionStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    #[error("session not found")]
    NotFound,
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

/// Process-local store backed by a mutex-guarded map.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<UserId, Session>>,
}

impl InMemorySessionStore {
    fn sessions(&self) -> Result<MutexGuard<'_, HashMap<UserId, Session>>, SessionStoreError> {
        self.sessions
            .lock()
            .map_err(|_| SessionStoreError::Unavailable("session map lock poisoned".to_string()))
    }

    pub fn len(&self) -> usize {
        self.sessions().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for InMemorySessionStore {
    fn replace(&self, user: &UserId, session: Session) -> Result<Option<Session>, SessionStoreError> {
        Ok(self.sessions()?.insert(user.clone(), session))
    }

    fn fetch(&self, user: &UserId) -> Result<Option<Session>, SessionStoreError> {
        Ok(self.sessions()?.get(user).cloned())
    }

    fn update(&self, user: &UserId, session: Session) -> Result<(), SessionStoreError> {
        let mut guard = self.sessions()?;
        match guard.get_mut(user) {
            Some(slot) => {
                *slot = session;
                Ok(())
            }
            None => Err(SessionStoreError::NotFound),
        }
    }

    fn remove(&self, user: &UserId) -> Result<Option<Session>, SessionStoreError> {
        Ok(self.sessions()?.remove(user))
    }

    fn evict_idle(&self, cutoff: DateTime<Utc>) -> Result<Vec<UserId>, SessionStoreError> {
        let mut guard = self.sessions()?;
        let stale: Vec<UserId> = guard
            .iter()
            .filter(|(_, session)| session.last_activity() < cutoff)
            .map(|(user, _)| user.clone())
            .collect();

        for user in &stale {
            guard.remove(user);
        }

        Ok(stale)
    }
}
