//! Registry of live sessions
//!
//! Each session sits behind its own mutex, so operations on one session run
//! one at a time while independent sessions proceed concurrently.

use std::collections::HashMap;
use std::sync::Arc;

use archsmith_utils::error::SessionError;
use tokio::sync::{Mutex, RwLock};
use tracing::info;
use uuid::Uuid;

use crate::session::{Session, SessionServices};

pub type SessionId = String;
pub type SessionHandle = Arc<Mutex<Session>>;

pub struct SessionManager {
    services: Arc<SessionServices>,
    sessions: RwLock<HashMap<SessionId, SessionHandle>>,
}

impl SessionManager {
    #[must_use]
    pub fn new(services: SessionServices) -> Self {
        Self {
            services: Arc::new(services),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn services(&self) -> &SessionServices {
        &self.services
    }

    /// Create an Idle session and register it.
    pub async fn start(&self) -> (SessionId, SessionHandle) {
        let id = Uuid::new_v4().to_string();
        let handle = Arc::new(Mutex::new(Session::new(id.clone(), Arc::clone(&self.services))));
        self.sessions
            .write()
            .await
            .insert(id.clone(), Arc::clone(&handle));
        info!(session_id = %id, "Session started");
        (id, handle)
    }

    /// # Errors
    ///
    /// Returns `SessionError::NotFound` for an unknown id
    pub async fn get(&self, id: &str) -> Result<SessionHandle, SessionError> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| SessionError::NotFound {
                session_id: id.to_string(),
            })
    }

    /// Abandon a session. Work already running on it finishes, but the session
    /// can no longer be looked up.
    pub async fn remove(&self, id: &str) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            info!(session_id = %id, "Session removed");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::ConversationPhase;
    use archsmith_config::Config;
    use archsmith_llm::SimulatedBackend;

    fn manager() -> SessionManager {
        SessionManager::new(
            SessionServices::new(Config::default(), Arc::new(SimulatedBackend::new())).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_start_get_remove() {
        let manager = manager();
        let (id, handle) = manager.start().await;
        assert_eq!(handle.lock().await.phase(), ConversationPhase::Idle);
        assert!(Arc::ptr_eq(&handle, &manager.get(&id).await.unwrap()));

        assert!(manager.remove(&id).await);
        assert!(!manager.remove(&id).await);
        assert!(matches!(
            manager.get(&id).await,
            Err(SessionError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let manager = Arc::new(manager());
        let (a, _) = manager.start().await;
        let (b, _) = manager.start().await;
        assert_ne!(a, b);

        let tasks: Vec<_> = [a.clone(), b.clone()]
            .into_iter()
            .enumerate()
            .map(|(i, id)| {
                let manager = Arc::clone(&manager);
                tokio::spawn(async move {
                    let handle = manager.get(&id).await.unwrap();
                    let mut session = handle.lock().await;
                    session
                        .add_requirement(&format!("Requirement number {i}"), None, None)
                        .unwrap();
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        for id in [a, b] {
            let handle = manager.get(&id).await.unwrap();
            assert_eq!(handle.lock().await.requirements().len(), 1);
        }
        assert_eq!(manager.len().await, 2);
    }
}
