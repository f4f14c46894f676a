use super::Session;
use crate::error::RegistryError;
use noodleseed_core::SessionId;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Table of live sessions keyed by identity
///
/// The front door inserts; only the owning session removes its own entry.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, Arc<Session>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new session; an existing identity is never overwritten
    pub fn register(&self, id: SessionId, session: Arc<Session>) -> Result<(), RegistryError> {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        if sessions.contains_key(&id) {
            tracing::error!(session_id = %id, "Session identity collision");
            return Err(RegistryError::DuplicateIdentity(id));
        }
        sessions.insert(id, session);
        tracing::info!(session_id = %id, "Registered session ({} active)", sessions.len());
        Ok(())
    }

    pub fn lookup(&self, id: &SessionId) -> Option<Arc<Session>> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Remove a session if present; removing twice is a no-op
    pub fn remove(&self, id: &SessionId) -> Option<Arc<Session>> {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
    }

    /// Run `transition` under the write lock and remove `id` only if it
    /// returns true. Returns what `transition` returned.
    ///
    /// Lookups take the read lock, so none can observe the entry between the
    /// transition and its removal.
    pub fn remove_with(&self, id: &SessionId, transition: impl FnOnce() -> bool) -> bool {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        if !transition() {
            return false;
        }
        sessions.remove(id);
        true
    }

    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ids(&self) -> Vec<SessionId> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect()
    }

    /// Close every registered session, each independently of the others
    pub fn close_all(&self) -> usize {
        let sessions: Vec<Arc<Session>> = self
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();

        for session in &sessions {
            session.close();
        }

        tracing::info!("Closed {} sessions", sessions.len());
        sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ServerInfo;
    use crate::server::McpServer;
    use crate::session::{SessionOptions, SessionState};
    use crate::tools::{noodleseed_catalog, WidgetAssets};
    use noodleseed_core::Catalog;
    use std::collections::HashSet;

    fn catalog() -> Arc<Catalog> {
        Arc::new(noodleseed_catalog(&WidgetAssets::default()).unwrap())
    }

    fn engine(catalog: &Arc<Catalog>) -> McpServer {
        McpServer::new(Arc::clone(catalog), ServerInfo::new("noodleseed-test", "1.0.0"))
    }

    #[test]
    fn test_register_rejects_duplicate_identity() {
        let registry = Arc::new(SessionRegistry::new());
        let catalog = catalog();
        let (session, _stream) =
            Session::open(&registry, engine(&catalog), &SessionOptions::default()).unwrap();

        let err = registry.register(session.id(), Arc::clone(&session)).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateIdentity(session.id()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let registry = Arc::new(SessionRegistry::new());
        let catalog = catalog();
        let (session, _stream) =
            Session::open(&registry, engine(&catalog), &SessionOptions::default()).unwrap();

        assert!(registry.remove(&session.id()).is_some());
        assert!(registry.remove(&session.id()).is_none());
        assert!(registry.lookup(&session.id()).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_lookup_unknown_identity() {
        let registry = SessionRegistry::new();
        assert!(registry.lookup(&SessionId::new()).is_none());
    }

    #[test]
    fn test_close_all_closes_every_session() {
        let registry = Arc::new(SessionRegistry::new());
        let catalog = catalog();
        let opened: Vec<_> = (0..4)
            .map(|_| Session::open(&registry, engine(&catalog), &SessionOptions::default()).unwrap())
            .collect();

        assert_eq!(registry.close_all(), 4);
        assert!(registry.is_empty());
        for (session, _stream) in &opened {
            assert_eq!(session.state(), SessionState::Closed);
        }
    }

    #[test]
    fn test_remove_with_skips_removal_when_transition_refuses() {
        let registry = Arc::new(SessionRegistry::new());
        let catalog = catalog();
        let (session, _stream) =
            Session::open(&registry, engine(&catalog), &SessionOptions::default()).unwrap();

        assert!(!registry.remove_with(&session.id(), || false));
        assert!(registry.lookup(&session.id()).is_some());

        assert!(registry.remove_with(&session.id(), || true));
        assert!(registry.lookup(&session.id()).is_none());
    }

    /// State of the entry for `id`, read while the registry's read lock is held
    fn registered_state(registry: &SessionRegistry, id: &SessionId) -> Option<SessionState> {
        let sessions = registry.sessions.read().unwrap();
        sessions.get(id).map(|session| session.state())
    }

    #[test]
    fn test_registered_session_is_always_active_while_closing() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let registry = Arc::new(SessionRegistry::new());
        let catalog = catalog();

        for _ in 0..200 {
            let (session, stream) =
                Session::open(&registry, engine(&catalog), &SessionOptions::default()).unwrap();
            let id = session.id();
            drop(session);

            let done = Arc::new(AtomicBool::new(false));
            let watcher = {
                let registry = Arc::clone(&registry);
                let done = Arc::clone(&done);
                std::thread::spawn(move || {
                    let mut stale = 0;
                    while !done.load(Ordering::Acquire) {
                        if let Some(state) = registered_state(&registry, &id) {
                            if state != SessionState::Active {
                                stale += 1;
                            }
                        }
                    }
                    stale
                })
            };

            std::thread::yield_now();
            drop(stream);
            done.store(true, Ordering::Release);

            assert_eq!(watcher.join().unwrap(), 0);
            assert!(registry.lookup(&id).is_none());
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_open_lookup_close() {
        let registry = Arc::new(SessionRegistry::new());
        let catalog = catalog();

        let mut handles = Vec::new();
        for _ in 0..32 {
            let registry = Arc::clone(&registry);
            let catalog = Arc::clone(&catalog);
            handles.push(tokio::spawn(async move {
                let (session, stream) =
                    Session::open(&registry, engine(&catalog), &SessionOptions::default()).unwrap();
                let id = session.id();

                let found = registry.lookup(&id).unwrap();
                assert!(Arc::ptr_eq(&found, &session));
                assert_eq!(found.state(), SessionState::Active);

                tokio::task::yield_now().await;
                drop(stream);

                assert!(registry.lookup(&id).is_none());
                id
            }));
        }

        let mut ids = HashSet::new();
        for handle in handles {
            ids.insert(handle.await.unwrap());
        }

        assert_eq!(ids.len(), 32);
        assert!(registry.is_empty());
    }
}
