//! Named sessions sharing one backend

use super::ReviewSession;
use crate::backend::ReviewBackend;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

/// Holds independent review sessions keyed by name.
///
/// Each session owns its own analysis and transcript; only the backend
/// is shared.
pub struct SessionRegistry {
    backend: Arc<dyn ReviewBackend>,
    timeout: Duration,
    sessions: DashMap<String, Arc<ReviewSession>>,
}

impl SessionRegistry {
    pub fn new(backend: Arc<dyn ReviewBackend>, timeout: Duration) -> Self {
        Self {
            backend,
            timeout,
            sessions: DashMap::new(),
        }
    }

    /// Get a session by name, creating it on first use
    pub fn get_or_create(&self, name: &str) -> Arc<ReviewSession> {
        self.sessions
            .entry(name.to_string())
            .or_insert_with(|| {
                Arc::new(ReviewSession::new(self.backend.clone()).with_timeout(self.timeout))
            })
            .clone()
    }

    pub fn get(&self, name: &str) -> Option<Arc<ReviewSession>> {
        self.sessions.get(name).map(|r| r.clone())
    }

    pub fn remove(&self, name: &str) -> bool {
        self.sessions.remove(name).is_some()
    }

    /// Session names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.sessions.iter().map(|r| r.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;

    fn registry() -> SessionRegistry {
        SessionRegistry::new(Arc::new(MockBackend::new()), Duration::from_secs(5))
    }

    #[test]
    fn get_or_create_reuses_session() {
        let registry = registry();
        let a = registry.get_or_create("default");
        let b = registry.get_or_create("default");
        assert_eq!(a.id(), b.id());
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn sessions_are_independent() {
        let registry = registry();
        let a = registry.get_or_create("a");
        let b = registry.get_or_create("b");

        a.submit_document("lease.txt", "Rent is due monthly.", "en")
            .await
            .unwrap();

        assert!(a.analysis().is_some());
        assert!(b.analysis().is_none());
        assert_eq!(registry.names(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn remove_drops_session() {
        let registry = registry();
        registry.get_or_create("x");
        assert!(registry.remove("x"));
        assert!(!registry.remove("x"));
        assert!(registry.get("x").is_none());
        assert!(registry.is_empty());
    }
}
