use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use uuid::Uuid;

use crate::agent::Agent;

/// A session's agent, locked by whoever is running a turn on it
pub type SharedAgent = Arc<tokio::sync::Mutex<Agent>>;

/// Live conversations keyed by session id.
///
/// Sessions live until they are removed; nothing is evicted.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, SharedAgent>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the session's agent, building it with `build` if the session is new.
    ///
    /// The check and insert happen under one lock, so concurrent first requests for the same
    /// id share one agent. When `build` fails nothing is inserted.
    pub fn get_or_create<F, E>(&self, id: &str, build: F) -> Result<SharedAgent, E>
    where
        F: FnOnce() -> Result<Agent, E>,
    {
        let mut sessions = self.lock();
        if let Some(agent) = sessions.get(id) {
            return Ok(Arc::clone(agent));
        }

        let agent = Arc::new(tokio::sync::Mutex::new(build()?));
        sessions.insert(id.to_string(), Arc::clone(&agent));
        tracing::info!(session_id = %id, "created session");
        Ok(agent)
    }

    pub fn get(&self, id: &str) -> Option<SharedAgent> {
        self.lock().get(id).cloned()
    }

    pub fn remove(&self, id: &str) -> Option<SharedAgent> {
        self.lock().remove(id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, SharedAgent>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// A fresh id of the form `sess_` followed by 8 hex digits
pub fn new_session_id() -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    format!("sess_{}", &uuid[..8])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::mock::MockProvider;
    use crate::tools::{ToolContext, ToolRegistry};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn build_agent() -> Result<Agent, String> {
        Ok(Agent::new(
            Arc::new(MockProvider::new(Vec::new())),
            Arc::new(ToolRegistry::new(ToolContext::default())),
        ))
    }

    #[test]
    fn test_session_id_format() {
        let id = new_session_id();
        assert_eq!(id.len(), 13);
        assert!(id.starts_with("sess_"));
        assert!(id[5..].chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(new_session_id(), new_session_id());
    }

    #[test]
    fn test_get_or_create_reuses_session() {
        let registry = SessionRegistry::new();
        assert!(registry.is_empty());

        let first = registry.get_or_create("sess_1", build_agent).unwrap();
        let second = registry
            .get_or_create("sess_1", || -> Result<Agent, String> {
                panic!("must not build an existing session")
            })
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
        assert!(registry.get("sess_1").is_some());
        assert!(registry.get("sess_2").is_none());
    }

    #[test]
    fn test_failed_build_inserts_nothing() {
        let registry = SessionRegistry::new();
        let result = registry.get_or_create("sess_1", || Err::<Agent, _>("no api key".to_string()));
        assert_eq!(result.err().as_deref(), Some("no api key"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remove() {
        let registry = SessionRegistry::new();
        registry.get_or_create("sess_1", build_agent).unwrap();
        assert!(registry.remove("sess_1").is_some());
        assert!(registry.remove("sess_1").is_none());
        assert!(registry.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_requests_build_once() {
        let registry = Arc::new(SessionRegistry::new());
        let builds = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let builds = Arc::clone(&builds);
                tokio::spawn(async move {
                    registry
                        .get_or_create("sess_shared", || {
                            builds.fetch_add(1, Ordering::SeqCst);
                            build_agent()
                        })
                        .unwrap()
                })
            })
            .collect();

        let mut agents = Vec::new();
        for handle in handles {
            agents.push(handle.await.unwrap());
        }

        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len(), 1);
        assert!(agents.iter().all(|agent| Arc::ptr_eq(agent, &agents[0])));
    }
}
