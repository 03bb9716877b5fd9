use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::brief::{TerritoryExpansion, UserContext};

/// An expansion together with the context it was generated for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedExpansion {
    pub expansion: TerritoryExpansion,
    pub user_context: UserContext,
}

/// Territory name -> latest expansion. No eviction, no TTL; `put` always
/// replaces the whole entry.
#[derive(Debug, Default, Clone)]
pub struct ExpansionCache {
    inner: Arc<Mutex<HashMap<String, CachedExpansion>>>,
}

impl ExpansionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<CachedExpansion> {
        self.inner.lock().get(key).cloned()
    }

    pub fn put(&self, key: &str, value: CachedExpansion) {
        self.inner.lock().insert(key.to_string(), value);
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

/// Proof that a request was started; only the newest ticket per key may
/// write shared state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    key: String,
    generation: u64,
}

impl Ticket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Per-key monotonically increasing request generations.
#[derive(Debug, Default)]
pub struct RequestFence {
    latest: Mutex<HashMap<String, u64>>,
}

impl RequestFence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self, key: &str) -> Ticket {
        let mut latest = self.latest.lock();
        let generation = latest.entry(key.to_string()).or_insert(0);
        *generation += 1;
        Ticket { key: key.to_string(), generation: *generation }
    }

    /// The newest ticket for `key` without starting a request. Generation 0
    /// stands for "nothing started yet".
    pub fn observe(&self, key: &str) -> Ticket {
        let generation = self.latest.lock().get(key).copied().unwrap_or(0);
        Ticket { key: key.to_string(), generation }
    }

    pub fn is_current(&self, ticket: &Ticket) -> bool {
        current(&self.latest.lock(), ticket)
    }

    /// Runs `write` only while `ticket` is still the newest for its key. The
    /// fence lock is held across `write`, so a newer `begin` cannot slip in
    /// between the check and the write.
    pub fn commit<F: FnOnce()>(&self, ticket: &Ticket, write: F) -> bool {
        self.commit_all(&[ticket], write)
    }

    /// Like [`commit`](Self::commit), but every ticket must still be current.
    pub fn commit_all<F: FnOnce()>(&self, tickets: &[&Ticket], write: F) -> bool {
        let latest = self.latest.lock();
        if !tickets.iter().all(|t| current(&latest, t)) {
            return false;
        }
        write();
        true
    }
}

fn current(latest: &HashMap<String, u64>, ticket: &Ticket) -> bool {
    latest.get(&ticket.key).copied().unwrap_or(0) == ticket.generation
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample(q: &str) -> CachedExpansion {
        CachedExpansion {
            expansion: TerritoryExpansion { evolution_questions: vec![q.into()], ..Default::default() },
            user_context: UserContext::default(),
        }
    }

    #[test]
    fn put_then_get_round_trips() {
        let cache = ExpansionCache::new();
        cache.put("Neon", sample("why?"));
        assert_eq!(cache.get("Neon"), Some(sample("why?")));
        assert_eq!(cache.get("unknown"), None);
    }

    #[test]
    fn put_overwrites_last_write_wins() {
        let cache = ExpansionCache::new();
        cache.put("Neon", sample("first"));
        cache.put("Neon", sample("second"));
        assert_eq!(cache.get("Neon"), Some(sample("second")));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn clones_share_storage_but_new_instances_do_not() {
        let a = ExpansionCache::new();
        let shared = a.clone();
        let isolated = ExpansionCache::new();
        a.put("k", sample("v"));
        assert!(shared.get("k").is_some());
        assert!(isolated.is_empty());
        a.clear();
        assert!(shared.is_empty());
    }

    #[test]
    fn newer_ticket_invalidates_older_one() {
        let fence = RequestFence::new();
        let first = fence.begin("Neon");
        let second = fence.begin("Neon");
        assert!(second.generation() > first.generation());
        assert!(!fence.is_current(&first));
        assert!(fence.is_current(&second));
    }

    #[test]
    fn keys_are_fenced_independently() {
        let fence = RequestFence::new();
        let a = fence.begin("a");
        let _b = fence.begin("b");
        assert!(fence.is_current(&a));
    }

    #[test]
    fn observed_ticket_goes_stale_once_a_request_begins() {
        let fence = RequestFence::new();
        let before = fence.observe("generation");
        assert_eq!(before.generation(), 0);
        assert!(fence.is_current(&before));

        let started = fence.begin("generation");
        assert!(!fence.is_current(&before));
        assert_eq!(fence.observe("generation"), started);
    }

    #[test]
    fn commit_all_requires_every_ticket_current() {
        let fence = RequestFence::new();
        let cache = ExpansionCache::new();
        let epoch = fence.observe("generation");
        let own = fence.begin("expand:Neon");
        fence.begin("generation");

        assert!(!fence.commit_all(&[&own, &epoch], || cache.put("Neon", sample("stale"))));
        assert!(cache.is_empty());

        let epoch = fence.observe("generation");
        assert!(fence.commit_all(&[&own, &epoch], || cache.put("Neon", sample("fresh"))));
        assert_eq!(cache.get("Neon"), Some(sample("fresh")));
    }

    #[test]
    fn stale_commit_does_not_write() {
        let fence = RequestFence::new();
        let cache = ExpansionCache::new();
        let stale = fence.begin("Neon");
        let fresh = fence.begin("Neon");

        assert!(fence.commit(&fresh, || cache.put("Neon", sample("fresh"))));
        assert!(!fence.commit(&stale, || cache.put("Neon", sample("stale"))));
        assert_eq!(cache.get("Neon"), Some(sample("fresh")));
    }
}
