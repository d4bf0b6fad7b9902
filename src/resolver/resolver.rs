use crate::resolver::generation::{Generation, GenerationGuard};
use std::fmt::{Debug, Display};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionState<K, T> {
    Idle,
    Pending(K),
    Found(K, T),
    NotFound(K),
    Failed(K, String),
}

/// A request the owner has to issue. Its result goes back through [`Resolver::complete`]
/// together with the generation.
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup<K> {
    pub generation: Generation,
    pub key: K,
}

/// Turns committed keys into a single classification request each and folds the
/// results into a [`ResolutionState`], last committed key wins.
#[derive(Debug)]
pub struct Resolver<K, T> {
    committed: Option<K>,
    state: ResolutionState<K, T>,
    guard: GenerationGuard,
}

impl<K, T> Resolver<K, T>
where
    K: Clone + PartialEq + Debug,
{
    pub fn new() -> Self {
        Resolver {
            committed: None,
            state: ResolutionState::Idle,
            guard: GenerationGuard::new(),
        }
    }

    pub fn state(&self) -> &ResolutionState<K, T> {
        &self.state
    }

    pub fn committed(&self) -> Option<&K> {
        self.committed.as_ref()
    }

    /// Commits a new key. Clearing the key goes idle right away; a key different from
    /// the committed one yields the lookup to issue. Re-committing the same key does nothing
    /// unless its lookup failed.
    pub fn commit(&mut self, key: Option<K>) -> Option<Lookup<K>> {
        if !self.guard.is_live() || !self.accepts_commit(key.as_ref()) {
            return None;
        }

        match key {
            None => {
                self.committed = None;
                self.guard.supersede();
                self.state = ResolutionState::Idle;
                None
            }
            Some(key) => Some(self.issue(key)),
        }
    }

    pub fn accepts_commit(&self, key: Option<&K>) -> bool {
        key != self.committed.as_ref() || matches!(self.state, ResolutionState::Failed(..))
    }

    /// Looks the committed key up again under a fresh generation.
    pub fn reissue(&mut self) -> Option<Lookup<K>> {
        if !self.guard.is_live() {
            return None;
        }
        let key = self.committed.clone()?;
        Some(self.issue(key))
    }

    fn issue(&mut self, key: K) -> Lookup<K> {
        let generation = self.guard.arm();
        self.committed = Some(key.clone());
        self.state = ResolutionState::Pending(key.clone());
        Lookup { generation, key }
    }

    /// Applies a lookup result. Returns `false` when the result was discarded because a
    /// newer key was committed or the resolver was torn down.
    pub fn complete<E: Display>(&mut self, generation: Generation, outcome: Result<Option<T>, E>) -> bool {
        if !self.guard.accepts(generation) {
            debug!(%generation, "Discarding stale lookup result");
            return false;
        }
        let Some(key) = self.committed.clone() else {
            return false;
        };

        self.state = match outcome {
            Ok(Some(payload)) => ResolutionState::Found(key, payload),
            Ok(None) => ResolutionState::NotFound(key),
            Err(error) => ResolutionState::Failed(key, error.to_string()),
        };
        true
    }

    /// Records what the committed key resolves to after a successful mutation, superseding
    /// any lookup still in flight.
    pub fn settle(&mut self, payload: Option<T>) {
        let Some(key) = self.committed.clone() else {
            return;
        };
        self.guard.supersede();
        self.state = match payload {
            Some(payload) => ResolutionState::Found(key, payload),
            None => ResolutionState::NotFound(key),
        };
    }

    pub fn tear_down(&mut self) {
        self.guard.tear_down();
    }

    pub fn is_live(&self) -> bool {
        self.guard.is_live()
    }
}

impl<K, T> Default for Resolver<K, T>
where
    K: Clone + PartialEq + Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    type TestResolver = Resolver<&'static str, u32>;

    fn ok(payload: Option<u32>) -> Result<Option<u32>, String> {
        Ok(payload)
    }

    #[test]
    fn committing_a_key_issues_one_lookup() {
        let mut resolver = TestResolver::new();

        let lookup = resolver.commit(Some("a")).expect("expected a lookup");

        assert_eq!(lookup.key, "a");
        assert_eq!(resolver.state(), &ResolutionState::Pending("a"));
    }

    #[test]
    fn recommitting_the_same_key_does_nothing() {
        let mut resolver = TestResolver::new();
        resolver.commit(Some("a"));

        assert_eq!(resolver.commit(Some("a")), None);
    }

    #[test]
    fn clearing_the_key_goes_idle_without_a_lookup() {
        let mut resolver = TestResolver::new();
        let lookup = resolver.commit(Some("a")).unwrap();

        assert_eq!(resolver.commit(None), None);
        assert_eq!(resolver.state(), &ResolutionState::Idle);

        // The in-flight lookup for "a" no longer counts
        assert!(!resolver.complete(lookup.generation, ok(Some(1))));
        assert_eq!(resolver.state(), &ResolutionState::Idle);
    }

    #[test]
    fn recommitting_a_failed_key_looks_it_up_again() {
        let mut resolver = TestResolver::new();
        let lookup = resolver.commit(Some("a")).unwrap();
        resolver.complete(lookup.generation, Err::<Option<u32>, _>("timeout"));

        let retry = resolver.commit(Some("a")).expect("expected a retry");

        assert_eq!(retry.key, "a");
        assert_eq!(resolver.state(), &ResolutionState::Pending("a"));
    }

    #[test]
    fn classifies_lookup_outcomes() {
        let mut resolver = TestResolver::new();

        let lookup = resolver.commit(Some("a")).unwrap();
        resolver.complete(lookup.generation, ok(Some(7)));
        assert_eq!(resolver.state(), &ResolutionState::Found("a", 7));

        let lookup = resolver.commit(Some("b")).unwrap();
        resolver.complete(lookup.generation, ok(None));
        assert_eq!(resolver.state(), &ResolutionState::NotFound("b"));

        let lookup = resolver.commit(Some("c")).unwrap();
        resolver.complete(lookup.generation, Err::<Option<u32>, _>("connection refused"));
        assert_eq!(resolver.state(), &ResolutionState::Failed("c", "connection refused".to_string()));
    }

    #[test]
    fn late_result_for_a_superseded_key_is_discarded() {
        let mut resolver = TestResolver::new();
        let a = resolver.commit(Some("a")).unwrap();
        let b = resolver.commit(Some("b")).unwrap();

        assert!(resolver.complete(b.generation, ok(None)));
        assert!(!resolver.complete(a.generation, ok(Some(1))));

        assert_eq!(resolver.state(), &ResolutionState::NotFound("b"));
    }

    #[test]
    fn reissue_supersedes_the_previous_lookup() {
        let mut resolver = TestResolver::new();
        let first = resolver.commit(Some("a")).unwrap();

        let second = resolver.reissue().expect("expected a lookup");

        assert_eq!(second.key, "a");
        assert!(!resolver.complete(first.generation, ok(Some(1))));
        assert!(resolver.complete(second.generation, ok(Some(2))));
        assert_eq!(resolver.state(), &ResolutionState::Found("a", 2));
    }

    #[test]
    fn reissue_without_a_key_does_nothing() {
        let mut resolver = TestResolver::new();

        assert_eq!(resolver.reissue(), None);
    }

    #[test]
    fn settle_overrides_an_in_flight_lookup() {
        let mut resolver = TestResolver::new();
        let lookup = resolver.commit(Some("a")).unwrap();

        resolver.settle(Some(3));

        assert!(!resolver.complete(lookup.generation, ok(None)));
        assert_eq!(resolver.state(), &ResolutionState::Found("a", 3));
    }

    #[test]
    fn torn_down_resolver_ignores_results_and_commits() {
        let mut resolver = TestResolver::new();
        let lookup = resolver.commit(Some("a")).unwrap();

        resolver.tear_down();

        assert!(!resolver.complete(lookup.generation, ok(Some(1))));
        assert_eq!(resolver.commit(Some("b")), None);
        assert_eq!(resolver.state(), &ResolutionState::Pending("a"));
    }
}
