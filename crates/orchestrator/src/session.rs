//! Per-session memory: bounded turn history, rolling summary, remembered
//! destination slots.
//!
//! Sessions are created lazily and live in a map behind an outer `RwLock`;
//! each session's state sits behind its own `Mutex`, so turns within one
//! session serialize while distinct sessions never contend. Overflowing
//! turns fold into the rolling summary instead of being dropped.
//!
//! Activity timestamps live in an atomic next to each state mutex, not
//! inside it: eviction runs entirely under the map lock with no per-session
//! await, so a session mid-fold (holding its mutex across a generator call)
//! cannot stall creation of unrelated sessions.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use wayfarer_agents::Summarizer;
use wayfarer_config::SessionConfig;
use wayfarer_core::query::Classification;
use wayfarer_core::session::{SessionId, Turn};

#[derive(Default)]
struct SessionState {
    country: Option<String>,
    city: Option<String>,
    dates: Option<String>,
    summary: String,
    turns: Vec<Turn>,
}

struct SessionSlot {
    state: Mutex<SessionState>,
    /// Nanoseconds since the store was created.
    last_active: AtomicU64,
}

impl SessionSlot {
    fn new(now: u64) -> Self {
        Self { state: Mutex::new(SessionState::default()), last_active: AtomicU64::new(now) }
    }

    fn touch(&self, now: u64) {
        self.last_active.store(now, Ordering::Relaxed);
    }

    fn idle(&self, now: u64) -> u64 {
        now.saturating_sub(self.last_active.load(Ordering::Relaxed))
    }
}

/// A read-only copy of what a session currently remembers.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    pub country: Option<String>,
    pub city: Option<String>,
    pub dates: Option<String>,
    pub summary: String,
    pub turns: Vec<Turn>,
}

impl SessionSnapshot {
    /// The memory hint line fed to the classifier.
    pub fn memory_hint(&self) -> String {
        format!(
            "summary={}; country={}; city={}; dates={}",
            self.summary,
            self.country.as_deref().unwrap_or("-"),
            self.city.as_deref().unwrap_or("-"),
            self.dates.as_deref().unwrap_or("-"),
        )
    }
}

pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, Arc<SessionSlot>>>,
    config: SessionConfig,
    summarizer: Summarizer,
    started: Instant,
}

impl SessionStore {
    pub fn new(config: SessionConfig, summarizer: Summarizer) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            config,
            summarizer,
            started: Instant::now(),
        }
    }

    async fn entry(&self, id: &SessionId) -> Arc<SessionSlot> {
        if let Some(found) = self.sessions.read().await.get(id) {
            return Arc::clone(found);
        }

        // Creating a session is the housekeeping point: expire idle
        // sessions first, then enforce the cap. Both are synchronous map
        // operations; the write guard is never held across an await.
        let now = self.now();
        let mut sessions = self.sessions.write().await;
        sweep_idle(&mut sessions, self.ttl(), now);
        if sessions.len() >= self.config.max_sessions && !sessions.contains_key(id) {
            evict_least_recently_active(&mut sessions);
        }
        Arc::clone(
            sessions.entry(id.clone()).or_insert_with(|| Arc::new(SessionSlot::new(now))),
        )
    }

    fn now(&self) -> u64 {
        self.started.elapsed().as_nanos() as u64
    }

    fn ttl(&self) -> u64 {
        Duration::from_secs(self.config.ttl_minutes * 60).as_nanos() as u64
    }

    /// Current memory of a session. A fresh id yields an empty snapshot
    /// without creating the session.
    pub async fn snapshot(&self, id: &SessionId) -> SessionSnapshot {
        let Some(slot) = self.sessions.read().await.get(id).map(Arc::clone) else {
            return SessionSnapshot::default();
        };
        let state = slot.state.lock().await;
        SessionSnapshot {
            country: state.country.clone(),
            city: state.city.clone(),
            dates: state.dates.clone(),
            summary: state.summary.clone(),
            turns: state.turns.clone(),
        }
    }

    /// Store the slots a classification resolved, overwriting remembered
    /// values with fresh ones and keeping the old where the new is unset.
    pub async fn remember_slots(&self, id: &SessionId, classification: &Classification) {
        let slot = self.entry(id).await;
        slot.touch(self.now());
        let mut state = slot.state.lock().await;
        if classification.country.is_some() {
            state.country = classification.country.clone();
        }
        if classification.city.is_some() {
            state.city = classification.city.clone();
        }
        if classification.dates.is_some() {
            state.dates = classification.dates.clone();
        }
    }

    /// Append a turn; overflow folds the oldest turns into the summary.
    pub async fn append(&self, id: &SessionId, turn: Turn) {
        let slot = self.entry(id).await;
        slot.touch(self.now());
        let mut state = slot.state.lock().await;
        state.turns.push(turn);

        if state.turns.len() <= self.config.max_turns {
            return;
        }

        let fold_count = state.turns.len() - self.config.max_turns / 2;
        let folded: Vec<Turn> = state.turns.drain(..fold_count).collect();
        let transcript: Vec<String> = folded.iter().map(Turn::transcript_line).collect();

        debug!(session = %id, folded = folded.len(), "Folding turns into the summary");
        state.summary = self.summarizer.update(&state.summary, &transcript.join("\n")).await;
    }

    /// Drop sessions idle longer than the configured TTL.
    pub async fn evict_idle(&self) {
        let now = self.now();
        let mut sessions = self.sessions.write().await;
        sweep_idle(&mut sessions, self.ttl(), now);
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// Remove sessions whose idle time reached the TTL.
fn sweep_idle(sessions: &mut HashMap<SessionId, Arc<SessionSlot>>, ttl: u64, now: u64) {
    let before = sessions.len();
    sessions.retain(|_, slot| slot.idle(now) < ttl);
    let evicted = before - sessions.len();
    if evicted > 0 {
        info!(evicted, remaining = sessions.len(), "Idle sessions evicted");
    }
}

fn evict_least_recently_active(sessions: &mut HashMap<SessionId, Arc<SessionSlot>>) {
    let oldest = sessions
        .iter()
        .min_by_key(|(_, slot)| slot.last_active.load(Ordering::Relaxed))
        .map(|(id, _)| id.clone());
    if let Some(id) = oldest {
        info!(session = %id, "Session cap reached, evicting least recently active");
        sessions.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Arc as StdArc;
    use std::time::Duration;
    use wayfarer_agents::testing::SequentialMockGenerator;
    use wayfarer_core::error::GeneratorError;
    use wayfarer_core::generator::{GenerationRequest, GenerationResponse, Generator};

    fn store_with(max_turns: usize, max_sessions: usize, script: Vec<&str>) -> SessionStore {
        let generator: StdArc<dyn Generator> = StdArc::new(SequentialMockGenerator::new(
            script.into_iter().map(|s| Ok(s.to_string())).collect(),
        ));
        let config = SessionConfig { max_turns, ttl_minutes: 120, max_sessions };
        SessionStore::new(config, Summarizer::new(generator))
    }

    /// A generator that answers after a fixed delay, like a slow model.
    struct SlowGenerator {
        delay: Duration,
    }

    #[async_trait]
    impl Generator for SlowGenerator {
        fn name(&self) -> &str {
            "slow"
        }

        async fn generate(
            &self,
            _request: GenerationRequest,
        ) -> Result<GenerationResponse, GeneratorError> {
            tokio::time::sleep(self.delay).await;
            Ok(GenerationResponse { content: "folded".into(), model: "slow-model".into() })
        }
    }

    #[tokio::test]
    async fn fresh_session_snapshot_is_empty() {
        let store = store_with(12, 100, vec![]);
        let snapshot = store.snapshot(&SessionId::new()).await;
        assert!(snapshot.turns.is_empty());
        assert!(snapshot.summary.is_empty());
        assert_eq!(store.session_count().await, 0);
    }

    #[tokio::test]
    async fn remembered_slots_survive_across_turns() {
        let store = store_with(12, 100, vec![]);
        let id = SessionId::new();

        let classification = Classification {
            country: Some("Japan".into()),
            city: Some("Tokyo".into()),
            ..Default::default()
        };
        store.remember_slots(&id, &classification).await;

        let update_only_dates =
            Classification { dates: Some("May 1-5".into()), ..Default::default() };
        store.remember_slots(&id, &update_only_dates).await;

        let snapshot = store.snapshot(&id).await;
        assert_eq!(snapshot.country.as_deref(), Some("Japan"));
        assert_eq!(snapshot.city.as_deref(), Some("Tokyo"));
        assert_eq!(snapshot.dates.as_deref(), Some("May 1-5"));
        assert!(snapshot.memory_hint().contains("country=Japan"));
    }

    #[tokio::test]
    async fn overflow_folds_oldest_turns_into_summary() {
        let store = store_with(4, 100, vec!["Trip summary: Tokyo, temples."]);
        let id = SessionId::new();

        for i in 0..5 {
            store.append(&id, Turn::user(format!("message {i}"))).await;
        }

        let snapshot = store.snapshot(&id).await;
        assert_eq!(snapshot.summary, "Trip summary: Tokyo, temples.");
        // Half the window stays as verbatim turns.
        assert_eq!(snapshot.turns.len(), 2);
        assert_eq!(snapshot.turns[0].text, "message 3");
    }

    #[tokio::test]
    async fn summary_fold_failure_keeps_old_summary() {
        let generator: StdArc<dyn Generator> =
            StdArc::new(SequentialMockGenerator::always_failing(
                GeneratorError::Network("down".into()),
            ));
        let config = SessionConfig { max_turns: 2, ttl_minutes: 120, max_sessions: 100 };
        let store = SessionStore::new(config, Summarizer::new(generator));
        let id = SessionId::new();

        for i in 0..3 {
            store.append(&id, Turn::user(format!("m{i}"))).await;
        }
        let snapshot = store.snapshot(&id).await;
        assert_eq!(snapshot.summary, "");
        assert_eq!(snapshot.turns.len(), 1);
    }

    #[tokio::test]
    async fn evict_idle_honors_ttl() {
        let generator: StdArc<dyn Generator> =
            StdArc::new(SequentialMockGenerator::new(vec![]));
        let config = SessionConfig { max_turns: 12, ttl_minutes: 0, max_sessions: 100 };
        let store = SessionStore::new(config, Summarizer::new(generator));

        store.append(&SessionId::new(), Turn::user("a")).await;
        assert_eq!(store.session_count().await, 1);

        store.evict_idle().await;
        assert_eq!(store.session_count().await, 0);
    }

    #[tokio::test]
    async fn session_cap_evicts_least_recently_active() {
        let store = store_with(12, 2, vec![]);
        let first = SessionId::new();
        let second = SessionId::new();
        let third = SessionId::new();

        store.append(&first, Turn::user("a")).await;
        store.append(&second, Turn::user("b")).await;
        store.append(&third, Turn::user("c")).await;

        assert_eq!(store.session_count().await, 2);
        assert!(store.snapshot(&first).await.turns.is_empty());
        assert_eq!(store.snapshot(&third).await.turns.len(), 1);
    }

    #[tokio::test]
    async fn new_session_is_not_blocked_by_anothers_summary_fold() {
        let generator: StdArc<dyn Generator> =
            StdArc::new(SlowGenerator { delay: Duration::from_millis(400) });
        let config = SessionConfig { max_turns: 2, ttl_minutes: 120, max_sessions: 1 };
        let store =
            StdArc::new(SessionStore::new(config, Summarizer::new(generator)));
        let busy = SessionId::new();

        store.append(&busy, Turn::user("m0")).await;
        store.append(&busy, Turn::user("m1")).await;

        // The third turn overflows and folds through the slow generator,
        // holding the busy session's mutex for the whole call.
        let fold = tokio::spawn({
            let store = StdArc::clone(&store);
            let busy = busy.clone();
            async move { store.append(&busy, Turn::user("m2")).await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;

        // At the cap, a fresh session's first turn evicts the least
        // recently active entry; it must not wait for the in-flight fold.
        let fresh = SessionId::new();
        let quick = tokio::time::timeout(
            Duration::from_millis(150),
            store.append(&fresh, Turn::user("hello")),
        )
        .await;
        assert!(quick.is_ok(), "first turn of a new session waited on another session's fold");

        fold.await.expect("fold task");
        assert_eq!(store.snapshot(&fresh).await.turns.len(), 1);
    }
}
