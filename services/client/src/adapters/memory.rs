//! services/client/src/adapters/memory.rs
//!
//! In-memory implementations of the remote ports, used by the store tests and
//! the demo binary. Documents are scoped per user the same way the remote
//! store scopes them, so sign-in/sign-out behavior can be exercised without a
//! network.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use study_coach_core::domain::{
    AnalysisResponse, Goal, GoalPatch, InsightSnapshot, QuestionResponse, Session, SessionPatch,
};
use study_coach_core::ports::{
    AnalysisService, GoalRepository, InsightsService, PortError, PortResult, SessionRepository,
};
use tokio::sync::RwLock;

//=========================================================================================
// MemoryDocumentStore
//=========================================================================================

/// Per-user session and goal documents behind an `RwLock`. Flipping
/// `set_offline(true)` makes every call fail, which is how the store tests
/// exercise the logged-but-not-surfaced persistence error paths.
#[derive(Default)]
pub struct MemoryDocumentStore {
    sessions: RwLock<HashMap<String, Vec<Session>>>,
    goals: RwLock<HashMap<String, Vec<Goal>>>,
    offline: AtomicBool,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> PortResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected(
                "document store is offline".to_string(),
            ));
        }
        Ok(())
    }

    /// Seeds a user's remote session documents, bypassing the offline switch.
    pub async fn seed_sessions(&self, uid: &str, sessions: Vec<Session>) {
        self.sessions.write().await.insert(uid.to_string(), sessions);
    }

    /// Seeds a user's remote goal documents, bypassing the offline switch.
    pub async fn seed_goals(&self, uid: &str, goals: Vec<Goal>) {
        self.goals.write().await.insert(uid.to_string(), goals);
    }
}

#[async_trait]
impl SessionRepository for MemoryDocumentStore {
    async fn upsert_session(&self, uid: &str, session: &Session) -> PortResult<()> {
        self.ensure_online()?;
        let mut store = self.sessions.write().await;
        let documents = store.entry(uid.to_string()).or_default();
        match documents.iter_mut().find(|s| s.id == session.id) {
            Some(existing) => *existing = session.clone(),
            None => documents.push(session.clone()),
        }
        Ok(())
    }

    async fn fetch_sessions(&self, uid: &str) -> PortResult<Vec<Session>> {
        self.ensure_online()?;
        Ok(self
            .sessions
            .read()
            .await
            .get(uid)
            .cloned()
            .unwrap_or_default())
    }

    async fn update_session(
        &self,
        uid: &str,
        session_id: &str,
        patch: &SessionPatch,
    ) -> PortResult<()> {
        self.ensure_online()?;
        let mut store = self.sessions.write().await;
        let documents = store.entry(uid.to_string()).or_default();
        let session = documents
            .iter_mut()
            .find(|s| s.id == session_id)
            .ok_or_else(|| PortError::NotFound(format!("session {session_id}")))?;
        session.apply_patch(patch);
        Ok(())
    }

    async fn delete_session(&self, uid: &str, session_id: &str) -> PortResult<()> {
        self.ensure_online()?;
        let mut store = self.sessions.write().await;
        if let Some(documents) = store.get_mut(uid) {
            documents.retain(|s| s.id != session_id);
        }
        Ok(())
    }
}

#[async_trait]
impl GoalRepository for MemoryDocumentStore {
    async fn upsert_goal(&self, uid: &str, goal: &Goal) -> PortResult<()> {
        self.ensure_online()?;
        let mut store = self.goals.write().await;
        let documents = store.entry(uid.to_string()).or_default();
        match documents.iter_mut().find(|g| g.id == goal.id) {
            Some(existing) => *existing = goal.clone(),
            None => documents.push(goal.clone()),
        }
        Ok(())
    }

    async fn fetch_goals(&self, uid: &str) -> PortResult<Vec<Goal>> {
        self.ensure_online()?;
        Ok(self
            .goals
            .read()
            .await
            .get(uid)
            .cloned()
            .unwrap_or_default())
    }

    async fn update_goal(&self, uid: &str, goal_id: &str, patch: &GoalPatch) -> PortResult<()> {
        self.ensure_online()?;
        let mut store = self.goals.write().await;
        let documents = store.entry(uid.to_string()).or_default();
        let goal = documents
            .iter_mut()
            .find(|g| g.id == goal_id)
            .ok_or_else(|| PortError::NotFound(format!("goal {goal_id}")))?;
        goal.apply_patch(patch);
        Ok(())
    }

    async fn delete_goal(&self, uid: &str, goal_id: &str) -> PortResult<()> {
        self.ensure_online()?;
        let mut store = self.goals.write().await;
        if let Some(documents) = store.get_mut(uid) {
            documents.retain(|g| g.id != goal_id);
        }
        Ok(())
    }
}

//=========================================================================================
// Canned analysis / insights services
//=========================================================================================

/// Always answers with the same canned analysis response.
pub struct MemoryAnalysisService {
    response: AnalysisResponse,
}

impl MemoryAnalysisService {
    pub fn new(response: AnalysisResponse) -> Self {
        Self { response }
    }
}

#[async_trait]
impl AnalysisService for MemoryAnalysisService {
    async fn analyze(
        &self,
        _selected_text: &str,
        _qa_pairs: &[QuestionResponse],
    ) -> PortResult<AnalysisResponse> {
        Ok(self.response.clone())
    }
}

/// Always answers with the same canned insight lines.
pub struct MemoryInsightsService {
    insights: Vec<String>,
}

impl MemoryInsightsService {
    pub fn new(insights: Vec<String>) -> Self {
        Self { insights }
    }
}

#[async_trait]
impl InsightsService for MemoryInsightsService {
    async fn generate_insights(&self, _sessions: &[InsightSnapshot]) -> PortResult<Vec<String>> {
        Ok(self.insights.clone())
    }
}
