//! services/client/src/stores/sessions.rs
//!
//! The session store: owns the in-memory session collection, the
//! current-session pointer, and review mode. Every mutation lands locally
//! first; the matching remote write runs on a spawned task and is never
//! allowed to roll the local change back. Divergence from the remote store is
//! resolved by `sync_from_remote`, which merges by id with remote values
//! winning.

use std::sync::Arc;

use chrono::Utc;
use study_coach_core::domain::{
    generate_session_id, AnalysisRecord, AnalysisResponse, Session, SessionDraft, SessionPatch,
};
use study_coach_core::ports::{IdentityProvider, SessionRepository};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error};

//=========================================================================================
// Store state
//=========================================================================================

#[derive(Default)]
struct SessionsState {
    sessions: Vec<Session>,
    current_session_id: Option<String>,
    review_mode: bool,
    review_analysis: Option<AnalysisRecord>,
}

impl SessionsState {
    fn sorted_sessions(&self) -> Vec<Session> {
        let mut sessions = self.sessions.clone();
        sessions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        sessions
    }
}

//=========================================================================================
// SessionStore
//=========================================================================================

/// Owns the session collection. Built once at startup with the identity and
/// repository ports injected, then shared behind an `Arc`.
pub struct SessionStore {
    identity: Arc<dyn IdentityProvider>,
    repository: Arc<dyn SessionRepository>,
    state: RwLock<SessionsState>,
    /// In-flight token for `sync_from_remote`: a sync arriving while another
    /// is running is dropped instead of interleaving with it.
    sync_token: Mutex<()>,
}

impl SessionStore {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        repository: Arc<dyn SessionRepository>,
    ) -> Self {
        Self {
            identity,
            repository,
            state: RwLock::new(SessionsState::default()),
            sync_token: Mutex::new(()),
        }
    }

    //-------------------------------------------------------------------------------------
    // Reads
    //-------------------------------------------------------------------------------------

    /// The collection sorted by timestamp descending. No side effects.
    pub async fn all_sessions(&self) -> Vec<Session> {
        self.state.read().await.sorted_sessions()
    }

    /// Looks a session up by id. `None` if absent; no side effects.
    pub async fn session_by_id(&self, id: &str) -> Option<Session> {
        let state = self.state.read().await;
        state.sessions.iter().find(|s| s.id == id).cloned()
    }

    pub async fn current_session_id(&self) -> Option<String> {
        self.state.read().await.current_session_id.clone()
    }

    pub async fn is_review_mode(&self) -> bool {
        self.state.read().await.review_mode
    }

    /// The analysis on display while review mode is active.
    pub async fn review_analysis(&self) -> Option<AnalysisRecord> {
        self.state.read().await.review_analysis.clone()
    }

    //-------------------------------------------------------------------------------------
    // Mutations
    //-------------------------------------------------------------------------------------

    /// Adds a session, or merges the draft into the existing session with the
    /// same id so the collection never holds duplicates. The new or merged
    /// session becomes current and review mode ends. Returns the session id.
    pub async fn add_session(&self, mut draft: SessionDraft) -> String {
        let now = Utc::now();
        let id = draft.id.take().unwrap_or_else(|| generate_session_id(now));

        let persisted = {
            let mut state = self.state.write().await;
            let merged = match state.sessions.iter_mut().find(|s| s.id == id) {
                Some(existing) => {
                    existing.apply_draft(draft);
                    existing.clone()
                }
                None => {
                    let session = Session::from_draft(id.clone(), draft, now);
                    state.sessions.insert(0, session.clone());
                    session
                }
            };
            state.current_session_id = Some(id.clone());
            state.review_mode = false;
            state.review_analysis = None;
            merged
        };

        self.spawn_upsert(persisted).await;
        id
    }

    /// Applies a partial update to the matching session. `None` arguments
    /// leave the corresponding field unchanged; fields the extra patch itself
    /// carries win over the positional arguments. A no-op when the id is
    /// unknown or the folded patch is empty.
    pub async fn update_session_progress(
        &self,
        id: &str,
        completed_steps: Option<u32>,
        time_spent: Option<f64>,
        extra: SessionPatch,
    ) {
        let mut patch = extra;
        patch.completed_steps = patch.completed_steps.or(completed_steps);
        patch.time_spent = patch.time_spent.or(time_spent);
        if patch.is_empty() {
            return;
        }

        {
            let mut state = self.state.write().await;
            let Some(session) = state.sessions.iter_mut().find(|s| s.id == id) else {
                debug!("Ignoring progress update for unknown session {id}");
                return;
            };
            session.apply_patch(&patch);
            // Mirror the clamped step count so the remote document matches.
            if patch.completed_steps.is_some() {
                patch.completed_steps = Some(session.completed_steps);
            }
        }

        self.spawn_update(id.to_string(), patch).await;
    }

    /// Resolves a raw analysis response into the normalized record and
    /// attaches it to the session, lifting the confusion type and mastery
    /// score into the session's first-class fields.
    pub async fn ingest_analysis(&self, id: &str, response: AnalysisResponse) {
        let record = AnalysisRecord::resolve(response);
        let patch = SessionPatch {
            confusion_type: record.confusion_type.clone(),
            mastery_score: record.mastery_score,
            analysis: Some(record),
            ..SessionPatch::default()
        };
        self.update_session_progress(id, None, None, patch).await;
    }

    /// Marks every repair step done: `completed_steps = total_steps = len`.
    /// A no-op for sessions without a repair path.
    pub async fn complete_repair_path(&self, id: &str) {
        let steps = {
            let state = self.state.read().await;
            state
                .sessions
                .iter()
                .find(|s| s.id == id)
                .and_then(|s| s.analysis.as_ref())
                .map(|analysis| analysis.repair_path.len() as u32)
        };
        let Some(steps) = steps else { return };
        if steps == 0 {
            return;
        }
        let patch = SessionPatch {
            completed_steps: Some(steps),
            total_steps: Some(steps),
            ..SessionPatch::default()
        };
        self.update_session_progress(id, None, None, patch).await;
    }

    /// Removes a session. Deleting the current session clears the current
    /// pointer and exits review mode; other deletions leave both untouched.
    /// The remote delete is best-effort.
    pub async fn delete_session(&self, id: &str) {
        {
            let mut state = self.state.write().await;
            state.sessions.retain(|s| s.id != id);
            if state.current_session_id.as_deref() == Some(id) {
                state.current_session_id = None;
                state.review_mode = false;
                state.review_analysis = None;
            }
        }

        let Some(user) = self.identity.current_user().await else {
            return;
        };
        let repository = Arc::clone(&self.repository);
        let session_id = id.to_string();
        tokio::spawn(async move {
            if let Err(error) = repository.delete_session(&user.uid, &session_id).await {
                error!("Failed to delete session {session_id} from the remote store: {error}");
            }
        });
    }

    /// Drops all local session state. Runs on sign-out so one account's
    /// history can never leak into another's view.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        *state = SessionsState::default();
    }

    //-------------------------------------------------------------------------------------
    // Review mode
    //-------------------------------------------------------------------------------------

    /// Marks the session current, enters review mode, and returns the active
    /// review analysis. A session persisted before it ever received a full
    /// analysis gets a minimal record rebuilt from its first-class fields.
    pub async fn load_session_for_review(&self, id: &str) -> Option<AnalysisRecord> {
        let mut state = self.state.write().await;
        let analysis = {
            let session = state.sessions.iter().find(|s| s.id == id)?;
            session
                .analysis
                .clone()
                .unwrap_or_else(|| AnalysisRecord::from_session_fields(session))
        };
        state.current_session_id = Some(id.to_string());
        state.review_mode = true;
        state.review_analysis = Some(analysis.clone());
        Some(analysis)
    }

    /// Leaves review mode and clears the current-session pointer. The
    /// collection itself is untouched.
    pub async fn exit_review_mode(&self) {
        let mut state = self.state.write().await;
        state.review_mode = false;
        state.review_analysis = None;
        state.current_session_id = None;
    }

    //-------------------------------------------------------------------------------------
    // Remote sync
    //-------------------------------------------------------------------------------------

    /// Fetches the signed-in user's remote sessions and merges them into the
    /// local collection by id, remote values winning on conflict. The current
    /// session is re-resolved afterwards: the previously current session is
    /// kept when it survived the merge, otherwise the most recent session
    /// becomes current and review mode ends.
    ///
    /// A sync arriving while another is in flight is dropped and returns the
    /// current local collection. With no signed-in user this is a no-op
    /// returning an empty list, as is a failed fetch (logged; local state is
    /// left untouched either way).
    pub async fn sync_from_remote(&self) -> Vec<Session> {
        let Ok(_guard) = self.sync_token.try_lock() else {
            debug!("Session sync already in flight; dropping this call");
            return self.all_sessions().await;
        };

        let Some(user) = self.identity.current_user().await else {
            return Vec::new();
        };
        let remote = match self.repository.fetch_sessions(&user.uid).await {
            Ok(remote) => remote,
            Err(error) => {
                error!("Failed to sync sessions from the remote store: {error}");
                return Vec::new();
            }
        };

        let mut state = self.state.write().await;
        let mut merged = state.sessions.clone();
        for session in remote {
            match merged.iter_mut().find(|s| s.id == session.id) {
                Some(existing) => *existing = session,
                None => merged.push(session),
            }
        }
        merged.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let previous_current = state.current_session_id.clone();
        let has_previous = previous_current
            .as_ref()
            .map(|id| merged.iter().any(|s| s.id == *id))
            .unwrap_or(false);
        state.current_session_id = if has_previous {
            previous_current
        } else {
            merged.first().map(|s| s.id.clone())
        };
        if !has_previous {
            state.review_mode = false;
            state.review_analysis = None;
        }
        state.sessions = merged.clone();
        merged
    }

    //-------------------------------------------------------------------------------------
    // Fire-and-forget persistence
    //-------------------------------------------------------------------------------------

    async fn spawn_upsert(&self, session: Session) {
        let Some(user) = self.identity.current_user().await else {
            debug!("No signed-in user; session {} stays local only", session.id);
            return;
        };
        let repository = Arc::clone(&self.repository);
        tokio::spawn(async move {
            if let Err(error) = repository.upsert_session(&user.uid, &session).await {
                error!(
                    "Failed to save session {} to the remote store: {error}",
                    session.id
                );
            }
        });
    }

    async fn spawn_update(&self, session_id: String, patch: SessionPatch) {
        let Some(user) = self.identity.current_user().await else {
            debug!("No signed-in user; update to session {session_id} stays local only");
            return;
        };
        let repository = Arc::clone(&self.repository);
        tokio::spawn(async move {
            if let Err(error) = repository
                .update_session(&user.uid, &session_id, &patch)
                .await
            {
                error!("Failed to update session {session_id} in the remote store: {error}");
            }
        });
    }
}
