//! crates/study_coach_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the
//! core to be independent of specific external implementations like the remote
//! document store or the analysis API.

use async_trait::async_trait;

use crate::domain::{
    AnalysisResponse, Goal, GoalPatch, InsightSnapshot, QuestionResponse, Session, SessionPatch,
    UserIdentity,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., HTTP, auth).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Per-user session documents in the remote store. The adapter mirrors the
/// local collection; it never owns the data.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Creates the document or merges fields into an existing one.
    async fn upsert_session(&self, uid: &str, session: &Session) -> PortResult<()>;

    async fn fetch_sessions(&self, uid: &str) -> PortResult<Vec<Session>>;

    /// Partial update; only the patch's present fields are written.
    async fn update_session(
        &self,
        uid: &str,
        session_id: &str,
        patch: &SessionPatch,
    ) -> PortResult<()>;

    async fn delete_session(&self, uid: &str, session_id: &str) -> PortResult<()>;
}

/// Per-user goal documents in the remote store.
#[async_trait]
pub trait GoalRepository: Send + Sync {
    async fn upsert_goal(&self, uid: &str, goal: &Goal) -> PortResult<()>;

    async fn fetch_goals(&self, uid: &str) -> PortResult<Vec<Goal>>;

    async fn update_goal(&self, uid: &str, goal_id: &str, patch: &GoalPatch) -> PortResult<()>;

    async fn delete_goal(&self, uid: &str, goal_id: &str) -> PortResult<()>;
}

/// The remote diagnostic endpoint: turns a selection and its Q&A exchanges
/// into an analysis with a repair path.
#[async_trait]
pub trait AnalysisService: Send + Sync {
    async fn analyze(
        &self,
        selected_text: &str,
        qa_pairs: &[QuestionResponse],
    ) -> PortResult<AnalysisResponse>;
}

/// The remote insights endpoint: turns per-session snapshots into short
/// human-readable study suggestions.
#[async_trait]
pub trait InsightsService: Send + Sync {
    async fn generate_insights(&self, sessions: &[InsightSnapshot]) -> PortResult<Vec<String>>;
}

/// Read access to the signed-in user. Stores consult this before every
/// remote call; no user means the call is skipped.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_user(&self) -> Option<UserIdentity>;
}
