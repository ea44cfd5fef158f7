//! services/client/src/adapters/store.rs
//!
//! HTTP implementation of the session and goal repositories. Documents live
//! in per-user subcollections on the remote store; every route is scoped by
//! the owning user's uid.

use async_trait::async_trait;
use study_coach_core::domain::{Goal, GoalPatch, Session, SessionPatch};
use study_coach_core::ports::{
    GoalRepository, PortError, PortResult, SessionRepository,
};

use super::http::{ensure_success, normalize_base_url};

//================================================================
// HttpDocumentStore
//================================================================

/// Remote document store speaking plain JSON over HTTP. One instance serves
/// both repository ports; the store is cloned into whichever component needs
/// it.
#[derive(Clone)]
pub struct HttpDocumentStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDocumentStore {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self {
            client,
            base_url: normalize_base_url(base_url),
        }
    }

    fn sessions_url(&self, uid: &str) -> String {
        format!("{}/users/{}/sessions", self.base_url, uid)
    }

    fn session_url(&self, uid: &str, session_id: &str) -> String {
        format!("{}/users/{}/sessions/{}", self.base_url, uid, session_id)
    }

    fn goals_url(&self, uid: &str) -> String {
        format!("{}/users/{}/goals", self.base_url, uid)
    }

    fn goal_url(&self, uid: &str, goal_id: &str) -> String {
        format!("{}/users/{}/goals/{}", self.base_url, uid, goal_id)
    }
}

//================================================================
// SessionRepository
//================================================================

#[async_trait]
impl SessionRepository for HttpDocumentStore {
    async fn upsert_session(&self, uid: &str, session: &Session) -> PortResult<()> {
        let response = self
            .client
            .put(self.session_url(uid, &session.id))
            .json(session)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        ensure_success(response, &format!("session {}", session.id))?;
        Ok(())
    }

    async fn fetch_sessions(&self, uid: &str) -> PortResult<Vec<Session>> {
        let response = self
            .client
            .get(self.sessions_url(uid))
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let response = ensure_success(response, "sessions")?;
        response
            .json::<Vec<Session>>()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))
    }

    async fn update_session(
        &self,
        uid: &str,
        session_id: &str,
        patch: &SessionPatch,
    ) -> PortResult<()> {
        let response = self
            .client
            .patch(self.session_url(uid, session_id))
            .json(patch)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        ensure_success(response, &format!("session {session_id}"))?;
        Ok(())
    }

    async fn delete_session(&self, uid: &str, session_id: &str) -> PortResult<()> {
        let response = self
            .client
            .delete(self.session_url(uid, session_id))
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        ensure_success(response, &format!("session {session_id}"))?;
        Ok(())
    }
}

//================================================================
// GoalRepository
//================================================================

#[async_trait]
impl GoalRepository for HttpDocumentStore {
    async fn upsert_goal(&self, uid: &str, goal: &Goal) -> PortResult<()> {
        let response = self
            .client
            .put(self.goal_url(uid, &goal.id))
            .json(goal)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        ensure_success(response, &format!("goal {}", goal.id))?;
        Ok(())
    }

    async fn fetch_goals(&self, uid: &str) -> PortResult<Vec<Goal>> {
        let response = self
            .client
            .get(self.goals_url(uid))
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let response = ensure_success(response, "goals")?;
        response
            .json::<Vec<Goal>>()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))
    }

    async fn update_goal(&self, uid: &str, goal_id: &str, patch: &GoalPatch) -> PortResult<()> {
        let response = self
            .client
            .patch(self.goal_url(uid, goal_id))
            .json(patch)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        ensure_success(response, &format!("goal {goal_id}"))?;
        Ok(())
    }

    async fn delete_goal(&self, uid: &str, goal_id: &str) -> PortResult<()> {
        let response = self
            .client
            .delete(self.goal_url(uid, goal_id))
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        ensure_success(response, &format!("goal {goal_id}"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> HttpDocumentStore {
        HttpDocumentStore::new(reqwest::Client::new(), "http://store.local/".to_string())
    }

    #[test]
    fn routes_are_scoped_by_user() {
        let store = store();
        assert_eq!(
            store.sessions_url("u1"),
            "http://store.local/users/u1/sessions"
        );
        assert_eq!(
            store.session_url("u1", "s-9"),
            "http://store.local/users/u1/sessions/s-9"
        );
        assert_eq!(store.goals_url("u1"), "http://store.local/users/u1/goals");
        assert_eq!(
            store.goal_url("u1", "goal-3"),
            "http://store.local/users/u1/goals/goal-3"
        );
    }
}
