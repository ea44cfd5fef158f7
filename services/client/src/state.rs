//! services/client/src/state.rs
//!
//! Wires the application together: config, the port adapters, the two
//! stores, and the auth gate. Built once in the composition root and shared
//! behind `Arc`s.

use std::sync::Arc;

use study_coach_core::ports::{
    AnalysisService, GoalRepository, InsightsService, SessionRepository,
};

use crate::adapters::{build_http_client, HttpAnalysisService, HttpDocumentStore, HttpInsightsService};
use crate::config::Config;
use crate::error::ClientError;
use crate::stores::{AuthGate, GoalsStore, Identity, SessionStore};

/// The shared application state, created once at startup.
pub struct AppState {
    pub config: Arc<Config>,
    pub identity: Arc<Identity>,
    pub sessions: Arc<SessionStore>,
    pub goals: Arc<GoalsStore>,
    pub auth: Arc<AuthGate>,
    pub analysis: Arc<dyn AnalysisService>,
    pub insights: Arc<dyn InsightsService>,
}

impl AppState {
    /// Wires stores and the auth gate around the injected port
    /// implementations. Tests and the demo binary pass in-memory fakes;
    /// `over_http` passes the real adapters.
    pub fn new(
        config: Arc<Config>,
        session_repository: Arc<dyn SessionRepository>,
        goal_repository: Arc<dyn GoalRepository>,
        analysis: Arc<dyn AnalysisService>,
        insights: Arc<dyn InsightsService>,
    ) -> Self {
        let identity = Arc::new(Identity::new());
        let sessions = Arc::new(SessionStore::new(identity.clone(), session_repository));
        let goals = Arc::new(GoalsStore::new(identity.clone(), goal_repository));
        let auth = Arc::new(AuthGate::new(
            identity.clone(),
            sessions.clone(),
            goals.clone(),
        ));
        Self {
            config,
            identity,
            sessions,
            goals,
            auth,
            analysis,
            insights,
        }
    }

    /// Builds the state over the real HTTP adapters, sharing one client with
    /// the configured request timeout.
    pub fn over_http(config: Arc<Config>) -> Result<Self, ClientError> {
        let client = build_http_client(config.request_timeout_secs)?;
        let store = Arc::new(HttpDocumentStore::new(
            client.clone(),
            config.store_url.clone(),
        ));
        let analysis = Arc::new(HttpAnalysisService::new(
            client.clone(),
            config.api_url.clone(),
        ));
        let insights = Arc::new(HttpInsightsService::new(client, config.api_url.clone()));
        Ok(Self::new(
            config,
            store.clone(),
            store,
            analysis,
            insights,
        ))
    }
}
