//! services/client/src/stores/goals.rs
//!
//! The goals store: owns the in-memory goal collection, the active reminder
//! list, and the loading/error flags the caller can gate an indicator on.
//! Mutations follow the same optimistic local-first pattern as the session
//! store; `fetch_goals` is the awaitable path that pulls the remote
//! collection in.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use study_coach_core::domain::{Goal, GoalDraft, GoalPatch, Reminder, Session};
use study_coach_core::ports::{GoalRepository, IdentityProvider};
use study_coach_core::progress::{goal_progress, reminder_message, should_show_reminder};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error};

//=========================================================================================
// Store state
//=========================================================================================

#[derive(Default)]
struct GoalsState {
    goals: Vec<Goal>,
    reminders: Vec<Reminder>,
    loaded: bool,
    is_loading: bool,
    last_error: Option<String>,
}

//=========================================================================================
// GoalsStore
//=========================================================================================

/// Owns the goal collection. Built once at startup with the identity and
/// repository ports injected, then shared behind an `Arc`.
pub struct GoalsStore {
    identity: Arc<dyn IdentityProvider>,
    repository: Arc<dyn GoalRepository>,
    state: RwLock<GoalsState>,
    /// In-flight token for `fetch_goals`: a fetch arriving while another is
    /// running is dropped instead of interleaving with it.
    fetch_token: Mutex<()>,
}

impl GoalsStore {
    pub fn new(identity: Arc<dyn IdentityProvider>, repository: Arc<dyn GoalRepository>) -> Self {
        Self {
            identity,
            repository,
            state: RwLock::new(GoalsState::default()),
            fetch_token: Mutex::new(()),
        }
    }

    //-------------------------------------------------------------------------------------
    // Reads
    //-------------------------------------------------------------------------------------

    /// The goal collection, newest first. No side effects.
    pub async fn goals(&self) -> Vec<Goal> {
        self.state.read().await.goals.clone()
    }

    pub async fn goal_by_id(&self, id: &str) -> Option<Goal> {
        let state = self.state.read().await;
        state.goals.iter().find(|g| g.id == id).cloned()
    }

    /// The reminder list from the last `check_reminders` call.
    pub async fn reminders(&self) -> Vec<Reminder> {
        self.state.read().await.reminders.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.is_loading
    }

    /// The message of the last failed fetch, cleared when a fetch starts.
    pub async fn last_error(&self) -> Option<String> {
        self.state.read().await.last_error.clone()
    }

    //-------------------------------------------------------------------------------------
    // Mutations
    //-------------------------------------------------------------------------------------

    /// Creates a goal from the draft, prepends it locally, and persists it on
    /// a spawned task. Returns the new goal's id.
    pub async fn add_goal(&self, draft: GoalDraft) -> String {
        let goal = Goal::from_draft(draft, Utc::now());
        let id = goal.id.clone();
        {
            let mut state = self.state.write().await;
            state.goals.insert(0, goal.clone());
        }
        self.spawn_upsert(goal).await;
        id
    }

    /// Applies a partial update to the matching goal, stamping `updated_at`,
    /// and sends only the changed fields remote. A no-op when the id is
    /// unknown or the patch changes nothing.
    pub async fn update_goal(&self, id: &str, mut patch: GoalPatch) {
        if patch.is_empty() {
            return;
        }
        patch.updated_at = Some(Utc::now());

        {
            let mut state = self.state.write().await;
            let Some(goal) = state.goals.iter_mut().find(|g| g.id == id) else {
                debug!("Ignoring update for unknown goal {id}");
                return;
            };
            goal.apply_patch(&patch);
        }

        self.spawn_update(id.to_string(), patch).await;
    }

    /// Flips `is_active` through the normal update path.
    pub async fn toggle_goal_active(&self, id: &str) {
        let Some(goal) = self.goal_by_id(id).await else {
            return;
        };
        self.update_goal(
            id,
            GoalPatch {
                is_active: Some(!goal.is_active),
                ..GoalPatch::default()
            },
        )
        .await;
    }

    /// Removes a goal and any reminder it produced. The remote delete is
    /// best-effort.
    pub async fn remove_goal(&self, id: &str) {
        {
            let mut state = self.state.write().await;
            state.goals.retain(|g| g.id != id);
            state.reminders.retain(|r| r.goal_id != id);
        }

        let Some(user) = self.identity.current_user().await else {
            return;
        };
        let repository = Arc::clone(&self.repository);
        let goal_id = id.to_string();
        tokio::spawn(async move {
            if let Err(error) = repository.delete_goal(&user.uid, &goal_id).await {
                error!("Failed to delete goal {goal_id} from the remote store: {error}");
            }
        });
    }

    /// Drops all local goal state. Runs on sign-out so one account's goals
    /// can never leak into another's view.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        *state = GoalsState::default();
    }

    //-------------------------------------------------------------------------------------
    // Remote fetch
    //-------------------------------------------------------------------------------------

    /// Pulls the signed-in user's goals from the remote store, replacing the
    /// local collection. Once a load has succeeded, later calls return the
    /// cached collection unless `force` is set. With no signed-in user the
    /// collection is cleared and an empty list returned. A fetch failure
    /// records `last_error` and leaves the collection as-is.
    ///
    /// A fetch arriving while another is in flight is dropped and returns
    /// the current local collection.
    pub async fn fetch_goals(&self, force: bool) -> Vec<Goal> {
        let Ok(_guard) = self.fetch_token.try_lock() else {
            debug!("Goal fetch already in flight; dropping this call");
            return self.goals().await;
        };

        let Some(user) = self.identity.current_user().await else {
            let mut state = self.state.write().await;
            *state = GoalsState::default();
            return Vec::new();
        };

        {
            let mut state = self.state.write().await;
            if state.loaded && !force {
                return state.goals.clone();
            }
            state.is_loading = true;
            state.last_error = None;
        }

        match self.repository.fetch_goals(&user.uid).await {
            Ok(mut remote) => {
                remote.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                let mut state = self.state.write().await;
                state.goals = remote;
                state.loaded = true;
                state.is_loading = false;
                state.goals.clone()
            }
            Err(error) => {
                error!("Failed to fetch goals from the remote store: {error}");
                let mut state = self.state.write().await;
                state.is_loading = false;
                state.last_error = Some(error.to_string());
                state.goals.clone()
            }
        }
    }

    //-------------------------------------------------------------------------------------
    // Reminders
    //-------------------------------------------------------------------------------------

    /// Evaluates every active, reminder-enabled goal against the session
    /// collection and replaces the entire reminder list with the result.
    /// Completed goals and goals whose reminder time has not arrived stay
    /// out; a previously dismissed reminder comes back while its predicate
    /// still holds.
    pub async fn check_reminders(&self, sessions: &[Session], now: DateTime<Utc>) -> Vec<Reminder> {
        let mut state = self.state.write().await;
        let reminders: Vec<Reminder> = state
            .goals
            .iter()
            .filter(|goal| goal.is_active && goal.reminder_enabled)
            .filter_map(|goal| {
                let progress = goal_progress(goal, sessions, now);
                if !should_show_reminder(goal, &progress, now) {
                    return None;
                }
                let content = reminder_message(goal, &progress);
                Some(Reminder {
                    goal_id: goal.id.clone(),
                    goal_name: goal.name.clone(),
                    message: content.message,
                    urgency: content.urgency,
                    progress,
                })
            })
            .collect();
        state.reminders = reminders.clone();
        reminders
    }

    /// Removes a single reminder from the current list.
    pub async fn dismiss_reminder(&self, goal_id: &str) {
        let mut state = self.state.write().await;
        state.reminders.retain(|r| r.goal_id != goal_id);
    }

    //-------------------------------------------------------------------------------------
    // Fire-and-forget persistence
    //-------------------------------------------------------------------------------------

    async fn spawn_upsert(&self, goal: Goal) {
        let Some(user) = self.identity.current_user().await else {
            debug!("No signed-in user; goal {} stays local only", goal.id);
            return;
        };
        let repository = Arc::clone(&self.repository);
        tokio::spawn(async move {
            if let Err(error) = repository.upsert_goal(&user.uid, &goal).await {
                error!("Failed to save goal {} to the remote store: {error}", goal.id);
            }
        });
    }

    async fn spawn_update(&self, goal_id: String, patch: GoalPatch) {
        let Some(user) = self.identity.current_user().await else {
            debug!("No signed-in user; update to goal {goal_id} stays local only");
            return;
        };
        let repository = Arc::clone(&self.repository);
        tokio::spawn(async move {
            if let Err(error) = repository.update_goal(&user.uid, &goal_id, &patch).await {
                error!("Failed to update goal {goal_id} in the remote store: {error}");
            }
        });
    }
}
