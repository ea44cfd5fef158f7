//! services/client/src/bin/demo.rs
//!
//! Composition root: builds the in-memory stack and drives a small study
//! scenario end to end — sign-in, a session with analysis, repair-path
//! progress, a goal with a reminder, and the derived analytics.

use std::sync::Arc;

use chrono::Utc;
use client_lib::adapters::{MemoryAnalysisService, MemoryDocumentStore, MemoryInsightsService};
use client_lib::{telemetry, AppState, ClientError, Config};
use serde_json::json;
use study_coach_core::domain::{
    AnalysisResponse, GoalDraft, GoalPeriod, GoalType, QuestionResponse, SessionDraft,
    UserIdentity,
};
use study_coach_core::insights::{history_stats, insight_snapshot, learning_trends, top_insights};
use study_coach_core::ports::{AnalysisService, InsightsService};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    telemetry::init(config.log_level);
    info!("Configuration loaded. Starting the study-coach demo...");

    // --- 2. Build the In-Memory Stack ---
    let document_store = Arc::new(MemoryDocumentStore::new());
    let analysis = Arc::new(MemoryAnalysisService::new(AnalysisResponse {
        diagnostic_summary: Some(
            "Confuses diffusion with active transport when membranes come up.".to_string(),
        ),
        confusion_type: Some("conceptual".to_string()),
        overall_accuracy: Some(0.55),
        overall_confidence: Some(0.6),
        specific_gaps: Some(vec!["energy requirements of transport".to_string()]),
        repair_path: Some(vec![
            json!({"step": 1, "title": "Revisit passive transport"}),
            json!({"step": 2, "title": "Contrast with active transport"}),
            json!({"step": 3, "title": "Re-answer the original questions"}),
        ]),
        ..AnalysisResponse::default()
    }));
    let insights = Arc::new(MemoryInsightsService::new(vec![
        "Conceptual gaps cluster around transport mechanisms.".to_string(),
        "Short daily sessions are keeping your streak alive.".to_string(),
    ]));
    let state = AppState::new(
        config,
        document_store.clone(),
        document_store,
        analysis,
        insights,
    );

    // --- 3. Sign In ---
    state
        .auth
        .sign_in(UserIdentity {
            uid: "demo-user".to_string(),
            display_name: Some("Demo User".to_string()),
            email: None,
        })
        .await;

    // --- 4. Record a Session and Ingest Its Analysis ---
    let session_id = state
        .sessions
        .add_session(SessionDraft {
            pdf_name: Some("cell-biology.pdf".to_string()),
            full_selected_text: Some(
                "Molecules cross the cell membrane either passively, down their \
                 concentration gradient, or actively, against it at the cost of ATP."
                    .to_string(),
            ),
            question_responses: vec![QuestionResponse {
                question: "What distinguishes active from passive transport?".to_string(),
                answer: "Active transport is faster.".to_string(),
                level: 1,
            }],
            ..SessionDraft::default()
        })
        .await;
    info!(%session_id, "Session recorded");

    let session = state
        .sessions
        .session_by_id(&session_id)
        .await
        .expect("session was just added");
    let response = state
        .analysis
        .analyze(&session.full_selected_text, &session.question_responses)
        .await?;
    state.sessions.ingest_analysis(&session_id, response).await;

    // --- 5. Walk the Repair Path ---
    state
        .sessions
        .update_session_progress(&session_id, Some(1), Some(6.0), Default::default())
        .await;
    state.sessions.complete_repair_path(&session_id).await;
    let session = state
        .sessions
        .session_by_id(&session_id)
        .await
        .expect("session still present");
    info!(
        completed = session.completed_steps,
        total = session.total_steps,
        "Repair path finished"
    );

    // --- 6. Set a Goal and Check Reminders ---
    state
        .goals
        .add_goal(GoalDraft {
            name: Some("Five sessions a week".to_string()),
            goal_type: Some(GoalType::Sessions),
            target: Some(5.0),
            period: Some(GoalPeriod::Weekly),
            reminder_time: Some("00:00".to_string()),
            ..GoalDraft::default()
        })
        .await;

    let now = Utc::now();
    let sessions = state.sessions.all_sessions().await;
    for reminder in state.goals.check_reminders(&sessions, now).await {
        info!(goal = %reminder.goal_name, "{}", reminder.message);
    }

    // --- 7. Derived Analytics ---
    let stats = history_stats(&sessions, now);
    info!(
        total_sessions = stats.total_sessions,
        average_mastery = stats.average_mastery,
        study_minutes = stats.total_study_time,
        streak_days = stats.current_streak,
        "History stats"
    );
    let trends = learning_trends(&sessions, now);
    info!(?trends.trend, recent = trends.recent_sessions, "Learning trend");

    let snapshots: Vec<_> = sessions.iter().map(insight_snapshot).collect();
    let lines = top_insights(state.insights.generate_insights(&snapshots).await?);
    for line in lines {
        info!("Insight: {line}");
    }

    // --- 8. Sign Out ---
    state.auth.sign_out().await;
    info!("Demo complete");
    Ok(())
}
