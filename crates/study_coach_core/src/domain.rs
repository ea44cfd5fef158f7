//! crates/study_coach_core/src/domain.rs
//!
//! Defines the core data structures for the application: study sessions,
//! goals, and the normalized analysis record. These structs double as the
//! document shapes written to the remote per-user store, so they carry serde
//! derives with camelCase wire names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

//=========================================================================================
// Identity
//=========================================================================================

/// The signed-in user, as reported by the external auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub uid: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

//=========================================================================================
// Sessions
//=========================================================================================

/// A single question-and-answer exchange recorded during a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResponse {
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub level: u32,
}

/// Per-level scoring detail inside an analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LevelScore {
    pub level: u32,
    pub accuracy: f64,
    pub confidence: f64,
    pub keyword_matches: Vec<String>,
    pub missing_keywords: Vec<String>,
    pub reasoning: String,
}

/// The raw analysis API response. Every field is optional on the wire;
/// [`AnalysisRecord::resolve`] turns this into the normalized form exactly
/// once at ingestion.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisResponse {
    pub mind_map: Option<Value>,
    pub repair_path: Option<Vec<Value>>,
    pub diagnostic_summary: Option<String>,
    pub confusion_type: Option<String>,
    pub mastery_score: Option<f64>,
    pub overall_accuracy: Option<f64>,
    pub overall_confidence: Option<f64>,
    pub level_scores: Option<Vec<LevelScore>>,
    pub specific_gaps: Option<Vec<String>>,
    pub secondary_types: Option<Vec<String>>,
    pub concept_name: Option<String>,
}

/// The normalized diagnostic payload attached to a session. All optional
/// fields are defaulted here so consumers never re-check the response shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisRecord {
    pub diagnostic_summary: String,
    pub confusion_type: Option<String>,
    pub mastery_score: Option<f64>,
    pub overall_accuracy: f64,
    pub overall_confidence: f64,
    pub level_scores: Vec<LevelScore>,
    pub specific_gaps: Vec<String>,
    pub secondary_types: Vec<String>,
    pub mind_map: Option<Value>,
    pub repair_path: Vec<Value>,
    pub concept_name: Option<String>,
}

impl AnalysisRecord {
    /// Resolves a raw API response into the normalized record.
    ///
    /// The mastery score falls back to `round(overall_accuracy * 100)` when
    /// the response carries none (a zero score also falls through, matching
    /// how the analysis endpoint reports "no signal").
    pub fn resolve(response: AnalysisResponse) -> Self {
        fn nonzero(score: f64) -> Option<f64> {
            (score != 0.0).then_some(score)
        }

        let overall_accuracy = response.overall_accuracy.unwrap_or(0.0);
        let mastery_score = response
            .mastery_score
            .and_then(nonzero)
            .or_else(|| nonzero((overall_accuracy * 100.0).round()));

        Self {
            diagnostic_summary: response.diagnostic_summary.unwrap_or_default(),
            confusion_type: response.confusion_type,
            mastery_score,
            overall_accuracy,
            overall_confidence: response.overall_confidence.unwrap_or(0.0),
            level_scores: response.level_scores.unwrap_or_default(),
            specific_gaps: response.specific_gaps.unwrap_or_default(),
            secondary_types: response.secondary_types.unwrap_or_default(),
            mind_map: response.mind_map,
            repair_path: response.repair_path.unwrap_or_default(),
            concept_name: response.concept_name,
        }
    }

    /// Rebuilds a minimal record from a session's first-class fields, for
    /// sessions persisted before they ever received a full analysis.
    pub fn from_session_fields(session: &Session) -> Self {
        let scale = session.mastery_score.map(|s| s / 100.0).unwrap_or(0.0);
        Self {
            confusion_type: session.confusion_type.clone(),
            mastery_score: session.mastery_score,
            overall_accuracy: scale,
            overall_confidence: scale,
            ..Self::default()
        }
    }
}

/// One recorded study interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub pdf_name: String,
    /// Truncated preview of the selection, kept alongside the full text.
    #[serde(default)]
    pub selected_text: String,
    #[serde(default)]
    pub full_selected_text: String,
    #[serde(default)]
    pub confusion_type: Option<String>,
    #[serde(default)]
    pub mastery_score: Option<f64>,
    /// Minutes spent on the session.
    #[serde(default)]
    pub time_spent: f64,
    #[serde(default)]
    pub total_steps: u32,
    #[serde(default)]
    pub completed_steps: u32,
    #[serde(default)]
    pub analysis: Option<AnalysisRecord>,
    #[serde(default)]
    pub question_responses: Vec<QuestionResponse>,
}

impl Session {
    /// Builds a new session from a draft, applying the documented defaults.
    pub fn from_draft(id: String, draft: SessionDraft, now: DateTime<Utc>) -> Self {
        let full_selected_text = draft.full_selected_text.unwrap_or_default();
        let selected_text = if full_selected_text.is_empty() {
            draft.selected_text.unwrap_or_default()
        } else {
            preview_text(&full_selected_text)
        };

        Self {
            id,
            timestamp: draft.timestamp.unwrap_or(now),
            pdf_name: draft.pdf_name.unwrap_or_default(),
            selected_text,
            full_selected_text,
            confusion_type: draft.confusion_type,
            mastery_score: draft.mastery_score,
            time_spent: draft.time_spent.unwrap_or(0.0),
            total_steps: draft.total_steps.unwrap_or(0),
            completed_steps: draft.completed_steps.unwrap_or(0),
            analysis: draft.analysis,
            question_responses: draft.question_responses,
        }
    }

    /// Merges a draft into an existing session: fields the draft provides
    /// overwrite, everything else is left unchanged.
    pub fn apply_draft(&mut self, draft: SessionDraft) {
        if let Some(timestamp) = draft.timestamp {
            self.timestamp = timestamp;
        }
        if let Some(pdf_name) = draft.pdf_name {
            self.pdf_name = pdf_name;
        }
        if let Some(full) = draft.full_selected_text {
            self.selected_text = preview_text(&full);
            self.full_selected_text = full;
        } else if let Some(selected) = draft.selected_text {
            self.selected_text = selected;
        }
        if let Some(confusion_type) = draft.confusion_type {
            self.confusion_type = Some(confusion_type);
        }
        if let Some(mastery_score) = draft.mastery_score {
            self.mastery_score = Some(mastery_score);
        }
        if let Some(time_spent) = draft.time_spent {
            self.time_spent = time_spent;
        }
        if let Some(total_steps) = draft.total_steps {
            self.total_steps = total_steps;
        }
        if let Some(completed_steps) = draft.completed_steps {
            self.completed_steps = completed_steps;
        }
        if let Some(analysis) = draft.analysis {
            self.analysis = Some(analysis);
        }
        if !draft.question_responses.is_empty() {
            self.question_responses = draft.question_responses;
        }
        self.clamp_steps();
    }

    /// Applies a partial update. `None` fields are left unchanged.
    pub fn apply_patch(&mut self, patch: &SessionPatch) {
        if let Some(total_steps) = patch.total_steps {
            self.total_steps = total_steps;
        }
        if let Some(completed_steps) = patch.completed_steps {
            self.completed_steps = completed_steps;
        }
        if let Some(time_spent) = patch.time_spent {
            self.time_spent = time_spent;
        }
        if let Some(ref confusion_type) = patch.confusion_type {
            self.confusion_type = Some(confusion_type.clone());
        }
        if let Some(mastery_score) = patch.mastery_score {
            self.mastery_score = Some(mastery_score);
        }
        if let Some(ref analysis) = patch.analysis {
            self.analysis = Some(analysis.clone());
        }
        self.clamp_steps();
    }

    /// A session is complete once every step of a non-empty repair path is done.
    pub fn is_complete(&self) -> bool {
        self.total_steps > 0 && self.completed_steps >= self.total_steps
    }

    // completed_steps <= total_steps whenever both are set
    fn clamp_steps(&mut self) {
        if self.total_steps > 0 && self.completed_steps > self.total_steps {
            self.completed_steps = self.total_steps;
        }
    }
}

/// Input to session creation. Absent fields take the documented defaults;
/// on a duplicate-id merge they leave the existing value in place.
#[derive(Debug, Clone, Default)]
pub struct SessionDraft {
    pub id: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub pdf_name: Option<String>,
    pub selected_text: Option<String>,
    pub full_selected_text: Option<String>,
    pub confusion_type: Option<String>,
    pub mastery_score: Option<f64>,
    pub time_spent: Option<f64>,
    pub total_steps: Option<u32>,
    pub completed_steps: Option<u32>,
    pub analysis: Option<AnalysisRecord>,
    pub question_responses: Vec<QuestionResponse>,
}

/// A partial session update. Only present fields are applied locally and
/// sent to the remote store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_steps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_steps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_spent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confusion_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mastery_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisRecord>,
}

impl SessionPatch {
    pub fn is_empty(&self) -> bool {
        self.completed_steps.is_none()
            && self.total_steps.is_none()
            && self.time_spent.is_none()
            && self.confusion_type.is_none()
            && self.mastery_score.is_none()
            && self.analysis.is_none()
    }
}

/// The compact per-session view sent to the insights endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightSnapshot {
    pub confusion_type: Option<String>,
    pub mastery_score: Option<f64>,
    pub concept_name: String,
}

//=========================================================================================
// Goals
//=========================================================================================

/// What a goal measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalType {
    /// Number of sessions completed in the period.
    Sessions,
    /// Minutes studied in the period.
    Time,
    /// Average mastery score in the period.
    Mastery,
    /// Consecutive study days.
    Streak,
}

/// How often a goal resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalPeriod {
    Daily,
    /// Resets every Monday.
    Weekly,
    /// Resets on the 1st of the month.
    Monthly,
}

/// A target the user wants to hit over a recurring period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub goal_type: GoalType,
    pub target: f64,
    pub period: GoalPeriod,
    pub start_date: DateTime<Utc>,
    pub is_active: bool,
    pub reminder_enabled: bool,
    /// "HH:MM"; reminders stay quiet before this time of day.
    pub reminder_time: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Goal {
    /// Builds a new goal from a draft, applying the documented defaults.
    pub fn from_draft(draft: GoalDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: generate_goal_id(now),
            name: draft.name.unwrap_or_else(|| "Study Goal".to_string()),
            goal_type: draft.goal_type.unwrap_or(GoalType::Sessions),
            target: draft.target.unwrap_or(5.0),
            period: draft.period.unwrap_or(GoalPeriod::Weekly),
            start_date: draft.start_date.unwrap_or(now),
            is_active: draft.is_active.unwrap_or(true),
            reminder_enabled: draft.reminder_enabled.unwrap_or(true),
            reminder_time: draft
                .reminder_time
                .unwrap_or_else(|| "09:00".to_string()),
            created_at: now,
            updated_at: None,
        }
    }

    /// Applies a partial update. `None` fields are left unchanged.
    pub fn apply_patch(&mut self, patch: &GoalPatch) {
        if let Some(ref name) = patch.name {
            self.name = name.clone();
        }
        if let Some(goal_type) = patch.goal_type {
            self.goal_type = goal_type;
        }
        if let Some(target) = patch.target {
            self.target = target;
        }
        if let Some(period) = patch.period {
            self.period = period;
        }
        if let Some(start_date) = patch.start_date {
            self.start_date = start_date;
        }
        if let Some(is_active) = patch.is_active {
            self.is_active = is_active;
        }
        if let Some(reminder_enabled) = patch.reminder_enabled {
            self.reminder_enabled = reminder_enabled;
        }
        if let Some(ref reminder_time) = patch.reminder_time {
            self.reminder_time = reminder_time.clone();
        }
        if let Some(updated_at) = patch.updated_at {
            self.updated_at = Some(updated_at);
        }
    }
}

/// Input to goal creation.
#[derive(Debug, Clone, Default)]
pub struct GoalDraft {
    pub name: Option<String>,
    pub goal_type: Option<GoalType>,
    pub target: Option<f64>,
    pub period: Option<GoalPeriod>,
    pub start_date: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
    pub reminder_enabled: Option<bool>,
    pub reminder_time: Option<String>,
}

/// A partial goal update. Only present fields are applied and sent remote.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub goal_type: Option<GoalType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<GoalPeriod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminder_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminder_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl GoalPatch {
    /// True when the patch changes nothing user-visible. The `updated_at`
    /// stamp alone does not count as a change.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.goal_type.is_none()
            && self.target.is_none()
            && self.period.is_none()
            && self.start_date.is_none()
            && self.is_active.is_none()
            && self.reminder_enabled.is_none()
            && self.reminder_time.is_none()
    }
}

//=========================================================================================
// Goal progress and reminders (derived, never persisted)
//=========================================================================================

/// Progress toward a goal, derived from the session collection.
#[derive(Debug, Clone, PartialEq)]
pub struct GoalProgress {
    pub current: f64,
    pub target: f64,
    /// `round(current / target * 100)`, capped at 100.
    pub percentage: u32,
    pub is_completed: bool,
}

/// How strongly a reminder should nudge the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderUrgency {
    Low,
    Medium,
    High,
}

/// An ephemeral reminder, keyed by goal id. Lives only in the in-memory
/// reminder list until dismissed or recomputed.
#[derive(Debug, Clone, PartialEq)]
pub struct Reminder {
    pub goal_id: String,
    pub goal_name: String,
    pub message: String,
    pub urgency: ReminderUrgency,
    pub progress: GoalProgress,
}

//=========================================================================================
// Id generation and text helpers
//=========================================================================================

/// Session ids: millisecond timestamp plus a random suffix.
pub fn generate_session_id(now: DateTime<Utc>) -> String {
    format!("{}-{}", now.timestamp_millis(), random_suffix(8))
}

/// Goal ids: `goal-` prefix, millisecond timestamp, random suffix.
pub fn generate_goal_id(now: DateTime<Utc>) -> String {
    format!("goal-{}-{}", now.timestamp_millis(), random_suffix(6))
}

fn random_suffix(len: usize) -> String {
    Uuid::new_v4().simple().to_string().chars().take(len).collect()
}

/// First 100 characters of the full selection, kept as a display preview.
pub fn preview_text(full: &str) -> String {
    full.chars().take(100).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        "2026-03-02T10:00:00Z".parse().expect("valid timestamp")
    }

    #[test]
    fn from_draft_applies_defaults() {
        let session = Session::from_draft("s1".into(), SessionDraft::default(), now());
        assert_eq!(session.id, "s1");
        assert_eq!(session.timestamp, now());
        assert_eq!(session.time_spent, 0.0);
        assert_eq!(session.total_steps, 0);
        assert_eq!(session.completed_steps, 0);
        assert_eq!(session.mastery_score, None);
        assert!(session.analysis.is_none());
        assert!(session.question_responses.is_empty());
    }

    #[test]
    fn from_draft_derives_preview_from_full_text() {
        let full: String = "x".repeat(250);
        let session = Session::from_draft(
            "s1".into(),
            SessionDraft {
                full_selected_text: Some(full.clone()),
                ..SessionDraft::default()
            },
            now(),
        );
        assert_eq!(session.selected_text.chars().count(), 100);
        assert_eq!(session.full_selected_text, full);
    }

    #[test]
    fn apply_draft_keeps_unspecified_fields() {
        let mut session = Session::from_draft(
            "s1".into(),
            SessionDraft {
                pdf_name: Some("biology.pdf".into()),
                mastery_score: Some(72.0),
                time_spent: Some(9.0),
                ..SessionDraft::default()
            },
            now(),
        );
        session.apply_draft(SessionDraft {
            time_spent: Some(14.0),
            ..SessionDraft::default()
        });
        assert_eq!(session.time_spent, 14.0);
        assert_eq!(session.pdf_name, "biology.pdf");
        assert_eq!(session.mastery_score, Some(72.0));
        assert_eq!(session.timestamp, now());
    }

    #[test]
    fn apply_patch_ignores_absent_fields() {
        let mut session = Session::from_draft(
            "s1".into(),
            SessionDraft {
                time_spent: Some(5.0),
                total_steps: Some(4),
                completed_steps: Some(1),
                ..SessionDraft::default()
            },
            now(),
        );
        session.apply_patch(&SessionPatch {
            completed_steps: Some(2),
            ..SessionPatch::default()
        });
        assert_eq!(session.completed_steps, 2);
        assert_eq!(session.total_steps, 4);
        assert_eq!(session.time_spent, 5.0);
    }

    #[test]
    fn apply_patch_clamps_completed_steps() {
        let mut session = Session::from_draft(
            "s1".into(),
            SessionDraft {
                total_steps: Some(3),
                ..SessionDraft::default()
            },
            now(),
        );
        session.apply_patch(&SessionPatch {
            completed_steps: Some(7),
            ..SessionPatch::default()
        });
        assert_eq!(session.completed_steps, 3);
        assert!(session.is_complete());
    }

    #[test]
    fn resolve_prefers_reported_mastery_score() {
        let record = AnalysisRecord::resolve(AnalysisResponse {
            mastery_score: Some(88.0),
            overall_accuracy: Some(0.5),
            ..AnalysisResponse::default()
        });
        assert_eq!(record.mastery_score, Some(88.0));
        assert_eq!(record.overall_accuracy, 0.5);
    }

    #[test]
    fn resolve_falls_back_to_scaled_accuracy() {
        let record = AnalysisRecord::resolve(AnalysisResponse {
            overall_accuracy: Some(0.824),
            ..AnalysisResponse::default()
        });
        assert_eq!(record.mastery_score, Some(82.0));
    }

    #[test]
    fn resolve_with_no_signal_yields_no_mastery() {
        let record = AnalysisRecord::resolve(AnalysisResponse::default());
        assert_eq!(record.mastery_score, None);
        assert_eq!(record.overall_accuracy, 0.0);
        assert!(record.repair_path.is_empty());
        assert!(record.diagnostic_summary.is_empty());
    }

    #[test]
    fn from_session_fields_scales_mastery() {
        let session = Session::from_draft(
            "s1".into(),
            SessionDraft {
                confusion_type: Some("conceptual".into()),
                mastery_score: Some(64.0),
                ..SessionDraft::default()
            },
            now(),
        );
        let record = AnalysisRecord::from_session_fields(&session);
        assert_eq!(record.confusion_type.as_deref(), Some("conceptual"));
        assert_eq!(record.mastery_score, Some(64.0));
        assert_eq!(record.overall_accuracy, 0.64);
        assert_eq!(record.overall_confidence, 0.64);
    }

    #[test]
    fn session_patch_serializes_only_present_fields() {
        let patch = SessionPatch {
            completed_steps: Some(2),
            ..SessionPatch::default()
        };
        let body = serde_json::to_value(&patch).expect("serializable patch");
        assert_eq!(body, json!({ "completedSteps": 2 }));
    }

    #[test]
    fn goal_wire_shape_uses_camel_case_and_type() {
        let goal = Goal::from_draft(GoalDraft::default(), now());
        let body = serde_json::to_value(&goal).expect("serializable goal");
        assert_eq!(body["type"], json!("sessions"));
        assert_eq!(body["period"], json!("weekly"));
        assert_eq!(body["reminderTime"], json!("09:00"));
        assert_eq!(body["isActive"], json!(true));
        assert_eq!(body["target"], json!(5.0));
        assert_eq!(body["name"], json!("Study Goal"));
    }

    #[test]
    fn goal_ids_carry_prefix_and_suffix() {
        let id = generate_goal_id(now());
        let mut parts = id.splitn(3, '-');
        assert_eq!(parts.next(), Some("goal"));
        assert_eq!(
            parts.next(),
            Some(now().timestamp_millis().to_string().as_str())
        );
        assert_eq!(parts.next().map(|s| s.len()), Some(6));
    }

    #[test]
    fn session_ids_are_unique() {
        let a = generate_session_id(now());
        let b = generate_session_id(now());
        assert_ne!(a, b);
        assert!(a.starts_with(&now().timestamp_millis().to_string()));
    }
}
