pub mod domain;
pub mod insights;
pub mod ports;
pub mod progress;

pub use domain::{
    AnalysisRecord, AnalysisResponse, Goal, GoalDraft, GoalPatch, GoalPeriod, GoalProgress,
    GoalType, InsightSnapshot, LevelScore, QuestionResponse, Reminder, ReminderUrgency, Session,
    SessionDraft, SessionPatch, UserIdentity,
};
pub use ports::{
    AnalysisService, GoalRepository, IdentityProvider, InsightsService, PortError, PortResult,
    SessionRepository,
};
