//! crates/study_coach_core/src/progress.rs
//!
//! Pure goal-progress math: period windows, progress measurement per goal
//! type, and the reminder predicate/message pair the goals store evaluates.

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};

use crate::domain::{Goal, GoalPeriod, GoalProgress, GoalType, ReminderUrgency, Session};
use crate::insights::current_streak;

//=========================================================================================
// Period windows
//=========================================================================================

/// Start of the goal's current period, at midnight UTC: today for daily
/// goals, Monday for weekly, the 1st for monthly.
pub fn period_start(period: GoalPeriod, now: DateTime<Utc>) -> DateTime<Utc> {
    let today = now.date_naive();
    let start_day = match period {
        GoalPeriod::Daily => today,
        GoalPeriod::Weekly => {
            today - Duration::days(i64::from(today.weekday().num_days_from_monday()))
        }
        GoalPeriod::Monthly => today.with_day(1).unwrap_or(today),
    };
    start_day.and_time(NaiveTime::MIN).and_utc()
}

//=========================================================================================
// Progress
//=========================================================================================

/// Measures a goal against the session collection.
///
/// Sessions count toward a period when their timestamp falls inside
/// `[period_start, now]`. Streak goals ignore the window: the streak is a
/// property of the whole history.
pub fn goal_progress(goal: &Goal, sessions: &[Session], now: DateTime<Utc>) -> GoalProgress {
    let window_start = period_start(goal.period, now);
    let in_window: Vec<&Session> = sessions
        .iter()
        .filter(|session| session.timestamp >= window_start && session.timestamp <= now)
        .collect();

    let current = match goal.goal_type {
        GoalType::Sessions => in_window.len() as f64,
        GoalType::Time => in_window
            .iter()
            .map(|session| {
                if session.time_spent.is_finite() {
                    session.time_spent
                } else {
                    0.0
                }
            })
            .sum(),
        GoalType::Mastery => {
            let scores: Vec<f64> = in_window
                .iter()
                .filter_map(|session| session.mastery_score.filter(|s| s.is_finite()))
                .collect();
            if scores.is_empty() {
                0.0
            } else {
                scores.iter().sum::<f64>() / scores.len() as f64
            }
        }
        GoalType::Streak => f64::from(current_streak(sessions, now)),
    };

    let percentage = if goal.target > 0.0 {
        (((current / goal.target) * 100.0).round() as u32).min(100)
    } else {
        0
    };

    GoalProgress {
        current,
        target: goal.target,
        percentage,
        is_completed: current >= goal.target,
    }
}

//=========================================================================================
// Reminders
//=========================================================================================

/// Whether a reminder for this goal belongs in the active list right now.
/// Inactive goals, goals with reminders switched off, completed goals, and
/// goals whose daily reminder time has not arrived yet all stay quiet.
pub fn should_show_reminder(goal: &Goal, progress: &GoalProgress, now: DateTime<Utc>) -> bool {
    if !goal.is_active || !goal.reminder_enabled || progress.is_completed {
        return false;
    }
    // An unparseable reminder time never silences the goal.
    if let Ok(reminder_at) = NaiveTime::parse_from_str(&goal.reminder_time, "%H:%M") {
        if now.time() < reminder_at {
            return false;
        }
    }
    true
}

/// The text and urgency for a goal's reminder.
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderContent {
    pub message: String,
    pub urgency: ReminderUrgency,
}

pub fn reminder_message(goal: &Goal, progress: &GoalProgress) -> ReminderContent {
    let unit = unit_label(goal.goal_type);
    if progress.is_completed {
        return ReminderContent {
            message: format!("\"{}\" is complete. Nice work!", goal.name),
            urgency: ReminderUrgency::Low,
        };
    }

    let remaining = (progress.target - progress.current).max(0.0);
    if progress.percentage >= 50 {
        ReminderContent {
            message: format!(
                "Almost there: {} more {} to finish \"{}\".",
                format_amount(remaining),
                unit,
                goal.name
            ),
            urgency: ReminderUrgency::Medium,
        }
    } else {
        ReminderContent {
            message: format!(
                "\"{}\" is at {} of {} {}. Time to study!",
                goal.name,
                format_amount(progress.current),
                format_amount(progress.target),
                unit
            ),
            urgency: ReminderUrgency::High,
        }
    }
}

fn unit_label(goal_type: GoalType) -> &'static str {
    match goal_type {
        GoalType::Sessions => "sessions",
        GoalType::Time => "minutes",
        GoalType::Mastery => "points",
        GoalType::Streak => "days",
    }
}

// Whole numbers print without the trailing ".0".
fn format_amount(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value:.1}")
    }
}
