//! crates/study_coach_core/src/insights.rs
//!
//! Pure calculators over the session collection: confusion-type frequency,
//! mastery averages, weak/strong areas, study-time totals, the 7-day learning
//! trend, and the consecutive-day streak. Nothing here touches a store; every
//! time-dependent function takes an explicit `now` so results are reproducible.

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::domain::{InsightSnapshot, Session};

/// Label applied to sessions whose confusion type is missing or blank.
pub const UNKNOWN_CONFUSION_TYPE: &str = "Unknown";

/// Weak/strong area lists and the insights feed are capped at this many entries.
pub const MAX_AREAS: usize = 5;
pub const MAX_INSIGHTS: usize = 5;

/// Mastery below this counts as a weak area.
pub const WEAK_MASTERY_CEILING: f64 = 70.0;
/// Mastery at or above this counts as a strong area.
pub const STRONG_MASTERY_FLOOR: f64 = 85.0;

/// Recent-vs-previous mastery must differ by more than this to call a trend.
const TREND_THRESHOLD: f64 = 3.0;
const TREND_WINDOW_DAYS: i64 = 7;

//=========================================================================================
// Normalization helpers
//=========================================================================================

/// Missing or blank labels collapse to [`UNKNOWN_CONFUSION_TYPE`]; everything
/// else is trimmed.
pub fn normalize_confusion_type(raw: Option<&str>) -> String {
    match raw {
        Some(label) if !label.trim().is_empty() => label.trim().to_string(),
        _ => UNKNOWN_CONFUSION_TYPE.to_string(),
    }
}

/// Display name for a session: the analysis concept name when present, else a
/// leading slice of the selection, else the source document, else a stand-in.
pub fn concept_name(session: &Session) -> String {
    if let Some(name) = session
        .analysis
        .as_ref()
        .and_then(|analysis| analysis.concept_name.as_deref())
    {
        if !name.trim().is_empty() {
            return name.to_string();
        }
    }
    let from_full = leading_chars(&session.full_selected_text, 80);
    if !from_full.is_empty() {
        return from_full;
    }
    let from_preview = leading_chars(&session.selected_text, 80);
    if !from_preview.is_empty() {
        return from_preview;
    }
    if !session.pdf_name.is_empty() {
        return session.pdf_name.clone();
    }
    "Unnamed Concept".to_string()
}

/// The compact view of a session sent to the insights endpoint.
pub fn insight_snapshot(session: &Session) -> InsightSnapshot {
    InsightSnapshot {
        confusion_type: session.confusion_type.clone(),
        mastery_score: session.mastery_score,
        concept_name: concept_name(session),
    }
}

/// Drops blank entries and caps the feed at [`MAX_INSIGHTS`].
pub fn top_insights(insights: Vec<String>) -> Vec<String> {
    insights
        .into_iter()
        .filter(|line| !line.trim().is_empty())
        .take(MAX_INSIGHTS)
        .collect()
}

fn leading_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect::<String>().trim().to_string()
}

//=========================================================================================
// Confusion-type frequency
//=========================================================================================

/// The most common confusion type with its share of all sessions.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfusionSummary {
    /// The mode, or `None` when there are no sessions. Ties keep the type
    /// seen first in the input.
    pub confusion_type: Option<String>,
    pub count: usize,
    /// `round(count / total * 100)`.
    pub percentage: u32,
    pub frequency_map: HashMap<String, usize>,
}

pub fn common_confusion_types(sessions: &[Session]) -> ConfusionSummary {
    if sessions.is_empty() {
        return ConfusionSummary {
            confusion_type: None,
            count: 0,
            percentage: 0,
            frequency_map: HashMap::new(),
        };
    }

    let mut frequency_map: HashMap<String, usize> = HashMap::new();
    let mut first_seen: Vec<String> = Vec::new();
    for session in sessions {
        let label = normalize_confusion_type(session.confusion_type.as_deref());
        if !frequency_map.contains_key(&label) {
            first_seen.push(label.clone());
        }
        *frequency_map.entry(label).or_insert(0) += 1;
    }

    let mut top_label: Option<String> = None;
    let mut top_count = 0usize;
    for label in &first_seen {
        let count = frequency_map[label];
        if count > top_count {
            top_count = count;
            top_label = Some(label.clone());
        }
    }

    let percentage = ((top_count as f64 / sessions.len() as f64) * 100.0).round() as u32;
    ConfusionSummary {
        confusion_type: top_label,
        count: top_count,
        percentage,
        frequency_map,
    }
}

//=========================================================================================
// Mastery aggregates
//=========================================================================================

/// Average mastery per normalized confusion type, rounded to one decimal.
/// Types with no finitely-scored sessions are absent from the map.
pub fn average_mastery_by_type(sessions: &[Session]) -> HashMap<String, f64> {
    let mut scores_by_type: HashMap<String, Vec<f64>> = HashMap::new();
    for session in sessions {
        let Some(score) = session.mastery_score.filter(|s| s.is_finite()) else {
            continue;
        };
        let label = normalize_confusion_type(session.confusion_type.as_deref());
        scores_by_type.entry(label).or_default().push(score);
    }

    scores_by_type
        .into_iter()
        .map(|(label, scores)| {
            let avg = scores.iter().sum::<f64>() / scores.len() as f64;
            (label, round_one_decimal(avg))
        })
        .collect()
}

/// A weak or strong area: one scored session reduced to its display facts.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaSummary {
    pub concept: String,
    pub mastery: u32,
    pub confusion_type: String,
}

/// Sessions scored below [`WEAK_MASTERY_CEILING`], at most [`MAX_AREAS`],
/// preserving input (reverse-chronological) order.
pub fn weak_areas(sessions: &[Session]) -> Vec<AreaSummary> {
    areas_matching(sessions, |score| score < WEAK_MASTERY_CEILING)
}

/// Sessions scored at or above [`STRONG_MASTERY_FLOOR`], same shape as
/// [`weak_areas`].
pub fn strong_areas(sessions: &[Session]) -> Vec<AreaSummary> {
    areas_matching(sessions, |score| score >= STRONG_MASTERY_FLOOR)
}

fn areas_matching(sessions: &[Session], keep: impl Fn(f64) -> bool) -> Vec<AreaSummary> {
    sessions
        .iter()
        .filter_map(|session| {
            let score = session.mastery_score.filter(|s| s.is_finite())?;
            keep(score).then(|| AreaSummary {
                concept: concept_name(session),
                mastery: score.round() as u32,
                confusion_type: normalize_confusion_type(session.confusion_type.as_deref()),
            })
        })
        .take(MAX_AREAS)
        .collect()
}

/// Total minutes across all sessions; non-finite values count as zero.
pub fn total_study_time(sessions: &[Session]) -> f64 {
    sessions
        .iter()
        .map(|session| {
            if session.time_spent.is_finite() {
                session.time_spent
            } else {
                0.0
            }
        })
        .sum()
}

//=========================================================================================
// Learning trend
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
    Steady,
}

/// Recent (trailing 7 days) vs previous session buckets and the resulting
/// trend call.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendReport {
    pub recent_sessions: usize,
    pub previous_sessions: usize,
    pub recent_average_mastery: Option<f64>,
    pub previous_average_mastery: Option<f64>,
    pub trend: Trend,
    pub recent_total_time: f64,
    pub previous_total_time: f64,
}

pub fn learning_trends(sessions: &[Session], now: DateTime<Utc>) -> TrendReport {
    let (recent, previous): (Vec<&Session>, Vec<&Session>) = sessions
        .iter()
        .partition(|session| within_last_days(session.timestamp, TREND_WINDOW_DAYS, now));

    let recent_average_mastery = average_mastery(&recent);
    let previous_average_mastery = average_mastery(&previous);

    // Either bucket empty means there is nothing to compare: steady.
    let trend = match (recent_average_mastery, previous_average_mastery) {
        (Some(recent_avg), Some(previous_avg)) if recent_avg - previous_avg > TREND_THRESHOLD => {
            Trend::Up
        }
        (Some(recent_avg), Some(previous_avg)) if previous_avg - recent_avg > TREND_THRESHOLD => {
            Trend::Down
        }
        _ => Trend::Steady,
    };

    TrendReport {
        recent_sessions: recent.len(),
        previous_sessions: previous.len(),
        recent_average_mastery,
        previous_average_mastery,
        trend,
        recent_total_time: recent.iter().map(|s| s.time_spent).sum(),
        previous_total_time: previous.iter().map(|s| s.time_spent).sum(),
    }
}

fn within_last_days(timestamp: DateTime<Utc>, days: i64, now: DateTime<Utc>) -> bool {
    let elapsed = now.signed_duration_since(timestamp);
    elapsed >= Duration::zero() && elapsed <= Duration::days(days)
}

fn average_mastery(sessions: &[&Session]) -> Option<f64> {
    let scores: Vec<f64> = sessions
        .iter()
        .filter_map(|session| session.mastery_score.filter(|s| s.is_finite()))
        .collect();
    if scores.is_empty() {
        return None;
    }
    Some(scores.iter().sum::<f64>() / scores.len() as f64)
}

//=========================================================================================
// Streak
//=========================================================================================

/// Consecutive study days ending today or yesterday. Session dates are
/// deduplicated to day granularity; any gap larger than one day breaks the
/// streak, and a most-recent day older than yesterday yields zero.
pub fn current_streak(sessions: &[Session], now: DateTime<Utc>) -> u32 {
    let mut days: Vec<NaiveDate> = sessions
        .iter()
        .map(|session| session.timestamp.date_naive())
        .collect();
    days.sort_unstable();
    days.dedup();
    days.reverse();

    let Some(&most_recent) = days.first() else {
        return 0;
    };
    let gap_to_today = now.date_naive().signed_duration_since(most_recent).num_days();
    if !(0..=1).contains(&gap_to_today) {
        return 0;
    }

    let mut streak = 1;
    for pair in days.windows(2) {
        if pair[0].signed_duration_since(pair[1]).num_days() == 1 {
            streak += 1;
        } else {
            break;
        }
    }
    streak
}

//=========================================================================================
// Aggregate history stats
//=========================================================================================

/// The bundle the analytics view renders: headline numbers plus the
/// confusion-type breakdown (unknowns excluded).
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryStats {
    pub total_sessions: usize,
    /// Rounded average over scored sessions; zero when none are scored.
    pub average_mastery: u32,
    pub total_study_time: f64,
    pub current_streak: u32,
    pub confusion_breakdown: HashMap<String, usize>,
}

pub fn history_stats(sessions: &[Session], now: DateTime<Utc>) -> HistoryStats {
    let scores: Vec<f64> = sessions
        .iter()
        .filter_map(|session| session.mastery_score.filter(|s| s.is_finite()))
        .collect();
    let average_mastery = if scores.is_empty() {
        0
    } else {
        (scores.iter().sum::<f64>() / scores.len() as f64).round() as u32
    };

    let mut confusion_breakdown: HashMap<String, usize> = HashMap::new();
    for session in sessions {
        let label = normalize_confusion_type(session.confusion_type.as_deref());
        if label != UNKNOWN_CONFUSION_TYPE {
            *confusion_breakdown.entry(label).or_insert(0) += 1;
        }
    }

    HistoryStats {
        total_sessions: sessions.len(),
        average_mastery,
        total_study_time: total_study_time(sessions),
        current_streak: current_streak(sessions, now),
        confusion_breakdown,
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AnalysisRecord, SessionDraft};

    fn make_session(
        timestamp: &str,
        confusion: Option<&str>,
        mastery: Option<f64>,
        time_spent: f64,
    ) -> Session {
        let parsed: DateTime<Utc> = timestamp.parse().expect("valid timestamp");
        Session::from_draft(
            format!("s-{timestamp}-{confusion:?}-{mastery:?}"),
            SessionDraft {
                timestamp: Some(parsed),
                confusion_type: confusion.map(str::to_string),
                mastery_score: mastery,
                time_spent: Some(time_spent),
                ..SessionDraft::default()
            },
            parsed,
        )
    }

    fn fixed_now() -> DateTime<Utc> {
        "2026-03-10T12:00:00Z".parse().expect("valid timestamp")
    }

    #[test]
    fn normalize_collapses_blank_labels() {
        assert_eq!(normalize_confusion_type(None), "Unknown");
        assert_eq!(normalize_confusion_type(Some("   ")), "Unknown");
        assert_eq!(normalize_confusion_type(Some("  causal ")), "causal");
    }

    #[test]
    fn empty_collection_yields_empty_summary() {
        let summary = common_confusion_types(&[]);
        assert_eq!(summary.confusion_type, None);
        assert_eq!(summary.count, 0);
        assert_eq!(summary.percentage, 0);
        assert!(summary.frequency_map.is_empty());
    }

    #[test]
    fn mode_ties_keep_first_seen_type() {
        let sessions = vec![
            make_session("2026-03-09T10:00:00Z", Some("causal"), None, 0.0),
            make_session("2026-03-09T11:00:00Z", Some("structural"), None, 0.0),
            make_session("2026-03-09T12:00:00Z", Some("structural"), None, 0.0),
            make_session("2026-03-09T13:00:00Z", Some("causal"), None, 0.0),
        ];
        let summary = common_confusion_types(&sessions);
        assert_eq!(summary.confusion_type.as_deref(), Some("causal"));
        assert_eq!(summary.count, 2);
        assert_eq!(summary.percentage, 50);
        assert_eq!(summary.frequency_map.len(), 2);
    }

    #[test]
    fn missing_types_count_as_unknown() {
        let sessions = vec![
            make_session("2026-03-09T10:00:00Z", None, None, 0.0),
            make_session("2026-03-09T11:00:00Z", Some(""), None, 0.0),
            make_session("2026-03-09T12:00:00Z", Some("causal"), None, 0.0),
        ];
        let summary = common_confusion_types(&sessions);
        assert_eq!(summary.confusion_type.as_deref(), Some("Unknown"));
        assert_eq!(summary.count, 2);
        assert_eq!(summary.percentage, 67);
    }

    #[test]
    fn mastery_average_rounds_to_one_decimal() {
        let sessions = vec![
            make_session("2026-03-09T10:00:00Z", Some("A"), Some(90.0), 0.0),
            make_session("2026-03-09T11:00:00Z", Some("A"), Some(60.0), 0.0),
            make_session("2026-03-09T12:00:00Z", Some("A"), Some(40.0), 0.0),
        ];
        let averages = average_mastery_by_type(&sessions);
        assert_eq!(averages.get("A"), Some(&63.3));
    }

    #[test]
    fn unscored_sessions_are_excluded_from_averages() {
        let sessions = vec![
            make_session("2026-03-09T10:00:00Z", Some("A"), Some(80.0), 0.0),
            make_session("2026-03-09T11:00:00Z", Some("A"), None, 0.0),
            make_session("2026-03-09T12:00:00Z", Some("B"), Some(f64::NAN), 0.0),
        ];
        let averages = average_mastery_by_type(&sessions);
        assert_eq!(averages.get("A"), Some(&80.0));
        assert!(!averages.contains_key("B"));
    }

    #[test]
    fn weak_areas_filter_cap_and_order() {
        let mut sessions: Vec<Session> = (0..8)
            .map(|i| {
                make_session(
                    "2026-03-09T10:00:00Z",
                    Some("causal"),
                    Some(40.0 + i as f64),
                    0.0,
                )
            })
            .collect();
        sessions.push(make_session(
            "2026-03-09T11:00:00Z",
            Some("causal"),
            Some(92.0),
            0.0,
        ));

        let weak = weak_areas(&sessions);
        assert_eq!(weak.len(), MAX_AREAS);
        assert_eq!(weak[0].mastery, 40);
        assert_eq!(weak[4].mastery, 44);

        let strong = strong_areas(&sessions);
        assert_eq!(strong.len(), 1);
        assert_eq!(strong[0].mastery, 92);
        assert_eq!(strong[0].confusion_type, "causal");
    }

    #[test]
    fn strong_floor_is_inclusive_and_weak_ceiling_exclusive() {
        let sessions = vec![
            make_session("2026-03-09T10:00:00Z", None, Some(85.0), 0.0),
            make_session("2026-03-09T11:00:00Z", None, Some(70.0), 0.0),
            make_session("2026-03-09T12:00:00Z", None, Some(69.9), 0.0),
        ];
        assert_eq!(strong_areas(&sessions).len(), 1);
        assert_eq!(weak_areas(&sessions).len(), 1);
    }

    #[test]
    fn study_time_treats_non_finite_as_zero() {
        let sessions = vec![
            make_session("2026-03-09T10:00:00Z", None, None, 12.5),
            make_session("2026-03-09T11:00:00Z", None, None, f64::NAN),
            make_session("2026-03-09T12:00:00Z", None, None, 7.5),
        ];
        assert_eq!(total_study_time(&sessions), 20.0);
    }

    #[test]
    fn empty_recent_bucket_never_calls_a_trend() {
        let sessions = vec![
            make_session("2026-02-01T10:00:00Z", None, Some(95.0), 0.0),
            make_session("2026-02-02T10:00:00Z", None, Some(90.0), 0.0),
        ];
        let report = learning_trends(&sessions, fixed_now());
        assert_eq!(report.recent_sessions, 0);
        assert_eq!(report.previous_sessions, 2);
        assert_eq!(report.recent_average_mastery, None);
        assert_eq!(report.trend, Trend::Steady);
    }

    #[test]
    fn trend_requires_more_than_three_points() {
        let borderline = vec![
            make_session("2026-03-09T10:00:00Z", None, Some(73.0), 0.0),
            make_session("2026-02-20T10:00:00Z", None, Some(70.0), 0.0),
        ];
        assert_eq!(learning_trends(&borderline, fixed_now()).trend, Trend::Steady);

        let improving = vec![
            make_session("2026-03-09T10:00:00Z", None, Some(80.0), 10.0),
            make_session("2026-02-20T10:00:00Z", None, Some(70.0), 20.0),
        ];
        let report = learning_trends(&improving, fixed_now());
        assert_eq!(report.trend, Trend::Up);
        assert_eq!(report.recent_total_time, 10.0);
        assert_eq!(report.previous_total_time, 20.0);

        let slipping = vec![
            make_session("2026-03-09T10:00:00Z", None, Some(60.0), 0.0),
            make_session("2026-02-20T10:00:00Z", None, Some(70.0), 0.0),
        ];
        assert_eq!(learning_trends(&slipping, fixed_now()).trend, Trend::Down);
    }

    #[test]
    fn streak_counts_until_the_first_gap() {
        let sessions = vec![
            make_session("2026-03-10T08:00:00Z", None, None, 0.0),
            make_session("2026-03-09T20:00:00Z", None, None, 0.0),
            make_session("2026-03-07T09:00:00Z", None, None, 0.0),
        ];
        assert_eq!(current_streak(&sessions, fixed_now()), 2);
    }

    #[test]
    fn streak_is_zero_without_a_recent_session() {
        let sessions = vec![make_session("2026-03-06T10:00:00Z", None, None, 0.0)];
        assert_eq!(current_streak(&sessions, fixed_now()), 0);
        assert_eq!(current_streak(&[], fixed_now()), 0);
    }

    #[test]
    fn streak_dedupes_same_day_sessions() {
        let sessions = vec![
            make_session("2026-03-10T08:00:00Z", None, None, 0.0),
            make_session("2026-03-10T09:00:00Z", None, None, 0.0),
            make_session("2026-03-09T10:00:00Z", None, None, 0.0),
        ];
        assert_eq!(current_streak(&sessions, fixed_now()), 2);
    }

    #[test]
    fn concept_name_falls_back_through_text_then_pdf() {
        let mut session = make_session("2026-03-09T10:00:00Z", None, None, 0.0);
        assert_eq!(concept_name(&session), "Unnamed Concept");

        session.pdf_name = "chapters.pdf".into();
        assert_eq!(concept_name(&session), "chapters.pdf");

        session.selected_text = "mitochondrial membranes".into();
        assert_eq!(concept_name(&session), "mitochondrial membranes");

        session.full_selected_text = "m".repeat(200);
        assert_eq!(concept_name(&session).chars().count(), 80);

        session.analysis = Some(AnalysisRecord {
            concept_name: Some("Cellular respiration".into()),
            ..AnalysisRecord::default()
        });
        assert_eq!(concept_name(&session), "Cellular respiration");
    }

    #[test]
    fn history_stats_exclude_unknown_from_breakdown() {
        let sessions = vec![
            make_session("2026-03-10T08:00:00Z", Some("causal"), Some(80.0), 10.0),
            make_session("2026-03-09T08:00:00Z", None, Some(61.0), 5.0),
            make_session("2026-03-09T09:00:00Z", Some("causal"), None, 5.0),
        ];
        let stats = history_stats(&sessions, fixed_now());
        assert_eq!(stats.total_sessions, 3);
        assert_eq!(stats.average_mastery, 71); // round(70.5)
        assert_eq!(stats.total_study_time, 20.0);
        assert_eq!(stats.current_streak, 2);
        assert_eq!(stats.confusion_breakdown.get("causal"), Some(&2));
        assert!(!stats.confusion_breakdown.contains_key("Unknown"));
    }

    #[test]
    fn insights_feed_drops_blanks_and_caps_at_five() {
        let raw = vec![
            "a".to_string(),
            "  ".to_string(),
            "b".to_string(),
            "c".to_string(),
            "d".to_string(),
            "e".to_string(),
            "f".to_string(),
        ];
        let feed = top_insights(raw);
        assert_eq!(feed, vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn snapshot_carries_concept_and_score() {
        let mut session = make_session("2026-03-09T10:00:00Z", Some("causal"), Some(55.0), 0.0);
        session.full_selected_text = "osmosis in plant cells".into();
        let snapshot = insight_snapshot(&session);
        assert_eq!(snapshot.concept_name, "osmosis in plant cells");
        assert_eq!(snapshot.confusion_type.as_deref(), Some("causal"));
        assert_eq!(snapshot.mastery_score, Some(55.0));
    }
}
