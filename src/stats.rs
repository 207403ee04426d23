use crate::errors::StoreError;
use crate::models::{CompletionEvent, Milestone, MilestoneStatus, StreakResult};
use crate::storage::TrackerStore;
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Consecutive days with at least one successful completion, counted back from
/// `today`. An unlogged `today` does not break a streak ending yesterday.
pub fn compute_streak(events: &[CompletionEvent], today: NaiveDate) -> u32 {
    let dates: BTreeSet<NaiveDate> = events
        .iter()
        .filter(|event| event.success)
        .map(|event| event.date)
        .collect();

    let mut streak = 0;
    let mut cursor = today;
    for date in dates.into_iter().rev() {
        let gap = (cursor - date).num_days();
        if gap == 0 || gap == 1 {
            streak += 1;
            cursor = date;
        } else {
            break;
        }
    }
    streak
}

pub fn compute_stats(events: &[CompletionEvent], today: NaiveDate) -> StreakResult {
    let unique_days: BTreeSet<NaiveDate> = events.iter().map(|event| event.date).collect();
    StreakResult {
        current_streak: compute_streak(events, today),
        total_completions: events.len() as u32,
        unique_active_days: unique_days.len() as u32,
    }
}

pub async fn streak_stats_for(
    store: &dyn TrackerStore,
    user_id: &str,
    today: NaiveDate,
) -> Result<StreakResult, StoreError> {
    let events = store.list_events(user_id).await?;
    Ok(compute_stats(&events, today))
}

/// Progress towards the fixed milestone set every user carries.
pub fn build_milestones(
    stats: &StreakResult,
    account_start: NaiveDate,
    today: NaiveDate,
) -> Vec<Milestone> {
    let span = (today - account_start).num_days().max(0) as u32 + 1;
    let active_percent = (stats.unique_active_days.saturating_mul(100) / span).min(100);

    [
        ("7_day_streak", 7, stats.current_streak),
        ("30_day_streak", 30, stats.current_streak),
        ("100_workouts", 100, stats.total_completions),
        ("90_percent_success", 90, active_percent),
        ("6_month_consistency", 180, stats.unique_active_days),
    ]
    .into_iter()
    .map(|(kind, target, progress)| Milestone {
        kind: kind.to_string(),
        target,
        progress,
        status: if progress >= target {
            MilestoneStatus::Completed
        } else {
            MilestoneStatus::InProgress
        },
    })
    .collect()
}
