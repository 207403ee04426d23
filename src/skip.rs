//! "Missed yesterday" prompt: when to show it and how it is resolved.

use crate::errors::StoreError;
use crate::models::Activity;
use crate::storage::TrackerStore;
use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    NoBreathworkActivity,
    UnknownUser,
    NewAccount,
    CompletedToday,
    ResolvedToday,
    StoreUnavailable,
}

impl SuppressReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoBreathworkActivity => "no_breathwork_activity",
            Self::UnknownUser => "unknown_user",
            Self::NewAccount => "new_account",
            Self::CompletedToday => "completed_today",
            Self::ResolvedToday => "resolved_today",
            Self::StoreUnavailable => "store_unavailable",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipDecision {
    ShouldShow,
    Suppressed(SuppressReason),
}

impl SkipDecision {
    pub fn should_show(self) -> bool {
        self == Self::ShouldShow
    }
}

/// First activity whose name mentions "breath" or "video".
pub fn find_breathwork_activity(activities: &[Activity]) -> Option<&Activity> {
    activities.iter().find(|activity| {
        let name = activity.name.to_lowercase();
        name.contains("breath") || name.contains("video")
    })
}

/// Whole days since the account was created; never negative.
pub fn account_age_days(created_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - created_at).num_days().max(0)
}

/// Decides whether the prompt is due. Store failures suppress it.
pub async fn evaluate(
    store: &dyn TrackerStore,
    user_id: &str,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> SkipDecision {
    let decision = match try_evaluate(store, user_id, today, now).await {
        Ok(decision) => decision,
        Err(err) => {
            warn!(user_id, "skip prompt suppressed: {err}");
            SkipDecision::Suppressed(SuppressReason::StoreUnavailable)
        }
    };
    debug!(user_id, %today, ?decision, "skip prompt evaluated");
    decision
}

async fn try_evaluate(
    store: &dyn TrackerStore,
    user_id: &str,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> Result<SkipDecision, StoreError> {
    let activities = store.list_activities(user_id).await?;
    let Some(breathwork) = find_breathwork_activity(&activities) else {
        return Ok(SkipDecision::Suppressed(SuppressReason::NoBreathworkActivity));
    };

    let todays_events = store.list_events_on(user_id, today).await?;
    let has_breathwork_today = todays_events
        .iter()
        .any(|event| event.activity_id == breathwork.id && event.date == today);

    let Some(profile) = store.get_profile(user_id).await? else {
        return Ok(SkipDecision::Suppressed(SuppressReason::UnknownUser));
    };

    if account_age_days(profile.created_at, now) == 0 {
        return Ok(SkipDecision::Suppressed(SuppressReason::NewAccount));
    }
    if has_breathwork_today {
        return Ok(SkipDecision::Suppressed(SuppressReason::CompletedToday));
    }
    Ok(SkipDecision::ShouldShow)
}

/// `evaluate`, except that a prompt already answered today stays answered.
pub async fn pending_decision(
    store: &dyn TrackerStore,
    user_id: &str,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> SkipDecision {
    let decision = evaluate(store, user_id, today, now).await;
    if !decision.should_show() {
        return decision;
    }
    match store.get_profile(user_id).await {
        Ok(Some(profile)) if profile.prompt_resolved_on == Some(today) => {
            SkipDecision::Suppressed(SuppressReason::ResolvedToday)
        }
        Ok(Some(_)) => decision,
        Ok(None) => SkipDecision::Suppressed(SuppressReason::UnknownUser),
        Err(err) => {
            warn!(user_id, "skip prompt suppressed: {err}");
            SkipDecision::Suppressed(SuppressReason::StoreUnavailable)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Moves the program start to today, so today becomes day 1.
    ResetToDayOne,
    /// Leaves the start date alone; the skipped day stays skipped.
    ContinueProgram,
}

impl RecoveryAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ResetToDayOne => "reset",
            Self::ContinueProgram => "continue",
        }
    }

    /// Applies the choice and marks today's prompt as answered.
    pub async fn apply(
        self,
        store: &dyn TrackerStore,
        user_id: &str,
        today: NaiveDate,
    ) -> Result<(), StoreError> {
        if self == Self::ResetToDayOne {
            store.set_program_start_date(user_id, today).await?;
        }
        store.mark_prompt_resolved(user_id, today).await?;
        info!(user_id, action = self.as_str(), "skip prompt resolved");
        Ok(())
    }
}

/// A pending prompt. Resolving it consumes it, so one prompt gets exactly one
/// action.
pub struct SkipPrompt<'a> {
    store: &'a dyn TrackerStore,
    user_id: String,
    today: NaiveDate,
}

impl SkipPrompt<'_> {
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub async fn resolve(self, action: RecoveryAction) -> Result<RecoveryAction, StoreError> {
        action.apply(self.store, &self.user_id, self.today).await?;
        Ok(action)
    }

    pub async fn reset(self) -> Result<RecoveryAction, StoreError> {
        self.resolve(RecoveryAction::ResetToDayOne).await
    }

    pub async fn continue_program(self) -> Result<RecoveryAction, StoreError> {
        self.resolve(RecoveryAction::ContinueProgram).await
    }
}

pub async fn check_skip_prompt<'a>(
    store: &'a dyn TrackerStore,
    user_id: &str,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> Option<SkipPrompt<'a>> {
    pending_decision(store, user_id, today, now)
        .await
        .should_show()
        .then(|| SkipPrompt {
            store,
            user_id: user_id.to_string(),
            today,
        })
}
