use crate::calendar::{absolute_day_number, parse_date, program_day_view};
use crate::errors::AppError;
use crate::models::{
    Activity, ActivityUpdate, CompletionEvent, CompletionRequest, DateQuery, NewActivity, NewUser,
    PartnerRequest, ProfileUpdate, ProgramDayView, RecoveryResponse, RemovedResponse,
    SkipPromptResponse, StatsResponse, TodayResponse, UserProfile,
};
use crate::skip::{
    check_skip_prompt, find_breathwork_activity, pending_decision, RecoveryAction, SkipDecision,
};
use crate::state::AppState;
use crate::stats::{build_milestones, streak_stats_for};
use crate::storage::generate_id;
use crate::ui::{render_index, render_user_page, UserPage};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, Redirect},
    Json,
};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use tracing::info;

/// The calendar day and instant a request is evaluated at. `?today=` moves
/// both by the same number of days.
struct RequestClock {
    today: NaiveDate,
    now: DateTime<Utc>,
}

fn request_clock(state: &AppState, query: &DateQuery) -> Result<RequestClock, AppError> {
    let now = state.config.now();
    let real_today = state.config.date_of(now);
    let today = match &query.today {
        Some(value) => parse_date(value)?,
        None => real_today,
    };
    Ok(RequestClock {
        today,
        now: now + Duration::days((today - real_today).num_days()),
    })
}

/// The user page, keeping a `?today=` override.
fn user_page_location(user_id: &str, query: &DateQuery) -> Result<String, AppError> {
    Ok(match query.today.as_deref().map(parse_date).transpose()? {
        Some(today) => format!("/users/{user_id}?today={today}"),
        None => format!("/users/{user_id}"),
    })
}

fn check_clock_time(field: &str, value: &str) -> Result<(), AppError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map(|_| ())
        .map_err(|_| AppError::bad_request(format!("{field} must be HH:MM, got '{value}'")))
}

fn check_name(name: Option<&str>) -> Result<(), AppError> {
    match name {
        Some(name) if name.trim().is_empty() => {
            Err(AppError::bad_request("name must not be empty"))
        }
        _ => Ok(()),
    }
}

async fn load_profile(state: &AppState, user_id: &str) -> Result<UserProfile, AppError> {
    state
        .store
        .get_profile(user_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("user {user_id} not found")))
}

pub async fn index() -> Html<String> {
    Html(render_index())
}

pub async fn user_page(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<DateQuery>,
) -> Result<Html<String>, AppError> {
    let clock = request_clock(&state, &query)?;
    let profile = load_profile(&state, &user_id).await?;
    state.store.touch_last_login(&user_id, clock.today).await?;

    let elapsed_days = absolute_day_number(profile.program_start_date, clock.today)?;
    let stats = streak_stats_for(state.store.as_ref(), &user_id, clock.today).await?;
    let activities = state.store.list_activities(&user_id).await?;
    let decision = pending_decision(state.store.as_ref(), &user_id, clock.today, clock.now).await;

    let page = UserPage {
        profile: &profile,
        today: clock.today,
        elapsed_days,
        program_day: program_day_view(elapsed_days),
        stats,
        breathwork: find_breathwork_activity(&activities),
        show_skip_prompt: decision.should_show(),
        today_override: query.today.as_ref().map(|_| clock.today),
    };
    Ok(Html(render_user_page(&page)))
}

pub async fn reset_form(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<DateQuery>,
) -> Result<Redirect, AppError> {
    resolve_prompt(&state, &user_id, &query, RecoveryAction::ResetToDayOne).await?;
    Ok(Redirect::to(&user_page_location(&user_id, &query)?))
}

pub async fn continue_form(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<DateQuery>,
) -> Result<Redirect, AppError> {
    resolve_prompt(&state, &user_id, &query, RecoveryAction::ContinueProgram).await?;
    Ok(Redirect::to(&user_page_location(&user_id, &query)?))
}

pub async fn create_user(
    State(state): State<AppState>,
    Query(query): Query<DateQuery>,
    Json(payload): Json<NewUser>,
) -> Result<Json<UserProfile>, AppError> {
    if payload.name.trim().is_empty() || payload.email.trim().is_empty() {
        return Err(AppError::bad_request("name and email are required"));
    }
    check_clock_time("work_time", &payload.schedule.work_time)?;
    check_clock_time("alert_time", &payload.schedule.alert_time)?;
    let clock = request_clock(&state, &query)?;
    let profile = state.store.create_user(payload, clock.today, clock.now).await?;
    Ok(Json(profile))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserProfile>, AppError> {
    Ok(Json(load_profile(&state, &user_id).await?))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(payload): Json<ProfileUpdate>,
) -> Result<Json<UserProfile>, AppError> {
    check_name(payload.name.as_deref())?;
    if let Some(work_time) = &payload.work_time {
        check_clock_time("work_time", work_time)?;
    }
    if let Some(alert_time) = &payload.alert_time {
        check_clock_time("alert_time", alert_time)?;
    }
    Ok(Json(state.store.update_profile(&user_id, payload).await?))
}

pub async fn link_partner(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(payload): Json<PartnerRequest>,
) -> Result<Json<UserProfile>, AppError> {
    let email = payload.email.trim();
    if email.is_empty() {
        return Err(AppError::bad_request("partner email is required"));
    }
    Ok(Json(state.store.link_partner(&user_id, email).await?))
}

pub async fn list_activities(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Activity>>, AppError> {
    Ok(Json(state.store.list_activities(&user_id).await?))
}

pub async fn add_activities(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(payload): Json<Vec<NewActivity>>,
) -> Result<Json<Vec<Activity>>, AppError> {
    if payload.iter().any(|activity| activity.name.trim().is_empty()) {
        return Err(AppError::bad_request("activity name must not be empty"));
    }
    Ok(Json(state.store.add_activities(&user_id, payload).await?))
}

pub async fn update_activity(
    State(state): State<AppState>,
    Path((user_id, activity_id)): Path<(String, String)>,
    Json(payload): Json<ActivityUpdate>,
) -> Result<Json<Activity>, AppError> {
    check_name(payload.name.as_deref())?;
    let activity = state
        .store
        .update_activity(&user_id, &activity_id, payload)
        .await?;
    Ok(Json(activity))
}

pub async fn delete_activity(
    State(state): State<AppState>,
    Path((user_id, activity_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    state.store.delete_activity(&user_id, &activity_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn log_completion(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<DateQuery>,
    Json(payload): Json<CompletionRequest>,
) -> Result<Json<CompletionEvent>, AppError> {
    let clock = request_clock(&state, &query)?;
    let activities = state.store.list_activities(&user_id).await?;
    if !activities.iter().any(|activity| activity.id == payload.activity_id) {
        return Err(AppError::not_found(format!(
            "activity {} not found for user {user_id}",
            payload.activity_id
        )));
    }

    let event = CompletionEvent {
        id: generate_id("log"),
        date: clock.today,
        user_id,
        activity_id: payload.activity_id,
        success: true,
        timestamp: clock.now,
        notes: payload.notes,
    };
    state.store.append_event(event.clone()).await?;
    info!(user_id = %event.user_id, activity_id = %event.activity_id, "completion logged");
    Ok(Json(event))
}

pub async fn remove_completion(
    State(state): State<AppState>,
    Path((user_id, activity_id)): Path<(String, String)>,
    Query(query): Query<DateQuery>,
) -> Result<Json<RemovedResponse>, AppError> {
    let clock = request_clock(&state, &query)?;
    let removed = state
        .store
        .remove_events(&user_id, &activity_id, clock.today)
        .await?;
    Ok(Json(RemovedResponse { removed }))
}

pub async fn get_today(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<DateQuery>,
) -> Result<Json<TodayResponse>, AppError> {
    let clock = request_clock(&state, &query)?;
    let profile = load_profile(&state, &user_id).await?;
    let elapsed_days = absolute_day_number(profile.program_start_date, clock.today)?;

    Ok(Json(TodayResponse {
        date: clock.today,
        program_start_date: profile.program_start_date,
        elapsed_days,
        program_day: program_day_view(elapsed_days),
    }))
}

pub async fn get_stats(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<DateQuery>,
) -> Result<Json<StatsResponse>, AppError> {
    let clock = request_clock(&state, &query)?;
    let profile = load_profile(&state, &user_id).await?;
    let streak = streak_stats_for(state.store.as_ref(), &user_id, clock.today).await?;
    let account_start = state.config.date_of(profile.created_at);

    Ok(Json(StatsResponse {
        milestones: build_milestones(&streak, account_start, clock.today),
        streak,
    }))
}

pub async fn get_skip_prompt(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<DateQuery>,
) -> Result<Json<SkipPromptResponse>, AppError> {
    let clock = request_clock(&state, &query)?;
    let decision = pending_decision(state.store.as_ref(), &user_id, clock.today, clock.now).await;
    let response = match decision {
        SkipDecision::ShouldShow => SkipPromptResponse {
            show: true,
            reason: None,
        },
        SkipDecision::Suppressed(reason) => SkipPromptResponse {
            show: false,
            reason: Some(reason.as_str().to_string()),
        },
    };
    Ok(Json(response))
}

pub async fn reset(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<DateQuery>,
) -> Result<Json<RecoveryResponse>, AppError> {
    let response = resolve_prompt(&state, &user_id, &query, RecoveryAction::ResetToDayOne).await?;
    Ok(Json(response))
}

pub async fn continue_program(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<DateQuery>,
) -> Result<Json<RecoveryResponse>, AppError> {
    let response =
        resolve_prompt(&state, &user_id, &query, RecoveryAction::ContinueProgram).await?;
    Ok(Json(response))
}

pub async fn get_program_day(Path(day): Path<u32>) -> Result<Json<ProgramDayView>, AppError> {
    if day == 0 {
        return Err(AppError::bad_request("program days start at 1"));
    }
    Ok(Json(program_day_view(day)))
}

/// Resolves a pending prompt; without one there is nothing to resolve.
async fn resolve_prompt(
    state: &AppState,
    user_id: &str,
    query: &DateQuery,
    action: RecoveryAction,
) -> Result<RecoveryResponse, AppError> {
    let clock = request_clock(state, query)?;
    let prompt = check_skip_prompt(state.store.as_ref(), user_id, clock.today, clock.now)
        .await
        .ok_or_else(|| AppError::conflict("no skip prompt pending"))?;
    let action = prompt.resolve(action).await?;

    let profile = load_profile(state, user_id).await?;
    let elapsed_days = absolute_day_number(profile.program_start_date, clock.today)?;
    Ok(RecoveryResponse {
        action: action.as_str().to_string(),
        program_start_date: profile.program_start_date,
        elapsed_days,
        program_day: program_day_view(elapsed_days),
    })
}
