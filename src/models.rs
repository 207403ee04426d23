use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompletionEvent {
    pub id: String,
    pub date: NaiveDate,
    pub user_id: String,
    pub activity_id: String,
    pub success: bool,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub user_id: String,
    pub name: String,
    pub email: String,
    /// Day 1 of the breathwork cycle.
    pub program_start_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_login: Option<NaiveDate>,
    /// Day on which the missed-day prompt was last answered.
    #[serde(default)]
    pub prompt_resolved_on: Option<NaiveDate>,
    #[serde(default)]
    pub schedule: Schedule,
    #[serde(default)]
    pub partner_id: Option<String>,
}

/// Daily routine used for reminder timing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Schedule {
    pub telegram: String,
    pub work_time: String,
    pub commute_minutes: u32,
    pub grooming_minutes: u32,
    pub alert_time: String,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            telegram: String::new(),
            work_time: "09:00".to_string(),
            commute_minutes: 0,
            grooming_minutes: 0,
            alert_time: "20:00".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Activity {
    pub id: String,
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub minutes: u32,
    pub order: u32,
}

/// Everything the JSON store persists.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TrackerData {
    pub users: BTreeMap<String, UserProfile>,
    pub activities: Vec<Activity>,
    pub events: Vec<CompletionEvent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub schedule: Schedule,
}

/// Partial profile edit; absent fields keep their value.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub telegram: Option<String>,
    pub work_time: Option<String>,
    pub commute_minutes: Option<u32>,
    pub grooming_minutes: Option<u32>,
    pub alert_time: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PartnerRequest {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewActivity {
    pub name: String,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub minutes: u32,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ActivityUpdate {
    pub name: Option<String>,
    pub details: Option<String>,
    pub minutes: Option<u32>,
    pub order: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct CompletionRequest {
    pub activity_id: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct DateQuery {
    pub today: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct StreakResult {
    pub current_streak: u32,
    pub total_completions: u32,
    pub unique_active_days: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MilestoneStatus {
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Milestone {
    pub kind: String,
    pub target: u32,
    pub progress: u32,
    pub status: MilestoneStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub streak: StreakResult,
    pub milestones: Vec<Milestone>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgramDayView {
    pub day_index: u8,
    pub video_id: String,
    pub embed_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TodayResponse {
    pub date: NaiveDate,
    pub program_start_date: NaiveDate,
    pub elapsed_days: u32,
    pub program_day: ProgramDayView,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SkipPromptResponse {
    pub show: bool,
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecoveryResponse {
    pub action: String,
    pub program_start_date: NaiveDate,
    pub elapsed_days: u32,
    pub program_day: ProgramDayView,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RemovedResponse {
    pub removed: usize,
}
