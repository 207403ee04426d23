use crate::errors::StoreError;
use crate::models::{
    Activity, ActivityUpdate, CompletionEvent, NewActivity, NewUser, ProfileUpdate, TrackerData,
    UserProfile,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::path::{Path, PathBuf};
use tokio::{fs, sync::Mutex};
use tracing::info;
use uuid::Uuid;

/// Log and profile store the tracker reads from and writes to.
///
/// Implementations return events in no particular order; callers sort.
#[async_trait]
pub trait TrackerStore: Send + Sync {
    async fn list_events(&self, user_id: &str) -> Result<Vec<CompletionEvent>, StoreError>;

    async fn list_events_on(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<CompletionEvent>, StoreError>;

    async fn list_activities(&self, user_id: &str) -> Result<Vec<Activity>, StoreError>;

    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError>;

    async fn set_program_start_date(&self, user_id: &str, date: NaiveDate)
        -> Result<(), StoreError>;

    /// Records that the missed-day prompt was answered on `date`.
    async fn mark_prompt_resolved(&self, user_id: &str, date: NaiveDate)
        -> Result<(), StoreError>;

    async fn create_user(
        &self,
        user: NewUser,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<UserProfile, StoreError>;

    async fn update_profile(
        &self,
        user_id: &str,
        update: ProfileUpdate,
    ) -> Result<UserProfile, StoreError>;

    /// Links `user_id` to the account registered under `partner_email`.
    async fn link_partner(
        &self,
        user_id: &str,
        partner_email: &str,
    ) -> Result<UserProfile, StoreError>;

    async fn add_activities(
        &self,
        user_id: &str,
        activities: Vec<NewActivity>,
    ) -> Result<Vec<Activity>, StoreError>;

    async fn update_activity(
        &self,
        user_id: &str,
        activity_id: &str,
        update: ActivityUpdate,
    ) -> Result<Activity, StoreError>;

    async fn delete_activity(&self, user_id: &str, activity_id: &str) -> Result<(), StoreError>;

    async fn append_event(&self, event: CompletionEvent) -> Result<(), StoreError>;

    /// Deletes every event matching user, activity and date. Returns how many
    /// were removed.
    async fn remove_events(
        &self,
        user_id: &str,
        activity_id: &str,
        date: NaiveDate,
    ) -> Result<usize, StoreError>;

    async fn touch_last_login(&self, user_id: &str, today: NaiveDate) -> Result<(), StoreError>;
}

pub fn generate_id(prefix: &str) -> String {
    format!("{prefix}_{}", Uuid::new_v4().simple())
}

fn user_mut<'a>(
    data: &'a mut TrackerData,
    user_id: &str,
) -> Result<&'a mut UserProfile, StoreError> {
    data.users
        .get_mut(user_id)
        .ok_or_else(|| StoreError::NotFound(format!("user {user_id}")))
}

fn activity_mut<'a>(
    data: &'a mut TrackerData,
    user_id: &str,
    activity_id: &str,
) -> Result<&'a mut Activity, StoreError> {
    data.activities
        .iter_mut()
        .find(|activity| activity.user_id == user_id && activity.id == activity_id)
        .ok_or_else(|| StoreError::NotFound(format!("activity {activity_id}")))
}

/// Keeps the whole data set in memory and rewrites the JSON file after every
/// write. Without a path nothing is persisted.
pub struct JsonStore {
    path: Option<PathBuf>,
    data: Mutex<TrackerData>,
}

impl JsonStore {
    /// Opens the file at `path`; a missing file starts an empty store.
    pub async fn open(path: PathBuf) -> Result<Self, StoreError> {
        let data = read_data(&path).await?;
        info!(
            path = %path.display(),
            users = data.users.len(),
            events = data.events.len(),
            "tracker data loaded"
        );
        Ok(Self {
            path: Some(path),
            data: Mutex::new(data),
        })
    }

    pub fn in_memory(data: TrackerData) -> Self {
        Self {
            path: None,
            data: Mutex::new(data),
        }
    }

    async fn persist(&self, data: &TrackerData) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        fs::write(path, serde_json::to_vec_pretty(data)?).await?;
        Ok(())
    }
}

async fn read_data(path: &Path) -> Result<TrackerData, StoreError> {
    match fs::read(path).await {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(TrackerData::default()),
        Err(err) => Err(err.into()),
    }
}

#[async_trait]
impl TrackerStore for JsonStore {
    async fn list_events(&self, user_id: &str) -> Result<Vec<CompletionEvent>, StoreError> {
        let data = self.data.lock().await;
        Ok(data
            .events
            .iter()
            .filter(|event| event.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_events_on(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<CompletionEvent>, StoreError> {
        let data = self.data.lock().await;
        Ok(data
            .events
            .iter()
            .filter(|event| event.user_id == user_id && event.date == date)
            .cloned()
            .collect())
    }

    async fn list_activities(&self, user_id: &str) -> Result<Vec<Activity>, StoreError> {
        let data = self.data.lock().await;
        let mut activities: Vec<Activity> = data
            .activities
            .iter()
            .filter(|activity| activity.user_id == user_id)
            .cloned()
            .collect();
        activities.sort_by_key(|activity| activity.order);
        Ok(activities)
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError> {
        let data = self.data.lock().await;
        Ok(data.users.get(user_id).cloned())
    }

    async fn set_program_start_date(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<(), StoreError> {
        let mut data = self.data.lock().await;
        user_mut(&mut data, user_id)?.program_start_date = date;
        self.persist(&data).await?;
        info!(user_id, %date, "program start date updated");
        Ok(())
    }

    async fn mark_prompt_resolved(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<(), StoreError> {
        let mut data = self.data.lock().await;
        user_mut(&mut data, user_id)?.prompt_resolved_on = Some(date);
        self.persist(&data).await
    }

    async fn create_user(
        &self,
        user: NewUser,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<UserProfile, StoreError> {
        let profile = UserProfile {
            user_id: generate_id("user"),
            name: user.name,
            email: user.email,
            program_start_date: today,
            created_at: now,
            last_login: Some(today),
            prompt_resolved_on: None,
            schedule: user.schedule,
            partner_id: None,
        };

        let mut data = self.data.lock().await;
        data.users.insert(profile.user_id.clone(), profile.clone());
        self.persist(&data).await?;
        info!(user_id = %profile.user_id, "user created");
        Ok(profile)
    }

    async fn update_profile(
        &self,
        user_id: &str,
        update: ProfileUpdate,
    ) -> Result<UserProfile, StoreError> {
        let mut data = self.data.lock().await;
        let user = user_mut(&mut data, user_id)?;
        if let Some(name) = update.name {
            user.name = name;
        }
        let schedule = &mut user.schedule;
        if let Some(telegram) = update.telegram {
            schedule.telegram = telegram;
        }
        if let Some(work_time) = update.work_time {
            schedule.work_time = work_time;
        }
        if let Some(minutes) = update.commute_minutes {
            schedule.commute_minutes = minutes;
        }
        if let Some(minutes) = update.grooming_minutes {
            schedule.grooming_minutes = minutes;
        }
        if let Some(alert_time) = update.alert_time {
            schedule.alert_time = alert_time;
        }
        let updated = user.clone();
        self.persist(&data).await?;
        Ok(updated)
    }

    async fn link_partner(
        &self,
        user_id: &str,
        partner_email: &str,
    ) -> Result<UserProfile, StoreError> {
        let mut data = self.data.lock().await;
        let partner_id = data
            .users
            .values()
            .find(|user| user.user_id != user_id && user.email.eq_ignore_ascii_case(partner_email))
            .map(|user| user.user_id.clone())
            .ok_or_else(|| StoreError::NotFound(format!("partner {partner_email}")))?;

        let user = user_mut(&mut data, user_id)?;
        user.partner_id = Some(partner_id);
        let updated = user.clone();
        self.persist(&data).await?;
        info!(user_id, partner_id = ?updated.partner_id, "partner linked");
        Ok(updated)
    }

    async fn add_activities(
        &self,
        user_id: &str,
        activities: Vec<NewActivity>,
    ) -> Result<Vec<Activity>, StoreError> {
        let mut data = self.data.lock().await;
        user_mut(&mut data, user_id)?;

        let next_order = data
            .activities
            .iter()
            .filter(|activity| activity.user_id == user_id)
            .map(|activity| activity.order + 1)
            .max()
            .unwrap_or(0);
        let created: Vec<Activity> = activities
            .into_iter()
            .enumerate()
            .map(|(index, new)| Activity {
                id: generate_id("workout"),
                user_id: user_id.to_string(),
                name: new.name,
                details: new.details,
                minutes: new.minutes,
                order: next_order + index as u32,
            })
            .collect();

        data.activities.extend(created.iter().cloned());
        self.persist(&data).await?;
        Ok(created)
    }

    async fn update_activity(
        &self,
        user_id: &str,
        activity_id: &str,
        update: ActivityUpdate,
    ) -> Result<Activity, StoreError> {
        let mut data = self.data.lock().await;
        let activity = activity_mut(&mut data, user_id, activity_id)?;
        if let Some(name) = update.name {
            activity.name = name;
        }
        if let Some(details) = update.details {
            activity.details = details;
        }
        if let Some(minutes) = update.minutes {
            activity.minutes = minutes;
        }
        if let Some(order) = update.order {
            activity.order = order;
        }
        let updated = activity.clone();
        self.persist(&data).await?;
        Ok(updated)
    }

    async fn delete_activity(&self, user_id: &str, activity_id: &str) -> Result<(), StoreError> {
        let mut data = self.data.lock().await;
        let before = data.activities.len();
        data.activities
            .retain(|activity| !(activity.user_id == user_id && activity.id == activity_id));
        if data.activities.len() == before {
            return Err(StoreError::NotFound(format!("activity {activity_id}")));
        }
        self.persist(&data).await?;
        info!(user_id, activity_id, "activity deleted");
        Ok(())
    }

    async fn append_event(&self, event: CompletionEvent) -> Result<(), StoreError> {
        let mut data = self.data.lock().await;
        data.events.push(event);
        self.persist(&data).await
    }

    async fn remove_events(
        &self,
        user_id: &str,
        activity_id: &str,
        date: NaiveDate,
    ) -> Result<usize, StoreError> {
        let mut data = self.data.lock().await;
        let before = data.events.len();
        data.events.retain(|event| {
            !(event.user_id == user_id && event.activity_id == activity_id && event.date == date)
        });
        let removed = before - data.events.len();
        if removed > 0 {
            self.persist(&data).await?;
        }
        Ok(removed)
    }

    async fn touch_last_login(&self, user_id: &str, today: NaiveDate) -> Result<(), StoreError> {
        let mut data = self.data.lock().await;
        let user = user_mut(&mut data, user_id)?;
        if user.last_login == Some(today) {
            return Ok(());
        }
        user.last_login = Some(today);
        self.persist(&data).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, d).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 1, 9, 30, 0).unwrap()
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Wanjiru".to_string(),
            email: email.to_string(),
            schedule: Default::default(),
        }
    }

    fn named(name: &str) -> NewActivity {
        NewActivity {
            name: name.to_string(),
            details: String::new(),
            minutes: 10,
        }
    }

    fn completion(user_id: &str, activity_id: &str, date: NaiveDate) -> CompletionEvent {
        CompletionEvent {
            id: generate_id("log"),
            date,
            user_id: user_id.to_string(),
            activity_id: activity_id.to_string(),
            success: true,
            timestamp: now(),
            notes: String::new(),
        }
    }

    #[tokio::test]
    async fn remove_deletes_every_match_for_the_day() {
        let store = JsonStore::in_memory(TrackerData::default());
        let user = store.create_user(new_user("w@example.com"), day(1), now()).await.unwrap();
        let id = &user.user_id;

        store.append_event(completion(id, "w1", day(3))).await.unwrap();
        store.append_event(completion(id, "w1", day(3))).await.unwrap();
        store.append_event(completion(id, "w2", day(3))).await.unwrap();
        store.append_event(completion(id, "w1", day(2))).await.unwrap();

        let removed = store.remove_events(id, "w1", day(3)).await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(store.list_events(id).await.unwrap().len(), 2);
        assert_eq!(store.list_events_on(id, day(3)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn activity_catalog_edits() {
        let store = JsonStore::in_memory(TrackerData::default());
        let user = store.create_user(new_user("w@example.com"), day(1), now()).await.unwrap();
        let id = &user.user_id;
        let created = store
            .add_activities(id, vec![named("Push-ups"), named("Breathwork Video")])
            .await
            .unwrap();
        assert!(created[0].id.starts_with("workout_"));

        let renamed = store
            .update_activity(
                id,
                &created[0].id,
                ActivityUpdate {
                    name: Some("Wall push-ups".to_string()),
                    order: Some(5),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.name, "Wall push-ups");
        assert_eq!(renamed.minutes, 10);

        store.delete_activity(id, &created[1].id).await.unwrap();
        let names: Vec<String> = store
            .list_activities(id)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, vec!["Wall push-ups"]);

        // Appends go after the highest existing position.
        let appended = store.add_activities(id, vec![named("Plank")]).await.unwrap();
        assert_eq!(appended[0].order, 6);

        let err = store.delete_activity(id, &created[1].id).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
        let err = store
            .update_activity("someone_else", &created[0].id, ActivityUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn profile_update_and_partner_link() {
        let store = JsonStore::in_memory(TrackerData::default());
        let user = store.create_user(new_user("a@example.com"), day(1), now()).await.unwrap();
        let partner = store.create_user(new_user("B@example.com"), day(1), now()).await.unwrap();
        assert_eq!(user.schedule.alert_time, "20:00");

        let updated = store
            .update_profile(
                &user.user_id,
                ProfileUpdate {
                    alert_time: Some("21:30".to_string()),
                    commute_minutes: Some(40),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.schedule.alert_time, "21:30");
        assert_eq!(updated.schedule.commute_minutes, 40);
        assert_eq!(updated.schedule.work_time, "09:00");

        let linked = store.link_partner(&user.user_id, "b@example.com").await.unwrap();
        assert_eq!(linked.partner_id.as_deref(), Some(partner.user_id.as_str()));

        let err = store.link_partner(&user.user_id, "a@example.com").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn unknown_user_writes_are_not_found() {
        let store = JsonStore::in_memory(TrackerData::default());
        let err = store.set_program_start_date("nobody", day(1)).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
        let err = store.mark_prompt_resolved("nobody", day(1)).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
        assert!(store.get_profile("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracker.json");

        let store = JsonStore::open(path.clone()).await.unwrap();
        let user = store.create_user(new_user("w@example.com"), day(1), now()).await.unwrap();
        store
            .append_event(completion(&user.user_id, "w1", day(2)))
            .await
            .unwrap();
        store.set_program_start_date(&user.user_id, day(4)).await.unwrap();
        store.mark_prompt_resolved(&user.user_id, day(4)).await.unwrap();
        drop(store);

        let reopened = JsonStore::open(path).await.unwrap();
        let profile = reopened.get_profile(&user.user_id).await.unwrap().unwrap();
        assert_eq!(profile.program_start_date, day(4));
        assert_eq!(profile.prompt_resolved_on, Some(day(4)));
        assert_eq!(profile.created_at, now());
        assert_eq!(reopened.list_events(&user.user_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn corrupt_file_refuses_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracker.json");
        tokio::fs::write(&path, b"{not json").await.unwrap();

        let err = JsonStore::open(path).await.err().expect("corrupt file must not load");
        assert!(matches!(err, StoreError::Unavailable(_)));
    }

    #[tokio::test]
    async fn missing_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path().join("absent.json")).await.unwrap();
        assert!(store.list_events("anyone").await.unwrap().is_empty());
    }
}
