use mongodb::bson::oid::ObjectId;
use tokio::sync::RwLock;

use super::{Store, StoreError, StoreResult};
use crate::models::{Job, JobStatus, Message, User, WorkerProfile, WorkerProfileChanges};

#[derive(Default)]
struct Collections {
    users: Vec<User>,
    worker_profiles: Vec<WorkerProfile>,
    jobs: Vec<Job>,
    // kept in insertion order
    messages: Vec<Message>,
}

/// Process-local store with the same query semantics as `MongoStore`.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

fn sorted_oldest_first(mut messages: Vec<Message>) -> Vec<Message> {
    // stable, so equal timestamps keep insertion order
    messages.sort_by_key(|m| m.created_at);
    messages
}

#[rocket::async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, mut user: User) -> StoreResult<User> {
        let mut inner = self.inner.write().await;
        if inner.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate("email".to_string()));
        }
        user.id = Some(ObjectId::new());
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: &ObjectId) -> StoreResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.id.as_ref() == Some(id)).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_users(&self, ids: &[ObjectId]) -> StoreResult<Vec<User>> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .iter()
            .filter(|u| u.id.map(|id| ids.contains(&id)).unwrap_or(false))
            .cloned()
            .collect())
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().rev().cloned().collect())
    }

    async fn insert_worker_profile(&self, mut profile: WorkerProfile) -> StoreResult<WorkerProfile> {
        let mut inner = self.inner.write().await;
        profile.id = Some(ObjectId::new());
        inner.worker_profiles.push(profile.clone());
        Ok(profile)
    }

    async fn find_worker_profile(&self, id: &ObjectId) -> StoreResult<Option<WorkerProfile>> {
        let inner = self.inner.read().await;
        Ok(inner.worker_profiles.iter().find(|p| p.id.as_ref() == Some(id)).cloned())
    }

    async fn find_worker_profile_by_user(&self, user_id: &ObjectId) -> StoreResult<Option<WorkerProfile>> {
        let inner = self.inner.read().await;
        Ok(inner.worker_profiles.iter().find(|p| p.user_id == *user_id).cloned())
    }

    async fn list_worker_profiles(&self) -> StoreResult<Vec<WorkerProfile>> {
        let inner = self.inner.read().await;
        Ok(inner.worker_profiles.clone())
    }

    async fn update_worker_profile(
        &self,
        user_id: &ObjectId,
        changes: &WorkerProfileChanges,
    ) -> StoreResult<Option<WorkerProfile>> {
        let mut inner = self.inner.write().await;
        Ok(inner
            .worker_profiles
            .iter_mut()
            .find(|p| p.user_id == *user_id)
            .map(|profile| {
                changes.apply(profile);
                profile.clone()
            }))
    }

    async fn record_completed_job(&self, user_id: &ObjectId, amount: f64) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        match inner.worker_profiles.iter_mut().find(|p| p.user_id == *user_id) {
            Some(profile) => {
                profile.total_jobs += 1;
                profile.total_earnings += amount;
                profile.updated_at = mongodb::bson::DateTime::now();
            }
            None => log::debug!("no worker profile for {}; completion totals not recorded", user_id),
        }
        Ok(())
    }

    async fn insert_job(&self, mut job: Job) -> StoreResult<Job> {
        let mut inner = self.inner.write().await;
        job.id = Some(ObjectId::new());
        inner.jobs.push(job.clone());
        Ok(job)
    }

    async fn find_job(&self, id: &ObjectId) -> StoreResult<Option<Job>> {
        let inner = self.inner.read().await;
        Ok(inner.jobs.iter().find(|j| j.id.as_ref() == Some(id)).cloned())
    }

    async fn jobs_for_user(&self, user_id: &ObjectId) -> StoreResult<Vec<Job>> {
        let inner = self.inner.read().await;
        Ok(inner.jobs.iter().filter(|j| j.is_party(user_id)).cloned().collect())
    }

    async fn list_jobs(&self) -> StoreResult<Vec<Job>> {
        let inner = self.inner.read().await;
        let mut jobs = inner.jobs.clone();
        jobs.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(jobs)
    }

    async fn set_job_status(&self, id: &ObjectId, status: JobStatus) -> StoreResult<Option<Job>> {
        let mut inner = self.inner.write().await;
        Ok(inner
            .jobs
            .iter_mut()
            .find(|j| j.id.as_ref() == Some(id))
            .map(|job| {
                let previous = job.clone();
                job.status = status;
                previous
            }))
    }

    async fn insert_message(&self, mut message: Message) -> StoreResult<Message> {
        let mut inner = self.inner.write().await;
        message.id = Some(ObjectId::new());
        inner.messages.push(message.clone());
        Ok(message)
    }

    async fn messages_between(&self, a: &ObjectId, b: &ObjectId) -> StoreResult<Vec<Message>> {
        let inner = self.inner.read().await;
        let thread = inner
            .messages
            .iter()
            .filter(|m| {
                (m.sender_id == *a && m.receiver_id == *b) || (m.sender_id == *b && m.receiver_id == *a)
            })
            .cloned()
            .collect();
        Ok(sorted_oldest_first(thread))
    }

    async fn messages_involving(&self, user_id: &ObjectId) -> StoreResult<Vec<Message>> {
        let inner = self.inner.read().await;
        let involving = inner
            .messages
            .iter()
            .filter(|m| m.sender_id == *user_id || m.receiver_id == *user_id)
            .cloned()
            .collect();
        let mut newest_first = sorted_oldest_first(involving);
        newest_first.reverse();
        Ok(newest_first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use mongodb::bson::DateTime;

    fn user(email: &str) -> User {
        User {
            id: None,
            name: "Asha".into(),
            email: email.into(),
            password_hash: "x".into(),
            role: Role::Customer,
            created_at: DateTime::now(),
        }
    }

    fn message(from: ObjectId, to: ObjectId, text: &str) -> Message {
        Message {
            id: None,
            sender_id: from,
            receiver_id: to,
            text: text.into(),
            created_at: DateTime::from_millis(1_700_000_000_000),
        }
    }

    #[rocket::async_test]
    async fn duplicate_email_is_rejected() {
        let store = MemoryStore::default();
        store.insert_user(user("a@example.com")).await.unwrap();
        let err = store.insert_user(user("a@example.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[rocket::async_test]
    async fn same_millisecond_messages_keep_insertion_order() {
        let store = MemoryStore::default();
        let (a, b) = (ObjectId::new(), ObjectId::new());
        for text in ["first", "second", "third"] {
            store.insert_message(message(a, b, text)).await.unwrap();
        }

        let thread = store.messages_between(&b, &a).await.unwrap();
        let texts: Vec<_> = thread.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["first", "second", "third"]);

        let newest = store.messages_involving(&a).await.unwrap();
        assert_eq!(newest[0].text, "third");
    }

    #[rocket::async_test]
    async fn status_swap_returns_previous_job() {
        let store = MemoryStore::default();
        let job = store
            .insert_job(Job {
                id: None,
                customer_id: ObjectId::new(),
                worker_id: None,
                title: "Paint gate".into(),
                description: "Two coats".into(),
                status: JobStatus::Accepted,
                amount: 900.0,
                location: "Nagpur".into(),
                date: DateTime::now(),
            })
            .await
            .unwrap();
        let id = job.id.unwrap();

        let first = store.set_job_status(&id, JobStatus::Completed).await.unwrap().unwrap();
        assert_eq!(first.status, JobStatus::Accepted);
        let second = store.set_job_status(&id, JobStatus::Completed).await.unwrap().unwrap();
        assert_eq!(second.status, JobStatus::Completed);

        assert!(store.set_job_status(&ObjectId::new(), JobStatus::Pending).await.unwrap().is_none());
    }
}
