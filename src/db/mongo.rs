use mongodb::bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument};
use mongodb::{Client, Collection, Database, IndexModel};
use rocket::futures::TryStreamExt;

use super::{Store, StoreError, StoreResult};
use crate::models::{Job, JobStatus, Message, User, WorkerProfile, WorkerProfileChanges};

const USERS: &str = "users";
const WORKER_PROFILES: &str = "worker_profiles";
const JOBS: &str = "jobs";
const MESSAGES: &str = "messages";

const DUPLICATE_KEY: i32 = 11000;

pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, mongodb::error::Error> {
        let client = Client::with_uri_str(uri).await?;

        // Test connection
        client
            .database("admin")
            .run_command(doc! {"ping": 1}, None)
            .await?;

        let store = MongoStore { db: client.database(database) };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> Result<(), mongodb::error::Error> {
        let unique_email = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.users().create_index(unique_email, None).await?;

        // One profile per user is checked by the upsert, so this index is not unique.
        self.worker_profiles()
            .create_index(IndexModel::builder().keys(doc! { "user_id": 1 }).build(), None)
            .await?;

        self.jobs()
            .create_index(IndexModel::builder().keys(doc! { "customer_id": 1 }).build(), None)
            .await?;
        self.jobs()
            .create_index(IndexModel::builder().keys(doc! { "worker_id": 1 }).build(), None)
            .await?;

        self.messages()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "sender_id": 1, "receiver_id": 1, "created_at": 1 })
                    .build(),
                None,
            )
            .await?;

        info!("✓ MongoDB indexes ensured");
        Ok(())
    }

    fn users(&self) -> Collection<User> {
        self.db.collection::<User>(USERS)
    }

    fn worker_profiles(&self) -> Collection<WorkerProfile> {
        self.db.collection::<WorkerProfile>(WORKER_PROFILES)
    }

    fn jobs(&self) -> Collection<Job> {
        self.db.collection::<Job>(JOBS)
    }

    fn messages(&self) -> Collection<Message> {
        self.db.collection::<Message>(MESSAGES)
    }
}

fn is_duplicate_key(e: &mongodb::error::Error) -> bool {
    matches!(
        *e.kind,
        ErrorKind::Write(WriteFailure::WriteError(ref we)) if we.code == DUPLICATE_KEY
    )
}

fn inserted_id(result: mongodb::results::InsertOneResult) -> StoreResult<ObjectId> {
    result.inserted_id.as_object_id().ok_or(StoreError::MissingId)
}

async fn find_all<T>(
    collection: Collection<T>,
    filter: Document,
    sort: Option<Document>,
) -> StoreResult<Vec<T>>
where
    T: serde::de::DeserializeOwned + Unpin + Send + Sync,
{
    let options = FindOptions::builder().sort(sort).build();
    let docs: Vec<T> = collection.find(filter, options).await?.try_collect().await?;
    Ok(docs)
}

#[rocket::async_trait]
impl Store for MongoStore {
    async fn insert_user(&self, mut user: User) -> StoreResult<User> {
        let result = self.users().insert_one(&user, None).await.map_err(|e| {
            if is_duplicate_key(&e) {
                StoreError::Duplicate("email".to_string())
            } else {
                StoreError::Mongo(e)
            }
        })?;
        user.id = Some(inserted_id(result)?);
        Ok(user)
    }

    async fn find_user(&self, id: &ObjectId) -> StoreResult<Option<User>> {
        Ok(self.users().find_one(doc! { "_id": *id }, None).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.users().find_one(doc! { "email": email }, None).await?)
    }

    async fn find_users(&self, ids: &[ObjectId]) -> StoreResult<Vec<User>> {
        find_all(self.users(), doc! { "_id": { "$in": ids.to_vec() } }, None).await
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        find_all(self.users(), doc! {}, Some(doc! { "created_at": -1 })).await
    }

    async fn insert_worker_profile(&self, mut profile: WorkerProfile) -> StoreResult<WorkerProfile> {
        let result = self.worker_profiles().insert_one(&profile, None).await?;
        profile.id = Some(inserted_id(result)?);
        Ok(profile)
    }

    async fn find_worker_profile(&self, id: &ObjectId) -> StoreResult<Option<WorkerProfile>> {
        Ok(self.worker_profiles().find_one(doc! { "_id": *id }, None).await?)
    }

    async fn find_worker_profile_by_user(&self, user_id: &ObjectId) -> StoreResult<Option<WorkerProfile>> {
        Ok(self.worker_profiles().find_one(doc! { "user_id": *user_id }, None).await?)
    }

    async fn list_worker_profiles(&self) -> StoreResult<Vec<WorkerProfile>> {
        find_all(self.worker_profiles(), doc! {}, None).await
    }

    async fn update_worker_profile(
        &self,
        user_id: &ObjectId,
        changes: &WorkerProfileChanges,
    ) -> StoreResult<Option<WorkerProfile>> {
        let mut update_doc = doc! {
            "updated_at": DateTime::now()
        };

        if let Some(ref skills) = changes.skills {
            update_doc.insert("skills", skills.clone());
        }
        if let Some(rate) = changes.hourly_rate {
            update_doc.insert("hourly_rate", rate);
        }
        if let Some(ref location) = changes.location {
            update_doc.insert("location", location.clone());
        }
        if let Some(ref bio) = changes.bio {
            update_doc.insert("bio", bio.clone());
        }
        if let Some(availability) = changes.availability {
            update_doc.insert("availability", availability);
        }

        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        Ok(self
            .worker_profiles()
            .find_one_and_update(doc! { "user_id": *user_id }, doc! { "$set": update_doc }, options)
            .await?)
    }

    async fn record_completed_job(&self, user_id: &ObjectId, amount: f64) -> StoreResult<()> {
        let result = self
            .worker_profiles()
            .update_one(
                doc! { "user_id": *user_id },
                doc! {
                    "$inc": { "total_jobs": 1, "total_earnings": amount },
                    "$set": { "updated_at": DateTime::now() }
                },
                None,
            )
            .await?;

        if result.matched_count == 0 {
            log::debug!("no worker profile for {}; completion totals not recorded", user_id);
        }
        Ok(())
    }

    async fn insert_job(&self, mut job: Job) -> StoreResult<Job> {
        let result = self.jobs().insert_one(&job, None).await?;
        job.id = Some(inserted_id(result)?);
        Ok(job)
    }

    async fn find_job(&self, id: &ObjectId) -> StoreResult<Option<Job>> {
        Ok(self.jobs().find_one(doc! { "_id": *id }, None).await?)
    }

    async fn jobs_for_user(&self, user_id: &ObjectId) -> StoreResult<Vec<Job>> {
        find_all(
            self.jobs(),
            doc! { "$or": [ { "customer_id": *user_id }, { "worker_id": *user_id } ] },
            None,
        )
        .await
    }

    async fn list_jobs(&self) -> StoreResult<Vec<Job>> {
        find_all(self.jobs(), doc! {}, Some(doc! { "date": -1 })).await
    }

    async fn set_job_status(&self, id: &ObjectId, status: JobStatus) -> StoreResult<Option<Job>> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::Before)
            .build();

        Ok(self
            .jobs()
            .find_one_and_update(
                doc! { "_id": *id },
                doc! { "$set": { "status": status.as_str() } },
                options,
            )
            .await?)
    }

    async fn insert_message(&self, mut message: Message) -> StoreResult<Message> {
        let result = self.messages().insert_one(&message, None).await?;
        message.id = Some(inserted_id(result)?);
        Ok(message)
    }

    async fn messages_between(&self, a: &ObjectId, b: &ObjectId) -> StoreResult<Vec<Message>> {
        find_all(
            self.messages(),
            doc! {
                "$or": [
                    { "sender_id": *a, "receiver_id": *b },
                    { "sender_id": *b, "receiver_id": *a },
                ]
            },
            // _id breaks ties between messages stored in the same millisecond
            Some(doc! { "created_at": 1, "_id": 1 }),
        )
        .await
    }

    async fn messages_involving(&self, user_id: &ObjectId) -> StoreResult<Vec<Message>> {
        find_all(
            self.messages(),
            doc! { "$or": [ { "sender_id": *user_id }, { "receiver_id": *user_id } ] },
            Some(doc! { "created_at": -1, "_id": -1 }),
        )
        .await
    }
}
