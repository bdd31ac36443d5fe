pub mod memory;
pub mod mongo;

use mongodb::bson::oid::ObjectId;
use rocket::fairing::AdHoc;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{Config, StorageBackend};
use crate::models::{Job, JobStatus, Message, User, UserRef, UserSummary, WorkerProfile, WorkerProfileChanges};

pub use memory::MemoryStore;
pub use mongo::MongoStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("Duplicate value for unique field '{0}'")]
    Duplicate(String),

    #[error("Inserted document has no ObjectId")]
    MissingId,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence for the four collections. Inserts return the stored
/// document with its id filled in.
#[rocket::async_trait]
pub trait Store: Send + Sync {
    // users
    async fn insert_user(&self, user: User) -> StoreResult<User>;
    async fn find_user(&self, id: &ObjectId) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn find_users(&self, ids: &[ObjectId]) -> StoreResult<Vec<User>>;
    async fn list_users(&self) -> StoreResult<Vec<User>>;

    // worker profiles
    async fn insert_worker_profile(&self, profile: WorkerProfile) -> StoreResult<WorkerProfile>;
    async fn find_worker_profile(&self, id: &ObjectId) -> StoreResult<Option<WorkerProfile>>;
    async fn find_worker_profile_by_user(&self, user_id: &ObjectId) -> StoreResult<Option<WorkerProfile>>;
    async fn list_worker_profiles(&self) -> StoreResult<Vec<WorkerProfile>>;
    async fn update_worker_profile(
        &self,
        user_id: &ObjectId,
        changes: &WorkerProfileChanges,
    ) -> StoreResult<Option<WorkerProfile>>;
    /// Adds one finished job and its amount to the worker's running totals.
    async fn record_completed_job(&self, user_id: &ObjectId, amount: f64) -> StoreResult<()>;

    // jobs
    async fn insert_job(&self, job: Job) -> StoreResult<Job>;
    async fn find_job(&self, id: &ObjectId) -> StoreResult<Option<Job>>;
    /// Jobs where the user is the customer or the assigned worker.
    async fn jobs_for_user(&self, user_id: &ObjectId) -> StoreResult<Vec<Job>>;
    async fn list_jobs(&self) -> StoreResult<Vec<Job>>;
    /// Swaps in the new status atomically and returns the job as it was
    /// before the change, so exactly one caller observes each transition.
    async fn set_job_status(&self, id: &ObjectId, status: JobStatus) -> StoreResult<Option<Job>>;

    // messages
    async fn insert_message(&self, message: Message) -> StoreResult<Message>;
    /// Both directions between `a` and `b`, oldest first.
    async fn messages_between(&self, a: &ObjectId, b: &ObjectId) -> StoreResult<Vec<Message>>;
    /// Every message sent or received by the user, newest first.
    async fn messages_involving(&self, user_id: &ObjectId) -> StoreResult<Vec<Message>>;
}

pub type DbConn = Arc<dyn Store>;

/// Users loaded in one round trip so responses can embed them
/// in place of bare ids.
pub struct UserDirectory {
    users: HashMap<ObjectId, User>,
}

impl UserDirectory {
    pub async fn load<I>(db: &DbConn, ids: I) -> StoreResult<Self>
    where
        I: IntoIterator<Item = ObjectId>,
    {
        let mut ids: Vec<ObjectId> = ids.into_iter().collect();
        ids.sort();
        ids.dedup();

        let users = if ids.is_empty() {
            HashMap::new()
        } else {
            db.find_users(&ids)
                .await?
                .into_iter()
                .filter_map(|u| u.id.map(|id| (id, u)))
                .collect()
        };

        Ok(UserDirectory { users })
    }

    /// `{_id, name, email}`, or the bare id if the user is gone.
    pub fn with_email(&self, id: &ObjectId) -> UserRef {
        match self.users.get(id) {
            Some(user) => UserRef::Populated(UserSummary::with_email(user)),
            None => UserRef::id(id),
        }
    }

    /// `{_id, name, role}`, as shown in the chat list.
    pub fn with_role(&self, id: &ObjectId) -> UserRef {
        match self.users.get(id) {
            Some(user) => UserRef::Populated(UserSummary::with_role(user)),
            None => UserRef::id(id),
        }
    }
}

async fn open_store() -> Option<DbConn> {
    match Config::storage() {
        StorageBackend::Memory => {
            warn!("Using in-memory store; data is lost on restart");
            let store: DbConn = Arc::new(MemoryStore::default());
            Some(store)
        }
        StorageBackend::Mongo => match MongoStore::connect(&Config::mongo_uri(), &Config::mongo_database()).await {
            Ok(store) => {
                info!("✓ MongoDB connected successfully");
                let store: DbConn = Arc::new(store);
                Some(store)
            }
            Err(e) => {
                error!("✗ Failed to connect to MongoDB: {}", e);
                None
            }
        },
    }
}

pub fn init() -> AdHoc {
    AdHoc::try_on_ignite("Store", |rocket| async {
        let Some(store) = open_store().await else {
            return Err(rocket);
        };

        if let Some(seed) = Config::admin_seed() {
            if let Err(e) = crate::services::seed_admin(&store, &seed).await {
                error!("✗ Failed to seed admin account: {}", e.message);
                return Err(rocket);
            }
        }

        Ok(rocket.manage(store))
    })
}
