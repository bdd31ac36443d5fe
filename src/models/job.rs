use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars;
use rocket_okapi::okapi::schemars::JsonSchema;
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use super::UserRef;
use crate::utils::deserialize_amount;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Accepted,
    InProgress,
    Completed,
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Accepted => "accepted",
            JobStatus::InProgress => "in_progress",
            JobStatus::Completed => "completed",
            JobStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "accepted" => Ok(JobStatus::Accepted),
            "in_progress" => Ok(JobStatus::InProgress),
            "completed" => Ok(JobStatus::Completed),
            "cancelled" => Ok(JobStatus::Cancelled),
            other => Err(format!("Invalid job status '{}'", other)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Job {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub customer_id: ObjectId,
    pub worker_id: Option<ObjectId>,
    pub title: String,
    pub description: String,
    pub status: JobStatus,
    pub amount: f64,
    pub location: String,
    pub date: DateTime,
}

impl Job {
    /// The customer or the assigned worker.
    pub fn is_party(&self, user_id: &ObjectId) -> bool {
        self.customer_id == *user_id || self.worker_id.as_ref() == Some(user_id)
    }
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobDto {
    pub worker_id: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub description: String,
    #[serde(default, deserialize_with = "deserialize_amount")]
    #[schemars(with = "Option<f64>")]
    #[validate(required)]
    pub amount: Option<f64>,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub location: String,
    /// RFC 3339 timestamp or a plain `YYYY-MM-DD` date.
    pub date: Option<String>,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct UpdateJobStatusDto {
    pub status: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct JobResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub customer: UserRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker: Option<UserRef>,
    pub title: String,
    pub description: String,
    pub status: JobStatus,
    pub amount: f64,
    pub location: String,
    pub date: String,
}

impl JobResponse {
    pub fn new(job: Job, customer: UserRef, worker: Option<UserRef>) -> Self {
        JobResponse {
            id: job.id.map(|id| id.to_hex()).unwrap_or_default(),
            customer,
            worker,
            title: job.title,
            description: job.description,
            status: job.status,
            amount: job.amount,
            location: job.location,
            date: job.date.try_to_rfc3339_string().unwrap_or_default(),
        }
    }
}

impl From<Job> for JobResponse {
    /// Unpopulated form: references stay as ids.
    fn from(job: Job) -> Self {
        let customer = UserRef::id(&job.customer_id);
        let worker = job.worker_id.as_ref().map(UserRef::id);
        JobResponse::new(job, customer, worker)
    }
}
