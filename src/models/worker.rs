use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars;
use rocket_okapi::okapi::schemars::JsonSchema;

use super::UserRef;
use crate::utils::deserialize_amount;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WorkerProfile {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub skills: Vec<String>,
    pub hourly_rate: f64,
    pub location: String,
    pub bio: Option<String>,
    pub rating: f64,
    pub total_jobs: i32,
    pub total_earnings: f64,
    pub availability: bool,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

/// Body of `POST /workers`. Every field is optional so the same payload
/// serves both the first save and later partial edits.
#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpsertWorkerProfileDto {
    /// Comma separated, e.g. `"wiring, fan installation"`.
    pub skills: Option<String>,
    /// A number, or the numeric string a form input sends.
    #[serde(default, deserialize_with = "deserialize_amount")]
    #[schemars(with = "Option<f64>")]
    pub hourly_rate: Option<f64>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub availability: Option<bool>,
}

/// Field-level `$set` for an existing profile; `None` leaves a field untouched.
#[derive(Debug, Default, Clone)]
pub struct WorkerProfileChanges {
    pub skills: Option<Vec<String>>,
    pub hourly_rate: Option<f64>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub availability: Option<bool>,
}

impl WorkerProfileChanges {
    pub fn apply(&self, profile: &mut WorkerProfile) {
        if let Some(ref skills) = self.skills {
            profile.skills = skills.clone();
        }
        if let Some(rate) = self.hourly_rate {
            profile.hourly_rate = rate;
        }
        if let Some(ref location) = self.location {
            profile.location = location.clone();
        }
        if let Some(ref bio) = self.bio {
            profile.bio = Some(bio.clone());
        }
        if let Some(availability) = self.availability {
            profile.availability = availability;
        }
        profile.updated_at = DateTime::now();
    }
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkerProfileResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub user: UserRef,
    pub skills: Vec<String>,
    pub hourly_rate: f64,
    pub location: String,
    pub bio: Option<String>,
    pub rating: f64,
    pub total_jobs: i32,
    pub total_earnings: f64,
    pub availability: bool,
    pub updated_at: String,
}

impl WorkerProfileResponse {
    pub fn new(profile: WorkerProfile, user: UserRef) -> Self {
        WorkerProfileResponse {
            id: profile.id.map(|id| id.to_hex()).unwrap_or_default(),
            user,
            skills: profile.skills,
            hourly_rate: profile.hourly_rate,
            location: profile.location,
            bio: profile.bio,
            rating: profile.rating,
            total_jobs: profile.total_jobs,
            total_earnings: profile.total_earnings,
            availability: profile.availability,
            updated_at: profile.updated_at.try_to_rfc3339_string().unwrap_or_default(),
        }
    }
}
