use rocket::serde::json::{self, Json};
use rocket::State;
use rocket_okapi::openapi;
use mongodb::bson::DateTime;

use crate::db::{DbConn, UserDirectory};
use crate::guards::AuthGuard;
use crate::models::{UpsertWorkerProfileDto, UserRef, WorkerProfile, WorkerProfileChanges, WorkerProfileResponse};
use crate::utils::{json_body, parse_object_id, split_skills, ApiError, ApiResponse};

// ============================================================================
// PUBLIC WORKER DIRECTORY
// ============================================================================

#[openapi(tag = "Worker")]
#[get("/workers")]
pub async fn get_workers(
    db: &State<DbConn>,
) -> Result<Json<ApiResponse<Vec<WorkerProfileResponse>>>, ApiError> {
    let profiles = db.list_worker_profiles().await?;
    let users = UserDirectory::load(db, profiles.iter().map(|p| p.user_id)).await?;

    let workers = profiles
        .into_iter()
        .map(|p| {
            let user = users.with_email(&p.user_id);
            WorkerProfileResponse::new(p, user)
        })
        .collect();

    Ok(Json(ApiResponse::success(workers)))
}

#[openapi(tag = "Worker")]
#[get("/workers/<worker_id>")]
pub async fn get_worker_by_id(
    db: &State<DbConn>,
    worker_id: String,
) -> Result<Json<ApiResponse<WorkerProfileResponse>>, ApiError> {
    let object_id = parse_object_id(&worker_id, "worker ID")?;

    let profile = db
        .find_worker_profile(&object_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Worker not found"))?;

    let users = UserDirectory::load(db, [profile.user_id]).await?;
    let user = users.with_email(&profile.user_id);

    Ok(Json(ApiResponse::success(WorkerProfileResponse::new(profile, user))))
}

// ============================================================================
// OWN PROFILE
// ============================================================================

/// Creates the caller's profile on first save and applies a partial
/// update afterwards.
#[openapi(tag = "Worker")]
#[post("/workers", data = "<dto>")]
pub async fn upsert_worker_profile(
    db: &State<DbConn>,
    auth: AuthGuard,
    dto: Result<Json<UpsertWorkerProfileDto>, json::Error<'_>>,
) -> Result<Json<ApiResponse<WorkerProfileResponse>>, ApiError> {
    let dto = json_body(dto, "Please provide valid profile fields")?;
    let changes = WorkerProfileChanges {
        skills: dto.skills.as_deref().map(split_skills),
        hourly_rate: dto.hourly_rate,
        location: dto.location.map(|l| l.trim().to_string()),
        bio: dto.bio,
        availability: dto.availability,
    };

    let existing = db.find_worker_profile_by_user(&auth.user_id).await?;

    let (profile, message) = if existing.is_some() {
        let updated = db
            .update_worker_profile(&auth.user_id, &changes)
            .await?
            .ok_or_else(|| ApiError::not_found("Worker profile not found"))?;
        (updated, "Worker profile updated successfully")
    } else {
        let (hourly_rate, location) = match (changes.hourly_rate, changes.location.clone()) {
            (Some(rate), Some(location)) if !location.is_empty() => (rate, location),
            _ => return Err(ApiError::bad_request("Hourly rate and location are required")),
        };

        let now = DateTime::now();
        let profile = WorkerProfile {
            id: None,
            user_id: auth.user_id,
            skills: changes.skills.unwrap_or_default(),
            hourly_rate,
            location,
            bio: changes.bio,
            rating: 0.0,
            total_jobs: 0,
            total_earnings: 0.0,
            availability: changes.availability.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };

        info!("Creating worker profile for {}", auth.user_id);
        (db.insert_worker_profile(profile).await?, "Worker profile created successfully")
    };

    let user_id = profile.user_id;
    Ok(Json(ApiResponse::success_with_message(
        message,
        WorkerProfileResponse::new(profile, UserRef::id(&user_id)),
    )))
}

#[cfg(test)]
mod tests {
    use crate::test_support::TestApp;
    use rocket::http::Status;
    use serde_json::json;

    #[rocket::async_test]
    async fn first_save_creates_and_second_updates_same_profile() {
        let app = TestApp::new().await;
        let worker = app.register("Suresh", "suresh@example.com", "worker").await;

        let (status, body) = app
            .post("/api/workers", Some(&worker.token), json!({
                "skills": " wiring, fan installation ,, switchboards",
                "hourlyRate": 350,
                "location": "Pune",
                "bio": "10 years experience"
            }))
            .await;
        assert_eq!(status, Status::Ok);
        assert_eq!(body["data"]["skills"], json!(["wiring", "fan installation", "switchboards"]));
        assert_eq!(body["data"]["availability"], true);
        assert_eq!(body["data"]["rating"], 0.0);
        assert_eq!(body["data"]["user"], worker.id.as_str());
        let profile_id = body["data"]["_id"].as_str().unwrap().to_string();

        let (status, body) = app
            .post("/api/workers", Some(&worker.token), json!({ "hourlyRate": 400, "availability": false }))
            .await;
        assert_eq!(status, Status::Ok);
        assert_eq!(body["data"]["_id"], profile_id.as_str());
        assert_eq!(body["data"]["hourlyRate"], 400.0);
        assert_eq!(body["data"]["availability"], false);
        // untouched fields survive a partial update
        assert_eq!(body["data"]["location"], "Pune");
        assert_eq!(body["data"]["skills"].as_array().map(Vec::len), Some(3));

        let (_, body) = app.get("/api/workers", None).await;
        assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
    }

    #[rocket::async_test]
    async fn creating_requires_rate_and_location() {
        let app = TestApp::new().await;
        let worker = app.register("Suresh", "suresh@example.com", "worker").await;

        let (status, body) = app
            .post("/api/workers", Some(&worker.token), json!({ "skills": "plumbing" }))
            .await;
        assert_eq!(status, Status::BadRequest);
        assert_eq!(body["message"], "Hourly rate and location are required");
    }

    #[rocket::async_test]
    async fn hourly_rate_may_be_a_numeric_string() {
        let app = TestApp::new().await;
        let worker = app.register("Suresh", "suresh@example.com", "worker").await;

        let (status, body) = app
            .post("/api/workers", Some(&worker.token), json!({ "hourlyRate": "300", "location": "Delhi" }))
            .await;
        assert_eq!(status, Status::Ok, "{}", body);
        assert_eq!(body["data"]["hourlyRate"], 300.0);

        for bad in [json!("cheap"), json!("NaN"), json!(true)] {
            let (status, body) = app
                .post("/api/workers", Some(&worker.token), json!({ "hourlyRate": bad }))
                .await;
            assert_eq!(status, Status::BadRequest);
            assert_eq!(body["message"], "Please provide valid profile fields");
        }

        let (status, _) = app
            .post("/api/workers", Some(&worker.token), json!({ "location": null, "availability": "yes" }))
            .await;
        assert_eq!(status, Status::BadRequest);
    }

    #[rocket::async_test]
    async fn saving_requires_token() {
        let app = TestApp::new().await;
        let (status, _) = app
            .post("/api/workers", None, json!({ "hourlyRate": 300, "location": "Delhi" }))
            .await;
        assert_eq!(status, Status::Unauthorized);
    }

    #[rocket::async_test]
    async fn public_reads_populate_owner() {
        let app = TestApp::new().await;
        let worker = app.register("Suresh", "suresh@example.com", "worker").await;
        let profile_id = app.worker_profile(&worker, "plumbing", 300.0, "Delhi").await;

        let (status, body) = app.get(&format!("/api/workers/{}", profile_id), None).await;
        assert_eq!(status, Status::Ok);
        assert_eq!(body["data"]["user"]["_id"], worker.id.as_str());
        assert_eq!(body["data"]["user"]["name"], "Suresh");
        assert_eq!(body["data"]["user"]["email"], "suresh@example.com");

        let (status, body) = app.get("/api/workers", None).await;
        assert_eq!(status, Status::Ok);
        assert_eq!(body["data"][0]["user"]["name"], "Suresh");
    }

    #[rocket::async_test]
    async fn unknown_and_malformed_ids() {
        let app = TestApp::new().await;

        let (status, body) = app.get("/api/workers/65f000000000000000000000", None).await;
        assert_eq!(status, Status::NotFound);
        assert_eq!(body["message"], "Worker not found");

        let (status, _) = app.get("/api/workers/not-an-id", None).await;
        assert_eq!(status, Status::BadRequest);
    }
}
