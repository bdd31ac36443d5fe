use rocket::response::status;
use rocket::serde::json::{self, Json};
use rocket::State;
use rocket_okapi::openapi;
use mongodb::bson::DateTime;
use validator::Validate;

use crate::db::{DbConn, UserDirectory};
use crate::guards::AuthGuard;
use crate::models::{CreateJobDto, Job, JobResponse, JobStatus, UpdateJobStatusDto};
use crate::utils::{json_body, parse_job_date, parse_object_id, ApiError, ApiResponse};

/// Jobs with `customer` and `worker` replaced by `{_id, name, email}`.
pub(crate) async fn populate_jobs(db: &DbConn, jobs: Vec<Job>) -> Result<Vec<JobResponse>, ApiError> {
    let ids = jobs
        .iter()
        .flat_map(|j| std::iter::once(j.customer_id).chain(j.worker_id));
    let users = UserDirectory::load(db, ids).await?;

    Ok(jobs
        .into_iter()
        .map(|job| {
            let customer = users.with_email(&job.customer_id);
            let worker = job.worker_id.as_ref().map(|id| users.with_email(id));
            JobResponse::new(job, customer, worker)
        })
        .collect())
}

#[openapi(tag = "Job")]
#[post("/jobs", data = "<dto>")]
pub async fn create_job(
    db: &State<DbConn>,
    auth: AuthGuard,
    dto: Result<Json<CreateJobDto>, json::Error<'_>>,
) -> Result<status::Created<Json<ApiResponse<JobResponse>>>, ApiError> {
    let dto = json_body(dto, "Please add all required fields")?;
    // an amount of 0 counts as missing
    let missing_amount = dto.amount.map_or(true, |a| a == 0.0);
    if dto.validate().is_err() || missing_amount {
        return Err(ApiError::bad_request("Please add all required fields"));
    }

    let worker_id = match dto.worker_id.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(parse_object_id(raw, "worker ID")?),
    };

    let date = match dto.date.as_deref() {
        None | Some("") => DateTime::now(),
        Some(raw) => parse_job_date(raw).ok_or_else(|| ApiError::bad_request("Invalid date"))?,
    };

    let job = Job {
        id: None,
        customer_id: auth.user_id,
        worker_id,
        title: dto.title,
        description: dto.description,
        // new jobs always start out pending, assigned or not
        status: JobStatus::Pending,
        amount: dto.amount.unwrap_or_default(),
        location: dto.location,
        date,
    };

    let job = db.insert_job(job).await?;
    let id = job.id.map(|id| id.to_hex()).unwrap_or_default();

    Ok(status::Created::new(format!("/api/jobs/{}", id))
        .body(Json(ApiResponse::success(JobResponse::from(job)))))
}

#[openapi(tag = "Job")]
#[get("/jobs")]
pub async fn get_my_jobs(
    db: &State<DbConn>,
    auth: AuthGuard,
) -> Result<Json<ApiResponse<Vec<JobResponse>>>, ApiError> {
    let jobs = db.jobs_for_user(&auth.user_id).await?;
    Ok(Json(ApiResponse::success(populate_jobs(db, jobs).await?)))
}

/// Sets a new status. Only the customer and the assigned worker may do
/// so; any status may follow any other.
#[openapi(tag = "Job")]
#[put("/jobs/<job_id>", data = "<dto>")]
pub async fn update_job_status(
    db: &State<DbConn>,
    auth: AuthGuard,
    job_id: String,
    dto: Result<Json<UpdateJobStatusDto>, json::Error<'_>>,
) -> Result<Json<ApiResponse<JobResponse>>, ApiError> {
    let dto = json_body(dto, "Please provide a valid status")?;
    let object_id = parse_object_id(&job_id, "job ID")?;

    let job = db
        .find_job(&object_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;

    if !job.is_party(&auth.user_id) {
        return Err(ApiError::unauthorized("User not authorized"));
    }

    let status = match dto.status.as_deref() {
        None | Some("") => job.status,
        Some(raw) => raw.parse::<JobStatus>().map_err(ApiError::bad_request)?,
    };

    // set_job_status returns the pre-update job; only the transition into
    // Completed credits the worker
    let mut updated = db
        .set_job_status(&object_id, status)
        .await?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;
    let previous = updated.status;
    updated.status = status;

    if status == JobStatus::Completed && previous != JobStatus::Completed {
        if let Some(worker_id) = updated.worker_id {
            if let Err(e) = db.record_completed_job(&worker_id, updated.amount).await {
                error!("Job {} completed but worker {} was not credited: {}", job_id, worker_id, e);
            }
        }
    }

    info!("Job {} moved {} -> {} by {}", job_id, previous, status, auth.user_id);

    Ok(Json(ApiResponse::success(JobResponse::from(updated))))
}
