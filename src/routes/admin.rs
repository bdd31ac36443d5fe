use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;

use crate::db::DbConn;
use crate::guards::AdminGuard;
use crate::models::{JobResponse, UserResponse};
use crate::routes::job::populate_jobs;
use crate::utils::{ApiError, ApiResponse};

// ==================== ADMIN CONSOLE ====================

#[openapi(tag = "Admin")]
#[get("/admin/users")]
pub async fn get_all_users(
    db: &State<DbConn>,
    _admin: AdminGuard,
) -> Result<Json<ApiResponse<Vec<UserResponse>>>, ApiError> {
    let users = db.list_users().await?;
    Ok(Json(ApiResponse::success(users.into_iter().map(UserResponse::from).collect())))
}

#[openapi(tag = "Admin")]
#[get("/admin/jobs")]
pub async fn get_all_jobs(
    db: &State<DbConn>,
    admin: AdminGuard,
) -> Result<Json<ApiResponse<Vec<JobResponse>>>, ApiError> {
    let jobs = db.list_jobs().await?;
    log::debug!("admin {} listed {} jobs", admin.auth.user_id, jobs.len());
    Ok(Json(ApiResponse::success(populate_jobs(db, jobs).await?)))
}

#[cfg(test)]
mod tests {
    use crate::test_support::TestApp;
    use rocket::http::Status;
    use serde_json::json;

    #[rocket::async_test]
    async fn admin_routes_reject_other_roles() {
        let app = TestApp::new().await;
        let customer = app.register("Chitra", "chitra@example.com", "customer").await;
        let worker = app.register("Wasim", "wasim@example.com", "worker").await;

        for token in [customer.token.as_str(), worker.token.as_str()] {
            let (status, body) = app.get("/api/admin/users", Some(token)).await;
            assert_eq!(status, Status::Forbidden);
            assert_eq!(body["success"], false);
        }

        let (status, _) = app.get("/api/admin/jobs", None).await;
        assert_eq!(status, Status::Unauthorized);
    }

    #[rocket::async_test]
    async fn self_registered_admin_gets_no_console() {
        let app = TestApp::new().await;

        let (status, body) = app
            .post("/api/auth/register", None, json!({
                "name": "Mallory", "email": "mallory@example.com", "password": "secret1", "role": "admin"
            }))
            .await;
        assert_eq!(status, Status::BadRequest);
        assert!(body["data"]["token"].is_null());

        // falling back to a customer account does not open the console either
        let customer = app.register("Mallory", "mallory@example.com", "customer").await;
        let (status, _) = app.get("/api/admin/users", Some(&customer.token)).await;
        assert_eq!(status, Status::Forbidden);
    }

    #[rocket::async_test]
    async fn admin_sees_every_user_and_job() {
        let app = TestApp::new().await;
        let admin = app.admin("Mandeep", "mandeep@example.com").await;
        let customer = app.register("Chitra", "chitra@example.com", "customer").await;
        let worker = app.register("Wasim", "wasim@example.com", "worker").await;
        app.create_job(&customer, Some(&worker.id)).await;
        app.create_job(&customer, None).await;

        let (status, body) = app.get("/api/admin/users", Some(&admin.token)).await;
        assert_eq!(status, Status::Ok);
        let users = body["data"].as_array().unwrap();
        assert_eq!(users.len(), 3);
        assert!(users.iter().all(|u| u.get("passwordHash").is_none()));

        let (status, body) = app.get("/api/admin/jobs", Some(&admin.token)).await;
        assert_eq!(status, Status::Ok);
        let jobs = body["data"].as_array().unwrap();
        assert_eq!(jobs.len(), 2);
        assert!(jobs.iter().all(|j| j["customer"]["name"] == "Chitra"));
    }
}
