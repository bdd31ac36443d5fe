use rocket::response::status;
use rocket::serde::json::{self, Json};
use rocket::State;
use rocket_okapi::openapi;
use mongodb::bson::DateTime;
use validator::Validate;

use crate::db::{DbConn, StoreError};
use crate::guards::AuthGuard;
use crate::models::{AuthResponse, LoginDto, RegisterDto, Role, User, UserResponse};
use crate::services::{normalize_email, JwtService, PasswordService};
use crate::utils::{json_body, validation_message, ApiError, ApiResponse};

fn auth_response(user: &User) -> Result<AuthResponse, ApiError> {
    let id = user.id.ok_or_else(|| ApiError::internal_error("User has no id"))?;
    let token = JwtService::generate_token(&id, user.role)
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    Ok(AuthResponse {
        id: id.to_hex(),
        name: user.name.clone(),
        email: user.email.clone(),
        role: user.role,
        token,
    })
}

/// --------------------
/// Register
/// --------------------
#[openapi(tag = "Auth")]
#[post("/auth/register", data = "<dto>")]
pub async fn register(
    db: &State<DbConn>,
    dto: Result<Json<RegisterDto>, json::Error<'_>>,
) -> Result<status::Created<Json<ApiResponse<AuthResponse>>>, ApiError> {
    let mut dto = json_body(dto, "Please add all fields")?;
    dto.name = dto.name.trim().to_string();
    dto.email = normalize_email(&dto.email);

    if dto.name.is_empty() || dto.email.is_empty() || dto.password.is_empty() {
        return Err(ApiError::bad_request("Please add all fields"));
    }
    dto.validate()
        .map_err(|e| ApiError::bad_request(validation_message(&e)))?;

    let role = match dto.role.as_deref() {
        None | Some("") => Role::Customer,
        Some(raw) => raw.parse::<Role>().map_err(ApiError::bad_request)?,
    };
    // admins come from the configured seed account only
    if role == Role::Admin {
        return Err(ApiError::bad_request("Admin accounts cannot be registered"));
    }

    if db.find_user_by_email(&dto.email).await?.is_some() {
        return Err(ApiError::bad_request("User already exists"));
    }

    let user = User {
        id: None,
        password_hash: PasswordService::hash(&dto.password).await?,
        name: dto.name,
        email: dto.email,
        role,
        created_at: DateTime::now(),
    };

    // the unique index still catches a concurrent registration
    let user = db.insert_user(user).await.map_err(|e| match e {
        StoreError::Duplicate(_) => ApiError::bad_request("User already exists"),
        other => other.into(),
    })?;

    info!("Registered {} as {}", user.email, user.role);

    let body = auth_response(&user)?;
    Ok(status::Created::new("/api/auth/me")
        .body(Json(ApiResponse::success_with_message("Registration successful", body))))
}

/// --------------------
/// Login
/// --------------------
#[openapi(tag = "Auth")]
#[post("/auth/login", data = "<dto>")]
pub async fn login(
    db: &State<DbConn>,
    dto: Result<Json<LoginDto>, json::Error<'_>>,
) -> Result<Json<ApiResponse<AuthResponse>>, ApiError> {
    let dto = json_body(dto, "Please provide email and password")?;
    if dto.email.trim().is_empty() || dto.password.is_empty() {
        return Err(ApiError::bad_request("Please provide email and password"));
    }

    let user = db
        .find_user_by_email(&normalize_email(&dto.email))
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    if !PasswordService::verify(&dto.password, &user.password_hash).await? {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    Ok(Json(ApiResponse::success_with_message("Login successful", auth_response(&user)?)))
}

/// --------------------
/// Current user
/// --------------------
#[openapi(tag = "Auth")]
#[get("/auth/me")]
pub async fn me(
    db: &State<DbConn>,
    auth: AuthGuard,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let user = db
        .find_user(&auth.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(ApiResponse::success(user.into())))
}
