use mongodb::bson::DateTime;

use crate::config::AdminSeed;
use crate::db::DbConn;
use crate::models::{Role, User};
use crate::utils::ApiError;

use super::PasswordService;

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Creates the configured admin unless the email is already taken.
/// Returns whether an account was inserted.
pub async fn seed_admin(db: &DbConn, seed: &AdminSeed) -> Result<bool, ApiError> {
    let email = normalize_email(&seed.email);

    if let Some(existing) = db.find_user_by_email(&email).await? {
        if existing.role != Role::Admin {
            warn!("Admin seed skipped: {} is registered as {}", email, existing.role);
        }
        return Ok(false);
    }

    let admin = User {
        id: None,
        name: seed.name.trim().to_string(),
        email,
        password_hash: PasswordService::hash(&seed.password).await?,
        role: Role::Admin,
        created_at: DateTime::now(),
    };

    let admin = db.insert_user(admin).await?;
    info!("Seeded admin account {}", admin.email);
    Ok(true)
}
