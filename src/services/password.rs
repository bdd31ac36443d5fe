use crate::config::Config;
use crate::utils::ApiError;

pub struct PasswordService;

impl PasswordService {
    fn cost() -> u32 {
        // bcrypt's minimum keeps the test suite fast
        if cfg!(test) { 4 } else { Config::bcrypt_cost() }
    }

    pub async fn hash(password: &str) -> Result<String, ApiError> {
        let password = password.to_string();
        let cost = Self::cost();

        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| ApiError::internal_error(format!("Task join error: {}", e)))?
            .map_err(|e| ApiError::internal_error(format!("Failed to hash password: {}", e)))
    }

    /// `Ok(false)` for a wrong password; errors only for a corrupt hash.
    pub async fn verify(password: &str, hash: &str) -> Result<bool, ApiError> {
        let password = password.to_string();
        let hash = hash.to_string();

        tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| ApiError::internal_error(format!("Task join error: {}", e)))?
            .map_err(|e| ApiError::internal_error(format!("Invalid password hash: {}", e)))
    }
}
