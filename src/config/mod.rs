use rocket::figment::{Figment, providers::{Env, Format, Toml}};
use rocket::Config as RocketConfig;
use std::env;

pub struct Config;

/// The operator account created at ignition. Admins cannot sign up
/// through the public API.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Which `Store` implementation backs the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Mongo,
    Memory,
}

impl Config {
    pub fn figment() -> Figment {
        // Get the current profile
        let profile = env::var("ROCKET_PROFILE").unwrap_or_else(|_| "development".to_string());

        // bare names used by the .env files
        Figment::from(RocketConfig::default())
            .merge(Toml::file("Rocket.toml").nested())
            .select(&profile)
            .merge(Env::prefixed("ROCKET_").split("_"))
            .merge(Env::raw().only(&[
                "PORT",
                "MONGO_URI",
                "JWT_SECRET",
                "ADMIN_NAME",
                "ADMIN_EMAIL",
                "ADMIN_PASSWORD",
            ]))
    }

    pub fn jwt_secret() -> String {
        Self::figment()
            .extract_inner("jwt_secret")
            .unwrap_or_else(|_| "default-secret".to_string())
    }

    pub fn jwt_expiry() -> i64 {
        Self::figment()
            .extract_inner("jwt_expiry")
            .unwrap_or(30 * 24 * 60 * 60)
    }

    pub fn bcrypt_cost() -> u32 {
        Self::figment()
            .extract_inner("bcrypt_cost")
            .unwrap_or(bcrypt::DEFAULT_COST)
    }

    pub fn mongo_uri() -> String {
        Self::figment()
            .extract_inner("mongo_uri")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string())
    }

    pub fn mongo_database() -> String {
        Self::figment()
            .extract_inner("mongo_database")
            .unwrap_or_else(|_| "labour-market".to_string())
    }

    pub fn storage() -> StorageBackend {
        let name: String = Self::figment()
            .extract_inner("storage")
            .unwrap_or_else(|_| "mongo".to_string());

        match name.to_lowercase().as_str() {
            "memory" => StorageBackend::Memory,
            _ => StorageBackend::Mongo,
        }
    }

    /// `None` unless both `admin_email` and `admin_password` are set.
    pub fn admin_seed() -> Option<AdminSeed> {
        let figment = Self::figment();
        let email: String = figment.extract_inner("admin_email").ok()?;
        let password: String = figment.extract_inner("admin_password").ok()?;
        if email.trim().is_empty() || password.is_empty() {
            return None;
        }

        Some(AdminSeed {
            name: figment
                .extract_inner("admin_name")
                .unwrap_or_else(|_| "Admin".to_string()),
            email,
            password,
        })
    }

    pub fn is_development() -> bool {
        let profile = env::var("ROCKET_PROFILE").unwrap_or_else(|_| "development".to_string());
        profile == "development"
    }
}
