use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars;
use rocket_okapi::okapi::schemars::JsonSchema;
use std::fmt;
use std::str::FromStr;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Worker,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Worker => "worker",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "customer" => Ok(Role::Customer),
            "worker" => Ok(Role::Worker),
            "admin" => Ok(Role::Admin),
            other => Err(format!("Unknown role '{}'", other)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct RegisterDto {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(default)]
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct LoginDto {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Payload returned by register and login; the client stores it verbatim.
#[derive(Debug, Serialize, JsonSchema)]
pub struct AuthResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub token: String,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: user.name,
            email: user.email,
            role: user.role,
            created_at: user.created_at.try_to_rfc3339_string().unwrap_or_default(),
        }
    }
}

/// A populated user reference: the subset of user fields embedded in
/// other documents' responses.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct UserSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl UserSummary {
    pub fn with_email(user: &User) -> Self {
        UserSummary {
            id: user.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: user.name.clone(),
            email: Some(user.email.clone()),
            role: None,
        }
    }

    pub fn with_role(user: &User) -> Self {
        UserSummary {
            id: user.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: user.name.clone(),
            email: None,
            role: Some(user.role),
        }
    }
}

/// A reference to a user that is either populated or left as a bare id
/// (the referenced user may have been removed from the store).
#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(untagged)]
pub enum UserRef {
    Populated(UserSummary),
    Id(String),
}

impl UserRef {
    pub fn id(id: &ObjectId) -> Self {
        UserRef::Id(id.to_hex())
    }
}
