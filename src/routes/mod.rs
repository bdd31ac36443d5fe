pub mod admin;
pub mod auth;
pub mod job;
pub mod message;
pub mod worker;
