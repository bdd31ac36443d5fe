pub mod user;
pub mod worker;
pub mod job;
pub mod message;

pub use user::*;
pub use worker::*;
pub use job::*;
pub use message::*;
