pub mod response;
pub mod validation;

pub use response::{ApiError, ApiResponse};
pub use validation::{deserialize_amount, json_body, parse_job_date, parse_object_id, split_skills, validation_message};
