use chrono::{NaiveDate, TimeZone, Utc};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::DateTime;
use rocket::serde::json::{self, Json};
use serde::{Deserialize, Deserializer};
use validator::ValidationErrors;

use super::ApiError;

/// Splits the comma separated skill list sent by the profile form.
pub fn split_skills(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|skill| skill.trim())
        .filter(|skill| !skill.is_empty())
        .map(str::to_string)
        .collect()
}

/// Accepts an RFC 3339 timestamp or a bare `YYYY-MM-DD` (taken as UTC midnight).
pub fn parse_job_date(raw: &str) -> Option<DateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_rfc3339_str(raw) {
        return Some(dt);
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    let midnight = Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?);
    Some(DateTime::from_millis(midnight.timestamp_millis()))
}

pub fn parse_object_id(raw: &str, what: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(raw.trim()).map_err(|_| ApiError::bad_request(format!("Invalid {}", what)))
}

/// Flattens validator output into one client-facing sentence.
pub fn validation_message(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match e.message {
                Some(ref m) => m.to_string(),
                None => format!("Invalid {}", field),
            })
        })
        .collect();
    messages.sort();
    messages.join("; ")
}

/// Unwraps a JSON body whose parse failure the handler wants to report as
/// a 400 with its own message rather than Rocket's 422.
pub fn json_body<T>(body: Result<Json<T>, json::Error<'_>>, message: &str) -> Result<T, ApiError> {
    body.map(Json::into_inner).map_err(|e| {
        log::debug!("rejected request body: {:?}", e);
        ApiError::bad_request(message)
    })
}

fn finite<E: serde::de::Error>(n: f64) -> Result<f64, E> {
    if n.is_finite() {
        Ok(n)
    } else {
        Err(E::custom("amount must be a finite number"))
    }
}

/// Amounts arrive either as JSON numbers or as the raw string of a form input.
pub fn deserialize_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        Text(String),
    }

    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrString::Number(n)) => finite(n).map(Some),
        Some(NumberOrString::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(NumberOrString::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("invalid amount '{}'", s)))
            .and_then(finite)
            .map(Some),
    }
}
