#[macro_use]
extern crate rocket;

mod config;
mod db;
mod guards;
mod models;
mod routes;
mod services;
mod utils;

#[cfg(test)]
mod test_support;

use dotenvy::dotenv;
use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::Header;
use rocket::serde::json::{json, Value};
use rocket::{Build, Request, Response, Rocket};
use rocket_okapi::openapi_get_routes;
use rocket_okapi::swagger_ui::{SwaggerUIConfig, make_swagger_ui};

use crate::config::Config;

/* ----------------------------- CORS ----------------------------- */

pub struct CORS;

#[rocket::async_trait]
impl Fairing for CORS {
    fn info(&self) -> Info {
        Info {
            name: "CORS",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        if let Some(origin) = request.headers().get_one("Origin") {
            response.set_header(Header::new("Access-Control-Allow-Origin", origin));
        }

        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "GET, POST, PUT, DELETE, OPTIONS",
        ));

        response.set_header(Header::new(
            "Access-Control-Allow-Headers",
            "Content-Type, Authorization",
        ));

        response.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
    }
}

/* ----------------------------- OPTIONS ----------------------------- */

#[options("/<_..>")]
fn options_handler() {}

/* ----------------------------- HEALTH ----------------------------- */

#[get("/health")]
fn health() -> Value {
    json!({ "status": "ok" })
}

/* ----------------------------- ERRORS ----------------------------- */

fn error_body(message: &str) -> Value {
    json!({
        "success": false,
        "message": message
    })
}

#[catch(400)]
fn bad_request() -> Value {
    error_body("Malformed request body")
}

#[catch(401)]
fn unauthorized() -> Value {
    error_body("Not authorized, token failed")
}

#[catch(403)]
fn forbidden() -> Value {
    error_body("Admin access required")
}

#[catch(404)]
fn not_found() -> Value {
    error_body("Resource not found (check /api prefix)")
}

#[catch(422)]
fn unprocessable() -> Value {
    error_body("Request body has the wrong shape")
}

#[catch(500)]
fn internal_error() -> Value {
    error_body("Internal server error")
}

/* ----------------------------- SWAGGER ----------------------------- */

fn swagger_config() -> SwaggerUIConfig {
    SwaggerUIConfig {
        url: "/api/openapi.json".to_string(),
        ..Default::default()
    }
}

/* ----------------------------- APP ----------------------------- */

/// Everything except the store, which the caller attaches or manages.
pub fn app(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket
        .attach(CORS)
        .mount("/", routes![options_handler])
        .mount("/api", routes![health])
        .mount(
            "/api",
            openapi_get_routes![
                // Auth
                routes::auth::register,
                routes::auth::login,
                routes::auth::me,
                // Workers
                routes::worker::get_workers,
                routes::worker::get_worker_by_id,
                routes::worker::upsert_worker_profile,
                // Jobs
                routes::job::create_job,
                routes::job::get_my_jobs,
                routes::job::update_job_status,
                // Messages
                routes::message::send_message,
                routes::message::get_conversations,
                routes::message::get_messages,
                // Admin
                routes::admin::get_all_users,
                routes::admin::get_all_jobs,
            ],
        )
        .mount("/api/docs", make_swagger_ui(&swagger_config()))
        .register(
            "/",
            catchers![bad_request, unauthorized, forbidden, not_found, unprocessable, internal_error],
        )
}

/* ----------------------------- LAUNCH ----------------------------- */

#[launch]
fn rocket() -> Rocket<Build> {
    dotenv().ok();
    env_logger::init();

    info!("🚀 Labour market API starting");
    if Config::is_development() {
        info!("📚 Swagger UI → /api/docs");
    }

    app(rocket::custom(Config::figment())).attach(db::init())
}
