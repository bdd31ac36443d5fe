//! Shared harness for the route tests: a full app over a fresh `MemoryStore`.

use std::sync::Arc;

use rocket::http::{ContentType, Header, Status};
use rocket::local::asynchronous::{Client, LocalResponse};
use serde_json::{json, Value};

use crate::config::AdminSeed;
use crate::db::{DbConn, MemoryStore};
use crate::services::seed_admin;

pub const PASSWORD: &str = "password123";

pub struct TestUser {
    pub id: String,
    pub token: String,
}

pub struct TestApp {
    client: Client,
    store: DbConn,
}

async fn read(response: LocalResponse<'_>) -> (Status, Value) {
    let status = response.status();
    let body = response.into_string().await.unwrap_or_default();
    let value = serde_json::from_str(&body).unwrap_or(Value::Null);
    (status, value)
}

impl TestApp {
    pub async fn new() -> Self {
        let store: DbConn = Arc::new(MemoryStore::default());
        let rocket = crate::app(rocket::build()).manage(store.clone());
        let client = Client::untracked(rocket).await.expect("valid rocket instance");
        TestApp { client, store }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (Status, Value) {
        let mut request = self.client.get(uri.to_string());
        if let Some(token) = token {
            request.add_header(Header::new("Authorization", format!("Bearer {}", token)));
        }
        read(request.dispatch().await).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (Status, Value) {
        let mut request = self.client.post(uri.to_string()).header(ContentType::JSON).body(body.to_string());
        if let Some(token) = token {
            request.add_header(Header::new("Authorization", format!("Bearer {}", token)));
        }
        read(request.dispatch().await).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (Status, Value) {
        let mut request = self.client.put(uri.to_string()).header(ContentType::JSON).body(body.to_string());
        if let Some(token) = token {
            request.add_header(Header::new("Authorization", format!("Bearer {}", token)));
        }
        read(request.dispatch().await).await
    }

    pub async fn register(&self, name: &str, email: &str, role: &str) -> TestUser {
        let (status, body) = self
            .post("/api/auth/register", None, json!({
                "name": name,
                "email": email,
                "password": PASSWORD,
                "role": role
            }))
            .await;
        assert_eq!(status, Status::Created, "register failed: {}", body);

        TestUser {
            id: body["data"]["_id"].as_str().unwrap().to_string(),
            token: body["data"]["token"].as_str().unwrap().to_string(),
        }
    }

    /// Seeds the operator account the way ignition does, then logs in.
    pub async fn admin(&self, name: &str, email: &str) -> TestUser {
        let seed = AdminSeed {
            name: name.to_string(),
            email: email.to_string(),
            password: PASSWORD.to_string(),
        };
        seed_admin(&self.store, &seed).await.expect("admin seeded");

        let (status, body) = self
            .post("/api/auth/login", None, json!({ "email": email, "password": PASSWORD }))
            .await;
        assert_eq!(status, Status::Ok, "admin login failed: {}", body);

        TestUser {
            id: body["data"]["_id"].as_str().unwrap().to_string(),
            token: body["data"]["token"].as_str().unwrap().to_string(),
        }
    }

    /// Saves a worker profile and returns its id.
    pub async fn worker_profile(&self, worker: &TestUser, skills: &str, rate: f64, location: &str) -> String {
        let (status, body) = self
            .post("/api/workers", Some(&worker.token), json!({
                "skills": skills,
                "hourlyRate": rate,
                "location": location
            }))
            .await;
        assert_eq!(status, Status::Ok, "profile save failed: {}", body);
        body["data"]["_id"].as_str().unwrap().to_string()
    }

    /// Posts a 500-rupee job as `customer` and returns its id.
    pub async fn create_job(&self, customer: &TestUser, worker_id: Option<&str>) -> String {
        let mut job = json!({
            "title": "Fix wiring",
            "description": "Kitchen sockets keep tripping",
            "amount": 500,
            "location": "Mumbai"
        });
        if let Some(worker_id) = worker_id {
            job["workerId"] = json!(worker_id);
        }

        let (status, body) = self.post("/api/jobs", Some(&customer.token), job).await;
        assert_eq!(status, Status::Created, "job creation failed: {}", body);
        body["data"]["_id"].as_str().unwrap().to_string()
    }

    pub async fn send(&self, from: &TestUser, to: &TestUser, text: &str) {
        let (status, body) = self
            .post("/api/messages", Some(&from.token), json!({ "receiverId": to.id, "text": text }))
            .await;
        assert_eq!(status, Status::Created, "send failed: {}", body);
    }
}
