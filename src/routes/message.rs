use rocket::response::status;
use rocket::serde::json::{self, Json};
use rocket::State;
use rocket_okapi::openapi;
use mongodb::bson::DateTime;
use std::collections::HashSet;
use validator::Validate;

use crate::db::{DbConn, UserDirectory};
use crate::guards::AuthGuard;
use crate::models::{ConversationResponse, Message, MessageResponse, SendMessageDto};
use crate::utils::{json_body, parse_object_id, ApiError, ApiResponse};

#[openapi(tag = "Message")]
#[post("/messages", data = "<dto>")]
pub async fn send_message(
    db: &State<DbConn>,
    auth: AuthGuard,
    dto: Result<Json<SendMessageDto>, json::Error<'_>>,
) -> Result<status::Created<Json<ApiResponse<MessageResponse>>>, ApiError> {
    let dto = json_body(dto, "Please provide receiver and text")?;
    if dto.validate().is_err() {
        return Err(ApiError::bad_request("Please provide receiver and text"));
    }
    let receiver_id = parse_object_id(&dto.receiver_id, "receiver ID")?;

    let message = db
        .insert_message(Message {
            id: None,
            sender_id: auth.user_id,
            receiver_id,
            text: dto.text,
            created_at: DateTime::now(),
        })
        .await?;

    let users = UserDirectory::load(db, [message.sender_id, message.receiver_id]).await?;
    let sender = users.with_email(&message.sender_id);
    let receiver = users.with_email(&message.receiver_id);

    Ok(status::Created::new(format!("/api/messages/{}", receiver_id.to_hex()))
        .body(Json(ApiResponse::success(MessageResponse::new(message, sender, receiver)))))
}

/// The chat list: one entry per peer, most recent conversation first.
#[openapi(tag = "Message")]
#[get("/messages/conversations")]
pub async fn get_conversations(
    db: &State<DbConn>,
    auth: AuthGuard,
) -> Result<Json<ApiResponse<Vec<ConversationResponse>>>, ApiError> {
    let messages = db.messages_involving(&auth.user_id).await?;

    // newest first, so the first message seen per peer is the latest one
    let mut seen = HashSet::new();
    let latest: Vec<Message> = messages
        .into_iter()
        .filter(|m| seen.insert(m.peer_of(&auth.user_id)))
        .collect();

    let users = UserDirectory::load(db, latest.iter().flat_map(|m| [m.sender_id, m.receiver_id])).await?;

    let conversations = latest
        .into_iter()
        .map(|m| {
            let peer = m.peer_of(&auth.user_id);
            let (sender, receiver) = (users.with_role(&m.sender_id), users.with_role(&m.receiver_id));
            ConversationResponse {
                user: users.with_role(&peer),
                last_message: MessageResponse::new(m, sender, receiver),
            }
        })
        .collect();

    Ok(Json(ApiResponse::success(conversations)))
}

/// Full thread with one peer, oldest first. The chat window polls this.
#[openapi(tag = "Message")]
#[get("/messages/<user_id>")]
pub async fn get_messages(
    db: &State<DbConn>,
    auth: AuthGuard,
    user_id: String,
) -> Result<Json<ApiResponse<Vec<MessageResponse>>>, ApiError> {
    let peer = parse_object_id(&user_id, "user ID")?;

    let thread = db.messages_between(&auth.user_id, &peer).await?;
    let users = UserDirectory::load(db, [auth.user_id, peer]).await?;

    let messages = thread
        .into_iter()
        .map(|m| {
            let (sender, receiver) = (users.with_email(&m.sender_id), users.with_email(&m.receiver_id));
            MessageResponse::new(m, sender, receiver)
        })
        .collect();

    Ok(Json(ApiResponse::success(messages)))
}

#[cfg(test)]
mod tests {
    use crate::test_support::TestApp;
    use rocket::http::Status;
    use serde_json::json;

    #[rocket::async_test]
    async fn sent_message_is_populated_and_listed_in_order() {
        let app = TestApp::new().await;
        let a = app.register("Anil", "anil@example.com", "customer").await;
        let b = app.register("Bina", "bina@example.com", "worker").await;

        let (status, body) = app
            .post("/api/messages", Some(&a.token), json!({ "receiverId": b.id, "text": "Are you free Monday?" }))
            .await;
        assert_eq!(status, Status::Created);
        assert_eq!(body["data"]["sender"]["name"], "Anil");
        assert_eq!(body["data"]["receiver"]["email"], "bina@example.com");

        app.send(&b, &a, "Yes, after 10").await;
        app.send(&a, &b, "Great").await;

        let (status, body) = app.get(&format!("/api/messages/{}", b.id), Some(&a.token)).await;
        assert_eq!(status, Status::Ok);
        let texts: Vec<&str> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["text"].as_str().unwrap())
            .collect();
        assert_eq!(texts, ["Are you free Monday?", "Yes, after 10", "Great"]);

        // the peer sees the same thread
        let (_, body) = app.get(&format!("/api/messages/{}", a.id), Some(&b.token)).await;
        assert_eq!(body["data"].as_array().map(Vec::len), Some(3));
        assert_eq!(body["data"][1]["sender"]["_id"], b.id.as_str());
    }

    #[rocket::async_test]
    async fn send_requires_receiver_and_text() {
        let app = TestApp::new().await;
        let a = app.register("Anil", "anil@example.com", "customer").await;
        let b = app.register("Bina", "bina@example.com", "worker").await;

        let (status, body) = app.post("/api/messages", Some(&a.token), json!({ "receiverId": b.id })).await;
        assert_eq!(status, Status::BadRequest);
        assert_eq!(body["message"], "Please provide receiver and text");

        let (status, _) = app.post("/api/messages", Some(&a.token), json!({ "text": "hello" })).await;
        assert_eq!(status, Status::BadRequest);

        let (status, _) = app
            .post("/api/messages", Some(&a.token), json!({ "receiverId": "zzz", "text": "hello" }))
            .await;
        assert_eq!(status, Status::BadRequest);

        let (status, body) = app
            .post("/api/messages", Some(&a.token), json!({ "receiverId": b.id, "text": null }))
            .await;
        assert_eq!(status, Status::BadRequest);
        assert_eq!(body["message"], "Please provide receiver and text");

        let (status, _) = app.post("/api/messages", None, json!({ "receiverId": b.id, "text": "hi" })).await;
        assert_eq!(status, Status::Unauthorized);
    }

    #[rocket::async_test]
    async fn conversations_have_one_entry_per_peer_with_latest_message() {
        let app = TestApp::new().await;
        let a = app.register("Anil", "anil@example.com", "customer").await;
        let b = app.register("Bina", "bina@example.com", "worker").await;
        let c = app.register("Chetan", "chetan@example.com", "worker").await;

        app.send(&a, &b, "hi Bina").await;
        app.send(&a, &c, "hi Chetan").await;
        app.send(&b, &a, "hello Anil").await;
        app.send(&c, &b, "not involving Anil").await;

        let (status, body) = app.get("/api/messages/conversations", Some(&a.token)).await;
        assert_eq!(status, Status::Ok);
        let conversations = body["data"].as_array().unwrap();
        assert_eq!(conversations.len(), 2);

        // most recent conversation first
        assert_eq!(conversations[0]["user"]["_id"], b.id.as_str());
        assert_eq!(conversations[0]["user"]["role"], "worker");
        assert_eq!(conversations[0]["lastMessage"]["text"], "hello Anil");
        assert_eq!(conversations[1]["user"]["name"], "Chetan");
        assert_eq!(conversations[1]["lastMessage"]["text"], "hi Chetan");
    }

    #[rocket::async_test]
    async fn no_messages_means_no_conversations() {
        let app = TestApp::new().await;
        let a = app.register("Anil", "anil@example.com", "customer").await;

        let (status, body) = app.get("/api/messages/conversations", Some(&a.token)).await;
        assert_eq!(status, Status::Ok);
        assert_eq!(body["data"], json!([]));
    }
}
