use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars::JsonSchema;
use validator::Validate;

use super::UserRef;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Message {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub sender_id: ObjectId,
    pub receiver_id: ObjectId,
    pub text: String,
    pub created_at: DateTime,
}

impl Message {
    /// The other side of the message as seen by `user_id`.
    pub fn peer_of(&self, user_id: &ObjectId) -> ObjectId {
        if self.sender_id == *user_id {
            self.receiver_id
        } else {
            self.sender_id
        }
    }
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageDto {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub receiver_id: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub text: String,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub sender: UserRef,
    pub receiver: UserRef,
    pub text: String,
    pub created_at: String,
}

impl MessageResponse {
    pub fn new(message: Message, sender: UserRef, receiver: UserRef) -> Self {
        MessageResponse {
            id: message.id.map(|id| id.to_hex()).unwrap_or_default(),
            sender,
            receiver,
            text: message.text,
            created_at: message.created_at.try_to_rfc3339_string().unwrap_or_default(),
        }
    }
}

/// One row of the chat list: the peer and the latest message exchanged.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConversationResponse {
    pub user: UserRef,
    pub last_message: MessageResponse,
}

