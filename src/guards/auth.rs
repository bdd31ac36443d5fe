use rocket::request::{self, FromRequest, Request, Outcome};
use rocket::http::Status;
use mongodb::bson::oid::ObjectId;

use rocket_okapi::request::{OpenApiFromRequest, RequestHeaderInput};
use rocket_okapi::r#gen::OpenApiGenerator;

use crate::models::Role;

/// JWT-based authentication guard
pub struct AuthGuard {
    pub user_id: ObjectId,
    pub role: Role,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthGuard {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let token = req.headers().get_one("Authorization");

        match token {
            Some(token) if token.starts_with("Bearer ") => {
                let token = token.trim_start_matches("Bearer ").trim();

                match crate::services::JwtService::verify_token(token) {
                    Ok(claims) => match ObjectId::parse_str(&claims.sub) {
                        Ok(user_id) => Outcome::Success(AuthGuard {
                            user_id,
                            role: claims.role,
                        }),
                        Err(_) => Outcome::Error((Status::Unauthorized, ())),
                    },
                    Err(e) => {
                        log::debug!("rejected bearer token: {}", e);
                        Outcome::Error((Status::Unauthorized, ()))
                    }
                }
            }
            _ => Outcome::Error((Status::Unauthorized, ())),
        }
    }
}

/// Bearer auth is not described in the generated docs.
impl<'a> OpenApiFromRequest<'a> for AuthGuard {
    fn from_request_input(
        _gen: &mut OpenApiGenerator,
        _name: String,
        _required: bool,
    ) -> rocket_okapi::Result<RequestHeaderInput> {
        Ok(RequestHeaderInput::None)
    }
}
