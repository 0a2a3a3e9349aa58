use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use axum::http::HeaderName;
use serde::de::DeserializeOwned;

use crate::response::AppError;
use crate::validation::validate_player_id;

pub const PLAYER_HEADER: HeaderName = HeaderName::from_static("x-user-id");

/// A wrapper around `axum::Json<T>` that returns `AppError` on deserialization failure
/// instead of Axum's default plain-text rejection.
pub struct JsonBody<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(json_rejection_to_app_error(rejection)),
        }
    }
}

fn json_rejection_to_app_error(rejection: JsonRejection) -> AppError {
    let kind = match &rejection {
        JsonRejection::JsonDataError(_) => "data",
        JsonRejection::JsonSyntaxError(_) => "syntax",
        JsonRejection::MissingJsonContentType(_) => "content-type",
        JsonRejection::BytesRejection(_) => "bytes",
        _ => "other",
    };
    tracing::warn!(kind, error = %rejection, "JSON body rejected");
    AppError::bad_request("INVALID_REQUEST_BODY", "请求体格式无效")
}

/// 当前玩家。缺少 `x-user-id` 头时为匿名玩家，不读写最高分。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player(pub Option<String>);

impl Player {
    pub fn id(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Player
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(raw) = parts.headers.get(&PLAYER_HEADER) else {
            return Ok(Player(None));
        };
        let value = raw
            .to_str()
            .map_err(|_| AppError::bad_request("INVALID_PLAYER", "玩家标识格式无效"))?
            .trim();
        if value.is_empty() {
            return Ok(Player(None));
        }
        validate_player_id(value).map_err(|msg| AppError::bad_request("INVALID_PLAYER", msg))?;
        Ok(Player(Some(value.to_string())))
    }
}
