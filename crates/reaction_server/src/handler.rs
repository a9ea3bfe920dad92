//! Request handlers.
//!
//! Every handler resolves to an `ApiResponse` envelope; SQLite work runs on
//! the blocking pool with a connection opened for that request.

use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use log::error;
use reaction_core::db::open_db;
use reaction_core::{
    ApiResponse, LedgerPolicy, ReactionApi, SqliteContentRegistry, TokenTableIdentityProvider,
};
use serde::Deserialize;

type RequestApi<'c, 'p> =
    ReactionApi<'c, 'p, TokenTableIdentityProvider, SqliteContentRegistry<'c>>;

/// `ApiResponse` rendered as status code plus JSON body.
#[derive(Debug)]
pub struct ApiReply(pub ApiResponse);

impl IntoResponse for ApiReply {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status.code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.0.body)).into_response()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactRequest {
    #[serde(default)]
    pub item_id: String,
    #[serde(default)]
    pub emoji: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkReactRequest {
    #[serde(default)]
    pub item_ids: Vec<String>,
    #[serde(default)]
    pub emoji: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountsQuery {
    pub item_id: Option<String>,
}

/// Health check handler.
pub async fn health_handler() -> ApiReply {
    ApiReply(ApiResponse::health())
}

pub async fn react_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ReactRequest>, JsonRejection>,
) -> ApiReply {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejected_body(rejection),
    };
    let credential = bearer_token(&headers);
    dispatch(state, "reaction_submit", move |api| {
        api.react(credential.as_deref(), &request.item_id, &request.emoji)
    })
    .await
}

pub async fn react_bulk_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<BulkReactRequest>, JsonRejection>,
) -> ApiReply {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejected_body(rejection),
    };
    let credential = bearer_token(&headers);
    dispatch(state, "reaction_bulk_submit", move |api| {
        api.react_bulk(credential.as_deref(), &request.item_ids, &request.emoji)
    })
    .await
}

pub async fn counts_handler(
    State(state): State<AppState>,
    Query(query): Query<CountsQuery>,
) -> ApiReply {
    dispatch(state, "count_read", move |api| {
        api.counts(query.item_id.as_deref())
    })
    .await
}

pub async fn reaction_handler(
    State(state): State<AppState>,
    Path((emoji, item_id)): Path<(String, String)>,
) -> ApiReply {
    dispatch(state, "reaction_read", move |api| {
        api.reaction(&emoji, &item_id)
    })
    .await
}

/// Runs `call` against a request-scoped API on the blocking pool.
async fn dispatch<F>(state: AppState, event: &'static str, call: F) -> ApiReply
where
    F: for<'c, 'p> FnOnce(&RequestApi<'c, 'p>) -> ApiResponse + Send + 'static,
{
    let joined = tokio::task::spawn_blocking(move || {
        let conn = match open_db(state.db_path.as_path()) {
            Ok(conn) => conn,
            Err(err) => {
                error!(
                    "event={} module=http status=error error_code=db_open_failed error={}",
                    event, err
                );
                return ApiResponse::store_unavailable();
            }
        };
        let api = ReactionApi::new(
            &conn,
            state.identities.as_ref(),
            SqliteContentRegistry::new(&conn),
            LedgerPolicy::clone(&state.policy),
        );
        call(&api)
    })
    .await;

    match joined {
        Ok(response) => ApiReply(response),
        Err(err) => {
            error!(
                "event={} module=http status=error error_code=worker_failed error={}",
                event, err
            );
            ApiReply(ApiResponse::store_unavailable())
        }
    }
}

fn rejected_body(rejection: JsonRejection) -> ApiReply {
    ApiReply(ApiResponse::bad_request(rejection.body_text()))
}

/// Extracts the credential of an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    scheme
        .eq_ignore_ascii_case("bearer")
        .then(|| token.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_requires_bearer_scheme() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("bearer  abc "));
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);
    }

    #[tokio::test]
    async fn reply_uses_envelope_status() {
        let response = ApiReply(ApiResponse::bad_request("nope")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
