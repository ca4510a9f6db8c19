use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::Router;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::engine::lifecycle;
use crate::error::AppError;
use crate::models::location::Location;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/order", post(place_order))
        .route("/order/:id", put(take_order))
        .route("/orders", get(list_orders))
}

#[derive(Deserialize)]
pub struct TakeOrderRequest {
    pub status: String,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

#[derive(Deserialize)]
pub struct ListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
}

async fn place_order(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, AppError> {
    let location: Location = decode_body(body)?;
    let view = lifecycle::place_order(&state, location).await?;
    json_ok(&view)
}

async fn take_order(
    State(state): State<Arc<AppState>>,
    path: Result<Path<String>, PathRejection>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, AppError> {
    let Path(raw_id) = path.map_err(|err| AppError::BadRequest(err.body_text()))?;
    let request: TakeOrderRequest = decode_body(body)?;
    let id = parse_int("id", Some(&raw_id))?;

    lifecycle::claim_order(&state, id, &request.status).await?;
    json_ok(&StatusResponse { status: "SUCCESS" })
}

async fn list_orders(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListParams>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(params) = query.map_err(|err| AppError::BadRequest(err.body_text()))?;
    let page = parse_int("page", params.page.as_deref())?;
    let limit = parse_int("limit", params.limit.as_deref())?;

    let views = lifecycle::list_orders(&state, page, limit).await?;
    json_ok(&views)
}

fn decode_body<T: DeserializeOwned>(body: Result<Bytes, BytesRejection>) -> Result<T, AppError> {
    let bytes = body.map_err(|err| AppError::BadRequest(err.body_text()))?;
    serde_json::from_slice(&bytes).map_err(|err| AppError::BadRequest(format!("invalid body: {err}")))
}

fn parse_int(name: &str, raw: Option<&str>) -> Result<i64, AppError> {
    let raw = raw.ok_or_else(|| AppError::BadRequest(format!("missing {name}")))?;
    raw.parse::<i64>()
        .map_err(|err| AppError::BadRequest(format!("invalid {name} {raw:?}: {err}")))
}

// Encoded by hand so an encoding failure maps to the JSON marshalling error body.
fn json_ok<T: Serialize>(value: &T) -> Result<Response, AppError> {
    let body = serde_json::to_vec(value)?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response())
}
