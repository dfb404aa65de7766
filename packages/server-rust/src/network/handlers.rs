//! HTTP request handlers.
//!
//! A thin collaborator over the storage core: each handler decodes its
//! request, takes the series lock, invokes the store, and wraps the
//! outcome in a [`JSend`] envelope. Malformed requests and preconditions
//! come back as `fail`; engine failures come back as `error`.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use pointdb_core::{Error, Point, PointId, Query};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::jsend::JSend;
use super::AppState;
use crate::series::Series;
use crate::storage::{Buffered, MemList, MemTree};

/// How many points each cursor fetch pulls while draining a query.
const FETCH_BATCH: usize = 256;

type Reply = (StatusCode, Json<JSend>);

fn internal_error(err: impl std::fmt::Display) -> Reply {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(JSend::error(err.to_string())))
}

fn not_found(err: &Error) -> Reply {
    (StatusCode::NOT_FOUND, Json(JSend::fail(json!({"series": err.to_string()}))))
}

fn bad_request(detail: serde_json::Value) -> Reply {
    (StatusCode::BAD_REQUEST, Json(JSend::fail(detail)))
}

/// Liveness check.
pub async fn ping_handler() -> Json<JSend> {
    Json(JSend::success(json!({"message": "pong"})))
}

/// Body of `POST /series`.
#[derive(Debug, Deserialize)]
pub struct SeriesCreateRequest {
    /// Identifier of the series to create.
    pub id: String,
}

/// Creates a new series backed by the default two-tier store.
pub async fn series_create_handler(
    State(state): State<AppState>,
    payload: Result<Json<SeriesCreateRequest>, JsonRejection>,
) -> Reply {
    let Json(req) = match payload {
        Ok(p) => p,
        Err(rej) => return bad_request(json!({"body": rej.body_text()})),
    };
    if req.id.is_empty() {
        return bad_request(json!({"id": "must not be empty"}));
    }

    let store = Buffered::new(Box::new(MemTree::new()), Box::new(MemList::new()))
        .with_retention(state.retention);
    match state.registry.add(Series::new(&req.id, Box::new(store))) {
        Ok(()) => {
            info!(series = req.id.as_str(), "series created");
            (
                StatusCode::CREATED,
                Json(JSend::success(json!({"series": {"id": req.id}}))),
            )
        }
        Err(err @ Error::Conflict(_)) => {
            (StatusCode::CONFLICT, Json(JSend::fail(json!({"id": err.to_string()}))))
        }
        Err(err) => internal_error(err),
    }
}

/// Body of `POST /series/{id}/points`: one point or a batch.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PointsAddRequest {
    /// A single point.
    One(Point),
    /// A batch of points.
    Many(Vec<Point>),
}

/// Ingests points into a series, assigning ids where absent.
pub async fn points_add_handler(
    State(state): State<AppState>,
    Path(series_id): Path<String>,
    payload: Result<Json<PointsAddRequest>, JsonRejection>,
) -> Reply {
    let Json(req) = match payload {
        Ok(p) => p,
        Err(rej) => return bad_request(json!({"body": rej.body_text()})),
    };
    let mut points = match req {
        PointsAddRequest::One(p) => vec![p],
        PointsAddRequest::Many(ps) => ps,
    };
    if points.is_empty() {
        return bad_request(json!({"points": "must not be empty"}));
    }
    for p in &mut points {
        if p.id.is_none() {
            p.id = Some(PointId::random());
        }
    }

    let series = match state.registry.get(&series_id) {
        Ok(s) => s,
        Err(err) => return not_found(&err),
    };

    let data = match serde_json::to_value(&points) {
        Ok(v) => v,
        Err(err) => return internal_error(err),
    };
    let count = points.len();
    if let Err(err) = series.io().add(points) {
        return internal_error(err);
    }
    info!(series = series_id.as_str(), count, "points added");
    (
        StatusCode::CREATED,
        Json(JSend::success(json!({"points": data, "count": count}))),
    )
}

/// Body of `POST /series/{id}/query`: a query plus an optional cap on the
/// number of returned points.
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    /// The time window and filter.
    #[serde(flatten)]
    pub query: Query,
    /// Maximum number of points to return; unlimited when absent.
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Runs a range query and drains its cursor into one response.
pub async fn points_query_handler(
    State(state): State<AppState>,
    Path(series_id): Path<String>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Reply {
    let Json(req) = match payload {
        Ok(p) => p,
        Err(rej) => return bad_request(json!({"body": rej.body_text()})),
    };

    let series = match state.registry.get(&series_id) {
        Ok(s) => s,
        Err(err) => return not_found(&err),
    };

    let io = series.io();
    let mut cursor = match io.search(&req.query) {
        Ok(c) => c,
        Err(err) => return internal_error(err),
    };

    let mut points = Vec::new();
    loop {
        let batch = match cursor.fetch(FETCH_BATCH) {
            Ok(b) => b,
            Err(err) => return internal_error(err),
        };
        if batch.is_empty() {
            break;
        }
        points.extend(batch);
        if let Some(limit) = req.limit {
            if points.len() >= limit {
                points.truncate(limit);
                break;
            }
        }
    }

    match serde_json::to_value(&points) {
        Ok(data) => (
            StatusCode::OK,
            Json(JSend::success(json!({"points": data, "count": points.len()}))),
        ),
        Err(err) => internal_error(err),
    }
}
