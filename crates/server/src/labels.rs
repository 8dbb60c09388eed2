//! Pay methods and categories endpoints.
//!
//! Both collections share the same handlers; the collection is carried as
//! an `Extension<LabelKind>` on its routes.

use api_types::{
    common::Oid,
    label::{LabelNew, LabelQuery, LabelUpdate, LabelView},
};
use axum::{
    Extension, Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    routing::get,
};
use engine::{Label, LabelKind};

use crate::{ServerError, label_path_id, server::ServerState};

pub(crate) fn label_view(label: Label) -> LabelView {
    LabelView {
        id: Oid::new(label.id.to_string()),
        name: label.name,
        active: label.active,
        instances: label.instances,
    }
}

pub(crate) fn routes(kind: LabelKind) -> Router<ServerState> {
    let collection = format!("/{}/", kind.collection());
    Router::new()
        .route(&collection, get(list).post(create))
        .route(
            &format!("{collection}{{id}}"),
            get(one).put(update).delete(remove),
        )
        .layer(Extension(kind))
}

async fn list(
    Extension(kind): Extension<LabelKind>,
    State(state): State<ServerState>,
    query: Result<Query<LabelQuery>, QueryRejection>,
) -> Result<Json<Vec<LabelView>>, ServerError> {
    let Query(query) = query?;
    let labels = state
        .engine
        .list_labels(kind, query.limit)
        .await?
        .into_iter()
        .map(label_view)
        .collect();
    Ok(Json(labels))
}

async fn one(
    Extension(kind): Extension<LabelKind>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<LabelView>, ServerError> {
    let id = label_path_id(&id, kind)?;
    let label = state.engine.label(kind, id).await?;
    Ok(Json(label_view(label)))
}

async fn create(
    Extension(kind): Extension<LabelKind>,
    State(state): State<ServerState>,
    payload: Result<Json<LabelNew>, JsonRejection>,
) -> Result<(StatusCode, Json<LabelView>), ServerError> {
    let Json(payload) = payload?;
    let label = state
        .engine
        .create_label(kind, &payload.name, payload.active.unwrap_or(true))
        .await?;
    Ok((StatusCode::CREATED, Json(label_view(label))))
}

async fn update(
    Extension(kind): Extension<LabelKind>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
    payload: Result<Json<LabelUpdate>, JsonRejection>,
) -> Result<Json<LabelView>, ServerError> {
    let id = label_path_id(&id, kind)?;
    let Json(payload) = payload?;
    let label = state
        .engine
        .update_label(kind, id, payload.name.as_deref(), payload.active)
        .await?;
    Ok(Json(label_view(label)))
}

async fn remove(
    Extension(kind): Extension<LabelKind>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServerError> {
    let id = label_path_id(&id, kind)?;
    state.engine.delete_label(kind, id).await?;
    Ok(StatusCode::OK)
}
