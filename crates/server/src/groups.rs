//! Group endpoints.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use api_types::group::{Group, GroupNew, GroupUpdate};

use crate::{ServerError, server::ServerState};

fn group_view(group: engine::Group) -> Group {
    Group {
        id: group.id,
        name: group.name,
        description: group.description,
        creator_id: group.creator_id,
        created_at: group.created_at,
        updated_at: group.updated_at,
    }
}

pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<GroupNew>,
) -> Result<(StatusCode, Json<Group>), ServerError> {
    let group = state
        .engine
        .create_group(
            &payload.name,
            payload.description.as_deref(),
            payload.creator_id,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(group_view(group))))
}

pub async fn list(State(state): State<ServerState>) -> Result<Json<Vec<Group>>, ServerError> {
    let groups = state.engine.groups().await?;
    Ok(Json(groups.into_iter().map(group_view).collect()))
}

pub async fn list_for_user(
    State(state): State<ServerState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<Group>>, ServerError> {
    let groups = state.engine.groups_for_user(user_id).await?;
    Ok(Json(groups.into_iter().map(group_view).collect()))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Result<Json<Group>, ServerError> {
    let group = state.engine.group(id).await?;
    Ok(Json(group_view(group)))
}

pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<GroupUpdate>,
) -> Result<Json<Group>, ServerError> {
    let group = state
        .engine
        .update_group(id, payload.name.as_deref(), payload.description.as_deref())
        .await?;
    Ok(Json(group_view(group)))
}

pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_group(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
