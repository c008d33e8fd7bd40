//! User endpoints.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use api_types::user::{LoginQuery, User, UserRegister, UserUpdate};
use engine::EngineError;

use crate::{ServerError, server::ServerState};

fn user_view(user: engine::User) -> User {
    User {
        id: user.id,
        email: user.email,
        name: user.name,
        created_at: user.created_at,
        updated_at: user.updated_at,
    }
}

pub async fn register(
    State(state): State<ServerState>,
    Json(payload): Json<UserRegister>,
) -> Result<(StatusCode, Json<User>), ServerError> {
    let user = state
        .engine
        .register_user(&payload.email, &payload.name)
        .await?;
    Ok((StatusCode::CREATED, Json(user_view(user))))
}

pub async fn login(
    State(state): State<ServerState>,
    Query(query): Query<LoginQuery>,
) -> Result<Json<User>, ServerError> {
    let user = state.engine.login(&query.email).await?;
    Ok(Json(user_view(user)))
}

pub async fn list(State(state): State<ServerState>) -> Result<Json<Vec<User>>, ServerError> {
    let users = state.engine.users().await?;
    Ok(Json(users.into_iter().map(user_view).collect()))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Result<Json<User>, ServerError> {
    let user = state.engine.user(id).await?;
    Ok(Json(user_view(user)))
}

pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<UserUpdate>,
) -> Result<Json<User>, ServerError> {
    if payload.name.is_none() && payload.email.is_none() {
        return Err(EngineError::InvalidInput("nothing to update".to_string()).into());
    }
    let user = state
        .engine
        .update_user(id, payload.name.as_deref(), payload.email.as_deref())
        .await?;
    Ok(Json(user_view(user)))
}

pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
