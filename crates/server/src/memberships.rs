//! Group membership endpoints.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use api_types::membership::{Member, MemberNew};
use engine::{EngineError, MemberRef};

use crate::{ServerError, server::ServerState};

fn member_view(member: engine::Member) -> Member {
    Member {
        id: member.id,
        group_id: member.group_id,
        user_id: member.user_id,
        user_name: member.user_name,
        email: member.email,
        added_at: member.added_at,
    }
}

pub async fn add(
    State(state): State<ServerState>,
    Json(payload): Json<MemberNew>,
) -> Result<(StatusCode, Json<Member>), ServerError> {
    let member = match (payload.user_id, payload.email) {
        (Some(user_id), _) => MemberRef::Id(user_id),
        (None, Some(email)) => MemberRef::Email(email),
        (None, None) => {
            return Err(EngineError::InvalidInput(
                "either user_id or email is required".to_string(),
            )
            .into());
        }
    };
    let member = state.engine.add_member(payload.group_id, member).await?;
    Ok((StatusCode::CREATED, Json(member_view(member))))
}

pub async fn remove(
    State(state): State<ServerState>,
    Path((group_id, user_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ServerError> {
    state.engine.remove_member(group_id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list(
    State(state): State<ServerState>,
    Path(group_id): Path<i64>,
) -> Result<Json<Vec<Member>>, ServerError> {
    let members = state.engine.members(group_id).await?;
    Ok(Json(members.into_iter().map(member_view).collect()))
}
