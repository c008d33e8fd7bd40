//! Expense split endpoints.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use api_types::split::{Split, SplitNew, SplitUpdate};
use engine::Money;

use crate::{ServerError, server::ServerState};

pub(crate) fn split_view(split: engine::ExpenseSplit) -> Split {
    Split {
        id: split.id,
        expense_id: split.expense_id,
        user_id: split.user_id,
        amount_minor: split.amount.cents(),
        created_at: split.created_at,
        updated_at: split.updated_at,
    }
}

pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<SplitNew>,
) -> Result<(StatusCode, Json<Split>), ServerError> {
    let split = state
        .engine
        .add_split(
            payload.expense_id,
            payload.user_id,
            Money::new(payload.amount_minor),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(split_view(split))))
}

pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<SplitUpdate>,
) -> Result<Json<Split>, ServerError> {
    let split = state
        .engine
        .update_split(id, Money::new(payload.amount_minor))
        .await?;
    Ok(Json(split_view(split)))
}

pub async fn list_for_expense(
    State(state): State<ServerState>,
    Path(expense_id): Path<i64>,
) -> Result<Json<Vec<Split>>, ServerError> {
    let splits = state.engine.expense_splits(expense_id).await?;
    Ok(Json(splits.into_iter().map(split_view).collect()))
}

pub async fn list_for_user(
    State(state): State<ServerState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<Split>>, ServerError> {
    let splits = state.engine.user_splits(user_id).await?;
    Ok(Json(splits.into_iter().map(split_view).collect()))
}
