//! Expense endpoints.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use api_types::expense::{Expense, ExpenseCreated, ExpenseDetail, ExpenseNew, ExpenseUpdate};
use engine::{ExpenseCmd, Money, SplitShare, UpdateExpenseCmd};

use crate::{ServerError, server::ServerState, splits::split_view};

fn expense_view(expense: engine::Expense) -> Expense {
    Expense {
        id: expense.id,
        group_id: expense.group_id,
        paid_by_id: expense.paid_by_id,
        amount_minor: expense.amount.cents(),
        description: expense.description,
        created_at: expense.created_at,
        updated_at: expense.updated_at,
    }
}

pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<ExpenseNew>,
) -> Result<(StatusCode, Json<ExpenseCreated>), ServerError> {
    let mut cmd = ExpenseCmd::new(
        payload.group_id,
        payload.paid_by_id,
        Money::new(payload.amount_minor),
    )
    .splits(
        payload
            .splits
            .iter()
            .map(|s| SplitShare::new(s.user_id, Money::new(s.amount_minor))),
    );
    if let Some(description) = payload.description {
        cmd = cmd.description(description);
    }

    let (expense, splits) = state.engine.create_expense(cmd).await?;
    Ok((
        StatusCode::CREATED,
        Json(ExpenseCreated {
            expense: expense_view(expense),
            splits: splits.into_iter().map(split_view).collect(),
        }),
    ))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Result<Json<ExpenseDetail>, ServerError> {
    let detail = state.engine.expense(id).await?;
    Ok(Json(ExpenseDetail {
        expense: expense_view(detail.expense),
        paid_by_name: detail.paid_by_name,
    }))
}

pub async fn list_for_group(
    State(state): State<ServerState>,
    Path(group_id): Path<i64>,
) -> Result<Json<Vec<Expense>>, ServerError> {
    let expenses = state.engine.group_expenses(group_id).await?;
    Ok(Json(expenses.into_iter().map(expense_view).collect()))
}

pub async fn list_for_user(
    State(state): State<ServerState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<Expense>>, ServerError> {
    let expenses = state.engine.user_expenses(user_id).await?;
    Ok(Json(expenses.into_iter().map(expense_view).collect()))
}

pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<ExpenseUpdate>,
) -> Result<Json<Expense>, ServerError> {
    let mut cmd = UpdateExpenseCmd::default();
    if let Some(amount_minor) = payload.amount_minor {
        cmd = cmd.amount(Money::new(amount_minor));
    }
    if let Some(description) = payload.description {
        cmd = cmd.description(description);
    }
    let expense = state.engine.update_expense(id, cmd).await?;
    Ok(Json(expense_view(expense)))
}

pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_expense(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
