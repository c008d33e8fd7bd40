//! Balance endpoints.
//!
//! Balances are derived on every request; nothing here writes.

use axum::{
    Json,
    extract::{Path, Query, State},
};

use api_types::balance::{Direction, GroupBalanceEntry, GroupBalanceQuery, GroupBalances, UserBalance};
use engine::{BalanceView, MemberBalance, RelativeBalance};

use crate::{ServerError, server::ServerState};

fn absolute_entry(balance: MemberBalance) -> GroupBalanceEntry {
    GroupBalanceEntry {
        user_id: balance.user_id,
        user_name: balance.user_name,
        amount_minor: balance.amount.cents(),
        direction: None,
    }
}

fn relative_entry(balance: RelativeBalance) -> GroupBalanceEntry {
    GroupBalanceEntry {
        user_id: balance.counterparty_id,
        user_name: balance.counterparty_name,
        amount_minor: balance.amount.cents(),
        direction: Some(match balance.direction {
            engine::Direction::YouOwe => Direction::YouOwe,
            engine::Direction::OwesYou => Direction::OwesYou,
        }),
    }
}

pub async fn user_balance(
    State(state): State<ServerState>,
    Path((user_id, group_id)): Path<(i64, i64)>,
) -> Result<Json<UserBalance>, ServerError> {
    let balance = state.engine.user_balance(user_id, group_id).await?;
    Ok(Json(UserBalance {
        user_id,
        group_id,
        balance_minor: balance.cents(),
    }))
}

/// `GET /api/balance/group/{group_id}[?user_id=]`
pub async fn group_balances(
    State(state): State<ServerState>,
    Path(group_id): Path<i64>,
    Query(query): Query<GroupBalanceQuery>,
) -> Result<Json<GroupBalances>, ServerError> {
    let view = state
        .engine
        .group_balance_view(group_id, query.user_id)
        .await?;
    let response = match view {
        BalanceView::Absolute(partial) => GroupBalances {
            group_id,
            viewer_id: None,
            balances: partial.entries.into_iter().map(absolute_entry).collect(),
            skipped_user_ids: partial.skipped_user_ids,
        },
        BalanceView::Relative {
            viewer_id,
            balances,
        } => GroupBalances {
            group_id,
            viewer_id: Some(viewer_id),
            balances: balances.entries.into_iter().map(relative_entry).collect(),
            skipped_user_ids: balances.skipped_user_ids,
        },
    };
    Ok(Json(response))
}
