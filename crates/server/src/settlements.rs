//! Settlement endpoints.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use api_types::settlement::{GroupSettlements, Settlement, SettlementNew};
use engine::{Money, NamedSettlement, SettlementCmd};

use crate::{ServerError, server::ServerState};

fn settlement_view(named: NamedSettlement) -> Settlement {
    let NamedSettlement {
        settlement,
        from_user_name,
        to_user_name,
    } = named;
    Settlement {
        id: settlement.id,
        group_id: settlement.group_id,
        from_user_id: settlement.from_user_id,
        from_user_name,
        to_user_id: settlement.to_user_id,
        to_user_name,
        amount_minor: settlement.amount.cents(),
        description: settlement.description,
        created_at: settlement.created_at,
    }
}

pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<SettlementNew>,
) -> Result<(StatusCode, Json<Settlement>), ServerError> {
    let mut cmd = SettlementCmd::new(
        payload.group_id,
        payload.from_user_id,
        payload.to_user_id,
        Money::new(payload.amount_minor),
    );
    if let Some(description) = payload.description {
        cmd = cmd.description(description);
    }
    let settlement = state.engine.record_settlement(cmd).await?;
    let named = state.engine.settlement(settlement.id).await?;
    Ok((StatusCode::CREATED, Json(settlement_view(named))))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Result<Json<Settlement>, ServerError> {
    let named = state.engine.settlement(id).await?;
    Ok(Json(settlement_view(named)))
}

pub async fn list(State(state): State<ServerState>) -> Result<Json<Vec<Settlement>>, ServerError> {
    let settlements = state.engine.settlements().await?;
    Ok(Json(settlements.into_iter().map(settlement_view).collect()))
}

pub async fn list_for_group(
    State(state): State<ServerState>,
    Path(group_id): Path<i64>,
) -> Result<Json<GroupSettlements>, ServerError> {
    let group = state.engine.group_settlements(group_id).await?;
    Ok(Json(GroupSettlements {
        group_id,
        settlements: group.settlements.into_iter().map(settlement_view).collect(),
        total_minor: group.total.cents(),
    }))
}

pub async fn list_for_user(
    State(state): State<ServerState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<Settlement>>, ServerError> {
    let settlements = state.engine.user_settlements(user_id).await?;
    Ok(Json(settlements.into_iter().map(settlement_view).collect()))
}
