use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{ActiveValue, Condition, QueryFilter, QueryOrder, prelude::*};

use crate::{
    EngineError, GroupSettlements, Money, NamedSettlement, ResultEngine, Settlement, SettlementCmd,
    settlements,
    util::{ensure_positive, normalize_optional_text},
};

use super::Engine;

impl Engine {
    /// Records a payment between two users of a group.
    ///
    /// Settlements are stored as-is and do not feed into balance
    /// computation.
    pub async fn record_settlement(&self, cmd: SettlementCmd) -> ResultEngine<Settlement> {
        let SettlementCmd {
            group_id,
            from_user_id,
            to_user_id,
            amount,
            description,
        } = cmd;
        ensure_positive(amount, "settlement")?;
        if from_user_id == to_user_id {
            return Err(EngineError::InvalidInput(
                "settlement payer and payee must differ".to_string(),
            ));
        }
        self.require_group(&self.database, group_id).await?;
        self.require_user(&self.database, from_user_id).await?;
        self.require_user(&self.database, to_user_id).await?;

        let now = Utc::now();
        let model = settlements::ActiveModel {
            id: ActiveValue::NotSet,
            group_id: ActiveValue::Set(group_id),
            from_user_id: ActiveValue::Set(from_user_id),
            to_user_id: ActiveValue::Set(to_user_id),
            amount_minor: ActiveValue::Set(amount.cents()),
            description: ActiveValue::Set(normalize_optional_text(description.as_deref())),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        }
        .insert(&self.database)
        .await?;
        tracing::info!(
            settlement_id = model.id,
            group_id,
            from_user_id,
            to_user_id,
            "settlement recorded"
        );
        Ok(model.into())
    }

    pub async fn settlement(&self, settlement_id: i64) -> ResultEngine<NamedSettlement> {
        let model = self.require_settlement(&self.database, settlement_id).await?;
        let mut named = self.name_settlements(vec![model]).await;
        named
            .pop()
            .ok_or_else(|| EngineError::KeyNotFound("settlement not exists".to_string()))
    }

    /// Settlements of a group, oldest first, with their total.
    pub async fn group_settlements(&self, group_id: i64) -> ResultEngine<GroupSettlements> {
        self.require_group(&self.database, group_id).await?;
        let models = settlements::Entity::find()
            .filter(settlements::Column::GroupId.eq(group_id))
            .order_by_asc(settlements::Column::Id)
            .all(&self.database)
            .await?;
        let total = Money::checked_sum(models.iter().map(|m| Money::new(m.amount_minor)))
            .ok_or_else(|| EngineError::InvalidAmount("settlement total overflow".to_string()))?;
        Ok(GroupSettlements {
            settlements: self.name_settlements(models).await,
            total,
        })
    }

    /// Settlements where the user paid or was paid.
    pub async fn user_settlements(&self, user_id: i64) -> ResultEngine<Vec<NamedSettlement>> {
        self.require_user(&self.database, user_id).await?;
        let models = settlements::Entity::find()
            .filter(
                Condition::any()
                    .add(settlements::Column::FromUserId.eq(user_id))
                    .add(settlements::Column::ToUserId.eq(user_id)),
            )
            .order_by_asc(settlements::Column::Id)
            .all(&self.database)
            .await?;
        Ok(self.name_settlements(models).await)
    }

    pub async fn settlements(&self) -> ResultEngine<Vec<NamedSettlement>> {
        let models = settlements::Entity::find()
            .order_by_asc(settlements::Column::Id)
            .all(&self.database)
            .await?;
        Ok(self.name_settlements(models).await)
    }

    async fn name_settlements(&self, models: Vec<settlements::Model>) -> Vec<NamedSettlement> {
        let ids = models
            .iter()
            .flat_map(|m| [m.from_user_id, m.to_user_id]);
        let names: HashMap<i64, String> = self.user_names(ids).await;
        models
            .into_iter()
            .map(|model| NamedSettlement {
                from_user_name: names.get(&model.from_user_id).cloned(),
                to_user_name: names.get(&model.to_user_id).cloned(),
                settlement: model.into(),
            })
            .collect()
    }
}
