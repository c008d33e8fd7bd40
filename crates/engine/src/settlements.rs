//! Settlements: recorded payments between two members of a group.
//!
//! A settlement is an append-only ledger event. It never alters the derived
//! balances, which are computed from expenses and splits only.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

use crate::Money;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settlement {
    pub id: i64,
    pub group_id: i64,
    pub from_user_id: i64,
    pub to_user_id: i64,
    pub amount: Money,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A settlement enriched with both parties' display names.
///
/// Names are `None` when the lookup for that user failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamedSettlement {
    pub settlement: Settlement,
    pub from_user_name: Option<String>,
    pub to_user_name: Option<String>,
}

/// All settlements of a group plus their total.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupSettlements {
    pub settlements: Vec<NamedSettlement>,
    pub total: Money,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "settlements")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub group_id: i64,
    pub from_user_id: i64,
    pub to_user_id: i64,
    pub amount_minor: i64,
    pub description: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::groups::Entity",
        from = "Column::GroupId",
        to = "super::groups::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Groups,
}

impl Related<super::groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Groups.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Settlement {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            group_id: model.group_id,
            from_user_id: model.from_user_id,
            to_user_id: model.to_user_id,
            amount: Money::new(model.amount_minor),
            description: model.description,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
