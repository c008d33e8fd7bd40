use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    EngineError, Member, ResultEngine, group_members, users,
    util::normalize_email,
};

use super::{Engine, with_tx};

/// Identifies the user to add to a group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MemberRef {
    Id(i64),
    Email(String),
}

impl Engine {
    /// Adds a user to a group. Fails with `ExistingKey` if already a member.
    pub async fn add_member(&self, group_id: i64, member: MemberRef) -> ResultEngine<Member> {
        let member = with_tx!(self, |db_tx| {
            self.require_group(&db_tx, group_id).await?;
            let user = match &member {
                MemberRef::Id(user_id) => self.require_user(&db_tx, *user_id).await?,
                MemberRef::Email(email) => {
                    let email = normalize_email(email)?;
                    users::Entity::find()
                        .filter(users::Column::Email.eq(email))
                        .one(&db_tx)
                        .await?
                        .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))?
                }
            };

            if self.find_membership(&db_tx, group_id, user.id).await?.is_some() {
                return Err(EngineError::ExistingKey(format!(
                    "user {} in group {group_id}",
                    user.id
                )));
            }

            let now = Utc::now();
            let membership = group_members::ActiveModel {
                id: ActiveValue::NotSet,
                group_id: ActiveValue::Set(group_id),
                user_id: ActiveValue::Set(user.id),
                added_at: ActiveValue::Set(now),
                updated_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;
            Ok(Member::from_models(membership, user))
        })?;
        tracing::info!(group_id, user_id = member.user_id, "member added");
        Ok(member)
    }

    /// Removes a membership. Ledger rows of the former member are kept.
    pub async fn remove_member(&self, group_id: i64, user_id: i64) -> ResultEngine<()> {
        let result = group_members::Entity::delete_many()
            .filter(group_members::Column::GroupId.eq(group_id))
            .filter(group_members::Column::UserId.eq(user_id))
            .exec(&self.database)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::KeyNotFound("member not exists".to_string()));
        }
        tracing::info!(group_id, user_id, "member removed");
        Ok(())
    }

    /// Lists a group's members with their name and email, ordered by user id.
    pub async fn members(&self, group_id: i64) -> ResultEngine<Vec<Member>> {
        self.require_group(&self.database, group_id).await?;
        let rows = group_members::Entity::find()
            .filter(group_members::Column::GroupId.eq(group_id))
            .find_also_related(users::Entity)
            .order_by_asc(group_members::Column::UserId)
            .all(&self.database)
            .await?;
        Ok(rows
            .into_iter()
            .filter_map(|(membership, user)| {
                user.map(|user| Member::from_models(membership, user))
            })
            .collect())
    }

    /// Current member ids of a group, ordered.
    pub async fn group_member_ids(&self, group_id: i64) -> ResultEngine<Vec<i64>> {
        let rows = group_members::Entity::find()
            .filter(group_members::Column::GroupId.eq(group_id))
            .order_by_asc(group_members::Column::UserId)
            .all(&self.database)
            .await?;
        Ok(rows.into_iter().map(|m| m.user_id).collect())
    }
}
