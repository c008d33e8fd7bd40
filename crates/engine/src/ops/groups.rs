use chrono::Utc;
use sea_orm::{
    ActiveValue, Condition, ConnectionTrait, JoinType, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait, prelude::*, sea_query::Query,
};

use crate::{
    Group, ResultEngine, expense_splits, expenses, group_members, groups, settlements,
    util::{normalize_optional_text, normalize_required},
};

use super::{Engine, with_tx};

impl Engine {
    /// Creates a group; the creator becomes its first member.
    pub async fn create_group(
        &self,
        name: &str,
        description: Option<&str>,
        creator_id: i64,
    ) -> ResultEngine<Group> {
        let name = normalize_required(name, "group name")?;
        let description = normalize_optional_text(description);

        let group = with_tx!(self, |db_tx| {
            self.require_user(&db_tx, creator_id).await?;

            let now = Utc::now();
            let group = groups::ActiveModel {
                id: ActiveValue::NotSet,
                name: ActiveValue::Set(name),
                description: ActiveValue::Set(description),
                creator_id: ActiveValue::Set(creator_id),
                created_at: ActiveValue::Set(now),
                updated_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;

            group_members::ActiveModel {
                id: ActiveValue::NotSet,
                group_id: ActiveValue::Set(group.id),
                user_id: ActiveValue::Set(creator_id),
                added_at: ActiveValue::Set(now),
                updated_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;

            Ok(Group::from(group))
        })?;
        tracing::info!(group_id = group.id, creator_id, "group created");
        Ok(group)
    }

    pub async fn group(&self, group_id: i64) -> ResultEngine<Group> {
        self.require_group(&self.database, group_id)
            .await
            .map(Into::into)
    }

    pub async fn groups(&self) -> ResultEngine<Vec<Group>> {
        let models = groups::Entity::find()
            .order_by_asc(groups::Column::Id)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    /// Groups the user is currently a member of.
    pub async fn groups_for_user(&self, user_id: i64) -> ResultEngine<Vec<Group>> {
        self.require_user(&self.database, user_id).await?;
        let models = groups::Entity::find()
            .join(JoinType::InnerJoin, groups::Relation::GroupMembers.def())
            .filter(group_members::Column::UserId.eq(user_id))
            .order_by_asc(groups::Column::Id)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    /// Updates name and/or description. A blank description clears it.
    pub async fn update_group(
        &self,
        group_id: i64,
        name: Option<&str>,
        description: Option<&str>,
    ) -> ResultEngine<Group> {
        let name = name
            .map(|n| normalize_required(n, "group name"))
            .transpose()?;

        let model = self.require_group(&self.database, group_id).await?;
        let mut active: groups::ActiveModel = model.into();
        if let Some(name) = name {
            active.name = ActiveValue::Set(name);
        }
        if description.is_some() {
            active.description = ActiveValue::Set(normalize_optional_text(description));
        }
        active.updated_at = ActiveValue::Set(Utc::now());
        let model = active.update(&self.database).await?;
        Ok(model.into())
    }

    /// Deletes a group and everything recorded in it.
    pub async fn delete_group(&self, group_id: i64) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_group(&db_tx, group_id).await?;
            self.purge_group_rows(&db_tx, group_id).await?;
            Ok(())
        })?;
        tracing::info!(group_id, "group deleted");
        Ok(())
    }

    /// Removes a group and all of its dependent rows, splits first.
    pub(super) async fn purge_group_rows<C: ConnectionTrait>(
        &self,
        db: &C,
        group_id: i64,
    ) -> ResultEngine<()> {
        expense_splits::Entity::delete_many()
            .filter(
                expense_splits::Column::ExpenseId.in_subquery(
                    Query::select()
                        .column(expenses::Column::Id)
                        .from(expenses::Entity)
                        .and_where(expenses::Column::GroupId.eq(group_id))
                        .to_owned(),
                ),
            )
            .exec(db)
            .await?;
        expenses::Entity::delete_many()
            .filter(expenses::Column::GroupId.eq(group_id))
            .exec(db)
            .await?;
        settlements::Entity::delete_many()
            .filter(settlements::Column::GroupId.eq(group_id))
            .exec(db)
            .await?;
        group_members::Entity::delete_many()
            .filter(group_members::Column::GroupId.eq(group_id))
            .exec(db)
            .await?;
        groups::Entity::delete_by_id(group_id).exec(db).await?;
        Ok(())
    }

    /// Removes every row owned by or referencing a user, including the groups
    /// the user created.
    pub(super) async fn purge_user_rows<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: i64,
    ) -> ResultEngine<()> {
        let created = groups::Entity::find()
            .filter(groups::Column::CreatorId.eq(user_id))
            .all(db)
            .await?;
        for group in created {
            self.purge_group_rows(db, group.id).await?;
        }

        expense_splits::Entity::delete_many()
            .filter(
                Condition::any()
                    .add(expense_splits::Column::UserId.eq(user_id))
                    .add(
                        expense_splits::Column::ExpenseId.in_subquery(
                            Query::select()
                                .column(expenses::Column::Id)
                                .from(expenses::Entity)
                                .and_where(expenses::Column::PaidById.eq(user_id))
                                .to_owned(),
                        ),
                    ),
            )
            .exec(db)
            .await?;
        expenses::Entity::delete_many()
            .filter(expenses::Column::PaidById.eq(user_id))
            .exec(db)
            .await?;
        settlements::Entity::delete_many()
            .filter(
                Condition::any()
                    .add(settlements::Column::FromUserId.eq(user_id))
                    .add(settlements::Column::ToUserId.eq(user_id)),
            )
            .exec(db)
            .await?;
        group_members::Entity::delete_many()
            .filter(group_members::Column::UserId.eq(user_id))
            .exec(db)
            .await?;
        Ok(())
    }
}
