use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, prelude::*};

use crate::{ExpenseSplit, Money, ResultEngine, expense_splits, util::ensure_positive};

use super::Engine;

impl Engine {
    /// Attributes part of an expense to a user.
    pub async fn add_split(
        &self,
        expense_id: i64,
        user_id: i64,
        amount: Money,
    ) -> ResultEngine<ExpenseSplit> {
        ensure_positive(amount, "split")?;
        self.require_expense(&self.database, expense_id).await?;
        self.require_user(&self.database, user_id).await?;

        let now = Utc::now();
        let model = expense_splits::ActiveModel {
            id: ActiveValue::NotSet,
            expense_id: ActiveValue::Set(expense_id),
            user_id: ActiveValue::Set(user_id),
            amount_minor: ActiveValue::Set(amount.cents()),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        }
        .insert(&self.database)
        .await?;
        self.warn_on_oversplit(expense_id).await?;
        Ok(model.into())
    }

    pub async fn expense_splits(&self, expense_id: i64) -> ResultEngine<Vec<ExpenseSplit>> {
        self.require_expense(&self.database, expense_id).await?;
        let models = expense_splits::Entity::find()
            .filter(expense_splits::Column::ExpenseId.eq(expense_id))
            .order_by_asc(expense_splits::Column::Id)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    /// Splits owed by the user, across all groups.
    pub async fn user_splits(&self, user_id: i64) -> ResultEngine<Vec<ExpenseSplit>> {
        self.require_user(&self.database, user_id).await?;
        let models = expense_splits::Entity::find()
            .filter(expense_splits::Column::UserId.eq(user_id))
            .order_by_asc(expense_splits::Column::Id)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    pub async fn update_split(&self, split_id: i64, amount: Money) -> ResultEngine<ExpenseSplit> {
        ensure_positive(amount, "split")?;
        let model = self.require_split(&self.database, split_id).await?;
        let expense_id = model.expense_id;

        let mut active: expense_splits::ActiveModel = model.into();
        active.amount_minor = ActiveValue::Set(amount.cents());
        active.updated_at = ActiveValue::Set(Utc::now());
        let model = active.update(&self.database).await?;
        self.warn_on_oversplit(expense_id).await?;
        Ok(model.into())
    }

    /// Splits are added one at a time, so only a total above the expense
    /// amount is worth reporting here.
    async fn warn_on_oversplit(&self, expense_id: i64) -> ResultEngine<()> {
        let expense = self.require_expense(&self.database, expense_id).await?;
        let split_total = Money::checked_sum(
            expense_splits::Entity::find()
                .filter(expense_splits::Column::ExpenseId.eq(expense_id))
                .all(&self.database)
                .await?
                .into_iter()
                .map(|split| Money::new(split.amount_minor)),
        );
        if split_total.is_none_or(|total| total > Money::new(expense.amount_minor)) {
            tracing::warn!(
                expense_id,
                amount = expense.amount_minor,
                split_total = split_total.map(Money::cents),
                "expense splits exceed the expense amount"
            );
        }
        Ok(())
    }
}
