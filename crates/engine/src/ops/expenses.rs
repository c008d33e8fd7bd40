use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    Expense, ExpenseCmd, ExpenseDetail, ExpenseSplit, Money, ResultEngine, UpdateExpenseCmd,
    expense_splits, expenses, users,
    util::{ensure_positive, normalize_optional_text},
};

use super::{Engine, with_tx};

impl Engine {
    /// Creates an expense and its inline splits atomically.
    ///
    /// A split total that differs from the expense amount is accepted and
    /// logged.
    pub async fn create_expense(
        &self,
        cmd: ExpenseCmd,
    ) -> ResultEngine<(Expense, Vec<ExpenseSplit>)> {
        let ExpenseCmd {
            group_id,
            paid_by_id,
            amount,
            description,
            splits,
        } = cmd;
        ensure_positive(amount, "expense")?;
        for share in &splits {
            ensure_positive(share.amount, "split")?;
        }
        let description = normalize_optional_text(description.as_deref());

        let (expense, splits) = with_tx!(self, |db_tx| {
            self.require_group(&db_tx, group_id).await?;
            self.require_user(&db_tx, paid_by_id).await?;

            let now = Utc::now();
            let expense = expenses::ActiveModel {
                id: ActiveValue::NotSet,
                group_id: ActiveValue::Set(group_id),
                paid_by_id: ActiveValue::Set(paid_by_id),
                amount_minor: ActiveValue::Set(amount.cents()),
                description: ActiveValue::Set(description),
                created_at: ActiveValue::Set(now),
                updated_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;

            let mut created = Vec::with_capacity(splits.len());
            for share in &splits {
                self.require_user(&db_tx, share.user_id).await?;
                let split = expense_splits::ActiveModel {
                    id: ActiveValue::NotSet,
                    expense_id: ActiveValue::Set(expense.id),
                    user_id: ActiveValue::Set(share.user_id),
                    amount_minor: ActiveValue::Set(share.amount.cents()),
                    created_at: ActiveValue::Set(now),
                    updated_at: ActiveValue::Set(now),
                }
                .insert(&db_tx)
                .await?;
                created.push(ExpenseSplit::from(split));
            }
            Ok((Expense::from(expense), created))
        })?;

        if !splits.is_empty() {
            let split_total = Money::checked_sum(splits.iter().map(|s| s.amount));
            if split_total != Some(expense.amount) {
                tracing::warn!(
                    expense_id = expense.id,
                    amount = expense.amount.cents(),
                    split_total = split_total.map(Money::cents),
                    "expense splits do not add up to the expense amount"
                );
            }
        }
        tracing::info!(expense_id = expense.id, group_id, "expense created");
        Ok((expense, splits))
    }

    /// Returns an expense with the payer's name (`None` if the payer is gone).
    pub async fn expense(&self, expense_id: i64) -> ResultEngine<ExpenseDetail> {
        let model = self.require_expense(&self.database, expense_id).await?;
        let paid_by_name = users::Entity::find_by_id(model.paid_by_id)
            .one(&self.database)
            .await?
            .map(|user| user.name);
        Ok(ExpenseDetail {
            expense: model.into(),
            paid_by_name,
        })
    }

    pub async fn group_expenses(&self, group_id: i64) -> ResultEngine<Vec<Expense>> {
        self.require_group(&self.database, group_id).await?;
        let models = expenses::Entity::find()
            .filter(expenses::Column::GroupId.eq(group_id))
            .order_by_asc(expenses::Column::Id)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    /// Expenses paid by the user, across all groups.
    pub async fn user_expenses(&self, user_id: i64) -> ResultEngine<Vec<Expense>> {
        self.require_user(&self.database, user_id).await?;
        let models = expenses::Entity::find()
            .filter(expenses::Column::PaidById.eq(user_id))
            .order_by_asc(expenses::Column::Id)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    pub async fn update_expense(
        &self,
        expense_id: i64,
        cmd: UpdateExpenseCmd,
    ) -> ResultEngine<Expense> {
        if let Some(amount) = cmd.amount {
            ensure_positive(amount, "expense")?;
        }

        let model = self.require_expense(&self.database, expense_id).await?;
        let mut active: expenses::ActiveModel = model.into();
        if let Some(amount) = cmd.amount {
            active.amount_minor = ActiveValue::Set(amount.cents());
        }
        if let Some(description) = cmd.description.as_deref() {
            active.description = ActiveValue::Set(normalize_optional_text(Some(description)));
        }
        active.updated_at = ActiveValue::Set(Utc::now());
        let model = active.update(&self.database).await?;
        Ok(model.into())
    }

    /// Deletes an expense after removing its splits.
    pub async fn delete_expense(&self, expense_id: i64) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_expense(&db_tx, expense_id).await?;
            expense_splits::Entity::delete_many()
                .filter(expense_splits::Column::ExpenseId.eq(expense_id))
                .exec(&db_tx)
                .await?;
            expenses::Entity::delete_by_id(expense_id)
                .exec(&db_tx)
                .await?;
            Ok(())
        })?;
        tracing::info!(expense_id, "expense deleted");
        Ok(())
    }
}
