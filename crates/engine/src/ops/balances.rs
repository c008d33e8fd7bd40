use std::collections::{BTreeSet, HashMap};

use sea_orm::{JoinType, QueryFilter, QueryOrder, QuerySelect, prelude::*};

use crate::{
    BalanceView, Balances, ExpenseRow, LedgerSnapshot, MemberBalance, Money, PartialBalances,
    RelativeBalance, ResultEngine, SplitRow,
    balances::{compute_group_balances, compute_user_balance, resolve_absolute, resolve_relative},
    expense_splits, expenses, users,
};

use super::Engine;

impl Engine {
    /// Loads the rows a group's balances are derived from.
    ///
    /// The group check, member list, expenses and splits are read with
    /// independent statements and no wrapping transaction: a read racing a
    /// write may observe a partially-updated ledger.
    pub async fn ledger_snapshot(&self, group_id: i64) -> ResultEngine<LedgerSnapshot> {
        self.require_group(&self.database, group_id).await?;
        let member_ids = self.group_member_ids(group_id).await?;

        let expenses = expenses::Entity::find()
            .filter(expenses::Column::GroupId.eq(group_id))
            .order_by_asc(expenses::Column::Id)
            .all(&self.database)
            .await?
            .into_iter()
            .map(|m| ExpenseRow {
                id: m.id,
                paid_by: m.paid_by_id,
                amount: Money::new(m.amount_minor),
            })
            .collect();

        let splits = expense_splits::Entity::find()
            .join(JoinType::InnerJoin, expense_splits::Relation::Expenses.def())
            .filter(expenses::Column::GroupId.eq(group_id))
            .order_by_asc(expense_splits::Column::Id)
            .all(&self.database)
            .await?
            .into_iter()
            .map(|m| SplitRow {
                expense_id: m.expense_id,
                user_id: m.user_id,
                amount: Money::new(m.amount_minor),
            })
            .collect();

        let snapshot = LedgerSnapshot {
            member_ids,
            expenses,
            splits,
        };
        match snapshot.split_mismatches() {
            Ok(mismatches) => {
                for mismatch in mismatches {
                    tracing::debug!(
                        group_id,
                        expense_id = mismatch.expense_id,
                        amount = mismatch.amount.cents(),
                        split_total = mismatch.split_total.cents(),
                        "expense splits do not add up"
                    );
                }
            }
            Err(err) => tracing::warn!(group_id, "cannot check expense splits: {err}"),
        }
        Ok(snapshot)
    }

    /// Net balance of every user in the group, keyed by user id.
    pub async fn group_balances(&self, group_id: i64) -> ResultEngine<Balances> {
        let snapshot = self.ledger_snapshot(group_id).await?;
        compute_group_balances(&snapshot, self.member_inclusion)
    }

    /// Net balance of one user in the group. Membership is not required; a
    /// user without rows has balance 0.
    pub async fn user_balance(&self, user_id: i64, group_id: i64) -> ResultEngine<Money> {
        self.require_group(&self.database, group_id).await?;

        let expenses = expenses::Entity::find()
            .filter(expenses::Column::GroupId.eq(group_id))
            .filter(expenses::Column::PaidById.eq(user_id))
            .all(&self.database)
            .await?
            .into_iter()
            .map(|m| ExpenseRow {
                id: m.id,
                paid_by: m.paid_by_id,
                amount: Money::new(m.amount_minor),
            })
            .collect();
        let splits = expense_splits::Entity::find()
            .join(JoinType::InnerJoin, expense_splits::Relation::Expenses.def())
            .filter(expenses::Column::GroupId.eq(group_id))
            .filter(expense_splits::Column::UserId.eq(user_id))
            .all(&self.database)
            .await?
            .into_iter()
            .map(|m| SplitRow {
                expense_id: m.expense_id,
                user_id: m.user_id,
                amount: Money::new(m.amount_minor),
            })
            .collect();

        let snapshot = LedgerSnapshot {
            member_ids: Vec::new(),
            expenses,
            splits,
        };
        compute_user_balance(&snapshot, user_id)
    }

    /// Absolute balances with member names, ordered by user id.
    pub async fn member_balances(
        &self,
        group_id: i64,
    ) -> ResultEngine<PartialBalances<MemberBalance>> {
        let balances = self.group_balances(group_id).await?;
        let names = self.user_names(balances.keys().copied()).await;
        Ok(resolve_absolute(&balances, &names))
    }

    /// Balances as seen by `viewer_id`: who they owe and who owes them.
    pub async fn relative_balances(
        &self,
        group_id: i64,
        viewer_id: i64,
    ) -> ResultEngine<PartialBalances<RelativeBalance>> {
        let balances = self.group_balances(group_id).await?;
        let counterparties = balances.keys().copied().filter(|&id| id != viewer_id);
        let names = self.user_names(counterparties).await;
        resolve_relative(&balances, viewer_id, &names)
    }

    /// Relative view when a viewer is given, absolute view otherwise.
    ///
    /// A viewer id of `0` is treated as no viewer.
    pub async fn group_balance_view(
        &self,
        group_id: i64,
        viewer_id: Option<i64>,
    ) -> ResultEngine<BalanceView> {
        match viewer_id.filter(|&id| id != 0) {
            Some(viewer_id) => Ok(BalanceView::Relative {
                viewer_id,
                balances: self.relative_balances(group_id, viewer_id).await?,
            }),
            None => Ok(BalanceView::Absolute(self.member_balances(group_id).await?)),
        }
    }

    /// Resolves display names one user at a time.
    ///
    /// Users that cannot be loaded are left out of the map and logged.
    pub(super) async fn user_names(
        &self,
        user_ids: impl IntoIterator<Item = i64>,
    ) -> HashMap<i64, String> {
        let mut names = HashMap::new();
        for user_id in user_ids.into_iter().collect::<BTreeSet<_>>() {
            match users::Entity::find_by_id(user_id).one(&self.database).await {
                Ok(Some(user)) => {
                    names.insert(user_id, user.name);
                }
                Ok(None) => tracing::warn!(user_id, "user not found while resolving names"),
                Err(err) => {
                    tracing::warn!(user_id, error = %err, "failed to load user name")
                }
            }
        }
        names
    }
}
