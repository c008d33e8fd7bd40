//! Request and response bodies of the HTTP API.
//!
//! Money fields carry integer minor units (cents) and end in `_minor`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub mod health {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Health {
        pub status: String,
    }
}

pub mod user {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserRegister {
        pub email: String,
        pub name: String,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct UserUpdate {
        pub name: Option<String>,
        pub email: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoginQuery {
        pub email: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct User {
        pub id: i64,
        pub email: String,
        pub name: String,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }
}

pub mod group {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupNew {
        pub name: String,
        pub description: Option<String>,
        pub creator_id: i64,
    }

    /// Absent fields are left untouched; an empty description clears it.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct GroupUpdate {
        pub name: Option<String>,
        pub description: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Group {
        pub id: i64,
        pub name: String,
        pub description: Option<String>,
        pub creator_id: i64,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }
}

pub mod membership {
    use super::*;

    /// Adds a member by `user_id` or by `email`; `user_id` wins when both are
    /// present.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberNew {
        pub group_id: i64,
        pub user_id: Option<i64>,
        pub email: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Member {
        pub id: i64,
        pub group_id: i64,
        pub user_id: i64,
        pub user_name: String,
        pub email: String,
        pub added_at: DateTime<Utc>,
    }
}

pub mod split {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SplitNew {
        pub expense_id: i64,
        pub user_id: i64,
        pub amount_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SplitUpdate {
        pub amount_minor: i64,
    }

    /// A share given inline when creating an expense.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct SplitShare {
        pub user_id: i64,
        pub amount_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Split {
        pub id: i64,
        pub expense_id: i64,
        pub user_id: i64,
        pub amount_minor: i64,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }
}

pub mod expense {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseNew {
        pub group_id: i64,
        pub paid_by_id: i64,
        pub amount_minor: i64,
        pub description: Option<String>,
        #[serde(default)]
        pub splits: Vec<split::SplitShare>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ExpenseUpdate {
        pub amount_minor: Option<i64>,
        pub description: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Expense {
        pub id: i64,
        pub group_id: i64,
        pub paid_by_id: i64,
        pub amount_minor: i64,
        pub description: Option<String>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseDetail {
        #[serde(flatten)]
        pub expense: Expense,
        pub paid_by_name: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseCreated {
        #[serde(flatten)]
        pub expense: Expense,
        pub splits: Vec<split::Split>,
    }
}

pub mod settlement {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettlementNew {
        pub group_id: i64,
        pub from_user_id: i64,
        pub to_user_id: i64,
        pub amount_minor: i64,
        pub description: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Settlement {
        pub id: i64,
        pub group_id: i64,
        pub from_user_id: i64,
        pub from_user_name: Option<String>,
        pub to_user_id: i64,
        pub to_user_name: Option<String>,
        pub amount_minor: i64,
        pub description: Option<String>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupSettlements {
        pub group_id: i64,
        pub settlements: Vec<Settlement>,
        pub total_minor: i64,
    }
}

/// Balance reads.
///
/// Amounts are integer cents under `amount_minor` / `balance_minor`, never
/// decimal `amount` / `balance` fields. A group's balances come back wrapped
/// in [`GroupBalances`] together with the viewer and any skipped users, not as
/// a bare array of entries.
pub mod balance {
    use super::*;

    /// Sign convention: positive means the user is owed money.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserBalance {
        pub user_id: i64,
        pub group_id: i64,
        pub balance_minor: i64,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Direction {
        YouOwe,
        OwesYou,
    }

    /// One line of a group's balances.
    ///
    /// Without a viewer, `amount_minor` is the signed absolute balance and
    /// `direction` is absent. With a viewer, `amount_minor` is non-negative and
    /// `direction` tells who owes whom.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupBalanceEntry {
        pub user_id: i64,
        pub user_name: String,
        pub amount_minor: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub direction: Option<Direction>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupBalances {
        pub group_id: i64,
        pub viewer_id: Option<i64>,
        pub balances: Vec<GroupBalanceEntry>,
        pub skipped_user_ids: Vec<i64>,
    }

    /// `?user_id=` of a group balance read. A value that is not an integer
    /// selects the absolute view, same as leaving it out.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct GroupBalanceQuery {
        #[serde(default, deserialize_with = "lenient_id")]
        pub user_id: Option<i64>,
    }

    fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.and_then(|value| value.trim().parse().ok()))
    }
}
