//! Command structs for engine write operations.
//!
//! These types group parameters for expense, split and settlement creation,
//! keeping call sites readable and avoiding long argument lists.

use crate::Money;

/// One member's share of an expense, created together with the expense.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SplitShare {
    pub user_id: i64,
    pub amount: Money,
}

impl SplitShare {
    #[must_use]
    pub fn new(user_id: i64, amount: Money) -> Self {
        Self { user_id, amount }
    }
}

/// Create an expense, optionally with its splits.
#[derive(Clone, Debug)]
pub struct ExpenseCmd {
    pub group_id: i64,
    pub paid_by_id: i64,
    pub amount: Money,
    pub description: Option<String>,
    pub splits: Vec<SplitShare>,
}

impl ExpenseCmd {
    #[must_use]
    pub fn new(group_id: i64, paid_by_id: i64, amount: Money) -> Self {
        Self {
            group_id,
            paid_by_id,
            amount,
            description: None,
            splits: Vec::new(),
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn split(mut self, user_id: i64, amount: Money) -> Self {
        self.splits.push(SplitShare::new(user_id, amount));
        self
    }

    #[must_use]
    pub fn splits(mut self, splits: impl IntoIterator<Item = SplitShare>) -> Self {
        self.splits.extend(splits);
        self
    }
}

/// Update an existing expense. `None` fields are left untouched.
#[derive(Clone, Debug, Default)]
pub struct UpdateExpenseCmd {
    pub amount: Option<Money>,
    pub description: Option<String>,
}

impl UpdateExpenseCmd {
    #[must_use]
    pub fn amount(mut self, amount: Money) -> Self {
        self.amount = Some(amount);
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Record a payment from one member to another.
#[derive(Clone, Debug)]
pub struct SettlementCmd {
    pub group_id: i64,
    pub from_user_id: i64,
    pub to_user_id: i64,
    pub amount: Money,
    pub description: Option<String>,
}

impl SettlementCmd {
    #[must_use]
    pub fn new(group_id: i64, from_user_id: i64, to_user_id: i64, amount: Money) -> Self {
        Self {
            group_id,
            from_user_id,
            to_user_id,
            amount,
            description: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
