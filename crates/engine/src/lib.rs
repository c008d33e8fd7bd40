//! Ledger and balance engine of a shared-expense tracker.
//!
//! Users form groups, record expenses paid on behalf of the group, attribute
//! each expense to members through splits and record settlements. Balances are
//! never stored: [`Engine`] loads a [`LedgerSnapshot`] for a group and derives
//! them with the pure functions in [`balances`].

pub use balances::{
    BalanceView, Balances, Direction, ExpenseRow, LedgerSnapshot, MemberBalance, MemberInclusion,
    PartialBalances, RelativeBalance, SplitMismatch, SplitRow, compute_group_balances,
    compute_user_balance, resolve_absolute, resolve_relative,
};
pub use commands::{ExpenseCmd, SettlementCmd, SplitShare, UpdateExpenseCmd};
pub use error::EngineError;
pub use expense_splits::ExpenseSplit;
pub use expenses::{Expense, ExpenseDetail};
pub use group_members::Member;
pub use groups::Group;
pub use money::{BALANCE_TOLERANCE, MAX_AMOUNT, Money};
pub use ops::{Engine, EngineBuilder, MemberRef};
pub use settlements::{GroupSettlements, NamedSettlement, Settlement};
pub use users::User;

pub mod balances;
mod commands;
mod error;
mod expense_splits;
mod expenses;
mod group_members;
mod groups;
mod money;
mod ops;
mod settlements;
mod users;
mod util;

pub type ResultEngine<T> = Result<T, EngineError>;
