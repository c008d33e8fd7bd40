//! Balance computation over a group's ledger.
//!
//! Everything here is pure: the store loads a [`LedgerSnapshot`] and the
//! functions below derive balances from it without touching the database.
//!
//! Balances follow a single sign convention:
//!
//! ```text
//! balance(user) = Σ expenses paid by user − Σ splits owed by user
//! ```
//!
//! A positive balance means the member is owed money, a negative one means the
//! member owes money. Every group's balances sum to zero as long as each
//! expense is fully split.
//!
//! # Examples
//!
//! ```rust
//! use engine::{ExpenseRow, LedgerSnapshot, MemberInclusion, Money, SplitRow, compute_group_balances};
//!
//! let snapshot = LedgerSnapshot {
//!     member_ids: vec![1, 2],
//!     expenses: vec![ExpenseRow { id: 10, paid_by: 1, amount: Money::new(100_00) }],
//!     splits: vec![
//!         SplitRow { expense_id: 10, user_id: 1, amount: Money::new(50_00) },
//!         SplitRow { expense_id: 10, user_id: 2, amount: Money::new(50_00) },
//!     ],
//! };
//! let balances = compute_group_balances(&snapshot, MemberInclusion::AllMembers)?;
//! assert_eq!(balances[&1], Money::new(50_00));
//! assert_eq!(balances[&2], Money::new(-50_00));
//! # Ok::<(), engine::EngineError>(())
//! ```

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::{EngineError, Money, ResultEngine};

fn overflow() -> EngineError {
    EngineError::InvalidAmount("balance overflow".to_string())
}

/// Net balance per user id, ordered by user id.
pub type Balances = BTreeMap<i64, Money>;

/// Which users appear in a group's balance map.
///
/// Users with ledger activity always appear, even after leaving the group, so
/// the map stays zero-sum.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberInclusion {
    /// Every current member, with 0 for members without activity.
    #[default]
    AllMembers,
    /// Only users that paid or owe at least one expense in the group.
    ActiveOnly,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExpenseRow {
    pub id: i64,
    pub paid_by: i64,
    pub amount: Money,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SplitRow {
    pub expense_id: i64,
    pub user_id: i64,
    pub amount: Money,
}

/// Immutable view of the rows a group's balances are derived from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub member_ids: Vec<i64>,
    pub expenses: Vec<ExpenseRow>,
    pub splits: Vec<SplitRow>,
}

/// An expense whose splits do not add up to its amount.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SplitMismatch {
    pub expense_id: i64,
    pub amount: Money,
    pub split_total: Money,
}

impl LedgerSnapshot {
    /// Expenses that have splits whose sum differs from the expense amount.
    ///
    /// Expenses without any split are not reported: splits are often added
    /// after the expense itself.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` if the splits of an expense overflow.
    pub fn split_mismatches(&self) -> ResultEngine<Vec<SplitMismatch>> {
        let mut totals: HashMap<i64, Money> = HashMap::new();
        for split in &self.splits {
            let total = totals.entry(split.expense_id).or_default();
            *total = total.checked_add(split.amount).ok_or_else(overflow)?;
        }
        Ok(self
            .expenses
            .iter()
            .filter_map(|expense| {
                let split_total = *totals.get(&expense.id)?;
                (split_total != expense.amount).then_some(SplitMismatch {
                    expense_id: expense.id,
                    amount: expense.amount,
                    split_total,
                })
            })
            .collect())
    }
}

/// Computes every user's net balance in the group.
///
/// # Errors
///
/// Returns `InvalidAmount` if a balance leaves the `i64` range.
pub fn compute_group_balances(
    snapshot: &LedgerSnapshot,
    inclusion: MemberInclusion,
) -> ResultEngine<Balances> {
    let mut balances = Balances::new();
    if inclusion == MemberInclusion::AllMembers {
        for &member_id in &snapshot.member_ids {
            balances.entry(member_id).or_default();
        }
    }
    for expense in &snapshot.expenses {
        let balance = balances.entry(expense.paid_by).or_default();
        *balance = balance.checked_add(expense.amount).ok_or_else(overflow)?;
    }
    for split in &snapshot.splits {
        let balance = balances.entry(split.user_id).or_default();
        *balance = balance.checked_sub(split.amount).ok_or_else(overflow)?;
    }
    Ok(balances)
}

/// Computes one user's net balance; 0 when the user has no rows.
///
/// # Errors
///
/// Returns `InvalidAmount` if the balance leaves the `i64` range.
pub fn compute_user_balance(snapshot: &LedgerSnapshot, user_id: i64) -> ResultEngine<Money> {
    let paid = Money::checked_sum(
        snapshot
            .expenses
            .iter()
            .filter(|expense| expense.paid_by == user_id)
            .map(|expense| expense.amount),
    );
    let owed = Money::checked_sum(
        snapshot
            .splits
            .iter()
            .filter(|split| split.user_id == user_id)
            .map(|split| split.amount),
    );
    paid.zip(owed)
        .and_then(|(paid, owed)| paid.checked_sub(owed))
        .ok_or_else(overflow)
}

/// How money flows between the viewer and a counterparty.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// The viewer owes the counterparty.
    YouOwe,
    /// The counterparty owes the viewer.
    OwesYou,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberBalance {
    pub user_id: i64,
    pub user_name: String,
    pub amount: Money,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelativeBalance {
    pub counterparty_id: i64,
    pub counterparty_name: String,
    /// Always non-negative; see `direction`.
    pub amount: Money,
    pub direction: Direction,
}

/// Balance entries plus the users left out because their name could not be
/// resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartialBalances<T> {
    pub entries: Vec<T>,
    pub skipped_user_ids: Vec<i64>,
}

impl<T> PartialBalances<T> {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.skipped_user_ids.is_empty()
    }
}

impl<T> Default for PartialBalances<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            skipped_user_ids: Vec::new(),
        }
    }
}

/// A group's balances as seen by an optional viewer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BalanceView {
    Absolute(PartialBalances<MemberBalance>),
    Relative {
        viewer_id: i64,
        balances: PartialBalances<RelativeBalance>,
    },
}

/// Attaches names to absolute balances, ordered by user id.
///
/// Zero balances are kept. Users missing from `names` are skipped.
#[must_use]
pub fn resolve_absolute(
    balances: &Balances,
    names: &HashMap<i64, String>,
) -> PartialBalances<MemberBalance> {
    let mut resolved = PartialBalances::default();
    for (&user_id, &amount) in balances {
        match names.get(&user_id) {
            Some(name) => resolved.entries.push(MemberBalance {
                user_id,
                user_name: name.clone(),
                amount,
            }),
            None => resolved.skipped_user_ids.push(user_id),
        }
    }
    resolved
}

/// Turns absolute balances into entries relative to `viewer_id`.
///
/// For each other user, `delta = viewer − member`: a negative delta means the
/// viewer owes that member, a positive one means the member owes the viewer.
/// Deltas within [`BALANCE_TOLERANCE`](crate::BALANCE_TOLERANCE) are dropped.
/// A viewer absent from `balances` counts as 0.
///
/// # Errors
///
/// Returns `InvalidAmount` if a delta leaves the `i64` range.
pub fn resolve_relative(
    balances: &Balances,
    viewer_id: i64,
    names: &HashMap<i64, String>,
) -> ResultEngine<PartialBalances<RelativeBalance>> {
    let viewer_balance = balances.get(&viewer_id).copied().unwrap_or_default();
    let mut resolved = PartialBalances::default();

    for (&user_id, &member_balance) in balances {
        if user_id == viewer_id {
            continue;
        }
        let delta = viewer_balance
            .checked_sub(member_balance)
            .ok_or_else(overflow)?;
        if delta.is_negligible() {
            continue;
        }
        let Some(name) = names.get(&user_id) else {
            resolved.skipped_user_ids.push(user_id);
            continue;
        };
        let direction = if delta.is_negative() {
            Direction::YouOwe
        } else {
            Direction::OwesYou
        };
        resolved.entries.push(RelativeBalance {
            counterparty_id: user_id,
            counterparty_name: name.clone(),
            amount: delta.abs(),
            direction,
        });
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: i64 = 1;
    const BOB: i64 = 2;
    const CAROL: i64 = 3;

    fn expense(id: i64, paid_by: i64, cents: i64) -> ExpenseRow {
        ExpenseRow {
            id,
            paid_by,
            amount: Money::new(cents),
        }
    }

    fn split(expense_id: i64, user_id: i64, cents: i64) -> SplitRow {
        SplitRow {
            expense_id,
            user_id,
            amount: Money::new(cents),
        }
    }

    fn names() -> HashMap<i64, String> {
        HashMap::from([
            (ALICE, "Alice".to_string()),
            (BOB, "Bob".to_string()),
            (CAROL, "Carol".to_string()),
        ])
    }

    fn dinner() -> LedgerSnapshot {
        LedgerSnapshot {
            member_ids: vec![ALICE, BOB],
            expenses: vec![expense(10, ALICE, 100_00)],
            splits: vec![split(10, ALICE, 50_00), split(10, BOB, 50_00)],
        }
    }

    fn total(balances: &Balances) -> Money {
        Money::checked_sum(balances.values().copied()).unwrap()
    }

    #[test]
    fn group_without_expenses_is_all_zero() {
        let snapshot = LedgerSnapshot {
            member_ids: vec![ALICE, BOB, CAROL],
            ..LedgerSnapshot::default()
        };
        let balances = compute_group_balances(&snapshot, MemberInclusion::AllMembers).unwrap();
        assert_eq!(balances.len(), 3);
        assert!(balances.values().all(|b| b.is_zero()));

        let active = compute_group_balances(&snapshot, MemberInclusion::ActiveOnly).unwrap();
        assert!(active.is_empty());

        let empty =
            compute_group_balances(&LedgerSnapshot::default(), MemberInclusion::AllMembers)
                .unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn payer_is_owed_the_others_shares() {
        let balances = compute_group_balances(&dinner(), MemberInclusion::AllMembers).unwrap();
        assert_eq!(balances[&ALICE], Money::new(50_00));
        assert_eq!(balances[&BOB], Money::new(-50_00));
    }

    #[test]
    fn payer_contribution_does_not_depend_on_split_count() {
        let two_way = LedgerSnapshot {
            member_ids: vec![ALICE, BOB, CAROL],
            expenses: vec![expense(10, ALICE, 90_00)],
            splits: vec![split(10, ALICE, 30_00), split(10, BOB, 60_00)],
        };
        let three_way = LedgerSnapshot {
            member_ids: vec![ALICE, BOB, CAROL],
            expenses: vec![expense(10, ALICE, 90_00)],
            splits: vec![
                split(10, ALICE, 30_00),
                split(10, BOB, 30_00),
                split(10, CAROL, 30_00),
            ],
        };
        for snapshot in [two_way, three_way] {
            let balances = compute_group_balances(&snapshot, MemberInclusion::AllMembers).unwrap();
            assert_eq!(balances[&ALICE], Money::new(90_00 - 30_00));
        }
    }

    #[test]
    fn computation_is_idempotent() {
        let snapshot = dinner();
        let first = compute_group_balances(&snapshot, MemberInclusion::AllMembers).unwrap();
        let second = compute_group_balances(&snapshot, MemberInclusion::AllMembers).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn balances_sum_to_zero() {
        let snapshot = LedgerSnapshot {
            member_ids: vec![ALICE, BOB, CAROL],
            expenses: vec![expense(10, ALICE, 100_00), expense(11, CAROL, 45_50)],
            splits: vec![
                split(10, ALICE, 33_33),
                split(10, BOB, 33_33),
                split(10, CAROL, 33_34),
                split(11, ALICE, 20_00),
                split(11, BOB, 25_50),
            ],
        };
        for inclusion in [MemberInclusion::AllMembers, MemberInclusion::ActiveOnly] {
            let balances = compute_group_balances(&snapshot, inclusion).unwrap();
            assert_eq!(total(&balances), Money::ZERO);
        }
    }

    #[test]
    fn zero_activity_member_depends_on_policy() {
        let mut snapshot = dinner();
        snapshot.member_ids.push(CAROL);

        let all = compute_group_balances(&snapshot, MemberInclusion::AllMembers).unwrap();
        assert_eq!(all.get(&CAROL), Some(&Money::ZERO));

        let active = compute_group_balances(&snapshot, MemberInclusion::ActiveOnly).unwrap();
        assert_eq!(active.get(&CAROL), None);
        assert_eq!(active.len(), 2);
    }

    #[test]
    fn former_members_with_activity_stay_in_the_map() {
        let mut snapshot = dinner();
        snapshot.member_ids = vec![ALICE];

        for inclusion in [MemberInclusion::AllMembers, MemberInclusion::ActiveOnly] {
            let balances = compute_group_balances(&snapshot, inclusion).unwrap();
            assert_eq!(balances.get(&BOB), Some(&Money::new(-50_00)));
            assert_eq!(total(&balances), Money::ZERO);
        }
    }

    #[test]
    fn user_balance_matches_group_entry() {
        let snapshot = dinner();
        let balances = compute_group_balances(&snapshot, MemberInclusion::AllMembers).unwrap();
        assert_eq!(compute_user_balance(&snapshot, ALICE).unwrap(), balances[&ALICE]);
        assert_eq!(compute_user_balance(&snapshot, BOB).unwrap(), balances[&BOB]);
        assert_eq!(compute_user_balance(&snapshot, 99).unwrap(), Money::ZERO);
    }

    #[test]
    fn viewer_sees_counterparty_from_their_side() {
        let balances = compute_group_balances(&dinner(), MemberInclusion::AllMembers).unwrap();

        let alice_view = resolve_relative(&balances, ALICE, &names()).unwrap();
        assert_eq!(
            alice_view.entries,
            vec![RelativeBalance {
                counterparty_id: BOB,
                counterparty_name: "Bob".to_string(),
                amount: Money::new(100_00),
                direction: Direction::OwesYou,
            }]
        );

        let bob_view = resolve_relative(&balances, BOB, &names()).unwrap();
        assert_eq!(
            bob_view.entries,
            vec![RelativeBalance {
                counterparty_id: ALICE,
                counterparty_name: "Alice".to_string(),
                amount: Money::new(100_00),
                direction: Direction::YouOwe,
            }]
        );
    }

    #[test]
    fn viewer_is_never_their_own_counterparty() {
        let balances = Balances::from([
            (ALICE, Money::new(30_00)),
            (BOB, Money::new(-10_00)),
            (CAROL, Money::new(-20_00)),
        ]);
        for viewer in [ALICE, BOB, CAROL] {
            let view = resolve_relative(&balances, viewer, &names()).unwrap();
            assert!(view.entries.iter().all(|e| e.counterparty_id != viewer));
            assert_eq!(view.entries.len(), 2);
        }
    }

    #[test]
    fn equal_balances_produce_no_entry() {
        let balances = Balances::from([
            (ALICE, Money::new(10_00)),
            (BOB, Money::new(10_00)),
            (CAROL, Money::new(-20_00)),
        ]);
        let view = resolve_relative(&balances, ALICE, &names()).unwrap();
        assert_eq!(view.entries.len(), 1);
        assert_eq!(view.entries[0].counterparty_id, CAROL);
        assert_eq!(view.entries[0].direction, Direction::OwesYou);
        assert_eq!(view.entries[0].amount, Money::new(30_00));
    }

    #[test]
    fn one_cent_deltas_are_dropped() {
        let balances = Balances::from([
            (ALICE, Money::new(33_34)),
            (BOB, Money::new(33_33)),
            (CAROL, Money::new(33_31)),
        ]);
        let view = resolve_relative(&balances, ALICE, &names()).unwrap();
        assert_eq!(view.entries.len(), 1);
        assert_eq!(view.entries[0].counterparty_id, CAROL);
        assert_eq!(view.entries[0].amount, Money::new(3));
    }

    #[test]
    fn unknown_viewer_counts_as_zero() {
        let balances = compute_group_balances(&dinner(), MemberInclusion::AllMembers).unwrap();
        let view = resolve_relative(&balances, 42, &names()).unwrap();
        assert_eq!(view.entries.len(), 2);
        assert_eq!(view.entries[0].counterparty_id, ALICE);
        assert_eq!(view.entries[0].direction, Direction::YouOwe);
        assert_eq!(view.entries[0].amount, Money::new(50_00));
        assert_eq!(view.entries[1].counterparty_id, BOB);
        assert_eq!(view.entries[1].direction, Direction::OwesYou);
    }

    #[test]
    fn relative_entries_are_ordered_by_counterparty() {
        let balances = Balances::from([
            (CAROL, Money::new(-5_00)),
            (ALICE, Money::new(15_00)),
            (BOB, Money::new(-10_00)),
        ]);
        let view = resolve_relative(&balances, ALICE, &names()).unwrap();
        let ids: Vec<i64> = view.entries.iter().map(|e| e.counterparty_id).collect();
        assert_eq!(ids, vec![BOB, CAROL]);
    }

    #[test]
    fn missing_names_are_reported_as_skipped() {
        let balances = compute_group_balances(&dinner(), MemberInclusion::AllMembers).unwrap();
        let mut partial_names = names();
        partial_names.remove(&BOB);

        let relative = resolve_relative(&balances, ALICE, &partial_names).unwrap();
        assert!(relative.entries.is_empty());
        assert_eq!(relative.skipped_user_ids, vec![BOB]);
        assert!(!relative.is_complete());

        let absolute = resolve_absolute(&balances, &partial_names);
        assert_eq!(absolute.entries.len(), 1);
        assert_eq!(absolute.entries[0].user_id, ALICE);
        assert_eq!(absolute.skipped_user_ids, vec![BOB]);
    }

    #[test]
    fn absolute_view_keeps_zero_balances() {
        let mut snapshot = dinner();
        snapshot.member_ids.push(CAROL);
        let balances = compute_group_balances(&snapshot, MemberInclusion::AllMembers).unwrap();
        let view = resolve_absolute(&balances, &names());
        assert!(view.is_complete());
        let amounts: Vec<(i64, Money)> = view.entries.iter().map(|e| (e.user_id, e.amount)).collect();
        assert_eq!(
            amounts,
            vec![
                (ALICE, Money::new(50_00)),
                (BOB, Money::new(-50_00)),
                (CAROL, Money::ZERO),
            ]
        );
    }

    #[test]
    fn split_mismatches_are_detected() {
        let snapshot = LedgerSnapshot {
            member_ids: vec![ALICE, BOB],
            expenses: vec![
                expense(10, ALICE, 100_00),
                expense(11, BOB, 20_00),
                expense(12, BOB, 5_00),
            ],
            splits: vec![
                split(10, ALICE, 50_00),
                split(10, BOB, 40_00),
                split(11, ALICE, 20_00),
            ],
        };
        assert_eq!(
            snapshot.split_mismatches().unwrap(),
            vec![SplitMismatch {
                expense_id: 10,
                amount: Money::new(100_00),
                split_total: Money::new(90_00),
            }]
        );
    }

    #[test]
    fn overflowing_balances_are_an_error() {
        let half = i64::MAX / 2 + 1;
        let snapshot = LedgerSnapshot {
            member_ids: vec![ALICE, BOB],
            expenses: vec![expense(10, ALICE, half), expense(11, ALICE, half)],
            splits: vec![split(10, BOB, half), split(11, BOB, half)],
        };
        let overflow = || EngineError::InvalidAmount("balance overflow".to_string());
        assert_eq!(
            compute_group_balances(&snapshot, MemberInclusion::AllMembers),
            Err(overflow())
        );
        assert_eq!(compute_user_balance(&snapshot, ALICE), Err(overflow()));
        assert_eq!(snapshot.split_mismatches().map(|m| m.len()), Ok(0));

        let balances = Balances::from([(ALICE, Money::new(i64::MAX)), (BOB, Money::new(-2))]);
        assert_eq!(resolve_relative(&balances, ALICE, &names()), Err(overflow()));
    }
}
