use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    BalanceView, Direction, Engine, EngineError, ExpenseCmd, MAX_AMOUNT, MemberInclusion,
    MemberRef, Money, SettlementCmd, UpdateExpenseCmd,
};
use migration::MigratorTrait;

async fn engine_with_db(inclusion: MemberInclusion) -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .member_inclusion(inclusion)
        .build()
        .await
        .unwrap();
    (engine, db)
}

struct Trip {
    group_id: i64,
    alice: i64,
    bob: i64,
}

/// Alice and Bob share a group; Alice paid a 100.00 dinner split 50/50.
async fn dinner(engine: &Engine) -> Trip {
    let alice = engine.register_user("alice@example.com", "Alice").await.unwrap();
    let bob = engine.register_user("bob@example.com", "Bob").await.unwrap();
    let group = engine.create_group("Trip", None, alice.id).await.unwrap();
    engine
        .add_member(group.id, MemberRef::Id(bob.id))
        .await
        .unwrap();
    engine
        .create_expense(
            ExpenseCmd::new(group.id, alice.id, Money::new(100_00))
                .description("dinner")
                .split(alice.id, Money::new(50_00))
                .split(bob.id, Money::new(50_00)),
        )
        .await
        .unwrap();
    Trip {
        group_id: group.id,
        alice: alice.id,
        bob: bob.id,
    }
}

#[tokio::test]
async fn builder_requires_a_database() {
    let err = Engine::builder().build().await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));
}

#[tokio::test]
async fn new_group_has_zero_balances() {
    let (engine, _db) = engine_with_db(MemberInclusion::AllMembers).await;
    let alice = engine.register_user("alice@example.com", "Alice").await.unwrap();
    let group = engine.create_group("Flat", Some("rent"), alice.id).await.unwrap();

    let balances = engine.group_balances(group.id).await.unwrap();
    assert_eq!(balances.len(), 1);
    assert_eq!(balances[&alice.id], Money::ZERO);
}

#[tokio::test]
async fn payer_is_owed_and_viewers_see_their_side() {
    let (engine, _db) = engine_with_db(MemberInclusion::AllMembers).await;
    let trip = dinner(&engine).await;

    let balances = engine.group_balances(trip.group_id).await.unwrap();
    assert_eq!(balances[&trip.alice], Money::new(50_00));
    assert_eq!(balances[&trip.bob], Money::new(-50_00));

    let alice_view = engine
        .relative_balances(trip.group_id, trip.alice)
        .await
        .unwrap();
    assert!(alice_view.is_complete());
    assert_eq!(alice_view.entries.len(), 1);
    assert_eq!(alice_view.entries[0].counterparty_id, trip.bob);
    assert_eq!(alice_view.entries[0].counterparty_name, "Bob");
    assert_eq!(alice_view.entries[0].amount, Money::new(100_00));
    assert_eq!(alice_view.entries[0].direction, Direction::OwesYou);

    let bob_view = engine
        .relative_balances(trip.group_id, trip.bob)
        .await
        .unwrap();
    assert_eq!(bob_view.entries.len(), 1);
    assert_eq!(bob_view.entries[0].counterparty_id, trip.alice);
    assert_eq!(bob_view.entries[0].direction, Direction::YouOwe);
    assert_eq!(bob_view.entries[0].amount, Money::new(100_00));
}

#[tokio::test]
async fn balances_are_idempotent() {
    let (engine, _db) = engine_with_db(MemberInclusion::AllMembers).await;
    let trip = dinner(&engine).await;

    let first = engine.group_balances(trip.group_id).await.unwrap();
    let second = engine.group_balances(trip.group_id).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(Money::checked_sum(first.values().copied()), Some(Money::ZERO));
}

#[tokio::test]
async fn settlements_do_not_change_balances() {
    let (engine, _db) = engine_with_db(MemberInclusion::AllMembers).await;
    let trip = dinner(&engine).await;
    let before = engine.group_balances(trip.group_id).await.unwrap();

    let settlement = engine
        .record_settlement(
            SettlementCmd::new(trip.group_id, trip.bob, trip.alice, Money::new(30_00))
                .description("cash"),
        )
        .await
        .unwrap();
    assert_eq!(settlement.amount, Money::new(30_00));

    let after = engine.group_balances(trip.group_id).await.unwrap();
    assert_eq!(before, after);

    let listed = engine.group_settlements(trip.group_id).await.unwrap();
    assert_eq!(listed.total, Money::new(30_00));
    assert_eq!(listed.settlements.len(), 1);
    assert_eq!(listed.settlements[0].from_user_name.as_deref(), Some("Bob"));
    assert_eq!(listed.settlements[0].to_user_name.as_deref(), Some("Alice"));

    let named = engine.settlement(settlement.id).await.unwrap();
    assert_eq!(named.settlement, settlement);
    assert_eq!(engine.user_settlements(trip.alice).await.unwrap().len(), 1);
    assert_eq!(engine.settlements().await.unwrap().len(), 1);
}

#[tokio::test]
async fn settlement_validation() {
    let (engine, _db) = engine_with_db(MemberInclusion::AllMembers).await;
    let trip = dinner(&engine).await;

    let err = engine
        .record_settlement(SettlementCmd::new(trip.group_id, trip.bob, trip.bob, Money::new(1_00)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));

    let err = engine
        .record_settlement(SettlementCmd::new(trip.group_id, trip.bob, trip.alice, Money::ZERO))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let err = engine
        .record_settlement(SettlementCmd::new(trip.group_id, trip.bob, 999, Money::new(1_00)))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("user not exists".to_string()));

    let err = engine
        .record_settlement(SettlementCmd::new(999, trip.bob, trip.alice, Money::new(1_00)))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("group not exists".to_string()));
}

#[tokio::test]
async fn zero_activity_member_follows_inclusion_policy() {
    for (inclusion, expected) in [
        (MemberInclusion::AllMembers, Some(Money::ZERO)),
        (MemberInclusion::ActiveOnly, None),
    ] {
        let (engine, _db) = engine_with_db(inclusion).await;
        let trip = dinner(&engine).await;
        let carol = engine
            .register_user("carol@example.com", "Carol")
            .await
            .unwrap();
        engine
            .add_member(trip.group_id, MemberRef::Email("Carol@Example.com".to_string()))
            .await
            .unwrap();

        let balances = engine.group_balances(trip.group_id).await.unwrap();
        assert_eq!(balances.get(&carol.id).copied(), expected);
        assert_eq!(Money::checked_sum(balances.values().copied()), Some(Money::ZERO));
    }
}

#[tokio::test]
async fn former_member_keeps_their_balance() {
    let (engine, _db) = engine_with_db(MemberInclusion::AllMembers).await;
    let trip = dinner(&engine).await;

    engine.remove_member(trip.group_id, trip.bob).await.unwrap();
    let balances = engine.group_balances(trip.group_id).await.unwrap();
    assert_eq!(balances[&trip.bob], Money::new(-50_00));

    let err = engine
        .remove_member(trip.group_id, trip.bob)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("member not exists".to_string()));
}

#[tokio::test]
async fn user_balance_does_not_require_membership() {
    let (engine, _db) = engine_with_db(MemberInclusion::AllMembers).await;
    let trip = dinner(&engine).await;
    let outsider = engine
        .register_user("dave@example.com", "Dave")
        .await
        .unwrap();

    assert_eq!(
        engine.user_balance(trip.alice, trip.group_id).await.unwrap(),
        Money::new(50_00)
    );
    assert_eq!(
        engine.user_balance(trip.bob, trip.group_id).await.unwrap(),
        Money::new(-50_00)
    );
    assert_eq!(
        engine.user_balance(outsider.id, trip.group_id).await.unwrap(),
        Money::ZERO
    );

    let err = engine.user_balance(trip.alice, 999).await.unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("group not exists".to_string()));
}

#[tokio::test]
async fn view_without_viewer_is_absolute() {
    let (engine, _db) = engine_with_db(MemberInclusion::AllMembers).await;
    let trip = dinner(&engine).await;

    for viewer in [None, Some(0)] {
        let BalanceView::Absolute(view) = engine
            .group_balance_view(trip.group_id, viewer)
            .await
            .unwrap()
        else {
            panic!("expected absolute view");
        };
        let entries: Vec<(i64, &str, Money)> = view
            .entries
            .iter()
            .map(|e| (e.user_id, e.user_name.as_str(), e.amount))
            .collect();
        assert_eq!(
            entries,
            vec![
                (trip.alice, "Alice", Money::new(50_00)),
                (trip.bob, "Bob", Money::new(-50_00)),
            ]
        );
    }

    let view = engine
        .group_balance_view(trip.group_id, Some(trip.alice))
        .await
        .unwrap();
    assert!(matches!(view, BalanceView::Relative { viewer_id, .. } if viewer_id == trip.alice));
}

#[tokio::test]
async fn unresolvable_names_are_skipped() {
    let (engine, db) = engine_with_db(MemberInclusion::AllMembers).await;
    let trip = dinner(&engine).await;

    let backend = db.get_database_backend();
    db.execute(Statement::from_string(backend, "PRAGMA foreign_keys = OFF"))
        .await
        .unwrap();
    db.execute(Statement::from_sql_and_values(
        backend,
        "DELETE FROM users WHERE id = ?",
        vec![trip.bob.into()],
    ))
    .await
    .unwrap();

    let view = engine
        .relative_balances(trip.group_id, trip.alice)
        .await
        .unwrap();
    assert!(view.entries.is_empty());
    assert_eq!(view.skipped_user_ids, vec![trip.bob]);

    let absolute = engine.member_balances(trip.group_id).await.unwrap();
    assert_eq!(absolute.entries.len(), 1);
    assert_eq!(absolute.skipped_user_ids, vec![trip.bob]);
}

#[tokio::test]
async fn expenses_validate_and_update() {
    let (engine, _db) = engine_with_db(MemberInclusion::AllMembers).await;
    let trip = dinner(&engine).await;

    let err = engine
        .create_expense(ExpenseCmd::new(trip.group_id, trip.alice, Money::ZERO))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let err = engine
        .create_expense(ExpenseCmd::new(trip.group_id, 999, Money::new(1_00)))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("user not exists".to_string()));

    // A failing split rolls the whole expense back.
    let err = engine
        .create_expense(
            ExpenseCmd::new(trip.group_id, trip.bob, Money::new(20_00))
                .split(trip.alice, Money::new(10_00))
                .split(999, Money::new(10_00)),
        )
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("user not exists".to_string()));
    assert_eq!(engine.group_expenses(trip.group_id).await.unwrap().len(), 1);

    let (taxi, splits) = engine
        .create_expense(ExpenseCmd::new(trip.group_id, trip.bob, Money::new(20_00)))
        .await
        .unwrap();
    assert!(splits.is_empty());
    engine
        .add_split(taxi.id, trip.alice, Money::new(20_00))
        .await
        .unwrap();

    let balances = engine.group_balances(trip.group_id).await.unwrap();
    assert_eq!(balances[&trip.alice], Money::new(30_00));
    assert_eq!(balances[&trip.bob], Money::new(-30_00));

    let updated = engine
        .update_expense(taxi.id, UpdateExpenseCmd::default().description("taxi"))
        .await
        .unwrap();
    assert_eq!(updated.description.as_deref(), Some("taxi"));
    assert_eq!(updated.amount, Money::new(20_00));

    let detail = engine.expense(taxi.id).await.unwrap();
    assert_eq!(detail.paid_by_name.as_deref(), Some("Bob"));
    assert_eq!(engine.user_expenses(trip.bob).await.unwrap().len(), 1);
}

#[tokio::test]
async fn split_updates_feed_balances() {
    let (engine, _db) = engine_with_db(MemberInclusion::AllMembers).await;
    let trip = dinner(&engine).await;
    let expense = engine.group_expenses(trip.group_id).await.unwrap()[0].clone();

    let splits = engine.expense_splits(expense.id).await.unwrap();
    assert_eq!(splits.len(), 2);
    let bob_split = splits.iter().find(|s| s.user_id == trip.bob).unwrap();

    let updated = engine
        .update_split(bob_split.id, Money::new(70_00))
        .await
        .unwrap();
    assert_eq!(updated.amount, Money::new(70_00));
    assert_eq!(
        engine.user_balance(trip.bob, trip.group_id).await.unwrap(),
        Money::new(-70_00)
    );
    assert_eq!(engine.user_splits(trip.bob).await.unwrap().len(), 1);

    let err = engine.update_split(bob_split.id, Money::new(-1)).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
}

#[tokio::test]
async fn deleting_an_expense_removes_its_splits() {
    let (engine, _db) = engine_with_db(MemberInclusion::ActiveOnly).await;
    let trip = dinner(&engine).await;
    let expense = engine.group_expenses(trip.group_id).await.unwrap()[0].clone();

    engine.delete_expense(expense.id).await.unwrap();
    assert!(engine.group_balances(trip.group_id).await.unwrap().is_empty());
    assert!(engine.user_splits(trip.bob).await.unwrap().is_empty());

    let err = engine.expense(expense.id).await.unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("expense not exists".to_string()));
}

#[tokio::test]
async fn deleting_a_group_cascades() {
    let (engine, _db) = engine_with_db(MemberInclusion::AllMembers).await;
    let trip = dinner(&engine).await;
    engine
        .record_settlement(SettlementCmd::new(trip.group_id, trip.bob, trip.alice, Money::new(5_00)))
        .await
        .unwrap();

    engine.delete_group(trip.group_id).await.unwrap();
    let err = engine.group_balances(trip.group_id).await.unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("group not exists".to_string()));
    assert!(engine.user_splits(trip.bob).await.unwrap().is_empty());
    assert!(engine.settlements().await.unwrap().is_empty());
    assert!(engine.groups_for_user(trip.bob).await.unwrap().is_empty());
}

#[tokio::test]
async fn deleting_a_user_removes_their_rows() {
    let (engine, _db) = engine_with_db(MemberInclusion::AllMembers).await;
    let trip = dinner(&engine).await;
    let carol = engine
        .register_user("carol@example.com", "Carol")
        .await
        .unwrap();
    let other = engine.create_group("Other", None, carol.id).await.unwrap();
    engine
        .add_member(other.id, MemberRef::Id(trip.bob))
        .await
        .unwrap();

    engine.delete_user(trip.alice).await.unwrap();

    // Alice created the trip group, so it is gone with her.
    assert!(engine.group(trip.group_id).await.is_err());
    assert_eq!(engine.groups_for_user(trip.bob).await.unwrap().len(), 1);
    assert_eq!(engine.users().await.unwrap().len(), 2);
    let err = engine.login("alice@example.com").await.unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("user not exists".to_string()));
}

#[tokio::test]
async fn users_and_memberships_reject_duplicates() {
    let (engine, _db) = engine_with_db(MemberInclusion::AllMembers).await;
    let trip = dinner(&engine).await;

    let err = engine
        .register_user("ALICE@example.com", "Other Alice")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    let err = engine
        .add_member(trip.group_id, MemberRef::Id(trip.bob))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    let err = engine
        .update_user(trip.bob, None, Some("alice@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    let bob = engine
        .update_user(trip.bob, Some("Robert"), None)
        .await
        .unwrap();
    assert_eq!(bob.name, "Robert");
    assert_eq!(bob.email, "bob@example.com");

    let members = engine.members(trip.group_id).await.unwrap();
    let names: Vec<&str> = members.iter().map(|m| m.user_name.as_str()).collect();
    assert_eq!(names, vec!["Alice", "Robert"]);

    let logged_in = engine.login(" Bob@Example.com ").await.unwrap();
    assert_eq!(logged_in.id, trip.bob);
}

#[tokio::test]
async fn groups_can_be_updated() {
    let (engine, _db) = engine_with_db(MemberInclusion::AllMembers).await;
    let trip = dinner(&engine).await;

    let group = engine
        .update_group(trip.group_id, Some("Summer trip"), Some("  "))
        .await
        .unwrap();
    assert_eq!(group.name, "Summer trip");
    assert_eq!(group.description, None);

    let err = engine
        .update_group(trip.group_id, Some(" "), None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));

    assert_eq!(engine.groups().await.unwrap().len(), 1);
    assert_eq!(engine.groups_for_user(trip.bob).await.unwrap().len(), 1);
}

#[tokio::test]
async fn oversized_amounts_never_break_balance_reads() {
    let (engine, db) = engine_with_db(MemberInclusion::AllMembers).await;
    let trip = dinner(&engine).await;
    let half = i64::MAX / 2 + 1;

    let err = engine
        .create_expense(ExpenseCmd::new(trip.group_id, trip.alice, Money::new(half)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
    let err = engine
        .record_settlement(SettlementCmd::new(
            trip.group_id,
            trip.bob,
            trip.alice,
            Money::new(half),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    engine
        .create_expense(ExpenseCmd::new(trip.group_id, trip.alice, MAX_AMOUNT))
        .await
        .unwrap();
    let balances = engine.group_balances(trip.group_id).await.unwrap();
    assert_eq!(balances[&trip.alice], Money::new(MAX_AMOUNT.cents() + 50_00));

    // Rows written behind the engine's back surface as an error, not a panic.
    let backend = db.get_database_backend();
    for _ in 0..2 {
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO expenses (group_id, paid_by_id, amount_minor) VALUES (?, ?, ?)",
            vec![trip.group_id.into(), trip.alice.into(), half.into()],
        ))
        .await
        .unwrap();
    }
    let overflow = EngineError::InvalidAmount("balance overflow".to_string());
    assert_eq!(engine.group_balances(trip.group_id).await.unwrap_err(), overflow);
    assert_eq!(
        engine.user_balance(trip.alice, trip.group_id).await.unwrap_err(),
        overflow
    );
    assert_eq!(
        engine
            .group_balance_view(trip.group_id, Some(trip.bob))
            .await
            .unwrap_err(),
        overflow
    );
}
