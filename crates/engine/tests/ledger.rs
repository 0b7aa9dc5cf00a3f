use chrono::{DateTime, TimeZone, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    AssetDetails, AssetKind, AssetPatch, AssetRef, AssetSelector, CardDetails,
    CreateTransactionCmd, Currency, Engine, EngineError, MoneyCents, NewAssetCmd,
    OPENING_BALANCE_CATEGORY, TransactionKind, TransactionListFilter, UpdateTransactionCmd,
};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    for username in ["alice", "bob"] {
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO users (username, created_at) VALUES (?, ?)",
            vec![username.into(), Utc::now().into()],
        ))
        .await
        .unwrap();
    }
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap()
}

fn card(name: &str) -> AssetSelector {
    AssetRef::new(AssetKind::DebitCard, name).into()
}

async fn new_card(engine: &Engine, user: &str, name: &str) -> engine::Asset {
    engine
        .new_asset(NewAssetCmd::new(user, AssetKind::DebitCard, name))
        .await
        .unwrap()
}

async fn balance(engine: &Engine, user: &str, asset_id: uuid::Uuid) -> i64 {
    engine.asset(user, asset_id).await.unwrap().balance.cents()
}

#[tokio::test]
async fn refill_waste_transfer_move_balances() {
    let (engine, _db) = engine_with_db().await;
    let sber = new_card(&engine, "alice", "Sberbank").await;
    let tinkoff = new_card(&engine, "alice", "Tinkoff").await;

    engine
        .create_transaction(
            CreateTransactionCmd::refill(
                "alice",
                MoneyCents::new(50_000),
                card("Sberbank"),
                at(1, 9),
            )
            .category("Salary"),
        )
        .await
        .unwrap();
    engine
        .create_transaction(CreateTransactionCmd::waste(
            "alice",
            MoneyCents::new(3_500),
            card("sberbank"),
            at(2, 12),
        ))
        .await
        .unwrap();
    let transfer = engine
        .create_transaction(CreateTransactionCmd::transfer(
            "alice",
            MoneyCents::new(10_000),
            sber.id,
            tinkoff.id,
            at(3, 18),
        ))
        .await
        .unwrap();

    assert_eq!(transfer.kind, TransactionKind::Transfer);
    assert_eq!(transfer.currency, Currency::Rub);
    assert_eq!(balance(&engine, "alice", sber.id).await, 36_500);
    assert_eq!(balance(&engine, "alice", tinkoff.id).await, 10_000);
    assert!(engine.balance_drift("alice").await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_restores_balances() {
    let (engine, _db) = engine_with_db().await;
    let sber = new_card(&engine, "alice", "Sberbank").await;
    let tinkoff = new_card(&engine, "alice", "Tinkoff").await;

    let tx = engine
        .create_transaction(CreateTransactionCmd::transfer(
            "alice",
            MoneyCents::new(2_000),
            sber.id,
            tinkoff.id,
            at(4, 10),
        ))
        .await
        .unwrap();
    assert_eq!(balance(&engine, "alice", sber.id).await, -2_000);

    engine.delete_transaction("alice", tx.id).await.unwrap();

    assert_eq!(balance(&engine, "alice", sber.id).await, 0);
    assert_eq!(balance(&engine, "alice", tinkoff.id).await, 0);
    assert_eq!(
        engine.transaction("alice", tx.id).await.unwrap_err(),
        EngineError::KeyNotFound(format!("transaction {}", tx.id))
    );
}

#[tokio::test]
async fn update_moves_legs_between_assets() {
    let (engine, _db) = engine_with_db().await;
    let sber = new_card(&engine, "alice", "Sberbank").await;
    let tinkoff = new_card(&engine, "alice", "Tinkoff").await;

    let tx = engine
        .create_transaction(CreateTransactionCmd::waste(
            "alice",
            MoneyCents::new(1_000),
            sber.id,
            at(5, 10),
        ))
        .await
        .unwrap();

    let updated = engine
        .update_transaction(
            UpdateTransactionCmd::new("alice", tx.id)
                .amount(MoneyCents::new(1_500))
                .from_asset(AssetPatch::Set(tinkoff.id.into()))
                .description("groceries"),
        )
        .await
        .unwrap();

    assert_eq!(updated.amount, MoneyCents::new(1_500));
    assert_eq!(updated.from_asset_id, Some(tinkoff.id));
    assert_eq!(updated.description.as_deref(), Some("groceries"));
    assert_eq!(balance(&engine, "alice", sber.id).await, 0);
    assert_eq!(balance(&engine, "alice", tinkoff.id).await, -1_500);

    // WASTE -> REFILL needs the sides swapped in the same update.
    let refill = engine
        .update_transaction(
            UpdateTransactionCmd::new("alice", tx.id)
                .kind(TransactionKind::Refill)
                .from_asset(AssetPatch::Clear)
                .to_asset(AssetPatch::Set(sber.id.into())),
        )
        .await
        .unwrap();
    assert_eq!(refill.from_asset_id, None);
    assert_eq!(balance(&engine, "alice", sber.id).await, 1_500);
    assert_eq!(balance(&engine, "alice", tinkoff.id).await, 0);
}

#[tokio::test]
async fn failed_update_leaves_ledger_untouched() {
    let (engine, _db) = engine_with_db().await;
    let sber = new_card(&engine, "alice", "Sberbank").await;
    let tinkoff = new_card(&engine, "alice", "Tinkoff").await;

    let tx = engine
        .create_transaction(CreateTransactionCmd::transfer(
            "alice",
            MoneyCents::new(700),
            sber.id,
            tinkoff.id,
            at(6, 10),
        ))
        .await
        .unwrap();

    let err = engine
        .update_transaction(
            UpdateTransactionCmd::new("alice", tx.id).to_asset(AssetPatch::Set(sber.id.into())),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::SelfTransfer(_)));

    let err = engine
        .update_transaction(
            UpdateTransactionCmd::new("alice", tx.id).kind(TransactionKind::Waste),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransactionStructure(_)));

    let stored = engine.transaction("alice", tx.id).await.unwrap();
    assert_eq!(stored.kind, TransactionKind::Transfer);
    assert_eq!(stored.to_asset_id, Some(tinkoff.id));
    assert_eq!(balance(&engine, "alice", sber.id).await, -700);
    assert_eq!(balance(&engine, "alice", tinkoff.id).await, 700);
}

#[tokio::test]
async fn validation_errors_change_nothing() {
    let (engine, _db) = engine_with_db().await;
    let sber = new_card(&engine, "alice", "Sberbank").await;

    let err = engine
        .create_transaction(CreateTransactionCmd::transfer(
            "alice",
            MoneyCents::new(100),
            sber.id,
            sber.id,
            at(7, 10),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::SelfTransfer(_)));

    let err = engine
        .create_transaction(CreateTransactionCmd::refill(
            "alice",
            MoneyCents::ZERO,
            sber.id,
            at(7, 10),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let err = engine
        .create_transaction(
            CreateTransactionCmd::new(
                "alice",
                TransactionKind::Refill,
                MoneyCents::new(100),
                at(7, 10),
            )
            .from(sber.id),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransactionStructure(_)));

    let (page, _) = engine
        .list_transactions_page("alice", 10, None, &TransactionListFilter::default())
        .await
        .unwrap();
    assert!(page.is_empty());
    assert_eq!(balance(&engine, "alice", sber.id).await, 0);
}

#[tokio::test]
async fn foreign_asset_by_id_is_an_ownership_violation() {
    let (engine, _db) = engine_with_db().await;
    let bobs = new_card(&engine, "bob", "Sberbank").await;

    let err = engine
        .create_transaction(CreateTransactionCmd::refill(
            "alice",
            MoneyCents::new(100),
            bobs.id,
            at(8, 10),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::OwnershipViolation(_)));
    assert_eq!(balance(&engine, "bob", bobs.id).await, 0);

    // Bob's asset is invisible to Alice by reference.
    let err = engine.resolve_asset("alice", "DEBIT_CARD: Sberbank").await.unwrap_err();
    assert_eq!(err, EngineError::UnknownAsset("DEBIT_CARD: Sberbank".to_string()));
}

#[tokio::test]
async fn strict_resolution_reports_unknown_and_ambiguous() {
    let (engine, _db) = engine_with_db().await;
    let err = engine
        .create_transaction(CreateTransactionCmd::refill(
            "alice",
            MoneyCents::new(100),
            card("Nowhere"),
            at(9, 10),
        ))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::UnknownAsset("DEBIT_CARD: Nowhere".to_string()));

    new_card(&engine, "alice", "Tinkoff").await;
    new_card(&engine, "alice", "  tinkoff ").await;
    let err = engine.resolve_asset("alice", "debit card: TINKOFF").await.unwrap_err();
    assert!(matches!(err, EngineError::AmbiguousAsset(_)));

    let err = engine.resolve_asset("alice", "Tinkoff").await.unwrap_err();
    assert_eq!(err, EngineError::InvalidAssetReference("Tinkoff".to_string()));
}

#[tokio::test]
async fn retired_assets_drop_out_of_resolution() {
    let (engine, _db) = engine_with_db().await;
    let cash = engine
        .new_asset(NewAssetCmd::new("alice", AssetKind::Cash, "Wallet"))
        .await
        .unwrap();

    engine.set_asset_active("alice", cash.id, false).await.unwrap();

    let err = engine.resolve_asset("alice", "CASH: Wallet").await.unwrap_err();
    assert!(matches!(err, EngineError::UnknownAsset(_)));
    assert!(engine.list_assets("alice", false).await.unwrap().is_empty());
    assert_eq!(engine.list_assets("alice", true).await.unwrap().len(), 1);

    // Still usable by id.
    engine
        .create_transaction(CreateTransactionCmd::refill(
            "alice",
            MoneyCents::new(100),
            cash.id,
            at(10, 10),
        ))
        .await
        .unwrap();
    assert_eq!(balance(&engine, "alice", cash.id).await, 100);
}

#[tokio::test]
async fn opening_balance_is_a_transaction() {
    let (engine, _db) = engine_with_db().await;
    let credit = engine
        .new_asset(
            NewAssetCmd::new("alice", AssetKind::CreditCard, "Platinum")
                .currency(Currency::Usd)
                .opening_balance(MoneyCents::new(-12_000))
                .opened_at(at(1, 0)),
        )
        .await
        .unwrap();

    assert_eq!(credit.balance, MoneyCents::new(-12_000));
    assert_eq!(credit.currency, Currency::Usd);

    let (page, _) = engine
        .list_transactions_page("alice", 10, None, &TransactionListFilter::default())
        .await
        .unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].kind, TransactionKind::Waste);
    assert_eq!(page[0].amount, MoneyCents::new(12_000));
    assert_eq!(page[0].from_asset_id, Some(credit.id));
    assert_eq!(page[0].category.as_deref(), Some(OPENING_BALANCE_CATEGORY));
    assert!(engine.balance_drift("alice").await.unwrap().is_empty());
}

#[tokio::test]
async fn rename_and_details_follow_the_kind() {
    let (engine, _db) = engine_with_db().await;
    let sber = new_card(&engine, "alice", "Sberbank").await;

    let renamed = engine.rename_asset("alice", sber.id, " Sber Black ").await.unwrap();
    assert_eq!(renamed.name, "Sber Black");
    assert_eq!(
        engine.resolve_asset("alice", "DEBIT_CARD: sber black").await.unwrap().id,
        sber.id
    );

    let details = AssetDetails::DebitCard(CardDetails {
        bank_name: Some("Sberbank".to_string()),
        last_4_digits: Some("1234".to_string()),
    });
    let updated = engine
        .update_asset_details("alice", sber.id, details.clone())
        .await
        .unwrap();
    assert_eq!(updated.details, details);

    let err = engine
        .update_asset_details("alice", sber.id, AssetDetails::empty(AssetKind::Cash))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidDetails(_)));

    let err = engine.rename_asset("bob", sber.id, "Mine").await.unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound(format!("asset {}", sber.id)));
}

#[tokio::test]
async fn referenced_asset_cannot_be_deleted() {
    let (engine, _db) = engine_with_db().await;
    let sber = new_card(&engine, "alice", "Sberbank").await;
    let spare = new_card(&engine, "alice", "Spare").await;

    let tx = engine
        .create_transaction(CreateTransactionCmd::refill(
            "alice",
            MoneyCents::new(100),
            sber.id,
            at(11, 10),
        ))
        .await
        .unwrap();

    let err = engine.delete_asset("alice", sber.id).await.unwrap_err();
    assert!(matches!(err, EngineError::AssetInUse(_)));

    engine.delete_asset("alice", spare.id).await.unwrap();
    engine.delete_transaction("alice", tx.id).await.unwrap();
    engine.delete_asset("alice", sber.id).await.unwrap();
    assert!(engine.list_assets("alice", true).await.unwrap().is_empty());
}

#[tokio::test]
async fn recompute_repairs_stored_balances() {
    let (engine, db) = engine_with_db().await;
    let sber = new_card(&engine, "alice", "Sberbank").await;
    engine
        .create_transaction(CreateTransactionCmd::refill(
            "alice",
            MoneyCents::new(5_000),
            sber.id,
            at(12, 10),
        ))
        .await
        .unwrap();

    db.execute(Statement::from_sql_and_values(
        db.get_database_backend(),
        "UPDATE assets SET balance_minor = ? WHERE id = ?",
        vec![1_i64.into(), sber.id.to_string().into()],
    ))
    .await
    .unwrap();

    let drifts = engine.balance_drift("alice").await.unwrap();
    assert_eq!(drifts.len(), 1);
    assert_eq!(drifts[0].asset_id, sber.id);
    assert_eq!(drifts[0].stored, MoneyCents::new(1));
    assert_eq!(drifts[0].replayed, MoneyCents::new(5_000));

    let repaired = engine.recompute_balances("alice").await.unwrap();
    assert_eq!(repaired, drifts);
    assert_eq!(balance(&engine, "alice", sber.id).await, 5_000);
    assert!(engine.balance_drift("alice").await.unwrap().is_empty());
    assert!(engine.recompute_balances("alice").await.unwrap().is_empty());
}

#[tokio::test]
async fn balance_at_counts_transactions_up_to_the_moment() {
    let (engine, _db) = engine_with_db().await;
    let sber = new_card(&engine, "alice", "Sberbank").await;
    let tinkoff = new_card(&engine, "alice", "Tinkoff").await;

    for cmd in [
        CreateTransactionCmd::refill("alice", MoneyCents::new(1_000), sber.id, at(1, 10)),
        CreateTransactionCmd::waste("alice", MoneyCents::new(300), sber.id, at(2, 10)),
        CreateTransactionCmd::transfer(
            "alice",
            MoneyCents::new(200),
            sber.id,
            tinkoff.id,
            at(3, 10),
        ),
    ] {
        engine.create_transaction(cmd).await.unwrap();
    }

    let balance_at = |asset_id, moment| engine.balance_at("alice", asset_id, moment);
    assert_eq!(balance_at(sber.id, at(1, 0)).await.unwrap(), MoneyCents::ZERO);
    assert_eq!(balance_at(sber.id, at(2, 9)).await.unwrap(), MoneyCents::new(1_000));
    assert_eq!(balance_at(sber.id, at(2, 10)).await.unwrap(), MoneyCents::new(700));
    assert_eq!(balance_at(sber.id, at(3, 10)).await.unwrap(), MoneyCents::new(500));
    assert_eq!(balance_at(tinkoff.id, at(3, 9)).await.unwrap(), MoneyCents::ZERO);
    assert_eq!(balance_at(tinkoff.id, at(3, 10)).await.unwrap(), MoneyCents::new(200));
    assert_eq!(
        balance_at(sber.id, Utc::now()).await.unwrap().cents(),
        balance(&engine, "alice", sber.id).await
    );

    let err = engine
        .balance_at("bob", sber.id, Utc::now())
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound(format!("asset {}", sber.id)));
}

#[tokio::test]
async fn pages_walk_newest_first() {
    let (engine, _db) = engine_with_db().await;
    let sber = new_card(&engine, "alice", "Sberbank").await;
    for day in 1..=5 {
        engine
            .create_transaction(CreateTransactionCmd::refill(
                "alice",
                MoneyCents::new(i64::from(day) * 100),
                sber.id,
                at(day, 10),
            ))
            .await
            .unwrap();
    }

    let filter = TransactionListFilter::default();
    let (first, cursor) = engine
        .list_transactions_page("alice", 2, None, &filter)
        .await
        .unwrap();
    let (second, cursor) = engine
        .list_transactions_page("alice", 2, cursor.as_deref(), &filter)
        .await
        .unwrap();
    let (third, cursor) = engine
        .list_transactions_page("alice", 2, cursor.as_deref(), &filter)
        .await
        .unwrap();

    let days: Vec<_> = first
        .iter()
        .chain(&second)
        .chain(&third)
        .map(|tx| tx.occurred_at)
        .collect();
    assert_eq!(days, vec![at(5, 10), at(4, 10), at(3, 10), at(2, 10), at(1, 10)]);
    assert!(cursor.is_none());

    let narrow = TransactionListFilter {
        from: Some(at(2, 0)),
        to: Some(at(4, 0)),
        ..Default::default()
    };
    let (page, _) = engine
        .list_transactions_page("alice", 10, None, &narrow)
        .await
        .unwrap();
    assert_eq!(page.len(), 2);
}

#[tokio::test]
async fn month_summary_groups_days() {
    let (engine, _db) = engine_with_db().await;
    let sber = new_card(&engine, "alice", "Sberbank").await;
    let tinkoff = new_card(&engine, "alice", "Tinkoff").await;

    for cmd in [
        CreateTransactionCmd::refill("alice", MoneyCents::new(10_000), sber.id, at(2, 9)),
        CreateTransactionCmd::waste("alice", MoneyCents::new(2_500), sber.id, at(2, 20)),
        CreateTransactionCmd::transfer(
            "alice",
            MoneyCents::new(1_000),
            sber.id,
            tinkoff.id,
            at(9, 9),
        ),
        CreateTransactionCmd::refill(
            "alice",
            MoneyCents::new(777),
            sber.id,
            Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap(),
        ),
    ] {
        engine.create_transaction(cmd).await.unwrap();
    }

    let summary = engine.month_summary("alice", 2026, 3).await.unwrap();
    assert_eq!(summary.days.len(), 2);
    assert_eq!(summary.days[0].date, at(9, 0).date_naive());
    assert_eq!(summary.days[0].totals[&Currency::Rub], MoneyCents::ZERO);
    assert_eq!(summary.days[1].transactions.len(), 2);
    assert_eq!(summary.days[1].totals[&Currency::Rub], MoneyCents::new(7_500));

    let totals = summary.totals[&Currency::Rub];
    assert_eq!(totals.income, MoneyCents::new(10_000));
    assert_eq!(totals.expense, MoneyCents::new(2_500));
    assert_eq!(totals.balance, MoneyCents::new(7_500));

    assert!(matches!(
        engine.month_summary("alice", 2026, 13).await.unwrap_err(),
        EngineError::InvalidDate(_)
    ));
}

#[tokio::test]
async fn unknown_user_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let err = engine
        .new_asset(NewAssetCmd::new("mallory", AssetKind::Cash, "Wallet"))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("user mallory".to_string()));

    engine.new_user("mallory").await.unwrap();
    engine.new_user("mallory").await.unwrap();
    engine
        .new_asset(NewAssetCmd::new("mallory", AssetKind::Cash, "Wallet"))
        .await
        .unwrap();
}
