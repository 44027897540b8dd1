use chrono::{TimeDelta, Utc};
use sea_orm::Database;
use uuid::Uuid;

use engine::{
    DepleteStockCmd, Engine, EngineError, ExpenseKind, LocationKind, PostExpenseCmd,
    ReceiveBatchCmd,
};
use migration::MigratorTrait;

async fn setup() -> Engine {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Engine::builder().database(db).build().await.unwrap()
}

#[tokio::test]
async fn depletion_walks_batches_in_fifo_order() {
    let engine = setup().await;
    let product_id = Uuid::new_v4();
    let now = Utc::now();

    let older = engine
        .receive_batch(ReceiveBatchCmd::new(
            product_id,
            5,
            "10.00",
            now - TimeDelta::days(2),
        ))
        .await
        .unwrap();
    let newer = engine
        .receive_batch(ReceiveBatchCmd::new(product_id, 10, "12.00", now))
        .await
        .unwrap();

    let lots = engine
        .deplete(DepleteStockCmd::new(
            product_id,
            8,
            Uuid::new_v4(),
            Uuid::new_v4(),
            now,
        ))
        .await
        .unwrap();

    assert_eq!(lots.len(), 2);
    assert_eq!(lots[0].batch_id, older.id);
    assert_eq!(lots[0].quantity_consumed, 5);
    assert_eq!(lots[0].unit_cost.to_money().to_string(), "10.00");
    assert_eq!(lots[1].batch_id, newer.id);
    assert_eq!(lots[1].quantity_consumed, 3);
    assert_eq!(lots[1].unit_cost.to_money().to_string(), "12.00");

    assert_eq!(engine.batch(older.id).await.unwrap().quantity_remaining, 0);
    assert_eq!(engine.batch(newer.id).await.unwrap().quantity_remaining, 7);
}

#[tokio::test]
async fn insufficient_stock_changes_nothing() {
    let engine = setup().await;
    let product_id = Uuid::new_v4();
    let now = Utc::now();

    let first = engine
        .receive_batch(ReceiveBatchCmd::new(
            product_id,
            10,
            "1.00",
            now - TimeDelta::days(1),
        ))
        .await
        .unwrap();
    let second = engine
        .receive_batch(ReceiveBatchCmd::new(product_id, 5, "1.00", now))
        .await
        .unwrap();

    let order_id = Uuid::new_v4();
    let result = engine
        .deplete(DepleteStockCmd::new(
            product_id,
            20,
            order_id,
            Uuid::new_v4(),
            now,
        ))
        .await;
    assert!(matches!(result, Err(EngineError::InsufficientStock(_))));

    // No partial consumption: quantities and lot trail are untouched.
    assert_eq!(engine.batch(first.id).await.unwrap().quantity_remaining, 10);
    assert_eq!(engine.batch(second.id).await.unwrap().quantity_remaining, 5);
    assert!(
        engine
            .consumption_lots_for_order(order_id)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn lot_cost_is_frozen_at_consumption() {
    let engine = setup().await;
    let product_id = Uuid::new_v4();
    let order_id = Uuid::new_v4();

    let batch = engine
        .receive_batch(ReceiveBatchCmd::new(product_id, 10, "10.00", Utc::now()))
        .await
        .unwrap();

    engine
        .deplete(DepleteStockCmd::new(
            product_id,
            4,
            order_id,
            Uuid::new_v4(),
            Utc::now(),
        ))
        .await
        .unwrap();

    // A later expense raises the batch's landed cost but never reprices the
    // lot already consumed.
    engine
        .post_expense(PostExpenseCmd::new(
            batch.id,
            ExpenseKind::Freight,
            "100.00",
            Utc::now(),
        ))
        .await
        .unwrap();
    assert_eq!(
        engine
            .landed_unit_cost(batch.id)
            .await
            .unwrap()
            .to_money()
            .to_string(),
        "20.00"
    );

    let lots = engine.consumption_lots_for_order(order_id).await.unwrap();
    assert_eq!(lots.len(), 1);
    assert_eq!(lots[0].unit_cost.to_money().to_string(), "10.00");
}

#[tokio::test]
async fn depletion_rejects_non_positive_quantity() {
    let engine = setup().await;

    let result = engine
        .deplete(DepleteStockCmd::new(
            Uuid::new_v4(),
            0,
            Uuid::new_v4(),
            Uuid::new_v4(),
            Utc::now(),
        ))
        .await;
    assert!(matches!(result, Err(EngineError::InvalidQuantity(_))));
}

#[tokio::test]
async fn depletion_is_scoped_to_the_location() {
    let engine = setup().await;
    let product_id = Uuid::new_v4();
    let store_id = Uuid::new_v4();
    let warehouse_id = Uuid::new_v4();

    engine
        .receive_batch(
            ReceiveBatchCmd::new(product_id, 10, "1.00", Utc::now())
                .location(LocationKind::Warehouse, warehouse_id),
        )
        .await
        .unwrap();
    let store_batch = engine
        .receive_batch(
            ReceiveBatchCmd::new(product_id, 3, "1.00", Utc::now())
                .location(LocationKind::Store, store_id),
        )
        .await
        .unwrap();

    // Only the store's 3 units are visible to a store depletion.
    let result = engine
        .deplete(
            DepleteStockCmd::new(product_id, 5, Uuid::new_v4(), Uuid::new_v4(), Utc::now())
                .location(LocationKind::Store, store_id),
        )
        .await;
    assert!(matches!(result, Err(EngineError::InsufficientStock(_))));

    let lots = engine
        .deplete(
            DepleteStockCmd::new(product_id, 3, Uuid::new_v4(), Uuid::new_v4(), Utc::now())
                .location(LocationKind::Store, store_id),
        )
        .await
        .unwrap();
    assert_eq!(lots.len(), 1);
    assert_eq!(lots[0].batch_id, store_batch.id);
}
