use chrono::Utc;
use sea_orm::Database;
use uuid::Uuid;

use engine::{
    DepleteStockCmd, Engine, EngineError, IssueInvoiceCmd, LineItemCmd, Percent, ReceiveBatchCmd,
};
use migration::MigratorTrait;

async fn setup() -> Engine {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Engine::builder().database(db).build().await.unwrap()
}

/// Receive `quantity` units at `unit_cost` and consume them all for a fresh
/// sales order, returning the order id.
async fn consumed_order(engine: &Engine, quantity: i64, unit_cost: &str) -> Uuid {
    let product_id = Uuid::new_v4();
    let order_id = Uuid::new_v4();
    engine
        .receive_batch(ReceiveBatchCmd::new(
            product_id,
            quantity,
            unit_cost,
            Utc::now(),
        ))
        .await
        .unwrap();
    engine
        .deplete(DepleteStockCmd::new(
            product_id,
            quantity,
            order_id,
            Uuid::new_v4(),
            Utc::now(),
        ))
        .await
        .unwrap();
    order_id
}

#[tokio::test]
async fn costing_derives_revenue_cogs_profit_margin() {
    let engine = setup().await;
    let order_id = consumed_order(&engine, 10, "6.00").await;

    let invoice = engine
        .issue_invoice(
            IssueInvoiceCmd::new(order_id, "100.00", "8.00", "108.00", Utc::now())
                .item(LineItemCmd::new("widgets", 10, "10.00")),
        )
        .await
        .unwrap();

    let costing = engine.compute_costing(invoice.id).await.unwrap();
    // Revenue is the pre-tax subtotal.
    assert_eq!(costing.revenue.to_string(), "100.00");
    assert_eq!(costing.cogs.to_string(), "60.00");
    assert_eq!(costing.profit.to_string(), "40.00");
    assert_eq!(costing.margin.to_string(), "40.00");
}

#[tokio::test]
async fn costing_is_idempotent_over_unchanged_inputs() {
    let engine = setup().await;
    let order_id = consumed_order(&engine, 5, "2.00").await;

    let invoice = engine
        .issue_invoice(IssueInvoiceCmd::new(
            order_id, "50.00", "0.00", "50.00",
            Utc::now(),
        ))
        .await
        .unwrap();

    let first = engine.compute_costing(invoice.id).await.unwrap();
    let second = engine.compute_costing(invoice.id).await.unwrap();
    assert_eq!(first.revenue, second.revenue);
    assert_eq!(first.cogs, second.cogs);
    assert_eq!(first.profit, second.profit);
    assert_eq!(first.margin, second.margin);

    // Exactly one row exists per invoice.
    let stored = engine.costing(invoice.id).await.unwrap();
    assert_eq!(stored.cogs, second.cogs);
}

#[tokio::test]
async fn costing_unknown_invoice_fails() {
    let engine = setup().await;

    let result = engine.compute_costing(Uuid::new_v4()).await;
    assert!(matches!(result, Err(EngineError::InvoiceNotFound(_))));
}

#[tokio::test]
async fn costing_without_lots_is_not_zero_cogs() {
    let engine = setup().await;

    // An invoice whose sales order never consumed stock has no cost basis,
    // which is a distinct condition from a computed COGS of zero.
    let invoice = engine
        .issue_invoice(IssueInvoiceCmd::new(
            Uuid::new_v4(),
            "100.00",
            "0.00",
            "100.00",
            Utc::now(),
        ))
        .await
        .unwrap();

    let result = engine.compute_costing(invoice.id).await;
    assert!(matches!(result, Err(EngineError::NoConsumptionData(_))));
}

#[tokio::test]
async fn zero_revenue_yields_zero_margin() {
    let engine = setup().await;
    let order_id = consumed_order(&engine, 2, "3.00").await;

    let invoice = engine
        .issue_invoice(IssueInvoiceCmd::new(
            order_id, "0.00", "0.00", "0.00",
            Utc::now(),
        ))
        .await
        .unwrap();

    let costing = engine.compute_costing(invoice.id).await.unwrap();
    assert_eq!(costing.margin, Percent::ZERO);
    assert_eq!(costing.profit.to_string(), "-6.00");
}

#[tokio::test]
async fn issue_invoice_validates_totals() {
    let engine = setup().await;

    let result = engine
        .issue_invoice(IssueInvoiceCmd::new(
            Uuid::new_v4(),
            "100.00",
            "8.00",
            "110.00",
            Utc::now(),
        ))
        .await;
    assert!(matches!(result, Err(EngineError::InvalidAmount(_))));

    let result = engine
        .issue_invoice(
            IssueInvoiceCmd::new(Uuid::new_v4(), "100.00", "0.00", "100.00", Utc::now())
                .item(LineItemCmd::new("widgets", 3, "10.00")),
        )
        .await;
    assert!(matches!(result, Err(EngineError::InvalidAmount(_))));
}

#[tokio::test]
async fn cancel_invoice_transitions_once() {
    let engine = setup().await;
    let order_id = consumed_order(&engine, 1, "1.00").await;

    let invoice = engine
        .issue_invoice(IssueInvoiceCmd::new(
            order_id, "10.00", "0.00", "10.00",
            Utc::now(),
        ))
        .await
        .unwrap();

    let cancelled = engine.cancel_invoice(invoice.id).await.unwrap();
    assert_eq!(cancelled.status, engine::InvoiceStatus::Cancelled);

    let result = engine.cancel_invoice(invoice.id).await;
    assert!(matches!(result, Err(EngineError::InvalidStatus(_))));

    // Costing stays available for a cancelled invoice.
    let costing = engine.compute_costing(invoice.id).await.unwrap();
    assert_eq!(costing.cogs.to_string(), "1.00");
}

#[tokio::test]
async fn recompute_picks_up_new_consumptions() {
    let engine = setup().await;
    let product_id = Uuid::new_v4();
    let order_id = Uuid::new_v4();

    engine
        .receive_batch(ReceiveBatchCmd::new(product_id, 10, "4.00", Utc::now()))
        .await
        .unwrap();
    engine
        .deplete(DepleteStockCmd::new(
            product_id,
            5,
            order_id,
            Uuid::new_v4(),
            Utc::now(),
        ))
        .await
        .unwrap();

    let invoice = engine
        .issue_invoice(IssueInvoiceCmd::new(
            order_id, "80.00", "0.00", "80.00",
            Utc::now(),
        ))
        .await
        .unwrap();
    let first = engine.compute_costing(invoice.id).await.unwrap();
    assert_eq!(first.cogs.to_string(), "20.00");

    engine
        .deplete(DepleteStockCmd::new(
            product_id,
            5,
            order_id,
            Uuid::new_v4(),
            Utc::now(),
        ))
        .await
        .unwrap();

    // The stored row is overwritten, not duplicated.
    let second = engine.compute_costing(invoice.id).await.unwrap();
    assert_eq!(second.cogs.to_string(), "40.00");
    assert_eq!(engine.costing(invoice.id).await.unwrap().cogs, second.cogs);
}
