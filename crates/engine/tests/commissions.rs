use chrono::{TimeDelta, Utc};
use sea_orm::Database;
use uuid::Uuid;

use engine::{
    AgentSaleStatus, CommissionType, Engine, EngineError, LineItemCmd, NewAgentSaleCmd,
    NewCommissionRuleCmd,
};
use migration::MigratorTrait;

async fn setup() -> Engine {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Engine::builder().database(db).build().await.unwrap()
}

async fn rule(engine: &Engine, commission_type: CommissionType, value: &str) -> Uuid {
    engine
        .new_commission_rule(NewCommissionRuleCmd::new(
            "standard",
            commission_type,
            value,
            Utc::now() - TimeDelta::days(30),
        ))
        .await
        .unwrap()
        .id
}

async fn draft_with_items(engine: &Engine, commission_type: CommissionType) -> Uuid {
    let sale = engine
        .new_agent_sale(NewAgentSaleCmd::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            commission_type,
            Utc::now(),
        ))
        .await
        .unwrap();
    engine
        .add_agent_sale_item(sale.id, LineItemCmd::new("annual licence", 2, "500.00"))
        .await
        .unwrap();
    sale.id
}

#[tokio::test]
async fn confirmation_computes_settlement_totals() {
    let engine = setup().await;
    let rule_id = rule(&engine, CommissionType::PrincipalCommission, "5").await;
    let sale_id = draft_with_items(&engine, CommissionType::PrincipalCommission).await;

    let confirmed = engine
        .confirm_agent_sale(sale_id, Some(rule_id))
        .await
        .unwrap();

    assert_eq!(confirmed.status, AgentSaleStatus::Confirmed);
    assert_eq!(confirmed.gross_total.unwrap().to_string(), "1000.00");
    assert_eq!(confirmed.commission_total.unwrap().to_string(), "50.00");
    assert_eq!(confirmed.net_principal_total.unwrap().to_string(), "950.00");
    assert!(confirmed.confirmed_at.is_some());

    // Snapshot read agrees with the returned sale.
    let stored = engine.agent_sale(sale_id).await.unwrap();
    assert_eq!(stored.commission_total, confirmed.commission_total);
}

#[tokio::test]
async fn type_mismatch_leaves_the_draft_untouched() {
    let engine = setup().await;
    let rule_id = rule(&engine, CommissionType::LicenseUse, "5").await;
    let sale_id = draft_with_items(&engine, CommissionType::PrincipalCommission).await;

    let result = engine.confirm_agent_sale(sale_id, Some(rule_id)).await;
    assert!(matches!(
        result,
        Err(EngineError::CommissionTypeMismatch(_))
    ));

    let sale = engine.agent_sale(sale_id).await.unwrap();
    assert_eq!(sale.status, AgentSaleStatus::Draft);
    assert!(sale.gross_total.is_none());
    assert!(sale.commission_total.is_none());
    assert!(sale.net_principal_total.is_none());
}

#[tokio::test]
async fn override_rule_wins_over_bound_rule() {
    let engine = setup().await;
    let bound = rule(&engine, CommissionType::LicenseUse, "5").await;
    let sale = engine
        .new_agent_sale(
            NewAgentSaleCmd::new(
                Uuid::new_v4(),
                Uuid::new_v4(),
                CommissionType::LicenseUse,
                Utc::now(),
            )
            .commission_rule_id(bound),
        )
        .await
        .unwrap();
    engine
        .add_agent_sale_item(sale.id, LineItemCmd::new("licence", 1, "1000.00"))
        .await
        .unwrap();

    let override_rule = rule(&engine, CommissionType::LicenseUse, "10").await;
    let confirmed = engine
        .confirm_agent_sale(sale.id, Some(override_rule))
        .await
        .unwrap();

    assert_eq!(confirmed.commission_rule_id, Some(override_rule));
    assert_eq!(confirmed.commission_total.unwrap().to_string(), "100.00");
}

#[tokio::test]
async fn bound_rule_is_used_without_override() {
    let engine = setup().await;
    let bound = rule(&engine, CommissionType::LicenseUse, "2.50").await;
    let sale = engine
        .new_agent_sale(
            NewAgentSaleCmd::new(
                Uuid::new_v4(),
                Uuid::new_v4(),
                CommissionType::LicenseUse,
                Utc::now(),
            )
            .commission_rule_id(bound),
        )
        .await
        .unwrap();
    engine
        .add_agent_sale_item(sale.id, LineItemCmd::new("licence", 1, "200.00"))
        .await
        .unwrap();

    let confirmed = engine.confirm_agent_sale(sale.id, None).await.unwrap();
    assert_eq!(confirmed.commission_total.unwrap().to_string(), "5.00");
}

#[tokio::test]
async fn confirming_twice_fails() {
    let engine = setup().await;
    let rule_id = rule(&engine, CommissionType::LicenseUse, "5").await;
    let sale_id = draft_with_items(&engine, CommissionType::LicenseUse).await;

    engine
        .confirm_agent_sale(sale_id, Some(rule_id))
        .await
        .unwrap();
    let result = engine.confirm_agent_sale(sale_id, Some(rule_id)).await;
    assert!(matches!(result, Err(EngineError::SaleAlreadyConfirmed(_))));
}

#[tokio::test]
async fn confirmed_sale_rejects_item_changes() {
    let engine = setup().await;
    let rule_id = rule(&engine, CommissionType::LicenseUse, "5").await;
    let sale_id = draft_with_items(&engine, CommissionType::LicenseUse).await;
    let confirmed = engine
        .confirm_agent_sale(sale_id, Some(rule_id))
        .await
        .unwrap();

    let result = engine
        .add_agent_sale_item(sale_id, LineItemCmd::new("extra", 1, "1.00"))
        .await;
    assert!(matches!(result, Err(EngineError::SaleAlreadyConfirmed(_))));

    let item_id = confirmed.items[0].id;
    let result = engine.remove_agent_sale_item(sale_id, item_id).await;
    assert!(matches!(result, Err(EngineError::SaleAlreadyConfirmed(_))));
}

#[tokio::test]
async fn inactive_rule_is_rejected() {
    let engine = setup().await;
    let rule_id = rule(&engine, CommissionType::LicenseUse, "5").await;
    engine
        .set_commission_rule_active(rule_id, false)
        .await
        .unwrap();
    let sale_id = draft_with_items(&engine, CommissionType::LicenseUse).await;

    let result = engine.confirm_agent_sale(sale_id, Some(rule_id)).await;
    assert!(matches!(result, Err(EngineError::RuleNotApplicable(_))));
}

#[tokio::test]
async fn sale_outside_rule_window_is_rejected() {
    let engine = setup().await;
    let expired = engine
        .new_commission_rule(
            NewCommissionRuleCmd::new(
                "last year",
                CommissionType::LicenseUse,
                "5",
                Utc::now() - TimeDelta::days(400),
            )
            .valid_to(Utc::now() - TimeDelta::days(100)),
        )
        .await
        .unwrap();
    let sale_id = draft_with_items(&engine, CommissionType::LicenseUse).await;

    let result = engine.confirm_agent_sale(sale_id, Some(expired.id)).await;
    assert!(matches!(result, Err(EngineError::RuleNotApplicable(_))));
}

#[tokio::test]
async fn confirmation_without_any_rule_fails() {
    let engine = setup().await;
    let sale_id = draft_with_items(&engine, CommissionType::LicenseUse).await;

    let result = engine.confirm_agent_sale(sale_id, None).await;
    assert!(matches!(result, Err(EngineError::KeyNotFound(_))));
}

#[tokio::test]
async fn removing_an_item_shrinks_the_gross() {
    let engine = setup().await;
    let rule_id = rule(&engine, CommissionType::LicenseUse, "10").await;
    let sale_id = draft_with_items(&engine, CommissionType::LicenseUse).await;
    let extra = engine
        .add_agent_sale_item(sale_id, LineItemCmd::new("support", 1, "300.00"))
        .await
        .unwrap();

    engine
        .remove_agent_sale_item(sale_id, extra.id)
        .await
        .unwrap();

    let confirmed = engine
        .confirm_agent_sale(sale_id, Some(rule_id))
        .await
        .unwrap();
    assert_eq!(confirmed.gross_total.unwrap().to_string(), "1000.00");
    assert_eq!(confirmed.commission_total.unwrap().to_string(), "100.00");
}
