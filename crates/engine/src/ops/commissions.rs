//! Commission rules and agent sale settlement.

use chrono::Utc;
use sea_orm::{
    ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*, sea_query::Expr,
};
use tracing::debug;
use uuid::Uuid;

use crate::{
    AgentSale, AgentSaleItem, CommissionRule, EngineError, LineItemCmd, Money, NewAgentSaleCmd,
    NewCommissionRuleCmd, Percent, ResultEngine, agent_sale_items, agent_sales,
    agent_sales::AgentSaleStatus, commission_rules, commission_rules::BasisType,
};

use super::{Engine, with_tx};

impl Engine {
    /// Create a commission rule.
    #[tracing::instrument(skip(self))]
    pub async fn new_commission_rule(
        &self,
        cmd: NewCommissionRuleCmd,
    ) -> ResultEngine<CommissionRule> {
        let value: Percent = cmd.value.parse()?;
        let rule = CommissionRule::new(
            cmd.name,
            cmd.commission_type,
            BasisType::Percentage,
            value,
            cmd.currency,
            cmd.valid_from,
            cmd.valid_to,
        )?;
        with_tx!(self, |db_tx| {
            commission_rules::ActiveModel::from(&rule)
                .insert(&db_tx)
                .await?;
            Ok(rule)
        })
    }

    /// Activate or deactivate a commission rule.
    #[tracing::instrument(skip(self))]
    pub async fn set_commission_rule_active(
        &self,
        rule_id: Uuid,
        is_active: bool,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            commission_rules::Entity::find_by_id(rule_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("rule not exists".to_string()))?;
            let active = commission_rules::ActiveModel {
                id: ActiveValue::Unchanged(rule_id.to_string()),
                is_active: ActiveValue::Set(is_active),
                ..Default::default()
            };
            active.update(&db_tx).await?;
            Ok(())
        })
    }

    /// Return a [`CommissionRule`] (snapshot from DB).
    pub async fn commission_rule(&self, rule_id: Uuid) -> ResultEngine<CommissionRule> {
        with_tx!(self, |db_tx| require_rule(&db_tx, rule_id).await)
    }

    /// Open an agent sale draft. A bound rule is optional; confirmation can
    /// receive an override.
    #[tracing::instrument(skip(self))]
    pub async fn new_agent_sale(&self, cmd: NewAgentSaleCmd) -> ResultEngine<AgentSale> {
        with_tx!(self, |db_tx| {
            if let Some(rule_id) = cmd.commission_rule_id {
                require_rule(&db_tx, rule_id).await?;
            }
            let sale = AgentSale::new(
                cmd.customer_id,
                cmd.principal_id,
                cmd.commission_type,
                cmd.commission_rule_id,
                cmd.created_at,
            );
            agent_sales::ActiveModel::from(&sale).insert(&db_tx).await?;
            Ok(sale)
        })
    }

    /// Add a line item to an agent sale draft.
    #[tracing::instrument(skip(self))]
    pub async fn add_agent_sale_item(
        &self,
        sale_id: Uuid,
        item: LineItemCmd,
    ) -> ResultEngine<AgentSaleItem> {
        let unit_price: Money = item.unit_price.parse()?;
        with_tx!(self, |db_tx| {
            let sale = require_draft(&db_tx, sale_id).await?;
            let item = AgentSaleItem::new(sale.id, item.description, item.quantity, unit_price)?;
            agent_sale_items::ActiveModel::from(&item)
                .insert(&db_tx)
                .await?;
            Ok(item)
        })
    }

    /// Remove a line item from an agent sale draft.
    #[tracing::instrument(skip(self))]
    pub async fn remove_agent_sale_item(&self, sale_id: Uuid, item_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            require_draft(&db_tx, sale_id).await?;
            let deleted = agent_sale_items::Entity::delete_many()
                .filter(agent_sale_items::Column::Id.eq(item_id.to_string()))
                .filter(agent_sale_items::Column::AgentSaleId.eq(sale_id.to_string()))
                .exec(&db_tx)
                .await?;
            if deleted.rows_affected == 0 {
                return Err(EngineError::KeyNotFound("sale item not exists".to_string()));
            }
            Ok(())
        })
    }

    /// Return an [`AgentSale`] with its line items (snapshot from DB).
    pub async fn agent_sale(&self, sale_id: Uuid) -> ResultEngine<AgentSale> {
        with_tx!(self, |db_tx| {
            let mut sale = require_sale(&db_tx, sale_id).await?;
            sale.items = sale_items(&db_tx, sale_id).await?;
            Ok(sale)
        })
    }

    /// Confirm an agent sale, computing its settlement totals.
    ///
    /// Rule resolution: `override_rule_id` wins over the rule bound at draft
    /// time; no rule at all is an error. The rule's applicability is checked
    /// **before** any monetary computation, so a `CommissionTypeMismatch`
    /// leaves the draft untouched. Totals and the `confirmed` status are
    /// persisted in one status-guarded update: of two racing confirmations
    /// exactly one wins, the other fails with `ConcurrentModification`.
    #[tracing::instrument(skip(self))]
    pub async fn confirm_agent_sale(
        &self,
        sale_id: Uuid,
        override_rule_id: Option<Uuid>,
    ) -> ResultEngine<AgentSale> {
        with_tx!(self, |db_tx| {
            let mut sale = require_sale(&db_tx, sale_id).await?;
            if sale.is_confirmed() {
                return Err(EngineError::SaleAlreadyConfirmed(sale_id.to_string()));
            }

            let rule_id = override_rule_id
                .or(sale.commission_rule_id)
                .ok_or_else(|| {
                    EngineError::KeyNotFound(format!("no commission rule for sale {sale_id}"))
                })?;
            let rule = require_rule(&db_tx, rule_id).await?;
            rule.applies_to(&sale)?;

            let items = sale_items(&db_tx, sale_id).await?;
            let mut gross = Money::ZERO;
            for item in &items {
                gross = gross.checked_add(item.line_total).ok_or_else(|| {
                    EngineError::InvalidAmount("sale gross total overflow".to_string())
                })?;
            }
            let commission = rule.commission_for(gross);
            let net = gross.checked_sub(commission).ok_or_else(|| {
                EngineError::InvalidAmount("net principal total overflow".to_string())
            })?;
            let confirmed_at = Utc::now();

            let update = agent_sales::Entity::update_many()
                .col_expr(
                    agent_sales::Column::Status,
                    Expr::value(AgentSaleStatus::Confirmed.as_str()),
                )
                .col_expr(
                    agent_sales::Column::CommissionRuleId,
                    Expr::value(rule.id.to_string()),
                )
                .col_expr(agent_sales::Column::GrossTotalMinor, Expr::value(gross.minor()))
                .col_expr(
                    agent_sales::Column::CommissionTotalMinor,
                    Expr::value(commission.minor()),
                )
                .col_expr(
                    agent_sales::Column::NetPrincipalTotalMinor,
                    Expr::value(net.minor()),
                )
                .col_expr(agent_sales::Column::ConfirmedAt, Expr::value(confirmed_at))
                .filter(agent_sales::Column::Id.eq(sale_id.to_string()))
                .filter(agent_sales::Column::Status.eq(AgentSaleStatus::Draft.as_str()))
                .exec(&db_tx)
                .await?;
            if update.rows_affected == 0 {
                return Err(EngineError::ConcurrentModification(format!(
                    "agent sale {sale_id}"
                )));
            }
            debug!(sale_id = %sale_id, %gross, %commission, %net, "agent sale confirmed");

            sale.status = AgentSaleStatus::Confirmed;
            sale.commission_rule_id = Some(rule.id);
            sale.gross_total = Some(gross);
            sale.commission_total = Some(commission);
            sale.net_principal_total = Some(net);
            sale.confirmed_at = Some(confirmed_at);
            sale.items = items;
            Ok(sale)
        })
    }
}

async fn require_rule<C: sea_orm::ConnectionTrait>(
    db: &C,
    rule_id: Uuid,
) -> ResultEngine<CommissionRule> {
    let model = commission_rules::Entity::find_by_id(rule_id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound("rule not exists".to_string()))?;
    CommissionRule::try_from(model)
}

async fn require_sale<C: sea_orm::ConnectionTrait>(
    db: &C,
    sale_id: Uuid,
) -> ResultEngine<AgentSale> {
    let model = agent_sales::Entity::find_by_id(sale_id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound("agent sale not exists".to_string()))?;
    AgentSale::try_from(model)
}

async fn require_draft<C: sea_orm::ConnectionTrait>(
    db: &C,
    sale_id: Uuid,
) -> ResultEngine<AgentSale> {
    let sale = require_sale(db, sale_id).await?;
    if sale.is_confirmed() {
        return Err(EngineError::SaleAlreadyConfirmed(sale_id.to_string()));
    }
    Ok(sale)
}

async fn sale_items<C: sea_orm::ConnectionTrait>(
    db: &C,
    sale_id: Uuid,
) -> ResultEngine<Vec<AgentSaleItem>> {
    let models = agent_sale_items::Entity::find()
        .filter(agent_sale_items::Column::AgentSaleId.eq(sale_id.to_string()))
        .order_by_asc(agent_sale_items::Column::Id)
        .all(db)
        .await?;
    models
        .into_iter()
        .map(AgentSaleItem::try_from)
        .collect::<ResultEngine<Vec<_>>>()
}
