//! Per-invoice costing results.
//!
//! One row per invoice (the invoice id is the primary key): recomputing a
//! costing overwrites the previous result instead of appending a second one.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, Percent};

/// Derived profitability figures for one invoice.
///
/// `revenue` is the invoice's pre-tax subtotal. `cogs` is the sum over the
/// consumption lots of the invoice's sales order, valued at the unit cost
/// frozen when the stock was consumed. `margin` is `profit / revenue × 100`
/// rounded half-up to 2 decimals, `0` when revenue is zero.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Costing {
    pub invoice_id: Uuid,
    pub revenue: Money,
    pub cogs: Money,
    pub profit: Money,
    pub margin: Percent,
    pub computed_at: DateTime<Utc>,
}

impl Costing {
    /// Derives a costing from revenue and an exact micro-unit COGS total.
    ///
    /// The COGS sum is rounded here, once, after all lots are accumulated.
    pub fn derive(
        invoice_id: Uuid,
        revenue: Money,
        cogs_micro: i128,
        computed_at: DateTime<Utc>,
    ) -> Result<Self, EngineError> {
        let cogs = Money::from_micro_total(cogs_micro)?;
        let profit = revenue
            .checked_sub(cogs)
            .ok_or_else(|| EngineError::InvalidAmount("profit overflow".to_string()))?;
        let margin = Percent::ratio(profit, revenue);
        Ok(Self {
            invoice_id,
            revenue,
            cogs,
            profit,
            margin,
            computed_at,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "costings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub invoice_id: String,
    pub revenue_minor: i64,
    pub cogs_minor: i64,
    pub profit_minor: i64,
    pub margin_percent_hundredths: i64,
    pub computed_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::invoices::Entity",
        from = "Column::InvoiceId",
        to = "super::invoices::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Invoices,
}

impl Related<super::invoices::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoices.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Costing> for ActiveModel {
    fn from(costing: &Costing) -> Self {
        Self {
            invoice_id: ActiveValue::Set(costing.invoice_id.to_string()),
            revenue_minor: ActiveValue::Set(costing.revenue.minor()),
            cogs_minor: ActiveValue::Set(costing.cogs.minor()),
            profit_minor: ActiveValue::Set(costing.profit.minor()),
            margin_percent_hundredths: ActiveValue::Set(costing.margin.hundredths()),
            computed_at: ActiveValue::Set(costing.computed_at),
        }
    }
}

impl TryFrom<Model> for Costing {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            invoice_id: Uuid::parse_str(&model.invoice_id)
                .map_err(|_| EngineError::InvoiceNotFound(model.invoice_id.clone()))?,
            revenue: Money::new(model.revenue_minor),
            cogs: Money::new(model.cogs_minor),
            profit: Money::new(model.profit_minor),
            margin: Percent::from_hundredths(model.margin_percent_hundredths),
            computed_at: model.computed_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_rounds_cogs_once() {
        // Three lots of 1 unit at 3.333333 each: 9.999999 micro-total rounds
        // to 10.00, not 3 * 3.33.
        let revenue: Money = "30.00".parse().unwrap();
        let cogs_micro: i128 = 3_333_333 * 3;
        let costing = Costing::derive(Uuid::new_v4(), revenue, cogs_micro, Utc::now()).unwrap();
        assert_eq!(costing.cogs.to_string(), "10.00");
        assert_eq!(costing.profit.to_string(), "20.00");
        assert_eq!(costing.margin.to_string(), "66.67");
    }

    #[test]
    fn zero_revenue_gives_zero_margin() {
        let costing =
            Costing::derive(Uuid::new_v4(), Money::ZERO, 5_000_000, Utc::now()).unwrap();
        assert_eq!(costing.margin, Percent::ZERO);
        assert!(costing.profit.is_negative());
    }
}
