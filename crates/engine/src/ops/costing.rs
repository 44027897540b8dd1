//! Per-invoice costing computation.

use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, TransactionTrait, prelude::*};
use tracing::debug;
use uuid::Uuid;

use crate::{
    ConsumptionLot, Costing, EngineError, Invoice, ResultEngine, consumption_lots, costings,
    invoices,
};

use super::{Engine, with_tx};

impl Engine {
    /// Compute (or recompute) the costing of an invoice.
    ///
    /// Revenue is the invoice's pre-tax subtotal. COGS is the sum over the
    /// consumption lots of the invoice's sales order, each valued at the unit
    /// cost frozen when the stock was consumed; the sum is carried in micro
    /// units and rounded once at the end. An order with no lots at all fails
    /// with `NoConsumptionData`, which is not the same as a computed COGS of
    /// zero.
    ///
    /// The result is keyed 1:1 by invoice id: recomputing overwrites the
    /// previous row, so the call is idempotent over unchanged inputs.
    #[tracing::instrument(skip(self))]
    pub async fn compute_costing(&self, invoice_id: Uuid) -> ResultEngine<Costing> {
        with_tx!(self, |db_tx| {
            let model = invoices::Entity::find_by_id(invoice_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::InvoiceNotFound(invoice_id.to_string()))?;
            let invoice = Invoice::try_from(model)?;

            let lot_models = consumption_lots::Entity::find()
                .filter(
                    consumption_lots::Column::SalesOrderId
                        .eq(invoice.sales_order_id.to_string()),
                )
                .all(&db_tx)
                .await?;
            if lot_models.is_empty() {
                return Err(EngineError::NoConsumptionData(invoice_id.to_string()));
            }

            let mut cogs_micro: i128 = 0;
            for lot_model in lot_models {
                let lot = ConsumptionLot::try_from(lot_model)?;
                cogs_micro += lot.cost_micro();
            }

            let costing = Costing::derive(invoice.id, invoice.subtotal, cogs_micro, Utc::now())?;
            debug!(
                invoice_id = %invoice.id,
                revenue = %costing.revenue,
                cogs = %costing.cogs,
                margin = %costing.margin,
                "costing computed"
            );

            let exists = costings::Entity::find_by_id(invoice_id.to_string())
                .one(&db_tx)
                .await?
                .is_some();
            let active = costings::ActiveModel::from(&costing);
            if exists {
                let mut active = active;
                active.invoice_id = ActiveValue::Unchanged(invoice_id.to_string());
                active.update(&db_tx).await?;
            } else {
                active.insert(&db_tx).await?;
            }

            Ok(costing)
        })
    }

    /// Return the stored [`Costing`] of an invoice, if one has been computed.
    pub async fn costing(&self, invoice_id: Uuid) -> ResultEngine<Costing> {
        with_tx!(self, |db_tx| {
            let model = costings::Entity::find_by_id(invoice_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("costing not exists".to_string()))?;
            Costing::try_from(model)
        })
    }
}
