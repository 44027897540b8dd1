//! FIFO stock depletion.

use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*, sea_query::Expr};
use tracing::debug;
use uuid::Uuid;

use crate::{
    Batch, ConsumptionLot, DepleteStockCmd, EngineError, ResultEngine, batches, consumption_lots,
};

use super::{Engine, with_tx};

impl Engine {
    /// Consume stock for one sales order line, walking batches in FIFO order.
    ///
    /// Candidate batches match `(product_id, location)` and still hold stock,
    /// ordered by `received_at` (id as tiebreaker). Total availability is
    /// checked before any write: either the whole requested quantity is
    /// consumed or nothing is, and `InsufficientStock` leaves no trace.
    ///
    /// Each batch touched yields one [`ConsumptionLot`] carrying the landed
    /// unit cost frozen at this instant; later expenses on the batch do not
    /// reprice it. Decrements are version-guarded, so a depletion racing a
    /// concurrent writer loses with `ConcurrentModification` and rolls back
    /// whole.
    #[tracing::instrument(skip(self))]
    pub async fn deplete(&self, cmd: DepleteStockCmd) -> ResultEngine<Vec<ConsumptionLot>> {
        if cmd.quantity <= 0 {
            return Err(EngineError::InvalidQuantity(
                "depletion quantity must be > 0".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            let candidates = batches::Entity::find()
                .filter(batches::Column::ProductId.eq(cmd.product_id.to_string()))
                .filter(batches::Column::LocationKind.eq(cmd.location_kind.as_str()))
                .filter(batches::Column::LocationId.eq(cmd.location_id.to_string()))
                .filter(batches::Column::QuantityRemaining.gt(0))
                .order_by_asc(batches::Column::ReceivedAt)
                .order_by_asc(batches::Column::Id)
                .all(&db_tx)
                .await?;

            let available: i64 = candidates.iter().map(|m| m.quantity_remaining).sum();
            if available < cmd.quantity {
                return Err(EngineError::InsufficientStock(format!(
                    "requested {}, available {}",
                    cmd.quantity, available
                )));
            }

            let mut remaining = cmd.quantity;
            let mut lots = Vec::new();
            for model in candidates {
                if remaining == 0 {
                    break;
                }
                let batch = Batch::try_from(model)?;
                let take = remaining.min(batch.quantity_remaining);

                let update = batches::Entity::update_many()
                    .col_expr(
                        batches::Column::QuantityRemaining,
                        Expr::value(batch.quantity_remaining - take),
                    )
                    .col_expr(batches::Column::Version, Expr::value(batch.version + 1))
                    .filter(batches::Column::Id.eq(batch.id.to_string()))
                    .filter(batches::Column::Version.eq(batch.version))
                    .exec(&db_tx)
                    .await?;
                if update.rows_affected == 0 {
                    return Err(EngineError::ConcurrentModification(format!(
                        "batch {}",
                        batch.id
                    )));
                }

                let lot = ConsumptionLot::new(
                    batch.id,
                    cmd.sales_order_id,
                    cmd.sales_order_item_id,
                    take,
                    batch.landed_unit_cost,
                    cmd.consumed_at,
                )?;
                consumption_lots::ActiveModel::from(&lot)
                    .insert(&db_tx)
                    .await?;
                debug!(batch_id = %batch.id, take, unit_cost = %lot.unit_cost, "batch depleted");

                lots.push(lot);
                remaining -= take;
            }

            Ok(lots)
        })
    }

    /// Consumption lots of a sales order, oldest first. The cost trail the
    /// costing computation reads.
    pub async fn consumption_lots_for_order(
        &self,
        sales_order_id: Uuid,
    ) -> ResultEngine<Vec<ConsumptionLot>> {
        with_tx!(self, |db_tx| {
            let models = consumption_lots::Entity::find()
                .filter(consumption_lots::Column::SalesOrderId.eq(sales_order_id.to_string()))
                .order_by_asc(consumption_lots::Column::ConsumedAt)
                .order_by_asc(consumption_lots::Column::Id)
                .all(&db_tx)
                .await?;
            models
                .into_iter()
                .map(ConsumptionLot::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }
}
