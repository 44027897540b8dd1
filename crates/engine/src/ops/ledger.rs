//! Batch ledger operations: receiving, expense posting and landed cost.

use sea_orm::{
    DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*, sea_query::Expr,
};
use tracing::debug;
use uuid::Uuid;

use crate::{
    Batch, BatchExpense, EngineError, ExpenseAdjustment, Money, PostAdjustmentCmd, PostExpenseCmd,
    ReceiveBatchCmd, ResultEngine, UnitCost, batch_expenses, batches, expense_adjustments,
};

use super::{Engine, require_batch, with_tx};

impl Engine {
    /// Receive a batch of goods.
    ///
    /// The landed unit cost starts equal to the base unit cost and the whole
    /// received quantity is available for consumption.
    #[tracing::instrument(skip(self))]
    pub async fn receive_batch(&self, cmd: ReceiveBatchCmd) -> ResultEngine<Batch> {
        let base: UnitCost = cmd.base_unit_cost.parse()?;
        let batch = Batch::new(
            cmd.product_id,
            cmd.source_kind,
            cmd.source_id,
            cmd.location_kind,
            cmd.location_id,
            cmd.quantity,
            base,
            cmd.received_at,
        )?;
        with_tx!(self, |db_tx| {
            batches::ActiveModel::from(&batch).insert(&db_tx).await?;
            debug!(batch_id = %batch.id, quantity = batch.quantity_received, "batch received");
            Ok(batch)
        })
    }

    /// Post an expense against a batch and fold it into the landed unit cost.
    ///
    /// Expenses always spread over the **original** received quantity, even
    /// after partial consumption, so the result does not depend on posting
    /// order relative to depletions.
    #[tracing::instrument(skip(self))]
    pub async fn post_expense(&self, cmd: PostExpenseCmd) -> ResultEngine<BatchExpense> {
        let amount: Money = cmd.amount.parse()?;
        let expense = BatchExpense::new(cmd.batch_id, cmd.kind, amount, cmd.expense_date)?;
        with_tx!(self, |db_tx| {
            let batch = require_batch(&db_tx, cmd.batch_id).await?;
            batch_expenses::ActiveModel::from(&expense)
                .insert(&db_tx)
                .await?;
            let landed = self.refresh_landed_cost(&db_tx, &batch).await?;
            debug!(batch_id = %batch.id, landed = %landed, "landed cost refreshed");
            Ok(expense)
        })
    }

    /// Post a signed correction against a posted expense.
    ///
    /// Rejected with `BatchFullyConsumed` once the batch has no remaining
    /// quantity: its cost history is frozen with the consumptions that
    /// referenced it. A correction may never drive the batch's cumulative
    /// expense total negative, so the landed unit cost stays at or above the
    /// base unit cost.
    #[tracing::instrument(skip(self))]
    pub async fn post_adjustment(&self, cmd: PostAdjustmentCmd) -> ResultEngine<ExpenseAdjustment> {
        let amount: Money = cmd.amount.parse()?;
        let adjustment =
            ExpenseAdjustment::new(cmd.batch_expense_id, amount, cmd.reason, cmd.created_at)?;
        with_tx!(self, |db_tx| {
            let expense_model = batch_expenses::Entity::find_by_id(cmd.batch_expense_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("expense not exists".to_string()))?;
            let expense = BatchExpense::try_from(expense_model)?;
            let batch = require_batch(&db_tx, expense.batch_id).await?;
            if batch.is_fully_consumed() {
                return Err(EngineError::BatchFullyConsumed(batch.id.to_string()));
            }
            let total = expense_total(&db_tx, batch.id).await?;
            let adjusted = total.checked_add(adjustment.amount).ok_or_else(|| {
                EngineError::InvalidAmount("expense total overflow".to_string())
            })?;
            if adjusted.is_negative() {
                return Err(EngineError::InvalidAmount(format!(
                    "adjustment drives batch {} expense total negative",
                    batch.id
                )));
            }
            expense_adjustments::ActiveModel::from(&adjustment)
                .insert(&db_tx)
                .await?;
            let landed = self.refresh_landed_cost(&db_tx, &batch).await?;
            debug!(batch_id = %batch.id, landed = %landed, "landed cost refreshed");
            Ok(adjustment)
        })
    }

    /// Current landed unit cost of a batch. The single authoritative read.
    pub async fn landed_unit_cost(&self, batch_id: Uuid) -> ResultEngine<UnitCost> {
        let batch = self.batch(batch_id).await?;
        Ok(batch.landed_unit_cost)
    }

    /// Return a [`Batch`] (snapshot from DB).
    pub async fn batch(&self, batch_id: Uuid) -> ResultEngine<Batch> {
        with_tx!(self, |db_tx| require_batch(&db_tx, batch_id).await)
    }

    /// Expenses of a batch, each with its adjustments, oldest first.
    pub async fn expenses_for_batch(
        &self,
        batch_id: Uuid,
    ) -> ResultEngine<Vec<(BatchExpense, Vec<ExpenseAdjustment>)>> {
        with_tx!(self, |db_tx| {
            require_batch(&db_tx, batch_id).await?;
            let expense_models = batch_expenses::Entity::find()
                .filter(batch_expenses::Column::BatchId.eq(batch_id.to_string()))
                .order_by_asc(batch_expenses::Column::ExpenseDate)
                .order_by_asc(batch_expenses::Column::Id)
                .all(&db_tx)
                .await?;
            let mut result = Vec::with_capacity(expense_models.len());
            for model in expense_models {
                let expense = BatchExpense::try_from(model)?;
                let adjustment_models = expense_adjustments::Entity::find()
                    .filter(
                        expense_adjustments::Column::BatchExpenseId.eq(expense.id.to_string()),
                    )
                    .order_by_asc(expense_adjustments::Column::CreatedAt)
                    .order_by_asc(expense_adjustments::Column::Id)
                    .all(&db_tx)
                    .await?;
                let adjustments = adjustment_models
                    .into_iter()
                    .map(ExpenseAdjustment::try_from)
                    .collect::<ResultEngine<Vec<_>>>()?;
                result.push((expense, adjustments));
            }
            Ok(result)
        })
    }

    /// Recompute the landed unit cost of `batch` from the full expense total
    /// and persist it with an optimistic-lock guard on the version read.
    async fn refresh_landed_cost(
        &self,
        db_tx: &DatabaseTransaction,
        batch: &Batch,
    ) -> ResultEngine<UnitCost> {
        let total = expense_total(db_tx, batch.id).await?;
        let landed = batch.landed_from_expenses(total)?;

        let update = batches::Entity::update_many()
            .col_expr(
                batches::Column::LandedUnitCostMicro,
                Expr::value(landed.micro()),
            )
            .col_expr(batches::Column::Version, Expr::value(batch.version + 1))
            .filter(batches::Column::Id.eq(batch.id.to_string()))
            .filter(batches::Column::Version.eq(batch.version))
            .exec(db_tx)
            .await?;
        if update.rows_affected == 0 {
            return Err(EngineError::ConcurrentModification(format!(
                "batch {}",
                batch.id
            )));
        }

        Ok(landed)
    }
}

/// Sum of all expenses and adjustments posted against a batch.
async fn expense_total(db_tx: &DatabaseTransaction, batch_id: Uuid) -> ResultEngine<Money> {
    let expense_models = batch_expenses::Entity::find()
        .filter(batch_expenses::Column::BatchId.eq(batch_id.to_string()))
        .all(db_tx)
        .await?;

    let mut total = Money::ZERO;
    let mut expense_ids = Vec::with_capacity(expense_models.len());
    for model in &expense_models {
        total = total
            .checked_add(Money::new(model.amount_minor))
            .ok_or_else(|| EngineError::InvalidAmount("expense total overflow".to_string()))?;
        expense_ids.push(model.id.clone());
    }

    if !expense_ids.is_empty() {
        let adjustment_models = expense_adjustments::Entity::find()
            .filter(expense_adjustments::Column::BatchExpenseId.is_in(expense_ids))
            .all(db_tx)
            .await?;
        for model in &adjustment_models {
            total = total
                .checked_add(Money::new(model.amount_minor))
                .ok_or_else(|| EngineError::InvalidAmount("expense total overflow".to_string()))?;
        }
    }

    Ok(total)
}
