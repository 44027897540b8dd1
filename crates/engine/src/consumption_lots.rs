//! Consumption lots.
//!
//! A lot records one slice of stock taken from one batch for one sales order
//! line, with the landed unit cost **frozen at consumption time**. Lots are
//! immutable: expenses posted to the batch afterwards never change them.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, UnitCost};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumptionLot {
    pub id: Uuid,
    pub batch_id: Uuid,
    pub sales_order_id: Uuid,
    pub sales_order_item_id: Uuid,
    pub quantity_consumed: i64,
    /// Landed unit cost of the batch at the instant of consumption.
    pub unit_cost: UnitCost,
    pub consumed_at: DateTime<Utc>,
}

impl ConsumptionLot {
    pub fn new(
        batch_id: Uuid,
        sales_order_id: Uuid,
        sales_order_item_id: Uuid,
        quantity_consumed: i64,
        unit_cost: UnitCost,
        consumed_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if quantity_consumed <= 0 {
            return Err(EngineError::InvalidQuantity(
                "quantity_consumed must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            batch_id,
            sales_order_id,
            sales_order_item_id,
            quantity_consumed,
            unit_cost,
            consumed_at,
        })
    }

    /// Exact cost of the lot in micro units. Summed across lots and rounded
    /// once by the costing computation.
    #[must_use]
    pub fn cost_micro(&self) -> i128 {
        self.unit_cost.total_for(self.quantity_consumed)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "consumption_lots")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub batch_id: String,
    pub sales_order_id: String,
    pub sales_order_item_id: String,
    pub quantity_consumed: i64,
    pub unit_cost_micro: i64,
    pub consumed_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::batches::Entity",
        from = "Column::BatchId",
        to = "super::batches::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Batches,
}

impl Related<super::batches::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Batches.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&ConsumptionLot> for ActiveModel {
    fn from(lot: &ConsumptionLot) -> Self {
        Self {
            id: ActiveValue::Set(lot.id.to_string()),
            batch_id: ActiveValue::Set(lot.batch_id.to_string()),
            sales_order_id: ActiveValue::Set(lot.sales_order_id.to_string()),
            sales_order_item_id: ActiveValue::Set(lot.sales_order_item_id.to_string()),
            quantity_consumed: ActiveValue::Set(lot.quantity_consumed),
            unit_cost_micro: ActiveValue::Set(lot.unit_cost.micro()),
            consumed_at: ActiveValue::Set(lot.consumed_at),
        }
    }
}

impl TryFrom<Model> for ConsumptionLot {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("lot not exists".to_string()))?,
            batch_id: Uuid::parse_str(&model.batch_id)
                .map_err(|_| EngineError::KeyNotFound("batch not exists".to_string()))?,
            sales_order_id: Uuid::parse_str(&model.sales_order_id)
                .map_err(|_| EngineError::KeyNotFound("sales order not exists".to_string()))?,
            sales_order_item_id: Uuid::parse_str(&model.sales_order_item_id)
                .map_err(|_| EngineError::KeyNotFound("sales order item not exists".to_string()))?,
            quantity_consumed: model.quantity_consumed,
            unit_cost: UnitCost::from_micro(model.unit_cost_micro),
            consumed_at: model.consumed_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Money;

    #[test]
    fn rejects_non_positive_quantity() {
        let result = ConsumptionLot::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            0,
            UnitCost::ZERO,
            Utc::now(),
        );
        assert!(matches!(result, Err(EngineError::InvalidQuantity(_))));
    }

    #[test]
    fn lot_cost_is_exact_in_micro_units() {
        // 3 units at 10.333333: cost rounds to 31.00 only when presented.
        let lot = ConsumptionLot::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            3,
            UnitCost::from_micro(10_333_333),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(lot.cost_micro(), 30_999_999);
        assert_eq!(
            Money::from_micro_total(lot.cost_micro()).unwrap().to_string(),
            "31.00"
        );
    }
}
