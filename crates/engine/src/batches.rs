//! Inventory batch primitives.
//!
//! A `Batch` is the unit of cost accumulation: goods received from one source
//! into one location, with a landed unit cost that grows as expenses are
//! posted against it and a remaining quantity that shrinks as stock is
//! consumed in FIFO order.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, ResultEngine, UnitCost};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Shipment,
    PurchaseOrder,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Shipment => "shipment",
            Self::PurchaseOrder => "purchase_order",
        }
    }
}

impl TryFrom<&str> for SourceKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "shipment" => Ok(Self::Shipment),
            "purchase_order" => Ok(Self::PurchaseOrder),
            other => Err(EngineError::InvalidStatus(format!(
                "invalid source kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationKind {
    Warehouse,
    Store,
}

impl LocationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Warehouse => "warehouse",
            Self::Store => "store",
        }
    }
}

impl TryFrom<&str> for LocationKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "warehouse" => Ok(Self::Warehouse),
            "store" => Ok(Self::Store),
            other => Err(EngineError::InvalidStatus(format!(
                "invalid location kind: {other}"
            ))),
        }
    }
}

/// An inventory batch.
///
/// `quantity_received` is immutable after receiving and is always the divisor
/// for expense allocation, even after partial consumption: earlier
/// consumptions keep the cost they were consumed at, so later expenses must
/// not be spread over fewer units.
///
/// `version` is the optimistic-lock counter. Every write that touches
/// `quantity_remaining` or `landed_unit_cost` is guarded on the version read
/// and bumps it by one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    pub id: Uuid,
    pub product_id: Uuid,
    pub source_kind: SourceKind,
    pub source_id: Uuid,
    pub location_kind: LocationKind,
    pub location_id: Uuid,
    pub quantity_received: i64,
    pub quantity_remaining: i64,
    pub base_unit_cost: UnitCost,
    pub landed_unit_cost: UnitCost,
    pub received_at: DateTime<Utc>,
    pub version: i64,
}

impl Batch {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        product_id: Uuid,
        source_kind: SourceKind,
        source_id: Uuid,
        location_kind: LocationKind,
        location_id: Uuid,
        quantity_received: i64,
        base_unit_cost: UnitCost,
        received_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if quantity_received <= 0 {
            return Err(EngineError::InvalidQuantity(
                "quantity_received must be > 0".to_string(),
            ));
        }
        if base_unit_cost.micro() < 0 {
            return Err(EngineError::InvalidAmount(
                "base unit cost must be >= 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            product_id,
            source_kind,
            source_id,
            location_kind,
            location_id,
            quantity_received,
            quantity_remaining: quantity_received,
            base_unit_cost,
            landed_unit_cost: base_unit_cost,
            received_at,
            version: 0,
        })
    }

    /// Whether the whole received quantity has been consumed.
    #[must_use]
    pub const fn is_fully_consumed(&self) -> bool {
        self.quantity_remaining == 0
    }

    /// Recomputes the landed unit cost from the full expense total.
    ///
    /// `total_expenses` is the sum of all posted expenses plus adjustments,
    /// folded in one pass so the result does not depend on posting order. The
    /// division happens once, against the original received quantity.
    pub fn landed_from_expenses(&self, total_expenses: Money) -> ResultEngine<UnitCost> {
        let spread = UnitCost::allocate(total_expenses, self.quantity_received)?;
        self.base_unit_cost
            .checked_add(spread)
            .ok_or_else(|| EngineError::InvalidAmount("landed unit cost overflow".to_string()))
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "batches")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub product_id: String,
    pub source_kind: String,
    pub source_id: String,
    pub location_kind: String,
    pub location_id: String,
    pub quantity_received: i64,
    pub quantity_remaining: i64,
    pub base_unit_cost_micro: i64,
    pub landed_unit_cost_micro: i64,
    pub received_at: DateTimeUtc,
    pub version: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::batch_expenses::Entity")]
    BatchExpenses,
    #[sea_orm(has_many = "super::consumption_lots::Entity")]
    ConsumptionLots,
}

impl Related<super::batch_expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BatchExpenses.def()
    }
}

impl Related<super::consumption_lots::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ConsumptionLots.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Batch> for ActiveModel {
    fn from(batch: &Batch) -> Self {
        Self {
            id: ActiveValue::Set(batch.id.to_string()),
            product_id: ActiveValue::Set(batch.product_id.to_string()),
            source_kind: ActiveValue::Set(batch.source_kind.as_str().to_string()),
            source_id: ActiveValue::Set(batch.source_id.to_string()),
            location_kind: ActiveValue::Set(batch.location_kind.as_str().to_string()),
            location_id: ActiveValue::Set(batch.location_id.to_string()),
            quantity_received: ActiveValue::Set(batch.quantity_received),
            quantity_remaining: ActiveValue::Set(batch.quantity_remaining),
            base_unit_cost_micro: ActiveValue::Set(batch.base_unit_cost.micro()),
            landed_unit_cost_micro: ActiveValue::Set(batch.landed_unit_cost.micro()),
            received_at: ActiveValue::Set(batch.received_at),
            version: ActiveValue::Set(batch.version),
        }
    }
}

impl TryFrom<Model> for Batch {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("batch not exists".to_string()))?,
            product_id: Uuid::parse_str(&model.product_id)
                .map_err(|_| EngineError::KeyNotFound("product not exists".to_string()))?,
            source_kind: SourceKind::try_from(model.source_kind.as_str())?,
            source_id: Uuid::parse_str(&model.source_id)
                .map_err(|_| EngineError::KeyNotFound("source not exists".to_string()))?,
            location_kind: LocationKind::try_from(model.location_kind.as_str())?,
            location_id: Uuid::parse_str(&model.location_id)
                .map_err(|_| EngineError::KeyNotFound("location not exists".to_string()))?,
            quantity_received: model.quantity_received,
            quantity_remaining: model.quantity_remaining,
            base_unit_cost: UnitCost::from_micro(model.base_unit_cost_micro),
            landed_unit_cost: UnitCost::from_micro(model.landed_unit_cost_micro),
            received_at: model.received_at,
            version: model.version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Money;

    fn batch(quantity: i64, base: &str) -> Batch {
        Batch::new(
            Uuid::new_v4(),
            SourceKind::Shipment,
            Uuid::new_v4(),
            LocationKind::Warehouse,
            Uuid::new_v4(),
            quantity,
            base.parse().unwrap(),
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn new_batch_starts_at_base_cost() {
        let batch = batch(100, "10.00");
        assert_eq!(batch.quantity_remaining, 100);
        assert_eq!(batch.landed_unit_cost, batch.base_unit_cost);
        assert_eq!(batch.version, 0);
        assert!(!batch.is_fully_consumed());
    }

    #[test]
    fn rejects_non_positive_quantity() {
        let result = Batch::new(
            Uuid::new_v4(),
            SourceKind::PurchaseOrder,
            Uuid::new_v4(),
            LocationKind::Store,
            Uuid::new_v4(),
            0,
            UnitCost::ZERO,
            Utc::now(),
        );
        assert!(matches!(result, Err(EngineError::InvalidQuantity(_))));
    }

    #[test]
    fn landed_cost_spreads_over_received_quantity() {
        // 100 units at 10.00, 250.00 freight: landed = 10.00 + 2.50.
        let batch = batch(100, "10.00");
        let landed = batch
            .landed_from_expenses("250.00".parse::<Money>().unwrap())
            .unwrap();
        assert_eq!(landed.to_money().to_string(), "12.50");
    }

    #[test]
    fn landed_cost_is_order_independent() {
        // Folding the total gives the same result whatever the posting order.
        let batch = batch(3, "1.00");
        let a: Money = "0.10".parse().unwrap();
        let b: Money = "0.05".parse().unwrap();
        let ab = batch.landed_from_expenses(a + b).unwrap();
        let ba = batch.landed_from_expenses(b + a).unwrap();
        assert_eq!(ab, ba);
        assert_eq!(ab.micro(), 1_050_000);
    }

    #[test]
    fn landed_cost_keeps_guard_digits() {
        // 1.00 over 3 units must not collapse to a cent boundary.
        let batch = batch(3, "10.00");
        let landed = batch
            .landed_from_expenses("1.00".parse::<Money>().unwrap())
            .unwrap();
        assert_eq!(landed.micro(), 10_333_333);
    }

    #[test]
    fn kind_codes_round_trip() {
        for kind in [SourceKind::Shipment, SourceKind::PurchaseOrder] {
            assert_eq!(SourceKind::try_from(kind.as_str()).unwrap(), kind);
        }
        for kind in [LocationKind::Warehouse, LocationKind::Store] {
            assert_eq!(LocationKind::try_from(kind.as_str()).unwrap(), kind);
        }
        assert!(SourceKind::try_from("donation").is_err());
    }
}
