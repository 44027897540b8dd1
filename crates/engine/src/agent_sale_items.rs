//! Agent sale line items.
//!
//! The gross total of a sale is the sum of its line totals, computed at
//! confirmation time over whatever items the draft holds then.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, ResultEngine};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSaleItem {
    pub id: Uuid,
    pub agent_sale_id: Uuid,
    pub description: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub line_total: Money,
}

impl AgentSaleItem {
    pub fn new(
        agent_sale_id: Uuid,
        description: String,
        quantity: i64,
        unit_price: Money,
    ) -> ResultEngine<Self> {
        if quantity <= 0 {
            return Err(EngineError::InvalidQuantity(
                "item quantity must be > 0".to_string(),
            ));
        }
        let line_total = unit_price.times(quantity)?;
        Ok(Self {
            id: Uuid::new_v4(),
            agent_sale_id,
            description,
            quantity,
            unit_price,
            line_total,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "agent_sale_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub agent_sale_id: String,
    pub description: String,
    pub quantity: i64,
    pub unit_price_minor: i64,
    pub line_total_minor: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::agent_sales::Entity",
        from = "Column::AgentSaleId",
        to = "super::agent_sales::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    AgentSales,
}

impl Related<super::agent_sales::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AgentSales.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&AgentSaleItem> for ActiveModel {
    fn from(item: &AgentSaleItem) -> Self {
        Self {
            id: ActiveValue::Set(item.id.to_string()),
            agent_sale_id: ActiveValue::Set(item.agent_sale_id.to_string()),
            description: ActiveValue::Set(item.description.clone()),
            quantity: ActiveValue::Set(item.quantity),
            unit_price_minor: ActiveValue::Set(item.unit_price.minor()),
            line_total_minor: ActiveValue::Set(item.line_total.minor()),
        }
    }
}

impl TryFrom<Model> for AgentSaleItem {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("sale item not exists".to_string()))?,
            agent_sale_id: Uuid::parse_str(&model.agent_sale_id)
                .map_err(|_| EngineError::KeyNotFound("agent sale not exists".to_string()))?,
            description: model.description,
            quantity: model.quantity,
            unit_price: Money::new(model.unit_price_minor),
            line_total: Money::new(model.line_total_minor),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_total_is_derived() {
        let item = AgentSaleItem::new(
            Uuid::new_v4(),
            "annual licence".to_string(),
            2,
            "500.00".parse().unwrap(),
        )
        .unwrap();
        assert_eq!(item.line_total.to_string(), "1000.00");
    }

    #[test]
    fn rejects_non_positive_quantity() {
        let result =
            AgentSaleItem::new(Uuid::new_v4(), "licence".to_string(), -1, Money::new(100));
        assert!(matches!(result, Err(EngineError::InvalidQuantity(_))));
    }
}
