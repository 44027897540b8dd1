//! Invoice line items.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, ResultEngine};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceItem {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub description: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub line_total: Money,
}

impl InvoiceItem {
    /// Creates a line item; `line_total` is derived as `unit_price × quantity`.
    pub fn new(
        invoice_id: Uuid,
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
            invoice_id,
            description,
            quantity,
            unit_price,
            line_total,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "invoice_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub invoice_id: String,
    pub description: String,
    pub quantity: i64,
    pub unit_price_minor: i64,
    pub line_total_minor: i64,
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

impl From<&InvoiceItem> for ActiveModel {
    fn from(item: &InvoiceItem) -> Self {
        Self {
            id: ActiveValue::Set(item.id.to_string()),
            invoice_id: ActiveValue::Set(item.invoice_id.to_string()),
            description: ActiveValue::Set(item.description.clone()),
            quantity: ActiveValue::Set(item.quantity),
            unit_price_minor: ActiveValue::Set(item.unit_price.minor()),
            line_total_minor: ActiveValue::Set(item.line_total.minor()),
        }
    }
}

impl TryFrom<Model> for InvoiceItem {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("invoice item not exists".to_string()))?,
            invoice_id: Uuid::parse_str(&model.invoice_id)
                .map_err(|_| EngineError::InvoiceNotFound(model.invoice_id.clone()))?,
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
        let item = InvoiceItem::new(
            Uuid::new_v4(),
            "widget".to_string(),
            4,
            "2.50".parse().unwrap(),
        )
        .unwrap();
        assert_eq!(item.line_total.to_string(), "10.00");
    }

    #[test]
    fn rejects_non_positive_quantity() {
        let result = InvoiceItem::new(Uuid::new_v4(), "widget".to_string(), 0, Money::new(250));
        assert!(matches!(result, Err(EngineError::InvalidQuantity(_))));
    }
}
