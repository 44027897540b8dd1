//! Invoice primitives.
//!
//! The engine owns the invoice rows it costs. An invoice is issued against a
//! sales order; its pre-tax subtotal is the revenue side of the costing
//! computation.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, EngineError, Money, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Issued,
    Cancelled,
}

impl InvoiceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Issued => "issued",
            Self::Cancelled => "cancelled",
        }
    }
}

impl TryFrom<&str> for InvoiceStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "issued" => Ok(Self::Issued),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(EngineError::InvalidStatus(format!(
                "invalid invoice status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: Uuid,
    pub sales_order_id: Uuid,
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
    pub currency: Currency,
    pub status: InvoiceStatus,
    pub issued_at: DateTime<Utc>,
    pub items: Vec<super::invoice_items::InvoiceItem>,
}

impl Invoice {
    /// Creates an issued invoice. `total` must equal `subtotal + tax`.
    pub fn new(
        sales_order_id: Uuid,
        subtotal: Money,
        tax: Money,
        total: Money,
        currency: Currency,
        issued_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if subtotal.is_negative() || tax.is_negative() {
            return Err(EngineError::InvalidAmount(
                "subtotal and tax must be >= 0".to_string(),
            ));
        }
        if subtotal + tax != total {
            return Err(EngineError::InvalidAmount(format!(
                "total {total} does not equal subtotal {subtotal} + tax {tax}"
            )));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            sales_order_id,
            subtotal,
            tax,
            total,
            currency,
            status: InvoiceStatus::Issued,
            issued_at,
            items: Vec::new(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub sales_order_id: String,
    pub subtotal_minor: i64,
    pub tax_minor: i64,
    pub total_minor: i64,
    pub currency: String,
    pub status: String,
    pub issued_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::invoice_items::Entity")]
    InvoiceItems,
    #[sea_orm(has_one = "super::costings::Entity")]
    Costings,
}

impl Related<super::invoice_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InvoiceItems.def()
    }
}

impl Related<super::costings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Costings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Invoice> for ActiveModel {
    fn from(invoice: &Invoice) -> Self {
        Self {
            id: ActiveValue::Set(invoice.id.to_string()),
            sales_order_id: ActiveValue::Set(invoice.sales_order_id.to_string()),
            subtotal_minor: ActiveValue::Set(invoice.subtotal.minor()),
            tax_minor: ActiveValue::Set(invoice.tax.minor()),
            total_minor: ActiveValue::Set(invoice.total.minor()),
            currency: ActiveValue::Set(invoice.currency.code().to_string()),
            status: ActiveValue::Set(invoice.status.as_str().to_string()),
            issued_at: ActiveValue::Set(invoice.issued_at),
        }
    }
}

impl TryFrom<Model> for Invoice {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::InvoiceNotFound(model.id.clone()))?,
            sales_order_id: Uuid::parse_str(&model.sales_order_id)
                .map_err(|_| EngineError::KeyNotFound("sales order not exists".to_string()))?,
            subtotal: Money::new(model.subtotal_minor),
            tax: Money::new(model.tax_minor),
            total: Money::new(model.total_minor),
            currency: Currency::try_from(model.currency.as_str())?,
            status: InvoiceStatus::try_from(model.status.as_str())?,
            issued_at: model.issued_at,
            items: Vec::new(),
        })
    }
}
