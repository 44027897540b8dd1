//! Agent sale primitives.
//!
//! An agent sale is drafted with line items, then confirmed exactly once.
//! Confirmation computes commission and net-to-principal totals from a
//! commission rule and freezes the sale; totals are `None` until then, so a
//! draft cannot leak half-computed figures.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money};

/// The commercial arrangement a sale settles under. The rule used at
/// confirmation must declare the same type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommissionType {
    LicenseUse,
    PrincipalCommission,
}

impl CommissionType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LicenseUse => "license_use",
            Self::PrincipalCommission => "principal_commission",
        }
    }
}

impl TryFrom<&str> for CommissionType {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "license_use" => Ok(Self::LicenseUse),
            "principal_commission" => Ok(Self::PrincipalCommission),
            other => Err(EngineError::InvalidStatus(format!(
                "invalid commission type: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentSaleStatus {
    Draft,
    Confirmed,
}

impl AgentSaleStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Confirmed => "confirmed",
        }
    }
}

impl TryFrom<&str> for AgentSaleStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "draft" => Ok(Self::Draft),
            "confirmed" => Ok(Self::Confirmed),
            other => Err(EngineError::InvalidStatus(format!(
                "invalid agent sale status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSale {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub principal_id: Uuid,
    pub commission_type: CommissionType,
    /// Rule bound at draft time. An override passed to confirmation wins.
    pub commission_rule_id: Option<Uuid>,
    pub gross_total: Option<Money>,
    pub commission_total: Option<Money>,
    pub net_principal_total: Option<Money>,
    pub status: AgentSaleStatus,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub items: Vec<super::agent_sale_items::AgentSaleItem>,
}

impl AgentSale {
    pub fn new(
        customer_id: Uuid,
        principal_id: Uuid,
        commission_type: CommissionType,
        commission_rule_id: Option<Uuid>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer_id,
            principal_id,
            commission_type,
            commission_rule_id,
            gross_total: None,
            commission_total: None,
            net_principal_total: None,
            status: AgentSaleStatus::Draft,
            created_at,
            confirmed_at: None,
            items: Vec::new(),
        }
    }

    #[must_use]
    pub const fn is_confirmed(&self) -> bool {
        matches!(self.status, AgentSaleStatus::Confirmed)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "agent_sales")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub customer_id: String,
    pub principal_id: String,
    pub commission_type: String,
    pub commission_rule_id: Option<String>,
    pub gross_total_minor: Option<i64>,
    pub commission_total_minor: Option<i64>,
    pub net_principal_total_minor: Option<i64>,
    pub status: String,
    pub created_at: DateTimeUtc,
    pub confirmed_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::agent_sale_items::Entity")]
    AgentSaleItems,
}

impl Related<super::agent_sale_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AgentSaleItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&AgentSale> for ActiveModel {
    fn from(sale: &AgentSale) -> Self {
        Self {
            id: ActiveValue::Set(sale.id.to_string()),
            customer_id: ActiveValue::Set(sale.customer_id.to_string()),
            principal_id: ActiveValue::Set(sale.principal_id.to_string()),
            commission_type: ActiveValue::Set(sale.commission_type.as_str().to_string()),
            commission_rule_id: ActiveValue::Set(
                sale.commission_rule_id.map(|id| id.to_string()),
            ),
            gross_total_minor: ActiveValue::Set(sale.gross_total.map(Money::minor)),
            commission_total_minor: ActiveValue::Set(sale.commission_total.map(Money::minor)),
            net_principal_total_minor: ActiveValue::Set(
                sale.net_principal_total.map(Money::minor),
            ),
            status: ActiveValue::Set(sale.status.as_str().to_string()),
            created_at: ActiveValue::Set(sale.created_at),
            confirmed_at: ActiveValue::Set(sale.confirmed_at),
        }
    }
}

impl TryFrom<Model> for AgentSale {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("agent sale not exists".to_string()))?,
            customer_id: Uuid::parse_str(&model.customer_id)
                .map_err(|_| EngineError::KeyNotFound("customer not exists".to_string()))?,
            principal_id: Uuid::parse_str(&model.principal_id)
                .map_err(|_| EngineError::KeyNotFound("principal not exists".to_string()))?,
            commission_type: CommissionType::try_from(model.commission_type.as_str())?,
            commission_rule_id: model
                .commission_rule_id
                .map(|s| {
                    Uuid::parse_str(&s)
                        .map_err(|_| EngineError::KeyNotFound("rule not exists".to_string()))
                })
                .transpose()?,
            gross_total: model.gross_total_minor.map(Money::new),
            commission_total: model.commission_total_minor.map(Money::new),
            net_principal_total: model.net_principal_total_minor.map(Money::new),
            status: AgentSaleStatus::try_from(model.status.as_str())?,
            created_at: model.created_at,
            confirmed_at: model.confirmed_at,
            items: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sale_is_an_empty_draft() {
        let sale = AgentSale::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            CommissionType::PrincipalCommission,
            None,
            Utc::now(),
        );
        assert_eq!(sale.status, AgentSaleStatus::Draft);
        assert!(!sale.is_confirmed());
        assert!(sale.gross_total.is_none());
        assert!(sale.commission_total.is_none());
        assert!(sale.net_principal_total.is_none());
        assert!(sale.confirmed_at.is_none());
    }

    #[test]
    fn malformed_rule_reference_is_an_error() {
        let model = Model {
            id: Uuid::new_v4().to_string(),
            customer_id: Uuid::new_v4().to_string(),
            principal_id: Uuid::new_v4().to_string(),
            commission_type: "license_use".to_string(),
            commission_rule_id: Some("not-a-uuid".to_string()),
            gross_total_minor: None,
            commission_total_minor: None,
            net_principal_total_minor: None,
            status: "draft".to_string(),
            created_at: Utc::now(),
            confirmed_at: None,
        };
        assert!(matches!(
            AgentSale::try_from(model),
            Err(EngineError::KeyNotFound(_))
        ));
    }

    #[test]
    fn codes_round_trip() {
        for kind in [CommissionType::LicenseUse, CommissionType::PrincipalCommission] {
            assert_eq!(CommissionType::try_from(kind.as_str()).unwrap(), kind);
        }
        for status in [AgentSaleStatus::Draft, AgentSaleStatus::Confirmed] {
            assert_eq!(AgentSaleStatus::try_from(status.as_str()).unwrap(), status);
        }
        assert!(CommissionType::try_from("flat_fee").is_err());
    }
}
