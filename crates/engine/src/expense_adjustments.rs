//! Signed corrections to posted expenses.
//!
//! Adjustments are append-only: a wrong expense is never edited in place, a
//! delta with a reason is recorded next to it instead.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, ResultEngine};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseAdjustment {
    pub id: Uuid,
    pub batch_expense_id: Uuid,
    pub amount: Money,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl ExpenseAdjustment {
    pub fn new(
        batch_expense_id: Uuid,
        amount: Money,
        reason: String,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if amount.is_zero() {
            return Err(EngineError::InvalidAmount(
                "adjustment amount must be non-zero".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            batch_expense_id,
            amount,
            reason,
            created_at,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "batch_expense_adjustments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub batch_expense_id: String,
    pub amount_minor: i64,
    pub reason: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::batch_expenses::Entity",
        from = "Column::BatchExpenseId",
        to = "super::batch_expenses::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    BatchExpenses,
}

impl Related<super::batch_expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BatchExpenses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&ExpenseAdjustment> for ActiveModel {
    fn from(adjustment: &ExpenseAdjustment) -> Self {
        Self {
            id: ActiveValue::Set(adjustment.id.to_string()),
            batch_expense_id: ActiveValue::Set(adjustment.batch_expense_id.to_string()),
            amount_minor: ActiveValue::Set(adjustment.amount.minor()),
            reason: ActiveValue::Set(adjustment.reason.clone()),
            created_at: ActiveValue::Set(adjustment.created_at),
        }
    }
}

impl TryFrom<Model> for ExpenseAdjustment {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("adjustment not exists".to_string()))?,
            batch_expense_id: Uuid::parse_str(&model.batch_expense_id)
                .map_err(|_| EngineError::KeyNotFound("expense not exists".to_string()))?,
            amount: Money::new(model.amount_minor),
            reason: model.reason,
            created_at: model.created_at,
        })
    }
}
