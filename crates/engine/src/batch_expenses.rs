//! Expenses posted against a batch.
//!
//! An expense is strictly positive; signed corrections are modelled as
//! append-only adjustments so the audit trail is never rewritten.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseKind {
    Freight,
    Duty,
    Handling,
    Other,
}

impl ExpenseKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Freight => "freight",
            Self::Duty => "duty",
            Self::Handling => "handling",
            Self::Other => "other",
        }
    }
}

impl TryFrom<&str> for ExpenseKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "freight" => Ok(Self::Freight),
            "duty" => Ok(Self::Duty),
            "handling" => Ok(Self::Handling),
            "other" => Ok(Self::Other),
            other => Err(EngineError::InvalidStatus(format!(
                "invalid expense kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchExpense {
    pub id: Uuid,
    pub batch_id: Uuid,
    pub kind: ExpenseKind,
    pub amount: Money,
    pub expense_date: DateTime<Utc>,
}

impl BatchExpense {
    pub fn new(
        batch_id: Uuid,
        kind: ExpenseKind,
        amount: Money,
        expense_date: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount(
                "expense amount must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            batch_id,
            kind,
            amount,
            expense_date,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "batch_expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub batch_id: String,
    pub kind: String,
    pub amount_minor: i64,
    pub expense_date: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::batches::Entity",
        from = "Column::BatchId",
        to = "super::batches::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Batches,
    #[sea_orm(has_many = "super::expense_adjustments::Entity")]
    Adjustments,
}

impl Related<super::batches::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Batches.def()
    }
}

impl Related<super::expense_adjustments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Adjustments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&BatchExpense> for ActiveModel {
    fn from(expense: &BatchExpense) -> Self {
        Self {
            id: ActiveValue::Set(expense.id.to_string()),
            batch_id: ActiveValue::Set(expense.batch_id.to_string()),
            kind: ActiveValue::Set(expense.kind.as_str().to_string()),
            amount_minor: ActiveValue::Set(expense.amount.minor()),
            expense_date: ActiveValue::Set(expense.expense_date),
        }
    }
}

impl TryFrom<Model> for BatchExpense {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("expense not exists".to_string()))?,
            batch_id: Uuid::parse_str(&model.batch_id)
                .map_err(|_| EngineError::KeyNotFound("batch not exists".to_string()))?,
            kind: ExpenseKind::try_from(model.kind.as_str())?,
            amount: Money::new(model.amount_minor),
            expense_date: model.expense_date,
        })
    }
}
