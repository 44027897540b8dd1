use sea_orm::{ConnectionTrait, DatabaseConnection, EntityTrait};

use crate::{EngineError, ResultEngine, batches};

mod commissions;
mod costing;
mod depletion;
mod invoicing;
mod ledger;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

/// Fetch a batch row or fail with `KeyNotFound`.
pub(in crate::ops) async fn require_batch<C: ConnectionTrait>(
    db: &C,
    batch_id: uuid::Uuid,
) -> ResultEngine<crate::Batch> {
    let model = batches::Entity::find_by_id(batch_id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound("batch not exists".to_string()))?;
    crate::Batch::try_from(model)
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
        })
    }
}
