//! Inventory costing and settlement engine.
//!
//! The engine tracks goods from receiving to settlement:
//!
//! - **Batch ledger**: goods arrive as batches; freight, duty and other
//!   expenses posted against a batch fold into its landed unit cost, always
//!   spread over the original received quantity.
//! - **FIFO depletion**: sales consume stock oldest batch first, freezing the
//!   landed unit cost into immutable consumption lots.
//! - **Costing**: per-invoice revenue, COGS, profit and margin derived from
//!   the frozen lots of the invoice's sales order.
//! - **Commissions**: agent sale drafts confirmed against percentage rules,
//!   producing gross, commission and net-to-principal totals atomically.
//!
//! Amounts cross the boundary as plain decimal strings and are stored as
//! integer minor units ([`Money`]); per-unit costs carry 4 extra guard digits
//! ([`UnitCost`]) so chained computations round only at presentation.
//!
//! All state lives in a sea-orm database; every multi-step write runs inside
//! one transaction. Writes that race on the same batch or sale are resolved
//! optimistically: the loser gets [`EngineError::ConcurrentModification`] and
//! may retry.

pub mod agent_sale_items;
pub mod agent_sales;
pub mod batch_expenses;
pub mod batches;
mod commands;
pub mod commission_rules;
pub mod consumption_lots;
pub mod costings;
mod currency;
mod error;
pub mod expense_adjustments;
pub mod invoice_items;
pub mod invoices;
mod money;
mod ops;

pub use agent_sale_items::AgentSaleItem;
pub use agent_sales::{AgentSale, AgentSaleStatus, CommissionType};
pub use batch_expenses::{BatchExpense, ExpenseKind};
pub use batches::{Batch, LocationKind, SourceKind};
pub use commands::{
    DepleteStockCmd, IssueInvoiceCmd, LineItemCmd, NewAgentSaleCmd, NewCommissionRuleCmd,
    PostAdjustmentCmd, PostExpenseCmd, ReceiveBatchCmd,
};
pub use commission_rules::{BasisType, CommissionRule};
pub use consumption_lots::ConsumptionLot;
pub use costings::Costing;
pub use currency::Currency;
pub use error::EngineError;
pub use expense_adjustments::ExpenseAdjustment;
pub use invoice_items::InvoiceItem;
pub use invoices::{Invoice, InvoiceStatus};
pub use money::{Money, Percent, UnitCost};
pub use ops::{Engine, EngineBuilder};

pub type ResultEngine<T> = Result<T, EngineError>;
