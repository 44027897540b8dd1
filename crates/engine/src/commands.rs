//! Command structs for engine operations.
//!
//! These types group parameters for write operations (receive/expense/
//! deplete/invoice/sale), keeping call sites readable and avoiding long
//! argument lists. Amounts are carried as plain decimal strings and parsed
//! by the engine, so callers never handle binary floats.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    agent_sales::CommissionType,
    batch_expenses::ExpenseKind,
    batches::{LocationKind, SourceKind},
    currency::Currency,
};

/// Receive a batch of goods into a location.
#[derive(Clone, Debug)]
pub struct ReceiveBatchCmd {
    pub product_id: Uuid,
    pub source_kind: SourceKind,
    pub source_id: Uuid,
    pub location_kind: LocationKind,
    pub location_id: Uuid,
    pub quantity: i64,
    pub base_unit_cost: String,
    pub received_at: DateTime<Utc>,
}

impl ReceiveBatchCmd {
    #[must_use]
    pub fn new(
        product_id: Uuid,
        quantity: i64,
        base_unit_cost: impl Into<String>,
        received_at: DateTime<Utc>,
    ) -> Self {
        Self {
            product_id,
            source_kind: SourceKind::Shipment,
            source_id: Uuid::nil(),
            location_kind: LocationKind::Warehouse,
            location_id: Uuid::nil(),
            quantity,
            base_unit_cost: base_unit_cost.into(),
            received_at,
        }
    }

    #[must_use]
    pub fn source(mut self, kind: SourceKind, id: Uuid) -> Self {
        self.source_kind = kind;
        self.source_id = id;
        self
    }

    #[must_use]
    pub fn location(mut self, kind: LocationKind, id: Uuid) -> Self {
        self.location_kind = kind;
        self.location_id = id;
        self
    }
}

/// Post an expense against a batch.
#[derive(Clone, Debug)]
pub struct PostExpenseCmd {
    pub batch_id: Uuid,
    pub kind: ExpenseKind,
    pub amount: String,
    pub expense_date: DateTime<Utc>,
}

impl PostExpenseCmd {
    #[must_use]
    pub fn new(
        batch_id: Uuid,
        kind: ExpenseKind,
        amount: impl Into<String>,
        expense_date: DateTime<Utc>,
    ) -> Self {
        Self {
            batch_id,
            kind,
            amount: amount.into(),
            expense_date,
        }
    }
}

/// Post a signed correction against a posted expense.
#[derive(Clone, Debug)]
pub struct PostAdjustmentCmd {
    pub batch_expense_id: Uuid,
    pub amount: String,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl PostAdjustmentCmd {
    #[must_use]
    pub fn new(
        batch_expense_id: Uuid,
        amount: impl Into<String>,
        reason: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            batch_expense_id,
            amount: amount.into(),
            reason: reason.into(),
            created_at,
        }
    }
}

/// Consume stock for one sales order line, FIFO across batches.
#[derive(Clone, Debug)]
pub struct DepleteStockCmd {
    pub product_id: Uuid,
    pub location_kind: LocationKind,
    pub location_id: Uuid,
    pub quantity: i64,
    pub sales_order_id: Uuid,
    pub sales_order_item_id: Uuid,
    pub consumed_at: DateTime<Utc>,
}

impl DepleteStockCmd {
    #[must_use]
    pub fn new(
        product_id: Uuid,
        quantity: i64,
        sales_order_id: Uuid,
        sales_order_item_id: Uuid,
        consumed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            product_id,
            location_kind: LocationKind::Warehouse,
            location_id: Uuid::nil(),
            quantity,
            sales_order_id,
            sales_order_item_id,
            consumed_at,
        }
    }

    #[must_use]
    pub fn location(mut self, kind: LocationKind, id: Uuid) -> Self {
        self.location_kind = kind;
        self.location_id = id;
        self
    }
}

/// One line of an invoice or an agent sale.
#[derive(Clone, Debug)]
pub struct LineItemCmd {
    pub description: String,
    pub quantity: i64,
    pub unit_price: String,
}

impl LineItemCmd {
    #[must_use]
    pub fn new(description: impl Into<String>, quantity: i64, unit_price: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            quantity,
            unit_price: unit_price.into(),
        }
    }
}

/// Issue an invoice against a sales order.
///
/// `subtotal` must equal the sum of the line totals and `total` must equal
/// `subtotal + tax`; the engine rejects the command otherwise.
#[derive(Clone, Debug)]
pub struct IssueInvoiceCmd {
    pub sales_order_id: Uuid,
    pub subtotal: String,
    pub tax: String,
    pub total: String,
    pub currency: Currency,
    pub issued_at: DateTime<Utc>,
    pub items: Vec<LineItemCmd>,
}

impl IssueInvoiceCmd {
    #[must_use]
    pub fn new(
        sales_order_id: Uuid,
        subtotal: impl Into<String>,
        tax: impl Into<String>,
        total: impl Into<String>,
        issued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            sales_order_id,
            subtotal: subtotal.into(),
            tax: tax.into(),
            total: total.into(),
            currency: Currency::default(),
            issued_at,
            items: Vec::new(),
        }
    }

    #[must_use]
    pub fn currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    #[must_use]
    pub fn item(mut self, item: LineItemCmd) -> Self {
        self.items.push(item);
        self
    }
}

/// Open an agent sale draft.
#[derive(Clone, Debug)]
pub struct NewAgentSaleCmd {
    pub customer_id: Uuid,
    pub principal_id: Uuid,
    pub commission_type: CommissionType,
    pub commission_rule_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl NewAgentSaleCmd {
    #[must_use]
    pub fn new(
        customer_id: Uuid,
        principal_id: Uuid,
        commission_type: CommissionType,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            customer_id,
            principal_id,
            commission_type,
            commission_rule_id: None,
            created_at,
        }
    }

    #[must_use]
    pub fn commission_rule_id(mut self, rule_id: Uuid) -> Self {
        self.commission_rule_id = Some(rule_id);
        self
    }
}

/// Create a commission rule.
#[derive(Clone, Debug)]
pub struct NewCommissionRuleCmd {
    pub name: String,
    pub commission_type: CommissionType,
    /// Percentage of gross as a decimal string, e.g. "5" or "2.50".
    pub value: String,
    pub currency: Currency,
    pub valid_from: DateTime<Utc>,
    pub valid_to: Option<DateTime<Utc>>,
}

impl NewCommissionRuleCmd {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        commission_type: CommissionType,
        value: impl Into<String>,
        valid_from: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            commission_type,
            value: value.into(),
            currency: Currency::default(),
            valid_from,
            valid_to: None,
        }
    }

    #[must_use]
    pub fn currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    #[must_use]
    pub fn valid_to(mut self, valid_to: DateTime<Utc>) -> Self {
        self.valid_to = Some(valid_to);
        self
    }
}
