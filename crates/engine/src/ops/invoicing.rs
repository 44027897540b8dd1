//! Invoice issuance and cancellation.

use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{
    EngineError, Invoice, InvoiceItem, IssueInvoiceCmd, Money, ResultEngine, invoice_items,
    invoices,
    invoices::InvoiceStatus,
};

use super::{Engine, with_tx};

impl Engine {
    /// Issue an invoice with its line items.
    ///
    /// The stated subtotal must equal the sum of the line totals and the
    /// stated total must equal `subtotal + tax`; a mismatch is rejected with
    /// `InvalidAmount` before anything is written.
    #[tracing::instrument(skip(self))]
    pub async fn issue_invoice(&self, cmd: IssueInvoiceCmd) -> ResultEngine<Invoice> {
        let subtotal: Money = cmd.subtotal.parse()?;
        let tax: Money = cmd.tax.parse()?;
        let total: Money = cmd.total.parse()?;
        let mut invoice = Invoice::new(
            cmd.sales_order_id,
            subtotal,
            tax,
            total,
            cmd.currency,
            cmd.issued_at,
        )?;

        let mut items = Vec::with_capacity(cmd.items.len());
        let mut items_total = Money::ZERO;
        for item_cmd in &cmd.items {
            let unit_price: Money = item_cmd.unit_price.parse()?;
            let item = InvoiceItem::new(
                invoice.id,
                item_cmd.description.clone(),
                item_cmd.quantity,
                unit_price,
            )?;
            items_total = items_total
                .checked_add(item.line_total)
                .ok_or_else(|| EngineError::InvalidAmount("invoice total overflow".to_string()))?;
            items.push(item);
        }
        if !items.is_empty() && items_total != subtotal {
            return Err(EngineError::InvalidAmount(format!(
                "subtotal {subtotal} does not match line totals {items_total}"
            )));
        }

        with_tx!(self, |db_tx| {
            invoices::ActiveModel::from(&invoice).insert(&db_tx).await?;
            for item in &items {
                invoice_items::ActiveModel::from(item).insert(&db_tx).await?;
            }
            invoice.items = items;
            Ok(invoice)
        })
    }

    /// Cancel an issued invoice. The only legal transition is
    /// `issued → cancelled`; cancelling twice fails with `InvalidStatus`.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_invoice(&self, invoice_id: Uuid) -> ResultEngine<Invoice> {
        with_tx!(self, |db_tx| {
            let model = invoices::Entity::find_by_id(invoice_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::InvoiceNotFound(invoice_id.to_string()))?;
            let mut invoice = Invoice::try_from(model)?;
            if invoice.status == InvoiceStatus::Cancelled {
                return Err(EngineError::InvalidStatus(format!(
                    "invoice {invoice_id} is already cancelled"
                )));
            }

            let update = invoices::Entity::update_many()
                .col_expr(
                    invoices::Column::Status,
                    Expr::value(InvoiceStatus::Cancelled.as_str()),
                )
                .filter(invoices::Column::Id.eq(invoice_id.to_string()))
                .filter(invoices::Column::Status.eq(InvoiceStatus::Issued.as_str()))
                .exec(&db_tx)
                .await?;
            if update.rows_affected == 0 {
                return Err(EngineError::ConcurrentModification(format!(
                    "invoice {invoice_id}"
                )));
            }

            invoice.status = InvoiceStatus::Cancelled;
            Ok(invoice)
        })
    }

    /// Return an [`Invoice`] with its line items (snapshot from DB).
    pub async fn invoice(&self, invoice_id: Uuid) -> ResultEngine<Invoice> {
        with_tx!(self, |db_tx| {
            let model = invoices::Entity::find_by_id(invoice_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::InvoiceNotFound(invoice_id.to_string()))?;
            let mut invoice = Invoice::try_from(model)?;
            let item_models = invoice_items::Entity::find()
                .filter(invoice_items::Column::InvoiceId.eq(invoice_id.to_string()))
                .order_by_asc(invoice_items::Column::Id)
                .all(&db_tx)
                .await?;
            invoice.items = item_models
                .into_iter()
                .map(InvoiceItem::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;
            Ok(invoice)
        })
    }
}
