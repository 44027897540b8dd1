//! Initial schema migration - creates all tables from scratch.
//!
//! It creates the complete schema for the costing engine:
//!
//! - `batches`: received goods with base and landed unit cost
//! - `batch_expenses`: freight/duty/handling posted against a batch
//! - `batch_expense_adjustments`: append-only signed corrections
//! - `consumption_lots`: FIFO consumptions with frozen unit cost
//! - `invoices` / `invoice_items`: the revenue side of costing
//! - `costings`: derived revenue/COGS/profit/margin per invoice
//! - `agent_sales` / `agent_sale_items`: commission settlement drafts
//! - `commission_rules`: percentage rules with validity windows

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Batches {
    Table,
    Id,
    ProductId,
    SourceKind,
    SourceId,
    LocationKind,
    LocationId,
    QuantityReceived,
    QuantityRemaining,
    BaseUnitCostMicro,
    LandedUnitCostMicro,
    ReceivedAt,
    Version,
}

#[derive(Iden)]
enum BatchExpenses {
    Table,
    Id,
    BatchId,
    Kind,
    AmountMinor,
    ExpenseDate,
}

#[derive(Iden)]
enum BatchExpenseAdjustments {
    Table,
    Id,
    BatchExpenseId,
    AmountMinor,
    Reason,
    CreatedAt,
}

#[derive(Iden)]
enum ConsumptionLots {
    Table,
    Id,
    BatchId,
    SalesOrderId,
    SalesOrderItemId,
    QuantityConsumed,
    UnitCostMicro,
    ConsumedAt,
}

#[derive(Iden)]
enum Invoices {
    Table,
    Id,
    SalesOrderId,
    SubtotalMinor,
    TaxMinor,
    TotalMinor,
    Currency,
    Status,
    IssuedAt,
}

#[derive(Iden)]
enum InvoiceItems {
    Table,
    Id,
    InvoiceId,
    Description,
    Quantity,
    UnitPriceMinor,
    LineTotalMinor,
}

#[derive(Iden)]
enum Costings {
    Table,
    InvoiceId,
    RevenueMinor,
    CogsMinor,
    ProfitMinor,
    MarginPercentHundredths,
    ComputedAt,
}

#[derive(Iden)]
enum AgentSales {
    Table,
    Id,
    CustomerId,
    PrincipalId,
    CommissionType,
    CommissionRuleId,
    GrossTotalMinor,
    CommissionTotalMinor,
    NetPrincipalTotalMinor,
    Status,
    CreatedAt,
    ConfirmedAt,
}

#[derive(Iden)]
enum AgentSaleItems {
    Table,
    Id,
    AgentSaleId,
    Description,
    Quantity,
    UnitPriceMinor,
    LineTotalMinor,
}

#[derive(Iden)]
enum CommissionRules {
    Table,
    Id,
    Name,
    CommissionType,
    Basis,
    ValueHundredths,
    Currency,
    ValidFrom,
    ValidTo,
    IsActive,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Batches
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Batches::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Batches::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Batches::ProductId).string().not_null())
                    .col(ColumnDef::new(Batches::SourceKind).string().not_null())
                    .col(ColumnDef::new(Batches::SourceId).string().not_null())
                    .col(ColumnDef::new(Batches::LocationKind).string().not_null())
                    .col(ColumnDef::new(Batches::LocationId).string().not_null())
                    .col(
                        ColumnDef::new(Batches::QuantityReceived)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Batches::QuantityRemaining)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Batches::BaseUnitCostMicro)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Batches::LandedUnitCostMicro)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Batches::ReceivedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Batches::Version)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        // Depletion scans by product and location in receiving order.
        manager
            .create_index(
                Index::create()
                    .name("idx-batches-fifo")
                    .table(Batches::Table)
                    .col(Batches::ProductId)
                    .col(Batches::LocationKind)
                    .col(Batches::LocationId)
                    .col(Batches::ReceivedAt)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Batch expenses and adjustments
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(BatchExpenses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BatchExpenses::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BatchExpenses::BatchId).string().not_null())
                    .col(ColumnDef::new(BatchExpenses::Kind).string().not_null())
                    .col(
                        ColumnDef::new(BatchExpenses::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BatchExpenses::ExpenseDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-batch_expenses-batch_id")
                            .from(BatchExpenses::Table, BatchExpenses::BatchId)
                            .to(Batches::Table, Batches::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-batch_expenses-batch_id")
                    .table(BatchExpenses::Table)
                    .col(BatchExpenses::BatchId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BatchExpenseAdjustments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BatchExpenseAdjustments::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(BatchExpenseAdjustments::BatchExpenseId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BatchExpenseAdjustments::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BatchExpenseAdjustments::Reason)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BatchExpenseAdjustments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-batch_expense_adjustments-batch_expense_id")
                            .from(
                                BatchExpenseAdjustments::Table,
                                BatchExpenseAdjustments::BatchExpenseId,
                            )
                            .to(BatchExpenses::Table, BatchExpenses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-batch_expense_adjustments-batch_expense_id")
                    .table(BatchExpenseAdjustments::Table)
                    .col(BatchExpenseAdjustments::BatchExpenseId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Consumption lots
        // ───────────────────────────────────────────────────────────────────
        // No cascade from batches: lots are the immutable audit trail and
        // outlive everything that references them.
        manager
            .create_table(
                Table::create()
                    .table(ConsumptionLots::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ConsumptionLots::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ConsumptionLots::BatchId).string().not_null())
                    .col(
                        ColumnDef::new(ConsumptionLots::SalesOrderId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ConsumptionLots::SalesOrderItemId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ConsumptionLots::QuantityConsumed)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ConsumptionLots::UnitCostMicro)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ConsumptionLots::ConsumedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-consumption_lots-batch_id")
                            .from(ConsumptionLots::Table, ConsumptionLots::BatchId)
                            .to(Batches::Table, Batches::Id)
                            .on_delete(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-consumption_lots-sales_order_id")
                    .table(ConsumptionLots::Table)
                    .col(ConsumptionLots::SalesOrderId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-consumption_lots-batch_id")
                    .table(ConsumptionLots::Table)
                    .col(ConsumptionLots::BatchId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Invoices and items
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Invoices::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Invoices::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Invoices::SalesOrderId).string().not_null())
                    .col(
                        ColumnDef::new(Invoices::SubtotalMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Invoices::TaxMinor).big_integer().not_null())
                    .col(
                        ColumnDef::new(Invoices::TotalMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Invoices::Currency)
                            .string()
                            .not_null()
                            .default("USD"),
                    )
                    .col(ColumnDef::new(Invoices::Status).string().not_null())
                    .col(
                        ColumnDef::new(Invoices::IssuedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-invoices-sales_order_id")
                    .table(Invoices::Table)
                    .col(Invoices::SalesOrderId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(InvoiceItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InvoiceItems::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(InvoiceItems::InvoiceId).string().not_null())
                    .col(
                        ColumnDef::new(InvoiceItems::Description)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InvoiceItems::Quantity)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InvoiceItems::UnitPriceMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InvoiceItems::LineTotalMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-invoice_items-invoice_id")
                            .from(InvoiceItems::Table, InvoiceItems::InvoiceId)
                            .to(Invoices::Table, Invoices::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-invoice_items-invoice_id")
                    .table(InvoiceItems::Table)
                    .col(InvoiceItems::InvoiceId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Costings (one row per invoice)
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Costings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Costings::InvoiceId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Costings::RevenueMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Costings::CogsMinor).big_integer().not_null())
                    .col(
                        ColumnDef::new(Costings::ProfitMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Costings::MarginPercentHundredths)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Costings::ComputedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-costings-invoice_id")
                            .from(Costings::Table, Costings::InvoiceId)
                            .to(Invoices::Table, Invoices::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Agent sales, items and commission rules
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(AgentSales::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AgentSales::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AgentSales::CustomerId).string().not_null())
                    .col(ColumnDef::new(AgentSales::PrincipalId).string().not_null())
                    .col(
                        ColumnDef::new(AgentSales::CommissionType)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AgentSales::CommissionRuleId).string())
                    .col(ColumnDef::new(AgentSales::GrossTotalMinor).big_integer())
                    .col(ColumnDef::new(AgentSales::CommissionTotalMinor).big_integer())
                    .col(ColumnDef::new(AgentSales::NetPrincipalTotalMinor).big_integer())
                    .col(ColumnDef::new(AgentSales::Status).string().not_null())
                    .col(
                        ColumnDef::new(AgentSales::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AgentSales::ConfirmedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AgentSaleItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AgentSaleItems::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AgentSaleItems::AgentSaleId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AgentSaleItems::Description)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AgentSaleItems::Quantity)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AgentSaleItems::UnitPriceMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AgentSaleItems::LineTotalMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-agent_sale_items-agent_sale_id")
                            .from(AgentSaleItems::Table, AgentSaleItems::AgentSaleId)
                            .to(AgentSales::Table, AgentSales::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-agent_sale_items-agent_sale_id")
                    .table(AgentSaleItems::Table)
                    .col(AgentSaleItems::AgentSaleId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CommissionRules::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CommissionRules::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CommissionRules::Name).string().not_null())
                    .col(
                        ColumnDef::new(CommissionRules::CommissionType)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CommissionRules::Basis).string().not_null())
                    .col(
                        ColumnDef::new(CommissionRules::ValueHundredths)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CommissionRules::Currency)
                            .string()
                            .not_null()
                            .default("USD"),
                    )
                    .col(
                        ColumnDef::new(CommissionRules::ValidFrom)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CommissionRules::ValidTo).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(CommissionRules::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CommissionRules::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AgentSaleItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AgentSales::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Costings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(InvoiceItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Invoices::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ConsumptionLots::Table).to_owned())
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(BatchExpenseAdjustments::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(BatchExpenses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Batches::Table).to_owned())
            .await?;

        Ok(())
    }
}
