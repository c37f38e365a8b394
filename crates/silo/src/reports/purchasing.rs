//! Purchasing analytics: the procurement-side mirror of the sales reports.

use rust_decimal::Decimal;
use silo_sql::{Expr, FromClause, Join, OrderBy, SelectColumn, SelectStmt};
use tokio_postgres::Client;

use super::TOP_N;
use crate::error::Result;
use crate::exec::Warehouse;
use crate::row::{self, Row};

/// Headline purchasing metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchasingKpi {
    pub total_purchasing_amount: Decimal,
    pub total_quantity_purchased: i64,
    pub avg_purchase_value: Decimal,
}

impl PurchasingKpi {
    /// All-zero when the fact table is empty, never absent.
    pub(crate) fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            total_purchasing_amount: row::decimal_or_zero(row, "total_purchasing_amount")?,
            total_quantity_purchased: row::int_or_zero(row, "total_quantity_purchased")?,
            avg_purchase_value: row::decimal_or_zero(row, "avg_purchase_value")?,
        })
    }

    fn zeroed() -> Self {
        Self {
            total_purchasing_amount: Decimal::ZERO,
            total_quantity_purchased: 0,
            avg_purchase_value: Decimal::ZERO,
        }
    }
}

/// A product's aggregated purchases.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchasedProduct {
    pub product_name: String,
    pub category: String,
    pub subcategory: String,
    pub total_qty: i64,
    pub total_purchased: Decimal,
}

impl PurchasedProduct {
    pub(crate) fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            product_name: row::text(row, "product_name")?,
            category: row::text(row, "category")?,
            subcategory: row::text(row, "subcategory")?,
            total_qty: row::int_or_zero(row, "total_qty")?,
            total_purchased: row::decimal_or_zero(row, "total_purchased")?,
        })
    }
}

/// A supplier's aggregated deliveries.
#[derive(Debug, Clone, PartialEq)]
pub struct SupplierPurchases {
    pub supplier_name: String,
    pub total_qty: i64,
    pub total_spent: Decimal,
}

impl SupplierPurchases {
    pub(crate) fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            supplier_name: row::text(row, "supplier_name")?,
            total_qty: row::int_or_zero(row, "total_qty")?,
            total_spent: row::decimal_or_zero(row, "total_spent")?,
        })
    }
}

/// A product with rejected deliveries.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedProduct {
    pub product_name: String,
    pub category: String,
    pub rejected_qty: i64,
}

impl RejectedProduct {
    pub(crate) fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            product_name: row::text(row, "product_name")?,
            category: row::text(row, "category")?,
            rejected_qty: row::int_or_zero(row, "rejected_qty")?,
        })
    }
}

fn join_product() -> Join {
    Join::inner(
        "dim_product",
        "p",
        Expr::qualified_column("fp", "product_id").eq(Expr::qualified_column("p", "product_id")),
    )
}

/// KPI summary over all purchase-order lines.
pub fn kpi_stmt() -> SelectStmt {
    let line_total = Expr::qualified_column("fp", "LineTotal");

    SelectStmt::new()
        .columns([
            SelectColumn::aliased(Expr::sum(line_total.clone()), "total_purchasing_amount"),
            SelectColumn::aliased(
                Expr::sum(Expr::qualified_column("fp", "OrderQty")),
                "total_quantity_purchased",
            ),
            SelectColumn::aliased(Expr::avg(line_total), "avg_purchase_value"),
        ])
        .from(FromClause::aliased("fact_purchasing", "fp"))
}

/// Top 10 purchased products by quantity, descending.
pub fn top_products_stmt() -> SelectStmt {
    SelectStmt::new()
        .columns([
            SelectColumn::expr(Expr::qualified_column("p", "product_name")),
            SelectColumn::expr(Expr::qualified_column("p", "category")),
            SelectColumn::expr(Expr::qualified_column("p", "subcategory")),
            SelectColumn::aliased(Expr::sum(Expr::qualified_column("fp", "OrderQty")), "total_qty"),
            SelectColumn::aliased(
                Expr::sum(Expr::qualified_column("fp", "LineTotal")),
                "total_purchased",
            ),
        ])
        .from(FromClause::aliased("fact_purchasing", "fp"))
        .join(join_product())
        .group_by_all([
            Expr::qualified_column("p", "product_id"),
            Expr::qualified_column("p", "product_name"),
            Expr::qualified_column("p", "category"),
            Expr::qualified_column("p", "subcategory"),
        ])
        .order_by(OrderBy::desc(Expr::column("total_qty")))
        .order_by(OrderBy::asc(Expr::qualified_column("p", "product_id")))
        .limit(Expr::Int(TOP_N))
}

/// Top 10 suppliers by quantity delivered, with total spend.
pub fn top_suppliers_stmt() -> SelectStmt {
    SelectStmt::new()
        .columns([
            SelectColumn::expr(Expr::qualified_column("s", "supplier_name")),
            SelectColumn::aliased(Expr::sum(Expr::qualified_column("fp", "OrderQty")), "total_qty"),
            SelectColumn::aliased(
                Expr::sum(Expr::qualified_column("fp", "LineTotal")),
                "total_spent",
            ),
        ])
        .from(FromClause::aliased("fact_purchasing", "fp"))
        .join(Join::inner(
            "dim_supplier",
            "s",
            Expr::qualified_column("fp", "supplier_id")
                .eq(Expr::qualified_column("s", "supplier_id")),
        ))
        .group_by_all([
            Expr::qualified_column("s", "supplier_id"),
            Expr::qualified_column("s", "supplier_name"),
        ])
        .order_by(OrderBy::desc(Expr::column("total_qty")))
        .order_by(OrderBy::asc(Expr::qualified_column("s", "supplier_id")))
        .limit(Expr::Int(TOP_N))
}

/// Top 10 products by rejected quantity. Products with zero rejections
/// never appear.
pub fn most_rejected_stmt() -> SelectStmt {
    let rejected = Expr::sum(Expr::qualified_column("fp", "RejectedQty"));

    SelectStmt::new()
        .columns([
            SelectColumn::expr(Expr::qualified_column("p", "product_name")),
            SelectColumn::expr(Expr::qualified_column("p", "category")),
            SelectColumn::aliased(rejected.clone(), "rejected_qty"),
        ])
        .from(FromClause::aliased("fact_purchasing", "fp"))
        .join(join_product())
        .group_by_all([
            Expr::qualified_column("p", "product_id"),
            Expr::qualified_column("p", "product_name"),
            Expr::qualified_column("p", "category"),
        ])
        .having(rejected.gt(Expr::Int(0)))
        .order_by(OrderBy::desc(Expr::column("rejected_qty")))
        .order_by(OrderBy::asc(Expr::qualified_column("p", "product_id")))
        .limit(Expr::Int(TOP_N))
}

pub async fn kpi(client: &Client) -> Result<PurchasingKpi> {
    match Warehouse::new(client).fetch_one(&kpi_stmt(), &[]).await? {
        Some(row) => PurchasingKpi::from_row(&row),
        None => Ok(PurchasingKpi::zeroed()),
    }
}

pub async fn top_products(client: &Client) -> Result<Vec<PurchasedProduct>> {
    let rows = Warehouse::new(client)
        .fetch(&top_products_stmt(), &[])
        .await?;
    rows.iter().map(PurchasedProduct::from_row).collect()
}

pub async fn top_suppliers(client: &Client) -> Result<Vec<SupplierPurchases>> {
    let rows = Warehouse::new(client)
        .fetch(&top_suppliers_stmt(), &[])
        .await?;
    rows.iter().map(SupplierPurchases::from_row).collect()
}

pub async fn most_rejected(client: &Client) -> Result<Vec<RejectedProduct>> {
    let rows = Warehouse::new(client)
        .fetch(&most_rejected_stmt(), &[])
        .await?;
    rows.iter().map(RejectedProduct::from_row).collect()
}
