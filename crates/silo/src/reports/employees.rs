//! Employee analytics: performance leaderboard, per-employee top product
//! and the monthly trend.

use rust_decimal::Decimal;
use silo_sql::{Expr, FromClause, Join, OrderBy, SelectColumn, SelectStmt};
use tokio_postgres::Client;

use super::MONTH_KEY;
use crate::error::Result;
use crate::exec::Warehouse;
use crate::reduce;
use crate::row::{self, Row};

/// An employee's total realized revenue.
#[derive(Debug, Clone, PartialEq)]
pub struct EmployeePerformance {
    pub full_name: String,
    pub total_sales: Decimal,
}

impl EmployeePerformance {
    pub(crate) fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            full_name: row::text(row, "full_name")?,
            total_sales: row::decimal_or_zero(row, "total_sales")?,
        })
    }
}

/// Quantity of one product sold by one employee.
#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeProductSales {
    pub employee_id: i64,
    pub full_name: String,
    pub product_name: String,
    pub total_sold: i64,
}

impl EmployeeProductSales {
    pub(crate) fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            employee_id: row::int_or_zero(row, "employee_id")?,
            full_name: row::text(row, "full_name")?,
            product_name: row::text(row, "product_name")?,
            total_sold: row::int_or_zero(row, "total_sold")?,
        })
    }
}

/// An employee's revenue in one calendar month.
#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeMonthlySales {
    pub employee_id: i64,
    pub full_name: String,
    /// `YYYY-MM` key.
    pub period: String,
    pub total_sales: Decimal,
}

impl EmployeeMonthlySales {
    pub(crate) fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            employee_id: row::int_or_zero(row, "employee_id")?,
            full_name: row::text(row, "full_name")?,
            period: row::text(row, "period")?,
            total_sales: row::decimal_or_zero(row, "total_sales")?,
        })
    }
}

fn join_employee() -> Join {
    Join::inner(
        "dim_employee",
        "e",
        Expr::qualified_column("fs", "employee_id").eq(Expr::qualified_column("e", "employee_id")),
    )
}

/// Full-roster revenue leaderboard, descending. No cap.
pub fn performance_stmt() -> SelectStmt {
    SelectStmt::new()
        .columns([
            SelectColumn::expr(Expr::qualified_column("e", "full_name")),
            SelectColumn::aliased(
                Expr::sum(Expr::qualified_column("fs", "LineTotal")),
                "total_sales",
            ),
        ])
        .from(FromClause::aliased("fact_sales", "fs"))
        .join(join_employee())
        .group_by_all([
            Expr::qualified_column("e", "employee_id"),
            Expr::qualified_column("e", "full_name"),
        ])
        .order_by(OrderBy::desc(Expr::column("total_sales")))
        .order_by(OrderBy::asc(Expr::qualified_column("e", "employee_id")))
}

/// The full (employee × product) quantity aggregate, ordered for the
/// leaderboard reducer: quantity descending, then product key so the
/// sequence itself is deterministic.
pub fn employee_products_stmt() -> SelectStmt {
    SelectStmt::new()
        .columns([
            SelectColumn::expr(Expr::qualified_column("e", "employee_id")),
            SelectColumn::expr(Expr::qualified_column("e", "full_name")),
            SelectColumn::expr(Expr::qualified_column("p", "product_name")),
            SelectColumn::aliased(Expr::sum(Expr::qualified_column("fs", "OrderQty")), "total_sold"),
        ])
        .from(FromClause::aliased("fact_sales", "fs"))
        .join(join_employee())
        .join(Join::inner(
            "dim_product",
            "p",
            Expr::qualified_column("fs", "product_id")
                .eq(Expr::qualified_column("p", "product_id")),
        ))
        .group_by_all([
            Expr::qualified_column("e", "employee_id"),
            Expr::qualified_column("e", "full_name"),
            Expr::qualified_column("p", "product_id"),
            Expr::qualified_column("p", "product_name"),
        ])
        .order_by(OrderBy::desc(Expr::column("total_sold")))
        .order_by(OrderBy::asc(Expr::qualified_column("p", "product_id")))
}

/// Revenue per employee per calendar month, ordered by period then name.
pub fn monthly_trend_stmt() -> SelectStmt {
    let period = Expr::to_char(Expr::qualified_column("fs", "OrderDate"), MONTH_KEY);

    SelectStmt::new()
        .columns([
            SelectColumn::expr(Expr::qualified_column("e", "employee_id")),
            SelectColumn::expr(Expr::qualified_column("e", "full_name")),
            SelectColumn::aliased(period.clone(), "period"),
            SelectColumn::aliased(
                Expr::sum(Expr::qualified_column("fs", "LineTotal")),
                "total_sales",
            ),
        ])
        .from(FromClause::aliased("fact_sales", "fs"))
        .join(join_employee())
        .group_by_all([
            Expr::qualified_column("e", "employee_id"),
            Expr::qualified_column("e", "full_name"),
            period,
        ])
        .order_by(OrderBy::asc(Expr::column("period")))
        .order_by(OrderBy::asc(Expr::qualified_column("e", "full_name")))
}

pub async fn performance(client: &Client) -> Result<Vec<EmployeePerformance>> {
    let rows = Warehouse::new(client).fetch(&performance_stmt(), &[]).await?;
    rows.iter().map(EmployeePerformance::from_row).collect()
}

/// Highest-quantity product per employee, reduced from the pre-sorted
/// aggregate in a single pass (first seen wins unless strictly greater).
pub async fn top_product_per_employee(client: &Client) -> Result<Vec<EmployeeProductSales>> {
    let rows = Warehouse::new(client)
        .fetch(&employee_products_stmt(), &[])
        .await?;
    let parsed = rows
        .iter()
        .map(EmployeeProductSales::from_row)
        .collect::<Result<Vec<_>>>()?;
    Ok(reduce::top_product_per_employee(parsed))
}

pub async fn monthly_trend(client: &Client) -> Result<Vec<EmployeeMonthlySales>> {
    let rows = Warehouse::new(client)
        .fetch(&monthly_trend_stmt(), &[])
        .await?;
    rows.iter().map(EmployeeMonthlySales::from_row).collect()
}
