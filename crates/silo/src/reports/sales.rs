//! Sales performance: KPI summary, product ranking, discount impact and
//! the monthly revenue trend.

use rust_decimal::Decimal;
use silo_sql::{Expr, FromClause, OrderBy, SelectColumn, SelectStmt};
use tokio_postgres::Client;

use super::products::{self, ProductSales};
use super::{MONTH_KEY, TOP_N};
use crate::error::Result;
use crate::exec::Warehouse;
use crate::row::{self, Row};

/// Bucket label for discounted sales lines.
pub const WITH_DISCOUNT: &str = "With Discount";
/// Bucket label for undiscounted sales lines.
pub const NO_DISCOUNT: &str = "No Discount";

/// Headline sales metrics, restricted to products with a known cost basis.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesKpi {
    pub total_revenue: Decimal,
    pub total_profit: Decimal,
    pub avg_order_value: Decimal,
}

impl SalesKpi {
    /// Aggregates over an empty input set come back NULL; the report
    /// contract is all-zero, never absent.
    pub(crate) fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            total_revenue: row::decimal_or_zero(row, "total_revenue")?,
            total_profit: row::decimal_or_zero(row, "total_profit")?,
            avg_order_value: row::decimal_or_zero(row, "avg_order_value")?,
        })
    }

    fn zeroed() -> Self {
        Self {
            total_revenue: Decimal::ZERO,
            total_profit: Decimal::ZERO,
            avg_order_value: Decimal::ZERO,
        }
    }
}

/// One discount bucket: every sales line falls in exactly one.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscountImpact {
    pub discount_group: String,
    pub order_count: i64,
    pub total_revenue: Decimal,
    pub avg_revenue_per_order: Decimal,
}

impl DiscountImpact {
    pub(crate) fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            discount_group: row::text(row, "discount_group")?,
            order_count: row::int_or_zero(row, "order_count")?,
            total_revenue: row::decimal_or_zero(row, "total_revenue")?,
            avg_revenue_per_order: row::decimal_or_zero(row, "avg_revenue_per_order")?,
        })
    }
}

/// Revenue for one calendar month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyRevenue {
    /// `YYYY-MM` key, derived from the order date.
    pub month: String,
    pub total_revenue: Decimal,
}

impl MonthlyRevenue {
    pub(crate) fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            month: row::text(row, "month")?,
            total_revenue: row::decimal_or_zero(row, "total_revenue")?,
        })
    }
}

/// KPI summary over sales lines whose product has a known StandardCost.
/// Profit is realized revenue minus quantity times cost.
pub fn kpi_stmt() -> SelectStmt {
    let line_total = Expr::qualified_column("fs", "LineTotal");
    let profit = line_total.clone().sub(
        Expr::qualified_column("fs", "OrderQty").mul(Expr::qualified_column("p", "StandardCost")),
    );

    SelectStmt::new()
        .columns([
            SelectColumn::aliased(Expr::sum(line_total.clone()), "total_revenue"),
            SelectColumn::aliased(Expr::sum(profit), "total_profit"),
            SelectColumn::aliased(Expr::avg(line_total), "avg_order_value"),
        ])
        .from(FromClause::aliased("fact_sales", "fs"))
        .join(products::join_product())
        .where_(Expr::qualified_column("p", "StandardCost").is_not_null())
}

/// Top 10 products by revenue, descending.
pub fn top_products_stmt() -> SelectStmt {
    products::product_sales_base()
        .order_by(OrderBy::desc(Expr::column("total_revenue")))
        .order_by(OrderBy::asc(Expr::qualified_column("p", "product_id")))
        .limit(Expr::Int(TOP_N))
}

/// Partition all sales lines into the two discount buckets.
pub fn discount_impact_stmt() -> SelectStmt {
    let bucket = Expr::case_when_else(
        Expr::qualified_column("fs", "UnitPriceDiscount").gt(Expr::Int(0)),
        Expr::string(WITH_DISCOUNT),
        Expr::string(NO_DISCOUNT),
    );
    let line_total = Expr::qualified_column("fs", "LineTotal");

    SelectStmt::new()
        .columns([
            SelectColumn::aliased(bucket, "discount_group"),
            SelectColumn::aliased(Expr::count_star(), "order_count"),
            SelectColumn::aliased(Expr::sum(line_total.clone()), "total_revenue"),
            SelectColumn::aliased(Expr::avg(line_total), "avg_revenue_per_order"),
        ])
        .from(FromClause::aliased("fact_sales", "fs"))
        .group_by(Expr::column("discount_group"))
}

/// Revenue per calendar month, chronologically ascending. Uses the order
/// date directly rather than the date dimension.
pub fn monthly_revenue_stmt() -> SelectStmt {
    let month = Expr::to_char(Expr::qualified_column("fs", "OrderDate"), MONTH_KEY);

    SelectStmt::new()
        .columns([
            SelectColumn::aliased(month.clone(), "month"),
            SelectColumn::aliased(
                Expr::sum(Expr::qualified_column("fs", "LineTotal")),
                "total_revenue",
            ),
        ])
        .from(FromClause::aliased("fact_sales", "fs"))
        .group_by(month)
        .order_by(OrderBy::asc(Expr::column("month")))
}

pub async fn kpi(client: &Client) -> Result<SalesKpi> {
    match Warehouse::new(client).fetch_one(&kpi_stmt(), &[]).await? {
        Some(row) => SalesKpi::from_row(&row),
        None => Ok(SalesKpi::zeroed()),
    }
}

pub async fn top_products(client: &Client) -> Result<Vec<ProductSales>> {
    let rows = Warehouse::new(client)
        .fetch(&top_products_stmt(), &[])
        .await?;
    rows.iter().map(ProductSales::from_row).collect()
}

pub async fn discount_impact(client: &Client) -> Result<Vec<DiscountImpact>> {
    let rows = Warehouse::new(client)
        .fetch(&discount_impact_stmt(), &[])
        .await?;
    rows.iter().map(DiscountImpact::from_row).collect()
}

pub async fn monthly_revenue(client: &Client) -> Result<Vec<MonthlyRevenue>> {
    let rows = Warehouse::new(client)
        .fetch(&monthly_revenue_stmt(), &[])
        .await?;
    rows.iter().map(MonthlyRevenue::from_row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use silo_sql::render;

    #[test]
    fn test_kpi_excludes_unknown_cost_basis() {
        let sql = render(&kpi_stmt()).sql;
        assert!(sql.contains("WHERE \"p\".\"StandardCost\" IS NOT NULL"));
        assert!(sql.contains("SUM(\"fs\".\"LineTotal\" - \"fs\".\"OrderQty\" * \"p\".\"StandardCost\") AS \"total_profit\""));
    }

    #[test]
    fn test_kpi_defaults_to_zero_on_null_aggregates() {
        // SUM/AVG over zero joined rows yield NULL, never an absent field.
        let row: Row = vec![
            ("total_revenue".to_string(), Value::Null),
            ("total_profit".to_string(), Value::Null),
            ("avg_order_value".to_string(), Value::Null),
        ];
        assert_eq!(SalesKpi::from_row(&row).unwrap(), SalesKpi::zeroed());
    }

    #[test]
    fn test_discount_buckets_partition_all_lines() {
        let sql = render(&discount_impact_stmt()).sql;
        // A single CASE with an ELSE arm: every row lands in exactly one
        // bucket, and the predicate is the documented one.
        assert!(sql.contains(
            "CASE WHEN \"fs\".\"UnitPriceDiscount\" > 0 \
             THEN 'With Discount' ELSE 'No Discount' END AS \"discount_group\""
        ));
        assert!(sql.contains("GROUP BY \"discount_group\""));
        assert!(!sql.contains("WHERE"));
    }

    #[test]
    fn test_top_products_ranked_by_revenue() {
        let sql = render(&top_products_stmt()).sql;
        assert!(sql.contains(
            "ORDER BY \"total_revenue\" DESC, \"p\".\"product_id\" ASC LIMIT 10"
        ));
    }

    #[test]
    fn test_monthly_revenue_is_chronological() {
        let sql = render(&monthly_revenue_stmt()).sql;
        assert!(sql.contains("to_char(\"fs\".\"OrderDate\", 'YYYY-MM') AS \"month\""));
        assert!(sql.ends_with("ORDER BY \"month\" ASC"));
    }
}
