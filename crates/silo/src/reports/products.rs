//! Product analytics: sales volume rankings and discount frequency.

use rust_decimal::Decimal;
use silo_sql::{Expr, FromClause, Join, OrderBy, SelectColumn, SelectStmt};
use tokio_postgres::Client;

use super::TOP_N;
use crate::error::Result;
use crate::exec::Warehouse;
use crate::row::{self, Row};

/// A product's aggregated sales.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSales {
    pub product_name: String,
    pub category: String,
    pub subcategory: String,
    pub total_qty: i64,
    pub total_revenue: Decimal,
}

impl ProductSales {
    pub(crate) fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            product_name: row::text(row, "product_name")?,
            category: row::text(row, "category")?,
            subcategory: row::text(row, "subcategory")?,
            total_qty: row::int_or_zero(row, "total_qty")?,
            total_revenue: row::decimal_or_zero(row, "total_revenue")?,
        })
    }
}

/// A frequently discounted product.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscountedProduct {
    pub product_name: String,
    pub discount_count: i64,
    pub total_discount_amount: Decimal,
}

impl DiscountedProduct {
    pub(crate) fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            product_name: row::text(row, "product_name")?,
            discount_count: row::int_or_zero(row, "discount_count")?,
            total_discount_amount: row::decimal_or_zero(row, "total_discount_amount")?,
        })
    }
}

pub(crate) fn join_product() -> Join {
    Join::inner(
        "dim_product",
        "p",
        Expr::qualified_column("fs", "product_id").eq(Expr::qualified_column("p", "product_id")),
    )
}

/// Quantity and revenue summed per product. Grouping includes the
/// descriptive fields so they land in the result without a second pass.
pub(crate) fn product_sales_base() -> SelectStmt {
    SelectStmt::new()
        .columns([
            SelectColumn::expr(Expr::qualified_column("p", "product_name")),
            SelectColumn::expr(Expr::qualified_column("p", "category")),
            SelectColumn::expr(Expr::qualified_column("p", "subcategory")),
            SelectColumn::aliased(Expr::sum(Expr::qualified_column("fs", "OrderQty")), "total_qty"),
            SelectColumn::aliased(
                Expr::sum(Expr::qualified_column("fs", "LineTotal")),
                "total_revenue",
            ),
        ])
        .from(FromClause::aliased("fact_sales", "fs"))
        .join(join_product())
        .group_by_all([
            Expr::qualified_column("p", "product_id"),
            Expr::qualified_column("p", "product_name"),
            Expr::qualified_column("p", "category"),
            Expr::qualified_column("p", "subcategory"),
        ])
}

/// Top 10 products by quantity sold, descending.
pub fn most_sold_stmt() -> SelectStmt {
    product_sales_base()
        .order_by(OrderBy::desc(Expr::column("total_qty")))
        .order_by(OrderBy::asc(Expr::qualified_column("p", "product_id")))
        .limit(Expr::Int(TOP_N))
}

/// Bottom 10 products by quantity sold, ascending.
pub fn least_sold_stmt() -> SelectStmt {
    product_sales_base()
        .order_by(OrderBy::asc(Expr::column("total_qty")))
        .order_by(OrderBy::asc(Expr::qualified_column("p", "product_id")))
        .limit(Expr::Int(TOP_N))
}

/// Top 10 most frequently discounted products: occurrence count and summed
/// discount amount, over discounted lines only.
pub fn top_discounted_stmt() -> SelectStmt {
    SelectStmt::new()
        .columns([
            SelectColumn::expr(Expr::qualified_column("p", "product_name")),
            SelectColumn::aliased(Expr::count_star(), "discount_count"),
            SelectColumn::aliased(
                Expr::sum(Expr::qualified_column("fs", "UnitPriceDiscount")),
                "total_discount_amount",
            ),
        ])
        .from(FromClause::aliased("fact_sales", "fs"))
        .join(join_product())
        .where_(Expr::qualified_column("fs", "UnitPriceDiscount").gt(Expr::Int(0)))
        .group_by_all([
            Expr::qualified_column("p", "product_id"),
            Expr::qualified_column("p", "product_name"),
        ])
        .order_by(OrderBy::desc(Expr::column("discount_count")))
        .order_by(OrderBy::asc(Expr::qualified_column("p", "product_id")))
        .limit(Expr::Int(TOP_N))
}

pub async fn most_sold(client: &Client) -> Result<Vec<ProductSales>> {
    let rows = Warehouse::new(client).fetch(&most_sold_stmt(), &[]).await?;
    rows.iter().map(ProductSales::from_row).collect()
}

pub async fn least_sold(client: &Client) -> Result<Vec<ProductSales>> {
    let rows = Warehouse::new(client).fetch(&least_sold_stmt(), &[]).await?;
    rows.iter().map(ProductSales::from_row).collect()
}

pub async fn top_discounted(client: &Client) -> Result<Vec<DiscountedProduct>> {
    let rows = Warehouse::new(client)
        .fetch(&top_discounted_stmt(), &[])
        .await?;
    rows.iter().map(DiscountedProduct::from_row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use silo_sql::render;

    #[test]
    fn test_rankings_are_capped_and_deterministic() {
        for stmt in [most_sold_stmt(), least_sold_stmt(), top_discounted_stmt()] {
            let sql = render(&stmt).sql;
            assert!(sql.ends_with("LIMIT 10"), "not capped: {sql}");
            assert!(
                sql.contains("\"p\".\"product_id\" ASC"),
                "no tie-break: {sql}"
            );
        }
    }

    #[test]
    fn test_most_and_least_differ_only_in_direction() {
        let most = render(&most_sold_stmt()).sql;
        let least = render(&least_sold_stmt()).sql;
        assert!(most.contains("ORDER BY \"total_qty\" DESC"));
        assert!(least.contains("ORDER BY \"total_qty\" ASC"));
        assert_eq!(
            most.replace("\"total_qty\" DESC", "\"total_qty\" ASC"),
            least
        );
    }

    #[test]
    fn test_top_discounted_restricts_to_discounted_lines() {
        let sql = render(&top_discounted_stmt()).sql;
        assert!(sql.contains("WHERE \"fs\".\"UnitPriceDiscount\" > 0"));
    }
}
