//! Customer analytics: revenue ranking and person-type segmentation.

use rust_decimal::Decimal;
use silo_sql::{Expr, FromClause, Join, OrderBy, SelectColumn, SelectStmt};
use tokio_postgres::Client;

use super::TOP_N;
use crate::error::Result;
use crate::exec::Warehouse;
use crate::row::{self, Row};

/// A customer's aggregated purchases.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerSales {
    pub customer_name: String,
    pub total_revenue: Decimal,
    pub total_orders: i64,
}

impl CustomerSales {
    pub(crate) fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            customer_name: row::text(row, "customer_name")?,
            total_revenue: row::decimal_or_zero(row, "total_revenue")?,
            total_orders: row::int_or_zero(row, "total_orders")?,
        })
    }
}

/// Aggregates per person type (e.g. individual vs. store).
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentBreakdown {
    pub person_type: String,
    /// Distinct (customer, order-date) pairs: multiple line items on the
    /// same order-date for the same customer count once.
    pub total_transactions: i64,
    pub total_revenue: Decimal,
}

impl SegmentBreakdown {
    pub(crate) fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            person_type: row::text(row, "person_type")?,
            total_transactions: row::int_or_zero(row, "total_transactions")?,
            total_revenue: row::decimal_or_zero(row, "total_revenue")?,
        })
    }
}

/// Sort key for the person-type breakdown; the query is otherwise shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentSort {
    Transactions,
    Revenue,
}

fn join_customer() -> Join {
    Join::inner(
        "dim_customer",
        "c",
        Expr::qualified_column("fs", "customer_id").eq(Expr::qualified_column("c", "customer_id")),
    )
}

/// Top 10 customers by revenue, descending.
pub fn top_customers_stmt() -> SelectStmt {
    SelectStmt::new()
        .columns([
            SelectColumn::aliased(Expr::qualified_column("c", "full_name"), "customer_name"),
            SelectColumn::aliased(
                Expr::sum(Expr::qualified_column("fs", "LineTotal")),
                "total_revenue",
            ),
            SelectColumn::aliased(Expr::count_star(), "total_orders"),
        ])
        .from(FromClause::aliased("fact_sales", "fs"))
        .join(join_customer())
        .group_by_all([
            Expr::qualified_column("c", "customer_id"),
            Expr::qualified_column("c", "full_name"),
        ])
        .order_by(OrderBy::desc(Expr::column("total_revenue")))
        .order_by(OrderBy::asc(Expr::qualified_column("c", "customer_id")))
        .limit(Expr::Int(TOP_N))
}

/// Transactions and revenue per person type, sorted by the requested key.
pub fn segments_stmt(sort: SegmentSort) -> SelectStmt {
    let sort_key = match sort {
        SegmentSort::Transactions => "total_transactions",
        SegmentSort::Revenue => "total_revenue",
    };

    SelectStmt::new()
        .columns([
            SelectColumn::expr(Expr::qualified_column("c", "person_type")),
            SelectColumn::aliased(
                Expr::count_distinct([
                    Expr::qualified_column("fs", "customer_id"),
                    Expr::qualified_column("fs", "OrderDate"),
                ]),
                "total_transactions",
            ),
            SelectColumn::aliased(
                Expr::sum(Expr::qualified_column("fs", "LineTotal")),
                "total_revenue",
            ),
        ])
        .from(FromClause::aliased("fact_sales", "fs"))
        .join(join_customer())
        .group_by(Expr::qualified_column("c", "person_type"))
        .order_by(OrderBy::desc(Expr::column(sort_key)))
}

pub async fn top_customers(client: &Client) -> Result<Vec<CustomerSales>> {
    let rows = Warehouse::new(client)
        .fetch(&top_customers_stmt(), &[])
        .await?;
    rows.iter().map(CustomerSales::from_row).collect()
}

pub async fn segments(client: &Client, sort: SegmentSort) -> Result<Vec<SegmentBreakdown>> {
    let rows = Warehouse::new(client).fetch(&segments_stmt(sort), &[]).await?;
    rows.iter().map(SegmentBreakdown::from_row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use silo_sql::render;

    #[test]
    fn test_top_customers_capped_with_tie_break() {
        let sql = render(&top_customers_stmt()).sql;
        assert!(sql.contains(
            "ORDER BY \"total_revenue\" DESC, \"c\".\"customer_id\" ASC LIMIT 10"
        ));
    }

    #[test]
    fn test_transaction_is_a_distinct_customer_date_pair() {
        let sql = render(&segments_stmt(SegmentSort::Transactions)).sql;
        assert!(sql.contains(
            "COUNT(DISTINCT (\"fs\".\"customer_id\", \"fs\".\"OrderDate\")) AS \"total_transactions\""
        ));
    }

    #[test]
    fn test_segment_variants_differ_only_in_sort_key() {
        let by_tx = render(&segments_stmt(SegmentSort::Transactions)).sql;
        let by_revenue = render(&segments_stmt(SegmentSort::Revenue)).sql;
        assert!(by_tx.ends_with("ORDER BY \"total_transactions\" DESC"));
        assert!(by_revenue.ends_with("ORDER BY \"total_revenue\" DESC"));
        assert_eq!(
            by_tx.replace("ORDER BY \"total_transactions\"", "ORDER BY \"total_revenue\""),
            by_revenue
        );
    }
}
