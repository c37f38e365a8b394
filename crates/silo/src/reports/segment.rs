//! Customer lifecycle segmentation: new vs. loyal per calendar month.
//!
//! Each customer's first-ever purchase date is computed once per request
//! (never cached) in a derived table, joined back onto every sales row, and
//! each month then counts distinct customers per lifecycle bucket. The two
//! buckets are mutually exclusive per (customer, month): a customer is new
//! in exactly the month of their first purchase and loyal in every later
//! month they transact.

use chrono::{Datelike, NaiveDate};
use silo_sql::{Expr, FromClause, Join, OrderBy, SelectColumn, SelectStmt};
use tokio_postgres::Client;

use super::MONTH_KEY;
use crate::error::Result;
use crate::exec::Warehouse;
use crate::row::{self, Row};

/// Lifecycle counts for one calendar month.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerTrend {
    /// `YYYY-MM` key.
    pub period: String,
    pub new_customer: i64,
    pub loyal_customer: i64,
}

impl CustomerTrend {
    pub(crate) fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            period: row::text(row, "period")?,
            new_customer: row::int_or_zero(row, "new_customer")?,
            loyal_customer: row::int_or_zero(row, "loyal_customer")?,
        })
    }
}

/// Per-customer minimum order date: the first-purchase derived table.
pub fn first_purchase_stmt() -> SelectStmt {
    SelectStmt::new()
        .columns([
            SelectColumn::expr(Expr::column("customer_id")),
            SelectColumn::aliased(Expr::min(Expr::column("OrderDate")), "first_purchase"),
        ])
        .from(FromClause::table("fact_sales"))
        .group_by(Expr::column("customer_id"))
}

/// Monthly new/loyal counts over the first-purchase join.
///
/// The loyal arm compares dates against the first calendar day of the
/// current month, not month-key strings: a first purchase on the last day
/// of month M is loyal from month M+1 onward.
pub fn customer_trend_stmt() -> SelectStmt {
    let order_date = Expr::qualified_column("fs", "OrderDate");
    let first_purchase = Expr::qualified_column("first", "first_purchase");
    let customer = Expr::qualified_column("fs", "customer_id");
    let period = Expr::to_char(order_date.clone(), MONTH_KEY);

    let new_case = Expr::case_when(
        Expr::month_floor(first_purchase.clone()).eq(Expr::month_floor(order_date.clone())),
        customer.clone(),
    );
    let loyal_case = Expr::case_when(
        first_purchase.lt(Expr::month_floor(order_date)),
        customer,
    );

    SelectStmt::new()
        .columns([
            SelectColumn::aliased(period.clone(), "period"),
            SelectColumn::aliased(Expr::count_distinct([new_case]), "new_customer"),
            SelectColumn::aliased(Expr::count_distinct([loyal_case]), "loyal_customer"),
        ])
        .from(FromClause::aliased("fact_sales", "fs"))
        .join(Join::derived(
            first_purchase_stmt(),
            "first",
            Expr::qualified_column("first", "customer_id")
                .eq(Expr::qualified_column("fs", "customer_id")),
        ))
        .group_by(period)
        .order_by(OrderBy::asc(Expr::column("period")))
}

pub async fn customer_trend(client: &Client) -> Result<Vec<CustomerTrend>> {
    let rows = Warehouse::new(client)
        .fetch(&customer_trend_stmt(), &[])
        .await?;
    rows.iter().map(CustomerTrend::from_row).collect()
}

/// Which lifecycle bucket a purchase falls in, relative to the customer's
/// first-ever purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    New,
    Loyal,
}

/// The classification rule mirrored by the CASE arms of
/// [`customer_trend_stmt`].
///
/// `first_purchase` is the customer's minimum order date, so it never
/// exceeds `order_date`: a purchase is loyal when the first purchase lies
/// strictly before the first calendar day of the purchase's month, and new
/// otherwise (same month).
pub fn classify(first_purchase: NaiveDate, order_date: NaiveDate) -> Segment {
    let month_floor = NaiveDate::from_ymd_opt(order_date.year(), order_date.month(), 1)
        .expect("first day of a month is always a valid date");

    if first_purchase < month_floor {
        Segment::Loyal
    } else {
        Segment::New
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use silo_sql::render;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_first_purchase_month_is_new() {
        assert_eq!(
            classify(date(2024, 1, 5), date(2024, 1, 5)),
            Segment::New
        );
        // Later purchase in the same month is still new
        assert_eq!(
            classify(date(2024, 1, 5), date(2024, 1, 28)),
            Segment::New
        );
    }

    #[test]
    fn test_subsequent_months_are_loyal() {
        assert_eq!(
            classify(date(2024, 1, 5), date(2024, 2, 10)),
            Segment::Loyal
        );
        assert_eq!(
            classify(date(2024, 1, 5), date(2025, 1, 2)),
            Segment::Loyal
        );
    }

    #[test]
    fn test_month_boundary_is_a_date_comparison() {
        // First purchase on the last day of January: loyal in February,
        // even though the purchase is one day before the boundary.
        assert_eq!(
            classify(date(2024, 1, 31), date(2024, 2, 1)),
            Segment::Loyal
        );
    }

    #[test]
    fn test_trend_statement_shape() {
        let sql = render(&customer_trend_stmt()).sql;
        // One derived-table join computing MIN(OrderDate) per customer
        assert!(sql.contains(
            "INNER JOIN (SELECT \"customer_id\", MIN(\"OrderDate\") AS \"first_purchase\" \
             FROM \"fact_sales\" GROUP BY \"customer_id\") \"first\""
        ));
        // Loyal arm is a strict date comparison against the month floor
        assert!(sql.contains(
            "\"first\".\"first_purchase\" < date_trunc('month', \"fs\".\"OrderDate\")"
        ));
        // New arm compares month floors for equality
        assert!(sql.contains(
            "date_trunc('month', \"first\".\"first_purchase\") = date_trunc('month', \"fs\".\"OrderDate\")"
        ));
        assert!(sql.ends_with("ORDER BY \"period\" ASC"));
    }
}
