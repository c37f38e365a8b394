//! Time-series drill-down: years → months → weeks, each level scoped by
//! the one above, plus the sales-only trend cuts.
//!
//! The hierarchy applies to both fact tables and is driven through the
//! date dimension, which guarantees a canonical year/month vocabulary.

use chrono::{Datelike, Local, NaiveDate};
use rust_decimal::Decimal;
use silo_sql::{DateField, Expr, FromClause, Join, OrderBy, SelectColumn, SelectStmt};
use tokio_postgres::Client;

use crate::error::Result;
use crate::exec::Warehouse;
use crate::row::{self, Row};
use crate::schema;
use crate::value::Value;

/// Which fact table a drill-down reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fact {
    Sales,
    Purchasing,
}

impl Fact {
    pub fn table(self) -> &'static schema::Table {
        match self {
            Fact::Sales => &schema::FACT_SALES,
            Fact::Purchasing => &schema::FACT_PURCHASING,
        }
    }
}

/// Revenue for one month of a drill-down year.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyRevenue {
    pub month_name: String,
    pub month: i32,
    pub revenue: Decimal,
}

impl MonthlyRevenue {
    pub(crate) fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            month_name: row::text(row, "month_name")?,
            month: row::int32(row, "month")?,
            revenue: row::decimal_or_zero(row, "revenue")?,
        })
    }
}

/// Revenue for one ISO week within a drill-down month.
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyRevenue {
    pub week_number: i32,
    /// Earliest calendar date in the week group.
    pub week_start: NaiveDate,
    pub revenue: Decimal,
}

impl WeeklyRevenue {
    pub(crate) fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            week_number: row::int32(row, "week_number")?,
            week_start: row::date(row, "week_start")?,
            revenue: row::decimal_or_zero(row, "revenue")?,
        })
    }
}

/// Weekend or weekday revenue total.
#[derive(Debug, Clone, PartialEq)]
pub struct DayTypeSales {
    pub day_type: String,
    pub total_sales: Decimal,
}

impl DayTypeSales {
    pub(crate) fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            day_type: row::text(row, "day_type")?,
            total_sales: row::decimal_or_zero(row, "total_sales")?,
        })
    }
}

/// Revenue per calendar month name across all years.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthEffectiveness {
    pub month: i32,
    pub month_name: String,
    pub total_sales: Decimal,
}

impl MonthEffectiveness {
    pub(crate) fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            month: row::int32(row, "month")?,
            month_name: row::text(row, "month_name")?,
            total_sales: row::decimal_or_zero(row, "total_sales")?,
        })
    }
}

/// The default drill-down year when the caller does not give one.
pub(crate) fn current_year() -> i32 {
    Local::now().year()
}

fn join_date() -> Join {
    Join::inner(
        "dim_date",
        "d",
        Expr::qualified_column("f", "date_id").eq(Expr::qualified_column("d", "date_id")),
    )
}

/// Distinct years present for the fact table, descending.
pub fn years_stmt(fact: Fact) -> SelectStmt {
    SelectStmt::new()
        .distinct()
        .columns([SelectColumn::expr(Expr::qualified_column("d", "year"))])
        .from(FromClause::aliased(fact.table().name, "f"))
        .join(join_date())
        .order_by(OrderBy::desc(Expr::qualified_column("d", "year")))
}

/// Revenue per month of one year, ascending by month number.
pub fn monthly_stmt(fact: Fact) -> SelectStmt {
    SelectStmt::new()
        .columns([
            SelectColumn::expr(Expr::qualified_column("d", "month_name")),
            SelectColumn::expr(Expr::qualified_column("d", "month")),
            SelectColumn::aliased(Expr::sum(Expr::qualified_column("f", "LineTotal")), "revenue"),
        ])
        .from(FromClause::aliased(fact.table().name, "f"))
        .join(join_date())
        .where_(Expr::qualified_column("d", "year").eq(Expr::param("year")))
        .group_by_all([
            Expr::qualified_column("d", "month"),
            Expr::qualified_column("d", "month_name"),
        ])
        .order_by(OrderBy::asc(Expr::qualified_column("d", "month")))
}

/// Revenue per ISO week within one month of one year, ascending by week
/// number; each week is labeled with its earliest calendar date.
pub fn weekly_stmt(fact: Fact) -> SelectStmt {
    let week = Expr::extract(DateField::Week, Expr::qualified_column("d", "full_date"));

    SelectStmt::new()
        .columns([
            SelectColumn::aliased(week.clone().as_integer(), "week_number"),
            SelectColumn::aliased(Expr::min(Expr::qualified_column("d", "full_date")), "week_start"),
            SelectColumn::aliased(Expr::sum(Expr::qualified_column("f", "LineTotal")), "revenue"),
        ])
        .from(FromClause::aliased(fact.table().name, "f"))
        .join(join_date())
        .where_(
            Expr::qualified_column("d", "year")
                .eq(Expr::param("year"))
                .and(Expr::qualified_column("d", "month").eq(Expr::param("month"))),
        )
        .group_by(week)
        .order_by(OrderBy::asc(Expr::column("week_number")))
}

/// Weekend vs. weekday revenue. The weekend is the two week-boundary days
/// (ISO day-of-week 6 and 7).
pub fn weekend_vs_weekday_stmt() -> SelectStmt {
    let day_type = Expr::case_when_else(
        Expr::extract(
            DateField::IsoDow,
            Expr::qualified_column("fs", "OrderDate"),
        )
        .ge(Expr::Int(6)),
        Expr::string("Weekend"),
        Expr::string("Weekday"),
    );

    SelectStmt::new()
        .columns([
            SelectColumn::aliased(day_type, "day_type"),
            SelectColumn::aliased(
                Expr::sum(Expr::qualified_column("fs", "LineTotal")),
                "total_sales",
            ),
        ])
        .from(FromClause::aliased("fact_sales", "fs"))
        .group_by(Expr::column("day_type"))
}

/// Revenue per calendar month name summed across all years, ordered by
/// month number.
pub fn month_effectiveness_stmt() -> SelectStmt {
    let order_date = Expr::qualified_column("fs", "OrderDate");
    let month = Expr::extract(DateField::Month, order_date.clone()).as_integer();
    let month_name = Expr::to_char(order_date, "FMMonth");

    SelectStmt::new()
        .columns([
            SelectColumn::aliased(month, "month"),
            SelectColumn::aliased(month_name, "month_name"),
            SelectColumn::aliased(
                Expr::sum(Expr::qualified_column("fs", "LineTotal")),
                "total_sales",
            ),
        ])
        .from(FromClause::aliased("fact_sales", "fs"))
        .group_by_all([Expr::column("month"), Expr::column("month_name")])
        .order_by(OrderBy::asc(Expr::column("month")))
}

pub async fn years(client: &Client, fact: Fact) -> Result<Vec<i32>> {
    let rows = Warehouse::new(client).fetch(&years_stmt(fact), &[]).await?;
    rows.iter().map(|row| row::int32(row, "year")).collect()
}

pub async fn monthly(client: &Client, fact: Fact, year: i32) -> Result<Vec<MonthlyRevenue>> {
    let rows = Warehouse::new(client)
        .fetch(&monthly_stmt(fact), &[("year", Value::I32(year))])
        .await?;
    rows.iter().map(MonthlyRevenue::from_row).collect()
}

pub async fn weekly(
    client: &Client,
    fact: Fact,
    year: i32,
    month: i32,
) -> Result<Vec<WeeklyRevenue>> {
    let rows = Warehouse::new(client)
        .fetch(
            &weekly_stmt(fact),
            &[("year", Value::I32(year)), ("month", Value::I32(month))],
        )
        .await?;
    rows.iter().map(WeeklyRevenue::from_row).collect()
}

pub async fn weekend_vs_weekday(client: &Client) -> Result<Vec<DayTypeSales>> {
    let rows = Warehouse::new(client)
        .fetch(&weekend_vs_weekday_stmt(), &[])
        .await?;
    rows.iter().map(DayTypeSales::from_row).collect()
}

pub async fn month_effectiveness(client: &Client) -> Result<Vec<MonthEffectiveness>> {
    let rows = Warehouse::new(client)
        .fetch(&month_effectiveness_stmt(), &[])
        .await?;
    rows.iter().map(MonthEffectiveness::from_row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use silo_sql::render;

    #[test]
    fn test_levels_scope_each_other() {
        // Years: unscoped. Months: scoped by year. Weeks: by year and month.
        let years = render(&years_stmt(Fact::Sales));
        assert!(years.params.is_empty());

        let monthly = render(&monthly_stmt(Fact::Sales));
        assert_eq!(monthly.params, vec!["year"]);

        let weekly = render(&weekly_stmt(Fact::Sales));
        assert_eq!(weekly.params, vec!["year", "month"]);
    }

    #[test]
    fn test_purchasing_mirrors_sales() {
        for (sales, purchasing) in [
            (years_stmt(Fact::Sales), years_stmt(Fact::Purchasing)),
            (monthly_stmt(Fact::Sales), monthly_stmt(Fact::Purchasing)),
            (weekly_stmt(Fact::Sales), weekly_stmt(Fact::Purchasing)),
        ] {
            assert_eq!(
                render(&sales).sql.replace("fact_sales", "fact_purchasing"),
                render(&purchasing).sql
            );
        }
    }

    #[test]
    fn test_all_levels_aggregate_the_same_measure() {
        // Monthly totals sum to the yearly total and weekly totals to the
        // monthly one because every level aggregates SUM(LineTotal) over
        // the same date-dimension join, narrowed only by equality filters.
        for stmt in [monthly_stmt(Fact::Sales), weekly_stmt(Fact::Sales)] {
            let sql = render(&stmt).sql;
            assert!(sql.contains("SUM(\"f\".\"LineTotal\") AS \"revenue\""));
            assert!(sql.contains(
                "INNER JOIN \"dim_date\" \"d\" ON \"f\".\"date_id\" = \"d\".\"date_id\""
            ));
        }
    }

    #[test]
    fn test_weekly_weeks_are_iso_and_labeled_with_start_date() {
        let sql = render(&weekly_stmt(Fact::Sales)).sql;
        assert!(sql.contains(
            "CAST(EXTRACT(WEEK FROM \"d\".\"full_date\") AS INTEGER) AS \"week_number\""
        ));
        assert!(sql.contains("MIN(\"d\".\"full_date\") AS \"week_start\""));
        assert!(sql.ends_with("ORDER BY \"week_number\" ASC"));
    }

    #[test]
    fn test_years_descending_distinct() {
        let sql = render(&years_stmt(Fact::Purchasing)).sql;
        assert!(sql.starts_with("SELECT DISTINCT \"d\".\"year\""));
        assert!(sql.ends_with("ORDER BY \"d\".\"year\" DESC"));
    }

    #[test]
    fn test_weekend_is_the_two_week_boundary_days() {
        let sql = render(&weekend_vs_weekday_stmt()).sql;
        assert!(sql.contains(
            "CASE WHEN EXTRACT(ISODOW FROM \"fs\".\"OrderDate\") >= 6 \
             THEN 'Weekend' ELSE 'Weekday' END AS \"day_type\""
        ));
    }
}
