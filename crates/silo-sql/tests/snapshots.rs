//! Snapshot tests for SQL rendering.

use silo_sql::*;

#[test]
fn test_kpi_aggregates() {
    let stmt = SelectStmt::new()
        .columns([
            SelectColumn::aliased(
                Expr::sum(Expr::qualified_column("fs", "LineTotal")),
                "total_revenue",
            ),
            SelectColumn::aliased(
                Expr::avg(Expr::qualified_column("fs", "LineTotal")),
                "avg_order_value",
            ),
        ])
        .from(FromClause::aliased("fact_sales", "fs"));

    let result = render(&stmt);
    insta::assert_snapshot!(
        result.sql,
        @r#"SELECT SUM("fs"."LineTotal") AS "total_revenue", AVG("fs"."LineTotal") AS "avg_order_value" FROM "fact_sales" "fs""#
    );
    assert!(result.params.is_empty());
}

#[test]
fn test_bucketed_grouping() {
    let bucket = Expr::case_when_else(
        Expr::qualified_column("fs", "UnitPriceDiscount").gt(Expr::Int(0)),
        Expr::string("With Discount"),
        Expr::string("No Discount"),
    );
    let stmt = SelectStmt::new()
        .columns([
            SelectColumn::aliased(bucket, "discount_group"),
            SelectColumn::aliased(Expr::count_star(), "order_count"),
        ])
        .from(FromClause::aliased("fact_sales", "fs"))
        .group_by(Expr::column("discount_group"));

    let result = render(&stmt);
    insta::assert_snapshot!(
        result.sql,
        @r#"SELECT CASE WHEN "fs"."UnitPriceDiscount" > 0 THEN 'With Discount' ELSE 'No Discount' END AS "discount_group", COUNT(*) AS "order_count" FROM "fact_sales" "fs" GROUP BY "discount_group""#
    );
}

#[test]
fn test_scoped_drilldown_with_params() {
    let stmt = SelectStmt::new()
        .columns([
            SelectColumn::aliased(
                Expr::extract(DateField::Week, Expr::qualified_column("d", "full_date"))
                    .as_integer(),
                "week_number",
            ),
            SelectColumn::aliased(Expr::min(Expr::qualified_column("d", "full_date")), "week_start"),
            SelectColumn::aliased(Expr::sum(Expr::qualified_column("f", "LineTotal")), "revenue"),
        ])
        .from(FromClause::aliased("fact_sales", "f"))
        .join(Join::inner(
            "dim_date",
            "d",
            Expr::qualified_column("f", "date_id").eq(Expr::qualified_column("d", "date_id")),
        ))
        .where_(
            Expr::qualified_column("d", "year")
                .eq(Expr::param("year"))
                .and(Expr::qualified_column("d", "month").eq(Expr::param("month"))),
        )
        .group_by(Expr::extract(
            DateField::Week,
            Expr::qualified_column("d", "full_date"),
        ))
        .order_by(OrderBy::asc(Expr::column("week_number")));

    let result = render(&stmt);
    insta::assert_snapshot!(
        result.sql,
        @r#"SELECT CAST(EXTRACT(WEEK FROM "d"."full_date") AS INTEGER) AS "week_number", MIN("d"."full_date") AS "week_start", SUM("f"."LineTotal") AS "revenue" FROM "fact_sales" "f" INNER JOIN "dim_date" "d" ON "f"."date_id" = "d"."date_id" WHERE "d"."year" = $1 AND "d"."month" = $2 GROUP BY EXTRACT(WEEK FROM "d"."full_date") ORDER BY "week_number" ASC"#
    );
    assert_eq!(result.params, vec!["year", "month"]);
}

#[test]
fn test_first_purchase_join() {
    let first = SelectStmt::new()
        .columns([
            SelectColumn::expr(Expr::column("customer_id")),
            SelectColumn::aliased(Expr::min(Expr::column("OrderDate")), "first_purchase"),
        ])
        .from(FromClause::table("fact_sales"))
        .group_by(Expr::column("customer_id"));

    let stmt = SelectStmt::new()
        .columns([SelectColumn::aliased(
            Expr::count_distinct([Expr::case_when(
                Expr::qualified_column("first", "first_purchase")
                    .lt(Expr::month_floor(Expr::qualified_column("fs", "OrderDate"))),
                Expr::qualified_column("fs", "customer_id"),
            )]),
            "loyal_customer",
        )])
        .from(FromClause::aliased("fact_sales", "fs"))
        .join(Join::derived(
            first,
            "first",
            Expr::qualified_column("first", "customer_id")
                .eq(Expr::qualified_column("fs", "customer_id")),
        ));

    let result = render(&stmt);
    insta::assert_snapshot!(
        result.sql,
        @r#"SELECT COUNT(DISTINCT CASE WHEN "first"."first_purchase" < date_trunc('month', "fs"."OrderDate") THEN "fs"."customer_id" END) AS "loyal_customer" FROM "fact_sales" "fs" INNER JOIN (SELECT "customer_id", MIN("OrderDate") AS "first_purchase" FROM "fact_sales" GROUP BY "customer_id") "first" ON "first"."customer_id" = "fs"."customer_id""#
    );
}
