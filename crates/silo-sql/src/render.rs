//! Render SQL AST to string.

use indexmap::IndexMap;

use crate::expr::{ColumnRef, Expr};
use crate::stmt::*;
use crate::{RenderedSql, escape_string, quote_ident};

/// Rendering context that tracks parameters and formatting.
pub struct RenderContext {
    /// Named parameters -> their assigned index
    params: IndexMap<String, usize>,
    /// Next parameter index to assign
    next_param_idx: usize,
    /// The SQL being built
    sql: String,
    /// Whether we're at the start of a line
    at_line_start: bool,
    /// Whether to format with newlines
    pretty: bool,
}

impl RenderContext {
    pub fn new() -> Self {
        Self {
            params: IndexMap::new(),
            next_param_idx: 1,
            sql: String::new(),
            at_line_start: true,
            pretty: false,
        }
    }

    pub fn pretty() -> Self {
        Self {
            pretty: true,
            ..Self::new()
        }
    }

    /// Get or create a parameter placeholder.
    fn param(&mut self, name: &str) -> String {
        let idx = *self.params.entry(name.to_string()).or_insert_with(|| {
            let idx = self.next_param_idx;
            self.next_param_idx += 1;
            idx
        });
        format!("${}", idx)
    }

    fn write(&mut self, s: &str) {
        self.sql.push_str(s);
        self.at_line_start = false;
    }

    fn space(&mut self) {
        if !self.sql.is_empty() && !self.at_line_start {
            self.sql.push(' ');
        }
    }

    fn newline(&mut self) {
        if self.pretty {
            self.sql.push('\n');
            self.at_line_start = true;
        } else {
            self.space();
        }
    }

    /// Finish rendering and return the result.
    pub fn finish(self) -> RenderedSql {
        RenderedSql {
            sql: self.sql,
            params: self.params.into_keys().collect(),
        }
    }
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Render implementations
// ============================================================================

/// Trait for types that can be rendered to SQL.
pub trait Render {
    fn render(&self, ctx: &mut RenderContext);
}

impl Render for Expr {
    fn render(&self, ctx: &mut RenderContext) {
        match self {
            Expr::Param(name) => {
                let placeholder = ctx.param(name);
                ctx.write(&placeholder);
            }
            Expr::Column(col) => col.render(ctx),
            Expr::String(s) => ctx.write(&escape_string(s)),
            Expr::Int(n) => ctx.write(&n.to_string()),
            Expr::Null => ctx.write("NULL"),
            Expr::BinOp { left, op, right } => {
                left.render(ctx);
                ctx.space();
                ctx.write(op.as_str());
                ctx.space();
                right.render(ctx);
            }
            Expr::IsNull { expr, negated } => {
                expr.render(ctx);
                ctx.write(if *negated { " IS NOT NULL" } else { " IS NULL" });
            }
            Expr::FnCall { name, args } => {
                ctx.write(name);
                ctx.write("(");
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        ctx.write(", ");
                    }
                    arg.render(ctx);
                }
                ctx.write(")");
            }
            Expr::CountStar => ctx.write("COUNT(*)"),
            Expr::CountDistinct(keys) => {
                ctx.write("COUNT(DISTINCT ");
                if keys.len() == 1 {
                    keys[0].render(ctx);
                } else {
                    // Composite key: row-value syntax
                    ctx.write("(");
                    for (i, key) in keys.iter().enumerate() {
                        if i > 0 {
                            ctx.write(", ");
                        }
                        key.render(ctx);
                    }
                    ctx.write(")");
                }
                ctx.write(")");
            }
            Expr::Case { whens, else_ } => {
                ctx.write("CASE");
                for (cond, then) in whens {
                    ctx.write(" WHEN ");
                    cond.render(ctx);
                    ctx.write(" THEN ");
                    then.render(ctx);
                }
                if let Some(else_) = else_ {
                    ctx.write(" ELSE ");
                    else_.render(ctx);
                }
                ctx.write(" END");
            }
            Expr::Extract { field, expr } => {
                ctx.write("EXTRACT(");
                ctx.write(field.as_str());
                ctx.write(" FROM ");
                expr.render(ctx);
                ctx.write(")");
            }
            Expr::Cast { expr, ty } => {
                ctx.write("CAST(");
                expr.render(ctx);
                ctx.write(" AS ");
                ctx.write(ty);
                ctx.write(")");
            }
            Expr::Raw(s) => ctx.write(s),
        }
    }
}

impl Render for ColumnRef {
    fn render(&self, ctx: &mut RenderContext) {
        if let Some(table) = &self.table {
            ctx.write(&quote_ident(table));
            ctx.write(".");
        }
        ctx.write(&quote_ident(&self.column));
    }
}

impl Render for SelectStmt {
    fn render(&self, ctx: &mut RenderContext) {
        ctx.write("SELECT");
        if self.distinct {
            ctx.write(" DISTINCT");
        }

        // Columns
        if self.columns.is_empty() {
            ctx.write(" *");
        } else {
            for (i, col) in self.columns.iter().enumerate() {
                if i > 0 {
                    ctx.write(",");
                }
                ctx.space();
                col.render(ctx);
            }
        }

        // FROM
        if let Some(from) = &self.from {
            ctx.newline();
            ctx.write("FROM ");
            ctx.write(&quote_ident(&from.table));
            if let Some(alias) = &from.alias {
                ctx.write(" ");
                ctx.write(&quote_ident(alias));
            }
        }

        // JOINs
        for join in &self.joins {
            ctx.newline();
            ctx.write(join.kind.as_str());
            ctx.write(" ");
            match &join.source {
                JoinSource::Table(table) => ctx.write(&quote_ident(table)),
                JoinSource::Select(stmt) => {
                    ctx.write("(");
                    stmt.render(ctx);
                    ctx.write(")");
                }
            }
            if let Some(alias) = &join.alias {
                ctx.write(" ");
                ctx.write(&quote_ident(alias));
            }
            ctx.write(" ON ");
            join.on.render(ctx);
        }

        // WHERE
        if let Some(where_) = &self.where_ {
            ctx.newline();
            ctx.write("WHERE ");
            where_.render(ctx);
        }

        // GROUP BY
        if !self.group_by.is_empty() {
            ctx.newline();
            ctx.write("GROUP BY ");
            for (i, expr) in self.group_by.iter().enumerate() {
                if i > 0 {
                    ctx.write(", ");
                }
                expr.render(ctx);
            }
        }

        // HAVING
        if let Some(having) = &self.having {
            ctx.newline();
            ctx.write("HAVING ");
            having.render(ctx);
        }

        // ORDER BY
        if !self.order_by.is_empty() {
            ctx.newline();
            ctx.write("ORDER BY ");
            for (i, order) in self.order_by.iter().enumerate() {
                if i > 0 {
                    ctx.write(", ");
                }
                order.expr.render(ctx);
                ctx.write(if order.desc { " DESC" } else { " ASC" });
            }
        }

        // LIMIT
        if let Some(limit) = &self.limit {
            ctx.newline();
            ctx.write("LIMIT ");
            limit.render(ctx);
        }
    }
}

impl Render for SelectColumn {
    fn render(&self, ctx: &mut RenderContext) {
        self.expr.render(ctx);
        if let Some(alias) = &self.alias {
            ctx.write(" AS ");
            ctx.write(&quote_ident(alias));
        }
    }
}

// ============================================================================
// Convenience methods
// ============================================================================

/// Render a statement to SQL with default (compact) formatting.
pub fn render(stmt: &impl Render) -> RenderedSql {
    let mut ctx = RenderContext::new();
    stmt.render(&mut ctx);
    ctx.finish()
}

/// Render a statement to SQL with pretty formatting (newlines).
pub fn render_pretty(stmt: &impl Render) -> RenderedSql {
    let mut ctx = RenderContext::pretty();
    stmt.render(&mut ctx);
    ctx.finish()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{DateField, Expr};

    #[test]
    fn test_simple_select() {
        let stmt = SelectStmt::new()
            .columns([
                SelectColumn::expr(Expr::column("id")),
                SelectColumn::expr(Expr::column("name")),
            ])
            .from(FromClause::table("dim_product"));

        let result = render(&stmt);
        assert_eq!(result.sql, "SELECT \"id\", \"name\" FROM \"dim_product\"");
    }

    #[test]
    fn test_group_by_aggregate() {
        let stmt = SelectStmt::new()
            .columns([
                SelectColumn::expr(Expr::qualified_column("p", "product_name")),
                SelectColumn::aliased(
                    Expr::sum(Expr::qualified_column("fs", "OrderQty")),
                    "total_qty",
                ),
            ])
            .from(FromClause::aliased("fact_sales", "fs"))
            .join(Join::inner(
                "dim_product",
                "p",
                Expr::qualified_column("fs", "product_id")
                    .eq(Expr::qualified_column("p", "product_id")),
            ))
            .group_by(Expr::qualified_column("p", "product_name"))
            .order_by(OrderBy::desc(Expr::column("total_qty")))
            .limit(Expr::Int(10));

        let result = render(&stmt);
        assert_eq!(
            result.sql,
            "SELECT \"p\".\"product_name\", SUM(\"fs\".\"OrderQty\") AS \"total_qty\" \
             FROM \"fact_sales\" \"fs\" \
             INNER JOIN \"dim_product\" \"p\" ON \"fs\".\"product_id\" = \"p\".\"product_id\" \
             GROUP BY \"p\".\"product_name\" \
             ORDER BY \"total_qty\" DESC \
             LIMIT 10"
        );
    }

    #[test]
    fn test_param_dedup() {
        // The same named parameter used twice binds once.
        let stmt = SelectStmt::new()
            .columns([SelectColumn::expr(Expr::column("month"))])
            .from(FromClause::table("dim_date"))
            .where_(
                Expr::column("year")
                    .eq(Expr::param("year"))
                    .and(Expr::column("fiscal_year").eq(Expr::param("year"))),
            );

        let result = render(&stmt);
        assert_eq!(result.params, vec!["year"]);
        assert!(result.sql.contains("\"year\" = $1"));
        assert!(result.sql.contains("\"fiscal_year\" = $1"));
    }

    #[test]
    fn test_case_expression() {
        let expr = Expr::case_when_else(
            Expr::column("UnitPriceDiscount").gt(Expr::Int(0)),
            Expr::string("With Discount"),
            Expr::string("No Discount"),
        );

        let mut ctx = RenderContext::new();
        expr.render(&mut ctx);
        assert_eq!(
            ctx.finish().sql,
            "CASE WHEN \"UnitPriceDiscount\" > 0 THEN 'With Discount' ELSE 'No Discount' END"
        );
    }

    #[test]
    fn test_case_without_else() {
        let expr = Expr::case_when(
            Expr::column("first_purchase").lt(Expr::column("floor")),
            Expr::column("customer_id"),
        );

        let mut ctx = RenderContext::new();
        expr.render(&mut ctx);
        assert_eq!(
            ctx.finish().sql,
            "CASE WHEN \"first_purchase\" < \"floor\" THEN \"customer_id\" END"
        );
    }

    #[test]
    fn test_count_distinct_composite() {
        let expr = Expr::count_distinct([
            Expr::qualified_column("fs", "customer_id"),
            Expr::qualified_column("fs", "OrderDate"),
        ]);

        let mut ctx = RenderContext::new();
        expr.render(&mut ctx);
        assert_eq!(
            ctx.finish().sql,
            "COUNT(DISTINCT (\"fs\".\"customer_id\", \"fs\".\"OrderDate\"))"
        );
    }

    #[test]
    fn test_count_distinct_single() {
        let expr = Expr::count_distinct([Expr::column("customer_id")]);

        let mut ctx = RenderContext::new();
        expr.render(&mut ctx);
        assert_eq!(ctx.finish().sql, "COUNT(DISTINCT \"customer_id\")");
    }

    #[test]
    fn test_extract_and_cast() {
        let expr = Expr::extract(DateField::Week, Expr::qualified_column("d", "full_date"))
            .as_integer();

        let mut ctx = RenderContext::new();
        expr.render(&mut ctx);
        assert_eq!(
            ctx.finish().sql,
            "CAST(EXTRACT(WEEK FROM \"d\".\"full_date\") AS INTEGER)"
        );
    }

    #[test]
    fn test_arithmetic() {
        // LineTotal - OrderQty * StandardCost: multiplication binds tighter,
        // so the flat rendering is the intended grouping.
        let expr = Expr::qualified_column("fs", "LineTotal").sub(
            Expr::qualified_column("fs", "OrderQty").mul(Expr::qualified_column("p", "StandardCost")),
        );

        let mut ctx = RenderContext::new();
        expr.render(&mut ctx);
        assert_eq!(
            ctx.finish().sql,
            "\"fs\".\"LineTotal\" - \"fs\".\"OrderQty\" * \"p\".\"StandardCost\""
        );
    }

    #[test]
    fn test_derived_table_join() {
        let sub = SelectStmt::new()
            .columns([
                SelectColumn::expr(Expr::column("customer_id")),
                SelectColumn::aliased(Expr::min(Expr::column("OrderDate")), "first_purchase"),
            ])
            .from(FromClause::table("fact_sales"))
            .group_by(Expr::column("customer_id"));

        let stmt = SelectStmt::new()
            .columns([SelectColumn::expr(Expr::qualified_column(
                "first",
                "first_purchase",
            ))])
            .from(FromClause::aliased("fact_sales", "fs"))
            .join(Join::derived(
                sub,
                "first",
                Expr::qualified_column("first", "customer_id")
                    .eq(Expr::qualified_column("fs", "customer_id")),
            ));

        let result = render(&stmt);
        assert_eq!(
            result.sql,
            "SELECT \"first\".\"first_purchase\" \
             FROM \"fact_sales\" \"fs\" \
             INNER JOIN (SELECT \"customer_id\", MIN(\"OrderDate\") AS \"first_purchase\" \
             FROM \"fact_sales\" GROUP BY \"customer_id\") \"first\" \
             ON \"first\".\"customer_id\" = \"fs\".\"customer_id\""
        );
    }

    #[test]
    fn test_having() {
        let stmt = SelectStmt::new()
            .columns([SelectColumn::aliased(
                Expr::sum(Expr::column("RejectedQty")),
                "rejected_qty",
            )])
            .from(FromClause::table("fact_purchasing"))
            .group_by(Expr::column("product_id"))
            .having(Expr::sum(Expr::column("RejectedQty")).gt(Expr::Int(0)));

        let result = render(&stmt);
        assert!(result.sql.contains("HAVING SUM(\"RejectedQty\") > 0"));
    }

    #[test]
    fn test_distinct() {
        let stmt = SelectStmt::new()
            .distinct()
            .columns([SelectColumn::expr(Expr::qualified_column("d", "year"))])
            .from(FromClause::aliased("dim_date", "d"))
            .order_by(OrderBy::desc(Expr::qualified_column("d", "year")));

        let result = render(&stmt);
        assert_eq!(
            result.sql,
            "SELECT DISTINCT \"d\".\"year\" FROM \"dim_date\" \"d\" ORDER BY \"d\".\"year\" DESC"
        );
    }

    #[test]
    fn test_is_not_null() {
        let stmt = SelectStmt::new()
            .columns([SelectColumn::expr(Expr::column("StandardCost"))])
            .from(FromClause::table("dim_product"))
            .where_(Expr::column("StandardCost").is_not_null());

        let result = render(&stmt);
        assert!(result.sql.contains("\"StandardCost\" IS NOT NULL"));
    }

    #[test]
    fn test_pretty_formatting() {
        let stmt = SelectStmt::new()
            .columns([SelectColumn::aliased(
                Expr::sum(Expr::column("LineTotal")),
                "total_revenue",
            )])
            .from(FromClause::table("fact_sales"))
            .group_by(Expr::column("product_id"))
            .order_by(OrderBy::desc(Expr::column("total_revenue")))
            .limit(Expr::Int(10));

        let result = render_pretty(&stmt);
        assert!(result.sql.contains("\n"), "Should have newlines");
        assert!(result.sql.contains("GROUP BY"));
        assert!(result.sql.contains("ORDER BY"));
        assert!(result.sql.contains("LIMIT"));
    }
}
