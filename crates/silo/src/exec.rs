//! Query execution against the warehouse.

use silo_sql::{JoinSource, RenderedSql, SelectStmt, render};
use tokio_postgres::Client;
use tokio_postgres::types::ToSql;

use crate::error::{Error, Result};
use crate::row::{Row, SqlParam, pg_row_to_row};
use crate::schema;
use crate::value::Value;

/// A warehouse connection that can execute aggregation statements.
///
/// Borrows a client for the duration of one logical query. The core never
/// retries and never partially returns a report; a failed execution
/// propagates as-is.
pub struct Warehouse<'a> {
    client: &'a Client,
}

impl<'a> Warehouse<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Execute a statement and return all rows.
    pub async fn fetch(&self, stmt: &SelectStmt, params: &[(&str, Value)]) -> Result<Vec<Row>> {
        validate_tables(stmt)?;

        let rendered = render(stmt);
        let values = bind_params(&rendered, params)?;
        tracing::debug!(sql = %rendered.sql, "executing aggregation query");

        let sql_params: Vec<SqlParam> = values.iter().map(SqlParam).collect();
        let params_ref: Vec<&(dyn ToSql + Sync)> = sql_params
            .iter()
            .map(|p| p as &(dyn ToSql + Sync))
            .collect();

        let rows = self.client.query(&rendered.sql, &params_ref).await?;
        rows.iter().map(pg_row_to_row).collect()
    }

    /// Execute a statement expected to produce a single summary row.
    pub async fn fetch_one(
        &self,
        stmt: &SelectStmt,
        params: &[(&str, Value)],
    ) -> Result<Option<Row>> {
        let mut rows = self.fetch(stmt, params).await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.swap_remove(0))
        })
    }
}

/// Order bound values to match the rendered parameter sequence.
fn bind_params(rendered: &RenderedSql, params: &[(&str, Value)]) -> Result<Vec<Value>> {
    rendered
        .params
        .iter()
        .map(|name| {
            params
                .iter()
                .find(|(n, _)| *n == name.as_str())
                .map(|(_, v)| v.clone())
                .ok_or_else(|| Error::UnboundParam { name: name.clone() })
        })
        .collect()
}

/// Reject statements that reference tables outside the catalog.
fn validate_tables(stmt: &SelectStmt) -> Result<()> {
    if let Some(from) = &stmt.from {
        known_table(&from.table)?;
    }
    for join in &stmt.joins {
        match &join.source {
            JoinSource::Table(table) => known_table(table)?,
            JoinSource::Select(sub) => validate_tables(sub)?,
        }
    }
    Ok(())
}

fn known_table(name: &str) -> Result<()> {
    schema::table(name)
        .map(|_| ())
        .ok_or_else(|| Error::UnknownTable(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use silo_sql::{Expr, FromClause, SelectColumn};

    #[test]
    fn test_unknown_table_is_rejected() {
        let stmt = SelectStmt::new()
            .columns([SelectColumn::expr(Expr::column("x"))])
            .from(FromClause::table("fact_returns"));

        assert!(matches!(
            validate_tables(&stmt),
            Err(Error::UnknownTable(name)) if name == "fact_returns"
        ));
    }

    #[test]
    fn test_catalog_tables_pass_validation() {
        let stmt = SelectStmt::new()
            .columns([SelectColumn::expr(Expr::column("LineTotal"))])
            .from(FromClause::aliased("fact_sales", "fs"));

        assert!(validate_tables(&stmt).is_ok());
    }

    #[test]
    fn test_bind_params_orders_by_rendered_sequence() {
        let rendered = RenderedSql {
            sql: String::new(),
            params: vec!["year".to_string(), "month".to_string()],
        };
        let bound = bind_params(
            &rendered,
            &[("month", Value::I32(2)), ("year", Value::I32(2024))],
        )
        .unwrap();
        assert_eq!(bound, vec![Value::I32(2024), Value::I32(2)]);
    }

    #[test]
    fn test_unbound_param_is_an_error() {
        let rendered = RenderedSql {
            sql: String::new(),
            params: vec!["year".to_string()],
        };
        assert!(matches!(
            bind_params(&rendered, &[]),
            Err(Error::UnboundParam { name }) if name == "year"
        ));
    }
}
