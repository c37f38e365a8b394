//! Row mapping between Postgres and Rust types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tokio_postgres::types::{ToSql, Type as PgTypeInfo};

use crate::error::{Error, Result};
use crate::value::Value;

/// A row of data as field name → value pairs.
pub type Row = Vec<(String, Value)>;

/// Convert a tokio_postgres Row to our Row type.
///
/// Aggregation results are expression columns, not table columns, so the
/// mapping is driven by the result's own column metadata.
pub fn pg_row_to_row(pg_row: &tokio_postgres::Row) -> Result<Row> {
    let mut row = Vec::with_capacity(pg_row.len());

    for (i, column) in pg_row.columns().iter().enumerate() {
        let value = pg_value_to_value(pg_row, i, column.type_())?;
        row.push((column.name().to_string(), value));
    }

    Ok(row)
}

/// Extract a value from a Postgres row at a given index.
fn pg_value_to_value(row: &tokio_postgres::Row, idx: usize, ty: &PgTypeInfo) -> Result<Value> {
    // tokio_postgres returns None for NULL values
    let value = if *ty == PgTypeInfo::BOOL {
        let v: Option<bool> = row.get(idx);
        v.map(Value::Bool)
    } else if *ty == PgTypeInfo::INT2 {
        let v: Option<i16> = row.get(idx);
        v.map(|v| Value::I32(v.into()))
    } else if *ty == PgTypeInfo::INT4 {
        let v: Option<i32> = row.get(idx);
        v.map(Value::I32)
    } else if *ty == PgTypeInfo::INT8 {
        let v: Option<i64> = row.get(idx);
        v.map(Value::I64)
    } else if *ty == PgTypeInfo::FLOAT4 {
        let v: Option<f32> = row.get(idx);
        v.map(|v| Value::F64(v.into()))
    } else if *ty == PgTypeInfo::FLOAT8 {
        let v: Option<f64> = row.get(idx);
        v.map(Value::F64)
    } else if *ty == PgTypeInfo::NUMERIC {
        let v: Option<Decimal> = row.get(idx);
        v.map(Value::Decimal)
    } else if *ty == PgTypeInfo::TEXT || *ty == PgTypeInfo::VARCHAR || *ty == PgTypeInfo::BPCHAR {
        let v: Option<String> = row.get(idx);
        v.map(Value::String)
    } else if *ty == PgTypeInfo::DATE {
        let v: Option<NaiveDate> = row.get(idx);
        v.map(Value::Date)
    } else {
        return Err(Error::UnexpectedRow {
            column: row.columns()[idx].name().to_string(),
        });
    };

    Ok(value.unwrap_or(Value::Null))
}

/// Wrapper to make our Value usable as a ToSql parameter.
#[derive(Debug)]
pub(crate) struct SqlParam<'a>(pub &'a Value);

impl ToSql for SqlParam<'_> {
    fn to_sql(
        &self,
        ty: &PgTypeInfo,
        out: &mut bytes::BytesMut,
    ) -> std::result::Result<tokio_postgres::types::IsNull, Box<dyn std::error::Error + Sync + Send>>
    {
        match self.0 {
            Value::Null => Ok(tokio_postgres::types::IsNull::Yes),
            Value::Bool(v) => v.to_sql(ty, out),
            Value::I32(v) => v.to_sql(ty, out),
            Value::I64(v) => v.to_sql(ty, out),
            Value::F64(v) => v.to_sql(ty, out),
            Value::Decimal(v) => v.to_sql(ty, out),
            Value::String(v) => v.to_sql(ty, out),
            Value::Date(v) => v.to_sql(ty, out),
        }
    }

    fn accepts(ty: &PgTypeInfo) -> bool {
        // Accept the types the warehouse columns and filters use
        [
            PgTypeInfo::BOOL,
            PgTypeInfo::INT2,
            PgTypeInfo::INT4,
            PgTypeInfo::INT8,
            PgTypeInfo::FLOAT8,
            PgTypeInfo::NUMERIC,
            PgTypeInfo::TEXT,
            PgTypeInfo::VARCHAR,
            PgTypeInfo::DATE,
        ]
        .contains(ty)
    }

    tokio_postgres::types::to_sql_checked!();
}

// ============================================================================
// Typed accessors for report mappers
// ============================================================================

fn field<'a>(row: &'a Row, name: &str) -> Result<&'a Value> {
    row.iter()
        .find(|(n, _)| n.as_str() == name)
        .map(|(_, v)| v)
        .ok_or_else(|| Error::UnexpectedRow {
            column: name.to_string(),
        })
}

/// Read a NUMERIC aggregate. NULL (aggregate over an empty input set)
/// coalesces to zero.
pub(crate) fn decimal_or_zero(row: &Row, name: &str) -> Result<Decimal> {
    match field(row, name)? {
        Value::Null => Ok(Decimal::ZERO),
        Value::Decimal(d) => Ok(*d),
        Value::I64(n) => Ok(Decimal::from(*n)),
        Value::I32(n) => Ok(Decimal::from(*n)),
        _ => Err(Error::UnexpectedRow {
            column: name.to_string(),
        }),
    }
}

/// Read an integer aggregate. NULL coalesces to zero.
pub(crate) fn int_or_zero(row: &Row, name: &str) -> Result<i64> {
    match field(row, name)? {
        Value::Null => Ok(0),
        Value::I64(n) => Ok(*n),
        Value::I32(n) => Ok((*n).into()),
        _ => Err(Error::UnexpectedRow {
            column: name.to_string(),
        }),
    }
}

/// Read a 32-bit integer cell (calendar parts).
pub(crate) fn int32(row: &Row, name: &str) -> Result<i32> {
    match field(row, name)? {
        Value::I32(n) => Ok(*n),
        _ => Err(Error::UnexpectedRow {
            column: name.to_string(),
        }),
    }
}

/// Read a text cell.
pub(crate) fn text(row: &Row, name: &str) -> Result<String> {
    match field(row, name)? {
        Value::String(s) => Ok(s.clone()),
        _ => Err(Error::UnexpectedRow {
            column: name.to_string(),
        }),
    }
}

/// Read a date cell.
pub(crate) fn date(row: &Row, name: &str) -> Result<NaiveDate> {
    match field(row, name)? {
        Value::Date(d) => Ok(*d),
        _ => Err(Error::UnexpectedRow {
            column: name.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> Row {
        vec![
            ("total_revenue".to_string(), Value::Null),
            ("order_count".to_string(), Value::I64(3)),
            ("month".to_string(), Value::String("2024-01".to_string())),
        ]
    }

    #[test]
    fn test_null_aggregate_coalesces_to_zero() {
        assert_eq!(decimal_or_zero(&row(), "total_revenue").unwrap(), Decimal::ZERO);
        assert_eq!(int_or_zero(&row(), "total_revenue").unwrap(), 0);
    }

    #[test]
    fn test_missing_column_is_an_error() {
        assert!(matches!(
            text(&row(), "nope"),
            Err(Error::UnexpectedRow { .. })
        ));
    }

    #[test]
    fn test_count_widens_to_decimal() {
        assert_eq!(
            decimal_or_zero(&row(), "order_count").unwrap(),
            Decimal::from(3)
        );
    }
}
