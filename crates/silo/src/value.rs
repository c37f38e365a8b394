//! Runtime values for query parameters and result cells.

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// A runtime SQL value.
///
/// Covers the column types the warehouse produces: integers, NUMERIC
/// measures, text attributes and calendar dates.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// NULL
    Null,

    /// Boolean
    Bool(bool),

    /// 32-bit signed integer (INTEGER)
    I32(i32),

    /// 64-bit signed integer (BIGINT, and what COUNT/SUM over integers yield)
    I64(i64),

    /// 64-bit float (DOUBLE PRECISION)
    F64(f64),

    /// Arbitrary-precision decimal (NUMERIC measures)
    Decimal(Decimal),

    /// Text (TEXT, VARCHAR, etc.)
    String(String),

    /// Calendar date (DATE)
    Date(NaiveDate),
}

impl Value {
    /// Returns true if this is a NULL value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

// Convenient From impls
impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::I32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::I64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}
