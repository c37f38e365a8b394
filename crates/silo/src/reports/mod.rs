//! Report modules over the warehouse.
//!
//! Each operation is a pure statement-constructor function, unit-testable
//! without a live warehouse, paired with an async executor that runs the
//! statement through [`Warehouse`](crate::Warehouse) and maps rows into a
//! named result struct.

pub mod customers;
pub mod employees;
pub mod products;
pub mod purchasing;
pub mod sales;
pub mod segment;
pub mod timeseries;

pub use timeseries::Fact;

/// Fixed result size for every ranking report.
pub(crate) const TOP_N: i64 = 10;

/// Month key format used by every period-grouped report (`YYYY-MM`).
pub(crate) const MONTH_KEY: &str = "YYYY-MM";
