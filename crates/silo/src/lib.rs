//! Analytics reporting core for a star-schema warehouse on Postgres.
//!
//! This crate answers "what happened" questions (revenue, top entities,
//! trends, segmentation) over two fact tables of sales and purchasing
//! lines and their dimensions. It provides:
//!
//! - A static catalog of the warehouse schema ([`schema`])
//! - Typed aggregation statements built on [`silo_sql`], one constructor
//!   per report, unit-testable without a live warehouse ([`reports`])
//! - Post-query reduction where SQL alone is the wrong tool: the
//!   per-employee top-product leaderboard ([`reduce`]) and the new/loyal
//!   customer segmentation mirror ([`reports::segment`])
//! - A validated facade, [`ReportService`], the only surface an external
//!   transport shim needs
//!
//! The warehouse is read-only and append-only from here: no ETL, no
//! mutable state, no caching. Every request is computed fresh.
//!
//! # Resource model
//!
//! Operations are stateless and independently executable. Each acquires a
//! single execution handle from a [`ConnectionProvider`] per logical
//! query and releases it on every exit path. Use `Arc<Client>` for a
//! single shared connection or, with the `deadpool` feature, a bounded
//! `deadpool_postgres::Pool`.
//!
//! ```ignore
//! let config = silo::Config::from_env()?;
//! let pool = config.create_pool()?; // feature = "deadpool"
//! let service = silo::ReportService::new(pool);
//!
//! let kpi = service.sales_kpi().await?;
//! let weekly = service.sales_weekly(Some(2024), Some(3)).await?;
//! ```

mod config;
mod error;
mod exec;
mod pool;
pub mod reduce;
pub mod reports;
mod row;
pub mod schema;
mod service;
mod value;

pub use config::{Config, ConfigError};
pub use error::{Error, Result};
pub use exec::Warehouse;
pub use pool::ConnectionProvider;
#[cfg(feature = "deadpool")]
pub use pool::PooledConnection;
pub use reports::Fact;
pub use row::{Row, pg_row_to_row};
pub use service::ReportService;
pub use value::Value;
