//! Connection pooling abstractions.
//!
//! Every report operation acquires one execution handle, runs one logical
//! query, and releases the handle unconditionally: the guard returned by
//! [`ConnectionProvider::get`] releases on drop, which covers every exit
//! path including failure. Handles are never held across independent
//! aggregation calls.
//!
//! Two providers are supported:
//!
//! - `Arc<tokio_postgres::Client>` - a single shared connection
//! - `deadpool_postgres::Pool` - a bounded pool (requires the `deadpool`
//!   feature)

use std::future::Future;
use std::ops::Deref;
use std::sync::Arc;

use tokio_postgres::Client;

use crate::Error;

/// A source of warehouse connections.
///
/// # Example
///
/// ```ignore
/// async fn run_report<P: ConnectionProvider>(provider: &P) -> Result<(), Error> {
///     let conn = provider.get().await?;
///     // one logical query per handle
///     conn.query("SELECT 1", &[]).await?;
///     Ok(())
/// } // handle released here, success or not
/// ```
pub trait ConnectionProvider: Clone + Send + Sync + 'static {
    /// The guard type that holds the connection.
    ///
    /// Must deref to [`tokio_postgres::Client`]; releases the connection
    /// back to the pool (if applicable) when dropped.
    type Guard<'a>: Deref<Target = Client> + Send
    where
        Self: 'a;

    /// Obtain a connection from this provider.
    ///
    /// For a single connection, this returns immediately. For a bounded
    /// pool, this may wait for a handle to become available.
    fn get(&self) -> impl Future<Output = Result<Self::Guard<'_>, Error>> + Send;
}

/// Implementation for a single shared connection.
///
/// Useful when pooling is unnecessary, such as CLI tools or tests.
impl ConnectionProvider for Arc<Client> {
    type Guard<'a> = Arc<Client>;

    async fn get(&self) -> Result<Self::Guard<'_>, Error> {
        Ok(self.clone())
    }
}

/// Wrapper around a deadpool pooled connection that derefs to `Client`.
#[cfg(feature = "deadpool")]
pub struct PooledConnection(deadpool_postgres::Object);

#[cfg(feature = "deadpool")]
impl Deref for PooledConnection {
    type Target = Client;

    fn deref(&self) -> &Client {
        // Object -> ClientWrapper -> Client
        &self.0
    }
}

/// Implementation for deadpool connection pool.
#[cfg(feature = "deadpool")]
impl ConnectionProvider for deadpool_postgres::Pool {
    type Guard<'a> = PooledConnection;

    async fn get(&self) -> Result<Self::Guard<'_>, Error> {
        self.get()
            .await
            .map(PooledConnection)
            .map_err(|e| Error::Pool(e.to_string()))
    }
}
