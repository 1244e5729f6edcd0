//! The boundary between the ORM and a database driver.
//!
//! A [`Driver`] opens [`Connection`]s. A connection executes SQL text with
//! positional parameters and transaction lifecycle operations; it knows
//! nothing about entities.

mod capability;
pub use capability::{Capability, Dialect};

mod response;
pub use response::{Response, Rows};

pub mod operation;
pub use operation::Operation;

mod transaction_manager;
pub use transaction_manager::TransactionManager;

use crate::{async_trait, Result};

use std::{fmt::Debug, sync::Arc};

#[async_trait]
pub trait Driver: Debug + Send + Sync + 'static {
    /// Describes the database the driver talks to, which selects the SQL dialect.
    fn capability(&self) -> &'static Capability;

    /// Open a new connection.
    async fn connect(&self) -> Result<Box<dyn Connection>>;

    /// Upper bound on connections the database supports, if the driver has one.
    fn max_connections(&self) -> Option<usize> {
        None
    }
}

#[async_trait]
pub trait Connection: Debug + Send + 'static {
    /// Execute a database operation.
    async fn exec(&mut self, op: Operation) -> Result<Response>;

    /// Whether a transaction started on this connection is still open.
    fn in_transaction(&self) -> bool;

    /// Cheap health check, run before a pooled connection is handed out again.
    async fn is_valid(&mut self) -> bool {
        true
    }

    /// Handle that aborts the statement currently executing on this connection.
    ///
    /// The handle must be usable from another task while `exec` is pending.
    fn canceller(&self) -> Option<Arc<dyn Cancel>> {
        None
    }
}

/// Aborts an in-flight statement. The interrupted `exec` returns a
/// query-cancelled error.
pub trait Cancel: Debug + Send + Sync + 'static {
    fn cancel(&self);
}
