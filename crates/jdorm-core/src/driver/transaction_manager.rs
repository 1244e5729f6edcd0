use super::operation::Transaction;
use crate::{err, Result};

/// Tracks whether a connection has an open transaction and produces the
/// SQL for each lifecycle step.
///
/// Each SQL driver embeds one of these and calls [`TransactionManager::sql`]
/// before running the returned statement.
#[derive(Debug)]
pub struct TransactionManager {
    open: bool,
    begin_stmt: &'static str,
}

impl TransactionManager {
    fn with_begin(begin_stmt: &'static str) -> Self {
        Self {
            open: false,
            begin_stmt,
        }
    }

    /// `BEGIN` / `COMMIT` / `ROLLBACK`.
    pub fn sqlite() -> Self {
        Self::with_begin("BEGIN")
    }

    /// `START TRANSACTION` / `COMMIT` / `ROLLBACK`.
    pub fn mysql() -> Self {
        Self::with_begin("START TRANSACTION")
    }

    /// `BEGIN` / `COMMIT` / `ROLLBACK`.
    pub fn postgresql() -> Self {
        Self::with_begin("BEGIN")
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Returns the SQL for `op`. Call [`TransactionManager::complete`] once
    /// the statement succeeded.
    pub fn sql(&self, op: Transaction) -> Result<&'static str> {
        match (op, self.open) {
            (Transaction::Start, false) => Ok(self.begin_stmt),
            (Transaction::Start, true) => Err(err!("a transaction is already open on this connection")),
            (Transaction::Commit, true) => Ok("COMMIT"),
            (Transaction::Rollback, true) => Ok("ROLLBACK"),
            (_, false) => Err(err!("no transaction is open on this connection")),
        }
    }

    /// Record that `op` ran successfully.
    pub fn complete(&mut self, op: Transaction) {
        self.open = matches!(op, Transaction::Start);
    }

    /// Forget any open transaction, e.g. after the database rolled it back on its own.
    pub fn reset(&mut self) {
        self.open = false;
    }
}
