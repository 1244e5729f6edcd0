mod value;
pub(crate) use value::Value;

use jdorm_core::{
    async_trait,
    driver::{
        operation::{Operation, QuerySql, Transaction},
        Cancel, Capability, Driver, Response, TransactionManager,
    },
    stmt::ValueRecord,
    Error, Result,
};
use rusqlite::{Connection as RusqliteConnection, ErrorCode, InterruptHandle};
use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::Duration,
};
use url::Url;

/// How long a connection waits on a locked database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Prepared statements kept per connection.
const STATEMENT_CACHE_CAPACITY: usize = 64;

#[derive(Debug)]
pub enum Sqlite {
    File(PathBuf),
    InMemory,
}

impl Sqlite {
    /// Create a new SQLite driver from a `sqlite:` connection URL.
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url_str = url.into();
        let url = Url::parse(&url_str)?;

        if url.scheme() != "sqlite" {
            return Err(jdorm_core::err!(
                "connection URL does not have a `sqlite` scheme; url={url_str}"
            ));
        }

        if url.path() == ":memory:" {
            Ok(Self::InMemory)
        } else {
            Ok(Self::File(PathBuf::from(url.path())))
        }
    }

    /// Create an in-memory SQLite database.
    ///
    /// Every connection opens its own database, so the driver allows only one.
    pub fn in_memory() -> Self {
        Self::InMemory
    }

    /// Open a SQLite database at the specified file path
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self::File(path.as_ref().to_path_buf())
    }
}

#[async_trait]
impl Driver for Sqlite {
    fn capability(&self) -> &'static Capability {
        &Capability::SQLITE
    }

    async fn connect(&self) -> Result<Box<dyn jdorm_core::Connection>> {
        let connection = match self {
            Sqlite::File(path) => Connection::open(path)?,
            Sqlite::InMemory => Connection::in_memory()?,
        };
        Ok(Box::new(connection))
    }

    fn max_connections(&self) -> Option<usize> {
        matches!(self, Self::InMemory).then_some(1)
    }
}

#[derive(Debug)]
pub struct Connection {
    connection: Arc<Mutex<RusqliteConnection>>,
    interrupt: Arc<Interrupt>,
    transaction: TransactionManager,
}

/// Aborts the statement running on one connection.
struct Interrupt(InterruptHandle);

impl Connection {
    pub fn in_memory() -> Result<Self> {
        let connection = RusqliteConnection::open_in_memory().map_err(Error::connection_broken)?;
        Self::new(connection)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let connection = RusqliteConnection::open(path).map_err(map_error)?;

        // Readers never block the single writer.
        connection
            .query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))
            .map_err(map_error)?;

        Self::new(connection)
    }

    fn new(connection: RusqliteConnection) -> Result<Self> {
        connection.busy_timeout(BUSY_TIMEOUT).map_err(map_error)?;
        connection.set_prepared_statement_cache_capacity(STATEMENT_CACHE_CAPACITY);

        let interrupt = Arc::new(Interrupt(connection.get_interrupt_handle()));

        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
            interrupt,
            transaction: TransactionManager::sqlite(),
        })
    }

    /// Run `f` on the blocking pool. Also reports whether the connection is
    /// in autocommit mode afterwards, which reveals transactions SQLite
    /// rolled back on its own.
    async fn run<T, F>(&self, f: F) -> Result<(Result<T>, bool)>
    where
        T: Send + 'static,
        F: FnOnce(&RusqliteConnection) -> rusqlite::Result<T> + Send + 'static,
    {
        let connection = self.connection.clone();

        tokio::task::spawn_blocking(move || {
            let connection = connection.lock().map_err(|_| {
                Error::connection_broken(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "sqlite connection lock poisoned",
                ))
            })?;
            let result = f(&connection).map_err(map_error);
            Ok::<_, Error>((result, connection.is_autocommit()))
        })
        .await
        .map_err(Error::connection_broken)?
    }
}

#[async_trait]
impl jdorm_core::driver::Connection for Connection {
    async fn exec(&mut self, op: Operation) -> Result<Response> {
        match op {
            Operation::Transaction(op) => {
                let sql = self.transaction.sql(op)?;
                tracing::trace!(sql, "sqlite transaction");

                let (result, _) = self.run(move |conn| conn.execute_batch(sql)).await?;
                match result {
                    Ok(()) => self.transaction.complete(op),
                    // A failed rollback still ends the transaction.
                    Err(_) if op == Transaction::Rollback => self.transaction.reset(),
                    Err(_) => {}
                }
                result.map(|()| Response::empty())
            }
            Operation::QuerySql(op) => {
                tracing::trace!(sql = %op.sql, params = op.params.len(), "sqlite query");

                let (result, autocommit) = self.run(move |conn| query(conn, op)).await?;
                if result.is_err() && autocommit && self.transaction.is_open() {
                    tracing::debug!("sqlite rolled back the open transaction after an error");
                    self.transaction.reset();
                }
                result
            }
        }
    }

    fn in_transaction(&self) -> bool {
        self.transaction.is_open()
    }

    async fn is_valid(&mut self) -> bool {
        matches!(
            self.run(|conn| conn.query_row("SELECT 1", [], |_| Ok(()))).await,
            Ok((Ok(()), _))
        )
    }

    fn canceller(&self) -> Option<Arc<dyn Cancel>> {
        Some(self.interrupt.clone())
    }
}

fn query(conn: &RusqliteConnection, op: QuerySql) -> rusqlite::Result<Response> {
    let mut stmt = conn.prepare_cached(&op.sql)?;
    let params = op.params.into_iter().map(Value::from).collect::<Vec<_>>();

    if !op.returning {
        let count = stmt.execute(rusqlite::params_from_iter(params.iter()))?;
        return Ok(Response::count(count as u64));
    }

    let width = stmt.column_count();
    let mut rows = stmt.query(rusqlite::params_from_iter(params.iter()))?;
    let mut values = vec![];

    while let Some(row) = rows.next()? {
        let mut fields = Vec::with_capacity(width);
        for index in 0..width {
            fields.push(Value::from_sql(row.get_ref(index)?).into_inner());
        }
        values.push(ValueRecord::from_vec(fields));
    }

    Ok(Response::values(values))
}

fn map_error(err: rusqlite::Error) -> Error {
    match err.sqlite_error_code() {
        Some(ErrorCode::ConstraintViolation) => Error::constraint_violation(err),
        Some(ErrorCode::OperationInterrupted) => Error::query_cancelled(),
        Some(
            ErrorCode::SystemIoFailure
            | ErrorCode::DatabaseCorrupt
            | ErrorCode::NotADatabase
            | ErrorCode::CannotOpen,
        ) => Error::connection_broken(err),
        _ => Error::driver_operation_failed(err),
    }
}

impl Cancel for Interrupt {
    fn cancel(&self) {
        self.0.interrupt();
    }
}

impl std::fmt::Debug for Interrupt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Interrupt")
    }
}
