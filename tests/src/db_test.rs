use crate::{
    fault_driver::{FaultDriver, Faults},
    logging_driver::LoggingDriver,
    ExecLog, Setup,
};
use jdorm::{
    db::Builder,
    driver::{operation::QuerySql, Capability},
    stmt::ValueRecord,
    Db, Value,
};
use std::{future::Future, pin::Pin};

/// Per-test database handle.
///
/// Every database built through it logs driver operations and accepts
/// injected faults.
pub struct DbTest {
    setup: Box<dyn Setup>,
    log: ExecLog,
    faults: Faults,
}

impl DbTest {
    pub fn new(setup: Box<dyn Setup>) -> Self {
        crate::init_tracing();

        Self {
            setup,
            log: ExecLog::default(),
            faults: Faults::default(),
        }
    }

    /// Build a database and create its tables, returning any error.
    pub async fn try_setup_db(&mut self, mut builder: Builder) -> jdorm::Result<Db> {
        let logging = LoggingDriver::new(self.setup.driver());
        self.log = ExecLog::new(logging.ops_log_handle());

        let driver = FaultDriver::new(Box::new(logging), self.faults.clone());
        let db = builder.build(driver).await?;
        db.push_schema().await?;

        Ok(db)
    }

    /// Build a database and create its tables.
    pub async fn setup_db(&mut self, builder: Builder) -> Db {
        self.try_setup_db(builder).await.unwrap()
    }

    /// Operations executed by the most recently built database.
    pub fn log(&self) -> &ExecLog {
        &self.log
    }

    pub fn faults(&self) -> &Faults {
        &self.faults
    }

    pub fn capability(&self) -> &'static Capability {
        self.setup.capability()
    }

    /// Run raw SQL on a fresh connection, outside any session.
    pub async fn execute(&self, sql: &str) -> Vec<ValueRecord> {
        let mut connection = self.setup.driver().connect().await.unwrap();
        let returning = sql.trim_start().starts_with("SELECT");
        let response = connection
            .exec(
                QuerySql {
                    sql: sql.to_string(),
                    params: vec![],
                    returning,
                }
                .into(),
            )
            .await
            .unwrap();

        if returning {
            response.rows.into_values().unwrap()
        } else {
            vec![]
        }
    }

    /// Committed row count of `table`.
    pub async fn count_rows(&self, table: &str) -> u64 {
        let rows = self
            .execute(&format!("SELECT count(*) FROM \"{table}\""))
            .await;

        match rows[0].first() {
            Some(Value::I64(count)) => *count as u64,
            other => panic!("unexpected count; actual={other:?}"),
        }
    }
}

/// Run one test body against a fresh SQLite database on a current-thread runtime.
pub fn run<F>(test_fn: F)
where
    F: for<'a> FnOnce(&'a mut DbTest) -> Pin<Box<dyn Future<Output = ()> + 'a>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to create Tokio runtime");

    let mut test = DbTest::new(Box::new(crate::db::sqlite::SetupSqlite::new()));
    runtime.block_on(test_fn(&mut test));

    // Close pooled connections before the database files are removed.
    drop(runtime);
    drop(test);
}
