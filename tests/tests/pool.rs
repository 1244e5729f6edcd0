use tests::prelude::*;

use pretty_assertions::assert_eq;
use std::time::Duration;

#[derive(Debug, jdorm::Entity)]
struct Note {
    #[key]
    #[auto]
    id: i64,

    text: String,
}

fn note(text: &str) -> Note {
    Note {
        id: 0,
        text: text.to_string(),
    }
}

fn pooled(pool: PoolConfig) -> jdorm::db::Builder {
    let mut builder = models!(Note);
    builder.config(Config::new().pool(pool));
    builder
}

async fn warms_to_min_size(test: &mut DbTest) {
    let db = test
        .setup_db(pooled(PoolConfig::new().min_size(2).max_size(4)))
        .await;

    let status = db.pool().status();
    assert_eq!(status.size, 2);
    assert_eq!(status.available, 2);
    assert_eq!(status.max_size, 4);
    assert_eq!(test.faults().connects(), 2);
}

async fn connections_are_reused(test: &mut DbTest) {
    let db = test.setup_db(pooled(PoolConfig::new().max_size(4))).await;

    for n in 0..3 {
        let session = db.open().await.unwrap();
        session.save(note(&format!("note {n}"))).await.unwrap();
        session.commit().await.unwrap();
    }

    assert_eq!(test.faults().connects(), 1);
    assert_eq!(test.count_rows("notes").await, 3);
}

async fn blocked_acquire_waits_for_release(test: &mut DbTest) {
    let db = test
        .setup_db(pooled(
            PoolConfig::new()
                .max_size(1)
                .acquire_timeout(Some(Duration::from_secs(5))),
        ))
        .await;

    let first = db.open().await.unwrap();

    let waiter = tokio::spawn({
        let db = db.clone();
        async move { db.open().await }
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!waiter.is_finished());
    assert_eq!(db.pool().status().waiting, 1);

    first.save(note("first")).await.unwrap();
    first.commit().await.unwrap();

    let second = waiter.await.unwrap().unwrap();
    assert_eq!(second.status().unwrap(), Status::Open);
    assert_eq!(second.all::<Note>().await.unwrap().len(), 1);
    assert_eq!(test.faults().connects(), 1);
}

async fn acquire_times_out(test: &mut DbTest) {
    let db = test
        .setup_db(pooled(
            PoolConfig::new()
                .max_size(1)
                .acquire_timeout(Some(Duration::from_millis(50))),
        ))
        .await;

    let held = db.open().await.unwrap();

    let err = db.open().await.unwrap_err();
    assert!(err.is_pool_timeout(), "{err}");
    assert!(err.is_transient());
    assert!(err.to_string().starts_with("opening session"), "{err}");

    let status = db.pool().status();
    assert_eq!(status.size, 1);
    assert_eq!(status.available, 0);

    held.close().await.unwrap();
    let session = db.open().await.unwrap();
    session.close().await.unwrap();
}

async fn per_call_timeout(test: &mut DbTest) {
    let db = test
        .setup_db(pooled(PoolConfig::new().max_size(1).acquire_timeout(None)))
        .await;

    let _held = db.open().await.unwrap();

    let err = db
        .open_with_timeout(Duration::from_millis(20))
        .await
        .unwrap_err();
    assert!(err.is_pool_timeout(), "{err}");
}

async fn fail_fast_when_exhausted(test: &mut DbTest) {
    let db = test
        .setup_db(pooled(
            PoolConfig::new()
                .max_size(2)
                .acquire_mode(AcquireMode::FailFast),
        ))
        .await;

    let _a = db.open().await.unwrap();
    let _b = db.open().await.unwrap();

    let err = db.open().await.unwrap_err();
    assert!(err.is_pool_exhausted(), "{err}");
    assert!(err.is_transient());
}

async fn broken_connection_is_replaced(test: &mut DbTest) {
    let db = test
        .setup_db(pooled(PoolConfig::new().min_size(1).max_size(2)))
        .await;
    assert_eq!(test.faults().connects(), 1);

    let session = db.open().await.unwrap();
    session.save(note("lost")).await.unwrap();

    test.faults().break_next("INSERT");
    let err = session.commit().await.unwrap_err();

    assert!(err.is_connection_broken(), "{err}");
    assert!(err.is_transient());
    assert_eq!(session.status().unwrap(), Status::RolledBack);

    // The broken connection is never handed out again.
    let session = db.open().await.unwrap();
    session.save(note("kept")).await.unwrap();
    session.commit().await.unwrap();

    assert!(test.faults().connects() >= 2);

    let session = db.open().await.unwrap();
    let notes = session.all::<Note>().await.unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].read().text, "kept");
}

async fn shutdown_rejects_sessions(test: &mut DbTest) {
    let db = test.setup_db(pooled(PoolConfig::new().max_size(2))).await;

    let session = db.open().await.unwrap();
    session.close().await.unwrap();

    db.shutdown();
    assert!(db.pool().is_closed());

    let err = db.open().await.unwrap_err();
    assert!(err.is_connection_pool(), "{err}");
}

async fn max_size_is_validated(test: &mut DbTest) {
    let err = test
        .try_setup_db(pooled(PoolConfig::new().max_size(0)))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("max_size"), "{err}");
}

tests!(
    warms_to_min_size,
    connections_are_reused,
    blocked_acquire_waits_for_release,
    acquire_times_out,
    per_call_timeout,
    fail_fast_when_exhausted,
    broken_connection_is_replaced,
    shutdown_rejects_sessions,
    max_size_is_validated,
);
