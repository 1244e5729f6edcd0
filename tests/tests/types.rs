use tests::prelude::*;

use chrono::{DateTime, TimeZone, Utc};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use std::time::Duration;

#[derive(Debug, jdorm::Entity)]
struct Ledger {
    #[key]
    #[auto]
    id: i64,

    amount: Decimal,

    posted: DateTime<Utc>,

    cleared: bool,

    lines: i32,

    memo: Option<String>,

    receipt: Option<Vec<u8>>,
}

fn ledger(amount: Decimal, cleared: bool) -> Ledger {
    Ledger {
        id: 0,
        amount,
        posted: Utc.timestamp_millis_opt(1_700_000_000_123).unwrap(),
        cleared,
        lines: 3,
        memo: None,
        receipt: None,
    }
}

async fn column_types_survive_storage(test: &mut DbTest) {
    let db = test.setup_db(models!(Ledger)).await;

    let session = db.open().await.unwrap();
    let saved = session
        .save(Ledger {
            memo: Some("rent".to_string()),
            receipt: Some(vec![0, 159, 255]),
            ..ledger(Decimal::new(1234_5600, 4), true)
        })
        .await
        .unwrap();
    let blank = session.save(ledger(Decimal::ZERO, false)).await.unwrap();
    session.commit().await.unwrap();

    let session = db.open().await.unwrap();
    let found = assert_some!(session.find::<Ledger>(saved.read().id).await.unwrap());
    let found = found.read();

    assert_eq!(found.amount, Decimal::new(1234_5600, 4));
    assert_eq!(found.amount.to_string(), "1234.5600");
    assert_eq!(found.posted, Utc.timestamp_millis_opt(1_700_000_000_123).unwrap());
    assert!(found.cleared);
    assert_eq!(found.lines, 3);
    assert_eq!(found.memo.as_deref(), Some("rent"));
    assert_eq!(found.receipt.as_deref(), Some(&[0, 159, 255][..]));

    let other = assert_some!(session.find::<Ledger>(blank.read().id).await.unwrap());
    let other = other.read();
    assert!(!other.cleared);
    assert_none!(&other.memo);
    assert_none!(&other.receipt);
}

async fn filter_on_boolean(test: &mut DbTest) {
    let db = test.setup_db(models!(Ledger)).await;

    let session = db.open().await.unwrap();
    for (n, cleared) in [true, false, true].into_iter().enumerate() {
        session
            .save(ledger(Decimal::from(n as i64), cleared))
            .await
            .unwrap();
    }
    session.commit().await.unwrap();

    let session = db.open().await.unwrap();
    let cleared = session
        .query::<Ledger>(Criteria::new().eq("cleared", true).order_by("id"))
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();

    let amounts: Vec<_> = cleared.iter().map(|l| l.read().amount).collect();
    assert_eq!(amounts, [Decimal::from(0), Decimal::from(2)]);
}

async fn unconvertible_column_value(test: &mut DbTest) {
    let db = test.setup_db(models!(Ledger)).await;

    test.execute(
        r#"INSERT INTO "ledgers" ("amount", "posted", "cleared", "lines")
           VALUES ('lots', '2024-01-01T00:00:00Z', 1, 1)"#,
    )
    .await;

    let session = db.open().await.unwrap();
    let err = session.all::<Ledger>().await.unwrap_err();

    assert!(err.is_type_coercion(), "{err}");
    assert!(err.to_string().contains("ledgers.amount"), "{err}");
}

async fn concurrent_calls_are_rejected(test: &mut DbTest) {
    let db = test.setup_db(models!(Ledger)).await;
    let session = db.open().await.unwrap();

    test.faults().delay_next("SELECT", Duration::from_millis(100));

    let (found, status) = tokio::join!(session.find::<Ledger>(1), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        session.status()
    });

    assert_none!(found.unwrap());

    let err = status.unwrap_err();
    assert!(err.is_concurrent_session_access(), "{err}");

    // Once the first call finishes the session is usable again.
    assert_eq!(session.status().unwrap(), Status::Open);
}

tests!(
    column_types_survive_storage,
    filter_on_boolean,
    unconvertible_column_value,
    concurrent_calls_are_rejected,
);
