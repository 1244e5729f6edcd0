use tests::prelude::*;

use jdorm::stmt::BinaryOp;
use pretty_assertions::assert_eq;

#[derive(Debug, jdorm::Entity)]
struct Product {
    #[key]
    #[auto]
    id: i64,

    name: String,

    category: String,

    stock: i64,
}

async fn seed(db: &Db) {
    let session = db.open().await.unwrap();

    for (name, category, stock) in [
        ("anvil", "tools", 3),
        ("hammer", "tools", 10),
        ("nails", "hardware", 500),
        ("saw", "tools", 0),
        ("screws", "hardware", 250),
    ] {
        session
            .save(Product {
                id: 0,
                name: name.to_string(),
                category: category.to_string(),
                stock,
            })
            .await
            .unwrap();
    }

    session.commit().await.unwrap();
}

fn names(products: &[Instance<Product>]) -> Vec<String> {
    products
        .iter()
        .map(|product| product.read().name.clone())
        .collect()
}

async fn filter_by_equality(test: &mut DbTest) {
    let db = test.setup_db(models!(Product)).await;
    seed(&db).await;

    let session = db.open().await.unwrap();
    let tools = session
        .query::<Product>(Criteria::new().eq("category", "tools").order_by("name"))
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();

    assert_eq!(names(&tools), ["anvil", "hammer", "saw"]);

    let none = session
        .query::<Product>(
            Criteria::new()
                .eq("category", "tools")
                .eq("name", "nails"),
        )
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();

    assert!(none.is_empty());
}

async fn filter_by_value_set(test: &mut DbTest) {
    let db = test.setup_db(models!(Product)).await;
    seed(&db).await;

    let session = db.open().await.unwrap();
    let picked = session
        .query::<Product>(
            Criteria::new()
                .is_in("name", ["saw", "nails", "glue"])
                .order_by_desc("stock"),
        )
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();

    assert_eq!(names(&picked), ["nails", "saw"]);

    // An empty value set matches nothing.
    let empty = session
        .query::<Product>(Criteria::new().is_in("name", Vec::<String>::new()))
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();

    assert!(empty.is_empty());
}

async fn limit_and_offset(test: &mut DbTest) {
    let db = test.setup_db(models!(Product)).await;
    seed(&db).await;

    let session = db.open().await.unwrap();

    let page = |offset| {
        Criteria::all()
            .order_by("name")
            .limit(2)
            .offset(offset)
    };

    let first = session.query::<Product>(page(0)).await.unwrap().collect().await.unwrap();
    let second = session.query::<Product>(page(2)).await.unwrap().collect().await.unwrap();
    let last = session.query::<Product>(page(4)).await.unwrap().collect().await.unwrap();

    assert_eq!(names(&first), ["anvil", "hammer"]);
    assert_eq!(names(&second), ["nails", "saw"]);
    assert_eq!(names(&last), ["screws"]);

    let skipped = session
        .query::<Product>(Criteria::all().order_by("name").offset(3))
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();
    assert_eq!(names(&skipped), ["saw", "screws"]);
}

async fn first_returns_one(test: &mut DbTest) {
    let db = test.setup_db(models!(Product)).await;
    seed(&db).await;

    let session = db.open().await.unwrap();

    let top = assert_some!(session
        .first::<Product>(Criteria::new().eq("category", "hardware").order_by_desc("stock"))
        .await
        .unwrap());
    assert_eq!(top.read().name, "nails");

    assert_none!(session
        .first::<Product>(Criteria::new().eq("category", "garden"))
        .await
        .unwrap());
}

async fn rejected_criteria(test: &mut DbTest) {
    let db = test.setup_db(models!(Product)).await;
    let session = db.open().await.unwrap();

    let err = session.query::<Product>(Criteria::new()).await.unwrap_err();
    assert!(err.is_unsupported_criteria(), "{err}");

    let err = session
        .query::<Product>(Criteria::new().eq("colour", "red"))
        .await
        .unwrap_err();
    assert!(err.is_unsupported_criteria());
    assert!(err.to_string().contains("no field `colour`"), "{err}");

    let err = session
        .query::<Product>(Criteria::new().compare("stock", BinaryOp::Gt, 5))
        .await
        .unwrap_err();
    assert!(err.is_unsupported_criteria());

    let err = session
        .query::<Product>(Criteria::new().eq("name", jdorm::Value::Null))
        .await
        .unwrap_err();
    assert!(err.is_unsupported_criteria());

    // Rejected criteria never reach the database and leave the session open.
    assert_eq!(test.log().count_sql("SELECT"), 0);
    assert_eq!(session.status().unwrap(), Status::Open);
}

async fn cursor_hydrates_in_batches(test: &mut DbTest) {
    let mut builder = models!(Product);
    builder.config(Config::new().hydrate_batch_size(2));
    let db = test.setup_db(builder).await;
    seed(&db).await;

    let session = db.open().await.unwrap();
    let mut cursor = session
        .query::<Product>(Criteria::all().order_by("id"))
        .await
        .unwrap();

    assert_eq!(cursor.remaining(), 5);
    assert_eq!(session.managed().unwrap(), 0);

    let first = cursor.next().await.unwrap().unwrap();
    assert_eq!(first.read().name, "anvil");

    // One batch is hydrated at a time.
    assert_eq!(session.managed().unwrap(), 2);
    assert_eq!(cursor.remaining(), 4);

    let mut rest = vec![];
    while let Some(product) = cursor.next().await {
        rest.push(product.unwrap());
    }

    assert_eq!(names(&rest), ["hammer", "nails", "saw", "screws"]);
    assert_eq!(session.managed().unwrap(), 5);
    assert_none!(cursor.next().await);
}

async fn cursor_fails_after_session_ends(test: &mut DbTest) {
    let mut builder = models!(Product);
    builder.config(Config::new().hydrate_batch_size(1));
    let db = test.setup_db(builder).await;
    seed(&db).await;

    let session = db.open().await.unwrap();
    let mut cursor = session.query::<Product>(Criteria::all()).await.unwrap();

    assert!(cursor.next().await.unwrap().is_ok());
    session.rollback().await.unwrap();

    let err = cursor.next().await.unwrap().unwrap_err();
    assert!(err.is_session_closed(), "{err}");
    assert_none!(cursor.next().await);
}

async fn query_sees_unflushed_identity(test: &mut DbTest) {
    let db = test.setup_db(models!(Product)).await;
    seed(&db).await;

    let session = db.open().await.unwrap();
    let hammer = assert_some!(session
        .first::<Product>(Criteria::new().eq("name", "hammer"))
        .await
        .unwrap());

    // In-memory changes win over the row the query returns.
    hammer.write().stock = 11;

    let tools = session
        .query::<Product>(Criteria::new().eq("category", "tools").order_by("name"))
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();

    assert!(Instance::ptr_eq(&tools[1], &hammer));
    assert_eq!(tools[1].read().stock, 11);
}

async fn statements_are_cached_by_shape(test: &mut DbTest) {
    let db = test.setup_db(models!(Product)).await;
    seed(&db).await;

    let session = db.open().await.unwrap();
    let cache = db.statement_cache();
    let before = cache.len();

    for category in ["tools", "hardware", "garden"] {
        session
            .query::<Product>(Criteria::new().eq("category", category))
            .await
            .unwrap()
            .collect()
            .await
            .unwrap();
    }

    // Same shape, different values: one template.
    assert_eq!(cache.len(), before + 1);

    session
        .query::<Product>(Criteria::new().is_in("category", ["tools", "hardware"]))
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();

    assert_eq!(cache.len(), before + 2);
}

tests!(
    filter_by_equality,
    filter_by_value_set,
    limit_and_offset,
    first_returns_one,
    rejected_criteria,
    cursor_hydrates_in_batches,
    cursor_fails_after_session_ends,
    query_sees_unflushed_identity,
    statements_are_cached_by_shape,
);
