use tests::prelude::*;

use jdorm::{
    schema::{FieldDecl, Mapping, RelationKind},
    stmt::Type,
};
use pretty_assertions::assert_eq;

async fn describe_derived_mapping(test: &mut DbTest) {
    #[derive(Debug, jdorm::Entity)]
    struct BlogPost {
        #[key]
        #[auto]
        id: i64,

        #[column("headline")]
        title: String,

        summary: Option<String>,
    }

    let db = test.setup_db(models!(BlogPost)).await;
    let descriptor = db.describe::<BlogPost>().unwrap();

    assert_eq!(descriptor.name, "BlogPost");
    assert_eq!(descriptor.table, "blog_posts");
    assert_eq!(descriptor.primary_key, vec![0]);

    let columns: Vec<_> = descriptor
        .fields
        .iter()
        .map(|field| (field.name.as_str(), field.column.as_str(), field.ty, field.nullable))
        .collect();

    assert_eq!(
        columns,
        vec![
            ("id", "id", Type::Integer, false),
            ("title", "headline", Type::String, false),
            ("summary", "summary", Type::String, true),
        ]
    );

    assert!(descriptor.fields[0].generated);
    assert!(descriptor.has_generated_key());
}

async fn explicit_table_name(test: &mut DbTest) {
    #[derive(Debug, jdorm::Entity)]
    #[table = "people"]
    struct Person {
        #[key]
        name: String,
    }

    let db = test.setup_db(models!(Person)).await;
    assert_eq!(db.describe::<Person>().unwrap().table, "people");

    let session = db.open().await.unwrap();
    session
        .save(Person {
            name: "Ada".to_string(),
        })
        .await
        .unwrap();
    session.commit().await.unwrap();

    assert_eq!(test.count_rows("people").await, 1);
}

async fn register_is_idempotent(test: &mut DbTest) {
    #[derive(Debug, jdorm::Entity)]
    struct Tag {
        #[key]
        label: String,
    }

    let db = test.setup_db(models!(Tag)).await;

    let first = db.describe::<Tag>().unwrap();
    let again = db.register::<Tag>().unwrap();

    assert_eq!(*first, *again);
    assert_eq!(db.registry().descriptors().len(), 1);
}

async fn conflicting_mapping_is_rejected(test: &mut DbTest) {
    #[derive(Debug, jdorm::Entity)]
    struct Tag {
        #[key]
        label: String,
    }

    let db = test.setup_db(models!(Tag)).await;

    let conflicting = Mapping::new("Tag")
        .table("labels")
        .field(FieldDecl::new("label", Type::String).primary_key());

    let err = db.registry().register_mapping::<Tag>(conflicting).unwrap_err();
    assert!(err.is_mapping_conflict(), "{err}");

    // The original registration is untouched.
    assert_eq!(db.describe::<Tag>().unwrap().table, "tags");
}

async fn mapping_name_must_match_type(test: &mut DbTest) {
    #[derive(Debug, jdorm::Entity)]
    struct Tag {
        #[key]
        label: String,
    }

    let db = test.setup_db(models!()).await;

    let renamed = Mapping::new("Label").field(FieldDecl::new("label", Type::String).primary_key());
    let err = db.registry().register_mapping::<Tag>(renamed).unwrap_err();

    assert!(err.is_mapping(), "{err}");
    assert!(db.describe::<Tag>().unwrap_err().is_unknown_type());
}

async fn invalid_mappings(test: &mut DbTest) {
    #[derive(Debug, jdorm::Entity)]
    struct Tag {
        #[key]
        label: String,
    }

    let db = test.setup_db(models!()).await;
    let registry = db.registry();

    let no_key = Mapping::new("Tag").field(FieldDecl::new("label", Type::String));
    let err = registry.register_mapping::<Tag>(no_key).unwrap_err();
    assert!(err.is_mapping());
    assert!(err.to_string().contains("no primary key"), "{err}");

    let duplicate_column = Mapping::new("Tag")
        .field(FieldDecl::new("label", Type::String).primary_key())
        .field(FieldDecl::new("other", Type::String).column("label"));
    let err = registry.register_mapping::<Tag>(duplicate_column).unwrap_err();
    assert!(err.to_string().contains("duplicate column `label`"), "{err}");

    let generated_string = Mapping::new("Tag")
        .field(FieldDecl::new("label", Type::String).primary_key().generated());
    let err = registry.register_mapping::<Tag>(generated_string).unwrap_err();
    assert!(err.is_mapping());

    assert!(registry.descriptors().is_empty());
}

async fn explicit_mapping_must_match_layout(test: &mut DbTest) {
    #[derive(Debug, jdorm::Entity)]
    struct Item {
        #[key]
        id: i64,

        label: String,

        note: Option<String>,
    }

    let db = test.setup_db(models!()).await;
    let registry = db.registry();

    let reordered = Mapping::new("Item")
        .field(FieldDecl::new("id", Type::Integer).primary_key())
        .field(FieldDecl::new("note", Type::String).nullable())
        .field(FieldDecl::new("label", Type::String));
    let err = registry.register_mapping::<Item>(reordered).unwrap_err();
    assert!(err.is_mapping(), "{err}");
    assert!(
        err.to_string().contains("field 1 is declared as `note: string?`"),
        "{err}"
    );

    let retyped = Mapping::new("Item")
        .field(FieldDecl::new("id", Type::Integer).primary_key())
        .field(FieldDecl::new("label", Type::Integer))
        .field(FieldDecl::new("note", Type::String).nullable());
    assert!(registry.register_mapping::<Item>(retyped).unwrap_err().is_mapping());

    let not_nullable = Mapping::new("Item")
        .field(FieldDecl::new("id", Type::Integer).primary_key())
        .field(FieldDecl::new("label", Type::String))
        .field(FieldDecl::new("note", Type::String));
    assert!(registry.register_mapping::<Item>(not_nullable).unwrap_err().is_mapping());

    let missing_field = Mapping::new("Item")
        .field(FieldDecl::new("id", Type::Integer).primary_key())
        .field(FieldDecl::new("label", Type::String));
    assert!(registry.register_mapping::<Item>(missing_field).unwrap_err().is_mapping());

    assert!(registry.descriptors().is_empty());
}

async fn explicit_mapping_renames_storage(test: &mut DbTest) {
    #[derive(Debug, jdorm::Entity)]
    struct Item {
        #[key]
        id: i64,

        label: String,

        note: Option<String>,
    }

    let db = test.setup_db(models!()).await;

    let renamed = Mapping::new("Item")
        .table("catalog")
        .field(FieldDecl::new("id", Type::Integer).primary_key())
        .field(FieldDecl::new("label", Type::String).column("title"))
        .field(FieldDecl::new("note", Type::String).nullable().column("remark"));
    db.registry().register_mapping::<Item>(renamed).unwrap();
    db.push_schema().await.unwrap();

    let session = db.open().await.unwrap();
    session
        .save(Item {
            id: 1,
            label: "L".to_string(),
            note: Some("N".to_string()),
        })
        .await
        .unwrap();
    session.commit().await.unwrap();

    let rows = test
        .execute(r#"SELECT "id", "title", "remark" FROM "catalog""#)
        .await;
    assert_eq!(
        rows[0].to_vec(),
        vec![
            jdorm::Value::I64(1),
            jdorm::Value::from("L"),
            jdorm::Value::from("N"),
        ]
    );
}

async fn unknown_type_is_reported(test: &mut DbTest) {
    #[derive(Debug, jdorm::Entity)]
    struct Registered {
        #[key]
        id: i64,
    }

    #[derive(Debug, jdorm::Entity)]
    struct Unregistered {
        #[key]
        id: i64,
    }

    let db = test.setup_db(models!(Registered)).await;

    let err = db.describe::<Unregistered>().unwrap_err();
    assert!(err.is_unknown_type());
    assert!(err.to_string().contains("Unregistered"), "{err}");

    let session = db.open().await.unwrap();
    let err = session.find::<Unregistered>(1).await.unwrap_err();
    assert!(err.is_unknown_type());

    // A failed lookup does not end the session.
    assert_eq!(session.status().unwrap(), Status::Open);
    assert_none!(session.find::<Registered>(1).await.unwrap());
}

async fn relations_resolve_across_registrations(test: &mut DbTest) {
    #[derive(Debug, jdorm::Entity)]
    struct Author {
        #[key]
        #[auto]
        id: i64,

        #[has_many]
        books: HasMany<Book>,
    }

    #[derive(Debug, jdorm::Entity)]
    struct Book {
        #[key]
        #[auto]
        id: i64,

        author_id: i64,

        #[belongs_to(key = author_id, references = id)]
        author: BelongsTo<Author>,
    }

    // Only the declaring side is registered; the target is still missing.
    let db = test.setup_db(models!(Book)).await;

    let err = db.registry().verify().unwrap_err();
    assert!(err.is_unresolved_relationship(), "{err}");

    db.register::<Author>().unwrap();
    db.registry().verify().unwrap();

    let books = db.describe::<Book>().unwrap();
    let relation = books.relation("author").unwrap();
    assert_eq!(relation.kind, RelationKind::ManyToOne);
    assert_eq!(relation.target, "Author");
    assert_eq!(relation.loading, LoadingPolicy::Lazy);

    let authors = db.describe::<Author>().unwrap();
    assert_eq!(authors.relation("books").unwrap().kind, RelationKind::OneToMany);
}

async fn ambiguous_inverse_requires_pair(test: &mut DbTest) {
    #[derive(Debug, jdorm::Entity)]
    struct Person {
        #[key]
        #[auto]
        id: i64,

        #[has_many]
        messages: HasMany<Message>,
    }

    #[derive(Debug, jdorm::Entity)]
    struct Message {
        #[key]
        #[auto]
        id: i64,

        sender_id: i64,
        recipient_id: i64,

        #[belongs_to(key = sender_id, references = id)]
        sender: BelongsTo<Person>,

        #[belongs_to(key = recipient_id, references = id)]
        recipient: BelongsTo<Person>,
    }

    let db = test.setup_db(models!(Person, Message)).await;

    let err = db.registry().verify().unwrap_err();
    assert!(err.is_mapping());
    assert!(err.to_string().contains("ambiguous"), "{err}");
}

async fn paired_inverse_resolves(test: &mut DbTest) {
    #[derive(Debug, jdorm::Entity)]
    struct Person {
        #[key]
        #[auto]
        id: i64,

        #[has_many(pair = sender)]
        sent: HasMany<Message>,

        #[has_many(pair = recipient)]
        received: HasMany<Message>,
    }

    #[derive(Debug, jdorm::Entity)]
    struct Message {
        #[key]
        #[auto]
        id: i64,

        sender_id: i64,
        recipient_id: i64,

        #[belongs_to(key = sender_id, references = id)]
        sender: BelongsTo<Person>,

        #[belongs_to(key = recipient_id, references = id)]
        recipient: BelongsTo<Person>,
    }

    let db = test.setup_db(models!(Person, Message)).await;
    db.registry().verify().unwrap();

    let session = db.open().await.unwrap();
    let person = || Person {
        id: 0,
        sent: Default::default(),
        received: Default::default(),
    };
    let alice = session.save(person()).await.unwrap();
    let bob = session.save(person()).await.unwrap();
    session.flush().await.unwrap();

    let (alice_id, bob_id) = (alice.read().id, bob.read().id);
    session
        .save(Message {
            id: 0,
            sender_id: alice_id,
            recipient_id: bob_id,
            sender: Default::default(),
            recipient: Default::default(),
        })
        .await
        .unwrap();
    session.commit().await.unwrap();

    let session = db.open().await.unwrap();
    let alice = assert_some!(session.find::<Person>(alice_id).await.unwrap());
    let bob = assert_some!(session.find::<Person>(bob_id).await.unwrap());

    let alice_sent = alice.read().sent.clone();
    let alice_received = alice.read().received.clone();
    let bob_received = bob.read().received.clone();

    assert_eq!(alice_sent.get().await.unwrap().len(), 1);
    assert!(alice_received.get().await.unwrap().is_empty());
    assert_eq!(bob_received.get().await.unwrap().len(), 1);
}

async fn schema_is_pushed_for_every_entity(test: &mut DbTest) {
    #[derive(Debug, jdorm::Entity)]
    struct Widget {
        #[key]
        id: i64,
    }

    #[derive(Debug, jdorm::Entity)]
    struct Gadget {
        #[key]
        id: i64,
    }

    let db = test.setup_db(models!(Widget, Gadget)).await;

    // Creating tables twice is harmless.
    db.push_schema().await.unwrap();

    assert_eq!(test.count_rows("widgets").await, 0);
    assert_eq!(test.count_rows("gadgets").await, 0);

    let names: Vec<_> = db
        .registry()
        .descriptors()
        .iter()
        .map(|descriptor| descriptor.name.clone())
        .collect();
    assert_eq!(names, ["Widget", "Gadget"]);
}

tests!(
    describe_derived_mapping,
    explicit_table_name,
    register_is_idempotent,
    conflicting_mapping_is_rejected,
    mapping_name_must_match_type,
    invalid_mappings,
    explicit_mapping_must_match_layout,
    explicit_mapping_renames_storage,
    unknown_type_is_reported,
    relations_resolve_across_registrations,
    ambiguous_inverse_requires_pair,
    paired_inverse_resolves,
    schema_is_pushed_for_every_entity,
);
