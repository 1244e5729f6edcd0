use tests::prelude::*;

use pretty_assertions::assert_eq;

#[derive(Debug, jdorm::Entity)]
struct User {
    #[key]
    #[auto]
    id: i64,

    name: String,

    #[has_many(eager)]
    posts: HasMany<Post>,

    #[has_one]
    profile: HasOne<Profile>,
}

#[derive(Debug, jdorm::Entity)]
struct Post {
    #[key]
    #[auto]
    id: i64,

    user_id: i64,

    title: String,

    #[belongs_to(key = user_id, references = id)]
    user: BelongsTo<User>,
}

#[derive(Debug, jdorm::Entity)]
struct Profile {
    #[key]
    #[auto]
    id: i64,

    user_id: i64,

    bio: String,

    #[belongs_to(key = user_id, references = id)]
    user: BelongsTo<User>,
}

#[derive(Debug, jdorm::Entity)]
struct Comment {
    #[key]
    #[auto]
    id: i64,

    author_id: Option<i64>,

    body: String,

    #[belongs_to(key = author_id, references = id)]
    author: BelongsTo<User>,
}

fn user(name: &str) -> User {
    User {
        id: 0,
        name: name.to_string(),
        posts: HasMany::default(),
        profile: HasOne::default(),
    }
}

fn post(user_id: i64, title: &str) -> Post {
    Post {
        id: 0,
        user_id,
        title: title.to_string(),
        user: BelongsTo::default(),
    }
}

/// Three users with two posts each; the last user has a profile. Returns
/// user ids in creation order.
async fn seed(db: &Db) -> Vec<i64> {
    let session = db.open().await.unwrap();

    let mut users = vec![];
    for name in ["alice", "bob", "carol"] {
        users.push(session.save(user(name)).await.unwrap());
    }
    session.flush().await.unwrap();

    let ids: Vec<_> = users.iter().map(|user| user.read().id).collect();

    for &id in &ids {
        for n in 1..=2 {
            session.save(post(id, &format!("post {n} by {id}"))).await.unwrap();
        }
    }

    session
        .save(Profile {
            id: 0,
            user_id: ids[2],
            bio: "writes things".to_string(),
            user: BelongsTo::default(),
        })
        .await
        .unwrap();

    session.commit().await.unwrap();
    ids
}

async fn eager_has_many_is_batched(test: &mut DbTest) {
    let db = test.setup_db(models!(User, Post, Profile)).await;
    let ids = seed(&db).await;

    let session = db.open().await.unwrap();
    test.log().clear();

    let users = session
        .query::<User>(Criteria::all().order_by("id"))
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();
    assert_eq!(users.len(), 3);

    // One query for the users and one for every user's posts.
    assert_eq!(test.log().selects_from("users"), 1);
    assert_eq!(test.log().selects_from("posts"), 1);

    for (user, id) in users.iter().zip(&ids) {
        let posts = assert_some!(user.read().posts.loaded());
        assert_eq!(posts.len(), 2);

        for post in &posts {
            assert_eq!(post.read().user_id, *id);
        }
    }

    assert_eq!(test.log().selects_from("posts"), 1);
}

async fn inverse_side_reuses_managed_instances(test: &mut DbTest) {
    let db = test.setup_db(models!(User, Post, Profile)).await;
    seed(&db).await;

    let session = db.open().await.unwrap();
    let users = session
        .query::<User>(Criteria::all().order_by("id"))
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();
    test.log().clear();

    let posts = users[0].read().posts.loaded().unwrap();
    let owner = posts[0].read().user.clone();
    assert!(!owner.is_loaded());

    let owner = assert_some!(owner.get().await.unwrap());
    assert!(Instance::ptr_eq(&owner, &users[0]));

    // The owner was already managed; no query was needed.
    assert!(test.log().is_empty());
}

async fn lazy_belongs_to_loads_once(test: &mut DbTest) {
    let db = test.setup_db(models!(User, Post, Profile)).await;
    let ids = seed(&db).await;

    let session = db.open().await.unwrap();
    let post = assert_some!(session
        .first::<Post>(Criteria::new().eq("user_id", ids[1]))
        .await
        .unwrap());

    let relation = post.read().user.clone();
    assert!(!relation.is_loaded());
    assert_none!(relation.loaded());

    test.log().clear();
    let owner = assert_some!(relation.get().await.unwrap());
    assert_eq!(owner.read().name, "bob");
    assert_eq!(test.log().selects_from("users"), 1);

    // Loading the user eagerly loaded its posts, including this one.
    let posts = owner.read().posts.loaded().unwrap();
    assert!(posts.iter().any(|p| Instance::ptr_eq(p, &post)));

    let again = assert_some!(relation.get().await.unwrap());
    assert!(Instance::ptr_eq(&owner, &again));
    assert_eq!(test.log().selects_from("users"), 1);
}

async fn lazy_has_one(test: &mut DbTest) {
    let db = test.setup_db(models!(User, Post, Profile)).await;
    let ids = seed(&db).await;

    let session = db.open().await.unwrap();

    let carol = assert_some!(session.find::<User>(ids[2]).await.unwrap());
    let profile = carol.read().profile.clone();
    let profile = assert_some!(profile.get().await.unwrap());
    assert_eq!(profile.read().bio, "writes things");

    let alice = assert_some!(session.find::<User>(ids[0]).await.unwrap());
    let profile = alice.read().profile.clone();
    assert_none!(profile.get().await.unwrap());
    assert!(profile.is_loaded());
}

async fn empty_collections_are_loaded(test: &mut DbTest) {
    let db = test.setup_db(models!(User, Post, Profile)).await;

    let session = db.open().await.unwrap();
    let saved = session.save(user("dave")).await.unwrap();
    session.commit().await.unwrap();
    let id = saved.read().id;

    let session = db.open().await.unwrap();
    let dave = assert_some!(session.find::<User>(id).await.unwrap());
    let posts = assert_some!(dave.read().posts.loaded());
    assert!(posts.is_empty());
}

async fn lazy_load_after_session_ends(test: &mut DbTest) {
    let db = test.setup_db(models!(User, Post, Profile)).await;
    let ids = seed(&db).await;

    let session = db.open().await.unwrap();
    let post = assert_some!(session
        .first::<Post>(Criteria::new().eq("user_id", ids[0]))
        .await
        .unwrap());
    session.commit().await.unwrap();

    let relation = post.read().user.clone();
    let err = relation.get().await.unwrap_err();
    assert!(err.is_session_closed(), "{err}");

    // Dropping the session behaves the same.
    let session = db.open().await.unwrap();
    let post = assert_some!(session
        .first::<Post>(Criteria::new().eq("user_id", ids[0]))
        .await
        .unwrap());
    drop(session);

    let relation = post.read().user.clone();
    assert!(relation.get().await.unwrap_err().is_session_closed());
}

async fn detached_relations_are_not_loaded(test: &mut DbTest) {
    let db = test.setup_db(models!(User, Post, Profile)).await;
    let ids = seed(&db).await;

    // Never managed by a session.
    let loose = post(ids[0], "draft");
    let err = loose.user.get().await.unwrap_err();
    assert!(err.is_relation_not_loaded(), "{err}");
    assert!(err.to_string().contains("User"), "{err}");

    // Generated keys are only known after the flush, so relations bind then.
    let session = db.open().await.unwrap();
    let staged = session.save(post(ids[0], "staged")).await.unwrap();
    let relation = staged.read().user.clone();
    assert!(relation.get().await.unwrap_err().is_relation_not_loaded());

    session.flush().await.unwrap();
    let owner = assert_some!(relation.get().await.unwrap());
    assert_eq!(owner.read().id, ids[0]);
}

async fn preassigned_relation(test: &mut DbTest) {
    let db = test.setup_db(models!(User, Post, Profile)).await;

    let session = db.open().await.unwrap();
    let erin = session.save(user("erin")).await.unwrap();
    session.flush().await.unwrap();
    let id = erin.read().id;

    let staged = session
        .save(Post {
            user: BelongsTo::new(Some(erin.clone())),
            ..post(id, "hello")
        })
        .await
        .unwrap();

    test.log().clear();
    let relation = staged.read().user.clone();
    assert!(relation.is_loaded());
    let owner = assert_some!(relation.get().await.unwrap());
    assert!(Instance::ptr_eq(&owner, &erin));
    assert!(test.log().is_empty());
}

async fn null_foreign_key(test: &mut DbTest) {
    let db = test.setup_db(models!(User, Post, Profile, Comment)).await;
    let ids = seed(&db).await;

    let session = db.open().await.unwrap();
    for author_id in [None, Some(ids[1])] {
        session
            .save(Comment {
                id: 0,
                author_id,
                body: "first!".to_string(),
                author: BelongsTo::default(),
            })
            .await
            .unwrap();
    }
    session.commit().await.unwrap();

    let session = db.open().await.unwrap();
    let comments = session
        .query::<Comment>(Criteria::all().order_by("id"))
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();

    // A NULL key resolves to no target without a query.
    let anonymous = comments[0].read().author.clone();
    assert!(anonymous.is_loaded());
    assert_none!(anonymous.get().await.unwrap());

    let signed = comments[1].read().author.clone();
    let author = assert_some!(signed.get().await.unwrap());
    assert_eq!(author.read().name, "bob");
}

async fn default_loading_policy(test: &mut DbTest) {
    #[derive(Debug, jdorm::Entity)]
    struct Team {
        #[key]
        name: String,

        #[has_many]
        players: HasMany<Player>,
    }

    #[derive(Debug, jdorm::Entity)]
    struct Player {
        #[key]
        name: String,

        team: String,

        #[belongs_to(key = team, references = name, lazy)]
        club: BelongsTo<Team>,
    }

    let mut builder = models!(Team, Player);
    builder.config(Config::new().default_loading(LoadingPolicy::Eager));
    let db = test.setup_db(builder).await;

    let team = db.describe::<Team>().unwrap();
    assert_eq!(team.relation("players").unwrap().loading, LoadingPolicy::Eager);

    // An explicit policy wins over the default.
    let player = db.describe::<Player>().unwrap();
    assert_eq!(player.relation("club").unwrap().loading, LoadingPolicy::Lazy);

    let session = db.open().await.unwrap();
    session
        .save(Team {
            name: "red".to_string(),
            players: HasMany::default(),
        })
        .await
        .unwrap();
    for name in ["ann", "ben"] {
        session
            .save(Player {
                name: name.to_string(),
                team: "red".to_string(),
                club: BelongsTo::default(),
            })
            .await
            .unwrap();
    }
    session.commit().await.unwrap();

    let session = db.open().await.unwrap();
    let red = assert_some!(session.find::<Team>("red").await.unwrap());
    let players = assert_some!(red.read().players.loaded());

    let mut names: Vec<_> = players.iter().map(|p| p.read().name.clone()).collect();
    names.sort();
    assert_eq!(names, ["ann", "ben"]);
}

async fn eager_collections_larger_than_batch(test: &mut DbTest) {
    #[derive(Debug, jdorm::Entity)]
    struct Author {
        #[key]
        name: String,

        #[has_many(eager)]
        books: HasMany<Book>,
    }

    #[derive(Debug, jdorm::Entity)]
    struct Book {
        #[key]
        title: String,

        author: String,

        #[belongs_to(key = author, references = name)]
        written_by: BelongsTo<Author>,

        #[has_many(eager)]
        chapters: HasMany<Chapter>,
    }

    #[derive(Debug, jdorm::Entity)]
    struct Chapter {
        #[key]
        #[auto]
        id: i64,

        book: String,

        #[belongs_to(key = book, references = title)]
        part_of: BelongsTo<Book>,
    }

    let mut builder = models!(Author, Book, Chapter);
    builder.config(Config::new().relation_batch_size(2));
    let db = test.setup_db(builder).await;

    let session = db.open().await.unwrap();
    for author in ["ann", "bea", "cy"] {
        session
            .save(Author {
                name: author.to_string(),
                books: HasMany::default(),
            })
            .await
            .unwrap();

        for n in 1..=3 {
            let title = format!("{author} {n}");
            session
                .save(Book {
                    title: title.clone(),
                    author: author.to_string(),
                    written_by: BelongsTo::default(),
                    chapters: HasMany::default(),
                })
                .await
                .unwrap();

            for _ in 0..2 {
                session
                    .save(Chapter {
                        id: 0,
                        book: title.clone(),
                        part_of: BelongsTo::default(),
                    })
                    .await
                    .unwrap();
            }
        }
    }
    session.commit().await.unwrap();

    let session = db.open().await.unwrap();
    test.log().clear();

    let authors = session
        .query::<Author>(Criteria::all().order_by("name"))
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();
    assert_eq!(authors.len(), 3);

    // Three author keys and nine book keys, at most two keys per query.
    assert_eq!(test.log().selects_from("authors"), 1);
    assert_eq!(test.log().selects_from("books"), 2);
    assert_eq!(test.log().selects_from("chapters"), 5);

    for author in &authors {
        let author = author.read();
        let books = assert_some!(author.books.loaded());

        let mut titles: Vec<_> = books.iter().map(|b| b.read().title.clone()).collect();
        titles.sort();
        assert_eq!(
            titles,
            (1..=3).map(|n| format!("{} {n}", author.name)).collect::<Vec<_>>()
        );

        for book in &books {
            let book = book.read();
            let chapters = assert_some!(book.chapters.loaded());
            assert_eq!(chapters.len(), 2);
            assert!(chapters.iter().all(|c| c.read().book == book.title));
        }
    }

    // Nothing left to load.
    assert_eq!(test.log().selects_from("chapters"), 5);
}

tests!(
    eager_has_many_is_batched,
    inverse_side_reuses_managed_instances,
    lazy_belongs_to_loads_once,
    lazy_has_one,
    empty_collections_are_loaded,
    lazy_load_after_session_ends,
    detached_relations_are_not_loaded,
    preassigned_relation,
    null_foreign_key,
    default_loading_policy,
    eager_collections_larger_than_batch,
);
