use notex_core::db::open_db_in_memory;
use notex_core::{
    encode_to_markup, AuthConfig, AuthService, EditorState, NoteDraft, NoteService,
    NoteServiceError, NoteUpdate, NoteValidationError, SqliteNoteRepository,
    SqliteSessionRepository, SqliteUserRepository, UserId,
};
use rusqlite::{params, Connection};
use uuid::Uuid;

fn register(conn: &Connection, email: &str) -> UserId {
    let users = SqliteUserRepository::try_new(conn).unwrap();
    let sessions = SqliteSessionRepository::try_new(conn).unwrap();
    let config = AuthConfig {
        bcrypt_cost: 4,
        ..AuthConfig::default()
    };
    let auth = AuthService::new(users, sessions, config);
    auth.register("Test User", email, "secret").unwrap().id
}

fn draft(title: &str, content: &str) -> NoteDraft {
    NoteDraft {
        title: title.to_string(),
        content: content.to_string(),
        attachments: Vec::new(),
    }
}

#[test]
fn create_and_get_preserves_storage_form_verbatim() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = register(&conn, "a@example.com");
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let mut service = NoteService::new(repo);

    let content = encode_to_markup("  Buy **milk**  \n\n==today==  ");
    let created = service
        .create_note(
            owner,
            NoteDraft {
                title: "Groceries".to_string(),
                content: content.clone(),
                attachments: vec![" list.txt ".to_string(), " ".to_string()],
            },
        )
        .unwrap();

    assert_eq!(created.user_id, owner);
    assert_eq!(created.content, content);
    assert_eq!(created.attachments, vec!["list.txt".to_string()]);

    let loaded = service.get_note(owner, created.id).unwrap();
    assert_eq!(loaded, created);
    assert_eq!(
        EditorState::open(&loaded).content(),
        "  Buy **milk**  \n\n==today==  "
    );
}

#[test]
fn create_requires_title_and_content() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = register(&conn, "a@example.com");
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let mut service = NoteService::new(repo);

    let err = service.create_note(owner, draft("  ", "body")).unwrap_err();
    assert!(matches!(
        err,
        NoteServiceError::InvalidInput(NoteValidationError::BlankTitle)
    ));
    let err = service.create_note(owner, draft("title", "")).unwrap_err();
    assert!(matches!(
        err,
        NoteServiceError::InvalidInput(NoteValidationError::BlankContent)
    ));
}

#[test]
fn update_replaces_only_non_blank_fields() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = register(&conn, "a@example.com");
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let mut service = NoteService::new(repo);
    let created = service.create_note(owner, draft("Title", "body")).unwrap();

    let updated = service
        .update_note(
            owner,
            created.id,
            NoteUpdate {
                title: Some("   ".to_string()),
                content: Some("<strong>new</strong> body".to_string()),
                attachments: Some(vec!["a.png".to_string(), "b.png".to_string()]),
            },
        )
        .unwrap();
    assert_eq!(updated.title, "Title");
    assert_eq!(updated.content, "<strong>new</strong> body");
    assert_eq!(updated.attachments, vec!["a.png".to_string(), "b.png".to_string()]);
    assert!(updated.updated_at >= created.updated_at);

    let untouched = service
        .update_note(owner, created.id, NoteUpdate::default())
        .unwrap();
    assert_eq!(untouched.attachments, updated.attachments);
}

#[test]
fn save_note_creates_then_updates() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = register(&conn, "a@example.com");
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let mut service = NoteService::new(repo);

    let created = service.save_note(owner, None, draft("One", "first")).unwrap();
    let saved = service
        .save_note(owner, Some(created.id), draft("One", "second"))
        .unwrap();
    assert_eq!(saved.id, created.id);
    assert_eq!(saved.content, "second");
    assert_eq!(service.list_notes(owner).unwrap().len(), 1);
}

#[test]
fn list_is_newest_first() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = register(&conn, "a@example.com");
    let (first_id, second_id) = {
        let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
        let mut service = NoteService::new(repo);
        let first = service.create_note(owner, draft("first", "x")).unwrap();
        let second = service.create_note(owner, draft("second", "y")).unwrap();
        (first.id, second.id)
    };

    conn.execute(
        "UPDATE notes SET updated_at = 2000, created_at = 0 WHERE uuid = ?1;",
        params![first_id.to_string()],
    )
    .unwrap();
    conn.execute(
        "UPDATE notes SET updated_at = 1000, created_at = 0 WHERE uuid = ?1;",
        params![second_id.to_string()],
    )
    .unwrap();

    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let service = NoteService::new(repo);
    let listed = service.list_notes(owner).unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, first_id);
    assert_eq!(listed[1].id, second_id);
}

#[test]
fn back_to_back_writes_list_newest_first() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = register(&conn, "a@example.com");
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let mut service = NoteService::new(repo);

    for round in 0..20 {
        let older = service.create_note(owner, draft("older", "x")).unwrap();
        let newer = service.create_note(owner, draft("newer", "y")).unwrap();
        assert!(newer.updated_at > older.updated_at);

        let listed = service.list_notes(owner).unwrap();
        assert_eq!(listed[0].id, newer.id, "round {round}");
        assert_eq!(listed[1].id, older.id, "round {round}");
    }
}

#[test]
fn update_moves_note_to_front() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = register(&conn, "a@example.com");
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let mut service = NoteService::new(repo);

    let first = service.create_note(owner, draft("first", "x")).unwrap();
    let second = service.create_note(owner, draft("second", "y")).unwrap();
    let touched = service
        .update_note(
            owner,
            first.id,
            NoteUpdate {
                content: Some("x2".to_string()),
                ..NoteUpdate::default()
            },
        )
        .unwrap();
    assert!(touched.updated_at > second.updated_at);

    let listed = service.list_notes(owner).unwrap();
    assert_eq!(listed[0].id, first.id);
    assert_eq!(listed[1].id, second.id);
}

#[test]
fn timestamps_are_epoch_milliseconds() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = register(&conn, "a@example.com");
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let mut service = NoteService::new(repo);

    let before = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as i64;
    let note = service.create_note(owner, draft("t", "c")).unwrap();
    assert!((note.created_at - before).abs() < 60_000);
    assert_eq!(note.created_at, note.updated_at);
}

#[test]
fn notes_are_isolated_per_user() {
    let mut conn = open_db_in_memory().unwrap();
    let alice = register(&conn, "alice@example.com");
    let bob = register(&conn, "bob@example.com");
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let mut service = NoteService::new(repo);

    let private = service.create_note(alice, draft("secret", "mine")).unwrap();

    assert!(service.list_notes(bob).unwrap().is_empty());
    assert!(matches!(
        service.get_note(bob, private.id).unwrap_err(),
        NoteServiceError::NoteNotFound(id) if id == private.id
    ));
    assert!(matches!(
        service
            .update_note(bob, private.id, NoteUpdate::default())
            .unwrap_err(),
        NoteServiceError::NoteNotFound(_)
    ));
    assert!(matches!(
        service.delete_note(bob, private.id).unwrap_err(),
        NoteServiceError::NoteNotFound(_)
    ));
    assert_eq!(service.list_notes(alice).unwrap().len(), 1);
}

#[test]
fn delete_removes_note_and_attachments() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = register(&conn, "a@example.com");
    let note_id = {
        let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
        let mut service = NoteService::new(repo);
        let created = service
            .create_note(
                owner,
                NoteDraft {
                    title: "t".to_string(),
                    content: "c".to_string(),
                    attachments: vec!["x.pdf".to_string()],
                },
            )
            .unwrap();
        service.delete_note(owner, created.id).unwrap();
        assert!(matches!(
            service.delete_note(owner, created.id).unwrap_err(),
            NoteServiceError::NoteNotFound(_)
        ));
        created.id
    };

    let remaining: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM note_attachments WHERE note_uuid = ?1;",
            [note_id.to_string()],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(remaining, 0);
}

#[test]
fn search_matches_title_or_visible_content() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = register(&conn, "a@example.com");
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let mut service = NoteService::new(repo);
    service.create_note(owner, draft("Groceries", "milk")).unwrap();
    service
        .create_note(owner, draft("Work", "ship <mark>Release</mark>"))
        .unwrap();

    let hits = service.search_notes(owner, "release").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "Work");
    assert_eq!(service.search_notes(owner, "GROC").unwrap().len(), 1);
    assert_eq!(service.search_notes(owner, "mark").unwrap().len(), 0);
    assert_eq!(service.search_notes(owner, "").unwrap().len(), 2);
}

#[test]
fn unknown_note_id_is_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = register(&conn, "a@example.com");
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let service = NoteService::new(repo);

    let missing = Uuid::new_v4();
    assert!(matches!(
        service.get_note(owner, missing).unwrap_err(),
        NoteServiceError::NoteNotFound(id) if id == missing
    ));
}
