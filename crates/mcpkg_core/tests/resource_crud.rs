use mcpkg_core::{
    apply_migrations, bundled_scripts, NewResource, Project, ProjectRepository, RepoError,
    ResourcePatch, ResourceRepository, SqliteProjectRepository, SqliteResourceRepository, Store,
};

fn migrated_store() -> Store {
    let mut store = Store::open_in_memory().unwrap();
    apply_migrations(&mut store, &bundled_scripts()).unwrap();
    store
}

fn project(store: &Store, name: &str) -> Project {
    SqliteProjectRepository::try_new(store)
        .unwrap()
        .create_project(name)
        .unwrap()
}

#[test]
fn binary_content_round_trips_unchanged() {
    let store = migrated_store();
    let p1 = project(&store, "p1");
    let repo = SqliteResourceRepository::try_new(&store).unwrap();
    let bytes = vec![0u8, 159, 146, 150, 255, 0, 10];

    let created = repo
        .create_resource(
            &p1,
            &NewResource::new("logo", "file:///logo.bin", bytes.clone())
                .mime_type("application/octet-stream"),
        )
        .unwrap();

    assert_eq!(created.content, bytes);
    assert_eq!(created.mime_type.as_deref(), Some("application/octet-stream"));
    assert_eq!(created.description, None);
    assert_eq!(repo.get_resource(&p1, "logo").unwrap(), Some(created.clone()));
    assert_eq!(
        repo.get_resource_by_uri(&p1, "file:///logo.bin").unwrap(),
        Some(created)
    );
}

#[test]
fn name_and_uri_are_each_unique_within_project() {
    let store = migrated_store();
    let p1 = project(&store, "p1");
    let p2 = project(&store, "p2");
    let repo = SqliteResourceRepository::try_new(&store).unwrap();
    repo.create_resource(&p1, &NewResource::new("readme", "docs://readme", "hi"))
        .unwrap();

    let same_name = repo
        .create_resource(&p1, &NewResource::new("readme", "docs://other", "x"))
        .unwrap_err();
    assert!(matches!(same_name, RepoError::Duplicate { field: "name", .. }));

    let same_uri = repo
        .create_resource(&p1, &NewResource::new("other", "docs://readme", "x"))
        .unwrap_err();
    assert!(matches!(same_uri, RepoError::Duplicate { field: "uri", .. }));
    assert_eq!(
        same_uri.to_string(),
        "Resource with uri 'docs://readme' already exists in project 'p1' in workspace ':memory:'"
    );

    repo.create_resource(&p2, &NewResource::new("readme", "docs://readme", "p2"))
        .unwrap();
    assert_eq!(repo.list_resources(&p1).unwrap().len(), 1);
}

#[test]
fn update_changes_content_and_mime_type_only() {
    let store = migrated_store();
    let p1 = project(&store, "p1");
    let repo = SqliteResourceRepository::try_new(&store).unwrap();
    let created = repo
        .create_resource(
            &p1,
            &NewResource::new("notes", "docs://notes", "v1")
                .mime_type("text/plain")
                .description("team notes"),
        )
        .unwrap();

    let updated = repo
        .update_resource(
            &p1,
            "notes",
            &ResourcePatch::default()
                .content("v2")
                .mime_type(Some("text/markdown".to_string())),
        )
        .unwrap();

    assert_eq!(updated.content, b"v2".to_vec());
    assert_eq!(updated.mime_type.as_deref(), Some("text/markdown"));
    assert_eq!(updated.description.as_deref(), Some("team notes"));
    assert_eq!(updated.uri, created.uri);
    assert!(updated.updated_at > created.updated_at);
}

#[test]
fn missing_resource_operations_report_not_found() {
    let store = migrated_store();
    let p1 = project(&store, "p1");
    let repo = SqliteResourceRepository::try_new(&store).unwrap();

    assert_eq!(repo.get_resource(&p1, "ghost").unwrap(), None);
    assert_eq!(repo.get_resource_by_uri(&p1, "docs://ghost").unwrap(), None);
    assert!(matches!(
        repo.update_resource(&p1, "ghost", &ResourcePatch::default().content("x")),
        Err(RepoError::NotFound { .. })
    ));
    assert!(matches!(
        repo.delete_resource(&p1, "ghost"),
        Err(RepoError::NotFound { .. })
    ));
}

#[test]
fn delete_removes_only_the_named_resource() {
    let store = migrated_store();
    let p1 = project(&store, "p1");
    let repo = SqliteResourceRepository::try_new(&store).unwrap();
    repo.create_resource(&p1, &NewResource::new("a", "docs://a", "a"))
        .unwrap();
    repo.create_resource(&p1, &NewResource::new("b", "docs://b", "b"))
        .unwrap();

    repo.delete_resource(&p1, "a").unwrap();

    let names: Vec<String> = repo
        .list_resources(&p1)
        .unwrap()
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert_eq!(names, vec!["b"]);
}

#[test]
fn invalid_resource_name_is_rejected() {
    let store = migrated_store();
    let p1 = project(&store, "p1");
    let repo = SqliteResourceRepository::try_new(&store).unwrap();

    assert!(matches!(
        repo.create_resource(&p1, &NewResource::new("a b", "docs://a", "a")),
        Err(RepoError::InvalidName(_))
    ));
}

#[test]
fn create_under_deleted_project_reports_missing_project() {
    let store = migrated_store();
    let stale = project(&store, "gone");
    SqliteProjectRepository::try_new(&store)
        .unwrap()
        .delete_project("gone")
        .unwrap();
    let repo = SqliteResourceRepository::try_new(&store).unwrap();

    let err = repo
        .create_resource(&stale, &NewResource::new("a", "docs://a", "a"))
        .unwrap_err();

    assert!(matches!(
        err,
        RepoError::NotFound {
            entity: mcpkg_core::EntityKind::Project,
            ..
        }
    ));
}
