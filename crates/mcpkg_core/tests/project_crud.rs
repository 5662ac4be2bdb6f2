use mcpkg_core::{
    apply_migrations, bundled_scripts, NameErrorKind, NewResource, ProjectRepository,
    PromptRepository, RepoError, ResourceRepository, SqliteProjectRepository,
    SqlitePromptRepository, SqliteResourceRepository, Store,
};

fn migrated_store() -> Store {
    let mut store = Store::open_in_memory().unwrap();
    apply_migrations(&mut store, &bundled_scripts()).unwrap();
    store
}

#[test]
fn create_get_and_list_projects() {
    let store = migrated_store();
    let repo = SqliteProjectRepository::try_new(&store).unwrap();

    let alpha = repo.create_project("alpha").unwrap();
    let beta = repo.create_project("beta.v2").unwrap();

    assert!(alpha.id > 0);
    assert!(alpha.created_at > 0);
    assert_eq!(repo.get_project("alpha").unwrap(), Some(alpha.clone()));
    assert_eq!(repo.get_project_by_id(beta.id).unwrap(), Some(beta.clone()));
    assert_eq!(repo.get_project("gamma").unwrap(), None);

    let names: Vec<String> = repo
        .list_projects()
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, vec!["alpha".to_string(), "beta.v2".to_string()]);
}

#[test]
fn duplicate_project_is_rejected_with_message() {
    let store = migrated_store();
    let repo = SqliteProjectRepository::try_new(&store).unwrap();
    repo.create_project("p1").unwrap();

    let err = repo.create_project("p1").unwrap_err();
    assert!(matches!(err, RepoError::Duplicate { field: "name", .. }));
    assert_eq!(err.to_string(), "Project 'p1' already exists in workspace ':memory:'");
    assert_eq!(repo.list_projects().unwrap().len(), 1);
}

#[test]
fn invalid_project_names_never_reach_the_store() {
    let store = migrated_store();
    let repo = SqliteProjectRepository::try_new(&store).unwrap();

    let err = repo.create_project("my project").unwrap_err();
    match &err {
        RepoError::InvalidName(name_err) => {
            assert_eq!(name_err.kind, NameErrorKind::InvalidCharacters(vec![' ']));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("contains invalid characters"));

    assert!(matches!(
        repo.create_project(""),
        Err(RepoError::InvalidName(_))
    ));
    assert!(repo.list_projects().unwrap().is_empty());
}

#[test]
fn rename_keeps_identity_and_checks_target() {
    let store = migrated_store();
    let repo = SqliteProjectRepository::try_new(&store).unwrap();
    let original = repo.create_project("old").unwrap();
    repo.create_project("taken").unwrap();

    let renamed = repo.rename_project("old", "new").unwrap();
    assert_eq!(renamed.id, original.id);
    assert_eq!(renamed.created_at, original.created_at);
    assert_eq!(renamed.name, "new");
    assert_eq!(repo.get_project("old").unwrap(), None);

    assert!(matches!(
        repo.rename_project("new", "taken"),
        Err(RepoError::Duplicate { .. })
    ));
    assert!(matches!(
        repo.rename_project("ghost", "other"),
        Err(RepoError::NotFound { .. })
    ));
    assert!(matches!(
        repo.rename_project("new", "bad/name"),
        Err(RepoError::InvalidName(_))
    ));
}

#[test]
fn delete_project_cascades_to_prompts_and_resources() {
    let store = migrated_store();
    let projects = SqliteProjectRepository::try_new(&store).unwrap();
    let prompts = SqlitePromptRepository::try_new(&store).unwrap();
    let resources = SqliteResourceRepository::try_new(&store).unwrap();

    let project = projects.create_project("doomed").unwrap();
    prompts.create_prompt(&project, "a", "A", None).unwrap();
    prompts.create_prompt(&project, "b", "B", None).unwrap();
    resources
        .create_resource(&project, &NewResource::new("logo", "file:///logo.png", vec![1u8, 2]))
        .unwrap();

    projects.delete_project("doomed").unwrap();

    assert_eq!(count_rows(&store, "prompts", project.id), 0);
    assert_eq!(count_rows(&store, "resources", project.id), 0);
    assert_eq!(projects.get_project("doomed").unwrap(), None);
}

fn count_rows(store: &Store, table: &str, project_id: i64) -> i64 {
    store
        .connection()
        .unwrap()
        .query_row(
            &format!("SELECT COUNT(*) FROM {table} WHERE project_id = ?1;"),
            [project_id],
            |row| row.get(0),
        )
        .unwrap()
}

#[test]
fn delete_missing_project_reports_not_found() {
    let store = migrated_store();
    let repo = SqliteProjectRepository::try_new(&store).unwrap();

    let err = repo.delete_project("ghost").unwrap_err();
    assert!(matches!(err, RepoError::NotFound { .. }));
    assert_eq!(
        err.to_string(),
        "Project 'ghost' does not exist in workspace ':memory:'"
    );
}
