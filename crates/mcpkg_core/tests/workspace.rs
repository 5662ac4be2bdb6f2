use mcpkg_core::{
    bundled_scripts, current_version, latest_version, PromptPatch, ProjectRepository,
    PromptRepository, RepoError, SqliteProjectRepository, SqlitePromptRepository, WorkspaceError,
    WorkspaceLocator, DEFAULT_WORKSPACE,
};

#[test]
fn create_list_and_delete_workspaces() {
    let dir = tempfile::tempdir().unwrap();
    let locator = WorkspaceLocator::new(dir.path().join("data"));

    assert!(locator.list_workspaces().unwrap().is_empty());
    locator
        .create_workspace("zeta", &bundled_scripts())
        .unwrap()
        .close()
        .unwrap();
    locator
        .create_workspace("alpha", &bundled_scripts())
        .unwrap()
        .close()
        .unwrap();

    assert_eq!(locator.list_workspaces().unwrap(), vec!["alpha", "zeta"]);
    assert!(locator.workspace_store_path("alpha").is_file());

    locator.delete_workspace("alpha").unwrap();
    assert_eq!(locator.list_workspaces().unwrap(), vec!["zeta"]);
    assert!(!locator.workspace_exists("alpha"));
}

#[test]
fn create_rejects_existing_and_invalid_names() {
    let dir = tempfile::tempdir().unwrap();
    let locator = WorkspaceLocator::new(dir.path());
    locator.create_workspace("w1", &bundled_scripts()).unwrap();

    let err = locator.create_workspace("w1", &bundled_scripts()).unwrap_err();
    assert!(matches!(err, WorkspaceError::AlreadyExists(_)));
    assert_eq!(err.to_string(), "Workspace 'w1' already exists");

    let err = locator
        .create_workspace("bad name", &bundled_scripts())
        .unwrap_err();
    assert!(matches!(err, WorkspaceError::InvalidName(_)));
    assert!(!locator.workspace_exists("bad name"));
}

#[test]
fn open_and_delete_missing_workspace_report_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let locator = WorkspaceLocator::new(dir.path());

    let err = locator.open_workspace("ghost", &bundled_scripts()).unwrap_err();
    assert!(matches!(err, WorkspaceError::NotFound(_)));
    assert_eq!(err.to_string(), "Workspace 'ghost' does not exist");
    assert!(!locator.workspace_exists("ghost"));

    assert!(matches!(
        locator.delete_workspace("ghost"),
        Err(WorkspaceError::NotFound(_))
    ));
}

#[test]
fn ensure_default_creates_once() {
    let dir = tempfile::tempdir().unwrap();
    let locator = WorkspaceLocator::new(dir.path());

    assert!(locator.ensure_default_workspace(&bundled_scripts()).unwrap());
    assert!(!locator.ensure_default_workspace(&bundled_scripts()).unwrap());
    assert_eq!(locator.list_workspaces().unwrap(), vec![DEFAULT_WORKSPACE]);
}

#[test]
fn workspaces_are_isolated_from_each_other() {
    let dir = tempfile::tempdir().unwrap();
    let locator = WorkspaceLocator::new(dir.path());
    let a = locator.create_workspace("a", &bundled_scripts()).unwrap();
    let b = locator.create_workspace("b", &bundled_scripts()).unwrap();

    let a_projects = SqliteProjectRepository::try_new(&a).unwrap();
    let b_projects = SqliteProjectRepository::try_new(&b).unwrap();
    let a_shared = a_projects.create_project("shared").unwrap();
    let b_shared = b_projects.create_project("shared").unwrap();

    let a_prompts = SqlitePromptRepository::try_new(&a).unwrap();
    a_prompts
        .create_prompt(&a_shared, "only-in-a", "A", None)
        .unwrap();

    let b_prompts = SqlitePromptRepository::try_new(&b).unwrap();
    assert!(b_prompts.list_prompts(&b_shared).unwrap().is_empty());

    b_projects.delete_project("shared").unwrap();
    assert!(a_projects.get_project("shared").unwrap().is_some());
    assert_eq!(a_prompts.list_prompts(&a_shared).unwrap().len(), 1);
}

#[test]
fn end_to_end_prompt_lifecycle_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let locator = WorkspaceLocator::new(dir.path());

    let mut store = locator.create_workspace("w1", &bundled_scripts()).unwrap();
    {
        let projects = SqliteProjectRepository::try_new(&store).unwrap();
        let prompts = SqlitePromptRepository::try_new(&store).unwrap();
        let p1 = projects.create_project("p1").unwrap();
        prompts
            .create_prompt(&p1, "greet", "Hello", Some("first"))
            .unwrap();
        prompts
            .update_prompt(&p1, "greet", &PromptPatch::default().content("Hello, world"))
            .unwrap();
    }
    store.close().unwrap();

    let store = locator.open_workspace("w1", &bundled_scripts()).unwrap();
    assert_eq!(
        current_version(store.connection().unwrap()).unwrap(),
        latest_version(&bundled_scripts())
    );
    let projects = SqliteProjectRepository::try_new(&store).unwrap();
    let prompts = SqlitePromptRepository::try_new(&store).unwrap();
    let p1 = projects.get_project("p1").unwrap().unwrap();
    let greet = prompts.get_prompt(&p1, "greet").unwrap().unwrap();
    assert_eq!(greet.content, "Hello, world");
    assert_eq!(greet.description.as_deref(), Some("first"));

    let err = prompts.create_prompt(&p1, "greet", "dup", None).unwrap_err();
    assert!(matches!(err, RepoError::Duplicate { .. }));
    assert_eq!(
        err.to_string(),
        "Prompt 'greet' already exists in project 'p1' in workspace 'w1'"
    );
}

#[test]
fn delete_removes_wal_sidecars() {
    let dir = tempfile::tempdir().unwrap();
    let locator = WorkspaceLocator::new(dir.path());
    let mut store = locator.create_workspace("w1", &bundled_scripts()).unwrap();
    store.close().unwrap();

    let path = locator.workspace_store_path("w1");
    let wal = dir.path().join("w1.mcpkg-wal");
    std::fs::write(&wal, b"").unwrap();

    locator.delete_workspace("w1").unwrap();
    assert!(!path.exists());
    assert!(!wal.exists());
}

#[test]
fn path_like_names_are_rejected_before_touching_files() {
    let root = tempfile::tempdir().unwrap();
    let locator = WorkspaceLocator::new(root.path().join("data"));
    let outside = root.path().join("victim.mcpkg");
    std::fs::write(&outside, b"keep").unwrap();

    assert!(matches!(
        locator.open_workspace("../victim", &bundled_scripts()),
        Err(WorkspaceError::InvalidName(_))
    ));
    assert!(matches!(
        locator.delete_workspace("../victim"),
        Err(WorkspaceError::InvalidName(_))
    ));
    assert_eq!(std::fs::read(&outside).unwrap(), b"keep");
}
