use mcpkg_core::{
    apply_migrations, bundled_scripts, CatalogError, CatalogService, NewResource,
    ProjectRepository, PromptRepository, ResourceRepository, SqliteProjectRepository,
    SqlitePromptRepository, SqliteResourceRepository, Store,
};

fn seeded_store() -> Store {
    let mut store = Store::open_in_memory().unwrap();
    apply_migrations(&mut store, &bundled_scripts()).unwrap();

    let projects = SqliteProjectRepository::try_new(&store).unwrap();
    let prompts = SqlitePromptRepository::try_new(&store).unwrap();
    let resources = SqliteResourceRepository::try_new(&store).unwrap();

    let docs = projects.create_project("docs").unwrap();
    let ops = projects.create_project("ops").unwrap();
    prompts
        .create_prompt(&docs, "summarize", "Summarize {text}", Some("short summary"))
        .unwrap();
    prompts.create_prompt(&ops, "triage", "Triage {issue}", None).unwrap();
    resources
        .create_resource(
            &docs,
            &NewResource::new("style", "docs://style", "be terse").mime_type("text/plain"),
        )
        .unwrap();
    resources
        .create_resource(&ops, &NewResource::new("style", "docs://style", "ops style"))
        .unwrap();
    store
}

fn catalog(
    store: &Store,
) -> CatalogService<
    SqliteProjectRepository<'_>,
    SqlitePromptRepository<'_>,
    SqliteResourceRepository<'_>,
> {
    CatalogService::new(
        SqliteProjectRepository::try_new(store).unwrap(),
        SqlitePromptRepository::try_new(store).unwrap(),
        SqliteResourceRepository::try_new(store).unwrap(),
    )
}

#[test]
fn list_prompts_uses_qualified_names() {
    let store = seeded_store();
    let listed = catalog(&store).list_prompts().unwrap();

    let names: Vec<&str> = listed.iter().map(|p| p.qualified_name.as_str()).collect();
    assert_eq!(names, vec!["docs/summarize", "ops/triage"]);
    assert_eq!(listed[0].description.as_deref(), Some("short summary"));
}

#[test]
fn get_prompt_resolves_references() {
    let store = seeded_store();
    let service = catalog(&store);

    let prompt = service.get_prompt("ops/triage").unwrap().unwrap();
    assert_eq!(prompt.content, "Triage {issue}");
    assert_eq!(service.get_prompt("ops/missing").unwrap(), None);
    assert_eq!(service.get_prompt("nobody/triage").unwrap(), None);
    assert!(matches!(
        service.get_prompt("triage"),
        Err(CatalogError::InvalidQualifiedName(_))
    ));
}

#[test]
fn resources_list_without_content_and_read_by_uri() {
    let store = seeded_store();
    let service = catalog(&store);

    let listed = service.list_resources().unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].project, "docs");
    assert_eq!(listed[0].mime_type.as_deref(), Some("text/plain"));

    let json = serde_json::to_value(&listed[0]).unwrap();
    assert!(json.get("content").is_none());

    let first = service.read_resource("docs://style").unwrap().unwrap();
    assert_eq!(first.content, b"be terse".to_vec());
    assert_eq!(service.read_resource("docs://missing").unwrap(), None);
}
