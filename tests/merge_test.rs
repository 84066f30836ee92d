//! Merge scenarios through the repository API.

use gitty::{Error, MemoryBackend, Repository, Signature, WorkingFile};

fn sig() -> Signature {
    Signature::new("Tester", "tester@example.com", 1_700_000_000, 0)
}

fn repo() -> Repository {
    Repository::with_backend("work", Box::new(MemoryBackend::new())).unwrap()
}

fn commit(repo: &Repository, files: &[(&str, &str)], message: &str) {
    let files: Vec<WorkingFile> = files
        .iter()
        .map(|(path, content)| WorkingFile::new(*path, *content))
        .collect();
    repo.add_paths(&files).unwrap();
    repo.commit_with_signature(message, &sig()).unwrap();
}

#[test]
fn test_merge_with_identical_trees() {
    let repo = repo();
    commit(&repo, &[("a.txt", "hello")], "base");
    let main_tip = repo.resolve("main").unwrap();
    repo.create_branch("feature").unwrap();

    let outcome = repo.merge_branch("feature").unwrap();
    assert_eq!(outcome.branch, "main");
    assert_eq!(outcome.parents, [main_tip, main_tip]);

    let merged = repo.commit_object(&outcome.oid).unwrap();
    let base = repo.commit_object(&main_tip).unwrap();
    assert!(merged.is_merge());
    assert_eq!(merged.tree(), base.tree());
    assert_eq!(merged.message(), "Merge branch 'feature' into main");
    assert_eq!(merged.author().name(), "Default Author");
    assert_eq!(merged.author().email(), "default@example.com");
    assert_eq!(repo.resolve("main").unwrap(), outcome.oid);
    assert_eq!(repo.resolve("feature").unwrap(), main_tip);
}

#[test]
fn test_merge_after_divergent_disjoint_work() {
    let repo = repo();
    commit(&repo, &[("shared.txt", "same")], "base");
    repo.create_branch("feature").unwrap();

    repo.switch_to("feature").unwrap();
    commit(&repo, &[("feature.txt", "f")], "feature work");
    let feature_tip = repo.resolve("feature").unwrap();

    repo.switch_to("main").unwrap();
    repo.remove_paths(&["feature.txt"]).unwrap();
    commit(&repo, &[("main.txt", "m")], "main work");
    let main_tip = repo.resolve("main").unwrap();

    let outcome = repo.merge_branch("feature").unwrap();
    assert_eq!(outcome.parents, [main_tip, feature_tip]);

    let history: Vec<String> = repo
        .log()
        .unwrap()
        .map(|c| c.unwrap().summary().to_string())
        .collect();
    assert_eq!(
        history,
        vec!["Merge branch 'feature' into main", "main work", "base"]
    );
}

#[test]
fn test_merge_conflict_changes_nothing() {
    let repo = repo();
    commit(&repo, &[("a.txt", "base"), ("b.txt", "base")], "base");
    repo.create_branch("feature").unwrap();

    repo.switch_to("feature").unwrap();
    commit(&repo, &[("a.txt", "feature side")], "feature edit");
    let feature_tip = repo.resolve("feature").unwrap();

    repo.switch_to("main").unwrap();
    commit(&repo, &[("a.txt", "main side")], "main edit");
    let main_tip = repo.resolve("main").unwrap();

    match repo.merge_branch("feature") {
        Err(Error::MergeConflict(paths)) => assert_eq!(paths, vec!["a.txt"]),
        other => panic!("expected a conflict, got {:?}", other),
    }
    assert_eq!(repo.resolve("main").unwrap(), main_tip);
    assert_eq!(repo.resolve("feature").unwrap(), feature_tip);
    assert_eq!(repo.log().unwrap().count(), 2);
}

#[test]
fn test_merge_uses_configured_identity() {
    let repo = repo();
    let mut config = repo.config().unwrap();
    config.set("user", "", "name", "Merge Bot");
    config.set("user", "", "email", "bot@example.com");
    config.save(repo.backend()).unwrap();

    commit(&repo, &[("a.txt", "x")], "base");
    repo.create_branch("other").unwrap();

    let outcome = repo.merge_branch("other").unwrap();
    let merged = repo.commit_object(&outcome.oid).unwrap();
    assert_eq!(merged.author().name(), "Merge Bot");
    assert_eq!(merged.committer().email(), "bot@example.com");
}

#[test]
fn test_merge_unknown_branch() {
    let repo = repo();
    commit(&repo, &[("a.txt", "x")], "base");
    assert!(matches!(
        repo.merge_branch("ghost"),
        Err(Error::RefNotFound(_))
    ));
}
