mod common;

use common::assertion_helpers::{assert_reachable, full_names};
use common::test_fixtures::{RepositoryFixture, WorkspaceFixture};
use grove::domain::entities::repository::now_unix;
use grove::domain::entities::Repository;
use grove::infrastructure::filesystem::codec::{encode_index, IndexRecord};
use grove::infrastructure::filesystem::WorkspaceIndex;
use pretty_assertions::assert_eq;
use std::fs;
use std::sync::Arc;
use std::thread;

fn sorted(mut repos: Vec<Repository>) -> Vec<Repository> {
    repos.sort_by_key(Repository::full_name);
    repos
}

#[test]
fn test_close_then_load_round_trip() {
    let fixture = WorkspaceFixture::new();
    let root = fixture.workspace_root();
    let now = now_unix();

    let index = fixture.load_index();
    let repos = vec![
        RepositoryFixture::with_stats(&root, "github", "acme/widget", 3, now - 600),
        RepositoryFixture::with_stats(&root, "github", "acme/tools/lint", 1, now - 3 * 86400),
        RepositoryFixture::workspace(&root, "gitlab", "infra/deploy"),
        RepositoryFixture::attached("github", "oss/fork", fixture.path().join("elsewhere/fork")),
    ];
    for repo in &repos {
        index.add(repo.clone()).unwrap();
    }
    index.close().unwrap();
    assert_file_exists!(fixture.index_path());

    let reloaded = fixture.load_index();
    assert_eq!(sorted(reloaded.list("")), sorted(repos.clone()));
    for repo in &repos {
        assert_reachable(&reloaded, repo);
    }

    // loaded repositories come back ranked
    let names: Vec<String> = reloaded.list("").iter().map(Repository::full_name).collect();
    assert_eq!(&names[..2], &["github:acme/widget", "github:acme/tools/lint"]);
}

#[test]
fn test_default_location_follows_workspace_root() {
    let fixture = WorkspaceFixture::new();
    let index = fixture.load_index();
    index
        .add(RepositoryFixture::workspace(&fixture.workspace_root(), "github", "acme/widget"))
        .unwrap();
    index.close().unwrap();

    let moved_root = fixture.path().join("moved");
    let moved = WorkspaceIndex::load(fixture.index_path(), &moved_root).unwrap();
    let repo = moved.get_by_name("github", "acme/widget").unwrap();
    assert_eq!(repo.path(), moved_root.join("github/acme/widget"));
    assert!(repo.is_default_location());
}

#[test]
fn test_add_rejects_duplicates_without_changes() {
    let fixture = WorkspaceFixture::new();
    let root = fixture.workspace_root();
    let index = fixture.load_index();
    index
        .add(RepositoryFixture::workspace(&root, "github", "acme/widget"))
        .unwrap();
    let before = index.list("");

    let same_name = RepositoryFixture::attached("github", "acme/widget", fixture.path().join("x"));
    let err = index.add(same_name).unwrap_err();
    assert!(err.is_conflict());

    let same_path = RepositoryFixture::attached(
        "gitlab",
        "other/name",
        root.join("github/acme/widget"),
    );
    let err = index.add(same_path).unwrap_err();
    assert!(err.is_conflict());

    assert_eq!(index.list(""), before);
}

#[test]
fn test_delete_is_idempotent() {
    let fixture = WorkspaceFixture::new();
    let root = fixture.workspace_root();
    let index = fixture.load_index();
    for repo in RepositoryFixture::many(&root, "github", 3) {
        index.add(repo).unwrap();
    }
    let before = index.list("");

    let absent = RepositoryFixture::workspace(&root, "github", "acme/absent");
    index.delete(&absent);
    assert_eq!(index.list(""), before);

    index.delete(&before[1]);
    index.delete(&before[1]);
    assert_eq!(index.len(), 2);
    assert!(index.get_by_path(before[1].path()).is_err());
    assert_reachable(&index, &before[0]);
    assert_reachable(&index, &before[2]);
}

#[test]
fn test_delete_all_removes_directory() {
    let fixture = WorkspaceFixture::new();
    let path = fixture.checkout("github", "acme/widget");
    fs::write(path.join("README"), "hello").unwrap();

    let index = fixture.load_index();
    let repo = RepositoryFixture::workspace(&fixture.workspace_root(), "github", "acme/widget");
    index.add(repo.clone()).unwrap();

    index.delete_all(&repo).unwrap();
    assert_file_not_exists!(path);
    assert!(index.is_empty());
}

#[test]
fn test_delete_all_keeps_entry_when_removal_fails() {
    let fixture = WorkspaceFixture::new();
    // a plain file where the checkout directory should be cannot be removed as a directory
    let path = fixture.path().join("not-a-dir");
    fs::write(&path, "file").unwrap();

    let index = fixture.load_index();
    let repo = RepositoryFixture::attached("github", "acme/widget", &path);
    index.add(repo.clone()).unwrap();

    assert!(index.delete_all(&repo).is_err());
    assert_eq!(index.len(), 1);
    assert_reachable(&index, &repo);
}

#[test]
fn test_undecodable_file_is_corruption() {
    let fixture = WorkspaceFixture::new();
    fs::create_dir_all(fixture.data_dir()).unwrap();
    fs::write(fixture.index_path(), b"definitely not an index").unwrap();

    let err = WorkspaceIndex::load(fixture.index_path(), fixture.workspace_root()).unwrap_err();
    assert!(err.is_corruption());
    let hint = err.hint().unwrap();
    assert!(hint.contains(&fixture.index_path().display().to_string()));
}

#[test]
fn test_duplicate_records_are_corruption() {
    let fixture = WorkspaceFixture::new();
    let record = IndexRecord {
        path: String::new(),
        name: "acme/widget".to_string(),
        remote: "github".to_string(),
        access_count: 1,
        last_access: 100,
    };
    fs::create_dir_all(fixture.data_dir()).unwrap();
    fs::write(fixture.index_path(), encode_index(&[record.clone(), record])).unwrap();

    let err = WorkspaceIndex::load(fixture.index_path(), fixture.workspace_root()).unwrap_err();
    assert!(err.is_corruption());
    assert!(err.to_string().contains("duplicate"));
}

#[test]
fn test_concurrent_mutation_keeps_indices_consistent() {
    let fixture = WorkspaceFixture::new();
    let index = Arc::new(fixture.load_index());
    let base = fixture.path().join("checkouts");

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let index = Arc::clone(&index);
            let base = base.clone();
            thread::spawn(move || {
                let mut kept = Vec::new();
                for i in 0..25 {
                    let name = format!("team-{worker}/repo-{i}");
                    let repo = Repository::attach("github", &name, base.join(&name)).unwrap();
                    index.add(repo.clone()).unwrap();
                    if i % 5 == 0 {
                        index.delete(&repo);
                    } else {
                        kept.push(repo);
                    }
                    // readers run alongside writers
                    assert!(index.list("github").len() <= 8 * 25);
                }
                kept
            })
        })
        .collect();

    let mut kept = Vec::new();
    for handle in handles {
        kept.extend(handle.join().unwrap());
    }

    assert_eq!(index.len(), kept.len());
    assert_eq!(full_names(&index.list("")), full_names(&kept));
    for repo in &kept {
        assert_reachable(&index, repo);
    }
}
