//! End-to-end push and fetch over a shared database, driven through the
//! engine against two temporary repositories.

use std::path::Path;

use git2::{Oid, Repository, Signature};
use tempfile::tempdir;

use git_remote_sqlite::protocol::{Command, FetchResult, PushResult, Response};
use git_remote_sqlite::remote::RemoteHelper;
use git_remote_sqlite::repo::LocalRepository;
use git_remote_sqlite::storage::Database;

const README: &[u8] = b"# Test Repository\nThis is a test file.\n";
const README_UPDATED: &[u8] =
    b"# Test Repository\nThis is a test file.\nSecond line.\nThird line.\n";

fn sig() -> Signature<'static> {
    Signature::now("tester", "tester@localhost").unwrap()
}

fn commit_readme(repo: &Repository, contents: &[u8], parent: Option<Oid>) -> Oid {
    let blob = repo.blob(contents).unwrap();
    let mut builder = repo.treebuilder(None).unwrap();
    builder.insert("README.md", blob, 0o100644).unwrap();
    let tree_id = builder.write().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();

    let parents: Vec<git2::Commit<'_>> = parent
        .map(|oid| vec![repo.find_commit(oid).unwrap()])
        .unwrap_or_default();
    let parent_refs: Vec<&git2::Commit<'_>> = parents.iter().collect();
    repo.commit(Some("HEAD"), &sig(), &sig(), "update", &tree, &parent_refs)
        .unwrap()
}

fn helper(repo_dir: &Path, db_path: &Path) -> RemoteHelper {
    RemoteHelper::new(
        LocalRepository::open(repo_dir).unwrap(),
        Database::open(db_path).unwrap(),
    )
}

fn push_head(helper: &mut RemoteHelper) -> Response {
    helper
        .execute(Command::Push {
            refspec: "HEAD:refs/heads/main".to_string(),
        })
        .unwrap()
}

fn fetch_all(helper: &mut RemoteHelper, sha: &str) -> Response {
    helper
        .execute(Command::Fetch {
            sha: sha.to_string(),
            name: "refs/heads/main".to_string(),
        })
        .unwrap()
}

/// Read the README blob reachable from a commit.
fn readme_at(repo: &Repository, commit: Oid) -> Vec<u8> {
    let tree = repo.find_commit(commit).unwrap().tree().unwrap();
    let entry = tree.get_name("README.md").unwrap();
    repo.find_blob(entry.id()).unwrap().content().to_vec()
}

fn commit_count(repo: &Repository, head: Oid) -> usize {
    let mut revwalk = repo.revwalk().unwrap();
    revwalk.push(head).unwrap();
    revwalk.count()
}

#[test]
fn test_push_then_clone_matches() {
    let src_dir = tempdir().unwrap();
    let src_repo = Repository::init(src_dir.path()).unwrap();
    let head = commit_readme(&src_repo, README, None);
    let db_path = src_dir.path().join("remote.db");

    let mut pusher = helper(src_dir.path(), &db_path);
    assert_eq!(
        push_head(&mut pusher),
        Response::Push(vec![PushResult::Ok {
            dst: "refs/heads/main".to_string(),
        }])
    );

    // Fresh repository standing in for the clone target.
    let dst_dir = tempdir().unwrap();
    let dst_repo = Repository::init_bare(dst_dir.path()).unwrap();
    let mut fetcher = helper(dst_dir.path(), &db_path);
    assert_eq!(
        fetch_all(&mut fetcher, &head.to_string()),
        Response::Fetch(FetchResult::Complete)
    );

    // Git would now set the local ref to the advertised sha.
    let db = Database::open(&db_path).unwrap();
    let advertised = db.get_ref("refs/heads/main").unwrap().unwrap();
    assert_eq!(advertised, head.to_string());
    dst_repo
        .reference("refs/heads/main", head, true, "clone")
        .unwrap();

    assert_eq!(readme_at(&dst_repo, head), README);
    assert_eq!(
        dst_repo
            .revparse_single("refs/heads/main")
            .unwrap()
            .id()
            .to_string(),
        head.to_string()
    );
}

#[test]
fn test_update_sync() {
    let src_dir = tempdir().unwrap();
    let src_repo = Repository::init(src_dir.path()).unwrap();
    let first = commit_readme(&src_repo, README, None);
    let db_path = src_dir.path().join("remote.db");

    let mut pusher = helper(src_dir.path(), &db_path);
    push_head(&mut pusher);

    let second = commit_readme(&src_repo, README_UPDATED, Some(first));
    push_head(&mut pusher);

    let db = Database::open(&db_path).unwrap();
    assert_eq!(
        db.get_ref("refs/heads/main").unwrap().unwrap(),
        second.to_string()
    );

    let dst_dir = tempdir().unwrap();
    let dst_repo = Repository::init_bare(dst_dir.path()).unwrap();
    let mut fetcher = helper(dst_dir.path(), &db_path);
    fetch_all(&mut fetcher, &second.to_string());
    dst_repo
        .reference("refs/heads/main", second, true, "pull")
        .unwrap();

    assert_eq!(readme_at(&dst_repo, second), README_UPDATED);
    assert_eq!(commit_count(&dst_repo, second), 2);
    assert_eq!(commit_count(&src_repo, second), 2);
}

#[test]
fn test_push_store_invariants() {
    let src_dir = tempdir().unwrap();
    let src_repo = Repository::init(src_dir.path()).unwrap();
    let head = commit_readme(&src_repo, README, None);
    let db_path = src_dir.path().join("remote.db");

    let mut pusher = helper(src_dir.path(), &db_path);
    push_head(&mut pusher);

    // Inspect the database file directly, as an external consumer would.
    let conn = rusqlite::Connection::open(&db_path).unwrap();

    let mut stmt = conn.prepare("SELECT sha FROM objects").unwrap();
    let shas: Vec<String> = stmt
        .query_map([], |row| row.get(0))
        .unwrap()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(shas.len(), 3);
    for sha in &shas {
        assert_eq!(sha.len(), 40);
        assert!(sha.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    let dangling: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM refs WHERE sha NOT IN (SELECT sha FROM objects)",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(dangling, 0);

    let (name, sha, kind): (String, String, String) = conn
        .query_row("SELECT name, sha, kind FROM refs", [], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })
        .unwrap();
    assert_eq!(name, "refs/heads/main");
    assert_eq!(sha, head.to_string());
    assert_eq!(kind, "branch");

    // Reserved pack tables exist and stay empty.
    for table in ["packs", "pack_entries"] {
        let count: i64 = conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(count, 0);
    }
}

#[test]
fn test_session_push_then_list() {
    let src_dir = tempdir().unwrap();
    let src_repo = Repository::init(src_dir.path()).unwrap();
    let head = commit_readme(&src_repo, README, None);
    let db_path = src_dir.path().join("remote.db");

    let mut session = helper(src_dir.path(), &db_path);
    let input = b"capabilities\npush HEAD:refs/heads/main\nlist for-push\n" as &[u8];
    let mut output = Vec::new();
    session.run(input, &mut output).unwrap();

    let expected = format!(
        "capabilities\npush\nfetch\nprogress\noption\n\nok refs/heads/main\n\n{head} refs/heads/main\n\n"
    );
    assert_eq!(String::from_utf8(output).unwrap(), expected);
}
