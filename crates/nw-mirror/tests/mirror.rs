//! End-to-end runs against the in-memory API.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use nw_cache::{Cache, FileCache, NullCache};
use nw_mirror::{
    Document, LinkIndex, Mirror, MirrorOptions, MirrorReport, PathTable, Stage, collect,
    materialize, rewrite_tree,
};
use nw_notion::mock::{MockApi, fixtures};
use nw_notion::{EntityId, FetchKind, Fetcher, NotionApi, RateLimiter};
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;

const ROOT: &str = "00000000-0000-4000-8000-000000000001";
const DB: &str = "00000000-0000-4000-8000-00000000000a";
const R1: &str = "00000000-0000-4000-8000-0000000000a1";
const R2: &str = "00000000-0000-4000-8000-0000000000a2";
const PEOPLE: &str = "00000000-0000-4000-8000-00000000000b";
const ADA: &str = "00000000-0000-4000-8000-0000000000b1";
const MISSING: &str = "00000000-0000-4000-8000-0000000000ff";

fn id(value: &str) -> EntityId {
    EntityId::parse(value).unwrap()
}

/// Root page `P` holding collection `C` with rows Alpha (content, points at
/// Beta) and Beta (no content).
fn example_api() -> MockApi {
    MockApi::new()
        .with_block(fixtures::child_page(ROOT, "P"))
        .with_children(ROOT, vec![fixtures::child_database(DB, "C")])
        .with_database(fixtures::database(
            DB,
            "C",
            json!({
                "Name": fixtures::title_schema(),
                "Related": fixtures::relation_schema(DB)
            }),
        ))
        .with_rows(
            DB,
            vec![
                fixtures::row(
                    R1,
                    DB,
                    json!({
                        "Name": fixtures::title_value("Alpha"),
                        "Related": fixtures::relation_value(&[R2])
                    }),
                ),
                fixtures::row(
                    R2,
                    DB,
                    json!({
                        "Name": fixtures::title_value("Beta"),
                        "Related": fixtures::relation_value(&[])
                    }),
                ),
            ],
        )
        .with_children(R1, vec![fixtures::paragraph("00000000-0000-4000-8000-0000000000f1", "Hello")])
        .with_children(R2, vec![])
}

fn fetcher(api: Arc<MockApi>, cache: &dyn Cache) -> Fetcher {
    Fetcher::new(
        api as Arc<dyn NotionApi>,
        cache,
        RateLimiter::new(1000, Duration::from_secs(1)),
    )
}

fn run(fetcher: &Fetcher, out_dir: &Path) -> MirrorReport {
    let options = MirrorOptions {
        output_dir: out_dir.to_path_buf(),
        workers: 3,
        column_overrides: Vec::new(),
    };
    Mirror::new(fetcher, options).run(id(ROOT)).unwrap()
}

/// Every file under `dir`, keyed by `/`-separated relative path.
fn read_tree(dir: &Path) -> BTreeMap<String, String> {
    fn walk(root: &Path, dir: &Path, files: &mut BTreeMap<String, String>) {
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(root, &path, files);
            } else {
                let relative = path.strip_prefix(root).unwrap();
                let key = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join("/");
                files.insert(key, fs::read_to_string(&path).unwrap());
            }
        }
    }
    let mut files = BTreeMap::new();
    walk(dir, dir, &mut files);
    files
}

#[test]
fn test_example_tree() {
    let temp_dir = TempDir::new().unwrap();
    let fetcher = fetcher(Arc::new(example_api()), &NullCache);

    let report = run(&fetcher, temp_dir.path());
    let files = read_tree(temp_dir.path());

    assert_eq!(
        files.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["c.md", "c/alpha.md", "p/index.md"]
    );
    assert_eq!(files["p/index.md"], "# P\n\n[C](../c.md)\n\n");
    assert_eq!(
        files["c.md"],
        "# C\n\n\
         | Name | Related |\n\
         | --- | --- |\n\
         | [Alpha](c/alpha.md) | [Beta](c.md) |\n\
         | Beta |  |\n"
    );
    assert_eq!(
        files["c/alpha.md"],
        "# Alpha\n\n\
         *Database record: [C](../c.md)*\n\n\
         | Property | Value |\n\
         | --- | --- |\n\
         | Related | [Beta](../c.md) |\n\n\
         Hello\n\n"
    );

    assert_eq!(report.entities, 2);
    assert_eq!(report.rows, 2);
    assert_eq!(report.documents_written, 3);
    assert!(report.failures.is_empty());
}

#[test]
fn test_each_object_fetched_once() {
    let temp_dir = TempDir::new().unwrap();
    let api = Arc::new(example_api());
    let fetcher = fetcher(Arc::clone(&api), &NullCache);

    run(&fetcher, temp_dir.path());

    assert_eq!(api.calls(FetchKind::Block, ROOT), 1);
    assert_eq!(api.calls(FetchKind::Children, ROOT), 1);
    assert_eq!(api.calls(FetchKind::Database, DB), 1);
    assert_eq!(api.calls(FetchKind::Query, DB), 1);
    assert_eq!(api.calls(FetchKind::Children, R1), 1);
    assert_eq!(api.calls(FetchKind::Children, R2), 1);
}

#[test]
fn test_warm_cache_run_is_identical() {
    let cache_dir = TempDir::new().unwrap();
    let first_out = TempDir::new().unwrap();
    let second_out = TempDir::new().unwrap();
    let cache = FileCache::new(
        cache_dir.path().to_path_buf(),
        "test",
        Duration::from_secs(3600),
    );

    let cold_api = Arc::new(example_api());
    run(&fetcher(Arc::clone(&cold_api), &cache), first_out.path());
    let warm_api = Arc::new(example_api());
    run(&fetcher(Arc::clone(&warm_api), &cache), second_out.path());

    assert!(cold_api.total_calls() > 0);
    assert_eq!(warm_api.total_calls(), 0);
    assert_eq!(read_tree(first_out.path()), read_tree(second_out.path()));
}

#[test]
fn test_rewriting_written_tree_again_changes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let link = format!(
        "https://www.notion.so/acme/Alpha-{}",
        id(R1).compact()
    );
    let api = Arc::new(
        example_api().with_children(
            ROOT,
            vec![
                fixtures::child_database(DB, "C"),
                fixtures::block(
                    "00000000-0000-4000-8000-0000000000f2",
                    "bookmark",
                    json!({"url": link, "caption": [{"plain_text": "Alpha"}]}),
                    false,
                ),
            ],
        ),
    );
    let fetcher = fetcher(api, &NullCache);

    let report = run(&fetcher, temp_dir.path());
    let page = fs::read_to_string(temp_dir.path().join("p/index.md")).unwrap();
    assert!(page.contains("[Alpha](../c/alpha.md)"));
    assert_eq!(report.links_rewritten, 1);

    let registry = collect(&fetcher, id(ROOT)).unwrap().registry;
    let materialized = materialize(&fetcher, &registry, 1).unwrap();
    let index = LinkIndex::from_paths(&PathTable::build(&registry, &materialized));
    let documents: Vec<Document> = read_tree(temp_dir.path())
        .into_iter()
        .map(|(path, content)| Document {
            id: id(ROOT),
            path,
            content,
        })
        .collect();
    let before = read_tree(temp_dir.path());

    let outcome = rewrite_tree(temp_dir.path(), &documents, &index);

    assert_eq!(outcome.files_changed, 0);
    assert_eq!(outcome.links_rewritten, 0);
    assert_eq!(read_tree(temp_dir.path()), before);
}

#[test]
fn test_relation_cycle_between_collections() {
    let temp_dir = TempDir::new().unwrap();
    let api = Arc::new(
        MockApi::new()
            .with_block(fixtures::child_page(ROOT, "P"))
            .with_children(ROOT, vec![fixtures::child_database(DB, "Projects")])
            .with_database(fixtures::database(
                DB,
                "Projects",
                json!({
                    "Name": fixtures::title_schema(),
                    "Lead": fixtures::relation_schema(PEOPLE)
                }),
            ))
            .with_rows(
                DB,
                vec![fixtures::row(
                    R1,
                    DB,
                    json!({
                        "Name": fixtures::title_value("Apollo"),
                        "Lead": fixtures::relation_value(&[ADA])
                    }),
                )],
            )
            .with_children(R1, vec![])
            .with_database(fixtures::database(
                PEOPLE,
                "People",
                json!({
                    "Name": fixtures::title_schema(),
                    "Projects": fixtures::relation_schema(DB)
                }),
            ))
            .with_rows(
                PEOPLE,
                vec![fixtures::row(
                    ADA,
                    PEOPLE,
                    json!({
                        "Name": fixtures::title_value("Ada"),
                        "Projects": fixtures::relation_value(&[R1])
                    }),
                )],
            )
            .with_children(ADA, vec![fixtures::paragraph("00000000-0000-4000-8000-0000000000f3", "Bio")]),
    );
    let fetcher = fetcher(Arc::clone(&api), &NullCache);

    let report = run(&fetcher, temp_dir.path());
    let files = read_tree(temp_dir.path());

    assert_eq!(report.entities, 3);
    assert_eq!(api.calls(FetchKind::Query, PEOPLE), 1);
    assert_eq!(
        files.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["p/index.md", "people.md", "people/ada.md", "projects.md"]
    );
    assert!(files["projects.md"].contains("| Apollo | [Ada](people/ada.md) |"));
    assert!(files["people/ada.md"].ends_with(
        "Bio\n\n\
         ## Referenced by Projects\n\n\
         | Record | Property |\n\
         | --- | --- |\n\
         | [Apollo](../projects.md) | Lead |\n\n"
    ));
}

#[test]
fn test_unresolved_reference_renders_placeholder() {
    let temp_dir = TempDir::new().unwrap();
    let api = Arc::new(
        example_api().with_rows(
            DB,
            vec![
                fixtures::row(
                    R1,
                    DB,
                    json!({
                        "Name": fixtures::title_value("Alpha"),
                        "Related": fixtures::relation_value(&[MISSING])
                    }),
                ),
                fixtures::row(R2, DB, json!({"Name": fixtures::title_value("Beta")})),
            ],
        ),
    );
    let fetcher = fetcher(api, &NullCache);

    let report = run(&fetcher, temp_dir.path());
    let table = fs::read_to_string(temp_dir.path().join("c.md")).unwrap();

    assert!(table.contains(&format!(
        "| [Alpha](c/alpha.md) | [not found: {MISSING}] |"
    )));
    assert!(table.contains("| Beta |  |"));
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].stage, Stage::Resolve);
    assert_eq!(report.failures[0].id, id(MISSING));
}

#[test]
fn test_missing_root_is_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let fetcher = fetcher(Arc::new(MockApi::new()), &NullCache);
    let options = MirrorOptions {
        output_dir: temp_dir.path().join("out"),
        workers: 1,
        column_overrides: Vec::new(),
    };

    let result = Mirror::new(&fetcher, options).run(id(ROOT));

    assert!(matches!(
        result,
        Err(nw_mirror::MirrorError::RootUnavailable { .. })
    ));
    assert!(!temp_dir.path().join("out").exists());
}
