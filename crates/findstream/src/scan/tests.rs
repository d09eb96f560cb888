use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use parking_lot::Mutex;
use serde_json::{json, Value};

use super::*;
use crate::cancel::CancellationToken;
use crate::filter::{self, always, and, not, prune, DynFilter};
use crate::fs::{FileSystem, FsCall, LocalFs, MemoryFs};
use crate::query;

/// `./{a/{a/{b,bb}, b/{c}}}`
fn sample_tree() -> Arc<MemoryFs> {
    Arc::new(
        MemoryFs::new()
            .with_file("a/a/b")
            .with_file("a/a/bb")
            .with_file("a/b/c"),
    )
}

fn scan(fs: &Arc<MemoryFs>, roots: &[&str], filter: DynFilter) -> Scan {
    let fs: Arc<dyn FileSystem> = fs.clone();
    Scan::new(fs, roots.iter().copied(), filter)
}

async fn paths(scan: Scan) -> Vec<String> {
    scan.collect_entries()
        .await
        .unwrap()
        .iter()
        .map(|entry| entry.node().to_string_with('/'))
        .collect()
}

async fn both_modes(fs: &Arc<MemoryFs>, roots: &[&str], filter: DynFilter) -> Vec<String> {
    let sequential = paths(scan(fs, roots, filter.clone())).await;
    let fanned = paths(scan(fs, roots, filter).with_fan_out(FanOut::PerDirectory)).await;
    assert_eq!(sequential, fanned, "fan-out changed the emission order");
    sequential
}

fn collect_errors() -> (ErrorCallback, Arc<Mutex<Vec<FindError>>>) {
    let errors = Arc::new(Mutex::new(Vec::new()));
    let sink = errors.clone();
    let callback: ErrorCallback = Arc::new(move |error: &FindError| sink.lock().push(error.clone()));
    (callback, errors)
}

fn reference_walk(prefix: &str, tree: &Value, out: &mut Vec<String>) {
    out.push(prefix.to_string());
    if let Value::Object(children) = tree {
        for (name, child) in children {
            reference_walk(&format!("{prefix}/{name}"), child, out);
        }
    }
}

#[tokio::test]
async fn emits_every_node_in_preorder() {
    let tree = json!({
        "src": {"lib.rs": 0, "scan": {"engine.rs": 0, "level.rs": 0}, "fs": {}},
        "docs": {"guide": {"intro.md": 0}},
        "README": 0,
    });
    let fs = Arc::new(MemoryFs::from_json(&tree));
    let mut expected = Vec::new();
    reference_walk(".", &tree, &mut expected);

    assert_eq!(both_modes(&fs, &["."], always()).await, expected);
}

#[tokio::test]
async fn not_prune_excludes_and_still_stops_descent() {
    let fs = sample_tree();
    let filter = not(prune(filter::name("b").unwrap()));
    assert_eq!(
        both_modes(&fs, &["."], filter).await,
        vec![".", "./a", "./a/a", "./a/a/bb"]
    );
}

#[tokio::test]
async fn prune_emits_matches_without_their_children() {
    let fs = sample_tree();
    let filter = prune(filter::name("b").unwrap());
    assert_eq!(
        both_modes(&fs, &["."], filter).await,
        vec!["./a/a/b", "./a/b"]
    );
    // ./a/b/c is never looked at.
    assert!(!fs.calls().contains(&FsCall::Lstat("./a/b/c".into())));
}

#[tokio::test]
async fn max_depth_bounds_expansion() {
    let fs = sample_tree();
    let entries = paths(scan(&fs, &["."], always()).with_max_depth(Some(1))).await;
    assert_eq!(entries, vec![".", "./a"]);

    let entries = paths(scan(&fs, &["."], always()).with_max_depth(Some(0))).await;
    assert_eq!(entries, vec!["."]);
}

#[tokio::test]
async fn type_selects_regular_files() {
    let fs = sample_tree();
    let filter = filter::file_type("f").unwrap();
    assert_eq!(
        both_modes(&fs, &["."], filter).await,
        vec!["./a/a/b", "./a/a/bb", "./a/b/c"]
    );
}

#[tokio::test]
async fn name_anchors_on_the_final_component() {
    let fs = Arc::new(MemoryFs::new().with_file("x.y.z").with_dir("w.z.q"));

    let entries = both_modes(&fs, &["."], filter::name("*.z").unwrap()).await;
    assert_eq!(entries, vec!["./x.y.z"]);

    let filter = and(vec![
        filter::name("*.z").unwrap(),
        filter::file_type("f").unwrap(),
    ]);
    let entries = both_modes(&fs, &["./x.y.z"], filter).await;
    assert_eq!(entries, vec!["./x.y.z"]);
}

#[tokio::test]
async fn repeated_scans_are_identical() {
    let fs = sample_tree();
    let first = paths(scan(&fs, &["."], always())).await;
    let second = paths(scan(&fs, &["."], always())).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn first_item_does_no_extra_io() {
    for fan_out in [FanOut::Sequential, FanOut::PerDirectory] {
        let fs = sample_tree();
        let mut scan = scan(&fs, &["."], always()).with_fan_out(fan_out);

        let first = scan.next().await.unwrap().unwrap();
        assert_eq!(first.node().to_string_with('/'), ".");
        drop(scan);

        assert_eq!(
            fs.calls(),
            vec![FsCall::Lstat(".".into()), FsCall::ListDir(".".into())],
            "{fan_out:?}"
        );
    }
}

#[tokio::test]
async fn nothing_happens_before_the_first_pull() {
    let fs = sample_tree();
    let scan = scan(&fs, &["."], always());
    assert!(fs.calls().is_empty());
    drop(scan);
    assert!(fs.calls().is_empty());
}

#[tokio::test]
async fn multiple_roots_are_walked_in_order() {
    let fs = sample_tree();
    let entries = both_modes(&fs, &["a/b", "a/a"], always()).await;
    assert_eq!(entries, vec!["a/b", "a/b/c", "a/a", "a/a/b", "a/a/bb"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn fan_out_keeps_preorder_under_latency() {
    let fs = Arc::new(
        MemoryFs::new()
            .with_file("d/slow")
            .with_file("d/fast")
            .with_file("d/sub/x")
            .with_file("e")
            .with_latency("d/slow", Duration::from_millis(40))
            .with_latency("d/sub", Duration::from_millis(20))
            .with_latency("e", Duration::from_millis(30)),
    );
    let expected = vec![".", "./d", "./d/slow", "./d/fast", "./d/sub", "./d/sub/x", "./e"];

    let fanned = paths(scan(&fs, &["."], always()).with_fan_out(FanOut::PerDirectory)).await;
    assert_eq!(fanned, expected);
    let sequential = paths(scan(&fs, &["."], always())).await;
    assert_eq!(sequential, expected);
}

#[tokio::test]
async fn failed_metadata_skips_the_node_and_reports() {
    for fan_out in [FanOut::Sequential, FanOut::PerDirectory] {
        let fs = Arc::new(
            MemoryFs::new()
                .with_file("a/a/b")
                .with_file("a/a/bb")
                .with_file("a/b/c")
                .fail_lstat("a/b"),
        );
        let (callback, errors) = collect_errors();
        let mut scan = scan(&fs, &["."], always())
            .with_fan_out(fan_out)
            .on_error(callback);

        let mut entries = Vec::new();
        while let Some(item) = scan.next().await {
            entries.push(item.unwrap().node().to_string_with('/'));
        }

        assert_eq!(entries, vec![".", "./a", "./a/a", "./a/a/b", "./a/a/bb"]);
        let errors = errors.lock();
        assert_eq!(errors.len(), 1);
        assert!(matches!(&errors[0], FindError::NodeIo { path, .. } if path == "./a/b"));
        assert_eq!(scan.stats().errors, 1);
        assert_eq!(scan.stats().emitted, 5);
    }
}

#[tokio::test]
async fn failed_listing_skips_the_directory() {
    let fs = Arc::new(
        MemoryFs::new()
            .with_file("a/a/b")
            .with_file("a/b/c")
            .fail_list_dir("a/a"),
    );
    let (callback, errors) = collect_errors();
    let entries = paths(scan(&fs, &["."], always()).on_error(callback)).await;

    assert_eq!(entries, vec![".", "./a", "./a/b", "./a/b/c"]);
    assert_eq!(errors.lock().len(), 1);
    assert_eq!(errors.lock()[0].path(), Some("./a/a"));
}

#[tokio::test]
async fn missing_root_fails_without_emitting() {
    for fan_out in [FanOut::Sequential, FanOut::PerDirectory] {
        let fs = sample_tree();
        let mut scan = scan(&fs, &[".", "missing"], always()).with_fan_out(fan_out);

        let error = scan.next().await.unwrap().unwrap_err();
        assert!(matches!(&error, FindError::StartPath { path, .. } if path == "missing"));
        assert!(scan.next().await.is_none());
        assert!(scan.is_finished());
        assert_eq!(scan.stats().emitted, 0);
    }
}

#[tokio::test]
async fn unlistable_root_is_fatal() {
    let fs = Arc::new(MemoryFs::new().with_file("a").fail_list_dir("."));
    let result = scan(&fs, &["."], always()).collect_entries().await;
    assert!(matches!(result, Err(FindError::StartPath { .. })));
}

#[tokio::test]
async fn unlistable_later_root_fails_before_any_emission() {
    for fan_out in [FanOut::Sequential, FanOut::PerDirectory] {
        let fs = Arc::new(
            MemoryFs::new()
                .with_file("a/x")
                .with_file("b/y")
                .fail_list_dir("b"),
        );
        let mut scan = scan(&fs, &["a", "b"], always()).with_fan_out(fan_out);

        let error = scan.next().await.unwrap().unwrap_err();
        assert!(
            matches!(&error, FindError::StartPath { path, .. } if path == "b"),
            "{fan_out:?}: {error:?}"
        );
        assert!(scan.next().await.is_none());
        assert_eq!(scan.stats().emitted, 0);
    }
}

#[tokio::test]
async fn roots_are_listed_once() {
    let fs = Arc::new(MemoryFs::new().with_file("a/x").with_file("b/y"));
    let entries = paths(scan(&fs, &["a", "b"], always())).await;

    assert_eq!(entries, vec!["a", "a/x", "b", "b/y"]);
    assert_eq!(fs.list_dir_count(), 2);
}

#[tokio::test]
async fn roots_are_not_listed_at_depth_zero() {
    let fs = sample_tree();
    let entries = paths(scan(&fs, &["."], always()).with_max_depth(Some(0))).await;

    assert_eq!(entries, vec!["."]);
    assert_eq!(fs.list_dir_count(), 0);
}

/// Panics on every stat, so dispatched lookup tasks never complete.
#[derive(Debug)]
struct PanickingFs;

#[async_trait::async_trait]
impl FileSystem for PanickingFs {
    async fn lstat(&self, _path: &std::path::Path) -> std::io::Result<crate::types::Metadata> {
        panic!("stat exploded");
    }

    async fn list_dir(&self, _path: &std::path::Path) -> std::io::Result<Vec<String>> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn failed_root_lookup_task_names_the_root() {
    let mut scan = Scan::new(Arc::new(PanickingFs), ["./boom"], always())
        .with_fan_out(FanOut::PerDirectory);

    let error = scan.next().await.unwrap().unwrap_err();
    assert!(
        matches!(&error, FindError::StartPath { path, .. } if path == "./boom"),
        "{error:?}"
    );
    assert_eq!(error.path(), Some("./boom"));
    assert!(scan.next().await.is_none());
}

#[tokio::test]
async fn cancellation_stops_the_scan() {
    let fs = sample_tree();
    let cancel = CancellationToken::new();
    let mut scan = scan(&fs, &["."], always()).with_cancel(cancel.clone());

    assert!(scan.next().await.is_some());
    cancel.cancel();
    let calls = fs.calls().len();
    assert!(scan.next().await.is_none());
    assert_eq!(fs.calls().len(), calls);
    assert!(scan.is_finished());
}

#[tokio::test]
async fn cancelled_before_start_does_nothing() {
    let fs = sample_tree();
    let cancel = CancellationToken::new();
    cancel.cancel();
    let mut scan = scan(&fs, &["."], always()).with_cancel(cancel);
    assert!(scan.next().await.is_none());
    assert!(fs.calls().is_empty());
}

#[tokio::test]
async fn compiled_expression_prunes_without_emitting() {
    let fs = Arc::new(MemoryFs::from_json(&json!({"x": {"a": 0}, "y": {"b": 0}})));
    let filter = query::compile(&json!({"or": [[{"name": "x"}, "prune"], "accept"]}), false).unwrap();
    assert_eq!(
        both_modes(&fs, &["/"], filter).await,
        vec!["/", "/y", "/y/b"]
    );
}

#[tokio::test]
async fn stream_and_channel_match_pull_order() {
    let fs = sample_tree();
    let expected = paths(scan(&fs, &["."], always())).await;

    let streamed = scan(&fs, &["."], always())
        .into_stream()
        .map(|item| item.unwrap().node().to_string_with('/'))
        .collect::<Vec<_>>()
        .await;
    assert_eq!(streamed, expected);

    let mut receiver = scan(&fs, &["."], always()).into_channel(1);
    let mut received = Vec::new();
    while let Some(item) = receiver.recv().await {
        received.push(item.unwrap().node().to_string_with('/'));
    }
    assert_eq!(received, expected);
}

#[tokio::test]
async fn stats_count_visits() {
    let fs = sample_tree();
    let mut scan = scan(&fs, &["."], filter::file_type("f").unwrap());
    while scan.next().await.is_some() {}
    assert_eq!(
        scan.stats(),
        ScanStats {
            visited: 7,
            emitted: 3,
            errors: 0
        }
    );
}

#[tokio::test]
async fn scans_the_local_disk() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("src/nested")).unwrap();
    std::fs::write(dir.path().join("src/lib.rs"), "").unwrap();
    std::fs::write(dir.path().join("src/nested/mod.rs"), "").unwrap();
    std::fs::write(dir.path().join("notes.txt"), "hi").unwrap();

    let root = dir.path().to_string_lossy().into_owned();
    let filter = and(vec![
        filter::name("*.rs").unwrap(),
        filter::file_type("f").unwrap(),
    ]);
    let entries = Scan::new(Arc::new(LocalFs), [root], filter)
        .with_fan_out(FanOut::PerDirectory)
        .collect_entries()
        .await
        .unwrap();

    let mut found = entries
        .iter()
        .map(|entry| entry.node().steps()[1..].join("/"))
        .collect::<Vec<_>>();
    found.sort();
    assert_eq!(found, vec!["src/lib.rs", "src/nested/mod.rs"]);
    assert!(entries.iter().all(|entry| entry.metadata().is_file()));

    for entry in entries {
        assert!(entry.path().starts_with(dir.path()));
        assert!(entry.path().exists());
        let depth = entry.depth();
        let (node, metadata) = entry.into_parts();
        assert_eq!(node.depth(), depth);
        assert_eq!(metadata.len(), 0);
    }
}

#[cfg(unix)]
#[tokio::test]
async fn symlinks_are_emitted_but_never_followed() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("real")).unwrap();
    std::fs::write(dir.path().join("real/f"), "").unwrap();
    std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("link")).unwrap();
    let root = dir.path().to_string_lossy().into_owned();

    for fan_out in [FanOut::Sequential, FanOut::PerDirectory] {
        let entries = Scan::new(Arc::new(LocalFs), [root.clone()], always())
            .with_fan_out(fan_out)
            .collect_entries()
            .await
            .unwrap();
        let mut found = entries
            .iter()
            .map(|entry| entry.node().steps()[1..].join("/"))
            .collect::<Vec<_>>();
        found.sort();
        assert_eq!(found, vec!["", "link", "real", "real/f"], "{fan_out:?}");

        let link = entries
            .iter()
            .find(|entry| entry.node().name() == "link")
            .unwrap();
        assert!(link.metadata().is_symlink());
        assert!(!link.metadata().is_dir());
    }

    let filter = query::compile(&json!({"type": "l"}), false).unwrap();
    let entries = Scan::new(Arc::new(LocalFs), [root], filter)
        .collect_entries()
        .await
        .unwrap();
    let names = entries
        .iter()
        .map(|entry| entry.node().steps()[1..].join("/"))
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["link"]);
}
