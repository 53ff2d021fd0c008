//! End-to-end tests for pruning, checkpoints and annotation.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use geocov::prune::{DestinationState, checkpoint_path, read_pruned};
use geocov::{
    BatchOutcome, BatchSource, CheckpointStore, CorpusPruner, GeocovError, Layout, Pipeline,
    PipelineConfig, SkipReason, TopicAnnotator,
};

const RICH_HEADER: &str =
    "id,created_at,hashtags,reweet_id,user_screen_name,user_followers_count,user_friends_count,user_verified,text";
const LEAN_HEADER: &str = "id,created_at,reweet_id,user_screen_name,user_followers_count,user_friends_count,retweet_count,favourite_count,text";

/// Write a raw export file under `dir` and return its path.
fn write_raw(dir: &Path, name: &str, header: &str, rows: &[&str]) -> PathBuf {
    let path = dir.join(name);
    let mut content = String::from(header);
    for row in rows {
        content.push('\n');
        content.push_str(row);
    }
    content.push('\n');
    fs::write(&path, content).expect("Failed to write raw file");
    path
}

fn scenario_batch(dir: &Path) -> PathBuf {
    write_raw(
        dir,
        "raw_2005.csv",
        RICH_HEADER,
        &[
            "1,2020-05-01 10:00:00,,,alice,10,5,False,Check http://x.co now 😀",
            "2,2020-05-01 10:01:00,,1,bob,3,4,False,RT ...",
        ],
    )
}

fn lean_batch(dir: &Path) -> PathBuf {
    write_raw(
        dir,
        "raw_2003.csv",
        LEAN_HEADER,
        &[
            "10,Sun Mar 01 10:00:00 +0000 2020,,carol,100,50,7,9,5G towers cause it @who",
            "11,Sun Mar 01 10:02:00 +0000 2020,,dave,1,2,0,0,\"microchips everywhere :)\"",
            "12,Sun Mar 01 10:03:00 +0000 2020,10,erin,1,2,0,0,RT 5G towers",
            "13,not a timestamp,,frank,1,2,0,0,dropped row",
        ],
    )
}

// =============================================================================
// Pruning
// =============================================================================

#[test]
fn test_prune_drops_reshares_and_cleans_text() {
    let raw = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let checkpoint_dir = out.path().join("pruned");

    let batches = vec![BatchSource::new("2005", scenario_batch(raw.path()), Layout::Rich)];
    let report = CorpusPruner::default()
        .prune_all(&batches, &checkpoint_dir)
        .unwrap();

    assert_eq!(report.destination, DestinationState::Created);
    assert_eq!(report.written(), 1);

    let (pruned, skipped) = read_pruned(checkpoint_path(&checkpoint_dir, "2005"), "2005").unwrap();
    assert_eq!(skipped, 0);
    assert_eq!(pruned.len(), 1);
    assert_eq!(pruned.posts[0].id, "1");
    assert_eq!(pruned.posts[0].text, "Check now");

    let header = fs::read_to_string(checkpoint_path(&checkpoint_dir, "2005")).unwrap();
    let header = header.lines().next().unwrap();
    assert!(!header.contains("reshare_of_id"));
    assert!(!header.contains("reweet_id"));
}

#[test]
fn test_prune_lean_batch_counts_and_null_fills() {
    let raw = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();

    let batches = vec![BatchSource::new("2003", lean_batch(raw.path()), Layout::Lean)];
    let report = CorpusPruner::default().prune_all(&batches, out.path()).unwrap();

    match report.outcome("2003").unwrap() {
        BatchOutcome::Written { stats, source, .. } => {
            assert_eq!(stats.rows_in, 3);
            assert_eq!(stats.reshares_dropped, 1);
            assert_eq!(stats.rows_out, 2);
            assert_eq!(stats.skipped_rows, 1);
            assert!(source.hash.starts_with("sha256:"));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    let batch = CheckpointStore::new(out.path()).load("2003").unwrap();
    assert_eq!(batch.posts[0].text, "5G towers cause it");
    assert_eq!(batch.posts[1].text, "microchips everywhere");
    assert_eq!(batch.posts[0].favorite_count, Some(9));
    assert!(batch.posts.iter().all(|p| p.hashtags.is_none()));
    assert!(batch.posts.iter().all(|p| p.author_verified.is_none()));
}

#[test]
fn test_bad_batches_are_skipped_not_fatal() {
    let raw = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let wrong_layout = lean_batch(raw.path());

    let batches = vec![
        BatchSource::new("missing", raw.path().join("nope.csv"), Layout::Rich),
        BatchSource::new("mismatch", wrong_layout, Layout::Rich),
        BatchSource::new("2005", scenario_batch(raw.path()), Layout::Rich),
    ];
    let report = CorpusPruner::default().prune_all(&batches, out.path()).unwrap();

    assert_eq!(report.written(), 1);
    assert!(matches!(
        report.outcome("missing"),
        Some(BatchOutcome::Skipped {
            reason: SkipReason::SourceNotFound,
            ..
        })
    ));
    assert!(matches!(
        report.outcome("mismatch"),
        Some(BatchOutcome::Skipped {
            reason: SkipReason::SchemaMismatch,
            ..
        })
    ));
    assert!(!checkpoint_path(out.path(), "missing").exists());
}

#[test]
fn test_duplicate_keys_write_nothing() {
    let raw = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let checkpoint_dir = out.path().join("pruned");
    let path = scenario_batch(raw.path());

    let batches = vec![
        BatchSource::new("2005", &path, Layout::Rich),
        BatchSource::new("2005", &path, Layout::Rich),
    ];
    let err = CorpusPruner::default()
        .prune_all(&batches, &checkpoint_dir)
        .unwrap_err();

    assert!(matches!(err, GeocovError::DuplicateKey(ref k) if k == "2005"));
    assert!(err.is_abort());
    assert!(!checkpoint_dir.exists());
}

// =============================================================================
// Directory guard
// =============================================================================

#[test]
fn test_guard_populated_directory_keeps_existing_checkpoints() {
    let raw = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let existing = checkpoint_path(out.path(), "2005");
    fs::write(&existing, "stale checkpoint").unwrap();

    let batches = vec![
        BatchSource::new("2005", scenario_batch(raw.path()), Layout::Rich),
        BatchSource::new("2003", lean_batch(raw.path()), Layout::Lean),
    ];
    let report = CorpusPruner::default().prune_all(&batches, out.path()).unwrap();

    assert_eq!(report.destination, DestinationState::Populated { entries: 1 });
    assert!(matches!(
        report.outcome("2005"),
        Some(BatchOutcome::Skipped {
            reason: SkipReason::DestinationOccupied,
            ..
        })
    ));
    assert!(report.outcome("2003").unwrap().is_written());
    assert_eq!(fs::read_to_string(&existing).unwrap(), "stale checkpoint");
}

#[test]
fn test_guard_rejects_file_destination() {
    let raw = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let target = out.path().join("not_a_dir");
    fs::write(&target, "file").unwrap();

    let batches = vec![BatchSource::new("2005", scenario_batch(raw.path()), Layout::Rich)];
    let err = CorpusPruner::default().prune_all(&batches, &target).unwrap_err();

    assert!(matches!(err, GeocovError::InvalidDestination { .. }));
    assert_eq!(fs::read_to_string(&target).unwrap(), "file");
    assert_eq!(fs::read_dir(out.path()).unwrap().count(), 1);
}

// =============================================================================
// Annotation
// =============================================================================

#[test]
fn test_annotate_checkpoints_from_disk() {
    let raw = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let batches = vec![BatchSource::new("2003", lean_batch(raw.path()), Layout::Lean)];
    CorpusPruner::default().prune_all(&batches, out.path()).unwrap();

    let store = CheckpointStore::new(out.path());
    let pruned: Vec<_> = store.iter().unwrap().map(|b| b.unwrap()).collect();
    let annotated = TopicAnnotator::default()
        .annotate_all(pruned, &["five-g", "microchip"], true, out.path())
        .unwrap();

    let batch = &annotated["2003"];
    assert_eq!(batch.label("five_g").unwrap(), &[true, false]);
    assert_eq!(batch.label("microchip").unwrap(), &[false, true]);

    let written = fs::read_to_string(out.path().join("annotated_2003.csv")).unwrap();
    let mut lines = written.lines();
    assert!(lines.next().unwrap().ends_with(",text,five_g,microchip"));
    assert!(lines.next().unwrap().ends_with(",True,False"));
    assert!(lines.next().unwrap().ends_with(",False,True"));

    // Annotated output sits beside the checkpoint without being listed as one
    assert_eq!(store.keys().unwrap(), vec!["2003"]);
}

#[test]
fn test_reannotation_is_deterministic() {
    let raw = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let batches = vec![BatchSource::new("2003", lean_batch(raw.path()), Layout::Lean)];
    CorpusPruner::default().prune_all(&batches, out.path()).unwrap();

    let store = CheckpointStore::new(out.path());
    let annotator = TopicAnnotator::default();
    let run = || {
        annotator
            .annotate_all(vec![store.load("2003").unwrap()], &["five_g"], true, out.path())
            .unwrap()
    };

    let first = run();
    let first_file = fs::read_to_string(out.path().join("annotated_2003.csv")).unwrap();
    let second = run();
    let second_file = fs::read_to_string(out.path().join("annotated_2003.csv")).unwrap();

    assert_eq!(first, second);
    assert_eq!(first_file, second_file);
}

// =============================================================================
// Pipeline
// =============================================================================

fn write_config(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("run.json");
    fs::write(&path, body).unwrap();
    path
}

#[test]
fn test_pipeline_runs_both_stages() {
    let work = TempDir::new().unwrap();
    scenario_batch(work.path());
    lean_batch(work.path());
    let config_path = write_config(
        work.path(),
        r#"{
            "checkpoint_dir": "pruned",
            "annotated_dir": "annotated",
            "custom_topics": {"stay_home": "\\bhome\\b"},
            "topics": ["five_g", "microchip", "stay_home"],
            "batches": [
                {"key": "2005", "path": "raw_2005.csv", "layout": "rich"},
                {"key": "2003", "path": "raw_2003.csv", "layout": "lean"}
            ]
        }"#,
    );

    let config = PipelineConfig::load(&config_path).unwrap();
    let report = Pipeline::with_config(config).unwrap().run().unwrap();

    let prune = report.prune.unwrap();
    assert_eq!(prune.written(), 2);

    let summary = report.annotation.unwrap();
    assert!(summary.failed.is_empty());
    assert_eq!(summary.batches.keys().collect::<Vec<_>>(), vec!["2003", "2005"]);
    assert_eq!(summary.total_rows(), 3);
    assert_eq!(summary.total_matches("five_g"), 1);
    assert_eq!(summary.total_matches("microchip"), 1);
    assert_eq!(summary.total_matches("stay_home"), 0);
    assert!(work.path().join("annotated/annotated_2005.csv").is_file());
}

#[test]
fn test_pipeline_annotate_only_reuses_checkpoints() {
    let work = TempDir::new().unwrap();
    scenario_batch(work.path());

    let mut config = PipelineConfig::new(work.path().join("pruned"));
    config.batches = vec![BatchSource::new(
        "2005",
        work.path().join("raw_2005.csv"),
        Layout::Rich,
    )];
    config.do_annotate = false;
    Pipeline::with_config(config.clone()).unwrap().run().unwrap();

    // The raw file is gone; annotation must read the checkpoint only
    fs::remove_file(work.path().join("raw_2005.csv")).unwrap();
    config.do_prune = false;
    config.do_annotate = true;
    config.persist_annotations = false;
    let report = Pipeline::with_config(config).unwrap().run().unwrap();

    assert!(report.prune.is_none());
    let summary = report.annotation.unwrap();
    assert_eq!(summary.batches["2005"].rows, 1);
    assert_eq!(summary.batches["2005"].output, None);
    assert!(!work.path().join("pruned/annotated_2005.csv").exists());
}

#[test]
fn test_pipeline_unknown_topic_fails_before_writing() {
    let work = TempDir::new().unwrap();
    scenario_batch(work.path());

    let mut config = PipelineConfig::new(work.path().join("pruned"));
    config.batches = vec![BatchSource::new(
        "2005",
        work.path().join("raw_2005.csv"),
        Layout::Rich,
    )];
    config.topics = vec!["flat_earth".to_string()];

    let err = Pipeline::with_config(config).unwrap().run().unwrap_err();
    assert!(matches!(err, GeocovError::UnknownTopic(_)));
    assert!(!work.path().join("pruned").exists());
}
