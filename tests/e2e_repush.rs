//! End-to-end pass properties, driven through `RepushContext` with an
//! in-memory publisher and real files in a temp directory.

use log_repush::checkpoint::{FilesystemStore, LineOffset, OffsetStore};
use log_repush::jsonl::{Config, PassError};
use log_repush::kafka::testing::RecordingPublisher;
use log_repush::RepushContext;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

struct Fixture {
    _dir: TempDir,
    log_path: PathBuf,
    offset_path: PathBuf,
    failure_path: PathBuf,
}

impl Fixture {
    fn new(lines: &[&str]) -> Self {
        let dir = TempDir::new().unwrap();
        let fixture = Self {
            log_path: dir.path().join("app.log"),
            offset_path: dir.path().join("state").join("last_line.json"),
            failure_path: dir.path().join("error.txt"),
            _dir: dir,
        };
        std::fs::write(&fixture.log_path, "").unwrap();
        fixture.append(lines);
        fixture
    }

    fn append(&self, lines: &[&str]) {
        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .open(&self.log_path)
            .unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
    }

    fn context(&self, publisher: Arc<RecordingPublisher>) -> RepushContext {
        RepushContext::new(
            Config::new(&self.log_path, &self.failure_path),
            Arc::new(FilesystemStore::new(&self.offset_path)),
            publisher,
        )
    }

    async fn stored_offset(&self) -> LineOffset {
        FilesystemStore::new(&self.offset_path).load().await.unwrap()
    }

    fn failure_lines(&self) -> Vec<String> {
        read_lines(&self.failure_path)
    }
}

fn read_lines(path: &Path) -> Vec<String> {
    match std::fs::read_to_string(path) {
        Ok(contents) => contents.lines().map(str::to_string).collect(),
        Err(_) => Vec::new(),
    }
}

fn event(topic: &str, message: &str) -> String {
    serde_json::json!({ "topic": topic, "message": message }).to_string()
}

#[tokio::test]
async fn test_first_pass_publishes_everything() {
    let a = event("orders", "a");
    let b = event("payments", "b");
    let fixture = Fixture::new(&[&a, &b]);
    let publisher = Arc::new(RecordingPublisher::new());

    let report = fixture.context(publisher.clone()).run_pass().await.unwrap();

    assert_eq!(report.start_offset, LineOffset::ZERO);
    assert_eq!(report.end_offset, LineOffset::new(2));
    assert_eq!(report.published, 2);

    let published = publisher.published();
    assert_eq!(published[0].topic, "orders");
    assert_eq!(published[0].key.as_deref(), Some("a"));
    assert_eq!(published[1].topic, "payments");

    let payload: serde_json::Value = serde_json::from_slice(&published[1].payload).unwrap();
    assert_eq!(payload["message"], "b");
    assert_eq!(fixture.stored_offset().await, LineOffset::new(2));
}

#[tokio::test]
async fn test_rerun_without_new_lines_publishes_nothing() {
    let a = event("orders", "a");
    let b = event("orders", "b");
    let fixture = Fixture::new(&[&a, &b]);

    fixture
        .context(Arc::new(RecordingPublisher::new()))
        .run_pass()
        .await
        .unwrap();

    let publisher = Arc::new(RecordingPublisher::new());
    let report = fixture.context(publisher.clone()).run_pass().await.unwrap();

    assert_eq!(publisher.attempts(), 0);
    assert_eq!(report.new_lines(), 0);
    assert_eq!(fixture.stored_offset().await, LineOffset::new(2));
}

#[tokio::test]
async fn test_appended_lines_are_published_once() {
    let first = event("orders", "first");
    let fixture = Fixture::new(&[&first]);
    let publisher = Arc::new(RecordingPublisher::new());
    let context = fixture.context(publisher.clone());

    context.run_pass().await.unwrap();

    let second = event("orders", "second");
    let third = event("audit", "third");
    fixture.append(&[&second, &third]);

    let report = context.run_pass().await.unwrap();
    assert_eq!(report.start_offset, LineOffset::new(1));
    assert_eq!(report.end_offset, LineOffset::new(3));

    let keys: Vec<_> = publisher
        .published()
        .into_iter()
        .map(|m| m.key.unwrap_or_default())
        .collect();
    assert_eq!(keys, vec!["first", "second", "third"]);
    assert_eq!(fixture.stored_offset().await, LineOffset::new(3));
}

#[tokio::test]
async fn test_malformed_line_is_isolated() {
    let a = event("orders", "a");
    let c = event("orders", "c");
    let fixture = Fixture::new(&[&a, "{not json", &c]);
    let publisher = Arc::new(RecordingPublisher::new());

    let report = fixture.context(publisher.clone()).run_pass().await.unwrap();

    assert_eq!(report.published, 2);
    assert_eq!(report.parse_failures, 1);
    assert_eq!(publisher.published().len(), 2);
    assert_eq!(fixture.failure_lines(), vec!["{not json"]);
    assert_eq!(fixture.stored_offset().await, LineOffset::new(3));
}

#[tokio::test]
async fn test_line_without_topic_goes_to_failure_file() {
    let missing = r#"{"message":"no topic here"}"#;
    let empty = r#"{"topic":"","message":"x"}"#;
    let fixture = Fixture::new(&[missing, empty]);
    let publisher = Arc::new(RecordingPublisher::new());

    let report = fixture.context(publisher.clone()).run_pass().await.unwrap();

    assert_eq!(report.parse_failures, 2);
    assert_eq!(publisher.attempts(), 0);
    assert_eq!(fixture.failure_lines(), vec![missing, empty]);
    assert_eq!(fixture.stored_offset().await, LineOffset::new(2));
}

#[tokio::test]
async fn test_publish_failure_does_not_stop_the_pass() {
    let a = event("orders", "a");
    let b = event("orders", "b");
    let c = event("orders", "c");
    let fixture = Fixture::new(&[&a, &b, &c]);
    let publisher = Arc::new(RecordingPublisher::new().fail_attempt(2));

    let report = fixture.context(publisher.clone()).run_pass().await.unwrap();

    assert_eq!(report.published, 2);
    assert_eq!(report.publish_failures, 1);
    assert_eq!(publisher.attempts(), 3);
    assert_eq!(fixture.failure_lines(), vec![b]);
    // Failed lines are not retried by later passes
    assert_eq!(fixture.stored_offset().await, LineOffset::new(3));
}

#[tokio::test]
async fn test_missing_offset_file_starts_from_the_beginning() {
    let a = event("orders", "a");
    let fixture = Fixture::new(&[&a]);
    assert!(!fixture.offset_path.exists());

    let publisher = Arc::new(RecordingPublisher::new());
    let report = fixture.context(publisher.clone()).run_pass().await.unwrap();

    assert_eq!(report.start_offset, LineOffset::ZERO);
    assert_eq!(publisher.published().len(), 1);
    assert!(fixture.offset_path.exists());
}

#[tokio::test]
async fn test_corrupt_offset_file_aborts_before_publishing() {
    let a = event("orders", "a");
    let fixture = Fixture::new(&[&a]);
    std::fs::create_dir_all(fixture.offset_path.parent().unwrap()).unwrap();
    std::fs::write(&fixture.offset_path, "not a number").unwrap();

    let publisher = Arc::new(RecordingPublisher::new());
    let err = fixture
        .context(publisher.clone())
        .run_pass()
        .await
        .unwrap_err();

    assert!(matches!(err, PassError::LoadOffset(ref e) if e.is_corrupt()));
    assert_eq!(publisher.attempts(), 0);
    assert_eq!(
        std::fs::read_to_string(&fixture.offset_path).unwrap(),
        "not a number"
    );
    assert!(!fixture.failure_path.exists());
}

#[tokio::test]
async fn test_missing_log_is_fatal_and_keeps_offset() {
    let fixture = Fixture::new(&[]);
    FilesystemStore::new(&fixture.offset_path)
        .store(LineOffset::new(7))
        .await
        .unwrap();
    std::fs::remove_file(&fixture.log_path).unwrap();

    let err = fixture
        .context(Arc::new(RecordingPublisher::new()))
        .run_pass()
        .await
        .unwrap_err();

    assert!(matches!(err, PassError::OpenLog { .. }));
    assert_eq!(fixture.stored_offset().await, LineOffset::new(7));
}

#[tokio::test]
async fn test_empty_log_stores_zero() {
    let fixture = Fixture::new(&[]);
    let publisher = Arc::new(RecordingPublisher::new());

    let report = fixture.context(publisher.clone()).run_pass().await.unwrap();

    assert_eq!(report.end_offset, LineOffset::ZERO);
    assert_eq!(publisher.attempts(), 0);
    assert_eq!(fixture.stored_offset().await, LineOffset::ZERO);
}

#[tokio::test]
async fn test_shutdown_closes_publisher() {
    let fixture = Fixture::new(&[]);
    let publisher = Arc::new(RecordingPublisher::new());
    let context = fixture.context(publisher.clone());

    context.shutdown().await.unwrap();
    assert!(publisher.is_closed());
}
