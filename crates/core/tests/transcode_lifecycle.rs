//! Transcode job integration tests.
//!
//! These run real `sh`/`cat` children through the decoder/encoder chain:
//! - Tag injection into the encoder argument vector
//! - Remote sources fetched over HTTP
//! - Cleanup sets applied per outcome
//! - Pre-launch failures leave no temp files behind

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use transkode_core::{
    config::StagingConfig,
    testing::MockTagReader,
    CodecCommand, CodecRegistry, EncoderEntry, FileStaging, Job, JobContext, JobError,
    JobRequest, JobState, TagField, TagSet, TranscodeJob,
};

/// Test helper holding scratch directories and a job context.
struct TestHarness {
    context: Arc<JobContext>,
    tag_reader: MockTagReader,
    staging_dir: PathBuf,
    source_dir: TempDir,
    _temp_dir: TempDir,
}

impl TestHarness {
    fn new(registry: CodecRegistry) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let source_dir = TempDir::new().expect("Failed to create source dir");
        let staging_dir = temp_dir.path().join("staging");

        let staging = FileStaging::new(StagingConfig {
            temp_dir: staging_dir.clone(),
            ..Default::default()
        })
        .expect("Failed to create staging");

        let tag_reader = MockTagReader::new();
        let context = Arc::new(
            JobContext::new(registry, staging).with_tag_reader(Arc::new(tag_reader.clone())),
        );

        Self {
            context,
            tag_reader,
            staging_dir,
            source_dir,
            _temp_dir: temp_dir,
        }
    }

    /// Swaps in a new registry, keeping staging and the tag reader.
    fn use_registry(&mut self, registry: CodecRegistry) {
        self.context = Arc::new(
            JobContext::new(registry, self.context.staging().clone())
                .with_tag_reader(Arc::new(self.tag_reader.clone())),
        );
    }

    fn source(&self, name: &str, contents: &str) -> String {
        let path = self.source_dir.path().join(name);
        std::fs::write(&path, contents).expect("Failed to write source");
        path.to_string_lossy().into_owned()
    }

    /// Writes an executable shell script into the source dir.
    fn script(&self, name: &str, body: &str) -> String {
        let path = self.source_dir.path().join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("Failed to write script");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("Failed to chmod script");
        path.to_string_lossy().into_owned()
    }

    fn job(&self, source: impl Into<String>, format: &str) -> TranscodeJob {
        TranscodeJob::new(JobRequest::new(source, format), self.context.clone())
    }

    fn staged_files(&self) -> Vec<PathBuf> {
        match std::fs::read_dir(&self.staging_dir) {
            Ok(entries) => entries.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
            Err(_) => Vec::new(),
        }
    }
}

fn cat_registry() -> CodecRegistry {
    CodecRegistry::empty()
        .with_decoder("txt", CodecCommand::new(["cat"]))
        .with_encoder("out", EncoderEntry::new(CodecCommand::new(["cat"])))
}

async fn wait_for(job: &mut TranscodeJob) {
    for _ in 0..500 {
        if job.is_finished() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {} did not finish", job.id());
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).expect("Failed to read file")
}

#[tokio::test]
async fn test_tags_injected_after_program() {
    let mut harness = TestHarness::new(CodecRegistry::empty());
    let encoder = harness.script("echo-args.sh", "cat > /dev/null\nprintf '%s\\n' \"$@\"");

    let registry = cat_registry().with_encoder(
        "tagged",
        EncoderEntry::new(CodecCommand::new([encoder.as_str(), "--abr", "128", "-", "-"]))
            .with_tag(TagField::Album, "--tl")
            .with_tag(TagField::Title, "--tt")
            .with_tag(TagField::Comment, "--comment=comment=%s"),
    );
    harness.use_registry(registry);
    harness
        .tag_reader
        .set_tags(Some(
            TagSet::new()
                .with(TagField::Title, "Bar")
                .with(TagField::Album, "Foo")
                .with(TagField::Comment, "ripped")
                .with(TagField::Genre, "Jazz"),
        ))
        .await;

    let source = harness.source("song.TXT", "pcm");
    let mut job = harness.job(source.clone(), "tagged");
    job.start().await;
    wait_for(&mut job).await;

    assert_eq!(job.state(), JobState::FinishedOk, "{:?}", job.error_message());
    let args: Vec<String> = read(job.output_path().unwrap())
        .lines()
        .map(String::from)
        .collect();
    assert_eq!(
        args,
        ["--tl", "Foo", "--tt", "Bar", "--comment=comment=ripped", "--abr", "128", "-", "-"]
    );

    let calls = harness.tag_reader.recorded_calls().await;
    assert_eq!(calls, [(PathBuf::from(source), "txt".to_string())]);
}

#[tokio::test]
async fn test_untagged_encoder_skips_tag_reader() {
    let harness = TestHarness::new(cat_registry());
    harness
        .tag_reader
        .set_tags(Some(TagSet::new().with(TagField::Album, "Foo")))
        .await;

    let mut job = harness.job(harness.source("a.txt", "plain"), "out");
    job.start().await;
    wait_for(&mut job).await;

    assert!(job.succeeded());
    assert_eq!(read(job.output_path().unwrap()), "plain");
    assert!(harness.tag_reader.recorded_calls().await.is_empty());
}

#[tokio::test]
async fn test_success_cleanup_keeps_only_output() {
    let harness = TestHarness::new(cat_registry());
    let mut job = harness.job(harness.source("a.txt", "data"), "OUT");
    job.start().await;
    wait_for(&mut job).await;
    assert!(job.succeeded());

    let output = job.output_path().unwrap().to_path_buf();
    let name = output.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("transcode-"));
    assert!(name.ends_with(".out"));
    assert!(job.output_url().unwrap().starts_with("file:///"));

    job.cleanup();
    assert_eq!(harness.staged_files(), [output]);
}

#[tokio::test]
async fn test_failure_cleanup_keeps_only_log() {
    let mut harness = TestHarness::new(cat_registry());
    let encoder = harness.script("fail.sh", "cat > /dev/null\necho 'bad bitrate' >&2\nexit 1");
    let registry =
        cat_registry().with_encoder("out", EncoderEntry::new(CodecCommand::new([encoder])));
    harness.use_registry(registry);

    let mut job = harness.job(harness.source("a.txt", "data"), "out");
    job.start().await;
    wait_for(&mut job).await;

    assert_eq!(job.state(), JobState::FinishedError);
    assert!(job.error_message().unwrap().contains("bad bitrate"));
    let log = job.error_log_path().unwrap().to_path_buf();

    job.cleanup();
    assert_eq!(harness.staged_files(), [log.clone()]);
    assert!(read(&log).contains("bad bitrate"));
}

#[tokio::test]
async fn test_remote_source_is_fetched_and_removed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/music/song.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"remote bytes".to_vec()))
        .mount(&server)
        .await;

    let harness = TestHarness::new(cat_registry());
    let mut job = harness.job(format!("{}/music/song.txt", server.uri()), "out");
    job.start().await;
    wait_for(&mut job).await;

    assert!(job.succeeded(), "{:?}", job.error_message());
    let output = job.output_path().unwrap().to_path_buf();
    assert_eq!(read(&output), "remote bytes");
    assert_eq!(harness.staged_files().len(), 3);

    job.cleanup();
    assert_eq!(harness.staged_files(), [output]);
}

#[tokio::test]
async fn test_remote_fetch_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let harness = TestHarness::new(cat_registry());
    let mut job = harness.job(format!("{}/missing.txt", server.uri()), "out");
    job.start().await;

    assert!(job.is_finished());
    assert!(matches!(job.error(), Some(JobError::Staging { .. })));
    assert!(job.error_message().unwrap().contains("404"));

    job.cleanup();
    assert!(harness.staged_files().is_empty());
}

#[tokio::test]
async fn test_pre_launch_failures_create_no_files() {
    let mut harness = TestHarness::new(cat_registry());
    let source = harness.source("a.txt", "data");

    let mut unsupported = harness.job(source.clone(), "wma");
    unsupported.start().await;
    assert!(unsupported.is_finished());
    assert!(unsupported.error().unwrap().is_pre_launch());

    let registry = cat_registry().with_encoder(
        "out",
        EncoderEntry::new(
            CodecCommand::new(["transkode-missing-encoder", "-"]).with_package("missing-tools"),
        ),
    );
    harness.use_registry(registry);
    let mut missing = harness.job(source, "out");
    missing.start().await;
    assert!(missing.is_finished());
    assert!(missing
        .error_message()
        .unwrap()
        .contains("install the 'missing-tools' package"));

    assert!(harness.staged_files().is_empty());
}
