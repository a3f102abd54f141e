// SPDX-License-Identifier: MIT

//! End-to-end scenarios driving the full stack (driver, merger, checkpoint
//! store, output writer) against a mocked transcription endpoint.

use std::collections::BTreeSet;
use std::time::Duration;

use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use tw_adapters::{MediaHelper, TranscribeClient};
use tw_core::{CheckpointState, Config};
use tw_engine::{FileDriver, StopSignal};
use tw_storage::CheckpointStore;

fn scenario_config(root: &std::path::Path, whisper_url: String) -> Config {
    Config {
        whisper_url,
        whisper_model: "base".to_string(),
        whisper_language: None,
        whisper_response_format: "verbose_json".to_string(),
        whisper_stream: true,

        input_dir: root.join("input"),
        output_dir: root.join("output"),
        log_dir: root.join("logs"),
        checkpoint_dir: root.join("checkpoints"),
        temp_dir: root.join("temp"),

        supported_formats: BTreeSet::from([".wav".to_string()]),

        check_interval_sec: 10,
        max_retries: 3,
        retry_delay_base_sec: 0.01,
        request_timeout_sec: 5,
        connect_timeout_sec: 5,
        server_wait_timeout_sec: 5,
        progress_log_every_sec: 60,
        checkpoint_save_interval_sec: 0,

        resume_enabled: false,
        resume_overlap_sec: 2.0,
        resume_min_last_end_sec: 5.0,

        rename_failed: true,
        complete_at_percent: 0.98,

        vad_enabled: false,
        log_level: "error".to_string(),
    }
}

fn make_input(root: &std::path::Path, name: &str) -> std::path::PathBuf {
    std::fs::create_dir_all(root.join("input")).unwrap();
    std::fs::create_dir_all(root.join("output")).unwrap();
    std::fs::create_dir_all(root.join("checkpoints")).unwrap();
    std::fs::create_dir_all(root.join("temp")).unwrap();
    let path = root.join("input").join(name);
    std::fs::write(&path, b"fake-audio").unwrap();
    path
}

/// Scenario 1: happy path, no resume needed.
#[tokio::test]
async fn happy_path_completes_and_renames_the_source() {
    let server = MockServer::start().await;
    let body = concat!(
        "data: {\"segments\":[",
        "{\"start\":0.0,\"end\":2.0,\"text\":\"a\"},",
        "{\"start\":2.0,\"end\":5.0,\"text\":\"b\"},",
        "{\"start\":5.0,\"end\":60.0,\"text\":\"c\"}",
        "],\"text\":\"a b c\"}\n\n",
        "data: [DONE]\n\n",
    );
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let input = make_input(dir.path(), "meeting.wav");
    let config = scenario_config(dir.path(), format!("{}/v1/audio/transcriptions", server.uri()));
    let checkpoints = CheckpointStore::new(config.checkpoint_dir.clone());
    let media = MediaHelper::new();
    let stop = StopSignal::new();
    let client = TranscribeClient::new(
        config.whisper_url.clone(),
        Duration::from_secs(5),
        Duration::from_secs(5),
    )
    .unwrap();
    let driver = FileDriver::new(&config, &client, &media, &checkpoints, &stop);

    driver.process(&input).await.unwrap();

    assert!(!input.exists());
    assert!(config.input_dir.join("processed_meeting.wav").exists());

    let transcript = std::fs::read_to_string(config.output_dir.join("meeting.txt")).unwrap();
    assert_eq!(transcript, "a b c\n");

    let timestamped = std::fs::read_to_string(config.output_dir.join("meeting_timestamped.txt")).unwrap();
    assert!(timestamped.contains("[00000.000 - 00002.000] a"));
    assert!(timestamped.contains("[00002.000 - 00005.000] b"));
    assert!(timestamped.contains("[00005.000 - 00060.000] c"));

    assert!(checkpoints.load(&checkpoints.path_for("meeting.wav")).is_none());
}

/// Scenario 3: a truncated checkpoint is treated as absent, not fatal.
#[tokio::test]
async fn corrupt_checkpoint_is_discarded_and_processing_starts_fresh() {
    let server = MockServer::start().await;
    let body = concat!(
        "data: {\"segments\":[{\"start\":0.0,\"end\":1.0,\"text\":\"hello\"}],\"text\":\"hello\"}\n\n",
        "data: [DONE]\n\n",
    );
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let input = make_input(dir.path(), "note.wav");
    let config = scenario_config(dir.path(), format!("{}/v1/audio/transcriptions", server.uri()));
    let checkpoints = CheckpointStore::new(config.checkpoint_dir.clone());
    std::fs::write(checkpoints.path_for("note.wav"), b"{ not json").unwrap();

    let media = MediaHelper::new();
    let stop = StopSignal::new();
    let client = TranscribeClient::new(
        config.whisper_url.clone(),
        Duration::from_secs(5),
        Duration::from_secs(5),
    )
    .unwrap();
    let driver = FileDriver::new(&config, &client, &media, &checkpoints, &stop);

    driver.process(&input).await.unwrap();

    let transcript = std::fs::read_to_string(config.output_dir.join("note.txt")).unwrap();
    assert_eq!(transcript, "hello\n");
}

/// Scenario 5: permanent failure after exhausting retries.
#[tokio::test]
async fn every_attempt_failing_ends_in_permanent_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let input = make_input(dir.path(), "broken.wav");
    let config = scenario_config(dir.path(), format!("{}/v1/audio/transcriptions", server.uri()));
    let checkpoints = CheckpointStore::new(config.checkpoint_dir.clone());
    let media = MediaHelper::new();
    let stop = StopSignal::new();
    let client = TranscribeClient::new(
        config.whisper_url.clone(),
        Duration::from_secs(5),
        Duration::from_secs(5),
    )
    .unwrap();
    let driver = FileDriver::new(&config, &client, &media, &checkpoints, &stop);

    driver.process(&input).await.unwrap();

    assert!(!input.exists());
    assert!(config.input_dir.join("failed_broken.wav").exists());
    assert!(!config.output_dir.join("broken.txt").exists());

    let record = checkpoints
        .load(&checkpoints.path_for("broken.wav"))
        .expect("permanently failed checkpoint is kept, not deleted");
    assert_eq!(record.state, CheckpointState::PermanentFailed);
    assert_eq!(record.attempts, config.max_retries);
}

/// Scenario 6: a zero-segment stream with unknown duration still requires a
/// non-empty transcript to succeed.
#[tokio::test]
async fn an_empty_stream_never_counts_as_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("data: [DONE]\n\n", "text/event-stream"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let input = make_input(dir.path(), "silence.wav");
    let mut config = scenario_config(dir.path(), format!("{}/v1/audio/transcriptions", server.uri()));
    config.max_retries = 1;
    let checkpoints = CheckpointStore::new(config.checkpoint_dir.clone());
    let media = MediaHelper::new();
    let stop = StopSignal::new();
    let client = TranscribeClient::new(
        config.whisper_url.clone(),
        Duration::from_secs(5),
        Duration::from_secs(5),
    )
    .unwrap();
    let driver = FileDriver::new(&config, &client, &media, &checkpoints, &stop);

    driver.process(&input).await.unwrap();

    assert!(config.input_dir.join("failed_silence.wav").exists());
    assert!(!config.output_dir.join("silence.txt").exists());
}
