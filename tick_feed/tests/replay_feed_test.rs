use std::{io::Write, time::Duration};

use tempfile::NamedTempFile;
use tick_feed::providers::{FeedError, TickFeed, replay::ReplayFeed};

fn capture(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
    file.flush().unwrap();
    file
}

#[tokio::test]
async fn replays_matching_lines_in_order() {
    let file = capture(&[
        r#"{"symbol":"HBL","timestamp":1000,"tick":{"o":10,"h":11,"l":9,"c":10}}"#,
        r#"{"symbol":"UBL","timestamp":2000,"tick":{"o":50,"h":50,"l":50,"c":50}}"#,
        "",
        "this is not json",
        r#"{"timestamp":30000,"tick":{"o":10,"h":12,"l":9,"c":11}}"#,
        r#"{"symbol":"hbl","timestamp":61000,"tick":{"o":11,"h":11,"l":10,"c":10.5}}"#,
    ]);

    let feed = ReplayFeed::new(file.path());
    let mut sub = feed.subscribe("HBL").await.unwrap();

    let mut stamps = Vec::new();
    while let Some(ev) = sub.recv().await {
        stamps.push(ev.timestamp.unwrap());
    }
    assert_eq!(stamps, vec![1000, 30000, 61000]);
}

#[tokio::test]
async fn paced_replay_still_completes() {
    let file = capture(&[
        r#"{"timestamp":1,"tick":{"c":1}}"#,
        r#"{"timestamp":2,"tick":{"c":2}}"#,
    ]);
    let feed = ReplayFeed::new(file.path()).with_pace(Duration::from_millis(5));
    let mut sub = feed.subscribe("FFC").await.unwrap();
    let mut n = 0;
    while sub.recv().await.is_some() {
        n += 1;
    }
    assert_eq!(n, 2);
}

#[tokio::test]
async fn missing_capture_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let feed = ReplayFeed::new(dir.path().join("nope.jsonl"));
    match feed.subscribe("HBL").await {
        Err(FeedError::Io { path, .. }) => assert!(path.ends_with("nope.jsonl")),
        other => panic!("expected Io error, got {other:?}"),
    }
}
