#![cfg(test)]
use std::time::Duration;

use serial_test::serial;
use tick_feed::providers::{TickFeed, psx_rest::provider::PsxTickFeed};

#[tokio::test]
#[serial]
#[ignore]
async fn test_psx_fetch_tick() {
    let feed = PsxTickFeed::new().expect("Failed to create PsxTickFeed");

    let result = feed.fetch_tick("HBL").await;
    assert!(result.is_ok(), "fetch_tick returned an error: {:?}", result.err());

    if let Some(quote) = result.unwrap() {
        assert!(!quote.is_empty(), "Expected at least one price field");
    }
}

#[tokio::test]
#[serial]
#[ignore]
async fn test_psx_subscription_delivers_stamped_ticks() {
    let feed = PsxTickFeed::new()
        .expect("Failed to create PsxTickFeed")
        .with_poll_interval(Duration::from_millis(500))
        .expect("valid poll interval");

    let mut sub = feed.subscribe("UBL").await.expect("subscribe");
    let event = tokio::time::timeout(Duration::from_secs(15), sub.recv())
        .await
        .expect("no tick within 15s")
        .expect("subscription ended");
    assert_eq!(event.symbol.as_deref(), Some("UBL"));
    assert!(event.timestamp.is_some());
    sub.close();
}
