// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use futures::stream;
use rivulet_core::RivuletError;
use rivulet_stream::{PrefetchConfig, PrefetchExt};
use rivulet_test_utils::helpers::{assert_stream_ended, collect_values, unwrap_error, unwrap_value};
use rivulet_test_utils::{failing, test_channel, values, DisposeTracker, ErrorInjectingStream};
use std::time::Duration;
use tokio::time::sleep;

#[tokio::test]
async fn test_prefetch_preserves_order() -> anyhow::Result<()> {
    // Arrange
    let stream = values(0..100).prefetch(PrefetchConfig::new(8));

    // Act
    let (items, error) = collect_values(stream).await;

    // Assert
    assert_eq!(items, (0..100).collect::<Vec<_>>());
    assert!(error.is_none());

    Ok(())
}

#[tokio::test]
async fn test_prefetch_reads_at_most_one_window_ahead() -> anyhow::Result<()> {
    // Arrange
    let tracker = DisposeTracker::new();
    let mut stream = tracker
        .track(values(0..100))
        .prefetch(PrefetchConfig::new(8).with_low_water_mark(2));

    // Act
    assert_eq!(unwrap_value(&mut stream, 500).await, 0);
    sleep(Duration::from_millis(50)).await;

    // Assert
    let polls = tracker.polls();
    assert!((8..=9).contains(&polls), "pulled {polls} items");

    Ok(())
}

#[tokio::test]
async fn test_prefetch_refills_at_low_water_mark() -> anyhow::Result<()> {
    // Arrange
    let tracker = DisposeTracker::new();
    let mut stream = tracker
        .track(values(0..100))
        .prefetch(PrefetchConfig::new(8).with_low_water_mark(2));
    assert_eq!(unwrap_value(&mut stream, 500).await, 0);
    sleep(Duration::from_millis(50)).await;
    let before = tracker.polls();

    // Act
    for expected in 1..7 {
        assert_eq!(unwrap_value(&mut stream, 500).await, expected);
    }
    sleep(Duration::from_millis(50)).await;

    // Assert
    let after = tracker.polls();
    assert!(after > before, "window was not refilled");
    assert!(after <= 7 + 8, "pulled {after} items");

    Ok(())
}

#[tokio::test]
async fn test_prefetch_forwards_error_after_values() -> anyhow::Result<()> {
    // Arrange
    let stream = failing(vec![1, 2], "boom").prefetch(PrefetchConfig::new(4));

    // Act
    let (items, error) = collect_values(stream).await;

    // Assert
    assert_eq!(items, vec![1, 2]);
    assert!(matches!(
        error,
        Some(RivuletError::StreamProcessingError { context }) if context == "boom"
    ));

    Ok(())
}

#[tokio::test]
async fn test_prefetch_stops_reading_after_error() -> anyhow::Result<()> {
    // Arrange
    let source = ErrorInjectingStream::new(stream::iter(vec![1, 2, 3, 4]), 2);
    let stream = source.prefetch(PrefetchConfig::new(8));

    // Act
    let (items, error) = collect_values(stream).await;

    // Assert
    assert_eq!(items, vec![1, 2]);
    assert!(error.is_some());

    Ok(())
}

#[tokio::test]
async fn test_prefetch_rejects_zero_window() -> anyhow::Result<()> {
    // Arrange
    let mut stream = values(vec![1]).prefetch(PrefetchConfig::new(0));

    // Act
    let error = unwrap_error(&mut stream, 500).await;

    // Assert
    assert!(matches!(error, RivuletError::InvalidState { .. }));
    assert_stream_ended(&mut stream, 500).await;

    Ok(())
}

#[test]
fn test_low_water_mark_must_be_below_window() {
    assert!(PrefetchConfig::new(4).with_low_water_mark(4).validate().is_err());
    assert!(PrefetchConfig::new(4).with_low_water_mark(3).validate().is_ok());
    assert_eq!(PrefetchConfig::new(32).resume_at(), 8);
    assert_eq!(PrefetchConfig::default().prefetch, 32);
}

#[tokio::test]
async fn test_prefetch_starts_on_first_poll() -> anyhow::Result<()> {
    // Arrange
    let tracker = DisposeTracker::new();
    let mut stream = tracker.track(values(vec![1, 2])).prefetch(PrefetchConfig::new(4));
    sleep(Duration::from_millis(20)).await;
    assert_eq!(tracker.opened(), 0);

    // Act
    let first = unwrap_value(&mut stream, 500).await;

    // Assert
    assert_eq!(first, 1);
    assert_eq!(tracker.opened(), 1);

    Ok(())
}

#[tokio::test]
async fn test_dropping_prefetch_disposes_source() -> anyhow::Result<()> {
    // Arrange
    let tracker = DisposeTracker::new();
    let (tx, source) = test_channel::<i32>();
    let mut stream = tracker.track(source).prefetch(PrefetchConfig::new(4));
    tx.send(1)?;
    assert_eq!(unwrap_value(&mut stream, 500).await, 1);

    // Act
    drop(stream);

    // Assert
    for _ in 0..10 {
        if tracker.dropped() == 1 {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert_eq!(tracker.dropped(), 1);

    Ok(())
}
