// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use futures::stream::{self, StreamExt};
use rivulet_core::{RivuletError, StreamItem};
use rivulet_stream::{SwitchExt, SwitchMapExt};
use rivulet_test_utils::helpers::{
    assert_no_element_emitted, assert_stream_ended, collect_values, unwrap_error, unwrap_value,
};
use rivulet_test_utils::{failing, scripted, test_channel, test_channel_with_errors, values, DisposeTracker};
use tokio::time::pause;

#[tokio::test]
async fn test_switch_map_follows_newest_inner() -> anyhow::Result<()> {
    // Arrange
    pause();
    let outer = scripted(vec![(0, StreamItem::Value(1u64)), (150, StreamItem::Value(2))]);
    let stream = outer.switch_map(|v| {
        scripted(vec![
            (100, StreamItem::Value(v * 10)),
            (100, StreamItem::Value(v * 10 + 1)),
            (100, StreamItem::Value(v * 10 + 2)),
        ])
    });

    // Act
    let (items, error) = collect_values(stream).await;

    // Assert
    assert_eq!(items, vec![10, 20, 21, 22]);
    assert!(error.is_none());

    Ok(())
}

#[tokio::test]
async fn test_replaced_inner_is_disposed() -> anyhow::Result<()> {
    // Arrange
    let tracker = DisposeTracker::new();
    let inners = tracker.clone();
    let (tx, outer) = test_channel::<i32>();
    let mut stream = outer.switch_map(move |v| {
        inners.track(stream::iter(vec![StreamItem::Value(v)]).chain(stream::pending()))
    });

    // Act
    tx.send(1)?;
    assert_eq!(unwrap_value(&mut stream, 500).await, 1);
    assert_eq!(tracker.dropped(), 0);
    tx.send(2)?;
    assert_eq!(unwrap_value(&mut stream, 500).await, 2);

    // Assert
    assert_eq!(tracker.opened(), 2);
    assert_eq!(tracker.dropped(), 1);

    Ok(())
}

#[tokio::test]
async fn test_ready_values_switch_before_inner_runs() -> anyhow::Result<()> {
    // Arrange
    let stream = values(1..=3).switch_map(|v| values(vec![v * 10]));

    // Act
    let (items, error) = collect_values(stream).await;

    // Assert
    assert_eq!(items, vec![30]);
    assert!(error.is_none());

    Ok(())
}

#[tokio::test]
async fn test_output_waits_for_last_inner_after_upstream_ends() -> anyhow::Result<()> {
    // Arrange
    pause();
    let stream = values(vec![1u64]).switch_map(|v| {
        scripted(vec![(100, StreamItem::Value(v)), (100, StreamItem::Value(v + 1))])
    });

    // Act
    let (items, error) = collect_values(stream).await;

    // Assert
    assert_eq!(items, vec![1, 2]);
    assert!(error.is_none());

    Ok(())
}

#[tokio::test]
async fn test_upstream_error_drops_current_inner() -> anyhow::Result<()> {
    // Arrange
    let tracker = DisposeTracker::new();
    let inners = tracker.clone();
    let (tx, outer) = test_channel_with_errors::<i32>();
    let mut stream = outer.switch_map(move |_| inners.track(stream::pending::<StreamItem<i32>>()));
    tx.send(StreamItem::Value(1))?;
    assert_no_element_emitted(&mut stream, 20).await;

    // Act
    tx.send(StreamItem::Error(RivuletError::stream_error("outer")))?;
    let error = unwrap_error(&mut stream, 500).await;

    // Assert
    assert!(error.to_string().contains("outer"));
    assert_eq!(tracker.dropped(), 1);
    assert_stream_ended(&mut stream, 500).await;

    Ok(())
}

#[tokio::test]
async fn test_inner_error_ends_output() -> anyhow::Result<()> {
    // Arrange
    let (tx, outer) = test_channel::<i32>();
    let mut stream = outer.switch_map(|v| failing(vec![v], "inner"));

    // Act
    tx.send(7)?;

    // Assert
    assert_eq!(unwrap_value(&mut stream, 500).await, 7);
    assert!(unwrap_error(&mut stream, 500).await.to_string().contains("inner"));
    tx.send(8)?;
    assert_stream_ended(&mut stream, 500).await;

    Ok(())
}

#[tokio::test]
async fn test_switch_over_stream_of_streams() -> anyhow::Result<()> {
    // Arrange
    pause();
    let first = scripted(vec![(50, StreamItem::Value(1)), (100, StreamItem::Value(2))]);
    let second = scripted(vec![(0, StreamItem::Value(3))]);
    let outer = scripted(vec![(0, StreamItem::Value(first)), (100, StreamItem::Value(second))]);

    // Act
    let (items, error) = collect_values(outer.switch()).await;

    // Assert
    assert_eq!(items, vec![1, 3]);
    assert!(error.is_none());

    Ok(())
}
