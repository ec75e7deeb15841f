// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use futures::{stream, Stream, StreamExt};
use rivulet_core::{RivuletError, StreamItem};
use rivulet_stream_time::prelude::*;
use rivulet_test_utils::helpers::{
    assert_no_element_emitted, assert_stream_ended, collect_values, unwrap_error, unwrap_value,
};
use rivulet_test_utils::{test_channel, test_channel_with_errors, values};
use std::time::Duration;
use tokio::time::{advance, pause};

#[tokio::test]
async fn test_debounce_emits_after_quiet_period() -> anyhow::Result<()> {
    // Arrange
    pause();
    let (tx, stream) = test_channel::<&str>();
    let mut debounced = Box::pin(stream.debounce(Duration::from_millis(500), false));

    // Act & Assert
    tx.send("alice")?;
    assert_no_element_emitted(&mut debounced, 0).await;

    advance(Duration::from_millis(100)).await;
    assert_no_element_emitted(&mut debounced, 0).await;

    advance(Duration::from_millis(300)).await;
    assert_no_element_emitted(&mut debounced, 0).await;

    advance(Duration::from_millis(100)).await;
    assert_eq!(unwrap_value(&mut debounced, 100).await, "alice");

    Ok(())
}

#[tokio::test]
async fn test_debounce_resets_on_new_value() -> anyhow::Result<()> {
    // Arrange
    pause();
    let (tx, stream) = test_channel::<&str>();
    let mut debounced = Box::pin(stream.debounce(Duration::from_millis(500), false));

    // Act & Assert
    tx.send("alice")?;
    assert_no_element_emitted(&mut debounced, 0).await;
    advance(Duration::from_millis(300)).await;
    assert_no_element_emitted(&mut debounced, 0).await;

    tx.send("bob")?;
    assert_no_element_emitted(&mut debounced, 0).await;

    advance(Duration::from_millis(300)).await;
    assert_no_element_emitted(&mut debounced, 0).await;

    advance(Duration::from_millis(200)).await;
    assert_eq!(unwrap_value(&mut debounced, 100).await, "bob");
    assert_no_element_emitted(&mut debounced, 1_000).await;

    Ok(())
}

#[tokio::test]
async fn test_pending_value_dropped_on_completion_without_emit_last() -> anyhow::Result<()> {
    // Arrange
    pause();
    let source = values(vec![42]);

    // Act
    let (items, error) = collect_values(source.debounce(Duration::from_millis(100), false)).await;

    // Assert
    assert!(items.is_empty());
    assert!(error.is_none());

    Ok(())
}

#[tokio::test]
async fn test_pending_value_emitted_on_completion_with_emit_last() -> anyhow::Result<()> {
    // Arrange
    pause();
    let source = values(vec![42]);

    // Act
    let (items, error) = collect_values(source.debounce(Duration::from_millis(100), true)).await;

    // Assert
    assert_eq!(items, vec![42]);
    assert!(error.is_none());

    Ok(())
}

#[tokio::test]
async fn test_emit_last_flushes_before_completion() -> anyhow::Result<()> {
    // Arrange
    pause();
    let (tx, stream) = test_channel::<i32>();
    let mut debounced = Box::pin(stream.debounce(Duration::from_secs(10), true));

    // Act
    tx.send(1)?;
    tx.send(2)?;
    assert_no_element_emitted(&mut debounced, 0).await;
    drop(tx);

    // Assert
    assert_eq!(unwrap_value(&mut debounced, 100).await, 2);
    assert_stream_ended(&mut debounced, 100).await;

    Ok(())
}

#[tokio::test]
async fn test_error_drops_pending_value() -> anyhow::Result<()> {
    // Arrange
    pause();
    let (tx, stream) = test_channel_with_errors::<i32>();
    let mut debounced = Box::pin(stream.debounce(Duration::from_millis(100), true));

    // Act
    tx.send(StreamItem::Value(1))?;
    assert_no_element_emitted(&mut debounced, 0).await;
    tx.send(StreamItem::Error(RivuletError::stream_error("upstream")))?;

    // Assert
    let error = unwrap_error(&mut debounced, 10).await;
    assert!(error.to_string().contains("upstream"));
    assert_stream_ended(&mut debounced, 500).await;

    Ok(())
}

/// Values `0..count`, each produced after blocking the thread for `step`, so the
/// stream never returns `Pending`.
fn busy_source(count: i32, step: Duration) -> impl Stream<Item = StreamItem<i32>> + Unpin {
    stream::iter(0..count).map(move |value| {
        std::thread::sleep(step);
        StreamItem::Value(value)
    })
}

#[tokio::test]
async fn test_debounce_emits_values_spaced_beyond_delay_by_busy_upstream() -> anyhow::Result<()> {
    // Arrange
    let source = busy_source(6, Duration::from_millis(5));

    // Act
    let (items, error) = collect_values(source.debounce(Duration::from_millis(2), false)).await;

    // Assert
    assert_eq!(items, vec![0, 1, 2, 3, 4]);
    assert!(error.is_none());

    Ok(())
}
