// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use futures::{stream, Stream, StreamExt};
use rivulet_core::{RivuletError, StreamItem};
use rivulet_stream_time::prelude::*;
use rivulet_test_utils::helpers::{
    assert_no_element_emitted, assert_stream_ended, collect_values, unwrap_value,
};
use rivulet_test_utils::{test_channel, values};
use std::time::Duration;
use tokio::time::{advance, pause};

#[tokio::test]
async fn test_size_bound_dominates_for_instant_items() -> anyhow::Result<()> {
    // Arrange
    pause();
    let source = values(1..=9);

    // Act
    let (batches, error) = collect_values(source.buffer(3, Duration::from_secs(2))).await;

    // Assert
    assert_eq!(batches, vec![vec![1, 2, 3], vec![4, 5, 6], vec![7, 8, 9]]);
    assert!(error.is_none());

    Ok(())
}

#[tokio::test]
async fn test_partial_batch_flushed_on_completion() -> anyhow::Result<()> {
    // Arrange
    pause();
    let source = values(1..=5);

    // Act
    let (batches, _) = collect_values(source.buffer(2, Duration::from_secs(1))).await;

    // Assert
    assert_eq!(batches, vec![vec![1, 2], vec![3, 4], vec![5]]);

    Ok(())
}

#[tokio::test]
async fn test_time_bound_flushes_partial_batch() -> anyhow::Result<()> {
    // Arrange
    pause();
    let (tx, stream) = test_channel::<i32>();
    let mut buffered = Box::pin(stream.buffer(10, Duration::from_secs(1)));
    assert_no_element_emitted(&mut buffered, 0).await;

    // Act
    tx.send(1)?;
    tx.send(2)?;
    advance(Duration::from_millis(999)).await;
    assert_no_element_emitted(&mut buffered, 0).await;
    advance(Duration::from_millis(1)).await;

    // Assert
    assert_eq!(unwrap_value(&mut buffered, 10).await, vec![1, 2]);

    Ok(())
}

#[tokio::test]
async fn test_empty_periods_emit_nothing() -> anyhow::Result<()> {
    // Arrange
    pause();
    let (tx, stream) = test_channel::<i32>();
    let mut buffered = Box::pin(stream.buffer(10, Duration::from_millis(100)));
    assert_no_element_emitted(&mut buffered, 0).await;

    // Act
    advance(Duration::from_millis(250)).await;
    assert_no_element_emitted(&mut buffered, 0).await;
    tx.send(7)?;
    drop(tx);

    // Assert
    assert_eq!(unwrap_value(&mut buffered, 10).await, vec![7]);
    assert_stream_ended(&mut buffered, 10).await;

    Ok(())
}

#[tokio::test]
async fn test_timer_restarts_after_size_flush() -> anyhow::Result<()> {
    // Arrange
    pause();
    let (tx, stream) = test_channel::<i32>();
    let mut buffered = Box::pin(stream.buffer(2, Duration::from_millis(100)));
    assert_no_element_emitted(&mut buffered, 0).await;

    // Act & Assert
    advance(Duration::from_millis(60)).await;
    tx.send(1)?;
    tx.send(2)?;
    assert_eq!(unwrap_value(&mut buffered, 10).await, vec![1, 2]);

    tx.send(3)?;
    advance(Duration::from_millis(60)).await;
    assert_no_element_emitted(&mut buffered, 0).await;

    advance(Duration::from_millis(40)).await;
    assert_eq!(unwrap_value(&mut buffered, 10).await, vec![3]);

    Ok(())
}

#[tokio::test]
async fn test_error_discards_partial_batch() -> anyhow::Result<()> {
    // Arrange
    let source = stream::iter(vec![
        StreamItem::Value(1),
        StreamItem::Value(2),
        StreamItem::Error(RivuletError::stream_error("mid-batch")),
        StreamItem::Value(3),
    ]);

    // Act
    let (batches, error) = collect_values(source.buffer(5, Duration::from_secs(1))).await;

    // Assert
    assert!(batches.is_empty());
    assert!(error.is_some_and(|e| e.to_string().contains("mid-batch")));

    Ok(())
}

#[tokio::test]
async fn test_cancellation_surfaces_as_cancelled() -> anyhow::Result<()> {
    // Arrange
    let source = stream::iter(vec![
        StreamItem::Value(1),
        StreamItem::Error(RivuletError::Cancelled),
    ]);

    // Act
    let (batches, error) = collect_values(source.buffer(5, Duration::from_secs(1))).await;

    // Assert
    assert!(batches.is_empty());
    assert!(error.is_some_and(|e| e.is_cancelled()));

    Ok(())
}

#[tokio::test]
async fn test_zero_size_is_rejected() -> anyhow::Result<()> {
    // Arrange
    let source = values(vec![1, 2]);

    // Act
    let (batches, error) = collect_values(source.buffer(0, Duration::from_secs(1))).await;

    // Assert
    assert!(batches.is_empty());
    assert!(matches!(error, Some(RivuletError::InvalidState { .. })));

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
async fn test_time_bound_flushes_while_upstream_stays_busy() -> anyhow::Result<()> {
    // Arrange
    let source = busy_source(30, Duration::from_millis(2));

    // Act
    let (batches, error) = collect_values(source.buffer(1_000, Duration::from_millis(10))).await;

    // Assert
    assert!(batches.len() >= 2, "batched {batches:?}");
    assert_eq!(batches.concat(), (0..30).collect::<Vec<_>>());
    assert!(error.is_none());

    Ok(())
}

#[tokio::test]
async fn test_buffer_yields_on_endless_ready_upstream() -> anyhow::Result<()> {
    // Arrange
    let source = stream::repeat(StreamItem::Value(1));
    let mut buffered = Box::pin(source.buffer(usize::MAX, Duration::from_secs(60)));

    // Act & Assert
    assert_no_element_emitted(&mut buffered, 10).await;

    Ok(())
}
