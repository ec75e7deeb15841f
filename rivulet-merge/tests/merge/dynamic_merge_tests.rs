// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use futures::stream::{BoxStream, StreamExt};
use rivulet_core::{PermitCounter, RivuletError, StreamItem};
use rivulet_merge::{merge_with_options, MergeAllExt, MergeOptions};
use rivulet_test_utils::helpers::{
    assert_no_element_emitted, assert_stream_ended, collect_values, unwrap_error, unwrap_value,
};
use rivulet_test_utils::{scripted, test_channel, test_channel_with_errors, values};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::time::pause;

type Source = BoxStream<'static, StreamItem<i32>>;

#[tokio::test]
async fn test_sources_added_while_running_are_merged() -> anyhow::Result<()> {
    // Arrange
    let (outer_tx, outer) = test_channel::<Source>();
    let (inner_tx, inner) = test_channel::<i32>();
    let mut merged = outer.merge_concurrently();

    // Act & Assert
    outer_tx.send(inner.boxed()).map_err(|e| anyhow::anyhow!("{e}"))?;
    inner_tx.send(1)?;
    assert_eq!(unwrap_value(&mut merged, 500).await, 1);

    outer_tx.send(values(vec![2]).boxed()).map_err(|e| anyhow::anyhow!("{e}"))?;
    assert_eq!(unwrap_value(&mut merged, 500).await, 2);

    inner_tx.send(3)?;
    assert_eq!(unwrap_value(&mut merged, 500).await, 3);

    Ok(())
}

#[tokio::test]
async fn test_completes_when_outer_ends_before_inner() -> anyhow::Result<()> {
    // Arrange
    let (outer_tx, outer) = test_channel::<Source>();
    let (inner_tx, inner) = test_channel::<i32>();
    let mut merged = outer.merge_concurrently();
    outer_tx.send(inner.boxed()).map_err(|e| anyhow::anyhow!("{e}"))?;

    // Act
    drop(outer_tx);
    inner_tx.send(1)?;

    // Assert
    assert_eq!(unwrap_value(&mut merged, 500).await, 1);
    assert_no_element_emitted(&mut merged, 50).await;
    drop(inner_tx);
    assert_stream_ended(&mut merged, 500).await;

    Ok(())
}

#[tokio::test]
async fn test_completes_when_inner_ends_before_outer() -> anyhow::Result<()> {
    // Arrange
    let (outer_tx, outer) = test_channel::<Source>();
    let mut merged = outer.merge_concurrently();
    outer_tx.send(values(vec![1]).boxed()).map_err(|e| anyhow::anyhow!("{e}"))?;

    // Act
    assert_eq!(unwrap_value(&mut merged, 500).await, 1);
    assert_no_element_emitted(&mut merged, 50).await;
    drop(outer_tx);

    // Assert
    assert_stream_ended(&mut merged, 500).await;

    Ok(())
}

#[tokio::test]
async fn test_outer_error_is_aggregated_after_running_sources() -> anyhow::Result<()> {
    // Arrange
    let (outer_tx, outer) = test_channel_with_errors::<Source>();
    let (inner_tx, inner) = test_channel::<i32>();
    let mut merged = outer.merge_concurrently();
    outer_tx.send(StreamItem::Value(inner.boxed())).map_err(|e| anyhow::anyhow!("{e}"))?;

    // Act
    outer_tx.send(StreamItem::Error(RivuletError::stream_error("outer"))).map_err(|e| anyhow::anyhow!("{e}"))?;
    assert_no_element_emitted(&mut merged, 50).await;
    inner_tx.send(5)?;
    drop(inner_tx);

    // Assert
    assert_eq!(unwrap_value(&mut merged, 500).await, 5);
    let error = unwrap_error(&mut merged, 500).await;
    assert!(error.to_string().contains("outer"));
    assert_stream_ended(&mut merged, 500).await;

    Ok(())
}

#[tokio::test]
async fn test_permits_bound_running_sources() -> anyhow::Result<()> {
    // Arrange
    pause();
    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let sources = (0..6).map({
        let running = running.clone();
        let peak = peak.clone();
        move |i| {
            let running = running.clone();
            let peak = peak.clone();
            futures::stream::once(async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                running.fetch_sub(1, Ordering::SeqCst);
                StreamItem::Value(i)
            })
            .boxed()
        }
    });
    let outer = futures::stream::iter(sources.map(StreamItem::Value).collect::<Vec<_>>());
    let permits = PermitCounter::new(2);

    // Act
    let merged = merge_with_options(outer, MergeOptions::aggregate().with_permits(permits.clone()));
    let (mut items, error) = collect_values(merged).await;

    // Assert
    items.sort_unstable();
    assert_eq!(items, vec![0, 1, 2, 3, 4, 5]);
    assert!(error.is_none());
    assert_eq!(peak.load(Ordering::SeqCst), 2);
    assert_eq!(permits.available(), 2);

    Ok(())
}

#[tokio::test]
async fn test_single_permit_concatenates() -> anyhow::Result<()> {
    // Arrange
    pause();
    let outer = futures::stream::iter(vec![
        StreamItem::Value(scripted(vec![(30, StreamItem::Value(1)), (30, StreamItem::Value(2))]).boxed()),
        StreamItem::Value(scripted(vec![(1, StreamItem::Value(3))]).boxed()),
    ]);

    // Act
    let merged = merge_with_options(outer, MergeOptions::aggregate().with_max_concurrency(1));
    let (items, _) = collect_values(merged).await;

    // Assert
    assert_eq!(items, vec![1, 2, 3]);

    Ok(())
}

#[tokio::test]
async fn test_bounded_output_delivers_everything() -> anyhow::Result<()> {
    // Arrange
    let sources = vec![values(0..100).boxed(), values(100..200).boxed()];
    let outer = futures::stream::iter(sources.into_iter().map(StreamItem::Value));

    // Act
    let merged = merge_with_options(outer, MergeOptions::aggregate().with_output_capacity(4));
    let (mut items, error) = collect_values(merged).await;

    // Assert
    items.sort_unstable();
    assert_eq!(items, (0..200).collect::<Vec<_>>());
    assert!(error.is_none());

    Ok(())
}
