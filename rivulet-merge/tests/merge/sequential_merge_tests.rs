// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use futures::stream::{self, StreamExt};
use rivulet_core::{RivuletError, StreamItem};
use rivulet_merge::{merge_sequentially, MergeAllExt};
use rivulet_test_utils::helpers::collect_values;
use rivulet_test_utils::{failing, scripted, values, DisposeTracker};
use tokio::time::pause;

#[tokio::test]
async fn test_sources_are_drained_in_order() -> anyhow::Result<()> {
    // Arrange
    pause();
    let sources = vec![
        scripted(vec![(50, StreamItem::Value(1)), (50, StreamItem::Value(2))]).boxed(),
        scripted(vec![(1, StreamItem::Value(3))]).boxed(),
        values(vec![4, 5]).boxed(),
    ];

    // Act
    let (items, error) = collect_values(merge_sequentially(sources)).await;

    // Assert
    assert_eq!(items, vec![1, 2, 3, 4, 5]);
    assert!(error.is_none());

    Ok(())
}

#[tokio::test]
async fn test_error_stops_before_later_sources() -> anyhow::Result<()> {
    // Arrange
    let tracker = DisposeTracker::new();
    let sources = vec![
        failing(vec![1], "stop").boxed(),
        tracker.track(values(vec![2])).boxed(),
    ];

    // Act
    let (items, error) = collect_values(merge_sequentially(sources)).await;

    // Assert
    assert_eq!(items, vec![1]);
    assert!(error.is_some_and(|e| e.to_string().contains("stop")));
    assert_eq!(tracker.opened(), 0);

    Ok(())
}

#[tokio::test]
async fn test_outer_error_is_emitted_after_current_source() -> anyhow::Result<()> {
    // Arrange
    let outer = stream::iter(vec![
        StreamItem::Value(values(vec![1, 2])),
        StreamItem::Error(RivuletError::stream_error("outer")),
        StreamItem::Value(values(vec![3])),
    ]);

    // Act
    let (items, error) = collect_values(outer.merge_sequentially()).await;

    // Assert
    assert_eq!(items, vec![1, 2]);
    assert!(error.is_some_and(|e| e.to_string().contains("outer")));

    Ok(())
}

#[tokio::test]
async fn test_empty_sources_are_skipped() -> anyhow::Result<()> {
    // Arrange
    let sources = vec![values(Vec::<i32>::new()), values(vec![1]), values(Vec::new())];

    // Act
    let (items, error) = collect_values(merge_sequentially(sources)).await;

    // Assert
    assert_eq!(items, vec![1]);
    assert!(error.is_none());

    Ok(())
}
