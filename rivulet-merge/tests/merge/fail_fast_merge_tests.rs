// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use futures::stream::StreamExt;
use rivulet_core::{RivuletError, StreamItem};
use rivulet_merge::merge_concurrently_until_first_error;
use rivulet_test_utils::helpers::{collect_values, unwrap_error, unwrap_value};
use rivulet_test_utils::{scripted, test_channel, test_channel_with_errors, DisposeTracker};
use tokio::time::pause;

#[tokio::test]
async fn test_first_error_ends_output() -> anyhow::Result<()> {
    // Arrange
    pause();
    let sources = vec![
        scripted(vec![
            (10, StreamItem::Value(1)),
            (10, StreamItem::Error(RivuletError::stream_error("first"))),
        ])
        .boxed(),
        scripted(vec![
            (5, StreamItem::Value(2)),
            (100, StreamItem::Value(3)),
            (0, StreamItem::Error(RivuletError::stream_error("later"))),
        ])
        .boxed(),
    ];

    // Act
    let (items, error) = collect_values(merge_concurrently_until_first_error(sources)).await;

    // Assert
    assert_eq!(items, vec![2, 1]);
    let error = error.expect("merge should fail");
    assert!(error.to_string().contains("first"));
    assert_eq!(error.cause_count(), 1);

    Ok(())
}

#[tokio::test]
async fn test_failure_drops_remaining_sources() -> anyhow::Result<()> {
    // Arrange
    let tracker = DisposeTracker::new();
    let (failing_tx, failing) = test_channel_with_errors::<i32>();
    let (_idle_tx, idle) = test_channel::<i32>();
    let mut merged = merge_concurrently_until_first_error(vec![
        tracker.track(failing).boxed(),
        tracker.track(idle).boxed(),
    ]);

    // Act
    failing_tx.send(StreamItem::Value(1))?;
    assert_eq!(unwrap_value(&mut merged, 500).await, 1);
    failing_tx.send(StreamItem::Error(RivuletError::stream_error("broken")))?;
    let error = unwrap_error(&mut merged, 500).await;

    // Assert
    assert!(error.to_string().contains("broken"));
    assert!(merged.next().await.is_none());
    assert_eq!(tracker.dropped(), 2);

    Ok(())
}

#[tokio::test]
async fn test_fail_fast_completes_when_all_sources_succeed() -> anyhow::Result<()> {
    // Arrange
    pause();
    let sources = vec![
        scripted(vec![(10, StreamItem::Value("x"))]),
        scripted(vec![(20, StreamItem::Value("y"))]),
    ];

    // Act
    let (items, error) = collect_values(merge_concurrently_until_first_error(sources)).await;

    // Assert
    assert_eq!(items, vec!["x", "y"]);
    assert!(error.is_none());

    Ok(())
}
