// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use futures::stream::StreamExt;
use rivulet_core::RivuletError;
use rivulet_stream::IfElseExt;
use rivulet_test_utils::helpers::{collect_values, unwrap_value};
use rivulet_test_utils::{failing, test_channel, values, DisposeTracker};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[tokio::test]
async fn test_if_else_routes_values_by_predicate() -> anyhow::Result<()> {
    // Arrange
    let stream = values(1..=6).if_else(
        |v| v % 2 == 0,
        |evens| evens.map(|item| item.map(|v| v * 100)),
        |odds| odds,
    );

    // Act
    let (mut items, error) = collect_values(stream).await;
    items.sort_unstable();

    // Assert
    assert_eq!(items, vec![1, 3, 5, 200, 400, 600]);
    assert!(error.is_none());

    Ok(())
}

#[tokio::test]
async fn test_upstream_error_reaches_else_branch_only() -> anyhow::Result<()> {
    // Arrange
    let if_saw_error = Arc::new(AtomicBool::new(false));
    let else_saw_error = Arc::new(AtomicBool::new(false));
    let if_flag = if_saw_error.clone();
    let else_flag = else_saw_error.clone();

    let stream = failing(vec![1, 2], "boom").if_else(
        |v| v % 2 == 0,
        move |evens| {
            evens.inspect(move |item| {
                if item.is_error() {
                    if_flag.store(true, Ordering::SeqCst);
                }
            })
        },
        move |odds| {
            odds.inspect(move |item| {
                if item.is_error() {
                    else_flag.store(true, Ordering::SeqCst);
                }
            })
        },
    );

    // Act
    let (mut items, error) = collect_values(stream).await;
    items.sort_unstable();

    // Assert
    assert_eq!(items, vec![1, 2]);
    assert!(matches!(
        error,
        Some(RivuletError::StreamProcessingError { context }) if context == "boom"
    ));
    assert!(!if_saw_error.load(Ordering::SeqCst));
    assert!(else_saw_error.load(Ordering::SeqCst));

    Ok(())
}

#[tokio::test]
async fn test_if_then_passes_other_values_through() -> anyhow::Result<()> {
    // Arrange
    let stream = values(1..=4).if_then(|v| *v > 2, |big| big.map(|item| item.map(|v| -v)));

    // Act
    let (mut items, error) = collect_values(stream).await;
    items.sort_unstable();

    // Assert
    assert_eq!(items, vec![-4, -3, 1, 2]);
    assert!(error.is_none());

    Ok(())
}

#[tokio::test]
async fn test_values_for_a_finished_branch_are_dropped() -> anyhow::Result<()> {
    // Arrange
    let stream = values(vec![2, 4, 6, 1]).if_then(|v| v % 2 == 0, |evens| evens.take(1));

    // Act
    let (mut items, error) = collect_values(stream).await;
    items.sort_unstable();

    // Assert
    assert_eq!(items, vec![1, 2]);
    assert!(error.is_none());

    Ok(())
}

#[tokio::test]
async fn test_dropping_output_disposes_upstream() -> anyhow::Result<()> {
    // Arrange
    let tracker = DisposeTracker::new();
    let (tx, source) = test_channel::<i32>();
    let mut stream = tracker.track(source).if_then(|v| *v > 0, |positive| positive);
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
