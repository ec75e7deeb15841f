// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use rivulet_stream_time::prelude::*;
use rivulet_test_utils::helpers::{collect_values, unwrap_value};
use rivulet_test_utils::{test_channel, values};
use std::time::Duration;
use tokio::time::{advance, pause, Instant};

#[tokio::test]
async fn test_values_are_stamped_when_pulled() -> anyhow::Result<()> {
    // Arrange
    pause();
    let (tx, stream) = test_channel::<&str>();
    let mut stamped = stream.timestamped();
    let started = Instant::now();

    // Act & Assert
    tx.send("first")?;
    let first = unwrap_value(&mut stamped, 10).await;
    assert_eq!(*first, "first");
    assert_eq!(first.timestamp, started);

    advance(Duration::from_millis(100)).await;
    tx.send("second")?;
    let second = unwrap_value(&mut stamped, 10).await;
    assert_eq!(second.value, "second");
    assert_eq!(second.timestamp - first.timestamp, Duration::from_millis(100));

    Ok(())
}

#[tokio::test]
async fn test_remove_timestamp_restores_values() -> anyhow::Result<()> {
    // Arrange
    let source = values(vec![1, 2, 3]);

    // Act
    let (items, _) = collect_values(source.timestamped().remove_timestamp()).await;

    // Assert
    assert_eq!(items, vec![1, 2, 3]);

    Ok(())
}
