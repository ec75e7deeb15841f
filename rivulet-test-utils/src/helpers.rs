// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use futures::stream::StreamExt;
use futures::Stream;
use rivulet_core::{RivuletError, StreamItem};
use std::fmt::Debug;
use std::time::Duration;
use tokio::time::sleep;

/// Panics if `stream` yields anything (item or end) within `timeout_ms`.
pub async fn assert_no_element_emitted<S, T>(stream: &mut S, timeout_ms: u64)
where
    S: Stream<Item = T> + Unpin,
    T: Debug,
{
    tokio::select! {
        state = stream.next() => {
            panic!("Unexpected emission {state:?}, expected no output.");
        }
        _ = sleep(Duration::from_millis(timeout_ms)) => {}
    }
}

/// Next item of `stream`, panicking on end of stream or timeout.
pub async fn unwrap_stream<S, T>(stream: &mut S, timeout_ms: u64) -> StreamItem<T>
where
    S: Stream<Item = StreamItem<T>> + Unpin,
{
    match tokio::time::timeout(Duration::from_millis(timeout_ms), stream.next()).await {
        Ok(Some(item)) => item,
        Ok(None) => panic!("Expected an item, but the stream ended"),
        Err(_) => panic!("Timed out after {timeout_ms}ms waiting for an item"),
    }
}

/// Next value of `stream`, panicking on errors, end of stream or timeout.
pub async fn unwrap_value<S, T>(stream: &mut S, timeout_ms: u64) -> T
where
    S: Stream<Item = StreamItem<T>> + Unpin,
{
    match unwrap_stream(stream, timeout_ms).await {
        StreamItem::Value(value) => value,
        StreamItem::Error(error) => panic!("Expected a value, got error: {error}"),
    }
}

/// Next error of `stream`, panicking on values, end of stream or timeout.
pub async fn unwrap_error<S, T>(stream: &mut S, timeout_ms: u64) -> RivuletError
where
    S: Stream<Item = StreamItem<T>> + Unpin,
    T: Debug,
{
    match unwrap_stream(stream, timeout_ms).await {
        StreamItem::Error(error) => error,
        StreamItem::Value(value) => panic!("Expected an error, got value: {value:?}"),
    }
}

/// Panics unless `stream` ends within `timeout_ms`.
pub async fn assert_stream_ended<S, T>(stream: &mut S, timeout_ms: u64)
where
    S: Stream<Item = T> + Unpin,
    T: Debug,
{
    match tokio::time::timeout(Duration::from_millis(timeout_ms), stream.next()).await {
        Ok(None) => {}
        Ok(Some(item)) => panic!("Expected end of stream, got {item:?}"),
        Err(_) => panic!("Timed out after {timeout_ms}ms waiting for end of stream"),
    }
}

/// Drains `stream`, splitting values from the (single) terminal error.
///
/// Panics if a value follows an error, since operators must stop after failing.
pub async fn collect_values<S, T>(stream: S) -> (Vec<T>, Option<RivuletError>)
where
    S: Stream<Item = StreamItem<T>>,
{
    let mut values = Vec::new();
    let mut error = None;

    let mut stream = Box::pin(stream);
    while let Some(item) = stream.next().await {
        assert!(error.is_none(), "stream kept emitting after an error");
        match item {
            StreamItem::Value(value) => values.push(value),
            StreamItem::Error(e) => error = Some(e),
        }
    }
    (values, error)
}
