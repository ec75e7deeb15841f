// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use futures::stream::{self, Stream};
use rivulet_core::{RivuletError, StreamItem};
use std::collections::VecDeque;
use std::time::Duration;

/// A source emitting each item after sleeping for its delay (milliseconds).
///
/// Delays are relative to the previous emission and run on the tokio clock.
pub fn scripted<T: Send + 'static>(
    steps: Vec<(u64, StreamItem<T>)>,
) -> impl Stream<Item = StreamItem<T>> + Send + 'static {
    stream::unfold(VecDeque::from(steps), |mut steps| async move {
        let (delay, item) = steps.pop_front()?;
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        Some((item, steps))
    })
}

/// Immediate values.
pub fn values<T: Send + 'static>(
    items: impl IntoIterator<Item = T>,
) -> impl Stream<Item = StreamItem<T>> + Send + Unpin + 'static {
    let items: Vec<_> = items.into_iter().map(StreamItem::Value).collect();
    stream::iter(items)
}

/// Immediate values followed by a stream processing error carrying `message`.
pub fn failing<T: Send + 'static>(
    items: impl IntoIterator<Item = T>,
    message: &str,
) -> impl Stream<Item = StreamItem<T>> + Send + Unpin + 'static {
    let mut steps: Vec<_> = items.into_iter().map(StreamItem::Value).collect();
    steps.push(StreamItem::Error(RivuletError::stream_error(message)));
    stream::iter(steps)
}
