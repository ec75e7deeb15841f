// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Extension methods turning tokio channel receivers into rivulet streams.

use futures::stream::{Map, StreamExt};
use rivulet_core::StreamItem;
use tokio::sync::mpsc;
use tokio_stream::wrappers::{ReceiverStream, UnboundedReceiverStream};

/// Extension trait for `UnboundedReceiver` to create rivulet streams.
pub trait UnboundedReceiverExt<T> {
    /// Wraps every received value in [`StreamItem::Value`]. The stream ends once
    /// every sender is gone.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use futures::StreamExt;
    /// use rivulet::prelude::*;
    /// use tokio::sync::mpsc;
    ///
    /// # #[tokio::main]
    /// # async fn main() {
    /// let (tx, rx) = mpsc::unbounded_channel();
    /// tx.send(7).unwrap();
    /// drop(tx);
    ///
    /// let items: Vec<_> = rx.into_rivulet_stream().collect().await;
    /// assert_eq!(items, vec![StreamItem::Value(7)]);
    /// # }
    /// ```
    fn into_rivulet_stream(self) -> Map<UnboundedReceiverStream<T>, fn(T) -> StreamItem<T>>;
}

impl<T> UnboundedReceiverExt<T> for mpsc::UnboundedReceiver<T> {
    fn into_rivulet_stream(self) -> Map<UnboundedReceiverStream<T>, fn(T) -> StreamItem<T>> {
        UnboundedReceiverStream::new(self).map(StreamItem::Value as fn(T) -> StreamItem<T>)
    }
}

/// Extension trait for bounded `Receiver` to create rivulet streams.
pub trait ReceiverExt<T> {
    /// Wraps every received value in [`StreamItem::Value`]. Senders keep their
    /// channel backpressure: the stream only frees capacity as it is consumed.
    fn into_rivulet_stream(self) -> Map<ReceiverStream<T>, fn(T) -> StreamItem<T>>;
}

impl<T> ReceiverExt<T> for mpsc::Receiver<T> {
    fn into_rivulet_stream(self) -> Map<ReceiverStream<T>, fn(T) -> StreamItem<T>> {
        ReceiverStream::new(self).map(StreamItem::Value as fn(T) -> StreamItem<T>)
    }
}
