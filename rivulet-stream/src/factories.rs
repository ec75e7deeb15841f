// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Trivial sources producing [`StreamItem`] streams.

use futures::stream::{self, Empty, Iter, Once, Pending, Stream};
use rivulet_core::{RivuletError, StreamItem};

/// A single value, then completion.
pub fn just<T>(value: T) -> Once<futures::future::Ready<StreamItem<T>>> {
    stream::once(futures::future::ready(StreamItem::Value(value)))
}

/// Completes without producing anything.
pub fn empty<T>() -> Empty<StreamItem<T>> {
    stream::empty()
}

/// Never produces and never completes.
pub fn never<T>() -> Pending<StreamItem<T>> {
    stream::pending()
}

pub fn from_iter<I>(
    values: I,
) -> Iter<std::iter::Map<I::IntoIter, fn(I::Item) -> StreamItem<I::Item>>>
where
    I: IntoIterator,
{
    stream::iter(
        values
            .into_iter()
            .map(StreamItem::Value as fn(I::Item) -> StreamItem<I::Item>),
    )
}

/// `count` consecutive integers starting at `start`, ending early at `i64::MAX`.
pub fn range(start: i64, count: usize) -> impl Stream<Item = StreamItem<i64>> + Send + Unpin {
    stream::iter((0..count).map_while(move |offset| {
        let offset = i64::try_from(offset).ok()?;
        start.checked_add(offset).map(StreamItem::Value)
    }))
}

/// Fails immediately with `error`.
pub fn fail<T>(error: RivuletError) -> impl Stream<Item = StreamItem<T>> + Send + Unpin
where
    T: Send,
{
    stream::once(futures::future::ready(StreamItem::<T>::Error(error)))
}
