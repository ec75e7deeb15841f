// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::merge_engine::{merge_with_options, MergedStream};
use crate::merge_options::MergeOptions;
use crate::sequential_merge::SequentialMerge;
use futures::stream::{self, BoxStream, Iter};
use futures::{Stream, StreamExt};
use rivulet_core::StreamItem;

/// Operators flattening a stream of streams.
///
/// The outer stream carries `StreamItem<I>` so that a failing source-of-sources
/// can report its error like any other source.
pub trait MergeAllExt<I, T>: Stream<Item = StreamItem<I>> + Sized
where
    I: Stream<Item = StreamItem<T>>,
{
    /// Runs every inner stream as soon as it arrives; failures are collected and
    /// reported after all sources ended.
    fn merge_concurrently(self) -> MergedStream<T>
    where
        Self: Send + 'static,
        I: Send + 'static,
        T: Send + 'static,
    {
        merge_with_options(self, MergeOptions::aggregate())
    }

    /// Runs every inner stream as soon as it arrives; the first failure ends the
    /// output and drops the remaining sources.
    fn merge_concurrently_until_first_error(self) -> MergedStream<T>
    where
        Self: Send + 'static,
        I: Send + 'static,
        T: Send + 'static,
    {
        merge_with_options(self, MergeOptions::fail_fast())
    }

    /// Drains the inner streams one after another, in arrival order.
    fn merge_sequentially(self) -> SequentialMerge<Self, I> {
        SequentialMerge::new(self)
    }
}

impl<O, I, T> MergeAllExt<I, T> for O
where
    O: Stream<Item = StreamItem<I>>,
    I: Stream<Item = StreamItem<T>>,
{
}

type SourceIter<S> = Iter<std::iter::Map<std::vec::IntoIter<S>, fn(S) -> StreamItem<S>>>;

fn source_stream<S>(sources: impl IntoIterator<Item = S>) -> SourceIter<S> {
    let sources: Vec<S> = sources.into_iter().collect();
    stream::iter(sources.into_iter().map(StreamItem::Value as fn(S) -> StreamItem<S>))
}

/// Aggregate-all-errors merge of a fixed set of sources.
///
/// ```
/// use futures::{stream, StreamExt};
/// use rivulet_core::StreamItem;
/// use rivulet_merge::merge_concurrently;
///
/// # #[tokio::main]
/// # async fn main() {
/// let merged = merge_concurrently(vec![
///     stream::iter(vec![StreamItem::Value(1), StreamItem::Value(2)]),
///     stream::iter(vec![StreamItem::Value(3)]),
/// ]);
///
/// let mut values: Vec<i32> = merged.filter_map(|item| async move { item.ok() }).collect().await;
/// values.sort_unstable();
/// assert_eq!(values, vec![1, 2, 3]);
/// # }
/// ```
pub fn merge_concurrently<S, T>(sources: impl IntoIterator<Item = S>) -> MergedStream<T>
where
    S: Stream<Item = StreamItem<T>> + Send + 'static,
    T: Send + 'static,
{
    source_stream(sources).merge_concurrently()
}

/// Fail-fast merge of a fixed set of sources.
pub fn merge_concurrently_until_first_error<S, T>(
    sources: impl IntoIterator<Item = S>,
) -> MergedStream<T>
where
    S: Stream<Item = StreamItem<T>> + Send + 'static,
    T: Send + 'static,
{
    source_stream(sources).merge_concurrently_until_first_error()
}

/// Concatenation of a fixed set of sources.
pub fn merge_sequentially<S, T>(
    sources: impl IntoIterator<Item = S>,
) -> SequentialMerge<SourceIter<S>, S>
where
    S: Stream<Item = StreamItem<T>>,
{
    source_stream(sources).merge_sequentially()
}

/// Merging a stream with one other stream of the same item type.
pub trait MergeWithExt<T>: Stream<Item = StreamItem<T>> + Sized {
    /// Aggregate-all-errors merge of `self` and `other`.
    fn merge_with<S>(self, other: S) -> MergedStream<T>
    where
        Self: Send + 'static,
        S: Stream<Item = StreamItem<T>> + Send + 'static,
        T: Send + 'static,
    {
        let sources: Vec<BoxStream<'static, StreamItem<T>>> = vec![self.boxed(), other.boxed()];
        merge_concurrently(sources)
    }
}

impl<S, T> MergeWithExt<T> for S where S: Stream<Item = StreamItem<T>> {}
