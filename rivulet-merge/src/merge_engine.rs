// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::merge_options::{ErrorPolicy, MergeOptions};
use core::future::Future;
use futures::future::{poll_fn, BoxFuture};
use futures::stream::FuturesUnordered;
use futures::{FutureExt, Stream, StreamExt};
use rivulet_core::{
    CancellationToken, PermitCounter, PermitGuard, RivuletError, RivuletTask, StreamItem,
    UnicastCursor, UnicastQueue,
};
use std::pin::Pin;
use std::task::{Context, Poll};

/// Output of a concurrent merge.
///
/// The sources are consumed by a background task that pushes into a private
/// unicast queue; this stream is that queue's cursor. Dropping it cancels the
/// task, which drops every source still running.
pub struct MergedStream<T> {
    inner: UnicastCursor<T>,
    _driver: RivuletTask,
}

impl<T> Stream for MergedStream<T> {
    type Item = StreamItem<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

/// Merges the inner streams produced by `sources` under the given options.
///
/// `sources` may keep producing inner streams while earlier ones run. The output
/// completes once `sources` ended and every started inner stream ended, in
/// whichever order those happen. An error item from `sources` itself is handled
/// like an inner failure: aggregated (and no further sources are pulled) or
/// reported at once, depending on the policy.
pub fn merge_with_options<O, I, T>(sources: O, options: MergeOptions) -> MergedStream<T>
where
    O: Stream<Item = StreamItem<I>> + Send + 'static,
    I: Stream<Item = StreamItem<T>> + Send + 'static,
    T: Send + 'static,
{
    let (output, inner) = UnicastQueue::bridge(options.output_capacity);
    let driver = RivuletTask::spawn(move |cancel| drive(sources, options, output, cancel));

    MergedStream {
        inner,
        _driver: driver,
    }
}

enum Step<I> {
    Cancelled,
    Source(Option<StreamItem<I>>),
    Finished(Option<RivuletError>),
    Drained,
}

struct Registry<'a> {
    running: FuturesUnordered<BoxFuture<'static, Option<RivuletError>>>,
    errors: Vec<RivuletError>,
    permits: Option<&'a PermitCounter>,
    acquiring: Option<BoxFuture<'static, PermitGuard>>,
    held: Option<PermitGuard>,
    sources_done: bool,
}

impl Registry<'_> {
    // A permit must be in hand before the next source is pulled
    fn poll_permit(&mut self, cx: &mut Context<'_>) -> Poll<()> {
        let Some(permits) = self.permits else {
            return Poll::Ready(());
        };
        if self.held.is_some() {
            return Poll::Ready(());
        }

        let acquiring = self.acquiring.get_or_insert_with(|| {
            let permits = permits.clone();
            async move { permits.acquire().await }.boxed()
        });
        match acquiring.as_mut().poll(cx) {
            Poll::Ready(guard) => {
                self.acquiring = None;
                self.held = Some(guard);
                Poll::Ready(())
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

async fn drive<O, I, T>(
    sources: O,
    options: MergeOptions,
    output: UnicastQueue<T>,
    cancel: CancellationToken,
) where
    O: Stream<Item = StreamItem<I>> + Send + 'static,
    I: Stream<Item = StreamItem<T>> + Send + 'static,
    T: Send + 'static,
{
    let mut cancelled = cancel.cancelled();
    let mut sources = Box::pin(sources);
    let mut registry = Registry {
        running: FuturesUnordered::new(),
        errors: Vec::new(),
        permits: options.permits.as_ref(),
        acquiring: None,
        held: None,
        sources_done: false,
    };

    loop {
        let step = poll_fn(|cx| {
            if Pin::new(&mut cancelled).poll(cx).is_ready() {
                return Poll::Ready(Step::Cancelled);
            }

            if !registry.running.is_empty() {
                if let Poll::Ready(Some(outcome)) = registry.running.poll_next_unpin(cx) {
                    return Poll::Ready(Step::Finished(outcome));
                }
            }

            if !registry.sources_done {
                if registry.poll_permit(cx).is_pending() {
                    return Poll::Pending;
                }
                if let Poll::Ready(item) = sources.as_mut().poll_next(cx) {
                    return Poll::Ready(Step::Source(item));
                }
            } else if registry.running.is_empty() {
                return Poll::Ready(Step::Drained);
            }

            Poll::Pending
        })
        .await;

        let failure = match step {
            Step::Cancelled => {
                debug!("merge driver cancelled with {} sources running", registry.running.len());
                return;
            }
            Step::Drained => break,
            Step::Source(Some(StreamItem::Value(inner))) => {
                let permit = registry.held.take();
                registry
                    .running
                    .push(forward(inner, output.clone(), permit).boxed());
                continue;
            }
            Step::Source(Some(StreamItem::Error(error))) => {
                registry.sources_done = true;
                registry.held = None;
                error
            }
            Step::Source(None) => {
                registry.sources_done = true;
                registry.held = None;
                continue;
            }
            Step::Finished(None) => continue,
            Step::Finished(Some(error)) => error,
        };

        if failure.is_cancelled() {
            debug!("merge terminated by cancellation");
            output.error(failure);
            return;
        }

        match options.policy {
            ErrorPolicy::FailFast => {
                debug!("merge failing fast, dropping {} sources", registry.running.len());
                output.error(failure);
                return;
            }
            ErrorPolicy::AggregateAll => registry.errors.push(failure),
        }
    }

    if registry.errors.is_empty() {
        output.complete();
    } else {
        warn!("merge finished with {} captured errors", registry.errors.len());
        output.error(RivuletError::aggregate(registry.errors));
    }
}

/// Copies one inner stream into the shared output, returning its failure if any.
async fn forward<I, T>(
    inner: I,
    output: UnicastQueue<T>,
    permit: Option<PermitGuard>,
) -> Option<RivuletError>
where
    I: Stream<Item = StreamItem<T>> + Send + 'static,
    T: Send + 'static,
{
    let _permit = permit;
    let mut inner = Box::pin(inner);
    while let Some(item) = inner.next().await {
        match item {
            StreamItem::Value(value) => {
                if output.send(value).await.is_err() {
                    return None;
                }
            }
            StreamItem::Error(error) => return Some(error),
        }
    }
    None
}
