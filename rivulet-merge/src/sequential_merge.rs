// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use futures::Stream;
use pin_project::pin_project;
use rivulet_core::StreamItem;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Concatenation of the inner streams produced by `sources`.
///
/// The next inner stream is pulled from `sources` only after the current one
/// completed. An inner or outer error is emitted and ends the output.
#[pin_project]
pub struct SequentialMerge<O, I> {
    #[pin]
    sources: O,
    #[pin]
    current: Option<I>,
    sources_done: bool,
    terminated: bool,
}

impl<O, I> SequentialMerge<O, I> {
    pub fn new(sources: O) -> Self {
        Self {
            sources,
            current: None,
            sources_done: false,
            terminated: false,
        }
    }
}

impl<O, I, T> Stream for SequentialMerge<O, I>
where
    O: Stream<Item = StreamItem<I>>,
    I: Stream<Item = StreamItem<T>>,
{
    type Item = StreamItem<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            if *this.terminated {
                return Poll::Ready(None);
            }

            if let Some(inner) = this.current.as_mut().as_pin_mut() {
                match inner.poll_next(cx) {
                    Poll::Ready(Some(StreamItem::Value(value))) => {
                        return Poll::Ready(Some(StreamItem::Value(value)));
                    }
                    Poll::Ready(Some(StreamItem::Error(error))) => {
                        *this.terminated = true;
                        this.current.set(None);
                        return Poll::Ready(Some(StreamItem::Error(error)));
                    }
                    Poll::Ready(None) => {
                        this.current.set(None);
                        continue;
                    }
                    Poll::Pending => return Poll::Pending,
                }
            }

            if *this.sources_done {
                *this.terminated = true;
                continue;
            }

            match this.sources.as_mut().poll_next(cx) {
                Poll::Ready(Some(StreamItem::Value(inner))) => {
                    this.current.set(Some(inner));
                }
                Poll::Ready(Some(StreamItem::Error(error))) => {
                    *this.terminated = true;
                    return Poll::Ready(Some(StreamItem::Error(error)));
                }
                Poll::Ready(None) => {
                    *this.sources_done = true;
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
