// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Predicate-based split into two branch pipelines, merged back together.
//!
//! A router task pulls the upstream and pushes every value into one of two
//! private unicast bridges. Each bridge cursor is handed to a caller-supplied
//! branch transform and the two branch outputs are merged with the
//! aggregate-all-errors policy.
//!
//! An upstream error is routed to the else bridge only. Both bridges are
//! completed whenever the router stops, so no branch is left waiting.

use futures::future::{select, Either};
use futures::stream::{BoxStream, StreamExt};
use futures::Stream;
use rivulet_core::{RivuletTask, StreamItem, UnicastCursor, UnicastQueue};
use rivulet_merge::{merge_concurrently, MergedStream};
use std::pin::Pin;
use std::task::{Context, Poll};

/// Output of [`IfElseExt::if_else`] and [`IfElseExt::if_then`].
///
/// Dropping it stops the router and both branches.
pub struct IfElse<U> {
    merged: MergedStream<U>,
    _router: RivuletTask,
}

impl<U> Stream for IfElse<U> {
    type Item = StreamItem<U>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.merged.poll_next_unpin(cx)
    }
}

struct CompleteOnExit<T: Send + 'static> {
    if_bridge: UnicastQueue<T>,
    else_bridge: UnicastQueue<T>,
}

impl<T: Send + 'static> Drop for CompleteOnExit<T> {
    fn drop(&mut self) {
        self.if_bridge.complete();
        self.else_bridge.complete();
    }
}

pub trait IfElseExt<T>: Stream<Item = StreamItem<T>> + Sized {
    /// Routes values matching `predicate` through `if_branch`, the others (and any
    /// upstream error) through `else_branch`.
    fn if_else<U, P, FI, FE, OI, OE>(
        self,
        mut predicate: P,
        if_branch: FI,
        else_branch: FE,
    ) -> IfElse<U>
    where
        Self: Send + 'static,
        T: Send + 'static,
        U: Send + 'static,
        P: FnMut(&T) -> bool + Send + 'static,
        FI: FnOnce(UnicastCursor<T>) -> OI,
        FE: FnOnce(UnicastCursor<T>) -> OE,
        OI: Stream<Item = StreamItem<U>> + Send + 'static,
        OE: Stream<Item = StreamItem<U>> + Send + 'static,
    {
        let (if_bridge, if_cursor) = UnicastQueue::bridge(None);
        let (else_bridge, else_cursor) = UnicastQueue::bridge(None);

        let router = RivuletTask::spawn(move |cancel| async move {
            let bridges = CompleteOnExit {
                if_bridge,
                else_bridge,
            };
            let mut source = Box::pin(self);

            while let Either::Left((item, _)) = select(source.next(), cancel.cancelled()).await {
                match item {
                    Some(StreamItem::Value(value)) => {
                        let bridge = if predicate(&value) {
                            &bridges.if_bridge
                        } else {
                            &bridges.else_bridge
                        };
                        if bridge.next(value).is_err() {
                            debug!("if_else branch closed, dropping routed value");
                        }
                    }
                    Some(StreamItem::Error(error)) => {
                        bridges.else_bridge.error(error);
                        break;
                    }
                    None => break,
                }
            }
            debug!("if_else router finished");
        });

        let branches: Vec<BoxStream<'static, StreamItem<U>>> =
            vec![if_branch(if_cursor).boxed(), else_branch(else_cursor).boxed()];

        IfElse {
            merged: merge_concurrently(branches),
            _router: router,
        }
    }

    /// [`if_else`](Self::if_else) with the else branch passing values through.
    fn if_then<P, FI, OI>(self, predicate: P, if_branch: FI) -> IfElse<T>
    where
        Self: Send + 'static,
        T: Send + 'static,
        P: FnMut(&T) -> bool + Send + 'static,
        FI: FnOnce(UnicastCursor<T>) -> OI,
        OI: Stream<Item = StreamItem<T>> + Send + 'static,
    {
        self.if_else(predicate, if_branch, |passthrough| passthrough)
    }
}

impl<S, T> IfElseExt<T> for S where S: Stream<Item = StreamItem<T>> {}
