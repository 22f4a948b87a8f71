// SPDX-License-Identifier: MIT OR Apache-2.0

//! Async extent preservation.

use std::future::Future;
use std::pin::Pin;
use std::task::Poll;

use super::extent_impl::{Binding, Extent, Restore};

/// A [`Future`] wrapper that keeps an extent current across suspension points.
///
/// Executors do not know about extents, and the same thread polls many unrelated futures
/// in between. `ApplyExtent` solves this by installing its extent around each poll and
/// restoring the previous one afterward, so the wrapped future (and every future it polls
/// in turn, e.g. a `join` fan-out) observes the same bindings at every resumption.
///
/// # Examples
///
/// ```rust
/// use scopewise::{ContextHandle, Extent, ApplyExtent};
///
/// let tenant = ContextHandle::new("none");
/// let extent = tenant.run_sync("acme", Extent::current);
///
/// let future = ApplyExtent::new(extent, async move { tenant.get() });
/// assert_eq!(test_executors::spin_on(future), "acme");
/// ```
///
/// # Implementation Details
///
/// An `ApplyExtent` either wraps a fixed extent ([`ApplyExtent::new`], [`propagate`]) or, when
/// returned by [`ContextHandle::run`](crate::ContextHandle::run), a binding whose extent is
/// created on the first poll as a child of whatever extent is current then. The latter is what
/// lets `outer.run(a, inner.run(b, op))` see both bindings inside `op`.
///
/// `ApplyExtent` implements [`Future`] by:
/// 1. Saving the current thread-local extent
/// 2. Setting its wrapped extent as current
/// 3. Polling the inner future
/// 4. Restoring the saved extent, also when the inner poll panics
#[derive(Debug)]
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct ApplyExtent<F> {
    source: Source,
    future: F,
}

#[derive(Debug)]
enum Source {
    Extent(Extent),
    /// Not yet polled; the parent is whatever is current on the first poll.
    Deferred(Binding),
}

impl<F> ApplyExtent<F> {
    /// Creates a new `ApplyExtent` wrapper.
    pub fn new(extent: Extent, future: F) -> Self {
        Self {
            source: Source::Extent(extent),
            future,
        }
    }

    pub(crate) fn deferred(binding: Binding, future: F) -> Self {
        Self {
            source: Source::Deferred(binding),
            future,
        }
    }

    /// The extent installed while the inner future is polled.
    ///
    /// `None` for a future returned by `run` that has not been polled yet.
    pub fn extent(&self) -> Option<&Extent> {
        match &self.source {
            Source::Extent(extent) => Some(extent),
            Source::Deferred(_) => None,
        }
    }
}

impl<F> Future for ApplyExtent<F>
where
    F: Future,
{
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut std::task::Context<'_>) -> Poll<Self::Output> {
        //safety: `future` is never moved out of `self`, and `source` is not structurally pinned
        let (extent, fut) = unsafe {
            let d = self.get_unchecked_mut();
            let extent = match &d.source {
                Source::Extent(extent) => extent.clone(),
                Source::Deferred(binding) => {
                    let (slot, value) = (binding.slot, binding.value.clone());
                    let extent = Extent::bind(Extent::current(), slot, value);
                    d.source = Source::Extent(extent.clone());
                    extent
                }
            };
            (extent, Pin::new_unchecked(&mut d.future))
        };
        let _restore = Restore::install(extent);
        fut.poll(cx)
    }
}

/// Wraps `future` so that it runs in the extent that is current right now.
///
/// Use this for work that is polled somewhere other than inside the current future, such as
/// a task handed to an executor's `spawn`. The extent is captured immediately, so the
/// spawned work observes these bindings even if it starts after the caller's `run` returned.
///
/// ```rust
/// use scopewise::{ContextHandle, propagate};
///
/// let user = ContextHandle::new(String::from("anonymous"));
/// let reader = user.clone();
/// let detached = user.run_sync(String::from("alice"), || propagate(async move { reader.get() }));
///
/// // The binding ended with `run_sync`, but the detached future captured it.
/// assert_eq!(user.get(), "anonymous");
/// assert_eq!(test_executors::spin_on(detached), "alice");
/// ```
pub fn propagate<F: Future>(future: F) -> ApplyExtent<F> {
    ApplyExtent::new(Extent::current(), future)
}

/// Extension trait for capturing the current extent into a future.
pub trait InCurrentExtent: Future + Sized {
    /// Runs this future in the extent that is current when this method is called.
    fn in_current_extent(self) -> ApplyExtent<Self> {
        propagate(self)
    }

    /// Runs this future in `extent`.
    fn in_extent(self, extent: Extent) -> ApplyExtent<Self> {
        ApplyExtent::new(extent, self)
    }
}

impl<F: Future> InCurrentExtent for F {}
