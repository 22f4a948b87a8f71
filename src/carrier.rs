// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-handle binding slots.
//!
//! A [`Carrier`] is the part of the propagation machinery owned by a single handle: it
//! holds the handle's identity and its seeded default, and knows how to push a binding for
//! that identity onto the extent chain. Carriers never share state with one another; the
//! only thread-local involved is the current-extent pointer in [`crate::extent`].

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::extent::{ApplyExtent, Binding, Extent};

pub(crate) static SLOT_ID: AtomicU64 = AtomicU64::new(0);

/// Unique identifier for a carrier slot.
///
/// Each slot gets a monotonically increasing ID that is unique across the entire
/// process lifetime, so two handles never read each other's bindings.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotID(pub(crate) u64);

impl std::fmt::Display for SlotID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One binding slot on the extent chain, seeded with a baseline value.
#[derive(Debug)]
pub struct Carrier<T> {
    slot: SlotID,
    baseline: T,
}

impl<T> Carrier<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Allocates a new slot and seeds `initial` as its binding outside of any extent.
    pub fn seeded(initial: T) -> Carrier<T> {
        let slot = SlotID(SLOT_ID.fetch_add(1, Ordering::Relaxed));
        logwise::debuginternal_sync!("seeded slot {slot}", slot = slot.0);
        Carrier {
            slot,
            baseline: initial,
        }
    }

    #[inline]
    pub fn slot(&self) -> SlotID {
        self.slot
    }

    /// The value seeded at construction.
    #[inline]
    pub fn baseline(&self) -> &T {
        &self.baseline
    }

    /// The binding visible in the calling extent, or `None` if no extent in the current
    /// chain has bound this slot.
    pub fn current_binding(&self) -> Option<T> {
        let extent = Extent::current();
        extent
            .lookup(self.slot)
            .and_then(|value| value.downcast_ref::<T>())
            .cloned()
    }

    /// Calls `f` with the visible binding, falling back to the seeded baseline.
    pub fn with_current<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let extent = Extent::current();
        match extent
            .lookup(self.slot)
            .and_then(|value| value.downcast_ref::<T>())
        {
            Some(value) => f(value),
            None => f(&self.baseline),
        }
    }

    /// Creates a child of the current extent that binds `value` to this slot.
    ///
    /// The extent is not installed; see [`Extent::run_sync`] and [`ApplyExtent`].
    pub fn extent_binding(&self, value: T) -> Extent {
        Extent::bind(Extent::current(), self.slot, Arc::new(value))
    }

    /// Runs `operation` in a new nested extent in which `value` is bound.
    ///
    /// The nested extent is created when the returned future is first polled, as a child of
    /// the extent current at that poll. A future built ahead of time and awaited inside some
    /// other bound future therefore nests inside it.
    pub fn bind_for_extent<F: Future>(&self, value: T, operation: F) -> ApplyExtent<F> {
        let binding = Binding {
            slot: self.slot,
            value: Arc::new(value),
        };
        ApplyExtent::deferred(binding, operation)
    }

    /// Synchronous form of [`Carrier::bind_for_extent`].
    pub fn bind_for_extent_sync<R>(&self, value: T, operation: impl FnOnce() -> R) -> R {
        self.extent_binding(value).run_sync(operation)
    }
}
