// SPDX-License-Identifier: MIT OR Apache-2.0

//! Thread-local extent tracking for scoped, inherited bindings.
//!
//! This module provides the machinery that makes a bound value visible to everything
//! causally descended from the operation that bound it, and invisible to everything else.
//!
//! # Overview
//!
//! The extent system consists of three main components:
//!
//! - [`Extent`]: An immutable node in a tree of execution extents. Each node binds at most
//!   one value and points at its parent.
//! - [`ApplyExtent`]: A [`Future`](std::future::Future) wrapper that keeps an extent current
//!   across suspension points
//! - [`ExtentGuard`]: A drop guard for scoping a binding in synchronous code
//!
//! # Thread-Local Extent Management
//!
//! Each thread has one current extent, stored in thread-local storage. Binding a value
//! creates a child of the current extent, installs it for the duration of an operation, and
//! reinstalls the parent afterward. Because extents are never mutated, a child extent
//! captured by spawned work keeps seeing exactly the bindings that were visible when it was
//! captured.
//!
//! ```rust
//! use scopewise::{ContextHandle, Extent};
//!
//! let h = ContextHandle::new('a');
//! let before = Extent::current();
//! h.run_sync('b', || {
//!     let inside = Extent::current();
//!     assert_eq!(inside.parent(), Some(&before));
//! });
//! assert_eq!(Extent::current(), before);
//! ```
//!
//! # Async Extent Preservation
//!
//! An executor polls many unrelated futures on the same thread. [`ApplyExtent`] installs its
//! extent for the duration of each poll only, so concurrent operations interleaving on one
//! thread each observe their own bindings.
//!
//! ```rust
//! use scopewise::{ContextHandle, InCurrentExtent};
//! # async fn example(h: ContextHandle<u8>) {
//! let work = h.run(1, async { /* ... */ });
//! work.await;
//!
//! // Capture whatever is current now, for work that will be polled elsewhere.
//! let detached = async { /* ... */ }.in_current_extent();
//! # detached.await;
//! # }
//! ```

mod apply_extent;
mod extent_impl;
mod guard;

#[cfg(test)]
mod tests;

// Re-export public types
pub use apply_extent::{ApplyExtent, InCurrentExtent, propagate};
pub(crate) use extent_impl::Binding;
pub use extent_impl::{Extent, ExtentID};
pub use guard::ExtentGuard;
