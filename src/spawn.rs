// SPDX-License-Identifier: MIT OR Apache-2.0

//! Spawning work that inherits the current extent.
//!
//! Futures polled inside a bound future see its bindings automatically. Work that is handed
//! to something else to run (a new thread, an executor's task queue) must capture the extent
//! when it is spawned; these helpers do that.

#[cfg(any(not(target_arch = "wasm32"), feature = "tokio"))]
use crate::extent::Extent;

/// Spawns a thread that runs `f` in the extent current at the call.
///
/// ```rust
/// use scopewise::{ContextHandle, spawn_thread};
///
/// let job = ContextHandle::new(0u32);
/// let reader = job.clone();
/// let handle = job.run_sync(12, || spawn_thread(move || reader.get()));
/// assert_eq!(handle.join().unwrap(), 12);
/// ```
#[cfg(not(target_arch = "wasm32"))]
pub fn spawn_thread<F, R>(f: F) -> std::thread::JoinHandle<R>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    let extent = Extent::current();
    let id = extent.extent_id().0;
    logwise::debuginternal_sync!("spawning thread in extent {id}", id = id);
    std::thread::spawn(move || extent.run_sync(f))
}

/// Spawns `future` on the tokio runtime in the extent current at the call.
///
/// Must be called from within a tokio runtime, like [`tokio::spawn`].
#[cfg(feature = "tokio")]
pub fn spawn<F>(future: F) -> tokio::task::JoinHandle<F::Output>
where
    F: std::future::Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::spawn(crate::extent::ApplyExtent::new(Extent::current(), future))
}
