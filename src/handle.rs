// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed context handles.

use std::future::Future;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::carrier::{Carrier, SlotID};
use crate::extent::{ApplyExtent, ExtentGuard};

/// A typed capability for reading and binding one context slot.
///
/// A handle is created once with a default value. Reading it returns the value bound by the
/// nearest enclosing [`run`](ContextHandle::run) (or [`run_sync`](ContextHandle::run_sync)),
/// or the default when nothing in the current extent chain bound it.
///
/// Handles are cheap to clone; clones refer to the same slot. Handles are compared and hashed
/// by identity, so two handles created with equal defaults are still different handles.
///
/// # Examples
///
/// ```rust
/// use scopewise::ContextHandle;
///
/// let request_id = ContextHandle::new(String::from("none"));
/// assert_eq!(request_id.get(), "none");
///
/// let seen = request_id.run_sync(String::from("req-42"), || request_id.get());
/// assert_eq!(seen, "req-42");
/// assert_eq!(request_id.get(), "none");
/// ```
///
/// Bindings follow async work across suspension points:
///
/// ```rust
/// use scopewise::ContextHandle;
///
/// # test_executors::spin_on(async {
/// let user = ContextHandle::new(0u32);
/// let reader = user.clone();
/// let result = user
///     .run(7, async move {
///         futures::future::ready(()).await;
///         reader.get()
///     })
///     .await;
/// assert_eq!(result, 7);
/// # });
/// ```
#[derive(Debug)]
pub struct ContextHandle<T> {
    carrier: Arc<Carrier<T>>,
}

impl<T> Clone for ContextHandle<T> {
    fn clone(&self) -> Self {
        ContextHandle {
            carrier: self.carrier.clone(),
        }
    }
}

impl<T> PartialEq for ContextHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.carrier, &other.carrier)
    }
}

impl<T> Eq for ContextHandle<T> {}

impl<T> Hash for ContextHandle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.carrier).hash(state);
    }
}

impl<T> ContextHandle<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Creates a handle whose value is `initial` wherever it has not been bound.
    pub fn new(initial: T) -> ContextHandle<T> {
        ContextHandle {
            carrier: Arc::new(Carrier::seeded(initial)),
        }
    }

    /// Returns the value visible in the current extent.
    #[inline]
    pub fn get(&self) -> T {
        self.carrier.with_current(T::clone)
    }

    /// Calls `f` with a reference to the value visible in the current extent.
    #[inline]
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.carrier.with_current(f)
    }

    /// Returns whether some enclosing extent binds this handle.
    pub fn is_bound(&self) -> bool {
        self.carrier.current_binding().is_some()
    }

    /// The value this handle was created with.
    pub fn default_value(&self) -> &T {
        self.carrier.baseline()
    }

    /// The slot this handle owns.
    pub fn slot(&self) -> SlotID {
        self.carrier.slot()
    }

    /// Returns a future that runs `operation` with `value` bound.
    ///
    /// The new extent is nested inside the extent that is current when the returned future is
    /// first polled, so `outer.run(a, inner.run(b, op))` sees both bindings inside `op`.
    /// While `operation` is polled, [`get`](Self::get) returns `value`, and so does every
    /// future `operation` polls in turn. Between polls, and once the future completes or is
    /// dropped, the binding is not visible; the output of `operation` is returned unchanged.
    pub fn run<F: Future>(&self, value: T, operation: F) -> ApplyExtent<F> {
        self.carrier.bind_for_extent(value, operation)
    }

    /// Runs `operation` synchronously with `value` bound.
    ///
    /// The previous binding is restored before this returns, including when `operation`
    /// panics.
    pub fn run_sync<R>(&self, value: T, operation: impl FnOnce() -> R) -> R {
        self.carrier.bind_for_extent_sync(value, operation)
    }

    /// Binds `value` on this thread until the returned guard is dropped.
    ///
    /// # In async code
    ///
    /// Do not hold the guard across an `.await`. A bound future reinstalls its own extent
    /// every time it is polled, so after the first suspension the guard's binding is no longer
    /// visible, and dropping the guard afterward only logs a warning. Use [`run`](Self::run)
    /// to bind a value around async work.
    pub fn enter(&self, value: T) -> ExtentGuard {
        ExtentGuard::enter(self.carrier.extent_binding(value))
    }
}

/// Creates a new [`ContextHandle`] seeded with `initial`.
pub fn create_context<T>(initial: T) -> ContextHandle<T>
where
    T: Clone + Send + Sync + 'static,
{
    ContextHandle::new(initial)
}

/// Returns the value of `handle` visible in the current extent.
///
/// Equivalent to [`ContextHandle::get`].
pub fn use_context<T>(handle: &ContextHandle<T>) -> T
where
    T: Clone + Send + Sync + 'static,
{
    handle.get()
}
