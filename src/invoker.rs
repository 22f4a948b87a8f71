// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reusable bindings.

use std::future::Future;

use crate::extent::ApplyExtent;
use crate::handle::ContextHandle;

/// A handle paired with a fixed value, ready to be bound around any number of operations.
///
/// Created by [`run_with_context`]. Each call is exactly a call to the handle's
/// [`run`](ContextHandle::run) or [`run_sync`](ContextHandle::run_sync) with a clone of
/// the stored value; the invoker keeps no state of its own.
///
/// ```rust
/// use scopewise::{create_context, run_with_context};
///
/// let tenant = create_context("public");
/// let as_acme = run_with_context(&tenant, "acme");
///
/// assert_eq!(as_acme.run_sync(|| tenant.get()), "acme");
/// assert_eq!(as_acme.run_sync(|| format!("{}!", tenant.get())), "acme!");
/// assert_eq!(tenant.get(), "public");
/// ```
#[derive(Debug, Clone)]
pub struct ScopedInvoker<T> {
    handle: ContextHandle<T>,
    value: T,
}

impl<T> ScopedInvoker<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Same as `handle.run(value, operation)`.
    pub fn run<F: Future>(&self, operation: F) -> ApplyExtent<F> {
        self.handle.run(self.value.clone(), operation)
    }

    /// Same as `handle.run_sync(value, operation)`.
    pub fn run_sync<R>(&self, operation: impl FnOnce() -> R) -> R {
        self.handle.run_sync(self.value.clone(), operation)
    }

    /// The handle this invoker binds.
    pub fn handle(&self) -> &ContextHandle<T> {
        &self.handle
    }

    /// The value bound on each call.
    pub fn value(&self) -> &T {
        &self.value
    }
}

/// Pairs `handle` with `value` for repeated use.
pub fn run_with_context<T>(handle: &ContextHandle<T>, value: T) -> ScopedInvoker<T>
where
    T: Clone + Send + Sync + 'static,
{
    ScopedInvoker {
        handle: handle.clone(),
        value,
    }
}

#[cfg(test)]
mod tests {
    use super::run_with_context;
    use crate::ContextHandle;
    use test_executors::async_test;

    #[cfg(target_arch = "wasm32")]
    use wasm_bindgen_test::*;
    #[cfg(target_arch = "wasm32")]
    wasm_bindgen_test::wasm_bindgen_test_configure!(run_in_browser);

    #[cfg_attr(not(target_arch = "wasm32"), test)]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
    fn test_invoker_is_reusable() {
        let h = ContextHandle::new(0u16);
        let seven = run_with_context(&h, 7);
        assert_eq!(seven.run_sync(|| h.get()), 7);
        assert_eq!(h.get(), 0);
        assert_eq!(seven.run_sync(|| h.get() + 1), 8);
        assert_eq!(*seven.value(), 7);
        assert_eq!(seven.handle(), &h);
    }

    #[async_test]
    async fn test_invoker_async() {
        let h = ContextHandle::new(0u16);
        let seven = run_with_context(&h, 7);
        let reader = h.clone();
        let seen = seven.run(async move { reader.get() }).await;
        assert_eq!(seen, 7);
        assert_eq!(h.get(), 0);
    }

    #[cfg_attr(not(target_arch = "wasm32"), test)]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
    fn test_invoker_passes_errors_through() {
        let h = ContextHandle::new("before");
        let bound = run_with_context(&h, "during");
        let r: Result<(), &str> = bound.run_sync(|| Err(h.get()));
        assert_eq!(r, Err("during"));
        assert_eq!(h.get(), "before");
    }
}
