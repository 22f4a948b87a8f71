// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tests for the extent module.

use super::extent_impl::Extent;
use crate::ContextHandle;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen_test::*;

/// Returns `Pending` once, waking itself.
async fn yield_now() {
    let mut yielded = false;
    std::future::poll_fn(|cx| {
        if yielded {
            std::task::Poll::Ready(())
        } else {
            yielded = true;
            cx.waker().wake_by_ref();
            std::task::Poll::Pending
        }
    })
    .await
}
#[cfg(target_arch = "wasm32")]
wasm_bindgen_test::wasm_bindgen_test_configure!(run_in_browser);

#[cfg_attr(not(target_arch = "wasm32"), test)]
#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
fn test_child_extent_restores_parent() {
    let h = ContextHandle::new(0u8);
    let root = Extent::current();
    let child = h.run_sync(1, || {
        let child = Extent::current();
        assert_ne!(child, root);
        assert_eq!(child.parent(), Some(&root));
        child
    });
    assert_eq!(Extent::current(), root);
    assert!(child.is_within(&root));
    assert!(!root.is_within(&child));
}

#[cfg_attr(not(target_arch = "wasm32"), test)]
#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
fn test_extent_equality() {
    let extent1 = Extent::current();
    let extent2 = extent1.clone();
    let h = ContextHandle::new(());
    let extent3 = h.run_sync((), Extent::current);

    // Same Arc pointer should be equal
    assert_eq!(extent1, extent2);

    // Different Arc pointers should not be equal
    assert_ne!(extent1, extent3);
    assert_ne!(extent1.extent_id(), extent3.extent_id());
}

#[cfg_attr(not(target_arch = "wasm32"), test)]
#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
#[allow(clippy::mutable_key_type)]
fn test_extent_hash() {
    use std::collections::HashMap;

    let h = ContextHandle::new(0u8);
    let extent1 = Extent::current();
    let extent2 = extent1.clone();
    let extent3 = h.run_sync(3, Extent::current);

    let mut map = HashMap::new();
    map.insert(extent1.clone(), "value1");
    map.insert(extent3.clone(), "value3");

    assert_eq!(map.get(&extent1), Some(&"value1"));
    assert_eq!(map.get(&extent2), Some(&"value1")); // same as extent1
    assert_eq!(map.get(&extent3), Some(&"value3"));
    assert_eq!(map.len(), 2);
}

#[cfg_attr(not(target_arch = "wasm32"), test)]
#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
fn test_extent_display() {
    let h = ContextHandle::new(0u8);
    let root = Extent::current();
    let root_display = format!("{}", root);
    let base = root.nesting_level();
    assert!(root_display.ends_with(&format!("extent {}", root.extent_id())));

    h.run_sync(1, || {
        let child = Extent::current();
        let display = format!("{}", child);
        assert!(display.starts_with(&"  ".repeat(base + 1)));
        assert!(display.ends_with(&format!("extent {}", child.extent_id())));
    });
}

#[cfg_attr(not(target_arch = "wasm32"), test)]
#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
fn test_captured_extent_outlives_run() {
    let h = ContextHandle::new("default");
    let captured = h.run_sync("bound", Extent::current);
    assert_eq!(h.get(), "default");
    assert_eq!(captured.run_sync(|| h.get()), "bound");
    assert_eq!(h.get(), "default");
}

#[cfg_attr(not(target_arch = "wasm32"), test)]
#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
fn test_set_current_returns_prior() {
    let h = ContextHandle::new(0u8);
    let root = Extent::current();
    let bound = h.run_sync(9, Extent::current);
    let prior = bound.clone().set_current();
    assert_eq!(prior, root);
    assert_eq!(h.get(), 9);
    let restored = prior.set_current();
    assert_eq!(restored, bound);
    assert_eq!(h.get(), 0);
}

#[cfg(not(target_arch = "wasm32"))]
#[test]
fn test_run_sync_restores_on_panic() {
    let h = ContextHandle::new(1u8);
    let before = Extent::current();
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        h.run_sync(2, || -> () { panic!("boom") })
    }));
    let payload = result.expect_err("should panic");
    assert_eq!(payload.downcast_ref::<&str>(), Some(&"boom"));
    assert_eq!(Extent::current(), before);
    assert_eq!(h.get(), 1);
}

#[cfg_attr(not(target_arch = "wasm32"), test)]
#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
fn test_guard_dropped_out_of_order() {
    let h = ContextHandle::new(0u8);
    let root = Extent::current();
    let outer = h.enter(1);
    let inner = h.enter(2);
    assert_eq!(h.get(), 2);

    // Dropping the outer guard first pops past the inner one.
    drop(outer);
    assert_eq!(Extent::current(), root);
    assert_eq!(h.get(), 0);

    // The inner guard's extent is no longer current, so it leaves things alone.
    drop(inner);
    assert_eq!(Extent::current(), root);
}

#[cfg_attr(not(target_arch = "wasm32"), test)]
#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
fn test_guard_extent_is_current() {
    let h = ContextHandle::new(0u8);
    let guard = h.enter(4);
    assert_eq!(guard.extent(), &Extent::current());
    drop(guard);
}

#[cfg_attr(not(target_arch = "wasm32"), test)]
#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
fn test_guard_held_across_await_is_replaced_on_resume() {
    let h = ContextHandle::new(0u8);
    let root = Extent::current();
    let (before_await, after_await, after_drop) = test_executors::spin_on(h.run(1, async {
        let guard = h.enter(2);
        let before_await = h.get();
        yield_now().await;
        // The run future reinstalled its own extent on resume.
        let after_await = h.get();
        drop(guard);
        (before_await, after_await, h.get())
    }));
    assert_eq!((before_await, after_await, after_drop), (2, 1, 1));
    assert_eq!(Extent::current(), root);
    assert_eq!(h.get(), 0);
}

#[cfg_attr(not(target_arch = "wasm32"), test)]
#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
fn test_run_extent_created_on_first_poll() {
    let outer = ContextHandle::new("outer default");
    let inner = ContextHandle::new("inner default");
    let future = inner.run("i", async { (outer.get(), inner.get()) });
    assert!(future.extent().is_none());
    let seen = outer.run_sync("o", || test_executors::spin_on(future));
    assert_eq!(seen, ("o", "i"));
}
