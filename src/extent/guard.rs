// SPDX-License-Identifier: MIT OR Apache-2.0

//! Manual extent scoping for synchronous code.

use std::marker::PhantomData;

use super::extent_impl::Extent;

/// Keeps a binding current until dropped.
///
/// Returned by [`ContextHandle::enter`](crate::ContextHandle::enter). Dropping the guard
/// restores the extent that was current when it was created.
///
/// Guards are meant to be dropped in the reverse order they were created, which scoping
/// does for you. If a guard is dropped while a guard created after it is still alive, the
/// thread is popped back to this guard's prior extent anyway and a warning is logged.
///
/// A guard is tied to the thread that created it.
///
/// # In async code
///
/// Do not hold a guard across an `.await`. A future returned by
/// [`ContextHandle::run`](crate::ContextHandle::run) (or any [`ApplyExtent`](super::ApplyExtent))
/// reinstalls its own extent every time it is polled. After the first suspension the guard's
/// binding is gone, and dropping the guard later only logs a warning. Bind values around async
/// work with `run` instead.
///
/// ```rust
/// use scopewise::ContextHandle;
///
/// let txn = ContextHandle::new(0u32);
/// {
///     let _guard = txn.enter(5);
///     assert_eq!(txn.get(), 5);
/// }
/// assert_eq!(txn.get(), 0);
/// ```
#[derive(Debug)]
#[must_use = "the binding is removed as soon as the guard is dropped"]
pub struct ExtentGuard {
    entered: Extent,
    prior: Option<Extent>,
    _not_send: PhantomData<*const ()>,
}

impl ExtentGuard {
    pub(crate) fn enter(extent: Extent) -> ExtentGuard {
        let prior = extent.clone().set_current();
        ExtentGuard {
            entered: extent,
            prior: Some(prior),
            _not_send: PhantomData,
        }
    }

    /// The extent this guard installed.
    pub fn extent(&self) -> &Extent {
        &self.entered
    }
}

impl Drop for ExtentGuard {
    fn drop(&mut self) {
        let Some(prior) = self.prior.take() else {
            return;
        };
        let current = Extent::current();
        if current == self.entered {
            let _ours = prior.set_current();
            return;
        }
        let id = self.entered.extent_id().0;
        if current.is_within(&self.entered) {
            let depth = (current.nesting_level() - self.entered.nesting_level()) as u64;
            logwise::warn_sync!(
                "Extent guard {id} dropped out of order; popping {depth} nested extents.",
                id = id,
                depth = depth
            );
            let _ours = prior.set_current();
        } else {
            logwise::warn_sync!(
                "Extent guard {id} dropped, but its extent is no longer in the current extent chain.",
                id = id
            );
        }
    }
}
