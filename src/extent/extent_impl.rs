// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core Extent implementation.

use std::any::Any;
use std::cell::{OnceCell, RefCell};
use std::fmt::Display;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::carrier::SlotID;

pub(crate) static EXTENT_ID: AtomicU64 = AtomicU64::new(0);

/// Unique identifier for an extent.
///
/// Each extent gets a unique ID that can be used to identify a specific
/// extent in the parent chain.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ExtentID(pub(crate) u64);

impl Display for ExtentID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A value bound to one slot.
#[derive(Clone)]
pub(crate) struct Binding {
    pub(crate) slot: SlotID,
    pub(crate) value: Arc<dyn Any + Send + Sync>,
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding").field("slot", &self.slot).finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub(crate) struct ExtentInner {
    pub(crate) parent: Option<Extent>,
    pub(crate) extent_id: u64,
    /// If Some, this extent binds a slot. If None, this is a thread root.
    pub(crate) binding: Option<Binding>,
}

/// A node in the tree of execution extents.
///
/// An `Extent` is the dynamic span of one operation and everything causally spawned from it.
/// Extents are immutable once created: binding a value never mutates an extent, it creates
/// a child whose parent is the extent that was current at the time.
/// Reads walk from an extent toward the root and stop at the first binding for the slot
/// being read, so children inherit their parent's bindings without copying them.
///
/// Extents are cheap to clone (Arc-based) and may be sent to other threads.
///
/// # Examples
///
/// ```rust
/// use scopewise::{ContextHandle, Extent};
///
/// let request_id = ContextHandle::new(0u64);
/// let captured = request_id.run_sync(7, Extent::current);
///
/// // Outside of `run_sync` the binding is gone...
/// assert_eq!(request_id.get(), 0);
/// // ...but the captured extent still carries it.
/// assert_eq!(captured.run_sync(|| request_id.get()), 7);
/// ```
#[derive(Debug, Clone)]
pub struct Extent {
    pub(crate) inner: Arc<ExtentInner>,
}

impl PartialEq for Extent {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Extent {}

impl Hash for Extent {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.inner).hash(state);
    }
}

impl Display for Extent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}extent {}",
            "  ".repeat(self.nesting_level()),
            self.extent_id()
        )
    }
}

thread_local! {
    pub(crate) static EXTENT: OnceCell<RefCell<Extent>> = const { OnceCell::new() };
}

/// Lazily initializes and returns the thread-local extent cell.
fn get_or_init_extent(once: &OnceCell<RefCell<Extent>>) -> &RefCell<Extent> {
    once.get_or_init(|| RefCell::new(Extent::root()))
}

impl Extent {
    fn root() -> Extent {
        Extent {
            inner: Arc::new(ExtentInner {
                parent: None,
                extent_id: EXTENT_ID.fetch_add(1, Ordering::Relaxed),
                binding: None,
            }),
        }
    }

    /// Returns the extent currently installed on this thread.
    ///
    /// Every thread starts in its own root extent, which binds nothing.
    #[inline]
    pub fn current() -> Extent {
        EXTENT.with(|once| get_or_init_extent(once).borrow().clone())
    }

    /// Installs this extent as the current extent for this thread, returning the extent
    /// that was current before.
    ///
    /// Most code should use [`Extent::run_sync`], [`Extent::apply`] or a guard instead, which
    /// restore the prior extent automatically.
    pub fn set_current(self) -> Extent {
        EXTENT.with(|once| get_or_init_extent(once).replace(self))
    }

    /// Creates a child of `parent` that binds `value` to `slot`.
    pub(crate) fn bind(parent: Extent, slot: SlotID, value: Arc<dyn Any + Send + Sync>) -> Extent {
        let extent_id = EXTENT_ID.fetch_add(1, Ordering::Relaxed);
        logwise::debuginternal_sync!(
            "push extent {extent} binding slot {slot}",
            extent = extent_id,
            slot = slot.0
        );
        Extent {
            inner: Arc::new(ExtentInner {
                parent: Some(parent),
                extent_id,
                binding: Some(Binding { slot, value }),
            }),
        }
    }

    /// Finds the nearest binding for `slot`, starting at this extent.
    pub(crate) fn lookup(&self, slot: SlotID) -> Option<&Arc<dyn Any + Send + Sync>> {
        let mut current = self;
        loop {
            if let Some(binding) = &current.inner.binding {
                if binding.slot == slot {
                    return Some(&binding.value);
                }
            }
            current = current.inner.parent.as_ref()?;
        }
    }

    /// Returns the parent of this extent, or `None` for a thread root.
    pub fn parent(&self) -> Option<&Extent> {
        self.inner.parent.as_ref()
    }

    /// Returns the unique ID of this extent.
    #[inline]
    pub fn extent_id(&self) -> ExtentID {
        ExtentID(self.inner.extent_id)
    }

    /// Returns the nesting level of this extent.
    ///
    /// A thread root has a nesting level of 0, its children have level 1, etc.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use scopewise::{ContextHandle, Extent};
    ///
    /// let handle = ContextHandle::new("none");
    /// let base = Extent::current().nesting_level();
    /// handle.run_sync("a", || {
    ///     assert_eq!(Extent::current().nesting_level(), base + 1);
    ///     handle.run_sync("b", || {
    ///         assert_eq!(Extent::current().nesting_level(), base + 2);
    ///     });
    /// });
    /// ```
    pub fn nesting_level(&self) -> usize {
        let mut level = 0;
        let mut current = self;
        while let Some(parent) = &current.inner.parent {
            level += 1;
            current = parent;
        }
        level
    }

    /// Returns whether `ancestor` is this extent or one of its parents.
    pub fn is_within(&self, ancestor: &Extent) -> bool {
        let mut current = Some(self);
        while let Some(extent) = current {
            if extent == ancestor {
                return true;
            }
            current = extent.inner.parent.as_ref();
        }
        false
    }

    /// Runs `f` with this extent installed, restoring the prior extent afterward.
    ///
    /// The prior extent is restored even if `f` panics; the panic then continues unchanged.
    pub fn run_sync<R>(&self, f: impl FnOnce() -> R) -> R {
        let _restore = Restore::install(self.clone());
        f()
    }
}

/// Reinstalls a saved extent when dropped.
///
/// This is the unit of restoration for both the synchronous and the per-poll paths.
pub(crate) struct Restore {
    prior: Option<Extent>,
}

impl Restore {
    pub(crate) fn install(extent: Extent) -> Restore {
        Restore {
            prior: Some(extent.set_current()),
        }
    }
}

impl Drop for Restore {
    fn drop(&mut self) {
        if let Some(prior) = self.prior.take() {
            // Drop the extent we replaced outside of the thread-local borrow.
            let _ours = prior.set_current();
        }
    }
}
