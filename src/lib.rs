//SPDX-License-Identifier: MIT OR Apache-2.0
/*!
# scopewise

scopewise binds a value for the duration of an operation and makes it visible to everything
that operation does, including async work that suspends and resumes, without passing it
through every function signature in between.

# Development status

scopewise is experimental and the API may change.

# The problem

Some state is ambient.  A request id, the authenticated user, an open transaction, a tenant.
Deep inside a call chain, somebody needs it, and everybody in between has to carry it.

Thread-locals are the usual answer, and they are wrong for async code: a thread polls many
unrelated tasks, and a task may resume on a different thread than it suspended on.
Executor-specific task-locals are closer, but they tie a library to one executor.

# The API

```rust
use scopewise::{create_context, use_context};

let request_id = create_context(String::from("none"));

fn handler(request_id: &scopewise::ContextHandle<String>) -> String {
    format!("handling {}", use_context(request_id))
}

let out = request_id.run_sync(String::from("req-1"), || handler(&request_id));
assert_eq!(out, "handling req-1");
assert_eq!(request_id.get(), "none");
```

For async code, [`ContextHandle::run`] returns a future.  The binding is visible every time
that future (or anything it polls) runs, and nowhere else:

```rust
use scopewise::ContextHandle;

# test_executors::spin_on(async {
let h = ContextHandle::new(0);
let (a, b) = futures::join!(
    h.run(1, async { h.get() }),
    h.run(2, async { h.get() }),
);
assert_eq!((a, b), (1, 2));
# });
```

Bindings nest like a stack.  When an operation finishes (by returning, returning an `Err`, or
panicking) the binding it established is gone and the enclosing one is visible again.

# Spawning

Work that is polled inside a bound future sees the binding automatically.  Work that runs
somewhere else (a new thread, a task handed to an executor) must capture the extent when it is
spawned.  See [`propagate`], [`InCurrentExtent`], [`spawn_thread`], and, with the `tokio` feature,
`spawn`.

# Features

* `tokio`: adds `spawn`, a `tokio::spawn` that inherits the current extent.
* `logwise_internal`: internal debug logging of extent push/pop, in debug builds.
*/

mod carrier;
pub mod extent;
mod handle;
mod invoker;
mod spawn;

logwise::declare_logging_domain!();

pub use carrier::{Carrier, SlotID};
pub use extent::{ApplyExtent, Extent, ExtentGuard, ExtentID, InCurrentExtent, propagate};
pub use handle::{ContextHandle, create_context, use_context};
pub use invoker::{ScopedInvoker, run_with_context};

#[cfg(not(target_arch = "wasm32"))]
pub use spawn::spawn_thread;
#[cfg(feature = "tokio")]
pub use spawn::spawn;
